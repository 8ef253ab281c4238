//! Rendering the collected rankings as a Markdown page.

use chrono::NaiveDate;
use failure::{Error, ResultExt};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::config::ReportConfig;
use crate::store::{keys, Store};

const USER_URL: &str = "https://www.github.com/";

/// Everything the report needs, read out of the store in one go.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Leaderboard {
    /// Authors ordered by the number of repositories they contributed to.
    pub breadth: Vec<(String, i64)>,
    /// Authors ordered by their total commits.
    pub commits: Vec<(String, i64)>,
    /// Per-repository rankings, sorted by repository name.
    pub repositories: Vec<(String, Vec<(String, i64)>)>,
    pub avatars: BTreeMap<String, String>,
}

impl Leaderboard {
    pub fn load<S: Store>(store: &mut S) -> Result<Leaderboard, Error> {
        let breadth = store.ranking(keys::TOP_VERSATILE)?;
        let commits = store.ranking(keys::TOP_COMMIT)?;

        let mut names = store.set_members(keys::REPOSITORIES)?;
        names.sort();

        let mut repositories = Vec::new();
        for name in names {
            let ranking = store.ranking(&keys::repo_ranking(&name))?;
            repositories.push((name, ranking));
        }

        let mut avatars = BTreeMap::new();
        for &(ref login, _) in breadth.iter().chain(commits.iter()) {
            if avatars.contains_key(login) {
                continue;
            }
            if let Some(url) = store.get(&keys::avatar(login))? {
                avatars.insert(login.clone(), url);
            }
        }

        debug!(
            "Loaded {} authors across {} repositories",
            breadth.len(),
            repositories.len()
        );

        Ok(Leaderboard {
            breadth,
            commits,
            repositories,
            avatars,
        })
    }

    fn avatar(&self, login: &str) -> &str {
        self.avatars.get(login).map(String::as_str).unwrap_or("")
    }

    fn avatar_links(&self, ranking: &[(String, i64)]) -> String {
        ranking
            .iter()
            .map(|&(ref login, _)| {
                format!(
                    "[![{0}]({1} \"{{:height='36px' width='36px'}}\")]({2}{0})",
                    login,
                    self.avatar(login),
                    USER_URL
                )
            })
            .collect()
    }
}

/// Render the leaderboard for `organisation` as it stood on `date`.
pub fn render(board: &Leaderboard, organisation: &str, cfg: &ReportConfig, date: NaiveDate) -> String {
    let mut output = String::from("---\n");
    output.push_str("layout: page\n");
    output.push_str(&format!("title: {}\n", cfg.title));
    output.push_str(&format!("permalink: {}\n", cfg.permalink));
    output.push_str("toc: true\n");
    output.push_str("---\n\n");

    output.push_str(&format!(
        "# {} Contributors ({}) \n\n",
        board.breadth.len(),
        date.format("%Y-%m-%d")
    ));
    output.push_str(&board.avatar_links(&board.breadth));
    output.push('\n');

    output.push_str(&format!(
        "## Top {}  contributors per commit \n\n",
        board.commits.len()
    ));
    output.push_str(&board.avatar_links(&board.commits));
    output.push('\n');

    for &(ref repo, ref contributors) in &board.repositories {
        if cfg.skip.iter().any(|s| s == repo) {
            continue;
        }

        output.push_str(&format!(
            "# {} with {} contributors \n\n",
            repo,
            contributors.len()
        ));
        output.push_str(&format!(
            "The repository [{0}]({1}{2}/{0}) is part of the {2} project and has the following top contributors \n\n",
            repo, USER_URL, organisation
        ));
        output.push_str("| username | total commits |\n");
        output.push_str("|:--------:|:-------------:|\n");
        for &(ref login, commits) in contributors {
            output.push_str(&format!("|[{0}]({1}{0})|{2}|\n", login, USER_URL, commits));
        }
        output.push('\n');
    }

    output
}

/// Write the report, replacing whatever was there before.
pub fn write<P: AsRef<Path>>(path: P, contents: &str) -> Result<(), Error> {
    let path = path.as_ref();
    info!("Writing the report to {}", path.display());

    fs::write(path, contents).with_context(|_| format!("Unable to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate;
    use crate::github::{Author, ContributorStat};
    use crate::store::MemoryStore;
    use tempdir::TempDir;

    fn stat(login: &str, total: u64) -> ContributorStat {
        ContributorStat {
            author: Some(Author {
                login: Some(login.to_string()),
                avatar_url: Some(format!("https://a/{}.png", login)),
            }),
            total,
        }
    }

    fn populated_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        for &(repo, ref stats) in &[
            ("PyMISP", vec![stat("alice", 3), stat("bob", 8)]),
            ("MISP", vec![stat("alice", 10)]),
            ("SwiftCodes", vec![stat("carol", 1)]),
        ] {
            store.set_add(keys::REPOSITORIES, repo).unwrap();
            aggregate::fold(&mut store, repo, stats).unwrap();
        }
        store
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    #[test]
    fn load_everything_from_the_store() {
        let mut store = populated_store();

        let board = Leaderboard::load(&mut store).unwrap();

        assert_eq!(board.breadth[0], (String::from("alice"), 2));
        assert_eq!(board.commits[0], (String::from("alice"), 13));
        let names: Vec<&str> = board.repositories.iter().map(|r| r.0.as_str()).collect();
        assert_eq!(names, vec!["MISP", "PyMISP", "SwiftCodes"]);
        assert_eq!(board.avatars["bob"], "https://a/bob.png");
    }

    #[test]
    fn render_a_small_report() {
        let mut store = populated_store();
        let board = Leaderboard::load(&mut store).unwrap();
        let cfg = ReportConfig {
            skip: vec![String::from("SwiftCodes")],
            ..Default::default()
        };

        let got = render(&board, "MISP", &cfg, date());

        assert!(got.starts_with(
            "---\nlayout: page\ntitle: MISP contributors per repository\npermalink: /contributors/\ntoc: true\n---\n\n# 3 Contributors (2024-05-01) \n\n[![alice](https://a/alice.png \"{:height='36px' width='36px'}\")](https://www.github.com/alice)"
        ));
        assert!(got.contains("## Top 3  contributors per commit \n\n[![alice]"));
        assert!(got.contains(
            "# PyMISP with 2 contributors \n\nThe repository [PyMISP](https://www.github.com/MISP/PyMISP) is part of the MISP project and has the following top contributors \n\n| username | total commits |\n|:--------:|:-------------:|\n|[bob](https://www.github.com/bob)|8|\n|[alice](https://www.github.com/alice)|3|\n\n"
        ));
        assert!(got.find("# MISP with").unwrap() < got.find("# PyMISP with").unwrap());
        assert!(!got.contains("# SwiftCodes"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let mut store = populated_store();
        let board = Leaderboard::load(&mut store).unwrap();
        let cfg = ReportConfig::default();

        assert_eq!(render(&board, "MISP", &cfg, date()), render(&board, "MISP", &cfg, date()));
    }

    #[test]
    fn writing_overwrites_the_previous_report() {
        let temp = TempDir::new("report").unwrap();
        let path = temp.path().join("contributors.md");
        fs::write(&path, "a much longer previous report").unwrap();

        write(&path, "# new").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "# new");
    }
}
