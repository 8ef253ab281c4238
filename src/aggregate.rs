use failure::{Error, ResultExt};
use std::collections::HashSet;
use std::convert::TryFrom;

use crate::github::ContributorStat;
use crate::store::{keys, Store};

/// Logins ending with this are automation accounts and never credited.
pub const BOT_SUFFIX: &str = "[bot]";

pub fn is_bot(login: &str) -> bool {
    login.ends_with(BOT_SUFFIX)
}

/// Fold one repository's contributor statistics into the rankings, returning
/// the number of authors credited.
///
/// Scores are incremented, never set, so folding the same statistics twice
/// counts them twice.
pub fn fold<S: Store>(store: &mut S, repo: &str, stats: &[ContributorStat]) -> Result<usize, Error> {
    let repo_key = keys::repo_ranking(repo);
    let mut seen = HashSet::new();

    for stat in stats {
        let author = match stat.author {
            Some(ref a) => a,
            None => continue,
        };
        let login = match author.login {
            Some(ref l) if !l.is_empty() => l.as_str(),
            _ => continue,
        };

        if is_bot(login) {
            trace!("Skipping bot {} in {}", login, repo);
            continue;
        }

        let total = i64::try_from(stat.total)
            .with_context(|_| format!("{} has too many commits in {} ({})", login, repo, stat.total))?;
        store.incr_score(&repo_key, login, total)?;
        store.incr_score(keys::TOP_COMMIT, login, total)?;

        store.set_add(keys::USERS, login)?;
        store.set(
            &keys::avatar(login),
            author.avatar_url.as_ref().map(String::as_str).unwrap_or(""),
        )?;

        if seen.insert(login.to_string()) {
            store.incr_score(keys::TOP_VERSATILE, login, 1)?;
        }
    }

    Ok(seen.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::Author;
    use crate::store::MemoryStore;

    fn stat(login: &str, total: u64) -> ContributorStat {
        ContributorStat {
            author: Some(Author {
                login: Some(login.to_string()),
                avatar_url: Some(format!("https://avatars/{}.png", login)),
            }),
            total,
        }
    }

    #[test]
    fn commits_are_added_to_the_repo_and_org_rankings() {
        let mut store = MemoryStore::new();

        let credited = fold(&mut store, "MISP", &[stat("alice", 10), stat("bob", 2)]).unwrap();

        assert_eq!(credited, 2);
        assert_eq!(store.score("r:MISP", "alice"), Some(10));
        assert_eq!(store.score("topcommit", "alice"), Some(10));
        assert_eq!(store.score("topversatile", "alice"), Some(1));
        assert_eq!(store.score("r:MISP", "bob"), Some(2));
        assert_eq!(
            store.get("a:alice").unwrap(),
            Some(String::from("https://avatars/alice.png"))
        );
        assert_eq!(store.set_members("users").unwrap(), vec!["alice", "bob"]);
    }

    #[test]
    fn breadth_counts_repositories_not_commits() {
        let mut store = MemoryStore::new();

        fold(&mut store, "MISP", &[stat("alice", 500)]).unwrap();
        fold(&mut store, "PyMISP", &[stat("alice", 1)]).unwrap();
        fold(&mut store, "misp-modules", &[stat("alice", 42)]).unwrap();

        assert_eq!(store.score("topversatile", "alice"), Some(3));
        assert_eq!(store.score("topcommit", "alice"), Some(543));
    }

    #[test]
    fn an_author_listed_twice_gets_breadth_once() {
        let mut store = MemoryStore::new();

        fold(&mut store, "MISP", &[stat("alice", 4), stat("alice", 6)]).unwrap();

        assert_eq!(store.score("r:MISP", "alice"), Some(10));
        assert_eq!(store.score("topversatile", "alice"), Some(1));
    }

    #[test]
    fn bots_and_anonymous_authors_are_ignored() {
        let mut store = MemoryStore::new();
        let anonymous = ContributorStat {
            author: None,
            total: 7,
        };
        let no_login = ContributorStat {
            author: Some(Author::default()),
            total: 7,
        };

        let credited = fold(
            &mut store,
            "MISP",
            &[stat("dependabot[bot]", 99), anonymous, no_login],
        )
        .unwrap();

        assert_eq!(credited, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn commit_counts_which_overflow_a_score_are_rejected() {
        let mut store = MemoryStore::new();

        let got = fold(&mut store, "MISP", &[stat("alice", u64::max_value())]);

        assert!(got.is_err());
        assert_eq!(store.score("topcommit", "alice"), None);
    }

    #[test]
    fn folding_twice_accumulates() {
        let mut store = MemoryStore::new();
        let stats = vec![stat("alice", 10)];

        fold(&mut store, "MISP", &stats).unwrap();
        fold(&mut store, "MISP", &stats).unwrap();

        assert_eq!(store.score("r:MISP", "alice"), Some(20));
        assert_eq!(store.score("topcommit", "alice"), Some(20));
        assert_eq!(store.score("topversatile", "alice"), Some(2));
    }
}
