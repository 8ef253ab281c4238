use failure::{Error, ResultExt};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Repositories which are never triggered or collected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkipList {
    names: BTreeSet<String>,
}

impl SkipList {
    pub fn new<I, S>(names: I) -> SkipList
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SkipList {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Load a JSON array of repository names.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<SkipList, Error> {
        let path = path.as_ref();
        debug!("Loading the skip list from {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;
        let names: Vec<String> =
            serde_json::from_str(&content).context("The skip list should be a JSON array of names")?;

        Ok(SkipList::new(names))
    }

    pub fn contains(&self, repo: &str) -> bool {
        self.names.contains(repo)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn load_from_json() {
        let temp = TempDir::new("skip").unwrap();
        let path = temp.path().join("skip_repo.json");
        fs::write(&path, r#"["misp-book", "misp-website"]"#).unwrap();

        let got = SkipList::from_file(&path).unwrap();

        assert_eq!(got.len(), 2);
        assert!(got.contains("misp-book"));
        assert!(!got.contains("MISP"));
    }

    #[test]
    fn reject_anything_but_an_array() {
        let temp = TempDir::new("skip").unwrap();
        let path = temp.path().join("skip_repo.json");
        fs::write(&path, r#"{"misp-book": true}"#).unwrap();

        assert!(SkipList::from_file(&path).is_err());
    }
}
