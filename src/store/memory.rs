use failure::Error;
use std::collections::{BTreeMap, BTreeSet};

use super::Store;

/// A [`Store`] which keeps everything in memory, ordering rankings the same
/// way Redis does.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    sorted: BTreeMap<String, BTreeMap<String, i64>>,
    sets: BTreeMap<String, BTreeSet<String>>,
    hashes: BTreeMap<String, BTreeMap<String, String>>,
    strings: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    /// Look up a single member's score.
    pub fn score(&self, key: &str, member: &str) -> Option<i64> {
        self.sorted.get(key).and_then(|set| set.get(member)).cloned()
    }

    /// Does any key exist at all?
    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
            && self.sets.is_empty()
            && self.hashes.is_empty()
            && self.strings.is_empty()
    }
}

impl Store for MemoryStore {
    fn incr_score(&mut self, key: &str, member: &str, by: i64) -> Result<(), Error> {
        *self
            .sorted
            .entry(key.to_string())
            .or_insert_with(BTreeMap::new)
            .entry(member.to_string())
            .or_insert(0) += by;
        Ok(())
    }

    fn ranking(&mut self, key: &str) -> Result<Vec<(String, i64)>, Error> {
        let mut ranking: Vec<(String, i64)> = self
            .sorted
            .get(key)
            .map(|set| set.iter().map(|(m, s)| (m.clone(), *s)).collect())
            .unwrap_or_default();

        // ZREVRANGE breaks ties by member, in reverse lexicographic order
        ranking.sort_by(|left, right| right.1.cmp(&left.1).then_with(|| right.0.cmp(&left.0)));
        Ok(ranking)
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), Error> {
        self.sets
            .entry(key.to_string())
            .or_insert_with(BTreeSet::new)
            .insert(member.to_string());
        Ok(())
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<(), Error> {
        if let Some(set) = self.sets.get_mut(key) {
            set.remove(member);
            if set.is_empty() {
                self.sets.remove(key);
            }
        }
        Ok(())
    }

    fn set_members(&mut self, key: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .sets
            .get(key)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default())
    }

    fn hash_set(&mut self, key: &str, field: &str, value: &str) -> Result<(), Error> {
        self.hashes
            .entry(key.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(field.to_string(), value.to_string());
        Ok(())
    }

    fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<String>, Error> {
        Ok(self.hashes.get(key).and_then(|h| h.get(field)).cloned())
    }

    fn hash_delete(&mut self, key: &str, field: &str) -> Result<(), Error> {
        if let Some(hash) = self.hashes.get_mut(key) {
            hash.remove(field);
            if hash.is_empty() {
                self.hashes.remove(key);
            }
        }
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        self.strings.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, Error> {
        Ok(self.strings.get(key).cloned())
    }

    fn flush(&mut self) -> Result<(), Error> {
        *self = MemoryStore::default();
        Ok(())
    }
}
