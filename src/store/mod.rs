//! The key-value store the aggregates and the pending ledger live in.
//!
//! The operations mirror a subset of Redis: sorted-set increments, plain sets,
//! hashes and string keys. Each call is atomic on its own, but nothing is
//! atomic across calls.

use failure::Error;

mod memory;
mod redis_store;

pub use self::memory::MemoryStore;
pub use self::redis_store::RedisStore;

/// Key names shared by the collector and the report.
pub mod keys {
    /// Every repository which has been processed.
    pub const REPOSITORIES: &str = "repositories";
    /// Every author credited with a commit.
    pub const USERS: &str = "users";
    /// Total commits across the whole organisation.
    pub const TOP_COMMIT: &str = "topcommit";
    /// The number of repositories an author has contributed to.
    pub const TOP_VERSATILE: &str = "topversatile";
    pub const PENDING: &str = "repos:pending";
    pub const PENDING_TIMESTAMPS: &str = "repos:pending:ts";

    /// The commit ranking for a single repository.
    pub fn repo_ranking(repo: &str) -> String {
        format!("r:{}", repo)
    }

    pub fn avatar(login: &str) -> String {
        format!("a:{}", login)
    }
}

pub trait Store {
    /// Add `by` to `member`'s score in the sorted set at `key`.
    fn incr_score(&mut self, key: &str, member: &str, by: i64) -> Result<(), Error>;
    /// Every member of the sorted set at `key`, highest score first.
    fn ranking(&mut self, key: &str) -> Result<Vec<(String, i64)>, Error>;

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), Error>;
    fn set_remove(&mut self, key: &str, member: &str) -> Result<(), Error>;
    fn set_members(&mut self, key: &str) -> Result<Vec<String>, Error>;

    fn hash_set(&mut self, key: &str, field: &str, value: &str) -> Result<(), Error>;
    fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<String>, Error>;
    fn hash_delete(&mut self, key: &str, field: &str) -> Result<(), Error>;

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error>;
    fn get(&mut self, key: &str) -> Result<Option<String>, Error>;

    /// Remove every key.
    fn flush(&mut self) -> Result<(), Error>;
}

impl<'a, S: Store + ?Sized> Store for &'a mut S {
    fn incr_score(&mut self, key: &str, member: &str, by: i64) -> Result<(), Error> {
        (**self).incr_score(key, member, by)
    }

    fn ranking(&mut self, key: &str) -> Result<Vec<(String, i64)>, Error> {
        (**self).ranking(key)
    }

    fn set_add(&mut self, key: &str, member: &str) -> Result<(), Error> {
        (**self).set_add(key, member)
    }

    fn set_remove(&mut self, key: &str, member: &str) -> Result<(), Error> {
        (**self).set_remove(key, member)
    }

    fn set_members(&mut self, key: &str) -> Result<Vec<String>, Error> {
        (**self).set_members(key)
    }

    fn hash_set(&mut self, key: &str, field: &str, value: &str) -> Result<(), Error> {
        (**self).hash_set(key, field, value)
    }

    fn hash_get(&mut self, key: &str, field: &str) -> Result<Option<String>, Error> {
        (**self).hash_get(key, field)
    }

    fn hash_delete(&mut self, key: &str, field: &str) -> Result<(), Error> {
        (**self).hash_delete(key, field)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), Error> {
        (**self).set(key, value)
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, Error> {
        (**self).get(key)
    }

    fn flush(&mut self) -> Result<(), Error> {
        (**self).flush()
    }
}
