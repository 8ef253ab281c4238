//! Collect contributor statistics for every repository in a GitHub
//! organisation, accumulate them in a key-value store, and render a static
//! Markdown leaderboard.

extern crate chrono;
extern crate failure;
#[macro_use]
extern crate failure_derive;
#[macro_use]
extern crate log;
extern crate redis;
extern crate reqwest;
extern crate sec;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
extern crate toml;

#[cfg(test)]
extern crate tempdir;

pub mod aggregate;
pub mod client;
pub mod config;
pub mod driver;
pub mod errors;
pub mod github;
pub mod pagination;
pub mod pending;
pub mod report;
pub mod retry;
pub mod skip;
pub mod store;

pub use client::{GitHubClient, HttpClient, Response};
pub use config::Config;
pub use driver::{CollectSummary, Driver, Mode};
pub use errors::{FailedRequest, InvalidMode};
pub use skip::SkipList;
pub use store::{MemoryStore, RedisStore, Store};
