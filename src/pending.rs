//! The ledger of repositories whose statistics couldn't be collected.
//!
//! A repository is pending exactly when its most recent collection attempt
//! failed. The set survives across runs so `--retry-pending` can pick up
//! where the last run left off.

use chrono::{DateTime, TimeZone, Utc};
use failure::Error;
use std::io::Write;

use crate::store::{keys, Store};

#[derive(Debug, Clone, PartialEq)]
pub struct PendingEntry {
    pub repo: String,
    /// When the last attempt failed, if we know.
    pub failed_at: Option<DateTime<Utc>>,
}

/// Record that `repo` failed at `now`.
pub fn mark<S: Store>(store: &mut S, repo: &str, now: DateTime<Utc>) -> Result<(), Error> {
    store.set_add(keys::PENDING, repo)?;
    store.hash_set(keys::PENDING_TIMESTAMPS, repo, &now.timestamp().to_string())?;
    Ok(())
}

pub fn clear<S: Store>(store: &mut S, repo: &str) -> Result<(), Error> {
    store.set_remove(keys::PENDING, repo)?;
    store.hash_delete(keys::PENDING_TIMESTAMPS, repo)?;
    Ok(())
}

/// The names of every pending repository, sorted.
pub fn snapshot<S: Store>(store: &mut S) -> Result<Vec<String>, Error> {
    let mut names = store.set_members(keys::PENDING)?;
    names.sort();
    Ok(names)
}

pub fn entries<S: Store>(store: &mut S) -> Result<Vec<PendingEntry>, Error> {
    let mut entries = Vec::new();

    for repo in snapshot(store)? {
        let failed_at = store
            .hash_get(keys::PENDING_TIMESTAMPS, &repo)?
            .and_then(|ts| ts.parse::<i64>().ok())
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single());

        entries.push(PendingEntry { repo, failed_at });
    }

    Ok(entries)
}

/// How long ago `then` was, as `"{hours}h {minutes}m ago"`.
pub fn format_age(now: DateTime<Utc>, then: DateTime<Utc>) -> String {
    let age = (now - then).num_seconds().max(0);
    let hours = age / 3600;
    let minutes = (age % 3600) / 60;

    format!("{}h {}m ago", hours, minutes)
}

/// Print the pending ledger, one numbered line per repository.
pub fn list<S: Store, W: Write>(store: &mut S, writer: &mut W, now: DateTime<Utc>) -> Result<(), Error> {
    let entries = entries(store)?;

    if entries.is_empty() {
        writeln!(writer, "No pending repositories")?;
        return Ok(());
    }

    writeln!(writer, "Pending repositories ({}):", entries.len())?;
    writeln!(writer)?;

    for (i, entry) in entries.iter().enumerate() {
        let age = match entry.failed_at {
            Some(then) => format_age(now, then),
            None => String::from("unknown"),
        };

        writeln!(writer, "{:3}. {}  (last failure: {})", i + 1, entry.repo, age)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Duration;

    #[test]
    fn marking_and_clearing() {
        let mut store = MemoryStore::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();

        mark(&mut store, "PyMISP", now).unwrap();

        assert_eq!(snapshot(&mut store).unwrap(), vec!["PyMISP"]);
        assert_eq!(
            entries(&mut store).unwrap(),
            vec![PendingEntry {
                repo: String::from("PyMISP"),
                failed_at: Some(now),
            }]
        );

        clear(&mut store, "PyMISP").unwrap();

        assert!(snapshot(&mut store).unwrap().is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn marking_again_refreshes_the_timestamp() {
        let mut store = MemoryStore::new();
        let first = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let second = first + Duration::hours(3);

        mark(&mut store, "MISP", first).unwrap();
        mark(&mut store, "MISP", second).unwrap();

        let got = entries(&mut store).unwrap();
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].failed_at, Some(second));
    }

    #[test]
    fn ages_are_in_hours_and_minutes() {
        let then = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let now = then + Duration::minutes(3 * 60 + 25) + Duration::seconds(59);

        assert_eq!(format_age(now, then), "3h 25m ago");
        assert_eq!(format_age(then, then), "0h 0m ago");
    }

    #[test]
    fn listing_is_sorted_and_handles_missing_timestamps() {
        let mut store = MemoryStore::new();
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        mark(&mut store, "misp-modules", now - Duration::minutes(90)).unwrap();
        store.set_add(keys::PENDING, "MISP").unwrap();
        store.hash_set(keys::PENDING_TIMESTAMPS, "MISP", "garbage").unwrap();

        let mut buffer = Vec::new();
        list(&mut store, &mut buffer, now).unwrap();

        let got = String::from_utf8(buffer).unwrap();
        let should_be = "Pending repositories (2):\n\n  1. MISP  (last failure: unknown)\n  2. misp-modules  (last failure: 1h 30m ago)\n";
        assert_eq!(got, should_be);
    }

    #[test]
    fn listing_an_empty_ledger() {
        let mut store = MemoryStore::new();

        let mut buffer = Vec::new();
        list(&mut store, &mut buffer, Utc::now()).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "No pending repositories\n");
    }
}
