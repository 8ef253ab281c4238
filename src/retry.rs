//! Polling the contributor statistics endpoint until GitHub has finished
//! computing the statistics, or we run out of patience.

use failure::Error;
use reqwest::StatusCode;
use std::thread;
use std::time::Duration;

use crate::client::Response;
use crate::config::CollectConfig;
use crate::github::ContributorStat;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RetryPolicy {
    /// The maximum number of requests made for one repository.
    pub attempts: u32,
    /// How long to wait after a `202 Accepted`.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(cfg: &CollectConfig) -> RetryPolicy {
        RetryPolicy {
            attempts: cfg.attempts,
            delay: cfg.retry_delay(),
        }
    }

    /// Keep requesting `repo`'s statistics until we reach a final state.
    pub fn poll<F>(&self, repo: &str, mut request: F) -> Result<Vec<ContributorStat>, Failure>
    where
        F: FnMut() -> Result<Response, Error>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match transition(attempt, self, request()) {
                State::Requesting => {
                    info!("Waiting for stats for {} (attempt {})", repo, attempt);
                    thread::sleep(self.delay);
                }
                State::Ready(stats) => return Ok(stats),
                State::Pending => return Err(Failure::Exhausted(attempt)),
                State::Failed(reason) => return Err(reason),
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> RetryPolicy {
        RetryPolicy::from_config(&CollectConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum State {
    /// Another request needs to be made.
    Requesting,
    Ready(Vec<ContributorStat>),
    /// GitHub was still computing the statistics when we ran out of
    /// attempts.
    Pending,
    Failed(Failure),
}

/// Why a repository's statistics couldn't be collected.
#[derive(Debug, Clone, PartialEq, Fail)]
pub enum Failure {
    #[fail(display = "Still being computed after {} attempts", _0)]
    Exhausted(u32),
    #[fail(display = "Request failed: {}", _0)]
    Transport(String),
    #[fail(display = "GitHub responded with {}", _0)]
    BadStatus(StatusCode),
    #[fail(display = "Unable to parse the statistics: {}", _0)]
    Unparseable(String),
    #[fail(display = "No contributor statistics were returned")]
    Empty,
}

/// Work out what happens after the `attempt`'th request (counting from 1)
/// came back with `outcome`.
pub fn transition(attempt: u32, policy: &RetryPolicy, outcome: Result<Response, Error>) -> State {
    let response = match outcome {
        Ok(r) => r,
        Err(e) => return State::Failed(Failure::Transport(e.to_string())),
    };

    if response.status == StatusCode::ACCEPTED {
        return if attempt < policy.attempts {
            State::Requesting
        } else {
            State::Pending
        };
    }

    if !response.status.is_success() {
        return State::Failed(Failure::BadStatus(response.status));
    }

    match serde_json::from_str::<Vec<ContributorStat>>(&response.body) {
        Ok(ref stats) if stats.is_empty() => State::Failed(Failure::Empty),
        Ok(stats) => State::Ready(stats),
        Err(e) => State::Failed(Failure::Unparseable(e.to_string())),
    }
}
