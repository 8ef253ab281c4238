use failure::{Error, ResultExt};
use reqwest::StatusCode;
use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use crate::client::{HttpClient, Response};
use crate::config::GitHubConfig;
use crate::pagination;

/// An interface to the repositories of a single GitHub organisation.
pub struct GitHub<C> {
    client: C,
    cfg: GitHubConfig,
    pagination_delay: Duration,
}

impl<C: HttpClient> GitHub<C> {
    pub fn new(client: C, cfg: GitHubConfig, pagination_delay: Duration) -> GitHub<C> {
        GitHub {
            client,
            cfg,
            pagination_delay,
        }
    }

    pub fn organisation(&self) -> &str {
        &self.cfg.organisation
    }

    pub fn repos_url(&self) -> String {
        format!(
            "{}/orgs/{}/repos?per_page={}",
            self.api_root(),
            self.cfg.organisation,
            self.cfg.per_page
        )
    }

    pub fn stats_url(&self, repo: &str) -> String {
        format!(
            "{}/repos/{}/{}/stats/contributors",
            self.api_root(),
            self.cfg.organisation,
            repo
        )
    }

    fn api_root(&self) -> &str {
        self.cfg.api_root.trim_end_matches('/')
    }

    /// Every repository in the organisation, in the order the API lists them.
    pub fn repositories(&self) -> Result<Vec<RawRepo>, Error> {
        debug!("Fetching repositories for {}", self.cfg.organisation);

        let repos: Vec<RawRepo> =
            pagination::fetch_all(&self.client, &self.repos_url(), self.pagination_delay)
                .context("Unable to list the organisation's repositories")?;

        debug!("{} repos in {}", repos.len(), self.cfg.organisation);
        Ok(repos)
    }

    /// A single request against the contributor statistics endpoint.
    pub fn request_stats(&self, repo: &str) -> Result<Response, Error> {
        self.client.get(&self.stats_url(repo))
    }

    /// Ask GitHub to start computing statistics for `repo`, reporting whether
    /// they were already available.
    pub fn trigger(&self, repo: &str) -> Result<TriggerOutcome, Error> {
        let response = self.request_stats(repo)?;
        Ok(TriggerOutcome::from_status(response.status))
    }
}

impl<C> Debug for GitHub<C> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GitHub")
            .field("organisation", &self.cfg.organisation)
            .finish()
    }
}

/// How GitHub answered a request to compute statistics.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// The statistics were already computed.
    Ready,
    /// GitHub started computing them in the background.
    Computing,
    Unexpected(StatusCode),
}

impl TriggerOutcome {
    pub fn from_status(status: StatusCode) -> TriggerOutcome {
        match status {
            StatusCode::OK => TriggerOutcome::Ready,
            StatusCode::ACCEPTED => TriggerOutcome::Computing,
            other => TriggerOutcome::Unexpected(other),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RawRepo {
    pub name: String,
}

/// One entry from `/repos/{owner}/{repo}/stats/contributors`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContributorStat {
    pub author: Option<Author>,
    pub total: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Author {
    pub login: Option<String>,
    pub avatar_url: Option<String>,
}
