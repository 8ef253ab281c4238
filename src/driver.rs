use chrono::Utc;
use failure::{Error, ResultExt};
use std::io::Write;

use crate::aggregate;
use crate::client::HttpClient;
use crate::config::ReportConfig;
use crate::github::{GitHub, TriggerOutcome};
use crate::pending;
use crate::report::{self, Leaderboard};
use crate::retry::RetryPolicy;
use crate::skip::SkipList;
use crate::store::{keys, Store};

/// What the program was asked to do.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum Mode {
    /// Reset the store, trigger every repository, then collect them all.
    All,
    Trigger,
    /// Reset the store and collect every repository.
    Collect,
    /// Collect only the repositories which failed last time, keeping
    /// everything already in the store.
    RetryPending,
    ListPending,
    Report,
}

/// Runs the trigger, collect and report phases against a hosting API and a
/// store.
#[derive(Debug)]
pub struct Driver<C, S> {
    github: GitHub<C>,
    store: S,
    skip: SkipList,
    policy: RetryPolicy,
    report: ReportConfig,
}

impl<C: HttpClient, S: Store> Driver<C, S> {
    pub fn new(github: GitHub<C>, store: S, skip: SkipList, policy: RetryPolicy, report: ReportConfig) -> Driver<C, S> {
        Driver {
            github,
            store,
            skip,
            policy,
            report,
        }
    }

    pub fn run<W: Write>(&mut self, mode: Mode, stdout: &mut W) -> Result<(), Error> {
        match mode {
            Mode::All => {
                self.reset()?;
                self.trigger()?;
                let summary = self.collect()?;
                self.log_summary(&summary);
            }
            Mode::Trigger => self.trigger()?,
            Mode::Collect => {
                self.reset()?;
                let summary = self.collect()?;
                self.log_summary(&summary);
            }
            Mode::RetryPending => {
                let summary = self.retry_pending()?;
                self.log_summary(&summary);
            }
            Mode::ListPending => pending::list(&mut self.store, stdout, Utc::now())?,
            Mode::Report => self.write_report()?,
        }

        Ok(())
    }

    /// Throw away every aggregate and the pending ledger.
    pub fn reset(&mut self) -> Result<(), Error> {
        self.store.flush().context("Unable to reset the store")?;
        Ok(())
    }

    /// Ask GitHub to start computing statistics for every repository.
    ///
    /// Failing to trigger one repository doesn't stop the others.
    pub fn trigger(&mut self) -> Result<(), Error> {
        info!("Triggering stats computation for all repos");
        let repos = self.github.repositories()?;

        for repo in repos {
            if self.skip.contains(&repo.name) {
                info!("Skip repo {}", repo.name);
                continue;
            }

            debug!("Trigger stats for {}", repo.name);

            match self.github.trigger(&repo.name) {
                Ok(TriggerOutcome::Ready) => info!("Stats ready for {}", repo.name),
                Ok(TriggerOutcome::Computing) => info!("Stats computing for {}", repo.name),
                Ok(TriggerOutcome::Unexpected(status)) => {
                    warn!("Unexpected response for {} ({})", repo.name, status)
                }
                Err(e) => warn!("Error on {}: {}", repo.name, e),
            }
        }

        Ok(())
    }

    /// Collect statistics for every repository in the organisation.
    pub fn collect(&mut self) -> Result<CollectSummary, Error> {
        info!("Collecting stats");
        let names: Vec<String> = self
            .github
            .repositories()?
            .into_iter()
            .map(|r| r.name)
            .collect();

        self.collect_repos(&names)
    }

    /// Collect statistics for the repositories which were pending when the
    /// run started.
    pub fn retry_pending(&mut self) -> Result<CollectSummary, Error> {
        let names = pending::snapshot(&mut self.store)?;
        info!("Retrying {} pending repos", names.len());

        self.collect_repos(&names)
    }

    fn collect_repos(&mut self, names: &[String]) -> Result<CollectSummary, Error> {
        let mut summary = CollectSummary::default();
        let total = names.len();

        for (i, name) in names.iter().enumerate() {
            if self.skip.contains(name) {
                info!("Skip repo {} ({}/{})", name, i + 1, total);
                summary.skipped.push(name.clone());
                continue;
            }

            info!("Processing {} ({}/{})", name, i + 1, total);

            if self
                .collect_repo(name)
                .with_context(|_| format!("Unable to record the stats for {}", name))?
            {
                summary.collected.push(name.clone());
            } else {
                summary.pending.push(name.clone());
            }
        }

        Ok(summary)
    }

    /// Poll one repository's statistics and fold them into the store,
    /// returning whether they were collected.
    fn collect_repo(&mut self, name: &str) -> Result<bool, Error> {
        self.store.set_add(keys::REPOSITORIES, name)?;

        let github = &self.github;
        let outcome = self.policy.poll(name, || github.request_stats(name));

        let stats = match outcome {
            Ok(stats) => stats,
            Err(reason) => {
                warn!("Failed to collect stats for {} ({}), adding to pending", name, reason);
                pending::mark(&mut self.store, name, Utc::now())?;
                return Ok(false);
            }
        };

        info!("Stats collected for {}", name);
        pending::clear(&mut self.store, name)?;

        let credited = aggregate::fold(&mut self.store, name, &stats)?;
        debug!("Credited {} authors for {}", credited, name);

        Ok(true)
    }

    pub fn write_report(&mut self) -> Result<(), Error> {
        let board = Leaderboard::load(&mut self.store)?;
        let rendered = report::render(
            &board,
            self.github.organisation(),
            &self.report,
            Utc::now().date_naive(),
        );

        report::write(&self.report.output, &rendered)
    }

    fn log_summary(&self, summary: &CollectSummary) {
        info!(
            "Collected {} repos, {} pending, {} skipped",
            summary.collected.len(),
            summary.pending.len(),
            summary.skipped.len()
        );

        for name in &summary.pending {
            warn!("{} is pending", name);
        }
    }
}

/// The outcome of a collect run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollectSummary {
    pub collected: Vec<String>,
    /// Repositories which were added to (or stayed in) the pending ledger.
    pub pending: Vec<String>,
    pub skipped: Vec<String>,
}
