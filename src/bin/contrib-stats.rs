extern crate chrono;
extern crate contrib_stats;
extern crate env_logger;
extern crate failure;
#[macro_use]
extern crate log;
extern crate sec;
extern crate shellexpand;
extern crate structopt;

use std::env;
use std::io::{self, Write};
use std::process;

use chrono::Local;
use contrib_stats::config::CollectConfig;
use contrib_stats::github::GitHub;
use contrib_stats::retry::RetryPolicy;
use contrib_stats::{Config, Driver, GitHubClient, InvalidMode, Mode, RedisStore, SkipList};
use env_logger::Builder;
use failure::{Error, ResultExt};
use log::LevelFilter;
use sec::Secret;
use structopt::StructOpt;

/// Where to look for the config file when `CONTRIB_STATS_CONFIG` isn't set.
const DEFAULT_CONFIG: &str = "~/.contrib-stats.toml";
const CONFIG_VAR: &str = "CONTRIB_STATS_CONFIG";

fn main() {
    let args = Args::from_args();

    if args.example_config {
        if let Err(e) = generate_example() {
            report_error(&e);
            process::exit(1);
        }
        return;
    }

    if let Err(e) = run(&args) {
        report_error(&e);
        process::exit(1);
    }
}

fn report_error(e: &Error) {
    eprintln!("Error: {}", e);

    for cause in e.iter_chain().skip(1) {
        eprintln!("\tCaused By: {}", cause);
    }
}

fn generate_example() -> Result<(), Error> {
    let example = Config::example();

    println!("{}", example.as_toml()?);
    Ok(())
}

fn run(args: &Args) -> Result<(), Error> {
    initialize_logging(args)?;
    let mode = args.mode()?;
    let cfg = args.config()?;

    if log_enabled!(log::Level::Debug) {
        for line in format!("{:#?}", cfg).lines() {
            debug!("{}", line);
        }
    }

    let token = match mode {
        // these never talk to GitHub
        Mode::ListPending | Mode::Report => cfg
            .github
            .token()
            .unwrap_or_else(|_| Secret::new(String::new())),
        _ => cfg.github.token()?,
    };

    let skip = load_skip_list(mode, &cfg.collect)?;
    debug!("Skipping {} repositories", skip.len());

    let client = GitHubClient::new(token, &cfg.github.agent);
    let github = GitHub::new(client, cfg.github.clone(), cfg.collect.pagination_delay());
    let store = RedisStore::connect(&cfg.store.url)?;
    let policy = RetryPolicy::from_config(&cfg.collect);

    let mut driver = Driver::new(github, store, skip, policy, cfg.report.clone());

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    driver.run(mode, &mut handle)?;

    Ok(())
}

/// The skip list only matters to the modes which talk to GitHub.
fn load_skip_list(mode: Mode, cfg: &CollectConfig) -> Result<SkipList, Error> {
    match mode {
        Mode::ListPending | Mode::Report => return Ok(SkipList::default()),
        _ if cfg.skip_list.as_os_str().is_empty() => return Ok(SkipList::default()),
        _ => {}
    }

    let skip = SkipList::from_file(&cfg.skip_list).context("Couldn't load the skip list")?;
    Ok(skip)
}

#[derive(Debug, Clone, PartialEq, StructOpt)]
#[structopt(about = "Generate contributor statistics for a GitHub organisation.")]
struct Args {
    #[structopt(long = "all", help = "Reset the store, then trigger and collect stats (default).")]
    all: bool,
    #[structopt(long = "trigger", help = "Trigger stats computation only.")]
    trigger: bool,
    #[structopt(long = "collect", help = "Reset the store, then collect stats only.")]
    collect: bool,
    #[structopt(long = "retry-pending", help = "Retry only repos that previously failed.")]
    retry_pending: bool,
    #[structopt(long = "list-pending", help = "List repositories that failed and are pending retry.")]
    list_pending: bool,
    #[structopt(long = "report", help = "Render the Markdown report from the collected stats.")]
    report: bool,
    #[structopt(short = "v", long = "verbose", parse(from_occurrences),
                help = "Verbose output (repeat for more verbosity)")]
    verbosity: u64,
    #[structopt(long = "example-config",
                help = "Generate an example config and immediately exit.")]
    example_config: bool,
}

impl Args {
    pub fn mode(&self) -> Result<Mode, InvalidMode> {
        let selected: Vec<(&'static str, Mode)> = vec![
            ("--all", self.all, Mode::All),
            ("--trigger", self.trigger, Mode::Trigger),
            ("--collect", self.collect, Mode::Collect),
            ("--retry-pending", self.retry_pending, Mode::RetryPending),
            ("--list-pending", self.list_pending, Mode::ListPending),
            ("--report", self.report, Mode::Report),
        ]
        .into_iter()
        .filter(|&(_, set, _)| set)
        .map(|(flag, _, mode)| (flag, mode))
        .collect();

        match selected.len() {
            0 => Ok(Mode::All),
            1 => Ok(selected[0].1),
            _ => Err(InvalidMode {
                modes: selected.into_iter().map(|(flag, _)| flag).collect(),
            }),
        }
    }

    pub fn config(&self) -> Result<Config, Error> {
        let raw = env::var(CONFIG_VAR).unwrap_or_else(|_| String::from(DEFAULT_CONFIG));
        let config_file = shellexpand::full(&raw).context("Unable to expand wildcards")?;

        Config::from_file(&*config_file)
            .context("Couldn't load the config")
            .map_err(Into::into)
    }
}

fn initialize_logging(args: &Args) -> Result<(), Error> {
    let mut builder = Builder::new();

    let level = match args.verbosity {
        0 => None,
        1 => Some(LevelFilter::Info),
        2 => Some(LevelFilter::Debug),
        _ => Some(LevelFilter::Trace),
    };

    if let Some(lvl) = level {
        builder.filter(Some("contrib_stats"), lvl);
    }

    if let Ok(filter) = env::var("RUST_LOG") {
        builder.parse_filters(&filter);
    }

    builder.format(|out, record| match record.line() {
        Some(line) => writeln!(
            out,
            "{} [{:5}] ({}#{}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            line,
            record.args()
        ),
        None => writeln!(
            out,
            "{} [{:5}] ({}): {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        ),
    });

    builder.try_init()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_flags_means_do_everything() {
        let args = Args::from_iter(&["contrib-stats"]);

        assert_eq!(args.mode().unwrap(), Mode::All);
    }

    #[test]
    fn a_single_mode() {
        let args = Args::from_iter(&["contrib-stats", "--retry-pending", "-vv"]);

        assert_eq!(args.mode().unwrap(), Mode::RetryPending);
        assert_eq!(args.verbosity, 2);
    }

    #[test]
    fn read_only_modes_ignore_a_missing_skip_list() {
        let cfg = CollectConfig {
            skip_list: "this/file/does/not/exist.json".into(),
            ..Default::default()
        };

        assert!(load_skip_list(Mode::ListPending, &cfg).unwrap().is_empty());
        assert!(load_skip_list(Mode::Report, &cfg).unwrap().is_empty());
        assert!(load_skip_list(Mode::Collect, &cfg).is_err());
        assert!(load_skip_list(Mode::Trigger, &cfg).is_err());
    }

    #[test]
    fn modes_are_mutually_exclusive() {
        let args = Args::from_iter(&["contrib-stats", "--trigger", "--list-pending"]);

        let err = args.mode().unwrap_err();
        assert_eq!(err.modes, vec!["--trigger", "--list-pending"]);
    }
}
