use failure::{Error, ResultExt};
use sec::Secret;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The environment variable used when no API key is in the config file.
pub const TOKEN_VAR: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub github: GitHubConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub collect: CollectConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();
        debug!("Reading config from {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|_| format!("Unable to read {}", path.display()))?;
        let cfg = toml::from_str(&content).context("Invalid config file")?;

        Ok(cfg)
    }

    pub fn example() -> Config {
        Config {
            github: GitHubConfig {
                organisation: String::from("MISP"),
                api_key: Some(Secret::new(String::from("your API key"))),
                ..Default::default()
            },
            store: StoreConfig::default(),
            collect: CollectConfig {
                skip_list: PathBuf::from("skip_repo.json"),
                ..Default::default()
            },
            report: ReportConfig {
                skip: vec![String::from("cti-python-stix2"), String::from("SwiftCodes")],
                ..Default::default()
            },
        }
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        let s = toml::to_string_pretty(self).context("Unable to serialize the config")?;
        Ok(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// The organisation whose repositories are tracked.
    pub organisation: String,
    /// A personal access token. Falls back to the `GITHUB_TOKEN` environment
    /// variable when not set.
    pub api_key: Option<Secret<String>>,
    pub agent: String,
    pub api_root: String,
    pub per_page: u32,
}

impl GitHubConfig {
    pub const DEFAULT_AGENT: &'static str = "contrib-stats";
    pub const DEFAULT_API_ROOT: &'static str = "https://api.github.com";

    /// The token to authenticate with.
    pub fn token(&self) -> Result<Secret<String>, Error> {
        if let Some(ref key) = self.api_key {
            return Ok(key.clone());
        }

        let tok = env::var(TOKEN_VAR).with_context(|_| {
            format!("No api_key in the config and {} isn't set", TOKEN_VAR)
        })?;
        Ok(Secret::new(tok))
    }
}

impl Default for GitHubConfig {
    fn default() -> GitHubConfig {
        GitHubConfig {
            organisation: String::new(),
            api_key: None,
            agent: GitHubConfig::DEFAULT_AGENT.into(),
            api_root: GitHubConfig::DEFAULT_API_ROOT.into(),
            per_page: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Where to find the Redis instance holding the aggregates.
    pub url: String,
}

impl Default for StoreConfig {
    fn default() -> StoreConfig {
        StoreConfig {
            url: String::from("redis://127.0.0.1:6379/11"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectConfig {
    /// Requests made for a repository's statistics before giving up and
    /// marking it as pending.
    pub attempts: u32,
    /// Seconds to wait after GitHub says the statistics are still being
    /// computed.
    pub retry_delay: u64,
    /// Seconds to wait before re-requesting a page which wasn't ready.
    pub pagination_delay: u64,
    /// A JSON array of repository names which are never collected. An empty
    /// path means nothing is skipped.
    pub skip_list: PathBuf,
}

impl CollectConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay)
    }

    pub fn pagination_delay(&self) -> Duration {
        Duration::from_secs(self.pagination_delay)
    }
}

impl Default for CollectConfig {
    fn default() -> CollectConfig {
        CollectConfig {
            attempts: 6,
            retry_delay: 7,
            pagination_delay: 2,
            skip_list: PathBuf::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub output: PathBuf,
    pub title: String,
    pub permalink: String,
    /// Repositories which are collected but left out of the report.
    pub skip: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> ReportConfig {
        ReportConfig {
            output: PathBuf::from("contributors.md"),
            title: String::from("MISP contributors per repository"),
            permalink: String::from("/contributors/"),
            skip: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempdir::TempDir;

    #[test]
    fn example_config_round_trips() {
        let example = Config::example();

        let got: Config = toml::from_str(&example.as_toml().unwrap()).unwrap();

        assert_eq!(got, example);
    }

    #[test]
    fn missing_sections_use_defaults() {
        let temp = TempDir::new("config").unwrap();
        let path = temp.path().join("config.toml");
        let mut f = fs::File::create(&path).unwrap();
        writeln!(f, "[github]\norganisation = \"MISP\"\napi_key = \"secret\"").unwrap();

        let got = Config::from_file(&path).unwrap();

        assert_eq!(got.github.organisation, "MISP");
        assert_eq!(got.github.token().unwrap().reveal_str(), "secret");
        assert_eq!(got.github.api_root, GitHubConfig::DEFAULT_API_ROOT);
        assert_eq!(got.collect.attempts, 6);
        assert_eq!(got.collect.retry_delay(), Duration::from_secs(7));
        assert_eq!(got.collect.pagination_delay(), Duration::from_secs(2));
        assert_eq!(got.store, StoreConfig::default());
        assert_eq!(got.report.output, PathBuf::from("contributors.md"));
    }

    #[test]
    fn a_missing_file_is_an_error() {
        let temp = TempDir::new("config").unwrap();

        assert!(Config::from_file(temp.path().join("nope.toml")).is_err());
    }
}
