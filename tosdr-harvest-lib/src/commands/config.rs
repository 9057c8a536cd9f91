use crate::Result;
use crate::crawl::{CrawlSettings, DEFAULT_MAX_EMPTY_PAGES, DEFAULT_USER_AGENTS, DEFAULT_WORKERS, FetchPolicy, TOSDR_API_BASE};
use camino::{Utf8Path, Utf8PathBuf};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "tosdr-harvest.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Root of the ToS;DR API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path of the JSON dataset to produce
    #[serde(default = "default_output")]
    pub output: Utf8PathBuf,

    /// Attempts per request
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Unit of the escalating backoff after a 429 response
    #[serde(default = "default_base_backoff", with = "humantime_serde")]
    pub base_backoff: Duration,

    /// Flat backoff after a transport failure
    #[serde(default = "default_transient_backoff", with = "humantime_serde")]
    pub transient_backoff: Duration,

    /// Hard timeout of a single request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Lower bound of the pre-request jitter
    #[serde(default = "default_jitter_min", with = "humantime_serde")]
    pub jitter_min: Duration,

    /// Upper bound of the pre-request jitter
    #[serde(default = "default_jitter_max", with = "humantime_serde")]
    pub jitter_max: Duration,

    /// Concurrent detail fetches
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Consecutive empty listing pages that end index discovery
    #[serde(default = "default_max_empty_pages")]
    pub max_empty_pages: u32,

    /// Rotating `User-Agent` values
    #[serde(default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

fn default_base_url() -> String {
    TOSDR_API_BASE.to_string()
}

fn default_output() -> Utf8PathBuf {
    Utf8PathBuf::from("data/TOSDR/tosdr_links_only.json")
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_base_backoff() -> Duration {
    Duration::from_secs(5)
}

const fn default_transient_backoff() -> Duration {
    Duration::from_secs(1)
}

const fn default_request_timeout() -> Duration {
    Duration::from_secs(10)
}

const fn default_jitter_min() -> Duration {
    Duration::from_millis(100)
}

const fn default_jitter_max() -> Duration {
    Duration::from_millis(300)
}

const fn default_workers() -> usize {
    DEFAULT_WORKERS
}

const fn default_max_empty_pages() -> u32 {
    DEFAULT_MAX_EMPTY_PAGES
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(ToString::to_string).collect()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `tosdr-harvest.toml` is looked up in `base_dir`
    /// and its absence is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or fails validation
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading tosdr-harvest configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading tosdr-harvest configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or inconsistent
    pub fn validate(&self) -> Result<()> {
        let _ = Url::parse(&self.base_url).into_app_err_with(|| format!("base_url '{}' is not a valid URL", self.base_url))?;

        if self.max_retries == 0 {
            return Err(app_err!("max_retries must be at least 1"));
        }

        if self.workers == 0 {
            return Err(app_err!("workers must be at least 1"));
        }

        if self.max_empty_pages == 0 {
            return Err(app_err!("max_empty_pages must be at least 1"));
        }

        if self.jitter_min > self.jitter_max {
            return Err(app_err!(
                "jitter_min ({:?}) must not exceed jitter_max ({:?})",
                self.jitter_min,
                self.jitter_max
            ));
        }

        if self.user_agents.is_empty() {
            return Err(app_err!("user_agents must contain at least one entry"));
        }

        if self.output.as_str().is_empty() {
            return Err(app_err!("output must not be empty"));
        }

        Ok(())
    }

    /// Build the crawl settings described by this configuration
    #[must_use]
    pub fn crawl_settings(&self) -> CrawlSettings {
        CrawlSettings {
            base_url: self.base_url.clone(),
            fetch: FetchPolicy {
                max_retries: self.max_retries,
                base_backoff: self.base_backoff,
                transient_backoff: self.transient_backoff,
                timeout: self.request_timeout,
                jitter_min: self.jitter_min,
                jitter_max: self.jitter_max,
                user_agents: self.user_agents.clone(),
            },
            workers: self.workers,
            max_empty_pages: self.max_empty_pages,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}
