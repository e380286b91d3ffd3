mod loading;

pub use loading::{load, load_from_str};

use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;

use labels::LabelSet;
use relabel::RelabelConfig;
use serde::{Deserialize, Serialize};

use crate::discovery::{DnsSdConfig, FileSdConfig, QueryType, StaticConfig};

const fn default_scrape_interval() -> Duration {
    Duration::from_secs(60)
}

const fn default_scrape_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_scheme() -> String {
    "http".to_string()
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("read config file {path:?} failed, {err}")]
    Io { path: PathBuf, err: std::io::Error },
    #[error("parse config failed, {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("load config file as configmap failed, {0}")]
    ConfigMap(serde_yaml::Error),
    #[error("no data item {0:?} in given configmap")]
    MissingConfigMapItem(String),

    #[error("job_name is empty")]
    EmptyJobName,
    #[error("found multiple scrape configs with job name {0:?}")]
    DuplicateJob(String),
    #[error("invalid scheme {scheme:?} of job {job:?}, must be \"http\" or \"https\"")]
    InvalidScheme { job: String, scheme: String },
    #[error("scrape timeout greater than scrape interval for job {0:?}")]
    TimeoutTooLarge(String),
    #[error("a port is required in DNS-SD configs for all record types except SRV, job {0:?}")]
    DnsPort(String),
    #[error("refresh_interval of service discovery must be greater than zero, job {0:?}")]
    ZeroRefreshInterval(String),
    #[error("invalid relabel config of job {job:?}, {err}")]
    Relabel { job: String, err: relabel::Error },
}

/// Global configuration, values are used as defaults of the scrape configs.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct GlobalConfig {
    #[serde(default = "default_scrape_interval", with = "crate::duration::serde")]
    pub scrape_interval: Duration,

    #[serde(default = "default_scrape_timeout", with = "crate::duration::serde")]
    pub scrape_timeout: Duration,

    /// Labels attached to any time series or alerts when communicating with
    /// external systems, they never show up in target labels.
    #[serde(default)]
    pub external_labels: LabelSet,

    #[serde(flatten, skip_serializing)]
    pub unsupported: BTreeMap<String, serde_yaml::Value>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            scrape_interval: default_scrape_interval(),
            scrape_timeout: default_scrape_timeout(),
            external_labels: LabelSet::default(),
            unsupported: BTreeMap::new(),
        }
    }
}

/// Scrape configuration of a single job, it describes how targets are discovered
/// and how their labels are rewritten.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ScrapeConfig {
    /// The job name to which the job label is set by default.
    pub job_name: String,

    /// How frequently to scrape targets from this job, defaults to the global one.
    #[serde(default, with = "crate::duration::serde_option")]
    pub scrape_interval: Option<Duration>,

    /// Per-scrape timeout, defaults to the global one.
    #[serde(default, with = "crate::duration::serde_option")]
    pub scrape_timeout: Option<Duration>,

    /// The HTTP resource path on which to fetch metrics from targets.
    #[serde(default = "default_metrics_path")]
    pub metrics_path: String,

    /// Configures the protocol scheme used for requests.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Optional HTTP URL parameters.
    #[serde(default)]
    pub params: BTreeMap<String, Vec<String>>,

    /// Rules applied to discovered targets before they are scraped.
    #[serde(default)]
    pub relabel_configs: Vec<RelabelConfig>,

    /// Rules applied to scraped samples before ingestion.
    #[serde(default)]
    pub metric_relabel_configs: Vec<RelabelConfig>,

    #[serde(default)]
    pub static_configs: Vec<StaticConfig>,

    #[serde(default)]
    pub file_sd_configs: Vec<FileSdConfig>,

    #[serde(default)]
    pub dns_sd_configs: Vec<DnsSdConfig>,

    /// Options this tool does not model, e.g. `basic_auth` or other discovery
    /// mechanisms, they are reported and then ignored.
    #[serde(flatten, skip_serializing)]
    pub unsupported: BTreeMap<String, serde_yaml::Value>,
}

impl ScrapeConfig {
    /// A job with defaults for everything except the name, handy for
    /// building configs in code.
    pub fn new(job_name: impl Into<String>) -> Self {
        Self {
            job_name: job_name.into(),
            scrape_interval: None,
            scrape_timeout: None,
            metrics_path: default_metrics_path(),
            scheme: default_scheme(),
            params: BTreeMap::new(),
            relabel_configs: vec![],
            metric_relabel_configs: vec![],
            static_configs: vec![],
            file_sd_configs: vec![],
            dns_sd_configs: vec![],
            unsupported: BTreeMap::new(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if self.job_name.is_empty() {
            return Err(Error::EmptyJobName);
        }

        if self.scheme != "http" && self.scheme != "https" {
            return Err(Error::InvalidScheme {
                job: self.job_name.clone(),
                scheme: self.scheme.clone(),
            });
        }

        if let (Some(interval), Some(timeout)) = (self.scrape_interval, self.scrape_timeout) {
            if timeout > interval {
                return Err(Error::TimeoutTooLarge(self.job_name.clone()));
            }
        }

        if self
            .dns_sd_configs
            .iter()
            .any(|sd| sd.query_type != QueryType::SRV && sd.port == 0)
        {
            return Err(Error::DnsPort(self.job_name.clone()));
        }

        let zero_refresh = self
            .file_sd_configs
            .iter()
            .map(|sd| sd.refresh_interval)
            .chain(self.dns_sd_configs.iter().map(|sd| sd.refresh_interval))
            .any(|interval| interval.is_zero());
        if zero_refresh {
            return Err(Error::ZeroRefreshInterval(self.job_name.clone()));
        }

        self.relabel_configs
            .iter()
            .chain(self.metric_relabel_configs.iter())
            .try_for_each(|rule| rule.validate())
            .map_err(|err| Error::Relabel {
                job: self.job_name.clone(),
                err,
            })
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub global: GlobalConfig,

    #[serde(default)]
    pub scrape_configs: Vec<ScrapeConfig>,

    #[serde(flatten, skip_serializing)]
    pub unsupported: BTreeMap<String, serde_yaml::Value>,
}

impl Config {
    pub fn job(&self, name: &str) -> Option<&ScrapeConfig> {
        self.scrape_configs.iter().find(|job| job.job_name == name)
    }

    /// Fill job level defaults from the global section, and validate the
    /// result.
    pub(crate) fn complete(&mut self) -> Result<(), Error> {
        let mut names = HashSet::new();

        for job in &mut self.scrape_configs {
            let interval = *job
                .scrape_interval
                .get_or_insert(self.global.scrape_interval);
            // the global timeout is capped by the job's interval
            job.scrape_timeout
                .get_or_insert(self.global.scrape_timeout.min(interval));

            job.validate()?;

            if !names.insert(job.job_name.clone()) {
                return Err(Error::DuplicateJob(job.job_name.clone()));
            }
        }

        self.warn_unsupported();

        Ok(())
    }

    fn warn_unsupported(&self) {
        for key in self.unsupported.keys().chain(self.global.unsupported.keys()) {
            warn!(message = "Unsupported configuration ignored", %key);
        }

        for job in &self.scrape_configs {
            for key in job.unsupported.keys() {
                warn!(
                    message = "Unsupported scrape configuration ignored",
                    job = %job.job_name,
                    %key
                );
            }
        }
    }
}
