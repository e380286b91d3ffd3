use std::path::{Path, PathBuf};
use std::time::Duration;

use labels::{ADDRESS_LABEL, LabelSet};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{Provider, ProviderContext, TargetGroup, Update, refresh};

/// The path of the file the group was read from.
const FILEPATH_LABEL: &str = "__meta_filepath";

const fn default_refresh_interval() -> Duration {
    Duration::from_secs(5 * 60)
}

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("invalid file pattern {pattern:?}, {err}")]
    Pattern {
        pattern: String,
        err: glob::PatternError,
    },
    #[error("read file {path:?} failed, {err}")]
    Read { path: PathBuf, err: std::io::Error },
    #[error("decode json file {path:?} failed, {err}")]
    Json {
        path: PathBuf,
        err: serde_json::Error,
    },
    #[error("decode yaml file {path:?} failed, {err}")]
    Yaml {
        path: PathBuf,
        err: serde_yaml::Error,
    },
}

/// Discover targets from JSON or YAML files, every file holds a list of
/// `{targets, labels}` objects.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileSdConfig {
    /// Patterns of the files to read, the last path segment may contain
    /// a single `*`, e.g. `my/path/tg_*.json`
    pub files: Vec<String>,

    /// Refresh interval to re-read the files.
    #[serde(default = "default_refresh_interval", with = "crate::duration::serde")]
    pub refresh_interval: Duration,
}

/// The shape of a group in the files.
#[derive(Deserialize)]
struct FileGroup {
    #[serde(default)]
    targets: Vec<String>,
    #[serde(default)]
    labels: LabelSet,
}

enum Format {
    Json,
    Yaml,
}

impl Format {
    fn from_path(path: &Path) -> Option<Format> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "json" => Some(Format::Json),
            "yml" | "yaml" => Some(Format::Yaml),
            _ => None,
        }
    }
}

pub struct FileProvider {
    config: FileSdConfig,
}

impl FileProvider {
    pub fn new(config: FileSdConfig) -> Self {
        Self { config }
    }

    fn paths(&self, cx: &ProviderContext) -> Vec<PathBuf> {
        let mut paths = vec![];

        for pattern in &self.config.files {
            let entries = match glob::glob(pattern) {
                Ok(entries) => entries,
                Err(err) => {
                    let err = Error::Pattern {
                        pattern: pattern.clone(),
                        err,
                    };
                    cx.report("Error expanding glob", err);
                    continue;
                }
            };

            for entry in entries {
                match entry {
                    Ok(path) => {
                        if Format::from_path(&path).is_none() {
                            debug!(message = "Skip file with unknown extension", ?path);
                            continue;
                        }

                        paths.push(path);
                    }
                    Err(err) => cx.report("Error expanding glob", err),
                }
            }
        }

        paths
    }

    async fn list_groups(&self, cx: &ProviderContext) -> Update {
        let mut update = vec![];

        for path in self.paths(cx) {
            match read_file(&path).await {
                Ok(groups) => update.extend(groups.into_iter().map(Some)),
                Err(err) => cx.report("Error reading file", err),
            }
        }

        update
    }
}

#[async_trait::async_trait]
impl Provider for FileProvider {
    async fn run(self: Box<Self>, cx: ProviderContext, updates: mpsc::Sender<Update>) {
        let interval = self.config.refresh_interval;

        refresh(&cx, interval, updates, || self.list_groups(&cx)).await
    }
}

async fn read_file(path: &Path) -> Result<Vec<TargetGroup>, Error> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| Error::Read {
            path: path.to_path_buf(),
            err,
        })?;

    let groups: Vec<FileGroup> = match Format::from_path(path) {
        Some(Format::Json) => serde_json::from_str(&content).map_err(|err| Error::Json {
            path: path.to_path_buf(),
            err,
        })?,
        // an empty yaml file holds no group
        _ if content.trim().is_empty() => vec![],
        _ => serde_yaml::from_str(&content).map_err(|err| Error::Yaml {
            path: path.to_path_buf(),
            err,
        })?,
    };

    let filepath = path.to_string_lossy();
    let groups = groups
        .into_iter()
        .enumerate()
        .map(|(index, group)| {
            let mut labels = group.labels.into_map();
            labels.insert(FILEPATH_LABEL.to_string(), filepath.to_string());

            TargetGroup {
                source: format!("{}:{}", filepath, index),
                targets: group
                    .targets
                    .iter()
                    .map(|target| LabelSet::from_pairs([(ADDRESS_LABEL, target.as_str())]))
                    .collect(),
                labels: LabelSet::from(labels),
            }
        })
        .collect();

    Ok(groups)
}
