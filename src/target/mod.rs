mod address;
mod populate;

pub use address::{check_target_address, should_add_port, split_host_port};
pub use populate::{LabelError, merge_labels, populate_labels};

use labels::LabelSet;
use serde::Serialize;

use crate::config::ScrapeConfig;
use crate::discovery::TargetGroup;

/// A candidate of the group failed to become a target.
#[derive(Debug, thiserror::Error)]
#[error("build target {index} of group {group:?} failed, {err}")]
pub struct Error {
    pub index: usize,
    pub group: String,
    #[source]
    pub err: LabelError,
}

/// A would-be scrape endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Target {
    pub job_name: String,
    /// Source of the group the target was discovered in.
    pub source: String,
    /// Labels before relabeling, with the scrape metadata injected.
    pub labels_before: LabelSet,
    /// Final labels of the target, `None` if relabeling dropped it.
    pub labels_after: Option<LabelSet>,
}

impl Target {
    pub fn is_dropped(&self) -> bool {
        self.labels_after.is_none()
    }
}

/// Expand one group into targets, members are processed in order and the
/// first failure is returned.
pub fn targets_from_group(group: &TargetGroup, job: &ScrapeConfig) -> Result<Vec<Target>, Error> {
    group
        .targets
        .iter()
        .enumerate()
        .map(|(index, labels)| {
            let merged = merge_labels(labels, &group.labels);
            let (labels_after, labels_before) =
                populate_labels(&merged, job).map_err(|err| Error {
                    index,
                    group: group.source.clone(),
                    err,
                })?;

            Ok(Target {
                job_name: job.job_name.clone(),
                source: group.source.clone(),
                labels_before,
                labels_after,
            })
        })
        .collect()
}

/// Build targets for all groups of a job. Dropped targets are kept, it's up
/// to the caller to hide them.
pub fn assemble<'a>(
    groups: impl IntoIterator<Item = &'a TargetGroup>,
    job: &ScrapeConfig,
) -> Result<Vec<Target>, Error> {
    let mut targets = vec![];

    for group in groups {
        targets.extend(targets_from_group(group, job)?);
    }

    Ok(targets)
}
