use labels::{
    ADDRESS_LABEL, Builder, INSTANCE_LABEL, JOB_LABEL, LabelSet, META_LABEL_PREFIX,
    METRICS_PATH_LABEL, PARAM_LABEL_PREFIX, SCHEME_LABEL, is_valid_label_value,
};

use super::address::{check_target_address, should_add_port};
use crate::config::ScrapeConfig;

/// Errors of a single target, they indicate a malformed configuration.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum LabelError {
    #[error("no address")]
    NoAddress,
    #[error("invalid scheme: {0:?}")]
    InvalidScheme(String),
    #[error("invalid address {address:?}, {reason}")]
    InvalidAddress {
        address: String,
        reason: &'static str,
    },
    #[error("invalid label value for {name:?}: {value:?}")]
    InvalidLabelValue { name: String, value: String },
}

/// Merge labels of a discovered target with the common labels of its group,
/// labels of the target take precedence.
pub fn merge_labels(target: &LabelSet, group: &LabelSet) -> LabelSet {
    let mut merged = group.clone().into_map();
    merged.extend(
        target
            .iter()
            .map(|label| (label.name.clone(), label.value.clone())),
    );

    LabelSet::from(merged)
}

/// Builds the label set of a target from its discovered labels, and the scrape
/// configuration of the job.
///
/// The first returned set is the final label set, it is `None` if the target
/// is dropped by relabeling. The second one is the label set before relabeling.
pub fn populate_labels(
    labels: &LabelSet,
    job: &ScrapeConfig,
) -> Result<(Option<LabelSet>, LabelSet), LabelError> {
    let mut builder = Builder::new(labels);

    // scrape metadata never overwrites discovered values
    for (name, value) in [
        (JOB_LABEL, job.job_name.as_str()),
        (METRICS_PATH_LABEL, job.metrics_path.as_str()),
        (SCHEME_LABEL, job.scheme.as_str()),
    ] {
        if builder.get(name).unwrap_or_default().is_empty() {
            builder.set(name, value);
        }
    }

    for (name, values) in &job.params {
        if let Some(first) = values.first() {
            builder.set(format!("{PARAM_LABEL_PREFIX}{name}"), first.as_str());
        }
    }

    let before = builder.labels();
    let Some(relabeled) = relabel::process(&before, &job.relabel_configs) else {
        return Ok((None, before));
    };

    let mut builder = Builder::from(relabeled);

    let mut address = builder
        .get(ADDRESS_LABEL)
        .unwrap_or_default()
        .to_string();
    if address.is_empty() {
        return Err(LabelError::NoAddress);
    }

    // addresses reaching this point are already wrapped in [] if necessary
    if should_add_port(&address) {
        match builder.get(SCHEME_LABEL).unwrap_or_default() {
            "http" | "" => address.push_str(":80"),
            "https" => address.push_str(":443"),
            scheme => return Err(LabelError::InvalidScheme(scheme.to_string())),
        }

        builder.set(ADDRESS_LABEL, address.as_str());
    }

    check_target_address(&address).map_err(|reason| LabelError::InvalidAddress {
        address: address.clone(),
        reason,
    })?;

    // meta labels are deleted after relabeling, other internal labels propagate
    // to the target which decides whether they will be part of their label set.
    builder.retain(|name, _value| !name.starts_with(META_LABEL_PREFIX));

    // default the instance label to the target address
    if builder.get(INSTANCE_LABEL).unwrap_or_default().is_empty() {
        builder.set(INSTANCE_LABEL, address);
    }

    let after = builder.labels();
    if let Some(label) = after
        .iter()
        .find(|label| !is_valid_label_value(&label.value))
    {
        return Err(LabelError::InvalidLabelValue {
            name: label.name.clone(),
            value: label.value.clone(),
        });
    }

    Ok((Some(after), before))
}
