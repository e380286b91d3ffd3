use labels::LabelSet;
use relabel::RelabelConfig;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::discovery::{Cancelled, DiscoveryLog, DiscoveryOptions, aggregate, providers_for};
use crate::filter::{JobFilter, SourceFilter, sort_targets};
use crate::target::{self, Target, assemble};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("job {0:?} not found")]
    JobNotFound(String),
    #[error("no relabel rules selected for job {0:?}")]
    NoRelabelRules(String),
    #[error(transparent)]
    Cancelled(#[from] Cancelled),
    #[error("evaluate targets of job {job:?} failed, {err}")]
    Target { job: String, err: target::Error },
}

/// Labels of a label set before and after relabeling, `after` is `None`
/// if the label set is dropped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RelabelResult {
    pub before: LabelSet,
    pub after: Option<LabelSet>,
}

/// Discover and build the targets of all selected jobs. Jobs are evaluated
/// one after another, the result is ordered by job name and source.
///
/// Dropped targets are part of the result.
pub async fn evaluate_targets(
    config: &Config,
    jobs: &JobFilter,
    sources: &SourceFilter,
    options: &DiscoveryOptions,
    shutdown: &CancellationToken,
    log: &DiscoveryLog,
) -> Result<Vec<Target>, Error> {
    let mut targets = vec![];

    for job in config
        .scrape_configs
        .iter()
        .filter(|job| jobs.matches(&job.job_name))
    {
        let providers = providers_for(job);
        debug!(
            message = "Discovering targets",
            job = %job.job_name,
            providers = providers.len()
        );

        let groups = aggregate(providers, options, shutdown, log).await?;
        let selected = groups
            .values()
            .filter(|group| sources.matches(&group.source));

        let built = assemble(selected, job).map_err(|err| Error::Target {
            job: job.job_name.clone(),
            err,
        })?;

        debug!(
            message = "Targets built",
            job = %job.job_name,
            groups = groups.len(),
            targets = built.len()
        );

        targets.extend(built);
    }

    sort_targets(&mut targets);

    Ok(targets)
}

/// Apply relabel rules of the job to the input labels. Target relabel rules
/// run before metric relabel rules.
pub fn evaluate_relabel(
    config: &Config,
    job_name: &str,
    input: &LabelSet,
    include_target_rules: bool,
    include_metric_rules: bool,
) -> Result<RelabelResult, Error> {
    let job = config
        .job(job_name)
        .ok_or_else(|| Error::JobNotFound(job_name.to_string()))?;

    let mut rules: Vec<RelabelConfig> = vec![];
    if include_target_rules {
        rules.extend(job.relabel_configs.iter().cloned());
    }
    if include_metric_rules {
        rules.extend(job.metric_relabel_configs.iter().cloned());
    }

    if rules.is_empty() {
        return Err(Error::NoRelabelRules(job_name.to_string()));
    }

    Ok(RelabelResult {
        before: input.clone(),
        after: relabel::process(input, &rules),
    })
}

#[cfg(test)]
mod tests {
    use labels::labels;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::load_from_str;

    const CONFIG: &str = r#"
scrape_configs:
  - job_name: node
    static_configs:
      - targets: ["1.2.3.4"]
        labels:
          env: prod
      - targets: ["5.6.7.8:9100"]
    relabel_configs:
      - source_labels: [env]
        target_label: environment
    metric_relabel_configs:
      - source_labels: [__name__]
        regex: go_.*
        action: drop
  - job_name: empty
"#;

    #[tokio::test]
    async fn targets() {
        let config = load_from_str(CONFIG).unwrap();

        let targets = evaluate_targets(
            &config,
            &JobFilter::default(),
            &SourceFilter::default(),
            &DiscoveryOptions::default(),
            &CancellationToken::new(),
            &DiscoveryLog::new(),
        )
        .await
        .unwrap();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].source, "static/0");
        assert_eq!(
            targets[0].labels_after,
            Some(labels!(
                "__address__" => "1.2.3.4:80",
                "__metrics_path__" => "/metrics",
                "__scheme__" => "http",
                "env" => "prod",
                "environment" => "prod",
                "instance" => "1.2.3.4:80",
                "job" => "node",
            ))
        );
        assert_eq!(targets[1].source, "static/1");
    }

    #[tokio::test]
    async fn filtered() {
        let config = load_from_str(CONFIG).unwrap();

        let targets = evaluate_targets(
            &config,
            &JobFilter::new(vec!["node".to_string()]),
            &SourceFilter::new("static/1").unwrap(),
            &DiscoveryOptions::default(),
            &CancellationToken::new(),
            &DiscoveryLog::new(),
        )
        .await
        .unwrap();
        assert_eq!(targets.len(), 1);
        assert_eq!(
            targets[0].labels_after.as_ref().unwrap().get("instance"),
            Some("5.6.7.8:9100")
        );

        let targets = evaluate_targets(
            &config,
            &JobFilter::new(vec!["empty".to_string()]),
            &SourceFilter::default(),
            &DiscoveryOptions::default(),
            &CancellationToken::new(),
            &DiscoveryLog::new(),
        )
        .await
        .unwrap();
        assert!(targets.is_empty());
    }

    #[tokio::test]
    async fn cancelled() {
        let config = load_from_str(CONFIG).unwrap();
        let shutdown = CancellationToken::new();
        shutdown.cancel();

        let err = evaluate_targets(
            &config,
            &JobFilter::default(),
            &SourceFilter::default(),
            &DiscoveryOptions::default(),
            &shutdown,
            &DiscoveryLog::new(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Cancelled(_)), "{err}");
    }

    #[test]
    fn relabel() {
        let config = load_from_str(CONFIG).unwrap();
        let input = labels!("__name__" => "go_goroutines", "env" => "dev");

        let result = evaluate_relabel(&config, "node", &input, true, false).unwrap();
        assert_eq!(result.before, input);
        assert_eq!(
            result.after,
            Some(labels!(
                "__name__" => "go_goroutines",
                "env" => "dev",
                "environment" => "dev",
            ))
        );

        let result = evaluate_relabel(&config, "node", &input, true, true).unwrap();
        assert_eq!(result.after, None);
    }

    #[test]
    fn relabel_errors() {
        let config = load_from_str(CONFIG).unwrap();
        let input = labels!("a" => "b");

        let err = evaluate_relabel(&config, "missing", &input, true, true).unwrap_err();
        assert_eq!(err.to_string(), "job \"missing\" not found");

        let err = evaluate_relabel(&config, "empty", &input, true, true).unwrap_err();
        assert_eq!(err.to_string(), "no relabel rules selected for job \"empty\"");

        let err = evaluate_relabel(&config, "node", &input, false, false).unwrap_err();
        assert!(matches!(err, Error::NoRelabelRules(_)));
    }
}
