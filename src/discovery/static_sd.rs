use labels::{ADDRESS_LABEL, LabelSet};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{Provider, ProviderContext, TargetGroup, Update};

/// A list of targets which share the same labels.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct StaticConfig {
    /// The targets, in the form of `host:port`, the port could be omitted.
    #[serde(default)]
    pub targets: Vec<String>,

    /// Labels assigned to all targets of this group.
    #[serde(default)]
    pub labels: LabelSet,
}

impl StaticConfig {
    fn to_group(&self, index: usize) -> TargetGroup {
        TargetGroup {
            source: index.to_string(),
            targets: self
                .targets
                .iter()
                .map(|target| LabelSet::from_pairs([(ADDRESS_LABEL, target.as_str())]))
                .collect(),
            labels: self.labels.clone(),
        }
    }
}

pub struct StaticProvider {
    groups: Vec<TargetGroup>,
}

impl StaticProvider {
    pub fn new(configs: &[StaticConfig]) -> Self {
        let groups = configs
            .iter()
            .enumerate()
            .map(|(index, config)| config.to_group(index))
            .collect();

        Self { groups }
    }
}

#[async_trait::async_trait]
impl Provider for StaticProvider {
    async fn run(self: Box<Self>, _cx: ProviderContext, updates: mpsc::Sender<Update>) {
        let update = self.groups.into_iter().map(Some).collect();

        // static groups never change, nothing to do after the first update
        let _ = updates.send(update).await;
    }
}

#[cfg(test)]
mod tests {
    use labels::labels;
    use pretty_assertions::assert_eq;
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::discovery::DiscoveryLog;

    #[tokio::test]
    async fn one_group_per_config() {
        let configs: Vec<StaticConfig> = serde_yaml::from_str(
            r#"
- targets: ["1.2.3.4", "5.6.7.8:9100"]
  labels:
    env: prod
- targets: ["localhost:9090"]
"#,
        )
        .unwrap();

        let (tx, mut rx) = mpsc::channel(1);
        let cx = ProviderContext {
            name: "static".to_string(),
            shutdown: CancellationToken::new(),
            log: DiscoveryLog::new(),
        };
        Box::new(StaticProvider::new(&configs)).run(cx, tx).await;

        let update = rx.recv().await.unwrap();
        assert_eq!(
            update,
            vec![
                Some(TargetGroup {
                    source: "0".to_string(),
                    targets: vec![
                        labels!("__address__" => "1.2.3.4"),
                        labels!("__address__" => "5.6.7.8:9100"),
                    ],
                    labels: labels!("env" => "prod"),
                }),
                Some(TargetGroup {
                    source: "1".to_string(),
                    targets: vec![labels!("__address__" => "localhost:9090")],
                    labels: LabelSet::new(),
                }),
            ]
        );

        // the sender is dropped once the groups are sent
        assert!(rx.recv().await.is_none());
    }
}
