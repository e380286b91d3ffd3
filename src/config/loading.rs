use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{Config, Error};

/// Only the data section of a ConfigMap matters, everything else
/// (apiVersion, metadata, ...) is ignored.
#[derive(Deserialize)]
struct ConfigMap {
    #[serde(default)]
    data: BTreeMap<String, String>,
}

/// Loads a configuration from path. If `configmap_item` is present the file is
/// treated as a Kubernetes ConfigMap manifest, and the configuration is read from
/// the data item with that name.
pub fn load(path: &Path, configmap_item: Option<&str>) -> Result<Config, Error> {
    let content = std::fs::read_to_string(path).map_err(|err| Error::Io {
        path: path.to_path_buf(),
        err,
    })?;

    match configmap_item {
        Some(item) => {
            let configmap =
                serde_yaml::from_str::<ConfigMap>(&content).map_err(Error::ConfigMap)?;
            let text = configmap
                .data
                .get(item)
                .ok_or_else(|| Error::MissingConfigMapItem(item.to_string()))?;

            debug!(message = "Load config from configmap", ?path, item);

            load_from_str(text)
        }
        None => load_from_str(&content),
    }
}

pub fn load_from_str(text: &str) -> Result<Config, Error> {
    let mut config = serde_yaml::from_str::<Config>(text)?;
    config.complete()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rand::Rng;
    use rand::distr::Alphanumeric;

    use super::*;

    fn temp_file(content: &str) -> PathBuf {
        let name = rand::rng()
            .sample_iter(Alphanumeric)
            .take(8)
            .map(char::from)
            .collect::<String>();
        let path = std::env::temp_dir().join(format!("promeval-config-{name}.yaml"));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn plain_file() {
        let path = temp_file(
            r#"
scrape_configs:
  - job_name: node
"#,
        );

        let config = load(&path, None).unwrap();
        assert!(config.job("node").is_some());

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn configmap() {
        let path = temp_file(
            r#"
apiVersion: v1
kind: ConfigMap
metadata:
  name: prometheus
  namespace: monitoring
data:
  prometheus.yml: |
    scrape_configs:
      - job_name: from-configmap
"#,
        );

        let config = load(&path, Some("prometheus.yml")).unwrap();
        assert!(config.job("from-configmap").is_some());

        let err = load(&path, Some("missing.yml")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "no data item \"missing.yml\" in given configmap"
        );

        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn file_not_found() {
        let path = std::env::temp_dir().join("promeval-this-file-does-not-exist.yaml");

        let err = load(&path, None).unwrap_err();
        assert!(matches!(err, Error::Io { .. }), "{err}");
    }
}
