use std::collections::BTreeMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::{DiscoveryLog, Provider, ProviderContext, TargetGroup, Update};

/// How long to wait for the first update of a provider.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DiscoveryOptions {
    pub timeout: Duration,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// The shutdown signal fired while discovering.
#[derive(Debug, thiserror::Error)]
#[error("discovery cancelled")]
pub struct Cancelled;

/// Run all providers concurrently, and collect the first update of each of them.
///
/// Groups are keyed by `<provider name>/<group source>`, and the source of
/// returned groups is rewritten to that key. Providers which do not send
/// anything in `options.timeout` contribute nothing. Once every provider is
/// done, or timed out, all providers are told to stop.
pub async fn aggregate(
    providers: Vec<(String, Box<dyn Provider>)>,
    options: &DiscoveryOptions,
    shutdown: &CancellationToken,
    log: &DiscoveryLog,
) -> Result<BTreeMap<String, TargetGroup>, Cancelled> {
    let scope = shutdown.child_token();
    let mut tasks = JoinSet::new();

    for (index, (name, provider)) in providers.into_iter().enumerate() {
        let (tx, rx) = mpsc::channel(1);
        let cx = ProviderContext {
            name: name.clone(),
            shutdown: scope.clone(),
            log: log.clone(),
        };

        // providers are not waited on, they stop once the scope is cancelled
        tokio::spawn(provider.run(cx, tx));

        tasks.spawn(first_update(
            index,
            name,
            rx,
            scope.clone(),
            options.timeout,
            log.clone(),
        ));
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(result) = tasks.join_next().await {
        match result {
            Ok(result) => results.push(result),
            Err(err) => error!(message = "Discovery worker failed", %err),
        }
    }

    scope.cancel();

    if shutdown.is_cancelled() {
        return Err(Cancelled);
    }

    // the order workers finish in is random, merging by provider order keeps
    // the result deterministic
    results.sort_by_key(|(index, _)| *index);

    let mut groups = BTreeMap::new();
    for (_index, entries) in results {
        groups.extend(entries);
    }

    Ok(groups)
}

async fn first_update(
    index: usize,
    name: String,
    mut updates: mpsc::Receiver<Update>,
    scope: CancellationToken,
    timeout: Duration,
    log: DiscoveryLog,
) -> (usize, Vec<(String, TargetGroup)>) {
    let update = tokio::select! {
        _ = scope.cancelled() => None,
        result = tokio::time::timeout(timeout, updates.recv()) => match result {
            Ok(Some(update)) => Some(update),
            Ok(None) => {
                debug!(message = "Provider stopped without any update", provider = %name);
                None
            }
            Err(_) => {
                debug!(message = "Timeout waiting for the first update", provider = %name, ?timeout);
                None
            }
        }
    };

    let mut entries = vec![];
    for group in update.into_iter().flatten() {
        match group {
            Some(mut group) => {
                let key = format!("{}/{}", name, group.source);
                group.source.clone_from(&key);
                entries.push((key, group));
            }
            None => {
                log.record(&name, format!("Provider {name} does not return any targets"));
            }
        }
    }

    (index, entries)
}
