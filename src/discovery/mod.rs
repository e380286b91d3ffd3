//! Service discovery, every configured mechanism of a job becomes a `Provider`
//! which reports groups of targets, and the `aggregate` function collects the
//! first report of each of them.

mod aggregate;
mod dns_sd;
mod file_sd;
mod log;
mod static_sd;

pub use aggregate::{Cancelled, DEFAULT_TIMEOUT, DiscoveryOptions, aggregate};
pub use dns_sd::{DnsSdConfig, QueryType};
pub use file_sd::FileSdConfig;
pub use log::{DiscoveryLog, Entry};
pub use static_sd::StaticConfig;

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use labels::LabelSet;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::ScrapeConfig;

/// A set of targets with a common label set(production, test, staging etc.).
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TargetGroup {
    /// An identifier that describes a group of targets, it is unique
    /// per provider.
    pub source: String,

    /// Targets is a list of targets identified by a label set. Each target is
    /// uniquely identifiable in the group by its address label.
    pub targets: Vec<LabelSet>,

    /// Labels is a set of labels that is common across all targets in the group.
    pub labels: LabelSet,
}

/// A batch of groups sent by a provider. `None` stands for a group the
/// provider failed to produce.
pub type Update = Vec<Option<TargetGroup>>;

pub struct ProviderContext {
    pub name: String,
    pub shutdown: CancellationToken,
    pub log: DiscoveryLog,
}

impl ProviderContext {
    /// Record a failure of the provider, failures happened after the shutdown
    /// are caused by it, so they are ignored.
    pub fn report(&self, message: &str, err: impl Display) {
        if self.shutdown.is_cancelled() {
            return;
        }

        self.log.record(&self.name, format!("{message}, {err}"));
    }
}

#[async_trait::async_trait]
pub trait Provider: Send {
    /// Run the discovery until `cx.shutdown` is cancelled or the receiving
    /// half of `updates` is gone.
    async fn run(self: Box<Self>, cx: ProviderContext, updates: mpsc::Sender<Update>);
}

/// Build providers for all discovery mechanisms of the job, names are
/// unique in the job, and the order is the order of the configuration.
pub fn providers_for(job: &ScrapeConfig) -> Vec<(String, Box<dyn Provider>)> {
    let mut providers: Vec<(String, Box<dyn Provider>)> = vec![];

    if !job.static_configs.is_empty() {
        providers.push((
            "static".to_string(),
            Box::new(static_sd::StaticProvider::new(&job.static_configs)),
        ));
    }

    for (index, config) in job.file_sd_configs.iter().enumerate() {
        providers.push((
            format!("file/{index}"),
            Box::new(file_sd::FileProvider::new(config.clone())),
        ));
    }

    for (index, config) in job.dns_sd_configs.iter().enumerate() {
        providers.push((
            format!("dns/{index}"),
            Box::new(dns_sd::DnsProvider::new(config.clone())),
        ));
    }

    providers
}

/// `refresh` is a helper for discovery mechanisms which poll, the first
/// update is sent right away, and then once per `interval`.
async fn refresh<F, Fut>(
    cx: &ProviderContext,
    interval: Duration,
    updates: mpsc::Sender<Update>,
    mut list_groups: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Update>,
{
    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cx.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let update = list_groups().await;
        if updates.send(update).await.is_err() {
            debug!(message = "Update receiver is gone", provider = %cx.name);
            break;
        }
    }
}
