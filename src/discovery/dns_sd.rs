use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use hickory_resolver::TokioAsyncResolver;
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::proto::rr::rdata::SRV;
use labels::{ADDRESS_LABEL, LabelSet};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use super::{Provider, ProviderContext, TargetGroup, Update, refresh};

/// The name of the record which produced the target.
const DNS_NAME_LABEL: &str = "__meta_dns_name";
const SRV_TARGET_LABEL: &str = "__meta_dns_srv_record_target";
const SRV_PORT_LABEL: &str = "__meta_dns_srv_record_port";

const fn default_refresh_interval() -> Duration {
    Duration::from_secs(30)
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum QueryType {
    #[default]
    SRV,
    A,
    AAAA,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct DnsSdConfig {
    /// A list of DNS domain names to be queried.
    pub names: Vec<String>,

    /// The type of DNS query to perform.
    #[serde(default, rename = "type")]
    pub query_type: QueryType,

    /// The port number used if the query type is not SRV.
    #[serde(default)]
    pub port: u16,

    /// The time after which the provided names are refreshed.
    #[serde(default = "default_refresh_interval", with = "crate::duration::serde")]
    pub refresh_interval: Duration,
}

fn address_member(name: &str, ip: IpAddr, port: u16) -> LabelSet {
    LabelSet::from_pairs([
        (ADDRESS_LABEL, SocketAddr::new(ip, port).to_string()),
        (DNS_NAME_LABEL, name.to_string()),
    ])
}

fn srv_member(name: &str, srv: &SRV) -> LabelSet {
    let target = srv.target().to_utf8();
    let target = target.trim_end_matches('.');
    let port = srv.port();

    LabelSet::from_pairs([
        (ADDRESS_LABEL, format!("{target}:{port}")),
        (DNS_NAME_LABEL, name.to_string()),
        (SRV_TARGET_LABEL, target.to_string()),
        (SRV_PORT_LABEL, port.to_string()),
    ])
}

pub struct DnsProvider {
    config: DnsSdConfig,
}

impl DnsProvider {
    pub fn new(config: DnsSdConfig) -> Self {
        Self { config }
    }

    async fn lookup(
        &self,
        resolver: &TokioAsyncResolver,
        name: &str,
    ) -> Result<Vec<LabelSet>, ResolveError> {
        let port = self.config.port;

        let result = match self.config.query_type {
            QueryType::SRV => resolver
                .srv_lookup(name)
                .await
                .map(|lookup| lookup.iter().map(|srv| srv_member(name, srv)).collect()),
            QueryType::A => resolver.ipv4_lookup(name).await.map(|lookup| {
                lookup
                    .iter()
                    .map(|record| address_member(name, IpAddr::V4(record.0), port))
                    .collect()
            }),
            QueryType::AAAA => resolver.ipv6_lookup(name).await.map(|lookup| {
                lookup
                    .iter()
                    .map(|record| address_member(name, IpAddr::V6(record.0), port))
                    .collect()
            }),
        };

        match result {
            // an empty answer is an empty group
            Err(err) if matches!(err.kind(), ResolveErrorKind::NoRecordsFound { .. }) => {
                Ok(vec![])
            }
            result => result,
        }
    }

    async fn list_groups(&self, resolver: &TokioAsyncResolver, cx: &ProviderContext) -> Update {
        let mut update = vec![];

        for name in &self.config.names {
            match self.lookup(resolver, name).await {
                Ok(targets) => update.push(Some(TargetGroup {
                    source: name.clone(),
                    targets,
                    labels: LabelSet::new(),
                })),
                Err(err) => cx.report(&format!("Error looking up {name}"), err),
            }
        }

        update
    }
}

#[async_trait::async_trait]
impl Provider for DnsProvider {
    async fn run(self: Box<Self>, cx: ProviderContext, updates: mpsc::Sender<Update>) {
        let resolver = match TokioAsyncResolver::tokio_from_system_conf() {
            Ok(resolver) => resolver,
            Err(err) => {
                cx.report("Error creating DNS resolver", err);
                return;
            }
        };
        let interval = self.config.refresh_interval;

        refresh(&cx, interval, updates, || self.list_groups(&resolver, &cx)).await
    }
}
