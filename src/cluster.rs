//! Cluster capability discovery.
//!
//! The probe runs once when a [`TopicClient`](crate::client::TopicClient) is built. Its result is never refreshed:
//! broker configuration changes made after start-up are not observed.

use std::fmt::{Display, Formatter};
use std::sync::Arc;

use tracing::{debug, info};

use crate::admin::{AdminClient, BrokerConfigEntry};
use crate::client::error::{Error, RequestContext, Result};

/// Broker config key that controls whether topics may be deleted.
pub const DELETE_TOPIC_ENABLE: &str = "delete.topic.enable";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    /// broker ID from the cluster metadata
    pub id: i32,
    pub host: String,
    pub port: i32,
    pub rack: Option<String>,
}

impl ClusterNode {
    pub fn new(id: i32, host: impl Into<String>, port: i32) -> Self {
        Self {
            id,
            host: host.into(),
            port,
            rack: None,
        }
    }
}

impl Display for ClusterNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// What the cluster allowed at the time it was probed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterCapabilities {
    nodes: Vec<ClusterNode>,
    config_source: i32,
    delete_topic_enable: bool,
}

impl ClusterCapabilities {
    /// Nodes reported when the cluster was probed.
    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    /// ID of the node whose broker configuration was read.
    pub fn config_source(&self) -> i32 {
        self.config_source
    }

    /// Whether `delete.topic.enable` was explicitly `true`.
    pub fn delete_topic_enabled(&self) -> bool {
        self.delete_topic_enable
    }
}

#[derive(Debug)]
pub struct ClusterCapabilityProbe {
    admin: Arc<dyn AdminClient>,
}

impl ClusterCapabilityProbe {
    pub fn new(admin: Arc<dyn AdminClient>) -> Self {
        Self { admin }
    }

    /// Discovers the cluster nodes and reads the deletion capability from the first one.
    ///
    /// Fails with [`Error::ClusterUnavailable`] if the cluster reports no nodes.
    pub async fn initialize(&self) -> Result<ClusterCapabilities> {
        let nodes = self
            .admin
            .describe_cluster()
            .await
            .map_err(|source| Error::AdminOperationFailed {
                request: RequestContext::DescribeCluster,
                source,
            })?;

        let node = nodes.first().ok_or(Error::ClusterUnavailable)?;
        debug!(broker=node.id, node=%node, "Reading broker configuration");

        let entries = self
            .admin
            .describe_broker_config(node.id)
            .await
            .map_err(|source| Error::AdminOperationFailed {
                request: RequestContext::DescribeBrokerConfig(node.id),
                source,
            })?;

        let delete_topic_enable = delete_topic_enabled(&entries);
        info!(
            broker = node.id,
            nodes = nodes.len(),
            delete_topic_enable,
            "Probed cluster capabilities",
        );

        Ok(ClusterCapabilities {
            config_source: node.id,
            nodes,
            delete_topic_enable,
        })
    }
}

/// Reads `delete.topic.enable` from broker config, defaulting to `false` when it is absent.
fn delete_topic_enabled(entries: &[BrokerConfigEntry]) -> bool {
    entries
        .iter()
        .find(|entry| entry.name.eq_ignore_ascii_case(DELETE_TOPIC_ENABLE))
        .and_then(|entry| entry.value.as_deref())
        .is_some_and(|value| value.eq_ignore_ascii_case("true"))
}
