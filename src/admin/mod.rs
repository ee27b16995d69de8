//! The administrative cluster client consumed by [`TopicClient`](crate::client::TopicClient).
//!
//! An [`AdminClient`] exposes the control-plane primitives of a broker cluster: topic listing, bulk describe,
//! creation, bulk deletion, node discovery and broker configuration lookup. Implementations own the transport;
//! this crate only orchestrates calls against it.
//!
//! [`memory::InMemoryCluster`] is a deterministic implementation that can simulate slow or failing brokers.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;

use crate::cluster::ClusterNode;
use crate::protocol::error::Error as ProtocolError;
use crate::topic::{NewTopic, Topic};

pub mod memory;

/// Failure of a single remote call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AdminError {
    #[error(
        "Server error {protocol_error:?} with message \"{}\"",
        .error_message.as_deref().unwrap_or("n/a")
    )]
    Server {
        protocol_error: ProtocolError,
        error_message: Option<String>,
    },

    #[error("Request interrupted: {0}")]
    Interrupted(String),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

impl AdminError {
    pub fn server(protocol_error: ProtocolError) -> Self {
        Self::Server {
            protocol_error,
            error_message: None,
        }
    }

    /// The broker error code, if the broker answered with one.
    pub fn protocol_error(&self) -> Option<ProtocolError> {
        match self {
            Self::Server { protocol_error, .. } => Some(*protocol_error),
            _ => None,
        }
    }
}

/// A broker-level configuration entry as returned by a describe-configs call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerConfigEntry {
    pub name: String,
    pub value: Option<String>,
}

impl BrokerConfigEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
        }
    }
}

/// Completion of one in-flight topic deletion.
pub type DeleteHandle<'a> = BoxFuture<'a, Result<(), AdminError>>;

#[async_trait]
pub trait AdminClient: std::fmt::Debug + Send + Sync {
    /// Names of all topics in the cluster.
    async fn list_topics(&self) -> Result<BTreeSet<String>, AdminError>;

    /// Describes the named topics. Fails as a whole if any of them cannot be described.
    async fn describe_topics(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, Topic>, AdminError>;

    /// Creates the given topics and resolves once the cluster confirmed the creation.
    async fn create_topics(&self, topics: Vec<NewTopic>) -> Result<(), AdminError>;

    /// Issues one delete request per topic and returns a handle per topic.
    ///
    /// All requests are sent before this returns; awaiting a handle only observes its completion.
    fn delete_topics(&self, names: &[String]) -> Vec<(String, DeleteHandle<'_>)>;

    /// Nodes currently registered in the cluster.
    async fn describe_cluster(&self) -> Result<Vec<ClusterNode>, AdminError>;

    /// Broker-level configuration of the given node.
    async fn describe_broker_config(
        &self,
        broker_id: i32,
    ) -> Result<Vec<BrokerConfigEntry>, AdminError>;

    /// Releases transport resources. Must be safe to call more than once.
    async fn close(&self) {}
}
