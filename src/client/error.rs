use std::collections::BTreeMap;

use thiserror::Error;

use crate::admin::AdminError;
pub use crate::protocol::error::Error as ProtocolError;

/// The remote call a failure belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestContext {
    ListTopics,
    DescribeTopics(Vec<String>),
    CreateTopic(String),
    DescribeCluster,
    DescribeBrokerConfig(i32),
}

impl std::fmt::Display for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ListTopics => write!(f, "Failed to retrieve kafka topic names"),
            Self::DescribeTopics(_) => write!(f, "Failed to describe kafka topics"),
            Self::CreateTopic(topic) => {
                write!(f, "Failed to guarantee existence of topic {topic}")
            }
            Self::DescribeCluster => write!(f, "Failed to fetch cluster nodes"),
            Self::DescribeBrokerConfig(id) => {
                write!(f, "Failed to fetch configuration of broker {id}")
            }
        }
    }
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("Could not fetch broker information: the cluster reported no nodes")]
    ClusterUnavailable,

    #[error(
        "Topic '{topic}' does not conform to the requirements \
         Partitions:{actual_partitions} v {expected_partitions}. \
         Replication: {actual_replication} v {expected_replication}"
    )]
    TopologyConformance {
        topic: String,
        expected_partitions: i32,
        actual_partitions: i32,
        expected_replication: i16,
        actual_replication: i16,
    },

    #[error("{request}: {source}")]
    AdminOperationFailed {
        request: RequestContext,
        #[source]
        source: AdminError,
    },

    #[error(
        "Failed to clean up topics: {}",
        .failures.keys().map(String::as_str).collect::<Vec<_>>().join(",")
    )]
    BulkDeletionFailed {
        /// Topics that were not confirmed as deleted, keyed by name.
        failures: BTreeMap<String, AdminError>,
    },

    #[error("Topic client is closed")]
    Closed,
}

impl Error {
    /// Names of the topics a [`Error::BulkDeletionFailed`] reports, in sorted order.
    pub fn failed_topics(&self) -> Vec<&str> {
        match self {
            Self::BulkDeletionFailed { failures } => failures.keys().map(String::as_str).collect(),
            _ => vec![],
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bulk_deletion_message() {
        let err = Error::BulkDeletionFailed {
            failures: BTreeMap::from([
                ("c".to_string(), AdminError::Interrupted("x".to_string())),
                ("a".to_string(), AdminError::server(ProtocolError::RequestTimedOut)),
            ]),
        };

        assert_eq!(err.to_string(), "Failed to clean up topics: a,c");
        assert_eq!(err.failed_topics(), vec!["a", "c"]);
    }

    #[test]
    fn test_conformance_message() {
        let err = Error::TopologyConformance {
            topic: "t".to_string(),
            expected_partitions: 5,
            actual_partitions: 3,
            expected_replication: 2,
            actual_replication: 2,
        };

        assert_eq!(
            err.to_string(),
            "Topic 't' does not conform to the requirements Partitions:3 v 5. Replication: 2 v 2"
        );
    }
}
