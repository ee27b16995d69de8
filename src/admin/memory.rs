//! In-process cluster for tests and embedding.
//!
//! [`InMemoryCluster`] keeps brokers, broker configuration and topics in memory and enforces the same rules a
//! broker controller would (duplicate topics, replication factor bounded by the broker count, deletion disabled by
//! configuration). Faults can be injected per call or per topic deletion to reproduce slow and failing clusters
//! deterministically.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::debug;

use super::{AdminClient, AdminError, BrokerConfigEntry, DeleteHandle};
use crate::cluster::{ClusterNode, DELETE_TOPIC_ENABLE};
use crate::protocol::error::Error as ProtocolError;
use crate::topic::{NewTopic, Partition, Topic};

/// Remote calls of [`AdminClient`], used to inject faults and count invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdminCall {
    ListTopics,
    DescribeTopics,
    CreateTopics,
    DeleteTopics,
    DescribeCluster,
    DescribeBrokerConfig,
}

/// How the deletion of one topic misbehaves.
#[derive(Debug, Clone)]
pub enum DeleteFault {
    /// The request completes with this error and the topic is kept.
    Fail(AdminError),

    /// The request never completes and the topic is kept.
    Hang,
}

#[derive(Debug, Default)]
struct State {
    nodes: Vec<ClusterNode>,
    configs: HashMap<i32, Vec<BrokerConfigEntry>>,
    topics: BTreeMap<String, Topic>,
    call_faults: HashMap<AdminCall, AdminError>,
    stalled_calls: HashSet<AdminCall>,
    delete_faults: HashMap<String, DeleteFault>,
    calls: HashMap<AdminCall, usize>,
    closed: bool,
}

impl State {
    fn enter(&mut self, call: AdminCall) -> Result<(), AdminError> {
        *self.calls.entry(call).or_default() += 1;
        match self.call_faults.get(&call) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    /// Deletion is refused when the controller (first node) explicitly disables it.
    fn deletion_disabled(&self) -> bool {
        self.nodes
            .first()
            .and_then(|node| self.configs.get(&node.id))
            .and_then(|entries| {
                entries
                    .iter()
                    .find(|e| e.name.eq_ignore_ascii_case(DELETE_TOPIC_ENABLE))
            })
            .and_then(|e| e.value.as_deref())
            .is_some_and(|v| v.eq_ignore_ascii_case("false"))
    }

    fn assign(&self, num_partitions: i32, replication_factor: i16) -> BTreeMap<i32, Partition> {
        let ids: Vec<i32> = if self.nodes.is_empty() {
            (0..i32::from(replication_factor)).collect()
        } else {
            self.nodes.iter().map(|n| n.id).collect()
        };

        (0..num_partitions)
            .map(|p| {
                let replica_nodes: Vec<i32> = (0..usize::try_from(replication_factor).unwrap_or(0))
                    .map(|i| ids[(p as usize + i) % ids.len().max(1)])
                    .collect();
                (
                    p,
                    Partition {
                        leader_id: replica_nodes.first().copied().unwrap_or(-1),
                        isr_nodes: replica_nodes.clone(),
                        replica_nodes,
                    },
                )
            })
            .collect()
    }

    fn validate(&self, topic: &NewTopic) -> Result<(), AdminError> {
        let reject = |protocol_error, message: String| AdminError::Server {
            protocol_error,
            error_message: Some(message),
        };

        if topic.name.is_empty() {
            return Err(reject(
                ProtocolError::InvalidTopicException,
                "Topic name is empty".to_string(),
            ));
        }
        if self.topics.contains_key(&topic.name) {
            return Err(reject(
                ProtocolError::TopicAlreadyExists,
                format!("Topic '{}' already exists.", topic.name),
            ));
        }
        if topic.num_partitions <= 0 {
            return Err(reject(
                ProtocolError::InvalidPartitions,
                format!("Number of partitions must be larger than 0: {}", topic.num_partitions),
            ));
        }
        if topic.replication_factor <= 0
            || usize::try_from(topic.replication_factor).unwrap_or(0) > self.nodes.len()
        {
            return Err(reject(
                ProtocolError::InvalidReplicationFactor,
                format!(
                    "Replication factor: {} larger than available brokers: {}.",
                    topic.replication_factor,
                    self.nodes.len()
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCluster {
    state: Mutex<State>,
}

impl InMemoryCluster {
    /// Creates a cluster without brokers.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_broker(self, node: ClusterNode) -> Self {
        self.state.lock().nodes.push(node);
        self
    }

    pub fn with_broker_config(
        self,
        broker_id: i32,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.set_broker_config(broker_id, name, value);
        self
    }

    /// Adds a topic without going through creation checks.
    pub fn with_topic(
        self,
        name: impl Into<String>,
        num_partitions: i32,
        replication_factor: i16,
    ) -> Self {
        {
            let mut state = self.state.lock();
            let name = name.into();
            let partitions = state.assign(num_partitions, replication_factor);
            state.topics.insert(name.clone(), Topic { name, partitions });
        }
        self
    }

    /// Sets or replaces a broker configuration entry.
    pub fn set_broker_config(
        &self,
        broker_id: i32,
        name: impl Into<String>,
        value: impl Into<String>,
    ) {
        let entry = BrokerConfigEntry::new(name, value);
        let mut state = self.state.lock();
        let entries = state.configs.entry(broker_id).or_default();
        match entries.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
    }

    /// Makes every subsequent `call` fail with `error`.
    pub fn fail_calls(&self, call: AdminCall, error: AdminError) {
        self.state.lock().call_faults.insert(call, error);
    }

    /// Makes the deletion of `topic` misbehave.
    pub fn fault_deletion(&self, topic: impl Into<String>, fault: DeleteFault) {
        self.state.lock().delete_faults.insert(topic.into(), fault);
    }

    /// Makes every subsequent `call` wait forever.
    pub fn stall_calls(&self, call: AdminCall) {
        self.state.lock().stalled_calls.insert(call);
    }

    pub fn clear_faults(&self) {
        let mut state = self.state.lock();
        state.call_faults.clear();
        state.stalled_calls.clear();
        state.delete_faults.clear();
    }

    /// Current description of a topic.
    pub fn topic(&self, name: &str) -> Option<Topic> {
        self.state.lock().topics.get(name).cloned()
    }

    pub fn topic_names(&self) -> BTreeSet<String> {
        self.state.lock().topics.keys().cloned().collect()
    }

    /// How often `call` was issued, including failed calls.
    pub fn call_count(&self, call: AdminCall) -> usize {
        self.state.lock().calls.get(&call).copied().unwrap_or_default()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Records `call`, then fails or stalls it as configured.
    async fn enter(&self, call: AdminCall) -> Result<(), AdminError> {
        let stalled = {
            let mut state = self.state.lock();
            state.enter(call)?;
            state.stalled_calls.contains(&call)
        };
        if stalled {
            futures::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait]
impl AdminClient for InMemoryCluster {
    async fn list_topics(&self) -> Result<BTreeSet<String>, AdminError> {
        self.enter(AdminCall::ListTopics).await?;
        Ok(self.topic_names())
    }

    async fn describe_topics(
        &self,
        names: &[String],
    ) -> Result<BTreeMap<String, Topic>, AdminError> {
        self.enter(AdminCall::DescribeTopics).await?;
        let state = self.state.lock();

        names
            .iter()
            .map(|name| match state.topics.get(name) {
                Some(topic) => Ok((name.clone(), topic.clone())),
                None => Err(AdminError::Server {
                    protocol_error: ProtocolError::UnknownTopicOrPartition,
                    error_message: Some(format!("Topic '{name}' does not exist")),
                }),
            })
            .collect()
    }

    async fn create_topics(&self, topics: Vec<NewTopic>) -> Result<(), AdminError> {
        self.enter(AdminCall::CreateTopics).await?;
        let mut state = self.state.lock();

        for topic in &topics {
            state.validate(topic)?;
        }
        for topic in topics {
            let partitions = state.assign(topic.num_partitions, topic.replication_factor);
            debug!(topic=%topic.name, "Created topic");
            state.topics.insert(
                topic.name.clone(),
                Topic {
                    name: topic.name,
                    partitions,
                },
            );
        }
        Ok(())
    }

    fn delete_topics(&self, names: &[String]) -> Vec<(String, DeleteHandle<'_>)> {
        let mut state = self.state.lock();
        let call_fault = state.enter(AdminCall::DeleteTopics).err();
        let stalled = state.stalled_calls.contains(&AdminCall::DeleteTopics);
        let disabled = state.deletion_disabled();

        names
            .iter()
            .map(|name| {
                let outcome = if let Some(e) = &call_fault {
                    Err(e.clone())
                } else if stalled {
                    let handle: DeleteHandle<'_> = futures::future::pending().boxed();
                    return (name.clone(), handle);
                } else if disabled {
                    Err(AdminError::server(ProtocolError::TopicDeletionDisabled))
                } else {
                    let fault = state.delete_faults.get(name).cloned();
                    match fault {
                        Some(DeleteFault::Hang) => {
                            let handle: DeleteHandle<'_> = futures::future::pending().boxed();
                            return (name.clone(), handle);
                        }
                        Some(DeleteFault::Fail(e)) => Err(e),
                        None => match state.topics.remove(name) {
                            Some(_) => Ok(()),
                            None => Err(AdminError::server(ProtocolError::UnknownTopicOrPartition)),
                        },
                    }
                };
                (name.clone(), futures::future::ready(outcome).boxed())
            })
            .collect()
    }

    async fn describe_cluster(&self) -> Result<Vec<ClusterNode>, AdminError> {
        self.enter(AdminCall::DescribeCluster).await?;
        Ok(self.state.lock().nodes.clone())
    }

    async fn describe_broker_config(
        &self,
        broker_id: i32,
    ) -> Result<Vec<BrokerConfigEntry>, AdminError> {
        self.enter(AdminCall::DescribeBrokerConfig).await?;
        let state = self.state.lock();

        if !state.nodes.iter().any(|n| n.id == broker_id) {
            return Err(AdminError::Server {
                protocol_error: ProtocolError::BrokerNotAvailable,
                error_message: Some(format!("Broker {broker_id} is not registered")),
            });
        }
        Ok(state.configs.get(&broker_id).cloned().unwrap_or_default())
    }

    async fn close(&self) {
        self.state.lock().closed = true;
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn cluster() -> InMemoryCluster {
        InMemoryCluster::new()
            .with_broker(ClusterNode::new(1, "b1", 9092))
            .with_broker(ClusterNode::new(2, "b2", 9092))
            .with_broker(ClusterNode::new(3, "b3", 9092))
    }

    #[tokio::test]
    async fn test_create_assigns_replicas() {
        let cluster = cluster();
        cluster
            .create_topics(vec![NewTopic::new("t", 4, 2)])
            .await
            .unwrap();

        let topic = cluster.topic("t").unwrap();
        assert_eq!(topic.partition_count(), 4);
        assert!(topic.partitions.values().all(|p| p.replica_nodes.len() == 2));
        assert_eq!(topic.partitions[&0].replica_nodes, vec![1, 2]);
        assert_eq!(topic.partitions[&2].replica_nodes, vec![3, 1]);
    }

    #[tokio::test]
    async fn test_create_rejections() {
        let cluster = cluster().with_topic("t", 1, 1);

        let err = cluster
            .create_topics(vec![NewTopic::new("t", 1, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.protocol_error(), Some(ProtocolError::TopicAlreadyExists));

        let err = cluster
            .create_topics(vec![NewTopic::new("u", 0, 1)])
            .await
            .unwrap_err();
        assert_eq!(err.protocol_error(), Some(ProtocolError::InvalidPartitions));

        let err = cluster
            .create_topics(vec![NewTopic::new("u", 1, 4)])
            .await
            .unwrap_err();
        assert_eq!(
            err.protocol_error(),
            Some(ProtocolError::InvalidReplicationFactor)
        );
        assert!(cluster.topic("u").is_none());
    }

    #[tokio::test]
    async fn test_describe_is_all_or_nothing() {
        let cluster = cluster().with_topic("t", 1, 1);

        let err = cluster
            .describe_topics(&["t".to_string(), "missing".to_string()])
            .await
            .unwrap_err();
        assert_eq!(
            err.protocol_error(),
            Some(ProtocolError::UnknownTopicOrPartition)
        );
    }

    #[tokio::test]
    async fn test_delete_faults() {
        let cluster = cluster().with_topic("a", 1, 1).with_topic("b", 1, 1);
        cluster.fault_deletion(
            "b",
            DeleteFault::Fail(AdminError::server(ProtocolError::RequestTimedOut)),
        );

        let mut handles = cluster.delete_topics(&["a".to_string(), "b".to_string()]);
        // requests are applied before any handle is awaited
        assert!(cluster.topic("a").is_none());

        let (name, handle) = handles.pop().unwrap();
        assert_eq!(name, "b");
        assert_matches!(handle.await, Err(AdminError::Server { .. }));
        assert!(cluster.topic("b").is_some());
    }

    #[tokio::test]
    async fn test_delete_disabled_by_controller() {
        let cluster = cluster()
            .with_topic("a", 1, 1)
            .with_broker_config(1, DELETE_TOPIC_ENABLE, "false");

        let (_, handle) = cluster.delete_topics(&["a".to_string()]).pop().unwrap();
        assert_eq!(
            handle.await.unwrap_err().protocol_error(),
            Some(ProtocolError::TopicDeletionDisabled)
        );
        assert!(cluster.topic("a").is_some());
    }

    #[tokio::test]
    async fn test_call_faults() {
        let cluster = cluster();
        cluster.fail_calls(
            AdminCall::ListTopics,
            AdminError::Interrupted("shutdown".to_string()),
        );

        assert_matches!(cluster.list_topics().await, Err(AdminError::Interrupted(_)));
        assert_eq!(cluster.call_count(AdminCall::ListTopics), 1);

        cluster.clear_faults();
        assert!(cluster.list_topics().await.unwrap().is_empty());
    }
}
