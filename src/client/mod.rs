use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::instrument::WithSubscriber;
use tracing::{debug, info, Dispatch};

use crate::admin::{AdminClient, AdminError};
use crate::cluster::{ClusterCapabilities, ClusterCapabilityProbe, ClusterNode};
use crate::internal::is_internal_topic;
use crate::topic::{NewTopic, Topic};

pub mod deletion;
pub mod error;

use error::{Error, ProtocolError, RequestContext, Result};

/// DEFAULT_DELETE_TIMEOUT bounds the wait for each topic of a bulk deletion.
pub const DEFAULT_DELETE_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for [`TopicClient`].
pub struct TopicClientBuilder {
    admin: Arc<dyn AdminClient>,
    delete_timeout: Duration,
    request_timeout: Option<Duration>,
    dispatch: Option<Dispatch>,
}

impl TopicClientBuilder {
    /// Create a new [`TopicClientBuilder`] on top of an administrative client.
    pub fn new(admin: Arc<dyn AdminClient>) -> Self {
        Self {
            admin,
            delete_timeout: DEFAULT_DELETE_TIMEOUT,
            request_timeout: None,
            dispatch: None,
        }
    }

    /// Set how long each topic of [`TopicLifecycle::delete_topics`] may take before it counts as failed.
    pub fn delete_timeout(mut self, timeout: Duration) -> Self {
        self.delete_timeout = timeout;
        self
    }

    /// Bound list, describe and create calls.
    ///
    /// Without this, those calls wait as long as the admin client's transport does.
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Set the dispatcher all events of the client are reported to.
    ///
    /// Defaults to the dispatcher that is current when [`build`](Self::build) is called.
    pub fn dispatch(mut self, dispatch: Dispatch) -> Self {
        self.dispatch = Some(dispatch);
        self
    }

    /// Probe the cluster and build [`TopicClient`].
    ///
    /// Fails with [`Error::ClusterUnavailable`] if the cluster has no nodes; no client exists in that case.
    pub async fn build(self) -> Result<TopicClient> {
        let dispatch = self
            .dispatch
            .unwrap_or_else(|| tracing::dispatcher::get_default(Dispatch::clone));

        let capabilities = ClusterCapabilityProbe::new(Arc::clone(&self.admin))
            .initialize()
            .with_subscriber(dispatch.clone())
            .await?;

        Ok(TopicClient {
            admin: self.admin,
            capabilities,
            delete_timeout: self.delete_timeout,
            request_timeout: self.request_timeout,
            dispatch,
            closed: AtomicBool::new(false),
        })
    }
}

impl std::fmt::Debug for TopicClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicClientBuilder").finish_non_exhaustive()
    }
}

/// Topic administration as seen by the stream-processing engine.
#[async_trait]
pub trait TopicLifecycle: std::fmt::Debug + Send + Sync {
    /// Makes sure a topic with the given shape exists.
    ///
    /// An existing topic is reused if its partition count and the replica count of its first partition match;
    /// otherwise [`Error::TopologyConformance`] is returned and the topic is left untouched.
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
    ) -> Result<()>;

    async fn topic_exists(&self, name: &str) -> Result<bool>;

    async fn list_topic_names(&self) -> Result<BTreeSet<String>>;

    /// Describes all named topics, or fails without partial results.
    async fn describe_topics(&self, names: &[String]) -> Result<BTreeMap<String, Topic>>;

    /// Deletes topics, best effort.
    ///
    /// Does nothing when the cluster disallows deletion. Otherwise every topic gets its own deletion deadline and
    /// [`Error::BulkDeletionFailed`] names the topics that were not confirmed; all others are gone.
    async fn delete_topics(&self, names: &[String]) -> Result<()>;

    /// Deletes the changelog and repartition topics of an application.
    async fn delete_internal_topics(&self, application_id: &str) -> Result<()>;

    /// Releases the admin client. Every later operation fails with [`Error::Closed`].
    async fn close(&self);
}

/// [`TopicLifecycle`] on top of an [`AdminClient`].
///
/// Must be constructed using [`TopicClientBuilder`].
#[derive(Debug)]
pub struct TopicClient {
    admin: Arc<dyn AdminClient>,

    /// Fixed when the client was built.
    capabilities: ClusterCapabilities,

    delete_timeout: Duration,
    request_timeout: Option<Duration>,
    dispatch: Dispatch,
    closed: AtomicBool,
}

impl TopicClient {
    /// What the cluster allowed when this client was built.
    pub fn capabilities(&self) -> &ClusterCapabilities {
        &self.capabilities
    }

    pub fn delete_topic_enabled(&self) -> bool {
        self.capabilities.delete_topic_enabled()
    }

    pub fn cluster_nodes(&self) -> &[ClusterNode] {
        self.capabilities.nodes()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Closed);
        }
        Ok(())
    }

    /// Awaits a remote call, applying the request timeout if one is configured.
    async fn request<T, F>(&self, request: RequestContext, f: F) -> Result<T>
    where
        T: Send,
        F: Future<Output = Result<T, AdminError>> + Send,
    {
        let result = match self.request_timeout {
            Some(timeout) => tokio::time::timeout(timeout, f)
                .await
                .unwrap_or(Err(AdminError::Timeout(timeout))),
            None => f.await,
        };
        result.map_err(|source| Error::AdminOperationFailed { request, source })
    }

    async fn create_topic_inner(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
    ) -> Result<()> {
        self.ensure_open()?;
        info!(topic = name, num_partitions, replication_factor, "Creating topic");

        if self.topic_exists_inner(name).await? {
            let mut descriptions = self.describe_topics_inner(&[name.to_string()]).await?;
            let topic = descriptions
                .remove(name)
                .ok_or_else(|| Error::AdminOperationFailed {
                    request: RequestContext::DescribeTopics(vec![name.to_string()]),
                    source: AdminError::server(ProtocolError::UnknownTopicOrPartition),
                })?;

            let actual_partitions = topic.partition_count();
            let actual_replication = topic.first_partition_replicas();
            if actual_partitions != num_partitions || actual_replication != replication_factor {
                return Err(Error::TopologyConformance {
                    topic: name.to_string(),
                    expected_partitions: num_partitions,
                    actual_partitions,
                    expected_replication: replication_factor,
                    actual_replication,
                });
            }

            info!(topic = name, "Topic exists with the requested shape, reusing it");
            return Ok(());
        }

        let new_topic = NewTopic::new(name, num_partitions, replication_factor);
        self.request(
            RequestContext::CreateTopic(name.to_string()),
            self.admin.create_topics(vec![new_topic]),
        )
        .await
    }

    async fn topic_exists_inner(&self, name: &str) -> Result<bool> {
        debug!(topic = name, "Checking for existence of topic");
        Ok(self.list_topic_names_inner().await?.contains(name))
    }

    async fn list_topic_names_inner(&self) -> Result<BTreeSet<String>> {
        self.ensure_open()?;
        self.request(RequestContext::ListTopics, self.admin.list_topics())
            .await
    }

    async fn describe_topics_inner(&self, names: &[String]) -> Result<BTreeMap<String, Topic>> {
        self.ensure_open()?;
        if names.is_empty() {
            return Ok(BTreeMap::new());
        }

        self.request(
            RequestContext::DescribeTopics(names.to_vec()),
            self.admin.describe_topics(names),
        )
        .await
    }

    async fn delete_topics_inner(&self, names: &[String]) -> Result<()> {
        self.ensure_open()?;
        if !self.delete_topic_enabled() {
            info!("Cannot delete topics since 'delete.topic.enable' is false.");
            return Ok(());
        }

        let names: Vec<String> = names
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if names.is_empty() {
            return Ok(());
        }

        info!(topics = ?names, "Deleting topics");
        let handles = self.admin.delete_topics(&names);
        let outcomes = deletion::await_deletions(&names, handles, self.delete_timeout).await;
        deletion::aggregate(outcomes)
    }

    async fn delete_internal_topics_inner(&self, application_id: &str) -> Result<()> {
        self.ensure_open()?;
        if !self.delete_topic_enabled() {
            info!("Cannot delete topics since 'delete.topic.enable' is false.");
            return Ok(());
        }

        let internal_topics: Vec<String> = self
            .list_topic_names_inner()
            .await?
            .into_iter()
            .filter(|topic| is_internal_topic(topic, application_id))
            .collect();
        if internal_topics.is_empty() {
            debug!(application_id, "No internal topics to delete");
            return Ok(());
        }

        self.delete_topics_inner(&internal_topics).await
    }
}

#[async_trait]
impl TopicLifecycle for TopicClient {
    async fn create_topic(
        &self,
        name: &str,
        num_partitions: i32,
        replication_factor: i16,
    ) -> Result<()> {
        self.create_topic_inner(name, num_partitions, replication_factor)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn topic_exists(&self, name: &str) -> Result<bool> {
        self.topic_exists_inner(name)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn list_topic_names(&self) -> Result<BTreeSet<String>> {
        self.list_topic_names_inner()
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn describe_topics(&self, names: &[String]) -> Result<BTreeMap<String, Topic>> {
        self.describe_topics_inner(names)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn delete_topics(&self, names: &[String]) -> Result<()> {
        self.delete_topics_inner(names)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn delete_internal_topics(&self, application_id: &str) -> Result<()> {
        self.delete_internal_topics_inner(application_id)
            .with_subscriber(self.dispatch.clone())
            .await
    }

    async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        async {
            self.admin.close().await;
            info!("Closed topic client");
        }
        .with_subscriber(self.dispatch.clone())
        .await
    }
}
