//! Collection of per-topic deletion results.

use std::collections::BTreeMap;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tracing::{debug, warn};

use super::error::{Error, Result};
use crate::admin::{AdminError, DeleteHandle};
use crate::protocol::error::Error as ProtocolError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeletionStatus {
    Deleted,
    Failed(AdminError),
}

/// Result of the deletion request of a single topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionOutcome {
    pub topic: String,
    pub status: DeletionStatus,
}

/// Awaits every in-flight deletion, each bounded by its own `timeout`.
///
/// Handles are polled concurrently, so a hanging topic does not postpone the deadline of the others. Requested
/// topics the admin client returned no handle for are reported as failed.
pub(crate) async fn await_deletions(
    requested: &[String],
    handles: Vec<(String, DeleteHandle<'_>)>,
    timeout: Duration,
) -> Vec<DeletionOutcome> {
    let missing: Vec<&String> = requested
        .iter()
        .filter(|name| !handles.iter().any(|(topic, _)| topic == *name))
        .collect();

    let mut tasks = handles
        .into_iter()
        .map(|(topic, handle)| async move {
            let status = match tokio::time::timeout(timeout, handle).await {
                Ok(Ok(())) => DeletionStatus::Deleted,
                Ok(Err(e)) => DeletionStatus::Failed(e),
                Err(_) => DeletionStatus::Failed(AdminError::Timeout(timeout)),
            };
            DeletionOutcome { topic, status }
        })
        .collect::<FuturesUnordered<_>>();

    let mut outcomes = Vec::with_capacity(tasks.len() + missing.len());
    while let Some(outcome) = tasks.next().await {
        debug!(topic=%outcome.topic, status=?outcome.status, "Deletion completed");
        outcomes.push(outcome);
    }

    outcomes.extend(missing.into_iter().map(|topic| DeletionOutcome {
        topic: topic.clone(),
        status: DeletionStatus::Failed(AdminError::Server {
            protocol_error: ProtocolError::UnknownServerError,
            error_message: Some("No result for topic".to_string()),
        }),
    }));
    outcomes
}

/// Folds outcomes into `Ok` or a [`Error::BulkDeletionFailed`] listing every failed topic.
pub(crate) fn aggregate(outcomes: Vec<DeletionOutcome>) -> Result<()> {
    let failures: BTreeMap<String, AdminError> = outcomes
        .into_iter()
        .filter_map(|outcome| match outcome.status {
            DeletionStatus::Deleted => None,
            DeletionStatus::Failed(e) => {
                warn!(topic=%outcome.topic, e=%e, "Failed to delete topic");
                Some((outcome.topic, e))
            }
        })
        .collect();

    if failures.is_empty() {
        Ok(())
    } else {
        Err(Error::BulkDeletionFailed { failures })
    }
}
