//! Topic administration for Kafka-compatible clusters.
//!
//! [`TopicClient`](client::TopicClient) sits between a stream-processing engine and an
//! [`AdminClient`](admin::AdminClient). It
//!
//! - creates topics idempotently, reusing an existing topic only if its shape matches,
//! - lists and describes topics,
//! - deletes topics best effort, gated on the broker's `delete.topic.enable` setting, which is read once when the
//!   client is built,
//! - cleans up the changelog and repartition topics of an application.
//!
//! # Example
//! ```rust,no_run
//! # async fn test() {
//! use std::sync::Arc;
//!
//! use kafka_topic_admin::{
//!     admin::memory::InMemoryCluster,
//!     client::{TopicClientBuilder, TopicLifecycle},
//!     cluster::ClusterNode,
//! };
//!
//! let cluster = InMemoryCluster::new().with_broker(ClusterNode::new(0, "localhost", 9092));
//! let client = TopicClientBuilder::new(Arc::new(cluster)).build().await.unwrap();
//!
//! client.create_topic("my_topic", 3, 1).await.unwrap();
//! assert!(client.topic_exists("my_topic").await.unwrap());
//! # }
//! ```
#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::todo,
    clippy::use_self,
    missing_debug_implementations,
    unused_crate_dependencies
)]

// Workaround for "unused crate" lint false positives.
#[cfg(test)]
use tracing_log as _;
#[cfg(test)]
use tracing_subscriber as _;

pub mod admin;
pub mod client;
pub mod cluster;
pub mod internal;
pub mod protocol;
pub mod topic;
