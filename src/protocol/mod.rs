//! Broker protocol definitions shared by administrative clients.
//!
//! The wire encoding itself lives in whatever [`AdminClient`](crate::admin::AdminClient) implementation talks to the
//! cluster; this crate only needs to understand the error codes such a client reports back.

pub mod error;
