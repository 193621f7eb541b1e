//! Logz.io REST API client.
//!
//! [`logzio::LogzioClient`] owns the HTTP plumbing; the alert, endpoint and
//! user APIs are added to it by the sibling modules, each alongside the wire
//! types it sends and receives.

pub mod alerts;
pub mod endpoints;
pub mod logzio;
pub mod users;

pub use logzio::LogzioClient;
