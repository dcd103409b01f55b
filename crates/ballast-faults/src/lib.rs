//! Terminal-failure routing
//!
//! This crate provides the fault side channel of the ballast resilience
//! stack: when a call's retries run out, the caller hands a
//! [`FailureReport`] to the [`FailureRouter`] and moves on. A background
//! worker deduplicates equivalent failures into [`FailureRecord`]s, assigns
//! severity from a static map, and alerts operators at most once per dedup
//! window.
//!
//! # Features
//!
//! - **Fire-and-forget**: routing never blocks or fails the request path
//! - **Deduplication**: equivalent failures within a TTL window collapse
//!   into one record with an occurrence count
//! - **Static severity**: `(service, error kind)` pairs map to severity by
//!   configuration, never by parsing error text
//! - **Storm suppression**: one notification per live record, with a retry
//!   on the next occurrence if the alert itself failed
//! - **Independent sinks**: persistence and notification are attempted
//!   independently; one failing never silences the other
//!
//! # Example
//!
//! ```no_run
//! use ballast_faults::{
//!     FailureReport, FailureRouter, FaultRouterConfig, LogNotifier, MemoryFailureStore,
//!     Severity, SeverityMap,
//! };
//! use ballast_retry::ErrorKind;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), ballast_faults::FaultError> {
//! let config = FaultRouterConfig::new().with_severity_map(
//!     SeverityMap::new().add_rule("search-api", ErrorKind::Timeout, Severity::High),
//! );
//! let router = FailureRouter::new(
//!     config,
//!     Arc::new(MemoryFailureStore::new()),
//!     Arc::new(LogNotifier::new()),
//! )?;
//!
//! router.route(FailureReport::new("search-api", "query", ErrorKind::Timeout));
//! router.close().await;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod notify;
pub mod record;
pub mod redis;
pub mod router;
pub mod severity;
pub mod store;

pub use config::{DEFAULT_RECORD_TTL_SECONDS, FaultRouterConfig};
pub use error::{FaultError, FaultResult};
pub use notify::{LogNotifier, Notifier};
pub use record::{DEDUP_HASH_LEN, FailureRecord, FailureReport, dedup_hash};
pub use redis::RedisFailureStore;
pub use router::FailureRouter;
pub use severity::{Severity, SeverityMap, SeverityRule};
pub use store::{FailureStore, MemoryFailureStore};
