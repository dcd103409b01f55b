//! Policy-driven retries
//!
//! This crate provides the retry layer of the ballast resilience stack: a
//! per-service [`RetryPolicy`] selects a backoff [`Strategy`], and a
//! [`RetryExecutor`] drives async operations through the resulting attempt
//! schedule.
//!
//! # Features
//!
//! - **Four backoff shapes**: fixed, linear, exponential, and exponential
//!   with full jitter, all computed by one exhaustively-tested function
//! - **Explicit classification**: errors implement [`Classify`] to report a
//!   closed [`ErrorKind`]; retry decisions never parse message text
//! - **Server hints**: a `Retry-After` style hint on the error overrides the
//!   computed backoff for that attempt, capped at `max_delay_ms`
//! - **Accountable failures**: the terminal [`RetryError`] carries the
//!   attempt count and total backoff spent, for downstream fault reporting
//!
//! # Example
//!
//! ```no_run
//! use ballast_retry::{PolicySet, RetryExecutor, RetryPolicy, Strategy};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! # #[derive(Debug, thiserror::Error)]
//! # #[error("boom")]
//! # struct ApiError;
//! # impl ballast_retry::Classify for ApiError {
//! #     fn kind(&self) -> ballast_retry::ErrorKind { ballast_retry::ErrorKind::Timeout }
//! # }
//! # async fn call_downstream() -> Result<String, ApiError> { Ok(String::new()) }
//! let executor = RetryExecutor::new(PolicySet::new().add_policy(
//!     RetryPolicy::new("search-api")
//!         .with_strategy(Strategy::ExponentialJittered)
//!         .with_max_attempts(4),
//! ))?;
//!
//! let response = executor
//!     .execute("search-api", || call_downstream())
//!     .await?;
//! println!("{response}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod backoff;
pub mod classify;
pub mod error;
pub mod executor;
pub mod policy;

pub use backoff::{delay_ms_for_attempt, full_jitter_ms};
pub use classify::{Classify, Disposition, ErrorKind};
pub use error::{InvalidPolicy, RetryError};
pub use executor::RetryExecutor;
pub use policy::{
    DEFAULT_BASE_DELAY_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY_MS, PolicySet, RetryPolicy,
    Strategy,
};
