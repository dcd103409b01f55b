//! Operator notification
//!
//! High and critical failures produce a notification through the
//! [`Notifier`] seam. The default [`LogNotifier`] emits structured tracing
//! events; deployments wanting pagers or chat webhooks implement the trait
//! themselves.

use crate::error::FaultResult;
use crate::severity::Severity;
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{error, info, warn};

/// Fire-and-forget notification channel.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one alert.
    ///
    /// Failures are logged and swallowed by the router; a notifier should
    /// not retry internally beyond what its transport already does.
    async fn notify(
        &self,
        severity: Severity,
        summary: &str,
        context: &HashMap<String, String>,
    ) -> FaultResult<()>;
}

/// [`Notifier`] that emits structured log events.
///
/// The log level tracks severity so existing log-based alerting picks these
/// up without extra wiring.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Create a log notifier.
    pub const fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(
        &self,
        severity: Severity,
        summary: &str,
        context: &HashMap<String, String>,
    ) -> FaultResult<()> {
        match severity {
            Severity::Low => info!(severity = %severity, ?context, "{summary}"),
            Severity::Medium => warn!(severity = %severity, ?context, "{summary}"),
            Severity::High | Severity::Critical => {
                error!(severity = %severity, ?context, "{summary}");
            }
        }
        Ok(())
    }
}
