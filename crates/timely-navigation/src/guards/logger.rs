//! Development navigation logger.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::guard::{Guard, GuardOutcome};
use crate::route::RouteLocation;

/// Logs every transition at debug level.
#[derive(Debug, Default)]
pub struct LoggerGuard;

#[async_trait]
impl Guard for LoggerGuard {
    fn name(&self) -> &'static str {
        "logger"
    }

    async fn check(
        &self,
        to: &RouteLocation,
        from: &RouteLocation,
        _cancel: &CancellationToken,
    ) -> GuardOutcome {
        tracing::debug!(
            from = %from.full_path,
            to = %to.full_path,
            route = to.name.as_deref().unwrap_or("-"),
            "Navigating"
        );
        GuardOutcome::Continue
    }
}
