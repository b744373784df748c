//! The guard trait and the ordered chain that runs guards.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::route::{RouteLocation, RouteTarget};

/// Result of a single guard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Let the next guard run.
    Continue,
    /// Stop the chain and go somewhere else.
    Redirect(RouteTarget),
}

impl GuardOutcome {
    pub fn is_redirect(&self) -> bool {
        matches!(self, GuardOutcome::Redirect(_))
    }
}

/// A pre-navigation check.
///
/// Guards never fail: anything that goes wrong inside a guard must be turned
/// into `Continue` or a `Redirect`.
#[async_trait]
pub trait Guard: Send + Sync {
    /// Guard name, for logs.
    fn name(&self) -> &'static str;

    /// Inspect a pending transition from `from` to `to`.
    async fn check(
        &self,
        to: &RouteLocation,
        from: &RouteLocation,
        cancel: &CancellationToken,
    ) -> GuardOutcome;
}

// ─────────────────────────────────────────────────────────────────────────────
// Guard Chain
// ─────────────────────────────────────────────────────────────────────────────

/// Guards run strictly in order; the first redirect wins.
#[derive(Default, Clone)]
pub struct GuardChain {
    guards: Vec<Arc<dyn Guard>>,
}

impl GuardChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self { guards: Vec::new() }
    }

    /// Append a guard.
    pub fn push<G: Guard + 'static>(&mut self, guard: G) {
        self.guards.push(Arc::new(guard));
    }

    /// Append a guard, builder style.
    pub fn with<G: Guard + 'static>(mut self, guard: G) -> Self {
        self.push(guard);
        self
    }

    /// Guard names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.guards.iter().map(|g| g.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Run every guard until one redirects.
    pub async fn run(
        &self,
        to: &RouteLocation,
        from: &RouteLocation,
        cancel: &CancellationToken,
    ) -> GuardOutcome {
        for guard in &self.guards {
            if let GuardOutcome::Redirect(target) = guard.check(to, from, cancel).await {
                tracing::debug!(
                    guard = guard.name(),
                    to = %to.full_path,
                    redirect = %target,
                    "Guard redirected navigation"
                );
                return GuardOutcome::Redirect(target);
            }
        }
        GuardOutcome::Continue
    }
}

impl std::fmt::Debug for GuardChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardChain")
            .field("guards", &self.names())
            .finish()
    }
}
