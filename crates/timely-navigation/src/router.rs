//! Router: resolves paths, runs the guard chain and commits the result.

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::error::{NavigationError, Result};
use crate::guard::{GuardChain, GuardOutcome};
use crate::route::{RouteLocation, RouteTable, RouteTarget};

/// Redirects followed before a navigation is treated as a loop.
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

/// Tracks the current location and moves between routes through the guards.
#[derive(Debug)]
pub struct Router {
    table: RouteTable,
    chain: GuardChain,
    current: RwLock<RouteLocation>,
    /// Held for the whole of a navigation; transitions run one at a time.
    in_flight: tokio::sync::Mutex<()>,
    max_redirects: usize,
}

impl Router {
    pub fn new(table: RouteTable, chain: GuardChain) -> Self {
        Self {
            table,
            chain,
            current: RwLock::new(RouteLocation::start()),
            in_flight: tokio::sync::Mutex::new(()),
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// The last committed location.
    pub fn current(&self) -> RouteLocation {
        self.current.read().clone()
    }

    /// Navigate to a path.
    pub async fn navigate(&self, path: &str) -> Result<RouteLocation> {
        self.navigate_with(RouteTarget::path(path), &CancellationToken::new())
            .await
    }

    /// Navigate to `target`, following guard redirects.
    ///
    /// The current location only changes when the navigation completes.
    pub async fn navigate_with(
        &self,
        target: RouteTarget,
        cancel: &CancellationToken,
    ) -> Result<RouteLocation> {
        let _turn = self.in_flight.lock().await;
        let from = self.current();
        let mut to = self.table.resolve_target(&target)?;
        let mut hops = 0;

        loop {
            if cancel.is_cancelled() {
                return Err(NavigationError::Cancelled);
            }

            let outcome = self.chain.run(&to, &from, cancel).await;
            if cancel.is_cancelled() {
                tracing::debug!(to = %to.full_path, "Navigation cancelled");
                return Err(NavigationError::Cancelled);
            }

            match outcome {
                GuardOutcome::Continue => break,
                GuardOutcome::Redirect(next) => {
                    hops += 1;
                    if hops > self.max_redirects {
                        tracing::warn!(requested = %target, hops, "Redirect loop detected");
                        return Err(NavigationError::RedirectLoop {
                            path: target.to_string(),
                            hops,
                        });
                    }
                    to = self.table.resolve_target(&next)?;
                }
            }
        }

        *self.current.write() = to.clone();
        tracing::debug!(path = %to.full_path, hops, "Navigation committed");
        Ok(to)
    }
}
