//! Authentication guard.

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use timely_auth::SharedSessionStore;

use crate::guard::{Guard, GuardOutcome};
use crate::route::{DASHBOARD, LOGIN, RouteLocation, RouteTarget};

/// Keeps unauthenticated users out of protected routes and authenticated
/// users off the login page.
pub struct AuthGuard {
    session: SharedSessionStore,
}

impl AuthGuard {
    pub fn new(session: SharedSessionStore) -> Self {
        Self { session }
    }

    /// Refresh an expired token, unless the navigation is cancelled first.
    async fn refresh_if_expired(&self, cancel: &CancellationToken) {
        if !self.session.is_token_expired() || !self.session.has_refresh_token() {
            return;
        }

        tokio::select! {
            refreshed = self.session.refresh_access_token() => {
                tracing::debug!(refreshed, "Refreshed token before navigation");
            }
            _ = cancel.cancelled() => {
                tracing::debug!("Navigation cancelled during token refresh");
            }
        }
    }
}

#[async_trait]
impl Guard for AuthGuard {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn check(
        &self,
        to: &RouteLocation,
        _from: &RouteLocation,
        cancel: &CancellationToken,
    ) -> GuardOutcome {
        if to.meta.requires_auth {
            self.refresh_if_expired(cancel).await;

            if !self.session.is_authenticated() {
                self.session.remember_redirect(&to.full_path);
                return GuardOutcome::Redirect(RouteTarget::named(LOGIN));
            }
        }

        if to.is_named(LOGIN) && self.session.is_authenticated() {
            return GuardOutcome::Redirect(RouteTarget::named(DASHBOARD));
        }

        GuardOutcome::Continue
    }
}
