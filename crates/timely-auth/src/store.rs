//! The session store: token lifecycle, profile and persistence.
//!
//! Public lifecycle operations never return errors. Failures are turned into
//! a `false` result plus a readable message available from [`SessionStore::error`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::oauth::{
    TokenGrant, TokenResponse, build_authorization_url, fetch_current_user, generate_state,
    request_tokens,
};
use crate::session::{Profile, Session, now_ms};
use crate::storage::{OAUTH_STATE_KEY, REDIRECT_KEY, SESSION_KEY, SharedStorage, Storage};

/// Lifetime given to personal access token sessions (one year).
const PERSONAL_TOKEN_LIFETIME_MS: i64 = 365 * 24 * 60 * 60 * 1000;

/// Shared session store handle.
pub type SharedSessionStore = Arc<SessionStore>;

/// Read the persisted session from `durable`.
///
/// An unreadable blob is removed and reported as no session.
pub fn read_persisted_session(durable: &dyn Storage) -> Result<Option<Session>> {
    let Some(raw) = durable.get(SESSION_KEY)? else {
        return Ok(None);
    };

    match serde_json::from_str::<Session>(&raw) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            tracing::warn!(error = %e, "Discarding unreadable persisted session");
            durable.remove(SESSION_KEY)?;
            Ok(None)
        }
    }
}

/// Remove the persisted session along with any pending login state.
///
/// Returns whether a session blob was present.
pub fn clear_persisted_session(durable: &dyn Storage, ephemeral: &dyn Storage) -> Result<bool> {
    let existed = durable.take(SESSION_KEY)?.is_some();
    ephemeral.remove(OAUTH_STATE_KEY)?;
    ephemeral.remove(REDIRECT_KEY)?;
    Ok(existed)
}

/// Holds the current session and performs every operation that changes it.
#[derive(Debug)]
pub struct SessionStore {
    config: AuthConfig,
    client: reqwest::Client,
    durable: SharedStorage,
    ephemeral: SharedStorage,
    session: RwLock<Session>,
    error: RwLock<Option<String>>,
    loading: AtomicBool,
    refresh_lock: tokio::sync::Mutex<()>,
    refresh_generation: AtomicU64,
    last_refresh_ok: AtomicBool,
}

/// Sets the loading flag for the lifetime of the guard.
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn start(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl SessionStore {
    /// Create a store and rehydrate any persisted session.
    ///
    /// `durable` keeps the session across restarts; `ephemeral` holds the
    /// single-use OAuth state and the post-login redirect.
    pub fn new(config: AuthConfig, durable: SharedStorage, ephemeral: SharedStorage) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let store = Self {
            config,
            client,
            durable,
            ephemeral,
            session: RwLock::new(Session::default()),
            error: RwLock::new(None),
            loading: AtomicBool::new(false),
            refresh_lock: tokio::sync::Mutex::new(()),
            refresh_generation: AtomicU64::new(0),
            last_refresh_ok: AtomicBool::new(false),
        };
        store.load_from_storage();
        Ok(store)
    }

    /// Create a shared store.
    pub fn shared(
        config: AuthConfig,
        durable: SharedStorage,
        ephemeral: SharedStorage,
    ) -> Result<SharedSessionStore> {
        Ok(Arc::new(Self::new(config, durable, ephemeral)?))
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Observers
    // ------------------------------------------------------------------------

    /// A copy of the current session.
    pub fn snapshot(&self) -> Session {
        self.session.read().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.session.read().access_token.clone()
    }

    pub fn has_refresh_token(&self) -> bool {
        self.session.read().refresh_token.is_some()
    }

    pub fn user(&self) -> Option<Profile> {
        self.session.read().user.clone()
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.session.read().expires_at
    }

    /// The last recorded error message, if any.
    pub fn error(&self) -> Option<String> {
        self.error.read().clone()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::SeqCst)
    }

    /// Token present, profile present and token not expired.
    pub fn is_authenticated(&self) -> bool {
        self.session.read().is_authenticated_at(now_ms())
    }

    /// True when no expiry is recorded or it has passed.
    pub fn is_token_expired(&self) -> bool {
        self.session.read().is_expired_at(now_ms())
    }

    // ------------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------------

    fn load_from_storage(&self) {
        match read_persisted_session(self.durable.as_ref()) {
            Ok(Some(session)) => {
                tracing::debug!(
                    has_token = session.access_token.is_some(),
                    has_user = session.user.is_some(),
                    "Rehydrated session"
                );
                *self.session.write() = session;
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Failed to read persisted session"),
        }
    }

    fn save_to_storage(&self) {
        let json = match serde_json::to_string(&*self.session.read()) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize session");
                return;
            }
        };
        if let Err(e) = self.durable.set(SESSION_KEY, &json) {
            tracing::error!(error = %e, "Failed to persist session");
        }
    }

    fn clear_storage(&self) {
        if let Err(e) = self.durable.remove(SESSION_KEY) {
            tracing::error!(error = %e, "Failed to remove persisted session");
        }
    }

    /// Apply refreshed tokens. The refresh token is kept when none is returned.
    fn set_tokens(&self, tokens: TokenResponse) {
        {
            let mut session = self.session.write();
            session.expires_at = Some(expiry_from(tokens.expires_in));
            session.access_token = Some(tokens.access_token);
            if let Some(refresh_token) = tokens.refresh_token {
                session.refresh_token = Some(refresh_token);
            }
        }
        self.save_to_storage();
    }

    /// Start a new session from freshly exchanged tokens.
    ///
    /// Nothing from the previous session survives, including its profile.
    fn replace_tokens(&self, tokens: TokenResponse) {
        *self.session.write() = Session {
            expires_at: Some(expiry_from(tokens.expires_in)),
            access_token: Some(tokens.access_token),
            refresh_token: tokens.refresh_token,
            user: None,
        };
        self.save_to_storage();
    }

    fn set_user(&self, profile: Profile) {
        self.session.write().user = Some(profile);
        self.save_to_storage();
    }

    fn record_error(&self, message: impl Into<String>) {
        *self.error.write() = Some(message.into());
    }

    fn clear_error(&self) {
        *self.error.write() = None;
    }

    // ------------------------------------------------------------------------
    // Token lifecycle
    // ------------------------------------------------------------------------

    /// Exchange an authorization code for tokens, then load the profile.
    ///
    /// Returns `true` once tokens are stored. The new tokens replace the whole
    /// previous session. A failure leaves the previous session untouched.
    pub async fn exchange_code_for_token(&self, code: &str) -> bool {
        let _loading = LoadingGuard::start(&self.loading);
        self.clear_error();

        let grant = TokenGrant::AuthorizationCode {
            code: code.to_string(),
        };
        match request_tokens(&self.client, &self.config, &grant).await {
            Ok(tokens) => {
                self.replace_tokens(tokens);
                tracing::info!("Authorization code exchanged");
                self.fetch_user().await;
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Token exchange failed");
                self.record_error(e.to_string());
                false
            }
        }
    }

    /// Refresh the access token.
    ///
    /// Without a refresh token, or when the refresh is rejected, the session
    /// is cleared and `false` is returned. Callers that arrive while a refresh
    /// is in flight wait for it and share its outcome.
    pub async fn refresh_access_token(&self) -> bool {
        let observed = self.refresh_generation.load(Ordering::SeqCst);
        let _slot = self.refresh_lock.lock().await;
        if self.refresh_generation.load(Ordering::SeqCst) != observed {
            tracing::debug!("Joined in-flight token refresh");
            return self.last_refresh_ok.load(Ordering::SeqCst);
        }

        let ok = self.refresh_once().await;
        self.last_refresh_ok.store(ok, Ordering::SeqCst);
        self.refresh_generation.fetch_add(1, Ordering::SeqCst);
        ok
    }

    async fn refresh_once(&self) -> bool {
        let refresh_token = self.session.read().refresh_token.clone();
        let Some(refresh_token) = refresh_token else {
            tracing::info!("No refresh token available, logging out");
            self.logout();
            return false;
        };

        let _loading = LoadingGuard::start(&self.loading);
        tracing::info!("Token expired, refreshing...");
        let grant = TokenGrant::RefreshToken { refresh_token };
        match request_tokens(&self.client, &self.config, &grant).await {
            Ok(tokens) => {
                self.set_tokens(tokens);
                tracing::info!("Token refreshed successfully");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, logging out");
                self.logout();
                false
            }
        }
    }

    /// Load the profile for the current access token.
    ///
    /// Does nothing without a token. Failures are recorded but the session
    /// is kept.
    pub async fn fetch_user(&self) {
        let Some(access_token) = self.access_token() else {
            return;
        };

        match fetch_current_user(&self.client, &self.config, &access_token).await {
            Ok(profile) => {
                tracing::debug!(user = %profile.gid, "Fetched user profile");
                self.set_user(profile);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to fetch user profile");
                self.record_error(e.to_string());
            }
        }
    }

    /// Clear the session and its persisted copy.
    pub fn logout(&self) {
        *self.session.write() = Session::default();
        self.clear_error();
        self.clear_storage();
    }

    // ------------------------------------------------------------------------
    // Redirect flow
    // ------------------------------------------------------------------------

    /// Build the provider authorization URL with a fresh single-use state.
    pub fn generate_oauth_url(&self) -> String {
        let state = generate_state();
        if let Err(e) = self.ephemeral.set(OAUTH_STATE_KEY, &state) {
            tracing::error!(error = %e, "Failed to store OAuth state");
        }
        build_authorization_url(&self.config, &state)
    }

    /// Consume the stored OAuth state and compare it with `received`.
    pub fn verify_state(&self, received: &str) -> bool {
        match self.ephemeral.take(OAUTH_STATE_KEY) {
            Ok(Some(saved)) => saved == received,
            Ok(None) => false,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read OAuth state");
                false
            }
        }
    }

    /// Drop any pending OAuth state without checking it.
    pub fn discard_oauth_state(&self) {
        if let Err(e) = self.ephemeral.remove(OAUTH_STATE_KEY) {
            tracing::error!(error = %e, "Failed to remove OAuth state");
        }
    }

    /// Remember where to go once login completes.
    pub fn remember_redirect(&self, full_path: &str) {
        if let Err(e) = self.ephemeral.set(REDIRECT_KEY, full_path) {
            tracing::warn!(error = %e, "Failed to remember post-login redirect");
        }
    }

    /// Take the remembered post-login path, if any.
    pub fn take_redirect(&self) -> Option<String> {
        self.ephemeral.take(REDIRECT_KEY).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read post-login redirect");
            None
        })
    }

    // ------------------------------------------------------------------------
    // Alternate login and startup
    // ------------------------------------------------------------------------

    /// Sign in with a long-lived personal access token.
    ///
    /// Uses `token`, or the configured token when `None`. The session is only
    /// replaced once the profile loads.
    pub async fn login_with_token(&self, token: Option<&str>) -> bool {
        let _loading = LoadingGuard::start(&self.loading);
        self.clear_error();

        let Some(token) = token
            .map(str::to_string)
            .or_else(|| self.config.personal_access_token.clone())
            .filter(|t| !t.trim().is_empty())
        else {
            self.record_error("Personal access token not found");
            return false;
        };

        match fetch_current_user(&self.client, &self.config, &token).await {
            Ok(profile) => {
                *self.session.write() = Session {
                    access_token: Some(token),
                    refresh_token: None,
                    expires_at: Some(now_ms().saturating_add(PERSONAL_TOKEN_LIFETIME_MS)),
                    user: Some(profile),
                };
                self.save_to_storage();
                tracing::info!("Signed in with personal access token");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Personal access token login failed");
                self.record_error(e.to_string());
                false
            }
        }
    }

    /// Bring the session up to date at application start.
    ///
    /// Works from the session rehydrated by [`SessionStore::new`].
    pub async fn initialize_auth(&self) {
        if self.access_token().is_none() {
            return;
        }

        if self.is_token_expired() && !self.refresh_access_token().await {
            return;
        }

        if self.user().is_none() {
            self.fetch_user().await;
        }
    }
}

/// Epoch milliseconds `expires_in` seconds from now.
fn expiry_from(expires_in: u64) -> i64 {
    let expires_in_ms = i64::try_from(expires_in)
        .unwrap_or(i64::MAX)
        .saturating_mul(1000);
    now_ms().saturating_add(expires_in_ms)
}
