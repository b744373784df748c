//! OAuth redirect callback: verifies the state and finishes the login.

use timely_auth::SessionStore;

use crate::route::{DASHBOARD, LOGIN, RouteTarget};

/// Query parameters the provider appends to the redirect URI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parse a bare query string (with or without the leading `?`).
    pub fn from_query(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        let mut params = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => params.code = value,
                "state" => params.state = value,
                "error" => params.error = value,
                "error_description" => params.error_description = value,
                _ => {}
            }
        }
        params
    }

    /// Parse a full redirect URL, or a bare query string.
    pub fn from_url(input: &str) -> Self {
        match url::Url::parse(input.trim()) {
            Ok(url) => Self::from_query(url.query().unwrap_or_default()),
            Err(_) => {
                let query = input.split_once('?').map_or(input, |(_, q)| q);
                Self::from_query(query)
            }
        }
    }
}

/// Why a callback did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoginError {
    #[error("authorization denied: {error}{}", parenthesized(.description))]
    ProviderDenied {
        error: String,
        description: Option<String>,
    },

    #[error("missing '{0}' in callback")]
    MissingParameter(&'static str),

    #[error("OAuth state mismatch")]
    StateMismatch,

    #[error("token exchange failed: {0}")]
    ExchangeFailed(String),
}

fn parenthesized(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(" ({})", d))
        .unwrap_or_default()
}

/// Result of handling a callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackOutcome {
    LoggedIn { redirect: RouteTarget },
    Failed { error: LoginError, redirect: RouteTarget },
}

impl CallbackOutcome {
    fn failed(error: LoginError) -> Self {
        tracing::warn!(error = %error, "Login callback failed");
        CallbackOutcome::Failed {
            error,
            redirect: RouteTarget::named(LOGIN),
        }
    }

    pub fn is_logged_in(&self) -> bool {
        matches!(self, CallbackOutcome::LoggedIn { .. })
    }

    /// Where to navigate next.
    pub fn redirect(&self) -> &RouteTarget {
        match self {
            CallbackOutcome::LoggedIn { redirect } | CallbackOutcome::Failed { redirect, .. } => {
                redirect
            }
        }
    }
}

/// Finish a login from the provider's redirect.
///
/// The stored state is consumed on every callback, whatever it carries, and
/// before the code is exchanged. A mismatch never reaches the token endpoint.
pub async fn complete_login(session: &SessionStore, params: &CallbackParams) -> CallbackOutcome {
    let state_ok = match params.state.as_deref() {
        Some(state) => session.verify_state(state),
        None => {
            session.discard_oauth_state();
            false
        }
    };

    if let Some(error) = &params.error {
        return CallbackOutcome::failed(LoginError::ProviderDenied {
            error: error.clone(),
            description: params.error_description.clone(),
        });
    }

    let Some(code) = params.code.as_deref() else {
        return CallbackOutcome::failed(LoginError::MissingParameter("code"));
    };
    if params.state.is_none() {
        return CallbackOutcome::failed(LoginError::MissingParameter("state"));
    }
    if !state_ok {
        return CallbackOutcome::failed(LoginError::StateMismatch);
    }

    if !session.exchange_code_for_token(code).await {
        let message = session
            .error()
            .unwrap_or_else(|| "Token exchange failed".to_string());
        return CallbackOutcome::failed(LoginError::ExchangeFailed(message));
    }

    let redirect = session
        .take_redirect()
        .map(RouteTarget::Path)
        .unwrap_or_else(|| RouteTarget::named(DASHBOARD));
    tracing::info!(redirect = %redirect, "Login completed");
    CallbackOutcome::LoggedIn { redirect }
}
