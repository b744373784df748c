//! Session and profile data, and their persisted layout.

use serde::{Deserialize, Serialize};

/// Avatar variants supplied by the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Photo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_21x21: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_27x27: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_36x36: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_60x60: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_128x128: Option<String>,
}

/// A workspace the user belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub gid: String,
    pub name: String,
}

/// The provider's view of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub gid: String,
    pub email: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Photo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workspaces: Option<Vec<Workspace>>,
}

/// Client-held authentication state.
///
/// Serialized as one JSON blob with camelCase keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    /// Expiry as milliseconds since the Unix epoch.
    pub expires_at: Option<i64>,
    pub user: Option<Profile>,
}

impl Session {
    /// True if no expiry is recorded or `now_ms` is at or past it.
    pub fn is_expired_at(&self, now_ms: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now_ms >= expires_at,
            None => true,
        }
    }

    /// Token present, profile present and not expired.
    pub fn is_authenticated_at(&self, now_ms: i64) -> bool {
        self.access_token.is_some() && self.user.is_some() && !self.is_expired_at(now_ms)
    }

    pub fn is_empty(&self) -> bool {
        self == &Session::default()
    }

    /// Milliseconds until expiry, zero when expired or unknown.
    pub fn remaining_ms_at(&self, now_ms: i64) -> i64 {
        self.expires_at
            .map(|expires_at| (expires_at - now_ms).max(0))
            .unwrap_or(0)
    }
}

/// Current wall clock in epoch milliseconds.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
