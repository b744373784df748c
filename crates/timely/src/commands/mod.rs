//! CLI command handlers.

pub mod auth;
pub mod navigate;
pub mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use timely_auth::storage::create_file_storage;
use timely_auth::{AuthConfig, SessionStore, SharedSessionStore, SharedStorage};

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Where the session, pending login state and logs live.
    pub data_dir: PathBuf,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}

impl Context {
    /// Storage that survives restarts (the session blob).
    pub fn durable_storage(&self) -> SharedStorage {
        create_file_storage(&self.data_dir)
    }

    /// Storage for the in-progress login (OAuth state, post-login redirect).
    ///
    /// File backed so `auth login --no-wait` and `auth callback` can run as
    /// separate invocations.
    pub fn pending_storage(&self) -> SharedStorage {
        create_file_storage(&self.data_dir.join("pending"))
    }

    /// Build the session store from the environment and rehydrate it.
    pub fn session_store(&self) -> Result<SharedSessionStore> {
        let config = AuthConfig::from_env().context("Asana client is not configured")?;
        let store = SessionStore::new(config, self.durable_storage(), self.pending_storage())
            .context("Failed to open session store")?;
        Ok(Arc::new(store))
    }
}
