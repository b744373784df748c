//! Asana OAuth session store for Timely.
//!
//! Holds the client-side authentication state: it exchanges authorization
//! codes through the token exchange proxy, refreshes expiring tokens,
//! loads the user profile and persists everything to durable storage.
//!
//! # Components
//!
//! - [`oauth`]: state generation, authorization URL, proxy and profile requests
//! - [`session`]: session and profile data, persisted layout
//! - [`storage`]: `get`/`set`/`remove` storage backends (file and memory)
//! - [`store`]: the [`SessionStore`] itself

pub mod config;
pub mod error;
pub mod oauth;
pub mod session;
pub mod storage;
pub mod store;

pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use oauth::{TokenGrant, TokenResponse};
pub use session::{Photo, Profile, Session, Workspace};
pub use storage::{FileStorage, MemoryStorage, SharedStorage, Storage};
pub use store::{SessionStore, SharedSessionStore};
