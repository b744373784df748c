//! Built-in guards.

mod auth;
mod logger;
mod title;

pub use auth::AuthGuard;
pub use logger::LoggerGuard;
pub use title::{DocumentTitle, TitleGuard};

use timely_auth::SharedSessionStore;

use crate::guard::GuardChain;

/// Options for the production guard chain.
#[derive(Debug, Clone)]
pub struct ChainOptions {
    pub app_name: String,
    /// Adds the navigation logger in front of the chain.
    pub development: bool,
}

impl Default for ChainOptions {
    fn default() -> Self {
        Self {
            app_name: "Timely".to_string(),
            development: false,
        }
    }
}

/// Logger (development only), then auth, then title.
pub fn standard_chain(
    session: SharedSessionStore,
    title: DocumentTitle,
    options: &ChainOptions,
) -> GuardChain {
    let mut chain = GuardChain::new();
    if options.development {
        chain.push(LoggerGuard);
    }
    chain
        .with(AuthGuard::new(session))
        .with(TitleGuard::new(title, options.app_name.clone()))
}
