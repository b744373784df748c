//! Routing for Timely.
//!
//! A static route table, an ordered chain of navigation guards that decides
//! whether a transition may proceed, and the OAuth callback flow that turns
//! the provider's redirect into a session.
//!
//! ```text
//! navigate(path) ─▶ RouteTable::resolve ─▶ GuardChain::run ─┬─ Continue ─▶ commit
//!                          ▲                                 │
//!                          └──────────── Redirect(target) ◀──┘
//! ```

pub mod callback;
pub mod error;
pub mod guard;
pub mod guards;
pub mod route;
pub mod router;

pub use callback::{CallbackOutcome, CallbackParams, LoginError, complete_login};
pub use error::{NavigationError, Result};
pub use guard::{Guard, GuardChain, GuardOutcome};
pub use guards::{
    AuthGuard, ChainOptions, DocumentTitle, LoggerGuard, TitleGuard, standard_chain,
};
pub use route::{RouteLocation, RouteMeta, RouteRecord, RouteTable, RouteTarget};
pub use router::Router;
