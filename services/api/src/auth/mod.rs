//! Authentication: session management and multi-strategy identity
//! resolution.

pub mod resolver;
pub mod session;

pub use resolver::{IdentityResolver, RequestIdentity, ResolverChain, authorize_role};
pub use session::SessionManager;

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "campus_session";
