//! Churnboard core: session state, token decoding and route guarding

pub mod error;
pub mod guard;
pub mod routes;
pub mod session;
pub mod state_dir;
pub mod store;
pub mod token;

pub use error::{CoreError, CoreResult};
pub use guard::{GuardDecision, Navigation, RouteGuard};
pub use routes::{HOME_PATH, LOGIN_PATH, Route, RouteTable};
pub use session::{SessionContext, SessionState};
pub use state_dir::StateDir;
pub use store::{DEFAULT_TOKEN_KEY, FileTokenStore, MemoryTokenStore, TokenStore};
pub use token::{Claims, DecodeError, claims_of, decode};
