//! Authentication and session management.
//!
//! This module provides:
//! - `TokenStore`: durable access/refresh token pair
//! - `build_headers`: request headers derived from the current access token
//! - `RefreshCoordinator`: single-flight token refresh with a FIFO waiter queue
//! - `SessionClient`: authenticated requests plus login/register/logout/profile
//!
//! The client never validates token expiry locally. A 401 from the server
//! triggers one refresh and one replay of the failed request.

pub mod refresh;
pub mod session;
pub mod tokens;

pub use refresh::RefreshCoordinator;
pub use session::{SessionClient, SessionState};
pub use tokens::{build_headers, TokenStore};
