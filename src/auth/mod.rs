//! Wallet authentication: signature recovery, session tokens and the request pipeline.

pub mod middleware;
pub mod session;
pub mod verify;

pub use middleware::{AppState, AuthSession, GatedSession, RequestContext};
pub use session::{Session, SessionError, SessionIssuer};
pub use verify::{sign_message, verify_signature};
