pub mod client;
pub mod session;
pub mod token;

pub use client::{AuthClient, LoginRequest, RegisterRequest, TokenResponse};
pub use session::SessionManager;
pub use token::{AuthState, Session, SessionEvent};
