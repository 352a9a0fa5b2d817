//! Client SDK for the Neurula patient platform.
//!
//! Wraps the backend's HTTP JSON API: authentication with an
//! access/refresh token lifecycle (automatic renewal on 401), patient and
//! user profile management, document OCR uploads, and manual document
//! registration.
//!
//! The moving parts, leaf first:
//! - [`storage::TokenStore`]: durable key-value persistence for the session
//! - [`http::HttpClient`]: request executor with a fixed timeout and
//!   classified failures
//! - [`auth::AuthClient`]: credential operations and the
//!   refresh-then-retry-once protocol
//! - [`auth::SessionManager`]: session owner, silent re-auth on startup

pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod notice;
pub mod ocr;
pub mod patient;
pub mod registration;
pub mod storage;

pub use auth::{AuthClient, AuthState, RegisterRequest, Session, SessionEvent, SessionManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use http::{HttpClient, HttpResponse, Method, ReqwestHttpClient};
pub use notice::{notice_for, NoticeContext, UserNotice};
pub use ocr::{DocumentKind, OcrClient, ScanResult};
pub use patient::PatientClient;
pub use registration::{EmiratesIdRegistration, PassportRegistration, RegistrationClient};
pub use storage::{FileTokenStore, MemoryTokenStore, TokenStore};

#[cfg(test)]
mod tests;
