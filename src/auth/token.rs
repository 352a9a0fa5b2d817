use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Process-wide authentication state.
///
/// Created on successful login or OTP verification, the access token is
/// replaced on refresh, and the whole session is destroyed on logout or an
/// irrecoverable refresh failure. A non-empty access token only means the
/// client *believes* the session is valid; the server's 401 is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    /// Opaque user profile cached for offline display
    pub user: Option<Value>,
    /// When this session was created or last refreshed
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn new(access_token: String, refresh_token: String, user: Option<Value>) -> Self {
        Self {
            access_token,
            refresh_token,
            user,
            created_at: Utc::now(),
        }
    }
}

/// The three states of the refresh protocol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AuthState {
    /// No usable credentials
    Unauthenticated,

    /// Credentials believed valid
    Authenticated { session: Session },

    /// A 401 was received and the refresh call is in flight
    Refreshing,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    /// Short state name for log fields
    pub fn variant_name(&self) -> &'static str {
        match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Authenticated { .. } => "authenticated",
            AuthState::Refreshing => "refreshing",
        }
    }
}

/// Events published by the auth client for UI consumption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionEvent {
    /// The auth state changed
    StateChanged { state: AuthState },

    /// The refresh protocol was exhausted; the user must log in again
    SessionExpired,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_names_are_log_friendly() {
        assert_eq!(AuthState::Unauthenticated.variant_name(), "unauthenticated");
        assert_eq!(AuthState::Refreshing.variant_name(), "refreshing");
        let state = AuthState::Authenticated {
            session: Session::new("a".into(), "r".into(), None),
        };
        assert_eq!(state.variant_name(), "authenticated");
        assert!(state.is_authenticated());
    }
}
