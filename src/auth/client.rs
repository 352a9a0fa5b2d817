//! Auth client: credential operations and the refresh-on-401 protocol.
//!
//! Tokens are read from the store at call time and never cached past a
//! single request, so a refresh performed by one call is picked up by the
//! next without coordination.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use crate::auth::token::{AuthState, Session, SessionEvent};
use crate::config::{endpoints, ApiConfig};
use crate::error::{ApiError, ApiResult};
use crate::http::{HttpClient, HttpResponse, Method};
use crate::storage::{keys, TokenStore};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Payload for `POST /auth/register`
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    /// Phone number in international format, e.g. "+971501234567"
    pub phone: String,
    pub password: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub emirates_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub passport_number: Option<String>,
}

/// Payload for `POST /auth/login`. The backend expects the identifier in a
/// `username` field even though it accepts email or phone.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub remember_me: bool,
}

/// Token issuance response from login, OTP verification, and refresh
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<Value>,
}

/// Client for the authentication endpoints.
///
/// Owns the [`AuthState`] marker and drives the refresh protocol:
/// a 401 on an authenticated request triggers at most one refresh and one
/// replay of the original request; a second 401 is a hard failure.
#[derive(Debug)]
pub struct AuthClient {
    config: ApiConfig,
    http: Arc<dyn HttpClient>,
    store: Arc<dyn TokenStore>,
    state: RwLock<AuthState>,
    events: broadcast::Sender<SessionEvent>,
}

impl AuthClient {
    pub fn new(config: ApiConfig, http: Arc<dyn HttpClient>, store: Arc<dyn TokenStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            config,
            http,
            store,
            state: RwLock::new(AuthState::Unauthenticated),
            events,
        }
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Current auth state
    pub async fn state(&self) -> AuthState {
        self.state.read().await.clone()
    }

    pub(crate) async fn set_state(&self, state: AuthState) {
        debug!(state = state.variant_name(), "Auth state changed");
        *self.state.write().await = state.clone();
        let _ = self.events.send(SessionEvent::StateChanged { state });
    }

    // ------------------------------------------------------------------
    // Stored credentials
    // ------------------------------------------------------------------

    pub async fn stored_access_token(&self) -> Option<String> {
        self.store
            .get(keys::ACCESS_TOKEN)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub async fn stored_refresh_token(&self) -> Option<String> {
        self.store
            .get(keys::REFRESH_TOKEN)
            .await
            .and_then(|v| v.as_str().map(str::to_string))
    }

    pub async fn stored_user(&self) -> Option<Value> {
        self.store.get(keys::USER_DATA).await
    }

    pub(crate) async fn store_user(&self, user: &Value) {
        self.store.put(keys::USER_DATA, user.clone()).await;
    }

    /// Remove every persisted credential. Always succeeds locally.
    pub async fn clear_auth_data(&self) {
        self.store
            .remove(&[keys::ACCESS_TOKEN, keys::REFRESH_TOKEN, keys::USER_DATA])
            .await;
    }

    async fn session_from_store(&self) -> Option<Session> {
        let access = self.stored_access_token().await?;
        let refresh = self.stored_refresh_token().await?;
        Some(Session::new(access, refresh, self.stored_user().await))
    }

    // ------------------------------------------------------------------
    // Request plumbing
    // ------------------------------------------------------------------

    fn headers(bearer: Option<&str>, has_body: bool) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if has_body {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(token) = bearer {
            headers.insert("Authorization".to_string(), format!("Bearer {}", token));
        }
        headers
    }

    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        bearer: Option<&str>,
    ) -> ApiResult<HttpResponse> {
        let url = self.config.url(path);
        debug!(method = %method, path, "Sending API request");
        self.http
            .request(
                method,
                &url,
                Self::headers(bearer, body.is_some()),
                body.map(Value::to_string),
            )
            .await
    }

    /// Send an authenticated request, refreshing the access token and
    /// replaying the request exactly once if the server answers 401.
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<HttpResponse> {
        let mut retried = false;
        loop {
            let access = self
                .stored_access_token()
                .await
                .ok_or_else(|| ApiError::session_expired("no access token stored"))?;

            let response = self
                .request(method.clone(), path, body.as_ref(), Some(&access))
                .await?;
            if response.status != 401 {
                return Ok(response);
            }
            if retried {
                // Second 401 after a successful refresh: hard failure,
                // do not loop.
                warn!(path, "Request still unauthorized after token refresh");
                return Err(ApiError::session_expired(response.error_detail()));
            }

            debug!(path, "Received 401, attempting token refresh");
            self.set_state(AuthState::Refreshing).await;
            match self.refresh().await {
                Ok(_) => {
                    match self.session_from_store().await {
                        Some(session) => {
                            self.set_state(AuthState::Authenticated { session }).await;
                        }
                        // Store was mutated underneath the refresh (e.g. a
                        // concurrent logout); never leave Refreshing behind.
                        None => self.set_state(AuthState::Unauthenticated).await,
                    }
                    retried = true;
                }
                Err(e) => {
                    warn!(error = %e, "Token refresh failed, clearing stored credentials");
                    self.clear_auth_data().await;
                    self.set_state(AuthState::Unauthenticated).await;
                    let _ = self.events.send(SessionEvent::SessionExpired);
                    return Err(ApiError::session_expired(
                        "session expired, please log in again",
                    ));
                }
            }
        }
    }

    /// Authenticated request that also decodes a successful JSON body
    pub async fn authenticated_json<T: serde::de::DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ApiResult<T> {
        self.authenticated_request(method, path, body)
            .await?
            .success()?
            .json()
    }

    // ------------------------------------------------------------------
    // Credential operations
    // ------------------------------------------------------------------

    /// Register a new user. On success the backend sends an OTP to the
    /// given email/phone; the account activates via [`Self::verify_otp`].
    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        let body = serde_json::to_value(request)
            .map_err(|e| ApiError::malformed(format!("unserializable request: {}", e)))?;
        self.request(Method::POST, endpoints::REGISTER, Some(&body), None)
            .await?
            .success()?
            .json()
    }

    /// Verify the OTP sent after registration
    pub async fn verify_otp(&self, identifier: &str, otp: &str) -> ApiResult<Value> {
        let body = json!({ "identifier": identifier, "otp": otp });
        self.request(Method::POST, endpoints::VERIFY_OTP, Some(&body), None)
            .await?
            .success()?
            .json()
    }

    pub async fn resend_otp(&self, identifier: &str) -> ApiResult<Value> {
        let body = json!({ "identifier": identifier });
        self.request(Method::POST, endpoints::RESEND_OTP, Some(&body), None)
            .await?
            .success()?
            .json()
    }

    /// Log in with email or phone. Stores both tokens and the user profile
    /// and moves the state to `Authenticated`.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember_me: bool,
    ) -> ApiResult<Session> {
        let request = LoginRequest {
            username: identifier.to_string(),
            password: password.to_string(),
            remember_me,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ApiError::malformed(format!("unserializable request: {}", e)))?;
        let response = self
            .request(Method::POST, endpoints::LOGIN, Some(&body), None)
            .await?
            .success()?;
        let tokens: TokenResponse = response.json()?;
        let refresh_token = tokens
            .refresh_token
            .ok_or_else(|| ApiError::malformed("login response missing refresh_token"))?;

        self.store
            .put(keys::ACCESS_TOKEN, json!(tokens.access_token))
            .await;
        self.store
            .put(keys::REFRESH_TOKEN, json!(refresh_token))
            .await;
        if let Some(user) = &tokens.user {
            self.store_user(user).await;
        }

        let session = Session::new(tokens.access_token, refresh_token, tokens.user);
        self.set_state(AuthState::Authenticated {
            session: session.clone(),
        })
        .await;
        info!("Login succeeded");
        Ok(session)
    }

    /// Exchange the stored refresh token for a new access token.
    ///
    /// Authenticates with the *refresh* token. Only the access token is
    /// replaced; state transitions are handled by the caller.
    pub async fn refresh(&self) -> ApiResult<String> {
        let refresh_token = self
            .stored_refresh_token()
            .await
            .ok_or_else(|| ApiError::session_expired("no refresh token stored"))?;
        let response = self
            .request(Method::POST, endpoints::REFRESH, None, Some(&refresh_token))
            .await?
            .success()?;
        let tokens: TokenResponse = response.json()?;
        self.store
            .put(keys::ACCESS_TOKEN, json!(tokens.access_token))
            .await;
        debug!("Access token refreshed");
        Ok(tokens.access_token)
    }

    /// Log out: best-effort server-side invalidation, then unconditional
    /// local clearing. Local logout never fails.
    pub async fn logout(&self) -> ApiResult<()> {
        if let Some(access) = self.stored_access_token().await {
            match self
                .request(Method::POST, endpoints::LOGOUT, None, Some(&access))
                .await
            {
                Ok(response) if !response.is_success() => {
                    warn!(
                        status = response.status,
                        "Server-side logout failed, clearing local session anyway"
                    );
                }
                Err(e) => {
                    warn!(error = %e, "Logout request failed, clearing local session anyway");
                }
                Ok(_) => {}
            }
        }
        self.clear_auth_data().await;
        self.set_state(AuthState::Unauthenticated).await;
        info!("Logged out");
        Ok(())
    }

    /// Fetch the current user's profile
    pub async fn current_user(&self) -> ApiResult<Value> {
        self.authenticated_json(Method::GET, endpoints::ME, None)
            .await
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<Value> {
        let body = json!({
            "current_password": current_password,
            "new_password": new_password,
        });
        self.authenticated_json(Method::POST, endpoints::CHANGE_PASSWORD, Some(body))
            .await
    }

    /// Start the password-reset flow by sending an OTP to the email
    pub async fn forgot_password(&self, email: &str) -> ApiResult<Value> {
        let body = json!({ "email": email });
        self.request(Method::POST, endpoints::FORGOT_PASSWORD, Some(&body), None)
            .await?
            .success()?
            .json()
    }

    /// Complete the password-reset flow with the OTP
    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> ApiResult<Value> {
        let body = json!({
            "email": email,
            "otp": otp,
            "new_password": new_password,
        });
        self.request(Method::POST, endpoints::RESET_PASSWORD, Some(&body), None)
            .await?
            .success()?
            .json()
    }
}
