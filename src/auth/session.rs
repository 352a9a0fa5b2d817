//! Session orchestrator: the single owner of session state.
//!
//! Wraps the auth client with silent re-authentication on startup and a
//! uniform `ApiResult` surface; nothing here panics past the boundary.

use serde_json::Value;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::auth::client::{AuthClient, RegisterRequest};
use crate::auth::token::{AuthState, Session, SessionEvent};
use crate::error::ApiResult;

/// Drives the session lifecycle for the application
#[derive(Debug, Clone)]
pub struct SessionManager {
    client: Arc<AuthClient>,
}

impl SessionManager {
    pub fn new(client: Arc<AuthClient>) -> Self {
        Self { client }
    }

    /// Attempt silent re-authentication from stored credentials.
    ///
    /// Fast path: stored access token plus a cached user profile. Slow path:
    /// stored token but no cached profile, so the profile is fetched from
    /// the server; if that fails, all stored auth data is cleared and the
    /// session falls back to unauthenticated.
    pub async fn initialize(&self) -> ApiResult<()> {
        if self.client.stored_access_token().await.is_none() {
            debug!("No stored access token, starting unauthenticated");
            self.client.set_state(AuthState::Unauthenticated).await;
            return Ok(());
        }

        if let Some(user) = self.client.stored_user().await {
            debug!("Restored session from cached user data");
            if let Some(session) = self.restored_session(Some(user)).await {
                self.client
                    .set_state(AuthState::Authenticated { session })
                    .await;
                return Ok(());
            }
        } else {
            match self.client.current_user().await {
                Ok(user) => {
                    self.client.store_user(&user).await;
                    if let Some(session) = self.restored_session(Some(user)).await {
                        info!("Restored session from server profile");
                        self.client
                            .set_state(AuthState::Authenticated { session })
                            .await;
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(error = %e, "Silent re-authentication failed, clearing stored auth data");
                }
            }
        }

        self.client.clear_auth_data().await;
        self.client.set_state(AuthState::Unauthenticated).await;
        Ok(())
    }

    async fn restored_session(&self, user: Option<Value>) -> Option<Session> {
        let access = self.client.stored_access_token().await?;
        let refresh = self.client.stored_refresh_token().await?;
        Some(Session::new(access, refresh, user))
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<Value> {
        self.client.register(request).await
    }

    pub async fn verify_otp(&self, identifier: &str, otp: &str) -> ApiResult<Value> {
        self.client.verify_otp(identifier, otp).await
    }

    pub async fn resend_otp(&self, identifier: &str) -> ApiResult<Value> {
        self.client.resend_otp(identifier).await
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        remember_me: bool,
    ) -> ApiResult<Session> {
        self.client.login(identifier, password, remember_me).await
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.client.logout().await
    }

    /// Re-fetch the current user's profile and refresh the cached copy.
    /// Useful after a profile update.
    pub async fn refresh_user(&self) -> ApiResult<Value> {
        let user = self.client.current_user().await?;
        self.client.store_user(&user).await;
        if let Some(session) = self.restored_session(Some(user.clone())).await {
            self.client
                .set_state(AuthState::Authenticated { session })
                .await;
        }
        Ok(user)
    }

    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> ApiResult<Value> {
        self.client
            .change_password(current_password, new_password)
            .await
    }

    pub async fn forgot_password(&self, email: &str) -> ApiResult<Value> {
        self.client.forgot_password(email).await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        otp: &str,
        new_password: &str,
    ) -> ApiResult<Value> {
        self.client.reset_password(email, otp, new_password).await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.client.state().await.is_authenticated()
    }

    pub async fn state(&self) -> AuthState {
        self.client.state().await
    }

    /// The cached user profile, if any
    pub async fn user(&self) -> Option<Value> {
        self.client.stored_user().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.client.subscribe()
    }
}
