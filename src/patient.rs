//! Patient and user profile endpoints.
//!
//! All calls go through the authenticated-request path, so an expired
//! access token is refreshed and the call replayed transparently.

use serde_json::Value;
use std::sync::Arc;

use crate::auth::AuthClient;
use crate::config::endpoints;
use crate::error::ApiResult;
use crate::http::Method;

#[derive(Debug, Clone)]
pub struct PatientClient {
    auth: Arc<AuthClient>,
}

impl PatientClient {
    pub fn new(auth: Arc<AuthClient>) -> Self {
        Self { auth }
    }

    /// Fetch the authenticated patient's profile
    pub async fn profile(&self) -> ApiResult<Value> {
        self.auth
            .authenticated_json(Method::GET, endpoints::PATIENT_ME, None)
            .await
    }

    /// Update the patient profile (medical details, address, ...)
    pub async fn update_profile(&self, patient: &Value) -> ApiResult<Value> {
        self.auth
            .authenticated_json(Method::PUT, endpoints::PATIENT_ME, Some(patient.clone()))
            .await
    }

    /// Update the user record (name, phone)
    pub async fn update_user(&self, user: &Value) -> ApiResult<Value> {
        self.auth
            .authenticated_json(Method::PUT, endpoints::USER_ME, Some(user.clone()))
            .await
    }
}
