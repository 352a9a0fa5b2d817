//! Manual document registration.
//!
//! Used when OCR capture is unavailable or the user corrects the extracted
//! fields by hand. Required fields are checked client-side before the
//! request goes out; a 409 from the backend surfaces as a duplicate-resource
//! error carrying the existing record when one is included.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{endpoints, ApiConfig};
use crate::error::{ApiError, ApiResult};
use crate::http::{generate_request_id, HttpClient, Method};

/// Manual Emirates ID registration payload
#[derive(Debug, Clone, Serialize)]
pub struct EmiratesIdRegistration {
    pub full_name: String,
    /// Emirates ID number (784-YYYY-NNNNNNN-C)
    pub emirates_id: String,
    pub nationality: String,
    /// Date of birth (YYYY-MM-DD)
    pub date_of_birth: String,
    /// M or F, as printed on the card
    pub sex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name_arabic: Option<String>,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub emirate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
}

/// Manual passport registration payload
#[derive(Debug, Clone, Serialize)]
pub struct PassportRegistration {
    pub full_name: String,
    pub passport_number: String,
    pub nationality: String,
    pub date_of_birth: String,
    pub sex: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub place_of_birth: Option<String>,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub emirate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medical_conditions: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RegistrationClient {
    config: ApiConfig,
    http: Arc<dyn HttpClient>,
}

impl RegistrationClient {
    pub fn new(config: ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    pub async fn register_emirates_id(&self, data: &EmiratesIdRegistration) -> ApiResult<Value> {
        require_fields(&[
            ("full_name", &data.full_name),
            ("emirates_id", &data.emirates_id),
            ("contact", &data.contact),
            ("email", &data.email),
            ("address", &data.address),
            ("emirate", &data.emirate),
        ])?;
        self.submit(endpoints::REGISTER_EMIRATES_ID, data).await
    }

    pub async fn register_passport(&self, data: &PassportRegistration) -> ApiResult<Value> {
        require_fields(&[
            ("full_name", &data.full_name),
            ("passport_number", &data.passport_number),
            ("contact", &data.contact),
            ("email", &data.email),
            ("address", &data.address),
            ("emirate", &data.emirate),
        ])?;
        self.submit(endpoints::REGISTER_PASSPORT, data).await
    }

    /// Fetch a registered Emirates ID record
    pub async fn emirates_id(&self, id: &str) -> ApiResult<Value> {
        self.fetch(&format!("{}/{}", endpoints::GET_EMIRATES_ID, id))
            .await
    }

    /// Fetch a registered passport record
    pub async fn passport(&self, number: &str) -> ApiResult<Value> {
        self.fetch(&format!("{}/{}", endpoints::GET_PASSPORT, number))
            .await
    }

    async fn submit<T: Serialize>(&self, path: &str, data: &T) -> ApiResult<Value> {
        let request_id = generate_request_id("MOBILE");
        let body = serde_json::to_value(data)
            .map_err(|e| ApiError::malformed(format!("unserializable request: {}", e)))?;

        debug!(request_id = %request_id, path, "Submitting manual registration");
        let response = self
            .http
            .request(
                Method::POST,
                &self.config.url(path),
                self.headers(Some(&request_id), true),
                Some(body.to_string()),
            )
            .await?;

        if response.status == 409 {
            let detail = response.error_detail();
            warn!(request_id = %request_id, detail = %detail, "Document already registered");
        }
        let result = response.success()?.json()?;
        info!(request_id = %request_id, path, "Manual registration accepted");
        Ok(result)
    }

    async fn fetch(&self, path: &str) -> ApiResult<Value> {
        self.http
            .request(
                Method::GET,
                &self.config.url(path),
                self.headers(None, false),
                None,
            )
            .await?
            .success()?
            .json()
    }

    fn headers(&self, request_id: Option<&str>, has_body: bool) -> HashMap<String, String> {
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        if has_body {
            headers.insert("Content-Type".to_string(), "application/json".to_string());
        }
        if let Some(id) = request_id {
            headers.insert("X-Request-ID".to_string(), id.to_string());
        }
        headers
    }
}

fn require_fields(fields: &[(&str, &str)]) -> ApiResult<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation {
            status: 400,
            detail: format!("missing required fields: {}", missing.join(", ")),
        })
    }
}
