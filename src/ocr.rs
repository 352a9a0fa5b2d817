//! Document OCR upload pipeline.
//!
//! Single multipart upload per scan, fixed timeout, no retry. Failures are
//! classified into the error taxonomy: 400 means the image itself was
//! rejected, 413 means it was too large, 5xx is the server's problem, and a
//! response without an `extracted` object is malformed.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::{endpoints, ApiConfig};
use crate::error::{ApiError, ApiResult};
use crate::http::{generate_request_id, HttpClient};

/// Confidence below this suggests a blurry or badly framed capture
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.5;

/// Document types the OCR backend understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    EmiratesId,
    Passport,
}

impl DocumentKind {
    fn endpoint(&self) -> &'static str {
        match self {
            DocumentKind::EmiratesId => endpoints::OCR_EMIRATES_ID,
            DocumentKind::Passport => endpoints::OCR_PASSPORT,
        }
    }

    fn default_file_name(&self) -> &'static str {
        match self {
            DocumentKind::EmiratesId => "emirates-id.jpg",
            DocumentKind::Passport => "passport.jpg",
        }
    }
}

/// Outcome of a successful scan
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Fields extracted from the document (shape depends on the kind)
    pub extracted: Value,
    /// OCR confidence in `[0, 1]`
    pub confidence: f64,
    /// Raw engine output, when the backend includes it
    pub raw_data: Option<Value>,
    /// Request ID sent in the `X-Request-ID` header
    pub request_id: String,
}

#[derive(Debug, Clone)]
pub struct OcrClient {
    config: ApiConfig,
    http: Arc<dyn HttpClient>,
}

impl OcrClient {
    pub fn new(config: ApiConfig, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    pub async fn scan_emirates_id(
        &self,
        image: Vec<u8>,
        file_name: Option<&str>,
    ) -> ApiResult<ScanResult> {
        self.scan(DocumentKind::EmiratesId, image, file_name).await
    }

    pub async fn scan_passport(
        &self,
        image: Vec<u8>,
        file_name: Option<&str>,
    ) -> ApiResult<ScanResult> {
        self.scan(DocumentKind::Passport, image, file_name).await
    }

    /// Upload a captured document image and return the extracted fields
    pub async fn scan(
        &self,
        kind: DocumentKind,
        image: Vec<u8>,
        file_name: Option<&str>,
    ) -> ApiResult<ScanResult> {
        let request_id = generate_request_id("OCR");
        let file_name = file_name.unwrap_or_else(|| kind.default_file_name());
        let url = self.config.url(kind.endpoint());

        debug!(
            request_id = %request_id,
            kind = ?kind,
            file_name,
            bytes = image.len(),
            "Uploading document for OCR"
        );

        // Content-Type for the request is left to the transport so the
        // multipart boundary is generated correctly.
        let mut headers = HashMap::new();
        headers.insert("Accept".to_string(), "application/json".to_string());
        headers.insert("X-Request-ID".to_string(), request_id.clone());

        let mime = image_mime(file_name);
        let response = self
            .http
            .upload(&url, headers, "image", file_name, image, &mime)
            .await?;

        if !response.is_success() {
            let detail = response.error_detail();
            warn!(
                request_id = %request_id,
                status = response.status,
                detail = %detail,
                "OCR upload rejected"
            );
            return Err(match response.status {
                400 => ApiError::Validation {
                    status: 400,
                    detail,
                },
                413 => ApiError::Validation {
                    status: 413,
                    detail: "image file exceeds the upload size limit".to_string(),
                },
                _ => response.into_error(),
            });
        }

        let data: Value = response.json()?;
        let extracted = match data.get("extracted") {
            Some(extracted) if extracted.is_object() => extracted.clone(),
            _ => {
                return Err(ApiError::malformed(
                    "scan response missing 'extracted' object",
                ))
            }
        };
        let confidence = data
            .get("confidence")
            .and_then(Value::as_f64)
            .unwrap_or(0.0);
        if confidence < LOW_CONFIDENCE_THRESHOLD {
            warn!(
                request_id = %request_id,
                confidence,
                "Low OCR confidence, capture quality may be poor"
            );
        }

        info!(request_id = %request_id, confidence, "Document scan completed");
        Ok(ScanResult {
            extracted,
            confidence,
            raw_data: data.get("raw_data").filter(|v| !v.is_null()).cloned(),
            request_id,
        })
    }
}

fn image_mime(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((_, ext)) => match ext.to_ascii_lowercase().as_str() {
            "png" => "image/png".to_string(),
            "jpg" | "jpeg" => "image/jpeg".to_string(),
            other => format!("image/{}", other),
        },
        None => "image/jpeg".to_string(),
    }
}
