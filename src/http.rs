//! HTTP request executor
//!
//! A thin abstraction over the transport so the auth client and the document
//! services can be tested without a live backend. Transport failures are
//! classified into [`ApiError`] variants here; callers never see raw
//! `reqwest` errors.

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};

pub use reqwest::Method;

/// Simplified HTTP response for standardized handling
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response body as text
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Parse the response body as JSON
    pub fn json<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::malformed(format!("invalid JSON body: {}", e)))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Best-effort human-readable detail from an error body.
    ///
    /// The backend reports failures as `detail` (FastAPI convention, either a
    /// string or an object with a `message`), `message`, or `error`.
    pub fn error_detail(&self) -> String {
        let parsed: Value = serde_json::from_str(&self.body).unwrap_or(Value::Null);
        let from_field = |v: &Value| -> Option<String> {
            match v {
                Value::String(s) => Some(s.clone()),
                Value::Object(map) => map
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            }
        };
        parsed
            .get("detail")
            .and_then(from_field)
            .or_else(|| parsed.get("message").and_then(from_field))
            .or_else(|| parsed.get("error").and_then(from_field))
            .unwrap_or_else(|| format!("HTTP {}", self.status))
    }

    /// Map a non-success response into the error taxonomy.
    pub fn into_error(self) -> ApiError {
        let detail = self.error_detail();
        match self.status {
            401 => ApiError::Auth {
                detail,
                session_expired: false,
            },
            409 => {
                let parsed: Value = serde_json::from_str(&self.body).unwrap_or(Value::Null);
                ApiError::Conflict {
                    detail,
                    existing: parsed.pointer("/detail/existing_record").cloned(),
                }
            }
            status @ 400..=499 => ApiError::Validation { status, detail },
            status @ 500..=599 => ApiError::Server { status, detail },
            status => ApiError::malformed(format!("unexpected HTTP status {}", status)),
        }
    }

    /// Pass successful responses through, convert everything else
    pub fn success(self) -> ApiResult<HttpResponse> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(self.into_error())
        }
    }
}

/// HTTP client seam used by every service in the crate
#[async_trait]
pub trait HttpClient: Send + Sync + Debug {
    /// Send a request with the given method, absolute URL, headers, and
    /// optional text body
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> ApiResult<HttpResponse>;

    /// POST a single file as multipart form data.
    ///
    /// Implementations must not set an explicit `Content-Type` header for
    /// the request itself; the multipart boundary has to be generated by the
    /// transport.
    async fn upload(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> ApiResult<HttpResponse>;
}

/// Production implementation backed by reqwest
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }

    async fn finish(request: reqwest::RequestBuilder) -> ApiResult<HttpResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> ApiResult<HttpResponse> {
        let mut builder = self.client.request(method, url).timeout(self.timeout);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }
        Self::finish(builder).await
    }

    async fn upload(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        field: &str,
        file_name: &str,
        bytes: Vec<u8>,
        mime: &str,
    ) -> ApiResult<HttpResponse> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .map_err(|e| ApiError::malformed(format!("invalid mime type '{}': {}", mime, e)))?;
        let form = reqwest::multipart::Form::new().part(field.to_string(), part);

        // Content-Type with the boundary is set by reqwest; only the extra
        // headers are added here.
        let mut builder = self
            .client
            .post(url)
            .timeout(self.timeout)
            .multipart(form);
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        Self::finish(builder).await
    }
}

/// Generate a unique request ID for tracking, e.g. `OCR-1712345678901-9f8a...`
pub fn generate_request_id(prefix: &str) -> String {
    format!(
        "{}-{}-{}",
        prefix,
        Utc::now().timestamp_millis(),
        Uuid::new_v4().simple()
    )
}

/// A request as seen by the [`MockHttpClient`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub url: String,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

/// Scriptable HTTP client for tests.
///
/// Responses are queued per `(method, url)` pair and consumed in order, which
/// makes it possible to script sequences like 401-then-200 for the
/// refresh-and-retry protocol. Every request is recorded for assertions.
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    responses: Arc<Mutex<HashMap<String, VecDeque<HttpResponse>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    fn key(method: &str, url: &str) -> String {
        format!("{} {}", method, url)
    }

    /// Queue a response for the next request with this method and URL
    pub fn push_response(&self, method: &str, url: &str, response: HttpResponse) {
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .entry(Self::key(method, url))
            .or_default()
            .push_back(response);
    }

    /// Queue a JSON response
    pub fn push_json(&self, method: &str, url: &str, status: u16, body: &Value) {
        self.push_response(method, url, HttpResponse::new(status, body.to_string()));
    }

    /// All requests seen so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("mock lock poisoned").clone()
    }

    fn record_and_pop(
        &self,
        method: &str,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> ApiResult<HttpResponse> {
        self.requests
            .lock()
            .expect("mock lock poisoned")
            .push(RecordedRequest {
                method: method.to_string(),
                url: url.to_string(),
                headers,
                body,
            });
        self.responses
            .lock()
            .expect("mock lock poisoned")
            .get_mut(&Self::key(method, url))
            .and_then(VecDeque::pop_front)
            .ok_or_else(|| ApiError::network(format!("no scripted response for {} {}", method, url)))
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn request(
        &self,
        method: Method,
        url: &str,
        headers: HashMap<String, String>,
        body: Option<String>,
    ) -> ApiResult<HttpResponse> {
        self.record_and_pop(method.as_str(), url, headers, body)
    }

    async fn upload(
        &self,
        url: &str,
        headers: HashMap<String, String>,
        _field: &str,
        file_name: &str,
        _bytes: Vec<u8>,
        _mime: &str,
    ) -> ApiResult<HttpResponse> {
        self.record_and_pop("POST", url, headers, Some(file_name.to_string()))
    }
}
