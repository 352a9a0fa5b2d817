use mockito::Matcher;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{endpoints, ApiConfig};
use crate::error::ApiError;
use crate::http::{MockHttpClient, ReqwestHttpClient};
use crate::notice::{notice_for, NoticeContext};
use crate::ocr::OcrClient;

fn server_config(server: &mockito::ServerGuard) -> ApiConfig {
    ApiConfig {
        base_url: server.url(),
        timeout_secs: 5,
    }
}

fn live_client(server: &mockito::ServerGuard) -> OcrClient {
    OcrClient::new(
        server_config(server),
        Arc::new(ReqwestHttpClient::new(Duration::from_secs(5))),
    )
}

fn scripted_client() -> (MockHttpClient, OcrClient) {
    let mock = MockHttpClient::new();
    let config = ApiConfig {
        base_url: "http://backend".to_string(),
        timeout_secs: 5,
    };
    (mock.clone(), OcrClient::new(config, Arc::new(mock)))
}

#[tokio::test]
async fn scan_uploads_multipart_with_request_id() {
    let mut server = mockito::Server::new_async().await;
    let upload = server
        .mock("POST", endpoints::OCR_EMIRATES_ID)
        .match_header("x-request-id", Matcher::Regex("^OCR-".to_string()))
        .match_header(
            "content-type",
            Matcher::Regex("^multipart/form-data; boundary=".to_string()),
        )
        .match_body(Matcher::Regex(r#"name="image""#.to_string()))
        .with_status(200)
        .with_body(
            json!({
                "extracted": {"emirates_id": "784-1990-1234567-1", "full_name": "Amal"},
                "confidence": 0.93,
                "raw_data": {"engine": "v2"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let result = live_client(&server)
        .scan_emirates_id(b"fake image bytes".to_vec(), Some("front.jpg"))
        .await
        .unwrap();

    upload.assert_async().await;
    assert_eq!(result.extracted["full_name"], "Amal");
    assert_eq!(result.confidence, 0.93);
    assert!(result.raw_data.is_some());
    assert!(result.request_id.starts_with("OCR-"));
}

#[tokio::test]
async fn passport_scan_hits_its_own_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let upload = server
        .mock("POST", endpoints::OCR_PASSPORT)
        .with_status(200)
        .with_body(
            json!({"extracted": {"passport_number": "N1234567"}, "confidence": 0.81})
                .to_string(),
        )
        .create_async()
        .await;

    let result = live_client(&server)
        .scan_passport(vec![1, 2, 3], None)
        .await
        .unwrap();

    upload.assert_async().await;
    assert_eq!(result.extracted["passport_number"], "N1234567");
    assert!(result.raw_data.is_none());
}

#[tokio::test]
async fn rejected_image_maps_to_invalid_image_notice() {
    let (mock, client) = scripted_client();
    mock.push_json(
        "POST",
        "http://backend/ocr/emirates-id",
        400,
        &json!({"detail": "unsupported file type"}),
    );

    let err = client.scan_emirates_id(vec![1], None).await.unwrap_err();
    match &err {
        ApiError::Validation { status: 400, detail } => {
            assert_eq!(detail, "unsupported file type");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
    assert_eq!(notice_for(&err, NoticeContext::Scan).title, "Invalid Image");
}

#[tokio::test]
async fn oversized_image_maps_to_file_too_large() {
    let (mock, client) = scripted_client();
    mock.push_json("POST", "http://backend/ocr/passport", 413, &json!({}));

    let err = client.scan_passport(vec![0; 64], None).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation { status: 413, .. }));
    assert_eq!(notice_for(&err, NoticeContext::Scan).title, "File Too Large");
}

#[tokio::test]
async fn server_failure_is_not_blamed_on_the_image() {
    let (mock, client) = scripted_client();
    mock.push_json(
        "POST",
        "http://backend/ocr/emirates-id",
        500,
        &json!({"detail": "engine crashed"}),
    );

    let err = client.scan_emirates_id(vec![1], None).await.unwrap_err();
    assert!(matches!(err, ApiError::Server { status: 500, .. }));
}

#[tokio::test]
async fn response_without_extracted_object_is_malformed() {
    let (mock, client) = scripted_client();
    mock.push_json(
        "POST",
        "http://backend/ocr/emirates-id",
        200,
        &json!({"confidence": 0.9}),
    );

    let err = client.scan_emirates_id(vec![1], None).await.unwrap_err();
    assert!(matches!(err, ApiError::MalformedResponse { .. }));
}

#[tokio::test]
async fn low_confidence_still_returns_the_result() {
    let (mock, client) = scripted_client();
    mock.push_json(
        "POST",
        "http://backend/ocr/passport",
        200,
        &json!({"extracted": {"passport_number": "N1"}, "confidence": 0.12}),
    );

    let result = client.scan_passport(vec![1], None).await.unwrap();
    assert_eq!(result.confidence, 0.12);
}
