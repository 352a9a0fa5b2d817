//! Unit tests for the client modules
//!
//! Scripted-transport tests (refresh protocol, session lifecycle) use the
//! `MockHttpClient`; HTTP-level tests (multipart uploads, header wiring)
//! run against a local mockito server.

pub mod ocr_test;
pub mod session_test;
pub mod storage_test;
