//! Mapping from the error taxonomy to user-facing notices.
//!
//! Every failure becomes a short title plus a descriptive message suitable
//! for a transient notification. Expired sessions are distinguishable via
//! [`ApiError::requires_reauthentication`] so the UI layer can also force
//! navigation back to the login entry point.

use serde::Serialize;

use crate::error::ApiError;

/// Title and message for a transient notification
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserNotice {
    pub title: String,
    pub message: String,
}

impl UserNotice {
    fn new(title: &str, message: impl Into<String>) -> Self {
        Self {
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Where the failure happened, for context-appropriate titles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeContext {
    Login,
    Register,
    VerifyOtp,
    ResendOtp,
    Scan,
    Registration,
    General,
}

impl NoticeContext {
    fn failure_title(&self) -> &'static str {
        match self {
            NoticeContext::Login => "Login Failed",
            NoticeContext::Register => "Registration Failed",
            NoticeContext::VerifyOtp => "Verification Failed",
            NoticeContext::ResendOtp => "Resend Failed",
            NoticeContext::Scan => "Scan Failed",
            NoticeContext::Registration => "Registration Failed",
            NoticeContext::General => "Error",
        }
    }
}

/// Build the notice for an error in the given context
pub fn notice_for(error: &ApiError, context: NoticeContext) -> UserNotice {
    match error {
        ApiError::Network { .. } => UserNotice::new(
            "Connection Error",
            "Unable to connect to the server. Please check your internet connection.",
        ),
        ApiError::Timeout { .. } => UserNotice::new(
            "Request Timeout",
            "The server took too long to respond. Please try again.",
        ),
        ApiError::Auth {
            session_expired: true,
            ..
        } => UserNotice::new("Session Expired", "Please log in again to continue."),
        ApiError::Auth { detail, .. } => UserNotice::new(
            "Authentication Failed",
            if detail.is_empty() {
                "Invalid credentials. Please check your email/phone and password.".to_string()
            } else {
                detail.clone()
            },
        ),
        ApiError::Conflict { detail, .. } => UserNotice::new(
            "Already Registered",
            if detail.is_empty() {
                "This record already exists. Please try logging in.".to_string()
            } else {
                detail.clone()
            },
        ),
        ApiError::Validation { status, detail } => match (context, status) {
            (NoticeContext::Scan, 400) => UserNotice::new(
                "Invalid Image",
                "Ensure the document is clear, well-lit, and fully visible, then try again.",
            ),
            (NoticeContext::Scan, 413) => UserNotice::new(
                "File Too Large",
                "The image exceeds the upload size limit. Capture a new image with lower quality settings.",
            ),
            (_, 422) => UserNotice::new("Invalid Input", detail.clone()),
            _ => UserNotice::new(context.failure_title(), detail.clone()),
        },
        ApiError::Server { .. } => UserNotice::new(
            "Server Error",
            "Something went wrong on our end. Please try again later.",
        ),
        ApiError::MalformedResponse { .. } => UserNotice::new(
            "Processing Error",
            "The server returned an unexpected response. Please try again.",
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expired_session_gets_its_own_notice() {
        let notice = notice_for(&ApiError::session_expired("x"), NoticeContext::General);
        assert_eq!(notice.title, "Session Expired");
    }

    #[test]
    fn scan_context_maps_bad_request_to_invalid_image() {
        let error = ApiError::Validation {
            status: 400,
            detail: "unsupported file".to_string(),
        };
        assert_eq!(
            notice_for(&error, NoticeContext::Scan).title,
            "Invalid Image"
        );
        assert_eq!(
            notice_for(&error, NoticeContext::Login).title,
            "Login Failed"
        );
    }

    #[test]
    fn unprocessable_input_keeps_backend_detail() {
        let error = ApiError::Validation {
            status: 422,
            detail: "phone must start with +971".to_string(),
        };
        let notice = notice_for(&error, NoticeContext::Register);
        assert_eq!(notice.title, "Invalid Input");
        assert_eq!(notice.message, "phone must start with +971");
    }

    #[test]
    fn network_errors_are_context_independent() {
        for context in [
            NoticeContext::Login,
            NoticeContext::Scan,
            NoticeContext::General,
        ] {
            assert_eq!(
                notice_for(&ApiError::network("boom"), context).title,
                "Connection Error"
            );
        }
    }
}
