//! Feedback form validation and submission.
//!
//! Validation is purely local and always runs before anything touches the
//! network: a bad email or a too-short message never produces a request.

use crate::api::HttpTransport;
use crate::error::FeedbackError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use url::Url;

pub const DEFAULT_FEEDBACK_URL: &str = "http://localhost:8080/feedback";

/// Minimum feedback length, counted after trimming whitespace.
pub const MIN_FEEDBACK_CHARS: usize = 10;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid"));

/// What the user typed into the feedback form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedbackForm {
    pub email: String,
    pub feedback: String,
}

impl FeedbackForm {
    pub fn new(email: impl Into<String>, feedback: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            feedback: feedback.into(),
        }
    }

    /// Check the form the way the page did before posting.
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if !EMAIL_RE.is_match(&self.email) {
            return Err(FeedbackError::InvalidEmail);
        }
        if self.feedback.trim().chars().count() < MIN_FEEDBACK_CHARS {
            return Err(FeedbackError::TooShort {
                min: MIN_FEEDBACK_CHARS,
            });
        }
        Ok(())
    }
}

/// Posts validated feedback to the backend.
#[derive(Debug, Clone)]
pub struct FeedbackClient {
    endpoint: Url,
}

impl FeedbackClient {
    pub fn new(endpoint: Url) -> Self {
        Self { endpoint }
    }

    /// Validate `form` and POST it as `{"email", "feedback"}`.
    ///
    /// # Errors
    ///
    /// - [`FeedbackError::InvalidEmail`] / [`FeedbackError::TooShort`] before any request
    /// - [`FeedbackError::Rejected`] for a non-success status
    /// - [`FeedbackError::Transport`] when the request itself failed
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint))]
    pub async fn submit<T>(&self, transport: &T, form: &FeedbackForm) -> Result<(), FeedbackError>
    where
        T: HttpTransport,
    {
        if let Err(e) = form.validate() {
            warn!(error = %e, "Feedback rejected locally");
            return Err(e);
        }

        let body = serde_json::json!({
            "email": form.email,
            "feedback": form.feedback,
        });
        let resp = transport.post_json(&self.endpoint, &body).await.inspect_err(|e| {
            error!(error = %e, "Feedback submission failed");
        })?;

        if !resp.is_success() {
            error!(status = resp.status, "Feedback endpoint rejected submission");
            return Err(FeedbackError::Rejected {
                status: resp.status,
            });
        }

        info!("Feedback submitted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{Reply, ScriptedTransport};

    fn client() -> FeedbackClient {
        FeedbackClient::new(Url::parse("http://feedback.test/feedback").unwrap())
    }

    #[test]
    fn test_validate_accepts_reasonable_input() {
        let form = FeedbackForm::new("reader@example.com", "Love the sports section!");
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_emails() {
        for email in ["not-an-email", "a@b", "@example.com", "a b@example.com", ""] {
            let form = FeedbackForm::new(email, "This is plenty of feedback");
            assert!(
                matches!(form.validate(), Err(FeedbackError::InvalidEmail)),
                "{email:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_counts_trimmed_length() {
        let form = FeedbackForm::new("reader@example.com", "   too short   ");
        assert!(matches!(
            form.validate(),
            Err(FeedbackError::TooShort { min: 10 })
        ));
        let form = FeedbackForm::new("reader@example.com", "exactly10!");
        assert!(form.validate().is_ok());
    }

    #[tokio::test]
    async fn test_invalid_form_never_hits_network() {
        let transport = ScriptedTransport::new();
        let c = client();

        let bad_email = FeedbackForm::new("not-an-email", "A perfectly long message");
        assert!(c.submit(&transport, &bad_email).await.is_err());

        let short = FeedbackForm::new("reader@example.com", "meh");
        assert!(c.submit(&transport, &short).await.is_err());

        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_posts_json_body() {
        let transport =
            ScriptedTransport::new().on("feedback.test", [Reply::Status(201, String::new())]);
        let form = FeedbackForm::new("reader@example.com", "Please add a dark mode");

        client().submit(&transport, &form).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(requests[0].url.path(), "/feedback");
        assert_eq!(
            requests[0].body,
            Some(serde_json::json!({
                "email": "reader@example.com",
                "feedback": "Please add a dark mode"
            }))
        );
    }

    #[tokio::test]
    async fn test_submit_reports_rejection_status() {
        let transport =
            ScriptedTransport::new().on("feedback.test", [Reply::Status(500, "down".into())]);
        let form = FeedbackForm::new("reader@example.com", "Please add a dark mode");

        let err = client().submit(&transport, &form).await.unwrap_err();
        assert!(matches!(err, FeedbackError::Rejected { status: 500 }));
    }
}
