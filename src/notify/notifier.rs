//! The notifier capability and its default implementation.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{EventId, RequestId};

/// Subject line of the verification email.
pub const VERIFICATION_SUBJECT: &str = "Verification Code";

/// Template data for a verification email.
#[derive(Clone)]
pub struct VerificationMessage {
    /// Recipient address.
    pub to: String,
    /// Request the code belongs to.
    pub request_id: RequestId,
    /// Event being joined.
    pub event_id: EventId,
    /// Verification code to mail.
    pub code: String,
    /// Requester name.
    pub name: String,
    /// Party size of the request.
    pub party_size: u32,
    /// Display name of the event.
    pub event_name: String,
}

impl VerificationMessage {
    /// Renders the plain-text body.
    #[must_use]
    pub fn render_body(&self) -> String {
        format!(
            "Hello {name},\n\n\
             Your verification code for {event} is {code}.\n\
             It holds a place for a party of {size} and expires in a few minutes.\n",
            name = self.name,
            event = self.event_name,
            code = self.code,
            size = self.party_size,
        )
    }
}

impl std::fmt::Debug for VerificationMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationMessage")
            .field("to", &self.to)
            .field("request_id", &self.request_id)
            .field("event_id", &self.event_id)
            .field("party_size", &self.party_size)
            .field("event_name", &self.event_name)
            .finish_non_exhaustive()
    }
}

/// Delivery failure reported by a [`Notifier`].
#[derive(Debug, thiserror::Error)]
#[error("notification to {to} failed: {reason}")]
pub struct NotifyError {
    /// Recipient address.
    pub to: String,
    /// Backend-specific reason.
    pub reason: String,
}

/// Outbound email capability.
#[async_trait]
pub trait Notifier: Send + Sync + std::fmt::Debug {
    /// Delivers one verification message.
    async fn notify(&self, message: &VerificationMessage) -> Result<(), NotifyError>;
}

/// Notifier that writes messages to the log instead of sending mail.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &VerificationMessage) -> Result<(), NotifyError> {
        tracing::info!(
            to = %message.to,
            request_id = %message.request_id,
            event_id = %message.event_id,
            subject = VERIFICATION_SUBJECT,
            "verification email"
        );
        tracing::debug!(body = %message.render_body(), "verification email body");
        Ok(())
    }
}

/// Notifier that keeps every message in memory; optionally fails each
/// delivery. Intended for tests and local demos.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<VerificationMessage>>,
    fail: bool,
}

impl RecordingNotifier {
    /// Creates a notifier that records and succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a notifier that records and then reports failure.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Returns a copy of every message received so far.
    pub async fn sent(&self) -> Vec<VerificationMessage> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, message: &VerificationMessage) -> Result<(), NotifyError> {
        self.sent.lock().await.push(message.clone());
        if self.fail {
            return Err(NotifyError {
                to: message.to.clone(),
                reason: "smtp relay unavailable".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message() -> VerificationMessage {
        VerificationMessage {
            to: "ada@example.com".to_string(),
            request_id: RequestId::new(),
            event_id: EventId::new(),
            code: "9051".to_string(),
            name: "Ada".to_string(),
            party_size: 3,
            event_name: "Rust Meetup".to_string(),
        }
    }

    #[test]
    fn body_contains_template_data() {
        let body = message().render_body();
        assert!(body.contains("Ada"));
        assert!(body.contains("9051"));
        assert!(body.contains("Rust Meetup"));
        assert!(body.contains("party of 3"));
    }

    #[test]
    fn debug_omits_code() {
        assert!(!format!("{:?}", message()).contains("9051"));
    }

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        assert!(LogNotifier.notify(&message()).await.is_ok());
    }

    #[tokio::test]
    async fn failing_recorder_still_records() {
        let notifier = RecordingNotifier::failing();
        assert!(notifier.notify(&message()).await.is_err());
        assert_eq!(notifier.sent().await.len(), 1);
    }
}
