//! Best-effort verification emails.
//!
//! The admission service hands a [`VerificationMessage`] to the
//! [`NotificationDispatcher`], which queues it for a background worker that
//! calls the injected [`Notifier`]. Queueing never blocks and never fails
//! the caller; delivery failures are logged and dropped.

pub mod dispatcher;
pub mod notifier;

pub use dispatcher::NotificationDispatcher;
pub use notifier::{LogNotifier, Notifier, NotifyError, RecordingNotifier, VerificationMessage};
