//! Service layer: admission orchestration and background tasks.
//!
//! [`AdmissionService`] validates against the store, emits events through
//! the [`super::domain::EventBus`], and queues verification emails.

pub mod admission_service;
pub mod audit;
pub mod sweeper;

pub use admission_service::AdmissionService;
pub use audit::spawn_audit_log;
pub use sweeper::spawn_expiry_sweeper;
