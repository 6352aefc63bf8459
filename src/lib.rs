//! # waitlist-gateway
//!
//! REST gateway for event registration with an email-verified waitlist.
//!
//! Requesters join an event's waiting list and receive a 4-digit code by
//! email. Submitting the code before it expires promotes the party to the
//! confirmed list, provided the event still has room for the whole party.
//! Capacity is enforced atomically per event at promotion time.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── AdmissionService (service/)
//!     │     ├── EventBus (domain/) ──► audit log
//!     │     ├── NotificationDispatcher (notify/) ──► Notifier
//!     │     └── Clock (domain/)
//!     │
//!     └── AdmissionStore (store/)
//!           ├── MemoryStore
//!           └── PostgresStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
pub mod store;
