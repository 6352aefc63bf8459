//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::AdmissionService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Admission service for all business logic.
    pub admission: Arc<AdmissionService>,
}

impl AppState {
    /// Wraps a service for use as router state.
    #[must_use]
    pub fn new(admission: Arc<AdmissionService>) -> Self {
        Self { admission }
    }
}
