//! Application state for the Evaluation Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::service::PerformanceService;
use crate::store::InMemoryEvaluationRepository;

/// Shared application state.
///
/// Holds the service every handler delegates to. Cloning is cheap; all
/// clones share one repository and one calibration engine.
#[derive(Clone)]
pub struct AppState {
    service: Arc<PerformanceService>,
}

impl AppState {
    /// Creates state backed by an empty in-memory repository.
    pub fn new(config: ConfigLoader) -> Self {
        let repository = Arc::new(InMemoryEvaluationRepository::new());
        Self::from_service(PerformanceService::new(config, repository))
    }

    /// Wraps an already-built service.
    pub fn from_service(service: PerformanceService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    /// Returns the performance service.
    pub fn service(&self) -> &PerformanceService {
        &self.service
    }
}
