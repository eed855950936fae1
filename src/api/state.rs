//! Application state for the Payroll Engine API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::{ConfigLoader, ConfigStore};
use crate::engine::{InMemoryPayrollStore, PayrollRunEngine};
use crate::error::EngineResult;
use crate::workflow::ApprovalWorkflow;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    workflow: ApprovalWorkflow,
}

impl AppState {
    /// Creates the state around an existing workflow.
    pub fn new(workflow: ApprovalWorkflow) -> Self {
        Self { workflow }
    }

    /// Wires the configuration store, employee directory and an in-memory
    /// run store from a loaded configuration directory.
    pub fn from_loader(loader: &ConfigLoader) -> EngineResult<Self> {
        let engine = PayrollRunEngine::new(
            Arc::new(loader.config_store()?),
            Arc::new(loader.directory()?),
            Arc::new(InMemoryPayrollStore::new()),
            loader.settings().generation.clone(),
        );
        Ok(Self::new(ApprovalWorkflow::new(Arc::new(engine))))
    }

    /// The run workflow.
    pub fn workflow(&self) -> &ApprovalWorkflow {
        &self.workflow
    }

    /// The configuration store.
    pub fn config(&self) -> &ConfigStore {
        self.workflow.engine().config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_is_clone() {
        // Required for axum state
        fn assert_clone<T: Clone + Send + Sync + 'static>() {}
        assert_clone::<AppState>();
    }

    #[test]
    fn test_from_default_configuration() {
        let loader = ConfigLoader::load("./config/default").unwrap();
        let state = AppState::from_loader(&loader).unwrap();
        assert!(state.workflow().engine().list_runs(None).unwrap().is_empty());
    }
}
