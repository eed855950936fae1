//! Configuration for the Payroll Engine.
//!
//! This module holds the approval-gated store of pay grades, allowances and
//! tax rules, the snapshot type handed to the calculator, and the loader that
//! reads settings, records and employees from YAML files.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load("./config/default").unwrap();
//! let store = loader.config_store().unwrap();
//! ```

mod loader;
mod store;
mod types;

pub use loader::ConfigLoader;
pub use store::ConfigStore;
pub use types::{
    AdjustmentEntry, AllowancesFile, ConfigKind, ConfigRecord, ConfigSnapshot, EmployeesFile,
    EngineSettings, GenerationSettings, LoggingSettings, PayGradesFile, ServerSettings,
    TaxRulesFile,
};
