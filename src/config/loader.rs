//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading engine settings,
//! pay component records and the employee directory from YAML files.

use std::fs;
use std::path::Path;

use crate::engine::InMemoryDirectory;
use crate::error::{EngineError, EngineResult};

use super::store::ConfigStore;
use super::types::{AllowancesFile, EmployeesFile, EngineSettings, PayGradesFile, TaxRulesFile};

/// Loads and provides access to a configuration directory.
///
/// # Directory Structure
///
/// ```text
/// config/default/
/// ├── settings.yaml     # Server, logging and generation settings
/// ├── pay_grades.yaml   # Salary bands
/// ├── allowances.yaml   # Fixed and percentage allowances
/// ├── tax_rules.yaml    # Flat, progressive and tiered tax rules
/// └── employees.yaml    # Employee directory and per-period adjustments
/// ```
///
/// Records in the pay component files may carry their approval status; a
/// record without one is loaded as a draft.
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config/default")?;
/// let store = loader.config_store()?;
/// println!("Listening on port {}", loader.settings().server.port);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    settings: EngineSettings,
    pay_grades: PayGradesFile,
    allowances: AllowancesFile,
    tax_rules: TaxRulesFile,
    employees: EmployeesFile,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - Any required file is missing
    /// - Any file contains invalid YAML
    /// - Any required field is missing from the configuration
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let path = path.as_ref();

        let settings = Self::load_yaml::<EngineSettings>(&path.join("settings.yaml"))?;
        let pay_grades = Self::load_yaml::<PayGradesFile>(&path.join("pay_grades.yaml"))?;
        let allowances = Self::load_yaml::<AllowancesFile>(&path.join("allowances.yaml"))?;
        let tax_rules = Self::load_yaml::<TaxRulesFile>(&path.join("tax_rules.yaml"))?;
        let employees = Self::load_yaml::<EmployeesFile>(&path.join("employees.yaml"))?;

        Ok(Self {
            settings,
            pay_grades,
            allowances,
            tax_rules,
            employees,
        })
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the engine settings.
    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Builds a configuration store seeded with the loaded records.
    ///
    /// Every record is validated; the first invalid record aborts the load.
    pub fn config_store(&self) -> EngineResult<ConfigStore> {
        ConfigStore::from_records(
            self.pay_grades.pay_grades.clone(),
            self.allowances.allowances.clone(),
            self.tax_rules.tax_rules.clone(),
        )
    }

    /// Builds the employee directory from `employees.yaml`.
    pub fn directory(&self) -> EngineResult<InMemoryDirectory> {
        InMemoryDirectory::new(
            self.employees.employees.clone(),
            self.employees.adjustments.clone(),
        )
    }
}
