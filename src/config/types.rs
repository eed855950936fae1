//! Configuration types.
//!
//! This module contains the strongly-typed structures deserialized from the
//! YAML files in a configuration directory, the record-kind selector used by
//! the configuration store, and the immutable snapshot handed to the
//! calculator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{Adjustments, Allowance, EmployeeBase, PayGrade, TaxRule};

/// The three kinds of configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigKind {
    /// Pay grades.
    PayGrades,
    /// Allowances.
    Allowances,
    /// Tax rules.
    TaxRules,
}

impl ConfigKind {
    /// Singular label used in messages.
    pub fn label(&self) -> &'static str {
        match self {
            ConfigKind::PayGrades => "pay grade",
            ConfigKind::Allowances => "allowance",
            ConfigKind::TaxRules => "tax rule",
        }
    }
}

impl std::str::FromStr for ConfigKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pay-grades" => Ok(ConfigKind::PayGrades),
            "allowances" => Ok(ConfigKind::Allowances),
            "tax-rules" => Ok(ConfigKind::TaxRules),
            _ => Err(format!("Unknown configuration kind: {}", s)),
        }
    }
}

/// Any configuration record, as returned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigRecord {
    /// A pay grade.
    PayGrade(PayGrade),
    /// An allowance.
    Allowance(Allowance),
    /// A tax rule.
    TaxRule(TaxRule),
}

/// The approved configuration in effect on one date.
///
/// Draft generation computes every employee against a single snapshot, so
/// configuration approved later never changes rows already generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    /// The date the snapshot was taken for.
    pub effective_date: NaiveDate,
    /// Approved pay grades by id.
    pub pay_grades: BTreeMap<String, PayGrade>,
    /// Approved, active allowances ordered by id.
    pub allowances: Vec<Allowance>,
    /// The approved, active tax rule in effect, if any.
    pub tax_rule: Option<TaxRule>,
}

impl ConfigSnapshot {
    /// Looks up an approved pay grade.
    pub fn grade(&self, grade_id: &str) -> Option<&PayGrade> {
        self.pay_grades.get(grade_id)
    }
}

/// `pay_grades.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct PayGradesFile {
    /// The pay grade records.
    #[serde(default)]
    pub pay_grades: Vec<PayGrade>,
}

/// `allowances.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct AllowancesFile {
    /// The allowance records.
    #[serde(default)]
    pub allowances: Vec<Allowance>,
}

/// `tax_rules.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct TaxRulesFile {
    /// The tax rule records.
    #[serde(default)]
    pub tax_rules: Vec<TaxRule>,
}

/// Adjustments for one employee in one period.
#[derive(Debug, Clone, Deserialize)]
pub struct AdjustmentEntry {
    /// The employee.
    pub employee_id: String,
    /// Any date in the month the adjustments apply to.
    pub period: NaiveDate,
    /// The adjustments.
    #[serde(flatten)]
    pub adjustments: Adjustments,
}

/// `employees.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeesFile {
    /// Employee compensation records.
    #[serde(default)]
    pub employees: Vec<EmployeeBase>,
    /// Period adjustments.
    #[serde(default)]
    pub adjustments: Vec<AdjustmentEntry>,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// Address to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

fn default_filter() -> String {
    "payroll_engine=info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            json: false,
        }
    }
}

/// Draft generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationSettings {
    /// Compute employees on the rayon thread pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_parallel() -> bool {
    true
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            parallel: default_parallel(),
        }
    }
}

/// `settings.yaml`.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineSettings {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
    /// Draft generation settings.
    #[serde(default)]
    pub generation: GenerationSettings,
}
