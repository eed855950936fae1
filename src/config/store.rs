//! The configuration store.
//!
//! Holds every pay grade, allowance and tax rule together with its approval
//! status, drives records through their approval lifecycle, and serves the
//! approved subset to the payroll engine.

use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::info;

use super::types::{ConfigKind, ConfigRecord, ConfigSnapshot};
use crate::error::{EngineError, EngineResult};
use crate::models::{Allowance, ApprovalRecord, ApprovalStatus, PayGrade, TaxRule};

#[derive(Debug, Default)]
struct ConfigRecords {
    pay_grades: BTreeMap<String, PayGrade>,
    allowances: BTreeMap<String, Allowance>,
    tax_rules: BTreeMap<String, TaxRule>,
}

/// Thread-safe store of configuration records.
///
/// # Example
///
/// ```
/// use payroll_engine::config::{ConfigKind, ConfigStore};
/// use payroll_engine::models::{ApprovalStatus, ConfigAudit, PayGrade};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let store = ConfigStore::new();
/// store.create_pay_grade(
///     PayGrade {
///         id: "grade_senior".to_string(),
///         name: "Senior".to_string(),
///         min_salary: Decimal::from(8000),
///         max_salary: Decimal::from(15000),
///         currency: "EGP".to_string(),
///         status: ApprovalStatus::Draft,
///         audit: ConfigAudit::default(),
///     },
///     "specialist_01",
/// )?;
/// store.submit(ConfigKind::PayGrades, "grade_senior")?;
/// store.approve(ConfigKind::PayGrades, "grade_senior", "manager_01")?;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// assert!(store.snapshot(date)?.grade("grade_senior").is_some());
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Default)]
pub struct ConfigStore {
    records: RwLock<ConfigRecords>,
}

fn insert_unique<T: ApprovalRecord>(
    map: &mut BTreeMap<String, T>,
    kind: ConfigKind,
    record: T,
) -> EngineResult<()> {
    record.validate()?;
    if map.contains_key(record.id()) {
        return Err(EngineError::validation(
            "id",
            format!("{} '{}' already exists", kind.label(), record.id()),
        ));
    }
    map.insert(record.id().to_string(), record);
    Ok(())
}

fn prepare_new<T: ApprovalRecord>(mut record: T, created_by: &str) -> T {
    *record.status_mut() = ApprovalStatus::Draft;
    let audit = record.audit_mut();
    *audit = Default::default();
    audit.created_at = Some(Utc::now());
    audit.created_by = Some(created_by.to_string());
    record
}

/// Applies a lifecycle step to a copy and commits it only on success.
fn transition<T: ApprovalRecord + Clone>(
    map: &mut BTreeMap<String, T>,
    kind: ConfigKind,
    id: &str,
    step: impl FnOnce(&mut T) -> EngineResult<()>,
) -> EngineResult<T> {
    let current = map
        .get(id)
        .ok_or_else(|| EngineError::not_found(kind.label(), id))?;
    let mut updated = current.clone();
    step(&mut updated)?;
    map.insert(id.to_string(), updated.clone());
    Ok(updated)
}

impl ConfigStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with records as they are (statuses preserved).
    ///
    /// Every record is validated and ids must be unique per kind.
    pub fn from_records(
        pay_grades: Vec<PayGrade>,
        allowances: Vec<Allowance>,
        tax_rules: Vec<TaxRule>,
    ) -> EngineResult<Self> {
        let mut records = ConfigRecords::default();
        for grade in pay_grades {
            insert_unique(&mut records.pay_grades, ConfigKind::PayGrades, grade)?;
        }
        for allowance in allowances {
            insert_unique(&mut records.allowances, ConfigKind::Allowances, allowance)?;
        }
        for rule in tax_rules {
            insert_unique(&mut records.tax_rules, ConfigKind::TaxRules, rule)?;
        }
        Ok(Self {
            records: RwLock::new(records),
        })
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, ConfigRecords>> {
        self.records.read().map_err(|_| EngineError::Storage {
            message: "configuration store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, ConfigRecords>> {
        self.records.write().map_err(|_| EngineError::Storage {
            message: "configuration store lock poisoned".to_string(),
        })
    }

    /// Validates and stores a new pay grade as a draft.
    pub fn create_pay_grade(&self, grade: PayGrade, created_by: &str) -> EngineResult<PayGrade> {
        let grade = prepare_new(grade, created_by);
        insert_unique(&mut self.write()?.pay_grades, ConfigKind::PayGrades, grade.clone())?;
        info!(grade_id = %grade.id, created_by, "Pay grade created");
        Ok(grade)
    }

    /// Validates and stores a new allowance as a draft.
    pub fn create_allowance(
        &self,
        allowance: Allowance,
        created_by: &str,
    ) -> EngineResult<Allowance> {
        let allowance = prepare_new(allowance, created_by);
        insert_unique(
            &mut self.write()?.allowances,
            ConfigKind::Allowances,
            allowance.clone(),
        )?;
        info!(allowance_id = %allowance.id, created_by, "Allowance created");
        Ok(allowance)
    }

    /// Validates and stores a new tax rule as a draft.
    pub fn create_tax_rule(&self, rule: TaxRule, created_by: &str) -> EngineResult<TaxRule> {
        let rule = prepare_new(rule, created_by);
        insert_unique(&mut self.write()?.tax_rules, ConfigKind::TaxRules, rule.clone())?;
        info!(tax_rule_id = %rule.id, created_by, "Tax rule created");
        Ok(rule)
    }

    fn apply(
        &self,
        kind: ConfigKind,
        id: &str,
        step: impl Fn(&mut dyn ApprovalRecordMut) -> EngineResult<()>,
    ) -> EngineResult<ConfigRecord> {
        let mut records = self.write()?;
        let record = match kind {
            ConfigKind::PayGrades => ConfigRecord::PayGrade(transition(
                &mut records.pay_grades,
                kind,
                id,
                |r| step(r),
            )?),
            ConfigKind::Allowances => ConfigRecord::Allowance(transition(
                &mut records.allowances,
                kind,
                id,
                |r| step(r),
            )?),
            ConfigKind::TaxRules => ConfigRecord::TaxRule(transition(
                &mut records.tax_rules,
                kind,
                id,
                |r| step(r),
            )?),
        };
        Ok(record)
    }

    /// Submits a draft or rejected record for approval.
    pub fn submit(&self, kind: ConfigKind, id: &str) -> EngineResult<ConfigRecord> {
        let record = self.apply(kind, id, |r| r.submit_record())?;
        info!(kind = kind.label(), id, "Configuration record submitted");
        Ok(record)
    }

    /// Approves a pending record.
    pub fn approve(&self, kind: ConfigKind, id: &str, approver: &str) -> EngineResult<ConfigRecord> {
        let record = self.apply(kind, id, |r| r.approve_record(approver))?;
        info!(kind = kind.label(), id, approver, "Configuration record approved");
        Ok(record)
    }

    /// Rejects a pending record with a reason.
    pub fn reject(&self, kind: ConfigKind, id: &str, reason: &str) -> EngineResult<ConfigRecord> {
        let record = self.apply(kind, id, |r| r.reject_record(reason))?;
        info!(kind = kind.label(), id, "Configuration record rejected");
        Ok(record)
    }

    /// Returns a pay grade in any status.
    pub fn pay_grade(&self, id: &str) -> EngineResult<PayGrade> {
        self.read()?
            .pay_grades
            .get(id)
            .cloned()
            .ok_or_else(|| EngineError::not_found(ConfigKind::PayGrades.label(), id))
    }

    /// Lists the approved records of `kind` usable on `effective_date`.
    ///
    /// Allowances must also be active; tax rules must be active and their
    /// effective window must cover the date.
    pub fn list_approved(
        &self,
        kind: ConfigKind,
        effective_date: NaiveDate,
    ) -> EngineResult<Vec<ConfigRecord>> {
        let records = self.read()?;
        let approved = match kind {
            ConfigKind::PayGrades => records
                .pay_grades
                .values()
                .filter(|g| g.status == ApprovalStatus::Approved)
                .cloned()
                .map(ConfigRecord::PayGrade)
                .collect(),
            ConfigKind::Allowances => usable_allowances(&records)
                .cloned()
                .map(ConfigRecord::Allowance)
                .collect(),
            ConfigKind::TaxRules => usable_tax_rules(&records, effective_date)
                .cloned()
                .map(ConfigRecord::TaxRule)
                .collect(),
        };
        Ok(approved)
    }

    /// Takes an immutable snapshot of the configuration in effect on a date.
    ///
    /// When several tax rules qualify, the one with the latest
    /// `effective_from` wins (ties go to the lowest id).
    pub fn snapshot(&self, effective_date: NaiveDate) -> EngineResult<ConfigSnapshot> {
        let records = self.read()?;
        let pay_grades = records
            .pay_grades
            .iter()
            .filter(|(_, g)| g.status == ApprovalStatus::Approved)
            .map(|(id, g)| (id.clone(), g.clone()))
            .collect();
        let allowances = usable_allowances(&records).cloned().collect();
        let tax_rule = usable_tax_rules(&records, effective_date)
            .max_by(|a, b| {
                a.effective_from
                    .cmp(&b.effective_from)
                    .then_with(|| b.id.cmp(&a.id))
            })
            .cloned();

        Ok(ConfigSnapshot {
            effective_date,
            pay_grades,
            allowances,
            tax_rule,
        })
    }
}

fn usable_allowances(records: &ConfigRecords) -> impl Iterator<Item = &Allowance> {
    records
        .allowances
        .values()
        .filter(|a| a.status == ApprovalStatus::Approved && a.is_active)
}

fn usable_tax_rules(
    records: &ConfigRecords,
    effective_date: NaiveDate,
) -> impl Iterator<Item = &TaxRule> {
    records.tax_rules.values().filter(move |r| {
        r.status == ApprovalStatus::Approved && r.is_active && r.is_effective_on(effective_date)
    })
}

/// Object-safe view of the lifecycle operations, so one closure can drive all
/// three record types.
trait ApprovalRecordMut {
    fn submit_record(&mut self) -> EngineResult<()>;
    fn approve_record(&mut self, approver: &str) -> EngineResult<()>;
    fn reject_record(&mut self, reason: &str) -> EngineResult<()>;
}

impl<T: ApprovalRecord> ApprovalRecordMut for T {
    fn submit_record(&mut self) -> EngineResult<()> {
        self.submit()
    }

    fn approve_record(&mut self, approver: &str) -> EngineResult<()> {
        self.approve(approver)
    }

    fn reject_record(&mut self, reason: &str) -> EngineResult<()> {
        self.reject(reason)
    }
}
