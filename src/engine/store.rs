//! Payroll run persistence.
//!
//! Runs, their employee rows and their payslips live together in a
//! [`RunRecord`] so that every workflow step can replace them in one atomic
//! update.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{EmployeePayrollDetail, PaySlip, PayrollRun};

/// A run together with everything generated for it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// The run header.
    pub run: PayrollRun,
    /// One row per employee, ordered by employee id.
    pub details: Vec<EmployeePayrollDetail>,
    /// Payslips issued on finance approval.
    pub payslips: Vec<PaySlip>,
}

impl RunRecord {
    /// Wraps a fresh run with no rows.
    pub fn new(run: PayrollRun) -> Self {
        Self {
            run,
            details: Vec::new(),
            payslips: Vec::new(),
        }
    }
}

/// Mutation applied by [`PayrollStore::update_run`].
pub type RunUpdate<'a> = dyn FnMut(&mut RunRecord) -> EngineResult<()> + 'a;

/// Storage for payroll runs.
///
/// Implementations must make [`update_run`](PayrollStore::update_run)
/// atomic: the closure sees the latest committed record, and its changes are
/// either committed in full or not at all.
pub trait PayrollStore: Send + Sync {
    /// Stores a new run. Fails with `DuplicateRun` when the entity already has
    /// a run for the same period month.
    fn insert_run(&self, run: PayrollRun) -> EngineResult<PayrollRun>;

    /// Returns a run header.
    fn get_run(&self, run_id: Uuid) -> EngineResult<PayrollRun>;

    /// Lists run headers, optionally for one entity, ordered by period then
    /// entity.
    fn list_runs(&self, entity: Option<&str>) -> EngineResult<Vec<PayrollRun>>;

    /// Returns the employee rows of a run.
    fn details(&self, run_id: Uuid) -> EngineResult<Vec<EmployeePayrollDetail>>;

    /// Returns the payslips of a run.
    fn payslips(&self, run_id: Uuid) -> EngineResult<Vec<PaySlip>>;

    /// Applies `update` to a copy of the run's record and commits it only if
    /// the closure succeeds and the (entity, period month) pair stays unique.
    fn update_run(&self, run_id: Uuid, update: &mut RunUpdate<'_>) -> EngineResult<RunRecord>;
}

/// A [`PayrollStore`] held in memory behind a read-write lock.
///
/// # Example
///
/// ```
/// use payroll_engine::engine::{InMemoryPayrollStore, PayrollStore};
/// use payroll_engine::models::PayrollRun;
/// use chrono::NaiveDate;
///
/// let store = InMemoryPayrollStore::new();
/// let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// let run = store.insert_run(PayrollRun::new("cairo-hq", period))?;
///
/// // Same entity, same month
/// let other = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// assert!(store.insert_run(PayrollRun::new("cairo-hq", other)).is_err());
/// assert_eq!(store.get_run(run.run_id)?.entity, "cairo-hq");
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
#[derive(Debug, Default)]
pub struct InMemoryPayrollStore {
    runs: RwLock<HashMap<Uuid, RunRecord>>,
}

impl InMemoryPayrollStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> EngineResult<RwLockReadGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.runs.read().map_err(|_| EngineError::Storage {
            message: "payroll store lock poisoned".to_string(),
        })
    }

    fn write(&self) -> EngineResult<RwLockWriteGuard<'_, HashMap<Uuid, RunRecord>>> {
        self.runs.write().map_err(|_| EngineError::Storage {
            message: "payroll store lock poisoned".to_string(),
        })
    }

    fn with_record<T>(&self, run_id: Uuid, f: impl FnOnce(&RunRecord) -> T) -> EngineResult<T> {
        self.read()?
            .get(&run_id)
            .map(f)
            .ok_or_else(|| EngineError::not_found("payroll run", run_id))
    }
}

fn ensure_unique(
    runs: &HashMap<Uuid, RunRecord>,
    candidate: &PayrollRun,
) -> EngineResult<()> {
    let key = candidate.period_key();
    let clash = runs.values().any(|record| {
        record.run.run_id != candidate.run_id
            && record.run.entity == candidate.entity
            && record.run.period_key() == key
    });
    if clash {
        return Err(EngineError::DuplicateRun {
            entity: candidate.entity.clone(),
            period: key,
        });
    }
    Ok(())
}

impl PayrollStore for InMemoryPayrollStore {
    fn insert_run(&self, run: PayrollRun) -> EngineResult<PayrollRun> {
        let mut runs = self.write()?;
        ensure_unique(&runs, &run)?;
        runs.insert(run.run_id, RunRecord::new(run.clone()));
        Ok(run)
    }

    fn get_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.with_record(run_id, |record| record.run.clone())
    }

    fn list_runs(&self, entity: Option<&str>) -> EngineResult<Vec<PayrollRun>> {
        let mut runs: Vec<PayrollRun> = self
            .read()?
            .values()
            .filter(|record| entity.is_none_or(|e| record.run.entity == e))
            .map(|record| record.run.clone())
            .collect();
        runs.sort_by(|a, b| {
            a.payroll_period
                .cmp(&b.payroll_period)
                .then_with(|| a.entity.cmp(&b.entity))
        });
        Ok(runs)
    }

    fn details(&self, run_id: Uuid) -> EngineResult<Vec<EmployeePayrollDetail>> {
        self.with_record(run_id, |record| record.details.clone())
    }

    fn payslips(&self, run_id: Uuid) -> EngineResult<Vec<PaySlip>> {
        self.with_record(run_id, |record| record.payslips.clone())
    }

    fn update_run(&self, run_id: Uuid, update: &mut RunUpdate<'_>) -> EngineResult<RunRecord> {
        let mut runs = self.write()?;
        let mut working = runs
            .get(&run_id)
            .cloned()
            .ok_or_else(|| EngineError::not_found("payroll run", run_id))?;

        update(&mut working)?;
        if working.run.run_id != run_id {
            return Err(EngineError::Storage {
                message: format!("update changed the id of run {}", run_id),
            });
        }
        ensure_unique(&runs, &working.run)?;

        runs.insert(run_id, working.clone());
        Ok(working)
    }
}
