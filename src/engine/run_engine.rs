//! The payroll run engine.
//!
//! Creates runs, generates their draft employee rows from a configuration
//! snapshot and applies manual corrections. Role checks live in the workflow
//! layer; the engine only enforces the run statuses an operation is valid in,
//! and it does so inside the store's atomic update.

use chrono::{NaiveDate, Utc};
use rayon::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::directory::EmployeeDirectory;
use super::store::{PayrollStore, RunRecord};
use crate::calculation::{ExceptionInput, compute_pay, detect_exceptions};
use crate::config::{ConfigSnapshot, ConfigStore, GenerationSettings};
use crate::error::{EngineError, EngineResult};
use crate::models::{
    Adjustments, DetailPatch, EmployeeBase, EmployeePayrollDetail, PaySlip, PayrollException,
    PayrollRun, RunStatus,
};

/// Joins statuses for error messages, e.g. `draft or under review`.
pub fn describe_statuses(statuses: &[RunStatus]) -> String {
    statuses
        .iter()
        .map(RunStatus::as_str)
        .collect::<Vec<_>>()
        .join(" or ")
}

/// The run statuses an operation may be performed in.
#[derive(Debug, Clone, Copy)]
pub struct StatusGuard<'a> {
    action: &'a str,
    allowed: &'a [RunStatus],
}

impl<'a> StatusGuard<'a> {
    /// Creates a guard for `action`.
    pub fn new(action: &'a str, allowed: &'a [RunStatus]) -> Self {
        Self { action, allowed }
    }

    /// Fails with `StateConflict` naming the required statuses unless
    /// `current` is one of them.
    pub fn check(&self, current: RunStatus) -> EngineResult<()> {
        if self.allowed.contains(&current) {
            return Ok(());
        }
        Err(EngineError::StateConflict {
            action: self.action.to_string(),
            current: current.to_string(),
            required: describe_statuses(self.allowed),
        })
    }
}

const DRAFT_ONLY: &[RunStatus] = &[RunStatus::Draft];
const EDITABLE: &[RunStatus] = &[
    RunStatus::Draft,
    RunStatus::UnderReview,
    RunStatus::Approved,
];

/// One row with exceptions, as listed in a [`GenerationReport`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExceptionEntry {
    /// The row.
    pub detail_id: Uuid,
    /// The employee.
    pub employee_id: String,
    /// The joined exception text.
    pub exceptions: String,
}

/// Outcome of [`PayrollRunEngine::generate_draft`].
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    /// The run with recomputed aggregates.
    pub run: PayrollRun,
    /// Every generated row, ordered by employee id.
    pub details: Vec<EmployeePayrollDetail>,
    /// The rows that carry exceptions.
    pub exceptions: Vec<ExceptionEntry>,
}

/// Outcome of a detail correction.
#[derive(Debug, Clone, Serialize)]
pub struct DetailEdit {
    /// The run with recomputed aggregates.
    pub run: PayrollRun,
    /// The corrected row.
    pub detail: EmployeePayrollDetail,
}

/// Computes one employee's row against a snapshot.
///
/// Pure: the same snapshot, employee and adjustments always give the same row.
pub fn build_detail(
    run: &PayrollRun,
    snapshot: &ConfigSnapshot,
    employee: &EmployeeBase,
    adjustments: &Adjustments,
) -> EmployeePayrollDetail {
    let grade = snapshot.grade(&employee.grade_id);
    let tax_rule = snapshot.tax_rule.as_ref();
    let result = compute_pay(
        employee,
        grade,
        &snapshot.allowances,
        tax_rule,
        adjustments,
        run.payroll_period,
    );
    let report = detect_exceptions(ExceptionInput {
        employee,
        breakdown: &result.breakdown,
        grade,
        tax_rule,
    });

    let mut detail = EmployeePayrollDetail::new(
        run.run_id,
        &employee.employee_id,
        employee
            .bank_account_number
            .as_ref()
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        result.breakdown,
        report.bank_status,
        report.flags,
    );
    detail.audit_steps = result.audit_steps;
    detail
}

/// Creates runs, generates drafts and applies corrections.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use payroll_engine::config::{ConfigStore, GenerationSettings};
/// use payroll_engine::engine::{InMemoryDirectory, InMemoryPayrollStore, PayrollRunEngine};
/// use chrono::NaiveDate;
///
/// let engine = PayrollRunEngine::new(
///     Arc::new(ConfigStore::new()),
///     Arc::new(InMemoryDirectory::default()),
///     Arc::new(InMemoryPayrollStore::new()),
///     GenerationSettings::default(),
/// );
///
/// let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// let run = engine.create_run("cairo-hq", period)?;
/// let report = engine.generate_draft(run.run_id)?;
/// assert_eq!(report.run.employees, 0);
/// # Ok::<(), payroll_engine::error::EngineError>(())
/// ```
pub struct PayrollRunEngine {
    config: Arc<ConfigStore>,
    directory: Arc<dyn EmployeeDirectory>,
    store: Arc<dyn PayrollStore>,
    settings: GenerationSettings,
}

impl PayrollRunEngine {
    /// Creates an engine over the given collaborators.
    pub fn new(
        config: Arc<ConfigStore>,
        directory: Arc<dyn EmployeeDirectory>,
        store: Arc<dyn PayrollStore>,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            config,
            directory,
            store,
            settings,
        }
    }

    /// The configuration store drafts are generated from.
    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    /// The run store.
    pub fn store(&self) -> &dyn PayrollStore {
        self.store.as_ref()
    }

    /// Creates an empty draft run for `entity` in the month of `period`.
    pub fn create_run(&self, entity: &str, period: NaiveDate) -> EngineResult<PayrollRun> {
        let entity = entity.trim();
        if entity.is_empty() {
            return Err(EngineError::validation("entity", "must not be empty"));
        }
        let run = self.store.insert_run(PayrollRun::new(entity, period))?;
        info!(run_id = %run.run_id, entity, period = %run.period_key(), "Payroll run created");
        Ok(run)
    }

    /// Generates the draft rows for every employee of the run's entity.
    pub fn generate_draft(&self, run_id: Uuid) -> EngineResult<GenerationReport> {
        self.generate_draft_guarded(run_id, StatusGuard::new("generate draft", DRAFT_ONLY))
    }

    /// [`generate_draft`](Self::generate_draft) with caller-supplied status
    /// rules.
    ///
    /// The configuration snapshot is taken once; every prior row is replaced
    /// and aggregates are recomputed. The status is checked again when the
    /// rows are committed.
    pub fn generate_draft_guarded(
        &self,
        run_id: Uuid,
        guard: StatusGuard<'_>,
    ) -> EngineResult<GenerationReport> {
        let run = self.store.get_run(run_id)?;
        guard.check(run.status)?;

        let snapshot = self.config.snapshot(run.payroll_period)?;
        if snapshot.tax_rule.is_none() {
            warn!(run_id = %run_id, period = %run.period_key(), "No approved tax rule in effect");
        }
        let employees = self.directory.employees_in_entity(&run.entity)?;

        let compute = |employee: &EmployeeBase| -> EmployeePayrollDetail {
            match self
                .directory
                .adjustments(&employee.employee_id, run.payroll_period)
            {
                Ok(adjustments) => {
                    let detail = build_detail(&run, &snapshot, employee, &adjustments);
                    debug!(
                        run_id = %run_id,
                        employee_id = %employee.employee_id,
                        net_pay = %detail.net_pay,
                        "Employee computed"
                    );
                    detail
                }
                Err(err) => {
                    warn!(
                        run_id = %run_id,
                        employee_id = %employee.employee_id,
                        error = %err,
                        "Adjustments unavailable; computing without them"
                    );
                    let mut detail =
                        build_detail(&run, &snapshot, employee, &Adjustments::default());
                    detail.flag(PayrollException::AdjustmentsUnavailable);
                    detail
                }
            }
        };
        let mut details: Vec<EmployeePayrollDetail> = if self.settings.parallel {
            employees.par_iter().map(compute).collect()
        } else {
            employees.iter().map(compute).collect()
        };
        details.sort_by(|a, b| a.employee_id.cmp(&b.employee_id));

        let record = self.store.update_run(run_id, &mut |record: &mut RunRecord| {
            guard.check(record.run.status)?;
            // Rows are only valid for the period and entity they were computed for
            if record.run.payroll_period != run.payroll_period || record.run.entity != run.entity {
                return Err(EngineError::StateConflict {
                    action: "generate draft".to_string(),
                    current: format!("{} {}", record.run.entity, record.run.payroll_period),
                    required: format!("{} {}", run.entity, run.payroll_period),
                });
            }
            record.details = details.clone();
            record.run.recompute_aggregates(&record.details);
            let now = Utc::now();
            record.run.generated_at = Some(now);
            record.run.updated_at = now;
            Ok(())
        })?;

        let exceptions: Vec<ExceptionEntry> = record
            .details
            .iter()
            .filter_map(|d| {
                d.exceptions.as_ref().map(|text| ExceptionEntry {
                    detail_id: d.id,
                    employee_id: d.employee_id.clone(),
                    exceptions: text.clone(),
                })
            })
            .collect();

        info!(
            run_id = %run_id,
            employees = record.run.employees,
            exception_count = record.run.exception_count,
            total_net_pay = %record.run.total_net_pay,
            "Draft generated"
        );

        Ok(GenerationReport {
            run: record.run,
            details: record.details,
            exceptions,
        })
    }

    /// Corrects one row's bank account number and/or net pay.
    pub fn edit_employee_payroll_detail(
        &self,
        run_id: Uuid,
        detail_id: Uuid,
        patch: &DetailPatch,
    ) -> EngineResult<DetailEdit> {
        self.edit_employee_payroll_detail_guarded(
            run_id,
            detail_id,
            patch,
            StatusGuard::new("edit payroll detail", EDITABLE),
        )
    }

    /// [`edit_employee_payroll_detail`](Self::edit_employee_payroll_detail)
    /// with caller-supplied status rules.
    pub fn edit_employee_payroll_detail_guarded(
        &self,
        run_id: Uuid,
        detail_id: Uuid,
        patch: &DetailPatch,
        guard: StatusGuard<'_>,
    ) -> EngineResult<DetailEdit> {
        let mut edited = None;
        let record = self.store.update_run(run_id, &mut |record: &mut RunRecord| {
            guard.check(record.run.status)?;
            let detail = record
                .details
                .iter_mut()
                .find(|d| d.id == detail_id)
                .ok_or_else(|| EngineError::not_found("payroll detail", detail_id))?;
            detail.apply_patch(patch)?;
            edited = Some(detail.clone());
            record.run.recompute_aggregates(&record.details);
            record.run.updated_at = Utc::now();
            Ok(())
        })?;

        let detail = edited.ok_or_else(|| EngineError::not_found("payroll detail", detail_id))?;
        info!(
            run_id = %run_id,
            detail_id = %detail_id,
            employee_id = %detail.employee_id,
            net_pay_overridden = detail.net_pay_overridden,
            "Payroll detail edited"
        );
        Ok(DetailEdit {
            run: record.run,
            detail,
        })
    }

    /// Moves a draft run to another period, discarding its rows.
    pub fn edit_payroll_period(&self, run_id: Uuid, period: NaiveDate) -> EngineResult<PayrollRun> {
        self.edit_payroll_period_guarded(
            run_id,
            period,
            StatusGuard::new("edit payroll period", DRAFT_ONLY),
        )
    }

    /// [`edit_payroll_period`](Self::edit_payroll_period) with
    /// caller-supplied status rules.
    pub fn edit_payroll_period_guarded(
        &self,
        run_id: Uuid,
        period: NaiveDate,
        guard: StatusGuard<'_>,
    ) -> EngineResult<PayrollRun> {
        let record = self.store.update_run(run_id, &mut |record: &mut RunRecord| {
            guard.check(record.run.status)?;
            record.run.payroll_period = period;
            record.details.clear();
            record.run.recompute_aggregates(&record.details);
            record.run.generated_at = None;
            record.run.updated_at = Utc::now();
            Ok(())
        })?;
        info!(run_id = %run_id, period = %record.run.period_key(), "Payroll period changed");
        Ok(record.run)
    }

    /// Returns a run.
    pub fn get_run(&self, run_id: Uuid) -> EngineResult<PayrollRun> {
        self.store.get_run(run_id)
    }

    /// Lists runs, optionally for one entity.
    pub fn list_runs(&self, entity: Option<&str>) -> EngineResult<Vec<PayrollRun>> {
        self.store.list_runs(entity)
    }

    /// Returns a run's employee rows.
    pub fn details(&self, run_id: Uuid) -> EngineResult<Vec<EmployeePayrollDetail>> {
        self.store.details(run_id)
    }

    /// Returns a run's payslips.
    pub fn payslips(&self, run_id: Uuid) -> EngineResult<Vec<PaySlip>> {
        self.store.payslips(run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigKind;
    use crate::engine::{InMemoryDirectory, InMemoryPayrollStore};
    use crate::models::{
        AllowanceFrequency, AllowanceKind, Allowance, ApprovalStatus, BankStatus, ConfigAudit,
        PayGrade, PayrollException, TaxCalculationType, TaxRule,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_config() -> ConfigStore {
        ConfigStore::from_records(
            vec![PayGrade {
                id: "grade_senior".to_string(),
                name: "Senior".to_string(),
                min_salary: dec("8000"),
                max_salary: dec("15000"),
                currency: "EGP".to_string(),
                status: ApprovalStatus::Approved,
                audit: ConfigAudit::default(),
            }],
            vec![Allowance {
                id: "transport".to_string(),
                name: "Transportation".to_string(),
                kind: AllowanceKind::Fixed,
                value: dec("2000"),
                frequency: AllowanceFrequency::Monthly,
                is_taxable: true,
                is_active: true,
                payable_in: None,
                grade_ids: vec![],
                status: ApprovalStatus::Approved,
                audit: ConfigAudit::default(),
            }],
            vec![TaxRule {
                id: "flat_15".to_string(),
                name: "Flat 15%".to_string(),
                calculation_type: TaxCalculationType::Flat,
                flat_rate: Some(dec("15")),
                brackets: vec![],
                effective_from: date(2026, 1, 1),
                effective_to: None,
                is_active: true,
                status: ApprovalStatus::Approved,
                audit: ConfigAudit::default(),
            }],
        )
        .unwrap()
    }

    fn create_employee(id: &str, salary: &str, bank: Option<&str>) -> EmployeeBase {
        EmployeeBase {
            employee_id: id.to_string(),
            name: id.to_string(),
            entity: "cairo-hq".to_string(),
            base_salary: dec(salary),
            grade_id: "grade_senior".to_string(),
            bank_account_number: bank.map(str::to_string),
        }
    }

    fn create_test_engine(parallel: bool) -> PayrollRunEngine {
        let directory = InMemoryDirectory::new(
            vec![
                create_employee("emp_002", "20000", Some("EG002")),
                create_employee("emp_001", "10000", Some("EG001")),
                create_employee("emp_003", "9000", None),
            ],
            vec![],
        )
        .unwrap();
        PayrollRunEngine::new(
            Arc::new(create_test_config()),
            Arc::new(directory),
            Arc::new(InMemoryPayrollStore::new()),
            GenerationSettings { parallel },
        )
    }

    #[test]
    fn test_generate_draft_computes_every_employee() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();

        let ids: Vec<&str> = report.details.iter().map(|d| d.employee_id.as_str()).collect();
        assert_eq!(ids, vec!["emp_001", "emp_002", "emp_003"]);

        // 10000 + 2000 transport, 15% flat
        let first = &report.details[0];
        assert_eq!(first.gross_pay, dec("12000"));
        assert_eq!(first.tax, dec("1800"));
        assert_eq!(first.net_pay, dec("10200"));
        assert!(first.exceptions.is_none());
        assert!(!first.audit_steps.is_empty());

        assert_eq!(report.run.employees, 3);
        assert_eq!(report.run.total_gross_pay, dec("12000") + dec("22000") + dec("11000"));
        assert!(report.run.generated_at.is_some());
    }

    #[test]
    fn test_generate_draft_reports_exceptions() {
        let engine = create_test_engine(false);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();

        // emp_002 is above the band, emp_003 has no bank account
        assert_eq!(report.run.exception_count, 2);
        assert_eq!(report.exceptions.len(), 2);
        assert_eq!(report.exceptions[0].employee_id, "emp_002");
        assert_eq!(report.exceptions[0].exceptions, "salary outside grade band");
        assert_eq!(report.details[2].bank_status, BankStatus::Missing);
        assert_eq!(
            report.details[2].exception_flags,
            vec![PayrollException::MissingBankAccount]
        );
    }

    #[test]
    fn test_regeneration_is_identical() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let first = engine.generate_draft(run.run_id).unwrap();
        let second = engine.generate_draft(run.run_id).unwrap();
        assert_eq!(first.details, second.details);
    }

    #[test]
    fn test_parallel_and_sequential_generation_agree() {
        let parallel = create_test_engine(true);
        let sequential = create_test_engine(false);
        let run_a = parallel.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let run_b = sequential.create_run("cairo-hq", date(2026, 1, 31)).unwrap();

        let a = parallel.generate_draft(run_a.run_id).unwrap();
        let b = sequential.generate_draft(run_b.run_id).unwrap();
        let nets_a: Vec<Decimal> = a.details.iter().map(|d| d.net_pay).collect();
        let nets_b: Vec<Decimal> = b.details.iter().map(|d| d.net_pay).collect();
        assert_eq!(nets_a, nets_b);
    }

    #[test]
    fn test_regeneration_discards_overrides() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();
        let detail_id = report.details[0].id;

        let patch = DetailPatch {
            bank_account_number: None,
            net_pay: Some(dec("9999")),
        };
        engine
            .edit_employee_payroll_detail(run.run_id, detail_id, &patch)
            .unwrap();

        let regenerated = engine.generate_draft(run.run_id).unwrap();
        assert_eq!(regenerated.details[0].net_pay, dec("10200"));
        assert!(!regenerated.details[0].net_pay_overridden);
    }

    #[test]
    fn test_generate_draft_requires_draft_status() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        engine
            .store()
            .update_run(run.run_id, &mut |record: &mut RunRecord| {
                record.run.status = RunStatus::UnderReview;
                Ok(())
            })
            .unwrap();

        match engine.generate_draft(run.run_id) {
            Err(EngineError::StateConflict { current, required, .. }) => {
                assert_eq!(current, "under review");
                assert_eq!(required, "draft");
            }
            other => panic!("Expected StateConflict, got {:?}", other.map(|r| r.run)),
        }
    }

    #[test]
    fn test_edit_detail_updates_aggregates() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();
        let missing_bank = &report.details[2];

        let patch = DetailPatch {
            bank_account_number: Some("EG003".to_string()),
            net_pay: Some(dec("-50")),
        };
        let edit = engine
            .edit_employee_payroll_detail(run.run_id, missing_bank.id, &patch)
            .unwrap();

        assert_eq!(edit.detail.bank_status, BankStatus::Present);
        assert_eq!(edit.detail.exceptions.as_deref(), Some("negative net pay"));
        assert_eq!(
            edit.run.total_net_pay,
            report.run.total_net_pay - missing_bank.net_pay + dec("-50")
        );
        // Gross is not recalculated
        assert_eq!(edit.detail.gross_pay, missing_bank.gross_pay);
    }

    #[test]
    fn test_invalid_patch_leaves_run_unchanged() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();

        let result = engine.edit_employee_payroll_detail(
            run.run_id,
            report.details[0].id,
            &DetailPatch::default(),
        );
        assert!(matches!(result, Err(EngineError::Validation { .. })));
        assert_eq!(engine.details(run.run_id).unwrap(), report.details);
    }

    #[test]
    fn test_edit_unknown_detail_is_not_found() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let patch = DetailPatch {
            bank_account_number: Some("EG".to_string()),
            net_pay: None,
        };
        assert!(matches!(
            engine.edit_employee_payroll_detail(run.run_id, Uuid::new_v4(), &patch),
            Err(EngineError::NotFound { .. })
        ));
    }

    #[test]
    fn test_edit_period_clears_rows() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        engine.generate_draft(run.run_id).unwrap();

        let moved = engine.edit_payroll_period(run.run_id, date(2026, 2, 28)).unwrap();
        assert_eq!(moved.period_key(), "2026-02");
        assert_eq!(moved.employees, 0);
        assert_eq!(moved.total_net_pay, Decimal::ZERO);
        assert!(engine.details(run.run_id).unwrap().is_empty());
    }

    #[test]
    fn test_edit_period_rejects_duplicate_month() {
        let engine = create_test_engine(true);
        engine.create_run("cairo-hq", date(2026, 2, 28)).unwrap();
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();

        assert!(matches!(
            engine.edit_payroll_period(run.run_id, date(2026, 2, 1)),
            Err(EngineError::DuplicateRun { .. })
        ));
    }

    #[test]
    fn test_create_run_rejects_blank_entity() {
        let engine = create_test_engine(true);
        assert!(matches!(
            engine.create_run("  ", date(2026, 1, 31)),
            Err(EngineError::Validation { .. })
        ));
    }

    #[test]
    fn test_configuration_changes_do_not_touch_generated_rows() {
        let engine = create_test_engine(true);
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();

        engine
            .config()
            .create_allowance(
                Allowance {
                    id: "housing".to_string(),
                    name: "Housing".to_string(),
                    kind: AllowanceKind::Percentage,
                    value: dec("10"),
                    frequency: AllowanceFrequency::Monthly,
                    is_taxable: true,
                    is_active: true,
                    payable_in: None,
                    grade_ids: vec![],
                    status: ApprovalStatus::Draft,
                    audit: ConfigAudit::default(),
                },
                "specialist_01",
            )
            .unwrap();
        engine.config().submit(ConfigKind::Allowances, "housing").unwrap();
        engine
            .config()
            .approve(ConfigKind::Allowances, "housing", "manager_01")
            .unwrap();

        assert_eq!(engine.details(run.run_id).unwrap(), report.details);
    }

    struct UnreachableAdjustments(InMemoryDirectory);

    impl EmployeeDirectory for UnreachableAdjustments {
        fn employees_in_entity(&self, entity: &str) -> EngineResult<Vec<EmployeeBase>> {
            self.0.employees_in_entity(entity)
        }

        fn get_employee_base(&self, employee_id: &str) -> EngineResult<EmployeeBase> {
            self.0.get_employee_base(employee_id)
        }

        fn adjustments(&self, _: &str, _: NaiveDate) -> EngineResult<Adjustments> {
            Err(EngineError::Storage {
                message: "directory offline".to_string(),
            })
        }
    }

    #[test]
    fn test_adjustment_failure_flags_row_without_aborting() {
        let directory = InMemoryDirectory::new(
            vec![create_employee("emp_001", "10000", Some("EG001"))],
            vec![],
        )
        .unwrap();
        let engine = PayrollRunEngine::new(
            Arc::new(create_test_config()),
            Arc::new(UnreachableAdjustments(directory)),
            Arc::new(InMemoryPayrollStore::new()),
            GenerationSettings::default(),
        );
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();
        let report = engine.generate_draft(run.run_id).unwrap();

        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details[0].net_pay, dec("10200"));
        assert_eq!(
            report.details[0].exceptions.as_deref(),
            Some("adjustments unavailable")
        );
        assert_eq!(report.run.exception_count, 1);
    }

    /// Moves every stored run to February while employees are being listed.
    struct PeriodShiftingDirectory {
        inner: InMemoryDirectory,
        store: Arc<InMemoryPayrollStore>,
    }

    impl EmployeeDirectory for PeriodShiftingDirectory {
        fn employees_in_entity(&self, entity: &str) -> EngineResult<Vec<EmployeeBase>> {
            for run in self.store.list_runs(None)? {
                self.store
                    .update_run(run.run_id, &mut |record: &mut RunRecord| {
                        record.run.payroll_period = date(2026, 2, 28);
                        record.details.clear();
                        record.run.recompute_aggregates(&record.details);
                        Ok(())
                    })?;
            }
            self.inner.employees_in_entity(entity)
        }

        fn get_employee_base(&self, employee_id: &str) -> EngineResult<EmployeeBase> {
            self.inner.get_employee_base(employee_id)
        }

        fn adjustments(&self, employee_id: &str, period: NaiveDate) -> EngineResult<Adjustments> {
            self.inner.adjustments(employee_id, period)
        }
    }

    #[test]
    fn test_period_change_during_generation_discards_rows() {
        let store = Arc::new(InMemoryPayrollStore::new());
        let directory = PeriodShiftingDirectory {
            inner: InMemoryDirectory::new(
                vec![create_employee("emp_001", "10000", Some("EG001"))],
                vec![],
            )
            .unwrap(),
            store: store.clone(),
        };
        let engine = PayrollRunEngine::new(
            Arc::new(create_test_config()),
            Arc::new(directory),
            store,
            GenerationSettings::default(),
        );
        let run = engine.create_run("cairo-hq", date(2026, 1, 31)).unwrap();

        let result = engine.generate_draft(run.run_id);
        assert!(matches!(result, Err(EngineError::StateConflict { .. })));

        let stored = engine.get_run(run.run_id).unwrap();
        assert_eq!(stored.payroll_period, date(2026, 2, 28));
        assert!(engine.details(run.run_id).unwrap().is_empty());
        assert!(stored.generated_at.is_none());
    }
}
