//! Property tests for pay computation and the run state machine.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use payroll_engine::api::AppState;
use payroll_engine::calculation::{compute_pay, tax_for_amount};
use payroll_engine::config::ConfigLoader;
use payroll_engine::engine::{RunRecord, build_detail};
use payroll_engine::error::{EngineError, EngineResult};
use payroll_engine::models::{
    Adjustments, DetailPatch, EmployeeBase, PayItem, RunStatus, TaxRule,
};
use payroll_engine::workflow::{
    Actor, ApprovalWorkflow, Role, Transition, WorkflowAction, allowed_statuses,
};

fn progressive_rule() -> TaxRule {
    serde_yaml::from_str(
        r#"
id: tax_prop
name: Progressive
calculation_type: PROGRESSIVE
effective_from: "2026-01-01"
brackets:
  - { min_amount: "0", max_amount: "5000", rate: "0" }
  - { min_amount: "5000", max_amount: "15000", rate: "10" }
  - { min_amount: "15000", max_amount: "40000", rate: "22.5", fixed_amount: "250" }
  - { min_amount: "40000", max_amount: "0", rate: "27.5", fixed_amount: "250" }
"#,
    )
    .unwrap()
}

fn flat_rule(rate: Decimal) -> TaxRule {
    serde_yaml::from_str(&format!(
        r#"
id: tax_flat
name: Flat
calculation_type: FLAT
flat_rate: "{}"
effective_from: "2026-01-01"
"#,
        rate
    ))
    .unwrap()
}

fn contiguous_rule(rate: Decimal, first: Decimal, second: Decimal) -> TaxRule {
    serde_yaml::from_str(&format!(
        r#"
id: tax_split
name: Split
calculation_type: PROGRESSIVE
effective_from: "2026-01-01"
brackets:
  - {{ min_amount: "0", max_amount: "{first}", rate: "{rate}" }}
  - {{ min_amount: "{first}", max_amount: "{second}", rate: "{rate}" }}
  - {{ min_amount: "{second}", max_amount: "0", rate: "{rate}" }}
"#,
    ))
    .unwrap()
}

fn money() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn items(label: &'static str) -> impl Strategy<Value = Vec<PayItem>> {
    prop::collection::vec(money(), 0..3).prop_map(move |amounts| {
        amounts
            .into_iter()
            .enumerate()
            .map(|(i, amount)| PayItem::new(format!("{} {}", label, i + 1), amount))
            .collect()
    })
}

fn employee(base_salary: Decimal) -> EmployeeBase {
    EmployeeBase {
        employee_id: "emp_prop".to_string(),
        name: "Property Employee".to_string(),
        entity: "cairo-hq".to_string(),
        base_salary,
        grade_id: "grade_senior".to_string(),
        bank_account_number: Some("EG001".to_string()),
    }
}

proptest! {
    /// More taxable pay never means less tax.
    #[test]
    fn test_progressive_tax_is_monotonic(a in money(), b in money()) {
        let rule = progressive_rule();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(tax_for_amount(&rule, low) <= tax_for_amount(&rule, high));
    }

    /// Tax never exceeds the taxable amount.
    #[test]
    fn test_tax_bounded_by_taxable(taxable in money()) {
        let rule = progressive_rule();
        let tax = tax_for_amount(&rule, taxable);
        prop_assert!(tax >= Decimal::ZERO);
        prop_assert!(tax <= taxable);
    }

    /// Contiguous brackets sharing one rate behave like a flat rate.
    #[test]
    fn test_equal_rate_brackets_match_flat(
        rate_tenths in 0i64..=1000,
        first in 1i64..50_000,
        width in 1i64..50_000,
        taxable in money(),
    ) {
        let rate = Decimal::new(rate_tenths, 1);
        let first = Decimal::from(first);
        let second = first + Decimal::from(width);
        prop_assert_eq!(
            tax_for_amount(&contiguous_rule(rate, first, second), taxable),
            tax_for_amount(&flat_rule(rate), taxable)
        );
    }

    /// Every computed row balances to the cent.
    #[test]
    fn test_net_plus_deductions_equals_gross(
        base in money(),
        bonuses in items("Bonus"),
        refunds in items("Refund"),
        penalties in items("Penalty"),
        insurances in items("Insurance"),
    ) {
        let adjustments = Adjustments { bonuses, refunds, penalties, insurances };
        let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        let rule = progressive_rule();

        let result = compute_pay(&employee(base), None, &[], Some(&rule), &adjustments, period);
        let breakdown = result.breakdown;

        prop_assert_eq!(breakdown.net_pay + breakdown.total_deductions, breakdown.gross_pay);
        prop_assert_eq!(
            breakdown.gross_pay,
            base + adjustments.bonus_total() + adjustments.refund_total()
        );
        prop_assert!(breakdown.taxable_pay <= breakdown.gross_pay);
    }
}

// =============================================================================
// State machine
// =============================================================================

/// Runs one workflow action with well-formed arguments.
fn perform(
    workflow: &ApprovalWorkflow,
    actor: &Actor,
    action: WorkflowAction,
    run_id: Uuid,
    detail_id: Uuid,
) -> EngineResult<()> {
    let reason = "Checked against bank file".to_string();
    match action {
        WorkflowAction::GenerateDraft => workflow.generate_draft(actor, run_id).map(|_| ()),
        WorkflowAction::EditPayrollPeriod => workflow
            .edit_payroll_period(actor, run_id, NaiveDate::from_ymd_opt(2026, 2, 28).unwrap())
            .map(|_| ()),
        WorkflowAction::EditDetail => {
            let patch = DetailPatch {
                bank_account_number: Some("EG002".to_string()),
                net_pay: None,
            };
            workflow
                .edit_employee_payroll_detail(actor, run_id, detail_id, &patch)
                .map(|_| ())
        }
        other => {
            let transition = match other {
                WorkflowAction::Submit => Transition::Submit,
                WorkflowAction::ManagerApprove => Transition::ManagerApprove { comments: None },
                WorkflowAction::ManagerReject => Transition::ManagerReject { reason },
                WorkflowAction::FinanceApprove => Transition::FinanceApprove,
                WorkflowAction::FinanceReject => Transition::FinanceReject { reason },
                WorkflowAction::Lock => Transition::Lock,
                WorkflowAction::Unlock => Transition::Unlock { reason },
                WorkflowAction::Reopen => Transition::Reopen,
                _ => unreachable!("{} is not a transition", other),
            };
            workflow.transition(actor, run_id, transition).map(|_| ())
        }
    }
}

#[test]
fn test_actions_outside_table_fail_without_side_effects() {
    let loader = ConfigLoader::load("./config/default").unwrap();
    let state = AppState::from_loader(&loader).unwrap();
    let workflow = state.workflow();
    let specialist = Actor::new("specialist_01", Role::PayrollSpecialist);

    for status in RunStatus::ALL {
        for role in Role::ALL {
            // Run creation is not scoped to an existing run
            for action in WorkflowAction::ALL
                .into_iter()
                .filter(|a| *a != WorkflowAction::CreateRun)
            {
                if allowed_statuses(action, role).is_some_and(|s| s.contains(&status)) {
                    continue;
                }

                let entity = format!("entity-{}", Uuid::new_v4());
                let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
                let run = workflow.create_run(&specialist, &entity, period).unwrap();
                let snapshot = workflow.engine().config().snapshot(period).unwrap();
                let employee = EmployeeBase {
                    entity: entity.clone(),
                    ..employee(Decimal::from(10000))
                };
                workflow
                    .engine()
                    .store()
                    .update_run(run.run_id, &mut |record: &mut RunRecord| {
                        let detail = build_detail(
                            &record.run,
                            &snapshot,
                            &employee,
                            &Adjustments::default(),
                        );
                        record.details = vec![detail];
                        record.run.recompute_aggregates(&record.details);
                        record.run.status = status;
                        Ok(())
                    })
                    .unwrap();

                let engine = workflow.engine();
                let run_before = engine.get_run(run.run_id).unwrap();
                let details_before = engine.details(run.run_id).unwrap();
                let detail_id = details_before[0].id;

                let actor = Actor::new("actor_01", role);
                let result = perform(workflow, &actor, action, run.run_id, detail_id);
                assert!(
                    matches!(
                        result,
                        Err(EngineError::StateConflict { .. } | EngineError::Unauthorized { .. })
                    ),
                    "{} by {} in status {} gave {:?}",
                    action,
                    role,
                    status,
                    result
                );
                assert_eq!(engine.get_run(run.run_id).unwrap(), run_before);
                assert_eq!(engine.details(run.run_id).unwrap(), details_before);
            }
        }
    }
}
