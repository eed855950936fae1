//! Per-employee pay computation.
//!
//! [`compute_pay`] is a pure function: given an employee's base data, the
//! configuration that applies to them and their adjustments for the period,
//! it produces an itemised [`PayBreakdown`] and the audit trail explaining it.
//! Problems with the inputs (no tax rule, unapproved grade) do not stop the
//! computation; they are left for the exception detector to flag.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::allowance::resolve_allowance;
use super::tax::calculate_tax;
use crate::models::{
    Adjustments, Allowance, ApprovalStatus, AuditStep, EmployeeBase, PayBreakdown, PayGrade,
    PayItem, TaxRule, round_money, sum_items,
};

/// The result of computing one employee's pay.
#[derive(Debug, Clone)]
pub struct CompensationResult {
    /// The itemised breakdown.
    pub breakdown: PayBreakdown,
    /// Audit steps in the order they were taken.
    pub audit_steps: Vec<AuditStep>,
}

fn rounded(items: &[PayItem]) -> Vec<PayItem> {
    items
        .iter()
        .map(|item| PayItem::new(item.name.clone(), round_money(item.amount)))
        .collect()
}

/// Computes an employee's pay for the month of `period`.
///
/// Only approved, active allowances that apply to the employee's grade are
/// paid. Gross pay is base + allowances + bonuses + refunds; taxable pay is
/// base + taxable allowances + bonuses; net pay is gross minus tax, insurance
/// and penalties and is never clamped.
///
/// Every tax rule, FLAT included, is applied to taxable pay rather than
/// gross pay. Expense refunds and non-taxable allowances are therefore never
/// taxed; when every component is taxable the two bases coincide.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::compute_pay;
/// use payroll_engine::models::{
///     Adjustments, Allowance, AllowanceFrequency, AllowanceKind, ApprovalStatus, ConfigAudit,
///     EmployeeBase, TaxCalculationType, TaxRule,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let employee = EmployeeBase {
///     employee_id: "emp_001".to_string(),
///     name: "Mona Adel".to_string(),
///     entity: "cairo-hq".to_string(),
///     base_salary: Decimal::from(10000),
///     grade_id: "grade_senior".to_string(),
///     bank_account_number: Some("EG12".to_string()),
/// };
/// let housing = Allowance {
///     id: "housing".to_string(),
///     name: "Housing".to_string(),
///     kind: AllowanceKind::Fixed,
///     value: Decimal::from(2000),
///     frequency: AllowanceFrequency::Monthly,
///     is_taxable: true,
///     is_active: true,
///     payable_in: None,
///     grade_ids: vec![],
///     status: ApprovalStatus::Approved,
///     audit: ConfigAudit::default(),
/// };
/// let tax = TaxRule {
///     id: "flat_15".to_string(),
///     name: "Income Tax".to_string(),
///     calculation_type: TaxCalculationType::Flat,
///     flat_rate: Some(Decimal::from(15)),
///     brackets: vec![],
///     effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     effective_to: None,
///     is_active: true,
///     status: ApprovalStatus::Approved,
///     audit: ConfigAudit::default(),
/// };
///
/// let result = compute_pay(
///     &employee,
///     None,
///     &[housing],
///     Some(&tax),
///     &Adjustments::default(),
///     NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
/// );
/// assert_eq!(result.breakdown.gross_pay, Decimal::from(12000));
/// assert_eq!(result.breakdown.net_pay, Decimal::from(10200));
/// ```
pub fn compute_pay(
    employee: &EmployeeBase,
    grade: Option<&PayGrade>,
    allowances: &[Allowance],
    tax_rule: Option<&TaxRule>,
    adjustments: &Adjustments,
    period: NaiveDate,
) -> CompensationResult {
    let mut audit_steps = Vec::new();
    let mut step_number: u32 = 1;

    // Base salary
    let base_salary = round_money(employee.base_salary);
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "base_salary".to_string(),
        rule_name: "Base Salary".to_string(),
        source_id: Some(employee.grade_id.clone()),
        input: serde_json::json!({
            "employee_id": employee.employee_id,
            "grade_id": employee.grade_id,
            "grade_min": grade.map(|g| g.min_salary.normalize().to_string()),
            "grade_max": grade.map(|g| g.max_salary.normalize().to_string())
        }),
        output: serde_json::json!({
            "base_salary": base_salary.to_string()
        }),
        reasoning: format!("Contracted base salary ${}", base_salary),
    });
    step_number += 1;

    // Allowances
    let mut allowance_items = Vec::new();
    let mut taxable_allowances = Decimal::ZERO;
    for allowance in allowances.iter().filter(|a| {
        a.status == ApprovalStatus::Approved && a.is_active && a.applies_to_grade(&employee.grade_id)
    }) {
        let resolution = resolve_allowance(allowance, base_salary, period, step_number);
        audit_steps.push(resolution.audit_step);
        step_number += 1;
        if let Some(item) = resolution.item {
            if resolution.is_taxable {
                taxable_allowances += item.amount;
            }
            allowance_items.push(item);
        }
    }

    // Gross and taxable pay
    let bonuses = rounded(&adjustments.bonuses);
    let refunds = rounded(&adjustments.refunds);
    let allowance_total = sum_items(&allowance_items);
    let bonus_total = sum_items(&bonuses);
    let refund_total = sum_items(&refunds);
    let gross_pay = base_salary + allowance_total + bonus_total + refund_total;
    let taxable_pay = base_salary + taxable_allowances + bonus_total;
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "gross_pay".to_string(),
        rule_name: "Gross Pay".to_string(),
        source_id: None,
        input: serde_json::json!({
            "base_salary": base_salary.to_string(),
            "allowances": allowance_total.to_string(),
            "bonuses": bonus_total.to_string(),
            "refunds": refund_total.to_string()
        }),
        output: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "taxable_pay": taxable_pay.to_string()
        }),
        reasoning: format!(
            "${} base + ${} allowances + ${} bonuses + ${} refunds = ${}; taxable ${}",
            base_salary, allowance_total, bonus_total, refund_total, gross_pay, taxable_pay
        ),
    });
    step_number += 1;

    // Tax
    let mut taxes = Vec::new();
    match tax_rule {
        Some(rule) => {
            let result = calculate_tax(rule, taxable_pay, step_number);
            audit_steps.push(result.audit_step);
            taxes.push(result.item);
        }
        None => audit_steps.push(AuditStep {
            step_number,
            rule_id: "tax_calculation".to_string(),
            rule_name: "Tax Calculation".to_string(),
            source_id: None,
            input: serde_json::json!({
                "taxable_pay": taxable_pay.to_string()
            }),
            output: serde_json::json!({
                "tax": "0"
            }),
            reasoning: "No approved tax rule in effect; no tax withheld".to_string(),
        }),
    }
    step_number += 1;

    // Net pay
    let insurances = rounded(&adjustments.insurances);
    let penalties = rounded(&adjustments.penalties);
    let tax_total = sum_items(&taxes);
    let total_deductions = tax_total + sum_items(&insurances) + sum_items(&penalties);
    let net_pay = gross_pay - total_deductions;
    audit_steps.push(AuditStep {
        step_number,
        rule_id: "net_pay".to_string(),
        rule_name: "Net Pay".to_string(),
        source_id: None,
        input: serde_json::json!({
            "gross_pay": gross_pay.to_string(),
            "tax": tax_total.to_string(),
            "insurance": sum_items(&insurances).to_string(),
            "penalties": sum_items(&penalties).to_string()
        }),
        output: serde_json::json!({
            "total_deductions": total_deductions.to_string(),
            "net_pay": net_pay.to_string()
        }),
        reasoning: format!(
            "${} gross - ${} deductions = ${}",
            gross_pay, total_deductions, net_pay
        ),
    });

    CompensationResult {
        breakdown: PayBreakdown {
            base_salary,
            allowances: allowance_items,
            bonuses,
            refunds,
            taxes,
            insurances,
            penalties,
            gross_pay,
            taxable_pay,
            total_deductions,
            net_pay,
        },
        audit_steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AllowanceFrequency, AllowanceKind, ConfigAudit, TaxBracket, TaxCalculationType,
    };
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn period() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 31).unwrap()
    }

    fn create_employee(base: &str) -> EmployeeBase {
        EmployeeBase {
            employee_id: "emp_001".to_string(),
            name: "Mona Adel".to_string(),
            entity: "cairo-hq".to_string(),
            base_salary: dec(base),
            grade_id: "grade_senior".to_string(),
            bank_account_number: Some("EG12".to_string()),
        }
    }

    fn create_allowance(id: &str, value: &str, is_taxable: bool) -> Allowance {
        Allowance {
            id: id.to_string(),
            name: id.to_string(),
            kind: AllowanceKind::Fixed,
            value: dec(value),
            frequency: AllowanceFrequency::Monthly,
            is_taxable,
            is_active: true,
            payable_in: None,
            grade_ids: vec![],
            status: ApprovalStatus::Approved,
            audit: ConfigAudit::default(),
        }
    }

    fn flat_rule(rate: &str) -> TaxRule {
        TaxRule {
            id: "flat".to_string(),
            name: "Income Tax".to_string(),
            calculation_type: TaxCalculationType::Flat,
            flat_rate: Some(dec(rate)),
            brackets: vec![],
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            effective_to: None,
            is_active: true,
            status: ApprovalStatus::Approved,
            audit: ConfigAudit::default(),
        }
    }

    #[test]
    fn test_base_10000_fixed_2000_flat_15() {
        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[create_allowance("housing", "2000", true)],
            Some(&flat_rule("15")),
            &Adjustments::default(),
            period(),
        );
        let b = &result.breakdown;
        assert_eq!(b.gross_pay, dec("12000"));
        assert_eq!(b.tax_total(), dec("1800"));
        assert_eq!(b.net_pay, dec("10200"));
    }

    #[test]
    fn test_tiered_scenario_taxable_8000() {
        let rule = TaxRule {
            calculation_type: TaxCalculationType::Tiered,
            flat_rate: None,
            brackets: vec![
                TaxBracket {
                    min_amount: dec("0"),
                    max_amount: dec("5000"),
                    rate: dec("0"),
                    fixed_amount: dec("0"),
                },
                TaxBracket {
                    min_amount: dec("5000"),
                    max_amount: dec("0"),
                    rate: dec("10"),
                    fixed_amount: dec("0"),
                },
            ],
            ..flat_rule("0")
        };
        let result = compute_pay(
            &create_employee("8000"),
            None,
            &[],
            Some(&rule),
            &Adjustments::default(),
            period(),
        );
        assert_eq!(result.breakdown.taxable_pay, dec("8000"));
        assert_eq!(result.breakdown.tax_total(), dec("300"));
        assert_eq!(result.breakdown.net_pay, dec("7700"));
    }

    #[test]
    fn test_non_taxable_allowance_in_gross_not_in_tax_base() {
        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[
                create_allowance("housing", "2000", true),
                create_allowance("meal", "1000", false),
            ],
            Some(&flat_rule("10")),
            &Adjustments::default(),
            period(),
        );
        let b = &result.breakdown;
        assert_eq!(b.gross_pay, dec("13000"));
        assert_eq!(b.taxable_pay, dec("12000"));
        assert_eq!(b.tax_total(), dec("1200"));
        assert_eq!(b.net_pay, dec("11800"));
    }

    #[test]
    fn test_unapproved_and_inactive_allowances_are_ignored() {
        let mut pending = create_allowance("pending", "500", true);
        pending.status = ApprovalStatus::PendingApproval;
        let mut inactive = create_allowance("inactive", "700", true);
        inactive.is_active = false;
        let mut other_grade = create_allowance("other_grade", "900", true);
        other_grade.grade_ids = vec!["grade_junior".to_string()];

        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[pending, inactive, other_grade],
            Some(&flat_rule("0")),
            &Adjustments::default(),
            period(),
        );
        assert!(result.breakdown.allowances.is_empty());
        assert_eq!(result.breakdown.gross_pay, dec("10000"));
    }

    #[test]
    fn test_adjustments_flow_into_gross_and_deductions() {
        let adjustments = Adjustments {
            bonuses: vec![PayItem::new("Spot award", dec("1000"))],
            refunds: vec![PayItem::new("Travel", dec("250"))],
            penalties: vec![PayItem::new("Late", dec("100"))],
            insurances: vec![PayItem::new("Medical", dec("400"))],
        };
        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[],
            Some(&flat_rule("10")),
            &adjustments,
            period(),
        );
        let b = &result.breakdown;
        assert_eq!(b.gross_pay, dec("11250"));
        // refunds are not taxed
        assert_eq!(b.taxable_pay, dec("11000"));
        assert_eq!(b.tax_total(), dec("1100"));
        assert_eq!(b.total_deductions, dec("1600"));
        assert_eq!(b.net_pay, dec("9650"));
    }

    #[test]
    fn test_flat_tax_excludes_refunds_from_base() {
        let taxed_only = compute_pay(
            &create_employee("10000"),
            None,
            &[create_allowance("housing", "2000", true)],
            Some(&flat_rule("15")),
            &Adjustments::default(),
            period(),
        );
        // All components taxable: taxable pay equals gross
        assert_eq!(taxed_only.breakdown.taxable_pay, taxed_only.breakdown.gross_pay);
        assert_eq!(taxed_only.breakdown.tax_total(), dec("1800"));

        let with_refund = compute_pay(
            &create_employee("10000"),
            None,
            &[create_allowance("housing", "2000", true)],
            Some(&flat_rule("15")),
            &Adjustments {
                refunds: vec![PayItem::new("Travel", dec("1000"))],
                ..Adjustments::default()
            },
            period(),
        );
        let b = &with_refund.breakdown;
        assert_eq!(b.gross_pay, dec("13000"));
        assert_eq!(b.taxable_pay, dec("12000"));
        // 15% of 12000, not of 13000
        assert_eq!(b.tax_total(), dec("1800"));
        assert_eq!(b.net_pay, dec("11200"));
    }

    #[test]
    fn test_negative_net_is_not_clamped() {
        let adjustments = Adjustments {
            penalties: vec![PayItem::new("Damages", dec("5000"))],
            ..Default::default()
        };
        let result = compute_pay(
            &create_employee("3000"),
            None,
            &[],
            Some(&flat_rule("10")),
            &adjustments,
            period(),
        );
        assert_eq!(result.breakdown.net_pay, dec("-2300"));
    }

    #[test]
    fn test_missing_tax_rule_withholds_nothing() {
        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[],
            None,
            &Adjustments::default(),
            period(),
        );
        assert!(result.breakdown.taxes.is_empty());
        assert_eq!(result.breakdown.net_pay, dec("10000"));
        let tax_step = result
            .audit_steps
            .iter()
            .find(|s| s.rule_id == "tax_calculation")
            .unwrap();
        assert!(tax_step.reasoning.contains("No approved tax rule"));
    }

    #[test]
    fn test_net_plus_deductions_reconstructs_gross() {
        let result = compute_pay(
            &create_employee("9876.54"),
            None,
            &[create_allowance("housing", "1234.56", true)],
            Some(&flat_rule("13.37")),
            &Adjustments {
                insurances: vec![PayItem::new("Medical", dec("111.111"))],
                ..Default::default()
            },
            period(),
        );
        let b = &result.breakdown;
        assert_eq!(b.net_pay + b.total_deductions, b.gross_pay);
        assert_eq!(
            b.net_pay + b.tax_total() + sum_items(&b.insurances) + sum_items(&b.penalties),
            b.gross_pay
        );
    }

    #[test]
    fn test_audit_steps_are_numbered_sequentially() {
        let result = compute_pay(
            &create_employee("10000"),
            None,
            &[
                create_allowance("housing", "2000", true),
                create_allowance("meal", "500", false),
            ],
            Some(&flat_rule("15")),
            &Adjustments::default(),
            period(),
        );
        let numbers: Vec<u32> = result.audit_steps.iter().map(|s| s.step_number).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5, 6]);
    }
}
