//! Tax calculation.
//!
//! Supports the three configured calculation types:
//!
//! - `FLAT`: `taxable * flat_rate / 100`.
//! - `PROGRESSIVE` / `TIERED`: for each bracket, in ascending order, the part of
//!   taxable pay inside the bracket is taxed at the bracket rate; the
//!   `fixed_amount` of the bracket that contains the taxable amount is added
//!   once. A `max_amount` of zero marks the unbounded top bracket.

use rust_decimal::Decimal;

use crate::models::{AuditStep, PayItem, TaxBracket, TaxCalculationType, TaxRule, round_money};

/// The result of applying a tax rule, including the tax line and audit step.
#[derive(Debug, Clone)]
pub struct TaxResult {
    /// Tax owed, rounded to the currency minor unit.
    pub tax: Decimal,
    /// The payslip line for this tax.
    pub item: PayItem,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

/// Tax owed on `taxable` under the bracket table, before rounding.
fn bracket_tax(brackets: &[TaxBracket], taxable: Decimal) -> (Decimal, Vec<serde_json::Value>) {
    let mut tax = Decimal::ZERO;
    let mut applied = Vec::new();

    for bracket in brackets {
        if taxable <= bracket.min_amount {
            break;
        }
        let upper = if bracket.is_unbounded() {
            taxable
        } else {
            taxable.min(bracket.max_amount)
        };
        let portion = upper - bracket.min_amount;
        let marginal = portion * bracket.rate / Decimal::ONE_HUNDRED;
        let surcharge = if bracket.contains(taxable) {
            bracket.fixed_amount
        } else {
            Decimal::ZERO
        };
        tax += marginal + surcharge;
        applied.push(serde_json::json!({
            "min_amount": bracket.min_amount.normalize().to_string(),
            "max_amount": bracket.max_amount.normalize().to_string(),
            "rate": bracket.rate.normalize().to_string(),
            "portion": portion.normalize().to_string(),
            "tax": (marginal + surcharge).normalize().to_string()
        }));
    }

    (tax, applied)
}

/// Computes tax owed on `taxable` under `rule`, rounded to the minor unit.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::tax_for_amount;
/// use payroll_engine::models::{
///     ApprovalStatus, ConfigAudit, TaxBracket, TaxCalculationType, TaxRule,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let rule = TaxRule {
///     id: "income_tax".to_string(),
///     name: "Income Tax".to_string(),
///     calculation_type: TaxCalculationType::Tiered,
///     flat_rate: None,
///     brackets: vec![
///         TaxBracket {
///             min_amount: Decimal::ZERO,
///             max_amount: Decimal::from(5000),
///             rate: Decimal::ZERO,
///             fixed_amount: Decimal::ZERO,
///         },
///         TaxBracket {
///             min_amount: Decimal::from(5000),
///             max_amount: Decimal::ZERO,
///             rate: Decimal::from(10),
///             fixed_amount: Decimal::ZERO,
///         },
///     ],
///     effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
///     effective_to: None,
///     is_active: true,
///     status: ApprovalStatus::Approved,
///     audit: ConfigAudit::default(),
/// };
///
/// assert_eq!(tax_for_amount(&rule, Decimal::from(8000)), Decimal::from(300));
/// ```
pub fn tax_for_amount(rule: &TaxRule, taxable: Decimal) -> Decimal {
    match rule.calculation_type {
        TaxCalculationType::Flat => {
            let rate = rule.flat_rate.unwrap_or(Decimal::ZERO);
            round_money(taxable * rate / Decimal::ONE_HUNDRED)
        }
        TaxCalculationType::Progressive | TaxCalculationType::Tiered => {
            round_money(bracket_tax(&rule.brackets, taxable).0)
        }
    }
}

/// Applies a tax rule to taxable pay and records the audit step.
pub fn calculate_tax(rule: &TaxRule, taxable: Decimal, step_number: u32) -> TaxResult {
    let (tax, output, reasoning) = match rule.calculation_type {
        TaxCalculationType::Flat => {
            let rate = rule.flat_rate.unwrap_or(Decimal::ZERO);
            let tax = tax_for_amount(rule, taxable);
            (
                tax,
                serde_json::json!({
                    "rate": rate.normalize().to_string(),
                    "tax": tax.to_string()
                }),
                format!(
                    "Flat {}% of ${} = ${}",
                    rate.normalize(),
                    taxable.normalize(),
                    tax
                ),
            )
        }
        TaxCalculationType::Progressive | TaxCalculationType::Tiered => {
            let (raw, applied) = bracket_tax(&rule.brackets, taxable);
            let tax = round_money(raw);
            let bracket_count = applied.len();
            (
                tax,
                serde_json::json!({
                    "brackets_applied": applied,
                    "tax": tax.to_string()
                }),
                format!(
                    "{} bracket(s) applied to ${} = ${}",
                    bracket_count,
                    taxable.normalize(),
                    tax
                ),
            )
        }
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "tax_calculation".to_string(),
        rule_name: "Tax Calculation".to_string(),
        source_id: Some(rule.id.clone()),
        input: serde_json::json!({
            "calculation_type": rule.calculation_type,
            "taxable_pay": taxable.normalize().to_string()
        }),
        output,
        reasoning,
    };

    TaxResult {
        tax,
        item: PayItem::new(rule.name.clone(), tax),
        audit_step,
    }
}
