//! Allowance resolution.
//!
//! Turns a configured [`Allowance`] into the amount it contributes to a
//! monthly payroll run.
//!
//! # Proration policy
//!
//! - `PERCENTAGE`: `value / 100 * base_salary`, whatever the frequency.
//! - `FIXED` + `MONTHLY`: the full value.
//! - `FIXED` + `QUARTERLY`: value / 3.
//! - `FIXED` + `ANNUALLY`: value / 12.
//! - `FIXED` + `ONE_TIME`: the full value in the month named by `payable_in`,
//!   nothing in any other month.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{
    Allowance, AllowanceFrequency, AllowanceKind, AuditStep, PayItem, round_money,
};

/// The result of resolving one allowance for a period.
#[derive(Debug, Clone)]
pub struct AllowanceResolution {
    /// The payslip line, or `None` if nothing is payable this period.
    pub item: Option<PayItem>,
    /// Whether the amount counts towards taxable pay.
    pub is_taxable: bool,
    /// The audit step recording this resolution.
    pub audit_step: AuditStep,
}

/// Number of monthly runs a fixed amount of the given frequency is spread over.
///
/// Returns `None` for one-time allowances, which are not spread.
pub fn months_covered(frequency: AllowanceFrequency) -> Option<u32> {
    match frequency {
        AllowanceFrequency::Monthly => Some(1),
        AllowanceFrequency::Quarterly => Some(3),
        AllowanceFrequency::Annually => Some(12),
        AllowanceFrequency::OneTime => None,
    }
}

/// Resolves an allowance to the amount payable in the run for `period`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::resolve_allowance;
/// use payroll_engine::models::{
///     Allowance, AllowanceFrequency, AllowanceKind, ApprovalStatus, ConfigAudit,
/// };
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
///
/// let allowance = Allowance {
///     id: "annual_travel".to_string(),
///     name: "Travel".to_string(),
///     kind: AllowanceKind::Fixed,
///     value: Decimal::from(12000),
///     frequency: AllowanceFrequency::Annually,
///     is_taxable: false,
///     is_active: true,
///     payable_in: None,
///     grade_ids: vec![],
///     status: ApprovalStatus::Approved,
///     audit: ConfigAudit::default(),
/// };
///
/// let period = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
/// let result = resolve_allowance(&allowance, Decimal::from(10000), period, 1);
/// assert_eq!(result.item.unwrap().amount, Decimal::from(1000));
/// assert!(!result.is_taxable);
/// ```
pub fn resolve_allowance(
    allowance: &Allowance,
    base_salary: Decimal,
    period: NaiveDate,
    step_number: u32,
) -> AllowanceResolution {
    let (amount, reasoning) = match allowance.kind {
        AllowanceKind::Percentage => {
            let amount = round_money(allowance.value / Decimal::ONE_HUNDRED * base_salary);
            (
                Some(amount),
                format!(
                    "{}% of base ${} = ${}",
                    allowance.value.normalize(),
                    base_salary.normalize(),
                    amount
                ),
            )
        }
        AllowanceKind::Fixed => match months_covered(allowance.frequency) {
            Some(1) => (
                Some(round_money(allowance.value)),
                format!("Monthly fixed amount ${}", allowance.value.normalize()),
            ),
            Some(months) => {
                let amount = round_money(allowance.value / Decimal::from(months));
                (
                    Some(amount),
                    format!(
                        "${} spread over {} months = ${}",
                        allowance.value.normalize(),
                        months,
                        amount
                    ),
                )
            }
            None if allowance.is_payable_in(period) => (
                Some(round_money(allowance.value)),
                format!(
                    "One-time amount ${} designated for this period",
                    allowance.value.normalize()
                ),
            ),
            None => (
                None,
                "One-time allowance is designated for a different period".to_string(),
            ),
        },
    };

    let audit_step = AuditStep {
        step_number,
        rule_id: "allowance_resolution".to_string(),
        rule_name: "Allowance Resolution".to_string(),
        source_id: Some(allowance.id.clone()),
        input: serde_json::json!({
            "kind": allowance.kind,
            "value": allowance.value.normalize().to_string(),
            "frequency": allowance.frequency,
            "base_salary": base_salary.normalize().to_string(),
            "period": period.to_string()
        }),
        output: serde_json::json!({
            "payable": amount.is_some(),
            "amount": amount.unwrap_or(Decimal::ZERO).to_string(),
            "is_taxable": allowance.is_taxable
        }),
        reasoning,
    };

    AllowanceResolution {
        item: amount.map(|amount| PayItem::new(allowance.name.clone(), amount)),
        is_taxable: allowance.is_taxable,
        audit_step,
    }
}
