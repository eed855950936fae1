//! Tax rule and tax bracket models.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::approval::{ApprovalRecord, ApprovalStatus, ConfigAudit};
use crate::error::{EngineError, EngineResult};

/// How a tax rule turns taxable pay into tax owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxCalculationType {
    /// A single rate applied to all taxable pay.
    Flat,
    /// Marginal rates per bracket.
    Progressive,
    /// Marginal rates per bracket, with per-tier surcharges.
    Tiered,
}

/// One tier of a progressive or tiered tax rule.
///
/// A `max_amount` of zero marks the terminal, unbounded bracket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    /// Lower bound of the bracket.
    pub min_amount: Decimal,
    /// Upper bound of the bracket; zero means unbounded.
    pub max_amount: Decimal,
    /// Marginal rate in percent.
    pub rate: Decimal,
    /// Surcharge added once when taxable pay falls inside this bracket.
    #[serde(default)]
    pub fixed_amount: Decimal,
}

impl TaxBracket {
    /// Returns true if the bracket has no upper bound.
    pub fn is_unbounded(&self) -> bool {
        self.max_amount.is_zero()
    }

    /// Returns true if `amount` falls in this bracket (`min < amount <= max`).
    pub fn contains(&self, amount: Decimal) -> bool {
        amount > self.min_amount && (self.is_unbounded() || amount <= self.max_amount)
    }
}

/// A configured tax rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRule {
    /// Unique identifier.
    pub id: String,
    /// Display name, used as the payslip label.
    pub name: String,
    /// Flat, progressive or tiered.
    pub calculation_type: TaxCalculationType,
    /// Rate in percent; required for flat rules and ignored otherwise.
    #[serde(default)]
    pub flat_rate: Option<Decimal>,
    /// Brackets ordered by `min_amount`.
    #[serde(default)]
    pub brackets: Vec<TaxBracket>,
    /// First day the rule applies.
    pub effective_from: NaiveDate,
    /// Last day the rule applies; open-ended when absent.
    #[serde(default)]
    pub effective_to: Option<NaiveDate>,
    /// Inactive rules are never applied.
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Approval status.
    #[serde(default = "default_status")]
    pub status: ApprovalStatus,
    /// Audit fields.
    #[serde(default)]
    pub audit: ConfigAudit,
}

fn default_true() -> bool {
    true
}

fn default_status() -> ApprovalStatus {
    ApprovalStatus::Draft
}

impl TaxRule {
    /// Returns true if the rule's effective window covers `date`.
    pub fn is_effective_on(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }
}

fn validate_rate(field: &str, rate: Decimal) -> EngineResult<()> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(EngineError::validation(field, "rate must be between 0 and 100"));
    }
    Ok(())
}

fn validate_brackets(brackets: &[TaxBracket]) -> EngineResult<()> {
    for (i, bracket) in brackets.iter().enumerate() {
        let field = format!("brackets[{}]", i);
        if bracket.min_amount < Decimal::ZERO {
            return Err(EngineError::validation(field, "min_amount must not be negative"));
        }
        if bracket.fixed_amount < Decimal::ZERO {
            return Err(EngineError::validation(field, "fixed_amount must not be negative"));
        }
        validate_rate(&field, bracket.rate)?;

        let is_last = i + 1 == brackets.len();
        if bracket.is_unbounded() {
            if !is_last {
                return Err(EngineError::validation(
                    field,
                    "only the last bracket may be unbounded (max_amount = 0)",
                ));
            }
        } else if bracket.max_amount <= bracket.min_amount {
            return Err(EngineError::validation(
                field,
                format!(
                    "max_amount {} must exceed min_amount {}",
                    bracket.max_amount, bracket.min_amount
                ),
            ));
        }

        if let Some(prev) = i.checked_sub(1).map(|p| &brackets[p]) {
            if bracket.min_amount < prev.max_amount {
                return Err(EngineError::validation(
                    field,
                    format!(
                        "overlaps previous bracket ({} < {})",
                        bracket.min_amount, prev.max_amount
                    ),
                ));
            }
        }
    }
    Ok(())
}

impl ApprovalRecord for TaxRule {
    fn id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> ApprovalStatus {
        self.status
    }

    fn status_mut(&mut self) -> &mut ApprovalStatus {
        &mut self.status
    }

    fn audit_mut(&mut self) -> &mut ConfigAudit {
        &mut self.audit
    }

    fn validate(&self) -> EngineResult<()> {
        if self.id.trim().is_empty() {
            return Err(EngineError::validation("id", "must not be empty"));
        }
        if self.name.trim().is_empty() {
            return Err(EngineError::validation("name", "must not be empty"));
        }
        if let Some(to) = self.effective_to {
            if to < self.effective_from {
                return Err(EngineError::validation(
                    "effective_to",
                    "must not be before effective_from",
                ));
            }
        }
        match self.calculation_type {
            TaxCalculationType::Flat => {
                let rate = self.flat_rate.ok_or_else(|| {
                    EngineError::validation("flat_rate", "required for FLAT tax rules")
                })?;
                validate_rate("flat_rate", rate)
            }
            TaxCalculationType::Progressive | TaxCalculationType::Tiered => {
                if self.brackets.is_empty() {
                    return Err(EngineError::validation(
                        "brackets",
                        "at least one bracket is required",
                    ));
                }
                validate_brackets(&self.brackets)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn bracket(min: &str, max: &str, rate: &str) -> TaxBracket {
        TaxBracket {
            min_amount: dec(min),
            max_amount: dec(max),
            rate: dec(rate),
            fixed_amount: Decimal::ZERO,
        }
    }

    fn create_tiered_rule(brackets: Vec<TaxBracket>) -> TaxRule {
        TaxRule {
            id: "income_tax".to_string(),
            name: "Income Tax".to_string(),
            calculation_type: TaxCalculationType::Tiered,
            flat_rate: None,
            brackets,
            effective_from: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            effective_to: None,
            is_active: true,
            status: ApprovalStatus::Draft,
            audit: ConfigAudit::default(),
        }
    }

    #[test]
    fn test_valid_brackets_pass() {
        let rule = create_tiered_rule(vec![
            bracket("0", "5000", "0"),
            bracket("5000", "20000", "10"),
            bracket("20000", "0", "22.5"),
        ]);
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_overlapping_brackets_are_rejected() {
        let rule = create_tiered_rule(vec![bracket("0", "5000", "0"), bracket("4000", "0", "10")]);
        match rule.validate() {
            Err(EngineError::Validation { field, message }) => {
                assert_eq!(field, "brackets[1]");
                assert!(message.contains("overlaps"));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_unbounded_bracket_must_be_last() {
        let rule = create_tiered_rule(vec![bracket("0", "0", "0"), bracket("5000", "9000", "10")]);
        assert!(matches!(
            rule.validate(),
            Err(EngineError::Validation { ref field, .. }) if field == "brackets[0]"
        ));
    }

    #[test]
    fn test_max_must_exceed_min() {
        let rule = create_tiered_rule(vec![bracket("5000", "5000", "10")]);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_rate_over_100_is_rejected() {
        let rule = create_tiered_rule(vec![bracket("0", "0", "101")]);
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_progressive_without_brackets_is_rejected() {
        let rule = create_tiered_rule(vec![]);
        assert!(matches!(
            rule.validate(),
            Err(EngineError::Validation { ref field, .. }) if field == "brackets"
        ));
    }

    #[test]
    fn test_flat_requires_rate() {
        let mut rule = create_tiered_rule(vec![]);
        rule.calculation_type = TaxCalculationType::Flat;
        assert!(rule.validate().is_err());

        rule.flat_rate = Some(dec("15"));
        assert!(rule.validate().is_ok());
    }

    #[test]
    fn test_effective_window() {
        let mut rule = create_tiered_rule(vec![bracket("0", "0", "10")]);
        rule.effective_to = NaiveDate::from_ymd_opt(2026, 12, 31);

        assert!(!rule.is_effective_on(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()));
        assert!(rule.is_effective_on(NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()));
        assert!(!rule.is_effective_on(NaiveDate::from_ymd_opt(2027, 1, 1).unwrap()));
    }

    #[test]
    fn test_bracket_contains_is_upper_inclusive() {
        let b = bracket("5000", "20000", "10");
        assert!(!b.contains(dec("5000")));
        assert!(b.contains(dec("5000.01")));
        assert!(b.contains(dec("20000")));
        assert!(!b.contains(dec("20000.01")));
        assert!(bracket("20000", "0", "20").contains(dec("1000000")));
    }
}
