//! Monetary helpers shared by the calculator and the payslip builder.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Number of decimal places in the currency minor unit.
pub const MONEY_SCALE: u32 = 2;

/// Rounds an amount to the currency minor unit (half away from zero).
///
/// # Example
///
/// ```
/// use payroll_engine::models::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("166.665").unwrap()), Decimal::from_str("166.67").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// A named monetary line (a bonus, a refund, an insurance premium, a tax).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayItem {
    /// Label shown on the payslip.
    pub name: String,
    /// The amount, always non-negative; the list it sits in gives the sign.
    pub amount: Decimal,
}

impl PayItem {
    /// Creates a pay item.
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount,
        }
    }
}

/// Sums the amounts of a list of pay items.
pub fn sum_items(items: &[PayItem]) -> Decimal {
    items.iter().map(|item| item.amount).sum()
}
