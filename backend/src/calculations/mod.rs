//! Financial calculation engine for the Queen of Hearts game.
//!
//! Every function in this module is pure: entity slices in, results out.
//! Nothing here touches the database or the audit log. The services fetch
//! the data, run these calculators, and decide what to persist; the audit
//! reporter wraps the calls for the compliance trail.

use queen_of_hearts_shared::constants::CURRENCY_TOLERANCE;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::AppError;
use crate::models::Week;

pub mod jackpot;
pub mod reconcile;
pub mod shortfall;
pub mod split;

pub use jackpot::{
    displayed_jackpot, game_jackpot_balance, sale_snapshots, week_ending_jackpot,
    week_ending_snapshots, SaleSnapshot, WeekSnapshot,
};
pub use reconcile::validate_game_totals;
pub use shortfall::{game_jackpot_loss, JackpotLossReport, WeekBreakdown};
pub use split::validate_ticket_sale_split;

/// Outcome of a financial validation: errors block nothing by themselves,
/// they report; callers decide whether to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub values: BTreeMap<String, Decimal>,
}

impl CalculationResult {
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            values: BTreeMap::new(),
        }
    }

    /// Record an error and mark the result invalid
    pub fn push_error(&mut self, message: impl Into<String>) {
        self.is_valid = false;
        self.errors.push(message.into());
    }

    /// Record a non-fatal warning
    pub fn push_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Store a calculated value for display and reporting
    pub fn insert(&mut self, key: &str, value: Decimal) {
        self.values.insert(key.to_string(), value);
    }

    pub fn get(&self, key: &str) -> Option<Decimal> {
        self.values.get(key).copied()
    }
}

impl Default for CalculationResult {
    fn default() -> Self {
        Self::new()
    }
}

/// True when two currency amounts agree within the rounding tolerance.
pub fn within_tolerance(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() <= CURRENCY_TOLERANCE
}

/// Validate that a game's weeks are numbered contiguously from 1 with no
/// duplicates. Entity data crosses into the calculators through this check.
pub fn validate_week_sequence(weeks: &[Week]) -> Result<(), AppError> {
    let mut numbers: Vec<i32> = weeks.iter().map(|w| w.week_number).collect();
    numbers.sort_unstable();

    for (index, number) in numbers.iter().enumerate() {
        let expected = index as i32 + 1;
        if *number != expected {
            return Err(AppError::Validation(format!(
                "Week numbers must run contiguously from 1; found {} where {} was expected",
                number, expected
            )));
        }
    }

    Ok(())
}
