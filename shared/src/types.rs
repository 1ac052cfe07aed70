use serde::{Deserialize, Serialize};
use std::fmt;

// Game-related enums
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "game_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GameStatus {
    Active,
    Completed,
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GameStatus::Active => write!(f, "active"),
            GameStatus::Completed => write!(f, "completed"),
        }
    }
}

// Calculation operations recorded by the audit reporter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOperation {
    TicketSaleSplit,
    WeekEndingJackpot,
    DisplayedJackpot,
    GameJackpotLoss,
    GameTotalsReconciliation,
    GameCompletion,
    TotalsRefresh,
}

impl AuditOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOperation::TicketSaleSplit => "ticket_sale_split",
            AuditOperation::WeekEndingJackpot => "week_ending_jackpot",
            AuditOperation::DisplayedJackpot => "displayed_jackpot",
            AuditOperation::GameJackpotLoss => "game_jackpot_loss",
            AuditOperation::GameTotalsReconciliation => "game_totals_reconciliation",
            AuditOperation::GameCompletion => "game_completion",
            AuditOperation::TotalsRefresh => "totals_refresh",
        }
    }
}

impl fmt::Display for AuditOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// Expense classification for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    Operating,
    Donation,
}

impl fmt::Display for ExpenseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseKind::Operating => write!(f, "operating"),
            ExpenseKind::Donation => write!(f, "donation"),
        }
    }
}

impl ExpenseKind {
    pub fn from_is_donation(is_donation: bool) -> Self {
        if is_donation {
            ExpenseKind::Donation
        } else {
            ExpenseKind::Operating
        }
    }
}
