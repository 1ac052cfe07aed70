use crate::constants::is_known_card;
use crate::types::*;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

// Game DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateGameRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,

    /// Percent of each sale kept by the organization. Falls back to the
    /// configured default when omitted.
    pub organization_percentage: Option<Decimal>,

    /// Percent of each sale contributed to the jackpot.
    pub jackpot_percentage: Option<Decimal>,

    pub ticket_price: Decimal,

    pub minimum_starting_jackpot: Option<Decimal>,

    /// Completed game whose unpaid jackpot balance seeds this one.
    pub predecessor_game_id: Option<Uuid>,

    pub start_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameResponse {
    pub id: Uuid,
    pub name: String,
    pub status: GameStatus,
    pub organization_percentage: Decimal,
    pub jackpot_percentage: Decimal,
    pub ticket_price: Decimal,
    pub carryover_jackpot: Decimal,
    pub minimum_starting_jackpot: Decimal,
    pub predecessor_game_id: Option<Uuid>,
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub total_donations: Decimal,
    pub total_payouts: Decimal,
    pub organization_net_profit: Decimal,
    pub jackpot_shortfall: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Game plus the presentation-only jackpot figure shown to players. The
/// displayed value applies the guaranteed minimum and is not the persisted
/// accumulator snapshot.
#[derive(Debug, Serialize, Deserialize)]
pub struct GameSummaryResponse {
    pub game: GameResponse,
    pub jackpot_contributions: Decimal,
    pub current_jackpot: Decimal,
    pub displayed_jackpot: Decimal,
    pub weeks_played: i64,
    pub current_week_number: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CompleteGameRequest {
    /// Defaults to today when omitted.
    pub end_date: Option<NaiveDate>,
}

// Week DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct CreateWeekRequest {
    /// Must equal the next contiguous number when supplied; assigned
    /// automatically when omitted.
    #[validate(range(min = 1))]
    pub week_number: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct DeclareWinnerRequest {
    #[validate(length(min = 1, max = 255))]
    pub winner_name: String,

    #[validate(custom = "validate_card_name")]
    pub card_selected: String,

    #[validate(range(min = 1, max = 54))]
    pub slot_chosen: i32,

    pub winner_present: bool,

    /// Explicit payout for the drawing. When omitted the configured card
    /// payout table supplies the amount (terminal card pays the pot).
    pub weekly_payout: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WeekResponse {
    pub id: Uuid,
    pub game_id: Uuid,
    pub week_number: i32,
    pub weekly_sales: Decimal,
    pub weekly_tickets_sold: i32,
    pub weekly_payout: Decimal,
    pub winner_name: Option<String>,
    pub card_selected: Option<String>,
    pub slot_chosen: Option<i32>,
    pub winner_present: Option<bool>,
    pub ending_jackpot: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Ticket sale DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordSaleRequest {
    pub week_id: Uuid,

    pub sale_date: NaiveDate,

    #[validate(range(min = 1))]
    pub tickets_sold: i32,

    /// Price snapshot; defaults to the game's ticket price.
    pub ticket_price: Option<Decimal>,
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct UpdateSaleRequest {
    #[validate(range(min = 1))]
    pub tickets_sold: Option<i32>,

    pub ticket_price: Option<Decimal>,

    pub sale_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TicketSaleResponse {
    pub id: Uuid,
    pub game_id: Uuid,
    pub week_id: Uuid,
    pub sale_date: NaiveDate,
    pub tickets_sold: i32,
    pub ticket_price: Decimal,
    pub amount_collected: Decimal,
    pub organization_total: Decimal,
    pub jackpot_total: Decimal,
    pub cumulative_collected: Decimal,
    pub ending_jackpot_total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Expense DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct RecordExpenseRequest {
    #[validate(length(min = 1, max = 500))]
    pub description: String,

    pub amount: Decimal,

    pub is_donation: bool,

    pub expense_date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExpenseResponse {
    pub id: Uuid,
    pub game_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub is_donation: bool,
    pub kind: ExpenseKind,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

// Audit DTOs
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct AuditQueryParams {
    pub operation: Option<String>,
    pub game_id: Option<Uuid>,
    pub week_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,

    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GameListParams {
    pub status: Option<GameStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_card_name(card: &str) -> Result<(), ValidationError> {
    if is_known_card(card) {
        Ok(())
    } else {
        Err(ValidationError::new("unknown_card"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_name_validation() {
        assert!(validate_card_name("Queen of Hearts").is_ok());
        assert!(validate_card_name("2 of Spades").is_ok());
        assert!(validate_card_name("Joker").is_ok());

        assert!(validate_card_name("Queen of hearts").is_err()); // Case matters
        assert!(validate_card_name("11 of Clubs").is_err());
        assert!(validate_card_name("").is_err());
    }

    #[test]
    fn test_declare_winner_request_validation() {
        let request = DeclareWinnerRequest {
            winner_name: "Pat Doyle".to_string(),
            card_selected: "Queen of Hearts".to_string(),
            slot_chosen: 17,
            winner_present: true,
            weekly_payout: None,
        };
        assert!(request.validate().is_ok());

        let bad_slot = DeclareWinnerRequest {
            slot_chosen: 55,
            ..request
        };
        assert!(bad_slot.validate().is_err());
    }
}
