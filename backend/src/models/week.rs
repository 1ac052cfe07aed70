use chrono::{DateTime, Utc};
use queen_of_hearts_shared::WeekResponse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Week {
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

/// Winner details persisted when a weekly drawing is recorded.
#[derive(Debug, Clone)]
pub struct WinnerRecord {
    pub winner_name: String,
    pub card_selected: String,
    pub slot_chosen: i32,
    pub winner_present: bool,
    pub weekly_payout: Decimal,
    pub ending_jackpot: Decimal,
}

const WEEK_COLUMNS: &str = r#"
    id, game_id, week_number, weekly_sales, weekly_tickets_sold, weekly_payout,
    winner_name, card_selected, slot_chosen, winner_present, ending_jackpot,
    created_at, updated_at
"#;

impl Week {
    /// Create a new week for a game
    pub async fn create(pool: &PgPool, game_id: Uuid, week_number: i32) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO weeks (game_id, week_number)
            VALUES ($1, $2)
            RETURNING {}
            "#,
            WEEK_COLUMNS
        );

        let week = sqlx::query_as::<_, Week>(&sql)
            .bind(game_id)
            .bind(week_number)
            .fetch_one(pool)
            .await?;

        Ok(week)
    }

    /// Find week by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM weeks WHERE id = $1", WEEK_COLUMNS);

        let week = sqlx::query_as::<_, Week>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(week)
    }

    /// Find all weeks for a game in week order
    pub async fn find_by_game(pool: &PgPool, game_id: Uuid) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM weeks WHERE game_id = $1 ORDER BY week_number",
            WEEK_COLUMNS
        );

        let weeks = sqlx::query_as::<_, Week>(&sql)
            .bind(game_id)
            .fetch_all(pool)
            .await?;

        Ok(weeks)
    }

    /// Find the latest week for a game, if any
    pub async fn find_latest(pool: &PgPool, game_id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM weeks WHERE game_id = $1 ORDER BY week_number DESC LIMIT 1",
            WEEK_COLUMNS
        );

        let week = sqlx::query_as::<_, Week>(&sql)
            .bind(game_id)
            .fetch_optional(pool)
            .await?;

        Ok(week)
    }

    /// Count weeks recorded for a game
    pub async fn count_by_game(pool: &PgPool, game_id: Uuid) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM weeks WHERE game_id = $1")
                .bind(game_id)
                .fetch_one(pool)
                .await?;

        Ok(count)
    }

    /// Rewrite a week's sales totals from its entries
    pub async fn update_totals(
        pool: &PgPool,
        id: Uuid,
        weekly_sales: Decimal,
        weekly_tickets_sold: i32,
    ) -> Result<(), AppError> {
        sqlx::query(
            "UPDATE weeks SET weekly_sales = $1, weekly_tickets_sold = $2, updated_at = NOW() WHERE id = $3",
        )
        .bind(weekly_sales)
        .bind(weekly_tickets_sold)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Record the weekly drawing result
    pub async fn declare_winner(
        pool: &PgPool,
        id: Uuid,
        record: &WinnerRecord,
    ) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            UPDATE weeks
            SET winner_name = $1, card_selected = $2, slot_chosen = $3,
                winner_present = $4, weekly_payout = $5, ending_jackpot = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            WEEK_COLUMNS
        );

        let week = sqlx::query_as::<_, Week>(&sql)
            .bind(&record.winner_name)
            .bind(&record.card_selected)
            .bind(record.slot_chosen)
            .bind(record.winner_present)
            .bind(record.weekly_payout)
            .bind(record.ending_jackpot)
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(week)
    }

    /// Rewrite a week's persisted ending jackpot snapshot
    pub async fn update_ending_jackpot(
        pool: &PgPool,
        id: Uuid,
        ending_jackpot: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE weeks SET ending_jackpot = $1, updated_at = NOW() WHERE id = $2")
            .bind(ending_jackpot)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Whether this week's drawing has been recorded
    pub fn has_drawing(&self) -> bool {
        self.card_selected.is_some()
    }

    /// Convert to response DTO
    pub fn to_response(&self) -> WeekResponse {
        WeekResponse {
            id: self.id,
            game_id: self.game_id,
            week_number: self.week_number,
            weekly_sales: self.weekly_sales,
            weekly_tickets_sold: self.weekly_tickets_sold,
            weekly_payout: self.weekly_payout,
            winner_name: self.winner_name.clone(),
            card_selected: self.card_selected.clone(),
            slot_chosen: self.slot_chosen,
            winner_present: self.winner_present,
            ending_jackpot: self.ending_jackpot,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
