use chrono::{DateTime, NaiveDate, Utc};
use queen_of_hearts_shared::{CreateGameRequest, GameResponse, GameStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Game {
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

/// Running game-level totals rewritten after every entry mutation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTotals {
    pub total_sales: Decimal,
    pub total_expenses: Decimal,
    pub total_donations: Decimal,
    pub total_payouts: Decimal,
    pub organization_net_profit: Decimal,
}

const GAME_COLUMNS: &str = r#"
    id, name, status, organization_percentage, jackpot_percentage, ticket_price,
    carryover_jackpot, minimum_starting_jackpot, predecessor_game_id,
    total_sales, total_expenses, total_donations, total_payouts,
    organization_net_profit, jackpot_shortfall, start_date, end_date,
    created_at, updated_at
"#;

impl Game {
    /// Create a new game with resolved percentages and carryover
    pub async fn create(
        pool: &PgPool,
        request: &CreateGameRequest,
        organization_percentage: Decimal,
        jackpot_percentage: Decimal,
        minimum_starting_jackpot: Decimal,
        carryover_jackpot: Decimal,
    ) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO games (
                name, organization_percentage, jackpot_percentage, ticket_price,
                carryover_jackpot, minimum_starting_jackpot, predecessor_game_id, start_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            GAME_COLUMNS
        );

        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(&request.name)
            .bind(organization_percentage)
            .bind(jackpot_percentage)
            .bind(request.ticket_price)
            .bind(carryover_jackpot)
            .bind(minimum_starting_jackpot)
            .bind(request.predecessor_game_id)
            .bind(request.start_date)
            .fetch_one(pool)
            .await?;

        Ok(game)
    }

    /// Find game by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM games WHERE id = $1", GAME_COLUMNS);

        let game = sqlx::query_as::<_, Game>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(game)
    }

    /// Find the currently active game, if any
    pub async fn find_active(pool: &PgPool) -> Result<Option<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM games WHERE status = 'active' ORDER BY start_date DESC LIMIT 1",
            GAME_COLUMNS
        );

        let game = sqlx::query_as::<_, Game>(&sql).fetch_optional(pool).await?;

        Ok(game)
    }

    /// List games, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        status: Option<GameStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, AppError> {
        let games = match status {
            Some(status) => {
                let sql = format!(
                    "SELECT {} FROM games WHERE status = $1 ORDER BY start_date DESC LIMIT $2 OFFSET $3",
                    GAME_COLUMNS
                );
                sqlx::query_as::<_, Game>(&sql)
                    .bind(status)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                let sql = format!(
                    "SELECT {} FROM games ORDER BY start_date DESC LIMIT $1 OFFSET $2",
                    GAME_COLUMNS
                );
                sqlx::query_as::<_, Game>(&sql)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await?
            }
        };

        Ok(games)
    }

    /// Count games, optionally filtered by status
    pub async fn count(pool: &PgPool, status: Option<GameStatus>) -> Result<i64, AppError> {
        let count = match status {
            Some(status) => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games WHERE status = $1")
                    .bind(status)
                    .fetch_one(pool)
                    .await?
            }
            None => {
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM games")
                    .fetch_one(pool)
                    .await?
            }
        };

        Ok(count)
    }

    /// Rewrite the running totals for a game
    pub async fn update_totals(
        pool: &PgPool,
        id: Uuid,
        totals: &GameTotals,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE games
            SET total_sales = $1, total_expenses = $2, total_donations = $3,
                total_payouts = $4, organization_net_profit = $5, updated_at = NOW()
            WHERE id = $6
            "#,
        )
        .bind(totals.total_sales)
        .bind(totals.total_expenses)
        .bind(totals.total_donations)
        .bind(totals.total_payouts)
        .bind(totals.organization_net_profit)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Mark a game completed with its final shortfall and net profit
    pub async fn complete(
        pool: &PgPool,
        id: Uuid,
        end_date: NaiveDate,
        jackpot_shortfall: Decimal,
        organization_net_profit: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE games
            SET status = 'completed', end_date = $1, jackpot_shortfall = $2,
                organization_net_profit = $3, updated_at = NOW()
            WHERE id = $4
            "#,
        )
        .bind(end_date)
        .bind(jackpot_shortfall)
        .bind(organization_net_profit)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Convert to response DTO
    pub fn to_response(&self) -> GameResponse {
        GameResponse {
            id: self.id,
            name: self.name.clone(),
            status: self.status,
            organization_percentage: self.organization_percentage,
            jackpot_percentage: self.jackpot_percentage,
            ticket_price: self.ticket_price,
            carryover_jackpot: self.carryover_jackpot,
            minimum_starting_jackpot: self.minimum_starting_jackpot,
            predecessor_game_id: self.predecessor_game_id,
            total_sales: self.total_sales,
            total_expenses: self.total_expenses,
            total_donations: self.total_donations,
            total_payouts: self.total_payouts,
            organization_net_profit: self.organization_net_profit,
            jackpot_shortfall: self.jackpot_shortfall,
            start_date: self.start_date,
            end_date: self.end_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Unpaid jackpot balance carried into a successor game
    pub fn unclaimed_jackpot(&self, jackpot_contributions: Decimal) -> Decimal {
        let remaining = self.carryover_jackpot + jackpot_contributions - self.total_payouts;
        remaining.max(Decimal::ZERO)
    }
}
