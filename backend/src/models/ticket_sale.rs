use chrono::{DateTime, NaiveDate, Utc};
use queen_of_hearts_shared::TicketSaleResponse;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

/// One entry of ticket sales. Split amounts and running totals are computed
/// snapshots, persisted so the ledger reads without recomputation.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TicketSale {
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

/// Resolved values for a new sale entry, computed by the split calculator.
#[derive(Debug, Clone)]
pub struct NewTicketSale {
    pub game_id: Uuid,
    pub week_id: Uuid,
    pub sale_date: NaiveDate,
    pub tickets_sold: i32,
    pub ticket_price: Decimal,
    pub amount_collected: Decimal,
    pub organization_total: Decimal,
    pub jackpot_total: Decimal,
}

const SALE_COLUMNS: &str = r#"
    id, game_id, week_id, sale_date, tickets_sold, ticket_price,
    amount_collected, organization_total, jackpot_total,
    cumulative_collected, ending_jackpot_total, created_at, updated_at
"#;

impl TicketSale {
    /// Create a new sale entry
    pub async fn create(pool: &PgPool, sale: &NewTicketSale) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO ticket_sales (
                game_id, week_id, sale_date, tickets_sold, ticket_price,
                amount_collected, organization_total, jackpot_total
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {}
            "#,
            SALE_COLUMNS
        );

        let created = sqlx::query_as::<_, TicketSale>(&sql)
            .bind(sale.game_id)
            .bind(sale.week_id)
            .bind(sale.sale_date)
            .bind(sale.tickets_sold)
            .bind(sale.ticket_price)
            .bind(sale.amount_collected)
            .bind(sale.organization_total)
            .bind(sale.jackpot_total)
            .fetch_one(pool)
            .await?;

        Ok(created)
    }

    /// Find sale by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM ticket_sales WHERE id = $1", SALE_COLUMNS);

        let sale = sqlx::query_as::<_, TicketSale>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(sale)
    }

    /// Find all sales for a game in entry order
    pub async fn find_by_game(pool: &PgPool, game_id: Uuid) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM ticket_sales WHERE game_id = $1 ORDER BY sale_date, created_at",
            SALE_COLUMNS
        );

        let sales = sqlx::query_as::<_, TicketSale>(&sql)
            .bind(game_id)
            .fetch_all(pool)
            .await?;

        Ok(sales)
    }

    /// Find all sales for a week in entry order
    pub async fn find_by_week(pool: &PgPool, week_id: Uuid) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM ticket_sales WHERE week_id = $1 ORDER BY sale_date, created_at",
            SALE_COLUMNS
        );

        let sales = sqlx::query_as::<_, TicketSale>(&sql)
            .bind(week_id)
            .fetch_all(pool)
            .await?;

        Ok(sales)
    }

    /// Rewrite an entry's recorded values after an edit
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        sale_date: NaiveDate,
        tickets_sold: i32,
        ticket_price: Decimal,
        amount_collected: Decimal,
        organization_total: Decimal,
        jackpot_total: Decimal,
    ) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            UPDATE ticket_sales
            SET sale_date = $1, tickets_sold = $2, ticket_price = $3,
                amount_collected = $4, organization_total = $5, jackpot_total = $6,
                updated_at = NOW()
            WHERE id = $7
            RETURNING {}
            "#,
            SALE_COLUMNS
        );

        let sale = sqlx::query_as::<_, TicketSale>(&sql)
            .bind(sale_date)
            .bind(tickets_sold)
            .bind(ticket_price)
            .bind(amount_collected)
            .bind(organization_total)
            .bind(jackpot_total)
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(sale)
    }

    /// Rewrite an entry's running-total snapshots during a history replay
    pub async fn update_snapshots(
        pool: &PgPool,
        id: Uuid,
        cumulative_collected: Decimal,
        ending_jackpot_total: Decimal,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE ticket_sales
            SET cumulative_collected = $1, ending_jackpot_total = $2, updated_at = NOW()
            WHERE id = $3
            "#,
        )
        .bind(cumulative_collected)
        .bind(ending_jackpot_total)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Delete a sale entry
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM ticket_sales WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sum of jackpot portions recorded for a game
    pub async fn jackpot_contributions(pool: &PgPool, game_id: Uuid) -> Result<Decimal, AppError> {
        let total = sqlx::query_scalar::<_, Option<Decimal>>(
            "SELECT SUM(jackpot_total) FROM ticket_sales WHERE game_id = $1",
        )
        .bind(game_id)
        .fetch_one(pool)
        .await?;

        Ok(total.unwrap_or(Decimal::ZERO))
    }

    /// Convert to response DTO
    pub fn to_response(&self) -> TicketSaleResponse {
        TicketSaleResponse {
            id: self.id,
            game_id: self.game_id,
            week_id: self.week_id,
            sale_date: self.sale_date,
            tickets_sold: self.tickets_sold,
            ticket_price: self.ticket_price,
            amount_collected: self.amount_collected,
            organization_total: self.organization_total,
            jackpot_total: self.jackpot_total,
            cumulative_collected: self.cumulative_collected,
            ending_jackpot_total: self.ending_jackpot_total,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
