use chrono::{DateTime, NaiveDate, Utc};
use queen_of_hearts_shared::{ExpenseKind, ExpenseResponse, RecordExpenseRequest};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Expense {
    pub id: Uuid,
    pub game_id: Uuid,
    pub description: String,
    pub amount: Decimal,
    pub is_donation: bool,
    pub expense_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

const EXPENSE_COLUMNS: &str =
    "id, game_id, description, amount, is_donation, expense_date, created_at";

impl Expense {
    /// Record an expense or donation against a game
    pub async fn create(
        pool: &PgPool,
        game_id: Uuid,
        request: &RecordExpenseRequest,
    ) -> Result<Self, AppError> {
        let sql = format!(
            r#"
            INSERT INTO expenses (game_id, description, amount, is_donation, expense_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            EXPENSE_COLUMNS
        );

        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(game_id)
            .bind(&request.description)
            .bind(request.amount)
            .bind(request.is_donation)
            .bind(request.expense_date)
            .fetch_one(pool)
            .await?;

        Ok(expense)
    }

    /// Find expense by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, AppError> {
        let sql = format!("SELECT {} FROM expenses WHERE id = $1", EXPENSE_COLUMNS);

        let expense = sqlx::query_as::<_, Expense>(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(expense)
    }

    /// Find all expenses for a game in entry order
    pub async fn find_by_game(pool: &PgPool, game_id: Uuid) -> Result<Vec<Self>, AppError> {
        let sql = format!(
            "SELECT {} FROM expenses WHERE game_id = $1 ORDER BY expense_date, created_at",
            EXPENSE_COLUMNS
        );

        let expenses = sqlx::query_as::<_, Expense>(&sql)
            .bind(game_id)
            .fetch_all(pool)
            .await?;

        Ok(expenses)
    }

    /// Delete an expense entry
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub fn kind(&self) -> ExpenseKind {
        ExpenseKind::from_is_donation(self.is_donation)
    }

    /// Convert to response DTO
    pub fn to_response(&self) -> ExpenseResponse {
        ExpenseResponse {
            id: self.id,
            game_id: self.game_id,
            description: self.description.clone(),
            amount: self.amount,
            is_donation: self.is_donation,
            kind: self.kind(),
            expense_date: self.expense_date,
            created_at: self.created_at,
        }
    }
}
