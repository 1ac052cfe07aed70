use chrono::{DateTime, Utc};
use queen_of_hearts_shared::constants::{
    DEFAULT_JACKPOT_PERCENTAGE, DEFAULT_MINIMUM_STARTING_JACKPOT, DEFAULT_ORGANIZATION_PERCENTAGE,
    SETTING_CARD_PAYOUTS, SETTING_DEFAULT_JACKPOT_PERCENTAGE, SETTING_DEFAULT_MINIMUM_JACKPOT,
    SETTING_DEFAULT_ORGANIZATION_PERCENTAGE,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GameSetting {
    pub id: Uuid,
    pub key: String,
    pub value: serde_json::Value,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameSetting {
    /// Create or update a setting
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: serde_json::Value,
        description: Option<String>,
    ) -> Result<Self, AppError> {
        let setting = sqlx::query_as::<_, GameSetting>(
            r#"
            INSERT INTO game_settings (key, value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (key)
            DO UPDATE SET
                value = EXCLUDED.value,
                description = EXCLUDED.description,
                updated_at = NOW()
            RETURNING id, key, value, description, created_at, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .fetch_one(pool)
        .await?;

        Ok(setting)
    }

    /// Get a setting by key
    pub async fn get_by_key(pool: &PgPool, key: &str) -> Result<Option<Self>, AppError> {
        let setting = sqlx::query_as::<_, GameSetting>(
            "SELECT id, key, value, description, created_at, updated_at FROM game_settings WHERE key = $1",
        )
        .bind(key)
        .fetch_optional(pool)
        .await?;

        Ok(setting)
    }

    /// Get all settings
    pub async fn get_all(pool: &PgPool) -> Result<Vec<Self>, AppError> {
        let settings = sqlx::query_as::<_, GameSetting>(
            "SELECT id, key, value, description, created_at, updated_at FROM game_settings ORDER BY key",
        )
        .fetch_all(pool)
        .await?;

        Ok(settings)
    }

    /// Get setting value as decimal
    pub fn get_decimal_value(&self) -> Option<Decimal> {
        if let Some(s) = self.value.as_str() {
            s.parse().ok()
        } else if let Some(f) = self.value.as_f64() {
            Decimal::try_from(f).ok()
        } else {
            None
        }
    }
}

/// Helper struct for the settings this application reads
pub struct GameSettings;

impl GameSettings {
    /// Get the default organization percentage for new games
    pub async fn default_organization_percentage(pool: &PgPool) -> Result<Decimal, AppError> {
        let setting = GameSetting::get_by_key(pool, SETTING_DEFAULT_ORGANIZATION_PERCENTAGE).await?;
        Ok(setting
            .and_then(|s| s.get_decimal_value())
            .unwrap_or(DEFAULT_ORGANIZATION_PERCENTAGE))
    }

    /// Get the default jackpot percentage for new games
    pub async fn default_jackpot_percentage(pool: &PgPool) -> Result<Decimal, AppError> {
        let setting = GameSetting::get_by_key(pool, SETTING_DEFAULT_JACKPOT_PERCENTAGE).await?;
        Ok(setting
            .and_then(|s| s.get_decimal_value())
            .unwrap_or(DEFAULT_JACKPOT_PERCENTAGE))
    }

    /// Get the default guaranteed minimum jackpot for new games
    pub async fn default_minimum_jackpot(pool: &PgPool) -> Result<Decimal, AppError> {
        let setting = GameSetting::get_by_key(pool, SETTING_DEFAULT_MINIMUM_JACKPOT).await?;
        Ok(setting
            .and_then(|s| s.get_decimal_value())
            .unwrap_or(DEFAULT_MINIMUM_STARTING_JACKPOT))
    }

    /// Get the card payout table, mapping card name to fixed payout amount.
    /// Cards absent from the table pay nothing; the terminal card pays the pot.
    pub async fn card_payouts(pool: &PgPool) -> Result<HashMap<String, Decimal>, AppError> {
        let setting = GameSetting::get_by_key(pool, SETTING_CARD_PAYOUTS).await?;

        let mut payouts = HashMap::new();
        if let Some(setting) = setting {
            if let Some(table) = setting.value.as_object() {
                for (card, value) in table {
                    let amount = match value {
                        serde_json::Value::String(s) => s.parse().ok(),
                        serde_json::Value::Number(n) => {
                            n.as_f64().and_then(|f| Decimal::try_from(f).ok())
                        }
                        _ => None,
                    };
                    if let Some(amount) = amount {
                        payouts.insert(card.clone(), amount);
                    }
                }
            }
        }

        Ok(payouts)
    }

    /// Set the default organization percentage
    pub async fn set_default_organization_percentage(
        pool: &PgPool,
        percentage: Decimal,
    ) -> Result<GameSetting, AppError> {
        GameSetting::upsert(
            pool,
            SETTING_DEFAULT_ORGANIZATION_PERCENTAGE,
            serde_json::Value::String(percentage.to_string()),
            Some("Organization share of each sale for new games".to_string()),
        )
        .await
    }

    /// Set the default jackpot percentage
    pub async fn set_default_jackpot_percentage(
        pool: &PgPool,
        percentage: Decimal,
    ) -> Result<GameSetting, AppError> {
        GameSetting::upsert(
            pool,
            SETTING_DEFAULT_JACKPOT_PERCENTAGE,
            serde_json::Value::String(percentage.to_string()),
            Some("Jackpot share of each sale for new games".to_string()),
        )
        .await
    }

    /// Set the default guaranteed minimum jackpot
    pub async fn set_default_minimum_jackpot(
        pool: &PgPool,
        minimum: Decimal,
    ) -> Result<GameSetting, AppError> {
        GameSetting::upsert(
            pool,
            SETTING_DEFAULT_MINIMUM_JACKPOT,
            serde_json::Value::String(minimum.to_string()),
            Some("Guaranteed minimum jackpot for new games".to_string()),
        )
        .await
    }

    /// Set the card payout table
    pub async fn set_card_payouts(
        pool: &PgPool,
        payouts: &HashMap<String, Decimal>,
    ) -> Result<GameSetting, AppError> {
        let table: serde_json::Map<String, serde_json::Value> = payouts
            .iter()
            .map(|(card, amount)| (card.clone(), serde_json::Value::String(amount.to_string())))
            .collect();

        GameSetting::upsert(
            pool,
            SETTING_CARD_PAYOUTS,
            serde_json::Value::Object(table),
            Some("Fixed payout per non-terminal card drawn".to_string()),
        )
        .await
    }
}
