use actix_web::{web, HttpResponse, Result};
use queen_of_hearts_shared::constants::{
    is_known_card, is_terminal_card, PERCENTAGE_SUM, SETTING_CARD_PAYOUTS,
    SETTING_DEFAULT_JACKPOT_PERCENTAGE, SETTING_DEFAULT_MINIMUM_JACKPOT,
    SETTING_DEFAULT_ORGANIZATION_PERCENTAGE,
};
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::info;

use crate::database::Database;
use crate::error::AppError;
use crate::models::{GameSetting, GameSettings};

#[derive(Debug, serde::Deserialize)]
pub struct UpdateSettingRequest {
    pub value: serde_json::Value,
}

/// List every configuration row
pub async fn list_settings(database: web::Data<Database>) -> Result<HttpResponse, AppError> {
    let settings = GameSetting::get_all(database.pool()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// Update one of the known configuration keys
pub async fn update_setting(
    key: web::Path<String>,
    request: web::Json<UpdateSettingRequest>,
    database: web::Data<Database>,
) -> Result<HttpResponse, AppError> {
    let pool = database.pool();
    let value = request.into_inner().value;

    let setting = match key.as_str() {
        SETTING_DEFAULT_ORGANIZATION_PERCENTAGE => {
            let percentage = parse_percentage(&value)?;
            GameSettings::set_default_organization_percentage(pool, percentage).await?
        }
        SETTING_DEFAULT_JACKPOT_PERCENTAGE => {
            let percentage = parse_percentage(&value)?;
            GameSettings::set_default_jackpot_percentage(pool, percentage).await?
        }
        SETTING_DEFAULT_MINIMUM_JACKPOT => {
            let minimum = parse_decimal(&value)
                .ok_or_else(|| AppError::Validation("Value must be a decimal amount".to_string()))?;
            if minimum < Decimal::ZERO {
                return Err(AppError::Validation(
                    "Minimum jackpot cannot be negative".to_string(),
                ));
            }
            GameSettings::set_default_minimum_jackpot(pool, minimum).await?
        }
        SETTING_CARD_PAYOUTS => {
            let payouts = parse_card_payouts(value)?;
            GameSettings::set_card_payouts(pool, &payouts).await?
        }
        other => {
            return Err(AppError::NotFound(format!("Unknown setting: {}", other)));
        }
    };

    info!("Updated setting '{}'", setting.key);
    Ok(HttpResponse::Ok().json(setting))
}

fn parse_decimal(value: &serde_json::Value) -> Option<Decimal> {
    match value {
        serde_json::Value::String(s) => s.parse().ok(),
        serde_json::Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        _ => None,
    }
}

fn parse_percentage(value: &serde_json::Value) -> Result<Decimal, AppError> {
    let percentage = parse_decimal(value)
        .ok_or_else(|| AppError::Validation("Value must be a decimal percentage".to_string()))?;

    if percentage < Decimal::ZERO || percentage > PERCENTAGE_SUM {
        return Err(AppError::Validation(
            "Percentage must be between 0 and 100".to_string(),
        ));
    }

    Ok(percentage)
}

/// Payout table entries must name real non-terminal cards with non-negative
/// amounts; the terminal card always pays the pot and takes no table entry.
fn parse_card_payouts(value: serde_json::Value) -> Result<HashMap<String, Decimal>, AppError> {
    let payouts: HashMap<String, Decimal> = serde_json::from_value(value)
        .map_err(|_| AppError::Validation("Value must map card names to amounts".to_string()))?;

    for (card, amount) in &payouts {
        if !is_known_card(card) {
            return Err(AppError::Validation(format!("Unknown card: {}", card)));
        }
        if is_terminal_card(card) {
            return Err(AppError::Validation(
                "The terminal card always pays the full pot".to_string(),
            ));
        }
        if *amount < Decimal::ZERO {
            return Err(AppError::Validation(format!(
                "Payout for {} cannot be negative",
                card
            )));
        }
    }

    Ok(payouts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_decimal_accepts_strings_and_numbers() {
        assert_eq!(parse_decimal(&json!("42.50")), Some(Decimal::new(4250, 2)));
        assert_eq!(parse_decimal(&json!(60)), Some(Decimal::from(60)));
        assert_eq!(parse_decimal(&json!(null)), None);
        assert_eq!(parse_decimal(&json!({"nested": true})), None);
    }

    #[test]
    fn test_percentage_bounds() {
        assert!(parse_percentage(&json!(0)).is_ok());
        assert!(parse_percentage(&json!(100)).is_ok());
        assert!(parse_percentage(&json!(101)).is_err());
        assert!(parse_percentage(&json!(-1)).is_err());
        assert!(parse_percentage(&json!("not a number")).is_err());
    }

    #[test]
    fn test_card_payout_table_validation() {
        let valid = parse_card_payouts(json!({"Joker": 25, "Ace of Spades": "10.00"})).unwrap();
        assert_eq!(valid.get("Joker"), Some(&Decimal::from(25)));

        assert!(parse_card_payouts(json!({"11 of Clubs": 5})).is_err());
        assert!(parse_card_payouts(json!({"Queen of Hearts": 500})).is_err());
        assert!(parse_card_payouts(json!({"Joker": -5})).is_err());
        assert!(parse_card_payouts(json!("not a table")).is_err());
    }
}
