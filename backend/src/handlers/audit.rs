use actix_web::{web, HttpResponse, Result};
use queen_of_hearts_shared::{AuditOperation, AuditQueryParams};
use tracing::debug;
use validator::Validate;

use crate::audit::{AuditQuery, AuditReporter};
use crate::error::AppError;
use crate::utils::validation_errors_to_app_error;

/// Search the calculation audit log, newest entries first
pub async fn query_audit_log(
    query: web::Query<AuditQueryParams>,
    reporter: web::Data<AuditReporter>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(validation_errors_to_app_error)?;

    let operation = query
        .operation
        .as_deref()
        .map(parse_operation)
        .transpose()?;

    debug!("Querying audit log: {:?}", query);

    let entries = reporter.sink().query(&AuditQuery {
        operation,
        game_id: query.game_id,
        week_id: query.week_id,
        from: query.from,
        to: query.to,
        limit: query.limit,
    });

    Ok(HttpResponse::Ok().json(entries))
}

/// Export the full retained audit log in chronological order
pub async fn export_audit_log(
    reporter: web::Data<AuditReporter>,
) -> Result<HttpResponse, AppError> {
    let entries = reporter.sink().export();
    Ok(HttpResponse::Ok().json(entries))
}

fn parse_operation(value: &str) -> Result<AuditOperation, AppError> {
    match value {
        "ticket_sale_split" => Ok(AuditOperation::TicketSaleSplit),
        "week_ending_jackpot" => Ok(AuditOperation::WeekEndingJackpot),
        "displayed_jackpot" => Ok(AuditOperation::DisplayedJackpot),
        "game_jackpot_loss" => Ok(AuditOperation::GameJackpotLoss),
        "game_totals_reconciliation" => Ok(AuditOperation::GameTotalsReconciliation),
        "game_completion" => Ok(AuditOperation::GameCompletion),
        "totals_refresh" => Ok(AuditOperation::TotalsRefresh),
        _ => Err(AppError::Validation(format!(
            "Unknown audit operation: {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation_round_trips_names() {
        for operation in [
            AuditOperation::TicketSaleSplit,
            AuditOperation::WeekEndingJackpot,
            AuditOperation::DisplayedJackpot,
            AuditOperation::GameJackpotLoss,
            AuditOperation::GameTotalsReconciliation,
            AuditOperation::GameCompletion,
            AuditOperation::TotalsRefresh,
        ] {
            assert_eq!(parse_operation(operation.as_str()).unwrap(), operation);
        }
    }

    #[test]
    fn test_parse_operation_rejects_unknown() {
        assert!(parse_operation("card_shuffle").is_err());
    }
}
