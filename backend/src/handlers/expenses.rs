use actix_web::{web, HttpRequest, HttpResponse, Result};
use queen_of_hearts_shared::RecordExpenseRequest;
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::operator_from_request;
use crate::services::game_service::GameService;
use crate::utils::validation_errors_to_app_error;

/// Record an expense or donation against a game
pub async fn record_expense(
    req: HttpRequest,
    game_id: web::Path<Uuid>,
    request: web::Json<RecordExpenseRequest>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let operator = operator_from_request(&req);
    let expense = game_service
        .record_expense(*game_id, request.into_inner(), operator)
        .await?;

    info!("Recorded expense {} for game {}", expense.id, game_id);
    Ok(HttpResponse::Created().json(expense))
}

/// List a game's expenses and donations
pub async fn list_expenses(
    game_id: web::Path<Uuid>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    debug!("Listing expenses for game {}", game_id);

    let expenses = game_service.list_expenses(*game_id).await?;
    Ok(HttpResponse::Ok().json(expenses))
}

/// Remove an expense entry
pub async fn delete_expense(
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    let (game_id, expense_id) = path.into_inner();
    let operator = operator_from_request(&req);

    game_service
        .delete_expense(game_id, expense_id, operator)
        .await?;

    info!("Deleted expense {} from game {}", expense_id, game_id);
    Ok(HttpResponse::NoContent().finish())
}
