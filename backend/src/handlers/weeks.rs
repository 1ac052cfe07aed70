use actix_web::{web, HttpRequest, HttpResponse, Result};
use queen_of_hearts_shared::{CreateWeekRequest, DeclareWinnerRequest};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::operator_from_request;
use crate::services::week_service::WeekService;
use crate::utils::validation_errors_to_app_error;

/// Open the next week of a game
pub async fn create_week(
    game_id: web::Path<Uuid>,
    request: web::Json<CreateWeekRequest>,
    week_service: web::Data<WeekService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let week = week_service
        .create_week(*game_id, request.into_inner())
        .await?;

    info!("Opened week {} for game {}", week.week_number, game_id);
    Ok(HttpResponse::Created().json(week))
}

/// List a game's weeks
pub async fn list_weeks(
    game_id: web::Path<Uuid>,
    week_service: web::Data<WeekService>,
) -> Result<HttpResponse, AppError> {
    debug!("Listing weeks for game {}", game_id);

    let weeks = week_service.list_weeks(*game_id).await?;
    Ok(HttpResponse::Ok().json(weeks))
}

/// Get a single week
pub async fn get_week(
    path: web::Path<(Uuid, Uuid)>,
    week_service: web::Data<WeekService>,
) -> Result<HttpResponse, AppError> {
    let (game_id, week_id) = path.into_inner();

    let week = week_service.get_week(game_id, week_id).await?;
    Ok(HttpResponse::Ok().json(week))
}

/// Record a week's drawing result
pub async fn declare_winner(
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    request: web::Json<DeclareWinnerRequest>,
    week_service: web::Data<WeekService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let (game_id, week_id) = path.into_inner();
    let operator = operator_from_request(&req);

    let week = week_service
        .declare_winner(game_id, week_id, request.into_inner(), operator)
        .await?;

    info!(
        "Declared winner for game {} week {}",
        game_id, week.week_number
    );
    Ok(HttpResponse::Ok().json(week))
}
