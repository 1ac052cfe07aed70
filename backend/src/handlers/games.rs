use actix_web::{web, HttpRequest, HttpResponse, Result};
use queen_of_hearts_shared::{
    CompleteGameRequest, CreateGameRequest, GameListParams, GameStatus,
};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::operator_from_request;
use crate::services::game_service::GameService;
use crate::utils::validation_errors_to_app_error;

#[derive(Debug, serde::Deserialize, Validate)]
pub struct GameListQuery {
    pub status: Option<String>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
    #[validate(range(min = 0))]
    pub offset: Option<i64>,
}

/// Start a new game
pub async fn create_game(
    req: HttpRequest,
    request: web::Json<CreateGameRequest>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let operator = operator_from_request(&req);
    debug!("Creating game '{}'", request.name);

    let game = game_service
        .create_game(request.into_inner(), operator)
        .await?;

    info!("Created game {} ('{}')", game.id, game.name);
    Ok(HttpResponse::Created().json(game))
}

/// List games with optional status filter and pagination
pub async fn list_games(
    query: web::Query<GameListQuery>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(validation_errors_to_app_error)?;

    let status = if let Some(status_str) = &query.status {
        match status_str.as_str() {
            "active" => Some(GameStatus::Active),
            "completed" => Some(GameStatus::Completed),
            _ => return Err(AppError::Validation("Invalid status filter".to_string())),
        }
    } else {
        None
    };

    let results = game_service
        .list_games(GameListParams {
            status,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(HttpResponse::Ok().json(results))
}

/// Get game by ID
pub async fn get_game(
    game_id: web::Path<Uuid>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    debug!("Getting game {}", game_id);

    let game = game_service.get_game(*game_id).await?;
    Ok(HttpResponse::Ok().json(game))
}

/// Get a game's live financial summary
pub async fn game_summary(
    req: HttpRequest,
    game_id: web::Path<Uuid>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    let operator = operator_from_request(&req);
    let summary = game_service.game_summary(*game_id, operator).await?;

    Ok(HttpResponse::Ok().json(summary))
}

/// Get a game's week-by-week jackpot loss report
pub async fn jackpot_loss_report(
    req: HttpRequest,
    game_id: web::Path<Uuid>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    let operator = operator_from_request(&req);
    let report = game_service.jackpot_loss_report(*game_id, operator).await?;

    Ok(HttpResponse::Ok().json(report))
}

/// Close a game and settle its final totals
pub async fn complete_game(
    req: HttpRequest,
    game_id: web::Path<Uuid>,
    request: web::Json<CompleteGameRequest>,
    game_service: web::Data<GameService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let operator = operator_from_request(&req);
    let summary = game_service
        .complete_game(*game_id, request.into_inner(), operator)
        .await?;

    info!("Completed game {}", game_id);
    Ok(HttpResponse::Ok().json(summary))
}
