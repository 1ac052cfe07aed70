use actix_web::{web, HttpRequest, HttpResponse, Result};
use queen_of_hearts_shared::{RecordSaleRequest, UpdateSaleRequest};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::handlers::operator_from_request;
use crate::services::entry_service::EntryService;
use crate::utils::validation_errors_to_app_error;

/// Record a day's ticket sales
pub async fn record_sale(
    req: HttpRequest,
    game_id: web::Path<Uuid>,
    request: web::Json<RecordSaleRequest>,
    entry_service: web::Data<EntryService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let operator = operator_from_request(&req);
    let sale = entry_service
        .record_sale(*game_id, request.into_inner(), operator)
        .await?;

    info!("Recorded sale {} for game {}", sale.id, game_id);
    Ok(HttpResponse::Created().json(sale))
}

/// List a game's sale entries
pub async fn list_sales(
    game_id: web::Path<Uuid>,
    entry_service: web::Data<EntryService>,
) -> Result<HttpResponse, AppError> {
    debug!("Listing sales for game {}", game_id);

    let sales = entry_service.list_sales(*game_id).await?;
    Ok(HttpResponse::Ok().json(sales))
}

/// List the sale entries recorded under one week
pub async fn list_week_sales(
    path: web::Path<(Uuid, Uuid)>,
    entry_service: web::Data<EntryService>,
) -> Result<HttpResponse, AppError> {
    let (game_id, week_id) = path.into_inner();

    let sales = entry_service.list_week_sales(game_id, week_id).await?;
    Ok(HttpResponse::Ok().json(sales))
}

/// Correct a past sale entry
pub async fn update_sale(
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    request: web::Json<UpdateSaleRequest>,
    entry_service: web::Data<EntryService>,
) -> Result<HttpResponse, AppError> {
    request.validate().map_err(validation_errors_to_app_error)?;

    let (game_id, sale_id) = path.into_inner();
    let operator = operator_from_request(&req);

    let sale = entry_service
        .update_sale(game_id, sale_id, request.into_inner(), operator)
        .await?;

    info!("Updated sale {} for game {}", sale_id, game_id);
    Ok(HttpResponse::Ok().json(sale))
}

/// Remove a sale entry
pub async fn delete_sale(
    req: HttpRequest,
    path: web::Path<(Uuid, Uuid)>,
    entry_service: web::Data<EntryService>,
) -> Result<HttpResponse, AppError> {
    let (game_id, sale_id) = path.into_inner();
    let operator = operator_from_request(&req);

    entry_service.delete_sale(game_id, sale_id, operator).await?;

    info!("Deleted sale {} from game {}", sale_id, game_id);
    Ok(HttpResponse::NoContent().finish())
}
