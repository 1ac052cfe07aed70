use actix_web::{get, web, HttpResponse, Result};
use serde_json::json;

use crate::database::Database;

#[get("/health")]
pub async fn health_check(database: web::Data<Database>) -> Result<HttpResponse> {
    let db_health = database.health_check().await?;
    let status = if db_health.is_healthy {
        "healthy"
    } else {
        "degraded"
    };

    Ok(HttpResponse::Ok().json(json!({
        "status": status,
        "service": "queen-of-hearts-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "database": db_health,
    })))
}
