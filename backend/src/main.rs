use actix_cors::Cors;
use actix_web::{web, App, HttpServer, Result};
use std::sync::Arc;
use tracing::{info, Level};

use queen_of_hearts_backend::audit::{AuditReporter, MemoryAuditSink};
use queen_of_hearts_backend::config::AppConfig;
use queen_of_hearts_backend::database::{Database, DatabaseConfig};
use queen_of_hearts_backend::error::AppError;
use queen_of_hearts_backend::handlers;
use queen_of_hearts_backend::services::{EntryService, GameService, RealtimeService, WeekService};

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;
    info!(
        "Starting Queen of Hearts Backend on {}:{}",
        config.host, config.port
    );

    // Initialize database
    let db_config = DatabaseConfig::new(config.database_url.clone());
    let database = Database::new(&db_config).await?;

    // Run migrations
    database.migrate().await?;

    // Initialize the audit reporter with its in-memory sink
    let reporter = AuditReporter::new(Arc::new(MemoryAuditSink::default()));

    // Initialize services
    let realtime_service = RealtimeService::new();
    let game_service = GameService::new(
        database.pool().clone(),
        reporter.clone(),
        realtime_service.clone(),
    );
    let entry_service = EntryService::new(
        database.pool().clone(),
        reporter.clone(),
        realtime_service.clone(),
        game_service.clone(),
    );
    let week_service = WeekService::new(
        database.pool().clone(),
        reporter.clone(),
        realtime_service.clone(),
        entry_service.clone(),
    );

    let allowed_origin = config.allowed_origin.clone();

    // Start HTTP server
    HttpServer::new(move || {
        let cors = if allowed_origin == "*" {
            Cors::permissive()
        } else {
            Cors::default()
                .allowed_origin(&allowed_origin)
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allow_any_header()
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(database.clone()))
            .app_data(web::Data::new(reporter.clone()))
            .app_data(web::Data::new(realtime_service.clone()))
            .app_data(web::Data::new(game_service.clone()))
            .app_data(web::Data::new(entry_service.clone()))
            .app_data(web::Data::new(week_service.clone()))
            .service(
                web::scope("/api/v1")
                    .service(handlers::health::health_check)
                    .service(
                        web::scope("/games")
                            .route("", web::post().to(handlers::games::create_game))
                            .route("", web::get().to(handlers::games::list_games))
                            .route("/{game_id}", web::get().to(handlers::games::get_game))
                            .route("/{game_id}/summary", web::get().to(handlers::games::game_summary))
                            .route("/{game_id}/loss-report", web::get().to(handlers::games::jackpot_loss_report))
                            .route("/{game_id}/complete", web::post().to(handlers::games::complete_game))

                            // Weekly drawings
                            .route("/{game_id}/weeks", web::post().to(handlers::weeks::create_week))
                            .route("/{game_id}/weeks", web::get().to(handlers::weeks::list_weeks))
                            .route("/{game_id}/weeks/{week_id}", web::get().to(handlers::weeks::get_week))
                            .route("/{game_id}/weeks/{week_id}/winner", web::post().to(handlers::weeks::declare_winner))
                            .route("/{game_id}/weeks/{week_id}/sales", web::get().to(handlers::sales::list_week_sales))

                            // Ticket sale entries
                            .route("/{game_id}/sales", web::post().to(handlers::sales::record_sale))
                            .route("/{game_id}/sales", web::get().to(handlers::sales::list_sales))
                            .route("/{game_id}/sales/{sale_id}", web::put().to(handlers::sales::update_sale))
                            .route("/{game_id}/sales/{sale_id}", web::delete().to(handlers::sales::delete_sale))

                            // Expenses and donations
                            .route("/{game_id}/expenses", web::post().to(handlers::expenses::record_expense))
                            .route("/{game_id}/expenses", web::get().to(handlers::expenses::list_expenses))
                            .route("/{game_id}/expenses/{expense_id}", web::delete().to(handlers::expenses::delete_expense))
                    )
                    .service(
                        web::scope("/settings")
                            .route("", web::get().to(handlers::settings::list_settings))
                            .route("/{key}", web::put().to(handlers::settings::update_setting))
                    )
                    .service(
                        web::scope("/audit")
                            .route("", web::get().to(handlers::audit::query_audit_log))
                            .route("/export", web::get().to(handlers::audit::export_audit_log))
                    )
                    // WebSocket endpoints
                    .route("/ws", web::get().to(handlers::websocket::websocket_handler))
                    .route("/ws/stats", web::get().to(handlers::websocket::websocket_stats))
            )
    })
    .bind(format!("{}:{}", config.host, config.port))?
    .run()
    .await
    .map_err(AppError::from)
}
