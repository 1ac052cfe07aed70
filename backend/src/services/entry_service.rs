use chrono::Utc;
use queen_of_hearts_shared::{
    AuditOperation, GameStatus, RecordSaleRequest, TicketSaleResponse, UpdateSaleRequest,
};
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audit::AuditReporter;
use crate::calculations::{sale_snapshots, validate_ticket_sale_split, week_ending_snapshots};
use crate::error::AppError;
use crate::models::{Game, NewTicketSale, TicketSale, Week};
use crate::services::game_service::GameService;
use crate::services::realtime_service::{RealtimeEvent, RealtimeService};

/// Ticket sale entry service. Every mutation revalidates the split through
/// the audit reporter and then rebuilds the whole game ledger from history,
/// so edits to past entries can never leave stale running totals behind.
#[derive(Clone)]
pub struct EntryService {
    db_pool: PgPool,
    reporter: AuditReporter,
    realtime: RealtimeService,
    game_service: GameService,
}

impl EntryService {
    /// Create a new entry service
    pub fn new(
        db_pool: PgPool,
        reporter: AuditReporter,
        realtime: RealtimeService,
        game_service: GameService,
    ) -> Self {
        Self {
            db_pool,
            reporter,
            realtime,
            game_service,
        }
    }

    /// Record a day's ticket sales for a week
    pub async fn record_sale(
        &self,
        game_id: Uuid,
        request: RecordSaleRequest,
        operator: Option<String>,
    ) -> Result<TicketSaleResponse, AppError> {
        let game = self.active_game(game_id).await?;

        let week = Week::find_by_id(&self.db_pool, request.week_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;

        if week.game_id != game_id {
            return Err(AppError::NotFound(
                "Week does not belong to this game".to_string(),
            ));
        }

        let ticket_price = request.ticket_price.unwrap_or(game.ticket_price);

        let result = self.reporter.record_validated(
            AuditOperation::TicketSaleSplit,
            Some(game_id),
            Some(week.id),
            operator.clone(),
            || {
                validate_ticket_sale_split(
                    request.tickets_sold,
                    ticket_price,
                    game.organization_percentage,
                    game.jackpot_percentage,
                )
            },
        );

        if !result.is_valid {
            return Err(AppError::Validation(result.errors.join("; ")));
        }
        for warning in &result.warnings {
            warn!("Sale entry warning for game {}: {}", game_id, warning);
        }

        let created = TicketSale::create(
            &self.db_pool,
            &NewTicketSale {
                game_id,
                week_id: week.id,
                sale_date: request.sale_date,
                tickets_sold: request.tickets_sold,
                ticket_price,
                amount_collected: result.get("amount_collected").unwrap_or_default(),
                organization_total: result.get("organization_total").unwrap_or_default(),
                jackpot_total: result.get("jackpot_total").unwrap_or_default(),
            },
        )
        .await?;

        self.refresh_ledger(game_id, operator).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::SaleRecorded {
                game_id,
                week_id: week.id,
                sale_id: created.id,
                amount_collected: created.amount_collected,
                recorded_at: created.created_at,
            })
            .await;

        info!(
            "Recorded sale of {} tickets ({}) for game {} week {}",
            created.tickets_sold, created.amount_collected, game_id, week.week_number
        );

        self.fresh_response(created.id).await
    }

    /// Correct a past sale entry
    pub async fn update_sale(
        &self,
        game_id: Uuid,
        sale_id: Uuid,
        request: UpdateSaleRequest,
        operator: Option<String>,
    ) -> Result<TicketSaleResponse, AppError> {
        let game = self.active_game(game_id).await?;
        let sale = self.owned_sale(game_id, sale_id).await?;

        let tickets_sold = request.tickets_sold.unwrap_or(sale.tickets_sold);
        let ticket_price = request.ticket_price.unwrap_or(sale.ticket_price);
        let sale_date = request.sale_date.unwrap_or(sale.sale_date);

        let result = self.reporter.record_validated(
            AuditOperation::TicketSaleSplit,
            Some(game_id),
            Some(sale.week_id),
            operator.clone(),
            || {
                validate_ticket_sale_split(
                    tickets_sold,
                    ticket_price,
                    game.organization_percentage,
                    game.jackpot_percentage,
                )
            },
        );

        if !result.is_valid {
            return Err(AppError::Validation(result.errors.join("; ")));
        }
        for warning in &result.warnings {
            warn!("Sale correction warning for game {}: {}", game_id, warning);
        }

        let updated = TicketSale::update(
            &self.db_pool,
            sale_id,
            sale_date,
            tickets_sold,
            ticket_price,
            result.get("amount_collected").unwrap_or_default(),
            result.get("organization_total").unwrap_or_default(),
            result.get("jackpot_total").unwrap_or_default(),
        )
        .await?;

        self.refresh_ledger(game_id, operator).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::SaleUpdated {
                game_id,
                week_id: updated.week_id,
                sale_id,
                amount_collected: updated.amount_collected,
                updated_at: Utc::now(),
            })
            .await;

        info!("Corrected sale {} for game {}", sale_id, game_id);

        self.fresh_response(sale_id).await
    }

    /// Remove a sale entry and rebuild the ledger without it
    pub async fn delete_sale(
        &self,
        game_id: Uuid,
        sale_id: Uuid,
        operator: Option<String>,
    ) -> Result<(), AppError> {
        self.active_game(game_id).await?;
        self.owned_sale(game_id, sale_id).await?;

        TicketSale::delete(&self.db_pool, sale_id).await?;
        self.refresh_ledger(game_id, operator).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::SaleDeleted {
                game_id,
                sale_id,
                deleted_at: Utc::now(),
            })
            .await;

        info!("Deleted sale {} from game {}", sale_id, game_id);
        Ok(())
    }

    /// List a game's sale entries in ledger order
    pub async fn list_sales(&self, game_id: Uuid) -> Result<Vec<TicketSaleResponse>, AppError> {
        Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let sales = TicketSale::find_by_game(&self.db_pool, game_id).await?;
        Ok(sales.iter().map(TicketSale::to_response).collect())
    }

    /// List the sale entries recorded under one week
    pub async fn list_week_sales(
        &self,
        game_id: Uuid,
        week_id: Uuid,
    ) -> Result<Vec<TicketSaleResponse>, AppError> {
        let week = Week::find_by_id(&self.db_pool, week_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;

        if week.game_id != game_id {
            return Err(AppError::NotFound(
                "Week does not belong to this game".to_string(),
            ));
        }

        let sales = TicketSale::find_by_week(&self.db_pool, week_id).await?;
        Ok(sales.iter().map(TicketSale::to_response).collect())
    }

    /// Rebuild every derived figure for a game from its entry history:
    /// per-week sales totals, per-entry running snapshots, then the
    /// game-level totals. Last full recompute wins.
    pub async fn refresh_ledger(
        &self,
        game_id: Uuid,
        operator: Option<String>,
    ) -> Result<(), AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let (sales, weeks) = tokio::try_join!(
            TicketSale::find_by_game(&self.db_pool, game_id),
            Week::find_by_game(&self.db_pool, game_id),
        )?;

        for week in &weeks {
            let weekly_sales = sales
                .iter()
                .filter(|s| s.week_id == week.id)
                .map(|s| s.amount_collected)
                .sum();
            let weekly_tickets_sold = sales
                .iter()
                .filter(|s| s.week_id == week.id)
                .map(|s| s.tickets_sold)
                .sum();

            Week::update_totals(&self.db_pool, week.id, weekly_sales, weekly_tickets_sold).await?;
        }

        for snapshot in week_ending_snapshots(game.carryover_jackpot, &sales, &weeks) {
            Week::update_ending_jackpot(&self.db_pool, snapshot.week_id, snapshot.ending_jackpot)
                .await?;
        }

        for snapshot in sale_snapshots(game.carryover_jackpot, &sales, &weeks) {
            TicketSale::update_snapshots(
                &self.db_pool,
                snapshot.sale_id,
                snapshot.cumulative_collected,
                snapshot.ending_jackpot_total,
            )
            .await?;
        }

        self.game_service.refresh_totals(game_id, operator).await?;

        debug!("Rebuilt ledger for game {}", game_id);
        Ok(())
    }

    // Private helper methods

    async fn active_game(&self, game_id: Uuid) -> Result<Game, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        if game.status != GameStatus::Active {
            return Err(AppError::Conflict(
                "Cannot edit entries on a completed game".to_string(),
            ));
        }

        Ok(game)
    }

    async fn owned_sale(&self, game_id: Uuid, sale_id: Uuid) -> Result<TicketSale, AppError> {
        let sale = TicketSale::find_by_id(&self.db_pool, sale_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale entry not found".to_string()))?;

        if sale.game_id != game_id {
            return Err(AppError::NotFound(
                "Sale entry does not belong to this game".to_string(),
            ));
        }

        Ok(sale)
    }

    async fn fresh_response(&self, sale_id: Uuid) -> Result<TicketSaleResponse, AppError> {
        let sale = TicketSale::find_by_id(&self.db_pool, sale_id)
            .await?
            .ok_or_else(|| AppError::Internal("Sale entry disappeared".to_string()))?;

        Ok(sale.to_response())
    }
}
