use chrono::Utc;
use queen_of_hearts_shared::{
    is_known_card, is_terminal_card, AuditOperation, CreateWeekRequest, DeclareWinnerRequest,
    GameStatus, WeekResponse,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::audit::AuditReporter;
use crate::calculations::week_ending_jackpot;
use crate::error::AppError;
use crate::models::{Game, GameSettings, TicketSale, Week, WinnerRecord};
use crate::services::entry_service::EntryService;
use crate::services::realtime_service::{RealtimeEvent, RealtimeService};

/// Weekly drawing service: opens consecutive weeks and records each
/// drawing's winner, card, and payout against the jackpot.
#[derive(Clone)]
pub struct WeekService {
    db_pool: PgPool,
    reporter: AuditReporter,
    realtime: RealtimeService,
    entry_service: EntryService,
}

impl WeekService {
    /// Create a new week service
    pub fn new(
        db_pool: PgPool,
        reporter: AuditReporter,
        realtime: RealtimeService,
        entry_service: EntryService,
    ) -> Self {
        Self {
            db_pool,
            reporter,
            realtime,
            entry_service,
        }
    }

    /// Open the next week of a game
    pub async fn create_week(
        &self,
        game_id: Uuid,
        request: CreateWeekRequest,
    ) -> Result<WeekResponse, AppError> {
        self.active_game(game_id).await?;

        let latest = Week::find_latest(&self.db_pool, game_id).await?;
        let next_number = latest.as_ref().map(|w| w.week_number + 1).unwrap_or(1);

        if let Some(requested) = request.week_number {
            if requested != next_number {
                return Err(AppError::Validation(format!(
                    "Week number must be {}, weeks are consecutive",
                    next_number
                )));
            }
        }

        if let Some(latest) = &latest {
            if !latest.has_drawing() {
                return Err(AppError::Conflict(format!(
                    "Week {} has no drawing yet",
                    latest.week_number
                )));
            }
        }

        let week = Week::create(&self.db_pool, game_id, next_number).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::WeekCreated {
                game_id,
                week_id: week.id,
                week_number: week.week_number,
                created_at: week.created_at,
            })
            .await;

        info!("Opened week {} for game {}", week.week_number, game_id);
        Ok(week.to_response())
    }

    /// List a game's weeks in play order
    pub async fn list_weeks(&self, game_id: Uuid) -> Result<Vec<WeekResponse>, AppError> {
        Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let weeks = Week::find_by_game(&self.db_pool, game_id).await?;
        Ok(weeks.iter().map(Week::to_response).collect())
    }

    /// Get a single week
    pub async fn get_week(&self, game_id: Uuid, week_id: Uuid) -> Result<WeekResponse, AppError> {
        let week = self.owned_week(game_id, week_id).await?;
        Ok(week.to_response())
    }

    /// Record a week's drawing. Declaring again on the same week replaces
    /// the earlier record, so a mis-entered drawing can be corrected.
    pub async fn declare_winner(
        &self,
        game_id: Uuid,
        week_id: Uuid,
        request: DeclareWinnerRequest,
        operator: Option<String>,
    ) -> Result<WeekResponse, AppError> {
        let game = self.active_game(game_id).await?;
        let week = self.owned_week(game_id, week_id).await?;

        if !is_known_card(&request.card_selected) {
            return Err(AppError::Validation(format!(
                "Unknown card: {}",
                request.card_selected
            )));
        }

        let (sales, weeks) = tokio::try_join!(
            TicketSale::find_by_game(&self.db_pool, game_id),
            Week::find_by_game(&self.db_pool, game_id),
        )?;

        if weeks
            .iter()
            .any(|w| w.id != week.id && w.slot_chosen == Some(request.slot_chosen))
        {
            return Err(AppError::Conflict(format!(
                "Slot {} was already opened in an earlier week",
                request.slot_chosen
            )));
        }

        let terminal = is_terminal_card(&request.card_selected);
        let weekly_payout = match request.weekly_payout {
            Some(payout) => payout,
            None => {
                self.default_payout(&game, &sales, &weeks, week.id, &request.card_selected)
                    .await?
            }
        };

        if weekly_payout < Decimal::ZERO {
            return Err(AppError::Validation(
                "Weekly payout cannot be negative".to_string(),
            ));
        }

        let ending_jackpot = self.reporter.record(
            AuditOperation::WeekEndingJackpot,
            Some(game_id),
            Some(week_id),
            operator.clone(),
            || week_ending_jackpot(game.carryover_jackpot, &sales, &weeks, week.id, weekly_payout),
        );

        let updated = Week::declare_winner(
            &self.db_pool,
            week_id,
            &WinnerRecord {
                winner_name: request.winner_name.clone(),
                card_selected: request.card_selected.clone(),
                slot_chosen: request.slot_chosen,
                winner_present: request.winner_present,
                weekly_payout,
                ending_jackpot,
            },
        )
        .await?;

        self.entry_service.refresh_ledger(game_id, operator).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::WinnerDeclared {
                game_id,
                week_id,
                week_number: updated.week_number,
                winner_name: request.winner_name,
                card_selected: request.card_selected.clone(),
                is_terminal: terminal,
                weekly_payout,
                ending_jackpot,
                declared_at: Utc::now(),
            })
            .await;

        info!(
            "Week {} drawing for game {}: {} pays {}, jackpot now {}",
            updated.week_number, game_id, request.card_selected, weekly_payout, ending_jackpot
        );

        Ok(updated.to_response())
    }

    // Private helper methods

    async fn active_game(&self, game_id: Uuid) -> Result<Game, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        if game.status != GameStatus::Active {
            return Err(AppError::Conflict(
                "Game is already completed".to_string(),
            ));
        }

        Ok(game)
    }

    async fn owned_week(&self, game_id: Uuid, week_id: Uuid) -> Result<Week, AppError> {
        let week = Week::find_by_id(&self.db_pool, week_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Week not found".to_string()))?;

        if week.game_id != game_id {
            return Err(AppError::NotFound(
                "Week does not belong to this game".to_string(),
            ));
        }

        Ok(week)
    }

    /// Terminal cards pay the whole pot; other cards pay the amount the
    /// payout table assigns them, or nothing when the table has no entry.
    async fn default_payout(
        &self,
        game: &Game,
        sales: &[TicketSale],
        weeks: &[Week],
        week_id: Uuid,
        card: &str,
    ) -> Result<Decimal, AppError> {
        if is_terminal_card(card) {
            return Ok(week_ending_jackpot(
                game.carryover_jackpot,
                sales,
                weeks,
                week_id,
                Decimal::ZERO,
            ));
        }

        let payouts = GameSettings::card_payouts(&self.db_pool).await?;
        Ok(payouts.get(card).copied().unwrap_or(Decimal::ZERO))
    }
}
