use chrono::Utc;
use queen_of_hearts_shared::constants::{ERROR_PERCENTAGES_MUST_SUM, PERCENTAGE_SUM};
use queen_of_hearts_shared::{
    AuditOperation, CompleteGameRequest, CreateGameRequest, ExpenseResponse, GameListParams,
    GameResponse, GameStatus, GameSummaryResponse, PaginatedResponse, RecordExpenseRequest,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audit::AuditReporter;
use crate::calculations::{
    self, displayed_jackpot, game_jackpot_balance, game_jackpot_loss, validate_game_totals,
    CalculationResult, JackpotLossReport,
};
use crate::error::AppError;
use crate::models::{Expense, Game, GameSettings, GameTotals, Pagination, TicketSale, Week};
use crate::services::realtime_service::{RealtimeEvent, RealtimeService};

/// Game lifecycle service: creation with carryover seeding, summaries,
/// expense tracking, totals refresh, and end-of-game settlement.
#[derive(Clone)]
pub struct GameService {
    db_pool: PgPool,
    reporter: AuditReporter,
    realtime: RealtimeService,
}

/// Everything settled when a game completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameCompletionSummary {
    pub game: GameResponse,
    pub loss_report: JackpotLossReport,
    pub reconciliation: CalculationResult,
}

impl GameService {
    /// Create a new game service
    pub fn new(db_pool: PgPool, reporter: AuditReporter, realtime: RealtimeService) -> Self {
        Self {
            db_pool,
            reporter,
            realtime,
        }
    }

    /// Create a new game, seeding its carryover from a completed predecessor
    pub async fn create_game(
        &self,
        request: CreateGameRequest,
        _operator: Option<String>,
    ) -> Result<GameResponse, AppError> {
        if let Some(active) = Game::find_active(&self.db_pool).await? {
            return Err(AppError::Conflict(format!(
                "Game '{}' is still active",
                active.name
            )));
        }

        let (default_org, default_jackpot, default_minimum) = tokio::try_join!(
            GameSettings::default_organization_percentage(&self.db_pool),
            GameSettings::default_jackpot_percentage(&self.db_pool),
            GameSettings::default_minimum_jackpot(&self.db_pool),
        )?;

        let organization_percentage = request.organization_percentage.unwrap_or(default_org);
        let jackpot_percentage = request.jackpot_percentage.unwrap_or(default_jackpot);
        let minimum_starting_jackpot = request.minimum_starting_jackpot.unwrap_or(default_minimum);

        validate_game_parameters(
            organization_percentage,
            jackpot_percentage,
            request.ticket_price,
            minimum_starting_jackpot,
        )?;

        let carryover_jackpot = match request.predecessor_game_id {
            Some(predecessor_id) => self.predecessor_carryover(predecessor_id).await?,
            None => Decimal::ZERO,
        };

        let game = Game::create(
            &self.db_pool,
            &request,
            organization_percentage,
            jackpot_percentage,
            minimum_starting_jackpot,
            carryover_jackpot,
        )
        .await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::GameCreated {
                game_id: game.id,
                name: game.name.clone(),
                created_at: game.created_at,
            })
            .await;

        info!(
            "Created game {} '{}' with carryover {}",
            game.id, game.name, carryover_jackpot
        );

        Ok(game.to_response())
    }

    /// Get game by ID
    pub async fn get_game(&self, game_id: Uuid) -> Result<GameResponse, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        Ok(game.to_response())
    }

    /// List games, newest first
    pub async fn list_games(
        &self,
        params: GameListParams,
    ) -> Result<PaginatedResponse<GameResponse>, AppError> {
        let page = Pagination::new(params.limit, params.offset);

        let (games, total) = tokio::try_join!(
            Game::list(&self.db_pool, params.status, page.limit, page.offset),
            Game::count(&self.db_pool, params.status),
        )?;

        let data: Vec<GameResponse> = games.iter().map(Game::to_response).collect();
        let has_more = page.offset + (data.len() as i64) < total;

        Ok(PaginatedResponse {
            data,
            total,
            limit: page.limit,
            offset: page.offset,
            has_more,
        })
    }

    /// Game state plus the jackpot figures a viewer should see
    pub async fn game_summary(
        &self,
        game_id: Uuid,
        operator: Option<String>,
    ) -> Result<GameSummaryResponse, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let (sales, weeks) = tokio::try_join!(
            TicketSale::find_by_game(&self.db_pool, game_id),
            Week::find_by_game(&self.db_pool, game_id),
        )?;

        let jackpot_contributions: Decimal = sales.iter().map(|s| s.jackpot_total).sum();
        let current_jackpot = game_jackpot_balance(game.carryover_jackpot, &sales, &weeks);

        let displayed = self.reporter.record(
            AuditOperation::DisplayedJackpot,
            Some(game_id),
            None,
            operator,
            || {
                displayed_jackpot(
                    jackpot_contributions,
                    game.minimum_starting_jackpot,
                    game.carryover_jackpot,
                )
            },
        );

        let weeks_played = weeks.iter().filter(|w| w.has_drawing()).count() as i64;
        let current_week_number = weeks.last().map(|w| w.week_number);

        debug!(
            "Summary for game {}: contributions {}, displayed {}",
            game_id, jackpot_contributions, displayed
        );

        Ok(GameSummaryResponse {
            game: game.to_response(),
            jackpot_contributions,
            current_jackpot,
            displayed_jackpot: displayed,
            weeks_played,
            current_week_number,
        })
    }

    /// Quantify minimum-guarantee exposure without mutating anything
    pub async fn jackpot_loss_report(
        &self,
        game_id: Uuid,
        operator: Option<String>,
    ) -> Result<JackpotLossReport, AppError> {
        let span = self.reporter.begin(
            AuditOperation::GameJackpotLoss,
            Some(game_id),
            None,
            operator,
        );

        match self.jackpot_loss_inner(game_id).await {
            Ok(report) => {
                span.complete(serde_json::to_value(&report).unwrap_or_default());
                Ok(report)
            }
            Err(e) => {
                span.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// Settle a game: resolve the shortfall, reconcile the ledger, and mark
    /// it completed
    pub async fn complete_game(
        &self,
        game_id: Uuid,
        request: CompleteGameRequest,
        operator: Option<String>,
    ) -> Result<GameCompletionSummary, AppError> {
        let span = self.reporter.begin(
            AuditOperation::GameCompletion,
            Some(game_id),
            None,
            operator.clone(),
        );

        match self.complete_game_inner(game_id, request, operator).await {
            Ok(summary) => {
                span.complete(json!({
                    "total_jackpot_loss": summary.loss_report.total_jackpot_loss,
                    "organization_net_profit": summary.game.organization_net_profit,
                    "end_date": summary.game.end_date,
                }));
                Ok(summary)
            }
            Err(e) => {
                span.fail(&e.to_string());
                Err(e)
            }
        }
    }

    /// Record an expense or donation against an active game
    pub async fn record_expense(
        &self,
        game_id: Uuid,
        request: RecordExpenseRequest,
        operator: Option<String>,
    ) -> Result<ExpenseResponse, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        if game.status != GameStatus::Active {
            return Err(AppError::Conflict(
                "Cannot record expenses on a completed game".to_string(),
            ));
        }

        if request.amount <= Decimal::ZERO {
            return Err(AppError::Validation(
                "Expense amount must be greater than zero".to_string(),
            ));
        }

        let expense = Expense::create(&self.db_pool, game_id, &request).await?;

        self.refresh_totals(game_id, operator).await?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::ExpenseRecorded {
                game_id,
                expense_id: expense.id,
                amount: expense.amount,
                is_donation: expense.is_donation,
                recorded_at: expense.created_at,
            })
            .await;

        info!(
            "Recorded {} {} for game {}",
            if expense.is_donation { "donation" } else { "expense" },
            expense.amount,
            game_id
        );

        Ok(expense.to_response())
    }

    /// List a game's expenses and donations
    pub async fn list_expenses(&self, game_id: Uuid) -> Result<Vec<ExpenseResponse>, AppError> {
        Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let expenses = Expense::find_by_game(&self.db_pool, game_id).await?;
        Ok(expenses.iter().map(Expense::to_response).collect())
    }

    /// Delete an expense entry and rebuild the game's totals
    pub async fn delete_expense(
        &self,
        game_id: Uuid,
        expense_id: Uuid,
        operator: Option<String>,
    ) -> Result<(), AppError> {
        let expense = Expense::find_by_id(&self.db_pool, expense_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Expense not found".to_string()))?;

        if expense.game_id != game_id {
            return Err(AppError::NotFound(
                "Expense does not belong to this game".to_string(),
            ));
        }

        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        if game.status != GameStatus::Active {
            return Err(AppError::Conflict(
                "Cannot edit expenses on a completed game".to_string(),
            ));
        }

        Expense::delete(&self.db_pool, expense_id).await?;
        self.refresh_totals(game_id, operator).await?;

        info!("Deleted expense {} from game {}", expense_id, game_id);
        Ok(())
    }

    /// Rebuild a game's running totals from its full entry history.
    ///
    /// Always rewrites, even when the ledger is transiently inconsistent
    /// mid-edit; the reconciliation entry in the audit log records any
    /// problems, and completion is the strict gate.
    pub async fn refresh_totals(
        &self,
        game_id: Uuid,
        operator: Option<String>,
    ) -> Result<GameTotals, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let (sales, expenses, weeks) = tokio::try_join!(
            TicketSale::find_by_game(&self.db_pool, game_id),
            Expense::find_by_game(&self.db_pool, game_id),
            Week::find_by_game(&self.db_pool, game_id),
        )?;

        let result = self.reporter.record_validated(
            AuditOperation::TotalsRefresh,
            Some(game_id),
            None,
            operator.clone(),
            || validate_game_totals(game.carryover_jackpot, &sales, &expenses, &weeks),
        );

        let totals = totals_from_result(&result);
        Game::update_totals(&self.db_pool, game_id, &totals).await?;

        // Viewers track the jackpot reactively: push the recomputed figures
        // with every refresh.
        let jackpot_contributions: Decimal = sales.iter().map(|s| s.jackpot_total).sum();
        let current_jackpot = game_jackpot_balance(game.carryover_jackpot, &sales, &weeks);
        let displayed = self.reporter.record(
            AuditOperation::DisplayedJackpot,
            Some(game_id),
            None,
            operator,
            || {
                displayed_jackpot(
                    jackpot_contributions,
                    game.minimum_starting_jackpot,
                    game.carryover_jackpot,
                )
            },
        );

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::JackpotUpdated {
                game_id,
                jackpot_contributions,
                current_jackpot,
                displayed_jackpot: displayed,
                updated_at: Utc::now(),
            })
            .await;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::TotalsRefreshed {
                game_id,
                total_sales: totals.total_sales,
                organization_net_profit: totals.organization_net_profit,
                refreshed_at: Utc::now(),
            })
            .await;

        debug!("Refreshed totals for game {}", game_id);
        Ok(totals)
    }

    // Private helper methods

    async fn predecessor_carryover(&self, predecessor_id: Uuid) -> Result<Decimal, AppError> {
        let predecessor = Game::find_by_id(&self.db_pool, predecessor_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Predecessor game not found".to_string()))?;

        if predecessor.status != GameStatus::Completed {
            return Err(AppError::Validation(
                "Predecessor game is not completed".to_string(),
            ));
        }

        let contributions = TicketSale::jackpot_contributions(&self.db_pool, predecessor_id).await?;
        Ok(predecessor.unclaimed_jackpot(contributions))
    }

    async fn jackpot_loss_inner(&self, game_id: Uuid) -> Result<JackpotLossReport, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        let (weeks, sales) = tokio::try_join!(
            Week::find_by_game(&self.db_pool, game_id),
            TicketSale::find_by_game(&self.db_pool, game_id),
        )?;

        calculations::validate_week_sequence(&weeks)?;

        Ok(game_jackpot_loss(
            game.carryover_jackpot,
            &weeks,
            &sales,
            game.minimum_starting_jackpot,
        ))
    }

    async fn complete_game_inner(
        &self,
        game_id: Uuid,
        request: CompleteGameRequest,
        operator: Option<String>,
    ) -> Result<GameCompletionSummary, AppError> {
        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

        if game.status != GameStatus::Active {
            return Err(AppError::Conflict("Game is already completed".to_string()));
        }

        let (weeks, sales, expenses) = tokio::try_join!(
            Week::find_by_game(&self.db_pool, game_id),
            TicketSale::find_by_game(&self.db_pool, game_id),
            Expense::find_by_game(&self.db_pool, game_id),
        )?;

        calculations::validate_week_sequence(&weeks)?;

        let loss_report = self.reporter.record(
            AuditOperation::GameJackpotLoss,
            Some(game_id),
            None,
            operator.clone(),
            || {
                game_jackpot_loss(
                    game.carryover_jackpot,
                    &weeks,
                    &sales,
                    game.minimum_starting_jackpot,
                )
            },
        );

        let reconciliation = self.reporter.record_validated(
            AuditOperation::GameTotalsReconciliation,
            Some(game_id),
            None,
            operator,
            || validate_game_totals(game.carryover_jackpot, &sales, &expenses, &weeks),
        );

        if !reconciliation.is_valid {
            return Err(AppError::Validation(reconciliation.errors.join("; ")));
        }

        let totals = totals_from_result(&reconciliation);
        Game::update_totals(&self.db_pool, game_id, &totals).await?;

        // Shortfall coverage is a distinct ledger line: it reduces the final
        // net profit but is not folded into weekly payouts.
        let end_date = request.end_date.unwrap_or_else(|| Utc::now().date_naive());
        let final_net_profit =
            totals.organization_net_profit - loss_report.total_jackpot_loss;

        Game::complete(
            &self.db_pool,
            game_id,
            end_date,
            loss_report.total_jackpot_loss,
            final_net_profit,
        )
        .await?;

        let game = Game::find_by_id(&self.db_pool, game_id)
            .await?
            .ok_or_else(|| AppError::Internal("Game disappeared during completion".to_string()))?;

        let _ = self
            .realtime
            .broadcast_event(RealtimeEvent::GameCompleted {
                game_id,
                total_jackpot_loss: loss_report.total_jackpot_loss,
                organization_net_profit: final_net_profit,
                completed_at: Utc::now(),
            })
            .await;

        info!(
            "Completed game {} with jackpot loss {} and net profit {}",
            game_id, loss_report.total_jackpot_loss, final_net_profit
        );

        Ok(GameCompletionSummary {
            game: game.to_response(),
            loss_report,
            reconciliation,
        })
    }
}

fn validate_game_parameters(
    organization_percentage: Decimal,
    jackpot_percentage: Decimal,
    ticket_price: Decimal,
    minimum_starting_jackpot: Decimal,
) -> Result<(), AppError> {
    for (label, percentage) in [
        ("Organization", organization_percentage),
        ("Jackpot", jackpot_percentage),
    ] {
        if percentage < Decimal::ZERO || percentage > PERCENTAGE_SUM {
            return Err(AppError::Validation(format!(
                "{} percentage must be between 0 and 100",
                label
            )));
        }
    }

    if !calculations::within_tolerance(organization_percentage + jackpot_percentage, PERCENTAGE_SUM)
    {
        return Err(AppError::Validation(ERROR_PERCENTAGES_MUST_SUM.to_string()));
    }

    if ticket_price <= Decimal::ZERO {
        return Err(AppError::Validation(
            "Ticket price must be greater than zero".to_string(),
        ));
    }

    if minimum_starting_jackpot < Decimal::ZERO {
        return Err(AppError::Validation(
            "Minimum starting jackpot cannot be negative".to_string(),
        ));
    }

    Ok(())
}

fn totals_from_result(result: &CalculationResult) -> GameTotals {
    GameTotals {
        total_sales: result.get("total_sales").unwrap_or_default(),
        total_expenses: result.get("total_expenses").unwrap_or_default(),
        total_donations: result.get("total_donations").unwrap_or_default(),
        total_payouts: result.get("total_payouts").unwrap_or_default(),
        organization_net_profit: result.get("organization_net_profit").unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_split_parameters_are_accepted() {
        let result = validate_game_parameters(
            Decimal::from(60),
            Decimal::from(40),
            Decimal::new(200, 2),
            Decimal::from(500),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_percentages_must_sum_to_one_hundred() {
        let result = validate_game_parameters(
            Decimal::from(40),
            Decimal::from(55),
            Decimal::new(200, 2),
            Decimal::ZERO,
        );
        match result {
            Err(AppError::Validation(message)) => {
                assert_eq!(message, ERROR_PERCENTAGES_MUST_SUM)
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_out_of_range_percentage_is_rejected_before_sum_check() {
        // 120 + (-20) sums to 100, so the range check has to catch it.
        let result = validate_game_parameters(
            Decimal::from(120),
            Decimal::from(-20),
            Decimal::new(200, 2),
            Decimal::ZERO,
        );
        match result {
            Err(AppError::Validation(message)) => {
                assert!(message.contains("between 0 and 100"))
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_free_tickets_are_rejected() {
        let result = validate_game_parameters(
            Decimal::from(60),
            Decimal::from(40),
            Decimal::ZERO,
            Decimal::from(500),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_negative_minimum_jackpot_is_rejected() {
        let result = validate_game_parameters(
            Decimal::from(60),
            Decimal::from(40),
            Decimal::new(200, 2),
            Decimal::from(-1),
        );
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[test]
    fn test_totals_are_read_from_reconciliation_values() {
        let mut result = CalculationResult::new();
        result.insert("total_sales", Decimal::new(85000, 2));
        result.insert("total_expenses", Decimal::new(8000, 2));
        result.insert("total_donations", Decimal::new(4500, 2));
        result.insert("total_payouts", Decimal::new(49000, 2));
        result.insert("organization_net_profit", Decimal::new(38500, 2));

        let totals = totals_from_result(&result);
        assert_eq!(totals.total_sales, Decimal::new(85000, 2));
        assert_eq!(totals.total_expenses, Decimal::new(8000, 2));
        assert_eq!(totals.total_donations, Decimal::new(4500, 2));
        assert_eq!(totals.total_payouts, Decimal::new(49000, 2));
        assert_eq!(totals.organization_net_profit, Decimal::new(38500, 2));
    }

    #[test]
    fn test_missing_reconciliation_values_default_to_zero() {
        let totals = totals_from_result(&CalculationResult::new());
        assert_eq!(totals.total_sales, Decimal::ZERO);
        assert_eq!(totals.organization_net_profit, Decimal::ZERO);
    }
}
