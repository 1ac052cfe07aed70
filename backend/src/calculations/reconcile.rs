use queen_of_hearts_shared::constants::{ERROR_PAYOUTS_EXCEED_JACKPOT, ERROR_PORTIONS_MISMATCH};
use rust_decimal::Decimal;

use super::{within_tolerance, CalculationResult};
use crate::models::{Expense, TicketSale, Week};

/// Reconcile a game's ledger: every sale's split portions must rebuild the
/// collected total, and the game must never have paid out more jackpot
/// money than it ever held — contributions plus the carryover it started
/// with. Minimum-guarantee top-ups are tracked as a separate shortfall
/// line and deliberately excluded from the payout check.
pub fn validate_game_totals(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    expenses: &[Expense],
    weeks: &[Week],
) -> CalculationResult {
    let mut result = CalculationResult::new();

    let total_sales: Decimal = sales.iter().map(|s| s.amount_collected).sum();
    let total_organization_portion: Decimal = sales.iter().map(|s| s.organization_total).sum();
    let total_jackpot_portion: Decimal = sales.iter().map(|s| s.jackpot_total).sum();

    let total_expenses: Decimal = expenses
        .iter()
        .filter(|e| !e.is_donation)
        .map(|e| e.amount)
        .sum();
    let total_donations: Decimal = expenses
        .iter()
        .filter(|e| e.is_donation)
        .map(|e| e.amount)
        .sum();

    let total_payouts: Decimal = weeks.iter().map(|w| w.weekly_payout).sum();

    if !within_tolerance(total_organization_portion + total_jackpot_portion, total_sales) {
        result.push_error(ERROR_PORTIONS_MISMATCH);
    }

    if total_payouts > total_jackpot_portion + carryover_jackpot {
        result.push_error(ERROR_PAYOUTS_EXCEED_JACKPOT);
    }

    if !sales.is_empty() && carryover_jackpot > total_jackpot_portion {
        result.push_warning(format!(
            "Carryover jackpot {} exceeds this game's contributions {}",
            carryover_jackpot, total_jackpot_portion
        ));
    }

    let organization_net_profit = total_organization_portion - total_expenses - total_donations;
    if organization_net_profit < Decimal::ZERO {
        result.push_warning(format!(
            "Organization net profit is negative: {}",
            organization_net_profit
        ));
    }

    result.insert("total_sales", total_sales);
    result.insert("total_organization_portion", total_organization_portion);
    result.insert("total_jackpot_portion", total_jackpot_portion);
    result.insert("total_expenses", total_expenses);
    result.insert("total_donations", total_donations);
    result.insert("total_payouts", total_payouts);
    result.insert("organization_net_profit", organization_net_profit);

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::test_fixtures::{completed_week, expense, sale};
    use uuid::Uuid;

    #[test]
    fn test_reconciliation_of_a_clean_ledger() {
        let game_id = Uuid::new_v4();
        let week = completed_week(game_id, 1, "3 of Hearts", Decimal::from(600));

        let sales = vec![sale(
            game_id,
            week.id,
            Decimal::from(1000),
            Decimal::from(400),
            Decimal::from(600),
        )];
        let expenses = vec![
            expense(game_id, Decimal::from(100), false),
            expense(game_id, Decimal::from(50), true),
        ];
        let weeks = vec![week];

        let result = validate_game_totals(Decimal::ZERO, &sales, &expenses, &weeks);

        assert!(result.is_valid);
        assert_eq!(result.get("total_sales"), Some(Decimal::from(1000)));
        assert_eq!(result.get("total_expenses"), Some(Decimal::from(100)));
        assert_eq!(result.get("total_donations"), Some(Decimal::from(50)));
        assert_eq!(result.get("total_payouts"), Some(Decimal::from(600)));
        assert_eq!(
            result.get("organization_net_profit"),
            Some(Decimal::from(250))
        );
    }

    #[test]
    fn test_over_payout_is_an_error() {
        let game_id = Uuid::new_v4();
        let week = completed_week(game_id, 1, "3 of Hearts", Decimal::from(600));

        // Only 500 ever contributed to the jackpot, yet 600 paid out.
        let sales = vec![sale(
            game_id,
            week.id,
            Decimal::from(1000),
            Decimal::from(500),
            Decimal::from(500),
        )];
        let weeks = vec![week];

        let result = validate_game_totals(Decimal::ZERO, &sales, &[], &weeks);

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e == "Total payouts exceed total jackpot portion"));
    }

    #[test]
    fn test_carryover_funded_payout_is_not_an_error() {
        let game_id = Uuid::new_v4();
        let week = completed_week(game_id, 1, "Queen of Hearts", Decimal::from(600));

        // 500 contributed this game, but 150 carried over from the last
        // one, so paying out 600 is legitimate.
        let sales = vec![sale(
            game_id,
            week.id,
            Decimal::from(1000),
            Decimal::from(500),
            Decimal::from(500),
        )];
        let weeks = vec![week];

        let result = validate_game_totals(Decimal::from(150), &sales, &[], &weeks);

        assert!(result.is_valid);
        assert_eq!(result.get("total_payouts"), Some(Decimal::from(600)));
    }

    #[test]
    fn test_corrupted_split_portions_are_an_error() {
        let game_id = Uuid::new_v4();
        let week_id = Uuid::new_v4();

        // 400 + 500 does not rebuild the 1000 collected.
        let sales = vec![sale(
            game_id,
            week_id,
            Decimal::from(1000),
            Decimal::from(400),
            Decimal::from(500),
        )];

        let result = validate_game_totals(Decimal::ZERO, &sales, &[], &[]);

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("portions do not sum")));
    }

    #[test]
    fn test_negative_net_profit_warns_without_invalidating() {
        let game_id = Uuid::new_v4();
        let week_id = Uuid::new_v4();

        let sales = vec![sale(
            game_id,
            week_id,
            Decimal::from(100),
            Decimal::from(60),
            Decimal::from(40),
        )];
        let expenses = vec![expense(game_id, Decimal::from(200), false)];

        let result = validate_game_totals(Decimal::ZERO, &sales, &expenses, &[]);

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("negative"));
        assert_eq!(
            result.get("organization_net_profit"),
            Some(Decimal::from(-140))
        );
    }

    #[test]
    fn test_dominant_carryover_warns_without_invalidating() {
        let game_id = Uuid::new_v4();
        let week_id = Uuid::new_v4();

        // Inherited 500 but only 40 contributed so far; worth a look.
        let sales = vec![sale(
            game_id,
            week_id,
            Decimal::from(100),
            Decimal::from(60),
            Decimal::from(40),
        )];

        let result = validate_game_totals(Decimal::from(500), &sales, &[], &[]);

        assert!(result.is_valid);
        assert!(result.warnings.iter().any(|w| w.contains("Carryover")));
    }

    #[test]
    fn test_empty_ledger_reconciles_to_zero() {
        let result = validate_game_totals(Decimal::ZERO, &[], &[], &[]);

        assert!(result.is_valid);
        assert!(result.warnings.is_empty());
        assert_eq!(result.get("total_sales"), Some(Decimal::ZERO));
        assert_eq!(result.get("organization_net_profit"), Some(Decimal::ZERO));
    }
}
