use queen_of_hearts_shared::constants::is_terminal_card;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{TicketSale, Week};

/// One row of the week-by-week jackpot replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeekBreakdown {
    pub week_number: i32,
    pub starting_jackpot: Decimal,
    pub contributions: Decimal,
    /// Actual amount owed to the winner, after any minimum top-up.
    pub payout: Decimal,
    pub ending_jackpot: Decimal,
    pub is_terminal_card: bool,
    /// Amount the organization covered beyond accrued contributions.
    /// Zero except on the shortfall-triggering terminal week.
    pub minimum_shortfall: Decimal,
}

/// Organization exposure from the guaranteed minimum jackpot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JackpotLossReport {
    pub total_jackpot_loss: Decimal,
    pub weekly_breakdown: Vec<WeekBreakdown>,
}

/// Quantify what the minimum-jackpot guarantee cost the organization.
///
/// Replays the game's weeks in order with a running jackpot seeded from the
/// carryover. On the game-ending draw (terminal card with a positive
/// payout), a pot short of the guaranteed minimum is topped up to it out of
/// the organization's pocket; that top-up is the jackpot loss. Ordinary
/// weekly draws simply subtract their payout with no guarantee applied.
///
/// Mutates nothing. Callers persist whatever parts of the report they need.
pub fn game_jackpot_loss(
    carryover_jackpot: Decimal,
    weeks: &[Week],
    sales: &[TicketSale],
    minimum_starting_jackpot: Decimal,
) -> JackpotLossReport {
    let mut ordered: Vec<&Week> = weeks.iter().collect();
    ordered.sort_by_key(|w| w.week_number);

    let mut running_jackpot = carryover_jackpot;
    let mut total_jackpot_loss = Decimal::ZERO;
    let mut weekly_breakdown = Vec::with_capacity(ordered.len());

    for week in ordered {
        let starting_jackpot = running_jackpot;

        let contributions: Decimal = sales
            .iter()
            .filter(|s| s.week_id == week.id)
            .map(|s| s.jackpot_total)
            .sum();

        let total_available = running_jackpot + contributions;

        let is_terminal_draw = week
            .card_selected
            .as_deref()
            .is_some_and(is_terminal_card)
            && week.weekly_payout > Decimal::ZERO;

        let (payout, minimum_shortfall) = if is_terminal_draw {
            if total_available < minimum_starting_jackpot {
                // Sales never reached the floor: the winner still gets the
                // full guaranteed minimum and the organization eats the gap.
                let shortfall = minimum_starting_jackpot - total_available;
                total_jackpot_loss += shortfall;
                running_jackpot = Decimal::ZERO;
                (minimum_starting_jackpot, shortfall)
            } else {
                running_jackpot = total_available - week.weekly_payout;
                (week.weekly_payout, Decimal::ZERO)
            }
        } else {
            running_jackpot = total_available - week.weekly_payout;
            (week.weekly_payout, Decimal::ZERO)
        };

        weekly_breakdown.push(WeekBreakdown {
            week_number: week.week_number,
            starting_jackpot,
            contributions,
            payout,
            ending_jackpot: running_jackpot,
            is_terminal_card: is_terminal_draw,
            minimum_shortfall,
        });
    }

    JackpotLossReport {
        total_jackpot_loss,
        weekly_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::test_fixtures::{completed_week, sale};
    use queen_of_hearts_shared::constants::TERMINAL_CARD;
    use uuid::Uuid;

    #[test]
    fn test_terminal_week_short_of_minimum_is_topped_up() {
        let game_id = Uuid::new_v4();
        let terminal = completed_week(game_id, 1, TERMINAL_CARD, Decimal::from(300));
        let sales = vec![sale(
            game_id,
            terminal.id,
            Decimal::from(750),
            Decimal::from(450),
            Decimal::from(300),
        )];

        let report = game_jackpot_loss(
            Decimal::ZERO,
            &[terminal],
            &sales,
            Decimal::from(500),
        );

        assert_eq!(report.total_jackpot_loss, Decimal::from(200));
        assert_eq!(report.weekly_breakdown.len(), 1);

        let week = &report.weekly_breakdown[0];
        assert_eq!(week.minimum_shortfall, Decimal::from(200));
        assert_eq!(week.payout, Decimal::from(500));
        assert_eq!(week.ending_jackpot, Decimal::ZERO);
        assert!(week.is_terminal_card);
    }

    #[test]
    fn test_terminal_week_above_minimum_has_no_loss() {
        let game_id = Uuid::new_v4();
        let terminal = completed_week(game_id, 1, TERMINAL_CARD, Decimal::from(800));
        let sales = vec![sale(
            game_id,
            terminal.id,
            Decimal::from(2000),
            Decimal::from(1200),
            Decimal::from(800),
        )];

        let report = game_jackpot_loss(
            Decimal::ZERO,
            &[terminal],
            &sales,
            Decimal::from(500),
        );

        assert_eq!(report.total_jackpot_loss, Decimal::ZERO);
        let week = &report.weekly_breakdown[0];
        assert_eq!(week.payout, Decimal::from(800));
        assert_eq!(week.minimum_shortfall, Decimal::ZERO);
        assert!(week.is_terminal_card);
    }

    #[test]
    fn test_ordinary_weeks_carry_the_pot_forward() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "7 of Diamonds", Decimal::from(20));
        let week_two = completed_week(game_id, 2, "King of Clubs", Decimal::from(30));

        let sales = vec![
            sale(game_id, week_one.id, Decimal::from(250), Decimal::from(150), Decimal::from(100)),
            sale(game_id, week_two.id, Decimal::from(150), Decimal::from(90), Decimal::from(60)),
        ];
        // Supplied out of order; the replay sorts by week number.
        let weeks = vec![week_two, week_one];

        let report = game_jackpot_loss(
            Decimal::from(50),
            &weeks,
            &sales,
            Decimal::from(500),
        );

        assert_eq!(report.total_jackpot_loss, Decimal::ZERO);
        assert_eq!(report.weekly_breakdown.len(), 2);

        let first = &report.weekly_breakdown[0];
        assert_eq!(first.week_number, 1);
        assert_eq!(first.starting_jackpot, Decimal::from(50));
        assert_eq!(first.contributions, Decimal::from(100));
        assert_eq!(first.payout, Decimal::from(20));
        assert_eq!(first.ending_jackpot, Decimal::from(130));
        assert!(!first.is_terminal_card);

        let second = &report.weekly_breakdown[1];
        assert_eq!(second.starting_jackpot, Decimal::from(130));
        assert_eq!(second.ending_jackpot, Decimal::from(160));
    }

    #[test]
    fn test_terminal_card_with_zero_payout_is_not_the_ending_draw() {
        let game_id = Uuid::new_v4();
        let mut week = completed_week(game_id, 1, TERMINAL_CARD, Decimal::ZERO);
        week.weekly_payout = Decimal::ZERO;
        let sales = vec![sale(
            game_id,
            week.id,
            Decimal::from(100),
            Decimal::from(60),
            Decimal::from(40),
        )];

        let report = game_jackpot_loss(Decimal::ZERO, &[week], &sales, Decimal::from(500));

        assert_eq!(report.total_jackpot_loss, Decimal::ZERO);
        let row = &report.weekly_breakdown[0];
        assert!(!row.is_terminal_card);
        assert_eq!(row.ending_jackpot, Decimal::from(40));
    }

    #[test]
    fn test_carryover_counts_toward_the_minimum() {
        let game_id = Uuid::new_v4();
        let terminal = completed_week(game_id, 1, TERMINAL_CARD, Decimal::from(100));
        let sales = vec![sale(
            game_id,
            terminal.id,
            Decimal::from(250),
            Decimal::from(150),
            Decimal::from(100),
        )];

        // 450 carryover + 100 contributions clears the 500 floor.
        let report = game_jackpot_loss(
            Decimal::from(450),
            &[terminal],
            &sales,
            Decimal::from(500),
        );

        assert_eq!(report.total_jackpot_loss, Decimal::ZERO);
        assert_eq!(report.weekly_breakdown[0].payout, Decimal::from(100));
    }
}
