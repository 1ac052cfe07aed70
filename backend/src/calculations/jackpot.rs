use rust_decimal::Decimal;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{TicketSale, Week};

/// Game-lifetime jackpot balance at the end of a week's drawing.
///
/// Replays the full sale history on every call rather than maintaining an
/// incremental total: corrections to past entries are picked up for free,
/// and the data volume (a few hundred entries per game) makes the replay
/// cost irrelevant.
///
/// Starts from the game's carryover, adds the jackpot portion of every sale
/// in the game, subtracts the payout of every other week with a declared
/// winner, then subtracts `current_week_payout`. Never goes below zero.
pub fn week_ending_jackpot(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    weeks: &[Week],
    current_week_id: Uuid,
    current_week_payout: Decimal,
) -> Decimal {
    let contributions: Decimal = sales.iter().map(|s| s.jackpot_total).sum();

    let prior_payouts: Decimal = weeks
        .iter()
        .filter(|w| w.winner_name.is_some() && w.id != current_week_id)
        .map(|w| w.weekly_payout)
        .sum();

    let ending = carryover_jackpot + contributions - prior_payouts - current_week_payout;
    ending.max(Decimal::ZERO)
}

/// Older single-snapshot name for the same computation. Kept so existing
/// call sites keep working; new code calls [`week_ending_jackpot`].
#[deprecated(note = "use week_ending_jackpot")]
pub fn ending_jackpot_total(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    weeks: &[Week],
    current_week_id: Uuid,
    current_week_payout: Decimal,
) -> Decimal {
    week_ending_jackpot(
        carryover_jackpot,
        sales,
        weeks,
        current_week_id,
        current_week_payout,
    )
}

/// Jackpot balance after every declared payout in the game. Same replay as
/// [`week_ending_jackpot`] with no week excluded and nothing further
/// subtracted.
pub fn game_jackpot_balance(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    weeks: &[Week],
) -> Decimal {
    week_ending_jackpot(carryover_jackpot, sales, weeks, Uuid::nil(), Decimal::ZERO)
}

/// Recomputed ending-jackpot snapshot for a declared week.
#[derive(Debug, Clone, PartialEq)]
pub struct WeekSnapshot {
    pub week_id: Uuid,
    pub ending_jackpot: Decimal,
}

/// Recompute the persisted ending-jackpot snapshot of every declared week.
///
/// Walks the weeks in play order with a running pot: each week adds its own
/// entries' contributions, and a declared week then subtracts its payout
/// and yields a snapshot. Unlike [`week_ending_jackpot`], which answers for
/// the week being declared right now, this replay never counts sales or
/// payouts from weeks after the one being snapshotted, so backfilled or
/// corrected entries land in the right part of the history.
pub fn week_ending_snapshots(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    weeks: &[Week],
) -> Vec<WeekSnapshot> {
    let mut ordered: Vec<&Week> = weeks.iter().collect();
    ordered.sort_by_key(|w| w.week_number);

    let mut running = carryover_jackpot;
    let mut snapshots = Vec::new();

    for week in ordered {
        let contributions: Decimal = sales
            .iter()
            .filter(|s| s.week_id == week.id)
            .map(|s| s.jackpot_total)
            .sum();
        running += contributions;

        if week.winner_name.is_some() {
            running = (running - week.weekly_payout).max(Decimal::ZERO);
            snapshots.push(WeekSnapshot {
                week_id: week.id,
                ending_jackpot: running,
            });
        }
    }

    snapshots
}

/// Running-ledger snapshot persisted on a sale entry.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleSnapshot {
    pub sale_id: Uuid,
    pub cumulative_collected: Decimal,
    pub ending_jackpot_total: Decimal,
}

/// Recompute every sale entry's running-ledger snapshots from scratch.
///
/// `sales` must already be in entry order (sale date, then creation).
/// Each entry's jackpot snapshot counts contributions through that entry
/// and subtracts the payouts of weeks drawn before the entry's own week:
/// a sale logged during week 3 sits after week 2's drawing but before
/// week 3's.
pub fn sale_snapshots(
    carryover_jackpot: Decimal,
    sales: &[TicketSale],
    weeks: &[Week],
) -> Vec<SaleSnapshot> {
    let week_numbers: HashMap<Uuid, i32> = weeks.iter().map(|w| (w.id, w.week_number)).collect();

    let mut cumulative_collected = Decimal::ZERO;
    let mut cumulative_jackpot = Decimal::ZERO;
    let mut snapshots = Vec::with_capacity(sales.len());

    for sale in sales {
        cumulative_collected += sale.amount_collected;
        cumulative_jackpot += sale.jackpot_total;

        let sale_week = week_numbers.get(&sale.week_id).copied().unwrap_or(i32::MAX);
        let prior_payouts: Decimal = weeks
            .iter()
            .filter(|w| w.winner_name.is_some() && w.week_number < sale_week)
            .map(|w| w.weekly_payout)
            .sum();

        let ending_jackpot_total =
            (carryover_jackpot + cumulative_jackpot - prior_payouts).max(Decimal::ZERO);

        snapshots.push(SaleSnapshot {
            sale_id: sale.id,
            cumulative_collected,
            ending_jackpot_total,
        });
    }

    snapshots
}

/// Jackpot figure shown to players right now.
///
/// Presentation only, recomputed on demand and never persisted. While
/// contributions sit below the guaranteed minimum the organization
/// advertises the minimum; either way the carryover from the predecessor
/// game is on top. This is deliberately not the accumulator's persisted
/// balance: one answers "what is the pot worth to a viewer", the other
/// "what has actually accrued".
pub fn displayed_jackpot(
    jackpot_contributions: Decimal,
    minimum_jackpot: Decimal,
    carryover_jackpot: Decimal,
) -> Decimal {
    if jackpot_contributions < minimum_jackpot {
        minimum_jackpot + carryover_jackpot
    } else {
        jackpot_contributions + carryover_jackpot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculations::test_fixtures::{completed_week, sale, week};

    #[test]
    fn test_ending_jackpot_replays_full_history() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "4 of Clubs", Decimal::from(50));
        let week_two = week(game_id, 2);

        let sales = vec![
            sale(game_id, week_one.id, Decimal::from(200), Decimal::from(120), Decimal::from(80)),
            sale(game_id, week_two.id, Decimal::from(300), Decimal::from(180), Decimal::from(120)),
        ];
        let weeks = vec![week_one, week_two.clone()];

        // 100 carryover + 80 + 120 contributions - 50 prior payout - 30 current
        let ending = week_ending_jackpot(
            Decimal::from(100),
            &sales,
            &weeks,
            week_two.id,
            Decimal::from(30),
        );
        assert_eq!(ending, Decimal::from(220));
    }

    #[test]
    fn test_ending_jackpot_is_idempotent() {
        let game_id = Uuid::new_v4();
        let current = completed_week(game_id, 1, "9 of Hearts", Decimal::from(25));
        let sales = vec![sale(
            game_id,
            current.id,
            Decimal::from(100),
            Decimal::from(60),
            Decimal::from(40),
        )];
        let weeks = vec![current.clone()];

        let first = week_ending_jackpot(Decimal::ZERO, &sales, &weeks, current.id, Decimal::from(25));
        let second = week_ending_jackpot(Decimal::ZERO, &sales, &weeks, current.id, Decimal::from(25));
        assert_eq!(first, second);
        assert_eq!(first, Decimal::from(15));
    }

    #[test]
    fn test_ending_jackpot_excludes_current_week_persisted_payout() {
        let game_id = Uuid::new_v4();
        // The current week already carries a recorded payout from an earlier
        // declaration; only the argument payout may be subtracted for it.
        let current = completed_week(game_id, 1, "9 of Hearts", Decimal::from(999));
        let sales = vec![sale(
            game_id,
            current.id,
            Decimal::from(100),
            Decimal::from(60),
            Decimal::from(40),
        )];
        let weeks = vec![current.clone()];

        let ending = week_ending_jackpot(Decimal::ZERO, &sales, &weeks, current.id, Decimal::from(10));
        assert_eq!(ending, Decimal::from(30));
    }

    #[test]
    fn test_ending_jackpot_clamps_at_zero() {
        let game_id = Uuid::new_v4();
        let current = week(game_id, 1);
        let sales = vec![sale(
            game_id,
            current.id,
            Decimal::from(50),
            Decimal::from(30),
            Decimal::from(20),
        )];
        let weeks = vec![current.clone()];

        let ending = week_ending_jackpot(
            Decimal::ZERO,
            &sales,
            &weeks,
            current.id,
            Decimal::from(10_000),
        );
        assert_eq!(ending, Decimal::ZERO);
    }

    #[test]
    #[allow(deprecated)]
    fn test_legacy_name_routes_to_same_logic() {
        let game_id = Uuid::new_v4();
        let current = week(game_id, 1);
        let sales = vec![sale(
            game_id,
            current.id,
            Decimal::from(200),
            Decimal::from(120),
            Decimal::from(80),
        )];
        let weeks = vec![current.clone()];

        let new_name =
            week_ending_jackpot(Decimal::from(10), &sales, &weeks, current.id, Decimal::from(5));
        let old_name =
            ending_jackpot_total(Decimal::from(10), &sales, &weeks, current.id, Decimal::from(5));
        assert_eq!(new_name, old_name);
    }

    #[test]
    fn test_week_snapshots_replay_only_declared_weeks() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "4 of Clubs", Decimal::from(30));
        let week_two = completed_week(game_id, 2, "8 of Spades", Decimal::from(20));
        let week_three = week(game_id, 3);

        let sales = vec![
            sale(
                game_id,
                week_one.id,
                Decimal::from(100),
                Decimal::from(60),
                Decimal::from(40),
            ),
            sale(
                game_id,
                week_two.id,
                Decimal::from(100),
                Decimal::from(60),
                Decimal::from(40),
            ),
            sale(
                game_id,
                week_three.id,
                Decimal::from(200),
                Decimal::from(120),
                Decimal::from(80),
            ),
        ];
        let weeks = vec![week_two.clone(), week_one.clone(), week_three];

        let snapshots = week_ending_snapshots(Decimal::from(10), &sales, &weeks);

        // The open week contributes nothing backwards and gets no snapshot.
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[0].week_id, week_one.id);
        assert_eq!(snapshots[0].ending_jackpot, Decimal::from(20));
        assert_eq!(snapshots[1].week_id, week_two.id);
        assert_eq!(snapshots[1].ending_jackpot, Decimal::from(40));
    }

    #[test]
    fn test_week_snapshots_pick_up_backfilled_entries() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "4 of Clubs", Decimal::from(30));
        let week_two = completed_week(game_id, 2, "8 of Spades", Decimal::from(20));

        let mut sales = vec![
            sale(
                game_id,
                week_one.id,
                Decimal::from(100),
                Decimal::from(60),
                Decimal::from(40),
            ),
            sale(
                game_id,
                week_two.id,
                Decimal::from(100),
                Decimal::from(60),
                Decimal::from(40),
            ),
        ];

        let before =
            week_ending_snapshots(Decimal::ZERO, &sales, &[week_one.clone(), week_two.clone()]);
        assert_eq!(before[0].ending_jackpot, Decimal::from(10));
        assert_eq!(before[1].ending_jackpot, Decimal::from(30));

        // A sale entered late for week 1 raises every snapshot from there on.
        sales.push(sale(
            game_id,
            week_one.id,
            Decimal::from(50),
            Decimal::from(30),
            Decimal::from(20),
        ));
        let after = week_ending_snapshots(Decimal::ZERO, &sales, &[week_one, week_two]);
        assert_eq!(after[0].ending_jackpot, Decimal::from(30));
        assert_eq!(after[1].ending_jackpot, Decimal::from(50));
    }

    #[test]
    fn test_sale_snapshots_track_the_running_ledger() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "5 of Spades", Decimal::from(30));
        let week_two = week(game_id, 2);

        let first = sale(game_id, week_one.id, Decimal::from(100), Decimal::from(60), Decimal::from(40));
        let second = sale(game_id, week_one.id, Decimal::from(50), Decimal::from(30), Decimal::from(20));
        let third = sale(game_id, week_two.id, Decimal::from(200), Decimal::from(120), Decimal::from(80));

        let sales = vec![first.clone(), second.clone(), third.clone()];
        let weeks = vec![week_one, week_two];

        let snapshots = sale_snapshots(Decimal::from(10), &sales, &weeks);
        assert_eq!(snapshots.len(), 3);

        // Week 1 entries precede week 1's drawing: no payout subtracted.
        assert_eq!(snapshots[0].sale_id, first.id);
        assert_eq!(snapshots[0].cumulative_collected, Decimal::from(100));
        assert_eq!(snapshots[0].ending_jackpot_total, Decimal::from(50));

        assert_eq!(snapshots[1].cumulative_collected, Decimal::from(150));
        assert_eq!(snapshots[1].ending_jackpot_total, Decimal::from(70));

        // The week 2 entry sits after week 1's payout.
        assert_eq!(snapshots[2].cumulative_collected, Decimal::from(350));
        assert_eq!(snapshots[2].ending_jackpot_total, Decimal::from(120));
    }

    #[test]
    fn test_game_jackpot_balance_subtracts_all_declared_payouts() {
        let game_id = Uuid::new_v4();
        let week_one = completed_week(game_id, 1, "5 of Spades", Decimal::from(30));
        let week_two = completed_week(game_id, 2, "Jack of Hearts", Decimal::from(20));

        let sales = vec![
            sale(game_id, week_one.id, Decimal::from(100), Decimal::from(60), Decimal::from(40)),
            sale(game_id, week_two.id, Decimal::from(100), Decimal::from(60), Decimal::from(40)),
        ];
        let weeks = vec![week_one, week_two];

        let balance = game_jackpot_balance(Decimal::from(5), &sales, &weeks);
        assert_eq!(balance, Decimal::from(35));
    }

    #[test]
    fn test_displayed_jackpot_guarantees_the_minimum() {
        // Contributions below the floor: players see the guaranteed minimum.
        let below = displayed_jackpot(Decimal::from(300), Decimal::from(500), Decimal::from(150));
        assert_eq!(below, Decimal::from(650));

        // At or above the floor: players see actual contributions.
        let at_floor = displayed_jackpot(Decimal::from(500), Decimal::from(500), Decimal::from(150));
        assert_eq!(at_floor, Decimal::from(650));

        let above = displayed_jackpot(Decimal::from(800), Decimal::from(500), Decimal::from(150));
        assert_eq!(above, Decimal::from(950));
    }
}
