use queen_of_hearts_shared::constants::{
    ERROR_PERCENTAGES_MUST_SUM, ERROR_SPLIT_MISMATCH, HIGH_TICKET_COUNT_THRESHOLD,
    HIGH_TICKET_PRICE_THRESHOLD, PERCENTAGE_SUM,
};
use rust_decimal::Decimal;

use super::{within_tolerance, CalculationResult};

/// Validate and compute the organization/jackpot split for a ticket sale
/// entry. Bad inputs come back as errors in the result, never as a panic;
/// the caller decides whether an invalid entry is saved.
pub fn validate_ticket_sale_split(
    tickets_sold: i32,
    ticket_price: Decimal,
    organization_percentage: Decimal,
    jackpot_percentage: Decimal,
) -> CalculationResult {
    let mut result = CalculationResult::new();

    if tickets_sold <= 0 {
        result.push_error("Tickets sold must be greater than zero");
    }
    if ticket_price <= Decimal::ZERO {
        result.push_error("Ticket price must be greater than zero");
    }
    if organization_percentage < Decimal::ZERO || organization_percentage > PERCENTAGE_SUM {
        result.push_error("Organization percentage must be between 0 and 100");
    }
    if jackpot_percentage < Decimal::ZERO || jackpot_percentage > PERCENTAGE_SUM {
        result.push_error("Jackpot percentage must be between 0 and 100");
    }
    if !within_tolerance(organization_percentage + jackpot_percentage, PERCENTAGE_SUM) {
        result.push_error(ERROR_PERCENTAGES_MUST_SUM);
    }

    if !result.is_valid {
        return result;
    }

    let amount_collected = Decimal::from(tickets_sold) * ticket_price;
    let organization_total = amount_collected * organization_percentage / PERCENTAGE_SUM;
    let jackpot_total = amount_collected * jackpot_percentage / PERCENTAGE_SUM;

    // The split must reconstruct the collected amount; a mismatch means the
    // percentages or the arithmetic corrupted the entry, not a rounding step
    // to be silently absorbed.
    if !within_tolerance(organization_total + jackpot_total, amount_collected) {
        result.push_error(ERROR_SPLIT_MISMATCH);
    }

    if tickets_sold > HIGH_TICKET_COUNT_THRESHOLD {
        result.push_warning(format!(
            "Unusually high ticket count for a single entry: {}",
            tickets_sold
        ));
    }
    if ticket_price > HIGH_TICKET_PRICE_THRESHOLD {
        result.push_warning(format!("Unusually high ticket price: {}", ticket_price));
    }

    result.insert("amount_collected", amount_collected);
    result.insert("organization_total", organization_total);
    result.insert("jackpot_total", jackpot_total);

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_reconstructs_amount_collected() {
        let result = validate_ticket_sale_split(
            100,
            Decimal::new(200, 2), // $2.00
            Decimal::from(60),
            Decimal::from(40),
        );

        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.get("amount_collected"), Some(Decimal::from(200)));
        assert_eq!(result.get("organization_total"), Some(Decimal::from(120)));
        assert_eq!(result.get("jackpot_total"), Some(Decimal::from(80)));
    }

    #[test]
    fn test_split_with_fractional_percentages() {
        let result = validate_ticket_sale_split(
            33,
            Decimal::new(150, 2),   // $1.50
            Decimal::new(6650, 2),  // 66.50%
            Decimal::new(3350, 2),  // 33.50%
        );

        assert!(result.is_valid);
        let org = result.get("organization_total").unwrap();
        let jackpot = result.get("jackpot_total").unwrap();
        let collected = result.get("amount_collected").unwrap();
        assert!(within_tolerance(org + jackpot, collected));
    }

    #[test]
    fn test_percentages_must_sum_to_one_hundred() {
        let result = validate_ticket_sale_split(
            10,
            Decimal::new(100, 2),
            Decimal::from(40),
            Decimal::from(55),
        );

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("percentages must sum to 100")));
        assert!(result.values.is_empty());
    }

    #[test]
    fn test_non_positive_inputs_are_errors_not_panics() {
        let zero_tickets = validate_ticket_sale_split(
            0,
            Decimal::new(100, 2),
            Decimal::from(60),
            Decimal::from(40),
        );
        assert!(!zero_tickets.is_valid);
        assert!(zero_tickets
            .errors
            .iter()
            .any(|e| e.contains("Tickets sold")));

        let negative_price = validate_ticket_sale_split(
            10,
            Decimal::from(-1),
            Decimal::from(60),
            Decimal::from(40),
        );
        assert!(!negative_price.is_valid);
        assert!(negative_price
            .errors
            .iter()
            .any(|e| e.contains("Ticket price")));
    }

    #[test]
    fn test_out_of_range_percentage_is_reported() {
        let result = validate_ticket_sale_split(
            10,
            Decimal::new(100, 2),
            Decimal::from(110),
            Decimal::from(-10),
        );

        assert!(!result.is_valid);
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("Organization percentage")));
        assert!(result
            .errors
            .iter()
            .any(|e| e.contains("Jackpot percentage")));
    }

    #[test]
    fn test_high_volume_entries_warn_without_blocking() {
        let result = validate_ticket_sale_split(
            10_001,
            Decimal::from(51),
            Decimal::from(60),
            Decimal::from(40),
        );

        assert!(result.is_valid);
        assert_eq!(result.warnings.len(), 2);
        assert!(result.warnings[0].contains("ticket count"));
        assert!(result.warnings[1].contains("ticket price"));
    }
}
