use rust_decimal::Decimal;

// Currency comparisons are tolerance-based throughout, never exact:
// one cent absorbs rounding from percentage splits of odd amounts.
pub const CURRENCY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2); // 0.01

// Card drawing
pub const TERMINAL_CARD: &str = "Queen of Hearts";
pub const CARD_DECK: &[&str] = &[
    "Ace of Hearts", "2 of Hearts", "3 of Hearts", "4 of Hearts", "5 of Hearts",
    "6 of Hearts", "7 of Hearts", "8 of Hearts", "9 of Hearts", "10 of Hearts",
    "Jack of Hearts", "Queen of Hearts", "King of Hearts",
    "Ace of Diamonds", "2 of Diamonds", "3 of Diamonds", "4 of Diamonds", "5 of Diamonds",
    "6 of Diamonds", "7 of Diamonds", "8 of Diamonds", "9 of Diamonds", "10 of Diamonds",
    "Jack of Diamonds", "Queen of Diamonds", "King of Diamonds",
    "Ace of Clubs", "2 of Clubs", "3 of Clubs", "4 of Clubs", "5 of Clubs",
    "6 of Clubs", "7 of Clubs", "8 of Clubs", "9 of Clubs", "10 of Clubs",
    "Jack of Clubs", "Queen of Clubs", "King of Clubs",
    "Ace of Spades", "2 of Spades", "3 of Spades", "4 of Spades", "5 of Spades",
    "6 of Spades", "7 of Spades", "8 of Spades", "9 of Spades", "10 of Spades",
    "Jack of Spades", "Queen of Spades", "King of Spades",
    "Joker",
];
pub const BOARD_SLOTS: i32 = 54;

// Split defaults (percent of each sale kept by the organization vs. fed
// into the jackpot)
pub const DEFAULT_ORGANIZATION_PERCENTAGE: Decimal = Decimal::from_parts(60, 0, 0, false, 0);
pub const DEFAULT_JACKPOT_PERCENTAGE: Decimal = Decimal::from_parts(40, 0, 0, false, 0);
pub const PERCENTAGE_SUM: Decimal = Decimal::from_parts(100, 0, 0, false, 0);

// Jackpot guarantee
pub const DEFAULT_MINIMUM_STARTING_JACKPOT: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

// Data-entry warning thresholds (flag likely mistakes without blocking save)
pub const HIGH_TICKET_COUNT_THRESHOLD: i32 = 10_000;
pub const HIGH_TICKET_PRICE_THRESHOLD: Decimal = Decimal::from_parts(50, 0, 0, false, 0);

// Audit logging
pub const MAX_AUDIT_LOG_ENTRIES: usize = 1000;

// Pagination defaults
pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// WebSocket configuration
pub const WS_HEARTBEAT_INTERVAL_SECONDS: u64 = 30;
pub const WS_CLIENT_TIMEOUT_SECONDS: u64 = 60;

// Database connection pool
pub const DB_MAX_CONNECTIONS: u32 = 20;
pub const DB_MIN_CONNECTIONS: u32 = 5;
pub const DB_CONNECTION_TIMEOUT_SECONDS: u64 = 30;

// game_settings keys
pub const SETTING_DEFAULT_ORGANIZATION_PERCENTAGE: &str = "default_organization_percentage";
pub const SETTING_DEFAULT_JACKPOT_PERCENTAGE: &str = "default_jackpot_percentage";
pub const SETTING_DEFAULT_MINIMUM_JACKPOT: &str = "default_minimum_jackpot";
pub const SETTING_CARD_PAYOUTS: &str = "card_payouts";

// Error messages surfaced by the calculators
pub const ERROR_PERCENTAGES_MUST_SUM: &str =
    "Organization and jackpot percentages must sum to 100";
pub const ERROR_SPLIT_MISMATCH: &str =
    "Organization and jackpot totals do not match amount collected";
pub const ERROR_PORTIONS_MISMATCH: &str =
    "Ticket sale portions do not sum to total sales";
pub const ERROR_PAYOUTS_EXCEED_JACKPOT: &str =
    "Total payouts exceed total jackpot portion";

/// True when the drawn card ends the game.
pub fn is_terminal_card(card: &str) -> bool {
    card == TERMINAL_CARD
}

/// True when the card name belongs to the 54-slot board deck.
pub fn is_known_card(card: &str) -> bool {
    CARD_DECK.contains(&card)
}
