//! Database models for the Queen of Hearts game manager
//!
//! Each model corresponds to a database table and provides its CRUD
//! operations using sqlx.

pub mod expense;
pub mod game;
pub mod settings;
pub mod ticket_sale;
pub mod week;

// Re-export commonly used models
pub use expense::Expense;
pub use game::{Game, GameTotals};
pub use settings::{GameSetting, GameSettings};
pub use ticket_sale::{NewTicketSale, TicketSale};
pub use week::{Week, WinnerRecord};

/// Pagination helper
#[derive(Debug, Clone)]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub fn new(limit: Option<i64>, offset: Option<i64>) -> Self {
        use queen_of_hearts_shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

        Self {
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).min(MAX_PAGE_SIZE).max(1),
            offset: offset.unwrap_or(0).max(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps_limits() {
        let page = Pagination::new(Some(500), Some(-3));
        assert_eq!(page.limit, 100);
        assert_eq!(page.offset, 0);

        let default = Pagination::new(None, None);
        assert_eq!(default.limit, 20);
        assert_eq!(default.offset, 0);
    }
}
