pub mod entry_service;
pub mod game_service;
pub mod realtime_service;
pub mod week_service;

pub use entry_service::EntryService;
pub use game_service::{GameCompletionSummary, GameService};
pub use realtime_service::{RealtimeEvent, RealtimeService};
pub use week_service::WeekService;
