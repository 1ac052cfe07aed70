//! Shared types for the Queen of Hearts game manager.
//!
//! DTOs, domain enums, and constants used by the backend and by any other
//! clients of its API.

pub mod constants;
pub mod dto;
pub mod types;

pub use constants::*;
pub use dto::*;
pub use types::*;
