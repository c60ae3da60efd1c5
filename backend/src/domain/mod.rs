//! Domain layer: shift lifecycle, elapsed-time arithmetic, goal math,
//! and the display ticker that animates the live counter.

pub mod clock;
pub mod commands;
pub mod goal_service;
pub mod models;
pub mod shift_service;
pub mod ticker;

pub use goal_service::GoalService;
pub use shift_service::ShiftService;
pub use ticker::ShiftTicker;
