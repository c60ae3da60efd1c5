//! File-based storage implementation.
//!
//! Data lives under a base directory with one subdirectory per driver:
//!
//! ```text
//! data/
//! └── {driver_id}/
//!     ├── current_shift.yaml    ← live shift snapshot
//!     ├── goal_config.yaml      ← monthly salary goal + working days
//!     ├── bills.csv             ← recurring bill obligations
//!     ├── shift_history.csv     ← finalized shifts
//!     └── shift_expenses.csv    ← per-shift expense audit trail
//! ```

pub mod bill_repository;
pub mod connection;
pub mod goal_config_repository;
pub mod history_repository;
pub mod shift_repository;

pub use bill_repository::BillRepository;
pub use connection::CsvConnection;
pub use goal_config_repository::GoalConfigRepository;
pub use history_repository::HistoryRepository;
pub use shift_repository::ShiftRepository;
