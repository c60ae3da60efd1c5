//! # Storage Traits
//!
//! Storage abstraction traits that let the domain layer work with
//! different backends (CSV/YAML files today, a document store later)
//! without modification. All operations are synchronous; the domain layer
//! is a local state machine, not an I/O pipeline.

use anyhow::Result;
use shared::{Bill, ExpenseEntry, GoalConfig, ShiftHistoryEntry};

use crate::domain::models::shift::ShiftState;

/// Persistence for the current shift snapshot.
///
/// The whole snapshot is written after every mutating transition, so
/// implementations never need a partial-update protocol.
pub trait ShiftStorage: Send + Sync {
    /// Persist the full current-shift snapshot for a driver
    fn store_shift(&self, driver_id: &str, shift: &ShiftState) -> Result<()>;

    /// Load the persisted snapshot, `None` when absent or unreadable
    fn load_shift(&self, driver_id: &str) -> Result<Option<ShiftState>>;

    /// Remove the persisted snapshot (after finalize or reset)
    fn clear_shift(&self, driver_id: &str) -> Result<()>;
}

/// Storage for recurring bill obligations
pub trait BillStorage: Send + Sync {
    /// Store a new bill
    fn store_bill(&self, driver_id: &str, bill: &Bill) -> Result<()>;

    /// List all bills ordered by due date
    fn list_bills(&self, driver_id: &str) -> Result<Vec<Bill>>;

    /// Delete a bill by ID, returns true if it existed
    fn delete_bill(&self, driver_id: &str, bill_id: &str) -> Result<bool>;
}

/// Storage for the user-editable monthly goal configuration
pub trait GoalConfigStorage: Send + Sync {
    /// Read the configuration, `None` when never set
    fn get_goal_config(&self, driver_id: &str) -> Result<Option<GoalConfig>>;

    /// Replace the configuration
    fn set_goal_config(&self, driver_id: &str, config: &GoalConfig) -> Result<()>;
}

/// Sink for finalized shifts (the transaction-history commit step)
pub trait HistoryStorage: Send + Sync {
    /// Append a finalized shift and its expense audit trail to history
    fn append_shift(
        &self,
        driver_id: &str,
        entry: &ShiftHistoryEntry,
        expenses: &[ExpenseEntry],
    ) -> Result<()>;

    /// List finalized shifts, most recent first
    fn list_shifts(&self, driver_id: &str) -> Result<Vec<ShiftHistoryEntry>>;

    /// List the expense audit trail of one finalized shift
    fn list_shift_expenses(&self, driver_id: &str, shift_id: &str) -> Result<Vec<ExpenseEntry>>;
}
