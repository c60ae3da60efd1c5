//! Domain-level command and query types.
//!
//! These structs are used by services inside the domain layer and are
//! **not** exposed over the public API. The REST layer maps the public
//! DTOs defined in the `shared` crate to these internal types.

pub mod shift {
    use shared::{Platform, ShiftOutcome};

    /// Input for reporting a platform earnings total.
    #[derive(Debug, Clone)]
    pub struct RecordEarningCommand {
        pub platform: Platform,
        pub amount: f64,
    }

    /// Input for recording a shift expense.
    #[derive(Debug, Clone)]
    pub struct RecordExpenseCommand {
        pub amount: f64,
        pub description: Option<String>,
        pub category: Option<String>,
    }

    /// Input for adding distance driven.
    #[derive(Debug, Clone)]
    pub struct RecordDistanceCommand {
        pub km: f64,
    }

    /// Input for correcting the shift start instant.
    #[derive(Debug, Clone)]
    pub struct EditStartTimeCommand {
        pub start_time_ms: i64,
    }

    /// Result of finalizing a stopped shift into history.
    #[derive(Debug, Clone)]
    pub struct FinalizeShiftResult {
        pub outcome: ShiftOutcome,
        pub history_id: String,
    }
}

pub mod goals {
    use shared::DailyGoals;

    /// Input for updating the monthly goal configuration.
    #[derive(Debug, Clone)]
    pub struct UpdateGoalConfigCommand {
        pub monthly_salary_goal: f64,
        pub monthly_working_days: u32,
    }

    /// Result of deriving today's goals from bills and configuration.
    #[derive(Debug, Clone)]
    pub struct DailyGoalsResult {
        pub goals: DailyGoals,
        pub total_monthly_bills: f64,
        pub working_days: u32,
    }
}

pub mod bills {
    /// Input for creating a new bill.
    #[derive(Debug, Clone)]
    pub struct CreateBillCommand {
        pub description: String,
        pub amount: f64,
        /// Due date in ISO 8601 date format (YYYY-MM-DD)
        pub due_date: String,
    }
}
