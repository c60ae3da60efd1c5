//! Shift state model and its transition rules.
//!
//! `ShiftState` is the mutable aggregate root of an in-progress shift. It is
//! treated as an immutable value: every transition consumes the current
//! state and returns the next one, and the service layer replaces the whole
//! state under its lock. Invalid-state transitions return the state
//! unchanged, so duplicate UI events (double-click, retried request) are
//! idempotent rather than errors.

use serde::{Deserialize, Serialize};
use shared::{Earnings, ExpenseEntry, Platform, ShiftSnapshot};

use crate::domain::clock;

/// In-memory state of the current shift.
///
/// Lifecycle: `Idle` (inactive) → `Running` ⇄ `Paused` → stopped (still
/// active, clock frozen) → finalized back to `Idle`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ShiftState {
    pub is_active: bool,
    pub is_paused: bool,
    /// Wall-clock instant the shift began (epoch millis)
    pub start_time_ms: Option<i64>,
    /// Instant of the most recent pause transition; `Some` iff paused
    pub paused_at_ms: Option<i64>,
    /// Cumulative paused duration, excluding any open pause segment
    pub total_paused_ms: i64,
    /// Durable elapsed-time snapshot in whole-minute seconds
    pub elapsed_seconds: i64,
    pub earnings: Earnings,
    pub expenses: f64,
    pub expense_list: Vec<ExpenseEntry>,
    pub km: f64,
}

impl ShiftState {
    /// True while the shift is active and not paused
    pub fn is_running(&self) -> bool {
        self.is_active && !self.is_paused
    }

    /// Gross earnings across all platforms minus shift expenses
    pub fn net_earnings(&self) -> f64 {
        self.earnings.gross() - self.expenses
    }

    /// Begin a new shift. Valid only from `Idle`.
    pub fn started(self, now_ms: i64) -> Self {
        if self.is_active {
            return self;
        }
        Self {
            is_active: true,
            is_paused: false,
            start_time_ms: Some(now_ms),
            paused_at_ms: None,
            total_paused_ms: 0,
            elapsed_seconds: 0,
            earnings: Earnings::default(),
            expenses: 0.0,
            expense_list: Vec::new(),
            km: 0.0,
        }
    }

    /// Temporarily halt the clock. Valid only from `Running`.
    pub fn paused(mut self, now_ms: i64) -> Self {
        if !self.is_running() {
            return self;
        }
        self.is_paused = true;
        self.paused_at_ms = Some(now_ms);
        self.snapshot_elapsed(now_ms)
    }

    /// Resume the clock, folding the open pause segment into the total.
    /// Valid only from `Paused`.
    pub fn resumed(mut self, now_ms: i64) -> Self {
        if !self.is_active || !self.is_paused {
            return self;
        }
        if let Some(paused_at) = self.paused_at_ms {
            self.total_paused_ms += (now_ms - paused_at).max(0);
        }
        self.is_paused = false;
        self.paused_at_ms = None;
        self.snapshot_elapsed(now_ms)
    }

    /// Freeze the clock ahead of finalization. Valid from `Running` or
    /// `Paused`; the shift stays active so accumulated totals remain
    /// visible to the confirmation step.
    ///
    /// Stopping while already paused first closes the open pause segment,
    /// otherwise re-stamping `paused_at_ms` would silently extend elapsed
    /// time by the length of that segment.
    pub fn stopped(mut self, now_ms: i64) -> Self {
        if !self.is_active {
            return self;
        }
        if self.is_paused {
            if let Some(paused_at) = self.paused_at_ms {
                self.total_paused_ms += (now_ms - paused_at).max(0);
            }
        }
        self.is_paused = true;
        self.paused_at_ms = Some(now_ms);
        self.snapshot_elapsed(now_ms)
    }

    /// Replace the start instant with a user-supplied correction. Valid
    /// only while active. A start instant in the future is clamped to
    /// `now` so elapsed time can never go negative.
    pub fn with_start_time(mut self, new_start_ms: i64, now_ms: i64) -> Self {
        if !self.is_active {
            return self;
        }
        self.start_time_ms = Some(new_start_ms.min(now_ms));
        self.snapshot_elapsed(now_ms)
    }

    /// Report the running total for one platform. Replaces the previous
    /// value for that platform, never adds. Valid only while `Running`.
    pub fn with_earning(mut self, platform: Platform, amount: f64) -> Self {
        if !self.is_running() {
            return self;
        }
        self.earnings.set(platform, amount);
        self
    }

    /// Record one expense. Adds to the running sum and appends to the
    /// audit trail in the same transition, keeping
    /// `expenses == sum(expense_list)`. Valid only while `Running`.
    pub fn with_expense(
        mut self,
        amount: f64,
        description: Option<String>,
        category: Option<String>,
        now_ms: i64,
    ) -> Self {
        if !self.is_running() {
            return self;
        }
        self.expenses += amount;
        self.expense_list.push(ExpenseEntry {
            amount,
            description,
            category,
            timestamp_ms: now_ms,
        });
        self
    }

    /// Add distance driven. Valid only while `Running`.
    pub fn with_distance(mut self, km: f64) -> Self {
        if !self.is_running() {
            return self;
        }
        self.km += km;
        self
    }

    /// Check a persisted state for internal consistency before trusting it.
    ///
    /// A shift whose start timestamp cannot be reconstructed is not
    /// resumable; the caller falls back to `Idle` instead of producing
    /// negative or nonsensical elapsed time.
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.is_paused && !self.is_active {
            return Err("paused while inactive");
        }
        if self.is_active && self.start_time_ms.is_none() {
            return Err("active shift without start timestamp");
        }
        if self.is_paused != self.paused_at_ms.is_some() {
            return Err("pause flag and pause timestamp disagree");
        }
        if self.total_paused_ms < 0 || self.elapsed_seconds < 0 {
            return Err("negative accumulated duration");
        }
        if self.expenses < 0.0 || self.km < 0.0 {
            return Err("negative accumulated totals");
        }
        Ok(())
    }

    fn snapshot_elapsed(mut self, now_ms: i64) -> Self {
        // Minute granularity is the contractual display resolution; precise
        // values are always re-derived from the timestamps.
        self.elapsed_seconds = clock::elapsed_minutes(&self, now_ms) * 60;
        self
    }
}

impl From<&ShiftState> for ShiftSnapshot {
    fn from(state: &ShiftState) -> Self {
        ShiftSnapshot {
            is_active: state.is_active,
            is_paused: state.is_paused,
            start_time_ms: state.start_time_ms,
            paused_at_ms: state.paused_at_ms,
            total_paused_ms: state.total_paused_ms,
            elapsed_seconds: state.elapsed_seconds,
            earnings: state.earnings,
            expenses: state.expenses,
            expense_list: state.expense_list.clone(),
            km: state.km,
        }
    }
}

/// Validation errors for shift entry values, surfaced by the service layer
/// before any transition is applied
#[derive(Debug, thiserror::Error)]
pub enum EntryValidationError {
    #[error("Earnings amount cannot be negative")]
    NegativeEarning,
    #[error("Expense amount must be positive")]
    NonPositiveExpense,
    #[error("Distance must be positive")]
    NonPositiveDistance,
    #[error("Description cannot exceed 256 characters")]
    DescriptionTooLong,
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_start_zeroes_everything() {
        let state = ShiftState {
            expenses: 42.0,
            km: 10.0,
            ..Default::default()
        }
        .started(T0);

        assert!(state.is_active);
        assert!(!state.is_paused);
        assert_eq!(state.start_time_ms, Some(T0));
        assert_eq!(state.total_paused_ms, 0);
        assert_eq!(state.elapsed_seconds, 0);
        assert_eq!(state.expenses, 0.0);
        assert_eq!(state.km, 0.0);
        assert!(state.expense_list.is_empty());
    }

    #[test]
    fn test_start_while_active_is_noop() {
        let state = ShiftState::default().started(T0);
        let again = state.clone().started(T0 + 5_000);
        assert_eq!(state, again);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let once = ShiftState::default().started(T0).paused(T0 + 5_000);
        let twice = once.clone().paused(T0 + 7_000);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_pause_resume_bookkeeping() {
        let state = ShiftState::default()
            .started(T0)
            .paused(T0 + 5_000)
            .resumed(T0 + 15_000);

        assert!(state.is_running());
        assert_eq!(state.total_paused_ms, 10_000);
        assert_eq!(state.paused_at_ms, None);
    }

    #[test]
    fn test_resume_while_running_is_noop() {
        let state = ShiftState::default().started(T0);
        let resumed = state.clone().resumed(T0 + 5_000);
        assert_eq!(state, resumed);
    }

    #[test]
    fn test_stop_freezes_clock() {
        let state = ShiftState::default().started(T0).stopped(T0 + 120_000);

        assert!(state.is_active);
        assert!(state.is_paused);
        assert_eq!(state.paused_at_ms, Some(T0 + 120_000));
        assert_eq!(state.elapsed_seconds, 120);

        // The freeze holds: evaluating later does not grow elapsed time
        assert_eq!(clock::elapsed_ms(&state, T0 + 500_000), 120_000);
    }

    #[test]
    fn test_stop_while_paused_does_not_extend_elapsed() {
        let state = ShiftState::default()
            .started(T0)
            .paused(T0 + 60_000)
            .stopped(T0 + 300_000);

        // One minute ran before the pause; the stop must not leak the
        // four paused minutes back into the clock.
        assert_eq!(clock::elapsed_ms(&state, T0 + 300_000), 60_000);
        assert_eq!(state.total_paused_ms, 240_000);
    }

    #[test]
    fn test_edit_start_time_clamps_future() {
        let state = ShiftState::default()
            .started(T0)
            .with_start_time(T0 + 999_999, T0 + 60_000);

        assert_eq!(state.start_time_ms, Some(T0 + 60_000));
        assert_eq!(clock::elapsed_ms(&state, T0 + 60_000), 0);
    }

    #[test]
    fn test_edit_start_time_backdates() {
        let state = ShiftState::default()
            .started(T0)
            .with_start_time(T0 - 600_000, T0 + 60_000);

        assert_eq!(state.start_time_ms, Some(T0 - 600_000));
        assert_eq!(clock::elapsed_minutes(&state, T0 + 60_000), 11);
    }

    #[test]
    fn test_edit_start_time_while_idle_is_noop() {
        let state = ShiftState::default().with_start_time(T0, T0 + 60_000);
        assert_eq!(state, ShiftState::default());
    }

    #[test]
    fn test_earnings_replace_not_sum() {
        let state = ShiftState::default()
            .started(T0)
            .with_earning(Platform::Uber, 80.0)
            .with_earning(Platform::Uber, 95.0);

        assert_eq!(state.earnings.uber, 95.0);
        assert_eq!(state.earnings.gross(), 95.0);
    }

    #[test]
    fn test_expenses_accumulate_with_audit_trail() {
        let state = ShiftState::default()
            .started(T0)
            .with_expense(20.0, Some("fuel".into()), Some("combustivel".into()), T0 + 1_000)
            .with_expense(12.5, None, None, T0 + 2_000);

        assert_eq!(state.expenses, 32.5);
        assert_eq!(state.expense_list.len(), 2);
        let total: f64 = state.expense_list.iter().map(|e| e.amount).sum();
        assert_eq!(total, state.expenses);
        assert_eq!(state.expense_list[0].description.as_deref(), Some("fuel"));
    }

    #[test]
    fn test_distance_accumulates() {
        let state = ShiftState::default()
            .started(T0)
            .with_distance(12.3)
            .with_distance(7.7);
        assert_eq!(state.km, 20.0);
    }

    #[test]
    fn test_entries_ignored_while_paused() {
        let paused = ShiftState::default().started(T0).paused(T0 + 5_000);

        let after = paused
            .clone()
            .with_earning(Platform::Uber, 50.0)
            .with_expense(10.0, None, None, T0 + 6_000)
            .with_distance(5.0);

        assert_eq!(paused, after);
    }

    #[test]
    fn test_entries_ignored_while_idle() {
        let after = ShiftState::default()
            .with_earning(Platform::Private, 30.0)
            .with_distance(4.0);
        assert_eq!(after, ShiftState::default());
    }

    #[test]
    fn test_net_earnings() {
        let state = ShiftState::default()
            .started(T0)
            .with_earning(Platform::Uber, 100.0)
            .with_earning(Platform::NinetyNine, 40.0)
            .with_expense(20.0, None, None, T0 + 1_000);
        assert_eq!(state.net_earnings(), 120.0);
    }

    #[test]
    fn test_validate_rejects_inconsistent_states() {
        let mut state = ShiftState::default();
        state.is_active = true;
        assert!(state.validate().is_err()); // active without start

        let mut state = ShiftState::default().started(T0);
        state.is_paused = true;
        assert!(state.validate().is_err()); // paused without pause timestamp

        let mut state = ShiftState::default();
        state.is_paused = true;
        state.paused_at_ms = Some(T0);
        assert!(state.validate().is_err()); // paused while inactive

        let mut state = ShiftState::default().started(T0);
        state.total_paused_ms = -1;
        assert!(state.validate().is_err());

        assert!(ShiftState::default().validate().is_ok());
        assert!(ShiftState::default().started(T0).validate().is_ok());
    }

    #[test]
    fn test_serde_round_trip_preserves_elapsed() {
        let state = ShiftState::default()
            .started(T0)
            .paused(T0 + 5_000)
            .resumed(T0 + 15_000)
            .with_earning(Platform::InDrive, 60.0);

        let now = T0 + 125_000;
        let before = clock::elapsed_ms(&state, now);

        let yaml = serde_yaml::to_string(&state).unwrap();
        let restored: ShiftState = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(restored, state);
        assert_eq!(clock::elapsed_ms(&restored, now), before);
    }
}
