//! Shift lifecycle service.
//!
//! Owns the live [`ShiftState`], applies the pure transitions under a lock,
//! and persists a full snapshot after every mutating action. The in-memory
//! state stays authoritative when a save fails: the failure is logged and
//! the transition stands, so a flaky disk never blocks or reverts a user
//! action.

use anyhow::Result;
use log::{info, warn};
use std::sync::{Arc, RwLock};
use tokio::sync::watch;

use shared::{ShiftHistoryEntry, ShiftOutcome};

use crate::domain::clock::{self, Clock};
use crate::domain::commands::shift::{
    EditStartTimeCommand, FinalizeShiftResult, RecordDistanceCommand, RecordEarningCommand,
    RecordExpenseCommand,
};
use crate::domain::models::shift::{EntryValidationError, ShiftState};
use crate::storage::{HistoryStorage, ShiftStorage};

const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Service managing the single live shift of one driver session
pub struct ShiftService {
    driver_id: String,
    shift: RwLock<ShiftState>,
    storage: Arc<dyn ShiftStorage>,
    history: Arc<dyn HistoryStorage>,
    clock: Arc<dyn Clock>,
    /// Bumped on every transition so the display ticker can re-align
    changes: watch::Sender<u64>,
}

impl ShiftService {
    /// Create the service, rehydrating any persisted shift.
    ///
    /// A snapshot that fails validation (missing start timestamp, pause
    /// bookkeeping inconsistencies, negative accumulators) is discarded in
    /// favor of a safe idle state.
    pub fn new(
        driver_id: impl Into<String>,
        storage: Arc<dyn ShiftStorage>,
        history: Arc<dyn HistoryStorage>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let driver_id = driver_id.into();

        let shift = match storage.load_shift(&driver_id) {
            Ok(Some(loaded)) => match loaded.validate() {
                Ok(()) => {
                    info!("Rehydrated shift for driver {}", driver_id);
                    loaded
                }
                Err(reason) => {
                    warn!(
                        "Discarding unresumable shift for driver {}: {}",
                        driver_id, reason
                    );
                    ShiftState::default()
                }
            },
            Ok(None) => ShiftState::default(),
            Err(e) => {
                warn!("Failed to load shift for driver {}: {}", driver_id, e);
                ShiftState::default()
            }
        };

        let (changes, _) = watch::channel(0);

        Self {
            driver_id,
            shift: RwLock::new(shift),
            storage,
            history,
            clock,
            changes,
        }
    }

    pub fn driver_id(&self) -> &str {
        &self.driver_id
    }

    /// Current state value (cheap clone of the aggregate)
    pub fn current(&self) -> ShiftState {
        self.shift.read().expect("shift lock poisoned").clone()
    }

    /// Elapsed active milliseconds at this instant
    pub fn elapsed_ms(&self) -> i64 {
        let shift = self.shift.read().expect("shift lock poisoned");
        clock::elapsed_ms(&shift, self.clock.now_ms())
    }

    /// Elapsed active minutes at this instant
    pub fn elapsed_minutes(&self) -> i64 {
        let shift = self.shift.read().expect("shift lock poisoned");
        clock::elapsed_minutes(&shift, self.clock.now_ms())
    }

    /// Subscribe to transition notifications (used by the display ticker)
    pub fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Begin a new shift. No-op while a shift is already active.
    pub fn start(&self) -> ShiftState {
        info!("Starting shift for driver {}", self.driver_id);
        self.apply(|shift, now| shift.started(now))
    }

    /// Pause the running shift. No-op unless running.
    pub fn pause(&self) -> ShiftState {
        info!("Pausing shift for driver {}", self.driver_id);
        self.apply(|shift, now| shift.paused(now))
    }

    /// Resume the paused shift. No-op unless paused.
    pub fn resume(&self) -> ShiftState {
        info!("Resuming shift for driver {}", self.driver_id);
        self.apply(|shift, now| shift.resumed(now))
    }

    /// Freeze the clock ahead of finalization. The shift stays active so
    /// its totals remain visible to the confirmation step.
    pub fn stop(&self) -> ShiftState {
        info!("Stopping shift for driver {}", self.driver_id);
        self.apply(|shift, now| shift.stopped(now))
    }

    /// Discard the current shift unconditionally (logout, or after the
    /// finalize confirmation)
    pub fn reset(&self) -> ShiftState {
        info!("Resetting shift for driver {}", self.driver_id);
        let next = self.apply(|_, _| ShiftState::default());
        if let Err(e) = self.storage.clear_shift(&self.driver_id) {
            warn!("Failed to clear persisted shift: {}", e);
        }
        next
    }

    /// Correct the shift start instant. Future instants are clamped to now.
    pub fn edit_start_time(&self, command: EditStartTimeCommand) -> ShiftState {
        info!(
            "Editing start time for driver {}: {}",
            self.driver_id, command.start_time_ms
        );
        self.apply(|shift, now| shift.with_start_time(command.start_time_ms, now))
    }

    /// Report the running earnings total for one platform (replaces the
    /// previous value). Ignored unless the shift is running.
    pub fn record_earning(&self, command: RecordEarningCommand) -> Result<ShiftState> {
        if command.amount < 0.0 {
            return Err(EntryValidationError::NegativeEarning.into());
        }
        info!(
            "Recording {} earnings {:.2} for driver {}",
            command.platform, command.amount, self.driver_id
        );
        Ok(self.apply(|shift, _| shift.with_earning(command.platform, command.amount)))
    }

    /// Record one expense. Ignored unless the shift is running.
    pub fn record_expense(&self, command: RecordExpenseCommand) -> Result<ShiftState> {
        if command.amount <= 0.0 {
            return Err(EntryValidationError::NonPositiveExpense.into());
        }
        if let Some(description) = &command.description {
            if description.len() > MAX_DESCRIPTION_LENGTH {
                return Err(EntryValidationError::DescriptionTooLong.into());
            }
        }
        info!(
            "Recording expense {:.2} for driver {}",
            command.amount, self.driver_id
        );
        // Empty strings mean "not provided"; storing them would not survive
        // the history encoding
        let description = command.description.filter(|d| !d.is_empty());
        let category = command.category.filter(|c| !c.is_empty());
        Ok(self.apply(|shift, now| shift.with_expense(command.amount, description, category, now)))
    }

    /// Add distance driven. Ignored unless the shift is running.
    pub fn record_distance(&self, command: RecordDistanceCommand) -> Result<ShiftState> {
        if command.km <= 0.0 {
            return Err(EntryValidationError::NonPositiveDistance.into());
        }
        info!(
            "Recording {:.1} km for driver {}",
            command.km, self.driver_id
        );
        Ok(self.apply(|shift, _| shift.with_distance(command.km)))
    }

    /// Commit the stopped shift to history and reset to idle.
    ///
    /// The clock is frozen first if the caller skipped the explicit stop.
    /// Unlike snapshot saves, a history-sink failure propagates and leaves
    /// the shift stopped so the commit can be retried.
    pub fn finalize(&self) -> Result<FinalizeShiftResult> {
        let now = self.clock.now_ms();
        let mut guard = self.shift.write().expect("shift lock poisoned");

        if !guard.is_active {
            return Err(anyhow::anyhow!("No active shift to finalize"));
        }

        let stopped = guard.clone().stopped(now);
        *guard = stopped.clone();

        let outcome = ShiftOutcome {
            gross_amount: stopped.earnings.gross(),
            km: stopped.km,
            duration_hours: clock::elapsed_ms(&stopped, now) as f64 / 3_600_000.0,
            expense_list: stopped.expense_list.clone(),
        };

        let entry = ShiftHistoryEntry {
            id: ShiftHistoryEntry::generate_id(now.max(0) as u64),
            ended_at: chrono::DateTime::from_timestamp_millis(now)
                .map(|dt| dt.to_rfc3339())
                .unwrap_or_default(),
            gross_amount: outcome.gross_amount,
            km: outcome.km,
            duration_hours: outcome.duration_hours,
            expenses_total: stopped.expenses,
        };

        if let Err(e) = self
            .history
            .append_shift(&self.driver_id, &entry, &outcome.expense_list)
        {
            drop(guard);
            if let Err(se) = self.storage.store_shift(&self.driver_id, &stopped) {
                warn!("Failed to persist stopped shift: {}", se);
            }
            self.notify();
            return Err(e);
        }

        *guard = ShiftState::default();
        drop(guard);

        if let Err(e) = self.storage.clear_shift(&self.driver_id) {
            warn!("Failed to clear persisted shift: {}", e);
        }
        self.notify();

        info!(
            "Finalized shift {} for driver {}: gross {:.2}, {:.1} km, {:.2} h",
            entry.id, self.driver_id, outcome.gross_amount, outcome.km, outcome.duration_hours
        );

        Ok(FinalizeShiftResult {
            outcome,
            history_id: entry.id,
        })
    }

    /// Finalized shifts, most recent first
    pub fn list_history(&self) -> Result<Vec<ShiftHistoryEntry>> {
        self.history.list_shifts(&self.driver_id)
    }

    /// Archived expense entries of one finalized shift
    pub fn list_history_expenses(&self, shift_id: &str) -> Result<Vec<shared::ExpenseEntry>> {
        self.history.list_shift_expenses(&self.driver_id, shift_id)
    }

    /// Apply a transition atomically, persist the new snapshot, and wake
    /// subscribers
    fn apply<F>(&self, transition: F) -> ShiftState
    where
        F: FnOnce(ShiftState, i64) -> ShiftState,
    {
        let now = self.clock.now_ms();
        let next = {
            let mut guard = self.shift.write().expect("shift lock poisoned");
            let next = transition(guard.clone(), now);
            *guard = next.clone();
            next
        };

        if let Err(e) = self.storage.store_shift(&self.driver_id, &next) {
            warn!(
                "Failed to persist shift for driver {}: {} (in-memory state remains authoritative)",
                self.driver_id, e
            );
        }
        self.notify();
        next
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }
}
