//! Display ticker for the live shift counter.
//!
//! Drives a "displayed minutes" value that advances once per minute
//! boundary while the shift is running. Every wake re-derives the value
//! from the shift's timestamps instead of incrementing a counter, so a
//! late or missed wake self-corrects on the next one and the displayed
//! value is never more than one minute stale.
//!
//! Wakes come from three sources: the armed boundary sleep (only while
//! running), the service's transition channel, and an explicit
//! [`ShiftTicker::reconcile`] call for when the host regains
//! visibility/focus after the runtime suspended timers.

use log::debug;
use std::sync::Arc;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;

use crate::domain::clock;
use crate::domain::shift_service::ShiftService;

/// Handle to the background display-tick task.
///
/// Dropping the handle cancels the task; a detached timer must never
/// outlive its owning session.
pub struct ShiftTicker {
    minutes_rx: watch::Receiver<i64>,
    reconcile: Arc<Notify>,
    handle: JoinHandle<()>,
}

impl ShiftTicker {
    /// Spawn the ticker for a service. The displayed value is correct
    /// immediately, not starting from zero.
    pub fn spawn(service: Arc<ShiftService>) -> Self {
        let (minutes_tx, minutes_rx) = watch::channel(service.elapsed_minutes());
        let reconcile = Arc::new(Notify::new());
        let wake = reconcile.clone();

        let handle = tokio::spawn(async move {
            let mut changes = service.subscribe_changes();

            loop {
                let minutes = service.elapsed_minutes();
                let updated = minutes_tx.send_if_modified(|displayed| {
                    if *displayed != minutes {
                        *displayed = minutes;
                        true
                    } else {
                        false
                    }
                });
                if updated {
                    debug!("Shift display advanced to {} min", minutes);
                }

                if service.current().is_running() {
                    // Sleep exactly to the next minute boundary; the
                    // recompute on wake absorbs any timer drift.
                    let delay = clock::delay_to_next_minute(service.elapsed_ms());
                    tokio::select! {
                        _ = tokio::time::sleep(delay) => {}
                        _ = wake.notified() => {}
                        result = changes.changed() => {
                            if result.is_err() {
                                break;
                            }
                        }
                    }
                } else {
                    // Paused or idle: no timer armed, display frozen until
                    // a transition or reconcile wakes us.
                    tokio::select! {
                        _ = wake.notified() => {}
                        result = changes.changed() => {
                            if result.is_err() {
                                break;
                            }
                        }
                    }
                }
            }
        });

        Self {
            minutes_rx,
            reconcile,
            handle,
        }
    }

    /// The currently displayed minute count
    pub fn displayed_minutes(&self) -> i64 {
        *self.minutes_rx.borrow()
    }

    /// Watch the displayed value for changes
    pub fn subscribe(&self) -> watch::Receiver<i64> {
        self.minutes_rx.clone()
    }

    /// Force an immediate recomputation, independent of the scheduled
    /// ticks (visibility/focus regain)
    pub fn reconcile(&self) {
        self.reconcile.notify_one();
    }

    /// Cancel the background task
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ShiftTicker {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
