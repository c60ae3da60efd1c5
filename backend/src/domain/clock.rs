//! Wall-clock source and elapsed-time arithmetic.
//!
//! Elapsed time is always derived from the shift's stored timestamps at the
//! evaluation instant, never from an incrementing counter. That makes the
//! value correct immediately after a reload, a suspended timer, or a missed
//! tick: recomputing from the same timestamps always agrees with ground
//! truth.

use crate::domain::models::shift::ShiftState;

/// One display-resolution tick of the live counter
pub const MINUTE_MS: i64 = 60_000;

/// Injectable wall-clock source (epoch milliseconds)
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

/// System wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Elapsed active (non-paused) milliseconds for a shift at `now_ms`.
///
/// Returns 0 for an inactive shift or one without a start timestamp, and
/// never goes negative: malformed timestamps degrade to 0 rather than an
/// error.
pub fn elapsed_ms(state: &ShiftState, now_ms: i64) -> i64 {
    if !state.is_active {
        return 0;
    }
    let start = match state.start_time_ms {
        Some(start) => start,
        None => return 0,
    };

    let open_pause_ms = match (state.is_paused, state.paused_at_ms) {
        (true, Some(paused_at)) => (now_ms - paused_at).max(0),
        _ => 0,
    };

    (now_ms - start - state.total_paused_ms - open_pause_ms).max(0)
}

/// Elapsed active minutes, the contractual display resolution
pub fn elapsed_minutes(state: &ShiftState, now_ms: i64) -> i64 {
    elapsed_ms(state, now_ms) / MINUTE_MS
}

/// Delay until the next exact minute boundary of the live counter
pub fn delay_to_next_minute(elapsed_ms: i64) -> std::time::Duration {
    let remainder = elapsed_ms.rem_euclid(MINUTE_MS);
    std::time::Duration::from_millis((MINUTE_MS - remainder) as u64)
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const T0: i64 = 1_700_000_000_000;

    #[test]
    fn test_idle_shift_elapsed_is_zero() {
        let state = ShiftState::default();
        assert_eq!(elapsed_ms(&state, T0), 0);
        assert_eq!(elapsed_minutes(&state, T0), 0);
    }

    #[test]
    fn test_active_without_start_degrades_to_zero() {
        let mut state = ShiftState::default();
        state.is_active = true;
        assert_eq!(elapsed_ms(&state, T0 + 60_000), 0);
    }

    #[test]
    fn test_elapsed_excludes_pause_segments() {
        // start at t0, pause at t0+5s, resume at t0+15s, evaluate at t0+20s
        let state = ShiftState::default()
            .started(T0)
            .paused(T0 + 5_000)
            .resumed(T0 + 15_000);

        assert_eq!(elapsed_ms(&state, T0 + 20_000), 10_000);
        assert_eq!(elapsed_minutes(&state, T0 + 20_000), 0);
    }

    #[test]
    fn test_open_pause_segment_freezes_elapsed() {
        let state = ShiftState::default().started(T0).paused(T0 + 30_000);

        // Clock is frozen at 30s no matter how late we evaluate
        assert_eq!(elapsed_ms(&state, T0 + 30_000), 30_000);
        assert_eq!(elapsed_ms(&state, T0 + 900_000), 30_000);
    }

    #[test]
    fn test_minute_floor() {
        let state = ShiftState::default().started(T0);
        assert_eq!(elapsed_minutes(&state, T0 + 125_000), 2);
        assert_eq!(elapsed_minutes(&state, T0 + 59_999), 0);
        assert_eq!(elapsed_minutes(&state, T0 + 60_000), 1);
    }

    #[test]
    fn test_elapsed_never_negative() {
        // Clock drift: evaluation instant before the recorded start
        let state = ShiftState::default().started(T0);
        assert_eq!(elapsed_ms(&state, T0 - 10_000), 0);

        // Pause timestamp after the evaluation instant
        let state = ShiftState::default().started(T0).paused(T0 + 60_000);
        assert_eq!(elapsed_ms(&state, T0 + 30_000), 30_000);
    }

    #[test]
    fn test_delay_to_next_minute() {
        assert_eq!(delay_to_next_minute(0), Duration::from_millis(60_000));
        assert_eq!(delay_to_next_minute(1_000), Duration::from_millis(59_000));
        assert_eq!(delay_to_next_minute(59_999), Duration::from_millis(1));
        assert_eq!(delay_to_next_minute(60_000), Duration::from_millis(60_000));
        assert_eq!(delay_to_next_minute(125_000), Duration::from_millis(55_000));
    }

    #[test]
    fn test_system_clock_is_sane() {
        // Epoch millis for any date after 2020
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }
}
