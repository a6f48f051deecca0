//! Wall-clock based game timer with pause support and a one-shot time limit.

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;

/// Result of a single clock tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTick {
    /// Elapsed game seconds after this tick.
    pub elapsed: u64,
    /// True only on the tick that crossed the time limit.
    pub game_over: bool,
}

/// Elapsed game time: wall-clock time since start minus time spent paused.
#[derive(Debug, Clone)]
pub struct SessionClock {
    started_at: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    pause_duration: TimeDelta,
    time_limit: u64,
    elapsed: u64,
    game_over: bool,
}

impl SessionClock {
    pub fn new(time_limit: u64, now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            paused_at: None,
            pause_duration: TimeDelta::zero(),
            time_limit,
            elapsed: 0,
            game_over: false,
        }
    }

    pub fn time_limit(&self) -> u64 {
        self.time_limit
    }

    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn pause_duration(&self) -> TimeDelta {
        self.pause_duration
    }

    /// Elapsed seconds as of the last tick.
    pub fn elapsed(&self) -> u64 {
        self.elapsed
    }

    /// Elapsed milliseconds at `now`. Frozen at the pause instant while paused.
    pub fn elapsed_ms(&self, now: DateTime<Utc>) -> i64 {
        let reference = self.paused_at.unwrap_or(now);
        (reference - self.started_at - self.pause_duration)
            .num_milliseconds()
            .max(0)
    }

    /// Elapsed milliseconds rounded to the nearest second.
    pub fn elapsed_secs(&self, now: DateTime<Utc>) -> u64 {
        (self.elapsed_ms(now) as u64 + 500) / 1000
    }

    /// Recomputes elapsed time and fires game over the first time it reaches
    /// the limit. After game over the clock is stopped at the limit.
    pub fn tick(&mut self, now: DateTime<Utc>) -> ClockTick {
        if self.game_over {
            return ClockTick {
                elapsed: self.elapsed,
                game_over: false,
            };
        }
        let elapsed = self.elapsed_secs(now);
        if elapsed >= self.time_limit {
            self.elapsed = self.time_limit;
            self.game_over = true;
            info!(limit = self.time_limit, "time limit reached, game over");
            return ClockTick {
                elapsed: self.elapsed,
                game_over: true,
            };
        }
        self.elapsed = elapsed;
        ClockTick {
            elapsed,
            game_over: false,
        }
    }

    pub fn pause(&mut self, now: DateTime<Utc>) {
        if self.paused_at.is_none() && !self.game_over {
            self.paused_at = Some(now);
        }
    }

    pub fn resume(&mut self, now: DateTime<Utc>) {
        if let Some(paused_at) = self.paused_at.take() {
            self.pause_duration += (now - paused_at).max(TimeDelta::zero());
        }
    }

    /// Pauses a running clock or resumes a paused one.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        if self.is_paused() {
            self.resume(now);
        } else {
            self.pause(now);
        }
    }

    /// Restarts timing from `now` and forgets previous pauses.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.started_at = now;
        self.paused_at = None;
        self.pause_duration = TimeDelta::zero();
        self.elapsed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-22T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn at(ms: i64) -> DateTime<Utc> {
        t0() + TimeDelta::milliseconds(ms)
    }

    #[test]
    fn elapsed_without_pauses_is_wall_delta() {
        let mut clock = SessionClock::new(600, t0());
        assert_eq!(clock.elapsed_ms(at(12_345)), 12_345);
        assert_eq!(clock.tick(at(12_345)).elapsed, 12);
        assert_eq!(clock.tick(at(12_500)).elapsed, 13);
    }

    #[test]
    fn pause_then_resume_subtracts_pause() {
        let mut clock = SessionClock::new(600, t0());
        clock.pause(at(10_000));
        assert!(clock.is_paused());
        // frozen while paused
        assert_eq!(clock.elapsed_ms(at(25_000)), 10_000);
        clock.resume(at(30_000));
        assert_eq!(clock.pause_duration(), TimeDelta::seconds(20));
        assert_eq!(clock.elapsed_ms(at(45_000)), 25_000);
    }

    #[test]
    fn toggle_pauses_and_resumes() {
        let mut clock = SessionClock::new(600, t0());
        clock.toggle(at(1_000));
        assert!(clock.is_paused());
        clock.toggle(at(4_000));
        assert!(!clock.is_paused());
        assert_eq!(clock.elapsed_ms(at(5_000)), 2_000);
    }

    #[test]
    fn game_over_fires_exactly_once() {
        let mut clock = SessionClock::new(10, t0());
        assert!(!clock.tick(at(9_000)).game_over);
        let tick = clock.tick(at(9_600));
        assert!(tick.game_over);
        assert_eq!(tick.elapsed, 10);
        assert!(clock.is_game_over());

        for ms in [10_000, 11_000, 60_000] {
            let tick = clock.tick(at(ms));
            assert!(!tick.game_over);
            assert_eq!(tick.elapsed, 10);
        }
    }

    #[test]
    fn game_over_clamps_late_ticks_to_limit() {
        let mut clock = SessionClock::new(10, t0());
        let tick = clock.tick(at(45_000));
        assert!(tick.game_over);
        assert_eq!(tick.elapsed, 10);
    }

    #[test]
    fn cannot_pause_after_game_over() {
        let mut clock = SessionClock::new(1, t0());
        clock.tick(at(2_000));
        clock.pause(at(3_000));
        assert!(!clock.is_paused());
    }

    #[test]
    fn reset_restarts_from_now() {
        let mut clock = SessionClock::new(600, t0());
        clock.pause(at(1_000));
        clock.reset(at(5_000));
        assert!(!clock.is_paused());
        assert_eq!(clock.elapsed_ms(at(8_000)), 3_000);
    }

    #[test]
    fn clock_readings_before_start_are_zero() {
        let clock = SessionClock::new(600, at(5_000));
        assert_eq!(clock.elapsed_ms(t0()), 0);
    }
}
