use serde::{Deserialize, Serialize};

/// Seconds in an hour, for hourly rate arithmetic.
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Rounds a dollar amount to cents, half away from zero.
///
/// `f64::EPSILON` is added first so values like `1.005` land on the
/// expected side of the half-cent.
pub fn round_to_cents(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    ((value + f64::EPSILON) * 100.0).round() / 100.0
}

/// Running earnings for a session, in both payout modes.
///
/// Per-job payouts land in `per_job_total` immediately. Hourly pay accrues
/// continuously while a session is active and is folded into
/// `hourly_accumulated` when the session is finalized. Times are game
/// seconds as reported by the session clock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsState {
    per_job_total: f64,
    hourly_accumulated: f64,
    hourly_session_start: Option<u64>,
    hourly_rate_active: f64,
}

impl EarningsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn per_job_total(&self) -> f64 {
        self.per_job_total
    }

    pub fn hourly_accumulated(&self) -> f64 {
        self.hourly_accumulated
    }

    pub fn hourly_session_start(&self) -> Option<u64> {
        self.hourly_session_start
    }

    pub fn hourly_rate_active(&self) -> f64 {
        self.hourly_rate_active
    }

    pub fn has_active_session(&self) -> bool {
        self.hourly_session_start.is_some() && self.hourly_rate_active > 0.0
    }

    /// Adds a per-job payout. Zero and non-finite amounts are ignored.
    /// Returns whether the payout was applied.
    pub fn record_per_job_payout(&mut self, amount: f64) -> bool {
        if amount == 0.0 || !amount.is_finite() {
            return false;
        }
        self.per_job_total = round_to_cents(self.per_job_total + amount);
        true
    }

    /// Seconds the active hourly session has been running at `elapsed`.
    pub fn active_seconds(&self, elapsed: u64) -> u64 {
        match self.hourly_session_start {
            Some(start) if self.hourly_rate_active > 0.0 => elapsed.saturating_sub(start),
            _ => 0,
        }
    }

    /// Accumulated hourly pay plus whatever the active session has accrued.
    pub fn hourly_earnings(&self, elapsed: u64) -> f64 {
        let active = self.active_seconds(elapsed) as f64 / SECONDS_PER_HOUR * self.hourly_rate_active;
        round_to_cents(self.hourly_accumulated + active)
    }

    /// Total earned at `elapsed`: per-job payouts plus hourly earnings.
    pub fn total(&self, elapsed: u64) -> f64 {
        round_to_cents(self.per_job_total + self.hourly_earnings(elapsed))
    }

    /// Starts an hourly session at `elapsed`. Any session still running is
    /// finalized first so its seconds are kept.
    pub fn activate(&mut self, rate: f64, elapsed: u64) {
        self.finalize(elapsed);
        self.hourly_rate_active = if rate.is_finite() { rate.max(0.0) } else { 0.0 };
        self.hourly_session_start = Some(elapsed);
    }

    /// Folds the active session into the accumulated total and clears it.
    /// Calling it again without a new `activate` changes nothing.
    pub fn finalize(&mut self, elapsed: u64) {
        if self.has_active_session() {
            let earned = self.active_seconds(elapsed) as f64 / SECONDS_PER_HOUR * self.hourly_rate_active;
            self.hourly_accumulated = round_to_cents(self.hourly_accumulated + earned);
        }
        self.hourly_session_start = None;
        self.hourly_rate_active = 0.0;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounding_to_cents() {
        assert_eq!(round_to_cents(1.005), 1.01);
        assert_eq!(round_to_cents(2.344), 2.34);
        assert_eq!(round_to_cents(0.0), 0.0);
        assert_eq!(round_to_cents(f64::NAN), 0.0);
    }

    #[test]
    fn per_job_payouts_accumulate() {
        let mut e = EarningsState::new();
        assert!(e.record_per_job_payout(4.5));
        assert!(e.record_per_job_payout(3.25));
        assert_eq!(e.per_job_total(), 7.75);
        assert_eq!(e.total(0), 7.75);
    }

    #[test]
    fn zero_and_nan_payouts_are_ignored() {
        let mut e = EarningsState::new();
        assert!(!e.record_per_job_payout(0.0));
        assert!(!e.record_per_job_payout(f64::NAN));
        assert_eq!(e.per_job_total(), 0.0);
    }

    #[test]
    fn hourly_accrues_with_elapsed_time() {
        let mut e = EarningsState::new();
        e.activate(18.0, 100);
        assert_eq!(e.hourly_earnings(100), 0.0);
        // 30 minutes at $18/h
        assert_eq!(e.hourly_earnings(1900), 9.0);
        // clock readings before the session started accrue nothing
        assert_eq!(e.hourly_earnings(50), 0.0);
    }

    #[test]
    fn total_is_per_job_plus_hourly() {
        let mut e = EarningsState::new();
        e.activate(12.0, 0);
        e.record_per_job_payout(5.25);
        for elapsed in [0, 1, 59, 600, 3599, 7200] {
            assert_eq!(
                e.total(elapsed),
                round_to_cents(e.per_job_total() + e.hourly_earnings(elapsed))
            );
        }
        assert_eq!(e.total(600), 7.25);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut e = EarningsState::new();
        e.activate(36.0, 0);
        e.finalize(100);
        assert_eq!(e.hourly_accumulated(), 1.0);
        assert!(!e.has_active_session());

        e.finalize(200);
        assert_eq!(e.hourly_accumulated(), 1.0);
        assert_eq!(e.hourly_earnings(10_000), 1.0);
    }

    #[test]
    fn reactivation_does_not_double_count() {
        let mut e = EarningsState::new();
        e.activate(36.0, 0);
        // Activating again keeps the first 100s and restarts the session.
        e.activate(36.0, 100);
        assert_eq!(e.hourly_accumulated(), 1.0);
        assert_eq!(e.hourly_earnings(200), 2.0);
    }

    #[test]
    fn zero_rate_session_never_accrues() {
        let mut e = EarningsState::new();
        e.activate(0.0, 0);
        assert!(!e.has_active_session());
        assert_eq!(e.hourly_earnings(3600), 0.0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut e = EarningsState::new();
        e.activate(10.0, 0);
        e.record_per_job_payout(3.0);
        e.reset();
        assert_eq!(e, EarningsState::default());
        assert_eq!(e.total(3600), 0.0);
    }
}
