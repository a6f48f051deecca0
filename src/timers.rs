//! One-second countdowns: the break between jobs and per-order tip timers.
//!
//! Both are driven by an external one-second tick instead of owning their own
//! intervals, so the runner decides when time passes.

use serde::{Deserialize, Serialize};

/// Countdown shown while the player waits for the next job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BreakTimer {
    remaining: u32,
    active: bool,
}

impl BreakTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts (or restarts) a break of `seconds`.
    pub fn start(&mut self, seconds: u32) {
        self.remaining = seconds;
        self.active = true;
    }

    pub fn cancel(&mut self) {
        self.remaining = 0;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Advances the countdown by one second. Returns `true` on the tick that
    /// ends the break.
    pub fn tick(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let next = self.remaining.saturating_sub(1);
        if next == 0 {
            self.cancel();
            return true;
        }
        self.remaining = next;
        false
    }
}

/// Countdown attached to an order while a tip is still on offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TipTimer {
    pub order_id: String,
    pub remaining_time: u32,
    pub running: bool,
}

/// All tip timers of the session, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TipTimers {
    timers: Vec<TipTimer>,
}

impl TipTimers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a stopped timer for `order_id`.
    pub fn create(&mut self, order_id: impl Into<String>, initial_time: u32) {
        self.timers.push(TipTimer {
            order_id: order_id.into(),
            remaining_time: initial_time,
            running: false,
        });
    }

    pub fn start(&mut self, order_id: &str) {
        self.set_running(order_id, true);
    }

    pub fn stop(&mut self, order_id: &str) {
        self.set_running(order_id, false);
    }

    pub fn remove(&mut self, order_id: &str) {
        self.timers.retain(|t| t.order_id != order_id);
    }

    pub fn get(&self, order_id: &str) -> Option<&TipTimer> {
        self.timers.iter().find(|t| t.order_id == order_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TipTimer> {
        self.timers.iter()
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }

    /// Decrements every running timer that still has time left.
    pub fn tick(&mut self) {
        for timer in self.timers.iter_mut().filter(|t| t.running) {
            timer.remaining_time = timer.remaining_time.saturating_sub(1);
        }
    }

    fn set_running(&mut self, order_id: &str, running: bool) {
        for timer in self.timers.iter_mut().filter(|t| t.order_id == order_id) {
            timer.running = running;
        }
    }
}
