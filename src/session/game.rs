use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::state::{GameFlags, SessionEvent};
use crate::clock::SessionClock;
use crate::config::{Company, GameConfig};
use crate::earnings::EarningsState;
use crate::error::SessionError;
use crate::orders::{Order, OrderPools, OrderStatus, StoreLayout};
use crate::telemetry::{Action, EventLog, Snapshot, StoreWrite};
use crate::timers::{BreakTimer, TipTimers};

/// Number of orders visible to the player at once.
pub const ORDERS_SHOWN: usize = 4;

type Observer = Box<dyn FnMut(&SessionEvent)>;

/// All mutable state of one play session.
///
/// Created when the game loads, mutated by timer ticks and player actions,
/// and finished once the clock reaches the time limit. Observers registered
/// with [`subscribe`](Self::subscribe) are told about every visible change.
pub struct GameSession {
    config: GameConfig,
    pools: OrderPools,
    earnings: EarningsState,
    clock: SessionClock,
    break_timer: BreakTimer,
    tips: TipTimers,
    flags: GameFlags,
    current_company: Option<Company>,
    current_location: Option<String>,
    order_list: Vec<Order>,
    finished_orders: Vec<Order>,
    failed_orders: Vec<Order>,
    unique_sets: u32,
    earned: f64,
    last_logged_hourly: f64,
    log: EventLog,
    observers: Vec<Observer>,
}

impl GameSession {
    pub fn new(config: GameConfig, now: DateTime<Utc>) -> Self {
        let current_company = match config.companies.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        Self {
            pools: OrderPools::new(),
            earnings: EarningsState::new(),
            clock: SessionClock::new(config.time_limit, now),
            break_timer: BreakTimer::new(),
            tips: TipTimers::new(),
            flags: GameFlags::from_config(&config),
            current_company,
            current_location: None,
            order_list: Vec::new(),
            finished_orders: Vec::new(),
            failed_orders: Vec::new(),
            unique_sets: 0,
            earned: 0.0,
            last_logged_hourly: 0.0,
            log: EventLog::new(config.auth),
            observers: Vec::new(),
            config,
        }
    }

    /// Registers an observer for [`SessionEvent`]s.
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    // --- accessors ---

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn pools(&self) -> &OrderPools {
        &self.pools
    }

    pub fn earnings(&self) -> &EarningsState {
        &self.earnings
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn flags(&self) -> &GameFlags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut GameFlags {
        &mut self.flags
    }

    pub fn break_timer(&self) -> &BreakTimer {
        &self.break_timer
    }

    pub fn waiting_for_next_job(&self) -> bool {
        self.break_timer.is_active()
    }

    pub fn tip_timers(&self) -> &TipTimers {
        &self.tips
    }

    pub fn current_company(&self) -> Option<&Company> {
        self.current_company.as_ref()
    }

    pub fn current_location(&self) -> Option<&str> {
        self.current_location.as_deref()
    }

    pub fn order_list(&self) -> &[Order] {
        &self.order_list
    }

    pub fn finished_orders(&self) -> &[Order] {
        &self.finished_orders
    }

    pub fn failed_orders(&self) -> &[Order] {
        &self.failed_orders
    }

    pub fn unique_sets(&self) -> u32 {
        self.unique_sets
    }

    pub fn elapsed(&self) -> u64 {
        self.clock.elapsed()
    }

    pub fn is_game_over(&self) -> bool {
        self.clock.is_game_over()
    }

    /// Last published earnings total.
    pub fn earned(&self) -> f64 {
        self.earned
    }

    /// Live total: per-job payouts plus hourly earnings right now.
    pub fn total_earned(&self) -> f64 {
        self.earnings.total(self.clock.elapsed())
    }

    pub fn event_log(&self) -> &EventLog {
        &self.log
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.log.set_user_id(user_id);
    }

    /// Takes the store writes queued since the last call.
    pub fn take_writes(&mut self) -> Vec<StoreWrite> {
        self.log.drain()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            earnings: self.earned,
            orders_complete: self.finished_orders.len(),
            gametime: self.clock.elapsed(),
            unique_sets_complete: self.unique_sets,
        }
    }

    // --- job condition and orders ---

    /// Installs the order list and store layout of the chosen condition.
    pub fn apply_condition(&mut self, orders: Vec<Order>, layout: StoreLayout) {
        self.pools.switch_job(orders, layout, &self.config.companies);
        self.current_location = self.pools.starting_location().map(str::to_string);
    }

    /// Next `n` orders for the current company.
    pub fn queue_orders(&mut self, n: usize) -> Vec<Order> {
        let company_id = self.current_company.as_ref().map(|c| c.id.clone());
        self.pools.queue_n_fixed_orders(n, company_id.as_deref())
    }

    pub fn set_current_location(&mut self, location: impl Into<String>) {
        self.current_location = Some(location.into());
    }

    /// Logs the visible order at `index` as started, with the other visible
    /// orders as the options the player had.
    pub fn start_order(&mut self, index: usize) -> Result<(), SessionError> {
        self.ensure_running()?;
        if index >= self.order_list.len() {
            return Err(SessionError::NoSuchOrder(index));
        }
        let elapsed = self.clock.elapsed();
        let options: Vec<Order> = self
            .order_list
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != index)
            .map(|(_, o)| o.clone())
            .collect();
        self.log.log_order(&mut self.order_list[index], &options, elapsed);
        Ok(())
    }

    /// Completes the visible order at `index`.
    ///
    /// The order moves to the finished list, per-job companies pay out its
    /// payout, the remote record is closed, one replacement order is queued
    /// and the break between jobs starts.
    pub fn fulfill_order(
        &mut self,
        index: usize,
        metadata: Map<String, Value>,
    ) -> Result<Order, SessionError> {
        self.ensure_running()?;
        if index >= self.order_list.len() {
            return Err(SessionError::NoSuchOrder(index));
        }
        let mut order = self.order_list.remove(index);
        order.status = OrderStatus::Completed;
        order.endgametime = Some(self.clock.elapsed());
        self.finished_orders.push(order.clone());

        let per_job = self.current_company.as_ref().is_none_or(|c| !c.is_hourly());
        if per_job {
            self.record_per_job_payout(order.payout_amount(), &order.id);
        }
        self.complete_order(&order.id, metadata);

        let refill = self.queue_orders(1);
        self.order_list.extend(refill);
        let visible = self.order_list.len();
        self.emit(SessionEvent::OrdersQueued(visible));
        self.start_break_timer();
        Ok(order)
    }

    /// Moves the visible order at `index` to the failed list.
    pub fn fail_order(&mut self, index: usize) -> Result<Order, SessionError> {
        self.ensure_running()?;
        if index >= self.order_list.len() {
            return Err(SessionError::NoSuchOrder(index));
        }
        let order = self.order_list.remove(index);
        self.failed_orders.push(order.clone());
        Ok(order)
    }

    pub fn increment_unique_sets(&mut self) {
        self.unique_sets += 1;
    }

    fn ensure_running(&self) -> Result<(), SessionError> {
        if self.clock.is_game_over() {
            return Err(SessionError::GameOver);
        }
        Ok(())
    }

    // --- clock ---

    /// Advances the session clock. Returns `true` on the tick that ends the
    /// game; that tick finalizes hourly pay and queues the final summary.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let before = self.clock.elapsed();
        let tick = self.clock.tick(now);
        if tick.elapsed != before {
            self.emit(SessionEvent::ElapsedChanged(tick.elapsed));
        }
        if !tick.game_over {
            return false;
        }

        self.earnings.finalize(tick.elapsed);
        self.break_timer.cancel();
        self.publish_earned();
        let fields = self.snapshot().fields_at(self.clock.time_limit());
        self.log.update_fields(fields);
        info!(earned = self.earned, orders = self.finished_orders.len(), "session finished");
        self.emit(SessionEvent::GameOver(self.earned));
        true
    }

    /// Pauses a running clock or resumes a paused one.
    pub fn toggle_time(&mut self, now: DateTime<Utc>) {
        self.clock.toggle(now);
        let event = if self.clock.is_paused() {
            SessionEvent::Paused
        } else {
            SessionEvent::Resumed
        };
        self.emit(event);
    }

    pub fn reset_timer(&mut self, now: DateTime<Utc>) {
        self.clock.reset(now);
    }

    /// One-second tick for the break countdown and tip timers. Both are
    /// frozen while the clock is paused and stop at game over.
    pub fn tick_second(&mut self) {
        if self.clock.is_paused() || self.clock.is_game_over() {
            return;
        }
        self.tips.tick();
        if !self.break_timer.is_active() {
            return;
        }
        if self.break_timer.tick() {
            self.emit(SessionEvent::BreakEnded);
        } else {
            let left = self.break_timer.remaining();
            self.emit(SessionEvent::BreakTick(left));
        }
    }

    pub fn start_break_timer(&mut self) {
        self.break_timer.start(self.config.break_duration);
        let left = self.break_timer.remaining();
        self.emit(SessionEvent::BreakTick(left));
    }

    // --- tip timers ---

    pub fn create_tip_timer(&mut self, order_id: impl Into<String>, initial_time: u32) {
        self.tips.create(order_id, initial_time);
    }

    pub fn start_tip_timer(&mut self, order_id: &str) {
        self.tips.start(order_id);
    }

    pub fn stop_tip_timer(&mut self, order_id: &str) {
        self.tips.stop(order_id);
    }

    pub fn remove_tip_timer(&mut self, order_id: &str) {
        self.tips.remove(order_id);
    }

    // --- companies and earnings ---

    pub fn open_company_switch_modal(&mut self) {
        self.flags.show_company_switch_modal = true;
    }

    pub fn close_company_switch_modal(&mut self) {
        self.flags.show_company_switch_modal = false;
    }

    /// Makes `company_id` the current company.
    ///
    /// Leaving an hourly company finalizes its session; joining a different
    /// hourly company starts a new one. The break is cancelled and the
    /// visible orders are replaced from the new company's pool.
    pub fn switch_company(&mut self, company_id: &str) -> Result<(), SessionError> {
        self.ensure_running()?;
        let selected = self
            .config
            .company(company_id)
            .cloned()
            .ok_or_else(|| SessionError::UnknownCompany(company_id.to_string()))?;
        let elapsed = self.clock.elapsed();
        let previous = self.current_company.take();
        let changed = previous.as_ref().is_none_or(|p| p.id != selected.id);

        if changed {
            if selected.is_hourly() {
                self.earnings.activate(selected.hourly_rate, elapsed);
            } else {
                self.earnings.finalize(elapsed);
            }
        }

        self.current_company = Some(selected.clone());
        self.break_timer.cancel();
        self.flags.company_selected = true;
        self.flags.show_company_switch_modal = false;
        self.order_list = self.pools.queue_n_fixed_orders(ORDERS_SHOWN, Some(&selected.id));
        debug!(company = %selected.id, orders = self.order_list.len(), "company selected");

        let previous_id = previous.map(|p| p.id);
        let visible = self.order_list.len();
        self.emit(SessionEvent::OrdersQueued(visible));
        self.emit(SessionEvent::CompanySwitched {
            previous: previous_id.clone(),
            current: selected.id.clone(),
        });
        self.update_hourly_earned();
        self.log_action(
            Action::system("company_switch")
                .with("previousCompanyId", previous_id)
                .with("newCompanyId", selected.id),
        );
        Ok(())
    }

    /// Adds a per-job payout and publishes the new total.
    pub fn record_per_job_payout(&mut self, amount: f64, order_id: &str) {
        if self.clock.is_game_over() {
            debug!(order = order_id, "payout after game over ignored");
            return;
        }
        if !self.earnings.record_per_job_payout(amount) {
            return;
        }
        self.publish_earned();
        let company_id = self.current_company.as_ref().map(|c| c.id.clone());
        self.log_action(
            Action::system("job_completed_per_job")
                .with("orderId", order_id)
                .with("payoutAmount", crate::earnings::round_to_cents(amount))
                .with("companyId", company_id),
        );
    }

    /// Republishes earnings, starting an hourly session for an hourly
    /// company if none is running. Logs `hourly_pay_update` whenever hourly
    /// pay moved by at least a cent since the last one.
    pub fn update_hourly_earned(&mut self) {
        let company = match &self.current_company {
            Some(c) if c.is_hourly() => c.clone(),
            _ => {
                self.publish_earned();
                return;
            }
        };
        let elapsed = self.clock.elapsed();
        if self.earnings.hourly_session_start().is_none() && !self.clock.is_game_over() {
            self.earnings.activate(company.hourly_rate, elapsed);
        }
        let hourly = self.earnings.hourly_earnings(elapsed);
        self.publish_earned();

        if ((hourly - self.last_logged_hourly) * 100.0).round().abs() >= 1.0 {
            let online = self.earnings.active_seconds(elapsed);
            self.log_action(
                Action::system("hourly_pay_update")
                    .with("hourlyRate", company.hourly_rate)
                    .with("durationOnlineSeconds", online)
                    .with("companyId", company.id)
                    .with("currentHourlyTotal", hourly),
            );
            self.last_logged_hourly = hourly;
        }
    }

    /// Closes the running hourly session and republishes earnings.
    pub fn finalize_company_session(&mut self) {
        self.earnings.finalize(self.clock.elapsed());
        self.publish_earned();
    }

    pub fn reset_earnings_state(&mut self) {
        self.earnings.reset();
        self.last_logged_hourly = 0.0;
        self.earned = 0.0;
        self.emit(SessionEvent::EarningsChanged(0.0));
    }

    fn publish_earned(&mut self) {
        let total = self.earnings.total(self.clock.elapsed());
        if total != self.earned {
            self.earned = total;
            self.emit(SessionEvent::EarningsChanged(total));
        }
    }

    // --- telemetry ---

    pub fn log_action(&mut self, action: Action) {
        let snapshot = self.snapshot();
        self.log.log_action(action, snapshot);
    }

    /// Logs a session-generated event. Same gating as [`log_action`](Self::log_action).
    pub fn log_system_event(&mut self, action_type: &str, details: Map<String, Value>) {
        let mut action = Action::system(action_type);
        action.details = details;
        self.log_action(action);
    }

    pub fn log_order(&mut self, order: &mut Order, options: &[Order]) {
        let elapsed = self.clock.elapsed();
        self.log.log_order(order, options, elapsed);
    }

    pub fn log_bundled_order(&mut self, first: &mut Order, second: &mut Order, options: &[Order]) {
        let elapsed = self.clock.elapsed();
        self.log.log_bundled_order(first, second, options, elapsed);
    }

    pub fn complete_order(&mut self, order_id: &str, metadata: Map<String, Value>) {
        if self.clock.is_game_over() {
            warn!(order = order_id, "order completed after game over, not recorded");
            return;
        }
        let snapshot = self.snapshot();
        self.log.complete_order(order_id, metadata, snapshot);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use serde_json::json;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-10-22T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn at(secs: i64) -> DateTime<Utc> {
        t0() + TimeDelta::seconds(secs)
    }

    fn config() -> GameConfig {
        serde_json::from_value(json!({
            "timeLimit": 3600,
            "auth": true,
            "breakDuration": 2,
            "companies": [
                {"id": "swift", "payment_type": "hourly", "hourlyRate": 36},
                {"id": "dash", "payment_type": "per_job"}
            ]
        }))
        .unwrap()
    }

    fn orders(n: usize) -> Vec<Order> {
        (0..n)
            .map(|i| {
                let mut o = Order::new(format!("o{i}"));
                o.payout = Some(2.5);
                o
            })
            .collect()
    }

    fn session() -> GameSession {
        let mut s = GameSession::new(config(), t0());
        s.apply_condition(orders(10), StoreLayout::default());
        s.set_user_id("p-01");
        s
    }

    fn action_types(writes: &[StoreWrite]) -> Vec<String> {
        writes
            .iter()
            .filter_map(|w| match w {
                StoreWrite::AddAction { record, .. } => record.action_type.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn single_company_is_preselected() {
        let mut cfg = config();
        cfg.companies.truncate(1);
        let s = GameSession::new(cfg, t0());
        assert_eq!(s.current_company().unwrap().id, "swift");
        assert!(s.flags().company_selected);
    }

    #[test]
    fn switch_company_queues_visible_orders() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        assert_eq!(s.current_company().unwrap().id, "dash");
        assert!(s.flags().company_selected);
        // round-robin split: dash gets the odd orders
        let ids: Vec<&str> = s.order_list().iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["o1", "o3", "o5", "o7"]);
    }

    #[test]
    fn unknown_company_is_rejected_without_changes() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        let err = s.switch_company("acme").unwrap_err();
        assert_eq!(err, SessionError::UnknownCompany("acme".into()));
        assert_eq!(s.current_company().unwrap().id, "dash");
    }

    #[test]
    fn switch_cancels_break_and_closes_modal() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.start_break_timer();
        s.open_company_switch_modal();
        assert!(s.waiting_for_next_job());

        s.switch_company("swift").unwrap();
        assert!(!s.waiting_for_next_job());
        assert!(!s.flags().show_company_switch_modal);
    }

    #[test]
    fn hourly_session_finalized_once_on_switch() {
        let mut s = session();
        s.switch_company("swift").unwrap();
        s.tick(at(100));
        s.switch_company("dash").unwrap();
        assert_eq!(s.earnings().hourly_accumulated(), 1.0);
        assert!(!s.earnings().has_active_session());

        // more time on a per-job company adds nothing hourly
        s.tick(at(500));
        s.switch_company("dash").unwrap();
        s.finalize_company_session();
        assert_eq!(s.earnings().hourly_accumulated(), 1.0);
        assert_eq!(s.total_earned(), 1.0);
    }

    #[test]
    fn reselecting_same_hourly_company_keeps_session() {
        let mut s = session();
        s.switch_company("swift").unwrap();
        s.tick(at(100));
        s.switch_company("swift").unwrap();
        assert_eq!(s.earnings().hourly_session_start(), Some(0));
        s.tick(at(200));
        s.update_hourly_earned();
        assert_eq!(s.earned(), 2.0);
    }

    #[test]
    fn displayed_total_matches_invariant() {
        let mut s = session();
        s.switch_company("swift").unwrap();
        s.record_per_job_payout(4.25, "bonus");
        for secs in [10, 250, 1000, 1800] {
            s.tick(at(secs));
            s.update_hourly_earned();
            let elapsed = s.elapsed();
            let expected = crate::earnings::round_to_cents(
                s.earnings().per_job_total() + s.earnings().hourly_earnings(elapsed),
            );
            assert_eq!(s.earned(), expected);
            assert_eq!(s.total_earned(), expected);
        }
    }

    #[test]
    fn per_job_payout_is_published_and_logged() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.take_writes();
        s.record_per_job_payout(3.0, "o1");
        assert_eq!(s.earned(), 3.0);
        let writes = s.take_writes();
        assert_eq!(action_types(&writes), vec!["job_completed_per_job"]);
        match &writes[0] {
            StoreWrite::AddAction { record, .. } => {
                assert_eq!(record.details["payoutAmount"], 3.0);
                assert_eq!(record.details["companyId"], "dash");
                assert_eq!(record.earnings, 3.0);
            }
            other => panic!("unexpected write {other:?}"),
        }
    }

    #[test]
    fn company_switch_is_logged_with_both_ids() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.switch_company("swift").unwrap();
        let writes = s.take_writes();
        let switches: Vec<&StoreWrite> = writes
            .iter()
            .filter(|w| matches!(w, StoreWrite::AddAction { record, .. } if record.button_id == "company_switch"))
            .collect();
        assert_eq!(switches.len(), 2);
        match switches[1] {
            StoreWrite::AddAction { record, .. } => {
                assert_eq!(record.details["previousCompanyId"], "dash");
                assert_eq!(record.details["newCompanyId"], "swift");
            }
            _ => unreachable!(),
        }
        match switches[0] {
            StoreWrite::AddAction { record, .. } => {
                assert!(record.details["previousCompanyId"].is_null());
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn hourly_update_logged_only_on_cent_change() {
        let mut s = session();
        s.switch_company("swift").unwrap();
        s.take_writes();

        // 36/h is one cent per second
        s.tick(at(1));
        s.update_hourly_earned();
        s.update_hourly_earned();
        s.tick(at(2));
        s.update_hourly_earned();
        let writes = s.take_writes();
        assert_eq!(action_types(&writes), vec!["hourly_pay_update", "hourly_pay_update"]);
    }

    #[test]
    fn game_over_fires_once_and_flushes_summary() {
        let mut cfg = config();
        cfg.time_limit = 60;
        let mut s = GameSession::new(cfg, t0());
        s.apply_condition(orders(4), StoreLayout::default());
        s.set_user_id("p-01");
        s.switch_company("swift").unwrap();
        s.take_writes();

        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        s.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        assert!(!s.tick(at(30)));
        assert!(s.tick(at(60)));
        assert!(!s.tick(at(61)));
        assert!(!s.tick(at(120)));
        assert!(s.is_game_over());
        assert_eq!(s.elapsed(), 60);

        // 60s at $36/h
        assert_eq!(s.earned(), 0.6);
        assert!(!s.earnings().has_active_session());

        let game_overs = events
            .borrow()
            .iter()
            .filter(|e| matches!(e, SessionEvent::GameOver(_)))
            .count();
        assert_eq!(game_overs, 1);

        let writes = s.take_writes();
        let summaries: Vec<_> = writes
            .iter()
            .filter_map(|w| match w {
                StoreWrite::UpdateFields { fields, .. } => Some(*fields),
                _ => None,
            })
            .collect();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].gametime, 60);
        assert_eq!(summaries[0].earnings, 0.6);
    }

    #[test]
    fn finished_session_rejects_further_play() {
        let mut cfg = config();
        cfg.time_limit = 10;
        let mut s = GameSession::new(cfg, t0());
        let mut list = orders(4);
        list[1].payout = Some(5.0);
        s.apply_condition(list, StoreLayout::default());
        s.set_user_id("p-01");
        s.switch_company("dash").unwrap();
        assert!(s.tick(at(10)));
        let summary = s.take_writes();
        assert!(summary.iter().any(|w| matches!(w, StoreWrite::UpdateFields { .. })));

        assert_eq!(s.fulfill_order(0, Map::new()), Err(SessionError::GameOver));
        assert_eq!(s.start_order(0), Err(SessionError::GameOver));
        assert_eq!(s.fail_order(0), Err(SessionError::GameOver));
        assert_eq!(s.switch_company("swift"), Err(SessionError::GameOver));
        s.record_per_job_payout(5.0, "o1");
        s.complete_order("o1", Map::new());

        assert_eq!(s.earned(), 0.0);
        assert!(s.finished_orders().is_empty());
        assert_eq!(s.current_company().unwrap().id, "dash");
        assert!(s.take_writes().is_empty());
    }

    #[test]
    fn no_hourly_accrual_after_game_over() {
        let mut cfg = config();
        cfg.time_limit = 100;
        let mut s = GameSession::new(cfg, t0());
        s.switch_company("swift").unwrap();
        s.tick(at(100));
        s.update_hourly_earned();
        s.tick(at(5000));
        s.update_hourly_earned();
        assert_eq!(s.earned(), 1.0);
    }

    #[test]
    fn pause_freezes_elapsed() {
        let mut s = session();
        s.tick(at(10));
        s.toggle_time(at(10));
        s.tick(at(40));
        assert_eq!(s.elapsed(), 10);
        s.toggle_time(at(40));
        s.tick(at(50));
        assert_eq!(s.elapsed(), 20);
    }

    #[test]
    fn break_timer_counts_down_via_seconds() {
        let mut s = session();
        s.start_break_timer();
        assert!(s.waiting_for_next_job());
        assert_eq!(s.break_timer().remaining(), 2);
        s.tick_second();
        assert_eq!(s.break_timer().remaining(), 1);
        s.tick_second();
        assert!(!s.waiting_for_next_job());
        assert_eq!(s.break_timer().remaining(), 0);
    }

    #[test]
    fn countdowns_freeze_while_paused() {
        let mut s = session();
        s.create_tip_timer("o1", 10);
        s.start_tip_timer("o1");
        s.start_break_timer();
        s.toggle_time(at(5));
        s.tick_second();
        assert_eq!(s.break_timer().remaining(), 2);
        assert_eq!(s.tip_timers().get("o1").unwrap().remaining_time, 10);

        s.toggle_time(at(9));
        s.tick_second();
        assert_eq!(s.break_timer().remaining(), 1);
        assert_eq!(s.tip_timers().get("o1").unwrap().remaining_time, 9);
    }

    #[test]
    fn tip_timers_tick_with_seconds() {
        let mut s = session();
        s.create_tip_timer("o1", 10);
        s.start_tip_timer("o1");
        s.tick_second();
        s.tick_second();
        assert_eq!(s.tip_timers().get("o1").unwrap().remaining_time, 8);
        s.stop_tip_timer("o1");
        s.tick_second();
        assert_eq!(s.tip_timers().get("o1").unwrap().remaining_time, 8);
        s.remove_tip_timer("o1");
        assert!(s.tip_timers().is_empty());
    }

    #[test]
    fn fulfill_order_pays_refills_and_breaks() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.take_writes();
        s.tick(at(30));

        let done = s.fulfill_order(0, Map::new()).unwrap();
        assert_eq!(done.id, "o1");
        assert_eq!(done.status, OrderStatus::Completed);
        assert_eq!(done.endgametime, Some(30));
        assert_eq!(s.finished_orders().len(), 1);
        assert_eq!(s.earned(), 2.5);
        // refilled from the pool: dash's fifth order
        assert_eq!(s.order_list().len(), ORDERS_SHOWN);
        assert_eq!(s.order_list().last().unwrap().id, "o9");
        assert!(s.waiting_for_next_job());

        let writes = s.take_writes();
        assert!(writes.iter().any(|w| matches!(
            w,
            StoreWrite::UpdateOrder { order_id, .. } if order_id == "o1"
        )));
        assert!(writes.iter().any(|w| matches!(
            w,
            StoreWrite::UpdateFields { fields, .. } if fields.orders_complete == 1 && fields.earnings == 2.5
        )));
    }

    #[test]
    fn hourly_company_orders_do_not_pay_per_job() {
        let mut s = session();
        s.switch_company("swift").unwrap();
        s.fulfill_order(0, Map::new()).unwrap();
        assert_eq!(s.earnings().per_job_total(), 0.0);
    }

    #[test]
    fn start_order_logs_with_other_visible_options() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.take_writes();
        s.tick(at(12));
        s.start_order(1).unwrap();

        assert_eq!(s.order_list()[1].startgametime, Some(12));
        assert_eq!(s.order_list()[1].options, vec!["o1", "o5", "o7"]);
        let writes = s.take_writes();
        assert!(matches!(&writes[0], StoreWrite::AddOrder { order, .. } if order.id == "o3"));
        assert_eq!(s.start_order(9), Err(SessionError::NoSuchOrder(9)));
    }

    #[test]
    fn fail_order_moves_to_failed_list() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        let failed = s.fail_order(0).unwrap();
        assert_eq!(failed.id, "o1");
        assert_eq!(s.failed_orders().len(), 1);
        assert_eq!(s.order_list().len(), ORDERS_SHOWN - 1);
    }

    #[test]
    fn reset_earnings_state_zeroes_totals() {
        let mut s = session();
        s.switch_company("dash").unwrap();
        s.record_per_job_payout(5.0, "o1");
        s.reset_earnings_state();
        assert_eq!(s.earned(), 0.0);
        assert_eq!(s.total_earned(), 0.0);
    }

    #[test]
    fn system_event_uses_action_type_as_button() {
        let mut s = session();
        let mut details = Map::new();
        details.insert("reason".into(), json!("timeout"));
        s.log_system_event("order_expired", details);
        match &s.take_writes()[0] {
            StoreWrite::AddAction { key, record, .. } => {
                assert_eq!(key, "0_order_expired");
                assert_eq!(record.details["reason"], "timeout");
            }
            other => panic!("unexpected write {other:?}"),
        }
    }

    #[test]
    fn telemetry_is_dropped_without_auth() {
        let mut cfg = config();
        cfg.auth = false;
        let mut s = GameSession::new(cfg, t0());
        s.set_user_id("p-01");
        s.switch_company("dash").unwrap();
        s.record_per_job_payout(1.0, "o1");
        s.log_action(Action::button("refresh"));
        assert!(s.take_writes().is_empty());
    }

    #[test]
    fn apply_condition_sets_starting_location() {
        let mut s = GameSession::new(config(), t0());
        let layout: StoreLayout =
            serde_json::from_value(json!({"startinglocation": "Depot"})).unwrap();
        s.apply_condition(orders(2), layout);
        assert_eq!(s.current_location(), Some("Depot"));
    }

    #[test]
    fn observers_see_elapsed_and_earnings() {
        let mut s = session();
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        s.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        s.switch_company("dash").unwrap();
        s.tick(at(5));
        s.record_per_job_payout(1.5, "o1");

        let events = events.borrow();
        assert!(events.contains(&SessionEvent::OrdersQueued(ORDERS_SHOWN)));
        assert!(events.contains(&SessionEvent::ElapsedChanged(5)));
        assert!(events.contains(&SessionEvent::EarningsChanged(1.5)));
    }
}
