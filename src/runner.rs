use std::time::Duration;

use chrono::Utc;
use serde_json::Map;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info, warn};

use crate::config::ConfigCatalog;
use crate::error::{AppError, SessionError};
use crate::orders::{Order, StoreLayout};
use crate::session::GameSession;
use crate::store::{NewUser, RemoteStore};
use crate::telemetry::forward;

/// Default clock resolution.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(10);

/// Drives a [`GameSession`] against a remote store.
///
/// The runner owns the I/O side of a session: it picks and loads the job
/// condition, registers the player, ticks the clock and forwards queued
/// telemetry. The session itself never awaits anything.
pub struct SessionRunner<S: RemoteStore> {
    store: S,
    catalog: ConfigCatalog,
    tick_interval: Duration,
}

impl<S: RemoteStore> SessionRunner<S> {
    pub fn new(store: S, catalog: ConfigCatalog) -> Self {
        Self {
            store,
            catalog,
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Self {
        self.tick_interval = tick_interval.max(Duration::from_millis(1));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn authenticate(&self, user_id: &str, password: &str) -> Result<bool, AppError> {
        let ok = self.store.authenticate_user(user_id, password).await?;
        if !ok {
            warn!(user = user_id, "authentication rejected");
        }
        Ok(ok)
    }

    /// Chooses a job condition and installs its orders and stores.
    ///
    /// With several conditions the shared counter balances players across
    /// them. Missing or unreadable files are logged and leave the session
    /// with no orders. Returns the chosen condition index.
    pub async fn load_game(&self, session: &mut GameSession) -> Result<usize, AppError> {
        let conditions = session.config().conditions.clone();
        if conditions.is_empty() {
            warn!("no conditions configured");
            return Ok(0);
        }

        let mut n = 0;
        if conditions.len() > 1 {
            let value = self.store.get_counter().await?;
            self.store.increment_counter().await?;
            n = (value % conditions.len() as u64) as usize;
        }

        let condition = &conditions[n];
        let orders: Option<Vec<Order>> = self.catalog.load_by_name(&condition.order_file);
        let layout: Option<StoreLayout> = self.catalog.load_by_name(&condition.store_file);
        match (orders, layout) {
            (Some(orders), Some(layout)) => {
                info!(condition = n, orders = orders.len(), "loaded job condition");
                session.apply_condition(orders, layout);
            }
            _ => {
                error!(
                    condition = n,
                    order_file = %condition.order_file,
                    store_file = %condition.store_file,
                    "could not find files specified in configuration"
                );
                session.apply_condition(Vec::new(), StoreLayout::default());
            }
        }
        Ok(n)
    }

    /// Loads the game and registers `user_id` with the chosen condition.
    /// A `company_id` missing from the game config is rejected before
    /// anything is sent to the store.
    pub async fn create_new_user(
        &self,
        session: &mut GameSession,
        user_id: &str,
        company_id: Option<&str>,
    ) -> Result<usize, AppError> {
        if let Some(id) = company_id
            && session.config().company(id).is_none()
        {
            return Err(SessionError::UnknownCompany(id.to_string()).into());
        }
        let condition = self.load_game(session).await?;
        session.set_user_id(user_id);
        self.store
            .create_user(&NewUser {
                id: user_id.to_string(),
                condition,
                company_id: company_id.map(str::to_string),
            })
            .await?;
        Ok(condition)
    }

    /// Sends everything the session has queued. Returns the number of
    /// writes that failed and were dropped.
    pub async fn flush(&self, session: &mut GameSession) -> usize {
        let writes = session.take_writes();
        if writes.is_empty() {
            return 0;
        }
        debug!(writes = writes.len(), "forwarding telemetry");
        forward(&self.store, writes).await
    }

    /// Runs the session until game over. Returns the final earnings.
    pub async fn run(&self, session: &mut GameSession) -> Result<f64, AppError> {
        self.run_with(session, |_| {}).await
    }

    /// Like [`run`](Self::run), calling `hook` once per game second after
    /// the timers and hourly pay have been updated.
    pub async fn run_with<F>(&self, session: &mut GameSession, mut hook: F) -> Result<f64, AppError>
    where
        F: FnMut(&mut GameSession),
    {
        if session.is_game_over() {
            return Ok(session.earned());
        }

        let mut clock = interval(self.tick_interval);
        clock.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut seconds = interval(Duration::from_secs(1));
        seconds.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // both intervals fire immediately once
        seconds.tick().await;

        let mut failed = 0;
        loop {
            tokio::select! {
                _ = clock.tick() => {
                    if session.tick(Utc::now()) {
                        break;
                    }
                }
                _ = seconds.tick() => {
                    session.tick_second();
                    session.update_hourly_earned();
                    hook(&mut *session);
                    failed += self.flush(session).await;
                }
            }
        }

        failed += self.flush(session).await;
        if failed > 0 {
            warn!(failed, "some telemetry writes were dropped");
        }
        Ok(session.earned())
    }
}

/// Plays a session without a human: starts the first visible order, waits
/// the configured think time, then fulfills it.
#[derive(Debug, Clone)]
pub struct Autoplayer {
    think_secs: u64,
    finish_at: Option<u64>,
}

impl Autoplayer {
    pub fn new(think_time: Option<f64>) -> Self {
        let think_secs = think_time
            .filter(|t| t.is_finite() && *t > 0.0)
            .map_or(1, |t| t.round() as u64);
        Self {
            think_secs,
            finish_at: None,
        }
    }

    pub fn think_secs(&self) -> u64 {
        self.think_secs
    }

    pub fn step(&mut self, session: &mut GameSession) {
        if session.is_game_over() {
            return;
        }
        if session.current_company().is_none() {
            let first = session.config().companies.first().map(|c| c.id.clone());
            if let Some(id) = first
                && let Err(err) = session.switch_company(&id)
            {
                warn!(error = %err, "autoplay could not pick a company");
            }
            return;
        }
        if session.waiting_for_next_job() || session.order_list().is_empty() {
            return;
        }

        let now = session.elapsed();
        match self.finish_at {
            None => {
                if session.start_order(0).is_ok() {
                    self.finish_at = Some(now + self.think_secs);
                }
            }
            Some(at) if now >= at => {
                self.finish_at = None;
                match session.fulfill_order(0, Map::new()) {
                    Ok(order) => debug!(order = %order.id, "autoplay fulfilled order"),
                    Err(err) => warn!(error = %err, "autoplay could not fulfill order"),
                }
            }
            Some(_) => {}
        }
    }
}
