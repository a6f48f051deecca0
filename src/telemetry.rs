//! Gameplay telemetry: builds action and order records and queues them for
//! the remote store.
//!
//! Nothing here talks to the network. [`EventLog`] turns calls into
//! [`StoreWrite`]s in an outbox; [`forward`] later sends a drained batch
//! without retrying. Logging is disabled unless auth is on and a user id is
//! known, in which case every call is silently dropped.

use chrono::Utc;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use crate::orders::{Order, OrderStatus};
use crate::store::{ActionRecord, OrderUpdate, RemoteStore, SessionFields, StoreError};

/// Fallback button id for system events that do not name one.
const SYSTEM_EVENT: &str = "system_event";

/// An action reported by the UI or by the session itself.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Action {
    pub button_id: Option<String>,
    pub action_type: Option<String>,
    pub details: Map<String, Value>,
}

impl Action {
    /// An action triggered by a UI button.
    pub fn button(id: impl Into<String>) -> Self {
        Self {
            button_id: Some(id.into()),
            ..Self::default()
        }
    }

    /// A session-generated event such as `company_switch`.
    pub fn system(action_type: impl Into<String>) -> Self {
        Self {
            action_type: Some(action_type.into()),
            ..Self::default()
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    fn resolved_button_id(&self) -> String {
        self.button_id
            .clone()
            .or_else(|| self.action_type.clone())
            .unwrap_or_else(|| SYSTEM_EVENT.to_string())
    }
}

/// Session figures stamped onto every record.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Snapshot {
    pub earnings: f64,
    pub orders_complete: usize,
    pub gametime: u64,
    pub unique_sets_complete: u32,
}

impl Snapshot {
    pub fn fields(&self) -> SessionFields {
        self.fields_at(self.gametime)
    }

    /// Same figures with `gametime` replaced, used by the game-over flush.
    pub fn fields_at(&self, gametime: u64) -> SessionFields {
        SessionFields {
            earnings: self.earnings,
            orders_complete: self.orders_complete,
            unique_sets_complete: self.unique_sets_complete,
            gametime,
        }
    }
}

/// A pending write to the remote store.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreWrite {
    AddAction {
        user_id: String,
        key: String,
        record: ActionRecord,
    },
    AddOrder {
        user_id: String,
        order: Order,
    },
    UpdateOrder {
        user_id: String,
        order_id: String,
        update: OrderUpdate,
    },
    UpdateFields {
        user_id: String,
        fields: SessionFields,
    },
}

impl StoreWrite {
    fn kind(&self) -> &'static str {
        match self {
            StoreWrite::AddAction { .. } => "add_action",
            StoreWrite::AddOrder { .. } => "add_order",
            StoreWrite::UpdateOrder { .. } => "update_order",
            StoreWrite::UpdateFields { .. } => "update_fields",
        }
    }

    async fn send(&self, store: &impl RemoteStore) -> Result<(), StoreError> {
        match self {
            StoreWrite::AddAction {
                user_id,
                key,
                record,
            } => store.add_action(user_id, record, key).await,
            StoreWrite::AddOrder { user_id, order } => {
                store.add_order(user_id, order, &order.id).await
            }
            StoreWrite::UpdateOrder {
                user_id,
                order_id,
                update,
            } => store.update_order(user_id, update, order_id).await,
            StoreWrite::UpdateFields { user_id, fields } => {
                store.update_fields(user_id, fields).await
            }
        }
    }
}

/// Builds telemetry records and keeps them until the runner forwards them.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    enabled: bool,
    user_id: String,
    counter: u64,
    outbox: Vec<StoreWrite>,
}

impl EventLog {
    /// `enabled` mirrors the game config's `auth` switch.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        self.user_id = user_id.into();
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Whether calls are currently recorded.
    pub fn is_active(&self) -> bool {
        self.enabled && !self.user_id.is_empty()
    }

    /// Number of actions logged so far; also the prefix of the next key.
    pub fn action_count(&self) -> u64 {
        self.counter
    }

    pub fn pending(&self) -> &[StoreWrite] {
        &self.outbox
    }

    /// Takes every queued write, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<StoreWrite> {
        std::mem::take(&mut self.outbox)
    }

    /// Records an action with the current earnings snapshot under the key
    /// `"{counter}_{button_id}"`.
    pub fn log_action(&mut self, action: Action, snapshot: Snapshot) {
        if !self.is_active() {
            return;
        }
        let button_id = action.resolved_button_id();
        let key = format!("{}_{}", self.counter, button_id);
        let record = ActionRecord {
            button_id,
            action_type: action.action_type,
            timestamp: Utc::now(),
            earnings: snapshot.earnings,
            orders_complete: snapshot.orders_complete,
            gametime: snapshot.gametime,
            unique_sets_complete: snapshot.unique_sets_complete,
            details: action.details,
        };
        debug!(key = %key, "logging action");
        self.outbox.push(StoreWrite::AddAction {
            user_id: self.user_id.clone(),
            key,
            record,
        });
        self.counter += 1;
    }

    /// Marks `order` as started at `elapsed` with the offered options and
    /// queues it.
    pub fn log_order(&mut self, order: &mut Order, options: &[Order], elapsed: u64) {
        if !self.is_active() {
            return;
        }
        order.startgametime = Some(elapsed);
        order.status = OrderStatus::Pending;
        order.bundled = false;
        order.bundled_with = None;
        order.options = option_ids(options);
        self.outbox.push(StoreWrite::AddOrder {
            user_id: self.user_id.clone(),
            order: order.clone(),
        });
    }

    /// Same as [`log_order`](Self::log_order) for two orders delivered
    /// together; each one points at the other.
    pub fn log_bundled_order(
        &mut self,
        first: &mut Order,
        second: &mut Order,
        options: &[Order],
        elapsed: u64,
    ) {
        if !self.is_active() {
            return;
        }
        let ids = option_ids(options);
        let (first_id, second_id) = (first.id.clone(), second.id.clone());
        for (order, partner) in [(&mut *first, second_id), (&mut *second, first_id)] {
            order.startgametime = Some(elapsed);
            order.status = OrderStatus::Pending;
            order.bundled = true;
            order.bundled_with = Some(partner);
            order.options = ids.clone();
        }
        for order in [&*first, &*second] {
            self.outbox.push(StoreWrite::AddOrder {
                user_id: self.user_id.clone(),
                order: order.clone(),
            });
        }
    }

    /// Marks an order done and refreshes the user's summary fields. Non-empty
    /// `metadata` is also logged as a `job_completed` event.
    pub fn complete_order(
        &mut self,
        order_id: &str,
        metadata: Map<String, Value>,
        snapshot: Snapshot,
    ) {
        if !self.is_active() {
            return;
        }
        self.outbox.push(StoreWrite::UpdateOrder {
            user_id: self.user_id.clone(),
            order_id: order_id.to_string(),
            update: OrderUpdate {
                status: OrderStatus::Completed.into(),
                endgametime: snapshot.gametime,
            },
        });
        self.update_fields(snapshot.fields());
        if !metadata.is_empty() {
            let mut action = Action::system("job_completed").with("orderId", order_id);
            action.details.extend(metadata);
            self.log_action(action, snapshot);
        }
    }

    pub fn update_fields(&mut self, fields: SessionFields) {
        if !self.is_active() {
            return;
        }
        self.outbox.push(StoreWrite::UpdateFields {
            user_id: self.user_id.clone(),
            fields,
        });
    }
}

fn option_ids(options: &[Order]) -> Vec<String> {
    options.iter().map(|o| o.id.clone()).collect()
}

/// Sends `writes` in order. Failures are logged and dropped, never retried.
/// Returns how many writes failed.
///
/// A write the backend rejected is logged at `error`; network and decode
/// failures only at `warn`.
pub async fn forward(store: &impl RemoteStore, writes: Vec<StoreWrite>) -> usize {
    let mut failed = 0;
    for write in writes {
        if let Err(err) = write.send(store).await {
            if err.is_api() {
                error!(kind = write.kind(), error = %err, "store rejected write");
            } else {
                warn!(kind = write.kind(), error = %err, "dropping store write");
            }
            failed += 1;
        }
    }
    failed
}
