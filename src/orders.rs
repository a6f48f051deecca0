//! Order pools for the active job condition.
//!
//! [`OrderPools`] owns the order list loaded for the current condition and
//! splits it into one [`CompanyPool`] per company. Orders are handed out
//! round-robin: each pool keeps a cursor that wraps at the pool length, and a
//! single fallback cursor walks the undivided list when a company has no pool.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Company;

/// Completion status of an order as stored remotely (`0` pending, `1` done).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", from = "u8")]
pub enum OrderStatus {
    #[default]
    Pending,
    Completed,
}

impl From<OrderStatus> for u8 {
    fn from(status: OrderStatus) -> Self {
        match status {
            OrderStatus::Pending => 0,
            OrderStatus::Completed => 1,
        }
    }
}

impl From<u8> for OrderStatus {
    fn from(raw: u8) -> Self {
        if raw == 0 {
            OrderStatus::Pending
        } else {
            OrderStatus::Completed
        }
    }
}

/// A single delivery order.
///
/// Fields the session does not interpret (store, city, items...) are kept in
/// `extra` and travel with the order to the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payout: Option<f64>,
    /// Older order files call the payout `earnings`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub earnings: Option<f64>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub bundled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundled_with: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startgametime: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endgametime: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Order {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            company_id: None,
            payout: None,
            earnings: None,
            status: OrderStatus::Pending,
            options: Vec::new(),
            bundled: false,
            bundled_with: None,
            startgametime: None,
            endgametime: None,
            extra: Map::new(),
        }
    }

    /// `payout`, then `earnings`, then zero.
    pub fn payout_amount(&self) -> f64 {
        self.payout.or(self.earnings).unwrap_or(0.0)
    }
}

/// Ids in order and config files may be JSON strings or numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

/// Same as [`string_or_number`], with `null` as `None`.
pub(crate) fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "id must be a string or number, got {other}"
        ))),
    }
}

/// One entry of the store file's `stores` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreEntry {
    pub store: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Store file for a condition: the stores, the distance table and where the
/// player starts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreLayout {
    #[serde(default)]
    pub stores: Vec<StoreEntry>,
    #[serde(default)]
    pub distances: HashMap<String, Value>,
    #[serde(default)]
    pub startinglocation: Option<String>,
}

/// Orders reserved for one company plus the index of the next one to hand out.
#[derive(Debug, Clone, Default)]
pub struct CompanyPool {
    orders: Vec<Order>,
    cursor: usize,
}

impl CompanyPool {
    fn new(orders: Vec<Order>) -> Self {
        Self { orders, cursor: 0 }
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Hands out `n` copies starting at the cursor, wrapping around the pool.
    fn take(&mut self, n: usize) -> Vec<Order> {
        if self.orders.is_empty() {
            return Vec::new();
        }
        let mut out = Vec::with_capacity(n);
        for _ in 0..n {
            out.push(self.orders[self.cursor].clone());
            self.cursor = (self.cursor + 1) % self.orders.len();
        }
        out
    }
}

/// Order pools for the current job condition.
#[derive(Debug, Clone, Default)]
pub struct OrderPools {
    orders: Vec<Order>,
    layout: StoreLayout,
    pools: HashMap<String, CompanyPool>,
    fallback_cursor: usize,
}

impl OrderPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the active order list and store layout and rebuilds the
    /// per-company pools.
    ///
    /// If any order names a company, pools are built from those assignments.
    /// Otherwise order `i` goes to company `i % companies.len()`. Companies
    /// with an empty id are skipped and empty pools are not registered. Every
    /// cursor starts at zero.
    pub fn switch_job(&mut self, orders: Vec<Order>, layout: StoreLayout, companies: &[Company]) {
        if orders.is_empty() {
            warn!("switching to a job with no orders");
        }
        self.pools.clear();
        self.fallback_cursor = 0;

        let has_assignments = orders.iter().any(|o| o.company_id.is_some());
        for (index, company) in companies.iter().enumerate() {
            if company.id.is_empty() {
                continue;
            }
            let pool: Vec<Order> = orders
                .iter()
                .enumerate()
                .filter(|(order_index, order)| {
                    if has_assignments {
                        order.company_id.as_deref() == Some(company.id.as_str())
                    } else {
                        order_index % companies.len() == index
                    }
                })
                .map(|(_, order)| {
                    let mut order = order.clone();
                    order.payout = Some(order.payout_amount());
                    order.company_id = Some(company.id.clone());
                    order
                })
                .collect();
            if !pool.is_empty() {
                debug!(company = %company.id, orders = pool.len(), "built company pool");
                self.pools.insert(company.id.clone(), CompanyPool::new(pool));
            }
        }

        self.orders = orders;
        self.layout = layout;
    }

    /// Returns the next `n` orders for `company_id`.
    ///
    /// Without a pool for that company the shared fallback cursor walks the
    /// undivided order list instead. An empty list yields no orders.
    pub fn queue_n_fixed_orders(&mut self, n: usize, company_id: Option<&str>) -> Vec<Order> {
        debug!(n, company = company_id.unwrap_or("-"), "queuing orders");

        if let Some(pool) = company_id.and_then(|id| self.pools.get_mut(id))
            && !pool.is_empty()
        {
            return pool.take(n);
        }

        let mut next = Vec::with_capacity(n);
        for _ in 0..n {
            if self.fallback_cursor >= self.orders.len() {
                self.fallback_cursor = 0;
            }
            let Some(order) = self.orders.get(self.fallback_cursor) else {
                break;
            };
            next.push(order.clone());
            self.fallback_cursor += 1;
        }
        next
    }

    pub fn pool(&self, company_id: &str) -> Option<&CompanyPool> {
        self.pools.get(company_id)
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    /// Looks up a store entry by its `store` name.
    pub fn store_config(&self, store: &str) -> Option<&StoreEntry> {
        self.layout.stores.iter().rfind(|entry| entry.store == store)
    }

    pub fn distances(&self, location: &str) -> Option<&Value> {
        self.layout.distances.get(location)
    }

    pub fn starting_location(&self) -> Option<&str> {
        self.layout.startinglocation.as_deref()
    }
}
