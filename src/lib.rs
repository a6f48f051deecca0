//! Session layer of an order-fulfillment game.
//!
//! [`session::GameSession`] holds the state of one play session: the
//! per-company order pools, the earnings accumulator, the session clock and
//! the telemetry outbox. [`runner::SessionRunner`] drives it against a
//! [`store::RemoteStore`].

pub mod clock;
pub mod config;
pub mod earnings;
pub mod error;
pub mod orders;
pub mod runner;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod timers;
pub mod ui;
