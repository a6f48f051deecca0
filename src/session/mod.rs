//! Estado de uma partida: relógio, empresas, ganhos, pedidos visíveis e telemetria.

mod game;
mod state;

pub use game::{GameSession, ORDERS_SHOWN};
pub use state::{GameFlags, SessionEvent};
