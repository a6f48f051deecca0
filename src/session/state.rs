use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::GameConfig;

/// UI toggles that live alongside the session.
///
/// The break countdown is not stored here; see
/// [`GameSession::break_timer`](super::GameSession::break_timer).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFlags {
    pub in_select: bool,
    pub in_store: bool,
    pub bundled: bool,
    pub tip: bool,
    pub waiting: bool,
    pub refresh: bool,
    pub company_selected: bool,
    pub show_company_switch_modal: bool,
}

impl GameFlags {
    pub fn from_config(config: &GameConfig) -> Self {
        Self {
            tip: config.tips,
            waiting: config.waiting,
            refresh: config.refresh,
            company_selected: config.companies.len() == 1,
            ..Self::default()
        }
    }
}

/// Notifications delivered to session observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Elapsed game seconds changed.
    ElapsedChanged(u64),
    /// The published earnings total changed.
    EarningsChanged(f64),
    /// The visible order list was replaced or refilled; carries its new length.
    OrdersQueued(usize),
    CompanySwitched {
        previous: Option<String>,
        current: String,
    },
    /// One second of the break passed; carries the seconds left.
    BreakTick(u32),
    BreakEnded,
    Paused,
    Resumed,
    /// The time limit was reached; carries the final earnings.
    GameOver(f64),
}

impl fmt::Display for SessionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEvent::ElapsedChanged(secs) => write!(f, "elapsed {secs}s"),
            SessionEvent::EarningsChanged(total) => write!(f, "earned ${total:.2}"),
            SessionEvent::OrdersQueued(n) => write!(f, "{n} orders visible"),
            SessionEvent::CompanySwitched { previous, current } => match previous {
                Some(prev) => write!(f, "switched {prev} -> {current}"),
                None => write!(f, "selected {current}"),
            },
            SessionEvent::BreakTick(left) => write!(f, "break {left}s"),
            SessionEvent::BreakEnded => write!(f, "break over"),
            SessionEvent::Paused => write!(f, "paused"),
            SessionEvent::Resumed => write!(f, "resumed"),
            SessionEvent::GameOver(total) => write!(f, "game over, earned ${total:.2}"),
        }
    }
}
