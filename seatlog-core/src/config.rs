use serde::{Deserialize, Serialize};

use seatlog_engine::SeatResult;

/// Per-seat behaviour switches. Every field has a default, so an empty JSON
/// object is a valid configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AgentConfig {
    /// Keep the oracle's `meta` object on parsed reactions.
    pub keep_meta: bool,
    /// After the seat's own kan, withhold the trailing `dora` reveal from
    /// the discard query and replay it afterwards.
    pub hide_dora_after_kan: bool,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            keep_meta: false,
            hide_dora_after_kan: true,
        }
    }
}

impl AgentConfig {
    pub fn from_json(text: &str) -> SeatResult<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
