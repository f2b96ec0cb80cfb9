//! seatlog core: one seat's mjai conversation with a decision oracle.
//!
//! `EventLogAdapter` keeps the committed log and feeds it to the oracle,
//! with speculative probes that always roll back. `SeatAgent` drives a
//! seat's turn flow on top of it.

pub mod adapter;
pub mod agent;
pub mod config;
pub mod oracle;
pub mod reaction;

pub use adapter::{EventLogAdapter, Proposal, Speculation, Withheld};
pub use agent::{Discard, MeldCall, MeldKind, RoundInfo, SeatAgent};
pub use config::AgentConfig;
pub use oracle::{FnOracle, Oracle, PassOracle, Recorder};
pub use reaction::{Reaction, Reactions};
