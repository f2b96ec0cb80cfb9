//! seatlog engine: the mjai-facing vocabulary of one seat.
//!
//! Label codec between 136-format tile ids and mjai labels, validated
//! event constructors, and per-seat physical instance tracking.

pub mod errors;
pub mod mjai_event;
pub mod tile;
pub mod tracker;
pub mod types;

pub use errors::{SeatError, SeatResult};
pub use mjai_event::{KyokuStart, MjaiEvent};
pub use tile::{Label, PhysicalId, from_label, to_label};
pub use tracker::{HeldInstances, Side};
pub use types::Seat;
