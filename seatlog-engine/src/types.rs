use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::{SeatError, SeatResult};

pub const NUM_SEATS: u8 = 4;

/// A table seat (0-3). Deserialization rejects anything else.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Seat(u8);

impl Seat {
    pub fn new(id: u8) -> SeatResult<Self> {
        if id < NUM_SEATS {
            Ok(Seat(id))
        } else {
            Err(SeatError::OutOfRange {
                what: "seat",
                value: i64::from(id),
            })
        }
    }

    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// The seat whose discards this seat may chi (kamicha).
    #[inline]
    pub const fn kamicha(self) -> Self {
        Seat((self.0 + NUM_SEATS - 1) % NUM_SEATS)
    }

    pub fn all() -> impl Iterator<Item = Seat> {
        (0..NUM_SEATS).map(Seat)
    }
}

impl TryFrom<u8> for Seat {
    type Error = SeatError;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Seat::new(id)
    }
}

impl From<Seat> for u8 {
    fn from(seat: Seat) -> u8 {
        seat.0
    }
}

impl fmt::Debug for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Seat({})", self.0)
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
