//! Label codec between physical tile ids (136-format) and mjai labels.
//!
//! A physical id names one instance of a tile for its whole lifetime. A
//! label is the face value the oracle understands. The mapping from id to
//! label is a pure function of `id / 4`, except the three red fives which
//! carry their own distinguished label.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::{SeatError, SeatResult};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// A physical tile instance in 136-format (0-135).
pub type PhysicalId = u8;

/// Total number of distinct tile types (0-33).
pub const NUM_TILE_TYPES: usize = 34;

/// Total physical tiles in a standard mahjong set.
pub const NUM_TILES_136: usize = 136;

/// Ordinary labels, red fives and the unknown sentinel.
pub const NUM_LABELS: usize = NUM_TILE_TYPES + 3 + 1;

/// Red 5m in 136-format. The 0th copy of tile type 4 (5m) is red.
pub const AKA_MANZU_136: PhysicalId = 16;
/// Red 5p in 136-format. The 0th copy of tile type 13 (5p) is red.
pub const AKA_PINZU_136: PhysicalId = 52;
/// Red 5s in 136-format. The 0th copy of tile type 22 (5s) is red.
pub const AKA_SOUZU_136: PhysicalId = 88;

const FIVE_MANZU: u8 = 4;
const FIVE_PINZU: u8 = 13;
const FIVE_SOUZU: u8 = 22;
const AKA_MANZU: u8 = 34;
const AKA_PINZU: u8 = 35;
const AKA_SOUZU: u8 = 36;
const UNKNOWN: u8 = 37;
const JIHAI_START: u8 = 27;

const LABEL_STRINGS: [&str; NUM_LABELS] = [
    "1m", "2m", "3m", "4m", "5m", "6m", "7m", "8m", "9m", // m
    "1p", "2p", "3p", "4p", "5p", "6p", "7p", "8p", "9p", // p
    "1s", "2s", "3s", "4s", "5s", "6s", "7s", "8s", "9s", // s
    "E", "S", "W", "N", "P", "F", "C", // z
    "5mr", "5pr", "5sr", // aka
    "?",   // unknown
];

// ---------------------------------------------------------------------------
// Label newtype
// ---------------------------------------------------------------------------

/// An mjai tile label: 34 ordinary faces, 3 red fives, or `?`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label(u8);

pub const EAST: Label = Label(27);
pub const SOUTH: Label = Label(28);
pub const WEST: Label = Label(29);
pub const NORTH: Label = Label(30);

impl Label {
    /// The `?` placeholder for tiles hidden from the observing seat.
    pub const UNKNOWN: Label = Label(UNKNOWN);

    /// Creates a `Label` if `id` is in range 0..38.
    #[inline]
    pub const fn new(id: u8) -> Option<Self> {
        if (id as usize) < NUM_LABELS {
            Some(Label(id))
        } else {
            None
        }
    }

    /// Raw index: 0-33 ordinary, 34-36 red fives, 37 unknown.
    #[inline]
    pub const fn id(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn as_usize(self) -> usize {
        self.0 as usize
    }

    #[inline]
    pub const fn is_unknown(self) -> bool {
        self.0 == UNKNOWN
    }

    /// True for the three distinguished (red) fives.
    #[inline]
    pub const fn is_aka(self) -> bool {
        matches!(self.0, AKA_MANZU | AKA_PINZU | AKA_SOUZU)
    }

    /// True for any five of a suit, red or not.
    #[inline]
    pub const fn is_five(self) -> bool {
        matches!(self.deaka().0, FIVE_MANZU | FIVE_PINZU | FIVE_SOUZU)
    }

    /// True for E, S, W, N.
    #[inline]
    pub const fn is_wind(self) -> bool {
        matches!(self.0, 27..=30)
    }

    #[inline]
    pub const fn is_honor(self) -> bool {
        self.0 >= JIHAI_START && (self.0 as usize) < NUM_TILE_TYPES
    }

    /// Strips the red flag. Other labels pass through unchanged.
    #[inline]
    pub const fn deaka(self) -> Self {
        match self.0 {
            AKA_MANZU => Label(FIVE_MANZU),
            AKA_PINZU => Label(FIVE_PINZU),
            AKA_SOUZU => Label(FIVE_SOUZU),
            _ => self,
        }
    }

    /// Turns an ordinary five into its red counterpart.
    #[inline]
    pub const fn akaize(self) -> Self {
        match self.0 {
            FIVE_MANZU => Label(AKA_MANZU),
            FIVE_PINZU => Label(AKA_PINZU),
            FIVE_SOUZU => Label(AKA_SOUZU),
            _ => self,
        }
    }

    /// Tile type (0-33) ignoring the red flag, `None` for `?`.
    #[inline]
    pub const fn tile_type(self) -> Option<u8> {
        if self.is_unknown() {
            None
        } else {
            Some(self.deaka().0)
        }
    }

    /// How many physical ids carry this label.
    #[inline]
    pub const fn instance_count(self) -> usize {
        if self.is_unknown() {
            0
        } else if self.is_aka() {
            1
        } else if self.is_five() {
            3
        } else {
            4
        }
    }

    /// Iterates every real label: 34 ordinary then 3 red.
    pub fn all() -> impl Iterator<Item = Label> {
        (0..UNKNOWN).map(Label)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(LABEL_STRINGS[self.0 as usize])
    }
}

impl FromStr for Label {
    type Err = SeatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LABEL_STRINGS
            .iter()
            .position(|&name| name == s)
            .map(|idx| Label(idx as u8))
            .ok_or_else(|| SeatError::invalid_argument(format!("not a valid label: \"{s}\"")))
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer)?
            .parse()
            .map_err(serde::de::Error::custom)
    }
}

impl Serialize for Label {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

// ---------------------------------------------------------------------------
// 136-format conversion
// ---------------------------------------------------------------------------

/// Returns `true` if the 136-format tile is a red five.
#[inline]
pub const fn is_aka_id(id: PhysicalId) -> bool {
    matches!(id, AKA_MANZU_136 | AKA_PINZU_136 | AKA_SOUZU_136)
}

/// Converts a physical id (0-135) to its label.
pub fn to_label(id: PhysicalId) -> SeatResult<Label> {
    if id as usize >= NUM_TILES_136 {
        return Err(SeatError::OutOfRange {
            what: "physical id",
            value: i64::from(id),
        });
    }
    let base = Label(id / 4);
    Ok(if is_aka_id(id) { base.akaize() } else { base })
}

/// Resolves the `hint`-th physical id carrying `label`.
///
/// Red labels have one candidate, ordinary fives three (copies 1-3), every
/// other label four. This is not an inverse of [`to_label`]: the tracker is
/// what decides which instance a seat actually holds.
pub fn from_label(label: Label, hint: u8) -> SeatResult<PhysicalId> {
    let Some(tile_type) = label.tile_type() else {
        return Err(SeatError::invalid_argument("`?` has no physical instance"));
    };
    if hint as usize >= label.instance_count() {
        return Err(SeatError::OutOfRange {
            what: "instance hint",
            value: i64::from(hint),
        });
    }
    let base = tile_type * 4;
    Ok(if label.is_aka() {
        base
    } else if label.is_five() {
        base + 1 + hint
    } else {
        base + hint
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn l(s: &str) -> Label {
        s.parse().unwrap()
    }

    #[test]
    fn parse_and_display() {
        for name in LABEL_STRINGS {
            assert_eq!(l(name).to_string(), name);
        }
        assert!("".parse::<Label>().is_err());
        assert!("0s".parse::<Label>().is_err());
        assert!("5zr".parse::<Label>().is_err());
        assert!(Label::new(38).is_none());
    }

    #[test]
    fn every_id_maps_by_position_except_red_fives() {
        let mut distinguished = 0;
        for id in 0..NUM_TILES_136 as u8 {
            let label = to_label(id).unwrap();
            if label.is_aka() {
                distinguished += 1;
                assert!(is_aka_id(id));
            }
            assert_eq!(label.tile_type(), Some(id / 4), "id {id}");
        }
        assert_eq!(distinguished, 3);
        assert_eq!(to_label(AKA_MANZU_136).unwrap(), l("5mr"));
        assert_eq!(to_label(AKA_PINZU_136).unwrap(), l("5pr"));
        assert_eq!(to_label(AKA_SOUZU_136).unwrap(), l("5sr"));
        assert_eq!(to_label(17).unwrap(), l("5m"));
        assert_eq!(to_label(108).unwrap(), l("E"));
        assert_eq!(to_label(135).unwrap(), l("C"));
    }

    #[test]
    fn out_of_range_id() {
        assert!(matches!(
            to_label(136),
            Err(SeatError::OutOfRange { value: 136, .. })
        ));
        assert!(to_label(u8::MAX).is_err());
    }

    #[test]
    fn from_label_enumerates_instances() {
        for label in Label::all() {
            let ids: Vec<_> = (0..4)
                .map_while(|hint| from_label(label, hint).ok())
                .collect();
            assert_eq!(ids.len(), label.instance_count(), "label {label}");
            for id in ids {
                assert_eq!(to_label(id).unwrap(), label);
            }
        }
        assert_eq!(from_label(l("5pr"), 0).unwrap(), AKA_PINZU_136);
        assert!(from_label(l("5pr"), 1).is_err());
        assert_eq!(from_label(l("5m"), 0).unwrap(), 17);
        assert!(matches!(
            from_label(l("5m"), 3),
            Err(SeatError::OutOfRange { .. })
        ));
        assert!(matches!(
            from_label(Label::UNKNOWN, 0),
            Err(SeatError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn deaka_akaize() {
        assert_eq!(l("5sr").deaka(), l("5s"));
        assert_eq!(l("5s").akaize(), l("5sr"));
        assert_eq!(l("4s").akaize(), l("4s"));
        assert_eq!(l("E").deaka(), l("E"));
        assert!(l("5pr").is_five());
        assert!(!l("6p").is_five());
        assert!(l("N").is_wind());
        assert!(!l("P").is_wind());
        assert!(l("P").is_honor());
    }

    #[test]
    fn serde_as_string() {
        let json = serde_json::to_string(&l("5mr")).unwrap();
        assert_eq!(json, "\"5mr\"");
        let back: Label = serde_json::from_str("\"W\"").unwrap();
        assert_eq!(back, l("W"));
        assert!(serde_json::from_str::<Label>("\"X\"").is_err());
    }
}
