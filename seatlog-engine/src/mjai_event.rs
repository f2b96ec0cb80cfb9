//! Typed mjai event representation and validated constructors.
//!
//! Every constructor checks the invariants of its event kind and fails with
//! `InvalidArgument` / `OutOfRange` instead of clamping. Kan constructors
//! derive their consumed labels from the declared tile, applying the red
//! five substitution so that at most one red instance appears per group.

use serde::{Deserialize, Serialize};

use crate::errors::{SeatError, SeatResult};
use crate::tile::{EAST, Label, SOUTH, WEST};
use crate::types::Seat;

/// Tiles in a starting hand.
pub const TEHAI_LEN: usize = 13;

/// Payload of a `start_kyoku` event. Field order is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KyokuStart {
    pub bakaze: Label,
    pub dora_marker: Label,
    pub kyoku: u8,
    pub honba: u8,
    pub kyotaku: u8,
    pub oya: Seat,
    pub scores: [i32; 4],
    pub tehais: [[Label; TEHAI_LEN]; 4],
}

/// Typed mjai event. Serializes to the compact JSON the oracle consumes.
///
/// Unknown fields in incoming JSON (`meta`, `names`, `deltas`, ...) are
/// ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MjaiEvent {
    /// Game start marker.
    StartGame,
    /// Round start with initial deal.
    StartKyoku(KyokuStart),
    /// Player draws a tile (`?` when hidden from the observer).
    Tsumo { actor: Seat, pai: Label },
    /// Player discards a tile.
    Dahai {
        actor: Seat,
        pai: Label,
        tsumogiri: bool,
    },
    /// Chi (sequence) call.
    Chi {
        actor: Seat,
        target: Seat,
        pai: Label,
        consumed: [Label; 2],
    },
    /// Pon (triplet) call.
    Pon {
        actor: Seat,
        target: Seat,
        pai: Label,
        consumed: [Label; 2],
    },
    /// Open kan (daiminkan).
    Daiminkan {
        actor: Seat,
        target: Seat,
        pai: Label,
        consumed: [Label; 3],
    },
    /// Closed kan (ankan).
    Ankan { actor: Seat, consumed: [Label; 4] },
    /// Added kan (kakan).
    Kakan {
        actor: Seat,
        pai: Label,
        consumed: [Label; 3],
    },
    /// Player declares riichi.
    Reach { actor: Seat },
    /// Riichi deposit accepted.
    ReachAccepted { actor: Seat },
    /// Win declaration; `actor == target` for tsumo.
    Hora { actor: Seat, target: Seat },
    /// Abortive or exhaustive draw.
    Ryukyoku,
    /// New dora indicator revealed.
    Dora { dora_marker: Label },
    /// No action.
    None,
    /// Round end marker.
    EndKyoku,
    /// Game end marker.
    EndGame,
}

fn seat(id: u8) -> SeatResult<Seat> {
    Seat::new(id)
}

fn known(label: Label, field: &str) -> SeatResult<Label> {
    if label.is_unknown() {
        Err(SeatError::invalid_argument(format!(
            "{field} must be a real tile, got `?`"
        )))
    } else {
        Ok(label)
    }
}

fn distinct(actor: Seat, target: Seat) -> SeatResult<()> {
    if actor == target {
        Err(SeatError::invalid_argument(format!(
            "actor and target are both seat {actor}"
        )))
    } else {
        Ok(())
    }
}

/// Consumed labels for a call on `pai`, all sharing its base face.
///
/// A red trigger consumes `N` ordinary fives; an ordinary five trigger has
/// its last consumed entry substituted with the red five; anything else
/// consumes `N` copies of itself.
pub fn derive_consumed<const N: usize>(pai: Label) -> SeatResult<[Label; N]> {
    known(pai, "pai")?;
    let mut consumed = [pai.deaka(); N];
    if pai.is_five() && !pai.is_aka() && N > 0 {
        consumed[N - 1] = pai.akaize();
    }
    Ok(consumed)
}

/// `pai` and `consumed` name one face with at most one red instance.
fn check_same_face(pai: Option<Label>, consumed: &[Label]) -> SeatResult<()> {
    let Some(first) = consumed.first().copied().or(pai) else {
        return Ok(());
    };
    let mut akas = 0;
    for label in consumed.iter().copied().chain(pai) {
        known(label, "called tile")?;
        if label.deaka() != first.deaka() {
            return Err(SeatError::invalid_argument(format!(
                "{label} does not match {first} in a same-face call"
            )));
        }
        if label.is_aka() {
            akas += 1;
        }
    }
    if akas > 1 {
        return Err(SeatError::invalid_argument(format!(
            "{akas} red fives in one call"
        )));
    }
    Ok(())
}

/// `pai` and `consumed` form a run of three within one suit.
fn check_sequence(pai: Label, consumed: &[Label; 2]) -> SeatResult<()> {
    let mut types = [0u8; 3];
    for (slot, label) in types.iter_mut().zip([pai, consumed[0], consumed[1]]) {
        known(label, "chi tile")?;
        if label.is_honor() {
            return Err(SeatError::invalid_argument(format!(
                "honor tile {label} cannot be part of a chi"
            )));
        }
        // tile_type is Some for every known label
        *slot = label.tile_type().unwrap_or_default();
    }
    types.sort_unstable();
    let same_suit = types[0] / 9 == types[2] / 9;
    if !same_suit || types[1] != types[0] + 1 || types[2] != types[0] + 2 {
        return Err(SeatError::invalid_argument(format!(
            "{pai} with {}{} is not a sequence",
            consumed[0], consumed[1]
        )));
    }
    Ok(())
}

impl MjaiEvent {
    pub fn start_game() -> Self {
        MjaiEvent::StartGame
    }

    #[allow(clippy::too_many_arguments)]
    pub fn start_kyoku(
        bakaze: Label,
        dora_marker: Label,
        kyoku: u8,
        honba: u8,
        kyotaku: u8,
        oya: u8,
        scores: [i32; 4],
        tehais: &[Vec<Label>],
    ) -> SeatResult<Self> {
        if tehais.len() != 4 {
            return Err(SeatError::invalid_argument(format!(
                "expected 4 starting hands, got {}",
                tehais.len()
            )));
        }
        let mut hands = [[Label::UNKNOWN; TEHAI_LEN]; 4];
        for (hand, given) in hands.iter_mut().zip(tehais) {
            if given.len() != TEHAI_LEN {
                return Err(SeatError::invalid_argument(format!(
                    "starting hand must hold {TEHAI_LEN} tiles, got {}",
                    given.len()
                )));
            }
            hand.copy_from_slice(given);
        }
        let event = MjaiEvent::StartKyoku(KyokuStart {
            bakaze,
            dora_marker,
            kyoku,
            honba,
            kyotaku,
            oya: seat(oya)?,
            scores,
            tehais: hands,
        });
        event.validate()?;
        Ok(event)
    }

    pub fn tsumo(actor: u8, pai: Label) -> SeatResult<Self> {
        Ok(MjaiEvent::Tsumo {
            actor: seat(actor)?,
            pai: known(pai, "pai")?,
        })
    }

    /// Another seat's draw, which the observer cannot see.
    pub fn tsumo_unknown(actor: u8) -> SeatResult<Self> {
        Ok(MjaiEvent::Tsumo {
            actor: seat(actor)?,
            pai: Label::UNKNOWN,
        })
    }

    pub fn dahai(actor: u8, pai: Label, tsumogiri: bool) -> SeatResult<Self> {
        Ok(MjaiEvent::Dahai {
            actor: seat(actor)?,
            pai: known(pai, "pai")?,
            tsumogiri,
        })
    }

    /// Chi is always called on the discard of the seat to the left.
    pub fn chi(actor: u8, pai: Label, consumed: [Label; 2]) -> SeatResult<Self> {
        let actor = seat(actor)?;
        let event = MjaiEvent::Chi {
            actor,
            target: actor.kamicha(),
            pai,
            consumed,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn pon(actor: u8, target: u8, pai: Label, consumed: [Label; 2]) -> SeatResult<Self> {
        let event = MjaiEvent::Pon {
            actor: seat(actor)?,
            target: seat(target)?,
            pai,
            consumed,
        };
        event.validate()?;
        Ok(event)
    }

    pub fn daiminkan(actor: u8, target: u8, pai: Label) -> SeatResult<Self> {
        let event = MjaiEvent::Daiminkan {
            actor: seat(actor)?,
            target: seat(target)?,
            pai,
            consumed: derive_consumed(pai)?,
        };
        event.validate()?;
        Ok(event)
    }

    /// Ankan carries no `pai`, so for fives the red instance always sits
    /// in `consumed`, whichever five triggered the declaration.
    pub fn ankan(actor: u8, pai: Label) -> SeatResult<Self> {
        let consumed: [Label; 4] = derive_consumed(pai.deaka())?;
        Ok(MjaiEvent::Ankan {
            actor: seat(actor)?,
            consumed,
        })
    }

    pub fn kakan(actor: u8, pai: Label) -> SeatResult<Self> {
        Ok(MjaiEvent::Kakan {
            actor: seat(actor)?,
            pai,
            consumed: derive_consumed(pai)?,
        })
    }

    pub fn reach(actor: u8) -> SeatResult<Self> {
        Ok(MjaiEvent::Reach {
            actor: seat(actor)?,
        })
    }

    pub fn reach_accepted(actor: u8) -> SeatResult<Self> {
        Ok(MjaiEvent::ReachAccepted {
            actor: seat(actor)?,
        })
    }

    /// Self-drawn win.
    pub fn hora_tsumo(actor: u8) -> SeatResult<Self> {
        let actor = seat(actor)?;
        Ok(MjaiEvent::Hora {
            actor,
            target: actor,
        })
    }

    /// Win on `target`'s discard.
    pub fn hora_ron(actor: u8, target: u8) -> SeatResult<Self> {
        let (actor, target) = (seat(actor)?, seat(target)?);
        distinct(actor, target)?;
        Ok(MjaiEvent::Hora { actor, target })
    }

    pub fn ryukyoku() -> Self {
        MjaiEvent::Ryukyoku
    }

    pub fn dora(dora_marker: Label) -> SeatResult<Self> {
        Ok(MjaiEvent::Dora {
            dora_marker: known(dora_marker, "dora_marker")?,
        })
    }

    pub fn none() -> Self {
        MjaiEvent::None
    }

    /// Re-checks the invariants of an event that did not come from a
    /// constructor (deserialized input or oracle output).
    pub fn validate(&self) -> SeatResult<()> {
        match self {
            MjaiEvent::StartKyoku(start) => {
                if ![EAST, SOUTH, WEST].contains(&start.bakaze) {
                    return Err(SeatError::invalid_argument(format!(
                        "round wind must be E, S or W, got {}",
                        start.bakaze
                    )));
                }
                if !(1..=4).contains(&start.kyoku) {
                    return Err(SeatError::OutOfRange {
                        what: "kyoku",
                        value: i64::from(start.kyoku),
                    });
                }
                known(start.dora_marker, "dora_marker")?;
                Ok(())
            }
            MjaiEvent::Dahai { pai, .. } => known(*pai, "pai").map(drop),
            MjaiEvent::Chi {
                actor,
                target,
                pai,
                consumed,
            } => {
                if *target != actor.kamicha() {
                    return Err(SeatError::invalid_argument(format!(
                        "chi by seat {actor} must target seat {}, got {target}",
                        actor.kamicha()
                    )));
                }
                check_sequence(*pai, consumed)
            }
            MjaiEvent::Pon {
                actor,
                target,
                pai,
                consumed,
            } => {
                distinct(*actor, *target)?;
                check_same_face(Some(*pai), consumed)
            }
            MjaiEvent::Daiminkan {
                actor,
                target,
                pai,
                consumed,
            } => {
                distinct(*actor, *target)?;
                check_same_face(Some(*pai), consumed)
            }
            MjaiEvent::Ankan { consumed, .. } => check_same_face(None, consumed),
            MjaiEvent::Kakan { pai, consumed, .. } => check_same_face(Some(*pai), consumed),
            MjaiEvent::Dora { dora_marker } => known(*dora_marker, "dora_marker").map(drop),
            _ => Ok(()),
        }
    }

    /// The wire `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            MjaiEvent::StartGame => "start_game",
            MjaiEvent::StartKyoku(_) => "start_kyoku",
            MjaiEvent::Tsumo { .. } => "tsumo",
            MjaiEvent::Dahai { .. } => "dahai",
            MjaiEvent::Chi { .. } => "chi",
            MjaiEvent::Pon { .. } => "pon",
            MjaiEvent::Daiminkan { .. } => "daiminkan",
            MjaiEvent::Ankan { .. } => "ankan",
            MjaiEvent::Kakan { .. } => "kakan",
            MjaiEvent::Reach { .. } => "reach",
            MjaiEvent::ReachAccepted { .. } => "reach_accepted",
            MjaiEvent::Hora { .. } => "hora",
            MjaiEvent::Ryukyoku => "ryukyoku",
            MjaiEvent::Dora { .. } => "dora",
            MjaiEvent::None => "none",
            MjaiEvent::EndKyoku => "end_kyoku",
            MjaiEvent::EndGame => "end_game",
        }
    }

    pub fn actor(&self) -> Option<Seat> {
        match self {
            MjaiEvent::Tsumo { actor, .. }
            | MjaiEvent::Dahai { actor, .. }
            | MjaiEvent::Chi { actor, .. }
            | MjaiEvent::Pon { actor, .. }
            | MjaiEvent::Daiminkan { actor, .. }
            | MjaiEvent::Ankan { actor, .. }
            | MjaiEvent::Kakan { actor, .. }
            | MjaiEvent::Reach { actor }
            | MjaiEvent::ReachAccepted { actor }
            | MjaiEvent::Hora { actor, .. } => Some(*actor),
            _ => None,
        }
    }

    /// True for chi, pon and the three kan kinds.
    pub fn is_call(&self) -> bool {
        matches!(
            self,
            MjaiEvent::Chi { .. }
                | MjaiEvent::Pon { .. }
                | MjaiEvent::Daiminkan { .. }
                | MjaiEvent::Ankan { .. }
                | MjaiEvent::Kakan { .. }
        )
    }

    pub fn is_kan(&self) -> bool {
        matches!(
            self,
            MjaiEvent::Daiminkan { .. } | MjaiEvent::Ankan { .. } | MjaiEvent::Kakan { .. }
        )
    }

    /// Compact JSON, one object, no whitespace.
    pub fn to_json(&self) -> SeatResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parses and validates one JSON event.
    pub fn from_json(line: &str) -> SeatResult<Self> {
        let event: MjaiEvent = serde_json::from_str(line)?;
        event.validate()?;
        Ok(event)
    }
}
