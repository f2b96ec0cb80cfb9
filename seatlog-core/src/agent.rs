//! One seat's turn flow on top of the event log adapter.
//!
//! The game engine talks to a `SeatAgent` in physical ids; the agent turns
//! every table action into mjai events, keeps the seat's held instances in
//! step, and asks the oracle for decisions.

use seatlog_engine::mjai_event::TEHAI_LEN;
use seatlog_engine::{Label, MjaiEvent, PhysicalId, Seat, SeatError, SeatResult, Side, to_label};
use tracing::{debug, warn};

use crate::adapter::{EventLogAdapter, Proposal};
use crate::config::AgentConfig;
use crate::oracle::Oracle;
use crate::reaction::Reaction;

/// Table state announced at the start of a hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundInfo {
    pub bakaze: Label,
    pub dora_marker: PhysicalId,
    pub kyoku: u8,
    pub honba: u8,
    pub kyotaku: u8,
    pub oya: u8,
    pub scores: [i32; 4],
}

/// The tile a seat throws, as the engine needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Discard {
    pub id: PhysicalId,
    pub label: Label,
    pub tsumogiri: bool,
    pub riichi: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeldKind {
    Chi,
    Pon,
    Daiminkan,
}

/// A call the oracle wants to make, with the instances it would use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeldCall {
    pub kind: MeldKind,
    pub call: MjaiEvent,
    pub consumed: Vec<PhysicalId>,
    /// The discard that follows a chi or pon. Absent after a daiminkan,
    /// which draws a replacement tile first.
    pub discard: Option<(PhysicalId, Label)>,
}

struct PendingMeld {
    proposal: Proposal,
    kind: MeldKind,
    discard: Option<MjaiEvent>,
}

pub struct SeatAgent<O> {
    seat: Seat,
    config: AgentConfig,
    adapter: EventLogAdapter<O>,
    last_draw: Option<(PhysicalId, Label)>,
    after_kan: bool,
    pending: Option<PendingMeld>,
}

impl<O: Oracle> SeatAgent<O> {
    pub fn new(seat: u8, oracle: O, config: AgentConfig) -> SeatResult<Self> {
        Ok(Self {
            seat: Seat::new(seat)?,
            config,
            adapter: EventLogAdapter::new(oracle).with_keep_meta(config.keep_meta),
            last_draw: None,
            after_kan: false,
            pending: None,
        })
    }

    pub fn seat(&self) -> Seat {
        self.seat
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn adapter(&self) -> &EventLogAdapter<O> {
        &self.adapter
    }

    /// Announces the game. The event is fed at once so the next hand's
    /// reset cannot discard it.
    pub fn start_game(&mut self) -> SeatResult<()> {
        self.adapter.commit(MjaiEvent::start_game())?;
        self.adapter.ask().map(drop)
    }

    /// Starts a hand with the seat's 13 dealt tiles. Other seats' hands are
    /// announced as `?`.
    pub fn init_hand(&mut self, round: &RoundInfo, tiles: &[PhysicalId]) -> SeatResult<()> {
        self.erase_state()?;
        if tiles.len() != TEHAI_LEN {
            return Err(SeatError::invalid_argument(format!(
                "dealt {} tiles, expected {TEHAI_LEN}",
                tiles.len()
            )));
        }
        let own = tiles
            .iter()
            .map(|&id| to_label(id))
            .collect::<SeatResult<Vec<_>>>()?;
        let mut tehais = vec![vec![Label::UNKNOWN; TEHAI_LEN]; 4];
        tehais[self.seat.index()] = own;
        let event = MjaiEvent::start_kyoku(
            round.bakaze,
            to_label(round.dora_marker)?,
            round.kyoku,
            round.honba,
            round.kyotaku,
            round.oya,
            round.scores,
            &tehais,
        )?;

        let tracker = self.adapter.tracker_mut();
        for &id in tiles {
            if let Err(err) = tracker.record_id(self.seat, id) {
                tracker.clear();
                return Err(err);
            }
        }
        debug!(seat = %self.seat, kyoku = round.kyoku, "hand started");
        self.adapter.commit(event)
    }

    pub fn draw_tile(&mut self, id: PhysicalId) -> SeatResult<()> {
        let label = self.adapter.tracker_mut().record_id(self.seat, id)?;
        self.adapter.commit(MjaiEvent::tsumo(self.seat.id(), label)?)?;
        self.last_draw = Some((id, label));
        Ok(())
    }

    /// Records a table event. The seat's own calls and kans remove the
    /// instances they expose from the tracker.
    pub fn observe(&mut self, event: MjaiEvent) -> SeatResult<()> {
        event.validate()?;
        match &event {
            MjaiEvent::StartKyoku(_) => {
                return Err(SeatError::invalid_argument(
                    "hand starts go through init_hand",
                ));
            }
            MjaiEvent::Tsumo { actor, .. } if *actor == self.seat => {
                return Err(SeatError::invalid_argument(
                    "own draws go through draw_tile",
                ));
            }
            _ => {}
        }
        if event.actor() == Some(self.seat) {
            match &event {
                MjaiEvent::Dahai { pai, tsumogiri, .. } => {
                    self.adapter
                        .tracker_mut()
                        .take_for_discard(self.seat, *pai, *tsumogiri)?;
                    self.last_draw = None;
                }
                MjaiEvent::Chi { consumed, .. } | MjaiEvent::Pon { consumed, .. } => {
                    self.consume(consumed)?;
                }
                MjaiEvent::Daiminkan { consumed, .. } => {
                    self.consume(consumed)?;
                }
                MjaiEvent::Kakan { pai, .. } => {
                    self.consume(std::slice::from_ref(pai))?;
                }
                MjaiEvent::Ankan { consumed, .. } => {
                    self.consume(consumed)?;
                }
                _ => {}
            }
            if event.is_kan() {
                self.after_kan = true;
            }
        }
        self.adapter.commit(event)
    }

    /// Removes `labels` from the tracker, all or nothing.
    fn consume(&mut self, labels: &[Label]) -> SeatResult<()> {
        let tracker = self.adapter.tracker_mut();
        let mut taken = Vec::with_capacity(labels.len());
        for &label in labels {
            match tracker.take_for_consumption(self.seat, label) {
                Ok(id) => taken.push((label, id)),
                Err(err) => {
                    for &(label, id) in taken.iter().rev() {
                        tracker.restore(self.seat, label, id, Side::Front)?;
                    }
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    /// Asks the oracle which tile to throw, declaring riichi first if the
    /// oracle wants to. A forced tsumogiri always throws the drawn tile.
    ///
    /// After the seat's own kan, a trailing `dora` reveal is withheld from
    /// both the discard and the riichi decision when configured to; the
    /// discard is committed ahead of it.
    pub fn discard_tile(&mut self, force_tsumogiri: bool) -> SeatResult<Discard> {
        let seat = self.seat;
        let last_draw = self.last_draw;
        let discard = if self.after_kan && self.config.hide_dora_after_kan {
            let mut withheld = self
                .adapter
                .withhold_tail(|e| matches!(e, MjaiEvent::Dora { .. }));
            throw_tile(&mut *withheld, seat, last_draw, force_tsumogiri)?
        } else {
            throw_tile(&mut self.adapter, seat, last_draw, force_tsumogiri)?
        };
        self.after_kan = false;
        self.last_draw = None;
        debug!(
            seat = %seat,
            tile = %discard.label,
            id = discard.id,
            riichi = discard.riichi,
            "discard"
        );
        Ok(discard)
    }

    /// The oracle's current decision for this seat.
    pub fn next_action(&mut self) -> SeatResult<Reaction> {
        Ok(self.adapter.probe([])?.last().clone())
    }

    pub fn should_call_kan(&mut self) -> SeatResult<bool> {
        let event = self.next_action()?.event;
        Ok(event.is_kan() && event.actor() == Some(self.seat))
    }

    pub fn should_call_win(&mut self) -> SeatResult<bool> {
        let event = self.next_action()?.event;
        Ok(matches!(event, MjaiEvent::Hora { actor, .. } if actor == self.seat))
    }

    pub fn should_call_kyuushu_kyuuhai(&mut self) -> SeatResult<bool> {
        let event = self.next_action()?.event;
        Ok(matches!(event, MjaiEvent::Ryukyoku))
    }

    /// Asks whether to call the discard just observed. A positive answer
    /// reserves the instances the call uses and stays pending until
    /// [`confirm_meld`](Self::confirm_meld) or
    /// [`abandon_meld`](Self::abandon_meld).
    pub fn try_to_call_meld(&mut self) -> SeatResult<Option<MeldCall>> {
        if self.pending.is_some() {
            return Err(SeatError::invalid_state(format!(
                "seat {} already has a call pending",
                self.seat
            )));
        }
        let decision = self.next_action()?.event;
        let (kind, labels): (MeldKind, Vec<Label>) = match &decision {
            MjaiEvent::Chi {
                actor, consumed, ..
            } if *actor == self.seat => (MeldKind::Chi, consumed.to_vec()),
            MjaiEvent::Pon {
                actor, consumed, ..
            } if *actor == self.seat => (MeldKind::Pon, consumed.to_vec()),
            MjaiEvent::Daiminkan {
                actor, consumed, ..
            } if *actor == self.seat => (MeldKind::Daiminkan, consumed.to_vec()),
            _ => return Ok(None),
        };

        let mut proposal = self.adapter.declare_and_followup(decision.clone())?;
        let followup = match proposal.followup().event.clone() {
            MjaiEvent::Dahai { actor, pai, .. } if actor == self.seat => Some(pai),
            _ if kind == MeldKind::Daiminkan => None,
            other => {
                warn!(?kind, followup = other.kind(), "call without a discard, passing");
                self.adapter.abandon(proposal)?;
                return Ok(None);
            }
        };

        let reserved = self.reserve_meld(&mut proposal, &labels, followup);
        let (consumed, discard) = match reserved {
            Ok(ids) => ids,
            Err(err) => {
                self.adapter.abandon(proposal)?;
                return Err(err);
            }
        };
        let discard_event = followup
            .map(|pai| MjaiEvent::dahai(self.seat.id(), pai, false))
            .transpose()?;
        self.pending = Some(PendingMeld {
            proposal,
            kind,
            discard: discard_event,
        });
        Ok(Some(MeldCall {
            kind,
            call: decision,
            consumed,
            discard: discard.zip(followup),
        }))
    }

    fn reserve_meld(
        &mut self,
        proposal: &mut Proposal,
        labels: &[Label],
        discard: Option<Label>,
    ) -> SeatResult<(Vec<PhysicalId>, Option<PhysicalId>)> {
        let mut consumed = Vec::with_capacity(labels.len());
        for &label in labels {
            consumed.push(
                self.adapter
                    .reserve_for_consumption(proposal, self.seat, label)?,
            );
        }
        let discard = match discard {
            Some(label) => Some(
                self.adapter
                    .reserve_for_discard(proposal, self.seat, label, false)?,
            ),
            None => None,
        };
        Ok((consumed, discard))
    }

    /// The table accepted the pending call: commit it and its discard.
    pub fn confirm_meld(&mut self) -> SeatResult<()> {
        let pending = self.take_pending()?;
        self.adapter.confirm(pending.proposal)?;
        if let Some(discard) = pending.discard {
            self.adapter.commit(discard)?;
        }
        self.after_kan = pending.kind == MeldKind::Daiminkan;
        self.last_draw = None;
        Ok(())
    }

    /// The table rejected the pending call: give the instances back.
    pub fn abandon_meld(&mut self) -> SeatResult<()> {
        let pending = self.take_pending()?;
        self.adapter.abandon(pending.proposal)
    }

    fn take_pending(&mut self) -> SeatResult<PendingMeld> {
        self.pending.take().ok_or_else(|| {
            SeatError::invalid_state(format!("seat {} has no call pending", self.seat))
        })
    }

    /// Ends the hand: feeds whatever the oracle has not seen yet, then
    /// clears the log and the tracker.
    pub fn erase_state(&mut self) -> SeatResult<()> {
        if let Some(pending) = self.pending.take() {
            self.adapter.abandon(pending.proposal)?;
        }
        if self.adapter.unfed_len() > 0 {
            self.adapter.ask()?;
        }
        self.adapter.clear();
        self.last_draw = None;
        self.after_kan = false;
        Ok(())
    }
}

/// Decides, reserves and commits one discard on `adapter`.
fn throw_tile<O: Oracle>(
    adapter: &mut EventLogAdapter<O>,
    seat: Seat,
    last_draw: Option<(PhysicalId, Label)>,
    force_tsumogiri: bool,
) -> SeatResult<Discard> {
    let decision = adapter.probe([])?.last().event.clone();
    let (mut proposal, pai, tsumogiri) = match decision {
        MjaiEvent::Dahai {
            actor,
            pai,
            tsumogiri,
        } if actor == seat => (None, pai, tsumogiri),
        MjaiEvent::Reach { actor } if actor == seat => {
            let proposal = adapter.declare_and_followup(MjaiEvent::reach(seat.id())?)?;
            match proposal.followup().event.clone() {
                MjaiEvent::Dahai {
                    actor,
                    pai,
                    tsumogiri,
                } if actor == seat => (Some(proposal), pai, tsumogiri),
                other => {
                    adapter.abandon(proposal)?;
                    return Err(SeatError::invalid_state(format!(
                        "oracle answered {} to seat {seat}'s riichi",
                        other.kind()
                    )));
                }
            }
        }
        other => {
            return Err(SeatError::invalid_state(format!(
                "seat {seat} must discard, oracle answered {}",
                other.kind()
            )));
        }
    };

    let (label, pass_through) = if force_tsumogiri {
        let (_, drawn) = last_draw.ok_or_else(|| {
            SeatError::invalid_state(format!("seat {seat} has no drawn tile to throw"))
        })?;
        if drawn != pai {
            warn!(chosen = %pai, drawn = %drawn, "forced tsumogiri overrides oracle discard");
        }
        (drawn, true)
    } else {
        (pai, tsumogiri)
    };

    let riichi = proposal.is_some();
    let taken = match proposal.as_mut() {
        Some(pending) => adapter.reserve_for_discard(pending, seat, label, pass_through),
        None => adapter
            .tracker_mut()
            .take_for_discard(seat, label, pass_through)
            .map(|(id, _)| id),
    };
    let id = match taken {
        Ok(id) => id,
        Err(err) => {
            if let Some(pending) = proposal {
                adapter.abandon(pending)?;
            }
            return Err(err);
        }
    };
    if let Some(pending) = proposal {
        adapter.confirm(pending)?;
    }
    adapter.commit(MjaiEvent::dahai(seat.id(), label, pass_through)?)?;
    if riichi {
        adapter.commit(MjaiEvent::reach_accepted(seat.id())?)?;
    }
    Ok(Discard {
        id,
        label,
        tsumogiri: pass_through,
        riichi,
    })
}
