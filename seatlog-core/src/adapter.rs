//! Per-seat event log with speculative probing.
//!
//! The adapter owns the committed mjai log of one observing seat, the
//! physical instances that seat holds, and the oracle. The oracle is fed
//! each log entry exactly once, in log order, lazily, the next time an
//! answer is needed.
//!
//! A probe opens a speculative frame on top of the committed log, feeds the
//! oracle, and rolls the log back when the frame closes. Rollback runs from
//! `Drop`, so it also happens on `?` early returns and during unwinding.
//! Events the oracle saw inside a frame cannot be unseen; they are kept as
//! *unconfirmed* and a later commit of the identical event is recorded
//! without being fed again.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};

use seatlog_engine::{HeldInstances, Label, MjaiEvent, PhysicalId, Seat, SeatError, SeatResult, Side};
use tracing::{debug, warn};

use crate::oracle::Oracle;
use crate::reaction::{Reaction, Reactions};

/// One log entry. Fed entries always form a prefix of the log.
#[derive(Debug, Clone, PartialEq)]
struct Entry {
    event: MjaiEvent,
    fed: bool,
    /// What the oracle answered when this entry was fed.
    answer: Option<Reaction>,
}

impl Entry {
    fn unfed(event: MjaiEvent) -> Self {
        Self {
            event,
            fed: false,
            answer: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Probing { frame: u64 },
}

#[derive(Debug)]
struct Frame {
    id: u64,
    base_len: usize,
}

#[derive(Debug, Clone, Copy)]
struct Reserved {
    seat: Seat,
    label: Label,
    id: PhysicalId,
    side: Side,
}

/// A declaration the oracle has already answered, awaiting the table's
/// verdict.
#[derive(Debug)]
#[must_use = "a proposal must be confirmed or abandoned"]
pub struct Proposal {
    trigger: MjaiEvent,
    reactions: Reactions,
    reserved: Vec<Reserved>,
}

impl Proposal {
    pub fn trigger(&self) -> &MjaiEvent {
        &self.trigger
    }

    /// The oracle's answer to the declaration.
    pub fn followup(&self) -> &Reaction {
        self.reactions.last()
    }

    pub fn reactions(&self) -> &Reactions {
        &self.reactions
    }

    /// Ids taken out of the tracker for this proposal, in reservation order.
    pub fn reserved_ids(&self) -> impl Iterator<Item = PhysicalId> + '_ {
        self.reserved.iter().map(|r| r.id)
    }
}

pub struct EventLogAdapter<O> {
    oracle: O,
    log: Vec<Entry>,
    unconfirmed: VecDeque<Entry>,
    tracker: HeldInstances,
    phase: Phase,
    next_frame: u64,
    keep_meta: bool,
}

impl<O> EventLogAdapter<O> {
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            log: Vec::new(),
            unconfirmed: VecDeque::new(),
            tracker: HeldInstances::new(),
            phase: Phase::Idle,
            next_frame: 1,
            keep_meta: false,
        }
    }

    pub fn with_keep_meta(mut self, keep_meta: bool) -> Self {
        self.keep_meta = keep_meta;
        self
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn into_oracle(self) -> O {
        self.oracle
    }

    /// The log as the oracle should understand it, oldest first.
    pub fn events(&self) -> impl DoubleEndedIterator<Item = &MjaiEvent> {
        self.log.iter().map(|e| &e.event)
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Log entries the oracle has not been fed yet.
    pub fn unfed_len(&self) -> usize {
        self.log.iter().filter(|e| !e.fed).count()
    }

    /// Events the oracle saw speculatively that no commit has matched yet.
    pub fn unconfirmed(&self) -> impl Iterator<Item = &MjaiEvent> {
        self.unconfirmed.iter().map(|e| &e.event)
    }

    pub fn is_probing(&self) -> bool {
        matches!(self.phase, Phase::Probing { .. })
    }

    pub fn tracker(&self) -> &HeldInstances {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut HeldInstances {
        &mut self.tracker
    }

    /// Appends an observed event to the committed log.
    ///
    /// An event the oracle already saw speculatively is recorded as fed,
    /// with the answer it got then, but only while the oracle has seen the
    /// whole log before it. Anything else drops the unconfirmed events.
    pub fn commit(&mut self, event: MjaiEvent) -> SeatResult<()> {
        if let Phase::Probing { frame } = self.phase {
            return Err(SeatError::invalid_state(format!(
                "cannot commit {} while probe frame {frame} is open",
                event.kind()
            )));
        }
        let caught_up = self.log.iter().all(|e| e.fed);
        let entry = match self.unconfirmed.pop_front() {
            Some(seen) if caught_up && seen.event == event => seen,
            Some(seen) => {
                warn!(
                    seen = seen.event.kind(),
                    committed = event.kind(),
                    caught_up,
                    dropped = self.unconfirmed.len() + 1,
                    "oracle saw speculative events that were never committed in order"
                );
                self.unconfirmed.clear();
                Entry::unfed(event)
            }
            None => Entry::unfed(event),
        };
        debug!(kind = entry.event.kind(), replayed = entry.fed, "commit");
        self.log.push(entry);
        Ok(())
    }

    /// Resets the log and tracker for a new hand. The oracle is kept.
    pub fn clear(&mut self) {
        self.log.clear();
        self.unconfirmed.clear();
        self.tracker.clear();
        self.phase = Phase::Idle;
    }

    /// Detaches the tail of the log while `hide` matches. The detached
    /// events are re-appended, in their original order and after anything
    /// committed meanwhile, when the returned guard is dropped.
    pub fn withhold_tail<P>(&mut self, mut hide: P) -> Withheld<'_, O>
    where
        P: FnMut(&MjaiEvent) -> bool,
    {
        let mut split = self.log.len();
        while split > 0 && hide(&self.log[split - 1].event) {
            split -= 1;
        }
        let tail = self.log.split_off(split);
        if !tail.is_empty() {
            debug!(withheld = tail.len(), "log tail withheld");
        }
        Withheld {
            adapter: self,
            tail,
        }
    }

    fn begin_probe(&mut self) -> SeatResult<Frame> {
        if let Phase::Probing { frame } = self.phase {
            return Err(SeatError::invalid_state(format!(
                "probe frame {frame} is already open"
            )));
        }
        let id = self.next_frame;
        self.next_frame += 1;
        self.phase = Phase::Probing { frame: id };
        debug!(frame = id, base = self.log.len(), "probe opened");
        Ok(Frame {
            id,
            base_len: self.log.len(),
        })
    }

    fn push_speculative(&mut self, event: MjaiEvent) -> SeatResult<()> {
        if !self.is_probing() {
            return Err(SeatError::invalid_state(format!(
                "speculative {} outside a probe frame",
                event.kind()
            )));
        }
        self.log.push(Entry::unfed(event));
        Ok(())
    }

    /// Closes `frame`, dropping everything pushed since it was opened.
    fn end_probe(&mut self, frame: Frame) -> SeatResult<()> {
        match self.phase {
            Phase::Probing { frame: open } if open == frame.id => {
                let speculative = self.log.split_off(frame.base_len.min(self.log.len()));
                let before = self.unconfirmed.len();
                self.unconfirmed
                    .extend(speculative.into_iter().filter(|e| e.fed));
                self.phase = Phase::Idle;
                debug!(
                    frame = frame.id,
                    unconfirmed = self.unconfirmed.len() - before,
                    "probe rolled back"
                );
                Ok(())
            }
            Phase::Probing { frame: open } => Err(SeatError::invalid_state(format!(
                "frame {} is not the open frame {open}",
                frame.id
            ))),
            Phase::Idle => Err(SeatError::invalid_state(format!(
                "frame {} closed with no probe open",
                frame.id
            ))),
        }
    }

    /// Takes an instance out of the tracker on behalf of `proposal` so the
    /// reservation is undone if the proposal is abandoned.
    pub fn reserve_for_discard(
        &mut self,
        proposal: &mut Proposal,
        seat: Seat,
        label: Label,
        pass_through: bool,
    ) -> SeatResult<PhysicalId> {
        let (id, side) = self.tracker.take_for_discard(seat, label, pass_through)?;
        proposal.reserved.push(Reserved {
            seat,
            label,
            id,
            side,
        });
        Ok(id)
    }

    pub fn reserve_for_consumption(
        &mut self,
        proposal: &mut Proposal,
        seat: Seat,
        label: Label,
    ) -> SeatResult<PhysicalId> {
        let id = self.tracker.take_for_consumption(seat, label)?;
        proposal.reserved.push(Reserved {
            seat,
            label,
            id,
            side: Side::Front,
        });
        Ok(id)
    }

    /// Commits the proposal's declaration. Reserved instances stay taken.
    pub fn confirm(&mut self, proposal: Proposal) -> SeatResult<()> {
        self.commit(proposal.trigger)
    }

    /// Drops the proposal and puts its reserved instances back.
    pub fn abandon(&mut self, proposal: Proposal) -> SeatResult<()> {
        for r in proposal.reserved.iter().rev() {
            self.tracker.restore(r.seat, r.label, r.id, r.side)?;
        }
        if self
            .unconfirmed
            .front()
            .is_some_and(|seen| seen.event == proposal.trigger)
        {
            self.unconfirmed.pop_front();
            warn!(
                kind = proposal.trigger.kind(),
                "oracle keeps an abandoned declaration"
            );
        }
        Ok(())
    }

    /// The oracle's answer to the last event of the log, which is the last
    /// event it was fed once nothing is pending.
    fn standing_answer(&self) -> Option<Reaction> {
        self.log
            .last()
            .filter(|e| e.fed)
            .and_then(|e| e.answer.clone())
    }
}

impl<O: Oracle> EventLogAdapter<O> {
    /// Feeds every log entry the oracle has not seen, in log order.
    ///
    /// Returns the responses produced by this feed, ending with the answer
    /// to the last event fed (`none` if it had nothing to say). When there
    /// was nothing to feed, the oracle's answer to the last log entry is
    /// returned again.
    pub fn ask(&mut self) -> SeatResult<Reactions> {
        let mut responses = Vec::new();
        let mut fed_any = false;
        for entry in self.log.iter_mut().filter(|e| !e.fed) {
            let line = entry.event.to_json()?;
            debug!(event = %line, "feeding oracle");
            let response = self.oracle.react(&line)?;
            entry.fed = true;
            fed_any = true;
            if let Some(raw) = response {
                debug!(response = %raw, "oracle answered");
                let reaction = Reaction::parse(&raw, self.keep_meta)?;
                responses.push(reaction.clone());
                entry.answer = Some(reaction);
            }
        }
        match self.standing_answer() {
            Some(answer) if !fed_any => responses.push(answer),
            None if fed_any => responses.push(Reaction::none()),
            _ => {}
        }
        Ok(Reactions::new(responses))
    }

    /// Runs `f` inside a speculative frame and rolls the log back however
    /// `f` exits.
    pub fn speculate<T, F>(&mut self, f: F) -> SeatResult<T>
    where
        F: FnOnce(&mut Speculation<'_, O>) -> SeatResult<T>,
    {
        let frame = self.begin_probe()?;
        let mut speculation = Speculation {
            adapter: self,
            frame: Some(frame),
        };
        let result = f(&mut speculation);
        drop(speculation);
        result
    }

    /// Asks the oracle what it would do if `events` happened next.
    pub fn probe<I>(&mut self, events: I) -> SeatResult<Reactions>
    where
        I: IntoIterator<Item = MjaiEvent>,
    {
        self.speculate(|scope| {
            for event in events {
                scope.push(event)?;
            }
            scope.ask()
        })
    }

    /// Probes with the trailing events matching `hide` detached. They are
    /// re-appended, in their original order, after the probe's rollback.
    pub fn probe_with_temporary_removal<P, I>(&mut self, hide: P, events: I) -> SeatResult<Reactions>
    where
        P: FnMut(&MjaiEvent) -> bool,
        I: IntoIterator<Item = MjaiEvent>,
    {
        let mut withheld = self.withhold_tail(hide);
        withheld.probe(events)
    }

    /// Shows the oracle `trigger` and captures its follow-up without
    /// committing the declaration.
    pub fn declare_and_followup(&mut self, trigger: MjaiEvent) -> SeatResult<Proposal> {
        let reactions = self.speculate(|scope| {
            scope.push(trigger.clone())?;
            scope.ask()
        })?;
        debug!(
            trigger = trigger.kind(),
            followup = reactions.last().kind(),
            "declaration proposed"
        );
        Ok(Proposal {
            trigger,
            reactions,
            reserved: Vec::new(),
        })
    }
}

/// An open speculative frame borrowed from an adapter. Dropping it rolls
/// the log back.
pub struct Speculation<'a, O> {
    adapter: &'a mut EventLogAdapter<O>,
    frame: Option<Frame>,
}

impl<O> Speculation<'_, O> {
    pub fn push(&mut self, event: MjaiEvent) -> SeatResult<()> {
        self.adapter.push_speculative(event)
    }

    pub fn events(&self) -> impl Iterator<Item = &MjaiEvent> {
        self.adapter.events()
    }

    pub fn tracker(&self) -> &HeldInstances {
        self.adapter.tracker()
    }
}

impl<O: Oracle> Speculation<'_, O> {
    pub fn ask(&mut self) -> SeatResult<Reactions> {
        self.adapter.ask()
    }
}

impl<O> Drop for Speculation<'_, O> {
    fn drop(&mut self) {
        if let Some(frame) = self.frame.take() {
            if let Err(err) = self.adapter.end_probe(frame) {
                warn!(%err, "speculative frame left open");
            }
        }
    }
}

/// Log tail detached by [`EventLogAdapter::withhold_tail`]. Derefs to the
/// adapter; dropping it puts the tail back at the end of the log.
pub struct Withheld<'a, O> {
    adapter: &'a mut EventLogAdapter<O>,
    tail: Vec<Entry>,
}

impl<O> Withheld<'_, O> {
    /// The detached events, oldest first.
    pub fn withheld(&self) -> impl Iterator<Item = &MjaiEvent> {
        self.tail.iter().map(|e| &e.event)
    }
}

impl<O> Deref for Withheld<'_, O> {
    type Target = EventLogAdapter<O>;

    fn deref(&self) -> &Self::Target {
        self.adapter
    }
}

impl<O> DerefMut for Withheld<'_, O> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.adapter
    }
}

impl<O> Drop for Withheld<'_, O> {
    fn drop(&mut self) {
        let tail = std::mem::take(&mut self.tail);
        if !tail.is_empty() {
            debug!(restored = tail.len(), "log tail restored");
        }
        self.adapter.log.extend(tail);
    }
}
