//! Physical instance tracking per seat.
//!
//! For every seat, each label maps to the ordered physical ids currently
//! held in that seat's concealed hand. Draw order is preserved so a discard
//! of the tile just drawn takes the newest instance, while a discard chosen
//! from the hand (or a meld consumption) takes the oldest one.

use std::collections::VecDeque;

use crate::errors::{SeatError, SeatResult};
use crate::tile::{Label, NUM_LABELS, NUM_TILES_136, PhysicalId, to_label};
use crate::types::Seat;

/// Which end of a label's queue an instance left from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Oldest held instance.
    Front,
    /// Most recently drawn instance.
    Back,
}

#[derive(Debug, Clone)]
pub struct HeldInstances {
    held: [[VecDeque<PhysicalId>; NUM_LABELS]; 4],
    owner: [Option<Seat>; NUM_TILES_136],
}

impl Default for HeldInstances {
    fn default() -> Self {
        Self::new()
    }
}

impl HeldInstances {
    pub fn new() -> Self {
        Self {
            held: std::array::from_fn(|_| std::array::from_fn(|_| VecDeque::new())),
            owner: [None; NUM_TILES_136],
        }
    }

    /// Drops every held instance. Allocations are kept for the next hand.
    pub fn clear(&mut self) {
        for seat in &mut self.held {
            for queue in seat.iter_mut() {
                queue.clear();
            }
        }
        self.owner = [None; NUM_TILES_136];
    }

    /// Appends `id` to `seat`'s instances of `label`.
    pub fn record_draw(&mut self, seat: Seat, label: Label, id: PhysicalId) -> SeatResult<()> {
        let actual = to_label(id)?;
        if actual != label {
            return Err(SeatError::invalid_argument(format!(
                "tile {id} is {actual}, not {label}"
            )));
        }
        self.claim(seat, id)?;
        self.held[seat.index()][label.as_usize()].push_back(id);
        Ok(())
    }

    /// Records `id` under the label it carries.
    pub fn record_id(&mut self, seat: Seat, id: PhysicalId) -> SeatResult<Label> {
        let label = to_label(id)?;
        self.record_draw(seat, label, id)?;
        Ok(label)
    }

    /// Removes the instance a discard of `label` refers to.
    ///
    /// A pass-through discard (the tile just drawn) leaves from the back,
    /// any other discard from the front.
    pub fn take_for_discard(
        &mut self,
        seat: Seat,
        label: Label,
        pass_through: bool,
    ) -> SeatResult<(PhysicalId, Side)> {
        let side = if pass_through { Side::Back } else { Side::Front };
        let id = self.take(seat, label, side)?;
        Ok((id, side))
    }

    /// Removes the oldest instance of `label` for a meld or kan.
    pub fn take_for_consumption(&mut self, seat: Seat, label: Label) -> SeatResult<PhysicalId> {
        self.take(seat, label, Side::Front)
    }

    /// Puts `id` back at the end it was removed from.
    pub fn restore(&mut self, seat: Seat, label: Label, id: PhysicalId, side: Side) -> SeatResult<()> {
        let actual = to_label(id)?;
        if actual != label {
            return Err(SeatError::invalid_argument(format!(
                "cannot restore tile {id} ({actual}) as {label}"
            )));
        }
        self.claim(seat, id)?;
        let queue = &mut self.held[seat.index()][label.as_usize()];
        match side {
            Side::Front => queue.push_front(id),
            Side::Back => queue.push_back(id),
        }
        Ok(())
    }

    pub fn count(&self, seat: Seat, label: Label) -> usize {
        self.held[seat.index()][label.as_usize()].len()
    }

    /// Total instances held by `seat`.
    pub fn len(&self, seat: Seat) -> usize {
        self.held[seat.index()].iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self, seat: Seat) -> bool {
        self.len(seat) == 0
    }

    /// Held instances of `label`, oldest first.
    pub fn instances(&self, seat: Seat, label: Label) -> impl Iterator<Item = PhysicalId> + '_ {
        self.held[seat.index()][label.as_usize()].iter().copied()
    }

    /// Every id held by `seat`, grouped by label.
    pub fn held(&self, seat: Seat) -> impl Iterator<Item = PhysicalId> + '_ {
        self.held[seat.index()].iter().flatten().copied()
    }

    pub fn owner(&self, id: PhysicalId) -> Option<Seat> {
        self.owner.get(id as usize).copied().flatten()
    }

    fn claim(&mut self, seat: Seat, id: PhysicalId) -> SeatResult<()> {
        match self.owner[id as usize] {
            Some(holder) => Err(SeatError::invalid_state(format!(
                "tile {id} is already held by seat {holder}"
            ))),
            None => {
                self.owner[id as usize] = Some(seat);
                Ok(())
            }
        }
    }

    fn take(&mut self, seat: Seat, label: Label, side: Side) -> SeatResult<PhysicalId> {
        let queue = &mut self.held[seat.index()][label.as_usize()];
        let id = match side {
            Side::Front => queue.pop_front(),
            Side::Back => queue.pop_back(),
        }
        .ok_or_else(|| SeatError::not_found(format!("seat {seat} holds no {label}")))?;
        self.owner[id as usize] = None;
        Ok(id)
    }
}
