//! Shared fixtures: a small rule-based oracle and hand helpers.
#![allow(dead_code)]

use seatlog_core::{Oracle, RoundInfo};
use seatlog_engine::tile::{EAST, NUM_TILE_TYPES};
use seatlog_engine::{Label, MjaiEvent, PhysicalId, SeatResult};

pub fn l(s: &str) -> Label {
    s.parse().unwrap()
}

/// Seat 0's deal for the scenario tests: 1m 2m 3m 7m 7m 7m 7s 8s 9s E E W W.
pub const SCENARIO_HAND: [PhysicalId; 13] = [0, 4, 8, 24, 25, 26, 96, 100, 104, 108, 109, 116, 117];
pub const DRAW_W: PhysicalId = 118;
pub const DRAW_N: PhysicalId = 120;

pub fn east_one() -> RoundInfo {
    RoundInfo {
        bakaze: EAST,
        dora_marker: 60,
        kyoku: 1,
        honba: 0,
        kyotaku: 0,
        oya: 0,
        scores: [25000; 4],
    }
}

type Counts = [u8; NUM_TILE_TYPES];

fn melds_only(counts: &mut Counts) -> bool {
    let Some(i) = counts.iter().position(|&n| n > 0) else {
        return true;
    };
    if counts[i] >= 3 {
        counts[i] -= 3;
        let ok = melds_only(counts);
        counts[i] += 3;
        if ok {
            return true;
        }
    }
    if i < 27 && i % 9 <= 6 && counts[i + 1] > 0 && counts[i + 2] > 0 {
        for t in i..i + 3 {
            counts[t] -= 1;
        }
        let ok = melds_only(counts);
        for t in i..i + 3 {
            counts[t] += 1;
        }
        if ok {
            return true;
        }
    }
    false
}

pub fn is_agari(counts: &Counts) -> bool {
    let total: u32 = counts.iter().map(|&n| u32::from(n)).sum();
    if total % 3 != 2 {
        return false;
    }
    (0..NUM_TILE_TYPES).any(|pair| {
        if counts[pair] < 2 {
            return false;
        }
        let mut rest = *counts;
        rest[pair] -= 2;
        melds_only(&mut rest)
    })
}

pub fn is_tenpai(counts: &Counts) -> bool {
    (0..NUM_TILE_TYPES).any(|t| {
        if counts[t] >= 4 {
            return false;
        }
        let mut with = *counts;
        with[t] += 1;
        is_agari(&with)
    })
}

/// Plays one seat by simple rules: win when complete, declare riichi when a
/// discard leaves the hand ready, otherwise throw the drawn tile. Pons any
/// honor it holds a pair of.
pub struct RuleOracle {
    seat: u8,
    counts: Counts,
    riichi: bool,
    last_draw: Option<Label>,
}

impl RuleOracle {
    pub fn new(seat: u8) -> Self {
        Self {
            seat,
            counts: [0; NUM_TILE_TYPES],
            riichi: false,
            last_draw: None,
        }
    }

    fn add(&mut self, label: Label) {
        if let Some(t) = label.tile_type() {
            self.counts[t as usize] += 1;
        }
    }

    fn remove(&mut self, label: Label) {
        if let Some(t) = label.tile_type() {
            self.counts[t as usize] = self.counts[t as usize].saturating_sub(1);
        }
    }

    fn dahai(&self, t: usize) -> SeatResult<MjaiEvent> {
        let label = match self.last_draw {
            Some(drawn) if drawn.tile_type() == Some(t as u8) => drawn,
            _ => Label::new(t as u8).unwrap_or(Label::UNKNOWN),
        };
        MjaiEvent::dahai(self.seat, label, Some(label) == self.last_draw)
    }

    /// Discard that keeps the hand ready, preferring the drawn tile.
    fn ready_discard(&self) -> Option<usize> {
        let drawn = self.last_draw.and_then(Label::tile_type).map(usize::from);
        drawn
            .into_iter()
            .chain(0..NUM_TILE_TYPES)
            .filter(|&t| self.counts[t] > 0)
            .find(|&t| {
                let mut rest = self.counts;
                rest[t] -= 1;
                is_tenpai(&rest)
            })
    }

    fn highest_held(&self) -> Option<usize> {
        (0..NUM_TILE_TYPES).rev().find(|&t| self.counts[t] > 0)
    }

    fn on_own_draw(&mut self) -> SeatResult<Option<MjaiEvent>> {
        if is_agari(&self.counts) {
            return MjaiEvent::hora_tsumo(self.seat).map(Some);
        }
        if let Some(drawn) = self.last_draw {
            let t = drawn.tile_type().map_or(0, usize::from);
            if !self.riichi && self.counts[t] == 4 {
                return MjaiEvent::ankan(self.seat, drawn).map(Some);
            }
        }
        if !self.riichi && self.ready_discard().is_some() {
            return MjaiEvent::reach(self.seat).map(Some);
        }
        match self.last_draw.and_then(Label::tile_type) {
            Some(t) => self.dahai(usize::from(t)).map(Some),
            None => Ok(None),
        }
    }

    fn on_other_discard(&self, actor: u8, pai: Label) -> SeatResult<Option<MjaiEvent>> {
        let Some(t) = pai.tile_type().map(usize::from) else {
            return Ok(None);
        };
        let mut with = self.counts;
        with[t] += 1;
        if is_agari(&with) {
            return MjaiEvent::hora_ron(self.seat, actor).map(Some);
        }
        if !self.riichi && pai.is_honor() && self.counts[t] == 2 {
            return MjaiEvent::pon(self.seat, actor, pai, [pai, pai]).map(Some);
        }
        Ok(None)
    }

    fn answer(&mut self, event: MjaiEvent) -> SeatResult<Option<MjaiEvent>> {
        let me = self.seat;
        let mine = event.actor().map(|s| s.id()) == Some(me);
        match event {
            MjaiEvent::StartKyoku(start) => {
                self.counts = [0; NUM_TILE_TYPES];
                self.riichi = false;
                self.last_draw = None;
                for label in start.tehais[usize::from(me)] {
                    self.add(label);
                }
                Ok(None)
            }
            MjaiEvent::Tsumo { pai, .. } if mine => {
                self.add(pai);
                self.last_draw = Some(pai);
                self.on_own_draw()
            }
            MjaiEvent::Dahai { pai, .. } if mine => {
                self.remove(pai);
                self.last_draw = None;
                Ok(None)
            }
            MjaiEvent::Dahai { actor, pai, .. } => self.on_other_discard(actor.id(), pai),
            MjaiEvent::Reach { .. } if mine => {
                self.riichi = true;
                match self.ready_discard() {
                    Some(t) => self.dahai(t).map(Some),
                    None => Ok(None),
                }
            }
            MjaiEvent::Pon { consumed, .. } | MjaiEvent::Chi { consumed, .. } if mine => {
                for label in consumed {
                    self.remove(label);
                }
                self.last_draw = None;
                match self.highest_held() {
                    Some(t) => self.dahai(t).map(Some),
                    None => Ok(None),
                }
            }
            MjaiEvent::Ankan { consumed, .. } if mine => {
                for label in consumed {
                    self.remove(label);
                }
                self.last_draw = None;
                Ok(None)
            }
            _ => Ok(None),
        }
    }
}

impl Oracle for RuleOracle {
    fn react(&mut self, line: &str) -> SeatResult<Option<String>> {
        let event = MjaiEvent::from_json(line)?;
        self.answer(event)?.map(|action| action.to_json()).transpose()
    }
}
