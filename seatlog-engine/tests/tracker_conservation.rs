//! Property-based conservation tests for the physical instance tracker.
//!
//! Generates random draw/discard/consume/restore sequences and checks after
//! every step that each seat holds exactly draws minus removals, that no id
//! is held twice, and that removal order follows the FIFO/LIFO rule.

use std::collections::{HashMap, VecDeque};

use proptest::prelude::*;
use seatlog_engine::tile::{Label, PhysicalId, to_label};
use seatlog_engine::{HeldInstances, Seat, SeatError, Side};

#[derive(Debug, Clone)]
enum Op {
    Draw { seat: u8, id: u8 },
    Discard { seat: u8, pick: usize, pass_through: bool },
    Consume { seat: u8, pick: usize },
    RestoreLast,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => (0u8..4, 0u8..136).prop_map(|(seat, id)| Op::Draw { seat, id }),
        2 => (0u8..4, any::<usize>(), any::<bool>())
            .prop_map(|(seat, pick, pass_through)| Op::Discard { seat, pick, pass_through }),
        1 => (0u8..4, any::<usize>()).prop_map(|(seat, pick)| Op::Consume { seat, pick }),
        1 => Just(Op::RestoreLast),
    ]
}

#[derive(Default)]
struct Model {
    queues: HashMap<(u8, Label), VecDeque<PhysicalId>>,
    removed: Vec<(Seat, Label, PhysicalId, Side)>,
    net: [i64; 4],
}

impl Model {
    fn holder(&self, id: PhysicalId) -> Option<u8> {
        self.queues
            .iter()
            .find(|(_, q)| q.contains(&id))
            .map(|((seat, _), _)| *seat)
    }

    fn labels_held(&self, seat: u8) -> Vec<Label> {
        let mut labels: Vec<Label> = self
            .queues
            .iter()
            .filter(|((s, _), q)| *s == seat && !q.is_empty())
            .map(|((_, label), _)| *label)
            .collect();
        labels.sort();
        labels
    }
}

fn seat(id: u8) -> Seat {
    Seat::new(id).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn held_equals_draws_minus_removals(ops in prop::collection::vec(op_strategy(), 1..200)) {
        let mut tracker = HeldInstances::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Draw { seat: s, id } => {
                    let result = tracker.record_id(seat(s), id);
                    if model.holder(id).is_some() {
                        let is_expected_err = matches!(result, Err(SeatError::InvalidState { .. }));
                        prop_assert!(is_expected_err);
                    } else {
                        let label = result.unwrap();
                        model.queues.entry((s, label)).or_default().push_back(id);
                        model.net[s as usize] += 1;
                    }
                }
                Op::Discard { seat: s, pick, pass_through } => {
                    let labels = model.labels_held(s);
                    if labels.is_empty() {
                        let any_label = Label::all().nth(pick % 37).unwrap();
                        let result = tracker.take_for_discard(seat(s), any_label, pass_through);
                        let is_expected_err = matches!(result, Err(SeatError::NotFound { .. }));
                        prop_assert!(is_expected_err);
                        continue;
                    }
                    let label = labels[pick % labels.len()];
                    let (id, side) = tracker.take_for_discard(seat(s), label, pass_through).unwrap();
                    let queue = model.queues.get_mut(&(s, label)).unwrap();
                    let expected = if pass_through { queue.pop_back() } else { queue.pop_front() };
                    prop_assert_eq!(Some(id), expected);
                    prop_assert_eq!(side, if pass_through { Side::Back } else { Side::Front });
                    model.removed.push((seat(s), label, id, side));
                    model.net[s as usize] -= 1;
                }
                Op::Consume { seat: s, pick } => {
                    let labels = model.labels_held(s);
                    if labels.is_empty() {
                        continue;
                    }
                    let label = labels[pick % labels.len()];
                    let id = tracker.take_for_consumption(seat(s), label).unwrap();
                    let expected = model.queues.get_mut(&(s, label)).unwrap().pop_front();
                    prop_assert_eq!(Some(id), expected);
                    model.removed.push((seat(s), label, id, Side::Front));
                    model.net[s as usize] -= 1;
                }
                Op::RestoreLast => {
                    let Some((s, label, id, side)) = model.removed.pop() else {
                        continue;
                    };
                    let result = tracker.restore(s, label, id, side);
                    if model.holder(id).is_some() {
                        prop_assert!(result.is_err());
                        continue;
                    }
                    result.unwrap();
                    let queue = model.queues.entry((s.id(), label)).or_default();
                    match side {
                        Side::Front => queue.push_front(id),
                        Side::Back => queue.push_back(id),
                    }
                    model.net[s.index()] += 1;
                }
            }

            for s in 0..4u8 {
                prop_assert_eq!(tracker.len(seat(s)) as i64, model.net[s as usize]);
                let mut held: Vec<_> = tracker.held(seat(s)).collect();
                held.sort_unstable();
                let mut expected: Vec<_> = model
                    .queues
                    .iter()
                    .filter(|((owner, _), _)| *owner == s)
                    .flat_map(|(_, q)| q.iter().copied())
                    .collect();
                expected.sort_unstable();
                prop_assert_eq!(&held, &expected);
                for id in held {
                    prop_assert_eq!(tracker.owner(id), Some(seat(s)));
                    prop_assert!(to_label(id).is_ok());
                }
            }
        }
    }
}
