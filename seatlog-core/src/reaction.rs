//! Parsed oracle output.

use seatlog_engine::{MjaiEvent, SeatResult};
use serde_json::Value;

/// One action proposed by the oracle.
///
/// The optional `meta` object (model scores, timing) is separated from the
/// event and only retained when the adapter is asked to keep it.
#[derive(Debug, Clone, PartialEq)]
pub struct Reaction {
    pub event: MjaiEvent,
    pub meta: Option<Value>,
}

impl Reaction {
    pub fn none() -> Self {
        Self {
            event: MjaiEvent::None,
            meta: None,
        }
    }

    /// Parses one oracle response line.
    pub fn parse(raw: &str, keep_meta: bool) -> SeatResult<Self> {
        let mut value: Value = serde_json::from_str(raw)?;
        let meta = value.as_object_mut().and_then(|map| map.remove("meta"));
        let event: MjaiEvent = serde_json::from_value(value)?;
        event.validate()?;
        Ok(Self {
            event,
            meta: meta.filter(|_| keep_meta),
        })
    }

    pub fn kind(&self) -> &'static str {
        self.event.kind()
    }

    pub fn is_none(&self) -> bool {
        self.event == MjaiEvent::None
    }

    /// Compact JSON with `meta` appended after the event fields.
    pub fn to_json(&self) -> SeatResult<String> {
        let body = self.event.to_json()?;
        let Some(meta) = &self.meta else {
            return Ok(body);
        };
        let meta = serde_json::to_string(meta)?;
        let fields = body.strip_suffix('}').unwrap_or(&body);
        Ok(format!("{fields},\"meta\":{meta}}}"))
    }
}

/// Every action the oracle produced during one feed, oldest first.
///
/// The last entry is the oracle's answer to the last event it was fed, so
/// a feed whose final event drew no response ends in `none`. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Reactions {
    earlier: Vec<Reaction>,
    last: Reaction,
}

impl Reactions {
    pub(crate) fn new(mut responses: Vec<Reaction>) -> Self {
        let last = responses.pop().unwrap_or_else(Reaction::none);
        Self {
            earlier: responses,
            last,
        }
    }

    /// The oracle's current decision.
    pub fn last(&self) -> &Reaction {
        &self.last
    }

    /// The action before the last one, if any.
    pub fn before_last(&self) -> Option<&Reaction> {
        self.earlier.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reaction> {
        self.earlier.iter().chain(std::iter::once(&self.last))
    }

    /// True when the oracle had nothing at all to say.
    pub fn is_none(&self) -> bool {
        self.earlier.is_empty() && self.last.is_none()
    }

    pub fn into_vec(self) -> Vec<Reaction> {
        let mut all = self.earlier;
        all.push(self.last);
        all
    }
}
