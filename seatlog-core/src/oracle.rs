//! The decision oracle boundary.

use seatlog_engine::SeatResult;

/// A stateful decision process fed one compact JSON event per call.
///
/// Events arrive strictly once and in order. An oracle cannot be told to
/// forget an event, so whatever it was fed shapes every later answer.
/// `Ok(None)` means the oracle has nothing to do after this event.
pub trait Oracle {
    fn react(&mut self, event: &str) -> SeatResult<Option<String>>;
}

impl<O: Oracle + ?Sized> Oracle for &mut O {
    fn react(&mut self, event: &str) -> SeatResult<Option<String>> {
        (**self).react(event)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn react(&mut self, event: &str) -> SeatResult<Option<String>> {
        (**self).react(event)
    }
}

/// Oracle that never acts.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassOracle;

impl Oracle for PassOracle {
    fn react(&mut self, _event: &str) -> SeatResult<Option<String>> {
        Ok(None)
    }
}

/// Adapts a closure into an oracle.
pub struct FnOracle<F>(pub F);

impl<F> Oracle for FnOracle<F>
where
    F: FnMut(&str) -> SeatResult<Option<String>>,
{
    fn react(&mut self, event: &str) -> SeatResult<Option<String>> {
        (self.0)(event)
    }
}

/// Wraps an oracle and keeps every line it was fed, in feed order.
#[derive(Debug, Default)]
pub struct Recorder<O> {
    inner: O,
    fed: Vec<String>,
}

impl<O> Recorder<O> {
    pub fn new(inner: O) -> Self {
        Self {
            inner,
            fed: Vec::new(),
        }
    }

    pub fn fed(&self) -> &[String] {
        &self.fed
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: Oracle> Oracle for Recorder<O> {
    fn react(&mut self, event: &str) -> SeatResult<Option<String>> {
        self.fed.push(event.to_owned());
        self.inner.react(event)
    }
}
