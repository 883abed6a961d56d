//! Multi-tick coordination of asynchronous reads and delays.
//!
//! The tick loop never blocks.  An instruction that needs an asynchronous
//! result (`Setasync`, `Delay`) is re-executed on every tick until the result
//! arrives, and each re-execution polls [`Pending`]:
//!
//! | state | poll |
//! |-------|------|
//! | idle | issue the request (cycles = 1), no value yet |
//! | in flight, cycles ≤ limit | cycles += 1, no value yet |
//! | in flight, cycles > limit | give up: back to idle, [`Poll::TimedOut`] |
//! | completed | back to idle, [`Poll::Ready`] with the result |
//!
//! The capability answers through a [`Completion`], the sending half of a
//! one-shot channel.  Abandoning a request drops the receiving half, so an
//! answer arriving after a timeout is discarded instead of being picked up by
//! whatever instruction runs next.

use tokio::sync::oneshot::{self, error::TryRecvError};

use super::value::Value;

/// Polls a read may stay in flight before it times out.
pub const DEFAULT_ASYNC_LIMIT: u32 = 3;

// ── Completion ────────────────────────────────────────────────────────────────

/// Single-shot answer handle given to a capability.
///
/// Dropping it without answering abandons the request.
#[derive(Debug)]
pub struct Completion {
    tx: oneshot::Sender<Option<Value>>,
}

impl Completion {
    /// Answer a read.
    pub fn complete(self, value: Value) {
        let _ = self.tx.send(Some(value));
    }

    /// Signal that a delay elapsed.
    pub fn finish(self) {
        let _ = self.tx.send(None);
    }

    /// `true` once the requester has stopped waiting.
    pub fn is_abandoned(&self) -> bool {
        self.tx.is_closed()
    }
}

// ── Poll result ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    /// The request completed; reads carry their value, delays carry none.
    Ready(Option<Value>),
    /// Still waiting.
    Waiting,
    /// Gave up after the poll limit.  Not an error: the caller may retry.
    TimedOut,
}

/// Observable state of the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncState {
    Idle,
    InFlight { cycles: u32 },
}

/// The capability dropped its [`Completion`] without answering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Abandoned;

// ── Pending ───────────────────────────────────────────────────────────────────

struct InFlight {
    rx: oneshot::Receiver<Option<Value>>,
    cycles: u32,
    times_out: bool,
}

/// At most one outstanding asynchronous operation.
pub struct Pending {
    limit: u32,
    inflight: Option<InFlight>,
}

impl Default for Pending {
    fn default() -> Self {
        Self::new(DEFAULT_ASYNC_LIMIT)
    }
}

impl Pending {
    pub fn new(limit: u32) -> Self {
        Pending { limit, inflight: None }
    }

    pub fn set_limit(&mut self, limit: u32) {
        self.limit = limit;
    }

    pub fn state(&self) -> AsyncState {
        match &self.inflight {
            None => AsyncState::Idle,
            Some(f) => AsyncState::InFlight { cycles: f.cycles },
        }
    }

    pub fn is_outstanding(&self) -> bool {
        self.inflight.is_some()
    }

    /// Forget any outstanding request; a late answer to it is discarded.
    pub fn reset(&mut self) {
        self.inflight = None;
    }

    /// Advance the protocol by one poll.
    ///
    /// `issue` is called only when no request is outstanding and must hand
    /// the [`Completion`] to the capability.  Requests issued with
    /// `times_out == false` (delays) stay in flight until answered.
    pub fn poll<F>(&mut self, times_out: bool, issue: F) -> Result<Poll, Abandoned>
    where
        F: FnOnce(Completion),
    {
        let Some(flight) = self.inflight.as_mut() else {
            let (tx, rx) = oneshot::channel();
            self.inflight = Some(InFlight { rx, cycles: 1, times_out });
            issue(Completion { tx });
            return Ok(Poll::Waiting);
        };

        match flight.rx.try_recv() {
            Ok(value) => {
                self.inflight = None;
                Ok(Poll::Ready(value))
            }
            Err(TryRecvError::Empty) => {
                if flight.times_out && flight.cycles > self.limit {
                    self.inflight = None;
                    Ok(Poll::TimedOut)
                } else {
                    flight.cycles += 1;
                    Ok(Poll::Waiting)
                }
            }
            Err(TryRecvError::Closed) => {
                self.inflight = None;
                Err(Abandoned)
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
