//! Bus and time collaborators
//!
//! The fingerprint engine never touches sockets or wall-clock time directly.
//! It drains a [`FrameSource`], sends through a [`CanSink`] and measures time
//! with a [`Clock`], so a replayed log and a [`ManualClock`] drive it exactly
//! like a live bus.

use crate::types::{CanFrame, Result};
use std::cell::Cell;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Non-blocking provider of received bus frames
pub trait FrameSource {
    /// Return every frame available right now, in arrival order. Never blocks;
    /// an empty vector means nothing arrived since the last drain.
    fn drain(&mut self) -> Vec<CanFrame>;
}

impl FrameSource for VecDeque<CanFrame> {
    fn drain(&mut self) -> Vec<CanFrame> {
        VecDeque::drain(self, ..).collect()
    }
}

impl<S: FrameSource + ?Sized> FrameSource for &mut S {
    fn drain(&mut self) -> Vec<CanFrame> {
        (**self).drain()
    }
}

/// Receiver of outbound frames built by a vehicle controller
pub trait CanSink {
    fn send(&mut self, frames: &[CanFrame]) -> Result<()>;
}

impl CanSink for Vec<CanFrame> {
    fn send(&mut self, frames: &[CanFrame]) -> Result<()> {
        self.extend_from_slice(frames);
        Ok(())
    }
}

/// Monotonic time since start, plus the loop's only suspension point
pub trait Clock {
    fn now(&self) -> Duration;
    fn sleep(&self, duration: Duration);
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Duration {
        (**self).now()
    }

    fn sleep(&self, duration: Duration) {
        (**self).sleep(duration)
    }
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Clock that only moves when slept on or advanced by hand
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }
}

/// Replays captured frames, releasing each one once the clock has moved past
/// its capture offset from the first frame.
///
/// Frames without a capture timestamp are released on the first drain.
pub struct ReplaySource<C: Clock> {
    frames: VecDeque<CanFrame>,
    clock: C,
    start: Duration,
    first_timestamp_ns: Option<u64>,
}

impl<C: Clock> ReplaySource<C> {
    /// Start replaying `frames` at the clock's current time
    pub fn new(frames: Vec<CanFrame>, clock: C) -> Self {
        let first_timestamp_ns = frames.iter().filter_map(|f| f.timestamp_ns).min();
        let start = clock.now();
        Self {
            frames: frames.into(),
            clock,
            start,
            first_timestamp_ns,
        }
    }

    /// True once every frame has been handed out
    pub fn is_exhausted(&self) -> bool {
        self.frames.is_empty()
    }

    fn offset_of(&self, frame: &CanFrame) -> Duration {
        match (frame.timestamp_ns, self.first_timestamp_ns) {
            (Some(ts), Some(first)) => Duration::from_nanos(ts.saturating_sub(first)),
            _ => Duration::ZERO,
        }
    }
}

impl<C: Clock> FrameSource for ReplaySource<C> {
    fn drain(&mut self) -> Vec<CanFrame> {
        let elapsed = self.clock.now().saturating_sub(self.start);
        let mut released = Vec::new();
        while let Some(frame) = self.frames.front() {
            if self.offset_of(frame) > elapsed {
                break;
            }
            if let Some(frame) = self.frames.pop_front() {
                released.push(frame);
            }
        }
        released
    }
}
