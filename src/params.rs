//! Simulation parameters and the sources the stepper reads them from.
//!
//! The stepper never holds parameters across cycles; it asks a
//! [`ParamSource`] for a fresh snapshot at the start of every cycle. A plain
//! [`SimulationParams`] value is the simplest source. [`SharedParams`] stores
//! each scalar in its own atomic so a UI or control thread can retune feed
//! and kill while a simulation thread is stepping.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Parameters of the Gray-Scott system.
///
/// Values are never rejected: out-of-range feed/kill only produce flat
/// saturated regions because every step clamps concentrations to [0, 1].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationParams {
    /// Feed rate of chemical A.
    pub feed: f32,
    /// Kill rate of chemical B.
    pub kill: f32,
    /// Time step per half-step.
    pub dt: f32,
    /// Full cycles (two half-steps each) per displayed frame.
    pub iterations_per_frame: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            feed: 0.0545,
            kill: 0.062,
            dt: 1.0,
            iterations_per_frame: 4,
        }
    }
}

impl SimulationParams {
    pub fn with_feed_kill(mut self, feed: f32, kill: f32) -> Self {
        self.feed = feed;
        self.kill = kill;
        self
    }

    pub fn with_dt(mut self, dt: f32) -> Self {
        self.dt = dt;
        self
    }

    /// Set cycles per frame (at least 1).
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations_per_frame = iterations.max(1);
        self
    }
}

/// Something the stepper can take a parameter snapshot from.
pub trait ParamSource {
    fn snapshot(&self) -> SimulationParams;
}

impl ParamSource for SimulationParams {
    fn snapshot(&self) -> SimulationParams {
        *self
    }
}

impl<T: ParamSource + ?Sized> ParamSource for Arc<T> {
    fn snapshot(&self) -> SimulationParams {
        (**self).snapshot()
    }
}

/// Parameters that may be mutated from another thread while stepping.
///
/// Each scalar is stored as the bit pattern of an `f32` in an `AtomicU32`,
/// so no single value is ever torn. Updates to different scalars are not
/// ordered against each other; a snapshot may see a new feed with an old
/// kill, which the model tolerates.
#[derive(Debug)]
pub struct SharedParams {
    feed: AtomicU32,
    kill: AtomicU32,
    dt: AtomicU32,
    iterations_per_frame: AtomicU32,
}

impl SharedParams {
    pub fn new(params: SimulationParams) -> Self {
        Self {
            feed: AtomicU32::new(params.feed.to_bits()),
            kill: AtomicU32::new(params.kill.to_bits()),
            dt: AtomicU32::new(params.dt.to_bits()),
            iterations_per_frame: AtomicU32::new(params.iterations_per_frame.max(1)),
        }
    }

    /// Convenience for `Arc::new(SharedParams::new(params))`.
    pub fn shared(params: SimulationParams) -> Arc<Self> {
        Arc::new(Self::new(params))
    }

    pub fn set_feed(&self, feed: f32) {
        self.feed.store(feed.to_bits(), Ordering::Relaxed);
    }

    pub fn set_kill(&self, kill: f32) {
        self.kill.store(kill.to_bits(), Ordering::Relaxed);
    }

    pub fn set_dt(&self, dt: f32) {
        self.dt.store(dt.to_bits(), Ordering::Relaxed);
    }

    pub fn set_iterations(&self, iterations: u32) {
        self.iterations_per_frame
            .store(iterations.max(1), Ordering::Relaxed);
    }

    /// Store every scalar of `params`.
    pub fn store(&self, params: SimulationParams) {
        self.set_feed(params.feed);
        self.set_kill(params.kill);
        self.set_dt(params.dt);
        self.set_iterations(params.iterations_per_frame);
    }
}

impl Default for SharedParams {
    fn default() -> Self {
        Self::new(SimulationParams::default())
    }
}

impl ParamSource for SharedParams {
    fn snapshot(&self) -> SimulationParams {
        SimulationParams {
            feed: f32::from_bits(self.feed.load(Ordering::Relaxed)),
            kill: f32::from_bits(self.kill.load(Ordering::Relaxed)),
            dt: f32::from_bits(self.dt.load(Ordering::Relaxed)),
            iterations_per_frame: self.iterations_per_frame.load(Ordering::Relaxed),
        }
    }
}
