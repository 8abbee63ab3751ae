//! Tick to sample conversion.
//!
//! Timing is always computed at 480 ticks per beat on a 120 BPM base. `SET_TEMPO` is recorded by
//! the vm but does not feed into this conversion.

/// The vm's time unit
pub type Ticks = u64;

pub const TICKS_PER_BEAT: f64 = 480.0;
pub const TIMING_BPM: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Timebase {
    sample_rate: u32,
}

impl Timebase {
    pub fn new(sample_rate: u32) -> Self {
        Self { sample_rate }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn ticks_per_second(&self) -> f64 {
        TICKS_PER_BEAT * (TIMING_BPM / 60.0)
    }

    /// Index of the first sample of an event stamped at `ticks`, `None` past the end of `usize`
    pub fn sample_at(&self, ticks: Ticks) -> Option<usize> {
        let sample = (ticks as f64 / self.ticks_per_second()) * self.sample_rate as f64;
        (sample < usize::MAX as f64).then_some(sample as usize)
    }

    /// Number of samples spanned by `duration` ticks, rounded down. Negative durations span nothing.
    pub fn samples_for(&self, duration: i64) -> usize {
        let seconds = duration as f64 / self.ticks_per_second();
        (seconds * self.sample_rate as f64).max(0.0) as usize
    }

    /// Seconds since the start of an event for its `i`th sample
    pub fn seconds(&self, i: usize) -> f64 {
        i as f64 / self.sample_rate as f64
    }
}

impl Default for Timebase {
    fn default() -> Self {
        Self::new(44_100)
    }
}
