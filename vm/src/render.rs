use std::collections::TryReserveError;

use thiserror::Error;
use tracing::{info, instrument};

use crate::{
    event::{AudioEvent, Schedule},
    interpret::{Exit, Vm},
    mixer::Tracks,
    op::Op,
    synth::Synth,
    time::{Ticks, Timebase},
    wav::MAX_SAMPLES,
};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("render too long: the audio would run past {} samples", MAX_SAMPLES)]
    TooLong,
    #[error("Couldn't allocate {len} samples")]
    OutOfMemory {
        len: usize,
        #[source]
        source: TryReserveError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    pub sample_rate: u32,
    /// Seed for snare and hi-hat noise. Fresh entropy for every render when `None`
    pub noise_seed: Option<u64>,
    /// Stop the program after this many instructions. Unbounded when `None`
    pub max_instructions: Option<usize>,
    /// Silence appended after the end of the last event
    pub tail_ticks: Ticks,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            noise_seed: None,
            max_instructions: None,
            tail_ticks: 0,
        }
    }
}

/// Everything a render produced, kept for inspection
#[derive(Debug, Clone)]
pub struct Render {
    pub exit: Exit,
    /// Render order
    pub events: Vec<AudioEvent>,
    pub tracks: Tracks,
    /// Mixed and soft limited
    pub master: Vec<f32>,
}

/// Run the program to completion, then render and mix every event it scheduled
#[instrument(skip_all)]
pub fn render(program: &[Op], config: &RenderConfig) -> Result<Render, RenderError> {
    let mut vm = Vm::new(config.max_instructions);
    let mut schedule = Schedule::default();
    let exit = vm.run(program, &mut schedule);
    let events = schedule.into_sorted();
    info!("scheduled {} audio events", events.len());

    let timebase = Timebase::new(config.sample_rate);
    let mut synth = Synth::new(timebase, config.noise_seed);
    let mut tracks = Tracks::default();
    for event in &events {
        synth.render(event, &mut tracks)?;
    }

    let tail = timebase.samples_for(i64::try_from(config.tail_ticks).unwrap_or(i64::MAX));
    let min_len = tracks
        .len()
        .checked_add(tail)
        .ok_or(RenderError::TooLong)?;
    let master = tracks.mixdown(min_len)?;
    info!(
        samples = master.len(),
        "rendered {} events at {} Hz",
        events.len(),
        config.sample_rate
    );

    Ok(Render {
        exit,
        events,
        tracks,
        master,
    })
}
