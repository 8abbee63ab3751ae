//! Instrument synthesizers.
//!
//! Every renderer adds into its track buffer, so overlapping events on a track sum. The
//! envelope and amplitude constants here are fixed.

use std::f64::consts::PI;

use rand::{rngs::StdRng, Rng, SeedableRng};
use tracing::trace;

use crate::{
    event::{AudioEvent, EventKind, Track},
    mixer::{TrackBuffer, Tracks},
    op::{Chord, Drum, DrumKind, Note},
    render::RenderError,
    time::Timebase,
};

/// Waveform for single pitch notes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Voice {
    /// Sine with an `exp(-2t)` envelope
    Bass,
    /// Half amplitude square with an `exp(-1.5t)` envelope
    Guitar,
}

impl From<Track> for Voice {
    fn from(track: Track) -> Self {
        match track {
            Track::Guitar => Voice::Guitar,
            Track::Bass | Track::Drums => Voice::Bass,
        }
    }
}

pub fn midi_to_frequency(note: i64) -> f64 {
    440.0 * 2f64.powf((note - 69) as f64 / 12.0)
}

fn velocity_scale(velocity: i64) -> f64 {
    velocity as f64 / 127.0
}

#[derive(Debug, Clone)]
pub struct Synth<R = StdRng> {
    timebase: Timebase,
    /// Noise source for snares and hi-hats
    rng: R,
}

impl Synth<StdRng> {
    /// A fixed `seed` makes the noise, and so the whole render, reproducible
    pub fn new(timebase: Timebase, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(timebase, rng)
    }
}

impl<R: Rng> Synth<R> {
    pub fn with_rng(timebase: Timebase, rng: R) -> Self {
        Self { timebase, rng }
    }

    pub fn timebase(&self) -> Timebase {
        self.timebase
    }

    /// Render one event into the buffer of its track
    pub fn render(
        &mut self,
        event: &AudioEvent,
        tracks: &mut Tracks,
    ) -> Result<(), RenderError> {
        let start = self
            .timebase
            .sample_at(event.timestamp)
            .ok_or(RenderError::TooLong)?;
        let buffer = tracks.track_mut(event.track);
        trace!(start, track = %event.track, "rendering event");
        match &event.kind {
            EventKind::Note(note) => self.render_note(buffer, start, note, event.track.into()),
            EventKind::Chord(chord) => self.render_chord(buffer, start, chord),
            EventKind::Drum(drum) => self.render_drum(buffer, start, drum),
        }
    }

    pub fn render_note(
        &mut self,
        buffer: &mut TrackBuffer,
        start: usize,
        note: &Note,
        voice: Voice,
    ) -> Result<(), RenderError> {
        let frequency = midi_to_frequency(note.pitch);
        let amplitude = velocity_scale(note.velocity) * 0.3;
        let len = self.timebase.samples_for(note.duration);
        let timebase = self.timebase;

        for (i, slot) in buffer.span_mut(start, len)?.iter_mut().enumerate() {
            let t = timebase.seconds(i);
            let phase = (2.0 * PI * frequency * t).sin();
            let sample = match voice {
                Voice::Bass => amplitude * (-t * 2.0).exp() * phase,
                Voice::Guitar => {
                    let square = if phase > 0.0 { 1.0 } else { -1.0 };
                    amplitude * (-t * 1.5).exp() * square * 0.5
                }
            };
            *slot += sample as f32;
        }
        Ok(())
    }

    pub fn render_chord(
        &mut self,
        buffer: &mut TrackBuffer,
        start: usize,
        chord: &Chord,
    ) -> Result<(), RenderError> {
        let frequencies: Vec<f64> = chord.pitches.iter().copied().map(midi_to_frequency).collect();
        let len = self.timebase.samples_for(chord.duration);
        let timebase = self.timebase;

        for (i, slot) in buffer.span_mut(start, len)?.iter_mut().enumerate() {
            let t = timebase.seconds(i);
            let amplitude = velocity_scale(chord.velocity) * (-t * 1.5).exp() * 0.15;
            let sample: f64 = frequencies
                .iter()
                .map(|frequency| amplitude * (2.0 * PI * frequency * t).sin())
                .sum();
            *slot += sample as f32;
        }
        Ok(())
    }

    pub fn render_drum(
        &mut self,
        buffer: &mut TrackBuffer,
        start: usize,
        drum: &Drum,
    ) -> Result<(), RenderError> {
        let amplitude = velocity_scale(drum.velocity) * 0.4;
        let len = self.timebase.samples_for(drum.duration);
        let timebase = self.timebase;

        for (i, slot) in buffer.span_mut(start, len)?.iter_mut().enumerate() {
            let t = timebase.seconds(i);
            let sample = match drum.kind {
                DrumKind::Kick => {
                    // The pitch itself decays, sweeping down into a thump
                    let frequency = 60.0 * (-t * 50.0).exp();
                    amplitude * (-t * 15.0).exp() * (2.0 * PI * frequency * t).sin()
                }
                DrumKind::Snare => amplitude * (-t * 10.0).exp() * self.noise(),
                DrumKind::HiHat => amplitude * (-t * 20.0).exp() * self.noise() * 0.5,
                DrumKind::Other(_) => 0.0,
            };
            *slot += sample as f32;
        }
        Ok(())
    }

    /// Uniform in `[-1, 1]`
    fn noise(&mut self) -> f64 {
        self.rng.gen_range(-1.0..=1.0)
    }
}

/// Peak amplitude a drum of this kind and velocity can reach `t` seconds in
pub fn drum_envelope_ceiling(kind: DrumKind, velocity: i64, t: f64) -> f64 {
    let amplitude = velocity_scale(velocity) * 0.4;
    match kind {
        DrumKind::Kick => amplitude * (-t * 15.0).exp(),
        DrumKind::Snare => amplitude * (-t * 10.0).exp(),
        DrumKind::HiHat => amplitude * (-t * 20.0).exp() * 0.5,
        DrumKind::Other(_) => 0.0,
    }
}
