use tracing::{debug, instrument};

use crate::{event::Track, render::RenderError, wav::MAX_SAMPLES};

/// Growable sample buffer for one track. Writers add into it, never overwrite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackBuffer {
    samples: Vec<f32>,
}

impl TrackBuffer {
    /// The `len` samples from `start`, growing the buffer with silence when it is too short
    pub fn span_mut(&mut self, start: usize, len: usize) -> Result<&mut [f32], RenderError> {
        let end = start
            .checked_add(len)
            .filter(|end| *end <= MAX_SAMPLES)
            .ok_or(RenderError::TooLong)?;
        if self.samples.len() < end {
            grow(&mut self.samples, end)?;
        }
        Ok(&mut self.samples[start..end])
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

fn grow(samples: &mut Vec<f32>, len: usize) -> Result<(), RenderError> {
    samples
        .try_reserve_exact(len - samples.len())
        .map_err(|source| RenderError::OutOfMemory { len, source })?;
    samples.resize(len, 0.0);
    Ok(())
}

/// Saturate a summed sample into `[-0.8, 0.8]` instead of clipping it
pub fn soft_limit(sample: f32) -> f32 {
    (sample * 0.7).tanh() * 0.8
}

#[derive(Debug, Clone, Default)]
pub struct Tracks {
    buffers: [TrackBuffer; 3],
}

impl Tracks {
    pub fn track(&self, track: Track) -> &TrackBuffer {
        &self.buffers[track.index()]
    }

    pub fn track_mut(&mut self, track: Track) -> &mut TrackBuffer {
        &mut self.buffers[track.index()]
    }

    /// Length of the longest track
    pub fn len(&self) -> usize {
        self.buffers.iter().map(TrackBuffer::len).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum the tracks sample by sample and soft limit the result.
    ///
    /// Shorter tracks contribute silence past their end. The master is at least `min_len`
    /// samples long, padded with silence.
    #[instrument(skip(self))]
    pub fn mixdown(&self, min_len: usize) -> Result<Vec<f32>, RenderError> {
        let len = self.len().max(min_len);
        if len > MAX_SAMPLES {
            return Err(RenderError::TooLong);
        }
        debug!(len, "mixing {} tracks", self.buffers.len());

        let mut master = vec![];
        grow(&mut master, len)?;
        for buffer in &self.buffers {
            let samples = buffer.samples();
            dasp::slice::add_in_place(&mut master[..samples.len()], samples);
        }
        for sample in &mut master {
            *sample = soft_limit(*sample);
        }
        Ok(master)
    }
}
