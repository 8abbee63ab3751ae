//! WAV encoding for 16-bit mono PCM.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

const NUM_CHANNELS: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;
const BLOCK_ALIGN: u16 = NUM_CHANNELS * (BITS_PER_SAMPLE / 8);

/// Size of the RIFF, fmt and data headers
pub const HEADER_SIZE: usize = 44;

/// The most samples a file can hold while its RIFF size still fits in 32 bits
pub const MAX_SAMPLES: usize = (u32::MAX as usize - 36) / BLOCK_ALIGN as usize;

/// Clamp to `[-1, 1]` and scale to 16 bits, truncating toward zero
pub fn quantize(sample: f32) -> i16 {
    (f64::from(sample).clamp(-1.0, 1.0) * 32767.0) as i16
}

pub fn quantize_all(master: &[f32]) -> Vec<i16> {
    master.iter().copied().map(quantize).collect()
}

pub fn write_wav(w: &mut impl Write, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let data_size = samples
        .len()
        .checked_mul(BLOCK_ALIGN as usize)
        .and_then(|size| u32::try_from(size).ok())
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} samples do not fit in a WAV file", samples.len()),
            )
        })?;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, sample_rate)?;
    write_data_chunk(w, samples, data_size)
}

pub fn samples_to_wav(samples: &[i16], sample_rate: u32) -> io::Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(HEADER_SIZE + samples.len() * 2);
    write_wav(&mut buf, samples, sample_rate)?;
    Ok(buf)
}

/// Write a WAV file without ever leaving a truncated file at `path`.
///
/// The data goes to a temporary sibling first, which is renamed over `path` once complete.
pub fn write_wav_file(path: &Path, samples: &[i16], sample_rate: u32) -> io::Result<()> {
    let partial = partial_path(path);
    debug!(path = %partial.display(), "writing");
    let result = File::create(&partial).and_then(|file| {
        let mut w = BufWriter::new(file);
        write_wav(&mut w, samples, sample_rate)?;
        w.into_inner().map_err(|e| e.into_error())?.sync_all()
    });
    match result.and_then(|()| fs::rename(&partial, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            let _ = fs::remove_file(&partial);
            Err(e)
        }
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> io::Result<()> {
    w.write_all(b"RIFF")?;
    // Equal to the whole file minus the 8 bytes of this header
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")
}

fn write_fmt_chunk(w: &mut impl Write, sample_rate: u32) -> io::Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?;
    w.write_all(&1u16.to_le_bytes())?;
    w.write_all(&NUM_CHANNELS.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&(sample_rate * BLOCK_ALIGN as u32).to_le_bytes())?;
    w.write_all(&BLOCK_ALIGN.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())
}

fn write_data_chunk(w: &mut impl Write, samples: &[i16], data_size: u32) -> io::Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;
    for sample in samples {
        w.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}
