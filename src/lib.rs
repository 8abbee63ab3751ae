//! Compile GBASM programs and render them to WAV files.

pub mod trace;

use std::{io, path::Path, path::PathBuf};

use lang::{Assembly, SourceError};
use thiserror::Error;
use tracing::{info, instrument};
use vm::{interpret::Exit, wav, RenderConfig, RenderError};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    SourceUnreadable(#[from] SourceError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("Couldn't write {}: {source}", .path.display())]
    OutputUnwritable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A compiled program along with the text it came from, for reporting
#[derive(Debug, Clone)]
pub struct Compiled {
    pub source: String,
    pub assembly: Assembly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub exit: Exit,
    pub events: usize,
    pub samples: usize,
}

#[instrument]
pub fn compile_file(input: &Path) -> Result<Compiled, Error> {
    let source = lang::read_source(input)?;
    let assembly = lang::compile(&source);
    info!(
        "loaded {} instructions from {}",
        assembly.ops.len(),
        input.display()
    );
    Ok(Compiled { source, assembly })
}

/// Render an assembled program and write it to `output`
#[instrument(skip(assembly, config))]
pub fn render_to_file(
    assembly: &Assembly,
    output: &Path,
    config: &RenderConfig,
) -> Result<Summary, Error> {
    let render = vm::render(&assembly.ops, config)?;
    let samples = wav::quantize_all(&render.master);
    wav::write_wav_file(output, &samples, config.sample_rate).map_err(|source| {
        Error::OutputUnwritable {
            path: output.to_path_buf(),
            source,
        }
    })?;

    #[cfg(feature = "tracing")]
    if let Some(client) = tracy_client::Client::running() {
        client.frame_mark();
    }

    info!(
        "wrote {} ({} bytes of audio)",
        output.display(),
        samples.len() * 2
    );
    Ok(Summary {
        exit: render.exit,
        events: render.events.len(),
        samples: samples.len(),
    })
}

/// Compile `input` and render it to `output` in one go
pub fn render_file(input: &Path, output: &Path, config: &RenderConfig) -> Result<Summary, Error> {
    let compiled = compile_file(input)?;
    render_to_file(&compiled.assembly, output, config)
}
