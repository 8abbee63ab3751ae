//! A tick-addressed music vm.
//!
//! [interpret::Vm] walks a decoded GBASM program and hands every `NOTE`, `CHORD` and `DRUM` to a
//! [backend::Backend], stamped with the tick clock. Once the program is done the events are
//! sorted, synthesized into per-track buffers, mixed and soft limited by [render::render], and
//! [wav] writes the result as 16-bit mono PCM.

pub mod backend;
pub mod event;
pub mod interpret;
pub mod mixer;
pub mod op;
pub mod render;
pub mod state;
pub mod synth;
pub mod time;
pub mod wav;

pub use render::{render, Render, RenderConfig, RenderError};

/// `R0..R3`
pub const REGISTER_COUNT: usize = 4;
