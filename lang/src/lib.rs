//! GBASM front end: splits source into instructions, binds labels and decodes each line into a
//! [vm::op::Op].

use std::{io, path::PathBuf};

use thiserror::Error;

pub mod assemble;
pub mod compile;
pub mod parse;
pub mod report;
pub mod source;

pub use assemble::{assemble, AssembleWarning, Assembly, Diagnostic};
pub use compile::{compile, read_source};
pub use source::Listing;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Couldn't read {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
