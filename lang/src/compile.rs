use std::{fs, path::Path};

use crate::{
    assemble::{assemble, Assembly},
    source::Listing,
    SourceError,
};

/// Compile GBASM source text to vm ops
pub fn compile(source: &str) -> Assembly {
    assemble(&Listing::parse(source))
}

/// Read a GBASM file
pub fn read_source(path: &Path) -> Result<String, SourceError> {
    fs::read_to_string(path).map_err(|source| SourceError::Unreadable {
        path: path.to_path_buf(),
        source,
    })
}
