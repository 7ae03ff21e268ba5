//! Crate error taxonomy.
//!
//! Only persistence and configuration faults are errors. An absent track or
//! an empty collection is a normal sequencing outcome and surfaces as `None`
//! from the sequencer, never through this type.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("config i/o failure: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("config encoding failure: {0}")]
    ConfigEncode(#[from] toml::ser::Error),
}
