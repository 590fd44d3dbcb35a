//! Errors raised by the core.
//!
//! Document content never produces an error: unmatched input, unclosed nodes
//! and stray closes are all recovered inside the tree. The variants below are
//! broken bookkeeping in the calling driver or an unusable configuration.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Hard failures of the incremental machinery.
#[derive(Debug, Error)]
pub enum Error {
    /// A split index past the end of the chunk list.
    #[error("split index {index} is out of bounds for a buffer of {len} chunks")]
    SplitOutOfBounds { index: usize, len: usize },

    /// A slide index past the end of the chunk list.
    #[error("slide index {index} is out of bounds for a buffer of {len} chunks")]
    SlideOutOfBounds { index: usize, len: usize },

    /// Sliding would move a chunk before the document start or past `u32::MAX`.
    #[error("sliding the chunk at {from} by {offset} leaves the addressable range")]
    SlideOverflow { from: u32, offset: i32 },

    /// A requested stop position lies beyond the document.
    #[error("stop position {position} is beyond the document length {length}")]
    BeyondDocument { position: u32, length: u32 },

    /// An edit whose range is inverted or outside the previous document.
    #[error("edit {from}..{to} is invalid for a document of length {length}")]
    InvalidEdit { from: u32, to: u32, length: u32 },

    /// The cached length plus the edit delta does not give the new length.
    #[error("cached length {cached} shifted by {offset} does not match the document length {actual}")]
    LengthMismatch { cached: u32, offset: i64, actual: u32 },

    /// A parse session was driven again after producing its output.
    #[error("parse session already finished")]
    SessionFinished,

    /// A configuration value outside its usable range.
    #[error("invalid configuration: `{field}` {reason}")]
    InvalidConfig {
        field: &'static str,
        reason: &'static str,
    },

    /// The configuration file is not valid TOML for [`crate::SyntaxConfig`].
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration file could not be read.
    #[error("failed to read configuration at {}: {source}", path.display())]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;
