//! Tuning parameters, loadable from `weft.toml`.
//!
//! These values trade allocation count against reuse granularity. The
//! margins must cover whatever context the grammar looks at around a match
//! for reparses to stay exact.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

/// Name of the configuration file looked up by tools.
pub const CONFIG_FILE: &str = "weft.toml";

/// Tuning parameters shared by chunks, the compiler, the tree builder and the
/// incremental driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntaxConfig {
    /// Maximum number of nodes packed into one `TreeBuffer`.
    pub max_buffer_length: u32,
    /// Maximum number of direct children before a node is rebalanced.
    pub branch_factor: u32,
    /// Maximum number of tokens in a chunk before a new one is started.
    pub max_chunk_tokens: u32,
    /// Fixed step by which token and record arrays grow.
    pub growth_interval: u32,
    /// Bytes before an edit that are re-tokenized in any case.
    pub margin_before: u32,
    /// Bytes after an edit that are re-tokenized in any case.
    pub margin_after: u32,
    /// Bytes of text first handed to the matcher past the match position. A
    /// match reaching the end of that window is retried with a wider one.
    pub window_length: u32,
}

impl Default for SyntaxConfig {
    fn default() -> Self {
        Self {
            max_buffer_length: 1024,
            branch_factor: 8,
            max_chunk_tokens: 64,
            growth_interval: 64,
            margin_before: 32,
            margin_after: 128,
            window_length: 1024,
        }
    }
}

impl SyntaxConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&contents)?;
        debug!("Loaded syntax configuration from {}", path.display());
        Ok(config)
    }

    /// Looks for [`CONFIG_FILE`] in `dir`, falling back to the defaults when
    /// there is none.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if path.is_file() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Rejects values the algorithms cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.max_buffer_length == 0 {
            return Err(Error::InvalidConfig {
                field: "max_buffer_length",
                reason: "must be at least 1",
            });
        }
        if self.branch_factor < 2 {
            return Err(Error::InvalidConfig {
                field: "branch_factor",
                reason: "must be at least 2",
            });
        }
        if self.max_chunk_tokens == 0 {
            return Err(Error::InvalidConfig {
                field: "max_chunk_tokens",
                reason: "must be at least 1",
            });
        }
        if self.growth_interval == 0 {
            return Err(Error::InvalidConfig {
                field: "growth_interval",
                reason: "must be at least 1",
            });
        }
        if self.window_length == 0 {
            return Err(Error::InvalidConfig {
                field: "window_length",
                reason: "must be at least 1",
            });
        }
        Ok(())
    }

    pub(crate) fn growth(&self) -> usize {
        self.growth_interval as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = SyntaxConfig::from_toml_str("branch_factor = 4\nmargin_after = 16\n").unwrap();
        assert_eq!(config.branch_factor, 4);
        assert_eq!(config.margin_after, 16);
        assert_eq!(config.max_buffer_length, 1024);
        assert_eq!(config.window_length, 1024);
    }

    #[test]
    fn degenerate_values_are_rejected() {
        let err = SyntaxConfig::from_toml_str("branch_factor = 1").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidConfig {
                field: "branch_factor",
                ..
            }
        ));
        assert!(SyntaxConfig::from_toml_str("max_buffer_length = 0").is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = SyntaxConfig::from_toml_str("chunk_size = 3").unwrap_err();
        assert!(matches!(err, Error::ConfigParse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = std::env::temp_dir().join("weft-config-discover-missing");
        let config = SyntaxConfig::discover(&dir).unwrap();
        assert_eq!(config, SyntaxConfig::default());
    }
}
