//! # Core Error Types
//!
//! Errors shared by every GEOWEAVE crate.
//!
//! - [`GeoError`]: malformed input (geohash, precision, direction). Fatal,
//!   never retried; callers validate before invoking.
//! - [`ConfigError`]: a `WorldConfig` or blueprint file could not be loaded.
//! - [`CacheError`]: a cache store is unavailable. Always recovered as a miss.
//! - [`CollaboratorError`]: an injected collaborator (elevation raster, asset
//!   fetch, collider query) failed. Propagated to the caller unmodified.

use thiserror::Error;

/// Invalid spatial input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// A geohash of length zero was supplied.
    #[error("geohash must not be empty")]
    EmptyGeohash,

    /// A character outside the geohash alphabet was found.
    #[error("invalid geohash character {character:?} in {geohash:?}")]
    InvalidCharacter {
        /// The offending geohash.
        geohash: String,
        /// The offending character.
        character: char,
    },

    /// Precision outside the supported range, or an impossible precision
    /// transition (e.g. expanding to a coarser precision).
    #[error("invalid precision {precision} (supported 1..={max})")]
    InvalidPrecision {
        /// The requested precision.
        precision: usize,
        /// The largest supported precision.
        max: usize,
    },

    /// Grid coordinates do not fit the grid at the given precision.
    #[error("grid coordinate ({col}, {row}) outside the precision {precision} grid")]
    OutOfBounds {
        /// Column.
        col: u64,
        /// Row.
        row: u64,
        /// Precision of the grid.
        precision: usize,
    },

    /// Unknown direction token.
    #[error("invalid direction token: {0:?}")]
    InvalidDirection(String),

    /// Unknown location type token.
    #[error("invalid location type: {0:?}")]
    InvalidLocationType(String),
}

/// Result type for grid operations.
pub type GeoResult<T> = Result<T, GeoError>;

/// Configuration loading or validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {reason}")]
    Io {
        /// Path that was read.
        path: String,
        /// OS error message.
        reason: String,
    },

    /// The TOML document is malformed or does not match the schema.
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    /// The document parsed but violates an invariant.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A cache store could not serve a request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The backing store is unreachable or refused the operation.
    #[error("cache unavailable: {0}")]
    Unavailable(String),
}

/// Failure reported by an injected collaborator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{collaborator} failed: {message}")]
pub struct CollaboratorError {
    /// Which collaborator failed (e.g. `"topology"`, `"asset fetch"`).
    pub collaborator: &'static str,
    /// The collaborator's own error message.
    pub message: String,
}

impl CollaboratorError {
    /// Creates a new collaborator error.
    #[must_use]
    pub fn new(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self {
            collaborator,
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = GeoError::InvalidCharacter {
            geohash: "u4a".to_string(),
            character: 'a',
        };
        assert_eq!(err.to_string(), "invalid geohash character 'a' in \"u4a\"");

        let err = CollaboratorError::new("topology", "raster missing");
        assert_eq!(err.to_string(), "topology failed: raster missing");
    }
}
