//! # Procedural Error Types

use geoweave_core::{CollaboratorError, ConfigError, GeoError};
use thiserror::Error;

/// Errors raised while generating biomes, dungeons or stencils.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProceduralError {
    /// Malformed geohash or precision.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// An injected collaborator failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// A blueprint file could not be read or parsed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The BSP produced fewer rooms than the dungeon needs.
    #[error("dungeon {dungeon} has {leaves} candidate rooms, needs {required}")]
    InsufficientLeaves {
        /// The dungeon cell.
        dungeon: String,
        /// Candidate rooms produced.
        leaves: usize,
        /// Rooms requested.
        required: usize,
    },

    /// A blueprint violates a structural rule.
    #[error("invalid blueprint {name:?}: {reason}")]
    InvalidBlueprint {
        /// Blueprint name.
        name: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type for procedural generation.
pub type ProceduralResult<T> = Result<T, ProceduralError>;
