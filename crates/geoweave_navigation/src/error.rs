//! # Navigation Error Types

use geoweave_core::{CollaboratorError, GeoError};
use geoweave_procedural::ProceduralError;
use thiserror::Error;

/// Errors raised while resolving walkability or searching paths.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    /// Malformed geohash or direction.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// An injected collaborator failed.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    /// Biome or dungeon generation failed.
    #[error(transparent)]
    Procedural(#[from] ProceduralError),

    /// A structure asset is not a usable tile map.
    #[error("invalid tile map {url}: {reason}")]
    InvalidTileMap {
        /// Asset URL.
        url: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The search deadline elapsed before a path was found.
    #[error("path search exceeded its deadline after {expanded} expansions")]
    DeadlineExceeded {
        /// Nodes expanded before giving up.
        expanded: usize,
    },
}

/// Result type for navigation.
pub type NavigationResult<T> = Result<T, NavigationError>;
