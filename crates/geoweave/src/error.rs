//! Facade errors: whatever the layer underneath reported.

use geoweave_core::{ConfigError, GeoError};
use geoweave_navigation::NavigationError;
use geoweave_procedural::ProceduralError;
use thiserror::Error;

/// Error from any `WorldCore` entry point.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    /// Malformed geohash or precision.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// The world or blueprint configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Biome, dungeon or stencil generation failed.
    #[error(transparent)]
    Procedural(#[from] ProceduralError),

    /// Walkability or path search failed.
    #[error(transparent)]
    Navigation(#[from] NavigationError),
}

/// Result type for the facade.
pub type WorldResult<T> = Result<T, WorldError>;
