//! # Topology Interface
//!
//! The elevation raster is owned by another service. Generators only ask
//! for a single height per cell through this trait.
//!
//! ```text
//! procedural defines:     host implements:
//! ┌────────────────┐      ┌────────────────┐
//! │ trait Topology │  ←─  │ impl Topology  │
//! └────────────────┘      └────────────────┘
//! ```

use std::future::Future;

use geoweave_core::{CollaboratorError, LocationType};

/// Elevation lookup.
pub trait Topology: Send + Sync {
    /// Returns the elevation of a cell. Values below the configured sea
    /// level are water.
    fn elevation_at(
        &self,
        geohash: &str,
        location_type: LocationType,
    ) -> impl Future<Output = Result<f64, CollaboratorError>> + Send;
}

/// A topology with the same elevation everywhere.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlatTopology {
    /// Elevation returned for every cell.
    pub elevation: f64,
}

impl FlatTopology {
    /// Land everywhere.
    #[must_use]
    pub const fn land() -> Self {
        Self { elevation: 1.0 }
    }

    /// Water everywhere.
    #[must_use]
    pub const fn ocean() -> Self {
        Self { elevation: -1.0 }
    }
}

impl Topology for FlatTopology {
    fn elevation_at(
        &self,
        _geohash: &str,
        _location_type: LocationType,
    ) -> impl Future<Output = Result<f64, CollaboratorError>> + Send {
        std::future::ready(Ok(self.elevation))
    }
}
