//! # Collaborator Interfaces
//!
//! Colliders and structure placements are owned by other services. The
//! resolver only asks narrow questions through these traits.

use std::future::Future;

use geoweave_core::{CollaboratorError, LocationType};
use serde::{Deserialize, Serialize};

/// Dynamic obstacles (entities, dropped items, closed doors).
pub trait ColliderQuery: Send + Sync {
    /// Returns `true` if anything blocks the cell.
    fn has_colliders(
        &self,
        geohash: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
    ) -> impl Future<Output = Result<bool, CollaboratorError>> + Send;
}

/// A structure asset anchored in the world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WorldPlacement {
    /// URL of the tile-map asset.
    pub url: String,
    /// Unit cell at the asset's top-left tile.
    pub origin: String,
}

/// Structure placements and their assets.
pub trait WorldLookup: Send + Sync {
    /// Returns the structure covering a cell, if any.
    fn world_at(
        &self,
        geohash: &str,
        location_type: LocationType,
    ) -> impl Future<Output = Result<Option<WorldPlacement>, CollaboratorError>> + Send;

    /// Fetches an asset body.
    fn fetch_asset(&self, url: &str) -> impl Future<Output = Result<String, CollaboratorError>> + Send;
}

/// No colliders anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoColliders;

impl ColliderQuery for NoColliders {
    fn has_colliders(
        &self,
        _geohash: &str,
        _location_type: LocationType,
        _location_instance: Option<&str>,
    ) -> impl Future<Output = Result<bool, CollaboratorError>> + Send {
        std::future::ready(Ok(false))
    }
}

/// No structures anywhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyWorld;

impl WorldLookup for EmptyWorld {
    fn world_at(
        &self,
        _geohash: &str,
        _location_type: LocationType,
    ) -> impl Future<Output = Result<Option<WorldPlacement>, CollaboratorError>> + Send {
        std::future::ready(Ok(None))
    }

    fn fetch_asset(&self, url: &str) -> impl Future<Output = Result<String, CollaboratorError>> + Send {
        std::future::ready(Err(CollaboratorError::new(
            "asset fetch",
            format!("no asset at {url}"),
        )))
    }
}

/// The collaborators one walkability query consults, borrowed together.
#[derive(Debug)]
pub struct Collaborators<'a, C, W, T> {
    /// Dynamic obstacles.
    pub colliders: &'a C,
    /// Structure placements.
    pub world: &'a W,
    /// Elevation source for the biome field.
    pub topology: &'a T,
}

impl<C, W, T> Clone for Collaborators<'_, C, W, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, W, T> Copy for Collaborators<'_, C, W, T> {}

impl<'a, C, W, T> Collaborators<'a, C, W, T> {
    /// Bundles three collaborators.
    pub const fn new(colliders: &'a C, world: &'a W, topology: &'a T) -> Self {
        Self {
            colliders,
            world,
            topology,
        }
    }
}
