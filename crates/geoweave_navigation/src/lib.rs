//! # GEOWEAVE Navigation
//!
//! Where can an entity go, and how does it get there.
//!
//! ## Architecture
//!
//! - **Tile maps**: structure assets (JSON) and their `traversableSpeed` data
//! - **Traversal**: one walkable/blocked verdict per cell, combining dynamic
//!   colliders, structures and biomes
//! - **Pathfinding**: async A* over an integer grid; edge costs are awaited so
//!   they can come from caches or remote services
//! - **Routes**: A* over geohash cells, backed by the resolver
//!
//! ```text
//! ColliderQuery ──┐
//! WorldLookup ────┼──> TraversabilityResolver ──> cost(row, col) ──> find_path
//! Topology ───────┘            │
//!                         BiomeField / DungeonGenerator
//! ```
//!
//! ## Failure Model
//!
//! Unreachable goals are not errors: searches return an empty path. Failing
//! collaborators and elapsed deadlines are.
//!
//! ## Example
//!
//! ```rust,ignore
//! use geoweave_navigation::{find_path, GridPos, PathOptions, TileCost};
//!
//! let path = find_path(
//!     GridPos::new(0, 0),
//!     GridPos::new(0, 5),
//!     |_, _| std::future::ready(Ok(TileCost::Walkable)),
//!     &PathOptions::default(),
//! )
//! .await?;
//! assert_eq!(path.len(), 5);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod collaborators;
pub mod error;
pub mod pathfinding;
pub mod route;
pub mod tilemap;
pub mod traversal;

pub use collaborators::{
    ColliderQuery, Collaborators, EmptyWorld, NoColliders, WorldLookup, WorldPlacement,
};
pub use error::{NavigationError, NavigationResult};
pub use pathfinding::{find_path, GridPos, PathOptions, TileCost, DEFAULT_MAX_ITERATIONS};
pub use route::find_geohash_path;
pub use tilemap::{TileMap, SPEED_PROPERTY};
pub use traversal::TraversabilityResolver;
