//! # GEOWEAVE
//!
//! A deterministic world behind a geohash. Nothing is stored: biomes,
//! dungeons, structure placements and walkability are derived on demand from
//! the cell address and a [`WorldConfig`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          WorldCore                           │
//! ├──────────────────────────────────────────────────────────────┤
//! │  geoweave_navigation   TraversabilityResolver, A*, routes    │
//! │           │                                                  │
//! │  geoweave_procedural   BiomeField, DungeonGenerator,         │
//! │           │            StencilEngine, blueprints             │
//! │  geoweave_core         geohash grid, RNG, config, MemoCache  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Entry Points
//!
//! - [`WorldCore::is_traversable`]
//! - [`WorldCore::find_path`]
//! - [`WorldCore::generate_dungeon_graph`]
//! - [`WorldCore::place_at`]
//! - [`WorldCore::biome_at`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use geoweave::{LocationType, WorldConfig, WorldCore};
//!
//! let core = WorldCore::isolated(WorldConfig::with_seed("alpha"))?;
//! let dungeon = core.generate_dungeon_graph("u4pru", LocationType::Dungeon).await?;
//! assert!(dungeon.is_connected());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod world;

// Re-export the layers
pub use geoweave_core as core;
pub use geoweave_navigation as navigation;
pub use geoweave_procedural as procedural;

pub use error::{WorldError, WorldResult};
pub use geoweave_core::{Direction, LocationType, WorldConfig};
pub use geoweave_navigation::PathOptions;
pub use world::{IsolatedWorld, WorldCore, DEFAULT_BLUEPRINTS};
