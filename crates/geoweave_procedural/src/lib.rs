//! # GEOWEAVE Procedural Generation
//!
//! Deterministic world content derived from geohash cells.
//!
//! ## Design Principles
//!
//! 1. **Deterministic**: Same seed and cell always produce the same content
//! 2. **Hierarchical**: Each generator owns one precision tier
//! 3. **Cached, never stored**: Results are memoised and can always be rebuilt
//!
//! ## Core Components
//!
//! - `BiomeField`: Biome and strength of any cell
//! - `BspTree`: Arena-backed binary space partition
//! - `DungeonGenerator`: Connected room graphs, one per town
//! - `BlueprintSet`: Placement templates loaded from TOML
//! - `StencilEngine`: Where blueprints spawn props, beasts and NPCs
//!
//! ## Example
//!
//! ```rust,ignore
//! use geoweave_procedural::{DungeonGenerator, LocationType};
//!
//! let dungeons = DungeonGenerator::new(Arc::new(WorldConfig::with_seed("alpha")));
//! let graph = dungeons.generate("u4pruydq", LocationType::Dungeon).await?;
//! assert!(graph.is_connected());
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod biome;
pub mod blueprint;
pub mod bsp;
pub mod dungeon;
pub mod error;
pub mod stencil;
pub mod topology;

pub use biome::{Biome, BiomeField, BiomeSample};
pub use blueprint::{Blueprint, BlueprintSet, Cluster, CountRange, Frequency, Pattern, SpawnSpec};
pub use bsp::{BspNode, BspParams, BspTree, Rect};
pub use dungeon::{build_dungeon_graph, DungeonGenerator, DungeonGraph, DungeonKey, Room};
pub use error::{ProceduralError, ProceduralResult};
pub use geoweave_core::LocationType;
pub use stencil::{Spawn, Stencil, StencilEngine, StencilEntry, StencilKey};
pub use topology::{FlatTopology, Topology};
