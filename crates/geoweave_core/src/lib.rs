//! # GEOWEAVE Core
//!
//! Shared plumbing for the procedural world engine:
//! - Geohash grid arithmetic (no lat/lon, pure integer grid math)
//! - The deterministic seeded RNG every generator draws from
//! - [`WorldConfig`], loaded from TOML and passed explicitly
//! - A single-flight memoizing cache in front of pluggable stores
//!
//! ## Architecture Rules
//!
//! 1. **Determinism** - same seed, same inputs, same world, everywhere
//! 2. **No global state** - configuration and caches are owned values
//! 3. **Integer grid math** - geohash cells are `(col, row)` pairs at a precision
//!
//! ## Example
//!
//! ```rust
//! use geoweave_core::{geohash, Direction};
//!
//! let east = geohash::neighbor("u4", Direction::East, 1).unwrap();
//! assert_eq!(east, "u6");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod config;
pub mod direction;
pub mod error;
pub mod geohash;
pub mod rng;
pub mod spatial;

pub use cache::{CacheFuture, CacheStore, InMemoryStore, MemoCache, NullStore};
pub use config::{
    BiomeConfig, BiomeDefinition, DungeonConfig, StencilConfig, TraversalConfig, WorldConfig,
};
pub use direction::Direction;
pub use error::{
    CacheError, CollaboratorError, ConfigError, ConfigResult, GeoError, GeoResult,
};
pub use geohash::GridCell;
pub use rng::SeedStream;
pub use spatial::{LocationType, Tier};
