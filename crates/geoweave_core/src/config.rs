//! # World Configuration
//!
//! Every tunable of the generators lives in one immutable [`WorldConfig`]
//! value. It is loaded once (TOML or `Default`), wrapped in an `Arc` and
//! handed to each generator explicitly, so several worlds can run side by
//! side in one process without interfering.
//!
//! ## Example
//!
//! ```toml
//! seed = "alpha"
//!
//! [dungeon]
//! min_rooms = 10
//! max_rooms = 14
//!
//! [biomes.continents.u]
//! forest = 0.6
//! plains = 0.4
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};
use crate::geohash::{self, MAX_PRECISION};
use crate::spatial::Tier;

/// Static properties of one biome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeDefinition {
    /// Movement speed multiplier; `0.0` is impassable.
    pub traversal_speed: f64,
    /// Optional asset key used by clients to render the biome.
    #[serde(default)]
    pub asset: Option<String>,
}

impl BiomeDefinition {
    /// Creates a definition without an asset.
    #[must_use]
    pub const fn new(traversal_speed: f64) -> Self {
        Self {
            traversal_speed,
            asset: None,
        }
    }
}

/// Biome catalogue and the per-continent probability tables.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BiomeConfig {
    /// Every biome the world knows, by id.
    pub definitions: BTreeMap<String, BiomeDefinition>,
    /// Probability tables keyed by the first geohash character.
    pub continents: BTreeMap<String, BTreeMap<String, f64>>,
    /// Table for continents without an entry.
    pub default_table: BTreeMap<String, f64>,
    /// Biome returned below sea level.
    pub water_biome: String,
    /// Elevation below which overworld cells are water.
    pub sea_level: f64,
    /// Biome of dungeon room plots.
    pub room_biome: String,
    /// Biome of dungeon corridor cells.
    pub corridor_biome: String,
    /// Biome of everything else inside a dungeon.
    pub wall_biome: String,
}

impl Default for BiomeConfig {
    fn default() -> Self {
        let definitions = [
            ("plains", 1.0),
            ("forest", 0.8),
            ("hills", 0.6),
            ("desert", 0.7),
            ("swamp", 0.5),
            ("tundra", 0.8),
            ("mountains", 0.0),
            ("water", 0.0),
            ("dungeon_floor", 1.0),
            ("dungeon_corridor", 1.0),
            ("dungeon_wall", 0.0),
        ]
        .into_iter()
        .map(|(id, speed)| (id.to_string(), BiomeDefinition::new(speed)))
        .collect();

        let table = |entries: &[(&str, f64)]| -> BTreeMap<String, f64> {
            entries.iter().map(|&(id, p)| (id.to_string(), p)).collect()
        };

        let mut continents = BTreeMap::new();
        continents.insert(
            "u".to_string(),
            table(&[
                ("forest", 0.40),
                ("plains", 0.25),
                ("tundra", 0.15),
                ("hills", 0.10),
                ("mountains", 0.05),
                ("swamp", 0.05),
            ]),
        );
        continents.insert(
            "s".to_string(),
            table(&[
                ("desert", 0.45),
                ("plains", 0.30),
                ("hills", 0.10),
                ("forest", 0.10),
                ("mountains", 0.05),
            ]),
        );
        continents.insert(
            "w".to_string(),
            table(&[
                ("forest", 0.45),
                ("swamp", 0.20),
                ("plains", 0.20),
                ("hills", 0.10),
                ("mountains", 0.05),
            ]),
        );
        continents.insert(
            "9".to_string(),
            table(&[
                ("plains", 0.40),
                ("desert", 0.20),
                ("forest", 0.20),
                ("hills", 0.10),
                ("mountains", 0.10),
            ]),
        );

        Self {
            definitions,
            continents,
            default_table: table(&[
                ("plains", 0.35),
                ("forest", 0.25),
                ("hills", 0.15),
                ("desert", 0.10),
                ("swamp", 0.05),
                ("tundra", 0.05),
                ("mountains", 0.05),
            ]),
            water_biome: "water".to_string(),
            sea_level: 0.0,
            room_biome: "dungeon_floor".to_string(),
            corridor_biome: "dungeon_corridor".to_string(),
            wall_biome: "dungeon_wall".to_string(),
        }
    }
}

/// Tuning of the dungeon graph generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DungeonConfig {
    /// Precision of the cell a dungeon occupies (one dungeon per cell).
    pub precision: usize,
    /// Precision of room plots.
    pub room_precision: usize,
    /// Precision of corridor cells (finer than rooms).
    pub corridor_precision: usize,
    /// Fewest rooms per dungeon.
    pub min_rooms: u32,
    /// Most rooms per dungeon.
    pub max_rooms: u32,
    /// BSP depth every branch reaches before it may stop.
    pub min_depth: u32,
    /// BSP depth no branch exceeds.
    pub max_depth: u32,
    /// Smallest BSP leaf side, in plots (one plot is reserved as margin).
    pub min_leaf: u32,
    /// Chance a branch between `min_depth` and `max_depth` stops splitting.
    pub stop_chance: f64,
    /// Most rooms connected from the current room per iteration.
    pub max_connections: u32,
}

impl Default for DungeonConfig {
    fn default() -> Self {
        Self {
            precision: Tier::Town.precision(),
            room_precision: Tier::House.precision(),
            corridor_precision: Tier::Unit.precision(),
            min_rooms: 12,
            max_rooms: 18,
            min_depth: 5,
            max_depth: 6,
            min_leaf: 3,
            stop_chance: 0.5,
            max_connections: 2,
        }
    }
}

/// Tuning of the blueprint placement engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StencilConfig {
    /// Precision of the scope one overworld stencil covers.
    pub territory_precision: usize,
    /// Plots whose elevation is below this value receive no blueprints.
    pub land_threshold: f64,
}

impl Default for StencilConfig {
    fn default() -> Self {
        Self {
            territory_precision: Tier::Territory.precision(),
            land_threshold: 0.0,
        }
    }
}

/// Tuning of the traversability resolver.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraversalConfig {
    /// Precision at which entities occupy cells.
    pub unit_precision: usize,
    /// Pixel size of one unit cell, used to rescale structure tile maps.
    pub cell_pixels: u32,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            unit_precision: Tier::Unit.precision(),
            cell_pixels: 32,
        }
    }
}

/// The immutable description of one world.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// World seed, prefixed to every generator seed string.
    pub seed: String,
    /// Biome catalogue and tables.
    pub biomes: BiomeConfig,
    /// Dungeon generator tuning.
    pub dungeon: DungeonConfig,
    /// Blueprint placement tuning.
    pub stencil: StencilConfig,
    /// Traversability tuning.
    pub traversal: TraversalConfig,
}

impl WorldConfig {
    /// Creates the default world with a custom seed.
    #[must_use]
    pub fn with_seed(seed: impl Into<String>) -> Self {
        Self {
            seed: seed.into(),
            ..Self::default()
        }
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] when validation fails.
    pub fn from_toml_str(source: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`WorldConfig::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Checks cross-field invariants.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first violation.
    pub fn validate(&self) -> ConfigResult<()> {
        self.validate_biomes()?;
        self.validate_dungeon()?;

        let stencil = &self.stencil;
        if stencil.territory_precision == 0 || stencil.territory_precision > MAX_PRECISION {
            return Err(invalid(format!(
                "stencil.territory_precision {} out of range",
                stencil.territory_precision
            )));
        }
        let traversal = &self.traversal;
        if traversal.unit_precision < stencil.territory_precision
            || traversal.unit_precision > MAX_PRECISION
        {
            return Err(invalid(format!(
                "traversal.unit_precision {} must lie between the territory precision and {MAX_PRECISION}",
                traversal.unit_precision
            )));
        }
        if traversal.cell_pixels == 0 {
            return Err(invalid("traversal.cell_pixels must be positive"));
        }
        Ok(())
    }

    fn validate_biomes(&self) -> ConfigResult<()> {
        let biomes = &self.biomes;
        for (id, definition) in &biomes.definitions {
            if !definition.traversal_speed.is_finite() || definition.traversal_speed < 0.0 {
                return Err(invalid(format!("biome {id:?} has a negative or non-finite speed")));
            }
        }
        for id in [
            &biomes.water_biome,
            &biomes.room_biome,
            &biomes.corridor_biome,
            &biomes.wall_biome,
        ] {
            if !biomes.definitions.contains_key(id) {
                return Err(invalid(format!("biome {id:?} is not defined")));
            }
        }

        let tables = biomes
            .continents
            .iter()
            .map(|(key, table)| (key.as_str(), table))
            .chain(std::iter::once(("default", &biomes.default_table)));
        for (key, table) in tables {
            if key != "default" && (key.len() != 1 || geohash::validate(key).is_err()) {
                return Err(invalid(format!("continent key {key:?} is not a geohash character")));
            }
            let mut total = 0.0;
            for (id, &p) in table {
                if !biomes.definitions.contains_key(id) {
                    return Err(invalid(format!("table {key:?} references unknown biome {id:?}")));
                }
                if !p.is_finite() || p < 0.0 {
                    return Err(invalid(format!("table {key:?} has a bad probability for {id:?}")));
                }
                total += p;
            }
            if total <= 0.0 {
                return Err(invalid(format!("table {key:?} has no probability mass")));
            }
        }
        Ok(())
    }

    fn validate_dungeon(&self) -> ConfigResult<()> {
        let d = &self.dungeon;
        if d.precision == 0
            || d.precision >= d.room_precision
            || d.room_precision >= d.corridor_precision
            || d.corridor_precision > MAX_PRECISION
        {
            return Err(invalid(format!(
                "dungeon precisions must satisfy 0 < {} < {} < {} <= {MAX_PRECISION}",
                d.precision, d.room_precision, d.corridor_precision
            )));
        }
        if d.min_rooms == 0 || d.min_rooms > d.max_rooms {
            return Err(invalid(format!(
                "dungeon room range {}..={} is empty",
                d.min_rooms, d.max_rooms
            )));
        }
        if d.min_depth > d.max_depth {
            return Err(invalid(format!(
                "dungeon depth range {}..={} is empty",
                d.min_depth, d.max_depth
            )));
        }
        if d.min_leaf < 3 {
            return Err(invalid("dungeon.min_leaf must be at least 3"));
        }
        if d.max_connections == 0 {
            return Err(invalid("dungeon.max_connections must be at least 1"));
        }
        if !(0.0..=1.0).contains(&d.stop_chance) {
            return Err(invalid("dungeon.stop_chance must lie in [0, 1]"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(message.into())
}
