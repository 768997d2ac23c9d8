//! # Blueprints
//!
//! Templates describing what to place and how densely. Blueprint sets are
//! defined in TOML, in priority order:
//!
//! ```toml
//! [[blueprint]]
//! name = "bandit-camp"
//! precision = 5
//! frequency = { type = "plot", precision = 3, min = 0, max = 2 }
//!
//! [[blueprint.clusters]]
//! name = "tents"
//! count = { min = 2, max = 4 }
//! pattern = "center"
//! props = [{ id = "tent", count = { min = 1, max = 2 } }]
//! npcs = [{ id = "bandit", pattern = "peripheral", unique = false }]
//! ```
//!
//! Earlier blueprints claim cells first; reordering the set changes the
//! world.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use geoweave_core::geohash::{self, MAX_PRECISION};
use geoweave_core::{ConfigError, LocationType, SeedStream};
use serde::{Deserialize, Serialize};

use crate::error::{ProceduralError, ProceduralResult};

/// Inclusive count range; draws are `floor(rv * (max - min + 1)) + min`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    /// Fewest.
    pub min: u32,
    /// Most.
    pub max: u32,
}

impl CountRange {
    /// A range with a single value.
    #[must_use]
    pub const fn exactly(count: u32) -> Self {
        Self {
            min: count,
            max: count,
        }
    }

    /// Draws a count.
    pub fn draw(&self, stream: &mut SeedStream) -> usize {
        stream.range_inclusive(self.min, self.max) as usize
    }

    const fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for CountRange {
    fn default() -> Self {
        Self::exactly(1)
    }
}

/// Where inside a cell candidates may sit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pattern {
    /// Any child.
    #[default]
    Random,
    /// Children in the inner block of the parent.
    Center,
    /// Children on the edge ring of the parent.
    Peripheral,
}

impl Pattern {
    /// Returns `true` if `cell` is admitted, judged by its last symbol.
    #[must_use]
    pub fn admits(self, cell: &str) -> bool {
        let Some(symbol) = cell.chars().last() else {
            return false;
        };
        let prefix_len = cell.len() - 1;
        match self {
            Self::Random => true,
            Self::Center => geohash::is_center_symbol(prefix_len, symbol),
            Self::Peripheral => geohash::is_peripheral_symbol(prefix_len, symbol),
        }
    }
}

/// How many instances a blueprint places, and per what.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    /// `min..=max` instances per overworld plot of `precision`.
    Plot {
        /// Plot precision.
        precision: usize,
        /// Fewest instances per plot.
        min: u32,
        /// Most instances per plot.
        max: u32,
    },
    /// `min..=max` instances per dungeon room.
    Room {
        /// Fewest instances per room.
        min: u32,
        /// Most instances per room.
        max: u32,
    },
    /// `min..=max` instances per contiguous corridor cluster.
    Corridor {
        /// Fewest instances per cluster.
        min: u32,
        /// Most instances per cluster.
        max: u32,
    },
}

impl Frequency {
    /// The instance count range.
    #[must_use]
    pub const fn count(&self) -> CountRange {
        match *self {
            Self::Plot { min, max, .. } | Self::Room { min, max } | Self::Corridor { min, max } => {
                CountRange { min, max }
            }
        }
    }

    /// Where blueprints with this frequency are placed.
    #[must_use]
    pub const fn location_type(&self) -> LocationType {
        match self {
            Self::Plot { .. } => LocationType::Geohash,
            Self::Room { .. } | Self::Corridor { .. } => LocationType::Dungeon,
        }
    }
}

/// One prop, beast or NPC entry of a cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnSpec {
    /// What to spawn.
    pub id: String,
    /// How many per cluster cell.
    #[serde(default)]
    pub count: CountRange,
    /// Where inside the cluster cell.
    #[serde(default)]
    pub pattern: Pattern,
    /// Free-form values copied into every spawn.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    /// Marks world-unique spawns.
    #[serde(default)]
    pub unique: bool,
}

/// A named group of spawns around one cluster cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    /// Cluster name.
    pub name: String,
    /// How many cluster cells per instance.
    #[serde(default)]
    pub count: CountRange,
    /// Which children of the instance may hold the cluster.
    #[serde(default)]
    pub pattern: Pattern,
    /// Props per cluster cell.
    #[serde(default)]
    pub props: Vec<SpawnSpec>,
    /// Beasts per cluster cell.
    #[serde(default)]
    pub beasts: Vec<SpawnSpec>,
    /// NPCs per cluster cell.
    #[serde(default)]
    pub npcs: Vec<SpawnSpec>,
}

impl Cluster {
    fn specs(&self) -> impl Iterator<Item = &SpawnSpec> {
        self.props.iter().chain(&self.beasts).chain(&self.npcs)
    }
}

/// A placement template.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    /// Unique name; part of every instance seed.
    pub name: String,
    /// Precision of one instance.
    pub precision: usize,
    /// Instance density.
    pub frequency: Frequency,
    /// Cluster definitions.
    #[serde(default)]
    pub clusters: Vec<Cluster>,
}

impl Blueprint {
    /// Checks structural rules.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidBlueprint`] naming the first
    /// violation.
    pub fn validate(&self) -> ProceduralResult<()> {
        let fail = |reason: String| ProceduralError::InvalidBlueprint {
            name: self.name.clone(),
            reason,
        };

        if self.name.is_empty() {
            return Err(fail("name must not be empty".to_string()));
        }
        if self.precision == 0 || self.precision > MAX_PRECISION {
            return Err(fail(format!("precision {} out of range", self.precision)));
        }
        if !self.frequency.count().is_valid() {
            return Err(fail("frequency min exceeds max".to_string()));
        }
        if let Frequency::Plot { precision, .. } = self.frequency {
            if precision == 0 || precision >= self.precision {
                return Err(fail(format!(
                    "plot precision {precision} must be coarser than instance precision {}",
                    self.precision
                )));
            }
        }
        for cluster in &self.clusters {
            if !cluster.count.is_valid() {
                return Err(fail(format!("cluster {:?} count min exceeds max", cluster.name)));
            }
            for spec in cluster.specs() {
                if spec.id.is_empty() {
                    return Err(fail(format!("cluster {:?} has an unnamed spawn", cluster.name)));
                }
                if !spec.count.is_valid() {
                    return Err(fail(format!("spawn {:?} count min exceeds max", spec.id)));
                }
            }
        }
        Ok(())
    }
}

/// Blueprints in priority order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintSet {
    /// The blueprints, highest priority first.
    #[serde(rename = "blueprint", default)]
    pub blueprints: Vec<Blueprint>,
}

impl BlueprintSet {
    /// Creates a validated set.
    ///
    /// # Errors
    ///
    /// See [`BlueprintSet::validate`].
    pub fn new(blueprints: Vec<Blueprint>) -> ProceduralResult<Self> {
        let set = Self { blueprints };
        set.validate()?;
        Ok(set)
    }

    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::Config`] for malformed TOML, otherwise as
    /// [`BlueprintSet::validate`].
    pub fn from_toml_str(source: &str) -> ProceduralResult<Self> {
        let set: Self = toml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        set.validate()?;
        Ok(set)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::Config`] if the file cannot be read,
    /// otherwise as [`BlueprintSet::from_toml_str`].
    pub fn from_toml_file(path: impl AsRef<Path>) -> ProceduralResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&source)
    }

    /// Validates every blueprint and checks names are unique.
    ///
    /// # Errors
    ///
    /// Returns [`ProceduralError::InvalidBlueprint`] naming the first
    /// violation.
    pub fn validate(&self) -> ProceduralResult<()> {
        let mut names = HashSet::new();
        for blueprint in &self.blueprints {
            blueprint.validate()?;
            if !names.insert(blueprint.name.as_str()) {
                return Err(ProceduralError::InvalidBlueprint {
                    name: blueprint.name.clone(),
                    reason: "duplicate name".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Blueprints placed in `location_type`, in priority order.
    pub fn for_location(&self, location_type: LocationType) -> impl Iterator<Item = &Blueprint> {
        self.blueprints
            .iter()
            .filter(move |blueprint| blueprint.frequency.location_type() == location_type)
    }

    /// Number of blueprints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blueprints.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blueprints.is_empty()
    }
}
