//! # Biome Field
//!
//! Assigns every overworld cell a biome from a per-continent probability
//! table.
//!
//! - The table is chosen by the first geohash character (the continent),
//!   falling back to the default table.
//! - `rv = random(hash(seed + geohash))` picks a biome by walking the table
//!   in id order and accumulating normalised probability.
//! - Elevation below sea level overrides the table with water.
//! - Inside dungeons the dungeon graph decides: room floor, corridor or wall.

use std::sync::Arc;

use geoweave_core::{geohash, rng, LocationType, WorldConfig};
use serde::{Deserialize, Serialize};

use crate::dungeon::DungeonGenerator;
use crate::error::ProceduralResult;
use crate::topology::Topology;

/// A biome and its static properties.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    /// Biome id.
    pub id: String,
    /// Movement speed multiplier; `0.0` is impassable.
    pub traversal_speed: f64,
    /// Optional render asset.
    pub asset: Option<String>,
}

impl Biome {
    /// Returns whether this biome can be walked on.
    #[must_use]
    pub fn is_passable(&self) -> bool {
        self.traversal_speed > 0.0
    }
}

/// Result of a biome lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BiomeSample {
    /// The winning biome.
    pub biome: Biome,
    /// Position of the draw inside the winning interval, in `[0, 1)`; `1.0`
    /// for biomes forced by elevation or dungeon layout.
    pub strength: f64,
}

/// Biome classifier for one world.
#[derive(Clone, Debug)]
pub struct BiomeField {
    config: Arc<WorldConfig>,
}

impl BiomeField {
    /// Creates a field for a world.
    #[must_use]
    pub fn new(config: Arc<WorldConfig>) -> Self {
        Self { config }
    }

    /// Resolves a biome id against the catalogue. Unknown ids are
    /// impassable.
    #[must_use]
    pub fn biome(&self, id: &str) -> Biome {
        let definition = self.config.biomes.definitions.get(id);
        Biome {
            id: id.to_string(),
            traversal_speed: definition.map_or(0.0, |d| d.traversal_speed),
            asset: definition.and_then(|d| d.asset.clone()),
        }
    }

    /// Draws the table biome of an overworld cell, ignoring elevation.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed geohashes.
    pub fn classify(&self, geohash: &str) -> ProceduralResult<BiomeSample> {
        geohash::validate(geohash)?;
        let biomes = &self.config.biomes;
        let table = biomes
            .continents
            .get(&geohash[..1])
            .unwrap_or(&biomes.default_table);

        let rv = rng::random(rng::hash(&format!("{}{geohash}", self.config.seed)));
        let total: f64 = table.values().filter(|p| **p > 0.0).sum();

        let mut lower = 0.0;
        let mut last = None;
        for (id, &p) in table.iter().filter(|(_, p)| **p > 0.0) {
            let width = p / total;
            let upper = lower + width;
            if rv < upper {
                return Ok(BiomeSample {
                    biome: self.biome(id),
                    strength: ((rv - lower) / width).clamp(0.0, 1.0 - f64::EPSILON),
                });
            }
            lower = upper;
            last = Some((id, width, lower - width));
        }

        // Rounding left rv just past the final boundary.
        let Some((id, width, start)) = last else {
            return Ok(BiomeSample {
                biome: self.biome(&biomes.water_biome),
                strength: 1.0,
            });
        };
        Ok(BiomeSample {
            biome: self.biome(id),
            strength: ((rv - start) / width).clamp(0.0, 1.0 - f64::EPSILON),
        })
    }

    /// Resolves the biome of any cell.
    ///
    /// Overworld cells consult the elevation first; dungeon cells are room
    /// floor, corridor or wall according to the enclosing dungeon.
    ///
    /// # Errors
    ///
    /// Propagates malformed input, collaborator failures and dungeon
    /// generation errors.
    pub async fn biome_at<T: Topology>(
        &self,
        geohash: &str,
        location_type: LocationType,
        topology: &T,
        dungeons: &DungeonGenerator,
    ) -> ProceduralResult<BiomeSample> {
        geohash::validate(geohash)?;
        let biomes = &self.config.biomes;
        let forced = |id: &str| BiomeSample {
            biome: self.biome(id),
            strength: 1.0,
        };

        match location_type {
            LocationType::Geohash => {
                let elevation = topology.elevation_at(geohash, location_type).await?;
                if elevation < biomes.sea_level {
                    tracing::trace!(geohash, elevation, "below sea level");
                    return Ok(forced(&biomes.water_biome));
                }
                self.classify(geohash)
            }
            LocationType::Dungeon => {
                let graph = dungeons.generate(geohash, location_type).await?;
                if graph.room_containing(geohash).is_some() {
                    Ok(forced(&biomes.room_biome))
                } else if graph.is_corridor(geohash) {
                    Ok(forced(&biomes.corridor_biome))
                } else {
                    Ok(forced(&biomes.wall_biome))
                }
            }
        }
    }
}
