//! # World Core
//!
//! One world: its configuration, its generators, and the collaborators they
//! consult. Every entry point is a pure function of its inputs and the
//! world, memoised where generation is expensive.

use std::sync::Arc;

use geoweave_core::{Direction, LocationType, WorldConfig};
use geoweave_navigation::{
    find_geohash_path, ColliderQuery, Collaborators, EmptyWorld, NoColliders, PathOptions,
    TraversabilityResolver, WorldLookup,
};
use geoweave_procedural::{
    BiomeField, BiomeSample, BlueprintSet, DungeonGenerator, DungeonGraph, FlatTopology, Stencil,
    StencilEngine, Topology,
};

use crate::error::WorldResult;

/// Blueprints shipped with the engine.
pub const DEFAULT_BLUEPRINTS: &str = include_str!("../assets/blueprints.toml");

/// A world with collaborators that never block and flat, dry land.
pub type IsolatedWorld = WorldCore<NoColliders, EmptyWorld, FlatTopology>;

/// The generators of one world plus its collaborators.
pub struct WorldCore<C, W, T> {
    config: Arc<WorldConfig>,
    biomes: BiomeField,
    dungeons: Arc<DungeonGenerator>,
    stencils: StencilEngine,
    resolver: TraversabilityResolver,
    colliders: C,
    world: W,
    topology: T,
}

impl IsolatedWorld {
    /// Builds a world with the built-in blueprints and no external state.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` or the built-in blueprints are invalid.
    pub fn isolated(config: WorldConfig) -> WorldResult<Self> {
        let blueprints = BlueprintSet::from_toml_str(DEFAULT_BLUEPRINTS)?;
        Self::new(config, blueprints, NoColliders, EmptyWorld, FlatTopology::land())
    }
}

impl<C, W, T> WorldCore<C, W, T>
where
    C: ColliderQuery,
    W: WorldLookup,
    T: Topology,
{
    /// Wires a world together.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn new(
        config: WorldConfig,
        blueprints: BlueprintSet,
        colliders: C,
        world: W,
        topology: T,
    ) -> WorldResult<Self> {
        config.validate()?;
        let config = Arc::new(config);
        let dungeons = Arc::new(DungeonGenerator::new(Arc::clone(&config)));
        let stencils = StencilEngine::new(
            Arc::clone(&config),
            Arc::new(blueprints),
            Arc::clone(&dungeons),
        );
        let resolver = TraversabilityResolver::new(Arc::clone(&config), Arc::clone(&dungeons));

        tracing::debug!(
            seed = %config.seed,
            blueprints = stencils.blueprints().len(),
            "world core ready"
        );

        Ok(Self {
            biomes: BiomeField::new(Arc::clone(&config)),
            config,
            dungeons,
            stencils,
            resolver,
            colliders,
            world,
            topology,
        })
    }

    /// The world configuration.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    fn collaborators(&self) -> Collaborators<'_, C, W, T> {
        Collaborators::new(&self.colliders, &self.world, &self.topology)
    }

    /// Returns whether an entity may enter `geohash`.
    ///
    /// # Errors
    ///
    /// Propagates malformed input and collaborator failures.
    pub async fn is_traversable(
        &self,
        geohash: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
    ) -> WorldResult<bool> {
        Ok(self
            .resolver
            .is_traversable(geohash, location_type, location_instance, self.collaborators())
            .await?)
    }

    /// Returns the movement speed multiplier of `geohash`.
    ///
    /// # Errors
    ///
    /// As [`WorldCore::is_traversable`].
    pub async fn traversal_speed(
        &self,
        geohash: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
    ) -> WorldResult<f64> {
        Ok(self
            .resolver
            .traversal_speed(geohash, location_type, location_instance, self.collaborators())
            .await?)
    }

    /// Finds the directions from `start` to `goal`; empty if unreachable.
    ///
    /// # Errors
    ///
    /// As [`WorldCore::is_traversable`], plus an elapsed search deadline.
    pub async fn find_path(
        &self,
        start: &str,
        goal: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
        options: &PathOptions,
    ) -> WorldResult<Vec<Direction>> {
        Ok(find_geohash_path(
            start,
            goal,
            location_type,
            location_instance,
            &self.resolver,
            self.collaborators(),
            options,
        )
        .await?)
    }

    /// Returns the dungeon containing `geohash`.
    ///
    /// # Errors
    ///
    /// Propagates malformed input and configuration errors.
    pub async fn generate_dungeon_graph(
        &self,
        geohash: &str,
        location_type: LocationType,
    ) -> WorldResult<Arc<DungeonGraph>> {
        Ok(self.dungeons.generate(geohash, location_type).await?)
    }

    /// Returns the stencil of the scope containing `location`.
    ///
    /// # Errors
    ///
    /// Propagates malformed input, topology failures and dungeon errors.
    pub async fn place_at(
        &self,
        location: &str,
        location_type: LocationType,
    ) -> WorldResult<Arc<Stencil>> {
        Ok(self
            .stencils
            .place_at(location, location_type, &self.topology)
            .await?)
    }

    /// Returns the biome of `geohash` and how strongly it was drawn.
    ///
    /// # Errors
    ///
    /// Propagates malformed input, topology failures and dungeon errors.
    pub async fn biome_at(
        &self,
        geohash: &str,
        location_type: LocationType,
    ) -> WorldResult<BiomeSample> {
        Ok(self
            .biomes
            .biome_at(geohash, location_type, &self.topology, &self.dungeons)
            .await?)
    }
}
