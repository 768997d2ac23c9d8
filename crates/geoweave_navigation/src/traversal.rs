//! # Traversability Resolver
//!
//! Decides whether, and how fast, an entity may enter a cell.
//!
//! Precedence, strongest first:
//!
//! 1. Dynamic colliders: anything occupying the cell blocks it outright.
//! 2. Structure tile maps: a `traversableSpeed` under the cell overrides
//!    the ground.
//! 3. Biome speed.

use std::sync::Arc;

use geoweave_core::{geohash, LocationType, MemoCache, WorldConfig};
use geoweave_procedural::{BiomeField, DungeonGenerator, Topology};

use crate::collaborators::{ColliderQuery, Collaborators, WorldLookup, WorldPlacement};
use crate::error::NavigationResult;
use crate::tilemap::TileMap;

/// Resolves walkability for one world.
pub struct TraversabilityResolver {
    config: Arc<WorldConfig>,
    biomes: BiomeField,
    dungeons: Arc<DungeonGenerator>,
    tile_maps: MemoCache<String, Arc<TileMap>>,
}

impl TraversabilityResolver {
    /// Creates a resolver sharing a dungeon generator with the rest of the
    /// world.
    #[must_use]
    pub fn new(config: Arc<WorldConfig>, dungeons: Arc<DungeonGenerator>) -> Self {
        Self {
            biomes: BiomeField::new(Arc::clone(&config)),
            config,
            dungeons,
            tile_maps: MemoCache::new("tile_map"),
        }
    }

    /// Returns the speed multiplier of a cell; `0.0` means blocked.
    ///
    /// # Errors
    ///
    /// Propagates malformed geohashes, collaborator failures, dungeon
    /// generation errors and undecodable structure assets.
    pub async fn traversal_speed<C, W, T>(
        &self,
        geohash: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
        with: Collaborators<'_, C, W, T>,
    ) -> NavigationResult<f64>
    where
        C: ColliderQuery,
        W: WorldLookup,
        T: Topology,
    {
        geohash::validate(geohash)?;

        if with
            .colliders
            .has_colliders(geohash, location_type, location_instance)
            .await?
        {
            tracing::trace!(geohash, "blocked by collider");
            return Ok(0.0);
        }

        let biome = self
            .biomes
            .biome_at(geohash, location_type, with.topology, &self.dungeons)
            .await?;

        let world_speed = self.world_speed(geohash, location_type, with.world).await?;
        if let Some(speed) = world_speed {
            tracing::trace!(geohash, speed, biome = %biome.biome.id, "structure overrides biome");
        }
        Ok(world_speed.unwrap_or(biome.biome.traversal_speed))
    }

    /// Returns whether a cell can be entered.
    ///
    /// # Errors
    ///
    /// As [`TraversabilityResolver::traversal_speed`].
    pub async fn is_traversable<C, W, T>(
        &self,
        geohash: &str,
        location_type: LocationType,
        location_instance: Option<&str>,
        with: Collaborators<'_, C, W, T>,
    ) -> NavigationResult<bool>
    where
        C: ColliderQuery,
        W: WorldLookup,
        T: Topology,
    {
        let speed = self
            .traversal_speed(geohash, location_type, location_instance, with)
            .await?;
        Ok(speed > 0.0)
    }

    async fn world_speed<W: WorldLookup>(
        &self,
        geohash: &str,
        location_type: LocationType,
        world: &W,
    ) -> NavigationResult<Option<f64>> {
        let Some(placement) = world.world_at(geohash, location_type).await? else {
            return Ok(None);
        };
        let Some((col, row)) = offset_from_origin(geohash, &placement)? else {
            tracing::trace!(geohash, origin = %placement.origin, "cell outside structure origin");
            return Ok(None);
        };

        let url = placement.url.clone();
        let map = self
            .tile_maps
            .get_or_try_init(placement.url, || async {
                let body = world.fetch_asset(&url).await?;
                let map = TileMap::from_json(&url, &body)?;
                tracing::debug!(url = %url, layers = map.layers.len(), "loaded tile map");
                NavigationResult::Ok(Arc::new(map))
            })
            .await?;

        Ok(map.speed_at_cell(col, row, self.config.traversal.cell_pixels))
    }

    /// Number of distinct tile maps being fetched right now.
    #[must_use]
    pub fn pending_assets(&self) -> usize {
        self.tile_maps.inflight_len()
    }
}

/// Cell offset east and south of a structure's origin, at the origin's
/// precision. `None` if the cell lies west or north of it, or is addressed
/// at another precision.
fn offset_from_origin(
    geohash: &str,
    placement: &WorldPlacement,
) -> NavigationResult<Option<(u32, u32)>> {
    if geohash.len() != placement.origin.len() {
        return Ok(None);
    }
    let (col, row) = geohash::col_row(geohash)?;
    let (origin_col, origin_row) = geohash::col_row(&placement.origin)?;
    Ok(col
        .checked_sub(origin_col)
        .zip(row.checked_sub(origin_row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{EmptyWorld, NoColliders};
    use crate::error::NavigationError;
    use geoweave_core::CollaboratorError;
    use geoweave_procedural::FlatTopology;
    use std::collections::{HashMap, HashSet};
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ORIGIN: &str = "u4pruyd0";

    const BRIDGE: &str = r#"{
        "tilewidth": 32, "tileheight": 32,
        "layers": [{"name": "deck", "width": 2, "height": 1, "data": [1, 2]}],
        "tilesets": [{"firstgid": 1, "tiles": [
            {"id": 0, "properties": [{"name": "traversableSpeed", "value": 1.0}]},
            {"id": 1, "properties": [{"name": "traversableSpeed", "value": 0}]}
        ]}]
    }"#;

    struct Occupied(HashSet<String>);

    impl ColliderQuery for Occupied {
        fn has_colliders(
            &self,
            geohash: &str,
            _location_type: LocationType,
            _location_instance: Option<&str>,
        ) -> impl Future<Output = Result<bool, CollaboratorError>> + Send {
            std::future::ready(Ok(self.0.contains(geohash)))
        }
    }

    struct OneStructure {
        body: &'static str,
        fetches: AtomicUsize,
    }

    impl OneStructure {
        fn new(body: &'static str) -> Self {
            Self {
                body,
                fetches: AtomicUsize::new(0),
            }
        }
    }

    impl WorldLookup for OneStructure {
        fn world_at(
            &self,
            geohash: &str,
            _location_type: LocationType,
        ) -> impl Future<Output = Result<Option<WorldPlacement>, CollaboratorError>> + Send {
            let placement = geohash::truncate(geohash, 6)
                .ok()
                .filter(|prefix| ORIGIN.starts_with(prefix))
                .map(|_| WorldPlacement {
                    url: "bridge.json".to_string(),
                    origin: ORIGIN.to_string(),
                });
            std::future::ready(Ok(placement))
        }

        fn fetch_asset(&self, _url: &str) -> impl Future<Output = Result<String, CollaboratorError>> + Send {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok(self.body.to_string()))
        }
    }

    fn resolver() -> TraversabilityResolver {
        let config = Arc::new(WorldConfig::default());
        TraversabilityResolver::new(Arc::clone(&config), Arc::new(DungeonGenerator::new(config)))
    }

    fn east_of_origin(steps: u32) -> String {
        let (col, row) = geohash::col_row(ORIGIN).unwrap();
        geohash::encode(col + steps, row, ORIGIN.len()).unwrap()
    }

    #[tokio::test]
    async fn test_colliders_always_block() {
        let resolver = resolver();
        let colliders = Occupied(HashSet::from([ORIGIN.to_string()]));
        let world = OneStructure::new(BRIDGE);
        let topology = FlatTopology::land();
        let with = Collaborators::new(&colliders, &world, &topology);

        assert!(!resolver
            .is_traversable(ORIGIN, LocationType::Geohash, None, with)
            .await
            .unwrap());
        assert_eq!(world.fetches.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_structure_overrides_biome() {
        let resolver = resolver();
        let topology = FlatTopology::ocean();
        let world = OneStructure::new(BRIDGE);
        let with = Collaborators::new(&NoColliders, &world, &topology);

        // Open deck over water.
        assert!(resolver
            .is_traversable(ORIGIN, LocationType::Geohash, None, with)
            .await
            .unwrap());
        // Railing.
        let railing = east_of_origin(1);
        assert!(!resolver
            .is_traversable(&railing, LocationType::Geohash, None, with)
            .await
            .unwrap());
        // Past the map: back to water.
        let beyond = east_of_origin(2);
        assert_eq!(
            resolver
                .traversal_speed(&beyond, LocationType::Geohash, None, with)
                .await
                .unwrap(),
            0.0
        );
    }

    #[tokio::test]
    async fn test_biome_speed_without_structures() {
        let resolver = resolver();
        let land = FlatTopology::land();
        let with = Collaborators::new(&NoColliders, &EmptyWorld, &land);
        let expected = BiomeField::new(Arc::new(WorldConfig::default()))
            .classify(ORIGIN)
            .unwrap()
            .biome
            .traversal_speed;

        let speed = resolver
            .traversal_speed(ORIGIN, LocationType::Geohash, None, with)
            .await
            .unwrap();
        assert!((speed - expected).abs() < f64::EPSILON);

        let ocean = FlatTopology::ocean();
        let with = Collaborators::new(&NoColliders, &EmptyWorld, &ocean);
        assert!(!resolver
            .is_traversable(ORIGIN, LocationType::Geohash, None, with)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_tile_maps_are_fetched_once() {
        let resolver = resolver();
        let topology = FlatTopology::land();
        let world = OneStructure::new(BRIDGE);
        let with = Collaborators::new(&NoColliders, &world, &topology);

        for _ in 0..3 {
            for steps in 0..2 {
                let cell = east_of_origin(steps);
                resolver
                    .is_traversable(&cell, LocationType::Geohash, None, with)
                    .await
                    .unwrap();
            }
        }
        assert_eq!(world.fetches.load(Ordering::SeqCst), 1);
        assert_eq!(resolver.pending_assets(), 0);
    }

    #[tokio::test]
    async fn test_bad_asset_is_an_error() {
        let resolver = resolver();
        let topology = FlatTopology::land();
        let world = OneStructure::new("{\"layers\": 7}");
        let with = Collaborators::new(&NoColliders, &world, &topology);

        let err = resolver
            .is_traversable(ORIGIN, LocationType::Geohash, None, with)
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::InvalidTileMap { .. }));
    }

    #[tokio::test]
    async fn test_dungeon_walls_block() {
        let resolver = resolver();
        let topology = FlatTopology::land();
        let with = Collaborators::new(&NoColliders, &EmptyWorld, &topology);
        let graph = resolver
            .dungeons
            .generate(ORIGIN, LocationType::Dungeon)
            .await
            .unwrap();

        let mut verdicts = HashMap::new();
        for cell in geohash::expand_to_precision(&graph.dungeon, 8).unwrap().into_iter().take(256) {
            let walkable = resolver
                .is_traversable(&cell, LocationType::Dungeon, Some("run-1"), with)
                .await
                .unwrap();
            verdicts.insert(cell, walkable);
        }
        for (cell, walkable) in verdicts {
            assert_eq!(walkable, graph.is_walkable(&cell), "{cell}");
        }
    }
}
