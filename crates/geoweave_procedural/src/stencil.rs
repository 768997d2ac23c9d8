//! # Stencil Engine
//!
//! Runs a [`BlueprintSet`] over one scope cell and records what spawns where.
//!
//! ## Scopes
//!
//! - **Territory** (`geohash`): `Plot` blueprints, one pass over every plot
//!   of the territory that the topology reports as land.
//! - **Dungeon** (`dungeon`): `Room` blueprints place instances inside room
//!   plots, `Corridor` blueprints inside each 8-connected corridor cluster.
//!
//! ## Non-overlap
//!
//! Instance cells never overlap (neither contains the other) within one
//! pass, clusters of one instance never share a cell, and every stencil key
//! is written once. Conflicts are silently excluded from candidate sets.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use geoweave_core::{
    geohash, CacheStore, LocationType, MemoCache, SeedStream, WorldConfig,
};
use serde::{Deserialize, Serialize};

use crate::blueprint::{Blueprint, BlueprintSet, Frequency, SpawnSpec};
use crate::dungeon::DungeonGenerator;
use crate::error::ProceduralResult;
use crate::topology::Topology;

/// One placed thing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spawn {
    /// What to spawn.
    pub id: String,
    /// Blueprint that placed it.
    pub blueprint: String,
    /// Cluster that placed it.
    pub cluster: String,
    /// Values from the spawn spec.
    pub variables: BTreeMap<String, String>,
    /// World-unique spawn.
    pub unique: bool,
}

/// What occupies a stencil cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StencilEntry {
    /// Static object.
    Prop(Spawn),
    /// Hostile creature.
    Beast(Spawn),
    /// Non-player character.
    Npc(Spawn),
}

impl StencilEntry {
    /// The spawn, whatever its kind.
    #[must_use]
    pub const fn spawn(&self) -> &Spawn {
        match self {
            Self::Prop(spawn) | Self::Beast(spawn) | Self::Npc(spawn) => spawn,
        }
    }
}

/// Placement output for one scope cell.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stencil {
    /// The scope cell (territory or dungeon).
    pub location: String,
    /// Location type of the scope.
    pub location_type: LocationType,
    /// Unit cell -> spawn.
    pub entries: BTreeMap<String, StencilEntry>,
}

impl Stencil {
    fn new(location: &str, location_type: LocationType) -> Self {
        Self {
            location: location.to_string(),
            location_type,
            entries: BTreeMap::new(),
        }
    }

    /// Looks up the spawn at a unit cell.
    #[must_use]
    pub fn get(&self, cell: &str) -> Option<&StencilEntry> {
        self.entries.get(cell)
    }

    /// Number of spawns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing was placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Key of a cached stencil: the scope cell and its location type.
pub type StencilKey = (String, LocationType);

/// Memoising blueprint placement for one world and blueprint set.
pub struct StencilEngine {
    config: Arc<WorldConfig>,
    blueprints: Arc<BlueprintSet>,
    dungeons: Arc<DungeonGenerator>,
    cache: MemoCache<StencilKey, Arc<Stencil>>,
}

impl StencilEngine {
    /// Creates an engine with a process-local cache.
    #[must_use]
    pub fn new(
        config: Arc<WorldConfig>,
        blueprints: Arc<BlueprintSet>,
        dungeons: Arc<DungeonGenerator>,
    ) -> Self {
        Self {
            config,
            blueprints,
            dungeons,
            cache: MemoCache::new("stencil"),
        }
    }

    /// Creates an engine in front of an external cache store.
    #[must_use]
    pub fn with_store(
        config: Arc<WorldConfig>,
        blueprints: Arc<BlueprintSet>,
        dungeons: Arc<DungeonGenerator>,
        store: Arc<dyn CacheStore<StencilKey, Arc<Stencil>>>,
    ) -> Self {
        Self {
            config,
            blueprints,
            dungeons,
            cache: MemoCache::with_store("stencil", store),
        }
    }

    /// The blueprints, in priority order.
    #[must_use]
    pub fn blueprints(&self) -> &BlueprintSet {
        &self.blueprints
    }

    /// Returns the stencil of the scope containing `location`.
    ///
    /// # Errors
    ///
    /// Propagates malformed input, topology failures and dungeon generation
    /// errors.
    pub async fn place_at<T: Topology>(
        &self,
        location: &str,
        location_type: LocationType,
        topology: &T,
    ) -> ProceduralResult<Arc<Stencil>> {
        let scope_precision = match location_type {
            LocationType::Geohash => self.config.stencil.territory_precision,
            LocationType::Dungeon => self.config.dungeon.precision,
        };
        let scope = geohash::truncate(location, scope_precision)?;

        self.cache
            .get_or_try_init((scope.to_string(), location_type), || async move {
                let stencil = match location_type {
                    LocationType::Geohash => self.place_territory(scope, topology).await?,
                    LocationType::Dungeon => self.place_dungeon(scope).await?,
                };
                tracing::debug!(
                    scope,
                    location_type = %location_type,
                    spawns = stencil.len(),
                    "placed stencil"
                );
                Ok(Arc::new(stencil))
            })
            .await
    }

    async fn place_territory<T: Topology>(
        &self,
        territory: &str,
        topology: &T,
    ) -> ProceduralResult<Stencil> {
        let location_type = LocationType::Geohash;
        let mut pass = Pass::new(&self.config, territory, location_type);

        for blueprint in self.blueprints.for_location(location_type) {
            let Frequency::Plot { precision, .. } = blueprint.frequency else {
                continue;
            };
            let plots = if precision <= territory.len() {
                vec![territory.to_string()]
            } else {
                geohash::expand_to_precision(territory, precision)?
            };

            for plot in plots {
                let elevation = topology.elevation_at(&plot, location_type).await?;
                if elevation < self.config.stencil.land_threshold {
                    continue;
                }
                pass.place_instances(blueprint, &plot, std::slice::from_ref(&plot))?;
            }
        }
        Ok(pass.finish())
    }

    async fn place_dungeon(&self, dungeon: &str) -> ProceduralResult<Stencil> {
        let location_type = LocationType::Dungeon;
        let graph = self.dungeons.generate(dungeon, location_type).await?;
        let mut pass = Pass::new(&self.config, dungeon, location_type);
        let corridor_clusters = graph.corridor_clusters();

        for blueprint in self.blueprints.for_location(location_type) {
            match blueprint.frequency {
                Frequency::Room { .. } => {
                    for room in &graph.rooms {
                        let plots: Vec<String> = room.plots.iter().cloned().collect();
                        pass.place_instances(blueprint, &room.id, &plots)?;
                    }
                }
                Frequency::Corridor { .. } => {
                    for cluster in &corridor_clusters {
                        let Some(first) = cluster.first() else {
                            continue;
                        };
                        pass.place_instances(blueprint, first, cluster)?;
                    }
                }
                Frequency::Plot { .. } => {}
            }
        }
        Ok(pass.finish())
    }
}

/// State of one placement pass.
struct Pass<'a> {
    config: &'a WorldConfig,
    location_type: LocationType,
    /// Cells taken by placed instances.
    claimed: HashSet<String>,
    /// Every prefix of every claimed cell, the cell itself included.
    claimed_prefixes: HashSet<String>,
    stencil: Stencil,
}

impl<'a> Pass<'a> {
    fn new(config: &'a WorldConfig, scope: &str, location_type: LocationType) -> Self {
        Self {
            config,
            location_type,
            claimed: HashSet::new(),
            claimed_prefixes: HashSet::new(),
            stencil: Stencil::new(scope, location_type),
        }
    }

    fn finish(self) -> Stencil {
        self.stencil
    }

    fn unit_precision(&self) -> usize {
        self.config.traversal.unit_precision
    }

    /// Places a blueprint's instances inside `area`, a set of cells that
    /// together form one frequency unit identified by `anchor`.
    fn place_instances(
        &mut self,
        blueprint: &Blueprint,
        anchor: &str,
        area: &[String],
    ) -> ProceduralResult<()> {
        let mut stream = SeedStream::from_parts(&[
            &self.config.seed,
            anchor,
            self.location_type.as_str(),
            &blueprint.name,
        ]);
        let count = blueprint.frequency.count().draw(&mut stream);
        if count == 0 {
            return Ok(());
        }

        let mut candidates = Vec::new();
        for cell in area {
            let precision = blueprint.precision.max(cell.len());
            for candidate in geohash::expand_to_precision(cell, precision)? {
                if !self.overlaps_claim(&candidate) {
                    candidates.push(candidate);
                }
            }
        }

        for instance in stream.sample(&candidates, count) {
            self.claim(&instance);
            self.expand_instance(blueprint, &instance)?;
        }
        Ok(())
    }

    fn claim(&mut self, cell: &str) {
        for len in 1..=cell.len() {
            self.claimed_prefixes.insert(cell[..len].to_string());
        }
        self.claimed.insert(cell.to_string());
    }

    /// Whether `cell` contains, equals or lies inside a claimed cell.
    fn overlaps_claim(&self, cell: &str) -> bool {
        self.claimed_prefixes.contains(cell)
            || (1..cell.len()).any(|len| self.claimed.contains(&cell[..len]))
    }

    fn expand_instance(&mut self, blueprint: &Blueprint, instance: &str) -> ProceduralResult<()> {
        let mut stream = SeedStream::from_parts(&[
            &self.config.seed,
            instance,
            self.location_type.as_str(),
            &blueprint.name,
        ]);
        let cluster_cells = if instance.len() >= self.unit_precision() {
            vec![instance.to_string()]
        } else {
            geohash::children(instance)?
        };
        let mut used: HashSet<String> = HashSet::new();

        for cluster in &blueprint.clusters {
            let count = cluster.count.draw(&mut stream);
            let candidates: Vec<&String> = cluster_cells
                .iter()
                .filter(|cell| cluster.pattern.admits(cell) && !used.contains(*cell))
                .collect();

            for cell in stream.sample(&candidates, count) {
                used.insert(cell.clone());
                let kinds: [(&[SpawnSpec], fn(Spawn) -> StencilEntry); 3] = [
                    (&cluster.props, StencilEntry::Prop),
                    (&cluster.beasts, StencilEntry::Beast),
                    (&cluster.npcs, StencilEntry::Npc),
                ];
                for (specs, wrap) in kinds {
                    for spec in specs {
                        let spawn = Spawn {
                            id: spec.id.clone(),
                            blueprint: blueprint.name.clone(),
                            cluster: cluster.name.clone(),
                            variables: spec.variables.clone(),
                            unique: spec.unique,
                        };
                        self.place_spawn(cell, spec, &spawn, wrap, &mut stream)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn place_spawn(
        &mut self,
        cluster_cell: &str,
        spec: &SpawnSpec,
        spawn: &Spawn,
        wrap: fn(Spawn) -> StencilEntry,
        stream: &mut SeedStream,
    ) -> ProceduralResult<()> {
        let count = spec.count.draw(stream);
        let units = if cluster_cell.len() >= self.unit_precision() {
            vec![cluster_cell.to_string()]
        } else {
            geohash::expand_to_precision(cluster_cell, self.unit_precision())?
        };
        let candidates: Vec<String> = units
            .into_iter()
            .filter(|unit| spec.pattern.admits(unit) && !self.stencil.entries.contains_key(unit))
            .collect();

        for unit in stream.sample(&candidates, count) {
            self.stencil.entries.insert(unit, wrap(spawn.clone()));
        }
        Ok(())
    }
}
