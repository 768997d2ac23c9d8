//! # Dungeon Graph Generator
//!
//! One dungeon per dungeon-precision cell (a town by default). Rooms are made
//! of plots at the room precision; corridors are cells at the finer corridor
//! precision.
//!
//! ## Pipeline
//!
//! 1. Seed a [`SeedStream`] from `world seed + dungeon + location type` and
//!    draw the room count.
//! 2. Partition the plot grid of the dungeon cell with a [`BspTree`]; every
//!    leaf holds one candidate room, inset from the leaf's right and bottom
//!    edges so neighbouring rooms never touch.
//! 3. Sort candidates by id and sample the room count.
//! 4. Connect rooms greedily, nearest first, from the first room onward.
//! 5. Carve an L-shaped corridor per connection, skipping cells inside rooms.
//!
//! Output uses ordered containers, so two generations serialize
//! byte-identically.

use std::collections::{BTreeSet, HashSet, VecDeque};
use std::sync::Arc;

use geoweave_core::{
    geohash, CacheStore, Direction, LocationType, MemoCache, SeedStream, WorldConfig,
};
use serde::{Deserialize, Serialize};

use crate::bsp::{BspParams, BspTree, Rect};
use crate::error::{ProceduralError, ProceduralResult};

/// A room: a rectangle of plots.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Geohash of the centre plot.
    pub id: String,
    /// Every plot of the room.
    pub plots: BTreeSet<String>,
    /// Precision of the plots.
    pub plot_precision: usize,
    /// Ids of directly connected rooms.
    pub connections: Vec<String>,
    /// Corridor cells touching the room.
    pub entrances: Vec<String>,
}

/// Rooms and corridors of one dungeon.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DungeonGraph {
    /// The dungeon cell.
    pub dungeon: String,
    /// Location type the dungeon was generated for.
    pub location_type: LocationType,
    /// Rooms sorted by id.
    pub rooms: Vec<Room>,
    /// Every corridor cell.
    pub corridors: BTreeSet<String>,
    /// Precision of the corridor cells.
    pub corridor_precision: usize,
}

impl DungeonGraph {
    /// Looks up a room by id.
    #[must_use]
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }

    /// Returns the room whose plots contain `cell` (any precision at or
    /// below the plot precision).
    #[must_use]
    pub fn room_containing(&self, cell: &str) -> Option<&Room> {
        let first = self.rooms.first()?;
        let plot = cell.get(..first.plot_precision)?;
        self.rooms.iter().find(|room| room.plots.contains(plot))
    }

    /// Returns `true` if `cell` lies in a corridor cell.
    #[must_use]
    pub fn is_corridor(&self, cell: &str) -> bool {
        cell.get(..self.corridor_precision)
            .is_some_and(|corridor| self.corridors.contains(corridor))
    }

    /// Returns `true` for room and corridor cells.
    #[must_use]
    pub fn is_walkable(&self, cell: &str) -> bool {
        self.room_containing(cell).is_some() || self.is_corridor(cell)
    }

    /// Returns `true` if every room is reachable from every other through
    /// connections.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let Some(first) = self.rooms.first() else {
            return true;
        };
        let mut seen: HashSet<&str> = HashSet::from([first.id.as_str()]);
        let mut queue = VecDeque::from([first]);
        while let Some(room) = queue.pop_front() {
            for id in &room.connections {
                if seen.insert(id.as_str()) {
                    if let Some(next) = self.room(id) {
                        queue.push_back(next);
                    }
                }
            }
        }
        seen.len() == self.rooms.len()
    }

    /// Groups corridor cells into 8-connected components.
    ///
    /// Each component is sorted; components are ordered by their first cell.
    #[must_use]
    pub fn corridor_clusters(&self) -> Vec<Vec<String>> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut clusters = Vec::new();

        for start in &self.corridors {
            if !seen.insert(start.as_str()) {
                continue;
            }
            let mut cluster = BTreeSet::from([start.clone()]);
            let mut queue = VecDeque::from([start.clone()]);
            while let Some(cell) = queue.pop_front() {
                for direction in Direction::COMPASS {
                    let Ok(next) = geohash::neighbor(&cell, direction, 1) else {
                        continue;
                    };
                    if let Some(stored) = self.corridors.get(&next) {
                        if seen.insert(stored.as_str()) {
                            cluster.insert(next.clone());
                            queue.push_back(next);
                        }
                    }
                }
            }
            clusters.push(cluster.into_iter().collect());
        }
        clusters
    }
}

/// A room before connection, in absolute plot coordinates.
#[derive(Clone, Debug)]
struct RoomDraft {
    id: String,
    rect: Rect,
}

/// Builds the dungeon containing `geohash`.
///
/// # Errors
///
/// Returns [`ProceduralError::Geo`] if `geohash` is malformed or coarser than
/// the dungeon precision, and [`ProceduralError::InsufficientLeaves`] if the
/// configuration cannot yield enough rooms.
pub fn build_dungeon_graph(
    config: &WorldConfig,
    geohash: &str,
    location_type: LocationType,
) -> ProceduralResult<DungeonGraph> {
    let settings = &config.dungeon;
    let dungeon = geohash::truncate(geohash, settings.precision)?;
    let mut stream = SeedStream::from_parts(&[&config.seed, dungeon, location_type.as_str()]);
    let num_rooms = stream.range_inclusive(settings.min_rooms, settings.max_rooms) as usize;

    // Plot grid covering the dungeon cell, in absolute coordinates.
    let (dungeon_col, dungeon_row) = geohash::col_row(dungeon)?;
    let (plot_cols, plot_rows) = geohash::scale_factor(settings.precision, settings.room_precision)?;
    let bounds = Rect::new(
        dungeon_col * plot_cols,
        dungeon_row * plot_rows,
        plot_cols,
        plot_rows,
    );
    let params = BspParams {
        min_depth: settings.min_depth,
        max_depth: settings.max_depth,
        min_leaf: settings.min_leaf,
        stop_chance: settings.stop_chance,
    };
    let tree = BspTree::build(bounds, &params, &mut stream);

    let mut candidates = Vec::new();
    for leaf in tree.leaves() {
        let rect = inset_room(leaf.rect, &mut stream);
        let (col, row) = rect.center();
        let id = geohash::encode(col, row, settings.room_precision)?;
        candidates.push(RoomDraft { id, rect });
    }
    if candidates.len() < num_rooms {
        return Err(ProceduralError::InsufficientLeaves {
            dungeon: dungeon.to_string(),
            leaves: candidates.len(),
            required: num_rooms,
        });
    }
    candidates.sort_by(|a, b| a.id.cmp(&b.id));
    let mut drafts = stream.sample(&candidates, num_rooms);
    drafts.sort_by(|a, b| a.id.cmp(&b.id));

    let mut rooms = Vec::with_capacity(drafts.len());
    let mut room_plots = HashSet::new();
    for draft in &drafts {
        let mut plots = BTreeSet::new();
        for (col, row) in draft.rect.cells() {
            let plot = geohash::encode(col, row, settings.room_precision)?;
            room_plots.insert(plot.clone());
            plots.insert(plot);
        }
        rooms.push(Room {
            id: draft.id.clone(),
            plots,
            plot_precision: settings.room_precision,
            connections: Vec::new(),
            entrances: Vec::new(),
        });
    }

    let links = connect_rooms(&drafts, settings.max_connections, &mut stream);

    let corridor_scale = geohash::scale_factor(settings.room_precision, settings.corridor_precision)?;
    let mut corridors = BTreeSet::new();
    for &(source, target) in &links {
        let horizontal_first = stream.chance(0.5);
        let from = corridor_center(&drafts[source].rect, corridor_scale);
        let to = corridor_center(&drafts[target].rect, corridor_scale);

        let mut kept = Vec::new();
        for (col, row) in l_walk(from, to, horizontal_first) {
            let cell = geohash::encode(col, row, settings.corridor_precision)?;
            if room_plots.contains(&cell[..settings.room_precision]) {
                continue;
            }
            kept.push(cell);
        }

        let (source_id, target_id) = (drafts[source].id.clone(), drafts[target].id.clone());
        push_unique(&mut rooms[source].connections, target_id);
        push_unique(&mut rooms[target].connections, source_id);
        if let (Some(first), Some(last)) = (kept.first(), kept.last()) {
            push_unique(&mut rooms[source].entrances, first.clone());
            push_unique(&mut rooms[target].entrances, last.clone());
        }
        corridors.extend(kept);
    }

    tracing::debug!(
        dungeon,
        location_type = %location_type,
        rooms = rooms.len(),
        corridors = corridors.len(),
        "generated dungeon graph"
    );

    Ok(DungeonGraph {
        dungeon: dungeon.to_string(),
        location_type,
        rooms,
        corridors,
        corridor_precision: settings.corridor_precision,
    })
}

/// Shrinks a leaf to a room, keeping the leaf's last column and row free.
fn inset_room(leaf: Rect, stream: &mut SeedStream) -> Rect {
    let avail_width = leaf.width.saturating_sub(1).max(1);
    let avail_height = leaf.height.saturating_sub(1).max(1);
    let width = stream.range_inclusive((avail_width / 2).max(2).min(avail_width), avail_width);
    let height = stream.range_inclusive((avail_height / 2).max(2).min(avail_height), avail_height);
    let col = leaf.col + stream.range_inclusive(0, avail_width - width);
    let row = leaf.row + stream.range_inclusive(0, avail_height - height);
    Rect::new(col, row, width, height)
}

/// Greedy nearest-neighbour spanning tree. Each round links the current room
/// to its nearest unconnected rooms, then moves on to the last of them.
/// Returns `(source, target)` index pairs into `rooms`, in carving order.
fn connect_rooms(
    rooms: &[RoomDraft],
    max_connections: u32,
    stream: &mut SeedStream,
) -> Vec<(usize, usize)> {
    let mut links = Vec::new();
    if rooms.is_empty() {
        return links;
    }
    let mut connected = vec![false; rooms.len()];
    connected[0] = true;
    let mut remaining = rooms.len() - 1;
    let mut current = 0;

    while remaining > 0 {
        let fan_out = stream.range_inclusive(1, max_connections.max(1)) as usize;
        let (cx, cy) = rooms[current].rect.center();
        let mut nearest: Vec<(u64, &str, usize)> = rooms
            .iter()
            .enumerate()
            .filter(|&(index, _)| !connected[index])
            .map(|(index, room)| {
                let (x, y) = room.rect.center();
                let dx = u64::from(x.abs_diff(cx));
                let dy = u64::from(y.abs_diff(cy));
                (dx * dx + dy * dy, room.id.as_str(), index)
            })
            .collect();
        nearest.sort_unstable();

        let anchor = current;
        for &(_, _, target) in nearest.iter().take(fan_out) {
            connected[target] = true;
            remaining -= 1;
            links.push((anchor, target));
            current = target;
        }
    }
    links
}

/// Centre of a room in the corridor grid.
fn corridor_center(rect: &Rect, (scale_cols, scale_rows): (u32, u32)) -> (u32, u32) {
    let (col, row) = rect.center();
    (
        col * scale_cols + scale_cols / 2,
        row * scale_rows + scale_rows / 2,
    )
}

/// Cells of an L-shaped walk, both endpoints included.
fn l_walk(from: (u32, u32), to: (u32, u32), horizontal_first: bool) -> Vec<(u32, u32)> {
    let step = |value: u32, target: u32| if value < target { value + 1 } else { value - 1 };
    let (mut col, mut row) = from;
    let mut cells = vec![from];
    for horizontal in [horizontal_first, !horizontal_first] {
        if horizontal {
            while col != to.0 {
                col = step(col, to.0);
                cells.push((col, row));
            }
        } else {
            while row != to.1 {
                row = step(row, to.1);
                cells.push((col, row));
            }
        }
    }
    cells
}

fn push_unique(list: &mut Vec<String>, value: String) {
    if !list.contains(&value) {
        list.push(value);
    }
}

/// Key of a cached dungeon: the dungeon cell and its location type.
pub type DungeonKey = (String, LocationType);

/// Memoising front end of [`build_dungeon_graph`].
pub struct DungeonGenerator {
    config: Arc<WorldConfig>,
    cache: MemoCache<DungeonKey, Arc<DungeonGraph>>,
}

impl DungeonGenerator {
    /// Creates a generator with a process-local cache.
    #[must_use]
    pub fn new(config: Arc<WorldConfig>) -> Self {
        Self {
            config,
            cache: MemoCache::new("dungeon"),
        }
    }

    /// Creates a generator in front of an external cache store.
    #[must_use]
    pub fn with_store(
        config: Arc<WorldConfig>,
        store: Arc<dyn CacheStore<DungeonKey, Arc<DungeonGraph>>>,
    ) -> Self {
        Self {
            config,
            cache: MemoCache::with_store("dungeon", store),
        }
    }

    /// The world this generator builds.
    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the dungeon containing `geohash`, generating it on first use.
    ///
    /// # Errors
    ///
    /// See [`build_dungeon_graph`].
    pub async fn generate(
        &self,
        geohash: &str,
        location_type: LocationType,
    ) -> ProceduralResult<Arc<DungeonGraph>> {
        let dungeon = geohash::truncate(geohash, self.config.dungeon.precision)?;
        let config = &self.config;
        self.cache
            .get_or_try_init((dungeon.to_string(), location_type), || async move {
                build_dungeon_graph(config, dungeon, location_type).map(Arc::new)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(seed: &str, cell: &str) -> DungeonGraph {
        build_dungeon_graph(&WorldConfig::with_seed(seed), cell, LocationType::Dungeon).unwrap()
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(graph("alpha", "u4pru"), graph("alpha", "u4pru"));
        assert_ne!(graph("alpha", "u4pru"), graph("beta", "u4pru"));
    }

    #[test]
    fn test_input_is_truncated_to_dungeon_cell() {
        assert_eq!(graph("", "u4pruydq"), graph("", "u4pru"));
    }

    #[test]
    fn test_room_count_in_range() {
        for cell in ["u4pru", "s0000", "9q8yy", "dr5ru"] {
            let g = graph("", cell);
            assert!((12..=18).contains(&g.rooms.len()), "{cell}: {}", g.rooms.len());
        }
    }

    #[test]
    fn test_rooms_are_disjoint_and_inside_dungeon() {
        let g = graph("", "u4pru");
        let mut seen = HashSet::new();
        for room in &g.rooms {
            assert!(room.plots.contains(&room.id));
            for plot in &room.plots {
                assert!(plot.starts_with("u4pru"));
                assert_eq!(plot.len(), 7);
                assert!(seen.insert(plot.clone()), "plot {plot} shared");
            }
        }
    }

    #[test]
    fn test_graph_is_connected() {
        for seed in ["", "a", "b", "c", "d"] {
            assert!(graph(seed, "u4pru").is_connected(), "seed {seed:?}");
        }
    }

    #[test]
    fn test_corridors_avoid_rooms() {
        let g = graph("", "u4pru");
        assert!(!g.corridors.is_empty());
        for cell in &g.corridors {
            assert_eq!(cell.len(), 8);
            assert!(g.room_containing(cell).is_none());
            assert!(g.is_walkable(cell));
        }
        for room in &g.rooms {
            assert!(!room.entrances.is_empty());
            for entrance in &room.entrances {
                assert!(g.is_corridor(entrance));
            }
        }
    }

    #[test]
    fn test_corridor_clusters_partition_corridors() {
        let g = graph("", "u4pru");
        let clusters = g.corridor_clusters();
        let total: usize = clusters.iter().map(Vec::len).sum();
        assert_eq!(total, g.corridors.len());
        for pair in clusters.windows(2) {
            assert!(pair[0][0] < pair[1][0]);
        }
    }

    #[test]
    fn test_insufficient_leaves() {
        let mut config = WorldConfig::default();
        config.dungeon.min_depth = 1;
        config.dungeon.max_depth = 1;
        let err = build_dungeon_graph(&config, "u4pru", LocationType::Dungeon).unwrap_err();
        assert!(matches!(err, ProceduralError::InsufficientLeaves { leaves: 2, .. }));
    }

    #[test]
    fn test_links_fan_out_from_current_room() {
        let rooms: Vec<RoomDraft> = (0..5)
            .map(|i| RoomDraft {
                id: format!("room{i}"),
                rect: Rect {
                    col: i * 4,
                    row: 0,
                    width: 2,
                    height: 2,
                },
            })
            .collect();

        let mut fanned = 0;
        for seed in 0..50 {
            let mut stream = SeedStream::new(&format!("fan-{seed}"));
            let links = connect_rooms(&rooms, 2, &mut stream);
            assert_eq!(links.len(), rooms.len() - 1);

            let mut connected = HashSet::from([0]);
            for &(from, to) in &links {
                assert!(connected.contains(&from), "{from} linked before it was reached");
                assert!(connected.insert(to));
            }
            if links.windows(2).any(|pair| pair[0].0 == pair[1].0) {
                fanned += 1;
            }
        }
        assert!(fanned > 0);
    }

    #[test]
    fn test_l_walk() {
        let cells = l_walk((0, 0), (2, 1), true);
        assert_eq!(cells, vec![(0, 0), (1, 0), (2, 0), (2, 1)]);
        let cells = l_walk((2, 1), (0, 0), false);
        assert_eq!(cells, vec![(2, 1), (2, 0), (1, 0), (0, 0)]);
    }

    #[tokio::test]
    async fn test_generator_memoizes() {
        let generator = DungeonGenerator::new(Arc::new(WorldConfig::default()));
        let a = generator.generate("u4pruydq", LocationType::Dungeon).await.unwrap();
        let b = generator.generate("u4pru", LocationType::Dungeon).await.unwrap();
        assert!(Arc::ptr_eq(&a, &b));

        let overworld = generator.generate("u4pru", LocationType::Geohash).await.unwrap();
        assert_ne!(overworld.location_type, a.location_type);
    }

    #[tokio::test]
    async fn test_generator_rejects_coarse_cells() {
        let generator = DungeonGenerator::new(Arc::new(WorldConfig::default()));
        assert!(matches!(
            generator.generate("u4p", LocationType::Dungeon).await,
            Err(ProceduralError::Geo(_))
        ));
    }
}
