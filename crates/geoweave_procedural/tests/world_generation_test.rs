//! # World Generation Integration Test
//!
//! Proves dungeons and stencils are reproducible and keep their structural
//! guarantees across many cells and seeds.

use std::collections::HashSet;
use std::sync::Arc;

use geoweave_core::{geohash, LocationType, WorldConfig};
use geoweave_procedural::{
    build_dungeon_graph, BlueprintSet, DungeonGenerator, FlatTopology, StencilEngine, StencilEntry,
};

const BLUEPRINTS: &str = r#"
    [[blueprint]]
    name = "watchtower"
    precision = 4
    frequency = { type = "plot", precision = 3, min = 0, max = 1 }

    [[blueprint.clusters]]
    name = "tower"
    pattern = "center"
    props = [{ id = "tower", unique = true, variables = { height = "tall" } }]

    [[blueprint]]
    name = "bandit-camp"
    precision = 5
    frequency = { type = "plot", precision = 3, min = 1, max = 2 }

    [[blueprint.clusters]]
    name = "tents"
    count = { min = 2, max = 4 }
    props = [{ id = "tent", count = { min = 1, max = 3 } }]
    npcs = [{ id = "bandit", pattern = "peripheral" }]

    [[blueprint]]
    name = "lair"
    precision = 7
    frequency = { type = "room", min = 0, max = 1 }

    [[blueprint.clusters]]
    name = "den"
    beasts = [{ id = "skeleton", count = { min = 1, max = 3 } }]
"#;

fn engine(seed: &str) -> StencilEngine {
    let config = Arc::new(WorldConfig::with_seed(seed));
    let dungeons = Arc::new(DungeonGenerator::new(Arc::clone(&config)));
    let blueprints = Arc::new(BlueprintSet::from_toml_str(BLUEPRINTS).unwrap());
    StencilEngine::new(config, blueprints, dungeons)
}

/// Test: Every town of a city yields a valid dungeon.
#[test]
fn test_dungeon_invariants_across_a_city() {
    let config = WorldConfig::with_seed("integration");

    for town in geohash::children("u4pr").unwrap() {
        let graph = build_dungeon_graph(&config, &town, LocationType::Dungeon).unwrap();

        assert!((12..=18).contains(&graph.rooms.len()), "{town}");
        assert!(graph.is_connected(), "{town} is not connected");

        let mut plots = HashSet::new();
        for room in &graph.rooms {
            for plot in &room.plots {
                assert!(plots.insert(plot.as_str()), "{town}: plot {plot} in two rooms");
            }
        }
        for cell in &graph.corridors {
            assert!(!plots.contains(&cell[..7]), "{town}: corridor {cell} inside a room");
        }

        let again = build_dungeon_graph(&config, &town, LocationType::Dungeon).unwrap();
        assert_eq!(graph, again);
    }
}

/// Test: Separate engines agree on the same world.
#[tokio::test]
async fn test_stencils_reproduce_across_engines() {
    let land = FlatTopology::land();
    let a = engine("integration").place_at("u4", LocationType::Geohash, &land).await.unwrap();
    let b = engine("integration").place_at("u4", LocationType::Geohash, &land).await.unwrap();
    assert_eq!(a, b);

    let c = engine("other").place_at("u4", LocationType::Geohash, &land).await.unwrap();
    assert_ne!(a.entries, c.entries);
}

/// Test: Higher-priority blueprints claim cells first.
#[tokio::test]
async fn test_priority_order_is_respected() {
    let stencil = engine("integration")
        .place_at("u4", LocationType::Geohash, &FlatTopology::land())
        .await
        .unwrap();

    let towers: HashSet<&str> = stencil
        .entries
        .iter()
        .filter(|(_, entry)| entry.spawn().blueprint == "watchtower")
        .map(|(cell, _)| &cell[..4])
        .collect();
    for (cell, entry) in &stencil.entries {
        if entry.spawn().blueprint == "bandit-camp" {
            assert!(!towers.contains(&cell[..4]), "camp at {cell} inside a watchtower");
        }
        if let StencilEntry::Npc(spawn) = entry {
            assert_eq!(spawn.id, "bandit");
        }
    }
}

/// Test: Dungeon stencils only place beasts inside rooms.
#[tokio::test]
async fn test_dungeon_stencil_stays_in_rooms() {
    let engine = engine("integration");
    let stencil = engine
        .place_at("u4pru", LocationType::Dungeon, &FlatTopology::land())
        .await
        .unwrap();
    let graph = build_dungeon_graph(
        &WorldConfig::with_seed("integration"),
        "u4pru",
        LocationType::Dungeon,
    )
    .unwrap();

    for (cell, entry) in &stencil.entries {
        assert!(matches!(entry, StencilEntry::Beast(_)));
        assert!(graph.room_containing(cell).is_some(), "{cell} outside every room");
    }
}
