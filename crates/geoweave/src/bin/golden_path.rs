//! # Golden Path
//!
//! Generates one dungeon, populates it, and walks from its first room to its
//! last. Prints the layout one character per room plot:
//!
//! ```text
//! #  wall        .  room floor      +  corridor
//! *  the path    S  start           G  goal
//! ```
//!
//! Usage: `golden_path [dungeon-geohash] [seed]`

use std::collections::HashSet;
use std::process::ExitCode;
use std::time::Instant;

use geoweave::core::geohash;
use geoweave::procedural::DungeonGraph;
use geoweave::{Direction, LocationType, PathOptions, WorldConfig, WorldCore, WorldResult};

/// Plenty for any path inside one dungeon.
const MAX_ITERATIONS: usize = 50_000;

/// Outcome of one run.
struct GoldenPath {
    graph: std::sync::Arc<DungeonGraph>,
    start: String,
    goal: String,
    path: Vec<Direction>,
    spawns: usize,
    elapsed_ms: f64,
}

async fn run(dungeon: &str, seed: &str) -> WorldResult<GoldenPath> {
    let started = Instant::now();
    let core = WorldCore::isolated(WorldConfig::with_seed(seed))?;

    let graph = core
        .generate_dungeon_graph(dungeon, LocationType::Dungeon)
        .await?;
    let stencil = core.place_at(dungeon, LocationType::Dungeon).await?;

    let start = room_cell(&graph, 0)?;
    let goal = room_cell(&graph, graph.rooms.len().saturating_sub(1))?;
    let options = PathOptions::default().with_max_iterations(MAX_ITERATIONS);
    let path = core
        .find_path(&start, &goal, LocationType::Dungeon, Some("golden-path"), &options)
        .await?;

    Ok(GoldenPath {
        graph,
        start,
        goal,
        path,
        spawns: stencil.entries.len(),
        elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
    })
}

/// A corridor-precision cell in the middle of room `index`.
fn room_cell(graph: &DungeonGraph, index: usize) -> WorldResult<String> {
    let Some(room) = graph.rooms.get(index) else {
        return Ok(graph.dungeon.clone());
    };
    let mut cells = geohash::expand_to_precision(&room.id, graph.corridor_precision)?;
    let middle = cells.len() / 2;
    Ok(cells.swap_remove(middle))
}

fn render(result: &GoldenPath) -> WorldResult<Vec<String>> {
    let graph = &result.graph;
    let Some(plot_precision) = graph.rooms.first().map(|room| room.plot_precision) else {
        return Ok(Vec::new());
    };
    let rooms: HashSet<&str> = graph
        .rooms
        .iter()
        .flat_map(|room| room.plots.iter().map(String::as_str))
        .collect();
    let corridors: HashSet<&str> = graph
        .corridors
        .iter()
        .filter_map(|cell| cell.get(..plot_precision))
        .collect();

    let mut walked = HashSet::new();
    let mut cell = result.start.clone();
    for direction in &result.path {
        cell = geohash::neighbor(&cell, *direction, 1)?;
        walked.insert(cell.get(..plot_precision).unwrap_or_default().to_string());
    }
    let start_plot = result.start.get(..plot_precision).unwrap_or_default();
    let goal_plot = result.goal.get(..plot_precision).unwrap_or_default();

    let (origin_col, origin_row) = geohash::col_row(&graph.dungeon)?;
    let (width, height) = geohash::scale_factor(graph.dungeon.len(), plot_precision)?;

    let mut lines = Vec::with_capacity(height as usize);
    for row in 0..height {
        let mut line = String::with_capacity(width as usize);
        for col in 0..width {
            let plot = geohash::encode(
                origin_col * width + col,
                origin_row * height + row,
                plot_precision,
            )?;
            let symbol = if plot == start_plot {
                'S'
            } else if plot == goal_plot {
                'G'
            } else if walked.contains(&plot) {
                '*'
            } else if rooms.contains(plot.as_str()) {
                '.'
            } else if corridors.contains(plot.as_str()) {
                '+'
            } else {
                '#'
            };
            line.push(symbol);
        }
        lines.push(line);
    }
    Ok(lines)
}

fn main() -> ExitCode {
    let mut args = std::env::args().skip(1);
    let dungeon = args.next().unwrap_or_else(|| "u4pru".to_string());
    let seed = args.next().unwrap_or_else(|| "golden".to_string());

    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║           GOLDEN PATH                                            ║");
    println!("║           Dungeon → Stencil → Walk                               ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let runtime = match tokio::runtime::Builder::new_current_thread().build() {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("failed to start runtime: {err}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = runtime.block_on(run(&dungeon, &seed)).and_then(|result| {
        let lines = render(&result)?;
        Ok((result, lines))
    });
    let (result, lines) = match outcome {
        Ok(done) => done,
        Err(err) => {
            eprintln!("❌ {err}");
            return ExitCode::FAILURE;
        }
    };

    for line in &lines {
        println!("  {line}");
    }
    println!();
    println!("┌─ DUNGEON {dungeon} (seed {seed:?}) ─────────────────────────────────");
    println!("│ Rooms:          {}", result.graph.rooms.len());
    println!("│ Corridor cells: {}", result.graph.corridors.len());
    println!("│ Connected:      {}", result.graph.is_connected());
    println!("│ Spawns:         {}", result.spawns);
    println!("│ Path:           {} -> {} in {} steps", result.start, result.goal, result.path.len());
    println!("│ Elapsed:        {:.3} ms", result.elapsed_ms);
    println!("└──────────────────────────────────────────────────────────────────");

    let tokens: Vec<&str> = result.path.iter().map(|d| d.as_str()).collect();
    println!("{}", tokens.join(" "));

    if result.path.is_empty() && result.start != result.goal {
        println!();
        println!("❌ NO PATH FOUND");
        return ExitCode::FAILURE;
    }
    println!();
    println!("✅ GOLDEN PATH COMPLETE");
    ExitCode::SUCCESS
}
