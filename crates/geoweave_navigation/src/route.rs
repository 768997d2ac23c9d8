//! Geohash routes: A* over the grid of one precision, with walkability from
//! the [`TraversabilityResolver`].

use std::collections::HashMap;

use geoweave_core::{geohash, Direction, LocationType};
use geoweave_procedural::Topology;
use parking_lot::Mutex;

use crate::collaborators::{ColliderQuery, Collaborators, WorldLookup};
use crate::error::{NavigationError, NavigationResult};
use crate::pathfinding::{find_path, GridPos, PathOptions, TileCost};
use crate::traversal::TraversabilityResolver;

/// Finds the directions leading from `start` to `goal`.
///
/// Both cells are compared at the coarser of their two precisions. Columns
/// wrap around the antimeridian; rows beyond the poles are blocked. Each cell
/// is resolved at most once per search.
///
/// # Errors
///
/// Propagates malformed geohashes, resolver and collaborator failures, and
/// an elapsed deadline.
pub async fn find_geohash_path<C, W, T>(
    start: &str,
    goal: &str,
    location_type: LocationType,
    location_instance: Option<&str>,
    resolver: &TraversabilityResolver,
    with: Collaborators<'_, C, W, T>,
    options: &PathOptions,
) -> NavigationResult<Vec<Direction>>
where
    C: ColliderQuery,
    W: WorldLookup,
    T: Topology,
{
    geohash::validate(start)?;
    geohash::validate(goal)?;
    let precision = start.len().min(goal.len());
    let start = grid_pos(geohash::truncate(start, precision)?)?;
    let goal = grid_pos(geohash::truncate(goal, precision)?)?;
    let (cols, rows) = geohash::grid_dims(precision)?;

    let memo: Mutex<HashMap<GridPos, TileCost>> = Mutex::new(HashMap::new());
    let memo = &memo;

    let cost = move |row: i64, col: i64| async move {
        let pos = GridPos::new(row, col);
        if let Some(&known) = memo.lock().get(&pos) {
            return Ok::<_, NavigationError>(known);
        }

        let verdict = match u32::try_from(row) {
            Ok(row) if row < rows => {
                let col = u32::try_from(col.rem_euclid(i64::from(cols))).unwrap_or(0);
                let cell = geohash::encode(col, row, precision)?;
                let walkable = resolver
                    .is_traversable(&cell, location_type, location_instance, with)
                    .await?;
                TileCost::from(walkable)
            }
            _ => TileCost::Blocked,
        };
        memo.lock().insert(pos, verdict);
        Ok(verdict)
    };

    let path = find_path(start, goal, cost, options).await?;
    tracing::debug!(
        precision,
        steps = path.len(),
        resolved = memo.lock().len(),
        "geohash route"
    );
    Ok(path)
}

fn grid_pos(geohash: &str) -> NavigationResult<GridPos> {
    let (col, row) = geohash::col_row(geohash)?;
    Ok(GridPos::new(i64::from(row), i64::from(col)))
}
