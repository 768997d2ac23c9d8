//! # A* Pathfinder
//!
//! Grid A* whose edge costs come from an async lookup, so callers can back it
//! with cached or remote walkability queries.
//!
//! - Heuristic: Manhattan distance to the goal.
//! - Steps: 8 compass directions; orthogonal steps cost 1, diagonal steps
//!   cost 2. With that weighting Manhattan distance is admissible and
//!   consistent, so the first time the goal is popped its path is optimal.
//! - Ties on `f` prefer the node closer to the goal, then the node pushed
//!   first. The result is a pure function of the inputs.
//! - Unreachable goals and exhausted budgets yield an empty path, not an
//!   error. Only an elapsed deadline is an error.

use std::cmp::{Ordering, Reverse};
use std::collections::hash_map::Entry;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::future::Future;

use geoweave_core::Direction;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::error::{NavigationError, NavigationResult};

/// Default expansion budget.
pub const DEFAULT_MAX_ITERATIONS: usize = 1000;

/// A position on an unbounded integer grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Row, increasing southwards.
    pub row: i64,
    /// Column, increasing eastwards.
    pub col: i64,
}

impl GridPos {
    /// Creates a position.
    #[must_use]
    pub const fn new(row: i64, col: i64) -> Self {
        Self { row, col }
    }

    /// Manhattan distance.
    #[must_use]
    pub const fn manhattan(self, other: Self) -> u64 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// The position one step away.
    #[must_use]
    pub const fn step(self, direction: Direction) -> Self {
        let (d_col, d_row) = direction.delta();
        Self {
            row: self.row + d_row,
            col: self.col + d_col,
        }
    }
}

/// Result of an edge-cost lookup.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileCost {
    /// The cell may be entered.
    Walkable,
    /// The cell may not be entered.
    Blocked,
}

impl From<bool> for TileCost {
    fn from(walkable: bool) -> Self {
        if walkable {
            Self::Walkable
        } else {
            Self::Blocked
        }
    }
}

/// Search bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathOptions {
    /// Stop as soon as a node within this Manhattan distance of the goal is
    /// reached.
    pub range: Option<u64>,
    /// Expansion budget; exhausting it yields an empty path.
    pub max_iterations: usize,
    /// Abort with [`NavigationError::DeadlineExceeded`] once this instant
    /// passes.
    pub deadline: Option<Instant>,
}

impl Default for PathOptions {
    fn default() -> Self {
        Self {
            range: None,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            deadline: None,
        }
    }
}

impl PathOptions {
    /// Stops within `range` of the goal.
    #[must_use]
    pub const fn with_range(mut self, range: u64) -> Self {
        self.range = Some(range);
        self
    }

    /// Overrides the expansion budget.
    #[must_use]
    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets an absolute deadline.
    #[must_use]
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    fn in_range(&self, pos: GridPos, goal: GridPos) -> bool {
        pos == goal || self.range.is_some_and(|range| pos.manhattan(goal) <= range)
    }
}

struct OpenEntry {
    pos: GridPos,
    g: u64,
    h: u64,
    steps: u64,
    seq: u64,
}

impl OpenEntry {
    const fn f(&self) -> u64 {
        self.g + self.h
    }

    /// Most steps the finished path could have. A diagonal costs as much as
    /// the two orthogonal steps around it, so among equal costs the walk with
    /// more steps is the orthogonal one.
    const fn reach(&self) -> u64 {
        self.steps + self.h
    }
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other
            .f()
            .cmp(&self.f())
            .then_with(|| self.reach().cmp(&other.reach()))
            .then_with(|| other.h.cmp(&self.h))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

const fn step_cost(direction: Direction) -> u64 {
    if direction.is_diagonal() {
        2
    } else {
        1
    }
}

/// Finds a path from `start` towards `goal`.
///
/// `cost(row, col)` is awaited once per candidate neighbour (closed cells are
/// never queried; the start cell is never queried). Returns the directions to
/// walk, empty when `start` already satisfies the goal or no path was found
/// within budget. Among equally cheap paths the one with the most steps
/// wins, so across open ground the path length is the Manhattan distance.
///
/// # Errors
///
/// Propagates errors from `cost`, and returns
/// [`NavigationError::DeadlineExceeded`] if the deadline passes mid-search.
pub async fn find_path<F, Fut>(
    start: GridPos,
    goal: GridPos,
    mut cost: F,
    options: &PathOptions,
) -> NavigationResult<Vec<Direction>>
where
    F: FnMut(i64, i64) -> Fut,
    Fut: Future<Output = NavigationResult<TileCost>>,
{
    if options.in_range(start, goal) {
        return Ok(Vec::new());
    }

    let mut open = BinaryHeap::new();
    // Cheapest cost seen per cell, then the most steps at that cost.
    let mut best: HashMap<GridPos, (u64, Reverse<u64>)> =
        HashMap::from([(start, (0, Reverse(0)))]);
    let mut came_from: HashMap<GridPos, (GridPos, Direction)> = HashMap::new();
    let mut closed: HashSet<GridPos> = HashSet::new();
    let mut seq = 0_u64;
    let mut expanded = 0_usize;

    open.push(OpenEntry {
        pos: start,
        g: 0,
        h: start.manhattan(goal),
        steps: 0,
        seq,
    });

    while let Some(current) = open.pop() {
        // Stale entry superseded by a cheaper push.
        if !closed.insert(current.pos) {
            continue;
        }

        if options.in_range(current.pos, goal) {
            let path = reconstruct(&came_from, current.pos);
            tracing::trace!(expanded, steps = path.len(), "path found");
            return Ok(path);
        }

        if expanded >= options.max_iterations {
            tracing::debug!(?start, ?goal, expanded, "search budget exhausted");
            return Ok(Vec::new());
        }
        if options.deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            return Err(NavigationError::DeadlineExceeded { expanded });
        }
        expanded += 1;

        for direction in Direction::COMPASS {
            let next = current.pos.step(direction);
            if closed.contains(&next) {
                continue;
            }
            if cost(next.row, next.col).await? == TileCost::Blocked {
                continue;
            }

            let g = current.g + step_cost(direction);
            let steps = current.steps + 1;
            let rank = (g, Reverse(steps));
            match best.entry(next) {
                Entry::Occupied(known) if *known.get() <= rank => continue,
                Entry::Occupied(mut known) => {
                    known.insert(rank);
                }
                Entry::Vacant(slot) => {
                    slot.insert(rank);
                }
            }
            came_from.insert(next, (current.pos, direction));
            seq += 1;
            open.push(OpenEntry {
                pos: next,
                g,
                h: next.manhattan(goal),
                steps,
                seq,
            });
        }
    }

    tracing::trace!(?start, ?goal, expanded, "goal unreachable");
    Ok(Vec::new())
}

fn reconstruct(came_from: &HashMap<GridPos, (GridPos, Direction)>, end: GridPos) -> Vec<Direction> {
    let mut path = Vec::new();
    let mut pos = end;
    while let Some(&(parent, direction)) = came_from.get(&pos) {
        path.push(direction);
        pos = parent;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::time::Duration;

    fn open_grid(_row: i64, _col: i64) -> std::future::Ready<NavigationResult<TileCost>> {
        std::future::ready(Ok(TileCost::Walkable))
    }

    fn walk(start: GridPos, path: &[Direction]) -> GridPos {
        path.iter().fold(start, |pos, d| pos.step(*d))
    }

    fn cost_of(path: &[Direction]) -> u64 {
        path.iter().map(|d| step_cost(*d)).sum()
    }

    #[tokio::test]
    async fn test_straight_line_east() {
        let path = find_path(
            GridPos::new(0, 0),
            GridPos::new(0, 5),
            open_grid,
            &PathOptions::default(),
        )
        .await
        .unwrap();
        assert_eq!(path, vec![Direction::East; 5]);
    }

    #[tokio::test]
    async fn test_open_grid_cost_is_manhattan() {
        let start = GridPos::new(3, -2);
        for goal in [GridPos::new(-4, 6), GridPos::new(10, 10), GridPos::new(3, -9)] {
            let path = find_path(start, goal, open_grid, &PathOptions::default())
                .await
                .unwrap();
            assert_eq!(walk(start, &path), goal);
            assert_eq!(cost_of(&path), start.manhattan(goal));
        }
    }

    #[tokio::test]
    async fn test_open_grid_length_is_manhattan() {
        let start = GridPos::new(0, 0);
        for goal in [GridPos::new(3, 3), GridPos::new(10, 10), GridPos::new(-6, 2)] {
            let path = find_path(start, goal, open_grid, &PathOptions::default())
                .await
                .unwrap();
            assert_eq!(walk(start, &path), goal);
            assert_eq!(path.len() as u64, start.manhattan(goal), "{path:?}");
            assert!(path.iter().all(|d| !d.is_diagonal()));
        }
    }

    #[tokio::test]
    async fn test_start_equals_goal() {
        let here = GridPos::new(7, 7);
        let path = find_path(here, here, open_grid, &PathOptions::default())
            .await
            .unwrap();
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn test_all_blocked_is_empty() {
        let path = find_path(
            GridPos::new(0, 0),
            GridPos::new(0, 3),
            |_, _| std::future::ready(Ok(TileCost::Blocked)),
            &PathOptions::default(),
        )
        .await
        .unwrap();
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn test_walls_are_avoided() {
        // Vertical wall at col 2, rows -3..=3.
        let wall = |row: i64, col: i64| {
            std::future::ready(Ok(TileCost::from(!(col == 2 && (-3..=3).contains(&row)))))
        };
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(0, 4);
        let path = find_path(start, goal, wall, &PathOptions::default())
            .await
            .unwrap();

        assert_eq!(walk(start, &path), goal);
        let mut pos = start;
        for d in &path {
            pos = pos.step(*d);
            assert!(!(pos.col == 2 && (-3..=3).contains(&pos.row)), "walked into {pos:?}");
        }
        assert!(cost_of(&path) > start.manhattan(goal));
    }

    #[tokio::test]
    async fn test_range_stops_early() {
        let start = GridPos::new(0, 0);
        let goal = GridPos::new(0, 10);
        let exact = find_path(start, goal, open_grid, &PathOptions::default())
            .await
            .unwrap();
        let ranged = find_path(start, goal, open_grid, &PathOptions::default().with_range(3))
            .await
            .unwrap();

        assert!(walk(start, &ranged).manhattan(goal) <= 3);
        assert!(ranged.len() <= exact.len());
        assert_eq!(ranged, vec![Direction::East; 7]);

        let already = find_path(start, GridPos::new(2, 1), open_grid, &PathOptions::default().with_range(3))
            .await
            .unwrap();
        assert!(already.is_empty());
    }

    #[tokio::test]
    async fn test_budget_exhaustion_is_empty() {
        // Goal enclosed by a ring of walls: unreachable on an infinite grid.
        let goal = GridPos::new(0, 20);
        let enclosed = move |row: i64, col: i64| {
            let ring = GridPos::new(row, col).manhattan(goal) == 1
                || (row.abs_diff(goal.row) == 1 && col.abs_diff(goal.col) == 1);
            std::future::ready(Ok(TileCost::from(!ring)))
        };
        let options = PathOptions::default().with_max_iterations(50);
        let path = find_path(GridPos::new(0, 0), goal, enclosed, &options)
            .await
            .unwrap();
        assert!(path.is_empty());
    }

    #[tokio::test]
    async fn test_each_neighbour_queried_lazily() {
        let lookups = Cell::new(0_usize);
        let counting = |_: i64, _: i64| {
            lookups.set(lookups.get() + 1);
            std::future::ready(Ok(TileCost::Walkable))
        };
        let path = find_path(GridPos::new(0, 0), GridPos::new(0, 1), counting, &PathOptions::default())
            .await
            .unwrap();
        assert_eq!(path, vec![Direction::East]);
        assert_eq!(lookups.get(), 8);
    }

    #[tokio::test]
    async fn test_cost_errors_propagate() {
        let failing = |_: i64, _: i64| {
            std::future::ready(Err(NavigationError::DeadlineExceeded { expanded: 99 }))
        };
        let err = find_path(GridPos::new(0, 0), GridPos::new(5, 5), failing, &PathOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err, NavigationError::DeadlineExceeded { expanded: 99 });
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_is_an_error() {
        let deadline = Instant::now() + Duration::from_millis(10);
        let slow = |_: i64, _: i64| async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, NavigationError>(TileCost::Walkable)
        };
        let options = PathOptions::default().with_deadline(deadline);
        let err = find_path(GridPos::new(0, 0), GridPos::new(40, 40), slow, &options)
            .await
            .unwrap_err();
        assert!(matches!(err, NavigationError::DeadlineExceeded { expanded } if expanded >= 1));
    }
}
