//! # Binary Space Partitioning
//!
//! Splits a rectangle of plots into leaves that each hold one candidate room.
//!
//! Nodes live in a flat arena (`Vec<BspNode>`) and refer to their children
//! by index, so the tree is built with an explicit work stack and never
//! recurses.

use geoweave_core::SeedStream;

/// Fraction range a split is drawn from.
const SPLIT_RATIO_MIN: f64 = 0.35;
const SPLIT_RATIO_MAX: f64 = 0.65;

/// Aspect ratio beyond which the long side is always split.
const FORCE_SPLIT_ASPECT: f64 = 1.25;

/// An axis-aligned rectangle in plot coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rect {
    /// Left column.
    pub col: u32,
    /// Top row.
    pub row: u32,
    /// Width in plots.
    pub width: u32,
    /// Height in plots.
    pub height: u32,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(col: u32, row: u32, width: u32, height: u32) -> Self {
        Self {
            col,
            row,
            width,
            height,
        }
    }

    /// The centre plot (rounded towards the top-left).
    #[must_use]
    pub const fn center(&self) -> (u32, u32) {
        (self.col + self.width / 2, self.row + self.height / 2)
    }

    /// Returns `true` if the plot lies inside the rectangle.
    #[must_use]
    pub const fn contains(&self, col: u32, row: u32) -> bool {
        col >= self.col
            && col < self.col + self.width
            && row >= self.row
            && row < self.row + self.height
    }

    /// Every plot inside the rectangle, row-major.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.row..self.row + self.height)
            .flat_map(move |row| (self.col..self.col + self.width).map(move |col| (col, row)))
    }
}

/// Split parameters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BspParams {
    /// Depth every branch reaches before it may stop.
    pub min_depth: u32,
    /// Depth no branch exceeds.
    pub max_depth: u32,
    /// Smallest leaf side.
    pub min_leaf: u32,
    /// Chance a branch past `min_depth` stops.
    pub stop_chance: f64,
}

/// One node of the tree.
#[derive(Clone, Debug, PartialEq)]
pub struct BspNode {
    /// Area covered by the node.
    pub rect: Rect,
    /// Distance from the root.
    pub depth: u32,
    /// Indices of the two halves, if split.
    pub children: Option<(usize, usize)>,
}

impl BspNode {
    /// Returns `true` if the node was not split.
    #[inline]
    #[must_use]
    pub const fn is_leaf(&self) -> bool {
        self.children.is_none()
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Axis {
    /// Cut across columns; halves sit side by side.
    Vertical,
    /// Cut across rows; halves are stacked.
    Horizontal,
}

/// Arena-backed BSP tree. The root is node 0.
#[derive(Clone, Debug, PartialEq)]
pub struct BspTree {
    nodes: Vec<BspNode>,
}

impl BspTree {
    /// Partitions `bounds`, drawing every decision from `stream`.
    pub fn build(bounds: Rect, params: &BspParams, stream: &mut SeedStream) -> Self {
        let mut nodes = vec![BspNode {
            rect: bounds,
            depth: 0,
            children: None,
        }];
        let mut pending = vec![0usize];

        // Pop order only affects which draws each node consumes.
        while let Some(index) = pending.pop() {
            let BspNode { rect, depth, .. } = nodes[index];
            let Some((first, second)) = split(rect, depth, params, stream) else {
                continue;
            };
            let left = nodes.len();
            nodes.push(BspNode {
                rect: first,
                depth: depth + 1,
                children: None,
            });
            nodes.push(BspNode {
                rect: second,
                depth: depth + 1,
                children: None,
            });
            nodes[index].children = Some((left, left + 1));
            pending.push(left + 1);
            pending.push(left);
        }

        Self { nodes }
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`: a tree has at least its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks up a node by index.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&BspNode> {
        self.nodes.get(index)
    }

    /// All nodes in arena order.
    #[must_use]
    pub fn nodes(&self) -> &[BspNode] {
        &self.nodes
    }

    /// Leaves in arena order.
    pub fn leaves(&self) -> impl Iterator<Item = &BspNode> {
        self.nodes.iter().filter(|node| node.is_leaf())
    }
}

fn split(
    rect: Rect,
    depth: u32,
    params: &BspParams,
    stream: &mut SeedStream,
) -> Option<(Rect, Rect)> {
    if depth >= params.max_depth {
        return None;
    }
    if depth >= params.min_depth && stream.chance(params.stop_chance) {
        return None;
    }

    let fits = |side: u32| side >= params.min_leaf * 2;
    let preferred = preferred_axis(rect, depth);
    let axis = match preferred {
        Axis::Vertical if fits(rect.width) => Axis::Vertical,
        Axis::Horizontal if fits(rect.height) => Axis::Horizontal,
        _ if fits(rect.width) => Axis::Vertical,
        _ if fits(rect.height) => Axis::Horizontal,
        _ => return None,
    };

    let ratio = SPLIT_RATIO_MIN + stream.next_f64() * (SPLIT_RATIO_MAX - SPLIT_RATIO_MIN);
    let side = match axis {
        Axis::Vertical => rect.width,
        Axis::Horizontal => rect.height,
    };
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let at = ((f64::from(side) * ratio) as u32).clamp(params.min_leaf, side - params.min_leaf);

    Some(match axis {
        Axis::Vertical => (
            Rect::new(rect.col, rect.row, at, rect.height),
            Rect::new(rect.col + at, rect.row, side - at, rect.height),
        ),
        Axis::Horizontal => (
            Rect::new(rect.col, rect.row, rect.width, at),
            Rect::new(rect.col, rect.row + at, rect.width, side - at),
        ),
    })
}

fn preferred_axis(rect: Rect, depth: u32) -> Axis {
    let width = f64::from(rect.width);
    let height = f64::from(rect.height);
    if width > height * FORCE_SPLIT_ASPECT {
        Axis::Vertical
    } else if height > width * FORCE_SPLIT_ASPECT {
        Axis::Horizontal
    } else if depth % 2 == 0 {
        Axis::Vertical
    } else {
        Axis::Horizontal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> BspParams {
        BspParams {
            min_depth: 5,
            max_depth: 6,
            min_leaf: 3,
            stop_chance: 0.5,
        }
    }

    #[test]
    fn test_leaves_tile_the_bounds() {
        let bounds = Rect::new(0, 0, 32, 32);
        let tree = BspTree::build(bounds, &params(), &mut SeedStream::new("bsp"));

        let area: u32 = tree.leaves().map(|leaf| leaf.rect.width * leaf.rect.height).sum();
        assert_eq!(area, 32 * 32);

        for (col, row) in bounds.cells() {
            let owners = tree.leaves().filter(|leaf| leaf.rect.contains(col, row)).count();
            assert_eq!(owners, 1, "plot ({col}, {row}) covered {owners} times");
        }
    }

    #[test]
    fn test_respects_min_leaf_and_depth() {
        let tree = BspTree::build(Rect::new(0, 0, 32, 32), &params(), &mut SeedStream::new("x"));
        for leaf in tree.leaves() {
            assert!(leaf.rect.width >= 3 && leaf.rect.height >= 3);
            assert!(leaf.depth <= 6);
        }
        assert!(tree.leaves().count() >= 18);
    }

    #[test]
    fn test_children_are_indices() {
        let tree = BspTree::build(Rect::new(0, 0, 16, 16), &params(), &mut SeedStream::new("i"));
        let root = tree.node(0).unwrap();
        let (a, b) = root.children.unwrap();
        assert_eq!(tree.node(a).unwrap().depth, 1);
        assert_eq!(tree.node(b).unwrap().depth, 1);
    }

    #[test]
    fn test_deterministic() {
        let a = BspTree::build(Rect::new(0, 0, 32, 32), &params(), &mut SeedStream::new("d"));
        let b = BspTree::build(Rect::new(0, 0, 32, 32), &params(), &mut SeedStream::new("d"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_tiny_bounds_stay_a_leaf() {
        let tree = BspTree::build(Rect::new(0, 0, 5, 5), &params(), &mut SeedStream::new("t"));
        assert_eq!(tree.len(), 1);
        assert!(tree.node(0).unwrap().is_leaf());
    }
}
