//! # Direction Tokens
//!
//! The movement vocabulary shared by the grid math and the pathfinder.
//! `u`/`d` are reserved for vertical layers and are no-ops on the 2D grid.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A compass direction (plus the two vertical no-ops).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Towards row 0.
    #[serde(rename = "n")]
    North,
    /// Away from row 0.
    #[serde(rename = "s")]
    South,
    /// Increasing column.
    #[serde(rename = "e")]
    East,
    /// Decreasing column.
    #[serde(rename = "w")]
    West,
    /// North and east.
    #[serde(rename = "ne")]
    NorthEast,
    /// North and west.
    #[serde(rename = "nw")]
    NorthWest,
    /// South and east.
    #[serde(rename = "se")]
    SouthEast,
    /// South and west.
    #[serde(rename = "sw")]
    SouthWest,
    /// Up one layer (no-op in 2D).
    #[serde(rename = "u")]
    Up,
    /// Down one layer (no-op in 2D).
    #[serde(rename = "d")]
    Down,
}

impl Direction {
    /// The eight planar directions, orthogonal first.
    pub const COMPASS: [Self; 8] = [
        Self::North,
        Self::South,
        Self::East,
        Self::West,
        Self::NorthEast,
        Self::NorthWest,
        Self::SouthEast,
        Self::SouthWest,
    ];

    /// Returns the wire token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::North => "n",
            Self::South => "s",
            Self::East => "e",
            Self::West => "w",
            Self::NorthEast => "ne",
            Self::NorthWest => "nw",
            Self::SouthEast => "se",
            Self::SouthWest => "sw",
            Self::Up => "u",
            Self::Down => "d",
        }
    }

    /// Returns the `(d_col, d_row)` grid delta.
    #[inline]
    #[must_use]
    pub const fn delta(self) -> (i64, i64) {
        match self {
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (-1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
            Self::Up | Self::Down => (0, 0),
        }
    }

    /// Returns the direction pointing the other way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::NorthEast => Self::SouthWest,
            Self::NorthWest => Self::SouthEast,
            Self::SouthEast => Self::NorthWest,
            Self::SouthWest => Self::NorthEast,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Returns `true` for the four diagonal directions.
    #[inline]
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        matches!(
            self,
            Self::NorthEast | Self::NorthWest | Self::SouthEast | Self::SouthWest
        )
    }

    /// Maps a unit planar delta back to its direction.
    #[must_use]
    pub fn from_delta(d_col: i64, d_row: i64) -> Option<Self> {
        Self::COMPASS
            .into_iter()
            .find(|direction| direction.delta() == (d_col, d_row))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = GeoError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "n" => Ok(Self::North),
            "s" => Ok(Self::South),
            "e" => Ok(Self::East),
            "w" => Ok(Self::West),
            "ne" => Ok(Self::NorthEast),
            "nw" => Ok(Self::NorthWest),
            "se" => Ok(Self::SouthEast),
            "sw" => Ok(Self::SouthWest),
            "u" => Ok(Self::Up),
            "d" => Ok(Self::Down),
            other => Err(GeoError::InvalidDirection(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_round_trip() {
        for token in ["n", "s", "e", "w", "ne", "nw", "se", "sw", "u", "d"] {
            let direction: Direction = token.parse().unwrap();
            assert_eq!(direction.as_str(), token);
        }
        assert!(matches!("north".parse::<Direction>(), Err(GeoError::InvalidDirection(_))));
    }

    #[test]
    fn test_opposites_cancel() {
        for direction in Direction::COMPASS {
            let (a, b) = direction.delta();
            let (c, d) = direction.opposite().delta();
            assert_eq!((a + c, b + d), (0, 0));
            assert_eq!(Direction::from_delta(a, b), Some(direction));
        }
        assert_eq!(Direction::from_delta(0, 0), None);
    }
}
