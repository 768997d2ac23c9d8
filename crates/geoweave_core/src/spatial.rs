//! # Spatial Hierarchy
//!
//! Named precision tiers bound the scope of each generator ("one dungeon per
//! town", "blueprints per territory"), and [`LocationType`] distinguishes the
//! overworld from dungeon instances.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// A named geohash precision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Tier {
    /// 1 character.
    Continent = 1,
    /// 2 characters.
    Territory = 2,
    /// 3 characters (guild scope).
    Region = 3,
    /// 4 characters.
    City = 4,
    /// 5 characters.
    Town = 5,
    /// 6 characters.
    Village = 6,
    /// 7 characters.
    House = 7,
    /// 8 characters; the cell an entity occupies.
    Unit = 8,
}

impl Tier {
    /// All tiers, coarsest first.
    pub const ALL: [Self; 8] = [
        Self::Continent,
        Self::Territory,
        Self::Region,
        Self::City,
        Self::Town,
        Self::Village,
        Self::House,
        Self::Unit,
    ];

    /// Geohash length of this tier.
    #[inline]
    #[must_use]
    pub const fn precision(self) -> usize {
        self as usize
    }

    /// Looks up the tier with the given geohash length.
    #[must_use]
    pub fn from_precision(precision: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| tier.precision() == precision)
    }
}

/// Whether a location lives on the overworld or inside a dungeon instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    /// Overworld cell.
    #[default]
    Geohash,
    /// Cell inside the dungeon rooted at the enclosing dungeon-precision cell.
    Dungeon,
}

impl LocationType {
    /// Returns the token used in seeds and cache keys.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Geohash => "geohash",
            Self::Dungeon => "dungeon",
        }
    }
}

impl fmt::Display for LocationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationType {
    type Err = GeoError;

    fn from_str(token: &str) -> Result<Self, Self::Err> {
        match token {
            "geohash" => Ok(Self::Geohash),
            "dungeon" => Ok(Self::Dungeon),
            other => Err(GeoError::InvalidLocationType(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_precisions_are_ordered() {
        for pair in Tier::ALL.windows(2) {
            assert_eq!(pair[0].precision() + 1, pair[1].precision());
        }
        assert_eq!(Tier::from_precision(8), Some(Tier::Unit));
        assert_eq!(Tier::from_precision(9), None);
    }

    #[test]
    fn test_location_type_tokens() {
        assert_eq!("dungeon".parse::<LocationType>().unwrap(), LocationType::Dungeon);
        assert_eq!(LocationType::Geohash.to_string(), "geohash");
        assert!("d2".parse::<LocationType>().is_err());
    }
}
