//! # Structure Tile Maps
//!
//! Structures (towers, camps, ruins) ship as tile-layer JSON assets. Only
//! one thing is read from them: the `traversableSpeed` property.
//!
//! ## Resolution Order
//!
//! For a single tile position, layers are scanned topmost (last) first. The
//! first non-empty tile that yields a speed wins:
//!
//! 1. the tile's own property, from the tileset that owns its gid;
//! 2. otherwise the property of the layer the tile sits on.
//!
//! ## Rescaling
//!
//! Tile maps are authored at their own tile size. A tile larger than a unit
//! cell spans `tilewidth / cell_pixels` cells; a tile smaller than a cell
//! means one cell covers `cell_pixels / tilewidth` tiles, and the slowest of
//! those tiles decides.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{NavigationError, NavigationResult};

/// Property carrying the movement speed of a tile.
pub const SPEED_PROPERTY: &str = "traversableSpeed";

// Tiled stores flip/rotation flags in the top bits of a gid.
const GID_MASK: u32 = 0x1FFF_FFFF;

/// A named, typed property.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Declared type (`float`, `int`, `string`...). Informational.
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    /// Raw value.
    pub value: Value,
}

impl Property {
    fn as_speed(&self) -> Option<f64> {
        match &self.value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            _ => None,
        }
        .filter(|speed| speed.is_finite())
    }
}

fn speed_of(properties: &[Property]) -> Option<f64> {
    properties
        .iter()
        .find(|p| p.name == SPEED_PROPERTY)
        .and_then(Property::as_speed)
}

/// One layer of tile gids, row-major.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    /// Layer name.
    #[serde(default)]
    pub name: String,
    /// Tile gids; `0` is empty. Absent for object layers.
    #[serde(default)]
    pub data: Vec<u32>,
    /// Layer properties.
    #[serde(default)]
    pub properties: Vec<Property>,
    /// Width in tiles.
    #[serde(default)]
    pub width: u32,
    /// Height in tiles.
    #[serde(default)]
    pub height: u32,
}

impl TileLayer {
    fn gid_at(&self, x: u32, y: u32) -> u32 {
        if x >= self.width || y >= self.height {
            return 0;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.data.get(index).map_or(0, |gid| gid & GID_MASK)
    }
}

/// Per-tile metadata inside a tileset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileInfo {
    /// Local tile id (gid minus `firstgid`).
    pub id: u32,
    /// Tile properties.
    #[serde(default)]
    pub properties: Vec<Property>,
}

/// An embedded tileset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    /// First gid owned by this tileset.
    pub firstgid: u32,
    /// Tiles that carry metadata.
    #[serde(default)]
    pub tiles: Vec<TileInfo>,
}

/// A decoded structure asset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    /// Layers, bottom first.
    pub layers: Vec<TileLayer>,
    /// Tile width in pixels.
    pub tilewidth: u32,
    /// Tile height in pixels.
    pub tileheight: u32,
    /// Embedded tilesets.
    #[serde(default)]
    pub tilesets: Vec<Tileset>,
}

impl TileMap {
    /// Parses and validates a tile map.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::InvalidTileMap`] for malformed JSON, zero
    /// tile sizes, or tile layers whose data does not match their size.
    pub fn from_json(url: &str, body: &str) -> NavigationResult<Self> {
        let invalid = |reason: String| NavigationError::InvalidTileMap {
            url: url.to_string(),
            reason,
        };

        let map: Self = serde_json::from_str(body).map_err(|e| invalid(e.to_string()))?;
        if map.tilewidth == 0 || map.tileheight == 0 {
            return Err(invalid("tile size must be positive".to_string()));
        }
        for layer in &map.layers {
            let expected = layer.width as usize * layer.height as usize;
            if !layer.data.is_empty() && layer.data.len() != expected {
                return Err(invalid(format!(
                    "layer {:?} holds {} tiles, expected {}x{}",
                    layer.name,
                    layer.data.len(),
                    layer.width,
                    layer.height
                )));
            }
        }
        Ok(map)
    }

    fn tile_properties(&self, gid: u32) -> Option<&[Property]> {
        // Tilesets are sorted by firstgid in practice, but nothing enforces it.
        let tileset = self
            .tilesets
            .iter()
            .filter(|ts| ts.firstgid <= gid)
            .max_by_key(|ts| ts.firstgid)?;
        let local = gid - tileset.firstgid;
        tileset
            .tiles
            .iter()
            .find(|tile| tile.id == local)
            .map(|tile| tile.properties.as_slice())
    }

    /// Speed of a single tile position, if any layer defines one.
    #[must_use]
    pub fn speed_at_tile(&self, x: u32, y: u32) -> Option<f64> {
        self.layers.iter().rev().find_map(|layer| {
            let gid = layer.gid_at(x, y);
            if gid == 0 {
                return None;
            }
            self.tile_properties(gid)
                .and_then(speed_of)
                .or_else(|| speed_of(&layer.properties))
        })
    }

    /// Speed of the unit cell at `(col, row)` cells from the map origin.
    ///
    /// Returns `None` if no covering tile defines a speed, including cells
    /// outside the map.
    #[must_use]
    pub fn speed_at_cell(&self, col: u32, row: u32, cell_pixels: u32) -> Option<f64> {
        let (x0, x_span) = tile_span(col, self.tilewidth, cell_pixels);
        let (y0, y_span) = tile_span(row, self.tileheight, cell_pixels);

        let mut slowest: Option<f64> = None;
        for y in y0..y0.saturating_add(y_span) {
            for x in x0..x0.saturating_add(x_span) {
                if let Some(speed) = self.speed_at_tile(x, y) {
                    slowest = Some(slowest.map_or(speed, |s| s.min(speed)));
                }
            }
        }
        slowest
    }
}

/// First tile and number of tiles covering cell `index` along one axis.
fn tile_span(index: u32, tile_pixels: u32, cell_pixels: u32) -> (u32, u32) {
    let cell_pixels = cell_pixels.max(1);
    if tile_pixels >= cell_pixels {
        let cells_per_tile = tile_pixels / cell_pixels;
        (index / cells_per_tile, 1)
    } else {
        let tiles_per_cell = cell_pixels / tile_pixels;
        (index.saturating_mul(tiles_per_cell), tiles_per_cell)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOWER: &str = r#"{
        "tilewidth": 32,
        "tileheight": 32,
        "layers": [
            {
                "name": "ground",
                "width": 3,
                "height": 2,
                "data": [1, 1, 1, 1, 1, 0],
                "properties": [{"name": "traversableSpeed", "type": "float", "value": 1.0}]
            },
            {
                "name": "walls",
                "width": 3,
                "height": 2,
                "data": [0, 2, 0, 0, 0, 0]
            }
        ],
        "tilesets": [
            {"firstgid": 1, "tiles": [{"id": 1, "properties": [{"name": "traversableSpeed", "type": "int", "value": 0}]}]}
        ]
    }"#;

    #[test]
    fn test_topmost_tile_property_wins() {
        let map = TileMap::from_json("tower.json", TOWER).unwrap();
        assert_eq!(map.speed_at_tile(1, 0), Some(0.0));
        assert_eq!(map.speed_at_tile(0, 0), Some(1.0));
        assert_eq!(map.speed_at_tile(2, 1), None);
        assert_eq!(map.speed_at_tile(9, 9), None);
    }

    #[test]
    fn test_cells_match_tiles_at_same_resolution() {
        let map = TileMap::from_json("tower.json", TOWER).unwrap();
        assert_eq!(map.speed_at_cell(1, 0, 32), Some(0.0));
        assert_eq!(map.speed_at_cell(0, 1, 32), Some(1.0));
        assert_eq!(map.speed_at_cell(3, 0, 32), None);
    }

    #[test]
    fn test_large_tiles_span_several_cells() {
        let map = TileMap::from_json("tower.json", TOWER).unwrap();
        // 32px tiles over 16px cells: cells 2 and 3 fall on tile 1.
        assert_eq!(map.speed_at_cell(2, 0, 16), Some(0.0));
        assert_eq!(map.speed_at_cell(3, 1, 16), Some(0.0));
        assert_eq!(map.speed_at_cell(1, 2, 16), Some(1.0));
        assert_eq!(map.speed_at_cell(1, 0, 16), Some(1.0));
    }

    #[test]
    fn test_small_tiles_take_the_slowest() {
        let map = TileMap::from_json("tower.json", TOWER).unwrap();
        // 32px tiles under 64px cells: cell (0,0) covers tiles x 0..2, y 0..2.
        assert_eq!(map.speed_at_cell(0, 0, 64), Some(0.0));
        // cell (1,0) covers only tile x 2: (2,0) ground, (2,1) empty.
        assert_eq!(map.speed_at_cell(1, 0, 64), Some(1.0));
    }

    #[test]
    fn test_flip_flags_are_ignored() {
        let body = r#"{
            "tilewidth": 16, "tileheight": 16,
            "layers": [{"width": 1, "height": 1, "data": [2147483650]}],
            "tilesets": [{"firstgid": 1, "tiles": [{"id": 1, "properties": [{"name": "traversableSpeed", "value": "0.5"}]}]}]
        }"#;
        let map = TileMap::from_json("flipped.json", body).unwrap();
        assert_eq!(map.speed_at_tile(0, 0), Some(0.5));
    }

    #[test]
    fn test_rejects_malformed_maps() {
        assert!(matches!(
            TileMap::from_json("a.json", "not json"),
            Err(NavigationError::InvalidTileMap { .. })
        ));

        let zero = r#"{"tilewidth": 0, "tileheight": 32, "layers": []}"#;
        assert!(TileMap::from_json("b.json", zero).is_err());

        let short = r#"{"tilewidth": 32, "tileheight": 32,
            "layers": [{"name": "x", "width": 2, "height": 2, "data": [1, 1, 1]}]}"#;
        let err = TileMap::from_json("c.json", short).unwrap_err();
        assert!(err.to_string().contains("c.json"));
    }
}
