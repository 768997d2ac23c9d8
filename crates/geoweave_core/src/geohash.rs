//! # Geohash Grid Arithmetic
//!
//! Converts between geohash strings and absolute integer grid coordinates.
//!
//! ## Layout
//!
//! Each geohash character subdivides its parent cell. Because latitude and
//! longitude bits interleave, the subdivision alternates:
//!
//! - a character appended to an **even**-length prefix splits the cell into
//!   8 columns x 4 rows
//! - a character appended to an **odd**-length prefix splits the cell into
//!   4 columns x 8 rows
//!
//! ```text
//! even prefix (8x4)        odd prefix (4x8)
//! b c f g u v y z          p r x z
//! 8 9 d e s t w x          n q w y
//! 2 3 6 7 k m q r          j m t v
//! 0 1 4 5 h j n p          h k s u
//!                          5 7 e g
//!                          4 6 d f
//!                          1 3 9 c
//!                          0 2 8 b
//! ```
//!
//! Coordinates grow east (columns) and south (rows) from a fixed north-west
//! origin, so cells at different precisions compare through integer scaling.
//!
//! ## Iteration
//!
//! All conversions are flat loops over compile-time lookup tables. Nothing
//! recurses, so stack depth is independent of precision.

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::{GeoError, GeoResult};

/// Longest geohash the grid math accepts (2^30 x 2^30 cells).
pub const MAX_PRECISION: usize = 12;

/// The geohash alphabet in bit-value order.
pub const ALPHABET: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";

/// Symbols appended to an even-length prefix, row-major from the north-west.
const EVEN_PREFIX_SYMBOLS: [u8; 32] = *b"bcfguvyz89destwx2367kmqr0145hjnp";

/// Symbols appended to an odd-length prefix, row-major from the north-west.
const ODD_PREFIX_SYMBOLS: [u8; 32] = *b"prxznqwyjmtvhksu57eg46df139c028b";

/// Inner 4x2 block of the even-prefix layout.
const EVEN_PREFIX_CENTER: [u8; 8] = *b"dest67km";

/// Inner 2x4 block of the odd-prefix layout.
const ODD_PREFIX_CENTER: [u8; 8] = *b"mtks7e6d";

/// Marker for bytes that are not geohash symbols.
const INVALID: u8 = 0xFF;

/// Builds the inverse table: ASCII byte -> packed `(row << 4) | col`.
const fn build_offsets(symbols: &[u8; 32], width: usize) -> [u8; 128] {
    let mut table = [INVALID; 128];
    let mut i = 0;
    while i < 32 {
        let col = i % width;
        let row = i / width;
        table[symbols[i] as usize] = ((row << 4) | col) as u8;
        i += 1;
    }
    table
}

const EVEN_PREFIX_OFFSETS: [u8; 128] = build_offsets(&EVEN_PREFIX_SYMBOLS, 8);
const ODD_PREFIX_OFFSETS: [u8; 128] = build_offsets(&ODD_PREFIX_SYMBOLS, 4);

/// One of the two alternating sub-grid layouts.
#[derive(Clone, Copy)]
struct Layout {
    width: u32,
    height: u32,
    symbols: &'static [u8; 32],
    offsets: &'static [u8; 128],
    center: &'static [u8; 8],
}

const EVEN_PREFIX: Layout = Layout {
    width: 8,
    height: 4,
    symbols: &EVEN_PREFIX_SYMBOLS,
    offsets: &EVEN_PREFIX_OFFSETS,
    center: &EVEN_PREFIX_CENTER,
};

const ODD_PREFIX: Layout = Layout {
    width: 4,
    height: 8,
    symbols: &ODD_PREFIX_SYMBOLS,
    offsets: &ODD_PREFIX_OFFSETS,
    center: &ODD_PREFIX_CENTER,
};

#[inline]
const fn layout_for(prefix_len: usize) -> Layout {
    if prefix_len % 2 == 0 {
        EVEN_PREFIX
    } else {
        ODD_PREFIX
    }
}

/// Returns `(columns, rows)` of the sub-grid a character appended to a prefix
/// of `prefix_len` characters selects from.
#[inline]
#[must_use]
pub const fn layout_dims(prefix_len: usize) -> (u32, u32) {
    let layout = layout_for(prefix_len);
    (layout.width, layout.height)
}

/// Returns the `(col, row)` offset of `symbol` inside the layout used after a
/// prefix of `prefix_len` characters.
#[inline]
fn symbol_offset(prefix_len: usize, symbol: char) -> Option<(u32, u32)> {
    let code = symbol as usize;
    if code >= 128 {
        return None;
    }
    let packed = layout_for(prefix_len).offsets[code];
    if packed == INVALID {
        None
    } else {
        Some((u32::from(packed & 0x0F), u32::from(packed >> 4)))
    }
}

fn check_precision(precision: usize) -> GeoResult<()> {
    if precision == 0 || precision > MAX_PRECISION {
        return Err(GeoError::InvalidPrecision {
            precision,
            max: MAX_PRECISION,
        });
    }
    Ok(())
}

/// Validates a geohash: non-empty, at most [`MAX_PRECISION`] characters, all
/// from the lowercase geohash alphabet.
///
/// # Errors
///
/// Returns the first violation found.
pub fn validate(geohash: &str) -> GeoResult<()> {
    if geohash.is_empty() {
        return Err(GeoError::EmptyGeohash);
    }
    for (i, symbol) in geohash.chars().enumerate() {
        if symbol_offset(i, symbol).is_none() {
            return Err(GeoError::InvalidCharacter {
                geohash: geohash.to_string(),
                character: symbol,
            });
        }
    }
    check_precision(geohash.len())
}

/// Grid dimensions `(cols, rows)` at `precision` without validation.
const fn dims(precision: usize) -> (u32, u32) {
    let mut cols = 1u32;
    let mut rows = 1u32;
    let mut i = 0;
    while i < precision {
        let layout = layout_for(i);
        cols *= layout.width;
        rows *= layout.height;
        i += 1;
    }
    (cols, rows)
}

/// Returns `(cols, rows)` of the whole-world grid at `precision`.
///
/// # Errors
///
/// Returns [`GeoError::InvalidPrecision`] outside `1..=MAX_PRECISION`.
pub fn grid_dims(precision: usize) -> GeoResult<(u32, u32)> {
    check_precision(precision)?;
    Ok(dims(precision))
}

/// Decodes a geohash into its absolute `(col, row)` grid coordinate.
///
/// # Errors
///
/// Returns an error for empty, over-long or malformed geohashes.
pub fn col_row(geohash: &str) -> GeoResult<(u32, u32)> {
    validate(geohash)?;
    let mut col = 0u32;
    let mut row = 0u32;
    for (i, symbol) in geohash.chars().enumerate() {
        let layout = layout_for(i);
        let (dx, dy) = symbol_offset(i, symbol).ok_or_else(|| GeoError::InvalidCharacter {
            geohash: geohash.to_string(),
            character: symbol,
        })?;
        col = col * layout.width + dx;
        row = row * layout.height + dy;
    }
    Ok((col, row))
}

/// Encodes an absolute `(col, row)` coordinate as a geohash of `precision`
/// characters.
///
/// # Errors
///
/// Returns an error if the precision is unsupported or the coordinate lies
/// outside the grid.
pub fn encode(col: u32, row: u32, precision: usize) -> GeoResult<String> {
    check_precision(precision)?;
    let (cols, rows) = dims(precision);
    if col >= cols || row >= rows {
        return Err(GeoError::OutOfBounds {
            col: u64::from(col),
            row: u64::from(row),
            precision,
        });
    }

    // Least-significant character first, reversed at the end.
    let mut reversed = Vec::with_capacity(precision);
    let (mut c, mut r) = (col, row);
    for i in (0..precision).rev() {
        let layout = layout_for(i);
        let dx = c % layout.width;
        let dy = r % layout.height;
        c /= layout.width;
        r /= layout.height;
        reversed.push(layout.symbols[(dy * layout.width + dx) as usize]);
    }
    Ok(reversed.iter().rev().map(|&b| char::from(b)).collect())
}

/// Returns the parent cell, or `None` for a single-character geohash.
#[inline]
#[must_use]
pub fn parent(geohash: &str) -> Option<&str> {
    if geohash.len() <= 1 {
        return None;
    }
    geohash.get(..geohash.len() - 1)
}

/// Truncates a geohash to `precision` characters.
///
/// # Errors
///
/// Returns an error if the geohash is invalid or shorter than `precision`.
pub fn truncate(geohash: &str, precision: usize) -> GeoResult<&str> {
    validate(geohash)?;
    if precision == 0 || precision > geohash.len() {
        return Err(GeoError::InvalidPrecision {
            precision,
            max: geohash.len(),
        });
    }
    Ok(&geohash[..precision])
}

/// Number of `(cols, rows)` cells at precision `to` covered by one cell at
/// precision `from`.
///
/// # Errors
///
/// Returns an error unless `1 <= from <= to <= MAX_PRECISION`.
pub fn scale_factor(from: usize, to: usize) -> GeoResult<(u32, u32)> {
    check_precision(from)?;
    check_precision(to)?;
    if from > to {
        return Err(GeoError::InvalidPrecision {
            precision: to,
            max: MAX_PRECISION,
        });
    }
    let mut cols = 1u32;
    let mut rows = 1u32;
    for i in from..to {
        let layout = layout_for(i);
        cols *= layout.width;
        rows *= layout.height;
    }
    Ok((cols, rows))
}

/// Moves `times` steps in `direction`.
///
/// Columns wrap around the antimeridian; rows clamp at the poles. The
/// vertical tokens `u` and `d` leave the cell unchanged.
///
/// # Errors
///
/// Returns an error for malformed geohashes.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn neighbor(geohash: &str, direction: Direction, times: u32) -> GeoResult<String> {
    let (col, row) = col_row(geohash)?;
    let (cols, rows) = dims(geohash.len());
    let (dc, dr) = direction.delta();
    let steps = i64::from(times);

    let col = (i64::from(col) + dc * steps).rem_euclid(i64::from(cols));
    let row = (i64::from(row) + dr * steps).clamp(0, i64::from(rows) - 1);
    encode(col as u32, row as u32, geohash.len())
}

/// Returns the 32 children of a cell, row-major from the north-west corner of
/// the child layout.
///
/// # Errors
///
/// Returns an error for malformed geohashes or when the children would exceed
/// [`MAX_PRECISION`].
pub fn children(geohash: &str) -> GeoResult<Vec<String>> {
    validate(geohash)?;
    check_precision(geohash.len() + 1)?;
    let layout = layout_for(geohash.len());
    Ok(layout
        .symbols
        .iter()
        .map(|&symbol| {
            let mut child = String::with_capacity(geohash.len() + 1);
            child.push_str(geohash);
            child.push(char::from(symbol));
            child
        })
        .collect())
}

/// Expands a cell into all of its descendants at `precision`.
///
/// Expanding to the geohash's own precision yields the geohash itself.
///
/// # Errors
///
/// Returns an error for malformed geohashes or when `precision` is coarser
/// than the geohash or beyond [`MAX_PRECISION`].
pub fn expand_to_precision(geohash: &str, precision: usize) -> GeoResult<Vec<String>> {
    validate(geohash)?;
    check_precision(precision)?;
    if precision < geohash.len() {
        return Err(GeoError::InvalidPrecision {
            precision,
            max: MAX_PRECISION,
        });
    }

    let mut frontier = vec![geohash.to_string()];
    for depth in geohash.len()..precision {
        let layout = layout_for(depth);
        let mut next = Vec::with_capacity(frontier.len() * 32);
        for cell in &frontier {
            for &symbol in layout.symbols {
                let mut child = String::with_capacity(depth + 1);
                child.push_str(cell);
                child.push(char::from(symbol));
                next.push(child);
            }
        }
        frontier = next;
    }
    Ok(frontier)
}

/// Euclidean distance between the centres of two cells, in grid cells of the
/// finer of the two precisions. Not a geographic distance.
///
/// # Errors
///
/// Returns an error for malformed geohashes.
pub fn distance(a: &str, b: &str) -> GeoResult<f64> {
    let precision = a.len().max(b.len());
    let (ax, ay) = scaled_center(a, precision)?;
    let (bx, by) = scaled_center(b, precision)?;
    Ok(((ax - bx).powi(2) + (ay - by).powi(2)).sqrt())
}

fn scaled_center(geohash: &str, precision: usize) -> GeoResult<(f64, f64)> {
    let (col, row) = col_row(geohash)?;
    let (fx, fy) = scale_factor(geohash.len(), precision)?;
    Ok((
        f64::from(col) * f64::from(fx) + f64::from(fx) / 2.0,
        f64::from(row) * f64::from(fy) + f64::from(fy) / 2.0,
    ))
}

/// The 8 symbols nearest the geometric centre of a cell whose prefix has
/// `prefix_len` characters.
#[inline]
#[must_use]
pub const fn center_symbols(prefix_len: usize) -> &'static [u8; 8] {
    layout_for(prefix_len).center
}

/// Returns `true` if `symbol` lies in the centre block of its layout.
#[inline]
#[must_use]
pub fn is_center_symbol(prefix_len: usize, symbol: char) -> bool {
    u8::try_from(symbol).is_ok_and(|b| center_symbols(prefix_len).contains(&b))
}

/// Returns `true` if `symbol` is a valid symbol on the edge ring of its layout.
#[inline]
#[must_use]
pub fn is_peripheral_symbol(prefix_len: usize, symbol: char) -> bool {
    symbol_offset(prefix_len, symbol).is_some() && !is_center_symbol(prefix_len, symbol)
}

/// An absolute grid address.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    /// Geohash length.
    pub precision: usize,
    /// Row from the northern edge.
    pub row: u32,
    /// Column from the western edge.
    pub col: u32,
    /// The cell's geohash.
    pub geohash: String,
}

impl GridCell {
    /// Decodes a geohash into a grid cell.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed geohashes.
    pub fn from_geohash(geohash: &str) -> GeoResult<Self> {
        let (col, row) = col_row(geohash)?;
        Ok(Self {
            precision: geohash.len(),
            row,
            col,
            geohash: geohash.to_string(),
        })
    }

    /// Builds a grid cell from coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinate lies outside the grid.
    pub fn from_col_row(col: u32, row: u32, precision: usize) -> GeoResult<Self> {
        Ok(Self {
            precision,
            row,
            col,
            geohash: encode(col, row, precision)?,
        })
    }
}
