//! Cell grid geometry
//!
//! The world is an infinite integer grid of square tiles, `tile` degrees on a
//! side. Cell `(i, j)` covers latitudes `[i*tile, (i+1)*tile)` and longitudes
//! `[j*tile, (j+1)*tile)`: each cell owns its south and west edges.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A geographic position in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Cell this position falls in
    #[inline]
    pub fn cell(&self, tile: f64) -> CellAddress {
        to_cell_address(self.lat, self.lng, tile)
    }
}

/// Integer address of a grid cell (row `i` from latitude, column `j` from longitude)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    pub i: i32,
    pub j: i32,
}

impl CellAddress {
    pub const fn new(i: i32, j: i32) -> Self {
        Self { i, j }
    }

    /// Canonical `"i,j"` key used for storage and luck seeding
    pub fn key(&self) -> String {
        self.to_string()
    }

    /// Cell offset by `(di, dj)`
    pub fn offset(&self, di: i32, dj: i32) -> Self {
        Self::new(self.i.saturating_add(di), self.j.saturating_add(dj))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.i, self.j)
    }
}

/// Error parsing an `"i,j"` key
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid cell key {0:?}, expected \"i,j\"")]
pub struct ParseCellKeyError(pub String);

impl FromStr for CellAddress {
    type Err = ParseCellKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCellKeyError(s.to_string());
        let (i, j) = s.split_once(',').ok_or_else(err)?;
        let i = i.trim().parse().map_err(|_| err())?;
        let j = j.trim().parse().map_err(|_| err())?;
        Ok(Self { i, j })
    }
}

/// Axis-aligned lat/lng rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl CellBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Half-open containment: south/west edges inside, north/east outside
    pub fn contains(&self, pos: LatLng) -> bool {
        pos.lat >= self.south && pos.lat < self.north && pos.lng >= self.west && pos.lng < self.east
    }
}

/// Floor index along one axis, nudged so `idx*tile <= coord < (idx+1)*tile`
/// holds with the same products `to_bounds` computes
fn axis_index(coord: f64, tile: f64) -> i32 {
    let mut idx = (coord / tile).floor() as i32;
    if f64::from(idx) * tile > coord {
        idx = idx.saturating_sub(1);
    } else if (f64::from(idx) + 1.0) * tile <= coord {
        idx = idx.saturating_add(1);
    }
    idx
}

/// Map a lat/lng to the cell containing it
pub fn to_cell_address(lat: f64, lng: f64, tile: f64) -> CellAddress {
    CellAddress::new(axis_index(lat, tile), axis_index(lng, tile))
}

/// Rectangle covered by a cell
pub fn to_bounds(address: CellAddress, tile: f64) -> CellBounds {
    let CellAddress { i, j } = address;
    CellBounds {
        south: f64::from(i) * tile,
        west: f64::from(j) * tile,
        north: (f64::from(i) + 1.0) * tile,
        east: (f64::from(j) + 1.0) * tile,
    }
}

/// Max of the row/column deltas between two cells
pub fn chebyshev_distance(a: CellAddress, b: CellAddress) -> u32 {
    let di = (i64::from(a.i) - i64::from(b.i)).unsigned_abs();
    let dj = (i64::from(a.j) - i64::from(b.j)).unsigned_abs();
    u32::try_from(di.max(dj)).unwrap_or(u32::MAX)
}

/// Inclusive index ranges of the cells a rectangle touches
fn index_span(bounds: &CellBounds, tile: f64) -> (CellAddress, CellAddress) {
    let low = to_cell_address(bounds.south, bounds.west, tile);
    let high = CellAddress::new(
        upper_index(bounds.north, bounds.south, tile),
        upper_index(bounds.east, bounds.west, tile),
    );
    (low, high)
}

/// Last index a half-open `[lower, upper)` range reaches; an upper bound on a
/// tile edge stops at the tile below it
fn upper_index(upper: f64, lower: f64, tile: f64) -> i32 {
    let idx = axis_index(upper, tile);
    if upper > lower && f64::from(idx) * tile == upper {
        idx.saturating_sub(1)
    } else {
        idx
    }
}

/// Number of cells `cells_in_bounds` would yield
pub fn cell_count(bounds: &CellBounds, tile: f64) -> usize {
    let (low, high) = index_span(bounds, tile);
    let rows = (i64::from(high.i) - i64::from(low.i) + 1).max(0);
    let cols = (i64::from(high.j) - i64::from(low.j) + 1).max(0);
    usize::try_from(rows.saturating_mul(cols)).unwrap_or(usize::MAX)
}

/// Every cell whose tile intersects `bounds`, row-major from south-west
pub fn cells_in_bounds(bounds: &CellBounds, tile: f64) -> impl Iterator<Item = CellAddress> + use<> {
    let (low, high) = index_span(bounds, tile);
    (low.i..=high.i).flat_map(move |i| (low.j..=high.j).map(move |j| CellAddress::new(i, j)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::TILE_DEGREES;
    use proptest::prelude::*;

    #[test]
    fn test_to_cell_address_floors_negative() {
        let addr = to_cell_address(-0.00005, -0.00015, TILE_DEGREES);
        assert_eq!(addr, CellAddress::new(-1, -2));
    }

    #[test]
    fn test_to_bounds() {
        let b = to_bounds(CellAddress::new(2, -3), 1.0);
        assert_eq!(b, CellBounds::new(2.0, -3.0, 3.0, -2.0));
    }

    #[test]
    fn test_boundary_belongs_to_higher_index() {
        // Exact south/west edge of every cell maps back to that cell
        for i in -50..50 {
            for j in -50..50 {
                let addr = CellAddress::new(i, j);
                let b = to_bounds(addr, TILE_DEGREES);
                assert_eq!(to_cell_address(b.south, b.west, TILE_DEGREES), addr);
                assert!(b.contains(LatLng::new(b.south, b.west)));
                assert!(!b.contains(LatLng::new(b.north, b.west)));
            }
        }
    }

    #[test]
    fn test_key_round_trip() {
        let addr = CellAddress::new(-12, 345);
        assert_eq!(addr.key(), "-12,345");
        assert_eq!("-12,345".parse::<CellAddress>(), Ok(addr));
        assert!("12".parse::<CellAddress>().is_err());
        assert!("a,b".parse::<CellAddress>().is_err());
    }

    #[test]
    fn test_chebyshev_distance() {
        let origin = CellAddress::new(0, 0);
        assert_eq!(chebyshev_distance(origin, CellAddress::new(5, 5)), 5);
        assert_eq!(chebyshev_distance(origin, CellAddress::new(-3, 1)), 3);
        assert_eq!(chebyshev_distance(origin, origin), 0);
        let far = CellAddress::new(i32::MIN, 0);
        assert_eq!(chebyshev_distance(CellAddress::new(i32::MAX, 0), far), u32::MAX);
    }

    #[test]
    fn test_cells_in_bounds() {
        let bounds = CellBounds::new(0.5, 0.5, 2.5, 1.5);
        let cells: Vec<_> = cells_in_bounds(&bounds, 1.0).collect();
        assert_eq!(cell_count(&bounds, 1.0), 6);
        assert_eq!(cells.len(), 6);
        assert_eq!(cells[0], CellAddress::new(0, 0));
        assert_eq!(cells[5], CellAddress::new(2, 1));
    }

    #[test]
    fn test_edge_aligned_bounds_skip_touching_tiles() {
        let bounds = CellBounds::new(0.0, 0.0, 2.0, 3.0);
        let cells: Vec<_> = cells_in_bounds(&bounds, 1.0).collect();
        assert_eq!(cell_count(&bounds, 1.0), 6);
        assert_eq!(cells.first(), Some(&CellAddress::new(0, 0)));
        assert_eq!(cells.last(), Some(&CellAddress::new(1, 2)));

        let negative = CellBounds::new(-2.0, -2.0, -1.0, -1.0);
        assert_eq!(
            cells_in_bounds(&negative, 1.0).collect::<Vec<_>>(),
            vec![CellAddress::new(-2, -2)]
        );

        // A zero-size viewport on an edge still covers the cell owning that edge
        let point = CellBounds::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(cell_count(&point, 1.0), 1);
    }

    #[test]
    fn test_inverted_bounds_are_empty() {
        let bounds = CellBounds::new(3.0, 0.0, 1.0, 1.0);
        assert_eq!(cell_count(&bounds, 1.0), 0);
        assert_eq!(cells_in_bounds(&bounds, 1.0).count(), 0);
    }

    proptest! {
        #[test]
        fn prop_center_recovers_address(i in -900_000i32..900_000, j in -1_800_000i32..1_800_000) {
            let addr = CellAddress::new(i, j);
            let center = to_bounds(addr, TILE_DEGREES).center();
            prop_assert_eq!(center.cell(TILE_DEGREES), addr);
        }

        #[test]
        fn prop_bounds_contain_mapped_point(lat in -90.0f64..90.0, lng in -180.0f64..180.0) {
            let addr = to_cell_address(lat, lng, TILE_DEGREES);
            prop_assert!(to_bounds(addr, TILE_DEGREES).contains(LatLng::new(lat, lng)));
        }
    }
}
