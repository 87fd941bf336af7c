// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The grid adapter contract.
//!
//! Everything above this trait (table transforms, aggregation) only needs a handful of pure
//! functions over [`CellAddress`]es. Implementors provide the geometric primitives; the
//! address-text entry points and the hierarchy/neighborhood helpers are provided on top.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use core::ops::ControlFlow;

use geo_types::{LineString, Point};
use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::{BaseCell, CellAddress, GridError};

/// Unit for cell areas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AreaUnit {
    /// Square kilometres.
    #[default]
    SquareKilometres,
    /// Square metres.
    SquareMetres,
}

impl AreaUnit {
    /// Multiplicative factor from square metres into this unit.
    pub fn factor_from_square_metres(self) -> f64 {
        match self {
            Self::SquareKilometres => 1e-6,
            Self::SquareMetres => 1.0,
        }
    }

    /// Parses `"km^2"` or `"m^2"`.
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "km^2" | "km2" => Some(Self::SquareKilometres),
            "m^2" | "m2" => Some(Self::SquareMetres),
            _ => None,
        }
    }

    /// Returns the canonical textual name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::SquareKilometres => "km^2",
            Self::SquareMetres => "m^2",
        }
    }
}

/// A hierarchical discrete global grid addressed by [`CellAddress`].
///
/// All methods are pure: the same inputs always produce the same outputs and no state is shared
/// between calls.
pub trait GridAdapter {
    /// Deepest resolution this grid accepts.
    fn max_resolution(&self) -> u8 {
        CellAddress::MAX_RESOLUTION
    }

    /// Returns the cell at `resolution` containing a geographic coordinate (degrees).
    fn encode(&self, lon: f64, lat: f64, resolution: u8) -> Result<CellAddress, GridError>;

    /// Returns the center of a cell as `(lon, lat)` degrees.
    fn cell_centroid(&self, cell: &CellAddress) -> Point<f64>;

    /// Returns the closed boundary ring of a cell in `(lon, lat)` degrees.
    fn cell_boundary(&self, cell: &CellAddress) -> LineString<f64>;

    /// Returns the distinct cells one hop away (sharing an edge or a corner), excluding `cell`.
    ///
    /// The relation must be symmetric: `b` is a neighbor of `a` exactly when `a` is one of `b`.
    fn cell_neighbors(&self, cell: &CellAddress) -> SmallVec<[CellAddress; 8]>;

    /// Returns the area of a cell in square metres.
    fn cell_area_m2(&self, cell: &CellAddress) -> f64;

    /// Parses address text and checks it against [`Self::max_resolution`].
    fn parse(&self, address: &str) -> Result<CellAddress, GridError> {
        let cell = CellAddress::parse(address)?;
        if cell.resolution() > self.max_resolution() {
            return Err(GridError::invalid_address(address));
        }
        Ok(cell)
    }

    /// Returns `true` if `address` names a cell of this grid. Never fails.
    fn is_valid(&self, address: &str) -> bool {
        self.parse(address).is_ok()
    }

    /// Returns the resolution of an address.
    fn resolution_of(&self, address: &str) -> Result<u8, GridError> {
        Ok(self.parse(address)?.resolution())
    }

    /// Returns the resolution-0 ancestor of an address.
    fn base_cell_of(&self, address: &str) -> Result<CellAddress, GridError> {
        Ok(CellAddress::base_cell(self.parse(address)?.base()))
    }

    /// Decodes an address into its center point; fails on invalid addresses.
    fn decode_centroid(&self, address: &str) -> Result<Point<f64>, GridError> {
        Ok(self.cell_centroid(&self.parse(address)?))
    }

    /// Decodes an address into its boundary ring; invalid addresses give an empty ring.
    fn decode_boundary(&self, address: &str) -> LineString<f64> {
        match self.parse(address) {
            Ok(cell) => self.cell_boundary(&cell),
            Err(_) => LineString::new(Vec::new()),
        }
    }

    /// Returns the ancestor of `cell` at `resolution`, or the direct parent when `None`.
    ///
    /// The ancestor at the cell's own resolution is the cell itself. Asking for a finer
    /// resolution, or for the parent of a base cell, fails.
    fn parent(&self, cell: &CellAddress, resolution: Option<u8>) -> Result<CellAddress, GridError> {
        let actual = cell.resolution();
        let requested = match resolution {
            Some(r) => r,
            None => actual.checked_sub(1).ok_or_else(|| incompatible(cell, actual, 0))?,
        };
        cell.ancestor(requested)
            .ok_or_else(|| incompatible(cell, actual, requested))
    }

    /// Returns the center descendant of `cell` at `resolution`, or one level down when `None`.
    ///
    /// Returns `None` when the requested resolution is coarser than the cell or deeper than
    /// [`Self::max_resolution`].
    fn center_child(&self, cell: &CellAddress, resolution: Option<u8>) -> Option<CellAddress> {
        let requested = match resolution {
            Some(r) => r,
            None => cell.resolution().checked_add(1)?,
        };
        if requested > self.max_resolution() {
            return None;
        }
        cell.center_child(requested)
    }

    /// Returns every cell within `k` hops of `cell`, `cell` first, in discovery order.
    fn neighbors_within(&self, cell: &CellAddress, k: u32) -> Vec<CellAddress> {
        let mut out = Vec::new();
        let _ = walk_layers(self, cell, k, |layer| {
            out.extend_from_slice(layer);
            ControlFlow::Continue(())
        });
        out
    }

    /// Like [`Self::neighbors_within`], but gives up as soon as more than `limit` cells are found.
    ///
    /// Returns `None` when the disk holds more than `limit` cells.
    fn neighbors_within_limited(
        &self,
        cell: &CellAddress,
        k: u32,
        limit: usize,
    ) -> Option<Vec<CellAddress>> {
        let mut out = Vec::new();
        let walk = walk_layers(self, cell, k, |layer| {
            if out.len() + layer.len() > limit {
                return ControlFlow::Break(());
            }
            out.extend_from_slice(layer);
            ControlFlow::Continue(())
        });
        walk.is_continue().then_some(out)
    }

    /// Returns the cells exactly `k` hops away from `cell` (`[cell]` for `k = 0`).
    ///
    /// Empty when the whole grid is exhausted in fewer than `k` hops.
    fn ring_at(&self, cell: &CellAddress, k: u32) -> Vec<CellAddress> {
        match walk_layers(self, cell, k, |_| ControlFlow::Continue(())) {
            ControlFlow::Continue((hops, layer)) if hops == k => layer,
            _ => Vec::new(),
        }
    }

    /// Returns the area of a cell in `unit`.
    fn area(&self, cell: &CellAddress, unit: AreaUnit) -> f64 {
        self.cell_area_m2(cell) * unit.factor_from_square_metres()
    }

    /// Returns the six resolution-0 cells.
    fn base_cells(&self) -> [CellAddress; 6] {
        BaseCell::ALL.map(CellAddress::base_cell)
    }
}

fn incompatible(cell: &CellAddress, actual: u8, requested: u8) -> GridError {
    GridError::IncompatibleResolution {
        address: alloc::string::ToString::to_string(cell),
        actual,
        requested,
    }
}

/// Breadth-first walk around `origin`, handing each hop layer to `visit` (layer 0 is `[origin]`).
///
/// Returns the last layer reached and its hop distance. Stops after `k` hops, once the whole
/// grid has been visited, or when `visit` breaks. Only the two most recent layers are kept: a
/// neighbor of a cell `i` hops out is `i - 1`, `i` or `i + 1` hops out.
fn walk_layers<G: GridAdapter + ?Sized>(
    grid: &G,
    origin: &CellAddress,
    k: u32,
    mut visit: impl FnMut(&[CellAddress]) -> ControlFlow<()>,
) -> ControlFlow<(), (u32, Vec<CellAddress>)> {
    let mut previous: HashSet<CellAddress> = HashSet::new();
    let mut current = vec![origin.clone()];
    visit(&current)?;
    let mut hops = 0;
    while hops < k {
        let inner: HashSet<CellAddress> = current.iter().cloned().collect();
        let mut found: HashSet<CellAddress> = HashSet::new();
        let mut next = Vec::new();
        for cell in &current {
            for n in grid.cell_neighbors(cell) {
                if !previous.contains(&n) && !inner.contains(&n) && found.insert(n.clone()) {
                    next.push(n);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        visit(&next)?;
        previous = inner;
        current = next;
        hops += 1;
    }
    ControlFlow::Continue((hops, current))
}

#[cfg(test)]
mod tests {
    extern crate std;

    use core::cell::Cell;

    use super::*;
    use crate::RHealpixGrid;

    /// Counts neighbor lookups on the reference grid.
    struct Counting {
        grid: RHealpixGrid,
        lookups: Cell<usize>,
    }

    impl GridAdapter for Counting {
        fn encode(&self, lon: f64, lat: f64, resolution: u8) -> Result<CellAddress, GridError> {
            self.grid.encode(lon, lat, resolution)
        }

        fn cell_centroid(&self, cell: &CellAddress) -> Point<f64> {
            self.grid.cell_centroid(cell)
        }

        fn cell_boundary(&self, cell: &CellAddress) -> LineString<f64> {
            self.grid.cell_boundary(cell)
        }

        fn cell_neighbors(&self, cell: &CellAddress) -> SmallVec<[CellAddress; 8]> {
            self.lookups.set(self.lookups.get() + 1);
            self.grid.cell_neighbors(cell)
        }

        fn cell_area_m2(&self, cell: &CellAddress) -> f64 {
            self.grid.cell_area_m2(cell)
        }
    }

    fn counting() -> Counting {
        Counting {
            grid: RHealpixGrid::default(),
            lookups: Cell::new(0),
        }
    }

    #[test]
    fn area_unit_names() {
        for unit in [AreaUnit::SquareKilometres, AreaUnit::SquareMetres] {
            assert_eq!(AreaUnit::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(AreaUnit::parse("m2"), Some(AreaUnit::SquareMetres));
        assert_eq!(AreaUnit::parse("acres"), None);
    }

    #[test]
    fn decode_entry_points() {
        let grid = RHealpixGrid::default();
        let p = grid.decode_centroid("N216055147").unwrap();
        assert!((p.x() - 14.0).abs() < 0.01 && (p.y() - 50.0).abs() < 0.01, "{p:?}");
        assert!(matches!(
            grid.decode_centroid("N21605514X"),
            Err(GridError::InvalidAddress(_))
        ));
        assert!(grid.decode_boundary("N9").0.is_empty());
    }

    #[test]
    fn limited_disk_matches_the_full_disk_when_it_fits() {
        let grid = RHealpixGrid::default();
        let origin = CellAddress::parse("Q4444").unwrap();
        let full = grid.neighbors_within(&origin, 2);
        assert_eq!(full.len(), 25);
        assert_eq!(grid.neighbors_within_limited(&origin, 2, 25), Some(full));
        assert_eq!(grid.neighbors_within_limited(&origin, 2, 24), None);
    }

    #[test]
    fn limited_disk_stops_walking_early() {
        let grid = counting();
        let origin = CellAddress::parse("N216055147120").unwrap();
        assert_eq!(grid.neighbors_within_limited(&origin, 150, 10), None);
        // The origin and its first ring are expanded, nothing further.
        assert!(grid.lookups.get() <= 9, "{} lookups", grid.lookups.get());
    }

    #[test]
    fn rings_skip_cells_already_reached() {
        let grid = RHealpixGrid::default();
        let origin = CellAddress::parse("O20").unwrap();
        let disk = grid.neighbors_within(&origin, 4);
        let mut rings: Vec<CellAddress> = (0..=4).flat_map(|k| grid.ring_at(&origin, k)).collect();
        assert_eq!(rings.len(), disk.len());
        let mut disk = disk;
        disk.sort_unstable();
        rings.sort_unstable();
        assert_eq!(rings, disk);
    }
}
