// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reference rHEALPix grid.

extern crate alloc;

use alloc::vec::Vec;
use core::f64::consts::PI;

use geo_types::{Coord, LineString, Point};
use kurbo::Vec2;
use smallvec::SmallVec;

use crate::config::GridConfig;
use crate::projection::{Projection, cell_side};
use crate::{CellAddress, GridAdapter, GridError};

/// How far past a cell edge, as a fraction of the cell side, neighbor probes are placed.
const PROBE_MARGIN: f64 = 1e-4;

/// Step past an edge point on the sphere, relative to its distance from the cell center.
const SPHERE_STEP: f64 = 1e-3;

/// An rHEALPix grid (N_side = 3) on the authalic sphere of an ellipsoid.
///
/// Cells of one resolution all have the same area. Cell boundaries are the images of the planar
/// squares' corners, listed north-west, north-east, south-east, south-west and closed.
#[derive(Clone, Copy, Debug)]
pub struct RHealpixGrid {
    config: GridConfig,
    projection: Projection,
}

impl RHealpixGrid {
    /// Creates a grid from a configuration.
    pub fn new(config: GridConfig) -> Self {
        Self {
            config,
            projection: Projection::new(&config),
        }
    }

    /// Returns the configuration of this grid.
    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    /// Radius of the authalic sphere in metres.
    pub fn authalic_radius(&self) -> f64 {
        self.projection.authalic_radius()
    }

    fn check_resolution(&self, resolution: u8) -> Result<(), GridError> {
        if resolution > self.config.max_resolution {
            return Err(GridError::ResolutionOutOfRange {
                requested: resolution,
                max: self.config.max_resolution,
            });
        }
        Ok(())
    }

    /// Finds the cell across the boundary point `edge` of a cell centered at `center`.
    ///
    /// In-plane when the probe stays inside the projected image; otherwise the step is taken on
    /// the sphere, where the polar squares and the equatorial band are glued together.
    fn probe(
        &self,
        center: kurbo::Point,
        direction: Vec2,
        side: f64,
        resolution: u8,
    ) -> CellAddress {
        let probe = center + direction * (side * (0.5 + PROBE_MARGIN));
        if let Some(p) = self.projection.in_image(probe) {
            return self.projection.cell_at(p, resolution);
        }
        let edge = center + direction * (side * 0.5);
        let vb = self.projection.to_sphere(edge);
        let vc = self.projection.to_sphere(center);
        let v = [
            vb[0] + SPHERE_STEP * (vb[0] - vc[0]),
            vb[1] + SPHERE_STEP * (vb[1] - vc[1]),
            vb[2] + SPHERE_STEP * (vb[2] - vc[2]),
        ];
        self.projection
            .cell_at(self.projection.from_sphere(v), resolution)
    }
}

impl Default for RHealpixGrid {
    fn default() -> Self {
        Self::new(GridConfig::default())
    }
}

impl GridAdapter for RHealpixGrid {
    fn max_resolution(&self) -> u8 {
        self.config.max_resolution
    }

    fn encode(&self, lon: f64, lat: f64, resolution: u8) -> Result<CellAddress, GridError> {
        self.check_resolution(resolution)?;
        if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
            return Err(GridError::InvalidCoordinate { lon, lat });
        }
        let p = self.projection.forward(lon, lat);
        Ok(self.projection.cell_at(p, resolution))
    }

    fn cell_centroid(&self, cell: &CellAddress) -> Point<f64> {
        let (lon, lat) = self.projection.inverse(self.projection.cell_rect(cell).center());
        Point::new(lon, lat)
    }

    fn cell_boundary(&self, cell: &CellAddress) -> LineString<f64> {
        let r = self.projection.cell_rect(cell);
        let corners = [
            kurbo::Point::new(r.x0, r.y1),
            kurbo::Point::new(r.x1, r.y1),
            kurbo::Point::new(r.x1, r.y0),
            kurbo::Point::new(r.x0, r.y0),
        ];
        let mut ring: Vec<Coord<f64>> = corners
            .iter()
            .map(|&p| {
                let (x, y) = self.projection.inverse(p);
                Coord { x, y }
            })
            .collect();
        ring.push(ring[0]);
        LineString::new(ring)
    }

    fn cell_neighbors(&self, cell: &CellAddress) -> SmallVec<[CellAddress; 8]> {
        let resolution = cell.resolution();
        let rect = self.projection.cell_rect(cell);
        let center = rect.center();
        let side = cell_side(resolution);
        let mut out: SmallVec<[CellAddress; 8]> = SmallVec::new();
        for (dx, dy) in [
            (0.0, 1.0),
            (1.0, 1.0),
            (1.0, 0.0),
            (1.0, -1.0),
            (0.0, -1.0),
            (-1.0, -1.0),
            (-1.0, 0.0),
            (-1.0, 1.0),
        ] {
            let n = self.probe(center, Vec2::new(dx, dy), side, resolution);
            if n != *cell && !out.contains(&n) {
                out.push(n);
            }
        }
        out
    }

    fn cell_area_m2(&self, cell: &CellAddress) -> f64 {
        let r = self.projection.authalic_radius();
        let cells = 6 * 9_u64.pow(u32::from(cell.resolution()));
        4.0 * PI * r * r / cells as f64
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::string::ToString;
    use alloc::vec;

    use hashbrown::HashSet;

    use super::*;
    use crate::{AreaUnit, BaseCell, Ellipsoid};

    fn cell(text: &str) -> CellAddress {
        CellAddress::parse(text).unwrap()
    }

    fn names(cells: &[CellAddress]) -> HashSet<std::string::String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn nearby_points_share_a_coarse_ancestor() {
        let grid = RHealpixGrid::default();
        let a = grid.encode(14.0, 50.0, 9).unwrap();
        let b = grid.encode(15.0, 51.0, 9).unwrap();
        assert_eq!(a.base(), BaseCell::N);
        assert_eq!(b.base(), BaseCell::N);
        assert_eq!(a.to_string().len(), 10);
        assert_ne!(a, b);
        assert_eq!(a.ancestor(1), b.ancestor(1));
        assert_eq!(a.ancestor(1).unwrap().to_string(), "N2");
    }

    #[test]
    fn equatorial_points_use_longitude_bands() {
        let grid = RHealpixGrid::default();
        let cases = [(-135.0, 0.0, 'O'), (-45.0, 10.0, 'P'), (45.0, -10.0, 'Q'), (135.0, 30.0, 'R')];
        for (lon, lat, base) in cases {
            let c = grid.encode(lon, lat, 0).unwrap();
            assert_eq!(c.to_string(), base.to_string(), "({lon}, {lat})");
        }
        assert_eq!(grid.encode(0.0, -89.0, 0).unwrap().to_string(), "S");
    }

    #[test]
    fn encode_rejects_bad_inputs() {
        let grid = RHealpixGrid::default();
        assert!(matches!(
            grid.encode(0.0, 91.0, 3),
            Err(GridError::InvalidCoordinate { .. })
        ));
        assert!(matches!(
            grid.encode(f64::NAN, 0.0, 3),
            Err(GridError::InvalidCoordinate { .. })
        ));
        for lon in [734.0, -180.5, f64::INFINITY] {
            assert!(
                matches!(grid.encode(lon, 10.0, 3), Err(GridError::InvalidCoordinate { .. })),
                "{lon}"
            );
        }
        assert_eq!(grid.encode(180.0, 10.0, 3), grid.encode(-180.0, 10.0, 3));
        assert!(matches!(
            grid.encode(0.0, 0.0, 16),
            Err(GridError::ResolutionOutOfRange { requested: 16, .. })
        ));
    }

    #[test]
    fn centroid_is_inside_its_own_cell() {
        let grid = RHealpixGrid::default();
        for text in ["N216055147", "Q333333", "S405383501072", "R5", "O0", "N4"] {
            let c = cell(text);
            let p = grid.cell_centroid(&c);
            let back = grid.encode(p.x(), p.y(), c.resolution()).unwrap();
            assert_eq!(back, c, "{text} -> {p:?}");
        }
    }

    #[test]
    fn boundary_is_a_closed_four_corner_ring() {
        let grid = RHealpixGrid::default();
        let ring = grid.cell_boundary(&cell("Q44"));
        assert_eq!(ring.0.len(), 5);
        assert_eq!(ring.0.first(), ring.0.last());
        let centroid = grid.cell_centroid(&cell("Q44"));
        let (min_x, max_x) = ring
            .0
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), c| (lo.min(c.x), hi.max(c.x)));
        assert!(min_x < centroid.x() && centroid.x() < max_x);
    }

    #[test]
    fn interior_cells_have_eight_neighbors() {
        let grid = RHealpixGrid::default();
        let n = grid.cell_neighbors(&cell("Q44"));
        assert_eq!(
            names(&n),
            ["Q40", "Q41", "Q42", "Q43", "Q45", "Q46", "Q47", "Q48"]
                .into_iter()
                .map(ToString::to_string)
                .collect()
        );
    }

    #[test]
    fn neighbors_cross_into_the_polar_square() {
        let grid = RHealpixGrid::default();
        let n = names(&grid.cell_neighbors(&cell("O20")));
        for expected in ["N78", "N86", "N87", "O12", "O15", "O21", "O23", "O24"] {
            assert!(n.contains(expected), "missing {expected} in {n:?}");
        }
        assert_eq!(n.len(), 8);
    }

    #[test]
    fn cube_corners_have_seven_neighbors() {
        let grid = RHealpixGrid::default();
        assert_eq!(grid.cell_neighbors(&cell("N00")).len(), 7);
        assert_eq!(grid.cell_neighbors(&cell("P00")).len(), 7);
    }

    #[test]
    fn neighbor_relation_is_symmetric() {
        let grid = RHealpixGrid::default();
        for base in BaseCell::ALL {
            for d0 in 0..9 {
                for d1 in 0..9 {
                    let c = CellAddress::new(base, &[d0, d1]).unwrap();
                    for n in grid.cell_neighbors(&c) {
                        assert!(
                            grid.cell_neighbors(&n).contains(&c),
                            "{c} -> {n} is one-way"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn rings_and_disks_nest() {
        let grid = RHealpixGrid::default();
        let origin = cell("Q4444");
        assert_eq!(grid.neighbors_within(&origin, 0), vec![origin.clone()]);
        assert_eq!(grid.ring_at(&origin, 0), vec![origin.clone()]);
        let disk1 = names(&grid.neighbors_within(&origin, 1));
        let disk2 = names(&grid.neighbors_within(&origin, 2));
        let ring2 = names(&grid.ring_at(&origin, 2));
        assert_eq!(disk1.len(), 9);
        assert_eq!(disk2.len(), 25);
        assert_eq!(ring2.len(), 16);
        assert!(disk2.is_superset(&disk1));
        assert!(disk2.is_superset(&ring2));
        assert!(ring2.is_disjoint(&disk1));
    }

    #[test]
    fn ring_past_the_whole_grid_is_empty() {
        let grid = RHealpixGrid::default();
        let n = cell("N");
        assert_eq!(grid.neighbors_within(&n, 5).len(), 6);
        assert!(grid.ring_at(&n, 3).is_empty());
    }

    #[test]
    fn cell_areas_partition_the_ellipsoid() {
        let grid = RHealpixGrid::default();
        let r = grid.authalic_radius();
        let total: f64 = grid
            .base_cells()
            .iter()
            .map(|c| grid.cell_area_m2(c))
            .sum();
        assert!((total - 4.0 * PI * r * r).abs() < 1.0);
        let km2 = grid.area(&cell("N21"), AreaUnit::SquareKilometres);
        let m2 = grid.area(&cell("N21"), AreaUnit::SquareMetres);
        assert!((m2 * 1e-6 - km2).abs() < 1e-6);
    }

    #[test]
    fn sphere_grid_uses_the_sphere_radius() {
        let grid = RHealpixGrid::new(GridConfig::default().with_ellipsoid(Ellipsoid::sphere(1.0)));
        assert!((grid.authalic_radius() - 1.0).abs() < 1e-15);
        let c = grid.encode(10.0, 20.0, 5).unwrap();
        let p = grid.cell_centroid(&c);
        assert_eq!(grid.encode(p.x(), p.y(), 5).unwrap(), c);
    }

    #[test]
    fn polar_square_position_is_configurable() {
        let grid = RHealpixGrid::new(GridConfig::default().with_north_square(2));
        let c = grid.encode(14.0, 50.0, 6).unwrap();
        assert_eq!(c.base(), BaseCell::N);
        let p = grid.cell_centroid(&c);
        assert!((p.x() - 14.0).abs() < 1.0 && (p.y() - 50.0).abs() < 1.0, "{p:?}");
    }
}
