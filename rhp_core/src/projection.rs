// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The rHEALPix projection (N_side = 3) on the authalic sphere.
//!
//! Planar coordinates are expressed for a unit sphere: the equatorial band spans
//! `x in [-pi, pi)`, `|y| <= pi/4`, and the polar squares sit above and below one of the four
//! equatorial squares, each square being `pi/2` wide.
//!
//! Forward mapping goes geodetic latitude -> authalic latitude -> HEALPix -> rHEALPix (the
//! polar triangles of HEALPix are rotated into a single square per pole).

use core::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use kurbo::{Point, Rect, Vec2};

use crate::config::GridConfig;
use crate::{BaseCell, CellAddress};

#[cfg(not(feature = "std"))]
use crate::float::FloatExt;

/// Width of a resolution-0 square in planar units.
pub(crate) const BASE_SIDE: f64 = FRAC_PI_2;

/// A unit vector on the authalic sphere.
pub(crate) type SphereVec = [f64; 3];

#[derive(Clone, Copy, Debug)]
pub(crate) struct Projection {
    e2: f64,
    e: f64,
    qp: f64,
    /// Authalic radius in metres.
    radius: f64,
    north_square: u8,
    south_square: u8,
}

impl Projection {
    pub(crate) fn new(config: &GridConfig) -> Self {
        let e2 = config.ellipsoid.eccentricity_squared();
        let e = e2.sqrt();
        let qp = if e2 > 0.0 {
            1.0 - (1.0 - e2) / (2.0 * e) * ((1.0 - e) / (1.0 + e)).ln()
        } else {
            2.0
        };
        Self {
            e2,
            e,
            qp,
            radius: config.ellipsoid.semi_major * (qp / 2.0).sqrt(),
            north_square: config.north_square % 4,
            south_square: config.south_square % 4,
        }
    }

    /// Radius of the sphere with the same surface area as the ellipsoid.
    pub(crate) fn authalic_radius(&self) -> f64 {
        self.radius
    }

    fn q(&self, phi: f64) -> f64 {
        let s = phi.sin();
        let es = self.e * s;
        (1.0 - self.e2) * (s / (1.0 - es * es) - 1.0 / (2.0 * self.e) * ((1.0 - es) / (1.0 + es)).ln())
    }

    /// Geodetic latitude to authalic latitude (radians).
    pub(crate) fn authalic(&self, phi: f64) -> f64 {
        if self.e2 == 0.0 {
            return phi;
        }
        (self.q(phi) / self.qp).clamp(-1.0, 1.0).asin()
    }

    /// Authalic latitude to geodetic latitude (radians).
    ///
    /// Series start refined with two Newton steps on `q`.
    pub(crate) fn geodetic(&self, beta: f64) -> f64 {
        if self.e2 == 0.0 {
            return beta;
        }
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;
        let mut phi = beta
            + (e2 / 3.0 + 31.0 * e4 / 180.0 + 517.0 * e6 / 5040.0) * (2.0 * beta).sin()
            + (23.0 * e4 / 360.0 + 251.0 * e6 / 3780.0) * (4.0 * beta).sin()
            + (761.0 * e6 / 45360.0) * (6.0 * beta).sin();
        let target = self.qp * beta.sin();
        for _ in 0..2 {
            let (s, c) = (phi.sin(), phi.cos());
            if c.abs() < 1e-12 {
                break;
            }
            let w = 1.0 - e2 * s * s;
            let es = self.e * s;
            phi += w * w / (2.0 * c)
                * (target / (1.0 - e2) - s / w
                    + 1.0 / (2.0 * self.e) * ((1.0 - es) / (1.0 + es)).ln());
        }
        phi
    }

    /// Projects geographic degrees into the rHEALPix plane.
    pub(crate) fn forward(&self, lon: f64, lat: f64) -> Point {
        let lam = wrap_longitude(lon.to_radians());
        let beta = self.authalic(lat.to_radians());
        self.combine(healpix(lam, beta))
    }

    /// Maps a planar point back to geographic degrees `(lon, lat)`.
    pub(crate) fn inverse(&self, p: Point) -> (f64, f64) {
        let (lam, beta) = healpix_inverse(self.split(p));
        (lam.to_degrees(), self.geodetic(beta).to_degrees())
    }

    /// Maps a planar point onto the authalic unit sphere.
    pub(crate) fn to_sphere(&self, p: Point) -> SphereVec {
        let (lam, beta) = healpix_inverse(self.split(p));
        let cb = beta.cos();
        [cb * lam.cos(), cb * lam.sin(), beta.sin()]
    }

    /// Projects a (not necessarily normalized) sphere vector into the plane.
    pub(crate) fn from_sphere(&self, v: SphereVec) -> Point {
        let norm = (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt();
        let lam = v[1].atan2(v[0]);
        let beta = (v[2] / norm).clamp(-1.0, 1.0).asin();
        self.combine(healpix(lam, beta))
    }

    fn polar_center(square: u8, north: bool) -> Point {
        let y = if north { FRAC_PI_2 } else { -FRAC_PI_2 };
        Point::new(cap_center_x(square), y)
    }

    /// Moves HEALPix polar triangles into the rHEALPix polar squares.
    fn combine(&self, p: Point) -> Point {
        if p.y.abs() <= FRAC_PI_4 {
            return p;
        }
        let north = p.y > 0.0;
        let cap = cap_index(p.x);
        let square = if north {
            self.north_square
        } else {
            self.south_square
        };
        let apex = Self::polar_center(cap, north);
        let k = (cap + 4 - square) % 4;
        let turns = if north { k } else { (4 - k) % 4 };
        Self::polar_center(square, north) + rotate_quarter_turns(p - apex, turns)
    }

    /// Inverse of [`Self::combine`]: moves points of a polar square back into HEALPix caps.
    fn split(&self, p: Point) -> Point {
        if p.y.abs() <= FRAC_PI_4 {
            return p;
        }
        let north = p.y > 0.0;
        let square = if north {
            self.north_square
        } else {
            self.south_square
        };
        let center = Self::polar_center(square, north);
        let d = p - center;
        // Triangle of the square holding `p`, counted from the one touching the equator.
        let k = if north {
            if d.y <= -d.x.abs() {
                0
            } else if d.x >= d.y.abs() {
                1
            } else if d.y >= d.x.abs() {
                2
            } else {
                3
            }
        } else if d.y >= d.x.abs() {
            0
        } else if d.x >= d.y.abs() {
            1
        } else if d.y <= -d.x.abs() {
            2
        } else {
            3
        };
        let turns = if north { (4 - k) % 4 } else { k };
        let cap = (square + k) % 4;
        Self::polar_center(cap, north) + rotate_quarter_turns(d, turns)
    }

    /// Planar square of a base cell.
    pub(crate) fn base_square(&self, base: BaseCell) -> Rect {
        let (x0, y0) = match base {
            BaseCell::N => (square_x0(self.north_square), FRAC_PI_4),
            BaseCell::O => (square_x0(0), -FRAC_PI_4),
            BaseCell::P => (square_x0(1), -FRAC_PI_4),
            BaseCell::Q => (square_x0(2), -FRAC_PI_4),
            BaseCell::R => (square_x0(3), -FRAC_PI_4),
            BaseCell::S => (square_x0(self.south_square), -3.0 * FRAC_PI_4),
        };
        Rect::new(x0, y0, x0 + BASE_SIDE, y0 + BASE_SIDE)
    }

    /// Returns the point itself (longitude-wrapped on the equatorial band) if it lies inside
    /// the projected image of the sphere.
    pub(crate) fn in_image(&self, p: Point) -> Option<Point> {
        if p.y.abs() <= FRAC_PI_4 {
            let mut x = p.x;
            if x >= PI {
                x -= 2.0 * PI;
            } else if x < -PI {
                x += 2.0 * PI;
            }
            return Some(Point::new(x, p.y));
        }
        let base = if p.y > 0.0 { BaseCell::N } else { BaseCell::S };
        let square = self.base_square(base);
        (p.x >= square.x0 && p.x <= square.x1 && p.y >= square.y0 && p.y <= square.y1).then_some(p)
    }

    fn base_at(&self, p: Point) -> BaseCell {
        if p.y > FRAC_PI_4 {
            return BaseCell::N;
        }
        if p.y < -FRAC_PI_4 {
            return BaseCell::S;
        }
        #[allow(clippy::cast_possible_truncation, reason = "clamped to 0..=3")]
        let idx = ((p.x + PI) / BASE_SIDE).floor().clamp(0.0, 3.0) as usize;
        BaseCell::EQUATORIAL[idx]
    }

    /// Returns the cell at `resolution` containing a planar point of the image.
    pub(crate) fn cell_at(&self, p: Point, resolution: u8) -> CellAddress {
        let base = self.base_at(p);
        let square = self.base_square(base);
        let n = cells_per_side(resolution);
        let scale = n as f64 / BASE_SIDE;
        let col = grid_index((p.x - square.x0) * scale, n);
        let row = grid_index((square.y1 - p.y) * scale, n);
        CellAddress::from_grid_position(base, resolution, col, row)
    }

    /// Planar square of a cell.
    pub(crate) fn cell_rect(&self, cell: &CellAddress) -> Rect {
        let square = self.base_square(cell.base());
        let side = cell_side(cell.resolution());
        let (col, row) = cell.grid_position();
        let x0 = square.x0 + col as f64 * side;
        let y1 = square.y1 - row as f64 * side;
        Rect::new(x0, y1 - side, x0 + side, y1)
    }
}

/// Number of cells along one side of a base square at `resolution`.
pub(crate) fn cells_per_side(resolution: u8) -> u64 {
    3_u64.pow(u32::from(resolution))
}

/// Planar side length of a cell at `resolution`.
pub(crate) fn cell_side(resolution: u8) -> f64 {
    BASE_SIDE / cells_per_side(resolution) as f64
}

fn grid_index(v: f64, n: u64) -> u64 {
    if v <= 0.0 {
        return 0;
    }
    #[allow(clippy::cast_possible_truncation, reason = "non-negative and clamped below")]
    let i = v.floor() as u64;
    i.min(n - 1)
}

fn square_x0(square: u8) -> f64 {
    -PI + f64::from(square) * BASE_SIDE
}

fn cap_center_x(cap: u8) -> f64 {
    -3.0 * FRAC_PI_4 + f64::from(cap) * FRAC_PI_2
}

fn cap_index(x: f64) -> u8 {
    #[allow(clippy::cast_possible_truncation, reason = "clamped to 0..=3")]
    let cap = (2.0 * x / PI + 2.0).floor().clamp(0.0, 3.0) as u8;
    cap
}

fn wrap_longitude(lam: f64) -> f64 {
    if (-PI..PI).contains(&lam) {
        return lam;
    }
    let wrapped = (lam + PI) - 2.0 * PI * ((lam + PI) / (2.0 * PI)).floor() - PI;
    if wrapped >= PI { wrapped - 2.0 * PI } else { wrapped }
}

/// Counter-clockwise rotation by `turns` quarter turns.
fn rotate_quarter_turns(v: Vec2, turns: u8) -> Vec2 {
    match turns % 4 {
        0 => v,
        1 => Vec2::new(-v.y, v.x),
        2 => Vec2::new(-v.x, -v.y),
        _ => Vec2::new(v.y, -v.x),
    }
}

/// HEALPix projection of the unit sphere.
fn healpix(lam: f64, beta: f64) -> Point {
    let phi0 = (2.0_f64 / 3.0).asin();
    if beta.abs() <= phi0 {
        return Point::new(lam, 3.0 * PI / 8.0 * beta.sin());
    }
    let sigma = (3.0 * (1.0 - beta.sin().abs())).sqrt();
    let lam_c = cap_center_x(cap_index(lam));
    Point::new(
        lam_c + (lam - lam_c) * sigma,
        (FRAC_PI_4 * (2.0 - sigma)).copysign(beta),
    )
}

fn healpix_inverse(p: Point) -> (f64, f64) {
    if p.y.abs() <= FRAC_PI_4 {
        return (p.x, (8.0 * p.y / (3.0 * PI)).clamp(-1.0, 1.0).asin());
    }
    if p.y.abs() >= FRAC_PI_2 {
        return (-PI, FRAC_PI_2.copysign(p.y));
    }
    let x_c = cap_center_x(cap_index(p.x));
    let tau = 2.0 - 4.0 * p.y.abs() / PI;
    let lam = x_c + (p.x - x_c) / tau;
    let beta = (1.0 - tau * tau / 3.0).clamp(-1.0, 1.0).asin().copysign(p.y);
    (lam, beta)
}
