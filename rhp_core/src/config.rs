// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid configuration.

use crate::CellAddress;

/// Reference ellipsoid the grid is built on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis in metres.
    pub semi_major: f64,
    /// Flattening (`0.0` for a sphere).
    pub flattening: f64,
}

impl Ellipsoid {
    /// The WGS 84 ellipsoid.
    pub const WGS84: Self = Self {
        semi_major: 6_378_137.0,
        flattening: 1.0 / 298.257_223_563,
    };

    /// A sphere of the given radius in metres.
    pub const fn sphere(radius: f64) -> Self {
        Self {
            semi_major: radius,
            flattening: 0.0,
        }
    }

    /// Returns the first eccentricity squared.
    pub fn eccentricity_squared(&self) -> f64 {
        self.flattening * (2.0 - self.flattening)
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}

/// Configuration for [`RHealpixGrid`](crate::RHealpixGrid).
///
/// The defaults match the common `WGS84_003` grid: WGS 84, both polar squares attached above and
/// below the `O` square, resolutions up to [`CellAddress::MAX_RESOLUTION`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridConfig {
    /// Ellipsoid whose authalic sphere carries the grid.
    pub ellipsoid: Ellipsoid,
    /// Equatorial square (0 = `O` .. 3 = `R`) the north polar square is attached to.
    pub north_square: u8,
    /// Equatorial square (0 = `O` .. 3 = `R`) the south polar square is attached to.
    pub south_square: u8,
    /// Deepest resolution accepted by the grid.
    pub max_resolution: u8,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            ellipsoid: Ellipsoid::WGS84,
            north_square: 0,
            south_square: 0,
            max_resolution: CellAddress::MAX_RESOLUTION,
        }
    }
}

impl GridConfig {
    /// Sets the ellipsoid.
    pub fn with_ellipsoid(mut self, ellipsoid: Ellipsoid) -> Self {
        self.ellipsoid = ellipsoid;
        self
    }

    /// Sets the north polar square position (taken modulo 4).
    pub fn with_north_square(mut self, square: u8) -> Self {
        self.north_square = square % 4;
        self
    }

    /// Sets the south polar square position (taken modulo 4).
    pub fn with_south_square(mut self, square: u8) -> Self {
        self.south_square = square % 4;
        self
    }

    /// Sets the maximum resolution (clamped to [`CellAddress::MAX_RESOLUTION`]).
    pub fn with_max_resolution(mut self, max_resolution: u8) -> Self {
        self.max_resolution = max_resolution.min(CellAddress::MAX_RESOLUTION);
        self
    }
}
