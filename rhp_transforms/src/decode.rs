// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Decoding cell addresses into geometries.

extern crate alloc;

use alloc::vec::Vec;

use geo_types::{Geometry, LineString, Polygon};
use rhp_core::GridAdapter;

use crate::engine::{AddressSource, Rhp, address_text};
use crate::error::Result;
use crate::table::{GEOMETRY_COLUMN, GeoTable, Table};
use crate::value::Value;

impl<G: GridAdapter + ?Sized> Rhp<'_, G> {
    /// Replaces each indexed row's geometry with its cell centroid.
    ///
    /// Strict: the first invalid address aborts with an invalid-address error.
    pub fn rhp_to_geo(&self, table: &Table) -> Result<GeoTable> {
        let out = self.map(table, &AddressSource::Index, GEOMETRY_COLUMN, |v| {
            let centroid = self.grid().decode_centroid(address_text(v)?)?;
            Ok(Value::Geometry(centroid.into()))
        })?;
        GeoTable::new(out, GEOMETRY_COLUMN)
    }

    /// Replaces each indexed row's geometry with its cell boundary polygon.
    ///
    /// Lenient: rows whose address is invalid get an empty polygon.
    pub fn rhp_to_geo_boundary(&self, table: &Table) -> Result<GeoTable> {
        let out = self.map(table, &AddressSource::Index, GEOMETRY_COLUMN, |v| {
            let ring = match address_text(v) {
                Ok(text) => self.grid().decode_boundary(text),
                Err(_) => LineString::new(Vec::new()),
            };
            Ok(Value::Geometry(boundary_polygon(ring)))
        })?;
        GeoTable::new(out, GEOMETRY_COLUMN)
    }
}

pub(crate) fn boundary_polygon(ring: LineString<f64>) -> Geometry<f64> {
    Polygon::new(ring, Vec::new()).into()
}
