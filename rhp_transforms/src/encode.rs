// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate encoding: lat/lng columns or point geometries to cell addresses.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use geo_types::Geometry;
use rhp_core::{GridAdapter, GridError};

use crate::engine::{Rhp, address_value, resolution_column};
use crate::error::{Result, RhpError};
use crate::table::{Frame, GeoTable, Table};
use crate::value::{Value, geometry_kind};

/// Parameters for [`Rhp::geo_to_rhp`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSpec {
    /// Target resolution.
    pub resolution: u8,
    /// Latitude column of plain tables.
    pub lat_col: String,
    /// Longitude column of plain tables.
    pub lng_col: String,
    /// Whether the new address column becomes the index.
    pub set_index: bool,
}

impl EncodeSpec {
    /// Encodes at `resolution` from `lat`/`lng`, setting the index.
    pub fn new(resolution: u8) -> Self {
        Self {
            resolution,
            lat_col: "lat".to_string(),
            lng_col: "lng".to_string(),
            set_index: true,
        }
    }

    /// Sets the latitude column name.
    pub fn with_lat_col(mut self, name: impl Into<String>) -> Self {
        self.lat_col = name.into();
        self
    }

    /// Sets the longitude column name.
    pub fn with_lng_col(mut self, name: impl Into<String>) -> Self {
        self.lng_col = name.into();
        self
    }

    /// Sets whether the address column becomes the index.
    pub fn with_set_index(mut self, set_index: bool) -> Self {
        self.set_index = set_index;
        self
    }
}

impl<G: GridAdapter + ?Sized> Rhp<'_, G> {
    /// Encodes every row into a cell address stored in `rhp_{resolution:02}`.
    ///
    /// Plain frames read the lat/lng columns; geo frames read their point geometry. The whole
    /// call fails on the first row that cannot be encoded.
    pub fn geo_to_rhp(&self, frame: Frame, spec: &EncodeSpec) -> Result<Frame> {
        match frame {
            Frame::Plain(table) => Ok(Frame::Plain(self.encode_lat_lng(table, spec)?)),
            Frame::Geo(geo) => Ok(Frame::Geo(self.encode_points(geo, spec)?)),
        }
    }

    /// Encodes a plain table from its lat/lng columns.
    pub fn encode_lat_lng(&self, table: Table, spec: &EncodeSpec) -> Result<Table> {
        self.check_resolution(spec.resolution)?;
        let lat = table.require(&spec.lat_col)?;
        let lng = table.require(&spec.lng_col)?;
        let mut out = Vec::with_capacity(table.row_count());
        for (row, (lat_v, lng_v)) in lat.iter().zip(lng).enumerate() {
            let lat = coordinate(&spec.lat_col, row, lat_v)?;
            let lon = coordinate(&spec.lng_col, row, lng_v)?;
            out.push(self.encode_row(row, lon, lat, spec.resolution)?);
        }
        self.finish(table, spec, out)
    }

    /// Encodes a geo table from its point geometries.
    pub fn encode_points(&self, geo: GeoTable, spec: &EncodeSpec) -> Result<GeoTable> {
        self.check_resolution(spec.resolution)?;
        let mut out = Vec::with_capacity(geo.table().row_count());
        for (row, v) in geo.geometries().iter().enumerate() {
            let point = match v.as_geometry() {
                Some(Geometry::Point(p)) => p,
                Some(g) => {
                    return Err(RhpError::InvalidGeometry {
                        row,
                        found: geometry_kind(g),
                    });
                }
                None => {
                    return Err(RhpError::InvalidGeometry {
                        row,
                        found: v.type_name(),
                    });
                }
            };
            out.push(self.encode_row(row, point.x(), point.y(), spec.resolution)?);
        }
        geo.map_table(|table| self.finish(table, spec, out))
    }

    fn check_resolution(&self, resolution: u8) -> Result<()> {
        let max = self.grid().max_resolution();
        if resolution > max {
            return Err(GridError::ResolutionOutOfRange {
                requested: resolution,
                max,
            }
            .into());
        }
        Ok(())
    }

    fn encode_row(&self, row: usize, lon: f64, lat: f64, resolution: u8) -> Result<Value> {
        self.grid()
            .encode(lon, lat, resolution)
            .map(|cell| address_value(&cell))
            .map_err(|source| RhpError::Row { row, source })
    }

    fn finish(&self, table: Table, spec: &EncodeSpec, addresses: Vec<Value>) -> Result<Table> {
        let column = resolution_column(spec.resolution);
        tracing::debug!(rows = addresses.len(), column = %column, "encoded");
        let table = table.with_column(column.as_str(), addresses)?;
        if spec.set_index {
            table.with_index(&column)
        } else {
            Ok(table)
        }
    }
}

fn coordinate(column: &str, row: usize, v: &Value) -> Result<f64> {
    v.as_f64().ok_or_else(|| RhpError::TypeMismatch {
        column: column.to_string(),
        row,
        expected: "number",
        found: v.type_name(),
    })
}
