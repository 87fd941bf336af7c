// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ancestor aggregation.
//!
//! Rows are grouped by their ancestor at a coarser resolution and every numeric column is summed
//! per group. The result has one row per ancestor, sorted by address, keyed by
//! `rhp_{resolution:02}`.

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use hashbrown::HashMap;
use rhp_core::{CellAddress, GridAdapter};

use crate::decode::boundary_polygon;
use crate::encode::EncodeSpec;
use crate::engine::{Rhp, address_value, resolution_column};
use crate::error::{Result, RhpError};
use crate::table::{Column, Frame, GeoTable, Table};
use crate::value::Value;

/// Parameters for [`Rhp::aggregate_by_ancestor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSpec {
    /// Resolution of the grouping ancestor.
    pub resolution: u8,
    /// Whether to attach each ancestor's boundary polygon.
    pub return_geometry: bool,
}

impl AggregateSpec {
    /// Aggregates at `resolution`, returning geometry.
    pub fn new(resolution: u8) -> Self {
        Self {
            resolution,
            return_geometry: true,
        }
    }

    /// Sets whether boundary polygons are attached.
    pub fn with_return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }
}

/// Parameters for [`Rhp::geo_to_rhp_aggregate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeAggregateSpec {
    /// Resolution of the grouping ancestor.
    pub resolution: u8,
    /// Resolution points are first encoded at.
    pub fine_resolution: u8,
    /// Latitude column of plain tables.
    pub lat_col: String,
    /// Longitude column of plain tables.
    pub lng_col: String,
    /// Whether to attach each ancestor's boundary polygon.
    pub return_geometry: bool,
}

impl EncodeAggregateSpec {
    /// Encodes at resolution 15 from `lat`/`lng` and aggregates at `resolution`, returning
    /// geometry.
    pub fn new(resolution: u8) -> Self {
        let encode = EncodeSpec::new(CellAddress::MAX_RESOLUTION);
        Self {
            resolution,
            fine_resolution: encode.resolution,
            lat_col: encode.lat_col,
            lng_col: encode.lng_col,
            return_geometry: true,
        }
    }

    /// Sets the intermediate encoding resolution.
    pub fn with_fine_resolution(mut self, fine_resolution: u8) -> Self {
        self.fine_resolution = fine_resolution;
        self
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

    /// Sets whether boundary polygons are attached.
    pub fn with_return_geometry(mut self, return_geometry: bool) -> Self {
        self.return_geometry = return_geometry;
        self
    }
}

/// How one numeric column is totalled.
#[derive(Debug, Clone, Copy)]
enum Sum {
    Int,
    Float,
}

impl Sum {
    /// Totals one group's values, skipping nulls and NaN.
    ///
    /// Integers are added exactly and saturate only at the end. Floats are added in ascending
    /// order, so the total is the same for any row order.
    fn total<'a>(self, values: impl Iterator<Item = &'a Value>) -> Value {
        match self {
            Self::Int => {
                let total: i128 = values
                    .filter_map(|v| match v {
                        Value::Int(x) => Some(i128::from(*x)),
                        _ => None,
                    })
                    .sum();
                let saturated = if total < 0 { i64::MIN } else { i64::MAX };
                Value::Int(i64::try_from(total).unwrap_or(saturated))
            }
            Self::Float => {
                let mut terms: Vec<f64> = values
                    .filter_map(Value::as_f64)
                    .filter(|x| !x.is_nan())
                    .collect();
                terms.sort_unstable_by(f64::total_cmp);
                Value::Float(terms.iter().fold(0.0, |acc, x| acc + x))
            }
        }
    }
}

/// A column is summed when it holds numbers and nothing but numbers or nulls.
fn summable(values: &[Value]) -> Option<Sum> {
    let mut kind = None;
    for v in values {
        match v {
            Value::Null => {}
            Value::Int(_) => {
                kind.get_or_insert(Sum::Int);
            }
            Value::Float(_) => kind = Some(Sum::Float),
            _ => return None,
        }
    }
    kind
}

impl<G: GridAdapter + ?Sized> Rhp<'_, G> {
    /// Groups indexed rows by their ancestor at `spec.resolution` and sums numeric columns.
    ///
    /// Non-numeric columns and the source index are dropped. Integer columns stay integer
    /// (saturating), columns with any float become float; nulls and NaN are skipped. Sums do
    /// not depend on row order. Fails on
    /// the first row whose ancestor cannot be computed, and on a table with no rows.
    pub fn aggregate_by_ancestor(&self, table: &Table, spec: &AggregateSpec) -> Result<Frame> {
        let resolution = spec.resolution;
        let addresses = table.index_values()?;

        let mut groups: HashMap<CellAddress, Vec<usize>> = HashMap::new();
        for (row, v) in addresses.iter().enumerate() {
            let ancestor = self
                .cell(v)
                .and_then(|cell| self.grid().parent(&cell, Some(resolution)))
                .map_err(|source| RhpError::Row { row, source })?;
            groups.entry(ancestor).or_default().push(row);
        }
        if groups.is_empty() {
            return Err(RhpError::EmptyGroup { resolution });
        }
        let mut groups: Vec<(CellAddress, Vec<usize>)> = groups.into_iter().collect();
        groups.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        let key = resolution_column(resolution);
        let index_name = table.index_name().unwrap_or_default();
        let mut columns = Vec::new();
        columns.push(Column::new(
            key.as_str(),
            groups.iter().map(|(cell, _)| address_value(cell)).collect(),
        ));
        for c in table.columns() {
            if c.name == index_name || c.name == key {
                continue;
            }
            let Some(sum) = summable(&c.values) else {
                continue;
            };
            let sums = groups
                .iter()
                .map(|(_, rows)| sum.total(rows.iter().map(|&r| &c.values[r])))
                .collect();
            columns.push(Column::new(c.name.as_str(), sums));
        }
        for (cell, rows) in &groups {
            tracing::trace!(ancestor = %cell, rows = rows.len(), "group");
        }
        tracing::debug!(
            rows_in = addresses.len(),
            groups = groups.len(),
            columns = columns.len() - 1,
            resolution,
            "aggregate_by_ancestor"
        );

        let out = Table::from_columns(columns)?.with_index(&key)?;
        if spec.return_geometry {
            let polygons = groups
                .iter()
                .map(|(cell, _)| boundary_polygon(self.grid().cell_boundary(cell)))
                .collect();
            Ok(Frame::Geo(GeoTable::from_geometries(out, polygons)?))
        } else {
            Ok(Frame::Plain(out))
        }
    }

    /// Shorthand for [`Self::aggregate_by_ancestor`] with positional arguments.
    pub fn rhp_to_parent_aggregate(
        &self,
        table: &Table,
        resolution: u8,
        return_geometry: bool,
    ) -> Result<Frame> {
        let spec = AggregateSpec::new(resolution).with_return_geometry(return_geometry);
        self.aggregate_by_ancestor(table, &spec)
    }

    /// Encodes points at `spec.fine_resolution`, then aggregates at `spec.resolution`.
    ///
    /// The coordinate columns (or the geometry column) are dropped before aggregation.
    pub fn geo_to_rhp_aggregate(&self, frame: Frame, spec: &EncodeAggregateSpec) -> Result<Frame> {
        if spec.fine_resolution < spec.resolution {
            return Err(RhpError::FineResolutionTooCoarse {
                resolution: spec.resolution,
                fine: spec.fine_resolution,
            });
        }
        let encode = EncodeSpec::new(spec.fine_resolution)
            .with_lat_col(spec.lat_col.as_str())
            .with_lng_col(spec.lng_col.as_str());
        let encoded = match frame {
            Frame::Plain(table) => {
                let table = self.encode_lat_lng(table, &encode)?;
                table.without_columns(&[spec.lat_col.as_str(), spec.lng_col.as_str()])
            }
            Frame::Geo(geo) => {
                let geo = self.encode_points(geo, &encode)?;
                let geometry = String::from(geo.geometry_column());
                geo.into_table().without_columns(&[geometry.as_str()])
            }
        };
        let aggregate =
            AggregateSpec::new(spec.resolution).with_return_geometry(spec.return_geometry);
        self.aggregate_by_ancestor(&encoded, &aggregate)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use geo_types::{Geometry, Point};
    use rhp_core::RHealpixGrid;

    use super::*;
    use crate::error::ErrorKind;

    fn indexed(cells: &[&str], values: Vec<Value>) -> Table {
        let cells = cells.iter().map(|&c| Value::from(c)).collect();
        Table::from_columns(vec![
            Column::new("cell", cells),
            Column::new("val", values),
            Column::new("name", vec![Value::from("x"); 4]),
        ])
        .unwrap()
        .with_index("cell")
        .unwrap()
    }

    #[test]
    fn sums_per_ancestor_sorted_by_address() {
        let grid = RHealpixGrid::default();
        let t = indexed(
            &["P123", "N456", "P100", "N4"],
            vec![1_i64.into(), 2_i64.into(), 3_i64.into(), Value::Null],
        );
        let spec = AggregateSpec::new(1).with_return_geometry(false);
        let Frame::Plain(out) = Rhp::new(&grid).aggregate_by_ancestor(&t, &spec).unwrap() else {
            panic!("expected a plain table");
        };
        assert_eq!(out.index_name(), Some("rhp_01"));
        assert_eq!(
            out.column("rhp_01").unwrap(),
            [Value::from("N4"), Value::from("P1")]
        );
        assert_eq!(out.column("val").unwrap(), [Value::Int(2), Value::Int(4)]);
        assert!(out.column("name").is_none());
        assert!(out.column("cell").is_none());
        assert_eq!(out.row_keys, [0, 1]);
    }

    #[test]
    fn floats_widen_and_nan_is_skipped() {
        let grid = RHealpixGrid::default();
        let t = indexed(
            &["Q1", "Q2", "Q3", "R0"],
            vec![1_i64.into(), 0.5.into(), f64::NAN.into(), 2_i64.into()],
        );
        let spec = AggregateSpec::new(0).with_return_geometry(false);
        let out = Rhp::new(&grid).aggregate_by_ancestor(&t, &spec).unwrap();
        assert_eq!(
            out.table().column("val").unwrap(),
            [Value::Float(1.5), Value::Float(2.0)]
        );
    }

    #[test]
    fn geometry_is_the_ancestor_boundary() {
        let grid = RHealpixGrid::default();
        let t = indexed(
            &["O11", "O12", "O13", "O14"],
            vec![1_i64.into(); 4],
        );
        let out = Rhp::new(&grid)
            .aggregate_by_ancestor(&t, &AggregateSpec::new(1))
            .unwrap();
        let geo = out.as_geo().unwrap();
        assert_eq!(geo.table().row_count(), 1);
        let Value::Geometry(Geometry::Polygon(poly)) = &geo.geometries()[0] else {
            panic!("expected a polygon");
        };
        let expected = grid.cell_boundary(&CellAddress::parse("O1").unwrap());
        assert_eq!(poly.exterior(), &expected);
    }

    #[test]
    fn failures() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let t = indexed(&["O11", "O", "O13", "O14"], vec![1_i64.into(); 4]);
        let err = rhp.aggregate_by_ancestor(&t, &AggregateSpec::new(1)).unwrap_err();
        assert_eq!(err.row(), Some(1));
        assert_eq!(err.kind(), ErrorKind::InvalidResolution);

        let empty = Table::from_columns(vec![Column::new("cell", Vec::new())])
            .unwrap()
            .with_index("cell")
            .unwrap();
        let err = rhp.aggregate_by_ancestor(&empty, &AggregateSpec::new(1)).unwrap_err();
        assert_eq!(err, RhpError::EmptyGroup { resolution: 1 });
        assert_eq!(err.kind(), ErrorKind::EmptyGroup);
    }

    #[test]
    fn encode_then_aggregate_drops_coordinates() {
        let grid = RHealpixGrid::default();
        let t = Table::from_columns(vec![
            Column::new("lat", vec![50.0.into(), 51.0.into()]),
            Column::new("lng", vec![14.0.into(), 15.0.into()]),
            Column::new("val", vec![3_i64.into(), 4_i64.into()]),
        ])
        .unwrap();
        let spec = EncodeAggregateSpec::new(1).with_return_geometry(false);
        let out = Rhp::new(&grid)
            .geo_to_rhp_aggregate(t.into(), &spec)
            .unwrap()
            .into_table();
        let names: Vec<&str> = out.column_names().collect();
        assert_eq!(names, ["rhp_01", "val"]);
        assert_eq!(out.column("rhp_01").unwrap(), [Value::from("N2")]);
        assert_eq!(out.column("val").unwrap(), [Value::Int(7)]);
    }

    #[test]
    fn encode_then_aggregate_from_points() {
        let grid = RHealpixGrid::default();
        let ids = Table::from_columns(vec![Column::new(
            "weight",
            vec![0.25.into(), 0.5.into()],
        )])
        .unwrap();
        let geo = GeoTable::from_geometries(
            ids,
            vec![Point::new(14.0, 50.0).into(), Point::new(15.0, 51.0).into()],
        )
        .unwrap();
        let spec = EncodeAggregateSpec::new(1).with_fine_resolution(9);
        let out = Rhp::new(&grid).geo_to_rhp_aggregate(geo.into(), &spec).unwrap();
        let geo = out.as_geo().unwrap();
        assert_eq!(geo.table().column("weight").unwrap(), [Value::Float(0.75)]);

        let bad = EncodeAggregateSpec::new(5).with_fine_resolution(4);
        let err = Rhp::new(&grid)
            .geo_to_rhp_aggregate(Table::default().into(), &bad)
            .unwrap_err();
        assert_eq!(
            err,
            RhpError::FineResolutionTooCoarse {
                resolution: 5,
                fine: 4
            }
        );
        assert_eq!(err.kind(), ErrorKind::InvalidResolution);
    }

    #[test]
    fn sums_do_not_depend_on_row_order() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let spec = AggregateSpec::new(1).with_return_geometry(false);
        let cells = ["N11", "N12", "N13", "N14"];
        let forward = indexed(&cells, vec![0.1.into(), 0.2.into(), 0.3.into(), Value::Null]);
        let backward = indexed(&cells, vec![Value::Null, 0.3.into(), 0.2.into(), 0.1.into()]);
        let a = rhp.aggregate_by_ancestor(&forward, &spec).unwrap();
        let b = rhp.aggregate_by_ancestor(&backward, &spec).unwrap();
        assert_eq!(a.table().column("val"), b.table().column("val"));

        let ints = |v: [i64; 4]| indexed(&cells, v.map(Value::Int).to_vec());
        let a = rhp
            .aggregate_by_ancestor(&ints([i64::MAX, 1, -1, 0]), &spec)
            .unwrap();
        let b = rhp
            .aggregate_by_ancestor(&ints([-1, 0, 1, i64::MAX]), &spec)
            .unwrap();
        assert_eq!(a.table().column("val").unwrap(), [Value::Int(i64::MAX)]);
        assert_eq!(a.table().column("val"), b.table().column("val"));
    }
}
