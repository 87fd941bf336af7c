// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owned table representation used by the transforms.

extern crate alloc;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use geo_types::Geometry;
use hashbrown::HashMap;

use crate::error::{Result, RhpError};
use crate::value::Value;

/// Datum identifier attached to every produced geometry column.
pub const WGS84_CRS: &str = "EPSG:4326";

/// Default name of the geometry column.
pub const GEOMETRY_COLUMN: &str = "geometry";

/// A named column of values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    /// Column name, unique within a table.
    pub name: String,
    /// One value per row.
    pub values: Vec<Value>,
}

impl Column {
    /// Creates a column.
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// An owned, immutable-by-convention table.
///
/// - `row_keys` are stable per-row identities. Transforms that reorder or replicate rows carry
///   the source key along, so derived tables can be related back to their input.
/// - The optional index names the column holding each row's cell address.
///
/// Every operation returns a new table; nothing is modified in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    /// Stable keys for each row.
    pub row_keys: Vec<u64>,
    index: Option<String>,
    columns: Vec<Column>,
}

impl Table {
    /// Creates a table from columns of equal length, with row keys `0..n`.
    pub fn from_columns(columns: Vec<Column>) -> Result<Self> {
        let n = columns.first().map_or(0, |c| c.values.len());
        let row_keys = (0..n as u64).collect();
        Self::with_row_keys(row_keys, columns)
    }

    /// Creates a table with explicit row keys.
    pub fn with_row_keys(row_keys: Vec<u64>, columns: Vec<Column>) -> Result<Self> {
        let expected = row_keys.len();
        for (i, c) in columns.iter().enumerate() {
            if c.values.len() != expected {
                return Err(RhpError::LengthMismatch {
                    column: c.name.clone(),
                    len: c.values.len(),
                    expected,
                });
            }
            if columns[..i].iter().any(|p| p.name == c.name) {
                return Err(RhpError::DuplicateColumn(c.name.clone()));
            }
        }
        Ok(Self {
            row_keys,
            index: None,
            columns,
        })
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.row_keys.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty()
    }

    /// Returns the columns in order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the column names in order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Returns the values of a column, if present.
    pub fn column(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.values.as_slice())
    }

    /// Returns the values of a column, or [`RhpError::MissingColumn`].
    pub fn require(&self, name: &str) -> Result<&[Value]> {
        self.column(name)
            .ok_or_else(|| RhpError::MissingColumn(name.to_string()))
    }

    /// Gets a value for a row/column if both exist.
    pub fn value(&self, row: usize, name: &str) -> Option<&Value> {
        self.column(name)?.get(row)
    }

    /// Returns the name of the index column, if any.
    pub fn index_name(&self) -> Option<&str> {
        self.index.as_deref()
    }

    /// Returns the values of the index column.
    pub fn index_values(&self) -> Result<&[Value]> {
        let name = self.index.as_deref().ok_or(RhpError::MissingIndex)?;
        self.require(name)
    }

    /// Assigns a column, replacing one with the same name or appending a new one.
    pub fn with_column(mut self, name: impl Into<String>, values: Vec<Value>) -> Result<Self> {
        let name = name.into();
        if values.len() != self.row_count() {
            return Err(RhpError::LengthMismatch {
                column: name,
                len: values.len(),
                expected: self.row_count(),
            });
        }
        match self.columns.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.values = values,
            None => self.columns.push(Column::new(name, values)),
        }
        Ok(self)
    }

    /// Makes an existing column the index.
    pub fn with_index(mut self, name: &str) -> Result<Self> {
        self.require(name)?;
        self.index = Some(name.to_string());
        Ok(self)
    }

    /// Clears the index; the former index column stays as a regular column.
    pub fn reset_index(mut self) -> Self {
        self.index = None;
        self
    }

    /// Removes the named columns; missing names are ignored. Removing the index clears it.
    pub fn without_columns(mut self, names: &[&str]) -> Self {
        self.columns.retain(|c| !names.contains(&c.name.as_str()));
        if self.index.as_deref().is_some_and(|i| names.contains(&i)) {
            self.index = None;
        }
        self
    }

    /// Gathers rows by position, carrying their row keys. Positions may repeat.
    ///
    /// Positions must be `< row_count()`.
    pub fn take_rows(&self, rows: &[usize]) -> Self {
        let row_keys = rows.iter().map(|&r| self.row_keys[r]).collect();
        let columns = self
            .columns
            .iter()
            .map(|c| Column {
                name: c.name.clone(),
                values: rows.iter().map(|&r| c.values[r].clone()).collect(),
            })
            .collect();
        Self {
            row_keys,
            index: self.index.clone(),
            columns,
        }
    }

    /// Joins the non-index columns of `other` onto this table by index address.
    ///
    /// Every row of `self` is kept in order; rows with no match get `Null`. When `other` has
    /// several rows for one key the first is used.
    pub fn left_join(&self, other: &Self) -> Result<Self> {
        let left = self.index_values()?;
        let right = other.index_values()?;
        let right_name = other.index.as_deref().unwrap_or_default();

        let mut lookup: HashMap<&str, usize> = HashMap::new();
        for (row, v) in right.iter().enumerate() {
            let key = key_text(right_name, row, v)?;
            lookup.entry(key).or_insert(row);
        }
        let left_name = self.index.as_deref().unwrap_or_default();
        let mut matches = Vec::with_capacity(left.len());
        for (row, v) in left.iter().enumerate() {
            matches.push(lookup.get(key_text(left_name, row, v)?).copied());
        }

        let mut out = self.clone();
        for c in other.columns.iter().filter(|c| c.name != right_name) {
            if out.column(&c.name).is_some() {
                return Err(RhpError::DuplicateColumn(c.name.clone()));
            }
            let values = matches
                .iter()
                .map(|m| m.map_or(Value::Null, |r| c.values[r].clone()))
                .collect();
            out.columns.push(Column::new(c.name.clone(), values));
        }
        Ok(out)
    }
}

fn key_text<'v>(column: &str, row: usize, v: &'v Value) -> Result<&'v str> {
    v.as_str().ok_or_else(|| RhpError::TypeMismatch {
        column: column.to_string(),
        row,
        expected: "string",
        found: v.type_name(),
    })
}

/// A table with a geometry column in `(lon, lat)` degrees.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTable {
    table: Table,
    geometry: String,
    crs: &'static str,
}

impl GeoTable {
    /// Wraps a table whose `geometry` column holds only geometries or `Null`.
    pub fn new(table: Table, geometry: &str) -> Result<Self> {
        let values = table.require(geometry)?;
        if let Some((row, v)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !matches!(v, Value::Geometry(_) | Value::Null))
        {
            return Err(RhpError::TypeMismatch {
                column: geometry.to_string(),
                row,
                expected: "geometry",
                found: v.type_name(),
            });
        }
        Ok(Self {
            table,
            geometry: geometry.to_string(),
            crs: WGS84_CRS,
        })
    }

    /// Builds a geo table by assigning `geometries` to the [`GEOMETRY_COLUMN`] of `table`.
    pub fn from_geometries(table: Table, geometries: Vec<Geometry<f64>>) -> Result<Self> {
        let values = geometries.into_iter().map(Value::Geometry).collect();
        Self::new(table.with_column(GEOMETRY_COLUMN, values)?, GEOMETRY_COLUMN)
    }

    /// Returns the underlying table.
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Unwraps the underlying table; the geometry column stays a regular column.
    pub fn into_table(self) -> Table {
        self.table
    }

    /// Returns the geometry column name.
    pub fn geometry_column(&self) -> &str {
        &self.geometry
    }

    /// Returns the datum identifier of the geometry column.
    pub fn crs(&self) -> &'static str {
        self.crs
    }

    /// Returns the geometry values.
    pub fn geometries(&self) -> &[Value] {
        self.table.column(&self.geometry).unwrap_or_default()
    }

    /// Applies a table-to-table operation, keeping the geometry column designation.
    pub(crate) fn map_table(self, f: impl FnOnce(Table) -> Result<Table>) -> Result<Self> {
        let table = f(self.table)?;
        Self::new(table, &self.geometry)
    }
}

/// A table with or without a geometry column.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    /// A keyed table without geometry.
    Plain(Table),
    /// A keyed table with a geometry column.
    Geo(GeoTable),
}

impl Frame {
    /// Returns the underlying table.
    pub fn table(&self) -> &Table {
        match self {
            Self::Plain(t) => t,
            Self::Geo(g) => g.table(),
        }
    }

    /// Unwraps the underlying table.
    pub fn into_table(self) -> Table {
        match self {
            Self::Plain(t) => t,
            Self::Geo(g) => g.into_table(),
        }
    }

    /// Returns the geo table, if this frame has one.
    pub fn as_geo(&self) -> Option<&GeoTable> {
        match self {
            Self::Plain(_) => None,
            Self::Geo(g) => Some(g),
        }
    }

    /// Returns the number of rows.
    pub fn row_count(&self) -> usize {
        self.table().row_count()
    }
}

impl From<Table> for Frame {
    fn from(t: Table) -> Self {
        Self::Plain(t)
    }
}

impl From<GeoTable> for Frame {
    fn from(g: GeoTable) -> Self {
        Self::Geo(g)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use super::*;

    fn sample() -> Table {
        Table::from_columns(vec![
            Column::new("cell", vec!["N0".into(), "N1".into(), "O2".into()]),
            Column::new("v", vec![1_i64.into(), 2_i64.into(), 3_i64.into()]),
        ])
        .unwrap()
        .with_index("cell")
        .unwrap()
    }

    #[test]
    fn from_columns_rejects_ragged_and_duplicate_columns() {
        let ragged = Table::from_columns(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("b", vec![]),
        ]);
        assert!(matches!(ragged, Err(RhpError::LengthMismatch { .. })));

        let dup = Table::from_columns(vec![
            Column::new("a", vec![Value::Null]),
            Column::new("a", vec![Value::Null]),
        ]);
        assert_eq!(dup, Err(RhpError::DuplicateColumn("a".into())));
    }

    #[test]
    fn with_column_replaces_in_place() {
        let t = sample()
            .with_column("v", vec![Value::Null, Value::Null, Value::Null])
            .unwrap();
        let names: Vec<&str> = t.column_names().collect();
        assert_eq!(names, ["cell", "v"]);
        assert!(t.column("v").unwrap().iter().all(Value::is_null));
    }

    #[test]
    fn take_rows_carries_row_keys_and_index() {
        let t = sample().take_rows(&[2, 0, 0]);
        assert_eq!(t.row_keys, [2, 0, 0]);
        assert_eq!(t.index_name(), Some("cell"));
        assert_eq!(t.value(0, "cell"), Some(&Value::from("O2")));
    }

    #[test]
    fn missing_index_is_reported() {
        let t = sample().reset_index();
        assert_eq!(t.index_values(), Err(RhpError::MissingIndex));
        assert!(matches!(
            sample().with_index("nope"),
            Err(RhpError::MissingColumn(_))
        ));
    }

    #[test]
    fn left_join_keeps_left_rows() {
        let right = Table::from_columns(vec![
            Column::new("cell", vec!["O2".into(), "N0".into()]),
            Column::new("w", vec![20.0.into(), 0.5.into()]),
        ])
        .unwrap()
        .with_index("cell")
        .unwrap();
        let joined = sample().left_join(&right).unwrap();
        assert_eq!(
            joined.column("w").unwrap(),
            [Value::Float(0.5), Value::Null, Value::Float(20.0)]
        );
    }

    #[test]
    fn geo_table_checks_geometry_column() {
        let err = GeoTable::new(sample(), "v").unwrap_err();
        assert!(matches!(err, RhpError::TypeMismatch { row: 0, .. }));

        let g = GeoTable::from_geometries(
            sample(),
            vec![Geometry::from(geo_types::Point::new(0.0, 0.0)); 3],
        )
        .unwrap();
        assert_eq!(g.crs(), WGS84_CRS);
        assert_eq!(g.geometries().len(), 3);
    }
}
