// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The row transform engine.
//!
//! Every operation in this crate is a thin wrapper over one of two primitives:
//! - [`Rhp::map`]: one value per row, written to a destination column;
//! - [`Rhp::explode`]: a sequence per row, one output row per element.
//!
//! Both evaluate the cell function once per row, in row order, and abort on the first failing
//! row.

extern crate alloc;

use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use rhp_core::{CellAddress, GridAdapter, GridError};

use crate::error::{Result, RhpError};
use crate::table::Table;
use crate::value::Value;

/// Returns the conventional column name for addresses at `resolution` (`rhp_09`).
pub fn resolution_column(resolution: u8) -> String {
    format!("rhp_{resolution:02}")
}

/// Where a transform reads each row's cell address from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AddressSource {
    /// The table's index column.
    #[default]
    Index,
    /// A named column.
    Column(String),
}

impl AddressSource {
    fn resolve<'t>(&self, table: &'t Table) -> Result<&'t [Value]> {
        match self {
            Self::Index => table.index_values(),
            Self::Column(name) => table.require(name),
        }
    }
}

/// Options shared by every operation of an [`Rhp`] accessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RhpOptions {
    /// Upper bound on the rows an explode may produce. `None` means unbounded.
    pub max_output_rows: Option<usize>,
}

impl RhpOptions {
    /// Sets the explode row limit.
    pub fn with_max_output_rows(mut self, limit: usize) -> Self {
        self.max_output_rows = Some(limit);
        self
    }
}

/// Table operations over a borrowed grid.
///
/// The accessor holds no table state; each method takes a table and returns a new one.
#[derive(Debug)]
pub struct Rhp<'g, G: ?Sized> {
    grid: &'g G,
    options: RhpOptions,
}

impl<G: ?Sized> Clone for Rhp<'_, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<G: ?Sized> Copy for Rhp<'_, G> {}

impl<'g, G: GridAdapter + ?Sized> Rhp<'g, G> {
    /// Creates an accessor with default options.
    pub fn new(grid: &'g G) -> Self {
        Self {
            grid,
            options: RhpOptions::default(),
        }
    }

    /// Replaces the options.
    pub fn with_options(mut self, options: RhpOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the grid.
    pub fn grid(&self) -> &'g G {
        self.grid
    }

    /// Returns the options.
    pub fn options(&self) -> &RhpOptions {
        &self.options
    }

    /// Parses one address value strictly.
    pub(crate) fn cell(&self, value: &Value) -> Result<CellAddress, GridError> {
        self.grid.parse(address_text(value)?)
    }

    /// Evaluates `f` on every row's address value and stores the results in `column`.
    ///
    /// Row count, order, row keys and the other columns are unchanged. The first error aborts
    /// the operation with its row number.
    pub fn map<F>(
        &self,
        table: &Table,
        source: &AddressSource,
        column: &str,
        mut f: F,
    ) -> Result<Table>
    where
        F: FnMut(&Value) -> Result<Value, GridError>,
    {
        let addresses = source.resolve(table)?;
        let mut out = Vec::with_capacity(addresses.len());
        for (row, v) in addresses.iter().enumerate() {
            out.push(f(v).map_err(|source| RhpError::Row { row, source })?);
        }
        tracing::debug!(rows = out.len(), column, "map");
        table.clone().with_column(column, out)
    }

    /// Evaluates `f` on every row's address value and emits one output row per returned element.
    ///
    /// Output rows are grouped by source row in source order, each carrying a copy of its source
    /// row (row key included) with the element stored in `column`. An empty sequence drops its
    /// source row.
    pub fn explode<F>(
        &self,
        table: &Table,
        source: &AddressSource,
        column: &str,
        mut f: F,
    ) -> Result<Table>
    where
        F: FnMut(&Value) -> Result<Vec<Value>, GridError>,
    {
        self.explode_within(table, source, column, |v, _| f(v).map(Some))
    }

    /// [`Self::explode`] where `f` also receives the rows still allowed by the row limit.
    ///
    /// `f` returns `None` when its sequence would not fit in that budget, which fails the
    /// operation with [`RhpError::RowLimitExceeded`] before the sequence is built.
    pub(crate) fn explode_within<F>(
        &self,
        table: &Table,
        source: &AddressSource,
        column: &str,
        mut f: F,
    ) -> Result<Table>
    where
        F: FnMut(&Value, Option<usize>) -> Result<Option<Vec<Value>>, GridError>,
    {
        let addresses = source.resolve(table)?;
        let limit = self.options.max_output_rows;
        let mut rows = Vec::new();
        let mut elements = Vec::new();
        for (row, v) in addresses.iter().enumerate() {
            let remaining = limit.map(|limit| limit.saturating_sub(elements.len()));
            let items = f(v, remaining).map_err(|source| RhpError::Row { row, source })?;
            let Some(items) = items.filter(|items| remaining.is_none_or(|r| items.len() <= r))
            else {
                return Err(RhpError::RowLimitExceeded {
                    limit: limit.unwrap_or_default(),
                });
            };
            rows.extend(core::iter::repeat_n(row, items.len()));
            elements.extend(items);
        }
        tracing::debug!(
            rows_in = addresses.len(),
            rows_out = elements.len(),
            column,
            "explode"
        );
        table.take_rows(&rows).with_column(column, elements)
    }
}

/// Returns the text of an address value; anything but a string is an invalid address.
pub(crate) fn address_text(value: &Value) -> Result<&str, GridError> {
    value
        .as_str()
        .ok_or_else(|| GridError::InvalidAddress(format!("<{}>", value.type_name())))
}

/// Wraps an address as a table value.
pub(crate) fn address_value(cell: &CellAddress) -> Value {
    Value::Str(cell.to_string())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use alloc::vec;

    use rhp_core::RHealpixGrid;

    use super::*;
    use crate::table::Column;

    fn table() -> Table {
        Table::from_columns(vec![
            Column::new("cell", vec!["N1".into(), "O".into(), "P12".into()]),
            Column::new("label", vec!["a".into(), "b".into(), "c".into()]),
        ])
        .unwrap()
        .with_index("cell")
        .unwrap()
    }

    fn len_of(v: &Value) -> Result<usize, GridError> {
        Ok(address_text(v)?.len())
    }

    #[test]
    fn map_preserves_rows_and_keys() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let out = rhp
            .map(&table(), &AddressSource::Index, "len", |v| {
                Ok(Value::Int(len_of(v)? as i64))
            })
            .unwrap();
        assert_eq!(out.row_keys, [0, 1, 2]);
        assert_eq!(
            out.column("len").unwrap(),
            [Value::Int(2), Value::Int(1), Value::Int(3)]
        );
        assert_eq!(out.column("label"), table().column("label"));
    }

    #[test]
    fn explode_repeats_source_rows_and_drops_empty_sequences() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let source = AddressSource::Column("cell".into());
        let out = rhp
            .explode(&table(), &source, "n", |v| {
                let n = len_of(v)? - 1;
                Ok((0..n as i64).map(Value::Int).collect())
            })
            .unwrap();
        // N1 -> 1 row, O -> 0 rows, P12 -> 2 rows
        assert_eq!(out.row_keys, [0, 2, 2]);
        assert_eq!(
            out.column("label").unwrap(),
            [Value::from("a"), Value::from("c"), Value::from("c")]
        );
        assert_eq!(
            out.column("n").unwrap(),
            [Value::Int(0), Value::Int(0), Value::Int(1)]
        );
    }

    #[test]
    fn first_failing_row_aborts() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        let err = rhp
            .map(&table(), &AddressSource::Index, "x", |v| {
                let cell = rhp.cell(v)?;
                if cell.resolution() == 0 {
                    return Err(GridError::ResolutionOutOfRange {
                        requested: 0,
                        max: 0,
                    });
                }
                Ok(Value::Null)
            })
            .unwrap_err();
        assert_eq!(err.row(), Some(1));
    }

    #[test]
    fn explode_honors_row_limit() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid).with_options(RhpOptions::default().with_max_output_rows(2));
        let err = rhp
            .explode(&table(), &AddressSource::Index, "n", |_| {
                Ok(vec![Value::Null, Value::Null])
            })
            .unwrap_err();
        assert_eq!(err, RhpError::RowLimitExceeded { limit: 2 });
    }

    #[test]
    fn non_string_addresses_are_invalid() {
        let grid = RHealpixGrid::default();
        let rhp = Rhp::new(&grid);
        assert!(matches!(
            rhp.cell(&Value::Null),
            Err(GridError::InvalidAddress(_))
        ));
        assert_eq!(resolution_column(9), "rhp_09");
    }
}
