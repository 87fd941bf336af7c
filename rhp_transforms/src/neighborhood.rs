// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! k-ring and hollow-ring enumeration.

extern crate alloc;

use alloc::vec::Vec;

use rhp_core::{CellAddress, GridAdapter, GridError};

use crate::engine::{AddressSource, Rhp, address_value};
use crate::error::Result;
use crate::table::Table;
use crate::value::Value;

/// Column written by [`Rhp::k_ring`].
pub const K_RING_COLUMN: &str = "rhp_k_ring";
/// Column written by [`Rhp::cell_ring`].
pub const CELL_RING_COLUMN: &str = "rhp_cell_ring";

impl<G: GridAdapter + ?Sized> Rhp<'_, G> {
    /// Adds every cell within `k` hops of each indexed address, the address itself included.
    ///
    /// In map mode the cells are stored as a list per row; with `explode` each cell gets its
    /// own copy of the row. Under a row limit the walk stops as soon as the disk outgrows the
    /// rows left.
    pub fn k_ring(&self, table: &Table, k: u32, explode: bool) -> Result<Table> {
        self.neighborhood(table, K_RING_COLUMN, explode, |cell, budget| match budget {
            Some(limit) => self.grid().neighbors_within_limited(cell, k, limit),
            None => Some(self.grid().neighbors_within(cell, k)),
        })
    }

    /// Adds the cells exactly `k` hops from each indexed address.
    pub fn cell_ring(&self, table: &Table, k: u32, explode: bool) -> Result<Table> {
        self.neighborhood(table, CELL_RING_COLUMN, explode, |cell, _| {
            Some(self.grid().ring_at(cell, k))
        })
    }

    fn neighborhood(
        &self,
        table: &Table,
        column: &str,
        explode: bool,
        cells: impl Fn(&CellAddress, Option<usize>) -> Option<Vec<CellAddress>>,
    ) -> Result<Table> {
        let addresses = |v: &Value, budget: Option<usize>| -> Result<_, GridError> {
            let cell = self.cell(v)?;
            Ok(cells(&cell, budget).map(|cells| cells.iter().map(address_value).collect()))
        };
        if explode {
            self.explode_within(table, &AddressSource::Index, column, addresses)
        } else {
            self.map(table, &AddressSource::Index, column, |v| {
                Ok(addresses(v, None)?.map(Value::List).unwrap_or_default())
            })
        }
    }
}
