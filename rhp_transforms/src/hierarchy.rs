// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchy queries over the index column.

extern crate alloc;

use rhp_core::{AreaUnit, CellAddress, GridAdapter};

use crate::engine::{AddressSource, Rhp, address_text, address_value, resolution_column};
use crate::error::Result;
use crate::table::Table;
use crate::value::Value;

/// Column written by [`Rhp::rhp_get_resolution`].
pub const RESOLUTION_COLUMN: &str = "rhp_resolution";
/// Column written by [`Rhp::rhp_get_base_cell`].
pub const BASE_CELL_COLUMN: &str = "rhp_base_cell";
/// Column written by [`Rhp::rhp_is_valid`].
pub const IS_VALID_COLUMN: &str = "rhp_is_valid";
/// Column written by [`Rhp::rhp_to_parent`] without an explicit resolution.
pub const PARENT_COLUMN: &str = "rhp_parent";
/// Column written by [`Rhp::rhp_to_center_child`].
pub const CENTER_CHILD_COLUMN: &str = "rhp_center_child";
/// Column written by [`Rhp::cell_area`].
pub const CELL_AREA_COLUMN: &str = "rhp_cell_area";

impl<G: GridAdapter + ?Sized> Rhp<'_, G> {
    /// Adds the resolution of each indexed address.
    pub fn rhp_get_resolution(&self, table: &Table) -> Result<Table> {
        self.map(table, &AddressSource::Index, RESOLUTION_COLUMN, |v| {
            Ok(Value::Int(i64::from(self.cell(v)?.resolution())))
        })
    }

    /// Adds the resolution-0 ancestor of each indexed address.
    pub fn rhp_get_base_cell(&self, table: &Table) -> Result<Table> {
        self.map(table, &AddressSource::Index, BASE_CELL_COLUMN, |v| {
            let cell = self.cell(v)?;
            Ok(address_value(&CellAddress::base_cell(cell.base())))
        })
    }

    /// Adds whether each indexed value is a valid address. Never fails on content.
    pub fn rhp_is_valid(&self, table: &Table) -> Result<Table> {
        self.map(table, &AddressSource::Index, IS_VALID_COLUMN, |v| {
            Ok(Value::Bool(
                address_text(v).is_ok_and(|text| self.grid().is_valid(text)),
            ))
        })
    }

    /// Adds the ancestor of each indexed address.
    ///
    /// With `resolution = None` the direct parent goes to `rhp_parent`; otherwise the ancestor
    /// at that resolution goes to `rhp_{resolution:02}`. Strict: a base cell has no parent and a
    /// resolution finer than the address fails the call.
    pub fn rhp_to_parent(&self, table: &Table, resolution: Option<u8>) -> Result<Table> {
        let column = resolution.map_or_else(|| PARENT_COLUMN.into(), resolution_column);
        self.map(table, &AddressSource::Index, &column, |v| {
            let cell = self.cell(v)?;
            Ok(address_value(&self.grid().parent(&cell, resolution)?))
        })
    }

    /// Adds the center descendant of each indexed address in `rhp_center_child`.
    ///
    /// With `resolution = None` this descends one level. Lenient: invalid addresses, coarser
    /// targets and targets past the grid's maximum give `Null` for that row.
    pub fn rhp_to_center_child(&self, table: &Table, resolution: Option<u8>) -> Result<Table> {
        self.map(table, &AddressSource::Index, CENTER_CHILD_COLUMN, |v| {
            let child = self
                .cell(v)
                .ok()
                .and_then(|cell| self.grid().center_child(&cell, resolution));
            Ok(child.as_ref().map(address_value).unwrap_or_default())
        })
    }

    /// Adds the area of each indexed cell in `unit`.
    pub fn cell_area(&self, table: &Table, unit: AreaUnit) -> Result<Table> {
        self.map(table, &AddressSource::Index, CELL_AREA_COLUMN, |v| {
            Ok(Value::Float(self.grid().area(&self.cell(v)?, unit)))
        })
    }
}
