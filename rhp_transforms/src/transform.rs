// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Transform IR types.

extern crate alloc;

use alloc::string::String;

use rhp_core::{AreaUnit, GridAdapter};

use crate::aggregate::{AggregateSpec, EncodeAggregateSpec};
use crate::encode::EncodeSpec;
use crate::engine::Rhp;
use crate::error::Result;
use crate::table::{Frame, Table};

/// A frame-to-frame operation with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum Transform {
    /// Encode lat/lng columns or point geometries ([`Rhp::geo_to_rhp`]).
    Encode(EncodeSpec),
    /// Replace geometry with cell centroids ([`Rhp::rhp_to_geo`]).
    DecodeCentroid,
    /// Replace geometry with cell boundaries ([`Rhp::rhp_to_geo_boundary`]).
    DecodeBoundary,
    /// Add `rhp_resolution`.
    Resolution,
    /// Add `rhp_base_cell`.
    BaseCell,
    /// Add `rhp_is_valid`.
    IsValid,
    /// Add the ancestor at `resolution`, or the direct parent.
    Parent {
        /// Target resolution; `None` for one level up.
        resolution: Option<u8>,
    },
    /// Add the center descendant at `resolution`, or one level down.
    CenterChild {
        /// Target resolution; `None` for one level down.
        resolution: Option<u8>,
    },
    /// Add `rhp_cell_area`.
    CellArea {
        /// Output unit.
        unit: AreaUnit,
    },
    /// Add the filled `k` neighborhood.
    KRing {
        /// Hop distance.
        k: u32,
        /// One row per cell instead of a list per row.
        explode: bool,
    },
    /// Add the hollow ring at distance `k`.
    CellRing {
        /// Hop distance.
        k: u32,
        /// One row per cell instead of a list per row.
        explode: bool,
    },
    /// Group by ancestor and sum numeric columns.
    Aggregate(AggregateSpec),
    /// Encode at a fine resolution, then group by ancestor.
    EncodeAggregate(EncodeAggregateSpec),
    /// Make a column the index.
    SetIndex(String),
    /// Clear the index.
    ResetIndex,
}

impl Transform {
    /// Applies this transform.
    ///
    /// Column-adding transforms keep a geo frame's geometry. Decoding always yields a geo frame;
    /// aggregation yields one when it attaches geometry.
    pub fn apply<G: GridAdapter + ?Sized>(&self, rhp: &Rhp<'_, G>, frame: Frame) -> Result<Frame> {
        match self {
            Self::Encode(spec) => rhp.geo_to_rhp(frame, spec),
            Self::DecodeCentroid => Ok(Frame::Geo(rhp.rhp_to_geo(&drop_geometry(frame))?)),
            Self::DecodeBoundary => Ok(Frame::Geo(
                rhp.rhp_to_geo_boundary(&drop_geometry(frame))?,
            )),
            Self::Resolution => map_frame(frame, |t| rhp.rhp_get_resolution(&t)),
            Self::BaseCell => map_frame(frame, |t| rhp.rhp_get_base_cell(&t)),
            Self::IsValid => map_frame(frame, |t| rhp.rhp_is_valid(&t)),
            Self::Parent { resolution } => {
                map_frame(frame, |t| rhp.rhp_to_parent(&t, *resolution))
            }
            Self::CenterChild { resolution } => {
                map_frame(frame, |t| rhp.rhp_to_center_child(&t, *resolution))
            }
            Self::CellArea { unit } => map_frame(frame, |t| rhp.cell_area(&t, *unit)),
            Self::KRing { k, explode } => map_frame(frame, |t| rhp.k_ring(&t, *k, *explode)),
            Self::CellRing { k, explode } => {
                map_frame(frame, |t| rhp.cell_ring(&t, *k, *explode))
            }
            Self::Aggregate(spec) => rhp.aggregate_by_ancestor(frame.table(), spec),
            Self::EncodeAggregate(spec) => rhp.geo_to_rhp_aggregate(frame, spec),
            Self::SetIndex(name) => map_frame(frame, |t| t.with_index(name)),
            Self::ResetIndex => map_frame(frame, |t| Ok(t.reset_index())),
        }
    }
}

fn map_frame(frame: Frame, f: impl FnOnce(Table) -> Result<Table>) -> Result<Frame> {
    match frame {
        Frame::Plain(t) => Ok(Frame::Plain(f(t)?)),
        Frame::Geo(g) => Ok(Frame::Geo(g.map_table(f)?)),
    }
}

/// Returns the table without its designated geometry column, so decoding can write a fresh one.
fn drop_geometry(frame: Frame) -> Table {
    match frame {
        Frame::Plain(t) => t,
        Frame::Geo(g) => {
            let name = String::from(g.geometry_column());
            g.into_table().without_columns(&[name.as_str()])
        }
    }
}
