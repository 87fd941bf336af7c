// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Table transforms keyed by rHEALPix cells.
//!
//! This crate provides:
//! - an owned [`Table`] with stable `row_keys` and an address index, plus the capability-tagged
//!   [`Frame`] (plain or [`GeoTable`]),
//! - the [`Rhp`] accessor, whose operations encode coordinates, decode geometry, navigate the
//!   hierarchy, enumerate neighborhoods and aggregate by ancestor, and
//! - a small [`Transform`] IR with a left-to-right [`Program`] executor.
//!
//! Every operation is built on two primitives, [`Rhp::map`] and [`Rhp::explode`], and works
//! against any [`GridAdapter`](rhp_core::GridAdapter).
//!
//! Strictness follows a fixed split: encoding, centroid decoding, parent navigation and the
//! other key-producing operations fail the whole call on the first bad row; center-child
//! navigation and boundary decoding substitute a null or empty value and carry on.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod aggregate;
mod decode;
mod encode;
mod engine;
mod error;
mod hierarchy;
mod neighborhood;
mod program;
mod table;
mod transform;
mod value;


pub use aggregate::{AggregateSpec, EncodeAggregateSpec};
pub use encode::EncodeSpec;
pub use engine::{AddressSource, Rhp, RhpOptions, resolution_column};
pub use error::{ErrorKind, Result, RhpError};
pub use hierarchy::{
    BASE_CELL_COLUMN, CELL_AREA_COLUMN, CENTER_CHILD_COLUMN, IS_VALID_COLUMN, PARENT_COLUMN,
    RESOLUTION_COLUMN,
};
pub use neighborhood::{CELL_RING_COLUMN, K_RING_COLUMN};
pub use program::{ExecutionError, Program};
pub use table::{Column, Frame, GEOMETRY_COLUMN, GeoTable, Table, WGS84_CRS};
pub use transform::Transform;
pub use value::Value;
