// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! rHEALPix cell addresses and grid adapters.
//!
//! This crate provides:
//! - [`CellAddress`], the hierarchical cell identifier (`N`, `O`..`R`, `S` followed by child
//!   selectors `0..=8`),
//! - the [`GridAdapter`] contract that table transforms are written against, and
//! - [`RHealpixGrid`], a reference implementation of that contract.
//!
//! Table plumbing lives in `rhp_transforms`; nothing here knows about rows or columns.

#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod address;
mod config;
mod error;
#[cfg(not(feature = "std"))]
mod float;
mod grid;
mod projection;
mod rhealpix;

pub use address::{BaseCell, CENTER_CHILD, CellAddress, N_SIDE};
pub use config::{Ellipsoid, GridConfig};
pub use error::GridError;
pub use grid::{AreaUnit, GridAdapter};
pub use rhealpix::RHealpixGrid;
