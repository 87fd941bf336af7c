// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Grid errors.

extern crate alloc;

use alloc::string::{String, ToString};

use thiserror::Error;

/// Errors returned by [`GridAdapter`](crate::GridAdapter) operations and address parsing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    /// The text is not a well-formed address, or its resolution is beyond the grid's maximum.
    #[error("invalid rHEALPix address `{0}`")]
    InvalidAddress(String),
    /// A resolution outside `0..=max` was requested.
    #[error("resolution {requested} is outside the supported range 0..={max}")]
    ResolutionOutOfRange {
        /// The requested resolution.
        requested: u8,
        /// The grid's maximum resolution.
        max: u8,
    },
    /// The requested resolution cannot be reached from the address's own resolution.
    #[error("cannot move `{address}` (resolution {actual}) to resolution {requested}")]
    IncompatibleResolution {
        /// The source address.
        address: String,
        /// The source address's resolution.
        actual: u8,
        /// The requested resolution.
        requested: u8,
    },
    /// A longitude/latitude pair that is not finite or lies outside the valid range.
    #[error("coordinate ({lon}, {lat}) is outside the valid longitude/latitude range")]
    InvalidCoordinate {
        /// Longitude in degrees.
        lon: f64,
        /// Latitude in degrees.
        lat: f64,
    },
}

impl GridError {
    pub(crate) fn invalid_address(text: &str) -> Self {
        Self::InvalidAddress(text.to_string())
    }
}
