// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types for table transforms.

extern crate alloc;

use alloc::string::String;

use rhp_core::GridError;
use thiserror::Error;

/// Broad classification of an [`RhpError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A geometry of the wrong kind (or a bad coordinate) where a point was required.
    InvalidGeometry,
    /// A malformed or out-of-range cell address.
    InvalidAddress,
    /// A resolution incompatible with the source address or outside the grid's range.
    InvalidResolution,
    /// Aggregation produced no groups.
    EmptyGroup,
    /// A missing column, missing index or a value of the wrong type.
    Schema,
    /// A configured resource limit was exceeded.
    ResourceLimit,
}

/// Errors returned by table transforms.
///
/// Strict operations stop at the first failing row; the row number is reported with the
/// underlying grid error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RhpError {
    /// The grid rejected the value of one row.
    #[error("row {row}: {source}")]
    Row {
        /// Zero-based row position in the input table.
        row: usize,
        /// The grid error for that row.
        #[source]
        source: GridError,
    },
    /// A non-point geometry was supplied where a point is required.
    #[error("row {row}: expected a Point geometry, found {found}")]
    InvalidGeometry {
        /// Zero-based row position in the input table.
        row: usize,
        /// Kind of the offending value.
        found: &'static str,
    },
    /// Aggregation over a table that yields no groups.
    #[error("aggregation at resolution {resolution} produced no groups")]
    EmptyGroup {
        /// Target resolution.
        resolution: u8,
    },
    /// Points would be encoded at a resolution coarser than the aggregation target.
    #[error(
        "cannot aggregate at resolution {resolution} from points encoded at resolution {fine}"
    )]
    FineResolutionTooCoarse {
        /// Target aggregation resolution.
        resolution: u8,
        /// Intermediate encoding resolution.
        fine: u8,
    },
    /// A referenced column does not exist.
    #[error("missing column `{0}`")]
    MissingColumn(String),
    /// The operation reads the index, but the table has none.
    #[error("the table has no index column")]
    MissingIndex,
    /// A value of an unexpected type.
    #[error("row {row}: column `{column}` expected {expected}, found {found}")]
    TypeMismatch {
        /// Column name.
        column: String,
        /// Zero-based row position.
        row: usize,
        /// Expected type.
        expected: &'static str,
        /// Actual type.
        found: &'static str,
    },
    /// A column whose length does not match the table.
    #[error("column `{column}` has {len} values, expected {expected}")]
    LengthMismatch {
        /// Column name.
        column: String,
        /// Number of values supplied.
        len: usize,
        /// Number of rows in the table.
        expected: usize,
    },
    /// A column name used twice.
    #[error("duplicate column `{0}`")]
    DuplicateColumn(String),
    /// An explode would produce more rows than allowed.
    #[error("explode would produce more than {limit} rows")]
    RowLimitExceeded {
        /// Configured limit.
        limit: usize,
    },
    /// A grid error not tied to a row.
    #[error(transparent)]
    Grid(#[from] GridError),
}

impl RhpError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Row { source, .. } | Self::Grid(source) => grid_kind(source),
            Self::InvalidGeometry { .. } => ErrorKind::InvalidGeometry,
            Self::EmptyGroup { .. } => ErrorKind::EmptyGroup,
            Self::FineResolutionTooCoarse { .. } => ErrorKind::InvalidResolution,
            Self::MissingColumn(_)
            | Self::MissingIndex
            | Self::TypeMismatch { .. }
            | Self::LengthMismatch { .. }
            | Self::DuplicateColumn(_) => ErrorKind::Schema,
            Self::RowLimitExceeded { .. } => ErrorKind::ResourceLimit,
        }
    }

    /// Returns the input row this error is attached to, if any.
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::Row { row, .. }
            | Self::InvalidGeometry { row, .. }
            | Self::TypeMismatch { row, .. } => Some(*row),
            _ => None,
        }
    }
}

fn grid_kind(err: &GridError) -> ErrorKind {
    match err {
        GridError::InvalidAddress(_) => ErrorKind::InvalidAddress,
        GridError::ResolutionOutOfRange { .. } | GridError::IncompatibleResolution { .. } => {
            ErrorKind::InvalidResolution
        }
        GridError::InvalidCoordinate { .. } => ErrorKind::InvalidGeometry,
    }
}

/// Result type for table transforms.
pub type Result<T, E = RhpError> = core::result::Result<T, E>;
