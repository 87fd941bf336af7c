// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered transform pipelines.

extern crate alloc;

use alloc::vec::Vec;

use rhp_core::GridAdapter;
use thiserror::Error;

use crate::engine::Rhp;
use crate::error::RhpError;
use crate::table::Frame;
use crate::transform::Transform;

/// A transform failure inside a [`Program`].
#[derive(Debug, Clone, PartialEq, Error)]
#[error("step {step} failed: {source}")]
pub struct ExecutionError {
    /// Zero-based position of the failing transform.
    pub step: usize,
    /// The transform's error.
    #[source]
    pub source: RhpError,
}

/// A list of transforms applied left to right.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    transforms: Vec<Transform>,
}

impl Program {
    /// Creates an empty program.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a transform.
    pub fn push(&mut self, transform: Transform) {
        self.transforms.push(transform);
    }

    /// Appends a transform, builder style.
    pub fn with(mut self, transform: Transform) -> Self {
        self.push(transform);
        self
    }

    /// Returns the transforms in execution order.
    pub fn transforms(&self) -> &[Transform] {
        &self.transforms
    }

    /// Runs every transform in order, feeding each output into the next.
    pub fn execute<G: GridAdapter + ?Sized>(
        &self,
        rhp: &Rhp<'_, G>,
        input: Frame,
    ) -> Result<Frame, ExecutionError> {
        let mut frame = input;
        for (step, t) in self.transforms.iter().enumerate() {
            frame = t
                .apply(rhp, frame)
                .map_err(|source| ExecutionError { step, source })?;
            tracing::debug!(step, rows = frame.row_count(), "program step");
        }
        Ok(frame)
    }
}

impl FromIterator<Transform> for Program {
    fn from_iter<I: IntoIterator<Item = Transform>>(iter: I) -> Self {
        Self {
            transforms: iter.into_iter().collect(),
        }
    }
}
