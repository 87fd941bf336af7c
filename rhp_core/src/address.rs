// Copyright 2025 the rhp Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hierarchical cell addresses.

extern crate alloc;

use core::fmt;
use core::str::FromStr;

use smallvec::SmallVec;

use crate::GridError;

/// One of the six resolution-0 cells of the rHEALPix grid.
///
/// `N` and `S` are the polar squares; `O`, `P`, `Q`, `R` are the equatorial squares from west to
/// east.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseCell {
    /// North polar square.
    N,
    /// Equatorial square spanning longitudes `[-180, -90)`.
    O,
    /// Equatorial square spanning longitudes `[-90, 0)`.
    P,
    /// Equatorial square spanning longitudes `[0, 90)`.
    Q,
    /// Equatorial square spanning longitudes `[90, 180)`.
    R,
    /// South polar square.
    S,
}

impl BaseCell {
    /// All base cells in address order.
    pub const ALL: [Self; 6] = [Self::N, Self::O, Self::P, Self::Q, Self::R, Self::S];

    /// The equatorial base cells from west to east.
    pub const EQUATORIAL: [Self; 4] = [Self::O, Self::P, Self::Q, Self::R];

    /// Parses the leading character of an address.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'N' => Some(Self::N),
            'O' => Some(Self::O),
            'P' => Some(Self::P),
            'Q' => Some(Self::Q),
            'R' => Some(Self::R),
            'S' => Some(Self::S),
            _ => None,
        }
    }

    /// Returns the address character for this base cell.
    pub fn as_char(self) -> char {
        match self {
            Self::N => 'N',
            Self::O => 'O',
            Self::P => 'P',
            Self::Q => 'Q',
            Self::R => 'R',
            Self::S => 'S',
        }
    }
}

impl fmt::Display for BaseCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Number of children per cell along one axis.
pub const N_SIDE: u8 = 3;

/// The child selector of the center child (row-major `3 x 3`, north-west first).
pub const CENTER_CHILD: u8 = 4;

/// A hierarchical rHEALPix cell address such as `N216055147`.
///
/// The first character names the [`BaseCell`]; every following character selects one of the
/// nine children of the previous cell, numbered row by row from the north-west corner:
///
/// ```text
/// 0 1 2
/// 3 4 5
/// 6 7 8
/// ```
///
/// The resolution of an address is its number of child selectors. Truncating selectors yields
/// ancestors; ordering matches the lexicographic order of the textual form.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    base: BaseCell,
    digits: SmallVec<[u8; 16]>,
}

impl CellAddress {
    /// Deepest resolution an address may have.
    pub const MAX_RESOLUTION: u8 = 15;

    /// Returns the resolution-0 address for a base cell.
    pub fn base_cell(base: BaseCell) -> Self {
        Self {
            base,
            digits: SmallVec::new(),
        }
    }

    /// Builds an address from a base cell and child selectors.
    pub fn new(base: BaseCell, digits: &[u8]) -> Result<Self, GridError> {
        if digits.len() > usize::from(Self::MAX_RESOLUTION) || digits.iter().any(|&d| d > 8) {
            let mut text = alloc::string::String::new();
            text.push(base.as_char());
            for &d in digits {
                text.push(char::from_digit(u32::from(d), 10).unwrap_or('?'));
            }
            return Err(GridError::InvalidAddress(text));
        }
        Ok(Self {
            base,
            digits: SmallVec::from_slice(digits),
        })
    }

    /// Parses the textual form of an address.
    pub fn parse(text: &str) -> Result<Self, GridError> {
        let mut chars = text.chars();
        let base = chars
            .next()
            .and_then(BaseCell::from_char)
            .ok_or_else(|| GridError::invalid_address(text))?;
        let mut digits = SmallVec::new();
        for c in chars {
            let Some(d) = c.to_digit(9) else {
                return Err(GridError::invalid_address(text));
            };
            if digits.len() == usize::from(Self::MAX_RESOLUTION) {
                return Err(GridError::invalid_address(text));
            }
            #[allow(clippy::cast_possible_truncation, reason = "base-9 digit is below 9")]
            digits.push(d as u8);
        }
        Ok(Self { base, digits })
    }

    /// Returns the base cell of this address.
    pub fn base(&self) -> BaseCell {
        self.base
    }

    /// Returns the child selectors, coarsest first.
    pub fn digits(&self) -> &[u8] {
        &self.digits
    }

    /// Returns the resolution (number of child selectors).
    pub fn resolution(&self) -> u8 {
        #[allow(clippy::cast_possible_truncation, reason = "bounded by MAX_RESOLUTION")]
        let r = self.digits.len() as u8;
        r
    }

    /// Returns the ancestor at `resolution`, or `None` if it is deeper than this address.
    ///
    /// The ancestor at the address's own resolution is the address itself.
    pub fn ancestor(&self, resolution: u8) -> Option<Self> {
        if resolution > self.resolution() {
            return None;
        }
        Some(Self {
            base: self.base,
            digits: SmallVec::from_slice(&self.digits[..usize::from(resolution)]),
        })
    }

    /// Returns the direct parent, or `None` at resolution 0.
    pub fn parent(&self) -> Option<Self> {
        self.resolution()
            .checked_sub(1)
            .and_then(|r| self.ancestor(r))
    }

    /// Returns the child with the given selector, or `None` past [`Self::MAX_RESOLUTION`].
    pub fn child(&self, selector: u8) -> Option<Self> {
        if selector > 8 || self.resolution() >= Self::MAX_RESOLUTION {
            return None;
        }
        let mut digits = self.digits.clone();
        digits.push(selector);
        Some(Self {
            base: self.base,
            digits,
        })
    }

    /// Descends through center children down to `resolution`.
    ///
    /// Returns the address itself at its own resolution and `None` when `resolution` is coarser
    /// than the address or deeper than [`Self::MAX_RESOLUTION`].
    pub fn center_child(&self, resolution: u8) -> Option<Self> {
        if resolution < self.resolution() || resolution > Self::MAX_RESOLUTION {
            return None;
        }
        let mut digits = self.digits.clone();
        digits.resize(usize::from(resolution), CENTER_CHILD);
        Some(Self {
            base: self.base,
            digits,
        })
    }

    /// Returns `true` if `self` is an ancestor of `other` (or equal to it).
    pub fn contains(&self, other: &Self) -> bool {
        self.base == other.base && other.digits.starts_with(&self.digits)
    }

    /// Returns `true` if both addresses share a parent and differ.
    pub fn is_sibling_of(&self, other: &Self) -> bool {
        self != other
            && self.resolution() == other.resolution()
            && self.resolution() > 0
            && self.parent() == other.parent()
    }

    /// Returns the `(column, row)` of this cell inside its base square, in cells of its own
    /// resolution, row 0 being the northern edge.
    pub fn grid_position(&self) -> (u64, u64) {
        let n = u64::from(N_SIDE);
        self.digits.iter().fold((0, 0), |(col, row), &d| {
            (col * n + u64::from(d % N_SIDE), row * n + u64::from(d / N_SIDE))
        })
    }

    /// Builds the address of the cell at `(column, row)` of a base square at `resolution`.
    ///
    /// Positions past the edge of the square are clamped onto it.
    pub fn from_grid_position(base: BaseCell, resolution: u8, col: u64, row: u64) -> Self {
        let resolution = resolution.min(Self::MAX_RESOLUTION);
        let n = u64::from(N_SIDE);
        let last = n.pow(u32::from(resolution)) - 1;
        let (col, row) = (col.min(last), row.min(last));
        let mut digits: SmallVec<[u8; 16]> = SmallVec::new();
        for level in (0..u32::from(resolution)).rev() {
            let scale = n.pow(level);
            #[allow(clippy::cast_possible_truncation, reason = "value is below 9")]
            let d = (((row / scale) % n) * n + (col / scale) % n) as u8;
            digits.push(d);
        }
        Self { base, digits }
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base.as_char())?;
        for d in &self.digits {
            write!(f, "{d}")?;
        }
        Ok(())
    }
}

impl FromStr for CellAddress {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
