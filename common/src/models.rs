use std::{fmt, num::ParseIntError, str::FromStr};

use thiserror::Error;

/// An in-bounds cell position. `x` is the column, `y` the row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Pos {
    pub x: usize,
    pub y: usize,
}

/// Board dimensions in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoardSize {
    pub width: usize,
    pub height: usize,
}

impl BoardSize {
    pub const DEFAULT_SIDE: usize = 12;
    /// Largest number of cells a board may have.
    pub const MAX_AREA: usize = 1 << 24;

    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Number of cells, or `None` if it overflows or exceeds [`Self::MAX_AREA`].
    pub fn checked_area(&self) -> Option<usize> {
        self.width
            .checked_mul(self.height)
            .filter(|&area| area <= Self::MAX_AREA)
    }

    /// Number of cells. Saturates instead of overflowing; validate with
    /// [`Self::checked_area`] before allocating.
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }
}

impl Default for BoardSize {
    fn default() -> Self {
        Self {
            width: Self::DEFAULT_SIDE,
            height: Self::DEFAULT_SIDE,
        }
    }
}

impl fmt::Display for BoardSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseSizeError {
    #[error("expected WIDTH,HEIGHT")]
    MissingSeparator,
    #[error("invalid dimension: {0}")]
    InvalidNumber(#[from] ParseIntError),
    #[error("dimensions must be positive, got {width},{height}")]
    NotPositive { width: usize, height: usize },
    #[error("board {width},{height} exceeds {max} cells", max = BoardSize::MAX_AREA)]
    TooLarge { width: usize, height: usize },
}

/// Parses the `WIDTH,HEIGHT` form used on the command line.
impl FromStr for BoardSize {
    type Err = ParseSizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (width, height) = s
            .split_once(',')
            .ok_or(ParseSizeError::MissingSeparator)?;
        let width: usize = width.trim().parse()?;
        let height: usize = height.trim().parse()?;

        if width == 0 || height == 0 {
            return Err(ParseSizeError::NotPositive { width, height });
        }

        let size = Self { width, height };
        if size.checked_area().is_none() {
            return Err(ParseSizeError::TooLarge { width, height });
        }

        Ok(size)
    }
}
