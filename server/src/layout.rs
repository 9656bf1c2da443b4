//! Board description files.
//!
//! ```text
//! FILE  ::= WIDTH SPACE HEIGHT NEWLINE LINE{HEIGHT}
//! LINE  ::= (VALUE SPACE){WIDTH-1} VALUE NEWLINE
//! VALUE ::= "0" | "1"
//! ```
//!
//! `1` marks a bomb. Lines may end in `\n` or `\r\n`; trailing blank lines are
//! ignored.

use std::{
    fs, io,
    path::{Path, PathBuf},
    str::FromStr,
};

use minesweeper_common::models::BoardSize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("cannot read board file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("board file is empty")]
    MissingHeader,
    #[error("line 1: expected \"WIDTH HEIGHT\", got {0:?}")]
    InvalidHeader(String),
    #[error("line 1: board dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },
    #[error("line 1: board {width}x{height} exceeds {max} cells", max = BoardSize::MAX_AREA)]
    TooLarge { width: usize, height: usize },
    #[error("expected {expected} rows, found {found}")]
    RowCount { expected: usize, found: usize },
    #[error("line {line}: expected {expected} values, found {found}")]
    ValueCount {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error("line {line}: invalid value {value:?}, expected 0 or 1")]
    InvalidValue { line: usize, value: String },
}

/// Bomb placement read from a board file, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub size: BoardSize,
    pub bombs: Vec<bool>,
}

impl Layout {
    #[instrument(level = "debug")]
    pub fn load(path: &Path) -> Result<Self, LayoutError> {
        let text = fs::read_to_string(path).map_err(|source| LayoutError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let layout: Self = text.parse()?;
        debug!("Loaded {} board from {}", layout.size, path.display());
        Ok(layout)
    }
}

impl FromStr for Layout {
    type Err = LayoutError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut lines: Vec<&str> = text.lines().collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let (header, rows) = lines.split_first().ok_or(LayoutError::MissingHeader)?;
        let size = parse_header(header)?;

        if rows.len() != size.height {
            return Err(LayoutError::RowCount {
                expected: size.height,
                found: rows.len(),
            });
        }

        let mut bombs = Vec::with_capacity(size.area());
        for (index, row) in rows.iter().enumerate() {
            // Line numbers are 1-based and the header is line 1.
            let line = index + 2;
            let values: Vec<&str> = row.split(' ').collect();
            if values.len() != size.width {
                return Err(LayoutError::ValueCount {
                    line,
                    expected: size.width,
                    found: values.len(),
                });
            }

            for value in values {
                bombs.push(match value {
                    "0" => false,
                    "1" => true,
                    other => {
                        return Err(LayoutError::InvalidValue {
                            line,
                            value: other.to_string(),
                        });
                    }
                });
            }
        }

        Ok(Self { size, bombs })
    }
}

fn parse_header(header: &str) -> Result<BoardSize, LayoutError> {
    let invalid = || LayoutError::InvalidHeader(header.to_string());

    let (width, height) = header.split_once(' ').ok_or_else(invalid)?;
    let width: usize = width.parse().map_err(|_| invalid())?;
    let height: usize = height.parse().map_err(|_| invalid())?;

    if width == 0 || height == 0 {
        return Err(LayoutError::EmptyDimensions { width, height });
    }

    let size = BoardSize::new(width, height);
    if size.checked_area().is_none() {
        return Err(LayoutError::TooLarge { width, height });
    }

    Ok(size)
}
