//! The line-oriented text protocol.
//!
//! Clients send one command per line:
//!
//! ```text
//! look | help | bye
//! dig <int> <int>
//! flag <int> <int>
//! deflag <int> <int>
//! ```
//!
//! Coordinates are column then row and may carry a leading `-`. Anything that
//! does not match the grammar exactly is answered with [`HELP`].

use std::{fmt, str::FromStr};

use thiserror::Error;

/// Usage text sent for `help` and for every malformed line.
pub const HELP: &str =
    "Commands: look | help | bye | dig X Y | flag X Y | deflag X Y (X is the column, Y the row)\n";

/// Reply to a dig that hit a bomb.
pub const BOOM: &str = "BOOM!\n";

/// Longest line a server reads, terminator excluded. Longer lines are
/// skipped and answered with [`HELP`].
pub const MAX_LINE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Look,
    Help,
    Bye,
    Dig { x: i64, y: i64 },
    Flag { x: i64, y: i64 },
    Deflag { x: i64, y: i64 },
}

impl Command {
    /// Parses one line with its terminator already stripped.
    ///
    /// Returns `None` for anything outside the grammar, including coordinates
    /// too large to represent.
    pub fn parse(line: &str) -> Option<Self> {
        let mut words = line.split(' ');

        let command = match words.next()? {
            "look" => Self::Look,
            "help" => Self::Help,
            "bye" => Self::Bye,
            "dig" => {
                let (x, y) = coordinates(&mut words)?;
                Self::Dig { x, y }
            }
            "flag" => {
                let (x, y) = coordinates(&mut words)?;
                Self::Flag { x, y }
            }
            "deflag" => {
                let (x, y) = coordinates(&mut words)?;
                Self::Deflag { x, y }
            }
            _ => return None,
        };

        words.next().is_none().then_some(command)
    }
}

fn coordinates<'a>(words: &mut impl Iterator<Item = &'a str>) -> Option<(i64, i64)> {
    let x = coordinate(words.next()?)?;
    let y = coordinate(words.next()?)?;
    Some((x, y))
}

fn coordinate(word: &str) -> Option<i64> {
    let digits = word.strip_prefix('-').unwrap_or(word);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    word.parse().ok()
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Look => f.write_str("look"),
            Self::Help => f.write_str("help"),
            Self::Bye => f.write_str("bye"),
            Self::Dig { x, y } => write!(f, "dig {x} {y}"),
            Self::Flag { x, y } => write!(f, "flag {x} {y}"),
            Self::Deflag { x, y } => write!(f, "deflag {x} {y}"),
        }
    }
}

/// The greeting a client receives right after connecting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Welcome {
    /// Live players, including the one being greeted.
    pub players: usize,
    pub columns: usize,
    pub rows: usize,
}

const WELCOME_PREFIX: &str = "Welcome to Minesweeper. Players: ";

impl fmt::Display for Welcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{WELCOME_PREFIX}{} including you. Board: {} columns by {} rows. Type 'help' for help.",
            self.players, self.columns, self.rows
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("not a welcome line: {0:?}")]
pub struct InvalidWelcome(pub String);

impl FromStr for Welcome {
    type Err = InvalidWelcome;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidWelcome(s.to_string());

        let rest = s.trim_end().strip_prefix(WELCOME_PREFIX).ok_or_else(invalid)?;
        let (players, rest) = rest.split_once(" including you. Board: ").ok_or_else(invalid)?;
        let (columns, rest) = rest.split_once(" columns by ").ok_or_else(invalid)?;
        let (rows, _) = rest.split_once(" rows.").ok_or_else(invalid)?;

        Ok(Self {
            players: players.parse().map_err(|_| invalid())?,
            columns: columns.parse().map_err(|_| invalid())?,
            rows: rows.parse().map_err(|_| invalid())?,
        })
    }
}
