use std::sync::Arc;

use minesweeper_common::{
    models::{BoardSize, Pos},
    protocol::{BOOM, HELP},
};
use rand::Rng;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    data::{Cell, Field, Visibility},
    layout::Layout,
};

/// The one board every session plays on. All reads and writes go through
/// this lock so a dig and its flood fill never interleave with another move.
pub type SharedBoard = Arc<Mutex<Board>>;

/// Numerator and denominator of the per-cell bomb chance on random boards.
const BOMB_ODDS: (u32, u32) = (1, 4);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BoardError {
    #[error("board dimensions must be positive, got {width}x{height}")]
    EmptyDimensions { width: usize, height: usize },
    #[error("expected {expected} cells for the board, got {found}")]
    CellCount { expected: usize, found: usize },
    #[error("board {width}x{height} exceeds {max} cells", max = BoardSize::MAX_AREA)]
    TooLarge { width: usize, height: usize },
}

/// Result of a dig, before it is rendered for the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigOutcome {
    /// Out of bounds, flagged or already revealed; nothing changed.
    Ignored,
    /// A safe cell was revealed along with `cascade` extra cells.
    Revealed { cascade: usize },
    /// A bomb went off. It is removed and the cell is revealed.
    Exploded { cascade: usize },
}

#[derive(Debug)]
pub struct Board {
    field: Field,
}

impl Board {
    /// A board without any bombs.
    pub fn empty(size: BoardSize) -> Result<Self, BoardError> {
        let area = Self::checked_area(size)?;
        Self::with_bombs(size, vec![false; area])
    }

    /// Builds a board from row-major bomb flags.
    pub fn with_bombs(size: BoardSize, bombs: Vec<bool>) -> Result<Self, BoardError> {
        let area = Self::checked_area(size)?;
        if bombs.len() != area {
            return Err(BoardError::CellCount {
                expected: area,
                found: bombs.len(),
            });
        }

        let bomb_count = bombs.iter().filter(|&&bomb| bomb).count();
        info!("Creating board: {} with {} bombs", size, bomb_count);

        Ok(Self {
            field: Field::new(size, bombs),
        })
    }

    /// Cell count of a valid board size. Runs before anything is allocated.
    fn checked_area(size: BoardSize) -> Result<usize, BoardError> {
        if size.width == 0 || size.height == 0 {
            return Err(BoardError::EmptyDimensions {
                width: size.width,
                height: size.height,
            });
        }
        size.checked_area().ok_or(BoardError::TooLarge {
            width: size.width,
            height: size.height,
        })
    }

    pub fn from_layout(layout: Layout) -> Result<Self, BoardError> {
        Self::with_bombs(layout.size, layout.bombs)
    }

    /// A board where every cell independently holds a bomb with probability 1/4.
    pub fn random(size: BoardSize) -> Result<Self, BoardError> {
        Self::random_with(size, &mut rand::rng())
    }

    pub fn random_with<R: Rng>(size: BoardSize, rng: &mut R) -> Result<Self, BoardError> {
        let area = Self::checked_area(size)?;
        let (numerator, denominator) = BOMB_ODDS;
        let bombs = (0..area)
            .map(|_| rng.random_ratio(numerator, denominator))
            .collect();
        Self::with_bombs(size, bombs)
    }

    pub fn rows(&self) -> usize {
        self.field.height
    }

    pub fn columns(&self) -> usize {
        self.field.width
    }

    /// Number of revealed cells. Never decreases.
    pub fn revealed_count(&self) -> usize {
        self.field.revealed
    }

    pub fn cell(&self, pos: Pos) -> Option<&Cell> {
        self.field.get(pos)
    }

    /// Maps wire coordinates onto the grid, rejecting anything out of range.
    pub fn position(&self, x: i64, y: i64) -> Option<Pos> {
        let pos = Pos {
            x: usize::try_from(x).ok()?,
            y: usize::try_from(y).ok()?,
        };
        self.field.contains(pos).then_some(pos)
    }

    pub fn adjacent_cells(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        self.field.neighbours(pos)
    }

    /// Bombs currently on the board around `pos`.
    pub fn adjacent_bombs(&self, pos: Pos) -> u8 {
        self.field
            .neighbours(pos)
            .filter(|&next| self.field[next].bomb)
            .count() as u8
    }

    /// Digs at `(x, y)` and reports what happened.
    #[instrument(level = "trace", skip(self))]
    pub fn dig(&mut self, x: i64, y: i64) -> DigOutcome {
        let Some(pos) = self.position(x, y) else {
            debug!("Ignoring dig outside the board at ({}, {})", x, y);
            return DigOutcome::Ignored;
        };
        let cell = &mut self.field[pos];
        if cell.visibility != Visibility::Untouched {
            debug!(
                "Ignoring dig on {:?} cell ({}, {})",
                cell.visibility, pos.x, pos.y
            );
            return DigOutcome::Ignored;
        }

        cell.visibility = Visibility::Revealed;
        let exploded = cell.bomb;
        cell.bomb = false;
        self.field.revealed += 1;

        let cascade = self.flood_fill(pos);

        if exploded {
            warn!("Bomb hit at ({}, {}), removing it", pos.x, pos.y);
            DigOutcome::Exploded { cascade }
        } else {
            debug!(
                "Revealed ({}, {}) and {} surrounding cells",
                pos.x, pos.y, cascade
            );
            DigOutcome::Revealed { cascade }
        }
    }

    /// Digs and renders the reply: [`BOOM`] for a bomb, the board otherwise.
    pub fn reveal(&mut self, x: i64, y: i64) -> String {
        match self.dig(x, y) {
            DigOutcome::Exploded { .. } => Self::explosion().to_string(),
            DigOutcome::Ignored | DigOutcome::Revealed { .. } => self.render(),
        }
    }

    /// Reveals outward from an already revealed cell for as long as the
    /// current cell has no neighbouring bombs. Returns how many cells it
    /// revealed.
    fn flood_fill(&mut self, start: Pos) -> usize {
        let mut pending = vec![start];
        let mut cascade = 0;

        while let Some(pos) = pending.pop() {
            if self.adjacent_bombs(pos) != 0 {
                continue;
            }

            for next in self.field.neighbours(pos) {
                let cell = &mut self.field[next];
                if cell.visibility == Visibility::Untouched {
                    cell.visibility = Visibility::Revealed;
                    cascade += 1;
                    pending.push(next);
                }
            }
        }

        self.field.revealed += cascade;
        cascade
    }

    /// Flags an untouched cell. Anything else is left alone.
    #[instrument(level = "trace", skip(self))]
    pub fn flag(&mut self, x: i64, y: i64) -> String {
        self.toggle(x, y, Visibility::Untouched, Visibility::Flagged);
        self.render()
    }

    /// Removes a flag. Anything else is left alone.
    #[instrument(level = "trace", skip(self))]
    pub fn deflag(&mut self, x: i64, y: i64) -> String {
        self.toggle(x, y, Visibility::Flagged, Visibility::Untouched);
        self.render()
    }

    fn toggle(&mut self, x: i64, y: i64, from: Visibility, to: Visibility) {
        let Some(cell) = self.position(x, y).and_then(|pos| self.field.get_mut(pos)) else {
            debug!("Ignoring {:?} outside the board at ({}, {})", to, x, y);
            return;
        };

        if cell.visibility == from {
            cell.visibility = to;
            debug!("Cell ({}, {}) is now {:?}", x, y, to);
        } else {
            debug!(
                "Ignoring {:?} on {:?} cell ({}, {})",
                to, cell.visibility, x, y
            );
        }
    }

    /// One line per row, cells separated by single spaces:
    /// `-` untouched, `F` flagged, blank for revealed with no bombs around,
    /// otherwise the digit counting neighbouring bombs.
    pub fn render(&self) -> String {
        let mut view = String::with_capacity(self.field.cells.len() * 2);

        for y in 0..self.field.height {
            for x in 0..self.field.width {
                if x > 0 {
                    view.push(' ');
                }
                view.push(self.symbol(Pos { x, y }));
            }
            view.push('\n');
        }

        view
    }

    fn symbol(&self, pos: Pos) -> char {
        match self.field.get(pos).map(|cell| cell.visibility) {
            Some(Visibility::Untouched) | None => '-',
            Some(Visibility::Flagged) => 'F',
            Some(Visibility::Revealed) => match self.adjacent_bombs(pos) {
                0 => ' ',
                n => char::from(b'0' + n),
            },
        }
    }

    pub fn help() -> &'static str {
        HELP
    }

    pub fn explosion() -> &'static str {
        BOOM
    }
}
