use std::ops::{Index, IndexMut};

use minesweeper_common::models::{BoardSize, Pos};

/// What players can see of a cell.
///
/// `Untouched <-> Flagged` toggles; `Untouched -> Revealed` is one-way.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Untouched,
    Flagged,
    Revealed,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub bomb: bool,
    pub visibility: Visibility,
}

/// Row-major grid of cells. The cell at `(x, y)` lives at `x + y * width`.
#[derive(Debug)]
pub struct Field {
    pub width: usize,
    pub height: usize,
    pub revealed: usize,
    pub cells: Vec<Cell>,
}

impl Field {
    /// Callers guarantee `bombs.len() == size.area()`.
    pub fn new(size: BoardSize, bombs: impl IntoIterator<Item = bool>) -> Self {
        let cells: Vec<Cell> = bombs
            .into_iter()
            .map(|bomb| Cell {
                bomb,
                visibility: Visibility::Untouched,
            })
            .collect();
        debug_assert_eq!(cells.len(), size.area());

        Self {
            width: size.width,
            height: size.height,
            revealed: 0,
            cells,
        }
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.x < self.width && pos.y < self.height
    }

    pub fn get(&self, pos: Pos) -> Option<&Cell> {
        if !self.contains(pos) {
            return None;
        }
        self.cells.get(pos.x + pos.y * self.width)
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut Cell> {
        if !self.contains(pos) {
            return None;
        }
        self.cells.get_mut(pos.x + pos.y * self.width)
    }

    /// In-bounds positions among the eight cells surrounding `pos`.
    pub fn neighbours(&self, pos: Pos) -> impl Iterator<Item = Pos> + use<> {
        let (width, height) = (self.width, self.height);

        (-1isize..=1)
            .flat_map(|dy| (-1isize..=1).map(move |dx| (dx, dy)))
            .filter(|&offset| offset != (0, 0))
            .filter_map(move |(dx, dy)| {
                let x = pos.x.checked_add_signed(dx)?;
                let y = pos.y.checked_add_signed(dy)?;
                (x < width && y < height).then_some(Pos { x, y })
            })
    }
}

/// Direct access for positions already known to be on the grid.
/// Panics on out-of-bounds positions; use [`Field::get`] otherwise.
impl Index<Pos> for Field {
    type Output = Cell;

    fn index(&self, pos: Pos) -> &Cell {
        assert!(self.contains(pos), "{pos:?} is outside the field");
        &self.cells[pos.x + pos.y * self.width]
    }
}

impl IndexMut<Pos> for Field {
    fn index_mut(&mut self, pos: Pos) -> &mut Cell {
        assert!(self.contains(pos), "{pos:?} is outside the field");
        &mut self.cells[pos.x + pos.y * self.width]
    }
}
