//! Placement grid: which template is reserved on which cell before units exist.

use std::fmt;

use bevy::prelude::*;

use super::round::placement::PlacementError;
use super::units::Faction;
use super::units::templates::UnitTemplate;

// === Constants ===

/// Columns across the board.
pub const BOARD_WIDTH: u32 = 60;

/// Rows from the player's edge to the opponent's edge.
pub const BOARD_DEPTH: u32 = 40;

/// The player may place in rows `0..PLAYER_PLACEMENT_ROWS`.
pub const PLAYER_PLACEMENT_ROWS: u32 = 19;

/// First row belonging to the opponent.
pub const OPPONENT_FIRST_ROW: u32 = 20;

// === Cells ===

/// A grid coordinate: `row` counts away from the player's edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Reflect)]
pub struct Cell {
    pub row: u32,
    pub col: u32,
}

impl Cell {
    #[must_use]
    pub const fn new(row: u32, col: u32) -> Self {
        Self { row, col }
    }

    #[must_use]
    pub const fn in_bounds(self) -> bool {
        self.row < BOARD_DEPTH && self.col < BOARD_WIDTH
    }

    /// Board position of the cell's centre: cell (i, j) sits at (j, -i).
    #[must_use]
    pub fn to_position(self) -> Vec2 {
        Vec2::new(self.col as f32, -(self.row as f32))
    }

    /// Cell nearest to a board position, clamped onto the board.
    #[must_use]
    pub fn nearest_to(position: Vec2) -> Self {
        let row = (-position.y).round().clamp(0.0, (BOARD_DEPTH - 1) as f32);
        let col = position.x.round().clamp(0.0, (BOARD_WIDTH - 1) as f32);
        Self::new(row as u32, col as u32)
    }

    /// Side that owns this row.
    #[must_use]
    pub const fn faction(self) -> Faction {
        if self.row >= OPPONENT_FIRST_ROW {
            Faction::Opponent
        } else {
            Faction::Player
        }
    }

    /// Whether the player is allowed to place here.
    #[must_use]
    pub const fn in_player_zone(self) -> bool {
        self.row < PLAYER_PLACEMENT_ROWS && self.col < BOARD_WIDTH
    }

    const fn index(self) -> usize {
        (self.row * BOARD_WIDTH + self.col) as usize
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

// === Board ===

/// A `BOARD_DEPTH × BOARD_WIDTH` grid; each cell holds at most one template.
#[derive(Debug, Clone, PartialEq, Eq, Reflect)]
pub struct Board {
    cells: Vec<Option<UnitTemplate>>,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            cells: vec![None; (BOARD_DEPTH * BOARD_WIDTH) as usize],
        }
    }
}

impl Board {
    /// Template reserved at `cell`, if any. Out-of-bounds cells read as empty.
    #[must_use]
    pub fn get(&self, cell: Cell) -> Option<UnitTemplate> {
        if cell.in_bounds() {
            self.cells[cell.index()]
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_empty(&self, cell: Cell) -> bool {
        self.get(cell).is_none()
    }

    /// Reserve `cell` for `template`. Leaves the board untouched on error.
    pub fn place(&mut self, cell: Cell, template: UnitTemplate) -> Result<(), PlacementError> {
        if !cell.in_bounds() {
            return Err(PlacementError::OutOfBounds(cell));
        }
        let slot = &mut self.cells[cell.index()];
        if slot.is_some() {
            return Err(PlacementError::Occupied(cell));
        }
        *slot = Some(template);
        Ok(())
    }

    pub fn clear(&mut self) {
        self.cells.fill(None);
    }

    /// Occupied cells in row-major order.
    pub fn occupied(&self) -> impl Iterator<Item = (Cell, UnitTemplate)> + '_ {
        self.cells.iter().enumerate().filter_map(|(index, slot)| {
            let index = index as u32;
            slot.map(|template| (Cell::new(index / BOARD_WIDTH, index % BOARD_WIDTH), template))
        })
    }
}

// === Resources ===

/// The visible board plus the opponent's hidden board for the current round.
#[derive(Resource, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct Boards {
    pub visible: Board,
    /// Opponent reservations, hidden from the player until the battle starts.
    pub hidden: Board,
}

impl Boards {
    /// Move every hidden reservation onto the visible board and return them.
    /// The hidden board is empty afterwards.
    pub fn reveal(&mut self) -> Vec<(Cell, UnitTemplate)> {
        let revealed: Vec<_> = self.hidden.occupied().collect();
        for &(cell, template) in &revealed {
            if let Err(err) = self.visible.place(cell, template) {
                warn!("Hidden reservation collides with visible board: {err}");
            }
        }
        self.hidden.clear();
        revealed
    }

    pub fn clear(&mut self) {
        self.visible.clear();
        self.hidden.clear();
    }
}

pub(super) fn plugin(app: &mut App) {
    app.register_type::<Boards>().init_resource::<Boards>();
}
