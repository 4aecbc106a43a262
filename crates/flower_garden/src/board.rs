use bevy::prelude::*;
use bevy::utils::HashMap;
use thiserror::Error;

use crate::cell::Cell;

/// The grid a flower lives on.
///
/// The board is authoritative for occupancy: flowers only ever write to it
/// through [`Board::set`], never by touching its cells directly.
pub trait Board {
    /// Scene coordinates of the middle of `cell`.
    fn center(&self, cell: Cell) -> Vec2;

    /// The cell under a scene point. May be out of bounds.
    fn cell_from_point(&self, point: Vec2) -> Cell;

    fn is_in_bounds(&self, cell: Cell) -> bool;

    fn get(&self, cell: Cell) -> Option<Entity>;

    /// Put `occupant` at `cell`, vacating whatever cell it held before.
    fn set(&mut self, cell: Cell, occupant: Entity);

    /// Report a finished move that ended at `cell`.
    fn resolve_move_at(&mut self, cell: Cell);
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum BoardError {
    #[error("Board needs at least one cell, got {columns}x{rows}")]
    Empty { columns: u32, rows: u32 },

    #[error("Cell size must be positive, got {0}")]
    InvalidCellSize(String),

    #[error("Cell {0} is outside the board")]
    OutOfBounds(Cell),

    #[error("Cell {cell} is already taken by {occupant}")]
    Occupied { cell: Cell, occupant: Entity },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardEvent {
    MoveResolved { cell: Cell, occupant: Option<Entity> },
    /// `occupant` was pushed off `cell` and no longer has a cell.
    Evicted { occupant: Entity, cell: Cell },
}

/// A rectangular board centered on the scene origin, row 0 at the top.
#[derive(Resource, Debug)]
pub struct GridBoard {
    columns: u32,
    rows: u32,
    cell_size: f32,
    cells: Vec<Option<Entity>>,
    placements: HashMap<Entity, Cell>,
    moves: u32,
    events: Vec<BoardEvent>,
}

impl GridBoard {
    pub fn new(columns: u32, rows: u32, cell_size: f32) -> Result<Self, BoardError> {
        if columns == 0 || rows == 0 {
            return Err(BoardError::Empty { columns, rows });
        }
        if !(cell_size > 0.0 && cell_size.is_finite()) {
            return Err(BoardError::InvalidCellSize(cell_size.to_string()));
        }

        Ok(Self {
            columns,
            rows,
            cell_size,
            cells: vec![None; (columns * rows) as usize],
            placements: HashMap::default(),
            moves: 0,
            events: Vec::new(),
        })
    }

    pub const fn columns(&self) -> u32 {
        self.columns
    }

    pub const fn rows(&self) -> u32 {
        self.rows
    }

    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Width and height of the whole board in scene units.
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.columns as f32, self.rows as f32) * self.cell_size
    }

    /// Number of moves resolved so far.
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    pub fn cell_of(&self, occupant: Entity) -> Option<Cell> {
        self.placements.get(&occupant).copied()
    }

    pub fn empty_cells(&self) -> Vec<Cell> {
        (0..self.rows as i32)
            .flat_map(|y| (0..self.columns as i32).map(move |x| Cell::new(x, y)))
            .filter(|&cell| self.get(cell).is_none())
            .collect()
    }

    pub fn is_full(&self) -> bool {
        self.placements.len() >= self.cells.len()
    }

    /// Like [`Board::set`] but refuses cells that are outside or taken.
    pub fn try_set(&mut self, cell: Cell, occupant: Entity) -> Result<(), BoardError> {
        if !self.is_in_bounds(cell) {
            return Err(BoardError::OutOfBounds(cell));
        }
        if let Some(current) = self.get(cell) {
            if current != occupant {
                return Err(BoardError::Occupied {
                    cell,
                    occupant: current,
                });
            }
        }
        self.set(cell, occupant);
        Ok(())
    }

    /// Take `occupant` off the board, returning the cell it held.
    pub fn remove(&mut self, occupant: Entity) -> Option<Cell> {
        let cell = self.placements.remove(&occupant)?;
        if let Some(slot) = self.slot_mut(cell) {
            if *slot == Some(occupant) {
                *slot = None;
            }
        }
        Some(cell)
    }

    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.is_in_bounds(cell)
            .then(|| (cell.x as u32 + cell.y as u32 * self.columns) as usize)
    }

    fn slot_mut(&mut self, cell: Cell) -> Option<&mut Option<Entity>> {
        let index = self.index(cell)?;
        self.cells.get_mut(index)
    }

    fn top_left(&self) -> Vec2 {
        let size = self.size();
        Vec2::new(-size.x / 2.0, size.y / 2.0)
    }
}

impl Board for GridBoard {
    fn center(&self, cell: Cell) -> Vec2 {
        let top_left = self.top_left();
        Vec2::new(
            (cell.x as f32 + 0.5).mul_add(self.cell_size, top_left.x),
            (cell.y as f32 + 0.5).mul_add(-self.cell_size, top_left.y),
        )
    }

    fn cell_from_point(&self, point: Vec2) -> Cell {
        let top_left = self.top_left();
        Cell::new(
            ((point.x - top_left.x) / self.cell_size).floor() as i32,
            ((top_left.y - point.y) / self.cell_size).floor() as i32,
        )
    }

    fn is_in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.columns as i32 && cell.y < self.rows as i32
    }

    fn get(&self, cell: Cell) -> Option<Entity> {
        self.index(cell)
            .and_then(|index| self.cells.get(index).copied().flatten())
    }

    fn set(&mut self, cell: Cell, occupant: Entity) {
        if !self.is_in_bounds(cell) {
            warn!("Ignoring placement of {occupant} outside the board at {cell}");
            return;
        }

        if let Some(previous) = self.placements.get(&occupant).copied() {
            if let Some(slot) = self.slot_mut(previous) {
                if *slot == Some(occupant) {
                    *slot = None;
                }
            }
        }

        if let Some(evicted) = self.get(cell).filter(|&current| current != occupant) {
            warn!("{occupant} replaced {evicted} at {cell}");
            self.placements.remove(&evicted);
            self.events.push(BoardEvent::Evicted {
                occupant: evicted,
                cell,
            });
        }

        if let Some(slot) = self.slot_mut(cell) {
            *slot = Some(occupant);
        }
        self.placements.insert(occupant, cell);
    }

    fn resolve_move_at(&mut self, cell: Cell) {
        self.moves += 1;
        let occupant = self.get(cell);
        debug!("Move {} resolved at {cell}", self.moves);
        self.events.push(BoardEvent::MoveResolved { cell, occupant });
    }
}
