use bevy::prelude::*;
use thiserror::Error;

use crate::board::{BoardError, GridBoard};

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("{initial} starting flowers do not fit on {cells} cells")]
    TooManyFlowers { initial: usize, cells: usize },

    #[error("Pick radius must be positive, got {0}")]
    InvalidPickRadius(String),
}

/// Tunables for a garden, read once at startup.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GardenConfig {
    pub columns: u32,
    pub rows: u32,
    /// Side of a cell in scene units.
    pub cell_size: f32,
    pub initial_flowers: usize,
    /// Flowers that sprout after every completed move.
    pub flowers_per_move: usize,
    /// How close to a flower's center a press has to land to pick it up.
    pub pick_radius: f32,
    /// Fixed seed for reproducible gardens.
    pub seed: Option<u64>,
}

impl Default for GardenConfig {
    fn default() -> Self {
        Self {
            columns: 5,
            rows: 5,
            cell_size: 64.0,
            initial_flowers: 6,
            flowers_per_move: 3,
            pick_radius: 28.0,
            seed: None,
        }
    }
}

impl GardenConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.board().map(|_| ())
    }

    /// An empty board of the configured shape.
    pub fn board(&self) -> Result<GridBoard, ConfigError> {
        let board = GridBoard::new(self.columns, self.rows, self.cell_size)?;

        let cells = (self.columns * self.rows) as usize;
        if self.initial_flowers > cells {
            return Err(ConfigError::TooManyFlowers {
                initial: self.initial_flowers,
                cells,
            });
        }
        if !(self.pick_radius > 0.0) {
            return Err(ConfigError::InvalidPickRadius(self.pick_radius.to_string()));
        }

        Ok(board)
    }
}
