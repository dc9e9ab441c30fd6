//! Tile grids and the occupancy map
//!
//! `TileGrid` is the per-segment scratch grid the terrain generator writes
//! into. `OccupancyMap` is keyed by absolute tile coordinates and records
//! which entity holds each tile, so placement can avoid overlap.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::EntityId;
use crate::tile_center;

/// Integer tile address (col grows right, row grows down)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    pub col: i32,
    pub row: i32,
}

impl TileCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { col, row }
    }

    /// World-space center of this tile
    pub fn center(&self) -> Vec2 {
        tile_center(self.col, self.row)
    }

    pub fn offset(&self, cols: i32, rows: i32) -> Self {
        Self::new(self.col + cols, self.row + rows)
    }
}

/// Binary occupancy grid for one segment (local coordinates)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileGrid {
    cols: i32,
    rows: i32,
    cells: Vec<bool>,
}

impl TileGrid {
    pub fn new(cols: i32, rows: i32) -> Self {
        let cols = cols.max(0);
        let rows = rows.max(0);
        Self {
            cols,
            rows,
            cells: vec![false; (cols * rows) as usize],
        }
    }

    pub fn cols(&self) -> i32 {
        self.cols
    }

    pub fn rows(&self) -> i32 {
        self.rows
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.cols && row < self.rows
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        self.in_bounds(col, row)
            .then(|| (row * self.cols + col) as usize)
    }

    /// Out-of-bounds cells read as free
    pub fn is_occupied(&self, col: i32, row: i32) -> bool {
        self.index(col, row).is_some_and(|i| self.cells[i])
    }

    /// Mark a cell; returns false if it was out of bounds or already set
    pub fn occupy(&mut self, col: i32, row: i32) -> bool {
        match self.index(col, row) {
            Some(i) if !self.cells[i] => {
                self.cells[i] = true;
                true
            }
            _ => false,
        }
    }

    /// Fill every cell of the bottom `height` rows
    pub fn fill_bottom_rows(&mut self, height: i32) {
        for row in (self.rows - height).max(0)..self.rows {
            for col in 0..self.cols {
                self.occupy(col, row);
            }
        }
    }

    /// Occupied cells in row-major order
    pub fn occupied(&self) -> impl Iterator<Item = TileCoord> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.cols)
                .filter(move |&col| self.is_occupied(col, row))
                .map(move |col| TileCoord::new(col, row))
        })
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }
}

/// What holds an occupied tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Occupant {
    Ground(EntityId),
    Platform(EntityId),
    Collectible(EntityId),
    Wall(EntityId),
    /// Kept clear around a player spawn point
    Spawn,
}

/// Absolute-coordinate occupancy shared across segments
#[derive(Debug, Clone, Default)]
pub struct OccupancyMap {
    tiles: HashMap<TileCoord, Occupant>,
    /// Writes refused because the tile was taken
    conflicts: u32,
}

impl OccupancyMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an occupant; refuses (and counts) a second write to the same tile
    pub fn occupy(&mut self, tile: TileCoord, occupant: Occupant) -> bool {
        if let Some(existing) = self.tiles.get(&tile) {
            log::warn!(
                "Tile ({}, {}) already held by {:?}, refusing {:?}",
                tile.col,
                tile.row,
                existing,
                occupant
            );
            self.conflicts += 1;
            return false;
        }
        self.tiles.insert(tile, occupant);
        true
    }

    pub fn is_occupied(&self, tile: TileCoord) -> bool {
        self.tiles.contains_key(&tile)
    }

    pub fn get(&self, tile: TileCoord) -> Option<Occupant> {
        self.tiles.get(&tile).copied()
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn conflicts(&self) -> u32 {
        self.conflicts
    }
}
