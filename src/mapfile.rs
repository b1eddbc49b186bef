//! Map-file parsing.
//!
//! A map file is a gold count on the first line followed by the grid: one
//! row per line, spaces for open floor, `*` for walls. Row count is the
//! number of grid lines, column count the widest line; short lines pad with
//! open floor. Exactly one of the declared gold pieces is real, the rest
//! are decoys.

use std::fs;
use std::path::Path;

use crate::error::MapError;

/// Parsed map: dimensions, gold counts, and the wall/empty classification
/// consumed by host bootstrap.
#[derive(Debug, Clone)]
pub struct MapFile {
    pub rows: u32,
    pub cols: u32,
    pub total_gold: u32,
    pub decoy_gold: u32,
    walls: Vec<bool>,
}

impl MapFile {
    /// Load and validate a map file.
    pub fn load(path: &Path) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        let mut lines = text.lines();

        let count_line = lines.next().ok_or(MapError::Empty)?.trim();
        if count_line.is_empty() || !count_line.chars().all(|c| c.is_ascii_digit()) {
            return Err(MapError::IllegalCharacter);
        }
        let total_gold: u32 = count_line.parse().map_err(|_| MapError::IllegalCharacter)?;

        let body: Vec<&str> = lines.collect();
        let mut cols = 0u32;
        for line in &body {
            if line.chars().any(|c| c != ' ' && c != '*') {
                return Err(MapError::IllegalCharacter);
            }
            cols = cols.max(line.len() as u32);
        }
        let rows = body.len() as u32;
        if rows == 0 || cols == 0 {
            return Err(MapError::Empty);
        }

        let mut walls = vec![false; rows as usize * cols as usize];
        for (row, line) in body.iter().enumerate() {
            for (col, ch) in line.bytes().enumerate() {
                if ch == b'*' {
                    walls[row * cols as usize + col] = true;
                }
            }
        }

        Ok(Self::from_grid(rows, cols, total_gold, walls))
    }

    /// Build a map from already-classified cells. `walls` is row-major,
    /// length `rows * cols`. A declared gold count of zero means no gold of
    /// either kind; otherwise one piece is real and the rest decoys.
    pub fn from_grid(rows: u32, cols: u32, total_gold: u32, walls: Vec<bool>) -> Self {
        assert_eq!(walls.len(), rows as usize * cols as usize);
        MapFile {
            rows,
            cols,
            total_gold,
            decoy_gold: total_gold.saturating_sub(1),
            walls,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.walls.len()
    }

    pub fn is_wall(&self, index: usize) -> bool {
        self.walls[index]
    }
}
