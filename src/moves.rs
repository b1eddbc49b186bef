//! Movement engine: validates and applies one directional move against the
//! current arena state. Deterministic in state and input; the only
//! randomness in the system is initial placement, which lives in session
//! bootstrap.
//!
//! Validation order: boundary (bypassed only after the real gold is found,
//! when walking off the grid is the designed exit), hop-over of one
//! adjacent participant, wall, then application with gold/decoy discovery.

use crate::layout::{player_marker, Arena, ANY_PLAYER, DECOY, EMPTY, GOLD, WALL};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// vi-style movement keys: h/j/k/l, either case.
    pub fn from_key(key: char) -> Option<Direction> {
        match key {
            'h' | 'H' => Some(Direction::Left),
            'j' | 'J' => Some(Direction::Down),
            'k' | 'K' => Some(Direction::Up),
            'l' | 'L' => Some(Direction::Right),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Illegal move, silently ignored; occupancy unchanged.
    Rejected,
    /// Moved onto open floor.
    Moved,
    /// Moved onto fool's gold. Non-terminal.
    FoundDecoy,
    /// Moved onto the real gold. Terminal win signal, raised exactly once
    /// (the gold marker is consumed by the move).
    Won,
    /// Crossed the grid boundary after winning: the participant leaves the
    /// session. Occupancy is untouched; teardown removes the marker.
    Left,
}

/// Target cell one step from `index`, or None when the step crosses the
/// grid boundary. Row is `index / cols` (target row must stay in
/// [0, rows)), column is `index % cols`.
fn step(arena: &Arena, index: usize, direction: Direction) -> Option<usize> {
    let cols = arena.cols() as usize;
    let rows = arena.rows() as usize;
    let row = index / cols;
    let col = index % cols;
    match direction {
        Direction::Up => (row > 0).then(|| index - cols),
        Direction::Down => (row + 1 < rows).then(|| index + cols),
        Direction::Left => (col > 0).then(|| index - 1),
        Direction::Right => (col + 1 < cols).then(|| index + 1),
    }
}

/// Validate and apply one move for the participant in `slot`. Caller must
/// hold the gate. `found_gold` is the mover's win flag; once set, a
/// boundary-crossing move becomes the designed exit instead of a rejection.
pub fn apply(arena: &Arena, slot: u8, direction: Direction, found_gold: bool) -> MoveOutcome {
    let marker = player_marker(slot);
    let Some(current) = arena.find_marker(marker) else {
        return MoveOutcome::Rejected;
    };

    let boundary = |crossed: Option<usize>| -> Result<usize, MoveOutcome> {
        match crossed {
            Some(index) => Ok(index),
            None if found_gold => Err(MoveOutcome::Left),
            None => Err(MoveOutcome::Rejected),
        }
    };

    // Resolve the target, hopping over one adjacent participant at most.
    // A hop that lands on a second participant is rejected outright: a
    // participant's marker is never overwritten.
    let target = match boundary(step(arena, current, direction)) {
        Err(outcome) => return outcome,
        Ok(adjacent) if arena.cell_at(adjacent) & ANY_PLAYER != 0 => {
            match boundary(step(arena, adjacent, direction)) {
                Err(outcome) => return outcome,
                Ok(beyond) if arena.cell_at(beyond) & ANY_PLAYER != 0 => {
                    return MoveOutcome::Rejected
                }
                Ok(beyond) => beyond,
            }
        }
        Ok(adjacent) => adjacent,
    };

    let cell = arena.cell_at(target);
    if cell == WALL {
        return MoveOutcome::Rejected;
    }

    arena.set_cell(current, EMPTY);
    arena.set_cell(target, marker);
    let outcome = match cell {
        GOLD => MoveOutcome::Won,
        DECOY => MoveOutcome::FoundDecoy,
        _ => MoveOutcome::Moved,
    };
    tracing::debug!(slot, ?direction, from = current, to = target, ?outcome, "applied move");
    outcome
}
