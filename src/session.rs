//! Session bootstrap and teardown: the per-process role state machine and
//! the one context object that owns the gate, the arena mapping, and this
//! process's identity slot.
//!
//! A process that supplies a map becomes the host: it creates the gate
//! exclusively, creates and populates the arena, and takes slot 1. A
//! process without a map joins: it opens the existing gate, attaches to the
//! arena, and claims the lowest free slot. The last participant to leave
//! destroys both named objects; there is no separate reaper.

use std::hint::spin_loop;

use rand::Rng;

use crate::error::{GateError, SessionError};
use crate::gate::Gate;
use crate::layout::{player_marker, Arena, DECOY, EMPTY, GOLD, WALL};
use crate::mapfile::MapFile;
use crate::moves::{self, Direction, MoveOutcome};
use crate::slots;

/// Fixed OS-global names: exactly one arena session may exist system-wide.
pub const GATE_NAME: &str = "/goldrush_gate";
pub const ARENA_NAME: &str = "/goldrush_arena";

/// The pair of OS names identifying a session. Overridable so tests can run
/// isolated sessions side by side.
#[derive(Debug, Clone)]
pub struct SessionNames {
    pub gate: String,
    pub arena: String,
}

impl Default for SessionNames {
    fn default() -> Self {
        SessionNames { gate: GATE_NAME.to_owned(), arena: ARENA_NAME.to_owned() }
    }
}

/// One process's participation in a shared session. Dropping it tears the
/// participant down (and the whole session, if it is the last one out).
pub struct Session {
    gate: Gate,
    arena: Arena,
    names: SessionNames,
    slot: u8,
    found_gold: bool,
}

impl Session {
    /// Host path: create the gate, then under it create the arena, lay out
    /// walls and gold from the parsed map, take slot 1, and place ourselves.
    pub fn host(map: &MapFile, names: SessionNames) -> Result<Self, SessionError> {
        let gate = Gate::create(&names.gate).map_err(|e| match e {
            GateError::AlreadyExists(_) => SessionError::InitializationFailed(
                "a session already exists; run without a map file to join it".to_owned(),
            ),
            other => SessionError::Gate(other),
        })?;
        if let Err(e) = gate.acquire() {
            let _ = gate.destroy();
            return Err(e.into());
        }
        match host_locked(map, &names) {
            Ok((arena, slot)) => {
                gate.release()?;
                tracing::info!(slot, rows = map.rows, cols = map.cols, "session created");
                Ok(Session { gate, arena, names, slot, found_gold: false })
            }
            Err(e) => {
                let _ = gate.release();
                let _ = gate.destroy();
                let _ = Arena::unlink(&names.arena);
                Err(e)
            }
        }
    }

    /// Joiner path: open the existing gate, poll until it looks free, take
    /// it, attach to the arena sized from its own header, claim a slot, and
    /// place ourselves on a random empty cell.
    pub fn join(names: SessionNames) -> Result<Self, SessionError> {
        let gate = Gate::open(&names.gate).map_err(|e| match e {
            GateError::NotFound(_) => SessionError::InitializationFailed(
                "no session to join; start one with a map file".to_owned(),
            ),
            other => SessionError::Gate(other),
        })?;
        // Advisory poll only; the blocking acquire below is what counts.
        while !gate.try_is_available() {
            spin_loop();
        }
        gate.acquire()?;
        match join_locked(&names) {
            Ok((arena, slot)) => {
                gate.release()?;
                tracing::info!(slot, "joined session");
                Ok(Session { gate, arena, names, slot, found_gold: false })
            }
            Err(e) => {
                let _ = gate.release();
                Err(e)
            }
        }
    }

    pub fn slot(&self) -> u8 {
        self.slot
    }

    pub fn rows(&self) -> u32 {
        self.arena.rows()
    }

    pub fn cols(&self) -> u32 {
        self.arena.cols()
    }

    pub fn has_found_gold(&self) -> bool {
        self.found_gold
    }

    /// Occupancy snapshot for redraw. Taken outside the gate; may show
    /// transient states.
    pub fn grid(&self) -> Vec<u8> {
        self.arena.snapshot()
    }

    /// Apply one directional move under the gate.
    pub fn make_move(&mut self, direction: Direction) -> Result<MoveOutcome, SessionError> {
        while !self.gate.try_is_available() {
            spin_loop();
        }
        self.gate.acquire()?;
        let outcome = moves::apply(&self.arena, self.slot, direction, self.found_gold);
        if outcome == MoveOutcome::Won {
            self.found_gold = true;
        }
        self.gate.release()?;
        Ok(outcome)
    }

    /// Leave the session. Equivalent to dropping, spelled out for call
    /// sites that want the departure visible.
    pub fn leave(self) {}
}

impl Drop for Session {
    fn drop(&mut self) {
        // Best effort: if the gate cannot be taken the process is exiting
        // anyway, so teardown proceeds without it.
        let gated = self.gate.acquire().is_ok();
        slots::release(&self.arena, self.slot);
        if let Some(index) = self.arena.find_marker(player_marker(self.slot)) {
            self.arena.set_cell(index, EMPTY);
        }
        let last_one_out = self.arena.players() == 0;
        if gated {
            let _ = self.gate.release();
        }
        if last_one_out {
            tracing::info!(slot = self.slot, "last participant out, removing session objects");
            let _ = self.gate.destroy();
            let _ = Arena::unlink(&self.names.arena);
        } else {
            tracing::info!(slot = self.slot, "left session");
        }
    }
}

fn host_locked(map: &MapFile, names: &SessionNames) -> Result<(Arena, u8), SessionError> {
    let arena = Arena::create(&names.arena, map.rows, map.cols)?;
    for index in 0..arena.cell_count() {
        if map.is_wall(index) {
            arena.set_cell(index, WALL);
        }
    }
    let mut rng = rand::thread_rng();
    if map.total_gold > 0 {
        place_on_empty(&arena, &mut rng, GOLD);
        for _ in 0..map.decoy_gold {
            place_on_empty(&arena, &mut rng, DECOY);
        }
    }
    let slot = slots::claim(&arena)?;
    place_on_empty(&arena, &mut rng, player_marker(slot));
    Ok((arena, slot))
}

fn join_locked(names: &SessionNames) -> Result<(Arena, u8), SessionError> {
    let arena = Arena::open(&names.arena)?;
    let slot = slots::claim(&arena)?;
    place_on_empty(&arena, &mut rand::thread_rng(), player_marker(slot));
    Ok((arena, slot))
}

// Uniform pick, retried until an empty cell turns up. Unbounded on purpose:
// the empty set is finite and shrinks by one per placement.
fn place_on_empty(arena: &Arena, rng: &mut impl Rng, marker: u8) {
    loop {
        let index = rng.gen_range(0..arena.cell_count());
        if arena.cell_at(index) == EMPTY {
            arena.set_cell(index, marker);
            return;
        }
    }
}
