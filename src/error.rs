//! Error kinds shared across the crate.
//!
//! `AlreadyExists` and `NotFound` are role-disambiguation signals, not
//! failures: session bootstrap recovers from them locally by branching into
//! the host or joiner path. Everything else is fatal for the current process.

use std::io;

use thiserror::Error;

/// Failures of the named semaphore wrapping the arena.
#[derive(Debug, Error)]
pub enum GateError {
    /// A gate of that name already exists (another process is hosting).
    #[error("a gate named {0} already exists")]
    AlreadyExists(String),
    /// No gate of that name exists (no host has started).
    #[error("no gate named {0} exists")]
    NotFound(String),
    /// The underlying semaphore call failed. Fatal.
    #[error("semaphore operation failed: {0}")]
    System(#[source] io::Error),
}

/// Failures of the shared-memory segment holding the arena.
#[derive(Debug, Error)]
pub enum ArenaError {
    #[error("a segment named {0} already exists")]
    AlreadyExists(String),
    #[error("no segment named {0} exists")]
    NotFound(String),
    /// shm_open/ftruncate/mmap failed. Fatal.
    #[error("shared memory operation failed: {0}")]
    System(#[source] io::Error),
}

/// Failures reading or validating a map file.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("cannot read map file: {0}")]
    Io(#[from] io::Error),
    #[error("map file has no grid rows")]
    Empty,
    #[error("illegal character in map file (gold count line, then only spaces and '*')")]
    IllegalCharacter,
}

/// Anything that can end a session before it starts, or a participant's
/// part in it. All variants are fatal for the current process only; other
/// participants are unaffected.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("initialization failed: {0}")]
    InitializationFailed(String),
    /// All five identity slots are taken. The rejected process never took a
    /// slot, so it has nothing to tear down.
    #[error("maximum number of participants reached (max 5)")]
    CapacityExceeded,
    #[error("map file is not valid: {0}")]
    InvalidMap(#[from] MapError),
    #[error(transparent)]
    Gate(#[from] GateError),
    #[error(transparent)]
    Arena(#[from] ArenaError),
}
