//! goldrush: a shared-memory grid-world chase played by up to five
//! independent processes on one machine.
//!
//! The first process (the host) parses a map, creates a named shared-memory
//! segment holding the arena, and guards it with a named binary semaphore
//! (the gate). Later processes join by attaching to both, claiming an
//! identity slot, and competing to reach the single real gold cell. Every
//! mutation of shared state happens inside one global gate-guarded critical
//! section; the arena's byte layout is the wire format between processes.

pub mod error;
pub mod gate;
pub mod layout;
pub mod mapfile;
pub mod moves;
pub mod session;
pub mod slots;
pub mod ui;

pub use error::{ArenaError, GateError, MapError, SessionError};
pub use layout::Arena;
pub use mapfile::MapFile;
pub use moves::{Direction, MoveOutcome};
pub use session::{Session, SessionNames};
