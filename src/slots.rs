//! Identity allocation: each participant holds one slot in 1..=5 for its
//! lifetime, recorded as a bit in the arena's participant mask.

use crate::error::SessionError;
use crate::layout::{player_marker, Arena, MAX_PLAYERS};

/// Claim the lowest free slot by scanning 1..=5 and setting its bit.
/// Caller must hold the gate. On `CapacityExceeded` the mask is untouched;
/// the rejected process must still release the gate and exit without ever
/// placing itself on the map.
pub fn claim(arena: &Arena) -> Result<u8, SessionError> {
    let mask = arena.players();
    for slot in 1..=MAX_PLAYERS {
        if mask & player_marker(slot) == 0 {
            arena.set_player_bit(slot);
            tracing::debug!(slot, mask = arena.players(), "claimed identity slot");
            return Ok(slot);
        }
    }
    Err(SessionError::CapacityExceeded)
}

/// Give a slot back. Called exactly once per participant, during teardown,
/// under the gate when possible.
pub fn release(arena: &Arena, slot: u8) {
    arena.clear_player_bit(slot);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_distinct_ascending_slots() {
        let arena = Arena::anonymous(3, 3).unwrap();
        let mut taken = Vec::new();
        for _ in 0..MAX_PLAYERS {
            taken.push(claim(&arena).unwrap());
        }
        assert_eq!(taken, vec![1, 2, 3, 4, 5]);
        assert_eq!(arena.players(), 0x1f);
    }

    #[test]
    fn sixth_claim_fails_and_leaves_mask_unchanged() {
        let arena = Arena::anonymous(3, 3).unwrap();
        for _ in 0..MAX_PLAYERS {
            claim(&arena).unwrap();
        }
        assert!(matches!(claim(&arena), Err(SessionError::CapacityExceeded)));
        assert_eq!(arena.players(), 0x1f);
    }

    #[test]
    fn released_slot_is_reclaimed_lowest_first() {
        let arena = Arena::anonymous(3, 3).unwrap();
        for _ in 0..MAX_PLAYERS {
            claim(&arena).unwrap();
        }
        release(&arena, 3);
        assert_eq!(arena.players(), 0x1b);
        assert_eq!(claim(&arena).unwrap(), 3);
    }
}
