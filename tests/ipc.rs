//! Integration tests over the real named OS objects. Names are suffixed
//! with the pid so parallel test runs cannot collide with each other or
//! with a live game.

use goldrush::error::{ArenaError, GateError, SessionError};
use goldrush::gate::Gate;
use goldrush::layout::{player_marker, Arena, ANY_PLAYER, WALL};
use goldrush::mapfile::MapFile;
use goldrush::session::{Session, SessionNames};

fn names(tag: &str) -> SessionNames {
    let pid = std::process::id();
    SessionNames {
        gate: format!("/goldrush_t_{tag}_{pid}_g"),
        arena: format!("/goldrush_t_{tag}_{pid}_a"),
    }
}

#[test]
fn gate_role_signals_and_destroy() {
    let n = names("gate");
    assert!(matches!(Gate::open(&n.gate), Err(GateError::NotFound(_))));

    let gate = Gate::create(&n.gate).unwrap();
    assert!(matches!(Gate::create(&n.gate), Err(GateError::AlreadyExists(_))));

    let peer = Gate::open(&n.gate).unwrap();
    assert!(gate.try_is_available());
    gate.acquire().unwrap();
    assert!(!peer.try_is_available());
    gate.release().unwrap();
    assert!(peer.try_is_available());

    gate.destroy().unwrap();
    assert!(matches!(Gate::open(&n.gate), Err(GateError::NotFound(_))));
    // destroyed name is reusable for a fresh session
    let fresh = Gate::create(&n.gate).unwrap();
    fresh.destroy().unwrap();
}

#[test]
fn arena_attach_sizes_from_header() {
    let n = names("arena");
    assert!(matches!(Arena::open(&n.arena), Err(ArenaError::NotFound(_))));

    let arena = Arena::create(&n.arena, 4, 7).unwrap();
    arena.set_cell(arena.index_of(0, 5), WALL);
    arena.set_player_bit(3);

    let attached = Arena::open(&n.arena).unwrap();
    assert_eq!(attached.rows(), 4);
    assert_eq!(attached.cols(), 7);
    assert_eq!(attached.cell_count(), 28);
    assert_eq!(attached.cell_at(5), WALL);
    assert_eq!(attached.players(), player_marker(3));

    // writes are visible both ways through the shared pages
    attached.set_cell(9, WALL);
    assert_eq!(arena.cell_at(9), WALL);

    Arena::unlink(&n.arena).unwrap();
    assert!(matches!(Arena::open(&n.arena), Err(ArenaError::NotFound(_))));
}

#[test]
fn duplicate_arena_creation_is_rejected() {
    let n = names("dup");
    let _arena = Arena::create(&n.arena, 2, 2).unwrap();
    assert!(matches!(Arena::create(&n.arena, 2, 2), Err(ArenaError::AlreadyExists(_))));
    Arena::unlink(&n.arena).unwrap();
}

#[test]
fn join_without_a_host_fails() {
    let n = names("nohost");
    assert!(matches!(
        Session::join(n),
        Err(SessionError::InitializationFailed(_))
    ));
}

#[test]
fn hosting_twice_under_one_name_fails() {
    let n = names("twohosts");
    let map = MapFile::from_grid(4, 4, 1, vec![false; 16]);
    let host = Session::host(&map, n.clone()).unwrap();
    assert!(matches!(
        Session::host(&map, n.clone()),
        Err(SessionError::InitializationFailed(_))
    ));
    host.leave();
}

#[test]
fn five_participants_then_capacity_then_teardown() {
    let n = names("capacity");
    let map = MapFile::from_grid(5, 5, 2, vec![false; 25]);

    let host = Session::host(&map, n.clone()).unwrap();
    assert_eq!(host.slot(), 1);
    assert!(!host.has_found_gold());

    let mut joiners = Vec::new();
    for expected_slot in 2..=5u8 {
        let joiner = Session::join(n.clone()).unwrap();
        assert_eq!(joiner.slot(), expected_slot);
        joiners.push(joiner);
    }

    let probe = Arena::open(&n.arena).unwrap();
    assert_eq!(probe.players(), 0x1f);
    let on_map = |mask: u8| {
        (0..probe.cell_count())
            .filter(|&i| probe.cell_at(i) & ANY_PLAYER != 0 && probe.cell_at(i) & mask != 0)
            .count()
    };
    assert_eq!(on_map(ANY_PLAYER), 5);

    // a sixth joiner is rejected and the mask is untouched
    assert!(matches!(Session::join(n.clone()), Err(SessionError::CapacityExceeded)));
    assert_eq!(probe.players(), 0x1f);
    assert_eq!(on_map(ANY_PLAYER), 5);

    // non-last departure: one fewer mask bit, everyone else untouched
    let departing = joiners.pop().unwrap();
    departing.leave();
    assert_eq!(probe.players(), 0x0f);
    assert_eq!(on_map(ANY_PLAYER), 4);
    for slot in 1..=4u8 {
        assert_eq!(on_map(player_marker(slot)), 1);
    }

    // freed slot is handed to the next joiner
    let rejoiner = Session::join(n.clone()).unwrap();
    assert_eq!(rejoiner.slot(), 5);
    rejoiner.leave();

    for joiner in joiners {
        joiner.leave();
    }
    drop(probe);
    host.leave();

    // last one out removed both named objects
    assert!(matches!(Gate::open(&n.gate), Err(GateError::NotFound(_))));
    assert!(matches!(Arena::open(&n.arena), Err(ArenaError::NotFound(_))));
}

#[test]
fn host_lays_out_walls_and_gold_from_the_map() {
    let n = names("layout");
    // 3x4 with a wall border on the left column
    let mut walls = vec![false; 12];
    for row in 0..3 {
        walls[row * 4] = true;
    }
    let map = MapFile::from_grid(3, 4, 3, walls);
    let host = Session::host(&map, n.clone()).unwrap();

    let probe = Arena::open(&n.arena).unwrap();
    let count = |marker: u8| {
        (0..probe.cell_count())
            .filter(|&i| probe.cell_at(i) == marker)
            .count()
    };
    assert_eq!(count(WALL), 3);
    assert_eq!(count(goldrush::layout::GOLD), 1);
    assert_eq!(count(goldrush::layout::DECOY), 2);
    assert_eq!(count(player_marker(1)), 1);

    drop(probe);
    host.leave();
    assert!(matches!(Arena::open(&n.arena), Err(ArenaError::NotFound(_))));
}
