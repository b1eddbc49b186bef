//! Arena layout: the binary shape of the shared region and the only place
//! allowed to do pointer arithmetic over it.
//!
//! The region is a fixed-size header (dimensions + participant mask)
//! followed by exactly `rows * cols` occupancy bytes. Every attached process
//! interprets it through this module, so the layout is the wire format
//! between processes. Cells and the mask are `AtomicU8` with `Relaxed`
//! ordering; the gate's acquire/release supplies the cross-process barriers,
//! the atomics only keep unlocked UI snapshots from being UB.

use std::ffi::CString;
use std::io;
use std::mem;
use std::ptr;
use std::slice;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::ArenaError;

/// Hard cap on simultaneous participants; slots are 1..=MAX_PLAYERS.
pub const MAX_PLAYERS: u8 = 5;

/// Cell markers. Participant markers are single bits so "any participant"
/// is one AND against `ANY_PLAYER`.
pub const EMPTY: u8 = 0x00;
/// The single winning gold cell.
pub const GOLD: u8 = 0x20;
/// Fool's gold: looks the same on screen, does not win.
pub const DECOY: u8 = 0x40;
pub const WALL: u8 = 0x80;
/// Union of all five participant markers.
pub const ANY_PLAYER: u8 = 0x1f;

/// Marker bit for a participant slot in 1..=5.
pub fn player_marker(slot: u8) -> u8 {
    assert!((1..=MAX_PLAYERS).contains(&slot), "slot {slot} out of range");
    1 << (slot - 1)
}

/// Slot number for a participant marker bit.
pub fn marker_slot(marker: u8) -> u8 {
    debug_assert!(marker & ANY_PLAYER != 0 && marker.count_ones() == 1);
    marker.trailing_zeros() as u8 + 1
}

// Fixed-size header at offset 0 of the segment. Dimensions are written once
// by the host before any joiner can acquire the gate and never change.
#[repr(C)]
struct ArenaHeader {
    rows: u32,
    cols: u32,
    players: AtomicU8,
}

/// Handle over the mapped region. Creation, attachment and unlinking of the
/// named segment live here; everyone else goes through the bounds-checked
/// accessors.
pub struct Arena {
    header: *mut ArenaHeader,
    mapped_len: usize,
}

impl Arena {
    fn byte_len(rows: u32, cols: u32) -> usize {
        mem::size_of::<ArenaHeader>() + rows as usize * cols as usize
    }

    /// Create the named segment sized for `rows * cols` cells, map it, and
    /// write the header. The occupancy array and participant mask start
    /// zeroed (ftruncate extends with zero pages).
    pub fn create(name: &str, rows: u32, cols: u32) -> Result<Self, ArenaError> {
        assert!(rows > 0 && cols > 0, "arena dimensions must be positive");
        let cname = shm_name(name)?;
        let len = Self::byte_len(rows, cols);
        unsafe {
            let fd = libc::shm_open(
                cname.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                0o600,
            );
            if fd < 0 {
                let err = io::Error::last_os_error();
                return Err(if err.raw_os_error() == Some(libc::EEXIST) {
                    ArenaError::AlreadyExists(name.to_owned())
                } else {
                    ArenaError::System(err)
                });
            }
            if libc::ftruncate(fd, len as libc::off_t) != 0 {
                let err = io::Error::last_os_error();
                libc::close(fd);
                libc::shm_unlink(cname.as_ptr());
                return Err(ArenaError::System(err));
            }
            let map = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            );
            libc::close(fd);
            if map == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                libc::shm_unlink(cname.as_ptr());
                return Err(ArenaError::System(err));
            }
            let header = map as *mut ArenaHeader;
            (*header).rows = rows;
            (*header).cols = cols;
            (*header).players.store(0, Ordering::Relaxed);
            Ok(Arena { header, mapped_len: len })
        }
    }

    /// Attach to an existing named segment. The header is mapped first and
    /// the full mapping is sized from the dimensions it holds; a joiner
    /// never recomputes `rows * cols` on its own.
    pub fn open(name: &str) -> Result<Self, ArenaError> {
        let cname = shm_name(name)?;
        unsafe {
            let fd = libc::shm_open(cname.as_ptr(), libc::O_RDWR, 0o600);
            if fd < 0 {
                let err = io::Error::last_os_error();
                return Err(if err.raw_os_error() == Some(libc::ENOENT) {
                    ArenaError::NotFound(name.to_owned())
                } else {
                    ArenaError::System(err)
                });
            }
            let hdr_len = mem::size_of::<ArenaHeader>();
            let probe = libc::mmap(
                ptr::null_mut(),
                hdr_len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            );
            if probe == libc::MAP_FAILED {
                let err = io::Error::last_os_error();
                libc::close(fd);
                return Err(ArenaError::System(err));
            }
            let rows = (*(probe as *const ArenaHeader)).rows;
            let cols = (*(probe as *const ArenaHeader)).cols;
            libc::munmap(probe, hdr_len);

            let len = Self::byte_len(rows, cols);
            let map = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_SHARED,
                fd,
                0,
            );
            libc::close(fd);
            if map == libc::MAP_FAILED {
                return Err(ArenaError::System(io::Error::last_os_error()));
            }
            Ok(Arena { header: map as *mut ArenaHeader, mapped_len: len })
        }
    }

    /// Private anonymous mapping with the identical layout; nothing to
    /// unlink behind it. Lets tests exercise the accessors and the movement
    /// engine without named OS objects.
    pub fn anonymous(rows: u32, cols: u32) -> Result<Self, ArenaError> {
        assert!(rows > 0 && cols > 0, "arena dimensions must be positive");
        let len = Self::byte_len(rows, cols);
        unsafe {
            let map = libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            );
            if map == libc::MAP_FAILED {
                return Err(ArenaError::System(io::Error::last_os_error()));
            }
            let header = map as *mut ArenaHeader;
            (*header).rows = rows;
            (*header).cols = cols;
            Ok(Arena { header, mapped_len: len })
        }
    }

    /// Remove the named segment from the OS namespace. Existing mappings
    /// stay valid until unmapped; future `open` calls fail with `NotFound`.
    pub fn unlink(name: &str) -> Result<(), ArenaError> {
        let cname = shm_name(name)?;
        if unsafe { libc::shm_unlink(cname.as_ptr()) } != 0 {
            let err = io::Error::last_os_error();
            return Err(if err.raw_os_error() == Some(libc::ENOENT) {
                ArenaError::NotFound(name.to_owned())
            } else {
                ArenaError::System(err)
            });
        }
        Ok(())
    }

    pub fn rows(&self) -> u32 {
        unsafe { (*self.header).rows }
    }

    pub fn cols(&self) -> u32 {
        unsafe { (*self.header).cols }
    }

    pub fn cell_count(&self) -> usize {
        self.rows() as usize * self.cols() as usize
    }

    fn cells(&self) -> &[AtomicU8] {
        // Occupancy bytes sit directly after the header; u8 has no
        // alignment requirement.
        unsafe {
            let base = (self.header as *const u8).add(mem::size_of::<ArenaHeader>());
            slice::from_raw_parts(base as *const AtomicU8, self.cell_count())
        }
    }

    /// Linear index of (row, col). Out-of-range coordinates are a
    /// programming error: all call sites pre-validate via the movement
    /// engine, so this panics rather than returning a Result.
    pub fn index_of(&self, row: u32, col: u32) -> usize {
        assert!(
            row < self.rows() && col < self.cols(),
            "cell ({row},{col}) outside {}x{} arena",
            self.rows(),
            self.cols()
        );
        row as usize * self.cols() as usize + col as usize
    }

    pub fn cell_at(&self, index: usize) -> u8 {
        self.cells()[index].load(Ordering::Relaxed)
    }

    pub fn set_cell(&self, index: usize, marker: u8) {
        self.cells()[index].store(marker, Ordering::Relaxed);
    }

    /// Current participant bitmask (slot N is bit N-1).
    pub fn players(&self) -> u8 {
        unsafe { (*self.header).players.load(Ordering::Relaxed) }
    }

    pub fn set_player_bit(&self, slot: u8) {
        let bit = player_marker(slot);
        unsafe {
            (*self.header).players.fetch_or(bit, Ordering::Relaxed);
        }
    }

    pub fn clear_player_bit(&self, slot: u8) {
        let bit = player_marker(slot);
        unsafe {
            (*self.header).players.fetch_and(!bit, Ordering::Relaxed);
        }
    }

    /// First cell holding exactly `marker`, by linear scan. O(rows * cols)
    /// per call, fine at these grid sizes.
    pub fn find_marker(&self, marker: u8) -> Option<usize> {
        (0..self.cell_count()).find(|&i| self.cell_at(i) == marker)
    }

    /// Copy of the occupancy array for rendering. Taken outside the gate,
    /// so it may show transient mid-move states; advisory only.
    pub fn snapshot(&self) -> Vec<u8> {
        (0..self.cell_count()).map(|i| self.cell_at(i)).collect()
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        unsafe {
            libc::munmap(self.header as *mut libc::c_void, self.mapped_len);
        }
    }
}

fn shm_name(name: &str) -> Result<CString, ArenaError> {
    CString::new(name)
        .map_err(|e| ArenaError::System(io::Error::new(io::ErrorKind::InvalidInput, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_of_is_a_bijection() {
        for (rows, cols) in [(3u32, 3u32), (2, 5), (7, 4), (1, 9)] {
            let arena = Arena::anonymous(rows, cols).unwrap();
            let mut seen = vec![false; (rows * cols) as usize];
            for row in 0..rows {
                for col in 0..cols {
                    let i = arena.index_of(row, col);
                    assert!(!seen[i], "index {i} hit twice");
                    seen[i] = true;
                    // the inverse recovers the original coordinates
                    assert_eq!(i as u32 / cols, row);
                    assert_eq!(i as u32 % cols, col);
                }
            }
            assert!(seen.iter().all(|&s| s));
        }
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn index_of_rejects_out_of_range_row() {
        let arena = Arena::anonymous(2, 2).unwrap();
        let _ = arena.index_of(2, 0);
    }

    #[test]
    fn cells_start_empty_and_round_trip() {
        let arena = Arena::anonymous(4, 6).unwrap();
        assert_eq!(arena.rows(), 4);
        assert_eq!(arena.cols(), 6);
        assert!((0..arena.cell_count()).all(|i| arena.cell_at(i) == EMPTY));
        arena.set_cell(7, WALL);
        arena.set_cell(23, GOLD);
        assert_eq!(arena.cell_at(7), WALL);
        assert_eq!(arena.cell_at(23), GOLD);
        assert_eq!(arena.find_marker(GOLD), Some(23));
        assert_eq!(arena.find_marker(DECOY), None);
    }

    #[test]
    fn player_bits_and_markers() {
        assert_eq!(player_marker(1), 0x01);
        assert_eq!(player_marker(5), 0x10);
        for slot in 1..=MAX_PLAYERS {
            assert_eq!(marker_slot(player_marker(slot)), slot);
            assert_ne!(player_marker(slot) & ANY_PLAYER, 0);
        }
        let arena = Arena::anonymous(2, 2).unwrap();
        arena.set_player_bit(2);
        arena.set_player_bit(4);
        assert_eq!(arena.players(), 0x0a);
        arena.clear_player_bit(2);
        assert_eq!(arena.players(), 0x08);
    }
}
