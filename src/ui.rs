//! Terminal collaborator: grid redraw, blocking key reads, transient
//! notices. Everything here runs outside the gate and works from occupancy
//! snapshots, so it may briefly show mid-move states.

use std::io::{self, Stdout, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::style::Print;
use crossterm::terminal::{self, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{cursor, execute, queue};

use crate::layout::{marker_slot, ANY_PLAYER, DECOY, GOLD, WALL};
use crate::moves::Direction;

const NOTICE_LINES: usize = 2;

/// One decoded keypress the game loop cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Move(Direction),
    Quit,
}

/// Raw-mode terminal on the alternate screen. Restores the terminal on
/// drop, including during unwinding, so error paths leave the shell usable.
pub struct Console {
    out: Stdout,
    notices: Vec<String>,
}

impl Console {
    pub fn new() -> io::Result<Console> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        execute!(out, EnterAlternateScreen, cursor::Hide)?;
        Ok(Console { out, notices: Vec::new() })
    }

    /// Redraw the grid from a snapshot, notices underneath. Walls are `*`,
    /// both kinds of gold are `G` (telling them apart is the game),
    /// participants are their slot digits.
    pub fn draw(&mut self, rows: u32, cols: u32, grid: &[u8]) -> io::Result<()> {
        queue!(self.out, cursor::MoveTo(0, 0))?;
        for row in 0..rows as usize {
            let line: String = grid[row * cols as usize..(row + 1) * cols as usize]
                .iter()
                .map(|&m| marker_char(m))
                .collect();
            queue!(
                self.out,
                terminal::Clear(ClearType::CurrentLine),
                Print(line),
                Print("\r\n")
            )?;
        }
        queue!(self.out, terminal::Clear(ClearType::CurrentLine), Print("\r\n"))?;
        for notice in &self.notices {
            queue!(
                self.out,
                terminal::Clear(ClearType::CurrentLine),
                Print(notice.as_str()),
                Print("\r\n")
            )?;
        }
        self.out.flush()
    }

    /// Post a transient notice, shown under the grid on the next draw.
    pub fn notice(&mut self, message: &str) {
        if self.notices.len() == NOTICE_LINES {
            self.notices.remove(0);
        }
        self.notices.push(message.to_owned());
    }

    /// Block until a directional or quit key arrives; anything else is
    /// swallowed here.
    pub fn read_key(&mut self) -> io::Result<Key> {
        loop {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                if kind != KeyEventKind::Press {
                    continue;
                }
                if let KeyCode::Char(c) = code {
                    if c == 'q' || c == 'Q' {
                        return Ok(Key::Quit);
                    }
                    if let Some(direction) = Direction::from_key(c) {
                        return Ok(Key::Move(direction));
                    }
                }
            }
        }
    }
}

impl Drop for Console {
    fn drop(&mut self) {
        let _ = execute!(self.out, cursor::Show, LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

fn marker_char(marker: u8) -> char {
    if marker == WALL {
        '*'
    } else if marker == GOLD || marker == DECOY {
        'G'
    } else if marker & ANY_PLAYER != 0 {
        (b'0' + marker_slot(marker)) as char
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::player_marker;

    #[test]
    fn marker_rendering() {
        assert_eq!(marker_char(WALL), '*');
        assert_eq!(marker_char(GOLD), 'G');
        // decoy is indistinguishable from the real thing on screen
        assert_eq!(marker_char(DECOY), 'G');
        assert_eq!(marker_char(0), ' ');
        for slot in 1..=5u8 {
            assert_eq!(marker_char(player_marker(slot)), char::from(b'0' + slot));
        }
    }
}
