use std::io::{self, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::Print;
use sapeur_core::{Coord, Coord2, Tile};

const BORDERS: [[char; 3]; 3] = [['┌', '┬', '┐'], ['├', '┼', '┤'], ['└', '┴', '┘']];
const HORIZONTAL: char = '─';
const VERTICAL: char = '│';

const HIDDEN_GLYPH: char = '░';
const FLAG_GLYPH: char = 'X';
const MINE_GLYPH: char = '*';

const HEADER: &str = "space = flag   enter = open   shift+enter = open neighbours   esc = quit   time: ";

/// Row reserved for the key help and the clock; the grid starts below it.
const HEADER_ROW: u16 = 0;
const GRID_TOP: u16 = 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

/// Board renderer and cell cursor, drawing 4-column by 2-row boxed cells at
/// absolute terminal positions. The terminal cursor doubles as the player's
/// cell cursor.
pub struct Screen {
    width: Coord,
    height: Coord,
    cursor: Coord2,
    time_col: u16,
}

impl Screen {
    pub fn new(width: Coord, height: Coord) -> Self {
        Self {
            width,
            height,
            cursor: (0, 0),
            time_col: HEADER.chars().count() as u16,
        }
    }

    pub fn cursor(&self) -> Coord2 {
        self.cursor
    }

    /// Terminal position of the glyph for the cell at `coords`.
    fn cell_position(&self, (x, y): Coord2) -> (u16, u16) {
        (2 + 4 * u16::from(x), GRID_TOP + 1 + 2 * u16::from(y))
    }

    fn status_row(&self) -> u16 {
        GRID_TOP + 2 * u16::from(self.height) + 1
    }

    /// Header plus the full box grid, every cell hidden.
    pub fn draw_frame(&self, out: &mut impl Write) -> io::Result<()> {
        queue!(out, MoveTo(0, HEADER_ROW), Print(HEADER))?;

        for y in 0..=self.height {
            let row = GRID_TOP + 2 * u16::from(y);
            queue!(out, MoveTo(0, row), Print(self.border_row(y)))?;
            if y < self.height {
                queue!(out, MoveTo(0, row + 1), Print(self.cell_row()))?;
            }
        }
        Ok(())
    }

    fn border_row(&self, y: Coord) -> String {
        let row_kind = if y == 0 {
            0
        } else if y == self.height {
            2
        } else {
            1
        };

        let mut line = String::new();
        for x in 0..=self.width {
            let col_kind = if x == 0 {
                0
            } else if x == self.width {
                2
            } else {
                1
            };
            line.push(BORDERS[row_kind][col_kind]);
            if x < self.width {
                for _ in 0..3 {
                    line.push(HORIZONTAL);
                }
            }
        }
        line
    }

    fn cell_row(&self) -> String {
        let mut line = String::new();
        for _ in 0..self.width {
            line.push(VERTICAL);
            line.push(' ');
            line.push(HIDDEN_GLYPH);
            line.push(' ');
        }
        line.push(VERTICAL);
        line
    }

    pub fn draw_tile(&self, out: &mut impl Write, coords: Coord2, tile: Tile) -> io::Result<()> {
        let (col, row) = self.cell_position(coords);
        queue!(out, MoveTo(col, row), Print(glyph(tile)))
    }

    pub fn draw_clock(&self, out: &mut impl Write, elapsed: Duration) -> io::Result<()> {
        queue!(
            out,
            MoveTo(self.time_col, HEADER_ROW),
            Print(format_clock(elapsed))
        )
    }

    pub fn draw_status(&self, out: &mut impl Write, message: &str) -> io::Result<()> {
        queue!(out, MoveTo(0, self.status_row()), Print(message))
    }

    /// Puts the terminal cursor back on the active cell.
    pub fn sync_cursor(&self, out: &mut impl Write) -> io::Result<()> {
        let (col, row) = self.cell_position(self.cursor);
        queue!(out, MoveTo(col, row))
    }

    /// Moves the cell cursor one step, stopping at the board edge.
    pub fn step(&mut self, direction: Direction) -> bool {
        let (x, y) = self.cursor;
        let next = match direction {
            Direction::Left if x > 0 => (x - 1, y),
            Direction::Right if x < self.width - 1 => (x + 1, y),
            Direction::Up if y > 0 => (x, y - 1),
            Direction::Down if y < self.height - 1 => (x, y + 1),
            _ => return false,
        };
        self.cursor = next;
        true
    }
}

pub fn glyph(tile: Tile) -> char {
    match tile {
        Tile::Hidden => HIDDEN_GLYPH,
        Tile::Flagged => FLAG_GLYPH,
        Tile::Mine => MINE_GLYPH,
        Tile::Open(0) => ' ',
        Tile::Open(hint) => char::from_digit(u32::from(hint), 10).unwrap_or('?'),
    }
}

pub fn format_clock(elapsed: Duration) -> String {
    let total = elapsed.as_secs();
    format!("{:02}:{:02}", total / 60, total % 60)
}
