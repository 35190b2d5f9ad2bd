/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (array of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// Layout, one terminal column per map cell:
///   rows 0..h      map, with the four actors drawn over their cells
///   row  h+1       status line
///   rows h+3..h+5  key help

use std::io::{self, BufWriter, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::domain::actor::{Actor, Player};
use crate::domain::tile::Tile;
use crate::sim::world::WorldView;

const HELP: [&str; 3] = [
    "Use WASD to move the FIRE character",
    "Use IJKL to move the WATER character.",
    "ESC to quit.",
];

const STATUS_GAP: usize = 1;
const HELP_GAP: usize = 3;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
struct Cell {
    ch: [u8; 4],
    ch_len: u8,
    fg: Color,
    bg: Color,
}

impl Cell {
    const BASE_FG: Color = Color::White;
    const BASE_BG: Color = Color::Black;

    const BLANK: Cell = Cell {
        ch: [b' ', 0, 0, 0],
        ch_len: 1,
        fg: Cell::BASE_FG,
        bg: Cell::BASE_BG,
    };

    /// Differs from any real cell, so every position is diff'd.
    const INVALID: Cell = Cell {
        ch: [b'?', 0, 0, 0],
        ch_len: 1,
        fg: Color::Magenta,
        bg: Color::Magenta,
    };

    fn from_char(c: char, fg: Color, bg: Color) -> Self {
        let mut cell = Self::BLANK;
        cell.ch_len = c.encode_utf8(&mut cell.ch).len() as u8;
        cell.fg = if fg == Color::Reset { Self::BASE_FG } else { fg };
        cell.bg = if bg == Color::Reset { Self::BASE_BG } else { bg };
        cell
    }

    fn from_tile(tile: Tile) -> Self {
        Self::from_char(tile.glyph(), tile.fg(), tile.bg())
    }

    fn as_str(&self) -> &str {
        std::str::from_utf8(&self.ch[..self.ch_len as usize]).unwrap_or("?")
    }
}

// ── FrameBuffer: a 2D grid of Cells ──

struct FrameBuffer {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl FrameBuffer {
    fn new(w: usize, h: usize) -> Self {
        FrameBuffer { width: w, height: h, cells: vec![Cell::BLANK; w * h] }
    }

    fn resize(&mut self, w: usize, h: usize) {
        if self.width != w || self.height != h {
            self.width = w;
            self.height = h;
            self.cells = vec![Cell::BLANK; w * h];
        }
    }

    fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    fn set(&mut self, x: usize, y: usize, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = cell;
        }
    }

    fn get(&self, x: usize, y: usize) -> Cell {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x]
        } else {
            Cell::BLANK
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color) {
        for (i, ch) in s.chars().enumerate() {
            if x + i >= self.width {
                break;
            }
            self.set(x + i, y, Cell::from_char(ch, fg, Color::Reset));
        }
    }
}

// ── Renderer ──

pub struct Renderer {
    writer: BufWriter<io::Stdout>,
    front: FrameBuffer,
    back: FrameBuffer,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::with_capacity(16384, io::stdout()),
            front: FrameBuffer::new(0, 0),
            back: FrameBuffer::new(0, 0),
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            ResetColor,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.front.resize(w, h);
        self.back.resize(w, h);
        // Force full repaint: back differs from front everywhere.
        self.back.cells.fill(Cell::INVALID);
    }

    pub fn render(&mut self, view: &WorldView) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.front.width || th as usize != self.front.height {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.clear();
        compose(&mut self.front, view);
        self.flush_diff()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }

    // ── Diff flush: only write changed cells ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = Cell::BASE_FG;
        let mut last_bg = Cell::BASE_BG;
        let mut cursor_at: Option<(usize, usize)> = None;

        queue!(self.writer, SetForegroundColor(last_fg), SetBackgroundColor(last_bg))?;

        for y in 0..self.front.height {
            for x in 0..self.front.width {
                let cell = self.front.get(x, y);
                if cell == self.back.get(x, y) {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if cell.fg != last_fg {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = cell.fg;
                }
                if cell.bg != last_bg {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = cell.bg;
                }
                queue!(self.writer, Print(cell.as_str()))?;
                cursor_at = Some((x + 1, y));
            }
        }

        self.writer.flush()
    }
}

// ── Compose: build front buffer content ──

/// Draw one frame of the world. The read lock is held only while
/// copying the grid and status.
fn compose(buf: &mut FrameBuffer, view: &WorldView) {
    let height = {
        let state = view.read();
        for (y, row) in state.grid.rows().iter().enumerate() {
            for (x, &tile) in row.iter().enumerate() {
                buf.set(x, y, Cell::from_tile(tile));
            }
        }
        buf.put_str(0, state.grid.height() + STATUS_GAP, &state.status, Color::Yellow);
        state.grid.height()
    };

    // Enemies first so a caught player stays visible.
    for actor in [Actor::FireEnemy, Actor::WaterEnemy, Actor::FirePlayer, Actor::WaterPlayer] {
        let pos = view.position(actor);
        if pos.x >= 0 && pos.y >= 0 && (pos.y as usize) < height {
            buf.set(pos.x as usize, pos.y as usize, Cell::from_tile(actor.overlay()));
        }
    }

    for (i, line) in HELP.iter().enumerate() {
        let fg = match i {
            0 => Player::Fire.actor().overlay().fg(),
            1 => Player::Water.actor().overlay().fg(),
            _ => Color::Grey,
        };
        buf.put_str(0, height + HELP_GAP + i, line, fg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::actor::Pos;
    use crate::sim::level::parse_map;
    use crate::sim::world::World;

    fn row_text(buf: &FrameBuffer, y: usize) -> String {
        let s: String = (0..buf.width).map(|x| buf.get(x, y).as_str().to_string()).collect();
        s.trim_end().to_string()
    }

    #[test]
    fn map_actors_status_and_help_land_on_their_rows() {
        let (view, writer, _) = World::split(parse_map("#F  f#\n#W~ w#"));
        writer.set_status("Fire extinguished");
        let mut buf = FrameBuffer::new(40, 8);
        compose(&mut buf, &view);

        assert_eq!(row_text(&buf, 0), "▤○  ◇▤");
        assert_eq!(row_text(&buf, 1), "▤●≈ ◆▤");
        assert_eq!(row_text(&buf, 2), "");
        assert_eq!(row_text(&buf, 3), "Fire extinguished");
        assert_eq!(row_text(&buf, 5), HELP[0]);
        assert_eq!(row_text(&buf, 6), HELP[1]);
        assert_eq!(row_text(&buf, 7), HELP[2]);
    }

    #[test]
    fn player_is_drawn_over_its_hunter() {
        let (view, _writer, handles) = World::split(parse_map("F w\nW f"));
        handles[3].set_position(Pos::new(0, 0));
        let mut buf = FrameBuffer::new(10, 10);
        compose(&mut buf, &view);
        assert_eq!(buf.get(0, 0), Cell::from_tile(Tile::FirePlayer));
    }

    #[test]
    fn reset_colors_map_to_base_colors() {
        let cell = Cell::from_tile(Tile::Empty);
        assert_eq!(cell.fg, Cell::BASE_FG);
        assert_eq!(cell.bg, Cell::BASE_BG);
        assert_eq!(Cell::from_tile(Tile::Wall).bg, Color::DarkGrey);
    }

    #[test]
    fn frame_is_clipped_to_the_terminal() {
        let (view, _writer, _) = World::split(parse_map("F         w\nW         f"));
        let mut buf = FrameBuffer::new(4, 2);
        compose(&mut buf, &view);
        assert_eq!(row_text(&buf, 0), "○");
        assert_eq!(row_text(&buf, 1), "●");
    }
}
