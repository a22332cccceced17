use std::io::{self, Stdout, Write, stdout};

use anyhow::{Context, Result};
use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::style::Color;
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use log::warn;

/// Something the game can draw a frame of character cells onto.
pub trait Surface {
    fn clear(&mut self);
    fn set_cell(&mut self, x: i32, y: i32, ch: char, fg: Color, bg: Color);
    fn flush(&mut self) -> io::Result<()>;
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub fg: Color,
    pub bg: Color,
}

const BLANK: Cell = Cell { ch: ' ', fg: Color::Reset, bg: Color::Reset };

/// An in-memory grid of cells. Writes outside the grid are dropped.
pub struct ScreenBuffer {
    width: u16,
    height: u16,
    cells: Vec<Cell>,
}

impl ScreenBuffer {
    pub fn new(width: u16, height: u16) -> Self {
        ScreenBuffer { width, height, cells: vec![BLANK; width as usize * height as usize] }
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        if (width, height) != (self.width, self.height) {
            *self = ScreenBuffer::new(width, height);
        }
    }

    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<Cell> {
        self.index(x, y).map(|i| self.cells[i])
    }

    /// The characters of row `y`, handy for checking text.
    pub fn row_text(&self, y: i32) -> String {
        (0..self.width as i32).filter_map(|x| self.cell(x, y)).map(|c| c.ch).collect()
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.width as usize * y as usize + x as usize)
    }
}

impl Surface for ScreenBuffer {
    fn clear(&mut self) {
        self.cells.iter_mut().for_each(|c| *c = BLANK);
    }

    fn set_cell(&mut self, x: i32, y: i32, ch: char, fg: Color, bg: Color) {
        if let Some(i) = self.index(x, y) {
            self.cells[i] = Cell { ch, fg, bg };
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Owns the real terminal for as long as it lives. Frames are composed in a
/// [`ScreenBuffer`] and written out on `flush`.
pub struct TermManager {
    stdout: Stdout,
    screen: ScreenBuffer,
}

impl TermManager {
    pub fn setup() -> Result<Self> {
        let (width, height) = terminal::size().context("Error reading terminal size")?;
        let mut stdout = stdout();

        terminal::enable_raw_mode().context("Error enabling raw mode")?;
        execute!(stdout, EnterAlternateScreen, cursor::Hide, terminal::Clear(ClearType::All))
            .context("Error entering alternate screen")?;

        Ok(TermManager { stdout, screen: ScreenBuffer::new(width, height) })
    }

    fn restore(&mut self) -> io::Result<()> {
        execute!(self.stdout, style::ResetColor, cursor::Show, LeaveAlternateScreen)?;
        terminal::disable_raw_mode()
    }
}

impl Surface for TermManager {
    fn clear(&mut self) {
        if let Ok((width, height)) = terminal::size() {
            if (width, height) != self.screen.size() {
                self.screen.resize(width, height);
                // Stale characters would otherwise survive outside the new grid
                let _ = queue!(self.stdout, terminal::Clear(ClearType::All));
            }
        }
        self.screen.clear();
    }

    fn set_cell(&mut self, x: i32, y: i32, ch: char, fg: Color, bg: Color) {
        self.screen.set_cell(x, y, ch, fg, bg);
    }

    fn flush(&mut self) -> io::Result<()> {
        let (width, height) = self.screen.size();
        let mut colors = None;

        for y in 0..height {
            queue!(self.stdout, cursor::MoveTo(0, y))?;
            for x in 0..width {
                let cell = match self.screen.cell(x as i32, y as i32) {
                    Some(cell) => cell,
                    None => continue,
                };
                if colors != Some((cell.fg, cell.bg)) {
                    queue!(self.stdout, style::SetForegroundColor(cell.fg), style::SetBackgroundColor(cell.bg))?;
                    colors = Some((cell.fg, cell.bg));
                }
                queue!(self.stdout, style::Print(cell.ch))?;
            }
        }

        queue!(self.stdout, style::ResetColor)?;
        self.stdout.flush()
    }
}

impl Drop for TermManager {
    fn drop(&mut self) {
        if let Err(e) = self.restore() {
            warn!("Error restoring terminal: {}", e);
        }
    }
}
