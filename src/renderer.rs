use crate::converter::CharacterGrid;
use crate::player::FrameStats;
use crate::{PlayerError, Result};
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use log::debug;
use std::io::{stdout, Stdout, Write};

/// Where character grids end up. Rendering is fire-and-forget per frame.
pub trait GridDisplay {
    /// Draw one grid, with the stats line when `stats` is given
    fn render(&mut self, grid: &CharacterGrid, stats: Option<&FrameStats>) -> Result<()>;

    /// Replace the screen with a text message
    fn show_message(&mut self, message: &str) -> Result<()>;

    /// The drawable area changed size
    fn resize(&mut self, _columns: u16, _rows: u16) {}
}

/// Terminal renderer for character grids
pub struct Renderer {
    stdout: Stdout,
    terminal_width: u16,
    terminal_height: u16,
    active: bool,
}

impl Renderer {
    /// Create a renderer bound to stdout, which must be a terminal
    pub fn new() -> Result<Self> {
        if !atty::is(atty::Stream::Stdout) {
            return Err(PlayerError::Initialization {
                component: "display",
                reason: "stdout is not a terminal".to_string(),
            });
        }
        let (terminal_width, terminal_height) =
            crossterm::terminal::size().map_err(|e| PlayerError::Initialization {
                component: "display",
                reason: format!("cannot query terminal size: {}", e),
            })?;

        Ok(Self {
            stdout: stdout(),
            terminal_width,
            terminal_height,
            active: false,
        })
    }

    /// Initialize the terminal for rendering
    pub fn init(&mut self) -> Result<()> {
        enable_raw_mode()?;
        execute!(self.stdout, Hide, Clear(ClearType::All))?;
        self.active = true;
        debug!("Terminal initialized for rendering");
        Ok(())
    }

    /// Restore terminal to normal state
    pub fn cleanup(&mut self) -> Result<()> {
        if !self.active {
            return Ok(());
        }
        execute!(self.stdout, Show, ResetColor, Clear(ClearType::All), MoveTo(0, 0))?;
        disable_raw_mode()?;
        self.active = false;
        debug!("Terminal restored to normal state");
        Ok(())
    }

    /// Get current terminal dimensions
    pub fn dimensions(&self) -> (u16, u16) {
        (self.terminal_width, self.terminal_height)
    }

    fn draw_status(&mut self, status: &str) -> Result<()> {
        let status_y = self.terminal_height.saturating_sub(1);
        queue!(
            self.stdout,
            MoveTo(0, status_y),
            SetForegroundColor(Color::White),
            SetBackgroundColor(Color::DarkGrey),
            Print(fit_to_width(status, self.terminal_width)),
            ResetColor
        )?;
        Ok(())
    }

    /// Display error message
    pub fn display_error(&mut self, error: &str) -> Result<()> {
        execute!(self.stdout, Clear(ClearType::All))?;

        let y = self.terminal_height / 2;
        let x = (self.terminal_width / 2).saturating_sub(error.chars().count() as u16 / 2);

        execute!(
            self.stdout,
            MoveTo(x, y),
            SetForegroundColor(Color::Red),
            Print("ERROR: "),
            Print(error),
            ResetColor
        )?;

        debug!("Error displayed: {}", error);
        Ok(())
    }
}

impl GridDisplay for Renderer {
    fn render(&mut self, grid: &CharacterGrid, stats: Option<&FrameStats>) -> Result<()> {
        let start_time = std::time::Instant::now();

        let (offset_x, offset_y) = centered_offset(
            (self.terminal_width, self.terminal_height),
            (grid.columns(), grid.rows()),
        );

        queue!(self.stdout, Clear(ClearType::All))?;
        for (i, line) in grid.lines().enumerate() {
            queue!(
                self.stdout,
                MoveTo(offset_x, offset_y.saturating_add(i as u16)),
                Print(line)
            )?;
        }

        if let Some(stats) = stats {
            self.draw_status(&stats.status_line())?;
        }
        self.stdout.flush()?;

        debug!(
            "Frame rendered in {}ms ({}x{} in {}x{} at offset {},{})",
            start_time.elapsed().as_millis(),
            grid.columns(),
            grid.rows(),
            self.terminal_width,
            self.terminal_height,
            offset_x,
            offset_y
        );
        Ok(())
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        let lines: Vec<&str> = message.lines().collect();
        let start_y = (self.terminal_height / 2).saturating_sub(lines.len() as u16 / 2);

        queue!(self.stdout, Clear(ClearType::All), SetForegroundColor(Color::Yellow))?;
        for (i, line) in lines.iter().enumerate() {
            let x = (self.terminal_width / 2).saturating_sub(line.chars().count() as u16 / 2);
            queue!(self.stdout, MoveTo(x, start_y + i as u16), Print(line))?;
        }
        queue!(self.stdout, ResetColor)?;
        self.stdout.flush()?;

        debug!("Message displayed: {}", message);
        Ok(())
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.terminal_width = columns;
        self.terminal_height = rows;
        debug!("Terminal dimensions updated: {}x{}", columns, rows);
    }
}

impl Drop for Renderer {
    fn drop(&mut self) {
        // Ensure terminal is restored on drop
        let _ = self.cleanup();
    }
}

/// Top-left corner that centers a grid in the terminal
pub fn centered_offset(terminal: (u16, u16), grid: (u32, u32)) -> (u16, u16) {
    let grid_w = grid.0.min(u16::MAX as u32) as u16;
    let grid_h = grid.1.min(u16::MAX as u32) as u16;
    (
        terminal.0.saturating_sub(grid_w) / 2,
        terminal.1.saturating_sub(grid_h) / 2,
    )
}

/// Truncate to at most `width` characters
pub fn fit_to_width(text: &str, width: u16) -> &str {
    match text.char_indices().nth(width as usize) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_offset() {
        assert_eq!(centered_offset((80, 24), (40, 10)), (20, 7));
        assert_eq!(centered_offset((80, 24), (80, 24)), (0, 0));
        assert_eq!(centered_offset((10, 5), (200, 100)), (0, 0));
    }

    #[test]
    fn test_fit_to_width() {
        assert_eq!(fit_to_width("Frame: 12", 5), "Frame");
        assert_eq!(fit_to_width("short", 80), "short");
        assert_eq!(fit_to_width("▶ playing", 1), "▶");
        assert_eq!(fit_to_width("abc", 0), "");
    }
}
