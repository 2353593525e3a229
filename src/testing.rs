//! In-memory collaborators for unit tests.

use crate::converter::CharacterGrid;
use crate::decoder::FrameSource;
use crate::frame::PixelBuffer;
use crate::player::FrameStats;
use crate::renderer::GridDisplay;
use crate::{PlayerError, Result};

/// Fixed-length stream of 8x8 gray frames whose brightness depends on the
/// frame position, so every position renders differently.
pub struct ScriptedSource {
    pub frames: u64,
    pub fps: f64,
    pub position: u64,
    pub resets: u32,
    pub fail_at: Option<u64>,
    pub report_total: bool,
}

impl ScriptedSource {
    pub fn new(frames: usize, fps: f64) -> Self {
        Self {
            frames: frames as u64,
            fps,
            position: 0,
            resets: 0,
            fail_at: None,
            report_total: true,
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        if Some(self.position) == self.fail_at {
            return Err(PlayerError::InvalidFrame("scripted failure".into()));
        }
        if self.position >= self.frames {
            return Ok(None);
        }
        let brightness = (self.position * 37 % 256) as u8;
        self.position += 1;
        PixelBuffer::filled_gray(8, 8, brightness).map(Some)
    }

    fn reset_to_start(&mut self) -> Result<()> {
        self.position = 0;
        self.resets += 1;
        Ok(())
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn total_frames(&self) -> Option<u64> {
        self.report_total.then_some(self.frames)
    }
}

#[derive(Default)]
pub struct RecordingDisplay {
    pub grids: Vec<String>,
    pub stats: Vec<Option<FrameStats>>,
    pub messages: Vec<String>,
    pub size: Option<(u16, u16)>,
}

impl GridDisplay for RecordingDisplay {
    fn render(&mut self, grid: &CharacterGrid, stats: Option<&FrameStats>) -> Result<()> {
        self.grids.push(grid.as_str().to_string());
        self.stats.push(stats.cloned());
        Ok(())
    }

    fn show_message(&mut self, message: &str) -> Result<()> {
        self.messages.push(message.to_string());
        Ok(())
    }

    fn resize(&mut self, columns: u16, rows: u16) {
        self.size = Some((columns, rows));
    }
}
