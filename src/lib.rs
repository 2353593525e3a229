//! ASCII Video Player - real-time ASCII rendering of decoded video frames
//!
//! Frames pulled from a [`FrameSource`] are resized to fit a character grid,
//! reduced to brightness and mapped onto a [`CharacterRamp`]. A
//! [`PlaybackController`] paces that pipeline against the wall clock and
//! handles play, pause, stop, speed and seek commands.

pub mod cli;
pub mod controls;
pub mod converter;
pub mod decoder;
pub mod driver;
pub mod frame;
pub mod player;
pub mod ramp;
pub mod renderer;
pub mod seek;
pub mod settings;

#[cfg(test)]
mod testing;

pub use cli::Cli;
pub use controls::{Command, CommandSource, SeekTarget, TerminalInput};
pub use converter::{
    brightness_to_glyph, frame_to_character_grid, resize_keeping_aspect, to_grayscale,
    CharacterGrid, FrameConverter, RenderConfig,
};
pub use decoder::{FrameSource, VideoDecoder};
pub use driver::run_playback;
pub use frame::PixelBuffer;
pub use player::{FrameStats, PlaybackClock, PlaybackController, PlaybackState, TickOutcome};
pub use ramp::{CharacterRamp, RAMPS};
pub use renderer::{GridDisplay, Renderer};
pub use seek::{DecodeAndDiscard, SeekStrategy};
pub use settings::PlayerSettings;

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Package name
pub const PACKAGE_NAME: &str = env!("CARGO_PKG_NAME");

/// Error types used throughout the application
#[derive(thiserror::Error, Debug)]
pub enum PlayerError {
    #[error("Video decoding error: {0}")]
    VideoDecoding(#[from] ffmpeg_next::Error),

    #[error("Failed to initialize {component}: {reason}")]
    Initialization {
        component: &'static str,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Seek target {target} is out of range (video has {} frames)", seek_bound(.total))]
    SeekOutOfRange { target: i64, total: Option<u64> },

    #[error("Settings file error: {0}")]
    Settings(#[from] serde_json::Error),
}

fn seek_bound(total: &Option<u64>) -> String {
    utils::format_total(*total)
}

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, PlayerError>;

/// Utility functions
pub mod utils {
    use std::time::Duration;

    /// Format duration in a human-readable way
    pub fn format_duration(seconds: f64) -> String {
        let total_seconds = seconds.max(0.0) as u64;
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let secs = total_seconds % 60;

        if hours > 0 {
            format!("{}:{:02}:{:02}", hours, minutes, secs)
        } else {
            format!("{}:{:02}", minutes, secs)
        }
    }

    /// Interval between frames for a source rate and speed multiplier
    pub fn frame_interval(fps: f64, speed: f64) -> Duration {
        Duration::from_secs_f64(1.0 / (fps * speed))
    }

    /// Format an optional frame total, `?` when the stream does not say
    pub fn format_total(total: Option<u64>) -> String {
        match total {
            Some(total) => total.to_string(),
            None => "?".to_string(),
        }
    }
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        brightness_to_glyph, frame_to_character_grid, resize_keeping_aspect, run_playback,
        to_grayscale, utils::*, CharacterGrid, CharacterRamp, Cli, Command, CommandSource,
        DecodeAndDiscard, FrameConverter, FrameSource, FrameStats, GridDisplay, PixelBuffer,
        PlaybackClock, PlaybackController, PlaybackState, PlayerError, PlayerSettings,
        RenderConfig, Result, SeekStrategy, SeekTarget, TickOutcome, VideoDecoder, RAMPS,
    };
}
