use crate::controls::{Command, SeekTarget};
use crate::converter::{CharacterGrid, FrameConverter, RenderConfig};
use crate::decoder::FrameSource;
use crate::ramp;
use crate::renderer::GridDisplay;
use crate::seek::{DecodeAndDiscard, SeekStrategy};
use crate::utils::{format_total, frame_interval};
use crate::{PlayerError, Result};
use log::{debug, error, info, warn};
use std::time::{Duration, Instant};

/// Slowest speed reachable through `SpeedDown`
pub const MIN_SPEED: f64 = 0.25;
/// Fastest speed reachable through `SpeedUp`
pub const MAX_SPEED: f64 = 4.0;
/// Multiplier applied per speed step
pub const SPEED_STEP: f64 = 1.25;

/// Playback state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    pub fn label(&self) -> &'static str {
        match self {
            PlaybackState::Stopped => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }
}

/// Frame pacing: when the last frame went out and how long until the next
#[derive(Debug, Clone, Copy)]
pub struct PlaybackClock {
    last_frame_at: Instant,
    interval: Duration,
    frames_emitted: u64,
}

impl PlaybackClock {
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            last_frame_at: now,
            interval,
            frames_emitted: 0,
        }
    }

    /// Restart the interval from `now`
    pub fn reset(&mut self, now: Instant) {
        self.last_frame_at = now;
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn since_last(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_frame_at)
    }

    /// A full interval has passed since the last frame
    pub fn is_due(&self, now: Instant) -> bool {
        self.since_last(now) >= self.interval
    }

    /// Record a frame emitted at `now`
    pub fn mark(&mut self, now: Instant) {
        self.last_frame_at = now;
        self.frames_emitted += 1;
    }

    pub fn frames_emitted(&self) -> u64 {
        self.frames_emitted
    }

    pub fn last_frame_at(&self) -> Instant {
        self.last_frame_at
    }
}

/// What a call to [`PlaybackController::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Not playing
    Idle,
    /// Playing, but the next frame is not due yet
    Waiting,
    /// One frame was decoded and rendered
    Advanced,
    /// The stream ended and playback wrapped to the start
    Looped,
}

/// Snapshot for the stats line
#[derive(Debug, Clone, PartialEq)]
pub struct FrameStats {
    pub state: PlaybackState,
    pub frame_index: u64,
    pub total_frames: Option<u64>,
    pub target_fps: f64,
    pub speed: f64,
    pub ramp_name: &'static str,
    pub inverted: bool,
    pub since_last_frame: Duration,
    pub notice: Option<String>,
}

impl FrameStats {
    pub fn status_line(&self) -> String {
        let mut line = format!(
            "{} | Frame: {}/{} | FPS: {:.1} | Speed: {:.2}x | Ramp: {}{} | Last: {}ms",
            self.state.label(),
            self.frame_index,
            format_total(self.total_frames),
            self.target_fps,
            self.speed,
            self.ramp_name,
            if self.inverted { " (inverted)" } else { "" },
            self.since_last_frame.as_millis()
        );
        if let Some(notice) = &self.notice {
            line.push_str(" | ");
            line.push_str(notice);
        }
        line
    }
}

/// Owns playback state and drives the frame pipeline once per due tick.
///
/// All mutation happens from the single control loop between ticks.
pub struct PlaybackController<S: FrameSource, D: GridDisplay> {
    source: S,
    display: D,
    converter: FrameConverter,
    seeker: Box<dyn SeekStrategy>,
    config: RenderConfig,
    defaults: RenderConfig,
    state: PlaybackState,
    speed: f64,
    initial_speed: f64,
    source_fps: f64,
    total_frames: Option<u64>,
    frame_index: u64,
    clock: PlaybackClock,
    show_stats: bool,
    notice: Option<String>,
    last_grid: Option<CharacterGrid>,
}

impl<S: FrameSource, D: GridDisplay> PlaybackController<S, D> {
    /// Create a stopped controller. `config` and `speed` also become the
    /// values restored by [`Command::ResetDefaults`].
    pub fn new(
        source: S,
        display: D,
        converter: FrameConverter,
        config: RenderConfig,
        speed: f64,
        now: Instant,
    ) -> Result<Self> {
        config.validate(converter.ramps())?;
        validate_speed(speed)?;

        let source_fps = source.frame_rate();
        if !(source_fps.is_finite() && source_fps > 0.0) {
            return Err(PlayerError::Initialization {
                component: "decoder",
                reason: format!("invalid frame rate {}", source_fps),
            });
        }
        let total_frames = source.total_frames();

        debug!(
            "Controller ready: {:.2} FPS source, {} frames, speed {:.2}x",
            source_fps,
            format_total(total_frames),
            speed
        );

        Ok(Self {
            source,
            display,
            converter,
            seeker: Box::new(DecodeAndDiscard),
            config,
            defaults: config,
            state: PlaybackState::Stopped,
            speed,
            initial_speed: speed,
            source_fps,
            total_frames,
            frame_index: 0,
            clock: PlaybackClock::new(frame_interval(source_fps, speed), now),
            show_stats: true,
            notice: None,
            last_grid: None,
        })
    }

    /// Replace the seek strategy
    pub fn with_seek_strategy(mut self, seeker: Box<dyn SeekStrategy>) -> Self {
        self.seeker = seeker;
        self
    }

    pub fn with_stats(mut self, show_stats: bool) -> Self {
        self.show_stats = show_stats;
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }

    /// Effective frames per second after the speed multiplier
    pub fn target_fps(&self) -> f64 {
        self.source_fps * self.speed
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    /// Latest rejected-command message
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut D {
        &mut self.display
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn stats(&self, now: Instant) -> FrameStats {
        FrameStats {
            state: self.state,
            frame_index: self.frame_index,
            total_frames: self.total_frames,
            target_fps: self.target_fps(),
            speed: self.speed,
            ramp_name: self.converter.ramps()[self.config.ramp_index].name(),
            inverted: self.config.invert,
            since_last_frame: self.clock.since_last(now),
            notice: self.notice.clone(),
        }
    }

    /// Stopped rewinds first; Paused resumes in place. Always restarts the
    /// pacing interval.
    pub fn play(&mut self, now: Instant) {
        match self.state {
            PlaybackState::Stopped => {
                self.rewind();
                info!("Playing video");
            }
            PlaybackState::Paused => info!("Playback resumed"),
            PlaybackState::Playing => {}
        }
        self.state = PlaybackState::Playing;
        self.clock.reset(now);
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
            info!("Playback paused");
        }
    }

    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
        self.rewind();
        info!("Playback stopped");
    }

    /// Rejects non-positive multipliers without changing anything
    pub fn set_speed(&mut self, multiplier: f64) -> Result<()> {
        validate_speed(multiplier)?;
        self.speed = multiplier;
        self.clock
            .set_interval(frame_interval(self.source_fps, multiplier));
        info!(
            "Speed: {:.2}x ({:.2} FPS)",
            multiplier,
            self.target_fps()
        );
        Ok(())
    }

    /// Move to an absolute frame. Negative targets, and targets at or past
    /// a known total, are rejected. With an unknown total any forward
    /// target is attempted and the reached position is kept.
    pub fn seek(&mut self, target: i64) -> Result<u64> {
        let past_end = self
            .total_frames
            .is_some_and(|total| target >= 0 && target as u64 >= total);
        if target < 0 || past_end {
            return Err(PlayerError::SeekOutOfRange {
                target,
                total: self.total_frames,
            });
        }

        let reached = self.seeker.seek_to(&mut self.source, target as u64)?;
        self.frame_index = reached;
        if self.state == PlaybackState::Stopped {
            self.state = PlaybackState::Paused;
        }
        info!("Seeked to frame {}", reached);
        Ok(reached)
    }

    pub fn select_ramp(&mut self, index: usize) -> Result<()> {
        let name = ramp::get(self.converter.ramps(), index)
            .ok_or_else(|| {
                PlayerError::InvalidConfig(format!(
                    "Character ramp index {} out of range (0..{})",
                    index,
                    self.converter.ramps().len()
                ))
            })?
            .name();
        self.config.ramp_index = index;
        info!("Switched to character ramp {}: {}", index, name);
        Ok(())
    }

    pub fn toggle_invert(&mut self) {
        self.config.invert = !self.config.invert;
        info!(
            "Brightness inversion: {}",
            if self.config.invert { "ON" } else { "OFF" }
        );
    }

    pub fn toggle_stats(&mut self) {
        self.show_stats = !self.show_stats;
    }

    /// Restore the creation-time render config and speed
    pub fn reset_defaults(&mut self) -> Result<()> {
        self.config = self.defaults;
        self.set_speed(self.initial_speed)?;
        self.notice = None;
        info!("Reset to default settings");
        Ok(())
    }

    pub fn set_grid_size(&mut self, columns: u32, rows: u32) -> Result<()> {
        self.converter.set_grid_size(columns, rows)
    }

    pub fn grid_size(&self) -> (u32, u32) {
        self.converter.grid_size()
    }

    /// Draw the most recent grid again, e.g. after an overlay covered it
    pub fn redraw(&mut self, now: Instant) -> Result<()> {
        let stats = self.show_stats.then(|| self.stats(now));
        match &self.last_grid {
            Some(grid) => self.display.render(grid, stats.as_ref()),
            None => Ok(()),
        }
    }

    /// Advance at most one frame, and only once the pacing interval has
    /// elapsed since the previous one. Decode exhaustion or failure wraps
    /// playback to the start.
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        if self.state != PlaybackState::Playing {
            return TickOutcome::Idle;
        }
        if !self.clock.is_due(now) {
            return TickOutcome::Waiting;
        }

        let since_last = self.clock.since_last(now);
        let frame = match self.source.next_frame() {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                info!("End of video reached - looping");
                return self.wrap_around(now);
            }
            Err(e) => {
                warn!("Frame decode failed, restarting from the beginning: {}", e);
                return self.wrap_around(now);
            }
        };

        self.frame_index += 1;
        self.clock.mark(now);

        match self.converter.convert(&frame, &self.config) {
            Ok(grid) => {
                let stats = self.show_stats.then(|| FrameStats {
                    since_last_frame: since_last,
                    ..self.stats(now)
                });
                if let Err(e) = self.display.render(&grid, stats.as_ref()) {
                    warn!("Render failed: {}", e);
                }
                self.last_grid = Some(grid);
            }
            Err(e) => warn!("Error converting frame {}: {}", self.frame_index, e),
        }

        TickOutcome::Advanced
    }

    /// Apply a control command. Errors leave state unchanged.
    pub fn apply(&mut self, command: Command, now: Instant) -> Result<()> {
        match command {
            Command::Play => self.play(now),
            Command::Pause => self.pause(),
            Command::TogglePause => {
                if self.state == PlaybackState::Playing {
                    self.pause()
                } else {
                    self.play(now)
                }
            }
            Command::Stop => self.stop(),
            Command::SetSpeed(multiplier) => self.set_speed(multiplier)?,
            // a speed already past a bound stays put rather than jumping back to it
            Command::SpeedUp => {
                self.set_speed((self.speed * SPEED_STEP).min(MAX_SPEED.max(self.speed)))?
            }
            Command::SpeedDown => {
                self.set_speed((self.speed / SPEED_STEP).max(MIN_SPEED.min(self.speed)))?
            }
            Command::Seek(SeekTarget::Absolute(frame)) => {
                self.seek(frame)?;
            }
            Command::Seek(SeekTarget::Relative(delta)) => {
                self.seek(self.frame_index as i64 + delta)?;
            }
            Command::SelectRamp(index) => self.select_ramp(index)?,
            Command::ToggleInvert => self.toggle_invert(),
            Command::ResetDefaults => self.reset_defaults()?,
            Command::ToggleStats => self.toggle_stats(),
            Command::Resize { columns, rows } => {
                let grid_rows = if self.show_stats {
                    rows.saturating_sub(1).max(1)
                } else {
                    rows
                };
                self.set_grid_size(columns as u32, grid_rows as u32)?;
                self.display.resize(columns, rows);
            }
            Command::ToggleHelp | Command::Quit => {}
        }
        Ok(())
    }

    /// [`apply`](Self::apply), reporting a rejection on the stats line
    pub fn handle(&mut self, command: Command, now: Instant) {
        match self.apply(command, now) {
            Ok(()) => {}
            Err(e) => {
                warn!("Ignoring {:?}: {}", command, e);
                self.notice = Some(e.to_string());
            }
        }
    }

    fn wrap_around(&mut self, now: Instant) -> TickOutcome {
        self.rewind();
        self.clock.reset(now);
        TickOutcome::Looped
    }

    fn rewind(&mut self) {
        if let Err(e) = self.source.reset_to_start() {
            error!("Failed to rewind video: {}", e);
        }
        self.frame_index = 0;
    }
}

fn validate_speed(multiplier: f64) -> Result<()> {
    if !(multiplier.is_finite() && multiplier > 0.0) {
        return Err(PlayerError::InvalidConfig(format!(
            "Speed factor must be greater than 0, got {}",
            multiplier
        )));
    }
    Ok(())
}
