use ascii_video_player::{
    cli::Cli,
    ramp::{self, RAMPS},
    run_playback,
    utils::format_duration,
    DecodeAndDiscard, FrameConverter, FrameSource, PlaybackController, PlayerError,
    PlayerSettings, Renderer, SeekStrategy, TerminalInput, VideoDecoder,
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, error, info};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Grid used when neither the settings nor the terminal give a size
const FALLBACK_GRID: (u16, u16) = (80, 24);

/// Yield between control loop passes
const IDLE: Duration = Duration::from_millis(1);

/// How long a fatal playback error stays on screen
const ERROR_PAUSE: Duration = Duration::from_secs(2);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs share the terminal with the grid, so keep them quiet by default
    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Debug);
    }
    logger.init();

    if let Err(e) = cli.validate() {
        error!("Invalid arguments: {}", e);
        std::process::exit(1);
    }

    if cli.list_ramps {
        for line in ramp::describe(RAMPS) {
            println!("{}", line);
        }
        return Ok(());
    }

    let settings = match cli.settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid settings: {}", e);
            std::process::exit(1);
        }
    };
    let Some(path) = cli.file_path.as_deref() else {
        error!("No video file given");
        std::process::exit(1);
    };

    info!("Starting ASCII Video Player v{}", ascii_video_player::VERSION);

    if cli.info_only {
        return print_info(path);
    }

    if let Some(frame) = cli.snapshot {
        return snapshot(path, &settings, frame, cli.output.as_deref());
    }

    play(path, &settings).await
}

fn print_info(path: &Path) -> Result<()> {
    info!("Info-only mode: loading video information");
    let decoder = VideoDecoder::new(path)?;
    let (width, height) = decoder.dimensions();

    println!("Video Information:");
    println!("  File: {}", path.display());
    println!("  Dimensions: {}x{}", width, height);
    println!("  Frame Rate: {:.2} FPS", decoder.frame_rate());
    println!("  Duration: {}", format_duration(decoder.duration()));
    match decoder.total_frames() {
        Some(total) => println!("  Total Frames: {}", total),
        None => println!("  Total Frames: Unknown"),
    }
    println!("  Aspect Ratio: {:.2}", width as f64 / height.max(1) as f64);
    Ok(())
}

/// Render one frame to text without touching the terminal state
fn snapshot(path: &Path, settings: &PlayerSettings, frame: u64, output: Option<&Path>) -> Result<()> {
    let mut decoder = VideoDecoder::new(path)?;
    let total = decoder.total_frames();
    if total.is_some_and(|total| frame >= total) {
        return Err(PlayerError::SeekOutOfRange {
            target: frame as i64,
            total,
        }
        .into());
    }

    let reached = DecodeAndDiscard.seek_to(&mut decoder, frame)?;
    let pixels = match decoder.next_frame()? {
        Some(pixels) if reached == frame => pixels,
        _ => {
            return Err(PlayerError::SeekOutOfRange {
                target: frame as i64,
                total: Some(reached),
            }
            .into())
        }
    };

    let (columns, rows) = Cli::get_terminal_size(settings).unwrap_or(FALLBACK_GRID);
    let converter = FrameConverter::new(RAMPS, columns as u32, rows as u32)?;
    let grid = converter.convert(&pixels, &settings.render_config())?;
    debug!(
        "Snapshot of frame {}: {}x{} grid",
        frame,
        grid.columns(),
        grid.rows()
    );

    let text = grid.into_string();
    match output {
        Some(out) => {
            std::fs::write(out, &text)
                .with_context(|| format!("Failed to write snapshot to {}", out.display()))?;
            info!("Snapshot written to {}", out.display());
        }
        None => print!("{}", text),
    }
    Ok(())
}

async fn play(path: &Path, settings: &PlayerSettings) -> Result<()> {
    info!("Playing: {}", path.display());
    let decoder = VideoDecoder::new(path)?;
    let (video_width, video_height) = decoder.dimensions();
    info!(
        "Video info: {}x{}, {:.2} FPS, {} duration",
        video_width,
        video_height,
        decoder.frame_rate(),
        format_duration(decoder.duration())
    );

    let renderer = Renderer::new()?;
    let (term_width, term_height) = renderer.dimensions();
    let columns = settings.columns.unwrap_or(term_width);
    let rows = settings.rows.unwrap_or(term_height);
    let grid_rows = if settings.show_stats {
        rows.saturating_sub(1).max(1)
    } else {
        rows
    };
    let converter = FrameConverter::new(RAMPS, columns as u32, grid_rows as u32)?;

    let mut controller = PlaybackController::new(
        decoder,
        renderer,
        converter,
        settings.render_config(),
        settings.speed,
        Instant::now(),
    )?
    .with_stats(settings.show_stats);

    controller.display_mut().init()?;
    controller.play(Instant::now());

    let mut input = TerminalInput::new(!settings.fixed_grid());
    let result = run_playback(&mut controller, &mut input, IDLE).await;
    if let Err(e) = &result {
        error!("Playback error: {}", e);
        controller
            .display_mut()
            .display_error(&format!("Playback error: {}", e))?;
        sleep(ERROR_PAUSE).await;
    }

    info!("Cleaning up and exiting");
    controller.display_mut().cleanup()?;

    let frames = result?;
    debug!("Rendered {} frames", frames);
    Ok(())
}
