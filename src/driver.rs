use crate::controls::{Command, CommandSource, HELP_TEXT};
use crate::decoder::FrameSource;
use crate::player::PlaybackController;
use crate::renderer::GridDisplay;
use crate::Result;
use log::{info, warn};
use std::time::{Duration, Instant};
use tokio::time::sleep;

/// Run the control loop until a quit command arrives.
///
/// Each pass drains pending commands, ticks the controller (which renders
/// when a frame is due), then yields for `idle`. A quit seen while draining
/// takes effect after that pass's tick. Returns the number of frames shown.
pub async fn run_playback<S, D, C>(
    controller: &mut PlaybackController<S, D>,
    input: &mut C,
    idle: Duration,
) -> Result<u64>
where
    S: FrameSource,
    D: GridDisplay,
    C: CommandSource + ?Sized,
{
    let mut show_help = false;

    loop {
        let mut quit = false;
        for command in input.poll()? {
            match command {
                Command::Quit => {
                    info!("Quit requested by user");
                    quit = true;
                }
                Command::ToggleHelp => {
                    show_help = !show_help;
                    let shown = if show_help {
                        controller.display_mut().show_message(HELP_TEXT)
                    } else {
                        controller.redraw(Instant::now())
                    };
                    if let Err(e) = shown {
                        warn!("Failed to toggle help: {}", e);
                    }
                }
                command => controller.handle(command, Instant::now()),
            }
        }

        if !show_help {
            controller.tick(Instant::now());
        }

        if quit {
            break;
        }
        sleep(idle).await;
    }

    let frames = controller.clock().frames_emitted();
    info!("Playback finished. Total frames: {}", frames);
    Ok(frames)
}
