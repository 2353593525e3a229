use crate::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;
use std::time::Duration;

/// Frames skipped by one LEFT/RIGHT press
pub const SEEK_STEP: i64 = 10;

pub const HELP_TEXT: &str = r#"ASCII Video Player Controls:

SPACE       - Play/Pause
S           - Stop
LEFT/RIGHT  - Seek 10 frames
UP/DOWN     - Speed
1-9         - Character ramp
I           - Invert brightness
R           - Reset settings
T           - Toggle stats line
H           - Toggle this help
Q/ESC       - Quit

Video loops automatically. Press H again to hide this help."#;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SeekTarget {
    Absolute(i64),
    /// Offset from the current frame index
    Relative(i64),
}

/// Discrete control commands
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Play,
    Pause,
    TogglePause,
    Stop,
    SetSpeed(f64),
    SpeedUp,
    SpeedDown,
    Seek(SeekTarget),
    SelectRamp(usize),
    ToggleInvert,
    ResetDefaults,
    ToggleStats,
    ToggleHelp,
    Resize { columns: u16, rows: u16 },
    Quit,
}

/// Map a key press to a command
pub fn command_for_key(key: KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    let command = match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Char(' ') => Command::TogglePause,
        KeyCode::Char('s') => Command::Stop,
        KeyCode::Right => Command::Seek(SeekTarget::Relative(SEEK_STEP)),
        KeyCode::Left => Command::Seek(SeekTarget::Relative(-SEEK_STEP)),
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => Command::SpeedUp,
        KeyCode::Down | KeyCode::Char('-') => Command::SpeedDown,
        KeyCode::Char(digit @ '1'..='9') => Command::SelectRamp(digit as usize - '1' as usize),
        KeyCode::Char('i') => Command::ToggleInvert,
        KeyCode::Char('r') => Command::ResetDefaults,
        KeyCode::Char('t') => Command::ToggleStats,
        KeyCode::Char('h') => Command::ToggleHelp,
        _ => return None,
    };
    Some(command)
}

/// Map a terminal event to a command. Resizes only count when the grid
/// follows the terminal size.
pub fn command_for_event(event: Event, follow_resize: bool) -> Option<Command> {
    match event {
        Event::Key(key) => command_for_key(key),
        Event::Resize(columns, rows) if follow_resize => Some(Command::Resize { columns, rows }),
        _ => None,
    }
}

/// Anything that can be drained for pending commands
pub trait CommandSource {
    /// Pending commands, without blocking
    fn poll(&mut self) -> Result<Vec<Command>>;
}

/// Keyboard and resize events from the terminal
pub struct TerminalInput {
    follow_resize: bool,
}

impl TerminalInput {
    pub fn new(follow_resize: bool) -> Self {
        Self { follow_resize }
    }
}

impl CommandSource for TerminalInput {
    fn poll(&mut self) -> Result<Vec<Command>> {
        let mut commands = Vec::new();
        while event::poll(Duration::ZERO)? {
            let event = event::read()?;
            if let Some(command) = command_for_event(event, self.follow_resize) {
                debug!("Command: {:?}", command);
                commands.push(command);
            }
        }
        Ok(commands)
    }
}
