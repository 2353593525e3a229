use crate::converter::MAX_ASPECT_CORRECTION;
use crate::ramp::RAMPS;
use crate::settings::PlayerSettings;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "ASCII video player for the terminal", long_about = None)]
pub struct Cli {
    /// Path to the video file to play
    #[arg(required_unless_present = "list_ramps")]
    pub file_path: Option<PathBuf>,

    /// Load player settings from a JSON file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Character ramp index (see --list-ramps)
    #[arg(short, long)]
    pub ramp: Option<usize>,

    /// Invert the brightness mapping
    #[arg(short, long)]
    pub invert: bool,

    /// Vertical compression factor for glyph cells
    #[arg(short, long, value_name = "FACTOR")]
    pub aspect: Option<f64>,

    /// Set playback speed factor
    #[arg(short, long)]
    pub speed: Option<f64>,

    /// Set terminal width (override automatic detection)
    #[arg(short, long)]
    pub width: Option<u16>,

    /// Set terminal height (override automatic detection)
    #[arg(long)]
    pub height: Option<u16>,

    /// Hide the stats line
    #[arg(long)]
    pub no_stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Show video information only (don't play)
    #[arg(long)]
    pub info_only: bool,

    /// List the available character ramps and exit
    #[arg(long)]
    pub list_ramps: bool,

    /// Render a single frame as text and exit
    #[arg(long, value_name = "FRAME")]
    pub snapshot: Option<u64>,

    /// Write the snapshot to a file instead of stdout
    #[arg(short, long, value_name = "PATH", requires = "snapshot")]
    pub output: Option<PathBuf>,
}

impl Cli {
    /// Validate command line arguments
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.file_path {
            if !path.exists() {
                return Err(format!("Video file does not exist: {}", path.display()));
            }
        }

        if let Some(speed) = self.speed {
            if speed <= 0.0 {
                return Err("Speed factor must be greater than 0".to_string());
            }
        }

        if let Some(aspect) = self.aspect {
            if aspect <= 0.0 {
                return Err("Aspect correction must be greater than 0".to_string());
            }
            if aspect > MAX_ASPECT_CORRECTION {
                return Err(format!(
                    "Aspect correction must be at most {}",
                    MAX_ASPECT_CORRECTION
                ));
            }
        }

        if let Some(ramp) = self.ramp {
            if ramp >= RAMPS.len() {
                return Err(format!(
                    "Character ramp index {} out of range (0-{})",
                    ramp,
                    RAMPS.len() - 1
                ));
            }
        }

        if self.width == Some(0) {
            return Err("Terminal width must be greater than 0".to_string());
        }

        if self.height == Some(0) {
            return Err("Terminal height must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Settings from the config file (or defaults) with command line
    /// overrides applied on top
    pub fn settings(&self) -> crate::Result<PlayerSettings> {
        let mut settings = match &self.config {
            Some(path) => PlayerSettings::load(path)?,
            None => PlayerSettings::default(),
        };

        if let Some(ramp) = self.ramp {
            settings.ramp = ramp;
        }
        if self.invert {
            settings.invert = true;
        }
        if let Some(aspect) = self.aspect {
            settings.aspect_correction = aspect;
        }
        if let Some(speed) = self.speed {
            settings.speed = speed;
        }
        if self.width.is_some() {
            settings.columns = self.width;
        }
        if self.height.is_some() {
            settings.rows = self.height;
        }
        if self.no_stats {
            settings.show_stats = false;
        }

        settings.validate(RAMPS)?;
        Ok(settings)
    }

    /// Get effective terminal dimensions
    pub fn get_terminal_size(settings: &PlayerSettings) -> Result<(u16, u16), std::io::Error> {
        match (settings.columns, settings.rows) {
            (Some(w), Some(h)) => Ok((w, h)),
            (Some(w), None) => {
                let (_, h) = crossterm::terminal::size()?;
                Ok((w, h))
            }
            (None, Some(h)) => {
                let (w, _) = crossterm::terminal::size()?;
                Ok((w, h))
            }
            (None, None) => crossterm::terminal::size(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ascii-video-player").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn test_file_required_unless_listing() {
        assert!(Cli::try_parse_from(["ascii-video-player"]).is_err());
        let cli = parse(&["--list-ramps"]);
        assert!(cli.list_ramps);
        assert!(cli.file_path.is_none());
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_output_requires_snapshot() {
        assert!(Cli::try_parse_from(["ascii-video-player", "a.mp4", "-o", "out.txt"]).is_err());
        let cli = parse(&["a.mp4", "--snapshot", "12", "-o", "out.txt"]);
        assert_eq!(cli.snapshot, Some(12));
        assert_eq!(cli.output, Some(PathBuf::from("out.txt")));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let missing = parse(&["definitely-missing.mp4"]);
        assert!(missing.validate().unwrap_err().contains("does not exist"));

        let cases = [
            (vec!["--list-ramps", "--speed", "0"], "Speed factor must be greater than 0"),
            (vec!["--list-ramps", "--aspect", "0"], "Aspect correction must be greater than 0"),
            (vec!["--list-ramps", "--aspect", "1e10"], "Aspect correction must be at most 8"),
            (vec!["--list-ramps", "--ramp", "6"], "out of range"),
            (vec!["--list-ramps", "--width", "0"], "Terminal width must be greater than 0"),
            (vec!["--list-ramps", "--height", "0"], "Terminal height must be greater than 0"),
        ];
        for (args, message) in cases {
            let err = parse(&args).validate().unwrap_err();
            assert!(err.contains(message), "{:?} -> {}", args, err);
        }
    }

    #[test]
    fn test_settings_overrides() {
        let cli = parse(&["--list-ramps", "-r", "3", "-i", "-s", "2", "-w", "100", "--no-stats"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.ramp, 3);
        assert!(settings.invert);
        assert_eq!(settings.speed, 2.0);
        assert_eq!(settings.columns, Some(100));
        assert_eq!(settings.rows, None);
        assert!(!settings.show_stats);
        assert!(!settings.fixed_grid());
    }

    #[test]
    fn test_settings_file_then_flags() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "ramp": 1, "speed": 0.5, "rows": 30 }}"#).unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = parse(&["--list-ramps", "-c", &path, "-s", "1.5"]);
        let settings = cli.settings().unwrap();
        assert_eq!(settings.ramp, 1);
        assert_eq!(settings.speed, 1.5);
        assert_eq!(settings.rows, Some(30));
    }
}
