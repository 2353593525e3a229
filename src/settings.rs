use crate::converter::RenderConfig;
use crate::ramp::CharacterRamp;
use crate::{PlayerError, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Player settings, loadable from a JSON file. Missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlayerSettings {
    /// Character ramp index
    pub ramp: usize,
    /// Invert brightness mapping
    pub invert: bool,
    /// Vertical compression factor for glyph cells
    pub aspect_correction: f64,
    /// Initial playback speed multiplier
    pub speed: f64,
    /// Fixed grid width, terminal width when unset
    pub columns: Option<u16>,
    /// Fixed grid height, terminal height when unset
    pub rows: Option<u16>,
    /// Draw the stats line under the grid
    pub show_stats: bool,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        let render = RenderConfig::default();
        Self {
            ramp: render.ramp_index,
            invert: render.invert,
            aspect_correction: render.aspect_correction,
            speed: 1.0,
            columns: None,
            rows: None,
            show_stats: true,
        }
    }
}

impl PlayerSettings {
    /// Read settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let settings = serde_json::from_str(&text)?;
        debug!("Loaded settings from {}: {:?}", path.display(), settings);
        Ok(settings)
    }

    pub fn render_config(&self) -> RenderConfig {
        RenderConfig {
            ramp_index: self.ramp,
            invert: self.invert,
            aspect_correction: self.aspect_correction,
        }
    }

    /// Both grid dimensions were fixed explicitly
    pub fn fixed_grid(&self) -> bool {
        self.columns.is_some() && self.rows.is_some()
    }

    pub fn validate(&self, ramps: &[CharacterRamp]) -> Result<()> {
        self.render_config().validate(ramps)?;
        if !(self.speed.is_finite() && self.speed > 0.0) {
            return Err(PlayerError::InvalidConfig(
                "Speed factor must be greater than 0".to_string(),
            ));
        }
        if self.columns == Some(0) {
            return Err(PlayerError::InvalidConfig(
                "Terminal width must be greater than 0".to_string(),
            ));
        }
        if self.rows == Some(0) {
            return Err(PlayerError::InvalidConfig(
                "Terminal height must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
