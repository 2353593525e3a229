use crate::frame::PixelBuffer;
use crate::ramp::{self, CharacterRamp};
use crate::{PlayerError, Result};
use log::debug;
use std::borrow::Cow;
use std::fmt;

/// Character grid produced from one frame: rows of glyphs, each row
/// terminated by `'\n'`, stored as one contiguous block of text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterGrid {
    text: String,
    columns: u32,
    rows: u32,
}

impl CharacterGrid {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Grid width in glyphs (excluding the line break)
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Grid height in rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.lines()
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for CharacterGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Glyph selection settings
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderConfig {
    /// Index into the ramp table
    pub ramp_index: usize,
    /// Map bright pixels toward the sparse end of the ramp
    pub invert: bool,
    /// Vertical compression factor, terminal cells are taller than wide
    pub aspect_correction: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            ramp_index: 0,
            invert: false,
            aspect_correction: 0.5,
        }
    }
}

impl RenderConfig {
    /// Check the config against a ramp table
    pub fn validate(&self, ramps: &[CharacterRamp]) -> Result<()> {
        if ramp::get(ramps, self.ramp_index).is_none() {
            return Err(PlayerError::InvalidConfig(format!(
                "Character ramp index {} out of range (0..{})",
                self.ramp_index,
                ramps.len()
            )));
        }
        validate_aspect(self.aspect_correction)
    }
}

/// Largest accepted aspect correction; each source row becomes at most
/// this many text rows
pub const MAX_ASPECT_CORRECTION: f64 = 8.0;

fn validate_aspect(aspect: f64) -> Result<()> {
    if !(aspect.is_finite() && aspect > 0.0) {
        return Err(PlayerError::InvalidConfig(format!(
            "Aspect correction must be greater than 0, got {}",
            aspect
        )));
    }
    if aspect > MAX_ASPECT_CORRECTION {
        return Err(PlayerError::InvalidConfig(format!(
            "Aspect correction must be at most {}, got {}",
            MAX_ASPECT_CORRECTION, aspect
        )));
    }
    Ok(())
}

/// Resize to fit within `max_cols x max_rows`, preserving the aspect ratio.
///
/// Both output dimensions are `round(dim * scale)` clamped to at least 1,
/// where `scale = min(max_cols / width, max_rows / height)`.
pub fn resize_keeping_aspect(src: &PixelBuffer, max_cols: u32, max_rows: u32) -> Result<PixelBuffer> {
    if max_cols == 0 || max_rows == 0 {
        return Err(PlayerError::InvalidConfig(format!(
            "target grid must be positive, got {}x{}",
            max_cols, max_rows
        )));
    }

    let width_ratio = max_cols as f64 / src.width() as f64;
    let height_ratio = max_rows as f64 / src.height() as f64;
    let scale = width_ratio.min(height_ratio);

    let new_width = ((src.width() as f64 * scale).round() as u32).max(1);
    let new_height = ((src.height() as f64 * scale).round() as u32).max(1);

    debug!(
        "Resizing {}x{} -> {}x{} (scale {:.4})",
        src.width(),
        src.height(),
        new_width,
        new_height,
        scale
    );

    Ok(resize_bilinear(src, new_width, new_height))
}

fn resize_bilinear(src: &PixelBuffer, new_width: u32, new_height: u32) -> PixelBuffer {
    let channels = src.channels();
    let mut data =
        Vec::with_capacity(new_width as usize * new_height as usize * channels as usize);

    let x_ratio = src.width() as f32 / new_width as f32;
    let y_ratio = src.height() as f32 / new_height as f32;

    for y in 0..new_height {
        let src_y = y as f32 * y_ratio;
        for x in 0..new_width {
            let src_x = x as f32 * x_ratio;
            for c in 0..channels {
                data.push(bilinear_sample(src, src_x, src_y, c));
            }
        }
    }

    PixelBuffer::from_raw(new_width, new_height, channels, data)
}

/// Blend the four neighbours of `(x, y)`; neighbours are clamped to the
/// image so edge pixels never read out of bounds.
fn bilinear_sample(src: &PixelBuffer, x: f32, y: f32, channel: u8) -> u8 {
    let max_x = src.width() - 1;
    let max_y = src.height() - 1;

    let x1 = (x.floor().max(0.0) as u32).min(max_x);
    let y1 = (y.floor().max(0.0) as u32).min(max_y);
    let x2 = (x1 + 1).min(max_x);
    let y2 = (y1 + 1).min(max_y);

    let fx = (x - x1 as f32).clamp(0.0, 1.0);
    let fy = (y - y1 as f32).clamp(0.0, 1.0);

    let p11 = src.sample(x1, y1, channel) as f32;
    let p21 = src.sample(x2, y1, channel) as f32;
    let p12 = src.sample(x1, y2, channel) as f32;
    let p22 = src.sample(x2, y2, channel) as f32;

    let value = p11 * (1.0 - fx) * (1.0 - fy)
        + p21 * fx * (1.0 - fy)
        + p12 * (1.0 - fx) * fy
        + p22 * fx * fy;

    value as u8
}

/// Luma of one RGB pixel, truncated
#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    (0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64) as u8
}

/// Single-channel copy of `src`
pub fn to_grayscale(src: &PixelBuffer) -> PixelBuffer {
    if src.is_grayscale() {
        return src.clone();
    }

    let data = src
        .data()
        .chunks_exact(src.channels() as usize)
        .map(|px| luma(px[0], px[1], px[2]))
        .collect();

    PixelBuffer::from_raw(src.width(), src.height(), 1, data)
}

/// Ramp index for a brightness value, using integer truncation
pub fn glyph_index(brightness: u8, ramp_len: usize, invert: bool) -> usize {
    if ramp_len == 0 {
        return 0;
    }
    let span = ramp_len - 1;
    let index = if invert {
        brightness as usize * span / 255
    } else {
        (255 - brightness as usize) * span / 255
    };
    index.min(span)
}

/// Map a brightness value onto `ramp`. Bright pixels land on the dense
/// start of the ramp, dark pixels on the sparse end, unless `invert` is set.
pub fn brightness_to_glyph(brightness: u8, ramp: &CharacterRamp, invert: bool) -> char {
    ramp.glyph(glyph_index(brightness, ramp.len(), invert))
}

/// Render a frame as text. Output keeps the source width; height is
/// `round(height * aspect_correction)`, at least one row.
pub fn frame_to_character_grid(
    src: &PixelBuffer,
    config: &RenderConfig,
    ramps: &[CharacterRamp],
) -> Result<CharacterGrid> {
    grid_with_row_limit(src, config, ramps, u32::MAX)
}

fn grid_with_row_limit(
    src: &PixelBuffer,
    config: &RenderConfig,
    ramps: &[CharacterRamp],
    max_rows: u32,
) -> Result<CharacterGrid> {
    config.validate(ramps)?;
    let char_ramp = &ramps[config.ramp_index];

    let gray: Cow<'_, PixelBuffer> = if src.is_grayscale() {
        Cow::Borrowed(src)
    } else {
        Cow::Owned(to_grayscale(src))
    };

    let aspect = config.aspect_correction;
    let columns = gray.width();
    let rows = ((gray.height() as f64 * aspect).round() as u32)
        .min(max_rows)
        .max(1);
    let last_row = gray.height() - 1;

    let mut text = String::with_capacity((columns as usize + 1) * rows as usize);
    for y in 0..rows {
        let src_y = ((y as f64 / aspect).round() as u32).min(last_row);
        for x in 0..columns {
            let brightness = gray.sample(x, src_y, 0);
            text.push(brightness_to_glyph(brightness, char_ramp, config.invert));
        }
        text.push('\n');
    }

    Ok(CharacterGrid {
        text,
        columns,
        rows,
    })
}

/// Frame to character grid for a fixed target grid size
#[derive(Debug, Clone)]
pub struct FrameConverter {
    ramps: &'static [CharacterRamp],
    columns: u32,
    rows: u32,
}

impl FrameConverter {
    /// Create a converter targeting a `columns x rows` character grid
    pub fn new(ramps: &'static [CharacterRamp], columns: u32, rows: u32) -> Result<Self> {
        validate_grid(columns, rows)?;
        Ok(Self {
            ramps,
            columns,
            rows,
        })
    }

    pub fn ramps(&self) -> &'static [CharacterRamp] {
        self.ramps
    }

    pub fn grid_size(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    pub fn set_grid_size(&mut self, columns: u32, rows: u32) -> Result<()> {
        validate_grid(columns, rows)?;
        self.columns = columns;
        self.rows = rows;
        debug!("Converter grid set to {}x{}", columns, rows);
        Ok(())
    }

    /// Source rows that compress to the grid height under `aspect`
    fn fit_rows(&self, aspect: f64) -> u32 {
        ((self.rows as f64 / aspect).floor() as u32).max(1)
    }

    /// Resize, then map to glyphs. The grid never exceeds the target rows.
    pub fn convert(&self, frame: &PixelBuffer, config: &RenderConfig) -> Result<CharacterGrid> {
        config.validate(self.ramps)?;
        let resized =
            resize_keeping_aspect(frame, self.columns, self.fit_rows(config.aspect_correction))?;
        grid_with_row_limit(&resized, config, self.ramps, self.rows)
    }
}

fn validate_grid(columns: u32, rows: u32) -> Result<()> {
    if columns == 0 || rows == 0 {
        return Err(PlayerError::InvalidConfig(format!(
            "Grid dimensions must be greater than 0, got {}x{}",
            columns, rows
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ramp::RAMPS;

    static TEST_RAMP: CharacterRamp =
        CharacterRamp::new("Test", &['@', '#', '*', '+', '=', '-', ':', '.', ' ']);

    fn rgb_frame(width: u32, height: u32, r: u8, g: u8, b: u8) -> PixelBuffer {
        let data = [r, g, b].repeat((width * height) as usize);
        PixelBuffer::new(width, height, 3, data).unwrap()
    }

    #[test]
    fn test_luminance_calculation() {
        assert_eq!(luma(0, 0, 0), 0);
        assert_eq!(luma(255, 0, 0), 76);
        assert_eq!(luma(0, 255, 0), 149);
        assert_eq!(luma(0, 0, 255), 29);
    }

    #[test]
    fn test_grayscale_idempotent() {
        let data: Vec<u8> = (0..20).map(|v| v * 12).collect();
        let gray = PixelBuffer::new(5, 4, 1, data).unwrap();
        assert_eq!(to_grayscale(&gray), gray);

        let once = to_grayscale(&rgb_frame(3, 3, 40, 90, 200));
        assert_eq!(once.channels(), 1);
        assert_eq!(to_grayscale(&once), once);
    }

    #[test]
    fn test_glyph_scenario() {
        assert_eq!(brightness_to_glyph(0, &TEST_RAMP, false), ' ');
        assert_eq!(brightness_to_glyph(255, &TEST_RAMP, false), '@');
        // (255 - 128) * 8 / 255 truncates to 3
        assert_eq!(glyph_index(128, TEST_RAMP.len(), false), 3);
        assert_eq!(brightness_to_glyph(128, &TEST_RAMP, false), '+');

        assert_eq!(brightness_to_glyph(0, &TEST_RAMP, true), '@');
        assert_eq!(brightness_to_glyph(255, &TEST_RAMP, true), ' ');
    }

    #[test]
    fn test_glyph_index_bounds_and_monotonic() {
        for len in [1usize, 2, 7, 9, 14, 70] {
            let mut prev_plain = usize::MAX;
            let mut prev_invert = 0;
            for b in 0..=255u8 {
                let plain = glyph_index(b, len, false);
                let inverted = glyph_index(b, len, true);
                assert!(plain < len && inverted < len);
                assert!(plain <= prev_plain);
                assert!(inverted >= prev_invert);
                prev_plain = plain;
                prev_invert = inverted;
            }
        }
    }

    #[test]
    fn test_resize_scenario_dimensions() {
        let src = PixelBuffer::filled_gray(10, 10, 50).unwrap();
        let out = resize_keeping_aspect(&src, 4, 4).unwrap();
        assert_eq!((out.width(), out.height()), (4, 4));
    }

    #[test]
    fn test_resize_preserves_aspect() {
        let cases = [
            (1920, 1080, 80, 48),
            (640, 480, 100, 30),
            (30, 200, 50, 50),
            (7, 3, 1, 1),
        ];
        for (w, h, max_w, max_h) in cases {
            let src = PixelBuffer::filled_gray(w, h, 0).unwrap();
            let out = resize_keeping_aspect(&src, max_w, max_h).unwrap();
            assert!(out.width() >= 1 && out.height() >= 1);
            assert!(out.width() <= max_w && out.height() <= max_h);

            let scale = (max_w as f64 / w as f64).min(max_h as f64 / h as f64);
            assert!((out.width() as f64 - w as f64 * scale).abs() <= 1.0);
            assert!((out.height() as f64 - h as f64 * scale).abs() <= 1.0);
        }
    }

    #[test]
    fn test_resize_rejects_zero_target() {
        let src = PixelBuffer::filled_gray(4, 4, 0).unwrap();
        assert!(resize_keeping_aspect(&src, 0, 4).is_err());
        assert!(resize_keeping_aspect(&src, 4, 0).is_err());
    }

    #[test]
    fn test_bilinear_blends_and_clamps_edges() {
        let src = PixelBuffer::new(2, 1, 1, vec![0, 200]).unwrap();
        let out = resize_bilinear(&src, 4, 1);
        assert_eq!(out.data(), &[0, 100, 200, 200]);
    }

    #[test]
    fn test_bilinear_per_channel() {
        let src = PixelBuffer::new(2, 1, 3, vec![0, 100, 255, 100, 0, 255]).unwrap();
        let out = resize_bilinear(&src, 4, 1);
        assert_eq!(&out.data()[3..6], &[50, 50, 255]);
    }

    #[test]
    fn test_grid_scenario() {
        let src = PixelBuffer::filled_gray(10, 10, 255).unwrap();
        let config = RenderConfig::default();
        let converter = FrameConverter::new(RAMPS, 4, 4).unwrap();
        let resized = resize_keeping_aspect(&src, 4, 4).unwrap();
        let grid = frame_to_character_grid(&resized, &config, RAMPS).unwrap();

        assert_eq!(grid.columns(), 4);
        assert_eq!(grid.rows(), 2);
        assert_eq!(grid.as_str(), "@@@@\n@@@@\n");
        assert_eq!(converter.convert(&src, &config).unwrap().columns(), 4);
    }

    #[test]
    fn test_grid_samples_aspect_rows() {
        // rows 0..4 have brightness 0, 85, 170, 255
        let data = (0..4u8).flat_map(|y| [y * 85; 2]).collect();
        let src = PixelBuffer::new(2, 4, 1, data).unwrap();
        let config = RenderConfig {
            ramp_index: 3,
            invert: true,
            ..Default::default()
        };
        let grid = frame_to_character_grid(&src, &config, RAMPS).unwrap();
        let lines: Vec<&str> = grid.lines().collect();
        // output row 1 samples source row 2
        assert_eq!(lines, vec!["##", "--"]);
        assert!(grid.as_str().ends_with('\n'));
    }

    #[test]
    fn test_grid_converts_rgb() {
        let src = rgb_frame(3, 2, 255, 255, 255);
        let config = RenderConfig {
            aspect_correction: 1.0,
            ..Default::default()
        };
        let grid = frame_to_character_grid(&src, &config, RAMPS).unwrap();
        assert_eq!(grid.rows(), 2);
        assert!(grid.lines().all(|line| line.chars().count() == 3));
    }

    #[test]
    fn test_grid_minimum_one_row() {
        let src = PixelBuffer::filled_gray(5, 1, 0).unwrap();
        let config = RenderConfig {
            aspect_correction: 0.2,
            ..Default::default()
        };
        let grid = frame_to_character_grid(&src, &config, RAMPS).unwrap();
        assert_eq!(grid.rows(), 1);
    }

    #[test]
    fn test_invalid_ramp_rejected() {
        let src = PixelBuffer::filled_gray(2, 2, 0).unwrap();
        let config = RenderConfig {
            ramp_index: RAMPS.len(),
            ..Default::default()
        };
        assert!(matches!(
            frame_to_character_grid(&src, &config, RAMPS),
            Err(PlayerError::InvalidConfig(_))
        ));

        let config = RenderConfig {
            aspect_correction: 0.0,
            ..Default::default()
        };
        assert!(config.validate(RAMPS).is_err());
    }

    #[test]
    fn test_converter_fills_rows() {
        let src = PixelBuffer::filled_gray(1920, 1080, 128).unwrap();
        let converter = FrameConverter::new(RAMPS, 80, 24).unwrap();
        let grid = converter.convert(&src, &RenderConfig::default()).unwrap();
        assert_eq!(grid.columns(), 80);
        assert!(grid.rows() <= 24);
        assert_eq!(grid.rows(), 23);
    }

    #[test]
    fn test_converter_tall_cells_stay_within_rows() {
        let src = PixelBuffer::filled_gray(1920, 1080, 128).unwrap();
        let converter = FrameConverter::new(RAMPS, 80, 24).unwrap();
        for aspect in [1.0, 2.0, 3.5, MAX_ASPECT_CORRECTION] {
            let config = RenderConfig {
                aspect_correction: aspect,
                ..Default::default()
            };
            let grid = converter.convert(&src, &config).unwrap();
            assert!(grid.rows() <= 24, "aspect {} gave {} rows", aspect, grid.rows());
            assert!(grid.columns() <= 80);
            assert_eq!(grid.lines().count() as u32, grid.rows());
        }

        // one source row would expand to 8 text rows, the budget is 5
        let small = FrameConverter::new(RAMPS, 10, 5).unwrap();
        let config = RenderConfig {
            aspect_correction: 8.0,
            ..Default::default()
        };
        let grid = small
            .convert(&PixelBuffer::filled_gray(10, 10, 0).unwrap(), &config)
            .unwrap();
        assert_eq!(grid.rows(), 5);
    }

    #[test]
    fn test_oversized_aspect_rejected() {
        let src = PixelBuffer::filled_gray(1920, 1080, 128).unwrap();
        let converter = FrameConverter::new(RAMPS, 80, 24).unwrap();
        for aspect in [8.5, 100.0, 1e10, f64::INFINITY] {
            let config = RenderConfig {
                aspect_correction: aspect,
                ..Default::default()
            };
            assert!(matches!(
                converter.convert(&src, &config),
                Err(PlayerError::InvalidConfig(_))
            ));
            assert!(frame_to_character_grid(&src, &config, RAMPS).is_err());
        }
    }

    #[test]
    fn test_converter_rejects_zero_grid() {
        assert!(FrameConverter::new(RAMPS, 0, 10).is_err());
        let mut converter = FrameConverter::new(RAMPS, 10, 10).unwrap();
        assert!(converter.set_grid_size(10, 0).is_err());
        assert_eq!(converter.grid_size(), (10, 10));
    }
}
