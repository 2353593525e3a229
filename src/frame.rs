use crate::{PlayerError, Result};

/// Raw decoded image, `width * height * channels` bytes in row-major order.
///
/// Channel count is 1 (grayscale) or 3 (RGB). The buffer is validated on
/// construction and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Wrap raw pixel bytes, rejecting zero dimensions and mismatched lengths
    pub fn new(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(PlayerError::InvalidFrame(format!(
                "zero dimension {}x{}",
                width, height
            )));
        }
        if channels != 1 && channels != 3 {
            return Err(PlayerError::InvalidFrame(format!(
                "unsupported channel count {}",
                channels
            )));
        }
        let expected = width as usize * height as usize * channels as usize;
        if data.len() != expected {
            return Err(PlayerError::InvalidFrame(format!(
                "expected {} bytes for {}x{}x{}, got {}",
                expected,
                width,
                height,
                channels,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    /// Build from parts the caller has already sized correctly
    pub(crate) fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        debug_assert_eq!(
            data.len(),
            width as usize * height as usize * channels as usize
        );
        Self {
            width,
            height,
            channels,
            data,
        }
    }

    /// Single-channel buffer filled with one value
    pub fn filled_gray(width: u32, height: u32, value: u8) -> Result<Self> {
        Self::new(
            width,
            height,
            1,
            vec![value; width as usize * height as usize],
        )
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Byte offset of channel `c` at `(x, y)`
    #[inline]
    pub fn index(&self, x: u32, y: u32, c: u8) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize + c as usize
    }

    /// Channel value at `(x, y)`; callers keep coordinates in bounds
    #[inline]
    pub fn sample(&self, x: u32, y: u32, c: u8) -> u8 {
        self.data[self.index(x, y, c)]
    }

    pub fn is_grayscale(&self) -> bool {
        self.channels == 1
    }
}

impl TryFrom<image::RgbImage> for PixelBuffer {
    type Error = PlayerError;

    fn try_from(img: image::RgbImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, 3, img.into_raw())
    }
}

impl TryFrom<image::GrayImage> for PixelBuffer {
    type Error = PlayerError;

    fn try_from(img: image::GrayImage) -> Result<Self> {
        let (width, height) = img.dimensions();
        Self::new(width, height, 1, img.into_raw())
    }
}

impl TryFrom<image::DynamicImage> for PixelBuffer {
    type Error = PlayerError;

    /// Grayscale images stay single-channel, everything else becomes RGB
    fn try_from(img: image::DynamicImage) -> Result<Self> {
        if img.color().has_color() {
            Self::try_from(img.into_rgb8())
        } else {
            Self::try_from(img.into_luma8())
        }
    }
}
