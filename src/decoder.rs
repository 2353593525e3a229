use crate::frame::PixelBuffer;
use crate::{PlayerError, Result};
use ffmpeg_next as ffmpeg;
use log::{debug, info, warn};
use std::path::Path;

/// Frame rate used when the stream does not report one
pub const FALLBACK_FPS: f64 = 25.0;

/// Sequential source of decoded frames.
///
/// Only forward decoding and a rewind to the start are assumed; random
/// access is left to seek strategies that know more about the stream.
pub trait FrameSource {
    /// Next decoded frame, `Ok(None)` at end of stream
    fn next_frame(&mut self) -> Result<Option<PixelBuffer>>;

    /// Rewind so the next frame returned is the first one
    fn reset_to_start(&mut self) -> Result<()>;

    /// Native frame rate in frames per second
    fn frame_rate(&self) -> f64;

    /// Total frame count, `None` when the stream does not say
    fn total_frames(&self) -> Option<u64>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        (**self).next_frame()
    }

    fn reset_to_start(&mut self) -> Result<()> {
        (**self).reset_to_start()
    }

    fn frame_rate(&self) -> f64 {
        (**self).frame_rate()
    }

    fn total_frames(&self) -> Option<u64> {
        (**self).total_frames()
    }
}

/// RGB24 scaler together with the input layout it was built for
struct Scaler {
    format: ffmpeg::format::Pixel,
    width: u32,
    height: u32,
    context: ffmpeg::software::scaling::Context,
}

/// Video decoder that extracts RGB frames from video files
pub struct VideoDecoder {
    input_context: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: Option<Scaler>,
    eof_sent: bool,
    position: u64,
    fps: f64,
    duration: f64,
    total_frames: Option<u64>,
}

impl VideoDecoder {
    /// Open a video file and prepare its best video stream for decoding
    pub fn new(path: &Path) -> Result<Self> {
        ffmpeg::init().map_err(|e| init_error(format!("FFmpeg init failed: {}", e)))?;

        debug!("Attempting to open video file: {}", path.display());
        let input_context = ffmpeg::format::input(&path).map_err(|e| {
            init_error(format!(
                "Failed to open video file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let stream = input_context
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| {
                init_error(format!("No video stream found in file '{}'", path.display()))
            })?;
        let stream_index = stream.index();
        info!(
            "Found video stream {} in file '{}'",
            stream_index,
            path.display()
        );

        let context_decoder =
            ffmpeg::codec::context::Context::from_parameters(stream.parameters())
                .map_err(|e| init_error(format!("Failed to create codec context: {}", e)))?;
        let decoder = context_decoder
            .decoder()
            .video()
            .map_err(|e| init_error(format!("Failed to create video decoder: {}", e)))?;

        let rate = stream.rate();
        let fps = if rate.numerator() > 0 && rate.denominator() > 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            FALLBACK_FPS
        };

        let duration = if input_context.duration() != ffmpeg::ffi::AV_NOPTS_VALUE {
            input_context.duration() as f64 / ffmpeg::ffi::AV_TIME_BASE as f64
        } else {
            0.0
        };

        let total_frames = if stream.frames() > 0 {
            Some(stream.frames() as u64)
        } else if duration > 0.0 {
            Some((duration * fps) as u64)
        } else {
            None
        };

        debug!(
            "Video info: {}x{}, {:.2} FPS, {:.2}s duration, {:?} frames",
            decoder.width(),
            decoder.height(),
            fps,
            duration,
            total_frames
        );

        Ok(Self {
            input_context,
            stream_index,
            decoder,
            scaler: None,
            eof_sent: false,
            position: 0,
            fps,
            duration,
            total_frames,
        })
    }

    /// Get video duration in seconds, 0 when unknown
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Get video dimensions
    pub fn dimensions(&self) -> (u32, u32) {
        (self.decoder.width(), self.decoder.height())
    }

    /// Frames returned since the last rewind
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Next packet belonging to the video stream
    fn next_packet(&mut self) -> Option<ffmpeg::Packet> {
        let stream_index = self.stream_index;
        self.input_context
            .packets()
            .find(|(stream, _)| stream.index() == stream_index)
            .map(|(_, packet)| packet)
    }
}

impl FrameSource for VideoDecoder {
    fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
        let mut decoded = ffmpeg::frame::Video::empty();

        loop {
            match self.decoder.receive_frame(&mut decoded) {
                Ok(()) => match convert_frame(&mut self.scaler, &decoded) {
                    Ok(frame) => {
                        self.position += 1;
                        debug!(
                            "Decoded frame {}: {}x{}",
                            self.position,
                            frame.width(),
                            frame.height()
                        );
                        return Ok(Some(frame));
                    }
                    Err(e) => {
                        warn!("Skipping frame that failed to convert: {}", e);
                        continue;
                    }
                },
                Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::util::error::EAGAIN => {
                    // needs more input
                }
                Err(e) => warn!("Skipping frame that failed to decode: {}", e),
            }

            if self.eof_sent {
                return Ok(None);
            }

            match self.next_packet() {
                Some(packet) => {
                    if let Err(e) = self.decoder.send_packet(&packet) {
                        warn!("Skipping undecodable packet: {}", e);
                    }
                }
                None => {
                    self.decoder.send_eof()?;
                    self.eof_sent = true;
                }
            }
        }
    }

    fn reset_to_start(&mut self) -> Result<()> {
        self.input_context.seek(0, ..0)?;
        self.decoder.flush();
        self.eof_sent = false;
        self.position = 0;
        debug!("Decoder rewound to start");
        Ok(())
    }

    fn frame_rate(&self) -> f64 {
        self.fps
    }

    fn total_frames(&self) -> Option<u64> {
        self.total_frames
    }
}

/// Convert an FFmpeg frame to a packed RGB pixel buffer. The scaler is
/// rebuilt whenever the input format or size changes.
fn convert_frame(
    scaler: &mut Option<Scaler>,
    frame: &ffmpeg::frame::Video,
) -> Result<PixelBuffer> {
    let format = frame.format();
    let width = frame.width();
    let height = frame.height();

    let stale = !matches!(
        scaler,
        Some(current) if current.format == format && current.width == width && current.height == height
    );
    if stale {
        debug!("Building RGB scaler for {:?} {}x{}", format, width, height);
        let context = ffmpeg::software::scaling::Context::get(
            format,
            width,
            height,
            ffmpeg::format::Pixel::RGB24,
            width,
            height,
            ffmpeg::software::scaling::Flags::BILINEAR,
        )?;
        *scaler = Some(Scaler {
            format,
            width,
            height,
            context,
        });
    }

    let mut rgb_frame = ffmpeg::frame::Video::empty();
    if let Some(current) = scaler.as_mut() {
        current.context.run(frame, &mut rgb_frame)?;
    }

    // rows may be padded past width * 3
    let stride = rgb_frame.stride(0);
    let row_bytes = width as usize * 3;
    if stride < row_bytes || row_bytes == 0 {
        return Err(PlayerError::InvalidFrame(format!(
            "RGB plane stride {} too small for width {}",
            stride, width
        )));
    }
    let plane = rgb_frame.data(0);
    let mut data = Vec::with_capacity(row_bytes * height as usize);
    for row in plane.chunks(stride).take(height as usize) {
        let row = row.get(..row_bytes).ok_or_else(|| {
            PlayerError::InvalidFrame(format!("short RGB row in {}x{} frame", width, height))
        })?;
        data.extend_from_slice(row);
    }

    PixelBuffer::new(width, height, 3, data)
}

fn init_error(reason: String) -> PlayerError {
    PlayerError::Initialization {
        component: "decoder",
        reason,
    }
}
