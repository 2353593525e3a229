//! Seek strategies.
//!
//! A compressed stream is only assumed to decode forwards, so the default
//! [`DecodeAndDiscard`] rewinds and decodes its way to the target. An
//! index-aware strategy can replace it without touching the controller.

use crate::decoder::FrameSource;
use crate::Result;
use log::{debug, warn};

/// Moves a [`FrameSource`] to an absolute frame position
pub trait SeekStrategy {
    /// Position `source` so its next frame is `target`, returning the
    /// position actually reached
    fn seek_to(&mut self, source: &mut dyn FrameSource, target: u64) -> Result<u64>;
}

/// Rewind to the start, then decode and drop `target` frames. O(target).
#[derive(Debug, Default, Clone, Copy)]
pub struct DecodeAndDiscard;

impl SeekStrategy for DecodeAndDiscard {
    fn seek_to(&mut self, source: &mut dyn FrameSource, target: u64) -> Result<u64> {
        source.reset_to_start()?;

        let mut consumed = 0;
        while consumed < target {
            match source.next_frame() {
                Ok(Some(_)) => consumed += 1,
                Ok(None) => break,
                Err(e) => {
                    warn!("Decode failed at frame {} while seeking: {}", consumed, e);
                    break;
                }
            }
        }

        if consumed < target {
            debug!(
                "Stream ended after {} frames while seeking to {}",
                consumed, target
            );
        }
        Ok(consumed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::PixelBuffer;
    use crate::PlayerError;

    struct CountingSource {
        frames: u64,
        position: u64,
        fail_at: Option<u64>,
        resets: u32,
    }

    impl CountingSource {
        fn new(frames: u64) -> Self {
            Self {
                frames,
                position: 0,
                fail_at: None,
                resets: 0,
            }
        }
    }

    impl FrameSource for CountingSource {
        fn next_frame(&mut self) -> Result<Option<PixelBuffer>> {
            if Some(self.position) == self.fail_at {
                return Err(PlayerError::InvalidFrame("corrupt".into()));
            }
            if self.position >= self.frames {
                return Ok(None);
            }
            self.position += 1;
            PixelBuffer::filled_gray(2, 2, self.position as u8).map(Some)
        }

        fn reset_to_start(&mut self) -> Result<()> {
            self.position = 0;
            self.resets += 1;
            Ok(())
        }

        fn frame_rate(&self) -> f64 {
            30.0
        }

        fn total_frames(&self) -> Option<u64> {
            Some(self.frames)
        }
    }

    #[test]
    fn test_seek_consumes_exact_count() {
        let mut source = CountingSource::new(100);
        source.position = 40;
        let reached = DecodeAndDiscard.seek_to(&mut source, 25).unwrap();
        assert_eq!(reached, 25);
        assert_eq!(source.position, 25);
        assert_eq!(source.resets, 1);
    }

    #[test]
    fn test_seek_zero_only_rewinds() {
        let mut source = CountingSource::new(10);
        source.position = 7;
        assert_eq!(DecodeAndDiscard.seek_to(&mut source, 0).unwrap(), 0);
        assert_eq!(source.position, 0);
    }

    #[test]
    fn test_short_stream_stops_where_decoding_ends() {
        let mut source = CountingSource::new(5);
        assert_eq!(DecodeAndDiscard.seek_to(&mut source, 12).unwrap(), 5);
    }

    #[test]
    fn test_decode_error_ends_seek() {
        let mut source = CountingSource::new(50);
        source.fail_at = Some(3);
        assert_eq!(DecodeAndDiscard.seek_to(&mut source, 10).unwrap(), 3);
    }
}
