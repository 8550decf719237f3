//! Frame Source Library for Zone Monitoring
//!
//! Treats video as an opaque, strictly sequential stream of RGB frames.
//! Supports:
//! - Image-sequence input (a directory of decoded-on-demand frames)
//! - Image-sequence output for annotated frames
//! - Overlay rendering of the zone outline, person boxes and event banner

pub mod frame;
pub mod overlay;
pub mod sequence;

pub use frame::VideoFrame;
pub use overlay::{annotate, EventBanner, OverlayBox};
pub use sequence::{ImageSequenceSink, ImageSequenceSource};

use thiserror::Error;

/// Frame rate assumed when a source cannot report one
pub const DEFAULT_FPS: f64 = 25.0;

/// Frame source error types
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to open source: {0}")]
    Open(String),

    #[error("Failed to decode frame: {0}")]
    Decode(String),

    #[error("Failed to write frame: {0}")]
    Write(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),
}

/// Sequential frame provider.
///
/// `Ok(None)` marks the end of the stream and is not an error.
pub trait FrameSource {
    /// Native frame rate, if the source knows it
    fn fps(&self) -> Option<f64>;

    /// Acquire the next frame; may block on I/O
    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError>;
}

/// Sequential frame consumer (annotated output)
pub trait FrameSink {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError>;

    /// Flush anything buffered; called once after the last frame
    fn finish(&mut self) -> Result<(), SourceError> {
        Ok(())
    }
}

/// Frame rate to use for timing math: the source's own rate when it is a
/// usable positive number, otherwise [`DEFAULT_FPS`].
pub fn effective_fps(fps: Option<f64>) -> f64 {
    match fps {
        Some(f) if f.is_finite() && f > 0.0 => f,
        _ => DEFAULT_FPS,
    }
}
