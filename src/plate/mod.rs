//! Plating: getting frames in and out of files.
//!
//! Sources decode stills, GIFs and frame directories into pixel buffers;
//! sinks encode cooked frames back out at a playback rate.

mod sink;
mod source;

pub use sink::{merge_frames, sink_for, write_still, FrameSink, FramesDirSink, GifSink, StillSink};
pub use source::{open_source, FrameSource, FramesDirSource, GifSource, ImageSource};

/// Frame rate used when nothing else decides one.
pub const DEFAULT_FPS: f64 = 30.0;

/// How frames are played back once written.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackOptions {
    pub fps: f64,
    /// Merge repeated frames and compress harder.
    pub optimize: bool,
}

impl Default for PlaybackOptions {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            optimize: true,
        }
    }
}

impl PlaybackOptions {
    pub fn frame_delay_ms(&self) -> f64 {
        1000.0 / self.fps
    }
}

/// Playback rate from an explicit fps, then a per-frame duration in
/// milliseconds, then a fallback (usually the source's own rate), then
/// [`DEFAULT_FPS`].
pub fn resolve_fps(fps: Option<f64>, duration: Option<f64>, fallback: Option<f64>) -> f64 {
    let positive = |v: &f64| *v > 0.0 && v.is_finite();
    fps.filter(positive)
        .or_else(|| duration.filter(positive).map(|ms| 1000.0 / ms))
        .or_else(|| fallback.filter(positive))
        .unwrap_or(DEFAULT_FPS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_fps_precedence() {
        assert_eq!(resolve_fps(Some(12.0), Some(50.0), Some(5.0)), 12.0);
        assert_eq!(resolve_fps(None, Some(50.0), Some(5.0)), 20.0);
        assert_eq!(resolve_fps(None, None, Some(5.0)), 5.0);
        assert_eq!(resolve_fps(None, None, None), DEFAULT_FPS);
        assert_eq!(resolve_fps(Some(0.0), None, None), DEFAULT_FPS);
    }

    #[test]
    fn test_frame_delay() {
        let options = PlaybackOptions {
            fps: 25.0,
            optimize: true,
        };
        assert_eq!(options.frame_delay_ms(), 40.0);
    }
}
