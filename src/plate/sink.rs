//! Frame sinks: stills, animated GIFs and frame directories.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::gif::{GifEncoder, Repeat};
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{Delay, DynamicImage, ExtendedColorType, Frame, ImageEncoder};
use tracing::debug;

use crate::error::{PierogisError, Result};
use crate::types::PixelBuffer;

use super::PlaybackOptions;

/// Accepts an ordered list of frames and writes them out.
pub trait FrameSink {
    fn write(&self, frames: &[PixelBuffer], options: &PlaybackOptions) -> Result<()>;

    /// Where the output lands.
    fn path(&self) -> &Path;
}

fn io_error(path: &Path, what: &str, e: impl std::fmt::Display) -> PierogisError {
    PierogisError::Io {
        path: path.to_path_buf(),
        message: format!("{}: {}", what, e),
    }
}

fn image_error(path: &Path, e: image::ImageError) -> PierogisError {
    PierogisError::Image {
        path: path.to_path_buf(),
        message: format!("Failed to encode: {}", e),
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, "Failed to create directory", e))
        }
        _ => Ok(()),
    }
}

fn nothing_to_write(path: &Path) -> PierogisError {
    PierogisError::InvalidParameter {
        message: format!("no frames to write to {}", path.display()),
        help: None,
    }
}

/// Write one buffer as a still image, format chosen by extension.
///
/// PNGs are written with the slowest, smallest compression when `optimize`
/// is set.
pub fn write_still(buffer: &PixelBuffer, path: &Path, optimize: bool) -> Result<()> {
    ensure_parent(path)?;
    let image = buffer.to_image();

    let is_png = path
        .extension()
        .and_then(|e| e.to_str())
        .map_or(true, |e| e.eq_ignore_ascii_case("png"));

    if is_png && optimize {
        let file = File::create(path).map_err(|e| io_error(path, "Failed to create file", e))?;
        PngEncoder::new_with_quality(BufWriter::new(file), CompressionType::Best, FilterType::Adaptive)
            .write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgb8)
            .map_err(|e| image_error(path, e))?;
    } else {
        image.save(path).map_err(|e| image_error(path, e))?;
    }

    debug!(path = %path.display(), width = buffer.width(), height = buffer.height(), "wrote still");
    Ok(())
}

/// Group consecutive frames, merging identical neighbours when `optimize`
/// is set. Each entry is a frame and how many frame slots it covers.
pub fn merge_frames(frames: &[PixelBuffer], optimize: bool) -> Vec<(&PixelBuffer, u32)> {
    let mut merged: Vec<(&PixelBuffer, u32)> = Vec::with_capacity(frames.len());
    for frame in frames {
        match merged.last_mut() {
            Some((last, count)) if optimize && *last == frame => *count += 1,
            _ => merged.push((frame, 1)),
        }
    }
    merged
}

/// A single still image.
#[derive(Debug, Clone)]
pub struct StillSink {
    path: PathBuf,
}

impl StillSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSink for StillSink {
    fn write(&self, frames: &[PixelBuffer], options: &PlaybackOptions) -> Result<()> {
        match frames {
            [] => Err(nothing_to_write(&self.path)),
            [frame] => write_still(frame, &self.path, options.optimize),
            _ => Err(PierogisError::InvalidParameter {
                message: format!("{} frames cannot be written to a still image", frames.len()),
                help: Some("Write to a .gif or a frames directory".to_string()),
            }),
        }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// An endlessly looping animated GIF.
#[derive(Debug, Clone)]
pub struct GifSink {
    path: PathBuf,
}

impl GifSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FrameSink for GifSink {
    #[tracing::instrument(skip_all, fields(path = %self.path.display(), frames = frames.len()))]
    fn write(&self, frames: &[PixelBuffer], options: &PlaybackOptions) -> Result<()> {
        if frames.is_empty() {
            return Err(nothing_to_write(&self.path));
        }
        ensure_parent(&self.path)?;

        let file = File::create(&self.path).map_err(|e| io_error(&self.path, "Failed to create file", e))?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| image_error(&self.path, e))?;

        let merged = merge_frames(frames, options.optimize);
        for (frame, count) in &merged {
            let delay_ms = (options.frame_delay_ms() * *count as f64).round() as u32;
            let rgba = DynamicImage::ImageRgb8(frame.to_image()).into_rgba8();
            let frame = Frame::from_parts(rgba, 0, 0, Delay::from_numer_denom_ms(delay_ms, 1));
            encoder.encode_frame(frame).map_err(|e| image_error(&self.path, e))?;
        }

        debug!(written = merged.len(), fps = options.fps, "wrote gif");
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

/// A directory of numbered PNGs (`frame-0000.png`, ...).
#[derive(Debug, Clone)]
pub struct FramesDirSink {
    dir: PathBuf,
}

impl FramesDirSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn frame_path(&self, index: usize) -> PathBuf {
        self.dir.join(format!("frame-{:04}.png", index))
    }
}

impl FrameSink for FramesDirSink {
    fn write(&self, frames: &[PixelBuffer], options: &PlaybackOptions) -> Result<()> {
        if frames.is_empty() {
            return Err(nothing_to_write(&self.dir));
        }
        fs::create_dir_all(&self.dir).map_err(|e| io_error(&self.dir, "Failed to create directory", e))?;

        for (index, frame) in frames.iter().enumerate() {
            write_still(frame, &self.frame_path(index), options.optimize)?;
        }
        Ok(())
    }

    fn path(&self) -> &Path {
        &self.dir
    }
}

/// Pick a sink for `count` frames written to `path`.
///
/// Directories and extensionless paths get numbered frames, `.gif` gets an
/// animation, anything else a still.
pub fn sink_for(path: &Path, count: usize) -> Result<Box<dyn FrameSink>> {
    let extension = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);

    match extension.as_deref() {
        _ if path.is_dir() => Ok(Box::new(FramesDirSink::new(path))),
        None => Ok(Box::new(FramesDirSink::new(path))),
        Some("gif") => Ok(Box::new(GifSink::new(path))),
        Some(ext) if count > 1 => Err(PierogisError::InvalidParameter {
            message: format!("cannot write {} frames to a .{} file", count, ext),
            help: Some("Use a .gif output or pass --frames".to_string()),
        }),
        Some(_) => Ok(Box::new(StillSink::new(path))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::{open_source, FrameSource};
    use crate::types::Colour;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn solid(r: u8) -> PixelBuffer {
        PixelBuffer::filled(2, 2, Colour::rgb(r, 0, 0))
    }

    #[test]
    fn test_merge_frames() {
        let frames = vec![solid(1), solid(1), solid(2), solid(1)];
        let counts: Vec<u32> = merge_frames(&frames, true).iter().map(|(_, c)| *c).collect();
        assert_eq!(counts, vec![2, 1, 1]);
        assert_eq!(merge_frames(&frames, false).len(), 4);
    }

    #[test]
    fn test_still_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("out.png");
        let buffer = PixelBuffer::from_fn(3, 2, |x, y| Colour::rgb(x as u8, y as u8, 7));

        sink_for(&path, 1).unwrap().write(&[buffer.clone()], &PlaybackOptions::default()).unwrap();
        assert_eq!(open_source(&path).unwrap().frame(0).unwrap(), buffer);
    }

    #[test]
    fn test_gif_keeps_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.gif");
        let frames = vec![
            PixelBuffer::filled(1, 1, Colour::BLACK),
            PixelBuffer::filled(1, 1, Colour::WHITE),
            PixelBuffer::filled(1, 1, Colour::BLACK),
        ];
        let options = PlaybackOptions {
            fps: 10.0,
            optimize: false,
        };

        sink_for(&path, frames.len()).unwrap().write(&frames, &options).unwrap();

        let decoded = open_source(&path).unwrap().frames().unwrap();
        let firsts: Vec<Colour> = decoded.iter().map(|f| f.pixel(0, 0)).collect();
        assert_eq!(firsts, vec![Colour::BLACK, Colour::WHITE, Colour::BLACK]);
    }

    #[test]
    fn test_frames_dir_names() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("frames");
        let sink = sink_for(&out, 2).unwrap();
        sink.write(&[solid(1), solid(2)], &PlaybackOptions::default()).unwrap();

        assert!(out.join("frame-0000.png").exists());
        assert!(out.join("frame-0001.png").exists());
    }

    #[test]
    fn test_many_frames_to_png_rejected() {
        assert!(sink_for(Path::new("out.png"), 3).is_err());
        assert!(StillSink::new("out.png")
            .write(&[solid(1), solid(2)], &PlaybackOptions::default())
            .is_err());
    }
}
