//! Frame sources: decoded stills, frame directories and animated GIFs.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use image::codecs::gif::GifDecoder;
use image::AnimationDecoder;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{PierogisError, Result};
use crate::types::PixelBuffer;

/// Extensions read as frames from a directory.
const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Supplies decoded frames by index.
pub trait FrameSource {
    fn len(&self) -> usize;

    fn frame(&self, index: usize) -> Result<PixelBuffer>;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Playback rate stored in the source, if it has one.
    fn fps(&self) -> Option<f64> {
        None
    }

    /// Every frame, in order.
    fn frames(&self) -> Result<Vec<PixelBuffer>> {
        (0..self.len()).map(|i| self.frame(i)).collect()
    }
}

fn out_of_range(index: usize, len: usize) -> PierogisError {
    PierogisError::invalid(format!("frame {} out of range for {} frame(s)", index, len))
}

pub(crate) fn load_image(path: &Path) -> Result<PixelBuffer> {
    let image = image::open(path).map_err(|e| PierogisError::Image {
        path: path.to_path_buf(),
        message: format!("Failed to decode image: {}", e),
    })?;
    Ok(PixelBuffer::from_image(&image))
}

/// A single still image.
#[derive(Debug, Clone)]
pub struct ImageSource {
    buffer: PixelBuffer,
}

impl ImageSource {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            buffer: load_image(path)?,
        })
    }
}

impl FrameSource for ImageSource {
    fn len(&self) -> usize {
        1
    }

    fn frame(&self, index: usize) -> Result<PixelBuffer> {
        if index != 0 {
            return Err(out_of_range(index, 1));
        }
        Ok(self.buffer.clone())
    }
}

/// Image files in a directory, ordered by file name and decoded lazily.
#[derive(Debug, Clone)]
pub struct FramesDirSource {
    paths: Vec<PathBuf>,
}

impl FramesDirSource {
    pub fn open(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| PierogisError::Io {
                path: dir.to_path_buf(),
                message: format!("Failed to read frames directory: {}", e),
            })?;
            if entry.file_type().is_file() && is_frame_file(entry.path()) {
                paths.push(entry.into_path());
            }
        }

        if paths.is_empty() {
            return Err(PierogisError::InvalidParameter {
                message: format!("no frames found in {}", dir.display()),
                help: Some(format!("Supported extensions: {}", FRAME_EXTENSIONS.join(", "))),
            });
        }

        debug!(dir = %dir.display(), frames = paths.len(), "opened frames directory");
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for FramesDirSource {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn frame(&self, index: usize) -> Result<PixelBuffer> {
        let path = self.paths.get(index).ok_or_else(|| out_of_range(index, self.paths.len()))?;
        load_image(path)
    }
}

/// Every frame of an animated GIF, decoded up front.
#[derive(Debug, Clone)]
pub struct GifSource {
    frames: Vec<PixelBuffer>,
    fps: Option<f64>,
}

impl GifSource {
    pub fn open(path: &Path) -> Result<Self> {
        let image_error = |e: image::ImageError| PierogisError::Image {
            path: path.to_path_buf(),
            message: format!("Failed to decode GIF: {}", e),
        };

        let file = File::open(path).map_err(|e| PierogisError::Io {
            path: path.to_path_buf(),
            message: format!("Failed to open file: {}", e),
        })?;
        let decoder = GifDecoder::new(BufReader::new(file)).map_err(image_error)?;
        let decoded = decoder.into_frames().collect_frames().map_err(image_error)?;

        let mut total_ms = 0.0;
        let mut frames = Vec::with_capacity(decoded.len());
        for frame in decoded {
            let (numer, denom) = frame.delay().numer_denom_ms();
            if denom > 0 {
                total_ms += numer as f64 / denom as f64;
            }
            let rgba = image::DynamicImage::ImageRgba8(frame.into_buffer());
            frames.push(PixelBuffer::from_image(&rgba));
        }

        let fps = (total_ms > 0.0).then(|| 1000.0 * frames.len() as f64 / total_ms);
        debug!(path = %path.display(), frames = frames.len(), ?fps, "decoded gif");
        Ok(Self { frames, fps })
    }
}

impl FrameSource for GifSource {
    fn len(&self) -> usize {
        self.frames.len()
    }

    fn frame(&self, index: usize) -> Result<PixelBuffer> {
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| out_of_range(index, self.frames.len()))
    }

    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn frames(&self) -> Result<Vec<PixelBuffer>> {
        Ok(self.frames.clone())
    }
}

/// Open whatever `path` points at: a directory of frames, a GIF, or a still.
pub fn open_source(path: &Path) -> Result<Box<dyn FrameSource>> {
    if !path.exists() {
        return Err(PierogisError::Io {
            path: path.to_path_buf(),
            message: "No such file or directory".to_string(),
        });
    }

    if path.is_dir() {
        return Ok(Box::new(FramesDirSource::open(path)?));
    }

    let is_gif = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("gif"));

    if is_gif {
        Ok(Box::new(GifSource::open(path)?))
    } else {
        Ok(Box::new(ImageSource::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Colour;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn write_png(path: &Path, colour: Colour) {
        PixelBuffer::filled(2, 2, colour).to_image().save(path).unwrap();
    }

    #[test]
    fn test_image_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("still.png");
        write_png(&path, Colour::rgb(1, 2, 3));

        let source = open_source(&path).unwrap();
        assert_eq!(source.len(), 1);
        assert_eq!(source.frame(0).unwrap().pixel(1, 1), Colour::rgb(1, 2, 3));
        assert!(source.frame(1).is_err());
    }

    #[test]
    fn test_frames_dir_sorted_by_name() {
        let dir = tempdir().unwrap();
        write_png(&dir.path().join("b.png"), Colour::rgb(20, 0, 0));
        write_png(&dir.path().join("a.png"), Colour::rgb(10, 0, 0));
        std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();

        let source = open_source(dir.path()).unwrap();
        assert_eq!(source.len(), 2);
        let reds: Vec<u8> = source.frames().unwrap().iter().map(|f| f.pixel(0, 0).r).collect();
        assert_eq!(reds, vec![10, 20]);
    }

    #[test]
    fn test_empty_frames_dir() {
        let dir = tempdir().unwrap();
        assert!(FramesDirSource::open(dir.path()).is_err());
    }

    #[test]
    fn test_missing_path() {
        let err = open_source(Path::new("/nonexistent/frame.png")).err().unwrap();
        assert!(matches!(err, PierogisError::Io { .. }));
    }
}
