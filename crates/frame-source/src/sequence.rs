//! Directory-backed image sequences

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::{FrameSink, FrameSource, SourceError, VideoFrame};

const FRAME_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp"];

/// Reads every image file in a directory, in file-name order, as one frame each
#[derive(Debug)]
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    cursor: usize,
    fps: Option<f64>,
}

impl ImageSequenceSource {
    /// Open a frame directory. Fails if it is missing or holds no frames.
    pub fn open(dir: impl AsRef<Path>, fps: Option<f64>) -> Result<Self, SourceError> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir)
            .map_err(|e| SourceError::Open(format!("{}: {}", dir.display(), e)))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| SourceError::Open(format!("{}: {}", dir.display(), e)))?
                .path();
            if path.is_file() && is_frame_file(&path) {
                files.push(path);
            }
        }

        if files.is_empty() {
            return Err(SourceError::Open(format!(
                "{}: no frame images found",
                dir.display()
            )));
        }
        files.sort();

        info!("Opened image sequence {} ({} frames)", dir.display(), files.len());
        Ok(Self {
            files,
            cursor: 0,
            fps,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FrameSource for ImageSequenceSource {
    fn fps(&self) -> Option<f64> {
        self.fps
    }

    fn next_frame(&mut self) -> Result<Option<VideoFrame>, SourceError> {
        let Some(path) = self.files.get(self.cursor) else {
            return Ok(None);
        };
        let sequence = self.cursor as u64;
        // Advance first so a bad frame is skipped rather than retried forever
        self.cursor += 1;

        let img = image::open(path)
            .map_err(|e| SourceError::Decode(format!("{}: {}", path.display(), e)))?
            .to_rgb8();

        let timestamp_ns = match self.fps {
            Some(fps) if fps > 0.0 => (sequence as f64 * 1e9 / fps) as u64,
            _ => 0,
        };

        debug!("Decoded frame {} from {}", sequence, path.display());
        Ok(Some(VideoFrame::from_rgb_image(img, timestamp_ns, sequence)))
    }
}

fn is_frame_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| FRAME_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Writes frames as `frame_{sequence:06}.png` into a directory
pub struct ImageSequenceSink {
    dir: PathBuf,
    written: usize,
}

impl ImageSequenceSink {
    pub fn create(dir: impl AsRef<Path>) -> Result<Self, SourceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .map_err(|e| SourceError::Write(format!("{}: {}", dir.display(), e)))?;
        Ok(Self { dir, written: 0 })
    }

    pub fn written(&self) -> usize {
        self.written
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: &VideoFrame) -> Result<(), SourceError> {
        let path = self.dir.join(format!("frame_{:06}.png", frame.sequence));
        frame
            .to_rgb_image()?
            .save(&path)
            .map_err(|e| SourceError::Write(format!("{}: {}", path.display(), e)))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SourceError> {
        info!("Wrote {} annotated frames to {}", self.written, self.dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_frame(dir: &Path, name: &str, rgb: [u8; 3]) {
        VideoFrame::filled(8, 6, rgb, 0)
            .to_rgb_image()
            .unwrap()
            .save(dir.join(name))
            .unwrap();
    }

    #[test]
    fn test_missing_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ImageSequenceSource::open(dir.path().join("nope"), None).unwrap_err();
        assert!(matches!(err, SourceError::Open(_)));
    }

    #[test]
    fn test_empty_directory_is_open_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("notes.txt"), "not a frame").unwrap();
        let err = ImageSequenceSource::open(dir.path(), None).unwrap_err();
        assert!(matches!(err, SourceError::Open(_)));
    }

    #[test]
    fn test_reads_frames_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        write_frame(dir.path(), "b.png", [0, 255, 0]);
        write_frame(dir.path(), "a.png", [255, 0, 0]);

        let mut source = ImageSequenceSource::open(dir.path(), Some(10.0)).unwrap();
        assert_eq!(source.len(), 2);

        let first = source.next_frame().unwrap().unwrap();
        assert_eq!(first.sequence, 0);
        assert_eq!(first.get_pixel(0, 0), Some([255, 0, 0]));

        let second = source.next_frame().unwrap().unwrap();
        assert_eq!(second.sequence, 1);
        assert_eq!(second.timestamp_ns, 100_000_000);

        assert!(source.next_frame().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_frame_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.png"), b"garbage").unwrap();
        write_frame(dir.path(), "b.png", [1, 2, 3]);

        let mut source = ImageSequenceSource::open(dir.path(), None).unwrap();
        assert!(matches!(source.next_frame(), Err(SourceError::Decode(_))));
        let frame = source.next_frame().unwrap().unwrap();
        assert_eq!(frame.sequence, 1);
    }

    #[test]
    fn test_sink_writes_numbered_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = ImageSequenceSink::create(dir.path().join("out")).unwrap();
        sink.write_frame(&VideoFrame::filled(4, 4, [9, 9, 9], 3)).unwrap();
        sink.finish().unwrap();

        assert_eq!(sink.written(), 1);
        assert!(dir.path().join("out").join("frame_000003.png").exists());
    }
}
