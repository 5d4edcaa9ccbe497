use std::path::{Path, PathBuf};
use crate::core::ExtractError;

/// Frames are written as `frame_0000.jpg`, `frame_0001.jpg`, ...
pub fn frame_file_name(index: u64) -> String {
    format!("frame_{:04}.jpg", index)
}

/// Sibling directory named after the video, e.g. `clips/a.mp4` -> `clips/a_frames`.
pub fn output_dir_for(video_path: &Path) -> PathBuf {
    let stem = video_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "video".to_string());
    let parent = video_path.parent().unwrap_or_else(|| Path::new(""));
    parent.join(format!("{}_frames", stem))
}

/// An output directory that is known to exist on disk.
#[derive(Debug, Clone)]
pub struct OutputDirectory {
    path: PathBuf,
}

impl OutputDirectory {
    pub fn create(path: PathBuf) -> Result<Self, ExtractError> {
        std::fs::create_dir_all(&path).map_err(|source| ExtractError::CreateDir {
            path: path.clone(),
            source,
        })?;
        log::debug!("Output directory ensured: {}", path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frame_path(&self, index: u64) -> PathBuf {
        self.path.join(frame_file_name(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_names_are_zero_padded() {
        assert_eq!(frame_file_name(0), "frame_0000.jpg");
        assert_eq!(frame_file_name(42), "frame_0042.jpg");
        assert_eq!(frame_file_name(9999), "frame_9999.jpg");
        assert_eq!(frame_file_name(10000), "frame_10000.jpg");
    }

    #[test]
    fn test_output_dir_is_sibling_of_video() {
        let dir = output_dir_for(Path::new("/videos/holiday.trip.mp4"));
        assert_eq!(dir, PathBuf::from("/videos/holiday.trip_frames"));
    }

    #[test]
    fn test_output_dir_for_bare_file_name() {
        assert_eq!(output_dir_for(Path::new("clip.mkv")), PathBuf::from("clip_frames"));
    }

    #[test]
    fn test_create_is_idempotent() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("movie_frames");

        let first = OutputDirectory::create(path.clone()).expect("first create");
        let second = OutputDirectory::create(path.clone()).expect("second create");

        assert!(path.is_dir());
        assert_eq!(first.path(), second.path());
        assert_eq!(first.frame_path(3), path.join("frame_0003.jpg"));
    }

    #[test]
    fn test_create_fails_when_a_file_is_in_the_way() {
        let temp = tempfile::tempdir().expect("Failed to create temp dir");
        let path = temp.path().join("blocked_frames");
        std::fs::write(&path, b"not a directory").expect("write blocker");

        let result = OutputDirectory::create(path);
        assert!(matches!(result, Err(ExtractError::CreateDir { .. })));
    }
}
