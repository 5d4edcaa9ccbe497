use std::path::Path;
use std::process::Command;
use crate::core::ExtractError;

/// Stream properties needed to decode raw frames and size the progress bar.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Clockwise turn (0, 90, 180 or 270) that shows the coded frame upright.
    pub rotation: u32,
    pub frame_rate: Option<f64>,
    /// Best-effort estimate; some containers report nothing or a wrong count.
    pub total_frames: Option<u64>,
}

impl VideoInfo {
    pub fn probe(ffprobe: &Path, file_path: &Path) -> Result<Self, ExtractError> {
        let output = Command::new(ffprobe)
            .arg("-v").arg("quiet")
            .arg("-print_format").arg("json")
            .arg("-show_format")
            .arg("-show_streams")
            .arg(file_path)
            .output()
            .map_err(|source| ExtractError::Spawn {
                program: ffprobe.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            return Err(ExtractError::Probe {
                path: file_path.to_path_buf(),
                reason: format!("ffprobe exited with {}", output.status),
            });
        }

        let info: serde_json::Value = serde_json::from_slice(&output.stdout).map_err(|e| ExtractError::Probe {
            path: file_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_ffprobe_json(&info)
    }

    pub fn from_ffprobe_json(info: &serde_json::Value) -> Result<Self, ExtractError> {
        let empty_vec = vec![];
        let streams = info["streams"].as_array().unwrap_or(&empty_vec);
        let video_stream = streams
            .iter()
            .find(|s| s["codec_type"].as_str() == Some("video"))
            .ok_or(ExtractError::NoVideoStream)?;

        let width = video_stream["width"].as_u64().unwrap_or(0) as u32;
        let height = video_stream["height"].as_u64().unwrap_or(0) as u32;
        if width == 0 || height == 0 {
            return Err(ExtractError::NoVideoStream);
        }

        let rotation = rotation_of(video_stream);

        let frame_rate = video_stream["r_frame_rate"]
            .as_str()
            .and_then(parse_frame_rate);

        let nb_frames = video_stream["nb_frames"]
            .as_str()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|&n| n > 0);

        // Stream duration is more precise, the container duration is the fallback
        let duration = video_stream["duration"]
            .as_str()
            .or_else(|| info["format"]["duration"].as_str())
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0);

        let total_frames = nb_frames.or_else(|| match (duration, frame_rate) {
            (Some(d), Some(fps)) => Some((d * fps).round() as u64),
            _ => None,
        });

        Ok(Self {
            width,
            height,
            rotation,
            frame_rate,
            total_frames,
        })
    }

    /// Bytes in one coded rgb24 frame.
    pub fn frame_size(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Size of the frames once turned upright.
    pub fn display_size(&self) -> (u32, u32) {
        match self.rotation {
            90 | 270 => (self.height, self.width),
            _ => (self.width, self.height),
        }
    }
}

/// Newer ffprobe reports a display matrix rotation (counter-clockwise), older
/// builds a `rotate` tag (clockwise).
fn rotation_of(stream: &serde_json::Value) -> u32 {
    let from_matrix = stream["side_data_list"]
        .as_array()
        .and_then(|list| list.iter().find_map(|side_data| side_data["rotation"].as_f64()))
        .map(|degrees| -degrees);
    let from_tag = || {
        stream["tags"]["rotate"]
            .as_str()
            .and_then(|s| s.trim().parse::<f64>().ok())
    };

    let Some(degrees) = from_matrix.or_else(from_tag) else {
        return 0;
    };
    let clockwise = (degrees.round() as i64).rem_euclid(360) as u32;
    if clockwise % 90 != 0 {
        log::warn!("Ignoring unsupported rotation of {} degrees", degrees);
        return 0;
    }
    clockwise
}

/// Parse ffprobe's rational rate such as "30/1" or "30000/1001".
fn parse_frame_rate(rate: &str) -> Option<f64> {
    let fps = match rate.split_once('/') {
        Some((num, den)) => {
            let numerator: f64 = num.trim().parse().ok()?;
            let denominator: f64 = den.trim().parse().ok()?;
            if denominator == 0.0 {
                return None;
            }
            numerator / denominator
        }
        None => rate.trim().parse().ok()?,
    };
    (fps.is_finite() && fps > 0.0).then_some(fps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_uses_reported_frame_count() {
        let info = json!({
            "streams": [
                { "codec_type": "audio" },
                { "codec_type": "video", "width": 1920, "height": 1080,
                  "r_frame_rate": "30/1", "nb_frames": "100", "duration": "3.333" }
            ],
            "format": { "duration": "3.4" }
        });

        let video = VideoInfo::from_ffprobe_json(&info).expect("video stream");
        assert_eq!((video.width, video.height), (1920, 1080));
        assert_eq!(video.frame_rate, Some(30.0));
        assert_eq!(video.total_frames, Some(100));
        assert_eq!(video.frame_size(), 1920 * 1080 * 3);
    }

    #[test]
    fn test_estimates_frames_from_format_duration() {
        // Matroska usually has no nb_frames and no per-stream duration
        let info = json!({
            "streams": [
                { "codec_type": "video", "width": 640, "height": 480, "r_frame_rate": "30000/1001" }
            ],
            "format": { "duration": "10.010" }
        });

        let video = VideoInfo::from_ffprobe_json(&info).expect("video stream");
        assert_eq!(video.total_frames, Some(300));
    }

    #[test]
    fn test_unknown_frame_count() {
        let info = json!({
            "streams": [ { "codec_type": "video", "width": 320, "height": 240, "r_frame_rate": "0/0" } ],
            "format": {}
        });

        let video = VideoInfo::from_ffprobe_json(&info).expect("video stream");
        assert_eq!(video.frame_rate, None);
        assert_eq!(video.total_frames, None);
    }

    #[test]
    fn test_rotated_phone_clip_keeps_coded_size() {
        let info = json!({
            "streams": [
                { "codec_type": "video", "width": 1920, "height": 1080, "r_frame_rate": "30/1",
                  "nb_frames": "90",
                  "side_data_list": [ { "side_data_type": "Display Matrix", "rotation": -90 } ] }
            ]
        });

        let video = VideoInfo::from_ffprobe_json(&info).expect("video stream");
        assert_eq!((video.width, video.height), (1920, 1080));
        assert_eq!(video.frame_size(), 1920 * 1080 * 3);
        assert_eq!(video.rotation, 90);
        assert_eq!(video.display_size(), (1080, 1920));
    }

    #[test]
    fn test_rotate_tag_from_older_ffprobe() {
        let info = json!({
            "streams": [
                { "codec_type": "video", "width": 1280, "height": 720, "tags": { "rotate": "270" } }
            ]
        });

        let video = VideoInfo::from_ffprobe_json(&info).expect("video stream");
        assert_eq!(video.rotation, 270);
        assert_eq!(video.display_size(), (720, 1280));
    }

    #[test]
    fn test_unrotated_and_upside_down_streams() {
        let plain = json!({ "streams": [ { "codec_type": "video", "width": 640, "height": 480 } ] });
        let flipped = json!({
            "streams": [
                { "codec_type": "video", "width": 640, "height": 480,
                  "side_data_list": [ { "rotation": 180 } ] }
            ]
        });

        let plain = VideoInfo::from_ffprobe_json(&plain).expect("video stream");
        assert_eq!(plain.rotation, 0);
        assert_eq!(plain.display_size(), (640, 480));

        let flipped = VideoInfo::from_ffprobe_json(&flipped).expect("video stream");
        assert_eq!(flipped.rotation, 180);
        assert_eq!(flipped.display_size(), (640, 480));
    }

    #[test]
    fn test_audio_only_file_is_rejected() {
        let info = json!({ "streams": [ { "codec_type": "audio" } ], "format": { "duration": "5.0" } });
        assert!(matches!(VideoInfo::from_ffprobe_json(&info), Err(ExtractError::NoVideoStream)));
    }

    #[test]
    fn test_video_stream_without_dimensions_is_rejected() {
        let info = json!({ "streams": [ { "codec_type": "video", "width": 0, "height": 0 } ] });
        assert!(matches!(VideoInfo::from_ffprobe_json(&info), Err(ExtractError::NoVideoStream)));
    }

    #[test]
    fn test_parse_frame_rate() {
        assert_eq!(parse_frame_rate("25/1"), Some(25.0));
        assert_eq!(parse_frame_rate("24"), Some(24.0));
        assert_eq!(parse_frame_rate("1/0"), None);
        assert_eq!(parse_frame_rate("abc"), None);
    }
}
