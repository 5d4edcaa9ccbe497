use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdout, Command, Stdio};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use image::{imageops, RgbImage};
use crate::core::{ExtractError, ExtractorConfig};
use crate::video::VideoInfo;

/// Unblocks a source from another thread so a pending `read_frame` returns.
pub type Interrupt = Box<dyn FnOnce() + Send>;

/// A sequentially readable, decoded video stream.
pub trait FrameSource: Send {
    fn total_frames(&self) -> Option<u64>;

    /// Next frame, `Ok(None)` once the stream is exhausted.
    fn read_frame(&mut self) -> Result<Option<RgbImage>, ExtractError>;

    /// Release the underlying handle. Calling this more than once is a no-op.
    fn release(&mut self);

    fn is_released(&self) -> bool;

    /// Handle the controller keeps while the worker owns the source.
    fn interrupt_handle(&self) -> Option<Interrupt> {
        None
    }
}

/// Decodes a video by streaming raw RGB24 frames out of an `ffmpeg` child process.
pub struct FfmpegSource {
    video_path: PathBuf,
    info: VideoInfo,
    process: Arc<Mutex<Option<Child>>>,
    stdout: Option<ChildStdout>,
    stderr_logger: Option<JoinHandle<usize>>,
}

impl FfmpegSource {
    /// Probe the file, then start decoding. Nothing is spawned for files ffprobe rejects.
    pub fn open(video_path: &Path, config: &ExtractorConfig) -> Result<Self, ExtractError> {
        let info = VideoInfo::probe(&config.ffprobe(), video_path)?;
        let (upright_width, upright_height) = info.display_size();
        log::info!(
            "Opened {}: {}x{} coded, {}x{} upright, {:?} fps, ~{:?} frames",
            video_path.display(),
            info.width,
            info.height,
            upright_width,
            upright_height,
            info.frame_rate,
            info.total_frames
        );

        let ffmpeg = config.ffmpeg();
        let mut process = decoder_command(&ffmpeg, video_path)
            .spawn()
            .map_err(|source| ExtractError::Spawn {
                program: ffmpeg.display().to_string(),
                source,
            })?;
        let stdout = process.stdout.take();
        let stderr_logger = process
            .stderr
            .take()
            .map(|stderr| forward_stderr(stderr, video_path.display().to_string()));

        Ok(Self {
            video_path: video_path.to_path_buf(),
            info,
            process: Arc::new(Mutex::new(Some(process))),
            stdout,
            stderr_logger,
        })
    }

    fn child(&self) -> MutexGuard<'_, Option<Child>> {
        self.process.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The decoder always emits the first video stream at its coded size, so each
/// frame is exactly `VideoInfo::frame_size` bytes. Rotation is applied afterwards.
fn decoder_command(ffmpeg: &Path, video_path: &Path) -> Command {
    let mut cmd = Command::new(ffmpeg);
    cmd.arg("-v").arg("error")
        .arg("-noautorotate")
        .arg("-i").arg(video_path)
        .arg("-map").arg("0:v:0")
        .arg("-f").arg("rawvideo")
        .arg("-pix_fmt").arg("rgb24")
        .arg("-an")
        .arg("-");

    cmd.stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .stdin(Stdio::null());
    cmd
}

impl FrameSource for FfmpegSource {
    fn total_frames(&self) -> Option<u64> {
        self.info.total_frames
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>, ExtractError> {
        match self.stdout.as_mut() {
            Some(stdout) => read_raw_frame(stdout, &self.info),
            None => Ok(None),
        }
    }

    fn release(&mut self) {
        self.stdout = None;
        let process = self.child().take();
        if let Some(mut process) = process {
            let _ = process.kill();
            let _ = process.wait();
            log::debug!("Released ffmpeg decoder for {}", self.video_path.display());
        }
        // The pipe is closed once the child is gone
        if let Some(logger) = self.stderr_logger.take() {
            if let Ok(lines) = logger.join() {
                if lines > 0 {
                    log::debug!("ffmpeg reported {} diagnostics for {}", lines, self.video_path.display());
                }
            }
        }
    }

    fn is_released(&self) -> bool {
        self.child().is_none()
    }

    fn interrupt_handle(&self) -> Option<Interrupt> {
        let process = self.process.clone();
        Some(Box::new(move || {
            let mut guard = process.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(child) = guard.as_mut() {
                let _ = child.kill();
            }
        }))
    }
}

impl Drop for FfmpegSource {
    fn drop(&mut self) {
        self.release();
    }
}

/// Read one coded rgb24 frame and turn it upright. `Ok(None)` on a clean end of stream.
fn read_raw_frame(reader: &mut impl Read, info: &VideoInfo) -> Result<Option<RgbImage>, ExtractError> {
    let frame_size = info.frame_size();
    let mut frame_data = vec![0u8; frame_size];
    let filled = read_full(reader, &mut frame_data)
        .map_err(|e| ExtractError::Decode(e.to_string()))?;

    if filled == 0 {
        return Ok(None);
    }
    if filled < frame_size {
        return Err(ExtractError::Decode(format!(
            "Truncated frame: {} bytes (expected {})",
            filled, frame_size
        )));
    }

    let image = RgbImage::from_raw(info.width, info.height, frame_data)
        .ok_or_else(|| ExtractError::Decode("Frame buffer does not match dimensions".to_string()))?;
    Ok(Some(upright(image, info.rotation)))
}

fn upright(image: RgbImage, rotation: u32) -> RgbImage {
    match rotation {
        90 => imageops::rotate90(&image),
        180 => imageops::rotate180(&image),
        270 => imageops::rotate270(&image),
        _ => image,
    }
}

/// Like `read_exact`, but reports how much was read when the stream ends early.
fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Log every line ffmpeg writes to stderr until the pipe closes. Returns the line count.
fn forward_stderr(stderr: impl Read + Send + 'static, video: String) -> JoinHandle<usize> {
    thread::spawn(move || {
        let mut lines = 0;
        for line in BufReader::new(stderr).split(b'\n') {
            let Ok(line) = line else { break };
            let line = String::from_utf8_lossy(&line);
            let line = line.trim();
            if !line.is_empty() {
                log::warn!("ffmpeg ({}): {}", video, line);
                lines += 1;
            }
        }
        lines
    })
}
