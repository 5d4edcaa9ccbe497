use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use image::RgbImage;
use crate::core::ExtractError;
use crate::video::{FrameSource, Interrupt};

/// In-memory frame source standing in for a decoded video file.
pub struct SyntheticSource {
    frames: Option<u64>,
    fail_after: Option<u64>,
    reads: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
    released: bool,
    /// Reads block until interrupted, like a decoder stuck on a bad file.
    stalls: bool,
    interrupted: Arc<(Mutex<bool>, Condvar)>,
}

impl SyntheticSource {
    pub fn finite(frames: u64) -> Self {
        Self::build(Some(frames), None)
    }

    pub fn endless() -> Self {
        Self::build(None, None)
    }

    pub fn failing_after(frames: u64) -> Self {
        Self::build(None, Some(frames))
    }

    pub fn stalled() -> Self {
        Self {
            stalls: true,
            ..Self::build(None, None)
        }
    }

    fn build(frames: Option<u64>, fail_after: Option<u64>) -> Self {
        Self {
            frames,
            fail_after,
            reads: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
            released: false,
            stalls: false,
            interrupted: Arc::new((Mutex::new(false), Condvar::new())),
        }
    }

    /// Number of successful or failed read attempts.
    pub fn reads(&self) -> Arc<AtomicUsize> {
        self.reads.clone()
    }

    /// Number of times the handle was actually released.
    pub fn releases(&self) -> Arc<AtomicUsize> {
        self.releases.clone()
    }
}

impl FrameSource for SyntheticSource {
    fn total_frames(&self) -> Option<u64> {
        self.frames
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>, ExtractError> {
        let produced = self.reads.fetch_add(1, Ordering::SeqCst) as u64;
        if self.stalls {
            let (lock, wake) = &*self.interrupted;
            let mut interrupted = lock.lock().expect("interrupt lock");
            while !*interrupted {
                interrupted = wake.wait(interrupted).expect("interrupt lock");
            }
            return Ok(None);
        }
        if self.fail_after == Some(produced) {
            return Err(ExtractError::Decode("corrupt packet".to_string()));
        }
        if self.frames.is_some_and(|total| produced >= total) {
            return Ok(None);
        }
        let shade = (produced % 256) as u8;
        Ok(Some(RgbImage::from_pixel(16, 12, image::Rgb([shade, 64, 255 - shade]))))
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }

    fn interrupt_handle(&self) -> Option<Interrupt> {
        let interrupted = self.interrupted.clone();
        Some(Box::new(move || {
            let (lock, wake) = &*interrupted;
            *lock.lock().expect("interrupt lock") = true;
            wake.notify_all();
        }))
    }
}
