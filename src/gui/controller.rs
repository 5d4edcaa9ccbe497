use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use chrono::{DateTime, Local};
use tokio::sync::{mpsc, watch};
use uuid::Uuid;
use crate::core::{output_dir_for, Controls, ExtractorConfig, OutputDirectory, PlaybackState};
use crate::video::{DisplayFrame, Extractor, FfmpegSource, FrameSource, Interrupt, UiDispatch, WorkerEvent};

/// Something the user has to acknowledge, shown as a blocking dialog.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Completed {
        frames: u64,
        output_dir: PathBuf,
        stopped_early: bool,
    },
    Error {
        title: String,
        message: String,
    },
}

/// How the status line should be colored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTone {
    Info,
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PreviewUpdate {
    Frame(DisplayFrame),
    Cleared,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub written: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn fraction(&self) -> f32 {
        match self.total {
            Some(total) if total > 0 => (self.written as f32 / total as f32).min(1.0),
            _ => 0.0,
        }
    }

    pub fn text(&self) -> String {
        match self.total {
            Some(total) => format!("{}/{}", self.written, total),
            None => format!("{}/?", self.written),
        }
    }
}

/// What a finished session produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub video_path: PathBuf,
    pub output_dir: PathBuf,
    pub frames_written: u64,
}

enum Outcome {
    Exhausted,
    StoppedByUser,
    Failed(String),
}

struct Session {
    id: Uuid,
    video_path: PathBuf,
    output_dir: PathBuf,
    commands: watch::Sender<PlaybackState>,
    worker: Option<JoinHandle<Box<dyn FrameSource>>>,
    /// Unblocks a worker stuck in `read_frame` so joining it cannot hang the UI.
    interrupt: Option<Interrupt>,
    started_at: DateTime<Local>,
}

/// Owns the session lifecycle and mediates user commands against the worker.
pub struct PlaybackController {
    config: ExtractorConfig,
    state: PlaybackState,
    session: Option<Session>,
    progress: Progress,
    status: String,
    status_tone: StatusTone,
    pending_preview: Option<PreviewUpdate>,
    notices: VecDeque<Notice>,
    last_summary: Option<SessionSummary>,
    event_sender: mpsc::UnboundedSender<WorkerEvent>,
    event_receiver: mpsc::UnboundedReceiver<WorkerEvent>,
    repaint: Option<egui::Context>,
}

impl PlaybackController {
    pub fn new(config: ExtractorConfig) -> Self {
        let (event_sender, event_receiver) = mpsc::unbounded_channel();
        Self {
            config,
            state: PlaybackState::Idle,
            session: None,
            progress: Progress::default(),
            status: "Waiting for a video file...".to_string(),
            status_tone: StatusTone::Info,
            pending_preview: None,
            notices: VecDeque::new(),
            last_summary: None,
            event_sender,
            event_receiver,
            repaint: None,
        }
    }

    /// Wake this egui context whenever the worker posts an event.
    pub fn with_repaint(mut self, ctx: egui::Context) -> Self {
        self.repaint = Some(ctx);
        self
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn controls(&self) -> Controls {
        self.state.controls()
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn status(&self) -> (&str, StatusTone) {
        (&self.status, self.status_tone)
    }

    pub fn last_summary(&self) -> Option<&SessionSummary> {
        self.last_summary.as_ref()
    }

    pub fn take_preview_update(&mut self) -> Option<PreviewUpdate> {
        self.pending_preview.take()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notices.pop_front()
    }

    /// Open `video_path` and start extracting. Returns whether a session started.
    pub fn select_file(&mut self, video_path: &Path) -> bool {
        if self.state.is_active() {
            log::warn!("Ignoring {}: a session is already running", video_path.display());
            return false;
        }

        match FfmpegSource::open(video_path, &self.config) {
            Ok(source) => self.start_with_source(video_path, Box::new(source)),
            Err(e) => {
                log::error!("Cannot open {}: {}", video_path.display(), e);
                self.report_error("Cannot open video file", format!("{}: {}", video_path.display(), e));
                false
            }
        }
    }

    pub(crate) fn start_with_source(&mut self, video_path: &Path, mut source: Box<dyn FrameSource>) -> bool {
        if self.state.is_active() {
            source.release();
            return false;
        }

        let output = match OutputDirectory::create(output_dir_for(video_path)) {
            Ok(output) => output,
            Err(e) => {
                log::error!("{}", e);
                source.release();
                self.report_error("Cannot create output directory", e.to_string());
                return false;
            }
        };

        let id = Uuid::new_v4();
        let output_dir = output.path().to_path_buf();
        let (commands, command_receiver) = watch::channel(PlaybackState::Running);
        let dispatch = UiDispatch::new(self.event_sender.clone(), self.repaint.clone());

        self.progress = Progress {
            written: 0,
            total: source.total_frames(),
        };

        let interrupt = source.interrupt_handle();
        let extractor = Extractor::new(id, source, output, self.config.clone(), dispatch);
        let worker = thread::spawn(move || extractor.run(command_receiver));

        log::info!(
            "Session {} started: {} -> {}",
            id,
            video_path.display(),
            output_dir.display()
        );

        self.status = format!("Extracting frames to {}", output_dir.display());
        self.status_tone = StatusTone::Info;
        self.session = Some(Session {
            id,
            video_path: video_path.to_path_buf(),
            output_dir,
            commands,
            worker: Some(worker),
            interrupt,
            started_at: Local::now(),
        });
        self.state = PlaybackState::Running;
        true
    }

    pub fn toggle_pause(&mut self) {
        if !self.state.is_active() {
            return;
        }
        let next = self.state.toggled();
        if let Some(session) = &self.session {
            // The worker may already have exited; its Finished event is still queued
            let _ = session.commands.send(next);
        }
        self.state = next;
        self.status = match next {
            PlaybackState::Paused => format!("Paused at {} frames", self.progress.written),
            _ => format!("Extracted {} frames", self.progress.text()),
        };
        self.status_tone = StatusTone::Info;
        log::info!("Playback {}", next.label().to_lowercase());
    }

    pub fn stop(&mut self) {
        if self.state.is_active() {
            self.finish(Outcome::StoppedByUser);
        }
    }

    /// Apply everything the worker has posted since the last call, in order.
    pub fn poll(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            let current = self.session.as_ref().map(|s| s.id);
            if current != Some(event.session()) {
                log::debug!("Dropping event from finished session {}", event.session());
                continue;
            }

            match event {
                WorkerEvent::FrameWritten { index, path, written, preview, .. } => {
                    log::debug!("Frame {} saved to {}", index, path.display());
                    self.progress.written = written;
                    self.pending_preview = Some(PreviewUpdate::Frame(preview));
                    if self.state == PlaybackState::Running {
                        self.status = format!("Extracted {} frames", self.progress.text());
                    }
                }
                WorkerEvent::Finished { .. } => self.finish(Outcome::Exhausted),
                WorkerEvent::Failed { error, .. } => self.finish(Outcome::Failed(error)),
            }
        }
    }

    fn finish(&mut self, outcome: Outcome) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        let _ = session.commands.send(PlaybackState::Stopped);
        if let Some(interrupt) = session.interrupt.take() {
            interrupt();
        }
        if let Some(worker) = session.worker.take() {
            match worker.join() {
                Ok(mut source) => source.release(),
                Err(_) => log::error!("Extraction worker for session {} panicked", session.id),
            }
        }

        // The worker has exited, so every frame it wrote is already queued
        let mut frames = self.progress.written;
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                WorkerEvent::FrameWritten { session: id, written, .. } if id == session.id => frames = written,
                WorkerEvent::Finished { session: id, written }
                | WorkerEvent::Failed { session: id, written, .. }
                    if id == session.id =>
                {
                    frames = written
                }
                _ => {}
            }
        }

        let finished_at = Local::now();
        log::info!(
            "Session {} stopped after {} frames in {:.1}s",
            session.id,
            frames,
            (finished_at - session.started_at).num_milliseconds() as f64 / 1000.0
        );

        self.state = PlaybackState::Stopped;
        self.progress = Progress::default();
        self.pending_preview = Some(PreviewUpdate::Cleared);
        self.last_summary = Some(SessionSummary {
            video_path: session.video_path.clone(),
            output_dir: session.output_dir.clone(),
            frames_written: frames,
        });

        match outcome {
            Outcome::Failed(error) => {
                self.report_error(
                    "Extraction aborted",
                    format!("{} frames were written before the failure: {}", frames, error),
                );
            }
            outcome => {
                self.status = format!(
                    "Done: {} frames written to {} ({})",
                    frames,
                    session.output_dir.display(),
                    finished_at.format("%H:%M:%S")
                );
                self.status_tone = StatusTone::Success;
                self.notices.push_back(Notice::Completed {
                    frames,
                    output_dir: session.output_dir,
                    stopped_early: matches!(outcome, Outcome::StoppedByUser),
                });
            }
        }
    }

    fn report_error(&mut self, title: &str, message: String) {
        self.status = message.clone();
        self.status_tone = StatusTone::Error;
        self.notices.push_back(Notice::Error {
            title: title.to_string(),
            message,
        });
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.stop();
    }
}
