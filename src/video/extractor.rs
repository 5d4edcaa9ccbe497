// Extraction loop: runs on the session's worker thread, reads frames in order,
// writes each one as a JPEG and hands a preview copy to the UI thread.
//
// The worker never touches widgets. Everything the UI needs travels through
// `UiDispatch` as `WorkerEvent`s, in the order they were produced. The
// commanded state arrives through a watch channel, so the worker only ever
// sees the latest Running/Paused/Stopped value.

use std::path::PathBuf;
use std::thread;
use tokio::sync::{mpsc, watch};
use uuid::Uuid;
use crate::core::{ExtractorConfig, OutputDirectory, PlaybackState};
use crate::video::{DisplayFrame, Frame, FrameSource};

/// Progress reports from the worker, tagged with the session that produced them.
#[derive(Debug)]
pub enum WorkerEvent {
    FrameWritten {
        session: Uuid,
        index: u64,
        path: PathBuf,
        written: u64,
        preview: DisplayFrame,
    },
    /// The stream ran out; this is the normal end of a session.
    Finished { session: Uuid, written: u64 },
    /// Writing a frame failed and the session was aborted.
    Failed { session: Uuid, written: u64, error: String },
}

impl WorkerEvent {
    pub fn session(&self) -> Uuid {
        match self {
            WorkerEvent::FrameWritten { session, .. }
            | WorkerEvent::Finished { session, .. }
            | WorkerEvent::Failed { session, .. } => *session,
        }
    }
}

/// Posts worker events to the UI thread and wakes it up.
#[derive(Clone)]
pub struct UiDispatch {
    sender: mpsc::UnboundedSender<WorkerEvent>,
    repaint: Option<egui::Context>,
}

impl UiDispatch {
    pub fn new(sender: mpsc::UnboundedSender<WorkerEvent>, repaint: Option<egui::Context>) -> Self {
        Self { sender, repaint }
    }

    /// Returns false once the UI side has gone away.
    pub fn post(&self, event: WorkerEvent) -> bool {
        let delivered = self.sender.send(event).is_ok();
        if let Some(ctx) = &self.repaint {
            ctx.request_repaint();
        }
        delivered
    }
}

/// Outcome of a single loop iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Paused,
    Wrote(u64),
    Finished,
    Failed,
    Stopped,
}

pub struct Extractor {
    session: Uuid,
    source: Box<dyn FrameSource>,
    output: OutputDirectory,
    config: ExtractorConfig,
    dispatch: UiDispatch,
    written: u64,
}

impl Extractor {
    pub fn new(
        session: Uuid,
        source: Box<dyn FrameSource>,
        output: OutputDirectory,
        config: ExtractorConfig,
        dispatch: UiDispatch,
    ) -> Self {
        Self {
            session,
            source,
            output,
            config,
            dispatch,
            written: 0,
        }
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    /// Run one iteration against the commanded state. Paused never consumes a frame.
    pub fn step(&mut self, commanded: PlaybackState) -> Step {
        match commanded {
            PlaybackState::Running => {}
            PlaybackState::Paused => return Step::Paused,
            PlaybackState::Idle | PlaybackState::Stopped => return Step::Stopped,
        }

        let image = match self.source.read_frame() {
            Ok(Some(image)) => image,
            Ok(None) => {
                log::info!("Stream exhausted after {} frames", self.written);
                self.dispatch.post(WorkerEvent::Finished {
                    session: self.session,
                    written: self.written,
                });
                return Step::Finished;
            }
            Err(e) => {
                log::warn!("Read failed after {} frames, ending session: {}", self.written, e);
                self.dispatch.post(WorkerEvent::Finished {
                    session: self.session,
                    written: self.written,
                });
                return Step::Finished;
            }
        };

        let index = self.written;
        let frame = Frame::new(index, image);
        let preview = frame.display_copy(self.config.preview_width, self.config.preview_height);
        let path = self.output.frame_path(frame.index);

        if let Err(e) = frame.write_jpeg(&path, self.config.jpeg_quality) {
            log::error!("Aborting session {}: {}", self.session, e);
            self.dispatch.post(WorkerEvent::Failed {
                session: self.session,
                written: self.written,
                error: e.to_string(),
            });
            return Step::Failed;
        }

        self.written += 1;
        log::debug!("Wrote {}", path.display());

        let delivered = self.dispatch.post(WorkerEvent::FrameWritten {
            session: self.session,
            index,
            path,
            written: self.written,
            preview,
        });
        if !delivered {
            log::warn!("UI is gone, stopping session {}", self.session);
            return Step::Stopped;
        }

        Step::Wrote(index)
    }

    /// Loop until stopped, exhausted or failed. The source is handed back
    /// unreleased so the controller can release it.
    pub fn run(mut self, commands: watch::Receiver<PlaybackState>) -> Box<dyn FrameSource> {
        log::info!("Extraction worker started for session {}", self.session);
        loop {
            let commanded = *commands.borrow();
            match self.step(commanded) {
                Step::Wrote(_) => thread::sleep(self.config.frame_delay()),
                Step::Paused => thread::sleep(self.config.pause_poll()),
                Step::Finished | Step::Failed | Step::Stopped => break,
            }
        }
        log::info!(
            "Extraction worker for session {} exiting after {} frames",
            self.session,
            self.written()
        );
        self.source
    }
}
