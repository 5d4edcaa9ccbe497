/// Lifecycle of an extraction session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    Running,
    Paused,
    Stopped,
}

/// Which buttons are usable, derived from a [`PlaybackState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub select_enabled: bool,
    pub pause_enabled: bool,
    pub stop_enabled: bool,
    pub pause_label: &'static str,
}

impl PlaybackState {
    /// True while a worker thread owns the session.
    pub fn is_active(self) -> bool {
        matches!(self, PlaybackState::Running | PlaybackState::Paused)
    }

    pub fn toggled(self) -> Self {
        match self {
            PlaybackState::Running => PlaybackState::Paused,
            PlaybackState::Paused => PlaybackState::Running,
            other => other,
        }
    }

    pub fn controls(self) -> Controls {
        let active = self.is_active();
        Controls {
            select_enabled: !active,
            pause_enabled: active,
            stop_enabled: active,
            pause_label: if self == PlaybackState::Paused { "Resume" } else { "Pause" },
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PlaybackState::Idle => "Idle",
            PlaybackState::Running => "Running",
            PlaybackState::Paused => "Paused",
            PlaybackState::Stopped => "Stopped",
        }
    }
}
