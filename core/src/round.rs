//! Round states and the legal transitions between them.

use serde::{Deserialize, Serialize};

/// Top-level state of the session. Exactly one is live at a time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoundState {
    /// Waiting for a difficulty selection and a start request.
    #[default]
    Menu,
    /// A round is being simulated.
    Running,
    /// A round is frozen until resumed.
    Paused,
    /// The pursuer caught the evader.
    Won {
        /// Final score awarded for the round.
        score: u32,
    },
    /// The time limit elapsed before a capture.
    Lost,
}

/// Triggers that may move the session between round states.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RoundTrigger {
    /// Start a round from the menu.
    Start,
    /// Freeze the running round.
    Pause,
    /// Continue the paused round.
    Resume,
    /// The pursuer reached the evader.
    Capture {
        /// Final score awarded for the round.
        score: u32,
    },
    /// The round's time limit elapsed.
    TimeExpired,
    /// Leave the round for the menu.
    ReturnToMenu,
    /// Restart a finished round.
    Retry,
}

impl RoundState {
    /// Resolves the state reached by applying `trigger`, or `None` when the
    /// trigger is not legal in the current state.
    #[must_use]
    pub const fn transition(self, trigger: RoundTrigger) -> Option<RoundState> {
        match (self, trigger) {
            (Self::Menu, RoundTrigger::Start) => Some(Self::Running),
            (Self::Running, RoundTrigger::Pause) => Some(Self::Paused),
            (Self::Paused, RoundTrigger::Resume) => Some(Self::Running),
            (Self::Running, RoundTrigger::Capture { score }) => Some(Self::Won { score }),
            (Self::Running, RoundTrigger::TimeExpired) => Some(Self::Lost),
            (Self::Paused | Self::Won { .. } | Self::Lost, RoundTrigger::ReturnToMenu) => {
                Some(Self::Menu)
            }
            (Self::Won { .. } | Self::Lost, RoundTrigger::Retry) => Some(Self::Running),
            _ => None,
        }
    }

    /// Reports whether a round is in progress, running or paused.
    #[must_use]
    pub const fn is_in_round(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }

    /// Reports whether the round has finished and its outcome is on display.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Won { .. } | Self::Lost)
    }

    /// Short label used by presentation layers.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Menu => "Menu",
            Self::Running => "Running",
            Self::Paused => "Paused",
            Self::Won { .. } => "Won",
            Self::Lost => "Lost",
        }
    }
}
