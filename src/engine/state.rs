use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Lifecycle of a scan run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelineState {
    Idle,
    Initializing,
    Running {
        #[serde(skip)]
        start_time: Option<Instant>,
    },
    /// No new frames are accepted; frames in flight are being processed and
    /// the sinks flushed
    Draining,
    Completed {
        #[serde(skip)]
        duration: Option<Duration>,
        total_frames: u64,
        /// False when the run was stopped before the end frequency
        reached_end: bool,
    },
    Error {
        error_msg: String,
        recoverable: bool,
    },
}

impl PipelineState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &PipelineState) -> bool {
        use PipelineState::*;

        matches!(
            (self, target),
            // From Idle
            (Idle, Initializing) |

            // From Initializing
            (Initializing, Running { .. }) |
            (Initializing, Error { .. }) |

            // From Running
            (Running { .. }, Draining) |
            (Running { .. }, Error { .. }) |

            // From Draining
            (Draining, Completed { .. }) |
            (Draining, Error { .. }) |

            // From Completed
            (Completed { .. }, Idle) |

            // From Error
            (Error { recoverable: true, .. }, Idle)
        )
    }

    /// Get human-readable state name
    pub fn name(&self) -> &str {
        match self {
            Self::Idle => "Idle",
            Self::Initializing => "Initializing",
            Self::Running { .. } => "Running",
            Self::Draining => "Draining",
            Self::Completed { .. } => "Completed",
            Self::Error { .. } => "Error",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Running { .. } | Self::Draining)
    }
}

impl Default for PipelineState {
    fn default() -> Self {
        Self::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_transitions() {
        let idle = PipelineState::Idle;
        let init = PipelineState::Initializing;

        assert!(idle.can_transition_to(&init));
        assert!(!init.can_transition_to(&idle));
    }

    #[test]
    fn test_running_must_drain_before_completing() {
        let running = PipelineState::Running { start_time: None };
        let completed = PipelineState::Completed {
            duration: None,
            total_frames: 10,
            reached_end: true,
        };

        assert!(!running.can_transition_to(&completed));
        assert!(running.can_transition_to(&PipelineState::Draining));
        assert!(PipelineState::Draining.can_transition_to(&completed));
    }

    #[test]
    fn test_error_recovery() {
        let recoverable_error = PipelineState::Error {
            error_msg: "source ended".to_string(),
            recoverable: true,
        };
        let unrecoverable_error = PipelineState::Error {
            error_msg: "frame length".to_string(),
            recoverable: false,
        };

        assert!(recoverable_error.can_transition_to(&PipelineState::Idle));
        assert!(!unrecoverable_error.can_transition_to(&PipelineState::Idle));
    }
}
