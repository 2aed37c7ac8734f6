//! Controller lifecycle states.

use serde::{Deserialize, Serialize};

/// Where a [`GenerationController`](super::GenerationController) is in its
/// lifecycle.
///
/// ```text
/// Initializing -> Ready -> Running -> Stopping -> Stopped
///                                  \-> Completed
/// Stopped | Completed -> Running (resume)
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerationStatus {
    /// Mandatory configuration still missing.
    Initializing,
    /// Configured, never started.
    Ready,
    /// Worker alive and producing candidates.
    Running,
    /// Stop requested; worker exits at its next check.
    Stopping,
    /// Worker exited early: stop request, guard, or deadlock.
    Stopped,
    /// Desired count reached and list finalized.
    Completed,
}

impl GenerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationStatus::Initializing => "initializing",
            GenerationStatus::Ready => "ready",
            GenerationStatus::Running => "running",
            GenerationStatus::Stopping => "stopping",
            GenerationStatus::Stopped => "stopped",
            GenerationStatus::Completed => "completed",
        }
    }

    /// A worker thread is alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self, GenerationStatus::Running | GenerationStatus::Stopping)
    }

    /// `start()` is accepted from here (count permitting).
    #[must_use]
    pub fn can_start(&self) -> bool {
        matches!(
            self,
            GenerationStatus::Ready | GenerationStatus::Stopped | GenerationStatus::Completed
        )
    }
}

impl std::fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        assert!(GenerationStatus::Running.is_active());
        assert!(GenerationStatus::Stopping.is_active());
        assert!(!GenerationStatus::Stopped.is_active());

        assert!(GenerationStatus::Ready.can_start());
        assert!(GenerationStatus::Stopped.can_start());
        assert!(GenerationStatus::Completed.can_start());
        assert!(!GenerationStatus::Initializing.can_start());
        assert!(!GenerationStatus::Running.can_start());
    }

    #[test]
    fn test_display() {
        assert_eq!(GenerationStatus::Completed.to_string(), "completed");
        assert_eq!(format!("{}", GenerationStatus::Initializing), "initializing");
    }
}
