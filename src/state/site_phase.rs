/// Per-site crawl phase definitions
///
/// A site crawl moves `Idle -> Resuming -> Running <-> Checkpointing -> Completed`.
/// `Failed` is only reachable from `Resuming` or `Running`.
use std::fmt;

/// Represents the phase a site crawl is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SitePhase {
    /// Site crawl has not started
    Idle,

    /// Loading a checkpoint or seeding the frontier
    Resuming,

    /// Working through the frontier
    Running,

    /// Persisting a checkpoint after a batch of articles
    Checkpointing,

    // ===== Terminal States =====
    /// Frontier exhausted or article cap reached
    Completed,

    /// Unrecoverable error (sink failure, invalid setup)
    Failed,
}

impl SitePhase {
    /// Returns true if no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Checks whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SitePhase) -> bool {
        use SitePhase::*;

        matches!(
            (self, next),
            (Idle, Resuming)
                | (Resuming, Running)
                | (Resuming, Failed)
                | (Running, Checkpointing)
                | (Running, Completed)
                | (Running, Failed)
                | (Checkpointing, Running)
        )
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Resuming => "resuming",
            Self::Running => "running",
            Self::Checkpointing => "checkpointing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Resuming,
            Self::Running,
            Self::Checkpointing,
            Self::Completed,
            Self::Failed,
        ]
    }
}

impl fmt::Display for SitePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
