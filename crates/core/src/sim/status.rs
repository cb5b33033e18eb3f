//! Host-facing status notifications.

use super::scheduler::SpeedMultiplier;
use std::fmt;

/// Where a resumed session came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResumeSource {
    /// A savestate, in memory or persisted, was restored.
    Snapshot {
        /// Id of the restored entry.
        id: String,
    },
    /// No savestate existed; the last cartridge was cold-started.
    Cartridge {
        /// Cartridge display name.
        name: String,
    },
}

/// Something the host may want to show the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    /// A cartridge was loaded.
    Loaded {
        /// Cartridge display name.
        name: String,
    },
    /// Loading a cartridge failed.
    LoadFailed {
        /// Error description.
        reason: String,
    },
    /// A snapshot was restored.
    Restored,
    /// Restoring a snapshot failed; machine state is unchanged.
    RestoreFailed {
        /// Error description.
        reason: String,
    },
    /// Rewound to an earlier entry.
    Rewound {
        /// Id of the entry now current.
        id: String,
    },
    /// Rewind was requested with fewer than two entries.
    NoPreviousSnapshot,
    /// An external save was imported.
    Imported {
        /// Id of the new entry.
        id: String,
    },
    /// A previous session was resumed.
    SessionResumed(ResumeSource),
    /// Neither a savestate nor a last cartridge was found.
    NothingToResume,
    /// Saves were wiped.
    Cleared {
        /// Persisted saves deleted.
        deleted: usize,
    },
    /// The scheduler started running.
    Running,
    /// The scheduler paused.
    Paused,
    /// The speed multiplier changed.
    SpeedChanged(SpeedMultiplier),
    /// An external engine was attached.
    EngineAttached {
        /// Engine name.
        name: String,
    },
    /// The reference engine is active again.
    EngineDetached,
}

impl fmt::Display for StatusEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Loaded { name } => write!(f, "Loaded ROM {name}"),
            Self::LoadFailed { reason } => write!(f, "Load failed: {reason}"),
            Self::Restored => f.write_str("Savestate restored"),
            Self::RestoreFailed { reason } => write!(f, "Restore failed: {reason}"),
            Self::Rewound { id } => write!(f, "Rewound to {id}"),
            Self::NoPreviousSnapshot => f.write_str("No previous savestate to restore"),
            Self::Imported { id } => write!(f, "Imported save as {id}"),
            Self::SessionResumed(ResumeSource::Snapshot { .. }) => f.write_str("Restored last save"),
            Self::SessionResumed(ResumeSource::Cartridge { name }) => {
                write!(f, "Loaded ROM {name} from last session")
            }
            Self::NothingToResume => f.write_str("Nothing to resume"),
            Self::Cleared { deleted } => write!(f, "Cleared {deleted} saves"),
            Self::Running => f.write_str("Running"),
            Self::Paused => f.write_str("Paused"),
            Self::SpeedChanged(speed) => write!(f, "Speed {speed}"),
            Self::EngineAttached { name } => write!(f, "Engine {name} attached"),
            Self::EngineDetached => f.write_str("Reference engine active"),
        }
    }
}

/// Callback receiving status events.
pub type StatusSink = Box<dyn Fn(&StatusEvent) + Send + Sync>;
