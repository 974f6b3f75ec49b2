use std::fmt;

use serde::{Deserialize, Serialize};

/// Terminal outcome recorded on an item when it leaves the running slot.
///
/// The store encoding stays string-based (`"completed"`, `"stopped"`, ...)
/// for compatibility with external consumers of the history list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    /// Item ran to completion.
    Completed,
    /// Item failed during execution.
    Failed,
    /// Item was stopped and re-queued for a later run.
    Stopped,
    /// Item was aborted and re-queued.
    Aborted,
    /// Item was halted and re-queued.
    Halted,
}

impl ExitStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitStatus::Completed => "completed",
            ExitStatus::Failed => "failed",
            ExitStatus::Stopped => "stopped",
            ExitStatus::Aborted => "aborted",
            ExitStatus::Halted => "halted",
        }
    }
}

impl fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
