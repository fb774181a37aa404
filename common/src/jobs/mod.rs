use serde::{Deserialize, Serialize};

/// Status of a background reconciliation or load job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum JobStatus {
    Pending,
    /// Number of statements issued so far.
    InProgress(u32),
    /// Human-readable summary of what was applied.
    Completed(String),
    Failed(String),
}
