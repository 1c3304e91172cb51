use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Live checklist entry of a running round, frozen into the round log at
/// completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub label: String,
    pub checked: bool,
}

/// Opaque evidence image. The core accepts whatever the capture collaborator
/// produced; content and size validation happen upstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPayload {
    pub bytes: Vec<u8>,
}

/// Immutable record of one completed round. Built exactly once, at the
/// completion transition; a value snapshot with no back-reference to the
/// session, safe to hand to storage and reporting.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundLog {
    pub id: String,
    pub task_id: String,
    pub task_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub sector: String,
    pub responsible: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Delivered one-second ticks while the round was running. Authoritative;
    /// deliberately not `end_time - start_time`.
    pub duration_seconds: u64,
    pub checklist_state: Vec<ChecklistItem>,
    pub observations: String,
    /// True when the user flagged an issue or any checklist item was left
    /// unchecked at completion.
    pub issues_detected: bool,
    pub photos: Vec<PhotoPayload>,
    /// PNG raster of the signature surface, when the round was signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<Vec<u8>>,
    /// Human-checkable token printed on reports, e.g. `RND-7K2QX-483920`.
    /// A weak authenticity aid, not a security control.
    pub validation_token: String,
}
