use serde::{Deserialize, Serialize};

/// One checklist entry of a task template. The live, toggleable copy a round
/// works on is [`super::ChecklistItem`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItemDef {
    pub id: String,
    pub label: String,
}

/// Reusable round template. Owned by the task API; read-only for the duration
/// of a round execution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TaskDefinition {
    pub id: String,
    pub title: String,
    pub sector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Default responsible-party name, used when no authenticated actor name
    /// is supplied at session creation.
    pub responsible: String,
    /// Ordered; the order carries through to the round log.
    pub checklist: Vec<ChecklistItemDef>,
}
