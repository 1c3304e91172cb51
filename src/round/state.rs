use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RoundError;
use crate::models::{ChecklistItem, PhotoPayload, TaskDefinition};
use crate::signature::SignaturePad;

/// Lifecycle of a round execution. Never regresses; nothing leaves
/// `Completed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum RoundPhase {
    NotStarted,
    Running,
    Completed,
}

impl Default for RoundPhase {
    fn default() -> Self {
        RoundPhase::NotStarted
    }
}

/// State of a single round execution. All mutation goes through the guarded
/// methods below; running-only operations are rejected in any other phase.
#[derive(Debug)]
pub struct RoundState {
    phase: RoundPhase,
    started_at: Option<DateTime<Utc>>,
    /// Delivered one-second ticks while running. Authoritative duration,
    /// immune to wall-clock drift from process suspension.
    elapsed_seconds: u64,
    responsible: String,
    checklist: Vec<ChecklistItem>,
    observations: String,
    issues_flag: bool,
    photos: Vec<PhotoPayload>,
    signature: SignaturePad,
}

impl RoundState {
    /// Creates a session for one execution of `task`. The responsible party
    /// is resolved once, here: the authenticated actor's display name when
    /// present and non-blank, otherwise the task's default responsible field.
    pub fn new(task: &TaskDefinition, actor_name: Option<&str>) -> Self {
        let responsible = actor_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| task.responsible.trim())
            .to_string();

        Self {
            phase: RoundPhase::NotStarted,
            started_at: None,
            elapsed_seconds: 0,
            responsible,
            checklist: task
                .checklist
                .iter()
                .map(|item| ChecklistItem {
                    id: item.id.clone(),
                    label: item.label.clone(),
                    checked: false,
                })
                .collect(),
            observations: String::new(),
            issues_flag: false,
            photos: Vec::new(),
            signature: SignaturePad::new(),
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    pub fn responsible(&self) -> &str {
        &self.responsible
    }

    pub fn checklist(&self) -> &[ChecklistItem] {
        &self.checklist
    }

    pub fn observations(&self) -> &str {
        &self.observations
    }

    pub fn issues_flag(&self) -> bool {
        self.issues_flag
    }

    pub fn photos(&self) -> &[PhotoPayload] {
        &self.photos
    }

    pub fn signature(&self) -> &SignaturePad {
        &self.signature
    }

    pub fn has_unchecked_items(&self) -> bool {
        self.checklist.iter().any(|item| !item.checked)
    }

    /// `NOT_STARTED -> RUNNING`. Records the start instant exactly once.
    /// Rejected when the responsible party is blank; that should never happen
    /// with a logged-in actor, but the guard must exist.
    pub fn begin(&mut self, now: DateTime<Utc>) -> Result<(), RoundError> {
        match self.phase {
            RoundPhase::Running => return Err(RoundError::AlreadyStarted),
            RoundPhase::Completed => return Err(RoundError::AlreadyCompleted),
            RoundPhase::NotStarted => {}
        }
        if self.responsible.is_empty() {
            return Err(RoundError::ResponsibleUnresolved);
        }
        self.started_at = Some(now);
        self.phase = RoundPhase::Running;
        Ok(())
    }

    /// One delivered clock tick. Ticks arriving outside `Running` are
    /// dropped, so the counter never moves before start or after completion.
    pub fn record_tick(&mut self) {
        if self.phase == RoundPhase::Running {
            self.elapsed_seconds += 1;
        }
    }

    /// Flips one checklist item. Unknown ids are ignored.
    pub fn toggle_item(&mut self, item_id: &str) -> Result<(), RoundError> {
        self.ensure_running()?;
        if let Some(item) = self.checklist.iter_mut().find(|item| item.id == item_id) {
            item.checked = !item.checked;
        }
        Ok(())
    }

    pub fn set_observations(&mut self, text: impl Into<String>) -> Result<(), RoundError> {
        self.ensure_running()?;
        self.observations = text.into();
        Ok(())
    }

    pub fn set_issues_flag(&mut self, flagged: bool) -> Result<(), RoundError> {
        self.ensure_running()?;
        self.issues_flag = flagged;
        Ok(())
    }

    /// Appends an evidence photo. Append-only; no dedup and no size cap here.
    pub fn push_photo(&mut self, photo: PhotoPayload) -> Result<(), RoundError> {
        self.ensure_running()?;
        self.photos.push(photo);
        Ok(())
    }

    /// Drawing is only allowed while the round runs.
    pub fn signature_mut(&mut self) -> Result<&mut SignaturePad, RoundError> {
        self.ensure_running()?;
        Ok(&mut self.signature)
    }

    /// `RUNNING -> COMPLETED`. Called by the controller only after the sink
    /// acknowledged the round log.
    pub(crate) fn finish(&mut self) {
        self.phase = RoundPhase::Completed;
    }

    fn ensure_running(&self) -> Result<(), RoundError> {
        match self.phase {
            RoundPhase::Running => Ok(()),
            RoundPhase::Completed => Err(RoundError::AlreadyCompleted),
            RoundPhase::NotStarted => Err(RoundError::NotRunning),
        }
    }
}
