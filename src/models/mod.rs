mod round_log;
mod task;

pub use round_log::{ChecklistItem, PhotoPayload, RoundLog};
pub use task::{ChecklistItemDef, TaskDefinition};
