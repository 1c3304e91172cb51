//! Completion record builder: pure derivation of the immutable round log
//! from a session's final state. Invoked exactly once per round, at the
//! completion transition.

use chrono::{DateTime, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::error::SignatureError;
use crate::models::{RoundLog, TaskDefinition};
use crate::round::RoundState;

const TOKEN_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";
const TOKEN_RANDOM_LEN: usize = 5;

/// `RND-<5 base36 chars>-<last 6 digits of the completion epoch millis>`.
///
/// Lets a third party cross-check a printed report against the system of
/// record. Moderately unguessable at best: no collision check, no
/// cryptographic properties. Treat it as a weak authenticity aid only.
pub fn validation_token(completed_at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let random: String = (0..TOKEN_RANDOM_LEN)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect();
    let millis = completed_at.timestamp_millis().rem_euclid(1_000_000);
    format!("RND-{random}-{millis:06}")
}

/// Freezes the session into a [`RoundLog`] value snapshot.
///
/// The checklist is deep-copied, the duration is the session's delivered tick
/// count, and `issues_detected` is forced true whenever any item was left
/// unchecked, regardless of the user's explicit flag. The signature raster is
/// exported only when ink exists.
pub fn build_round_log(
    task: &TaskDefinition,
    state: &RoundState,
    completed_at: DateTime<Utc>,
) -> Result<RoundLog, SignatureError> {
    let signature = if state.signature().has_ink() {
        Some(state.signature().export_png()?)
    } else {
        None
    };

    Ok(RoundLog {
        id: Uuid::new_v4().to_string(),
        task_id: task.id.clone(),
        task_title: task.title.clone(),
        ticket_id: task.ticket_id.clone(),
        sector: task.sector.clone(),
        responsible: state.responsible().to_string(),
        start_time: state.started_at().unwrap_or(completed_at),
        end_time: completed_at,
        duration_seconds: state.elapsed_seconds(),
        checklist_state: state.checklist().to_vec(),
        observations: state.observations().to_string(),
        issues_detected: state.issues_flag() || state.has_unchecked_items(),
        photos: state.photos().to_vec(),
        signature,
        validation_token: validation_token(completed_at),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChecklistItemDef;
    use std::collections::HashSet;

    fn task() -> TaskDefinition {
        TaskDefinition {
            id: "task-3".into(),
            title: "Boiler room round".into(),
            sector: "Utilities".into(),
            ticket_id: None,
            responsible: "Guard".into(),
            checklist: vec![
                ChecklistItemDef { id: "p".into(), label: "Pressure normal".into() },
                ChecklistItemDef { id: "v".into(), label: "Valves closed".into() },
            ],
        }
    }

    fn running_state(actor: &str) -> RoundState {
        let mut state = RoundState::new(&task(), Some(actor));
        state.begin(Utc::now()).unwrap();
        state
    }

    #[test]
    fn unchecked_item_forces_issues_regardless_of_flag() {
        let mut state = running_state("Guard A");
        state.toggle_item("p").unwrap();
        state.set_issues_flag(false).unwrap();

        let log = build_round_log(&task(), &state, Utc::now()).unwrap();
        assert!(log.issues_detected);

        state.toggle_item("v").unwrap();
        let all_checked = build_round_log(&task(), &state, Utc::now()).unwrap();
        assert!(!all_checked.issues_detected);

        state.set_issues_flag(true).unwrap();
        let flagged = build_round_log(&task(), &state, Utc::now()).unwrap();
        assert!(flagged.issues_detected);
    }

    #[test]
    fn token_shape_is_rnd_base36_and_six_digits() {
        let token = validation_token(Utc::now());
        let parts: Vec<&str> = token.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "RND");
        assert_eq!(parts[1].len(), 5);
        assert!(parts[1].chars().all(|c| c.is_ascii_digit() || c.is_ascii_uppercase()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn logs_built_in_the_same_millisecond_never_collide() {
        let state = running_state("Guard A");
        let now = Utc::now();

        let mut ids = HashSet::new();
        let mut tokens = HashSet::new();
        for _ in 0..64 {
            let log = build_round_log(&task(), &state, now).unwrap();
            assert!(ids.insert(log.id), "duplicate round log id");
            assert!(tokens.insert(log.validation_token), "duplicate token");
        }
    }

    #[test]
    fn checklist_state_is_a_value_snapshot() {
        let mut state = running_state("Guard A");
        state.toggle_item("p").unwrap();
        let log = build_round_log(&task(), &state, Utc::now()).unwrap();

        // Mutating the session afterwards must not reach into the log.
        state.toggle_item("p").unwrap();
        state.toggle_item("v").unwrap();

        assert!(log.checklist_state[0].checked);
        assert!(!log.checklist_state[1].checked);
    }

    #[test]
    fn wire_field_names_match_the_round_api() {
        let state = running_state("Guard A");
        let log = build_round_log(&task(), &state, Utc::now()).unwrap();
        let json = serde_json::to_value(&log).unwrap();
        for key in [
            "taskId",
            "taskTitle",
            "durationSeconds",
            "checklistState",
            "issuesDetected",
            "validationToken",
        ] {
            assert!(json.get(key).is_some(), "missing wire field {key}");
        }
        assert!(json.get("signature").is_none(), "unsigned log serializes no signature");
    }
}
