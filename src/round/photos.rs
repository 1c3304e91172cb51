use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::models::PhotoPayload;

use super::state::{RoundPhase, RoundState};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

/// Reads one evidence photo from disk and applies it to the session as a
/// single atomic update. The read races session teardown: a read that
/// finishes after cancellation, or after the round left `Running`, is
/// discarded rather than applied to a defunct session.
pub(crate) async fn read_and_attach(
    path: PathBuf,
    state: Arc<Mutex<RoundState>>,
    cancel_token: CancellationToken,
) {
    let bytes = tokio::select! {
        result = tokio::fs::read(&path) => match result {
            Ok(bytes) => bytes,
            Err(err) => {
                log_warn!("evidence photo read failed for {}: {err}", path.display());
                return;
            }
        },
        _ = cancel_token.cancelled() => {
            log_info!("evidence photo read aborted by cancellation: {}", path.display());
            return;
        }
    };

    if cancel_token.is_cancelled() {
        log_info!(
            "discarding photo read that finished after cancellation: {}",
            path.display()
        );
        return;
    }

    let mut guard = state.lock().await;
    if guard.phase() != RoundPhase::Running {
        log_info!(
            "discarding photo for a round that is no longer running: {}",
            path.display()
        );
        return;
    }

    let size = bytes.len();
    match guard.push_photo(PhotoPayload { bytes }) {
        Ok(()) => log_info!("attached evidence photo ({size} bytes) from {}", path.display()),
        Err(err) => log_warn!("failed to attach evidence photo: {err}"),
    }
}
