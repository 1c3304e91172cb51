//! Contracts for the external collaborators the core talks to. The other
//! side of each trait (REST storage, PDF layout) lives outside this crate.

use async_trait::async_trait;

use crate::models::RoundLog;

/// Durable storage for completed rounds.
///
/// Completion is a two-phase commit against this sink: the session phase only
/// advances after `save` returns Ok, so a rejected record leaves the round
/// running and retriable. The core performs no retrying or queueing of its
/// own; that is the caller's responsibility.
#[async_trait]
pub trait RoundLogSink: Send + Sync {
    async fn save(&self, log: &RoundLog) -> anyhow::Result<()>;
}

/// Renders a completed round into a paginated document (PDF or otherwise):
/// header with token, task/sector/ticket/responsible/time fields, per-item
/// pass/fail checklist marks, observations, and the signature raster or an
/// explicit not-signed notice. See [`crate::report`] for the textual
/// reference implementation.
pub trait ReportRenderer {
    fn render(&self, log: &RoundLog) -> anyhow::Result<Vec<u8>>;
}
