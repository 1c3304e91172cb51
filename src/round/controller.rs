use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use log::{info, warn};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time, time::MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::{
    boundary::RoundLogSink,
    error::RoundError,
    models::{ChecklistItem, PhotoPayload, RoundLog, TaskDefinition},
    record::build_round_log,
    signature::{Point, PointerEvent},
    utils::format_elapsed,
};

use super::{
    photos::read_and_attach,
    state::{RoundPhase, RoundState},
};

/// Read-model of the live session for host UIs.
#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    pub phase: RoundPhase,
    pub elapsed_seconds: u64,
    /// `HH:MM:SS` rendering of `elapsed_seconds`.
    pub clock: String,
    pub responsible: String,
    pub checklist: Vec<ChecklistItem>,
    pub observations: String,
    pub issues_flag: bool,
    pub photo_count: usize,
    pub has_signature: bool,
}

/// Drives one round execution: owns the session state, the one-second ticker
/// task, and the cancellation token that tears both down on every exit path.
///
/// One controller per round. The host must not create a second controller for
/// the same task before this one completes or is cancelled.
pub struct RoundController {
    task: TaskDefinition,
    state: Arc<Mutex<RoundState>>,
    ticker: std::sync::Mutex<Option<JoinHandle<()>>>,
    cancel_token: CancellationToken,
    tick_interval: Duration,
}

impl RoundController {
    pub fn new(task: TaskDefinition, actor_name: Option<&str>) -> Self {
        Self::with_tick_interval(task, actor_name, Duration::from_secs(1))
    }

    pub(crate) fn with_tick_interval(
        task: TaskDefinition,
        actor_name: Option<&str>,
        tick_interval: Duration,
    ) -> Self {
        let state = RoundState::new(&task, actor_name);
        Self {
            task,
            state: Arc::new(Mutex::new(state)),
            ticker: std::sync::Mutex::new(None),
            cancel_token: CancellationToken::new(),
            tick_interval,
        }
    }

    pub fn task(&self) -> &TaskDefinition {
        &self.task
    }

    pub async fn snapshot(&self) -> RoundSnapshot {
        let state = self.state.lock().await;
        RoundSnapshot {
            phase: state.phase(),
            elapsed_seconds: state.elapsed_seconds(),
            clock: format_elapsed(state.elapsed_seconds()),
            responsible: state.responsible().to_string(),
            checklist: state.checklist().to_vec(),
            observations: state.observations().to_string(),
            issues_flag: state.issues_flag(),
            photo_count: state.photos().len(),
            has_signature: state.signature().has_ink(),
        }
    }

    /// Starts the round: records the start instant, moves to `Running` and
    /// spawns the tick task.
    pub async fn start(&self) -> Result<RoundSnapshot, RoundError> {
        {
            let mut state = self.state.lock().await;
            state.begin(Utc::now())?;
        }
        self.spawn_ticker();
        info!("round started for task {}", self.task.id);
        Ok(self.snapshot().await)
    }

    pub async fn toggle_item(&self, item_id: &str) -> Result<(), RoundError> {
        self.state.lock().await.toggle_item(item_id)
    }

    pub async fn set_observations(&self, text: impl Into<String>) -> Result<(), RoundError> {
        self.state.lock().await.set_observations(text)
    }

    pub async fn set_issues_flag(&self, flagged: bool) -> Result<(), RoundError> {
        self.state.lock().await.set_issues_flag(flagged)
    }

    /// Appends an already-read evidence payload.
    pub async fn attach_photo(&self, photo: PhotoPayload) -> Result<(), RoundError> {
        self.state.lock().await.push_photo(photo)
    }

    /// Fire-and-forget read of an evidence photo from disk. The payload is
    /// applied as one atomic update when the read completes, or discarded if
    /// the session was cancelled or completed in the meantime. The handle is
    /// returned so teardown paths can join it, but nothing requires that.
    pub fn attach_photo_file(&self, path: PathBuf) -> JoinHandle<()> {
        tokio::spawn(read_and_attach(
            path,
            self.state.clone(),
            self.cancel_token.clone(),
        ))
    }

    /// Routes a normalized pointer event to the signature surface. Returns
    /// true when the event belonged to an active stroke, in which case the
    /// host must suppress its default scroll/pan handling.
    pub async fn pointer_event(&self, event: PointerEvent) -> Result<bool, RoundError> {
        Ok(self.state.lock().await.signature_mut()?.handle_pointer(event))
    }

    pub async fn begin_stroke(&self, point: Point) -> Result<(), RoundError> {
        self.state.lock().await.signature_mut()?.begin_stroke(point);
        Ok(())
    }

    pub async fn extend_stroke(&self, point: Point) -> Result<(), RoundError> {
        self.state.lock().await.signature_mut()?.extend_stroke(point);
        Ok(())
    }

    pub async fn end_stroke(&self) -> Result<(), RoundError> {
        self.state.lock().await.signature_mut()?.end_stroke();
        Ok(())
    }

    /// Erases the signature. Returns false when the surface was already blank.
    pub async fn clear_signature(&self) -> Result<bool, RoundError> {
        Ok(self.state.lock().await.signature_mut()?.clear())
    }

    pub async fn has_signature(&self) -> bool {
        self.state.lock().await.signature().has_ink()
    }

    /// Two-phase completion against the sink.
    ///
    /// Builds the round log from current state and hands it to `sink`; the
    /// phase advances to `Completed` (and the ticker stops) only after the
    /// sink acknowledged the record. On sink failure the session stays
    /// `Running` with all state intact, so the user can retry.
    ///
    /// When the surface is blank the caller must pass `allow_unsigned = true`
    /// after obtaining explicit user confirmation; otherwise
    /// [`RoundError::UnsignedCompletion`] is returned and nothing changes.
    pub async fn complete<S>(&self, sink: &S, allow_unsigned: bool) -> Result<RoundLog, RoundError>
    where
        S: RoundLogSink + ?Sized,
    {
        let mut state = self.state.lock().await;
        match state.phase() {
            RoundPhase::Running => {}
            RoundPhase::Completed => return Err(RoundError::AlreadyCompleted),
            RoundPhase::NotStarted => return Err(RoundError::NotRunning),
        }
        if !state.signature().has_ink() && !allow_unsigned {
            return Err(RoundError::UnsignedCompletion);
        }

        let log = build_round_log(&self.task, &state, Utc::now())?;

        // The lock is held across the sink call so the record that gets acked
        // is exactly the state that gets frozen.
        if let Err(err) = sink.save(&log).await {
            warn!("round log sink rejected record {}: {err:#}", log.id);
            return Err(RoundError::Sink(err));
        }

        state.finish();
        drop(state);

        self.shutdown_ticker();
        info!("round {} completed with token {}", log.id, log.validation_token);
        Ok(log)
    }

    /// Discards the session without producing a round log or touching the
    /// sink. Safe at any instant, including mid-stroke or with photo reads in
    /// flight; late reads are dropped by the cancellation token.
    pub fn cancel(self) {
        info!("round cancelled for task {}", self.task.id);
        // Drop performs the actual teardown.
    }

    fn spawn_ticker(&self) {
        let state = self.state.clone();
        let cancel_token = self.cancel_token.clone();
        let tick_interval = self.tick_interval;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // Delay, not burst: a suspended process must not fabricate the
            // ticks it missed.
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // tokio's first interval tick fires immediately; consume it so
            // the counter only advances on whole elapsed seconds.
            interval.tick().await;
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let mut guard = state.lock().await;
                        if guard.phase() != RoundPhase::Running {
                            break;
                        }
                        guard.record_tick();
                    }
                    _ = cancel_token.cancelled() => break,
                }
            }
        });

        let mut ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(previous) = ticker.replace(handle) {
            previous.abort();
        }
    }

    fn shutdown_ticker(&self) {
        self.cancel_token.cancel();
        let mut ticker = self.ticker.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(handle) = ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for RoundController {
    fn drop(&mut self) {
        // Every exit path cancels the ticker and in-flight photo reads,
        // including abrupt teardown.
        self.shutdown_ticker();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChecklistItemDef;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn task() -> TaskDefinition {
        TaskDefinition {
            id: "task-7".into(),
            title: "Warehouse round".into(),
            sector: "Warehouse".into(),
            ticket_id: Some("CH-1043".into()),
            responsible: "Default Guard".into(),
            checklist: vec![
                ChecklistItemDef { id: "i1".into(), label: "Exits clear".into() },
                ChecklistItemDef { id: "i2".into(), label: "Extinguishers sealed".into() },
                ChecklistItemDef { id: "i3".into(), label: "Alarms armed".into() },
            ],
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        saves: AtomicUsize,
        fail_first: AtomicUsize,
    }

    impl RecordingSink {
        fn failing_once() -> Self {
            let sink = Self::default();
            sink.fail_first.store(1, Ordering::SeqCst);
            sink
        }
    }

    #[async_trait]
    impl RoundLogSink for RecordingSink {
        async fn save(&self, _log: &RoundLog) -> anyhow::Result<()> {
            if self.fail_first.load(Ordering::SeqCst) > 0 {
                self.fail_first.fetch_sub(1, Ordering::SeqCst);
                return Err(anyhow!("storage unavailable"));
            }
            self.saves.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn sign(controller: &RoundController) -> impl std::future::Future<Output = ()> + '_ {
        async {
            controller.begin_stroke(Point::new(30.0, 70.0)).await.unwrap();
            controller.extend_stroke(Point::new(200.0, 80.0)).await.unwrap();
            controller.end_stroke().await.unwrap();
        }
    }

    /// Drives `n` clock ticks directly, bypassing the wall-clock ticker.
    async fn deliver_ticks(controller: &RoundController, n: u64) {
        let mut state = controller.state.lock().await;
        for _ in 0..n {
            state.record_tick();
        }
    }

    fn idle_controller() -> RoundController {
        // An hour-long tick interval keeps the wall-clock ticker silent so
        // tests deliver ticks deterministically.
        RoundController::with_tick_interval(task(), Some("Alex Souza"), Duration::from_secs(3600))
    }

    #[tokio::test]
    async fn start_twice_is_rejected_without_touching_start_instant() {
        let controller = idle_controller();
        controller.start().await.unwrap();
        let started_at = controller.state.lock().await.started_at();

        assert!(matches!(
            controller.start().await,
            Err(RoundError::AlreadyStarted)
        ));
        assert_eq!(controller.state.lock().await.started_at(), started_at);
    }

    #[tokio::test]
    async fn ticker_advances_elapsed_and_stops_at_completion() {
        let _ = env_logger::builder().is_test(true).try_init();
        let controller =
            RoundController::with_tick_interval(task(), Some("Alex"), Duration::from_millis(5));
        controller.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        let running = controller.snapshot().await;
        assert!(running.elapsed_seconds > 0, "ticker never fired");

        let sink = RecordingSink::default();
        let log = controller.complete(&sink, true).await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        let frozen = controller.snapshot().await;
        assert_eq!(frozen.phase, RoundPhase::Completed);
        assert_eq!(frozen.elapsed_seconds, log.duration_seconds);
    }

    #[tokio::test]
    async fn unsigned_completion_needs_explicit_confirmation() {
        let controller = idle_controller();
        controller.start().await.unwrap();

        let sink = RecordingSink::default();
        assert!(matches!(
            controller.complete(&sink, false).await,
            Err(RoundError::UnsignedCompletion)
        ));
        assert_eq!(controller.snapshot().await.phase, RoundPhase::Running);
        assert_eq!(sink.saves.load(Ordering::SeqCst), 0);

        let log = controller.complete(&sink, true).await.unwrap();
        assert!(log.signature.is_none());
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn sink_rejection_keeps_session_running_and_retriable() {
        let controller = idle_controller();
        controller.start().await.unwrap();
        controller.toggle_item("i1").await.unwrap();
        controller.set_observations("east gate latch loose").await.unwrap();

        let sink = RecordingSink::failing_once();
        assert!(matches!(
            controller.complete(&sink, true).await,
            Err(RoundError::Sink(_))
        ));

        let snapshot = controller.snapshot().await;
        assert_eq!(snapshot.phase, RoundPhase::Running);
        assert!(snapshot.checklist[0].checked);
        assert_eq!(snapshot.observations, "east gate latch loose");

        let log = controller.complete(&sink, true).await.unwrap();
        assert_eq!(log.observations, "east gate latch loose");
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn completed_round_rejects_further_mutation_and_completion() {
        let controller = idle_controller();
        controller.start().await.unwrap();
        let sink = RecordingSink::default();
        controller.complete(&sink, true).await.unwrap();

        assert!(matches!(
            controller.toggle_item("i1").await,
            Err(RoundError::AlreadyCompleted)
        ));
        assert!(matches!(
            controller.complete(&sink, true).await,
            Err(RoundError::AlreadyCompleted)
        ));
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancel_discards_session_and_drops_late_photo_reads() {
        let controller = idle_controller();
        controller.start().await.unwrap();

        let state = controller.state.clone();
        let token = controller.cancel_token.clone();
        controller.cancel();

        assert!(token.is_cancelled());
        // A photo read finishing after cancellation must be discarded.
        let path = std::env::temp_dir().join(format!("rondaguard-late-{}", std::process::id()));
        std::fs::write(&path, b"late-photo").unwrap();
        read_and_attach(path.clone(), state.clone(), token).await;
        assert!(state.lock().await.photos().is_empty());
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn full_round_scenario_produces_expected_log() {
        let controller = idle_controller();
        controller.start().await.unwrap();

        controller.toggle_item("i1").await.unwrap();
        controller.toggle_item("i2").await.unwrap();
        controller.set_issues_flag(false).await.unwrap();
        sign(&controller).await;
        deliver_ticks(&controller, 42).await;

        let sink = RecordingSink::default();
        let log = controller.complete(&sink, false).await.unwrap();

        assert_eq!(log.duration_seconds, 42);
        assert!(log.issues_detected, "unchecked item must force the flag");
        assert!(log.signature.is_some());
        assert_eq!(log.checklist_state.len(), 3);
        assert!(!log.checklist_state[2].checked);
        assert_eq!(log.task_title, "Warehouse round");
        assert_eq!(log.ticket_id.as_deref(), Some("CH-1043"));
        assert_eq!(log.responsible, "Alex Souza");
        assert_eq!(sink.saves.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn attached_photo_file_appears_in_the_completed_log() {
        let controller = idle_controller();
        controller.start().await.unwrap();

        let path = std::env::temp_dir().join(format!("rondaguard-photo-{}", std::process::id()));
        std::fs::write(&path, b"camera-bytes").unwrap();
        controller.attach_photo_file(path.clone()).await.unwrap();
        controller
            .attach_photo(PhotoPayload { bytes: vec![9, 9] })
            .await
            .unwrap();

        let sink = RecordingSink::default();
        let log = controller.complete(&sink, true).await.unwrap();
        assert_eq!(log.photos.len(), 2);
        assert_eq!(log.photos[0].bytes, b"camera-bytes");
        let _ = std::fs::remove_file(path);
    }
}
