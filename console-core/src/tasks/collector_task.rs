//! Background agent requests and the collector status poller
//!
//! Tasks never touch `AppState`. Each one reports a `TaskResult` tagged with
//! the lifecycle generation it was issued under.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{self as tokio_time, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, info, info_span, instrument, warn};

use crate::api::client::CollectorApi;
use crate::controller::event_loop::TaskResult;
use crate::model::agent::AgentMode;
use crate::model::lifecycle::{Credentials, Generation};

/// POST /collector
pub fn spawn_connect(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
    credentials: Credentials,
) -> JoinHandle<()> {
    let span = info_span!("collector_connect", %generation, url = %credentials.url);

    tokio::spawn(
        async move {
            let start_time = Instant::now();
            let result = api.start_collector(&credentials).await.map_err(Arc::new);

            match &result {
                Ok(report) => info!(
                    marker = "COLLECTOR_TASK",
                    operation_type = "collector_start",
                    status = %report.status,
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Collector start accepted"
                ),
                Err(e) => warn!(
                    marker = "COLLECTOR_TASK",
                    operation_type = "collector_start",
                    error = %e,
                    "Collector start failed"
                ),
            }

            let _ = task_tx.send(TaskResult::CollectorStarted { generation, result });
        }
        .instrument(span),
    )
}

/// DELETE /collector, best effort
pub fn spawn_disconnect(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let result = api.stop_collector().await.map_err(Arc::new);
            if let Err(e) = &result {
                warn!(
                    marker = "COLLECTOR_TASK",
                    operation_type = "collector_stop",
                    error = %e,
                    "Collector stop failed"
                );
            }
            let _ = task_tx.send(TaskResult::CollectorStopped { generation, result });
        }
        .instrument(info_span!("collector_disconnect", %generation)),
    )
}

/// One-shot GET /collector used to attach to an existing session
pub fn spawn_status_sync(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let result = api.collector_status().await.map_err(Arc::new);
            debug!(
                marker = "COLLECTOR_TASK",
                operation_type = "status_sync",
                ok = result.is_ok(),
                "Collector status synced"
            );
            let _ = task_tx.send(TaskResult::StatusSynced { generation, result });
        }
        .instrument(info_span!("collector_status_sync", %generation)),
    )
}

/// GET /inventory
pub fn spawn_inventory_fetch(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let start_time = Instant::now();
            let result = api.inventory().await.map_err(Arc::new);

            match &result {
                Ok(records) => info!(
                    marker = "COLLECTOR_TASK",
                    operation_type = "inventory_fetch",
                    records = records.len(),
                    elapsed_ms = start_time.elapsed().as_millis(),
                    "Inventory fetched"
                ),
                Err(e) => warn!(
                    marker = "COLLECTOR_TASK",
                    operation_type = "inventory_fetch",
                    error = %e,
                    "Inventory fetch failed"
                ),
            }

            let _ = task_tx.send(TaskResult::InventoryLoaded { generation, result });
        }
        .instrument(info_span!("inventory_fetch", %generation)),
    )
}

/// GET /agent, or POST /agent/mode when `mode` is set
pub fn spawn_agent_request(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    mode: Option<AgentMode>,
) -> JoinHandle<()> {
    tokio::spawn(
        async move {
            let result = match mode {
                Some(mode) => api.set_agent_mode(mode).await,
                None => api.agent_status().await,
            }
            .map_err(Arc::new);
            let _ = task_tx.send(TaskResult::AgentStatus { result });
        }
        .instrument(info_span!("agent_request", mode = ?mode)),
    )
}

/// Poll GET /collector every `interval` until `token` is cancelled or the
/// controller stops listening.
pub fn spawn_status_poller(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
    interval: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(poll_collector_status(
        api, task_tx, generation, interval, token,
    ))
}

#[instrument(level = "info", skip(api, task_tx, token), fields(%generation))]
async fn poll_collector_status(
    api: Arc<dyn CollectorApi>,
    task_tx: UnboundedSender<TaskResult>,
    generation: Generation,
    interval: Duration,
    token: CancellationToken,
) {
    // First poll one interval out; the caller already holds a fresh status.
    let mut ticker = tokio_time::interval_at(tokio_time::Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut polls: u64 = 0;

    loop {
        tokio::select! {
            biased;
            () = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            biased;
            () = token.cancelled() => break,
            result = api.collector_status() => result.map_err(Arc::new),
        };
        polls += 1;

        if task_tx
            .send(TaskResult::StatusPolled { generation, result })
            .is_err()
        {
            break;
        }
    }

    debug!(
        marker = "COLLECTOR_TASK",
        operation_type = "status_poll",
        polls,
        "Status poller stopped"
    );
}

#[cfg(test)]
pub(crate) mod fake {
    //! In-memory `CollectorApi` for controller and task tests.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::AppError;
    use crate::api::client::CollectorApi;
    use crate::model::agent::{AgentMode, AgentStatus, ConsoleConnection};
    use crate::model::lifecycle::{CollectorStatus, Credentials, StatusReport};
    use crate::model::vm::VmRecord;

    #[derive(Debug, Default)]
    pub struct FakeApi {
        /// Status replies, popped per request; the last one repeats.
        pub statuses: Mutex<VecDeque<StatusReport>>,
        pub inventory: Mutex<Option<Vec<VmRecord>>>,
        pub fail_start: Mutex<Option<String>>,
        pub fail_stop: Mutex<Option<String>>,
        pub started_with: Mutex<Vec<Credentials>>,
        pub stop_calls: Mutex<u32>,
        pub status_calls: Mutex<u32>,
    }

    impl FakeApi {
        pub fn with_statuses(statuses: impl IntoIterator<Item = CollectorStatus>) -> Self {
            let fake = Self::default();
            if let Ok(mut queue) = fake.statuses.lock() {
                queue.extend(statuses.into_iter().map(StatusReport::new));
            }
            fake
        }

        fn next_status(&self) -> Result<StatusReport, AppError> {
            *self.status_calls.lock().unwrap() += 1;
            let mut queue = self.statuses.lock().unwrap();
            let report = if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            };
            report.ok_or_else(|| AppError::Network("connection refused".into()))
        }
    }

    #[async_trait]
    impl CollectorApi for FakeApi {
        async fn collector_status(&self) -> Result<StatusReport, AppError> {
            self.next_status()
        }

        async fn start_collector(
            &self,
            credentials: &Credentials,
        ) -> Result<StatusReport, AppError> {
            self.started_with.lock().unwrap().push(credentials.clone());
            if let Some(message) = self.fail_start.lock().unwrap().clone() {
                return Err(AppError::api(400, message));
            }
            Ok(StatusReport::new(CollectorStatus::Connecting))
        }

        async fn stop_collector(&self) -> Result<Option<StatusReport>, AppError> {
            *self.stop_calls.lock().unwrap() += 1;
            if let Some(message) = self.fail_stop.lock().unwrap().clone() {
                return Err(AppError::Network(message));
            }
            Ok(None)
        }

        async fn inventory(&self) -> Result<Vec<VmRecord>, AppError> {
            self.inventory
                .lock()
                .unwrap()
                .clone()
                .ok_or_else(|| AppError::api(404, "no inventory"))
        }

        async fn agent_status(&self) -> Result<AgentStatus, AppError> {
            Ok(AgentStatus {
                mode: AgentMode::Disconnected,
                console_connection: ConsoleConnection::Disconnected,
            })
        }

        async fn set_agent_mode(&self, mode: AgentMode) -> Result<AgentStatus, AppError> {
            let console_connection = match mode {
                AgentMode::Connected => ConsoleConnection::Connected,
                AgentMode::Disconnected => ConsoleConnection::Disconnected,
            };
            Ok(AgentStatus {
                mode,
                console_connection,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fake::FakeApi;
    use super::*;
    use crate::model::lifecycle::CollectorStatus;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn poller_reports_with_its_generation_until_cancelled() {
        let api: Arc<dyn CollectorApi> = Arc::new(FakeApi::with_statuses([
            CollectorStatus::Connected,
            CollectorStatus::Collecting,
        ]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let generation = Generation::default().next();

        let handle = spawn_status_poller(
            api,
            tx,
            generation,
            Duration::from_millis(5),
            token.clone(),
        );

        for expected in [CollectorStatus::Connected, CollectorStatus::Collecting] {
            match rx.recv().await {
                Some(TaskResult::StatusPolled {
                    generation: g,
                    result: Ok(report),
                }) => {
                    assert_eq!(g, generation);
                    assert_eq!(report.status, expected);
                }
                other => panic!("unexpected task result {other:?}"),
            }
        }

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn poller_waits_one_interval_before_first_poll() {
        let fake = Arc::new(FakeApi::with_statuses([CollectorStatus::Collected]));
        let api: Arc<dyn CollectorApi> = fake.clone();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();

        let handle = spawn_status_poller(
            api,
            tx,
            Generation::default().next(),
            Duration::from_secs(10),
            token.clone(),
        );

        let early = tokio::time::timeout(Duration::from_millis(50), rx.recv()).await;
        assert!(early.is_err(), "poll fired before its interval: {early:?}");
        assert_eq!(*fake.status_calls.lock().unwrap(), 0);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn poller_stops_when_receiver_is_gone() {
        let api: Arc<dyn CollectorApi> =
            Arc::new(FakeApi::with_statuses([CollectorStatus::Collecting]));
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);

        let handle = spawn_status_poller(
            api,
            tx,
            Generation::default(),
            Duration::from_millis(1),
            CancellationToken::new(),
        );
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn inventory_fetch_failure_is_reported() {
        let api: Arc<dyn CollectorApi> = Arc::new(FakeApi::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_inventory_fetch(api, tx, Generation::default())
            .await
            .unwrap();

        match rx.recv().await {
            Some(TaskResult::InventoryLoaded { result: Err(e), .. }) => {
                assert_eq!(e.user_message(), "no inventory");
            }
            other => panic!("unexpected task result {other:?}"),
        }
    }
}
