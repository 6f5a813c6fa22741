//! Background tasks for periodic panel polling

use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::core::{FetchOutcome, NodeInfo, NodeStatus, PanelApi, UserInfo};
use crate::logger::log;

/// Background task configuration
#[derive(Debug, Clone)]
pub struct TaskConfig {
    /// Interval for refreshing node info
    pub fetch_node_interval: Duration,
    /// Interval for refreshing users
    pub fetch_users_interval: Duration,
    /// Interval for reporting node status
    pub report_status_interval: Duration,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            fetch_node_interval: Duration::from_secs(60),
            fetch_users_interval: Duration::from_secs(60),
            report_status_interval: Duration::from_secs(60),
        }
    }
}

impl TaskConfig {
    /// Create task config from durations
    pub fn new(fetch_node: Duration, fetch_users: Duration, report_status: Duration) -> Self {
        Self {
            fetch_node_interval: fetch_node,
            fetch_users_interval: fetch_users,
            report_status_interval: report_status,
        }
    }
}

/// Last applied panel state on the host side.
///
/// Only replaced by a `Modified` fetch; `NotModified` and errors leave it as is.
#[derive(Debug, Default)]
pub struct NodeState {
    node: RwLock<Option<NodeInfo>>,
    users: RwLock<Vec<UserInfo>>,
}

impl NodeState {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node(&self) -> Option<NodeInfo> {
        self.node.read().await.clone()
    }

    pub async fn users(&self) -> Vec<UserInfo> {
        self.users.read().await.clone()
    }
}

/// Background tasks manager
pub struct BackgroundTasks {
    config: TaskConfig,
    api: Arc<dyn PanelApi>,
    state: Arc<NodeState>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

/// Handle for spawned background tasks
pub struct BackgroundTasksHandle {
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl BackgroundTasksHandle {
    /// Stop all background tasks and wait for them to complete
    pub async fn shutdown(self) {
        log::info!("Stopping background tasks...");
        let _ = self.shutdown_tx.send(true);

        for (i, handle) in self.handles.into_iter().enumerate() {
            match tokio::time::timeout(Duration::from_secs(5), handle).await {
                Ok(Ok(())) => {
                    log::debug!(task = i, "Background task stopped");
                }
                Ok(Err(e)) => {
                    log::warn!(task = i, error = %e, "Background task panicked");
                }
                Err(_) => {
                    log::warn!(task = i, "Background task shutdown timeout");
                }
            }
        }
        log::info!("Background tasks stopped");
    }
}

impl BackgroundTasks {
    /// Create a new background tasks manager
    pub fn new(config: TaskConfig, api: Arc<dyn PanelApi>, state: Arc<NodeState>) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        Self {
            config,
            api,
            state,
            shutdown_tx,
            shutdown_rx,
        }
    }

    /// Start all background tasks and return a handle for shutdown
    pub fn start(self) -> BackgroundTasksHandle {
        let handles = vec![
            self.start_fetch_node_task(),
            self.start_fetch_users_task(),
            self.start_report_status_task(),
        ];

        log::info!("Background tasks started");

        BackgroundTasksHandle {
            shutdown_tx: self.shutdown_tx,
            handles,
        }
    }

    fn start_fetch_node_task(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let interval_duration = self.config.fetch_node_interval;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = interval(interval_duration);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = fetch_node_once(api.as_ref(), &state).await {
                            log::warn!(error = %e, "Fetch node info tick skipped");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        log::debug!("Fetch node info task shutting down");
                        break;
                    }
                }
            }
        })
    }

    fn start_fetch_users_task(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        let interval_duration = self.config.fetch_users_interval;
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = interval(interval_duration);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = fetch_users_once(api.as_ref(), &state).await {
                            log::warn!(error = %e, "Fetch users tick skipped");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        log::debug!("Fetch users task shutting down");
                        break;
                    }
                }
            }
        })
    }

    fn start_report_status_task(&self) -> JoinHandle<()> {
        let api = Arc::clone(&self.api);
        let interval_duration = self.config.report_status_interval;
        let mut shutdown_rx = self.shutdown_rx.clone();
        let started = Instant::now();

        tokio::spawn(async move {
            let mut interval = interval(interval_duration);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let status = NodeStatus {
                            uptime: started.elapsed().as_secs(),
                            ..NodeStatus::default()
                        };
                        if let Err(e) = api.report_node_status(&status).await {
                            log::warn!(error = %e, "Failed to report node status");
                        }
                    }
                    _ = shutdown_rx.changed() => {
                        log::debug!("Report status task shutting down");
                        break;
                    }
                }
            }
        })
    }
}

/// Fetch node info once and apply it if changed. Returns whether it changed.
pub async fn fetch_node_once(api: &dyn PanelApi, state: &NodeState) -> anyhow::Result<bool> {
    match api.fetch_node_info().await? {
        FetchOutcome::Modified(info) => {
            log::info!(port = info.port, speed_limit = info.speed_limit, "Node info applied");
            *state.node.write().await = Some(info);
            Ok(true)
        }
        FetchOutcome::NotModified => Ok(false),
    }
}

/// Fetch users once and apply the whole set if changed. Returns whether it changed.
pub async fn fetch_users_once(api: &dyn PanelApi, state: &NodeState) -> anyhow::Result<bool> {
    match api.fetch_user_list().await? {
        FetchOutcome::Modified(users) => {
            let total = users.len();
            let previous = std::mem::replace(&mut *state.users.write().await, users);
            log::info!(total = total, previous = previous.len(), "Users synchronized");
            Ok(true)
        }
        FetchOutcome::NotModified => Ok(false),
    }
}
