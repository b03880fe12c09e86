//! Application service: the agent's single broker container.
//!
//! `ClientService` owns the container slot behind one async mutex. `create`,
//! `start` and `clean` all take that lock, so concurrent callers are
//! serialized and can never race on the running check or interleave
//! config-file writes.
//!
//! After every successful `start` a diagnostic log capture runs in the
//! background. It is cancelled as soon as `clean` begins and its outcome is
//! observable through the returned [`LogCapture`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, oneshot, watch};

use crate::application::ports::{ContainerRuntime, HostFs, PortAllocator};
use crate::application::services::lifecycle::{self, ProvisionRequest};
use crate::domain::container::validate_create_request;
use crate::domain::error::render_chain;
use crate::domain::{
    CleanupError, ClientId, ConfigMapping, ContainerRecord, ContainerSlot, LifecycleError,
    LifecycleOp, RegistryCredentials, render_properties,
};

/// Delay between (re)starting the broker and capturing its logs.
pub const LOG_CAPTURE_DELAY: Duration = Duration::from_secs(2);

/// What `start` did to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAction {
    Started,
    Restarted,
}

/// Result of a background log capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogCaptureOutcome {
    Captured(String),
    Failed(String),
    /// Shutdown began before the capture ran.
    Cancelled,
}

/// Handle on a background log capture.
///
/// Dropping it does not cancel the capture.
#[derive(Debug)]
pub struct LogCapture {
    rx: oneshot::Receiver<LogCaptureOutcome>,
}

impl LogCapture {
    /// Wait for the capture to finish.
    pub async fn outcome(self) -> LogCaptureOutcome {
        self.rx.await.unwrap_or(LogCaptureOutcome::Cancelled)
    }
}

/// Outcome of [`ClientService::start`].
#[derive(Debug)]
pub struct StartOutcome {
    pub action: StartAction,
    pub logs: LogCapture,
}

/// Holds the single permitted broker container of this agent.
pub struct ClientService {
    client_id: ClientId,
    credentials: RegistryCredentials,
    runtime: Arc<dyn ContainerRuntime>,
    ports: Arc<dyn PortAllocator>,
    fs: Arc<dyn HostFs>,
    slot: Mutex<ContainerSlot>,
    log_delay: Duration,
    shutdown: watch::Sender<bool>,
}

impl ClientService {
    #[must_use]
    pub fn new(
        client_id: ClientId,
        credentials: RegistryCredentials,
        runtime: Arc<dyn ContainerRuntime>,
        ports: Arc<dyn PortAllocator>,
        fs: Arc<dyn HostFs>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            client_id,
            credentials,
            runtime,
            ports,
            fs,
            slot: Mutex::new(ContainerSlot::Uninitialized),
            log_delay: LOG_CAPTURE_DELAY,
            shutdown,
        }
    }

    /// Override the delay before the post-start log capture.
    #[must_use]
    pub fn with_log_delay(mut self, delay: Duration) -> Self {
        self.log_delay = delay;
        self
    }

    /// Snapshot of the current container, if one was created and not removed.
    pub async fn record(&self) -> Option<ContainerRecord> {
        self.slot.lock().await.record().ok().cloned()
    }

    /// Provision the broker container and return its host port.
    ///
    /// Succeeds at most once per process. The host directory created here is
    /// removed again if provisioning fails.
    ///
    /// # Errors
    ///
    /// `AlreadyCreated` after a previous success, `ShuttingDown` after
    /// `clean`, `InvalidRequest` for bad arguments, or `Failed` naming the
    /// step that broke.
    pub async fn create(&self, image: &str, conf_path: &str) -> Result<u16, LifecycleError> {
        let mut slot = self.slot.lock().await;
        slot.ensure_vacant()?;
        validate_create_request(image, conf_path)?;

        let host_dir = self
            .fs
            .create_private_dir()
            .map_err(LifecycleError::failed(LifecycleOp::CreateHostDir))?;
        tracing::info!(path = %host_dir.display(), "created host directory");

        let request = ProvisionRequest {
            client_id: self.client_id,
            image,
            mount_target: conf_path,
            host_dir: &host_dir,
            credentials: &self.credentials,
        };
        match lifecycle::provision(&*self.runtime, &*self.ports, request).await {
            Ok(record) => {
                let port = record.host_port;
                tracing::info!(container = %record.name, port, "container created successfully");
                *slot = ContainerSlot::Created(record);
                Ok(port)
            }
            Err(err) => {
                if let Err(rm) = self.fs.remove_dir_all(&host_dir) {
                    tracing::warn!(
                        path = %host_dir.display(),
                        error = %rm,
                        "failed to roll back host directory",
                    );
                }
                Err(err)
            }
        }
    }

    /// Write `server.properties` and start the broker, or restart it when it
    /// is already running.
    ///
    /// # Errors
    ///
    /// `NotCreated` before `create`, `ShuttingDown` after `clean`, or
    /// `Failed` for the write, inspect, start or restart step.
    pub async fn start(&self, config: &ConfigMapping) -> Result<StartOutcome, LifecycleError> {
        let slot = self.slot.lock().await;
        let record = slot.record()?;

        let path = record.properties_path();
        self.fs
            .write_file(&path, &render_properties(config))
            .map_err(LifecycleError::failed(LifecycleOp::WriteConfig))?;
        tracing::info!(path = %path.display(), entries = config.len(), "wrote config data");

        let action = if lifecycle::running(&*self.runtime, record).await? {
            lifecycle::restart(&*self.runtime, record).await?;
            StartAction::Restarted
        } else {
            lifecycle::start(&*self.runtime, record).await?;
            StartAction::Started
        };
        tracing::info!(container = %record.name, ?action, "broker container up");

        let logs = self.spawn_log_capture(record.clone());
        Ok(StartOutcome { action, logs })
    }

    /// Tear down the container and its host directory. Called once, at
    /// shutdown.
    ///
    /// Cancels pending log captures first. Failures are logged and returned,
    /// never panicked on. Without a container this is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the first `CleanupError` hit.
    pub async fn clean(&self) -> Result<(), CleanupError> {
        self.shutdown.send_replace(true);

        let Some(record) = self.slot.lock().await.retire() else {
            tracing::info!("no container to clean up");
            return Ok(());
        };

        let result = lifecycle::remove(&*self.runtime, &*self.fs, &record).await;
        match &result {
            Ok(()) => tracing::info!(container = %record.name, "container removed"),
            Err(err) => tracing::error!(
                container = %record.name,
                error = %render_chain(err),
                "failed to remove container",
            ),
        }
        result
    }

    fn spawn_log_capture(&self, record: ContainerRecord) -> LogCapture {
        let runtime = Arc::clone(&self.runtime);
        let mut cancelled = self.shutdown.subscribe();
        let delay = self.log_delay;
        let (tx, rx) = oneshot::channel();

        tokio::spawn(async move {
            // A closed channel means the service is gone: treat it as cancelled.
            let cancel = async move {
                let _ = cancelled.wait_for(|stopping| *stopping).await;
            };
            let outcome = tokio::select! {
                () = cancel => LogCaptureOutcome::Cancelled,
                () = tokio::time::sleep(delay) => capture_logs(&*runtime, &record).await,
            };
            let _ = tx.send(outcome);
        });

        LogCapture { rx }
    }
}

async fn capture_logs(runtime: &dyn ContainerRuntime, record: &ContainerRecord) -> LogCaptureOutcome {
    match lifecycle::logs(runtime, record).await {
        Ok(logs) => {
            tracing::info!(container = %record.name, "logs from container:\n{logs}");
            LogCaptureOutcome::Captured(logs)
        }
        Err(err) => {
            let reason = render_chain(&err);
            tracing::warn!(container = %record.name, error = %reason, "failed to get logs from container");
            LogCaptureOutcome::Failed(reason)
        }
    }
}
