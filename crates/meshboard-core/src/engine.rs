// ── Dashboard engine ──
//
// Owns the session-scoped services: the store, the scheduler worker,
// and the optional background poller. There are no globals; everything
// a view needs is reached through an `Engine` handed to it at
// construction.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use meshboard_api::{ApiClient, TlsMode, TransportConfig};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::batch::{BatchRequest, BatchTicket};
use crate::config::{ControllerConfig, TlsVerification};
use crate::error::CoreError;
use crate::scheduler::{Scheduler, SchedulerOptions};
use crate::store::Store;
use crate::target::Target;
use crate::transport::Transport;

/// Session-scoped service container.
///
/// Construct once per controller connection, pass by reference to
/// whatever consumes it, and call [`shutdown`](Self::shutdown) when the
/// session ends.
pub struct Engine {
    store: Arc<Store>,
    scheduler: Scheduler,
    cancel: CancellationToken,
    site: String,
    poll_interval: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Connect to the controller described by `config`.
    ///
    /// Must be called from within a Tokio runtime: this spawns the
    /// scheduler worker. No request is issued until something is
    /// scheduled.
    pub fn new(config: &ControllerConfig) -> Result<Self, CoreError> {
        let tls = match &config.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        let transport = TransportConfig {
            tls,
            timeout: config.timeout,
        };
        let client = ApiClient::from_api_key(config.url.as_str(), &config.api_key, &transport)?;

        Ok(Self::with_transport(
            Arc::new(client),
            config.site.clone(),
            SchedulerOptions {
                request_timeout: config.request_timeout,
            },
            Duration::from_secs(config.poll_interval_secs),
        ))
    }

    /// Assemble an engine over an arbitrary transport.
    ///
    /// This is the seam integration tests use to run the full pipeline
    /// without a controller.
    pub fn with_transport<T>(
        transport: Arc<T>,
        site: impl Into<String>,
        options: SchedulerOptions,
        poll_interval: Duration,
    ) -> Self
    where
        T: Transport + 'static,
    {
        let store = Arc::new(Store::new());
        let cancel = CancellationToken::new();
        let (scheduler, worker) = Scheduler::spawn(
            transport,
            Arc::clone(&store),
            options,
            cancel.child_token(),
        );

        Self {
            store,
            scheduler,
            cancel,
            site: site.into(),
            poll_interval,
            tasks: Mutex::new(vec![worker]),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    // ── Refresh ──────────────────────────────────────────────────────

    /// Schedule a read of every fetchable target, scoped to this
    /// engine's site.
    pub fn refresh_all(&self) -> Result<BatchTicket, CoreError> {
        self.refresh(Target::fetchable().collect())
    }

    /// Schedule a read of `targets`, scoped to this engine's site.
    pub fn refresh(&self, targets: Vec<Target>) -> Result<BatchTicket, CoreError> {
        self.scheduler
            .schedule(BatchRequest::read(targets).with_scope(&self.site))
    }

    // ── Background polling ───────────────────────────────────────────

    /// Start the periodic full refresh, if the configured interval is
    /// non-zero. Failures are logged and the poller keeps going; it
    /// stops on shutdown.
    pub fn spawn_poller(&self) {
        if self.poll_interval.is_zero() {
            return;
        }

        let scheduler = self.scheduler.clone();
        let site = self.site.clone();
        let cancel = self.cancel.child_token();
        let period = self.poll_interval;

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval.tick().await; // consume the immediate first tick

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let request =
                            BatchRequest::read(Target::fetchable().collect()).with_scope(&site);
                        let ticket = match scheduler.schedule(request) {
                            Ok(ticket) => ticket,
                            Err(CoreError::SchedulerClosed) => break,
                            Err(e) => {
                                warn!(error = %e, "background refresh rejected");
                                continue;
                            }
                        };
                        match ticket.settled().await {
                            Ok(results) => {
                                for (target, error) in results.failures() {
                                    warn!(entity = %target, error = %error, "background refresh failed");
                                }
                            }
                            Err(_) => break,
                        }
                    }
                }
            }
            debug!("background poller stopped");
        });

        if let Ok(mut tasks) = self.tasks.lock() {
            tasks.push(handle);
        }
    }

    // ── Shutdown ─────────────────────────────────────────────────────

    /// Stop the worker and poller and wait for them to exit. Queued
    /// batches that never ran resolve their tickets with
    /// [`CoreError::SchedulerClosed`]. Idempotent.
    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let handles: Vec<JoinHandle<()>> = match self.tasks.lock() {
            Ok(mut tasks) => tasks.drain(..).collect(),
            Err(_) => Vec::new(),
        };
        for handle in handles {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!(error = %e, "engine task ended abnormally");
                }
            }
        }
    }
}
