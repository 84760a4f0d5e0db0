//! Watches the operational flags for version floors and scheduled restarts.

use semver::Version;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use corelink_bg::Work;
use corelink_client::CorechainClient;
use corelink_types::OperationalFlags;

use crate::{wait_for_height, MaintenanceConfig, MaintenanceError, ShutdownController};

/// What one poll of the operational flags asks the listener to do.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FlagDecision {
    /// The running client is below the required minimum version.
    Shutdown { minimum: Version },
    /// A restart is scheduled at a height the chain has not reached.
    ArmRestart(i64),
    /// The armed restart height has been reached or passed.
    RestartReached(i64),
    /// The previously scheduled restart was withdrawn.
    Disarm,
    Nothing,
}

pub struct ShutdownListener {
    client: CorechainClient,
    config: MaintenanceConfig,
    version: Version,
}

impl ShutdownListener {
    /// `version` is the running client's version, e.g. `env!("CARGO_PKG_VERSION")`.
    pub fn new(
        client: CorechainClient,
        config: MaintenanceConfig,
        version: &str,
    ) -> Result<Self, MaintenanceError> {
        let version = Version::parse(version).map_err(|e| MaintenanceError::Version {
            version: version.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            client,
            config,
            version,
        })
    }

    /// Decide how to react to `flags` given the chain's current height and
    /// the restart height already armed, if any.
    ///
    /// Restart heights at or below `current_height` are ignored unless they
    /// are the armed height, which then means the restart is due. A height
    /// that replaces the armed one disarms it. A minimum
    /// version that does not parse is logged and ignored.
    pub fn decide(
        &self,
        flags: &OperationalFlags,
        current_height: i64,
        armed: Option<i64>,
    ) -> FlagDecision {
        if let Some(raw) = flags.minimum_version.as_deref().filter(|v| !v.is_empty()) {
            match Version::parse(raw) {
                Ok(minimum) if self.version < minimum => {
                    return FlagDecision::Shutdown { minimum };
                }
                Ok(_) => {}
                Err(e) => warn!(minimum_version = raw, error = %e, "ignoring unparsable minimum version"),
            }
        }

        let restart = flags.restart_height;
        if restart > current_height {
            if armed == Some(restart) {
                FlagDecision::Nothing
            } else {
                FlagDecision::ArmRestart(restart)
            }
        } else if restart > 0 && armed == Some(restart) {
            FlagDecision::RestartReached(restart)
        } else if armed.is_some() {
            FlagDecision::Disarm
        } else {
            if restart > 0 && armed.is_none() {
                debug!(restart_height = restart, current_height, "ignoring past restart height");
            }
            FlagDecision::Nothing
        }
    }

    /// Start polling in the background. The controller is triggered when a
    /// shutdown is required or the listener itself stops unexpectedly.
    pub fn listen(self, token: &CancellationToken, controller: ShutdownController) {
        let on_stop = controller.clone();
        Work::new()
            .name("shutdown_listener")
            .span(info_span!("shutdown_listener"))
            .on_stop(move |err| {
                error!(error = %err, "shutdown listener stopped");
                on_stop.shutdown();
            })
            .spawn(token.clone(), move |token| self.run(token, controller));
    }

    async fn run(
        self,
        token: CancellationToken,
        controller: ShutdownController,
    ) -> Result<(), MaintenanceError> {
        let mut ticker = tokio::time::interval(self.config.poll_interval());
        let mut armed: Option<(i64, CancellationToken)> = None;

        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = controller.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let polled = async {
                let flags = self.client.operational_flags(&token).await?;
                let height = self.client.block_height(&token).await?;
                Ok::<_, MaintenanceError>((flags, height))
            }
            .await;
            let (flags, height) = match polled {
                Ok(polled) => polled,
                Err(_) if token.is_cancelled() => break,
                Err(e) => {
                    warn!(error = %e, "failed to poll operational flags");
                    continue;
                }
            };

            match self.decide(&flags, height, armed.as_ref().map(|(h, _)| *h)) {
                FlagDecision::Shutdown { minimum } => {
                    info!(
                        running = %self.version,
                        minimum = %minimum,
                        "client below minimum version, shutting down"
                    );
                    controller.shutdown();
                    break;
                }
                FlagDecision::ArmRestart(restart) => {
                    if let Some((_, previous)) = armed.take() {
                        previous.cancel();
                    }
                    info!(restart_height = restart, current_height = height, "restart scheduled");
                    let waiter = token.child_token();
                    self.spawn_restart_waiter(&waiter, restart, controller.clone());
                    armed = Some((restart, waiter));
                }
                FlagDecision::RestartReached(restart) => {
                    info!(
                        restart_height = restart,
                        current_height = height,
                        "restart height passed, shutting down"
                    );
                    controller.shutdown();
                    break;
                }
                FlagDecision::Disarm => {
                    if let Some((restart, waiter)) = armed.take() {
                        info!(restart_height = restart, "scheduled restart withdrawn");
                        waiter.cancel();
                    }
                }
                FlagDecision::Nothing => {
                    // A waiter that lost its block stream cancels its own token.
                    if let Some((restart, waiter)) = armed.as_mut() {
                        if waiter.is_cancelled() {
                            warn!(restart_height = *restart, "restart waiter stopped, re-arming");
                            let fresh = token.child_token();
                            self.spawn_restart_waiter(&fresh, *restart, controller.clone());
                            *waiter = fresh;
                        }
                    }
                }
            }
        }

        if let Some((_, waiter)) = armed {
            waiter.cancel();
        }
        Ok(())
    }

    fn spawn_restart_waiter(
        &self,
        token: &CancellationToken,
        restart: i64,
        controller: ShutdownController,
    ) {
        let client = self.client.clone();
        let stopped = token.clone();
        Work::new()
            .name("restart_height_waiter")
            .span(info_span!("restart_height_waiter", restart_height = restart))
            .on_stop(move |_| stopped.cancel())
            .spawn(token.clone(), move |token| async move {
                match wait_for_height(&client, &token, restart).await {
                    Ok(()) => {
                        info!(restart_height = restart, "restart height reached, shutting down");
                        controller.shutdown();
                        Ok(())
                    }
                    Err(_) if token.is_cancelled() => Ok(()),
                    Err(e) => Err(e),
                }
            });
    }
}
