//! Restarts the observer when the TSS key rotates.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn};

use corelink_bg::Work;
use corelink_client::CorechainClient;
use corelink_types::KeygenStatus;

use crate::{wait_for_height, MaintenanceConfig, MaintenanceError, ShutdownController};

pub struct TssListener {
    client: CorechainClient,
    config: MaintenanceConfig,
}

impl TssListener {
    pub fn new(client: CorechainClient, config: MaintenanceConfig) -> Self {
        Self { client, config }
    }

    /// Record the current TSS pubkey, then poll for a new one or a pending
    /// keygen. Either triggers the controller.
    pub fn listen(self, token: &CancellationToken, controller: ShutdownController) {
        let on_stop = controller.clone();
        Work::new()
            .name("tss_listener")
            .span(info_span!("tss_listener"))
            .on_stop(move |err| {
                error!(error = %err, "tss listener stopped");
                on_stop.shutdown();
            })
            .spawn(token.clone(), move |token| self.run(token, controller));
    }

    async fn run(
        self,
        token: CancellationToken,
        controller: ShutdownController,
    ) -> Result<(), MaintenanceError> {
        let initial = match self.client.tss(&token).await {
            Ok(tss) => tss,
            Err(_) if token.is_cancelled() => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        info!(pubkey = %initial.pubkey, "watching tss pubkey");

        let mut ticker = tokio::time::interval(self.config.poll_interval());
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = controller.cancelled() => return Ok(()),
                _ = ticker.tick() => {}
            }

            match self.client.tss(&token).await {
                Ok(tss) if tss.pubkey != initial.pubkey => {
                    info!(old = %initial.pubkey, new = %tss.pubkey, "tss pubkey changed, shutting down");
                    controller.shutdown();
                    return Ok(());
                }
                Ok(_) => {}
                Err(_) if token.is_cancelled() => return Ok(()),
                Err(e) => warn!(error = %e, "failed to query tss"),
            }

            let keygen = match self.client.keygen(&token).await {
                Ok(keygen) => keygen,
                Err(_) if token.is_cancelled() => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "failed to query keygen");
                    continue;
                }
            };
            if keygen.status != KeygenStatus::Pending {
                continue;
            }
            let height = match self.client.block_height(&token).await {
                Ok(height) => height,
                Err(_) if token.is_cancelled() => return Ok(()),
                Err(e) => {
                    warn!(error = %e, "failed to query block height");
                    continue;
                }
            };
            if keygen.block_number <= height {
                continue;
            }

            info!(keygen_height = keygen.block_number, current_height = height, "keygen pending");
            tokio::select! {
                _ = controller.cancelled() => return Ok(()),
                res = wait_for_height(&self.client, &token, keygen.block_number) => match res {
                    Ok(()) => {
                        info!(keygen_height = keygen.block_number, "keygen height reached, shutting down");
                        controller.shutdown();
                        return Ok(());
                    }
                    Err(_) if token.is_cancelled() => return Ok(()),
                    Err(e) => return Err(e),
                },
            }
        }
    }
}
