use tokio_util::sync::CancellationToken;
use tracing::debug;

use corelink_client::CorechainClient;
use corelink_retry::ContextError;

use crate::MaintenanceError;

/// Resolves once the corechain reaches `height`.
///
/// Subscribes before reading the current height so a block produced between
/// the two is not missed.
pub async fn wait_for_height(
    client: &CorechainClient,
    token: &CancellationToken,
    height: i64,
) -> Result<(), MaintenanceError> {
    let mut blocks = client.new_block_subscriber(token).await?;
    let current = client.block_height(token).await?;
    if current >= height {
        return Ok(());
    }
    debug!(current, target = height, "waiting for height");

    loop {
        let event = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(ContextError::Canceled.into()),
            event = blocks.recv() => event,
        };
        match event {
            Some(block) if block.height >= height => return Ok(()),
            Some(_) => {}
            None if token.is_cancelled() => return Err(ContextError::Canceled.into()),
            None => return Err(MaintenanceError::StreamClosed(height)),
        }
    }
}
