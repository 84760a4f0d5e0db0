use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span};

use corelink_bg::Work;
use corelink_fanout::FanOut;
use corelink_types::NewBlockEvent;

use crate::{ClientError, CorechainClient};

impl CorechainClient {
    /// A fresh stream of new-block events.
    ///
    /// All subscribers share one upstream subscription, opened on first use
    /// and reopened by the next call after it drops. The stream ends when
    /// `token` is cancelled, the client shuts down, or the upstream
    /// subscription drops.
    pub async fn new_block_subscriber(
        &self,
        token: &CancellationToken,
    ) -> Result<mpsc::Receiver<NewBlockEvent>, ClientError> {
        let buffer = self.inner.config.block_subscriber_buffer;
        let (mut source, detach) = {
            let mut blocks = self.inner.blocks.lock().await;
            if blocks.as_ref().is_some_and(|fan| fan.is_finished()) {
                debug!("upstream block subscription ended, resubscribing");
                *blocks = None;
            }
            match blocks.as_ref() {
                Some(fan) => fan.add(),
                None => {
                    let upstream = self.inner.rpc.subscribe_new_blocks().await?;
                    let fan = FanOut::new(upstream, buffer);
                    let consumer = fan.add();
                    fan.start();
                    *blocks = Some(fan);
                    consumer
                }
            }
        };

        let (tx, rx) = mpsc::channel(buffer);
        let root = self.inner.root.clone();
        Work::new()
            .name("block_subscriber")
            .span(info_span!("block_subscriber"))
            .spawn(token.clone(), move |token| async move {
                loop {
                    let event = tokio::select! {
                        _ = token.cancelled() => break,
                        _ = root.cancelled() => break,
                        event = source.recv() => event,
                    };
                    let Some(event) = event else {
                        debug!("new block stream ended");
                        break;
                    };
                    tokio::select! {
                        _ = token.cancelled() => break,
                        _ = root.cancelled() => break,
                        sent = tx.send(event) => {
                            if sent.is_err() {
                                break;
                            }
                        }
                    }
                }
                detach.close().await;
                Ok::<(), ClientError>(())
            });
        Ok(rx)
    }
}
