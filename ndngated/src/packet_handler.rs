use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, info, warn};
use tokio::sync::{mpsc, RwLock};

use ndngate_core::PacketAttrs;
use ndngate_engine::{
    DeferredQueue, DispatchOutcome, DispatchStats, Dispatcher, FibTable, InterestForwarder,
    InterestReturnSender, ReturnReason, RuleEngine,
};

const DEFERRED_QUEUE_DEPTH: usize = 1024;

/// Wire-side forwarder stub. The daemon runs without an attached transport;
/// a real deployment replaces this with the face layer.
struct LoggingForwarder;

#[async_trait]
impl InterestForwarder for LoggingForwarder {
    async fn forward(
        &self,
        attrs: &PacketAttrs,
        face_ids: &[u32],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!("Forwarding Interest {} to faces {:?}", attrs.name, face_ids);
        Ok(())
    }
}

struct LoggingReturnSender;

#[async_trait]
impl InterestReturnSender for LoggingReturnSender {
    async fn send_return(
        &self,
        attrs: &PacketAttrs,
        reason: ReturnReason,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        info!(
            "Interest Return ({:?}) for {} toward face {}",
            reason, attrs.name, attrs.incoming_face
        );
        Ok(())
    }
}

/// Bounded hand-off channel backing the Queue action.
struct DeferredInbox {
    tx: mpsc::Sender<PacketAttrs>,
}

#[async_trait]
impl DeferredQueue for DeferredInbox {
    async fn enqueue(
        &self,
        attrs: PacketAttrs,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.tx.send(attrs).await?;
        Ok(())
    }
}

/// Per-packet front end of the daemon: owns the dispatcher and the
/// deferred-processing channel it feeds.
pub struct PacketHandler {
    dispatcher: Dispatcher,
}

impl PacketHandler {
    /// Build a handler around the shared table and, optionally, the rule
    /// engine. The returned receiver carries queued packets; the daemon
    /// drains it with [`drain_deferred`].
    pub fn new(
        fib: Arc<RwLock<FibTable>>,
        engine: Option<Arc<RwLock<RuleEngine>>>,
    ) -> (Self, mpsc::Receiver<PacketAttrs>) {
        let (tx, rx) = mpsc::channel(DEFERRED_QUEUE_DEPTH);
        let mut dispatcher = Dispatcher::new(
            fib,
            Arc::new(LoggingForwarder),
            Arc::new(LoggingReturnSender),
            Arc::new(DeferredInbox { tx }),
        );
        if let Some(engine) = engine {
            dispatcher = dispatcher.with_engine(engine);
        }
        (Self { dispatcher }, rx)
    }

    pub async fn handle(
        &self,
        attrs: PacketAttrs,
    ) -> Result<DispatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let outcome = self.dispatcher.dispatch(attrs).await?;
        debug!("Dispatch outcome: {:?}", outcome);
        Ok(outcome)
    }

    pub async fn stats(&self) -> DispatchStats {
        self.dispatcher.get_stats().await
    }
}

/// Drain loop for Queue-action packets. Runs until the handler side goes
/// away. Deferred packets are logged and discarded here; slotting in an
/// actual delay queue is a transport concern.
pub async fn drain_deferred(mut rx: mpsc::Receiver<PacketAttrs>) {
    while let Some(attrs) = rx.recv().await {
        warn!(
            "Deferred Interest {} from face {} discarded (no deferred processor attached)",
            attrs.name, attrs.incoming_face
        );
    }
    debug!("Deferred queue closed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndngate_core::{Name, RuleAction};
    use ndngate_engine::PacketControlRule;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    #[tokio::test]
    async fn test_forward_through_shared_fib() {
        let mut table = FibTable::new();
        table.insert(name("/video"), 0, 0);
        table.add_face(&name("/video"), 3, 0).unwrap();
        let fib = Arc::new(RwLock::new(table));

        let (handler, _rx) = PacketHandler::new(fib, None);
        let outcome = handler
            .handle(PacketAttrs::new(name("/video/seg1"), 1))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Forwarded { faces: vec![3] });
        assert_eq!(handler.stats().await.forwarded, 1);
    }

    #[tokio::test]
    async fn test_queue_action_lands_in_inbox() {
        let engine = Arc::new(RwLock::new(RuleEngine::new(RuleAction::Forward)));
        engine
            .write()
            .await
            .add_rule(PacketControlRule::new(RuleAction::Queue, 10))
            .unwrap();

        let fib = Arc::new(RwLock::new(FibTable::new()));
        let (handler, mut rx) = PacketHandler::new(fib, Some(engine));

        let outcome = handler
            .handle(PacketAttrs::new(name("/q"), 2))
            .await
            .unwrap();
        assert_eq!(outcome, DispatchOutcome::Queued);

        let queued = rx.recv().await.unwrap();
        assert_eq!(queued.name, name("/q"));
        assert_eq!(queued.incoming_face, 2);
    }
}
