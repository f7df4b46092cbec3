use std::sync::Arc;

use async_trait::async_trait;
use chrono::Local;
use log::{debug, warn};
use tokio::sync::RwLock;

use ndngate_core::{Clock, PacketAttrs, RuleAction};

use crate::fib::FibTable;
use crate::rules::RuleEngine;

/// Why an Interest Return is being sent. This layer only ever emits
/// `NoRoute`; the variant exists so the sender collaborator can carry the
/// reason onto the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnReason {
    NoRoute,
}

/// Transmission collaborator: actually puts the Interest on the wire.
#[async_trait]
pub trait InterestForwarder: Send + Sync {
    async fn forward(
        &self,
        attrs: &PacketAttrs,
        face_ids: &[u32],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// NACK collaborator: sends an Interest Return toward the requester.
#[async_trait]
pub trait InterestReturnSender: Send + Sync {
    async fn send_return(
        &self,
        attrs: &PacketAttrs,
        reason: ReturnReason,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Deferred-processing collaborator for the Queue action.
#[async_trait]
pub trait DeferredQueue: Send + Sync {
    async fn enqueue(
        &self,
        attrs: PacketAttrs,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// What became of one dispatched Interest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Forwarded { faces: Vec<u32> },
    Dropped,
    Returned,
    Queued,
    NoRoute,
}

/// Dispatch counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub forwarded: u64,
    pub dropped: u64,
    pub returned: u64,
    pub queued: u64,
    pub no_route: u64,
}

/// Per-packet entry point composing classification and FIB liveness.
///
/// Classification decides the action; Forward continues into active-only
/// FIB lookup and face selection. A FIB hit with no active faces is
/// treated identically to no FIB hit: both surface as a NoRoute Interest
/// Return, never an error.
pub struct Dispatcher {
    engine: Option<Arc<RwLock<RuleEngine>>>,
    fib: Arc<RwLock<FibTable>>,
    clock: Clock,
    forwarder: Arc<dyn InterestForwarder>,
    return_sender: Arc<dyn InterestReturnSender>,
    deferred: Arc<dyn DeferredQueue>,
    stats: Arc<RwLock<DispatchStats>>,
}

impl Dispatcher {
    pub fn new(
        fib: Arc<RwLock<FibTable>>,
        forwarder: Arc<dyn InterestForwarder>,
        return_sender: Arc<dyn InterestReturnSender>,
        deferred: Arc<dyn DeferredQueue>,
    ) -> Self {
        Self {
            engine: None,
            fib,
            clock: Clock::new(),
            forwarder,
            return_sender,
            deferred,
            stats: Arc::new(RwLock::new(DispatchStats::default())),
        }
    }

    pub fn with_engine(mut self, engine: Arc<RwLock<RuleEngine>>) -> Self {
        self.engine = Some(engine);
        self
    }

    pub async fn get_stats(&self) -> DispatchStats {
        *self.stats.read().await
    }

    /// Classify and dispatch one Interest.
    pub async fn dispatch(
        &self,
        attrs: PacketAttrs,
    ) -> Result<DispatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        // With no engine configured the decision degrades to Forward and
        // no rule counters move.
        let action = match &self.engine {
            Some(engine) => engine.write().await.evaluate(&attrs, Local::now()),
            None => RuleAction::Forward,
        };

        match action {
            RuleAction::Drop => {
                debug!("Interest {} dropped by packet control", attrs.name);
                self.stats.write().await.dropped += 1;
                Ok(DispatchOutcome::Dropped)
            }
            RuleAction::Return => {
                debug!("Interest {} returned by packet control", attrs.name);
                self.return_sender
                    .send_return(&attrs, ReturnReason::NoRoute)
                    .await?;
                self.stats.write().await.returned += 1;
                Ok(DispatchOutcome::Returned)
            }
            RuleAction::Queue => {
                debug!("Interest {} queued for deferred processing", attrs.name);
                self.deferred.enqueue(attrs).await?;
                self.stats.write().await.queued += 1;
                Ok(DispatchOutcome::Queued)
            }
            RuleAction::Forward => self.forward(attrs).await,
        }
    }

    async fn forward(
        &self,
        attrs: PacketAttrs,
    ) -> Result<DispatchOutcome, Box<dyn std::error::Error + Send + Sync>> {
        let now = self.clock.now_us();
        let face_ids = {
            let mut fib = self.fib.write().await;
            match fib.search_active(&attrs.name, now) {
                Some(entry) => entry.active_face_ids(now),
                None => Vec::new(),
            }
        };

        if face_ids.is_empty() {
            warn!("No active route for Interest {}", attrs.name);
            self.return_sender
                .send_return(&attrs, ReturnReason::NoRoute)
                .await?;
            self.stats.write().await.no_route += 1;
            return Ok(DispatchOutcome::NoRoute);
        }

        debug!(
            "Forwarding Interest {} to {} active faces",
            attrs.name,
            face_ids.len()
        );
        self.forwarder.forward(&attrs, &face_ids).await?;
        self.stats.write().await.forwarded += 1;
        Ok(DispatchOutcome::Forwarded { faces: face_ids })
    }
}
