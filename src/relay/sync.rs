//! Graph sync engine: keeps live subscriptions in step with the stored graph.
//!
//! Incremental edge changes are two-phase: the store change is staged, the
//! transport is updated, then the store transaction is committed. A failed
//! commit is compensated by undoing the transport step once; if that fails
//! too the engine reports [`RelayError::CompositeRollback`] and flags itself
//! as needing a full resync.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{
    EdgeKey, ForwardHandler, Subscription, SubscriptionRegistry, Transport, TransportError,
};
use crate::channels::{self, Endpoints};
use crate::error::RelayError;
use crate::store::{Channel, PendingChange, RelayStore};

/// Outcome of a full resync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResyncReport {
    /// Subscriptions torn down.
    pub removed: usize,
    /// Subscriptions registered from the stored graph.
    pub registered: usize,
}

/// Sole owner and writer of the [`SubscriptionRegistry`].
pub struct GraphSync {
    store: Arc<dyn RelayStore>,
    transport: Arc<dyn Transport>,
    registry: SubscriptionRegistry,
    needs_resync: bool,
}

impl GraphSync {
    /// Engine with an empty registry. Call [`GraphSync::resync`] before use.
    pub fn new(store: Arc<dyn RelayStore>, transport: Arc<dyn Transport>) -> Self {
        Self {
            store,
            transport,
            registry: SubscriptionRegistry::new(),
            needs_resync: true,
        }
    }

    /// The live subscriptions.
    pub fn registry(&self) -> &SubscriptionRegistry {
        &self.registry
    }

    /// Whether the registry may disagree with the stored graph.
    pub fn needs_resync(&self) -> bool {
        self.needs_resync
    }

    fn subscription(&self, input: &Channel, output: &Channel) -> Subscription {
        Subscription {
            key: EdgeKey::new(input.id.clone(), output.id.clone()),
            source_url: input.url.clone(),
            output_url: output.url.clone(),
            handler: Arc::new(ForwardHandler::new(
                output.url.clone(),
                Arc::clone(&self.store),
            )),
        }
    }

    /// Tear down every subscription and rebuild one per stored edge.
    ///
    /// Stops at the first failure. The registry only ever holds keys the
    /// transport accepted, so running resync again after a failure resumes
    /// from a consistent state.
    pub async fn resync(&mut self) -> Result<ResyncReport, RelayError> {
        self.needs_resync = true;
        let mut report = ResyncReport::default();

        for key in self.registry.keys() {
            let Some(subscription) = self.registry.get(&key).cloned() else {
                continue;
            };
            match self.transport.unsubscribe(&subscription).await {
                Ok(()) | Err(TransportError::NotSubscribed { .. }) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "resync: unsubscribe failed");
                    return Err(e.into());
                }
            }
            self.registry.remove(&key);
            report.removed += 1;
        }

        let graph = self.store.load_graph().await?;
        for (input, output) in graph.edges() {
            let subscription = self.subscription(input, output);
            if self.registry.contains(&subscription.key) {
                continue;
            }
            if let Err(e) = self.transport.subscribe(&subscription).await {
                warn!(key = %subscription.key, error = %e, "resync: subscribe failed");
                return Err(e.into());
            }
            debug!(input = %input.name, output = %output.name, "subscription registered");
            self.registry.insert(subscription);
            report.registered += 1;
        }

        self.needs_resync = false;
        info!(
            removed = report.removed,
            registered = report.registered,
            "full resync complete"
        );
        Ok(report)
    }

    /// Connect two channels and register the live subscription.
    pub async fn connect(&mut self, input: &str, output: &str) -> Result<Endpoints, RelayError> {
        let (ends, pending) = channels::stage_connect(self.store.as_ref(), input, output).await?;
        let subscription = self.subscription(&ends.input, &ends.output);

        if let Err(e) = self.transport.subscribe(&subscription).await {
            warn!(key = %subscription.key, error = %e, "subscribe failed, discarding edge");
            discard(pending, &subscription.key).await;
            return Err(e.into());
        }
        self.registry.insert(subscription.clone());

        if let Err(e) = pending.commit().await {
            let cause = RelayError::from(e);
            warn!(key = %subscription.key, error = %cause, "commit failed, unsubscribing");
            let undo = self.transport.unsubscribe(&subscription).await;
            return Err(match undo {
                Ok(()) => {
                    self.registry.remove(&subscription.key);
                    cause
                }
                Err(compensation) => self.escalate(subscription.key, cause, compensation.into()),
            });
        }

        info!(input = %ends.input.name, output = %ends.output.name, "channels connected");
        Ok(ends)
    }

    /// Disconnect two channels and drop the live subscription.
    pub async fn disconnect(&mut self, input: &str, output: &str) -> Result<Endpoints, RelayError> {
        let (ends, pending) =
            channels::stage_disconnect(self.store.as_ref(), input, output).await?;
        let key = EdgeKey::new(ends.input.id.clone(), ends.output.id.clone());

        let Some(subscription) = self.registry.get(&key).cloned() else {
            discard(pending, &key).await;
            self.needs_resync = true;
            warn!(key = %key, "stored edge has no live subscription");
            return Err(RelayError::ConnectionsNotSynchronized { key });
        };

        if let Err(e) = self.transport.unsubscribe(&subscription).await {
            warn!(key = %key, error = %e, "unsubscribe failed, keeping edge");
            discard(pending, &key).await;
            return Err(e.into());
        }
        self.registry.remove(&key);

        if let Err(e) = pending.commit().await {
            let cause = RelayError::from(e);
            warn!(key = %key, error = %cause, "commit failed, resubscribing");
            let undo = self.transport.subscribe(&subscription).await;
            return Err(match undo {
                Ok(()) => {
                    self.registry.insert(subscription);
                    cause
                }
                Err(compensation) => self.escalate(key, cause, compensation.into()),
            });
        }

        info!(input = %ends.input.name, output = %ends.output.name, "channels disconnected");
        Ok(ends)
    }

    /// Delete a channel with its edges, then rebuild all subscriptions.
    pub async fn remove_channel(&mut self, raw: &str) -> Result<(Channel, ResyncReport), RelayError> {
        let channel = channels::remove_channel(self.store.as_ref(), raw).await?;
        self.needs_resync = true;
        let report = self.resync().await?;
        Ok((channel, report))
    }

    fn escalate(&mut self, key: EdgeKey, cause: RelayError, compensation: RelayError) -> RelayError {
        self.needs_resync = true;
        error!(
            key = %key,
            cause = %cause,
            compensation = %compensation,
            "compensation failed, store and live subscriptions disagree; full resync required"
        );
        RelayError::CompositeRollback {
            key,
            cause: Box::new(cause),
            compensation: Box::new(compensation),
        }
    }
}

async fn discard(pending: Box<dyn PendingChange>, key: &EdgeKey) {
    if let Err(e) = pending.rollback().await {
        warn!(key = %key, error = %e, "store rollback failed");
    }
}
