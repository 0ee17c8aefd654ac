//! Polling coordinator
//!
//! Owns the live entity registry and keeps it synchronized with the
//! controller: discovery populates the registry once, then every poll
//! cycle batches the union of all interest ids into a single state
//! query and fans each returned state out to every entity that listens
//! to it.

use crate::client::http_client::DplusHttpClient;
use crate::config::DplusConfig;
use crate::discovery;
use crate::entities::{build_entities, DplusEntity, Entity, IntegrationContext};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Discovery, classification and polling for one D+ server
pub struct Coordinator {
    context: IntegrationContext,
    poll_interval: Duration,
    entities: RwLock<Vec<Arc<RwLock<Entity>>>>,
    last_poll: RwLock<Option<DateTime<Utc>>>,
}

impl Coordinator {
    /// Create a coordinator with a random instance id
    pub fn new(client: Arc<DplusHttpClient>, config: &DplusConfig) -> Self {
        Self::with_context(IntegrationContext::new(client), config)
    }

    /// Create a coordinator with explicit per-instance wiring
    pub fn with_context(context: IntegrationContext, config: &DplusConfig) -> Self {
        Self {
            context,
            poll_interval: config.poll_interval,
            entities: RwLock::new(Vec::new()),
            last_poll: RwLock::new(None),
        }
    }

    /// The per-instance context shared with all entities
    pub fn context(&self) -> &IntegrationContext {
        &self.context
    }

    /// Run discovery and install the entity registry.
    ///
    /// Must complete before [`run`](Self::run) starts; the host is
    /// expected to await this before exposing any entity.
    pub async fn first_refresh(&self) -> Result<usize> {
        let devices = discovery::discover_devices(&self.context.client).await?;
        let entities = build_entities(&self.context, &devices);
        let count = entities.len();

        info!(devices = devices.len(), entities = count, "entity registry built");

        *self.entities.write().await = entities
            .into_iter()
            .map(|entity| Arc::new(RwLock::new(entity)))
            .collect();

        Ok(count)
    }

    /// Snapshot of the live entity registry
    pub async fn entities(&self) -> Vec<Arc<RwLock<Entity>>> {
        self.entities.read().await.clone()
    }

    /// Timestamp of the last successful poll cycle
    pub async fn last_poll(&self) -> Option<DateTime<Utc>> {
        *self.last_poll.read().await
    }

    /// Run one poll cycle; returns how many entities changed state.
    ///
    /// The union of all interest ids goes out as one batched query; each
    /// returned state is dispatched to every entity whose interest set
    /// contains its id. States matching no entity are ignored, and a
    /// cycle that yields zero states is not an error.
    pub async fn tick(&self) -> Result<usize> {
        let entities = self.entities.read().await.clone();

        let mut ids = BTreeSet::new();
        for entity in &entities {
            ids.extend(entity.read().await.poll_ids().iter().cloned());
        }
        if ids.is_empty() {
            return Ok(0);
        }

        let ids: Vec<String> = ids.into_iter().collect();
        let states = self.context.client.fetch_states(&ids).await?;

        let mut changed = 0;
        for state in &states {
            for entity in &entities {
                let mut guard = entity.write().await;
                if guard.poll_ids().contains(&state.id) && guard.apply_state(state) {
                    changed += 1;
                }
            }
        }

        *self.last_poll.write().await = Some(Utc::now());
        debug!(states = states.len(), changed, "poll cycle complete");
        Ok(changed)
    }

    /// Poll on a fixed interval until the token is cancelled.
    ///
    /// A failed cycle is logged and contributes no updates; entities
    /// keep their last-known values. A slow request delays the next
    /// tick's effective start rather than stacking cycles.
    pub async fn run(&self, shutdown: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval = ?self.poll_interval, "polling started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("polling stopped");
                    return;
                }
                _ = interval.tick() => {
                    if let Err(error) = self.tick().await {
                        warn!(%error, "poll cycle failed, keeping last known values");
                    }
                }
            }
        }
    }
}
