//! Composition root wiring the arena simulation to a policy server.
//!
//! ```text
//! Bridge
//!   ├─→ ArenaSimulation (engine stand-in, records events from its own threads)
//!   ├─→ EventAccumulator (shared by the arena and every scheduler)
//!   └─→ Transport (fresh connection per episode)
//! ```
//!
//! Episodes run back to back. Each gets a new transport and a new
//! [`TurnScheduler`]; the arena moves on to its next round in between.
pub mod arena;
pub mod config;
pub mod logging;

pub use arena::{ArenaConfig, ArenaSimulation};
pub use config::{BridgeConfig, TransportKind};

use std::sync::Arc;

use anyhow::{Context, Result};
use bridge_runtime::{
    EpisodeSummary, EventAccumulator, HttpTransport, TcpStreamTransport, Transport,
    TransportError, TurnScheduler,
};

pub struct Bridge {
    config: BridgeConfig,
    events: Arc<EventAccumulator>,
    arena: Arc<ArenaSimulation>,
}

impl Bridge {
    pub fn new(config: BridgeConfig) -> Self {
        let events = Arc::new(EventAccumulator::new());
        let arena = Arc::new(ArenaSimulation::new(
            config.arena.clone(),
            Arc::clone(&events),
        ));
        Self {
            config,
            events,
            arena,
        }
    }

    pub fn arena(&self) -> &ArenaSimulation {
        &self.arena
    }

    /// Runs every configured episode and returns their summaries in order.
    ///
    /// Stops at the first episode that cannot connect or cannot deliver its
    /// terminal flush.
    pub async fn run(&self) -> Result<Vec<EpisodeSummary>> {
        let mut summaries = Vec::with_capacity(self.config.episodes as usize);

        for episode in 1..=self.config.episodes {
            if episode > 1 {
                self.arena.next_round();
            }

            let transport = self.connect().await.with_context(|| {
                format!(
                    "episode {}: failed to reach policy server at {}",
                    episode,
                    self.config.endpoint()
                )
            })?;

            let summary = self
                .run_episode(transport)
                .await
                .with_context(|| format!("episode {} failed", episode))?;

            tracing::info!(
                episode,
                exit = %summary.exit,
                turns = summary.state.turns,
                reports = summary.state.reports_sent,
                suppressed = summary.state.suppressed_errors,
                "episode complete"
            );
            summaries.push(summary);
        }

        self.arena.settle();
        Ok(summaries)
    }

    /// Runs one episode of the arena over `transport`.
    pub async fn run_episode<T: Transport>(
        &self,
        transport: T,
    ) -> bridge_runtime::Result<EpisodeSummary> {
        TurnScheduler::new(transport, Arc::clone(&self.arena), Arc::clone(&self.events))
            .run()
            .await
    }

    async fn connect(&self) -> std::result::Result<Box<dyn Transport>, TransportError> {
        match self.config.transport {
            TransportKind::Stream => {
                let transport = TcpStreamTransport::connect(&self.config.stream_addr).await?;
                Ok(Box::new(transport))
            }
            TransportKind::Http => Ok(Box::new(HttpTransport::new(self.config.http_url.clone()))),
        }
    }
}
