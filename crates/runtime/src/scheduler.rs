//! Episode state machine driving the report/action handshake.
//!
//! ```text
//! Resetting ─→ AwaitingAction ─→ Executing ─→ Flushing ─┐
//!                   ↑  │                                 │
//!                   │  └──── no action / failure ──┐     │
//!                   └──────── non-terminal ────────┼─────┘
//!                                                  ↓
//!                                             Terminated (one last flush)
//! ```
//!
//! Every exit (terminal event, absent action, transport or decode failure)
//! goes through the terminated phase, which always sends one more report.
//! A terminal event that lands just after a drain is therefore still
//! delivered, and the server is never left blocked on a read.
use std::fmt;
use std::sync::Arc;

use bridge_protocol::{Action, Event, EventBuffer, EventKind, EventPayload, StateReport};
use tracing::{debug, error, info, warn};

use crate::api::{BridgeError, Result, Simulation, SimulationError, TransportError};
use crate::dispatch::{Dispatched, dispatch};
use crate::events::EventAccumulator;
use crate::snapshot::snapshot;
use crate::transport::Transport;

/// Why an episode stopped asking for actions.
#[derive(Debug)]
pub enum ExitReason {
    /// A terminal event was captured.
    TerminalEvent(EventKind),
    /// The server sent `null` or closed the connection.
    NoAction,
    /// The exchange failed, including undecodable action messages.
    Transport(TransportError),
}

impl ExitReason {
    /// Returns true if the episode ended because the simulation said so.
    pub fn is_clean(&self) -> bool {
        matches!(self, ExitReason::TerminalEvent(_))
    }
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::TerminalEvent(kind) => write!(f, "terminal event {}", kind),
            ExitReason::NoAction => write!(f, "no action from policy server"),
            ExitReason::Transport(err) => write!(f, "transport failure: {}", err),
        }
    }
}

/// Per-episode counters, owned by the scheduler and threaded through each step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EpisodeState {
    /// Actions received and executed (ignored ones included).
    pub turns: u64,
    /// Reports delivered, counting the reset and the terminal flush.
    pub reports_sent: u64,
    /// Actions with an unrecognized name.
    pub ignored_actions: u64,
    /// Simulation failures swallowed during dispatch.
    pub suppressed_errors: u64,
}

/// Outcome of a finished episode.
#[derive(Debug)]
pub struct EpisodeSummary {
    pub state: EpisodeState,
    pub exit: ExitReason,
    /// Events carried by the terminal flush.
    pub terminal_flush_events: usize,
}

enum Phase {
    Resetting,
    AwaitingAction,
    Executing(Action),
    Flushing,
    Terminated(ExitReason),
}

/// Drives one episode between a [`Simulation`] and a [`Transport`].
///
/// The scheduler is the only reader of the [`EventAccumulator`]; the
/// simulation writes into the same accumulator from its own thread.
pub struct TurnScheduler<T, S> {
    transport: T,
    sim: Arc<S>,
    events: Arc<EventAccumulator>,
}

impl<T, S> TurnScheduler<T, S>
where
    T: Transport,
    S: Simulation,
{
    pub fn new(transport: T, sim: Arc<S>, events: Arc<EventAccumulator>) -> Self {
        Self {
            transport,
            sim,
            events,
        }
    }

    /// Runs the episode to completion.
    ///
    /// Returns `Err` only when the terminal flush cannot be delivered; every
    /// other failure is reported through [`EpisodeSummary::exit`].
    pub async fn run(mut self) -> Result<EpisodeSummary> {
        let mut episode = EpisodeState::default();
        let mut phase = Phase::Resetting;

        loop {
            phase = match phase {
                Phase::Resetting => self.reset(&mut episode).await,
                Phase::AwaitingAction => self.await_action().await,
                Phase::Executing(action) => self.execute(action, &mut episode).await,
                Phase::Flushing => self.flush(&mut episode).await,
                Phase::Terminated(exit) => return self.terminate(exit, episode).await,
            };
        }
    }

    async fn reset(&mut self, episode: &mut EpisodeState) -> Phase {
        let stale = self.events.drain();
        if !stale.is_empty() {
            debug!(
                target: "bridge::scheduler",
                count = stale.len(),
                "discarding events captured before the episode started"
            );
        }

        let report = StateReport::new(snapshot(self.sim.as_ref()), EventBuffer::new());
        match self.transport.reset(&report).await {
            Ok(()) => {
                episode.reports_sent += 1;
                info!(target: "bridge::scheduler", "episode started");
                Phase::AwaitingAction
            }
            Err(err) => {
                error!(target: "bridge::scheduler", error = %err, "failed to send opening report");
                Phase::Terminated(ExitReason::Transport(err))
            }
        }
    }

    async fn await_action(&mut self) -> Phase {
        // A terminal event recorded after the previous drain ends the episode
        // before the server is asked for another action.
        if let Some(kind) = self.events.pending_terminal() {
            debug!(target: "bridge::scheduler", %kind, "terminal event arrived after flush");
            return Phase::Terminated(ExitReason::TerminalEvent(kind));
        }

        match self.transport.next_action().await {
            Ok(Some(action)) => Phase::Executing(action),
            Ok(None) => {
                info!(target: "bridge::scheduler", "policy server sent no action");
                Phase::Terminated(ExitReason::NoAction)
            }
            Err(err) => {
                warn!(target: "bridge::scheduler", error = %err, "failed to obtain action");
                Phase::Terminated(ExitReason::Transport(err))
            }
        }
    }

    /// Performs `action` and always moves on to the flush.
    ///
    /// Dispatch runs in its own task so that a simulation error or a panic
    /// inside the engine cannot skip the report the server is waiting for.
    async fn execute(&mut self, action: Action, episode: &mut EpisodeState) -> Phase {
        episode.turns += 1;
        let label = action.to_string();
        debug!(target: "bridge::scheduler", turn = episode.turns, action = %label, "executing");

        let sim = Arc::clone(&self.sim);
        let outcome = tokio::spawn(async move { dispatch(&action, sim.as_ref()).await })
            .await
            .unwrap_or_else(|join| Err(SimulationError::Aborted(join)));

        match outcome {
            Ok(Dispatched::Completed) | Ok(Dispatched::Fired(None)) => {}
            Ok(Dispatched::Fired(Some(bullet))) => {
                let time = self.sim.time();
                self.events
                    .record(Event::new(time, EventPayload::BulletFired { bullet }));
            }
            Ok(Dispatched::Ignored) => episode.ignored_actions += 1,
            Err(err) => {
                episode.suppressed_errors += 1;
                warn!(
                    target: "bridge::scheduler",
                    turn = episode.turns,
                    action = %label,
                    error = %err,
                    "action failed in simulation; reporting state anyway"
                );
            }
        }

        Phase::Flushing
    }

    async fn flush(&mut self, episode: &mut EpisodeState) -> Phase {
        let report = self.build_report();

        if let Err(err) = self.transport.set_state(&report).await {
            warn!(target: "bridge::scheduler", error = %err, "failed to send state report");
            return Phase::Terminated(ExitReason::Transport(err));
        }
        episode.reports_sent += 1;

        match report.terminal_kind() {
            Some(kind) => Phase::Terminated(ExitReason::TerminalEvent(kind)),
            None => Phase::AwaitingAction,
        }
    }

    async fn terminate(
        mut self,
        exit: ExitReason,
        mut episode: EpisodeState,
    ) -> Result<EpisodeSummary> {
        let report = self.build_report();
        let terminal_flush_events = report.events.len();

        if let Err(source) = self.transport.set_state(&report).await {
            error!(
                target: "bridge::scheduler",
                exit = %exit,
                error = %source,
                "terminal flush failed"
            );
            return Err(BridgeError::TerminalFlush { exit, source });
        }
        episode.reports_sent += 1;

        if let Err(err) = self.transport.close().await {
            debug!(target: "bridge::scheduler", error = %err, "failed to close transport");
        }

        info!(
            target: "bridge::scheduler",
            exit = %exit,
            turns = episode.turns,
            reports = episode.reports_sent,
            "episode finished"
        );

        Ok(EpisodeSummary {
            state: episode,
            exit,
            terminal_flush_events,
        })
    }

    /// Reads the state, then drains the events captured so far.
    fn build_report(&self) -> StateReport {
        let state = snapshot(self.sim.as_ref());
        let events = self.events.drain();
        StateReport::new(state, events)
    }
}
