//! Full episode against a line-protocol policy server over an in-memory pipe.
mod common;

use std::sync::Arc;

use bridge_runtime::protocol::{Action, EventKind, EventPayload, StateReport};
use bridge_runtime::{EventAccumulator, ExitReason, StreamTransport, TurnScheduler};
use common::{ScriptedSimulation, Step};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, duplex, split};

/// Answers reports with `actions` until one carries a terminal event, then
/// keeps reading until the agent hangs up. Returns every report received.
async fn policy_server(stream: DuplexStream, actions: Vec<Action>) -> Vec<StateReport> {
    let (reader, mut writer) = split(stream);
    let mut lines = BufReader::new(reader).lines();
    let mut actions = actions.into_iter();
    let mut reports = Vec::new();
    let mut finished = false;

    while let Some(line) = lines.next_line().await.unwrap() {
        let report: StateReport = serde_json::from_str(&line).unwrap();
        finished |= report.terminal_kind().is_some();
        reports.push(report);
        if finished {
            continue;
        }

        let mut reply = match actions.next() {
            Some(action) => serde_json::to_string(&action).unwrap(),
            None => "null".to_string(),
        };
        reply.push('\n');
        // the agent may already have hung up after its final report
        if writer.write_all(reply.as_bytes()).await.is_err() {
            break;
        }
    }

    reports
}

#[tokio::test]
async fn episode_over_line_protocol() {
    let (agent, server) = duplex(16 * 1024);
    let server = tokio::spawn(policy_server(
        server,
        vec![Action::TurnRadarRight(45.0), Action::Fire(1.5), Action::Scan],
    ));

    let events = Arc::new(EventAccumulator::new());
    let sim = Arc::new(
        ScriptedSimulation::new(Arc::clone(&events)).on_call(
            2,
            Step::Emit(EventPayload::BattleEnded { aborted: false }),
        ),
    );

    let (reader, writer) = split(agent);
    let transport = StreamTransport::new(BufReader::new(reader), writer);
    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert!(matches!(
        summary.exit,
        ExitReason::TerminalEvent(EventKind::BattleEnded)
    ));
    assert_eq!(sim.calls(), ["turnRadarRight(45)", "fire(1.5)"]);

    let reports = server.await.unwrap();
    // reset, two turns, terminal flush
    assert_eq!(reports.len(), 4);
    assert!(reports[2].events.contains(EventKind::BulletFired));
    assert_eq!(reports[2].terminal_kind(), Some(EventKind::BattleEnded));
    assert!(reports[3].events.is_empty());
}

#[tokio::test]
async fn null_action_ends_episode_over_line_protocol() {
    let (agent, server) = duplex(16 * 1024);
    let server = tokio::spawn(policy_server(server, vec![Action::DoNothing]));

    let events = Arc::new(EventAccumulator::new());
    let sim = Arc::new(ScriptedSimulation::new(Arc::clone(&events)));

    let (reader, writer) = split(agent);
    let transport = StreamTransport::new(BufReader::new(reader), writer);
    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert!(matches!(summary.exit, ExitReason::NoAction));
    assert_eq!(sim.calls(), ["doNothing"]);

    let reports = server.await.unwrap();
    assert_eq!(reports.len(), 3);
}
