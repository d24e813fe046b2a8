//! Scheduler behavior over a recording transport.
mod common;

use std::sync::Arc;

use bridge_runtime::protocol::{Action, Event, EventKind, EventPayload, StateField};
use bridge_runtime::{BridgeError, EventAccumulator, ExitReason, TransportError, TurnScheduler};
use common::{Op, ScriptedSimulation, ScriptedTransport, Step, assert_alternation, reports};
use strum::EnumCount;

fn scanned() -> EventPayload {
    EventPayload::ScannedRobot {
        name: "sentry".to_string(),
        bearing: 12.0,
        distance: 240.0,
        heading: 90.0,
        velocity: 0.0,
        energy: 100.0,
    }
}

fn round_ended() -> EventPayload {
    EventPayload::RoundEnded {
        round: 0,
        turns: 3,
        total_turns: 3,
    }
}

fn setup(
    sim: impl FnOnce(ScriptedSimulation) -> ScriptedSimulation,
) -> (Arc<EventAccumulator>, Arc<ScriptedSimulation>) {
    let events = Arc::new(EventAccumulator::new());
    let sim = Arc::new(sim(ScriptedSimulation::new(Arc::clone(&events))));
    (events, sim)
}

#[tokio::test]
async fn scripted_episode_reports_every_turn() {
    let (events, sim) = setup(|sim| {
        sim.on_call(1, Step::Emit(scanned()))
            .on_call(3, Step::Emit(round_ended()))
    });
    let transport = ScriptedTransport::with_actions(&[
        Action::Ahead(5.0),
        Action::Fire(3.0),
        Action::Ahead(-5.0),
    ]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert_eq!(sim.calls(), ["ahead(5)", "fire(3)", "ahead(-5)"]);
    assert!(matches!(
        summary.exit,
        ExitReason::TerminalEvent(EventKind::RoundEnded)
    ));
    assert_eq!(summary.state.turns, 3);
    assert_eq!(summary.state.reports_sent, 5);
    assert_eq!(summary.terminal_flush_events, 0);

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    let sent = reports(&ops);
    assert_eq!(sent.len(), 5);

    // opening report: full state, no events
    assert!(sent[0].events.is_empty());
    assert_eq!(sent[0].state.len(), StateField::COUNT);

    assert_eq!(sent[1].events.kinds().collect::<Vec<_>>(), [EventKind::ScannedRobot]);
    assert_eq!(sent[1].events.of_kind(EventKind::ScannedRobot)[0].time, 1);

    let fired = sent[2].events.of_kind(EventKind::BulletFired);
    assert_eq!(fired.len(), 1);
    assert!(matches!(
        &fired[0].payload,
        EventPayload::BulletFired { bullet } if bullet.power == 3.0
    ));

    assert_eq!(sent[3].terminal_kind(), Some(EventKind::RoundEnded));
    assert!(sent[4].events.is_empty());
}

#[tokio::test]
async fn unrecognized_action_is_skipped_but_reported() {
    let (events, sim) = setup(|sim| sim);
    let transport = ScriptedTransport::with_lines([
        r#"{"name":"levitate","value":3}"#,
        r#"{"name":"fire","value":3}"#,
        "null",
    ]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert_eq!(sim.calls(), ["fire(3)"]);
    assert!(matches!(summary.exit, ExitReason::NoAction));
    assert_eq!(summary.state.turns, 2);
    assert_eq!(summary.state.ignored_actions, 1);

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    // reset, levitate flush, fire flush, terminal flush
    let sent = reports(&ops);
    assert_eq!(sent.len(), 4);
    assert!(sent[1].events.is_empty());
    assert!(sent[2].events.contains(EventKind::BulletFired));
}

#[tokio::test]
async fn late_terminal_event_is_delivered_by_terminal_flush() {
    let (events, sim) = setup(|sim| sim);
    let late = Arc::clone(&events);
    let transport = ScriptedTransport::with_actions(&[Action::Scan, Action::Scan])
        .on_set_state(move |call| {
            if call == 1 {
                late.record(Event::new(7, EventPayload::Death));
            }
        });
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert_eq!(sim.calls(), ["scan"]);
    assert!(matches!(
        summary.exit,
        ExitReason::TerminalEvent(EventKind::Death)
    ));
    assert_eq!(summary.terminal_flush_events, 1);

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    assert!(matches!(
        ops.as_slice(),
        [Op::Reset(_), Op::ReadAction, Op::SetState(_), Op::SetState(last)]
            if last.terminal_kind() == Some(EventKind::Death)
    ));
}

#[tokio::test]
async fn undecodable_action_ends_episode_with_flush() {
    let (events, sim) = setup(|sim| sim);
    let transport = ScriptedTransport::with_lines([r#"{"name":"ahead","value":true}"#]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert!(sim.calls().is_empty());
    match &summary.exit {
        ExitReason::Transport(err) => assert!(err.is_decode(), "{err}"),
        other => panic!("unexpected exit: {other}"),
    }

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    assert!(matches!(
        ops.as_slice(),
        [Op::Reset(_), Op::ReadAction, Op::SetState(_)]
    ));
}

#[tokio::test]
async fn simulation_error_does_not_skip_the_report() {
    let (events, sim) = setup(|sim| {
        sim.on_call(1, Step::Emit(EventPayload::Death))
            .on_call(1, Step::Fail)
    });
    let transport = ScriptedTransport::with_actions(&[Action::Back(10.0), Action::Scan]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert_eq!(sim.calls(), ["back(10)"]);
    assert_eq!(summary.state.suppressed_errors, 1);
    assert!(matches!(
        summary.exit,
        ExitReason::TerminalEvent(EventKind::Death)
    ));

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    let sent = reports(&ops);
    assert_eq!(sent.len(), 3);
    assert_eq!(sent[1].terminal_kind(), Some(EventKind::Death));
}

#[tokio::test]
async fn panic_in_simulation_still_reports() {
    let (events, sim) = setup(|sim| sim.on_call(1, Step::Panic));
    let transport = ScriptedTransport::with_actions(&[Action::TurnLeft(90.0)]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, Arc::clone(&sim), events)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.state.suppressed_errors, 1);
    assert!(matches!(summary.exit, ExitReason::NoAction));

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    assert!(matches!(
        ops.as_slice(),
        [
            Op::Reset(_),
            Op::ReadAction,
            Op::SetState(_),
            Op::ReadAction,
            Op::SetState(_)
        ]
    ));
}

#[tokio::test]
async fn closed_server_gets_terminal_flush() {
    let (events, sim) = setup(|sim| sim);
    let transport = ScriptedTransport::with_actions(&[]);
    let log = transport.log();

    let summary = TurnScheduler::new(transport, sim, events).run().await.unwrap();

    assert!(matches!(summary.exit, ExitReason::NoAction));
    assert_eq!(summary.state.turns, 0);
    assert_eq!(summary.state.reports_sent, 2);

    let ops = log.lock().unwrap().clone();
    assert_alternation(&ops);
    assert_eq!(ops.len(), 3);
}

#[tokio::test]
async fn stale_events_are_not_reported() {
    let (events, sim) = setup(|sim| sim);
    events.record(Event::new(0, EventPayload::HitWall { bearing: 10.0 }));
    let transport = ScriptedTransport::with_actions(&[Action::DoNothing]);
    let log = transport.log();

    TurnScheduler::new(transport, sim, events).run().await.unwrap();

    let ops = log.lock().unwrap().clone();
    assert!(reports(&ops).iter().all(|report| report.events.is_empty()));
}

#[tokio::test]
async fn events_from_engine_threads_reach_the_next_report() {
    let (events, sim) = setup(|sim| {
        sim.on_call(
            2,
            Step::EmitFromThread(EventPayload::HitWall { bearing: -90.0 }),
        )
    });
    let transport =
        ScriptedTransport::with_actions(&[Action::TurnRight(45.0), Action::Ahead(400.0)]);
    let log = transport.log();

    TurnScheduler::new(transport, sim, events).run().await.unwrap();

    let ops = log.lock().unwrap().clone();
    let sent = reports(&ops);
    assert!(sent[1].events.is_empty());
    assert_eq!(sent[2].events.of_kind(EventKind::HitWall).len(), 1);
}

#[tokio::test]
async fn failed_terminal_flush_is_an_error() {
    let (events, sim) = setup(|sim| sim);
    let transport = ScriptedTransport::with_actions(&[Action::Scan]).failing_set_state();

    let err = TurnScheduler::new(transport, sim, events)
        .run()
        .await
        .unwrap_err();

    match err {
        BridgeError::TerminalFlush {
            exit: ExitReason::Transport(TransportError::Io(_)),
            source: TransportError::Io(_),
        } => {}
        other => panic!("unexpected error: {other}"),
    }
}
