//! Scripted simulation and recording transport shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bridge_runtime::protocol::{
    Action, Bullet, Event, EventPayload, Reading, StateField, StateReport,
};
use bridge_runtime::{
    EventAccumulator, Readings, SimResult, Simulation, SimulationError, Transport, TransportError,
};

/// What the scripted simulation does during its n-th operation.
#[derive(Clone, Debug)]
pub enum Step {
    /// Record an event from the calling task.
    Emit(EventPayload),
    /// Record an event from a separate OS thread, as an engine callback would.
    EmitFromThread(EventPayload),
    /// Fail the operation.
    Fail,
    /// Panic inside the operation.
    Panic,
}

/// Simulation that logs every call and replays a per-call script.
pub struct ScriptedSimulation {
    events: Arc<EventAccumulator>,
    time: AtomicU64,
    calls: Mutex<Vec<String>>,
    script: Mutex<HashMap<usize, Vec<Step>>>,
}

impl ScriptedSimulation {
    pub fn new(events: Arc<EventAccumulator>) -> Self {
        Self {
            events,
            time: AtomicU64::new(0),
            calls: Mutex::new(Vec::new()),
            script: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `step` to the 1-based `call`.
    pub fn on_call(self, call: usize, step: Step) -> Self {
        self.script.lock().unwrap().entry(call).or_default().push(step);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn perform(&self, label: String) -> SimResult<()> {
        let time = self.time.fetch_add(1, Ordering::SeqCst) + 1;
        let call = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(label);
            calls.len()
        };
        let steps = self.script.lock().unwrap().remove(&call).unwrap_or_default();

        let mut result = Ok(());
        for step in steps {
            match step {
                Step::Emit(payload) => self.events.record(Event::new(time, payload)),
                Step::EmitFromThread(payload) => {
                    let events = Arc::clone(&self.events);
                    std::thread::spawn(move || events.record(Event::new(time, payload)))
                        .join()
                        .unwrap();
                }
                Step::Fail => result = Err(SimulationError::Destroyed),
                Step::Panic => panic!("engine crashed during call {}", call),
            }
        }
        result
    }
}

impl Readings for ScriptedSimulation {
    fn read(&self, field: StateField) -> Option<Reading> {
        match field {
            StateField::Time => Some(Reading::from(self.time.load(Ordering::SeqCst) as i64)),
            StateField::Energy => Some(Reading::from(100.0)),
            StateField::Others => Some(Reading::from(1_i64)),
            _ => None,
        }
    }
}

#[async_trait]
impl Simulation for ScriptedSimulation {
    async fn do_nothing(&self) -> SimResult<()> {
        self.perform("doNothing".to_string())
    }

    async fn ahead(&self, distance: f64) -> SimResult<()> {
        self.perform(format!("ahead({})", distance))
    }

    async fn back(&self, distance: f64) -> SimResult<()> {
        self.perform(format!("back({})", distance))
    }

    async fn turn_left(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnLeft({})", degrees))
    }

    async fn turn_right(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnRight({})", degrees))
    }

    async fn turn_radar_left(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnRadarLeft({})", degrees))
    }

    async fn turn_radar_right(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnRadarRight({})", degrees))
    }

    async fn turn_gun_left(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnGunLeft({})", degrees))
    }

    async fn turn_gun_right(&self, degrees: f64) -> SimResult<()> {
        self.perform(format!("turnGunRight({})", degrees))
    }

    async fn set_adjust_radar_for_robot_turn(&self, independent: bool) -> SimResult<()> {
        self.perform(format!("setAdjustRadarForRobotTurn({})", independent))
    }

    async fn set_adjust_radar_for_gun_turn(&self, independent: bool) -> SimResult<()> {
        self.perform(format!("setAdjustRadarForGunTurn({})", independent))
    }

    async fn set_adjust_gun_for_robot_turn(&self, independent: bool) -> SimResult<()> {
        self.perform(format!("setAdjustGunForRobotTurn({})", independent))
    }

    async fn scan(&self) -> SimResult<()> {
        self.perform("scan".to_string())
    }

    async fn fire(&self, power: f64) -> SimResult<Option<Bullet>> {
        self.perform(format!("fire({})", power))?;
        Ok(Some(Bullet {
            owner: "agent".to_string(),
            victim: None,
            x: 100.0,
            y: 100.0,
            heading: 0.0,
            power,
            active: true,
        }))
    }

    async fn stop(&self, overwrite: bool) -> SimResult<()> {
        self.perform(format!("stop({})", overwrite))
    }

    async fn resume(&self) -> SimResult<()> {
        self.perform("resume".to_string())
    }
}

/// One observed transport operation.
#[derive(Clone, Debug)]
pub enum Op {
    Reset(StateReport),
    ReadAction,
    SetState(StateReport),
}

impl Op {
    fn code(&self) -> char {
        match self {
            Op::Reset(_) => 'X',
            Op::ReadAction => 'R',
            Op::SetState(_) => 'S',
        }
    }

    pub fn report(&self) -> Option<&StateReport> {
        match self {
            Op::Reset(report) | Op::SetState(report) => Some(report),
            Op::ReadAction => None,
        }
    }
}

type SetStateHook = Box<dyn FnMut(usize) + Send>;

/// Transport that replays raw action lines and records every operation.
pub struct ScriptedTransport {
    incoming: VecDeque<String>,
    log: Arc<Mutex<Vec<Op>>>,
    on_set_state: Option<SetStateHook>,
    set_state_calls: usize,
    fail_set_state: bool,
}

impl ScriptedTransport {
    /// Transport answering with `actions` in order, then with no action.
    pub fn with_actions(actions: &[Action]) -> Self {
        let lines = actions
            .iter()
            .map(|action| serde_json::to_string(action).unwrap())
            .collect::<Vec<_>>();
        Self::with_lines(lines)
    }

    /// Transport answering with raw JSON lines.
    pub fn with_lines<I, L>(lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<String>,
    {
        Self {
            incoming: lines.into_iter().map(Into::into).collect(),
            log: Arc::new(Mutex::new(Vec::new())),
            on_set_state: None,
            set_state_calls: 0,
            fail_set_state: false,
        }
    }

    /// Runs `hook` right after the n-th `set_state` (1-based) was recorded.
    pub fn on_set_state(mut self, hook: impl FnMut(usize) + Send + 'static) -> Self {
        self.on_set_state = Some(Box::new(hook));
        self
    }

    pub fn failing_set_state(mut self) -> Self {
        self.fail_set_state = true;
        self
    }

    pub fn log(&self) -> Arc<Mutex<Vec<Op>>> {
        Arc::clone(&self.log)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn reset(&mut self, report: &StateReport) -> Result<(), TransportError> {
        self.log.lock().unwrap().push(Op::Reset(report.clone()));
        Ok(())
    }

    async fn next_action(&mut self) -> Result<Option<Action>, TransportError> {
        self.log.lock().unwrap().push(Op::ReadAction);
        let Some(line) = self.incoming.pop_front() else {
            return Ok(None);
        };
        serde_json::from_str(&line).map_err(|source| TransportError::Decode {
            payload: line.clone(),
            source,
        })
    }

    async fn set_state(&mut self, report: &StateReport) -> Result<(), TransportError> {
        if self.fail_set_state {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "policy server went away",
            )));
        }

        self.log.lock().unwrap().push(Op::SetState(report.clone()));
        self.set_state_calls += 1;
        if let Some(hook) = self.on_set_state.as_mut() {
            hook(self.set_state_calls);
        }
        Ok(())
    }
}

/// Asserts the trace reads `reset, (read, flush)*, [read], flush`.
pub fn assert_alternation(ops: &[Op]) {
    let trace: String = ops.iter().map(Op::code).collect();
    let body = trace
        .strip_prefix('X')
        .and_then(|rest| rest.strip_suffix('S'))
        .unwrap_or_else(|| panic!("trace must start with reset and end with a flush: {}", trace));
    let body = body.strip_suffix('R').unwrap_or(body);

    assert!(
        body.len() % 2 == 0 && body.as_bytes().chunks(2).all(|pair| pair == b"RS"),
        "reads and flushes do not alternate: {}",
        trace
    );
}

/// Reports in the order they were sent, reset included.
pub fn reports(ops: &[Op]) -> Vec<StateReport> {
    ops.iter().filter_map(Op::report).cloned().collect()
}
