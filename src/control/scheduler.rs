//! Repeat timers.
//!
//! A scheduler only produces ticks; the state machine decides what a tick
//! means. Every tick carries the [`TaskHandle`] it belongs to so that ticks
//! racing a cancellation can be recognized and dropped.

use crate::gesture::ControlAction;
use crossbeam_channel::{Sender, select};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identifies one repeating task. Never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Periodic timer source used by the control state machine.
pub trait RepeatScheduler: Send {
    /// Starts ticking every `interval`; the first tick comes one interval
    /// after the call.
    fn start(&mut self, interval: Duration, action: ControlAction) -> TaskHandle;

    /// Stops a task. Unknown or already cancelled handles are ignored.
    fn cancel(&mut self, handle: TaskHandle);
}

fn sanitize_interval(interval: Duration) -> Duration {
    interval.max(Duration::from_millis(1))
}

/// Tick callback for [`ThreadScheduler`]. Returning `false` stops the task.
pub type TickFn = Arc<dyn Fn(TaskHandle) -> bool + Send + Sync>;

/// One timer thread per live task.
///
/// Cancelling drops the task's cancel sender; the thread notices on its next
/// wakeup and exits without being joined.
pub struct ThreadScheduler {
    on_tick: TickFn,
    next_id: u64,
    tasks: HashMap<TaskHandle, Sender<()>>,
}

impl ThreadScheduler {
    pub fn new(on_tick: impl Fn(TaskHandle) -> bool + Send + Sync + 'static) -> Self {
        Self {
            on_tick: Arc::new(on_tick),
            next_id: 0,
            tasks: HashMap::new(),
        }
    }

    /// Number of tasks not yet cancelled.
    pub fn live(&self) -> usize {
        self.tasks.len()
    }
}

impl RepeatScheduler for ThreadScheduler {
    fn start(&mut self, interval: Duration, action: ControlAction) -> TaskHandle {
        self.next_id += 1;
        let handle = TaskHandle(self.next_id);
        let interval = sanitize_interval(interval);
        let (cancel_tx, cancel_rx) = crossbeam_channel::bounded::<()>(0);
        let on_tick = self.on_tick.clone();

        let spawned = std::thread::Builder::new()
            .name(format!("gesturectl-repeat-{}", handle.id()))
            .spawn(move || {
                let ticker = crossbeam_channel::tick(interval);
                loop {
                    select! {
                        recv(cancel_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            if !on_tick(handle) {
                                break;
                            }
                        }
                    }
                }
            });

        match spawned {
            Ok(_) => {
                self.tasks.insert(handle, cancel_tx);
            }
            Err(e) => {
                eprintln!("gesturectl: failed to start {action} repeat timer: {e}");
            }
        }
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        self.tasks.remove(&handle);
    }
}

#[derive(Debug, Clone)]
struct ManualTask {
    interval: Duration,
    next_due: Duration,
    action: ControlAction,
}

#[derive(Debug, Default)]
struct ManualState {
    now: Duration,
    next_id: u64,
    tasks: BTreeMap<TaskHandle, ManualTask>,
    created: usize,
    cancelled: usize,
}

/// Virtual-clock scheduler for tests and trace mode.
///
/// Time only moves through [`ManualScheduler::advance`]. Clones share state,
/// so a test can keep one clone while the state machine owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    state: Arc<Mutex<ManualState>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current virtual time since creation.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Moves the clock forward by `by`, returning due ticks in time order.
    pub fn advance(&self, by: Duration) -> Vec<(Duration, TaskHandle)> {
        let target = self.now() + by;
        self.advance_to(target)
    }

    /// Moves the clock to `target` (never backwards), returning due ticks in
    /// time order. Simultaneous ticks come out in handle order.
    pub fn advance_to(&self, target: Duration) -> Vec<(Duration, TaskHandle)> {
        let mut state = self.lock();
        let mut fired = Vec::new();
        loop {
            let due = state
                .tasks
                .iter()
                .filter(|(_, task)| task.next_due <= target)
                .min_by_key(|(handle, task)| (task.next_due, **handle))
                .map(|(handle, _)| *handle);
            let Some(handle) = due else { break };
            if let Some(task) = state.tasks.get_mut(&handle) {
                let at = task.next_due;
                task.next_due += task.interval;
                fired.push((at, handle));
            }
        }
        if target > state.now {
            state.now = target;
        }
        fired
    }

    /// Tasks started so far.
    pub fn created(&self) -> usize {
        self.lock().created
    }

    /// Tasks cancelled so far (ignoring unknown handles).
    pub fn cancelled(&self) -> usize {
        self.lock().cancelled
    }

    /// Tasks currently live.
    pub fn live(&self) -> usize {
        self.lock().tasks.len()
    }

    /// Actions of the live tasks, in handle order.
    pub fn live_actions(&self) -> Vec<ControlAction> {
        self.lock().tasks.values().map(|t| t.action).collect()
    }
}

impl RepeatScheduler for ManualScheduler {
    fn start(&mut self, interval: Duration, action: ControlAction) -> TaskHandle {
        let mut state = self.lock();
        state.next_id += 1;
        state.created += 1;
        let handle = TaskHandle(state.next_id);
        let interval = sanitize_interval(interval);
        let next_due = state.now + interval;
        state.tasks.insert(
            handle,
            ManualTask {
                interval,
                next_due,
                action,
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TaskHandle) {
        let mut state = self.lock();
        if state.tasks.remove(&handle).is_some() {
            state.cancelled += 1;
        }
    }
}
