//! Gesture pipeline that runs from startup until shutdown.
//!
//! ```text
//! FrameSource ─intake─▶ FrameStation ─slot(1)─▶ ClassifierStation ─┐
//!                            │ (implicit None)                      ▼
//!                            └──────────────────────────────▶ control queue ─▶ ControlStation
//!                                         ThreadScheduler ticks ──┘
//! ```

use crate::classifier::{Classifier, ClassifierAdapter};
use crate::control::{ControlStateMachine, ObservationGate, ThreadScheduler};
use crate::defaults;
use crate::error::Result;
use crate::frame::{CapturedFrame, FramePreprocessor, FrameSource};
use crate::pipeline::classifier_station::ClassifierStation;
use crate::pipeline::control_station::ControlStation;
use crate::pipeline::error::{ErrorReporter, LogReporter, SilentReporter};
use crate::pipeline::frame_station::FrameStation;
use crate::pipeline::station::StationRunner;
use crate::pipeline::types::{ControlEvent, ControlStep, PipelineCounters, PipelineStats};
use crate::playback::PlaybackIntentSink;
use crossbeam_channel::{Sender, bounded};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Longest side of the classifier input image
    pub target_size: u32,
    /// Confidence an observation must strictly exceed
    pub confidence_threshold: f32,
    /// Cadence of repeating actions
    pub repeat_interval: Duration,
    /// Frame source polling interval
    pub frame_interval: Duration,
    /// Verbosity level (0=results, 1=actions, 2=full event trace)
    pub verbosity: u8,
    /// Suppress diagnostics
    pub quiet: bool,
    /// Channel buffer sizes
    pub frame_buffer: usize,
    pub control_buffer: usize,
    /// Optional observer for every non-empty control step (non-blocking)
    pub step_tx: Option<Sender<ControlStep>>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_size: defaults::TARGET_SIZE,
            confidence_threshold: defaults::CONFIDENCE_THRESHOLD,
            repeat_interval: Duration::from_millis(defaults::REPEAT_INTERVAL_MS),
            frame_interval: Duration::from_millis(defaults::FRAME_INTERVAL_MS),
            verbosity: 0,
            quiet: false,
            frame_buffer: defaults::FRAME_BUFFER,
            control_buffer: defaults::CONTROL_BUFFER,
            step_tx: None,
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    running: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
    control_tx: Sender<ControlEvent>,
    threads: Vec<JoinHandle<()>>,
    counters: Arc<PipelineCounters>,
}

impl PipelineHandle {
    /// Stops intake, cancels any repeat task and waits up to 2s for threads.
    ///
    /// After the deadline, remaining threads are detached (a hung classifier
    /// must not block shutdown).
    pub fn stop(mut self) -> PipelineStats {
        self.running.store(false, Ordering::SeqCst);

        if self
            .control_tx
            .send_timeout(ControlEvent::Shutdown, Duration::from_secs(1))
            .is_err()
        {
            // Control station already gone.
        }

        self.join_until(Instant::now() + Duration::from_secs(2));
        self.counters.snapshot()
    }

    /// Waits for a finite source to drain through the whole pipeline.
    pub fn wait(mut self) -> PipelineStats {
        for handle in self.threads.drain(..) {
            join_logged(handle);
        }
        self.counters.snapshot()
    }

    fn join_until(&mut self, deadline: Instant) {
        let poll_interval = Duration::from_millis(20);
        loop {
            let mut remaining = Vec::new();
            for handle in self.threads.drain(..) {
                if handle.is_finished() {
                    join_logged(handle);
                } else {
                    remaining.push(handle);
                }
            }
            self.threads = remaining;

            if self.threads.is_empty() {
                break;
            }
            if Instant::now() >= deadline {
                eprintln!(
                    "gesturectl: shutdown timeout, {} thread(s) still running, detaching",
                    self.threads.len()
                );
                break;
            }
            thread::sleep(poll_interval);
        }
    }

    /// Returns true until the control station has stopped.
    pub fn is_running(&self) -> bool {
        !self.finished.load(Ordering::SeqCst)
    }

    /// Counters so far.
    pub fn stats(&self) -> PipelineStats {
        self.counters.snapshot()
    }
}

fn join_logged(handle: JoinHandle<()>) {
    if let Err(panic_info) = handle.join() {
        let msg = panic_info
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("unknown panic");
        eprintln!("gesturectl: pipeline thread panicked: {msg}");
    }
}

/// Gesture pipeline: FrameSource → preprocess → classifier → gate → debounce
/// → state machine → PlaybackIntentSink.
pub struct Pipeline {
    config: PipelineConfig,
    error_reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    /// Creates a pipeline; quiet configs get a silent reporter.
    pub fn new(config: PipelineConfig) -> Self {
        let error_reporter: Arc<dyn ErrorReporter> = if config.quiet {
            Arc::new(SilentReporter)
        } else {
            Arc::new(LogReporter)
        };
        Self {
            config,
            error_reporter,
        }
    }

    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    /// Starts the source and spawns every station.
    ///
    /// Fails without spawning anything if the source cannot start.
    pub fn start(
        self,
        mut source: Box<dyn FrameSource>,
        classifier: Arc<dyn Classifier>,
        sink: Box<dyn PlaybackIntentSink>,
    ) -> Result<PipelineHandle> {
        source.start()?;

        let config = self.config;
        let reporter = self.error_reporter;
        let running = Arc::new(AtomicBool::new(true));
        let finished = Arc::new(AtomicBool::new(false));
        let counters = PipelineCounters::shared();

        let (frame_tx, frame_rx) = bounded::<CapturedFrame>(config.frame_buffer.max(1));
        let (control_tx, control_rx) = bounded::<ControlEvent>(config.control_buffer.max(1));
        let (step_out_tx, step_out_rx) = bounded::<ControlStep>(config.control_buffer.max(1));

        let (adapter, slot_rx) = ClassifierAdapter::channel(classifier.clone());
        let worker_alive = adapter.worker_flag();

        let tick_tx = control_tx.clone();
        let scheduler =
            ThreadScheduler::new(move |handle| tick_tx.send(ControlEvent::Tick(handle)).is_ok());
        let machine = ControlStateMachine::new(Box::new(scheduler), sink)
            .with_interval(config.repeat_interval);

        let frame_station = FrameStation::new(
            FramePreprocessor::new(config.target_size),
            adapter,
            counters.clone(),
            reporter.clone(),
        );
        let classifier_station =
            ClassifierStation::new(classifier, worker_alive, counters.clone(), reporter.clone())
                .with_verbose(!config.quiet && config.verbosity >= 2);
        let control_station = ControlStation::new(
            ObservationGate::new(config.confidence_threshold),
            machine,
            counters.clone(),
            reporter.clone(),
        )
        .with_verbosity(if config.quiet { 0 } else { config.verbosity });

        let frame_runner =
            StationRunner::spawn(frame_station, frame_rx, control_tx.clone(), reporter.clone())?;
        let classifier_runner = StationRunner::spawn(
            classifier_station,
            slot_rx,
            control_tx.clone(),
            reporter.clone(),
        )?;
        let control_runner =
            StationRunner::spawn(control_station, control_rx, step_out_tx, reporter)?;

        // Forward control steps to the observer without ever blocking control.
        let step_tx = config.step_tx.clone();
        let drain_handle = thread::Builder::new()
            .name("gesturectl-drain".to_string())
            .spawn(move || {
                for step in step_out_rx.iter() {
                    if let Some(ref tx) = step_tx
                        && tx.try_send(step).is_err()
                    {
                        // Observer full or gone; steps are advisory.
                    }
                }
            })?;

        // Once classification has drained, nothing but ticks can reach the
        // control queue, so it is safe to shut control down.
        let supervisor_tx = control_tx.clone();
        let supervisor_finished = finished.clone();
        let supervisor_handle = thread::Builder::new()
            .name("gesturectl-supervisor".to_string())
            .spawn(move || {
                for runner_result in [frame_runner.join(), classifier_runner.join()] {
                    if let Err(msg) = runner_result {
                        eprintln!("gesturectl: {msg}");
                    }
                }
                if supervisor_tx.send(ControlEvent::Shutdown).is_err() {
                    // Already stopped via the handle.
                }
                if let Err(msg) = control_runner.join() {
                    eprintln!("gesturectl: {msg}");
                }
                supervisor_finished.store(true, Ordering::SeqCst);
            })?;

        let intake_handle = spawn_intake(
            source,
            frame_tx,
            running.clone(),
            counters.clone(),
            config.frame_interval,
        )?;

        Ok(PipelineHandle {
            running,
            finished,
            control_tx,
            threads: vec![intake_handle, supervisor_handle, drain_handle],
            counters,
        })
    }
}

fn spawn_intake(
    mut source: Box<dyn FrameSource>,
    frame_tx: Sender<CapturedFrame>,
    running: Arc<AtomicBool>,
    counters: Arc<PipelineCounters>,
    frame_interval: Duration,
) -> std::io::Result<JoinHandle<()>> {
    const MAX_CONSECUTIVE_ERRORS: u32 = 10;
    let source_is_finite = source.is_finite();

    thread::Builder::new()
        .name("gesturectl-intake".to_string())
        .spawn(move || {
            let mut consecutive_errors: u32 = 0;
            let mut sequence: u64 = 0;

            while running.load(Ordering::SeqCst) {
                let frame = match source.read_frame() {
                    Ok(frame) => {
                        consecutive_errors = 0;
                        frame
                    }
                    Err(e) => {
                        consecutive_errors += 1;
                        if consecutive_errors >= MAX_CONSECUTIVE_ERRORS {
                            eprintln!(
                                "gesturectl: frame capture failed {consecutive_errors} times in a row: {e}"
                            );
                            break;
                        }
                        thread::sleep(frame_interval);
                        continue;
                    }
                };

                let Some(frame) = frame else {
                    if source_is_finite {
                        break;
                    }
                    thread::sleep(frame_interval);
                    continue;
                };

                PipelineCounters::bump(&counters.frames_captured);
                let captured = CapturedFrame::new(frame, Instant::now(), sequence);
                sequence += 1;

                // Never block the camera: a full queue drops the frame.
                if frame_tx.try_send(captured).is_err() {
                    PipelineCounters::bump(&counters.frames_dropped);
                }

                thread::sleep(frame_interval);
            }

            if let Err(e) = source.stop() {
                eprintln!("gesturectl: failed to stop frame source: {e}");
            }
        })
}
