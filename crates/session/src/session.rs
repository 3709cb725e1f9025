//! Aim session lifecycle.

use std::path::PathBuf;

use headaim_common::config::AppConfig;
use headaim_common::error::{HeadaimError, HeadaimResult};
use headaim_input::arbiter::{InputArbiter, SourceAvailability};
use headaim_model::aim::AimSnapshot;
use headaim_model::event::{AimEvent, AimEventKind};
use headaim_model::sample::TimedInput;
use headaim_model::session::SessionMode;
use headaim_tracking::AimPipeline;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::countdown::{Countdown, COUNTDOWN_INTERVAL};

/// Requests handled by the session loop.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCommand {
    /// A discrete input (touch, reference sensor reading).
    Input(TimedInput),
    BeginCalibration,
    CapturePose,
    CompleteCalibration,
    AbortCalibration,
    Recenter,
    Shutdown,
}

/// Where and whether to persist completed calibrations.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    /// Config file a completed calibration is written back to.
    pub config_path: Option<PathBuf>,
}

/// Counters reported when a session ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub inputs_processed: u64,
    pub events_emitted: u64,
    pub clicks: u64,
    pub calibrated: bool,
}

/// A running aim session.
pub struct AimSession {
    mode: SessionMode,
    sample_tx: watch::Sender<Option<TimedInput>>,
    command_tx: mpsc::UnboundedSender<SessionCommand>,
    snapshot_rx: watch::Receiver<AimSnapshot>,
    events_rx: Option<mpsc::UnboundedReceiver<AimEvent>>,
    task: JoinHandle<SessionSummary>,
}

impl AimSession {
    /// Select the input mode and start the session task.
    ///
    /// Fails with `NoInputSource` when nothing can drive the aim. Must be
    /// called from within a tokio runtime.
    pub fn start(config: AppConfig, availability: &SourceAvailability) -> HeadaimResult<Self> {
        Self::start_with(config, availability, SessionOptions::default())
    }

    pub fn start_with(
        config: AppConfig,
        availability: &SourceAvailability,
        options: SessionOptions,
    ) -> HeadaimResult<Self> {
        let mode = InputArbiter::select(availability)?;
        let pipeline = AimPipeline::new(mode, &config)?;

        let (sample_tx, sample_rx) = watch::channel(None);
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(pipeline.snapshot());
        let (event_tx, events_rx) = mpsc::unbounded_channel();

        let session_loop = SessionLoop {
            pipeline,
            config,
            options,
            snapshot_tx,
            event_tx,
            countdown: None,
            countdown_generation: 0,
            pose_requested: false,
            summary: SessionSummary::default(),
        };
        let task = tokio::spawn(session_loop.run(sample_rx, command_rx));

        tracing::info!(%mode, "Aim session started");

        Ok(Self {
            mode,
            sample_tx,
            command_tx,
            snapshot_rx,
            events_rx: Some(events_rx),
            task,
        })
    }

    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Hand the session an input. Continuous samples replace any sample
    /// still waiting to be processed; discrete inputs are queued.
    pub fn push_sample(&self, input: TimedInput) -> HeadaimResult<()> {
        if input.is_continuous() {
            self.sample_tx
                .send(Some(input))
                .map_err(|_| HeadaimError::session("session is shut down"))
        } else {
            self.send(SessionCommand::Input(input))
        }
    }

    pub fn begin_calibration(&self) -> HeadaimResult<()> {
        self.send(SessionCommand::BeginCalibration)
    }

    pub fn capture_pose(&self) -> HeadaimResult<()> {
        self.send(SessionCommand::CapturePose)
    }

    pub fn complete_calibration(&self) -> HeadaimResult<()> {
        self.send(SessionCommand::CompleteCalibration)
    }

    pub fn abort_calibration(&self) -> HeadaimResult<()> {
        self.send(SessionCommand::AbortCalibration)
    }

    pub fn recenter(&self) -> HeadaimResult<()> {
        self.send(SessionCommand::Recenter)
    }

    fn send(&self, command: SessionCommand) -> HeadaimResult<()> {
        self.command_tx
            .send(command)
            .map_err(|_| HeadaimError::session("session is shut down"))
    }

    /// Latest committed snapshot (non-blocking).
    pub fn snapshot(&self) -> AimSnapshot {
        *self.snapshot_rx.borrow()
    }

    /// A receiver for committed snapshots.
    pub fn subscribe(&self) -> watch::Receiver<AimSnapshot> {
        self.snapshot_rx.clone()
    }

    /// The event stream. Available once; later calls return `None`.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<AimEvent>> {
        self.events_rx.take()
    }

    /// Stop accepting samples, cancel any countdown, and wait for the
    /// session task to finish.
    pub async fn shutdown(self) -> HeadaimResult<SessionSummary> {
        let Self {
            sample_tx,
            command_tx,
            task,
            ..
        } = self;

        let _ = command_tx.send(SessionCommand::Shutdown);
        drop(sample_tx);

        let summary = task
            .await
            .map_err(|e| HeadaimError::session(format!("session task failed: {e}")))?;
        tracing::info!(
            inputs = summary.inputs_processed,
            events = summary.events_emitted,
            clicks = summary.clicks,
            "Aim session stopped"
        );
        Ok(summary)
    }
}

/// State owned by the session task.
///
/// Commands and countdown ticks carry no timestamp of their own; the
/// events they produce are stamped with the newest input's timestamp so
/// every event shares the sample time base.
struct SessionLoop {
    pipeline: AimPipeline,
    config: AppConfig,
    options: SessionOptions,
    snapshot_tx: watch::Sender<AimSnapshot>,
    event_tx: mpsc::UnboundedSender<AimEvent>,
    countdown: Option<Countdown>,
    countdown_generation: u64,
    /// A new pose was requested since the last commit.
    pose_requested: bool,
    summary: SessionSummary,
}

impl SessionLoop {
    async fn run(
        mut self,
        mut sample_rx: watch::Receiver<Option<TimedInput>>,
        mut command_rx: mpsc::UnboundedReceiver<SessionCommand>,
    ) -> SessionSummary {
        let (tick_tx, mut tick_rx) = mpsc::unbounded_channel::<u64>();

        if self.pipeline.needs_calibration() {
            tracing::info!("No saved calibration, starting guided calibration");
            self.handle_command(SessionCommand::BeginCalibration);
            self.commit(&tick_tx);
        }

        loop {
            // Commands first so everything queued before `Shutdown` runs.
            tokio::select! {
                biased;

                command = command_rx.recv() => {
                    match command {
                        None | Some(SessionCommand::Shutdown) => break,
                        Some(command) => self.handle_command(command),
                    }
                }
                changed = sample_rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let input = sample_rx.borrow_and_update().clone();
                    if let Some(input) = input {
                        self.summary.inputs_processed += 1;
                        let events = self.pipeline.process(&input);
                        self.emit(events);
                    }
                }
                Some(generation) = tick_rx.recv() => {
                    if self.countdown.as_ref().map(Countdown::generation) == Some(generation) {
                        let now = self.pipeline.last_timestamp();
                        let events = self.pipeline.tick_calibration(now);
                        self.emit(events);
                    } else {
                        tracing::trace!(generation, "Ignoring tick from a cancelled countdown");
                    }
                }
            }
            self.commit(&tick_tx);
        }

        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        self.summary.calibrated = self.pipeline.is_calibrated();
        self.summary
    }

    fn handle_command(&mut self, command: SessionCommand) {
        let now = self.pipeline.last_timestamp();
        let result = match command {
            SessionCommand::Input(input) => {
                self.summary.inputs_processed += 1;
                Ok(self.pipeline.process(&input))
            }
            SessionCommand::BeginCalibration => self.pipeline.begin_calibration(now),
            SessionCommand::CapturePose => self.pipeline.capture_pose(now),
            SessionCommand::CompleteCalibration => self.pipeline.complete_calibration(now),
            SessionCommand::AbortCalibration => Ok(self.pipeline.abort_calibration(now)),
            SessionCommand::Recenter => self.pipeline.recenter(now),
            SessionCommand::Shutdown => Ok(Vec::new()),
        };

        match result {
            Ok(events) => self.emit(events),
            Err(e) => tracing::warn!(error = %e, "Session command rejected"),
        }
    }

    fn emit(&mut self, events: Vec<AimEvent>) {
        for event in events {
            self.summary.events_emitted += 1;
            if event.is_click() {
                self.summary.clicks += 1;
            }
            if matches!(event.kind, AimEventKind::PoseRequested { .. }) {
                self.pose_requested = true;
            }
            // Nobody listening is fine.
            let _ = self.event_tx.send(event);
        }
    }

    /// Publish the snapshot, keep the countdown in step with the
    /// calibration state, and persist a newly completed calibration.
    ///
    /// Each requested pose gets a fresh countdown, so its first tick lands
    /// one full interval after the request.
    fn commit(&mut self, tick_tx: &mpsc::UnboundedSender<u64>) {
        self.snapshot_tx.send_replace(self.pipeline.snapshot());

        let calibrating = self.pipeline.calibration_state().is_in_progress();
        let pose_requested = std::mem::take(&mut self.pose_requested);
        if !calibrating {
            if let Some(countdown) = self.countdown.take() {
                countdown.cancel();
            }
        } else if pose_requested || self.countdown.is_none() {
            self.restart_countdown(tick_tx);
        }

        if let Some(record) = self.pipeline.take_completed_record() {
            self.config.calibration = record;
            if let Some(path) = &self.options.config_path {
                if let Err(e) = self.config.save_to(path) {
                    tracing::error!(error = %e, ?path, "Failed to save calibration");
                } else {
                    tracing::info!(?path, "Calibration saved");
                }
            }
        }
    }

    fn restart_countdown(&mut self, tick_tx: &mpsc::UnboundedSender<u64>) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
        self.countdown_generation += 1;
        self.countdown = Some(Countdown::start(
            tick_tx.clone(),
            self.countdown_generation,
            COUNTDOWN_INTERVAL,
        ));
    }
}
