//! Fixed-cadence game loop running on its own thread
//!
//! Each frame turns wall-clock time into a delta, applies queued commands,
//! updates every body group and presents the result. The frame pacer sleeps
//! for whatever is left of the frame period, carrying over up to one period
//! of lead or lag so the average rate stays on target.
//!
//! Controllers talk to the loop only through [`Game`]. Changes to the world
//! are queued and applied at the top of the next frame; inspection goes
//! through [`Game::with_world`], which waits for the current frame to finish.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::fps::FpsCounter;
use crate::renderer::{FrameSink, FrameStats, MeshSurface};
use crate::settings::{ConfigError, EnemyConfig, Settings, WorldSize};
use crate::sim::{GameState, Heading, LossReason, TickInput, tick};

/// A change to the world, applied at the next frame boundary
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Steer(Heading),
    Spin(bool),
    AddEnemy(EnemyConfig),
    /// Remove the `n`th enemy type
    RemoveEnemy(usize),
    SetWorldSize(WorldSize),
    /// Put every group back in its starting state
    Reset,
}

/// Lifecycle of the loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Stopped,
    Running,
    Paused,
    /// The loop has ended and its report awaits acknowledgement
    GameOver,
}

/// Summary of a finished run
#[derive(Debug, Clone, PartialEq)]
pub struct GameOverReport {
    pub score: u32,
    /// `None` when the loop was stopped from outside
    pub reason: Option<LossReason>,
    pub frames: u64,
}

impl GameOverReport {
    pub fn message(&self) -> String {
        match &self.reason {
            Some(reason) => reason.to_string(),
            None => "Game stopped".to_string(),
        }
    }
}

/// What to do with the rest of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// A whole period behind: start the next frame right away
    Skip,
    Sleep(Duration),
}

/// Drift-correcting frame pacer.
///
/// `acc` holds the lead (positive) or lag (negative) in milliseconds,
/// clamped to one frame period either way so a long stall is not made up
/// by a burst of short frames.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePacer {
    target_ms: f32,
    acc: f32,
}

impl FramePacer {
    pub fn new(target_ms: f32) -> Self {
        // Zero lead or lag after the first frame
        Self {
            target_ms,
            acc: -target_ms,
        }
    }

    pub fn target_ms(&self) -> f32 {
        self.target_ms
    }

    pub fn set_target_ms(&mut self, target_ms: f32) {
        self.target_ms = target_ms;
        self.acc = self.acc.clamp(-target_ms, target_ms);
    }

    /// Accumulated drift in milliseconds
    pub fn drift(&self) -> f32 {
        self.acc
    }

    /// Record a frame that took `dt` seconds and decide how long to sleep
    pub fn record(&mut self, dt: f32) -> Pace {
        self.acc += self.target_ms - dt * 1000.0;
        if self.acc <= -self.target_ms {
            self.acc = -self.target_ms;
            return Pace::Skip;
        }
        if self.acc > self.target_ms {
            self.acc = self.target_ms;
        }
        Pace::Sleep(Duration::from_millis(
            (self.target_ms + self.acc).round() as u64,
        ))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// State shared between controllers and the loop thread
struct Shared {
    state: Mutex<GameState>,
    commands: Mutex<VecDeque<Command>>,
    sink: Mutex<Box<dyn FrameSink>>,
    paused: Mutex<bool>,
    resumed: Condvar,
    report: Mutex<Option<GameOverReport>>,
    finished: Condvar,
    stop: AtomicBool,
    running: AtomicBool,
    show_fps: AtomicBool,
    /// Frame rate as `f32` bits
    frame_rate: AtomicU32,
}

impl Shared {
    fn frame_period_ms(&self) -> f32 {
        1000.0 / f32::from_bits(self.frame_rate.load(Ordering::Relaxed))
    }

    /// Apply every queued command; steering and spin become the frame's input
    fn drain_commands(&self, state: &mut GameState) -> TickInput {
        let mut input = TickInput::default();
        let commands: Vec<Command> = lock(&self.commands).drain(..).collect();
        for command in commands {
            log::debug!("Applying {command:?}");
            match command {
                Command::Steer(heading) => input.heading = Some(heading),
                Command::Spin(spin) => input.spin = Some(spin),
                Command::AddEnemy(config) => {
                    state.add_enemy(&config);
                }
                Command::RemoveEnemy(n) => {
                    if state.remove_enemy(n).is_none() {
                        log::warn!("No enemy type {n} to remove");
                    }
                }
                Command::SetWorldSize(size) => state.set_world_size(size),
                Command::Reset => state.init(),
            }
        }
        input
    }

    /// Block while paused. Returns true if the loop actually waited.
    fn wait_while_paused(&self) -> bool {
        let paused = lock(&self.paused);
        if !*paused {
            return false;
        }
        log::info!("Game loop paused");
        let _guard = self
            .resumed
            .wait_while(paused, |paused| *paused)
            .unwrap_or_else(PoisonError::into_inner);
        log::info!("Game loop resumed");
        true
    }
}

/// Handle to the game loop
pub struct Game {
    shared: Arc<Shared>,
    thread: Mutex<Option<JoinHandle<()>>>,
}

impl Game {
    /// Build a game that presents frames into an in-memory mesh
    pub fn new(settings: &Settings) -> Result<Self, ConfigError> {
        Self::with_sink(settings, Box::new(MeshSurface::new(settings.background)))
    }

    pub fn with_sink(settings: &Settings, sink: Box<dyn FrameSink>) -> Result<Self, ConfigError> {
        settings.validate()?;
        let state = GameState::new(settings);
        log::info!("Game created with seed {}", state.seed);

        Ok(Self {
            shared: Arc::new(Shared {
                state: Mutex::new(state),
                commands: Mutex::new(VecDeque::new()),
                sink: Mutex::new(sink),
                paused: Mutex::new(false),
                resumed: Condvar::new(),
                report: Mutex::new(None),
                finished: Condvar::new(),
                stop: AtomicBool::new(false),
                running: AtomicBool::new(false),
                show_fps: AtomicBool::new(settings.show_fps),
                frame_rate: AtomicU32::new(settings.frame_rate.to_bits()),
            }),
            thread: Mutex::new(None),
        })
    }

    /// Start the loop thread.
    ///
    /// Does nothing and returns false if the loop is already running or the
    /// last run's report has not been acknowledged.
    pub fn start(&self) -> bool {
        if self.is_running() {
            return false;
        }
        if lock(&self.shared.report).is_some() {
            log::debug!("Start ignored: game over not acknowledged");
            return false;
        }

        let mut thread = lock(&self.thread);
        if let Some(handle) = thread.take() {
            let _ = handle.join();
        }

        self.shared.stop.store(false, Ordering::SeqCst);
        *lock(&self.shared.paused) = false;
        self.shared.running.store(true, Ordering::SeqCst);

        let shared = Arc::clone(&self.shared);
        match thread::Builder::new()
            .name("game-loop".to_string())
            .spawn(move || run(shared))
        {
            Ok(handle) => {
                *thread = Some(handle);
                true
            }
            Err(err) => {
                log::error!("Failed to spawn game loop: {err}");
                self.shared.running.store(false, Ordering::SeqCst);
                false
            }
        }
    }

    /// Ask the loop to finish its current frame and end the run
    pub fn stop(&self) {
        self.shared.stop.store(true, Ordering::SeqCst);
        // A paused loop has to wake up to see the request
        let mut paused = lock(&self.shared.paused);
        *paused = false;
        self.shared.resumed.notify_all();
    }

    /// Pause at the next frame boundary
    pub fn pause(&self) {
        if self.is_running() {
            *lock(&self.shared.paused) = true;
        }
    }

    pub fn resume(&self) {
        let mut paused = lock(&self.shared.paused);
        if *paused {
            *paused = false;
            self.shared.resumed.notify_all();
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    pub fn is_paused(&self) -> bool {
        *lock(&self.shared.paused)
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        if self.is_running() {
            if self.is_paused() {
                SchedulerState::Paused
            } else {
                SchedulerState::Running
            }
        } else if lock(&self.shared.report).is_some() {
            SchedulerState::GameOver
        } else {
            SchedulerState::Stopped
        }
    }

    /// Put the world back in its starting state
    pub fn reset(&self) {
        self.submit(Command::Reset);
    }

    pub fn frame_rate(&self) -> f32 {
        f32::from_bits(self.shared.frame_rate.load(Ordering::Relaxed))
    }

    /// Change the target frame rate, taking effect from the next frame
    pub fn set_frame_rate(&self, frame_rate: f32) -> Result<(), ConfigError> {
        if !(frame_rate > 0.0) || !frame_rate.is_finite() {
            return Err(ConfigError::InvalidFrameRate(frame_rate));
        }
        self.shared
            .frame_rate
            .store(frame_rate.to_bits(), Ordering::Relaxed);
        Ok(())
    }

    pub fn set_show_fps(&self, show: bool) {
        self.shared.show_fps.store(show, Ordering::Relaxed);
    }

    pub fn world_size(&self) -> WorldSize {
        self.with_world(|state| state.world_size())
    }

    pub fn set_world_size(&self, size: WorldSize) -> Result<(), ConfigError> {
        size.validate()?;
        self.submit(Command::SetWorldSize(size));
        Ok(())
    }

    pub fn add_enemy(&self, config: EnemyConfig) -> Result<(), ConfigError> {
        config.validate("new enemy")?;
        self.submit(Command::AddEnemy(config));
        Ok(())
    }

    pub fn remove_enemy(&self, n: usize) {
        self.submit(Command::RemoveEnemy(n));
    }

    /// Steer the snake. Also starts a stopped game and resumes a paused one.
    pub fn steer(&self, heading: Heading) {
        self.submit(Command::Steer(heading));
        if !self.is_running() {
            self.start();
        } else if self.is_paused() {
            self.resume();
        }
    }

    pub fn set_spin(&self, spin: bool) {
        self.submit(Command::Spin(spin));
    }

    /// Inspect the world between frames
    pub fn with_world<R>(&self, f: impl FnOnce(&GameState) -> R) -> R {
        f(&lock(&self.shared.state))
    }

    /// Report of the last run, if it has not been acknowledged yet
    pub fn game_over_report(&self) -> Option<GameOverReport> {
        lock(&self.shared.report).clone()
    }

    /// Wait up to `timeout` for the loop to end, returning its report
    pub fn wait_game_over(&self, timeout: Duration) -> Option<GameOverReport> {
        let report = lock(&self.shared.report);
        let (report, _) = self
            .shared
            .finished
            .wait_timeout_while(report, timeout, |report| report.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        report.clone()
    }

    /// Take the report of the finished run and reset the world for a new one
    pub fn acknowledge_game_over(&self) -> Option<GameOverReport> {
        let report = lock(&self.shared.report).take()?;
        if let Some(handle) = lock(&self.thread).take() {
            let _ = handle.join();
        }
        lock(&self.shared.commands).clear();
        lock(&self.shared.state).init();
        Some(report)
    }

    /// Queue a command. A stopped loop will not drain the queue, so the
    /// command is applied right away instead.
    fn submit(&self, command: Command) {
        lock(&self.shared.commands).push_back(command);
        if self.is_running() {
            return;
        }
        let mut state = lock(&self.shared.state);
        let input = self.shared.drain_commands(&mut state);
        if let Some(heading) = input.heading {
            state.steer(heading);
        }
        if let Some(spin) = input.spin {
            state.set_spin(spin);
        }
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = lock(&self.thread).take() {
            let _ = handle.join();
        }
    }
}

/// Body of the loop thread
fn run(shared: Arc<Shared>) {
    log::info!("Game loop started at {} fps", 1000.0 / shared.frame_period_ms());

    let mut pacer = FramePacer::new(shared.frame_period_ms());
    let mut fps = FpsCounter::default();
    let mut frame = 0u64;
    let mut prev = Instant::now();

    while !shared.stop.load(Ordering::SeqCst) {
        let now = Instant::now();
        let dt = now.duration_since(prev).as_secs_f32();
        prev = now;

        {
            let mut state = lock(&shared.state);
            let input = shared.drain_commands(&mut state);
            tick(&mut state, &input, dt);
            fps.update(dt);
            frame += 1;

            let stats = FrameStats {
                frame,
                dt,
                fps: shared
                    .show_fps
                    .load(Ordering::Relaxed)
                    .then(|| fps.fps()),
                score: state.score(),
                message: state.outcome().map(ToString::to_string),
            };
            lock(&shared.sink).present(&state, &stats);

            // A terminal collision ends the run after this frame
            if state.is_over() {
                shared.stop.store(true, Ordering::SeqCst);
            }
        }

        pacer.set_target_ms(shared.frame_period_ms());
        let pace = pacer.record(dt);

        if shared.wait_while_paused() {
            // Time spent paused does not count toward the next frame
            prev = Instant::now();
            continue;
        }
        if let Pace::Sleep(duration) = pace {
            thread::sleep(duration);
        }
    }

    let report = {
        let state = lock(&shared.state);
        GameOverReport {
            score: state.score(),
            reason: state.outcome().cloned(),
            frames: frame,
        }
    };
    log::info!(
        "Game loop stopped after {} frames: {} (score {})",
        report.frames,
        report.message(),
        report.score
    );

    let mut slot = lock(&shared.report);
    *slot = Some(report);
    shared.running.store(false, Ordering::SeqCst);
    drop(slot);
    shared.finished.notify_all();
}
