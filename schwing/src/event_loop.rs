//! Host event loop.
//!
//! Drives a [`Session`] from a single tokio task:
//!
//! ```text
//!   ┌──────────────────────────┐
//!   │  EventLoop::run()        │
//!   │  tokio::select! over:    │
//!   │  • tick interval         │──► Session::tick, then drain HostActions
//!   │  • control channel       │◄── key reader thread / other controllers
//!   │  • SIGTERM / SIGINT      │
//!   └──────────────────────────┘
//! ```
//!
//! `Delay` timers are spawned as separate tasks that finish the session's
//! completion handle; the session sees the result on a later tick.

use std::io;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use crate::device::Level;
use crate::error::InterpError;
use crate::script::interp::{HostAction, Session, Tick};

/// Requests accepted while a program runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunCommand {
    Pause,
    Resume,
    Stop,
    /// Flip the simulated bumper level.
    ToggleBumper,
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Finished,
    Stopped,
    Halted(InterpError),
}

/// Where alerts and program log lines go.
pub trait Notifier {
    fn alert(&mut self, message: &str);

    fn log(&mut self, message: &str) {
        tracing::info!(target: "schwing::program", "{message}");
    }
}

// ── EventLoop ─────────────────────────────────────────────────────────────────

pub struct EventLoop<N: Notifier> {
    pub session: Session,
    notifier: N,
    tick: Duration,
    bumper: Option<Level>,
    timeouts: usize,
    cmd_tx: mpsc::Sender<RunCommand>,
    cmd_rx: mpsc::Receiver<RunCommand>,
}

impl<N: Notifier> EventLoop<N> {
    pub fn new(session: Session, notifier: N, tick: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        EventLoop { session, notifier, tick, bumper: None, timeouts: 0, cmd_tx, cmd_rx }
    }

    /// Level flipped by [`RunCommand::ToggleBumper`].
    pub fn with_bumper(mut self, level: Level) -> Self {
        self.bumper = Some(level);
        self
    }

    /// A handle for sending [`RunCommand`]s into the loop.
    pub fn controller(&self) -> mpsc::Sender<RunCommand> {
        self.cmd_tx.clone()
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Reads that gave up waiting during the last run.
    pub fn timeouts(&self) -> usize {
        self.timeouts
    }

    // ── Main loop ─────────────────────────────────────────────────────────

    /// Start the loaded program and tick it until it ends.
    pub async fn run(&mut self) -> io::Result<RunOutcome> {
        if let Err(e) = self.session.run() {
            self.notifier.alert(&e.exit_message());
            return Ok(RunOutcome::Halted(e));
        }
        self.timeouts = 0;

        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;

        let mut ticker = tokio::time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let tick = self.session.tick();
                    self.drain_actions();
                    match tick {
                        Tick::Continue => {}
                        Tick::Finished => return Ok(RunOutcome::Finished),
                        Tick::Stopped => return Ok(RunOutcome::Stopped),
                        Tick::Halted(e) => return Ok(RunOutcome::Halted(e)),
                    }
                }

                Some(cmd) = self.cmd_rx.recv() => self.handle_command(cmd),

                _ = sigterm.recv() => self.session.stop(),
                _ = sigint.recv() => self.session.stop(),
            }
        }
    }

    fn handle_command(&mut self, cmd: RunCommand) {
        tracing::debug!(?cmd, "run command");
        match cmd {
            RunCommand::Pause => self.session.pause(),
            RunCommand::Resume => self.session.resume(),
            RunCommand::Stop => self.session.stop(),
            RunCommand::ToggleBumper => match &self.bumper {
                Some(level) => {
                    let high = level.toggle();
                    tracing::info!(bumper = high, "bumper toggled");
                }
                None => tracing::debug!("no bumper attached"),
            },
        }
    }

    fn drain_actions(&mut self) {
        for action in self.session.take_actions() {
            match action {
                HostAction::Alert(message) => self.notifier.alert(&message),
                HostAction::Log(message) => self.notifier.log(&message),
                HostAction::StartTimer { duration, done } => {
                    tokio::spawn(async move {
                        tokio::time::sleep(duration).await;
                        done.finish();
                    });
                }
                HostAction::Timeout { .. } => self.timeouts += 1,
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
