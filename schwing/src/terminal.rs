//! Terminal handling for the interactive host: raw mode, single-key
//! controls, and the alert sink.

use std::io::{self, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::{cursor, terminal};
use tokio::sync::mpsc;

use crate::event_loop::{Notifier, RunCommand};

/// `true` when both stdin and stdout are terminals.
pub fn is_interactive() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 && libc::isatty(libc::STDOUT_FILENO) != 0 }
}

// ── Key controls ──────────────────────────────────────────────────────────────

/// Map a key press to a run command.
///
/// | Key | Command |
/// |-----|---------|
/// | `p` | pause |
/// | `r` | resume |
/// | `b` | toggle the simulated bumper |
/// | `q`, `Ctrl-C` | stop |
pub fn key_command(key: KeyEvent) -> Option<RunCommand> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(RunCommand::Stop),
        KeyCode::Char('p') => Some(RunCommand::Pause),
        KeyCode::Char('r') => Some(RunCommand::Resume),
        KeyCode::Char('b') => Some(RunCommand::ToggleBumper),
        KeyCode::Char('q') | KeyCode::Esc => Some(RunCommand::Stop),
        _ => None,
    }
}

/// Read keys on a dedicated thread and forward the mapped commands.
///
/// The thread owns the terminal's input so no keystrokes are split between
/// readers; it exits when the receiver is dropped or input fails.
pub fn spawn_key_reader(tx: mpsc::Sender<RunCommand>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if let Some(cmd) = key_command(key) {
                    if tx.blocking_send(cmd).is_err() {
                        break;
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("key reader stopped: {e}");
                break;
            }
        }
    });
}

// ── RawModeGuard ──────────────────────────────────────────────────────────────

/// RAII guard: disables raw mode when dropped.
pub struct RawModeGuard(());

pub fn enter_raw_mode() -> io::Result<RawModeGuard> {
    terminal::enable_raw_mode()?;
    Ok(RawModeGuard(()))
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        let _ = crossterm::execute!(io::stdout(), cursor::Show);
        let _ = terminal::disable_raw_mode();
    }
}

// ── Alert sink ────────────────────────────────────────────────────────────────

/// Prints alerts to stdout; program log lines go to `tracing`.
///
/// In raw mode `\n` does not return the carriage, so lines are written with
/// explicit `\r\n`.
pub struct TerminalNotifier<W: Write> {
    out: W,
    raw: bool,
}

impl TerminalNotifier<io::Stdout> {
    pub fn stdout(raw: bool) -> Self {
        TerminalNotifier { out: io::stdout(), raw }
    }
}

impl<W: Write> TerminalNotifier<W> {
    pub fn new(out: W, raw: bool) -> Self {
        TerminalNotifier { out, raw }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Notifier for TerminalNotifier<W> {
    fn alert(&mut self, message: &str) {
        let eol = if self.raw { "\r\n" } else { "\n" };
        for line in message.lines() {
            let _ = write!(self.out, "{line}{eol}");
        }
        let _ = self.out.flush();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
