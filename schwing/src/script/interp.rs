//! Tick-driven program session.
//!
//! A [`Session`] owns everything a running program touches: the instruction
//! lines, the jump table, the program counter, the variable store, the async
//! coordinator and the connected devices.  The host calls [`Session::tick`]
//! on a timer; each tick executes at most one instruction (or re-polls the
//! one waiting on an asynchronous result) and never blocks.
//!
//! Side effects the session cannot perform itself are queued as
//! [`HostAction`]s and drained by the host with [`Session::take_actions`].

use std::time::Duration;

use crate::device::{DeviceTable, InputName, OutputName};
use crate::error::{DeviceError, EvalError, InterpError, InterpResult};
use crate::var::VarStore;
use super::{
    control::{Block, JumpTable},
    expr::evaluate,
    lexer::{split_program, tokenize},
    pending::{Abandoned, AsyncState, Completion, Pending, Poll, DEFAULT_ASYNC_LIMIT},
    stmt::{parse_instruction, InfoKind, Instruction, OutputAction},
    value::Value,
};

// ── HostAction ────────────────────────────────────────────────────────────────

/// A side effect queued for the host.
#[derive(Debug)]
pub enum HostAction {
    /// User-facing notification (`Alert`, and the message of a halting error).
    Alert(String),
    /// Program log line (`Log`).
    Log(String),
    /// Start a timer and call [`Completion::finish`] when it fires.
    StartTimer { duration: Duration, done: Completion },
    /// A read gave up waiting.  The program keeps running.
    Timeout { line: usize, device: InputName },
}

/// Outcome of one [`Session::tick`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tick {
    /// Still running; tick again.
    Continue,
    /// The last instruction has executed.
    Finished,
    /// Nothing is running.
    Stopped,
    /// The program stopped on an error.
    Halted(InterpError),
}

// ── Session ───────────────────────────────────────────────────────────────────

pub struct Session {
    program: Vec<String>,
    jumps: JumpTable,
    /// `None` before the first instruction.
    pc: Option<usize>,
    vars: VarStore,
    running: bool,
    paused: bool,
    pending: Pending,
    devices: Option<DeviceTable>,
    actions: Vec<HostAction>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Session {
            program: Vec::new(),
            jumps: JumpTable::default(),
            pc: None,
            vars: VarStore::new(),
            running: false,
            paused: false,
            pending: Pending::new(DEFAULT_ASYNC_LIMIT),
            devices: None,
            actions: Vec::new(),
        }
    }

    pub fn with_async_limit(mut self, limit: u32) -> Self {
        self.pending.set_limit(limit);
        self
    }

    // ── Program lifecycle ─────────────────────────────────────────────────

    /// Replace the program.  A malformed source leaves the previous program
    /// in place; either way the session is reinitialised.
    pub fn load(&mut self, source: &str) -> InterpResult<()> {
        let result = split_program(source).map(|lines| {
            tracing::info!(lines = lines.len(), "program loaded");
            self.jumps = JumpTable::build(&lines);
            self.program = lines;
        });
        if let Err(e) = &result {
            tracing::warn!("load failed: {e}");
        }
        self.init();
        result
    }

    /// Reset execution state and start from the first instruction.
    pub fn run(&mut self) -> InterpResult<()> {
        if self.program.is_empty() {
            return Err(InterpError::NotLoaded);
        }
        self.init();
        self.running = true;
        tracing::info!(lines = self.program.len(), "run started");
        Ok(())
    }

    /// Back to the pre-start state.  Outstanding reads and timers are
    /// abandoned.
    pub fn init(&mut self) {
        self.pc = None;
        self.vars.clear();
        self.running = false;
        self.paused = false;
        self.pending.reset();
        self.actions
            .retain(|a| !matches!(a, HostAction::StartTimer { .. }));
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Takes effect at the next tick.
    pub fn stop(&mut self) {
        if self.running {
            tracing::info!("run stopped");
        }
        self.running = false;
    }

    // ── Devices ───────────────────────────────────────────────────────────

    pub fn connect(&mut self, devices: DeviceTable) {
        tracing::debug!(?devices, "connected");
        self.devices = Some(devices);
    }

    pub fn disconnect(&mut self) -> Option<DeviceTable> {
        self.devices.take()
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn take_actions(&mut self) -> Vec<HostAction> {
        std::mem::take(&mut self.actions)
    }

    pub fn program(&self) -> &[String] {
        &self.program
    }

    pub fn pc(&self) -> Option<usize> {
        self.pc
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn async_state(&self) -> AsyncState {
        self.pending.state()
    }

    // ── Execution ─────────────────────────────────────────────────────────

    /// Execute (or re-poll) one instruction.
    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Stopped;
        }
        if self.paused {
            return Tick::Continue;
        }

        let pc = if self.pending.is_outstanding() {
            match self.pc {
                Some(pc) => pc,
                None => {
                    return self.halt(InterpError::InvalidState(
                        "asynchronous request outstanding before the first instruction".into(),
                    ))
                }
            }
        } else {
            let next = self.pc.map_or(0, |pc| pc + 1);
            if next < self.program.len() {
                self.pc = Some(next);
                next
            } else if self.pc.is_some() && next == self.program.len() {
                self.running = false;
                tracing::info!("program finished");
                return Tick::Finished;
            } else {
                return self.halt(InterpError::InvalidState(format!(
                    "program counter {:?} outside a {}-line program",
                    self.pc,
                    self.program.len()
                )));
            }
        };

        match self.exec(pc) {
            Ok(()) => Tick::Continue,
            Err(e) => self.halt(e),
        }
    }

    fn halt(&mut self, err: InterpError) -> Tick {
        self.running = false;
        tracing::error!(line = ?err.line(), "program halted: {err}");
        self.actions
            .push(HostAction::Alert(err.exit_message()));
        Tick::Halted(err)
    }

    fn exec(&mut self, pc: usize) -> InterpResult<()> {
        let tokens = tokenize(&self.program[pc]);
        tracing::trace!(pc, line = %self.program[pc], "exec");

        match parse_instruction(&tokens, pc)? {
            Instruction::Control { block, cond } => self.exec_control(pc, block, cond),
            Instruction::Output { action, device } => self.exec_output(pc, action, device),
            Instruction::Set { var, expr } => {
                let value = self.eval(pc, expr)?;
                self.vars.set(var, Some(value));
                Ok(())
            }
            Instruction::SetAsync { var, input } => self.exec_read(pc, var, input),
            Instruction::Info { kind, expr } => {
                let text = self.eval(pc, expr)?.to_string();
                self.actions.push(match kind {
                    InfoKind::Alert => HostAction::Alert(text),
                    InfoKind::Log => HostAction::Log(text),
                });
                Ok(())
            }
            Instruction::Delay { expr } => self.exec_delay(pc, expr),
        }
    }

    fn eval(&self, pc: usize, expr: &[String]) -> InterpResult<Value> {
        evaluate(expr, &self.vars).map_err(|source| InterpError::Eval { line: pc, source })
    }

    fn jump_target(&self, pc: usize, block: Block) -> InterpResult<usize> {
        self.jumps.target(pc).ok_or_else(|| InterpError::UnmatchedBlock {
            line: pc,
            keyword: block.keyword().to_owned(),
        })
    }

    fn exec_control(&mut self, pc: usize, block: Block, cond: &[String]) -> InterpResult<()> {
        match block {
            Block::WhileStart | Block::IfStart => {
                let taken = match evaluate(cond, &self.vars) {
                    Ok(value) => value.is_true(),
                    // A read that timed out leaves its variable without a value.
                    Err(EvalError::NoValue(_)) => false,
                    Err(source) => return Err(InterpError::Eval { line: pc, source }),
                };
                if !taken {
                    self.pc = Some(self.jump_target(pc, block)?);
                }
            }
            // Land one line before the header so the next tick re-tests it.
            Block::WhileEnd => self.pc = self.jump_target(pc, block)?.checked_sub(1),
            Block::ElseStart => self.pc = Some(self.jump_target(pc, block)?),
            Block::IfEnd => {}
        }
        Ok(())
    }

    fn exec_output(&mut self, pc: usize, action: OutputAction, name: OutputName) -> InterpResult<()> {
        let device_err = |source| InterpError::Device { line: pc, source };
        let devices = self
            .devices
            .as_mut()
            .ok_or_else(|| device_err(DeviceError::NotConnected(action.keyword().to_owned())))?;
        let dev = devices
            .output_mut(name)
            .ok_or_else(|| device_err(DeviceError::NotAttached(name.to_string())))?;

        tracing::debug!(device = %name, action = action.keyword(), "output");
        match action {
            OutputAction::On => dev.set_on(),
            OutputAction::Off => dev.set_off(),
            OutputAction::Toggle => dev.toggle(),
        }
        Ok(())
    }

    fn exec_read(&mut self, pc: usize, var: &str, name: InputName) -> InterpResult<()> {
        let device_err = |source| InterpError::Device { line: pc, source };
        let devices = self
            .devices
            .as_mut()
            .ok_or_else(|| device_err(DeviceError::NotConnected("Setasync".to_owned())))?;
        let dev = devices
            .input_mut(name)
            .ok_or_else(|| device_err(DeviceError::NotAttached(name.to_string())))?;

        let value = match self.pending.poll(true, |done| dev.read(done)) {
            Ok(Poll::Ready(value)) => value,
            Ok(Poll::Waiting) => None,
            Ok(Poll::TimedOut) => {
                tracing::warn!(line = pc, device = %name, "read timed out");
                self.actions.push(HostAction::Timeout { line: pc, device: name });
                None
            }
            Err(Abandoned) => {
                return Err(device_err(DeviceError::Abandoned(name.to_string())));
            }
        };
        self.vars.set(var, value);
        Ok(())
    }

    fn exec_delay(&mut self, pc: usize, expr: &[String]) -> InterpResult<()> {
        let value = self.eval(pc, expr)?;
        let ms = value
            .as_int()
            .and_then(|n| u64::try_from(n).ok())
            .ok_or(InterpError::Eval {
                line: pc,
                source: EvalError::TypeMismatch {
                    op: "Delay",
                    expected: "a non-negative integer",
                    found: value,
                },
            })?;
        let duration = Duration::from_millis(ms);

        let actions = &mut self.actions;
        match self
            .pending
            .poll(false, |done| actions.push(HostAction::StartTimer { duration, done }))
        {
            Ok(_) => Ok(()),
            Err(Abandoned) => Err(InterpError::InvalidState(format!(
                "line {pc}: delay timer dropped without firing"
            ))),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
