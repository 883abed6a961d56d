//! Device capability table.
//!
//! The interpreter never talks to hardware directly.  A connection
//! collaborator fills a [`DeviceTable`] with one handle per named device and
//! hands it to the session; the session only calls the capability methods.
//!
//! Device names form closed sets: the language knows exactly the outputs in
//! [`OutputName`] and the inputs in [`InputName`].  Adding a device means
//! adding a variant here and attaching a handle for it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::script::pending::Completion;
use crate::script::value::Value;

// ── Names ─────────────────────────────────────────────────────────────────────

/// Digital outputs addressable by `On` / `Off` / `Tog`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputName {
    Led,
}

/// Digital inputs readable by `Setasync`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputName {
    Bumper,
}

impl OutputName {
    pub const ALL: &'static [OutputName] = &[OutputName::Led];

    pub fn as_str(self) -> &'static str {
        match self {
            OutputName::Led => "Led",
        }
    }
}

impl InputName {
    pub const ALL: &'static [InputName] = &[InputName::Bumper];

    pub fn as_str(self) -> &'static str {
        match self {
            InputName::Bumper => "Bumper",
        }
    }
}

impl FromStr for OutputName {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, ()> {
        OutputName::ALL.iter().copied().find(|d| d.as_str() == s).ok_or(())
    }
}

impl FromStr for InputName {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, ()> {
        InputName::ALL.iter().copied().find(|d| d.as_str() == s).ok_or(())
    }
}

impl fmt::Display for OutputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for InputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Capabilities ──────────────────────────────────────────────────────────────

/// A binary actuator.
pub trait OutputDevice: Send {
    fn set_on(&mut self);
    fn set_off(&mut self);
    fn toggle(&mut self);
}

/// A binary sensor with a single-shot asynchronous read.
///
/// The device answers through `done` whenever it likes, including before
/// `read` returns.
pub trait InputDevice: Send {
    fn read(&mut self, done: Completion);
}

// ── DeviceTable ───────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct DeviceTable {
    outputs: HashMap<OutputName, Box<dyn OutputDevice>>,
    inputs: HashMap<InputName, Box<dyn InputDevice>>,
}

impl DeviceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, name: OutputName, dev: impl OutputDevice + 'static) -> Self {
        self.outputs.insert(name, Box::new(dev));
        self
    }

    pub fn with_input(mut self, name: InputName, dev: impl InputDevice + 'static) -> Self {
        self.inputs.insert(name, Box::new(dev));
        self
    }

    pub fn output_mut(&mut self, name: OutputName) -> Option<&mut (dyn OutputDevice + 'static)> {
        self.outputs.get_mut(&name).map(|d| d.as_mut())
    }

    pub fn input_mut(&mut self, name: InputName) -> Option<&mut (dyn InputDevice + 'static)> {
        self.inputs.get_mut(&name).map(|d| d.as_mut())
    }
}

impl fmt::Debug for DeviceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTable")
            .field("outputs", &self.outputs.keys().collect::<Vec<_>>())
            .field("inputs", &self.inputs.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Simulated devices ─────────────────────────────────────────────────────────

/// A shared digital level, observable from outside the device.
#[derive(Debug, Clone, Default)]
pub struct Level(Arc<AtomicBool>);

impl Level {
    pub fn new(high: bool) -> Self {
        Level(Arc::new(AtomicBool::new(high)))
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set(&self, high: bool) {
        self.0.store(high, Ordering::SeqCst);
    }

    /// Flip the level and return the new value.
    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::SeqCst)
    }
}

/// Output that records its level and logs every change.
#[derive(Debug)]
pub struct SimOutput {
    name: OutputName,
    pin: String,
    level: Level,
}

impl SimOutput {
    pub fn new(name: OutputName, pin: impl Into<String>, level: Level) -> Self {
        SimOutput { name, pin: pin.into(), level }
    }

    fn report(&self) {
        let state = if self.level.get() { "on" } else { "off" };
        tracing::info!(device = %self.name, pin = %self.pin, state, "output changed");
    }
}

impl OutputDevice for SimOutput {
    fn set_on(&mut self) {
        self.level.set(true);
        self.report();
    }

    fn set_off(&mut self) {
        self.level.set(false);
        self.report();
    }

    fn toggle(&mut self) {
        self.level.toggle();
        self.report();
    }
}

/// Input whose level is driven from outside (e.g. a key press).
///
/// With zero latency the read is answered before `read` returns; otherwise
/// the answer comes from a spawned tokio task, so a runtime must be running.
#[derive(Debug)]
pub struct SimInput {
    name: InputName,
    pin: String,
    level: Level,
    latency: Duration,
}

impl SimInput {
    pub fn new(name: InputName, pin: impl Into<String>, level: Level) -> Self {
        SimInput { name, pin: pin.into(), level, latency: Duration::ZERO }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }
}

impl InputDevice for SimInput {
    fn read(&mut self, done: Completion) {
        tracing::debug!(device = %self.name, pin = %self.pin, "read requested");
        let level = self.level.clone();
        if self.latency.is_zero() {
            done.complete(Value::Bool(level.get()));
            return;
        }
        let latency = self.latency;
        tokio::spawn(async move {
            tokio::time::sleep(latency).await;
            done.complete(Value::Bool(level.get()));
        });
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
