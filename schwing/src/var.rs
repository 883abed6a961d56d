//! Program variable store.
//!
//! Variables are untyped names bound to an integer or a boolean.  A binding
//! made by `Setasync` before its read completes holds no value; the name is
//! still a variable, but reading it is an evaluation error.

use std::collections::HashMap;

use crate::script::expr::EvalContext;
use crate::script::value::Value;

#[derive(Debug, Default)]
pub struct VarStore {
    vars: HashMap<String, Option<Value>>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind (or rebind) a variable.  `None` records "no value yet".
    pub fn set(&mut self, name: impl Into<String>, value: Option<Value>) {
        self.vars.insert(name.into(), value);
    }

    /// Value of a variable, if it is bound and holds one.
    pub fn get(&self, name: &str) -> Option<Value> {
        self.vars.get(name).copied().flatten()
    }

    pub fn get_int(&self, name: &str) -> Option<i64> {
        self.get(name)?.as_int()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EvalContext for VarStore {
    fn get_var(&self, name: &str) -> Option<Option<Value>> {
        self.vars.get(name).copied()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
