//! Interpreter error types.
//!
//! Every variant except the async timeout (which is not an error at all, see
//! [`crate::script::pending`]) halts the running program.  Executors check
//! their preconditions before touching devices or the variable store, so a
//! failing instruction never leaves a partial effect behind.

use thiserror::Error;

use crate::script::value::Value;

pub type InterpResult<T> = Result<T, InterpError>;

/// Failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("empty expression")]
    EmptyExpression,

    /// A `(` without a closing `)`, or a stray `)`.
    #[error("unbalanced parentheses in {0}")]
    UnbalancedParens(String),

    #[error("unknown token `{0}`")]
    UnknownToken(String),

    #[error("{op} expects {expected} argument(s), got {found}")]
    Arity {
        op: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{op} expects {expected}, got {found}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: Value,
    },

    #[error("{0} by zero")]
    DivisionByZero(&'static str),

    #[error("integer overflow in {0}")]
    Overflow(&'static str),

    /// The variable exists but its asynchronous read never produced a value.
    #[error("variable `{0}` has no value yet")]
    NoValue(String),
}

/// Failure talking to the capability table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("unknown device `{0}`")]
    UnknownDevice(String),

    #[error("{0} cannot be used while no device connection is active")]
    NotConnected(String),

    #[error("device `{0}` is not attached to the current connection")]
    NotAttached(String),

    /// The capability dropped its completion handle without answering.
    #[error("read from `{0}` was abandoned by the device")]
    Abandoned(String),
}

/// Any condition that stops a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InterpError {
    #[error("program could not be split into lines: source must end with `;` or `:`")]
    MalformedProgram,

    #[error("you must load a program before running")]
    NotLoaded,

    #[error("line {line}: empty instruction")]
    EmptyInstruction { line: usize },

    #[error("line {line}: unknown instruction `{keyword}`")]
    UnknownInstruction { line: usize, keyword: String },

    #[error("line {line}: invalid {keyword} instruction: {reason}")]
    InvalidInstruction {
        line: usize,
        keyword: String,
        reason: &'static str,
    },

    #[error("line {line}: no matching block for `{keyword}`")]
    UnmatchedBlock { line: usize, keyword: String },

    #[error("line {line}: {source}")]
    Eval {
        line: usize,
        #[source]
        source: EvalError,
    },

    #[error("line {line}: {source}")]
    Device {
        line: usize,
        #[source]
        source: DeviceError,
    },

    #[error("interpreter reached an invalid state: {0}")]
    InvalidState(String),
}

impl InterpError {
    /// Line number (0-based program counter) the error is attributed to, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::EmptyInstruction { line }
            | Self::UnknownInstruction { line, .. }
            | Self::InvalidInstruction { line, .. }
            | Self::UnmatchedBlock { line, .. }
            | Self::Eval { line, .. }
            | Self::Device { line, .. } => Some(*line),
            Self::MalformedProgram | Self::NotLoaded | Self::InvalidState(_) => None,
        }
    }

    /// Alert text shown when this error ends a run.
    pub fn exit_message(&self) -> String {
        format!("Program exited with error:\n{self}")
    }
}
