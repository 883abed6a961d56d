//! Instruction decoding.
//!
//! An instruction is a token list whose first token picks the family:
//!
//! | Family | Forms |
//! |--------|-------|
//! | control | `While-start <cond>` `While-end` `If-start <cond>` `Else-start` `If-end` |
//! | output | `On <device>` `Off <device>` `Tog <device>` |
//! | assign | `Set <var> <expr>` `Setasync <var> <input>` |
//! | info | `Alert <expr>` `Log <expr>` |
//! | delay | `Delay <expr>` |
//!
//! Decoding only checks shape and device names; expressions are evaluated
//! by the session when the instruction executes.

use crate::device::{InputName, OutputName};
use crate::error::{DeviceError, InterpError, InterpResult};
use super::control::Block;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputAction {
    On,
    Off,
    Toggle,
}

impl OutputAction {
    pub fn keyword(self) -> &'static str {
        match self {
            OutputAction::On => "On",
            OutputAction::Off => "Off",
            OutputAction::Toggle => "Tog",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoKind {
    Alert,
    Log,
}

/// A decoded instruction, borrowing its operands from the token list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// `cond` is empty for blocks that take no condition.
    Control { block: Block, cond: &'a [String] },
    Output { action: OutputAction, device: OutputName },
    Set { var: &'a str, expr: &'a [String] },
    SetAsync { var: &'a str, input: InputName },
    Info { kind: InfoKind, expr: &'a [String] },
    Delay { expr: &'a [String] },
}

/// Decode the tokens of the instruction at `line`.
pub fn parse_instruction(tokens: &[String], line: usize) -> InterpResult<Instruction<'_>> {
    let Some((head, rest)) = tokens.split_first() else {
        return Err(InterpError::EmptyInstruction { line });
    };
    let keyword = head.as_str();
    let invalid = |reason| InterpError::InvalidInstruction {
        line,
        keyword: keyword.to_owned(),
        reason,
    };

    if let Some(block) = Block::from_keyword(keyword) {
        return Ok(Instruction::Control { block, cond: rest });
    }

    let output = match keyword {
        "On" => Some(OutputAction::On),
        "Off" => Some(OutputAction::Off),
        "Tog" => Some(OutputAction::Toggle),
        _ => None,
    };
    if let Some(action) = output {
        let name = rest.first().ok_or_else(|| invalid("missing device name"))?;
        let device = name.parse::<OutputName>().map_err(|()| InterpError::Device {
            line,
            source: DeviceError::UnknownDevice(name.clone()),
        })?;
        return Ok(Instruction::Output { action, device });
    }

    match keyword {
        "Set" => {
            let (var, expr) = rest.split_first().ok_or_else(|| invalid("missing variable name"))?;
            Ok(Instruction::Set { var, expr })
        }
        "Setasync" => {
            let var = rest.first().ok_or_else(|| invalid("missing variable name"))?;
            let name = rest.get(1).ok_or_else(|| invalid("missing input device"))?;
            let input = name.parse::<InputName>().map_err(|()| InterpError::Device {
                line,
                source: DeviceError::UnknownDevice(name.clone()),
            })?;
            Ok(Instruction::SetAsync { var, input })
        }
        "Alert" => Ok(Instruction::Info { kind: InfoKind::Alert, expr: rest }),
        "Log" => Ok(Instruction::Info { kind: InfoKind::Log, expr: rest }),
        "Delay" => Ok(Instruction::Delay { expr: rest }),
        _ => Err(InterpError::UnknownInstruction { line, keyword: keyword.to_owned() }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
