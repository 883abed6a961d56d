//! Program splitter and line tokenizer.
//!
//! A program is a flat list of instructions terminated by `;` or `:` (the two
//! are interchangeable).  Line breaks carry no meaning and are removed before
//! splitting.  Each instruction is tokenized lazily, when the program counter
//! reaches it.

use crate::error::InterpError;

/// Statement terminators.
pub const TERMINATORS: [char; 2] = [';', ':'];

/// Split program source into raw instruction lines.
///
/// The source must end with a terminator: whatever follows the last one
/// would otherwise be dropped silently, so it is rejected as malformed.
pub fn split_program(source: &str) -> Result<Vec<String>, InterpError> {
    let filtered: String = source.chars().filter(|c| !matches!(c, '\n' | '\r')).collect();

    if !filtered.ends_with(TERMINATORS) {
        return Err(InterpError::MalformedProgram);
    }

    let mut lines: Vec<String> = filtered.split(TERMINATORS).map(str::to_owned).collect();
    // `split` yields an empty tail after the final terminator.
    lines.pop();
    Ok(lines)
}

/// Break one instruction into tokens.
///
/// Tokens are separated by spaces; `(` and `)` are always tokens of their
/// own.  Leading spaces and newlines are skipped.  There is no quoting.
pub fn tokenize(line: &str) -> Vec<String> {
    let line = line.trim_start_matches([' ', '\n']);
    let mut tokens = Vec::new();
    let mut current = String::new();

    for ch in line.chars() {
        match ch {
            ' ' => flush(&mut current, &mut tokens),
            '(' | ')' => {
                flush(&mut current, &mut tokens);
                tokens.push(ch.to_string());
            }
            c => current.push(c),
        }
    }
    flush(&mut current, &mut tokens);
    tokens
}

fn flush(current: &mut String, tokens: &mut Vec<String>) {
    if !current.is_empty() {
        tokens.push(std::mem::take(current));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
