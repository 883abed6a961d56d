//! The Schwing control language.
//!
//! A program is a flat list of `;`-terminated instructions that drive
//! binary devices:
//!
//! ```text
//! Set X 0;
//! While-start (Less X 5);
//!   Tog Led; Delay 250;
//!   Set X (Add X 1);
//! While-end;
//! ```
//!
//! There is no parse tree.  Lines are tokenized when the program counter
//! reaches them, expressions are evaluated straight from the token list, and
//! `If`/`While` blocks are matched by scanning the instruction list.
//!
//! # Quick start
//!
//! ```rust
//! use schwing::script::{Session, Tick, Value};
//!
//! let mut session = Session::new();
//! session.load("Set X 6; Set X (Mul X 7);").unwrap();
//! session.run().unwrap();
//! while session.tick() == Tick::Continue {}
//! assert_eq!(session.vars().get("X"), Some(Value::Int(42)));
//! ```

pub mod control;
pub mod expr;
pub mod interp;
pub mod lexer;
pub mod pending;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use expr::EvalContext;
pub use interp::{HostAction, Session, Tick};
pub use value::Value;
