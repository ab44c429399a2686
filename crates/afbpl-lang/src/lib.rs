//! АФБПЛ-1 — an interpreter for a small, indentation-structured teaching
//! language (start/end markers, output, input, single-comparison
//! conditionals, declarations with type inference, labels and jumps).
//!
//! The engine is an owned, resumable value:
//!
//! 1. [`load`] (or [`Interpreter::new`] + [`Interpreter::init`]) validates
//!    the program and positions the cursor on `начало`.
//! 2. [`Interpreter::resume`] drives execution until the program completes,
//!    fails, or suspends on a `вход` instruction.
//! 3. On [`Step::AwaitingInput`], the caller feeds one line of user text
//!    through [`Interpreter::provide_input`], which stores the typed value
//!    and keeps executing.
//!
//! While interpreting, the engine annotates the source ([`SourceCode`]) with
//! highlight and error spans; rendering the decorated view is a separate,
//! read-only stage.

pub mod error;
pub mod runtime;
pub mod source;
pub mod syntax;

pub use error::{Error, ErrorCode};
pub use runtime::interpreter::{Interpreter, Step};
pub use runtime::value::Value;
pub use source::{Annotation, Category, SourceCode};

/// Build an engine over raw source text and validate it.
pub fn load(raw_source: &str) -> Result<Interpreter, Error> {
    let mut engine = Interpreter::new(raw_source);
    engine.init()?;
    Ok(engine)
}
