//! Shared error utilities used across the compilation pipeline.
//!
//! Every failure the compiler can detect is a variant here. Diagnostics are
//! single-line on purpose: the driver prints the `Display` form to stderr
//! and exits, so each variant carries exactly what its message needs.

use snafu::Snafu;

pub type CompileResult<T> = Result<T, CompileError>;

/// First error wins: no variant is ever recovered from or aggregated.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum CompileError {
  /// A character the tokenizer has no rule for.
  #[snafu(display("Invalid token: '{ch}' on line {line}"))]
  InvalidCharacter { ch: char, line: u32 },

  /// The parser needed something that was not there. `line` is the line of
  /// the token *before* the failure, i.e. where the missing element was due.
  #[snafu(display("[Parse error] Expected {what} on line {line}"))]
  UnexpectedToken { what: String, line: u32 },

  /// An identifier referenced without an enclosing `let`.
  #[snafu(display("Undeclared identifier: {name}"))]
  UndeclaredIdentifier { name: String },

  /// A `let` re-using a name already declared in the same scope.
  #[snafu(display("Identifier already used: {name}"))]
  DuplicateIdentifier { name: String },

  /// Syntax the parser accepts but the generator cannot lower yet.
  #[snafu(display("not implemented: {what}"))]
  NotImplemented { what: String },

  /// The AST arena budget ran out mid-parse.
  #[snafu(display(
    "AST arena exhausted: requested {requested} bytes with {remaining} remaining"
  ))]
  AllocationExhausted { requested: usize, remaining: usize },
}
