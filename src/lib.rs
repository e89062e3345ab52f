//! Crate root: wires together the compilation pipeline.
//!
//! The stages are intentionally small and composable so they can be evolved
//! independently:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` owns all syntactic knowledge and returns the program AST,
//!   arena included.
//! - `codegen` lowers the AST into NASM-flavoured x86-64 assembly.
//! - `arena` and `ast` carry the node storage shared by the later stages.
//! - `error` centralises the diagnostics the other modules raise.

pub mod arena;
pub mod ast;
pub mod error;
pub mod parser;
pub mod tokenizer;

mod codegen;

pub use error::{CompileError, CompileResult};

/// Compile a source string into x86-64 assembly text.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let program = parser::parse(tokens)?;
  codegen::generate(&program)
}
