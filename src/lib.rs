//! Compiler for Tack, a statically typed, stack-oriented language that
//! targets the QBE intermediate representation.
//!
//! The pipeline is linear: source text is tokenized on demand, parsed with
//! interleaved stack type-checking into a per-function AST, and lowered to
//! textual QBE SSA. The driver hands the SSA text to `qbe`, `as` and `cc`
//! for the remaining stages.

#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod args;
pub mod compiler;
pub mod error;
