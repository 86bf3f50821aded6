
#![allow(
    clippy::collapsible_if,
    clippy::manual_range_contains,
    clippy::needless_borrows_for_generic_args,
    clippy::new_without_default,
    clippy::question_mark
)]

//! BCH SDK - Script parsing, standard output templates, and verification.
//!
//! Provides the Bitcoin Script type, opcode definitions, script chunk
//! parsing, the standard-template solver, and a verification engine for
//! standard transaction scripts.

pub mod chunk;
pub mod interpreter;
pub mod opcodes;
pub mod script;
pub mod solver;

mod error;
pub use chunk::ScriptChunk;
pub use error::ScriptError;
pub use script::{Script, ScriptId};
pub use solver::{solve, TemplateKind};
