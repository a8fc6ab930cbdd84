//! `llgen` reads a three-section specification (tokens, grammar rules and
//! semantic code) and produces a recursive-descent parser as Rust source.

pub mod driver;
pub mod emit;
pub mod flags;
mod semantics;
pub mod source;

pub use driver::{Compiler, Output, Summary};
pub use flags::{FlagError, Flags, Value};
pub use source::{Source, SourceQueue};
