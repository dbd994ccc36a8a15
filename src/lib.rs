//! A compiler from a small probabilistic modeling language to a validated,
//! shape-resolved model graph.
//!
//! A program is a sequence of statements, each on its own line or separated
//! by `;`:
//!
//! ```text
//! y = [1, 0, 1]              # observed data
//! p ~ Beta(2, 2)             # latent random variable
//! y(like y) ~ Bern(p)        # observed random variable with y's shape
//! odds := p / (1 - p)        # deterministic transform
//! ```
//!
//! [`run`] parses and compiles source text into a [`Store`], the symbol table
//! an inference engine builds its joint density from.

pub mod compile;
pub mod data;
pub mod dist;
pub mod error;
pub mod eval;
pub mod ir;
pub mod lang;
pub mod parse;
pub mod report;
pub mod shape;
pub mod store;

pub use compile::{Compiler, Options};
pub use dist::DistKind;
pub use error::CompileError;
pub use ir::{Node, RandomVariable};
pub use lang::{Program, Var};
pub use parse::Parse;
pub use shape::Shape;
pub use store::Store;

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Reads and parses a model file.
pub fn load(path: impl AsRef<Path>) -> Result<Program> {
  let path = path.as_ref();
  let source =
    fs::read_to_string(path).with_context(|| format!("Could not read {}", path.display()))?;
  Program::parse(&source).with_context(|| format!("Could not parse {}", path.display()))
}

pub fn run(source: &str, options: Options) -> Result<Store> {
  let program = Program::parse(source)?;
  Ok(Compiler::new(options).compile(&program)?)
}
