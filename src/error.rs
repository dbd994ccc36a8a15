use crate::lang::Var;
use thiserror::Error;

/// Every way a well-parsed program can fail to compile. Compilation stops at
/// the first one; no partial model is returned.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
  #[error("Random variable {0} used before declared")]
  UninitializedVariable(Var),

  #[error("Variable {0} was already assigned data")]
  DuplicateVariable(Var),

  #[error("Variable {0} is already bound to a random variable or deterministic")]
  AssignAfterDistributed(Var),

  #[error("{name} expected {expected} arguments but received {actual}")]
  WrongArity {
    name: Var,
    actual: usize,
    expected: usize,
  },

  #[error("Unknown distribution {0}")]
  UndefinedDistribution(Var),

  #[error("Unknown function {0}")]
  UndefinedFunction(Var),

  #[error("Invalid data literal{}", .0.map(|x| format!(" for {}", x)).unwrap_or_default())]
  InvalidDataLiteral(Option<Var>),

  #[error("Dimension {index} of {var} is out of range for rank {rank}")]
  ShapeIndexOutOfRange { var: Var, index: usize, rank: usize },

  #[error("Shape of {0} cannot be determined before sampling")]
  UnknownShape(Var),
}

pub type Result<T> = std::result::Result<T, CompileError>;
