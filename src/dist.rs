//! The fixed catalog of distributions a model may draw from.

use crate::error::{CompileError, Result};
use crate::lang::Var;
use lazy_static::lazy_static;
use maplit::hashmap;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
  Discrete,
  Continuous,
  Multivariate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistKind {
  Bern,
  N,
  Unif,
  Beta,
  Pois,
  DUnif,
  Binom,
  Geometric,
  Exp,
  Gamma,
  Dir,
}

lazy_static! {
  static ref CATALOG: HashMap<&'static str, DistKind> = {
    use DistKind::*;
    hashmap! {
      "Bern" => Bern,
      "N" => N,
      "Unif" => Unif,
      "Beta" => Beta,
      "Pois" => Pois,
      "DUnif" => DUnif,
      "Binom" => Binom,
      "Geometric" => Geometric,
      "Exp" => Exp,
      "Gamma" => Gamma,
      "Dir" => Dir,
    }
  };
}

impl DistKind {
  pub const ALL: [DistKind; 11] = [
    DistKind::Bern,
    DistKind::N,
    DistKind::Unif,
    DistKind::Beta,
    DistKind::Pois,
    DistKind::DUnif,
    DistKind::Binom,
    DistKind::Geometric,
    DistKind::Exp,
    DistKind::Gamma,
    DistKind::Dir,
  ];

  /// Looks up a distribution by its surface name. `Dir` is reserved and only
  /// resolves when `enable_dirichlet` is set.
  pub fn lookup(name: Var, enable_dirichlet: bool) -> Result<DistKind> {
    match CATALOG.get(name.name().as_str()) {
      Some(DistKind::Dir) if !enable_dirichlet => Err(CompileError::UndefinedDistribution(name)),
      Some(kind) => Ok(*kind),
      None => Err(CompileError::UndefinedDistribution(name)),
    }
  }

  pub fn surface_name(&self) -> &'static str {
    use DistKind::*;
    match self {
      Bern => "Bern",
      N => "N",
      Unif => "Unif",
      Beta => "Beta",
      Pois => "Pois",
      DUnif => "DUnif",
      Binom => "Binom",
      Geometric => "Geometric",
      Exp => "Exp",
      Gamma => "Gamma",
      Dir => "Dir",
    }
  }

  /// The class name the inference engine knows this distribution by.
  pub fn class_name(&self) -> &'static str {
    use DistKind::*;
    match self {
      Bern => "Bernoulli",
      N => "Normal",
      Unif => "Uniform",
      Beta => "Beta",
      Pois => "Poisson",
      DUnif => "DiscreteUniform",
      Binom => "Binomial",
      Geometric => "Geometric",
      Exp => "Exponential",
      Gamma => "Gamma",
      Dir => "Dirichlet",
    }
  }

  pub fn param_names(&self) -> &'static [&'static str] {
    use DistKind::*;
    match self {
      Bern | Geometric => &["p"],
      N => &["mu", "sigma"],
      Unif | DUnif => &["lower", "upper"],
      Beta | Gamma => &["alpha", "beta"],
      Pois => &["mu"],
      Binom => &["n", "p"],
      Exp => &["lam"],
      Dir => &["a"],
    }
  }

  pub fn arity(&self) -> usize {
    self.param_names().len()
  }

  pub fn family(&self) -> Family {
    use DistKind::*;
    match self {
      Bern | Pois | DUnif | Binom | Geometric => Family::Discrete,
      N | Unif | Beta | Exp | Gamma => Family::Continuous,
      Dir => Family::Multivariate,
    }
  }
}

impl fmt::Display for DistKind {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.surface_name())
  }
}

pub fn arity_of(name: Var, enable_dirichlet: bool) -> Result<usize> {
  DistKind::lookup(name, enable_dirichlet).map(|kind| kind.arity())
}

/// Resolves `name` and checks it takes exactly `nargs` parameters.
pub fn check_arity(name: Var, nargs: usize, enable_dirichlet: bool) -> Result<DistKind> {
  let kind = DistKind::lookup(name, enable_dirichlet)?;
  if kind.arity() != nargs {
    return Err(CompileError::WrongArity {
      name,
      actual: nargs,
      expected: kind.arity(),
    });
  }
  Ok(kind)
}
