use crate::data::parse_data;
use crate::dist::check_arity;
use crate::error::Result;
use crate::ir::{Node, RandomVariable};
use crate::lang::{Program, Stmt};
use crate::shape::resolve_shape;
use crate::store::Store;
use log::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Options {
  /// Accept the reserved `Dir` distribution.
  pub enable_dirichlet: bool,
}

/// Turns programs into model graphs. One compiler can be reused for any
/// number of programs; every call to `compile` starts from an empty store.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
  options: Options,
}

impl Compiler {
  pub fn new(options: Options) -> Self {
    Compiler { options }
  }

  /// Compiles statements in source order and stops at the first error.
  pub fn compile(&self, program: &Program) -> Result<Store> {
    let mut store = Store::new();
    for stmt in &program.stmts {
      debug!("compile {}", stmt);
      self.compile_stmt(&mut store, stmt)?;
    }
    Ok(store)
  }

  pub fn compile_stmt(&self, store: &mut Store, stmt: &Stmt) -> Result<()> {
    match stmt {
      Stmt::Distributed {
        var,
        shape,
        dist,
        args,
      } => {
        let shape = resolve_shape(store, shape.as_deref())?;
        let params = args
          .iter()
          .map(|arg| arg.eval(store))
          .collect::<Result<Vec<_>>>()?;
        let dist = check_arity(*dist, params.len(), self.options.enable_dirichlet)?;
        // Data only attaches if it was assigned before this statement.
        let observed = store.lookup_data(*var).cloned();
        let rv = RandomVariable {
          name: *var,
          dist,
          params,
          shape,
          observed,
        };
        store.add_rv(*var, Node::RandomVariable(rv))?;
      }
      Stmt::DataAssign(var, lit) => {
        let array = parse_data(Some(*var), lit)?;
        store.add_data(*var, array)?;
      }
      Stmt::Assign(var, e) => {
        let value = e.eval(store)?;
        store.add_rv(*var, Node::Deterministic(*var, value))?;
      }
    }
    Ok(())
  }
}
