use crate::error::{CompileError, Result};
use crate::ir::{Func, Node, Op};
use crate::lang::Expr;
use crate::store::Store;
use log::trace;
use std::rc::Rc;

impl Expr {
  /// Evaluates the expression against `store`, left to right and depth first.
  /// Constant subexpressions fold to scalars; anything touching a bound node
  /// becomes a `TensorExpr` whose shape checks are left to the tensor runtime.
  pub fn eval(&self, store: &mut Store) -> Result<Rc<Node>> {
    trace!("eval {}", self);
    match self {
      Expr::Number(n) => Ok(Rc::new(Node::Scalar(*n))),
      Expr::Ident(x) => store.resolve(*x),
      Expr::Paren(e) => e.eval(store),
      Expr::Neg(e) => {
        let arg = e.eval(store)?;
        Ok(apply(Op::Neg, vec![arg]))
      }
      Expr::Bin(e1, e2, op) => {
        let lhs = e1.eval(store)?;
        let rhs = e2.eval(store)?;
        Ok(apply(Op::from(*op), vec![lhs, rhs]))
      }
      Expr::Call(name, args) => {
        let args = args
          .iter()
          .map(|arg| arg.eval(store))
          .collect::<Result<Vec<_>>>()?;
        let func = Func::lookup(*name)?;
        if args.len() != func.arity() {
          return Err(CompileError::WrongArity {
            name: *name,
            actual: args.len(),
            expected: func.arity(),
          });
        }
        Ok(apply(Op::Call(func), args))
      }
    }
  }
}

fn apply(op: Op, args: Vec<Rc<Node>>) -> Rc<Node> {
  let constants = args.iter().map(|arg| arg.as_scalar()).collect::<Option<Vec<_>>>();
  match constants.and_then(|xs| op.fold(&xs)) {
    Some(x) => Rc::new(Node::Scalar(x)),
    None => Rc::new(Node::TensorExpr(op, args)),
  }
}
