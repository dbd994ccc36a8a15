//! The compiled model graph. Nodes are reference counted so that a variable
//! used in several places is one shared node.

use crate::data::{shape_of, Array};
use crate::dist::DistKind;
use crate::error::{CompileError, Result};
use crate::lang::{BinOp, Var};
use crate::shape::Shape;
use lazy_static::lazy_static;
use maplit::hashmap;
use num::Float;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Elementwise and tensor functions callable from model expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Func {
  Exp,
  Log,
  Sqrt,
  Abs,
  Logistic,
  Tanh,
  Softplus,
  Pow,
}

lazy_static! {
  static ref FUNCTIONS: HashMap<&'static str, Func> = {
    use Func::*;
    hashmap! {
      "exp" => Exp,
      "log" => Log,
      "sqrt" => Sqrt,
      "abs" => Abs,
      "logistic" => Logistic,
      "sigmoid" => Logistic,
      "tanh" => Tanh,
      "softplus" => Softplus,
      "pow" => Pow,
    }
  };
}

impl Func {
  pub fn lookup(name: Var) -> Result<Func> {
    FUNCTIONS
      .get(name.name().as_str())
      .copied()
      .ok_or(CompileError::UndefinedFunction(name))
  }

  pub fn name(&self) -> &'static str {
    use Func::*;
    match self {
      Exp => "exp",
      Log => "log",
      Sqrt => "sqrt",
      Abs => "abs",
      Logistic => "logistic",
      Tanh => "tanh",
      Softplus => "softplus",
      Pow => "pow",
    }
  }

  pub fn arity(&self) -> usize {
    match self {
      Func::Pow => 2,
      _ => 1,
    }
  }

  /// Applies the function to constant arguments. `None` if the argument
  /// count does not match `arity`.
  pub fn apply<F: Float>(&self, args: &[F]) -> Option<F> {
    use Func::*;
    Some(match (self, args) {
      (Pow, &[x, y]) => x.powf(y),
      (Exp, &[x]) => x.exp(),
      (Log, &[x]) => x.ln(),
      (Sqrt, &[x]) => x.sqrt(),
      (Abs, &[x]) => x.abs(),
      (Logistic, &[x]) => F::one() / (F::one() + (-x).exp()),
      (Tanh, &[x]) => x.tanh(),
      // log(1 + e^x) without overflowing e^x for large x
      (Softplus, &[x]) => x.max(F::zero()) + (-x.abs()).exp().ln_1p(),
      _ => return None,
    })
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
  Add,
  Sub,
  Mul,
  Div,
  Neg,
  MatMul,
  Call(Func),
}

impl From<BinOp> for Op {
  fn from(op: BinOp) -> Self {
    match op {
      BinOp::Add => Op::Add,
      BinOp::Sub => Op::Sub,
      BinOp::Mul => Op::Mul,
      BinOp::Div => Op::Div,
      BinOp::MatMul => Op::MatMul,
    }
  }
}

impl Op {
  /// Evaluates the operator on constant operands. Division follows IEEE 754,
  /// so `1 / 0` is `inf`. Matrix products are never folded.
  pub fn fold(&self, args: &[f64]) -> Option<f64> {
    Some(match (self, args) {
      (Op::Add, [a, b]) => a + b,
      (Op::Sub, [a, b]) => a - b,
      (Op::Mul, [a, b]) => a * b,
      (Op::Div, [a, b]) => a / b,
      (Op::Neg, [a]) => -a,
      (Op::Call(func), args) => return func.apply(args),
      _ => return None,
    })
  }

  fn is_elementwise(&self) -> bool {
    *self != Op::MatMul
  }
}

impl fmt::Display for Op {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Op::Add => write!(f, "+"),
      Op::Sub | Op::Neg => write!(f, "-"),
      Op::Mul => write!(f, "*"),
      Op::Div => write!(f, "/"),
      Op::MatMul => write!(f, "@"),
      Op::Call(func) => write!(f, "{}", func.name()),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomVariable {
  pub name: Var,
  pub dist: DistKind,
  pub params: Vec<Rc<Node>>,
  pub shape: Shape,
  /// Data assigned to the name before the declaration. Present for
  /// likelihood terms, absent for latent variables.
  pub observed: Option<Array>,
}

impl RandomVariable {
  pub fn is_observed(&self) -> bool {
    self.observed.is_some()
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
  Scalar(f64),
  /// Observed data referenced from an expression.
  Data(Var, Array),
  RandomVariable(RandomVariable),
  Deterministic(Var, Rc<Node>),
  /// An unnamed intermediate such as `W1 @ W2`.
  TensorExpr(Op, Vec<Rc<Node>>),
}

impl Node {
  pub fn name(&self) -> Option<Var> {
    match self {
      Node::Data(name, _) | Node::Deterministic(name, _) => Some(*name),
      Node::RandomVariable(rv) => Some(rv.name),
      Node::Scalar(_) | Node::TensorExpr(..) => None,
    }
  }

  pub fn as_scalar(&self) -> Option<f64> {
    match self {
      Node::Scalar(x) => Some(*x),
      _ => None,
    }
  }

  pub fn as_rv(&self) -> Option<&RandomVariable> {
    match self {
      Node::RandomVariable(rv) => Some(rv),
      _ => None,
    }
  }

  /// Static shape of the node. `None` when it can only be known once the
  /// tensor runtime evaluates the graph, e.g. a matmul of mismatched operands.
  pub fn shape(&self) -> Option<Shape> {
    match self {
      Node::Scalar(_) => Some(Shape::scalar()),
      Node::Data(_, array) => Some(shape_of(array)),
      Node::RandomVariable(rv) => Some(rv.shape.clone()),
      Node::Deterministic(_, value) => value.shape(),
      Node::TensorExpr(op, args) => {
        let shapes = args.iter().map(|arg| arg.shape()).collect::<Option<Vec<_>>>()?;
        if op.is_elementwise() {
          shapes
            .iter()
            .try_fold(Shape::scalar(), |acc, shape| acc.broadcast(shape))
        } else {
          match shapes.as_slice() {
            [lhs, rhs] => lhs.matmul(rhs),
            _ => None,
          }
        }
      }
    }
  }

  /// Names of the bound nodes this node is computed from, in first-use order.
  pub fn parents(&self) -> Vec<Var> {
    let mut pass = Parents { names: Vec::new() };
    match self {
      Node::RandomVariable(rv) => {
        for param in &rv.params {
          pass.visit(param);
        }
      }
      Node::Deterministic(_, value) => pass.visit(value),
      _ => pass.super_visit(self),
    }
    pass.names
  }
}

pub trait Visitor {
  fn visit_scalar(&mut self, _x: f64) {}

  fn visit_data(&mut self, _name: Var, _array: &Array) {}

  fn visit_rv(&mut self, rv: &RandomVariable) {
    self.super_visit_rv(rv)
  }

  fn super_visit_rv(&mut self, rv: &RandomVariable) {
    for param in &rv.params {
      self.visit(param);
    }
  }

  fn visit_deterministic(&mut self, name: Var, value: &Node) {
    self.super_visit_deterministic(name, value)
  }

  fn super_visit_deterministic(&mut self, _name: Var, value: &Node) {
    self.visit(value);
  }

  fn visit_tensor(&mut self, op: Op, args: &[Rc<Node>]) {
    self.super_visit_tensor(op, args)
  }

  fn super_visit_tensor(&mut self, _op: Op, args: &[Rc<Node>]) {
    for arg in args {
      self.visit(arg);
    }
  }

  fn visit(&mut self, node: &Node) {
    self.super_visit(node)
  }

  fn super_visit(&mut self, node: &Node) {
    match node {
      Node::Scalar(x) => self.visit_scalar(*x),
      Node::Data(name, array) => self.visit_data(*name, array),
      Node::RandomVariable(rv) => self.visit_rv(rv),
      Node::Deterministic(name, value) => self.visit_deterministic(*name, value),
      Node::TensorExpr(op, args) => self.visit_tensor(*op, args),
    }
  }
}

struct Parents {
  names: Vec<Var>,
}

impl Parents {
  fn push(&mut self, name: Var) {
    if !self.names.contains(&name) {
      self.names.push(name);
    }
  }
}

impl Visitor for Parents {
  fn visit_data(&mut self, name: Var, _array: &Array) {
    self.push(name);
  }

  fn visit_rv(&mut self, rv: &RandomVariable) {
    self.push(rv.name);
  }

  fn visit_deterministic(&mut self, name: Var, _value: &Node) {
    self.push(name);
  }
}

/// Writes a node as it appears inside a larger expression: bound nodes by
/// name, compound operands parenthesized.
pub(crate) fn fmt_operand(node: &Node, f: &mut fmt::Formatter) -> fmt::Result {
  match node {
    Node::Scalar(x) => write!(f, "{}", x),
    Node::TensorExpr(Op::Call(_), _) => fmt_expr(node, f),
    Node::TensorExpr(..) => {
      write!(f, "(")?;
      fmt_expr(node, f)?;
      write!(f, ")")
    }
    _ => match node.name() {
      Some(name) => write!(f, "{}", name),
      None => Ok(()),
    },
  }
}

fn fmt_expr(node: &Node, f: &mut fmt::Formatter) -> fmt::Result {
  match node {
    Node::TensorExpr(Op::Neg, args) => {
      write!(f, "-")?;
      fmt_operand(&args[0], f)
    }
    Node::TensorExpr(Op::Call(func), args) => {
      write!(f, "{}(", func.name())?;
      for (i, arg) in args.iter().enumerate() {
        if i > 0 {
          write!(f, ", ")?;
        }
        fmt_expr(arg, f)?;
      }
      write!(f, ")")
    }
    Node::TensorExpr(op, args) => {
      fmt_operand(&args[0], f)?;
      write!(f, " {} ", op)?;
      fmt_operand(&args[1], f)
    }
    _ => fmt_operand(node, f),
  }
}

/// Displays a node as an expression, without the outer binding.
pub struct AsExpr<'a>(pub &'a Node);

impl fmt::Display for AsExpr<'_> {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt_expr(self.0, f)
  }
}

impl fmt::Display for Node {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Node::RandomVariable(rv) => write!(f, "{} ~ {}", rv.name, rv.dist.class_name()),
      Node::Deterministic(name, value) => write!(f, "{} := {}", name, AsExpr(value)),
      _ => fmt_expr(self, f),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lang::v;
  use ndarray::IxDyn;
  use test_log::test;

  fn rv(name: &str, dist: DistKind, shape: &[usize]) -> Rc<Node> {
    Rc::new(Node::RandomVariable(RandomVariable {
      name: v(name),
      dist,
      params: vec![],
      shape: Shape(shape.to_vec()),
      observed: None,
    }))
  }

  fn tensor(op: Op, args: Vec<Rc<Node>>) -> Rc<Node> {
    Rc::new(Node::TensorExpr(op, args))
  }

  #[test]
  fn function_library() {
    assert_eq!(Func::lookup(v("sigmoid")), Ok(Func::Logistic));
    assert_eq!(Func::lookup(v("gamma")), Err(CompileError::UndefinedFunction(v("gamma"))));
    assert_eq!(Func::Logistic.apply(&[0.0f64]), Some(0.5));
    assert_eq!(Func::Pow.apply(&[2.0f64, 3.0]), Some(8.0));
    assert_eq!(Func::Exp.apply(&[0.0f32]), Some(1.0));
  }

  #[test]
  fn softplus_is_stable() {
    let at_zero = Func::Softplus.apply(&[0.0f64]).unwrap();
    assert!((at_zero - 2f64.ln()).abs() < 1e-12);
    assert_eq!(Func::Softplus.apply(&[1000.0f64]), Some(1000.0));
    assert_eq!(Func::Softplus.apply(&[-1000.0f64]), Some(0.0));
    assert_eq!(Op::Call(Func::Softplus).fold(&[1000.0]), Some(1000.0));
  }

  #[test]
  fn wrong_argument_count_does_not_apply() {
    assert_eq!(Func::Pow.apply(&[2.0f64]), None);
    assert_eq!(Func::Exp.apply::<f64>(&[]), None);
    assert_eq!(Func::Sqrt.apply(&[4.0f64, 1.0]), None);
    assert_eq!(Op::Call(Func::Pow).fold(&[2.0]), None);
  }

  #[test]
  fn folding_follows_ieee() {
    assert_eq!(Op::Add.fold(&[1., 2.]), Some(3.));
    assert_eq!(Op::Div.fold(&[1., 0.]), Some(f64::INFINITY));
    assert!(Op::Div.fold(&[0., 0.]).unwrap().is_nan());
    assert_eq!(Op::MatMul.fold(&[1., 2.]), None);
    assert_eq!(Op::Call(Func::Pow).fold(&[2.]), None);
  }

  #[test]
  fn shapes_broadcast_and_defer() {
    let a = rv("a", DistKind::N, &[3, 4]);
    let b = rv("b", DistKind::N, &[4, 5]);
    let s = Rc::new(Node::Scalar(2.));

    let prod = tensor(Op::MatMul, vec![a.clone(), b.clone()]);
    assert_eq!(prod.shape(), Some(Shape(vec![3, 5])));

    let scaled = tensor(Op::Mul, vec![a.clone(), s]);
    assert_eq!(scaled.shape(), Some(Shape(vec![3, 4])));

    let bad = tensor(Op::MatMul, vec![b.clone(), a.clone()]);
    assert_eq!(bad.shape(), None);
    assert_eq!(tensor(Op::Add, vec![bad, a]).shape(), None);

    let data = Rc::new(Node::Data(v("d"), Array::zeros(IxDyn(&[4]))));
    assert_eq!(tensor(Op::Call(Func::Exp), vec![data]).shape(), Some(Shape(vec![4])));
  }

  #[test]
  fn parents_stop_at_bound_nodes() {
    let mu = rv("mu", DistKind::N, &[]);
    let x = Rc::new(Node::RandomVariable(RandomVariable {
      name: v("x"),
      dist: DistKind::N,
      params: vec![mu.clone(), Rc::new(Node::Scalar(1.))],
      shape: Shape::scalar(),
      observed: None,
    }));
    let sum = tensor(Op::Add, vec![x.clone(), tensor(Op::Mul, vec![mu.clone(), x.clone()])]);
    assert_eq!(sum.parents(), vec![v("x"), v("mu")]);

    let det = Node::Deterministic(v("z"), sum);
    assert_eq!(det.parents(), vec![v("x"), v("mu")]);
    assert_eq!(x.parents(), vec![v("mu")]);
  }

  #[test]
  fn display() {
    let w1 = rv("W1", DistKind::N, &[3, 4]);
    let w2 = rv("W2", DistKind::N, &[4, 5]);
    assert_eq!(w1.to_string(), "W1 ~ Normal");

    let z = Node::Deterministic(v("z"), tensor(Op::MatMul, vec![w1.clone(), w2]));
    assert_eq!(z.to_string(), "z := W1 @ W2");

    let e = tensor(
      Op::Add,
      vec![
        tensor(Op::Neg, vec![w1.clone()]),
        tensor(Op::Call(Func::Exp), vec![tensor(Op::Mul, vec![w1, Rc::new(Node::Scalar(0.5))])]),
      ],
    );
    assert_eq!(e.to_string(), "(-W1) + exp(W1 * 0.5)");
  }
}
