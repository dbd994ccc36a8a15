use string_interner::{DefaultSymbol as Symbol, StringInterner};
use std::cell::RefCell;
use std::fmt;

thread_local! {
  pub static INTERNER: RefCell<StringInterner> = RefCell::new(StringInterner::default());
}

/// An interned, case-sensitive identifier. Variables, distribution names and
/// function names all share the same interner.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Var(Symbol);

impl Var {
  pub fn new(t: impl Into<String>) -> Self {
    INTERNER.with(|interner| {
      let symbol = interner.borrow_mut().get_or_intern(t.into());
      Var(symbol)
    })
  }

  pub fn name(&self) -> String {
    INTERNER.with(|interner| {
      let interner = interner.borrow();
      interner.resolve(self.0).unwrap_or("<unknown>").to_string()
    })
  }
}

pub fn v(t: impl Into<String>) -> Var {
  Var::new(t)
}

impl fmt::Debug for Var {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

impl fmt::Display for Var {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", self.name())
  }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinOp {
  Add,
  Sub,
  Mul,
  Div,
  MatMul,
}

impl fmt::Debug for BinOp {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      BinOp::Add => write!(f, "+"),
      BinOp::Sub => write!(f, "-"),
      BinOp::Mul => write!(f, "*"),
      BinOp::Div => write!(f, "/"),
      BinOp::MatMul => write!(f, "@"),
    }
  }
}

impl fmt::Display for BinOp {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    fmt::Debug::fmt(self, f)
  }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
  Number(f64),
  Ident(Var),
  Bin(Box<Expr>, Box<Expr>, BinOp),
  Neg(Box<Expr>),
  Paren(Box<Expr>),
  Call(Var, Vec<Expr>),
}

/// One argument of a shape clause: `3`, `like y` or `like y[1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeArg {
  Dim(usize),
  Like(Var, Option<usize>),
}

/// A (possibly nested) array literal on the right of a data assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
  Number(f64),
  List(Vec<Literal>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
  /// `var(shape) ~ dist(args)`
  Distributed {
    var: Var,
    shape: Option<Vec<ShapeArg>>,
    dist: Var,
    args: Vec<Expr>,
  },
  /// `var = literal`
  DataAssign(Var, Literal),
  /// `var := expr`
  Assign(Var, Expr),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
  pub stmts: Vec<Stmt>,
}

fn comma_sep<T: fmt::Display>(f: &mut fmt::Formatter, items: &[T]) -> fmt::Result {
  for (i, item) in items.iter().enumerate() {
    if i > 0 {
      write!(f, ", ")?;
    }
    write!(f, "{}", item)?;
  }
  Ok(())
}

impl fmt::Display for Expr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Expr::Number(n) => write!(f, "{}", n),
      Expr::Ident(x) => write!(f, "{}", x),
      Expr::Bin(e1, e2, op) => write!(f, "{} {} {}", e1, op, e2),
      Expr::Neg(e) => write!(f, "-{}", e),
      Expr::Paren(e) => write!(f, "({})", e),
      Expr::Call(func, args) => {
        write!(f, "{}(", func)?;
        comma_sep(f, args)?;
        write!(f, ")")
      }
    }
  }
}

impl fmt::Display for ShapeArg {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ShapeArg::Dim(k) => write!(f, "{}", k),
      ShapeArg::Like(x, None) => write!(f, "like {}", x),
      ShapeArg::Like(x, Some(i)) => write!(f, "like {}[{}]", x, i),
    }
  }
}

impl fmt::Display for Literal {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Literal::Number(n) => write!(f, "{}", n),
      Literal::List(items) => {
        write!(f, "[")?;
        comma_sep(f, items)?;
        write!(f, "]")
      }
    }
  }
}

impl fmt::Display for Stmt {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Stmt::Distributed {
        var,
        shape,
        dist,
        args,
      } => {
        write!(f, "{}", var)?;
        if let Some(shape) = shape {
          write!(f, "(")?;
          comma_sep(f, shape)?;
          write!(f, ")")?;
        }
        write!(f, " ~ {}(", dist)?;
        comma_sep(f, args)?;
        write!(f, ")")
      }
      Stmt::DataAssign(var, lit) => write!(f, "{} = {}", var, lit),
      Stmt::Assign(var, e) => write!(f, "{} := {}", var, e),
    }
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for stmt in &self.stmts {
      writeln!(f, "{}", stmt)?;
    }
    Ok(())
  }
}
