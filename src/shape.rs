use crate::error::{CompileError, Result};
use crate::lang::ShapeArg;
use crate::store::Store;
use std::fmt;

/// Tensor dimensions, outermost first. The empty shape is a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(pub Vec<usize>);

impl Shape {
  pub fn scalar() -> Self {
    Shape(vec![])
  }

  pub fn rank(&self) -> usize {
    self.0.len()
  }

  pub fn is_scalar(&self) -> bool {
    self.0.is_empty()
  }

  /// Elementwise broadcast with NumPy rules: align trailing dimensions, a 1
  /// stretches to match. `None` if some dimension pair is incompatible.
  pub fn broadcast(&self, other: &Shape) -> Option<Shape> {
    let rank = self.rank().max(other.rank());
    let mut dims = vec![0; rank];
    for i in 0..rank {
      let a = dim_from_end(self, i);
      let b = dim_from_end(other, i);
      dims[rank - 1 - i] = match (a, b) {
        (x, y) if x == y => x,
        (1, y) => y,
        (x, 1) => x,
        _ => return None,
      };
    }
    Some(Shape(dims))
  }

  /// Result shape of `self @ other` following NumPy's `matmul` rank rules.
  pub fn matmul(&self, other: &Shape) -> Option<Shape> {
    if self.is_scalar() || other.is_scalar() {
      return None;
    }
    let lhs = if self.rank() == 1 {
      Shape(vec![1, self.0[0]])
    } else {
      self.clone()
    };
    let rhs = if other.rank() == 1 {
      Shape(vec![other.0[0], 1])
    } else {
      other.clone()
    };
    let (n, k1) = (lhs.0[lhs.rank() - 2], lhs.0[lhs.rank() - 1]);
    let (k2, m) = (rhs.0[rhs.rank() - 2], rhs.0[rhs.rank() - 1]);
    if k1 != k2 {
      return None;
    }
    let batch_l = Shape(lhs.0[..lhs.rank() - 2].to_vec());
    let batch_r = Shape(rhs.0[..rhs.rank() - 2].to_vec());
    let mut dims = batch_l.broadcast(&batch_r)?.0;
    if self.rank() > 1 {
      dims.push(n);
    }
    if other.rank() > 1 {
      dims.push(m);
    }
    Some(Shape(dims))
  }
}

fn dim_from_end(shape: &Shape, i: usize) -> usize {
  if i < shape.rank() {
    shape.0[shape.rank() - 1 - i]
  } else {
    1
  }
}

impl From<&[usize]> for Shape {
  fn from(dims: &[usize]) -> Self {
    Shape(dims.to_vec())
  }
}

impl fmt::Display for Shape {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self.0.as_slice() {
      [d] => write!(f, "({},)", d),
      dims => {
        write!(f, "(")?;
        for (i, d) in dims.iter().enumerate() {
          if i > 0 {
            write!(f, ", ")?;
          }
          write!(f, "{}", d)?;
        }
        write!(f, ")")
      }
    }
  }
}

/// Concatenates the contribution of every shape argument, left to right.
/// A missing shape clause is a scalar.
pub fn resolve_shape(store: &Store, args: Option<&[ShapeArg]>) -> Result<Shape> {
  let mut dims = Vec::new();
  for arg in args.unwrap_or(&[]) {
    match *arg {
      ShapeArg::Dim(k) => dims.push(k),
      ShapeArg::Like(var, None) => dims.extend(store.lookup_shape(var)?.0),
      ShapeArg::Like(var, Some(index)) => {
        let shape = store.lookup_shape(var)?;
        let dim = shape
          .0
          .get(index)
          .copied()
          .ok_or(CompileError::ShapeIndexOutOfRange {
            var,
            index,
            rank: shape.rank(),
          })?;
        dims.push(dim);
      }
    }
  }
  Ok(Shape(dims))
}
