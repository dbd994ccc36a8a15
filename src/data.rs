use crate::error::{CompileError, Result};
use crate::lang::{Literal, Var};
use crate::shape::Shape;
use ndarray::{ArrayD, IxDyn};

/// Observed data: a dense, rectangular array of floats.
pub type Array = ArrayD<f64>;

pub fn shape_of(array: &Array) -> Shape {
  Shape::from(array.shape())
}

/// Converts an array literal into a rectangular array. Nesting must be
/// regular: every list holds either only numbers or only lists of one shape.
pub fn parse_data(name: Option<Var>, lit: &Literal) -> Result<Array> {
  let mut values = Vec::new();
  let shape = flatten(name, lit, &mut values)?;
  log::trace!("data literal for {:?} has shape {}", name, shape);
  ArrayD::from_shape_vec(IxDyn(&shape.0), values).map_err(|_| CompileError::InvalidDataLiteral(name))
}

fn flatten(name: Option<Var>, lit: &Literal, values: &mut Vec<f64>) -> Result<Shape> {
  let items = match lit {
    Literal::Number(n) => {
      values.push(*n);
      return Ok(Shape::scalar());
    }
    Literal::List(items) => items,
  };

  let subshape = match items.first() {
    None => Shape::scalar(),
    Some(Literal::Number(_)) => {
      for item in items {
        match item {
          Literal::Number(n) => values.push(*n),
          Literal::List(_) => return Err(CompileError::InvalidDataLiteral(name)),
        }
      }
      Shape::scalar()
    }
    Some(Literal::List(_)) => {
      let mut subshape = None;
      for item in items {
        if let Literal::Number(_) = item {
          return Err(CompileError::InvalidDataLiteral(name));
        }
        let shape = flatten(name, item, values)?;
        match &subshape {
          Some(expected) if *expected != shape => return Err(CompileError::InvalidDataLiteral(name)),
          Some(_) => {}
          None => subshape = Some(shape),
        }
      }
      subshape.unwrap_or_default()
    }
  };

  let mut dims = vec![items.len()];
  dims.extend(subshape.0);
  Ok(Shape(dims))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lang::v;
  use test_log::test;

  fn num(n: f64) -> Literal {
    Literal::Number(n)
  }

  fn list(items: Vec<Literal>) -> Literal {
    Literal::List(items)
  }

  #[test]
  fn vectors_and_matrices() {
    let a = parse_data(None, &list(vec![num(1.), num(2.), num(3.)])).unwrap();
    assert_eq!(shape_of(&a), Shape(vec![3]));
    assert_eq!(a.iter().copied().collect::<Vec<_>>(), vec![1., 2., 3.]);

    let m = list(vec![list(vec![num(1.), num(2.)]), list(vec![num(3.), num(4.)])]);
    let a = parse_data(None, &m).unwrap();
    assert_eq!(shape_of(&a), Shape(vec![2, 2]));
    assert_eq!(a[&[1usize, 0][..]], 3.);
  }

  #[test]
  fn scalars_and_empty_lists() {
    let a = parse_data(None, &num(7.)).unwrap();
    assert_eq!(shape_of(&a), Shape::scalar());
    assert_eq!(a.sum(), 7.);

    let a = parse_data(None, &list(vec![])).unwrap();
    assert_eq!(shape_of(&a), Shape(vec![0]));

    let a = parse_data(None, &list(vec![list(vec![]), list(vec![])])).unwrap();
    assert_eq!(shape_of(&a), Shape(vec![2, 0]));
  }

  #[test]
  fn mixed_siblings_are_rejected() {
    let bad = list(vec![num(1.), list(vec![num(2.)]), num(3.)]);
    assert_eq!(
      parse_data(Some(v("y")), &bad),
      Err(CompileError::InvalidDataLiteral(Some(v("y"))))
    );

    let bad = list(vec![list(vec![num(1.)]), num(2.)]);
    assert_eq!(parse_data(None, &bad), Err(CompileError::InvalidDataLiteral(None)));
  }

  #[test]
  fn ragged_rows_are_rejected() {
    let ragged = list(vec![list(vec![num(1.), num(2.)]), list(vec![num(3.)])]);
    assert_eq!(parse_data(None, &ragged), Err(CompileError::InvalidDataLiteral(None)));

    let deep = list(vec![list(vec![list(vec![num(1.)])]), list(vec![num(1.)])]);
    assert_eq!(parse_data(None, &deep), Err(CompileError::InvalidDataLiteral(None)));
  }

  #[test]
  fn parsing_is_repeatable() {
    let m = list(vec![list(vec![num(1.), num(2.), num(3.)])]);
    assert_eq!(parse_data(None, &m), parse_data(None, &m));
  }
}
