use crate::lang::{BinOp, Expr, Literal, Program, ShapeArg, Stmt, Var};

use anyhow::Result;

peg::parser! {
  grammar ppl() for str {
    rule comment() = "#" (!"\n" [_])*

    rule _() = quiet!{ ([' ' | '\t' | '\r'] / comment())* }

    rule ws() = quiet!{ ([' ' | '\t' | '\r' | '\n'] / comment())* }

    rule sep() = _ ['\n' | ';'] _

    rule ident() -> Var
      = quiet!{ s:$(['a'..='z' | 'A'..='Z' | '_'] ['a'..='z' | 'A'..='Z' | '0'..='9' | '_']*) { Var::new(s) } }
      / expected!("identifier")

    rule integer() -> usize
      = n:$(['0'..='9']+) {? n.parse().or(Err("integer")) }

    rule number() -> f64
      = n:$((['0'..='9']+ ("." ['0'..='9']*)? / "." ['0'..='9']+) (['e' | 'E'] ['+' | '-']? ['0'..='9']+)?) {?
          n.parse().or(Err("number"))
        }

    // Bracketed lists may span lines.
    rule args() -> Vec<Expr> = ws() args:(expr() ** (ws() "," ws())) ws() { args }

    pub rule expr() -> Expr = precedence!{
      x:(@) _ "+" _ y:@ { Expr::Bin(Box::new(x), Box::new(y), BinOp::Add) }
      x:(@) _ "-" _ y:@ { Expr::Bin(Box::new(x), Box::new(y), BinOp::Sub) }
      --
      x:(@) _ "*" _ y:@ { Expr::Bin(Box::new(x), Box::new(y), BinOp::Mul) }
      x:(@) _ "/" _ y:@ { Expr::Bin(Box::new(x), Box::new(y), BinOp::Div) }
      x:(@) _ "@" _ y:@ { Expr::Bin(Box::new(x), Box::new(y), BinOp::MatMul) }
      --
      "-" _ x:@ { Expr::Neg(Box::new(x)) }
      --
      n:number() { Expr::Number(n) }
      f:ident() _ "(" a:args() ")" { Expr::Call(f, a) }
      x:ident() { Expr::Ident(x) }
      "(" ws() e:expr() ws() ")" { Expr::Paren(Box::new(e)) }
    }

    pub rule literal() -> Literal
      = n:number() { Literal::Number(n) }
      / "-" _ n:number() { Literal::Number(-n) }
      / "[" ws() items:(literal() ** (ws() "," ws())) ws() ("," ws())? "]" { Literal::List(items) }

    rule shape_arg() -> ShapeArg
      = k:integer() { ShapeArg::Dim(k) }
      / "like" [' ' | '\t']+ _ x:ident() i:(_ "[" _ i:integer() _ "]" { i })? { ShapeArg::Like(x, i) }

    rule shape() -> Vec<ShapeArg> = "(" ws() args:(shape_arg() ++ (ws() "," ws())) ws() ")" { args }

    rule stmt() -> Stmt
      = var:ident() _ shape:shape()? _ "~" _ dist:ident() _ "(" args:args() ")" {
          Stmt::Distributed { var, shape, dist, args }
        }
      / var:ident() _ ":=" _ e:expr() { Stmt::Assign(var, e) }
      / var:ident() _ "=" _ lit:literal() { Stmt::DataAssign(var, lit) }

    pub rule program() -> Program
      = _ sep()* stmts:(stmt() ** (sep()+)) sep()* _ { Program { stmts } }
  }
}

pub trait Parse: Sized {
  fn parse(s: impl AsRef<str>) -> Result<Self>;
}

impl Parse for Program {
  fn parse(s: impl AsRef<str>) -> Result<Self> {
    Ok(ppl::program(s.as_ref())?)
  }
}

impl Parse for Expr {
  fn parse(s: impl AsRef<str>) -> Result<Self> {
    Ok(ppl::expr(s.as_ref().trim())?)
  }
}

impl Parse for Literal {
  fn parse(s: impl AsRef<str>) -> Result<Self> {
    Ok(ppl::literal(s.as_ref().trim())?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::lang::v;
  use test_log::test;

  fn ident(s: &str) -> Box<Expr> {
    Box::new(Expr::Ident(v(s)))
  }

  #[test]
  fn precedence() {
    let e = Expr::parse("a + b * c").unwrap();
    assert_eq!(
      e,
      Expr::Bin(
        ident("a"),
        Box::new(Expr::Bin(ident("b"), ident("c"), BinOp::Mul)),
        BinOp::Add
      )
    );
    assert_eq!(Expr::parse("a - b - c").unwrap().to_string(), "a - b - c");
    assert!(matches!(
      Expr::parse("a - b - c").unwrap(),
      Expr::Bin(lhs, _, BinOp::Sub) if matches!(*lhs, Expr::Bin(_, _, BinOp::Sub))
    ));
    assert!(matches!(Expr::parse("-a @ b").unwrap(), Expr::Bin(_, _, BinOp::MatMul)));
  }

  #[test]
  fn calls_and_parens() {
    assert_eq!(
      Expr::parse("exp(-(x))").unwrap(),
      Expr::Call(v("exp"), vec![Expr::Neg(Box::new(Expr::Paren(ident("x"))))])
    );
    assert_eq!(Expr::parse("pow(x, 2.5e1)").unwrap().to_string(), "pow(x, 25)");
  }

  #[test]
  fn leading_dot_numbers() {
    assert_eq!(Expr::parse(".5").unwrap(), Expr::Number(0.5));
    assert_eq!(Expr::parse("x * .25e2").unwrap().to_string(), "x * 25");
    assert_eq!(Literal::parse("[.5, -.5]").unwrap().to_string(), "[0.5, -0.5]");
    assert!(Expr::parse(".").is_err());
  }

  #[test]
  fn bracketed_lists_span_lines() {
    let p = Program::parse("x ~ N(0,\n      1)\nw(3,\n  like x) ~ Unif(\n  0, 1\n)\nz := (x\n)").unwrap();
    assert_eq!(p.stmts.len(), 3);
    assert_eq!(p.stmts[0].to_string(), "x ~ N(0, 1)");
    assert_eq!(p.stmts[1].to_string(), "w(3, like x) ~ Unif(0, 1)");
    assert_eq!(p.stmts[2].to_string(), "z := (x)");
    assert!(Program::parse("x ~ N(0, 1\ny ~ N(0, 1)").is_err());
  }

  #[test]
  fn literals() {
    assert_eq!(
      Literal::parse("[[1, 2],\n [3, -4]]").unwrap().to_string(),
      "[[1, 2], [3, -4]]"
    );
    assert_eq!(Literal::parse("[]").unwrap(), Literal::List(vec![]));
    assert_eq!(Literal::parse("[1, [2], 3]").unwrap().to_string(), "[1, [2], 3]");
  }

  #[test]
  fn statements() {
    let p = Program::parse(
      "# coin flips\n\
       y = [1, 0, 1]\n\
       \n\
       p ~ Beta(2, 2)   # prior\n\
       y(like y) ~ Bern(p); w(3, like y[0]) ~ N(0, 1)\n\
       z := w * p\n",
    )
    .unwrap();
    assert_eq!(p.stmts.len(), 5);
    assert_eq!(p.stmts[0].to_string(), "y = [1, 0, 1]");
    assert_eq!(p.stmts[1].to_string(), "p ~ Beta(2, 2)");
    assert_eq!(p.stmts[2].to_string(), "y(like y) ~ Bern(p)");
    assert_eq!(p.stmts[3].to_string(), "w(3, like y[0]) ~ N(0, 1)");
    assert_eq!(p.stmts[4], Stmt::Assign(v("z"), Expr::parse("w * p").unwrap()));
  }

  #[test]
  fn empty_programs_parse() {
    assert_eq!(Program::parse("").unwrap().stmts.len(), 0);
    assert_eq!(Program::parse("\n# nothing here\n\n").unwrap().stmts.len(), 0);
  }

  #[test]
  fn syntax_errors() {
    assert!(Program::parse("x ~ N(0, 1").is_err());
    assert!(Program::parse("x ~ ~ N(0, 1)").is_err());
    assert!(Program::parse("x ~ N(0, 1) y ~ N(0, 1)").is_err());
    assert!(Program::parse("x() ~ N(0, 1)").is_err());
  }
}
