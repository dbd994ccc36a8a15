use crate::data::shape_of;
use crate::ir::{AsExpr, Node, RandomVariable};
use crate::store::Store;
use pretty::RcDoc;

fn comma_list(docs: Vec<RcDoc<'static>>) -> RcDoc<'static> {
  RcDoc::intersperse(docs, RcDoc::text(",").append(RcDoc::line()))
    .nest(2)
    .group()
}

fn shape_suffix(node: &Node) -> RcDoc<'static> {
  match node.shape() {
    Some(shape) if shape.is_scalar() => RcDoc::nil(),
    Some(shape) => RcDoc::text(" shape ").append(RcDoc::as_string(shape)),
    None => RcDoc::text(" shape ?"),
  }
}

fn rv_doc(rv: &RandomVariable, node: &Node) -> RcDoc<'static> {
  let params = rv
    .dist
    .param_names()
    .iter()
    .zip(rv.params.iter())
    .map(|(name, value)| RcDoc::as_string(format!("{} = {}", name, AsExpr(value))))
    .collect::<Vec<_>>();
  let observed = match &rv.observed {
    Some(array) => RcDoc::text(" observed ").append(RcDoc::as_string(shape_of(array))),
    None => RcDoc::nil(),
  };
  RcDoc::as_string(rv.name)
    .append(RcDoc::text(" ~ "))
    .append(RcDoc::text(rv.dist.class_name()))
    .append(RcDoc::text("("))
    .append(comma_list(params))
    .append(RcDoc::text(")"))
    .append(shape_suffix(node))
    .append(observed)
}

fn node_doc(node: &Node) -> Option<RcDoc<'static>> {
  match node {
    Node::RandomVariable(rv) => Some(rv_doc(rv, node)),
    Node::Deterministic(..) => Some(RcDoc::as_string(node).append(shape_suffix(node))),
    _ => None,
  }
}

fn section(title: &'static str, lines: Vec<RcDoc<'static>>) -> RcDoc<'static> {
  if lines.is_empty() {
    return RcDoc::text(title);
  }
  RcDoc::text(title)
    .append(RcDoc::hardline().append(RcDoc::intersperse(lines, RcDoc::hardline())).nest(2))
}

/// Renders the compiled model: variables in binding order, then data.
pub fn render(store: &Store, width: usize) -> String {
  let nodes = store
    .nodes()
    .filter_map(|(_, node)| node_doc(node))
    .collect::<Vec<_>>();
  let data = store
    .data()
    .map(|(name, array)| {
      RcDoc::as_string(name)
        .append(RcDoc::text(" "))
        .append(RcDoc::as_string(shape_of(array)))
    })
    .collect::<Vec<_>>();
  let doc = section("model", nodes)
    .append(RcDoc::hardline())
    .append(section("data", data));
  doc.pretty(width).to_string()
}

impl Store {
  pub fn to_pretty(&self, width: usize) -> String {
    render(self, width)
  }
}

#[cfg(test)]
mod tests {
  use crate::compile::Compiler;
  use crate::lang::Program;
  use crate::parse::Parse;
  use test_log::test;

  fn report(src: &str, width: usize) -> String {
    let program = Program::parse(src).unwrap();
    Compiler::default().compile(&program).unwrap().to_pretty(width)
  }

  #[test]
  fn lists_variables_then_data() {
    let out = report(
      "y = [1, 0]\np ~ Beta(2, 2)\ny(like y) ~ Bern(p)\nW(3, 4) ~ N(0, 1)\nz := W @ W",
      80,
    );
    let lines = out.lines().collect::<Vec<_>>();
    assert_eq!(
      lines,
      vec![
        "model",
        "  p ~ Beta(alpha = 2, beta = 2)",
        "  y ~ Bernoulli(p = p) shape (2,) observed (2,)",
        "  W ~ Normal(mu = 0, sigma = 1) shape (3, 4)",
        "  z := W @ W shape ?",
        "data",
        "  y (2,)",
      ]
    );
  }

  #[test]
  fn empty_model() {
    assert_eq!(report("", 80), "model\ndata");
  }

  #[test]
  fn narrow_width_breaks_parameter_lists() {
    let out = report("x ~ Unif(0, 1)", 10);
    assert!(out.lines().count() > 3, "{}", out);
    assert!(out.contains("lower = 0,"));
  }
}
