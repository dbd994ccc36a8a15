use crate::data::{shape_of, Array};
use crate::error::{CompileError, Result};
use crate::ir::{Node, RandomVariable};
use crate::lang::Var;
use crate::shape::Shape;
use log::debug;
use std::collections::HashMap;
use std::rc::Rc;

/// The symbol table of a compilation run. Random variables, deterministics
/// and data share one namespace; a name holds at most one node and at most
/// one data array.
#[derive(Debug, Default)]
pub struct Store {
  nodes: HashMap<Var, Rc<Node>>,
  data: HashMap<Var, Array>,
  node_order: Vec<Var>,
  data_order: Vec<Var>,
}

impl Store {
  pub fn new() -> Self {
    Store::default()
  }

  /// Binds a random variable or deterministic. A name is bound at most once.
  pub fn add_rv(&mut self, name: Var, node: Node) -> Result<Rc<Node>> {
    if self.nodes.contains_key(&name) {
      return Err(CompileError::AssignAfterDistributed(name));
    }
    let node = Rc::new(node);
    debug!("bind {}", node);
    self.nodes.insert(name, node.clone());
    self.node_order.push(name);
    Ok(node)
  }

  /// Attaches data to a name. This must happen before the name is bound to a
  /// node, and only once.
  pub fn add_data(&mut self, name: Var, array: Array) -> Result<()> {
    if self.data.contains_key(&name) {
      return Err(CompileError::DuplicateVariable(name));
    }
    if self.nodes.contains_key(&name) {
      return Err(CompileError::AssignAfterDistributed(name));
    }
    debug!("data {} with shape {}", name, shape_of(&array));
    self.data.insert(name, array);
    self.data_order.push(name);
    Ok(())
  }

  pub fn lookup_rv(&self, name: Var) -> Option<Rc<Node>> {
    self.nodes.get(&name).cloned()
  }

  pub fn lookup_data(&self, name: Var) -> Option<&Array> {
    self.data.get(&name)
  }

  /// Resolves an identifier to a node. Data that has never been referenced
  /// is wrapped in a `Node::Data` leaf on first use and bound under its name,
  /// so later references share that leaf.
  pub fn resolve(&mut self, name: Var) -> Result<Rc<Node>> {
    if let Some(node) = self.lookup_rv(name) {
      return Ok(node);
    }
    match self.data.get(&name) {
      Some(array) => {
        let leaf = Node::Data(name, array.clone());
        self.add_rv(name, leaf)
      }
      None => Err(CompileError::UninitializedVariable(name)),
    }
  }

  pub fn lookup_shape(&self, name: Var) -> Result<Shape> {
    if let Some(node) = self.nodes.get(&name) {
      return node.shape().ok_or(CompileError::UnknownShape(name));
    }
    match self.data.get(&name) {
      Some(array) => Ok(shape_of(array)),
      None => Err(CompileError::UninitializedVariable(name)),
    }
  }

  pub fn get(&self, name: Var) -> Option<&Node> {
    self.nodes.get(&name).map(|node| node.as_ref())
  }

  /// Bound nodes in binding order, including memoized data leaves.
  pub fn nodes(&self) -> impl Iterator<Item = (Var, &Node)> + '_ {
    self
      .node_order
      .iter()
      .map(move |name| (*name, self.nodes[name].as_ref()))
  }

  /// Data arrays in assignment order.
  pub fn data(&self) -> impl Iterator<Item = (Var, &Array)> + '_ {
    self
      .data_order
      .iter()
      .map(move |name| (*name, &self.data[name]))
  }

  pub fn random_variables(&self) -> impl Iterator<Item = &RandomVariable> + '_ {
    self.nodes().filter_map(|(_, node)| node.as_rv())
  }

  /// Random variables with attached data, i.e. the likelihood terms.
  pub fn observed(&self) -> impl Iterator<Item = &RandomVariable> + '_ {
    self.random_variables().filter(|rv| rv.is_observed())
  }

  pub fn latent(&self) -> impl Iterator<Item = &RandomVariable> + '_ {
    self.random_variables().filter(|rv| !rv.is_observed())
  }

  /// Names `name`'s node is computed from. Empty for unbound names.
  pub fn dependencies(&self, name: Var) -> Vec<Var> {
    self
      .nodes
      .get(&name)
      .map(|node| node.parents())
      .unwrap_or_default()
  }

  /// Number of distinct names holding a node, data, or both.
  pub fn len(&self) -> usize {
    let data_only = self
      .data_order
      .iter()
      .filter(|name| !self.nodes.contains_key(*name))
      .count();
    self.node_order.len() + data_only
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }
}
