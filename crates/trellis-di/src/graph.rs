//! Dependent-bean edges
//!
//! Every time a bean is wired with another bean (a constructor argument, a
//! factory bean, a bean reference) the edge `dependency -> dependent` is
//! recorded here. The graph answers who depends on whom and can be
//! exported in DOT format for Graphviz.
//!
//! ## Example
//!
//! ```rust
//! use trellis_di::DependentBeanGraph;
//!
//! let graph = DependentBeanGraph::new();
//! graph.register_dependent_bean("gear", "widget");
//!
//! assert_eq!(graph.dependents_of("gear"), vec!["widget".to_string()]);
//! assert!(graph.to_dot().contains("\"widget\" -> \"gear\""));
//! ```

use indexmap::{IndexMap, IndexSet};
use std::collections::HashSet;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Default)]
struct Edges {
	/// dependency -> beans depending on it
	dependents: IndexMap<String, IndexSet<String>>,
	/// dependent -> beans it depends on
	dependencies: IndexMap<String, IndexSet<String>>,
}

/// Registry of dependency edges between named beans
#[derive(Debug, Default)]
pub struct DependentBeanGraph {
	edges: RwLock<Edges>,
}

impl DependentBeanGraph {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record that `dependent` was wired with `dependency`
	pub fn register_dependent_bean(&self, dependency: &str, dependent: &str) {
		let mut edges = self.edges.write().unwrap_or_else(PoisonError::into_inner);
		edges
			.dependents
			.entry(dependency.to_string())
			.or_default()
			.insert(dependent.to_string());
		edges
			.dependencies
			.entry(dependent.to_string())
			.or_default()
			.insert(dependency.to_string());
	}

	/// Beans wired with `bean_name`, in registration order
	pub fn dependents_of(&self, bean_name: &str) -> Vec<String> {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
		edges
			.dependents
			.get(bean_name)
			.map(|set| set.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Beans `bean_name` was wired with, in registration order
	pub fn dependencies_of(&self, bean_name: &str) -> Vec<String> {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
		edges
			.dependencies
			.get(bean_name)
			.map(|set| set.iter().cloned().collect())
			.unwrap_or_default()
	}

	/// Whether `dependent` depends on `bean_name`, directly or transitively
	pub fn is_dependent(&self, bean_name: &str, dependent: &str) -> bool {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
		let mut seen = HashSet::new();
		let mut pending = vec![bean_name];
		while let Some(current) = pending.pop() {
			if !seen.insert(current) {
				continue;
			}
			if let Some(direct) = edges.dependents.get(current) {
				if direct.contains(dependent) {
					return true;
				}
				pending.extend(direct.iter().map(String::as_str));
			}
		}
		false
	}

	/// Order in which `bean_names` can be torn down: dependents first
	///
	/// Beans on a cycle keep their relative input order.
	pub fn destruction_order(&self, bean_names: &[String]) -> Vec<String> {
		let mut order = Vec::with_capacity(bean_names.len());
		let mut visited = HashSet::new();
		for name in bean_names {
			self.visit_dependents_first(name, bean_names, &mut visited, &mut order);
		}
		order
	}

	fn visit_dependents_first(
		&self,
		name: &str,
		scope: &[String],
		visited: &mut HashSet<String>,
		order: &mut Vec<String>,
	) {
		if !visited.insert(name.to_string()) {
			return;
		}
		for dependent in self.dependents_of(name) {
			if scope.contains(&dependent) {
				self.visit_dependents_first(&dependent, scope, visited, order);
			}
		}
		order.push(name.to_string());
	}

	pub fn edge_count(&self) -> usize {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
		edges.dependents.values().map(IndexSet::len).sum()
	}

	/// Generate DOT format output for Graphviz
	///
	/// Edges point from the dependent bean to its dependency.
	pub fn to_dot(&self) -> String {
		let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);
		let mut output = String::from("digraph DependentBeans {\n");
		output.push_str("  rankdir=LR;\n");
		output.push_str("  node [shape=box, style=rounded];\n\n");

		let mut nodes: IndexSet<&str> = IndexSet::new();
		for (dependency, dependents) in &edges.dependents {
			nodes.insert(dependency);
			nodes.extend(dependents.iter().map(String::as_str));
		}
		for node in &nodes {
			output.push_str(&format!("  \"{}\";\n", node));
		}

		output.push('\n');

		for (dependency, dependents) in &edges.dependents {
			for dependent in dependents {
				output.push_str(&format!("  \"{}\" -> \"{}\";\n", dependent, dependency));
			}
		}

		output.push_str("}\n");
		output
	}
}
