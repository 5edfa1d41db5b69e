//! Bean scopes and the singleton registry

use crate::value::Value;
use indexmap::IndexMap;
use std::sync::{PoisonError, RwLock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
	/// One shared instance per factory
	#[default]
	Singleton,
	/// A new instance on every request
	Prototype,
}

/// Shared singleton instances keyed by bean name
#[derive(Debug, Default)]
pub struct SingletonRegistry {
	instances: RwLock<IndexMap<String, Value>>,
}

impl SingletonRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Retrieves the singleton registered under `name`.
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::{SingletonRegistry, Value};
	///
	/// let registry = SingletonRegistry::new();
	/// registry.insert("answer", Value::Int(42));
	///
	/// assert_eq!(registry.get("answer"), Some(Value::Int(42)));
	/// assert_eq!(registry.get("question"), None);
	/// ```
	pub fn get(&self, name: &str) -> Option<Value> {
		let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
		instances.get(name).cloned()
	}

	/// Stores a singleton, replacing any previous instance of that name
	pub fn insert(&self, name: impl Into<String>, value: Value) {
		let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
		instances.insert(name.into(), value);
	}

	pub fn remove(&self, name: &str) -> Option<Value> {
		let mut instances = self.instances.write().unwrap_or_else(PoisonError::into_inner);
		instances.shift_remove(name)
	}

	pub fn contains(&self, name: &str) -> bool {
		let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
		instances.contains_key(name)
	}

	/// Registered names in registration order
	pub fn names(&self) -> Vec<String> {
		let instances = self.instances.read().unwrap_or_else(PoisonError::into_inner);
		instances.keys().cloned().collect()
	}
}
