//! Per-definition resolution cache
//!
//! Once a candidate has been chosen for a definition, the choice and its
//! arguments are remembered so later creations skip the candidate search.
//! The slot is guarded by a single mutex; readers take a snapshot and never
//! observe a half-written entry.

use crate::definition::DeclaredValue;
use crate::executable::Executable;
use crate::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;

/// One argument slot of a partially cached resolution
#[derive(Debug, Clone)]
pub enum PreparedArgument {
	/// Reused as is (strings are still evaluated for placeholders)
	Value(Value),
	/// Looked up from the container again on every replay
	Autowired,
	/// Resolved again from its declaration on every replay
	Declared(DeclaredValue),
}

#[derive(Debug, Clone)]
pub enum CachedArguments {
	/// Final arguments, usable without further work
	Resolved(Vec<Value>),
	/// Per-slot recipes replayed on every creation
	Prepared(Vec<PreparedArgument>),
}

/// A remembered executable and its arguments
#[derive(Debug, Clone)]
pub struct CachedResolution {
	pub executable: Arc<Executable>,
	pub arguments: CachedArguments,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
	Empty,
	/// Arguments fully resolved
	Full,
	/// Arguments must be replayed
	Partial,
}

/// Mutex-guarded cache slot of a bean definition
#[derive(Debug, Default)]
pub struct ResolutionCache {
	slot: Mutex<Option<CachedResolution>>,
}

impl ResolutionCache {
	pub fn new() -> Self {
		Self::default()
	}

	/// Snapshot of the cached resolution, if any
	pub fn try_read(&self) -> Option<CachedResolution> {
		self.slot.lock().clone()
	}

	/// Store a resolution, replacing any previous one
	pub fn write(&self, entry: CachedResolution) {
		*self.slot.lock() = Some(entry);
	}

	pub fn clear(&self) {
		*self.slot.lock() = None;
	}

	pub fn state(&self) -> CacheState {
		match &*self.slot.lock() {
			None => CacheState::Empty,
			Some(CachedResolution {
				arguments: CachedArguments::Resolved(_),
				..
			}) => CacheState::Full,
			Some(CachedResolution {
				arguments: CachedArguments::Prepared(_),
				..
			}) => CacheState::Partial,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::BeanType;
	use rstest::rstest;

	fn executable() -> Arc<Executable> {
		Executable::constructor(&BeanType::class("Widget")).build(|_| Ok(Value::Null))
	}

	#[rstest]
	fn test_write_read_clear() {
		let cache = ResolutionCache::new();
		assert_eq!(cache.state(), CacheState::Empty);
		assert!(cache.try_read().is_none());

		cache.write(CachedResolution {
			executable: executable(),
			arguments: CachedArguments::Resolved(vec![Value::Int(1)]),
		});
		assert_eq!(cache.state(), CacheState::Full);
		let entry = cache.try_read().unwrap();
		assert!(matches!(entry.arguments, CachedArguments::Resolved(ref args) if args == &[Value::Int(1)]));

		cache.write(CachedResolution {
			executable: executable(),
			arguments: CachedArguments::Prepared(vec![PreparedArgument::Autowired]),
		});
		assert_eq!(cache.state(), CacheState::Partial);

		cache.clear();
		assert_eq!(cache.state(), CacheState::Empty);
	}
}
