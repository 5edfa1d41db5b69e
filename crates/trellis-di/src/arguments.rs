//! Matched arguments of one candidate and their ranking weights

use crate::cache::{CachedArguments, CachedResolution, PreparedArgument};
use crate::definition::BeanDefinition;
use crate::executable::Executable;
use crate::types::BeanType;
use crate::value::Value;
use std::sync::Arc;

/// Penalty subtracted from the raw-argument weight so that raw matches win ties
const RAW_ARGUMENT_BONUS: i32 = 1024;

/// How a parameter slot was bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterBinding {
	/// Caller-supplied argument at the same position
	ExplicitPositional,
	/// Declared argument for this index
	DeclaredIndexed,
	/// Declared argument without an index
	DeclaredGeneric,
	/// Bean looked up from the container by type
	Autowired,
	/// Nothing matched; an empty array, collection or map was used
	AutowiredFallbackEmpty,
}

/// Argument vectors produced for one candidate executable
///
/// `raw_arguments` are the values before conversion, `arguments` the
/// converted values passed to the executable, and `prepared_arguments` the
/// per-slot recipes stored in the cache when `resolve_necessary` is set.
#[derive(Debug, Clone, Default)]
pub struct ArgumentsHolder {
	pub raw_arguments: Vec<Value>,
	pub arguments: Vec<Value>,
	pub prepared_arguments: Vec<PreparedArgument>,
	pub bindings: Vec<ParameterBinding>,
	pub resolve_necessary: bool,
}

impl ArgumentsHolder {
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			raw_arguments: Vec::with_capacity(capacity),
			arguments: Vec::with_capacity(capacity),
			prepared_arguments: Vec::with_capacity(capacity),
			bindings: Vec::with_capacity(capacity),
			resolve_necessary: false,
		}
	}

	pub(crate) fn push(&mut self, raw: Value, converted: Value, prepared: PreparedArgument, binding: ParameterBinding) {
		self.raw_arguments.push(raw);
		self.arguments.push(converted);
		self.prepared_arguments.push(prepared);
		self.bindings.push(binding);
	}

	pub fn len(&self) -> usize {
		self.arguments.len()
	}

	pub fn is_empty(&self) -> bool {
		self.arguments.is_empty()
	}

	/// Weight used in lenient mode; lower is a closer match
	///
	/// The raw arguments are weighted too, minus a fixed bonus, so an
	/// executable matching the unconverted values is preferred over one
	/// that only matches after conversion.
	pub fn type_difference_weight(&self, parameter_types: &[BeanType]) -> i32 {
		let converted = type_difference_weight(parameter_types, &self.arguments);
		let raw = type_difference_weight(parameter_types, &self.raw_arguments).saturating_sub(RAW_ARGUMENT_BONUS);
		converted.min(raw)
	}

	/// Weight used in strict mode
	///
	/// Every candidate that matched at all gets one of three fixed weights,
	/// so two matching candidates always tie.
	pub fn assignability_weight(&self, parameter_types: &[BeanType]) -> i32 {
		let assignable = |args: &[Value]| {
			parameter_types
				.iter()
				.zip(args)
				.all(|(ty, arg)| ty.is_assignable_value(arg))
		};
		if !assignable(&self.arguments) {
			i32::MAX
		} else if !assignable(&self.raw_arguments) {
			i32::MAX - 512
		} else {
			i32::MAX - RAW_ARGUMENT_BONUS
		}
	}

	/// Remember `executable` and these arguments on the definition
	///
	/// Stores per-slot recipes when any slot must be resolved again on
	/// replay, the final arguments otherwise.
	pub fn store_cache(&self, definition: &BeanDefinition, executable: Arc<Executable>) {
		let arguments = if self.resolve_necessary {
			CachedArguments::Prepared(self.prepared_arguments.clone())
		} else {
			CachedArguments::Resolved(self.arguments.clone())
		};
		definition.resolution().write(CachedResolution { executable, arguments });
	}
}

/// Closeness of `args` to `parameter_types`; lower is closer
///
/// `i32::MAX` when any argument is not assignable. Otherwise each argument
/// adds 2 for every superclass step between its runtime type and the
/// parameter type, and 1 when the parameter type is an interface.
pub fn type_difference_weight(parameter_types: &[BeanType], args: &[Value]) -> i32 {
	let mut result = 0i32;
	for (parameter_type, arg) in parameter_types.iter().zip(args) {
		if !parameter_type.is_assignable_value(arg) {
			return i32::MAX;
		}
		if let Some(arg_type) = arg.runtime_type() {
			let mut superclass = arg_type.superclass().cloned();
			while let Some(current) = superclass {
				if parameter_type == &current {
					result = result.saturating_add(2);
					superclass = None;
				} else if parameter_type.is_assignable_from(&current) {
					result = result.saturating_add(2);
					superclass = current.superclass().cloned();
				} else {
					superclass = None;
				}
			}
			if parameter_type.is_interface() {
				result = result.saturating_add(1);
			}
		}
	}
	result
}
