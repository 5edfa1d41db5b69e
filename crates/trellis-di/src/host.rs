//! Contracts between the resolver and the container hosting it
//!
//! The resolver never reaches into a concrete container. Everything it
//! needs (dependency lookup, value resolution, dependency-edge
//! registration, factory beans, conversion and instantiation) goes through
//! the traits below, bundled by [`ResolverHost`].

use crate::context::{InjectionPoint, ResolutionContext};
use crate::convert::TypeConverter;
use crate::definition::{BeanDefinition, DeclaredValue};
use crate::error::{BeanError, BeanResult};
use crate::executable::BeanClass;
use crate::instantiate::InstantiationStrategy;
use crate::types::BeanType;
use crate::value::Value;
use indexmap::IndexSet;
use std::sync::Arc;

/// A dependency to satisfy from the container
#[derive(Debug, Clone)]
pub struct DependencyDescriptor {
	injection_point: InjectionPoint,
	required: bool,
}

impl DependencyDescriptor {
	pub fn new(injection_point: InjectionPoint, required: bool) -> Self {
		Self {
			injection_point,
			required,
		}
	}

	pub fn injection_point(&self) -> &InjectionPoint {
		&self.injection_point
	}

	pub fn dependency_type(&self) -> &BeanType {
		self.injection_point.parameter_type()
	}

	/// Parameter name, used to narrow several candidates down to one
	pub fn dependency_name(&self) -> Option<&str> {
		self.injection_point.parameter_name()
	}

	pub fn is_required(&self) -> bool {
		self.required
	}
}

/// Looks up beans matching a dependency
pub trait DependencyLookup {
	/// Resolve `descriptor` for `requesting_bean`
	///
	/// Names of the beans used are added to `autowired_bean_names` when
	/// given. Fails with [`BeanError::NoSuchBean`] when nothing matches and
	/// [`BeanError::NoUniqueBean`] when several beans match and none can
	/// be preferred.
	fn resolve_dependency(
		&self,
		descriptor: &DependencyDescriptor,
		requesting_bean: &str,
		autowired_bean_names: Option<&mut IndexSet<String>>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value>;
}

/// Turns declared configuration values into runtime values
pub trait ValueResolver {
	fn resolve_value_if_necessary(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		argument_name: &str,
		value: &DeclaredValue,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value>;

	/// Evaluate placeholders in a string literal
	fn evaluate_string(&self, value: &str, _definition: &BeanDefinition) -> BeanResult<Value> {
		Ok(Value::Str(value.to_string()))
	}
}

/// Records which beans were wired into which
pub trait DependentRegistry {
	fn register_dependent_bean(&self, dependency: &str, dependent: &str);
}

/// Access to factory beans by name
pub trait FactoryBeanAccess {
	fn get_bean(&self, name: &str, ctx: &mut ResolutionContext) -> BeanResult<Value>;

	/// Class declaring the methods of instances of `ty`
	fn class_of_type(&self, ty: &BeanType) -> Option<Arc<BeanClass>>;

	/// Class of the named bean, from its instance or its predicted type
	fn bean_class_of(&self, name: &str) -> Option<Arc<BeanClass>>;
}

/// Everything the resolver needs from its container
pub trait ResolverHost: DependencyLookup + ValueResolver + DependentRegistry + FactoryBeanAccess + Send + Sync {
	fn type_converter(&self) -> &dyn TypeConverter;

	fn instantiation_strategy(&self) -> &dyn InstantiationStrategy;

	/// Receives the causes not reported when every candidate failed
	fn on_suppressed_error(&self, _error: BeanError) {}
}
