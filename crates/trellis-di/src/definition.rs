//! Bean definitions and declared constructor arguments

use crate::cache::ResolutionCache;
use crate::executable::{BeanClass, Executable};
use crate::scope::Scope;
use crate::types::BeanType;
use crate::value::Value;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use trellis_conf::ResolutionSettings;

/// Configuration metadata for one argument, before resolution
#[derive(Debug, Clone)]
pub enum DeclaredValue {
	/// A literal; strings are evaluated for `${...}` placeholders
	Value(Value),
	/// Reference to another bean by name
	Reference(String),
	/// Anonymous bean created for this argument only
	InnerBean(Arc<BeanDefinition>),
	List(Vec<DeclaredValue>),
}

impl DeclaredValue {
	pub fn reference(name: impl Into<String>) -> Self {
		DeclaredValue::Reference(name.into())
	}

	/// Whether a cached replay has to resolve this value again
	///
	/// Only plain non-string literals can be reused as they are.
	pub fn requires_reresolution(&self) -> bool {
		!matches!(self, DeclaredValue::Value(v) if !matches!(v, Value::Str(_)))
	}
}

impl From<Value> for DeclaredValue {
	fn from(value: Value) -> Self {
		DeclaredValue::Value(value)
	}
}

impl From<&str> for DeclaredValue {
	fn from(value: &str) -> Self {
		DeclaredValue::Value(Value::Str(value.to_string()))
	}
}

impl From<i32> for DeclaredValue {
	fn from(value: i32) -> Self {
		DeclaredValue::Value(Value::Int(value))
	}
}

/// A declared value after resolution, remembering where it came from
#[derive(Debug, Clone)]
pub struct ResolvedValue {
	pub value: Value,
	pub source: DeclaredValue,
}

/// Values that can be checked against a parameter type during lookup
pub trait HolderValue {
	fn is_assignable_to(&self, ty: &BeanType) -> bool;
}

impl HolderValue for DeclaredValue {
	fn is_assignable_to(&self, ty: &BeanType) -> bool {
		match self {
			DeclaredValue::Value(value) => ty.is_assignable_value(value),
			_ => false,
		}
	}
}

impl HolderValue for ResolvedValue {
	fn is_assignable_to(&self, ty: &BeanType) -> bool {
		ty.is_assignable_value(&self.value)
	}
}

/// One declared argument with its optional type and name hints
#[derive(Debug, Clone)]
pub struct ValueHolder<V = DeclaredValue> {
	pub value: V,
	pub type_name: Option<String>,
	pub name: Option<String>,
	pub converted: Option<Value>,
}

impl<V> ValueHolder<V> {
	pub fn new(value: impl Into<V>) -> Self {
		Self {
			value: value.into(),
			type_name: None,
			name: None,
			converted: None,
		}
	}

	/// Restrict matching to parameters of the named type
	pub fn with_type(mut self, type_name: impl Into<String>) -> Self {
		self.type_name = Some(type_name.into());
		self
	}

	/// Restrict matching to the parameter with this name
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());
		self
	}

	/// Mark the holder as already converted to `value`
	pub fn with_converted(mut self, value: Value) -> Self {
		self.converted = Some(value);
		self
	}

	pub fn is_converted(&self) -> bool {
		self.converted.is_some()
	}

	fn map_value<W>(&self, value: W) -> ValueHolder<W> {
		ValueHolder {
			value,
			type_name: self.type_name.clone(),
			name: self.name.clone(),
			converted: self.converted.clone(),
		}
	}
}

/// Identifies a holder within an [`ArgumentValues`] set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HolderSlot {
	Indexed(usize),
	Generic(usize),
}

/// Indexed and generic argument values
#[derive(Debug, Clone)]
pub struct ArgumentValues<V = DeclaredValue> {
	indexed: BTreeMap<usize, ValueHolder<V>>,
	generic: Vec<ValueHolder<V>>,
}

/// Declared arguments of a bean definition
pub type ConstructorArgumentValues = ArgumentValues<DeclaredValue>;

/// Declared arguments after value resolution
pub type ResolvedArgumentValues = ArgumentValues<ResolvedValue>;

impl<V> Default for ArgumentValues<V> {
	fn default() -> Self {
		Self {
			indexed: BTreeMap::new(),
			generic: Vec::new(),
		}
	}
}

impl<V: HolderValue> ArgumentValues<V> {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add_indexed(&mut self, index: usize, holder: ValueHolder<V>) {
		self.indexed.insert(index, holder);
	}

	pub fn add_generic(&mut self, holder: ValueHolder<V>) {
		self.generic.push(holder);
	}

	pub fn indexed(&self) -> &BTreeMap<usize, ValueHolder<V>> {
		&self.indexed
	}

	pub fn generic(&self) -> &[ValueHolder<V>] {
		&self.generic
	}

	pub fn argument_count(&self) -> usize {
		self.indexed.len() + self.generic.len()
	}

	pub fn is_empty(&self) -> bool {
		self.argument_count() == 0
	}

	/// Holder declared for `index`, if its hints accept the parameter
	///
	/// A required name of `Some("")` means the parameter name is unknown
	/// and accepts any named holder.
	pub fn indexed_argument_value(
		&self,
		index: usize,
		required_type: Option<&BeanType>,
		required_name: Option<&str>,
	) -> Option<&ValueHolder<V>> {
		let holder = self.indexed.get(&index)?;
		let type_ok = match &holder.type_name {
			None => true,
			Some(type_name) => required_type.is_some_and(|ty| ty.matches_type_name(type_name)),
		};
		let name_ok = match &holder.name {
			None => true,
			Some(name) => matches!(required_name, Some(required) if required.is_empty() || required == name),
		};
		(type_ok && name_ok).then_some(holder)
	}

	/// First unused generic holder accepted by the given requirements
	///
	/// Named holders need a matching (or unknown) name, typed holders a
	/// matching type; untyped unnamed holders need a value assignable to
	/// the required type. With no requirements only untyped unnamed
	/// holders qualify.
	pub fn generic_argument_value(
		&self,
		required_type: Option<&BeanType>,
		required_name: Option<&str>,
		used: &HashSet<HolderSlot>,
	) -> Option<(HolderSlot, &ValueHolder<V>)> {
		self.generic.iter().enumerate().find_map(|(i, holder)| {
			let slot = HolderSlot::Generic(i);
			if used.contains(&slot) {
				return None;
			}
			if let Some(name) = &holder.name {
				match required_name {
					Some(required) if required.is_empty() || required == name => {}
					_ => return None,
				}
			}
			if let Some(type_name) = &holder.type_name {
				if !required_type.is_some_and(|ty| ty.matches_type_name(type_name)) {
					return None;
				}
			}
			if let Some(ty) = required_type {
				if holder.type_name.is_none() && holder.name.is_none() && !holder.value.is_assignable_to(ty) {
					return None;
				}
			}
			Some((slot, holder))
		})
	}

	/// Indexed holder for `index`, falling back to a generic one
	pub fn argument_value(
		&self,
		index: usize,
		required_type: &BeanType,
		required_name: Option<&str>,
		used: &HashSet<HolderSlot>,
	) -> Option<(HolderSlot, &ValueHolder<V>)> {
		self.indexed_argument_value(index, Some(required_type), required_name)
			.map(|holder| (HolderSlot::Indexed(index), holder))
			.or_else(|| self.generic_argument_value(Some(required_type), required_name, used))
	}
}

impl ConstructorArgumentValues {
	/// Resolve every declared value with `resolve`, keeping hints
	pub(crate) fn resolve_with<E>(
		&self,
		mut resolve: impl FnMut(&ValueHolder<DeclaredValue>) -> Result<Value, E>,
	) -> Result<ResolvedArgumentValues, E> {
		let mut resolved = ResolvedArgumentValues::new();
		for (index, holder) in &self.indexed {
			let value = match &holder.converted {
				Some(converted) => converted.clone(),
				None => resolve(holder)?,
			};
			resolved.add_indexed(
				*index,
				holder.map_value(ResolvedValue {
					value,
					source: holder.value.clone(),
				}),
			);
		}
		for holder in &self.generic {
			let value = match &holder.converted {
				Some(converted) => converted.clone(),
				None => resolve(holder)?,
			};
			resolved.add_generic(holder.map_value(ResolvedValue {
				value,
				source: holder.value.clone(),
			}));
		}
		Ok(resolved)
	}

	/// Smallest argument count a candidate must accept
	pub fn min_argument_count(&self) -> usize {
		let highest_index = self.indexed.keys().next_back().map(|i| i + 1).unwrap_or(0);
		self.argument_count().max(highest_index)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutowireMode {
	/// Only declared arguments are used
	#[default]
	No,
	/// Unmatched parameters are satisfied from the container by type
	Constructor,
}

/// Everything the container knows about how to create one bean
#[derive(Debug)]
pub struct BeanDefinition {
	bean_class: Option<Arc<BeanClass>>,
	factory_bean_name: Option<String>,
	factory_method_name: Option<String>,
	unique_factory_method: bool,
	constructor_arguments: ConstructorArgumentValues,
	autowire_mode: AutowireMode,
	lenient_constructor_resolution: bool,
	non_public_access_allowed: bool,
	scope: Scope,
	primary: bool,
	resolution: ResolutionCache,
	factory_method_to_introspect: RwLock<Option<Arc<Executable>>>,
}

impl BeanDefinition {
	/// Start a definition with default settings
	pub fn builder() -> BeanDefinitionBuilder {
		BeanDefinitionBuilder::new(&ResolutionSettings::default())
	}

	/// Start a definition for `class`
	pub fn for_class(class: &Arc<BeanClass>) -> BeanDefinitionBuilder {
		Self::builder().bean_class(class)
	}

	pub fn bean_class(&self) -> Option<&Arc<BeanClass>> {
		self.bean_class.as_ref()
	}

	pub fn bean_class_name(&self) -> &str {
		self.bean_class.as_ref().map(|c| c.name()).unwrap_or("<none>")
	}

	pub fn factory_bean_name(&self) -> Option<&str> {
		self.factory_bean_name.as_deref()
	}

	pub fn factory_method_name(&self) -> Option<&str> {
		self.factory_method_name.as_deref()
	}

	pub fn is_unique_factory_method(&self) -> bool {
		self.unique_factory_method
	}

	/// Whether `executable` is a method with the configured factory method name
	pub fn is_factory_method(&self, executable: &Executable) -> bool {
		matches!(
			(executable.method_name(), self.factory_method_name()),
			(Some(name), Some(expected)) if name == expected
		)
	}

	pub fn constructor_argument_values(&self) -> &ConstructorArgumentValues {
		&self.constructor_arguments
	}

	pub fn has_constructor_argument_values(&self) -> bool {
		!self.constructor_arguments.is_empty()
	}

	pub fn autowire_mode(&self) -> AutowireMode {
		self.autowire_mode
	}

	pub fn is_lenient_constructor_resolution(&self) -> bool {
		self.lenient_constructor_resolution
	}

	pub fn is_non_public_access_allowed(&self) -> bool {
		self.non_public_access_allowed
	}

	pub fn scope(&self) -> Scope {
		self.scope
	}

	pub fn is_primary(&self) -> bool {
		self.primary
	}

	/// The resolution cache of this definition
	pub fn resolution(&self) -> &ResolutionCache {
		&self.resolution
	}

	/// The factory method chosen or uniquely identified so far
	pub fn factory_method_to_introspect(&self) -> Option<Arc<Executable>> {
		self.factory_method_to_introspect.read().clone()
	}

	pub(crate) fn set_factory_method_to_introspect(&self, method: Arc<Executable>) {
		*self.factory_method_to_introspect.write() = Some(method);
	}

	/// Type of the bean this definition produces, when known without creating it
	pub fn predicted_type(&self) -> Option<BeanType> {
		if self.factory_method_name.is_some() {
			return self.factory_method_to_introspect().map(|m| m.return_type().clone());
		}
		self.bean_class.as_ref().map(|c| c.bean_type().clone())
	}
}

/// Builder for [`BeanDefinition`]
///
/// # Examples
///
/// ```
/// use trellis_di::{AutowireMode, BeanClass, BeanDefinition, BeanType, Scope};
///
/// let class = BeanClass::builder(&BeanType::class("Widget")).build();
/// let definition = BeanDefinition::for_class(&class)
///     .constructor_arg_at(0, "left")
///     .autowire(AutowireMode::Constructor)
///     .scope(Scope::Prototype)
///     .build();
///
/// assert_eq!(definition.constructor_argument_values().min_argument_count(), 1);
/// assert_eq!(definition.scope(), Scope::Prototype);
/// ```
#[derive(Debug)]
pub struct BeanDefinitionBuilder {
	bean_class: Option<Arc<BeanClass>>,
	factory_bean_name: Option<String>,
	factory_method_name: Option<String>,
	unique_factory_method: bool,
	constructor_arguments: ConstructorArgumentValues,
	autowire_mode: AutowireMode,
	lenient_constructor_resolution: bool,
	non_public_access_allowed: bool,
	scope: Scope,
	primary: bool,
}

impl BeanDefinitionBuilder {
	/// Start a definition taking its flags from `settings`
	pub fn new(settings: &ResolutionSettings) -> Self {
		Self {
			bean_class: None,
			factory_bean_name: None,
			factory_method_name: None,
			unique_factory_method: false,
			constructor_arguments: ConstructorArgumentValues::new(),
			autowire_mode: AutowireMode::No,
			lenient_constructor_resolution: settings.lenient_constructor_resolution,
			non_public_access_allowed: settings.non_public_access_allowed,
			scope: Scope::Singleton,
			primary: false,
		}
	}

	pub fn bean_class(mut self, class: &Arc<BeanClass>) -> Self {
		self.bean_class = Some(Arc::clone(class));
		self
	}

	/// Create the bean by calling an instance method on the named bean
	pub fn factory_bean(mut self, name: impl Into<String>) -> Self {
		self.factory_bean_name = Some(name.into());
		self
	}

	pub fn factory_method(mut self, name: impl Into<String>) -> Self {
		self.factory_method_name = Some(name.into());
		self
	}

	/// Declare that the factory method name has exactly one overload
	pub fn unique_factory_method(mut self, unique: bool) -> Self {
		self.unique_factory_method = unique;
		self
	}

	/// Add a generic argument value
	pub fn constructor_arg(mut self, value: impl Into<DeclaredValue>) -> Self {
		self.constructor_arguments.add_generic(ValueHolder::new(value));
		self
	}

	pub fn constructor_arg_holder(mut self, holder: ValueHolder) -> Self {
		self.constructor_arguments.add_generic(holder);
		self
	}

	/// Add an argument value for parameter `index`
	pub fn constructor_arg_at(mut self, index: usize, value: impl Into<DeclaredValue>) -> Self {
		self.constructor_arguments.add_indexed(index, ValueHolder::new(value));
		self
	}

	pub fn indexed_arg_holder(mut self, index: usize, holder: ValueHolder) -> Self {
		self.constructor_arguments.add_indexed(index, holder);
		self
	}

	pub fn autowire(mut self, mode: AutowireMode) -> Self {
		self.autowire_mode = mode;
		self
	}

	pub fn lenient(mut self, lenient: bool) -> Self {
		self.lenient_constructor_resolution = lenient;
		self
	}

	pub fn non_public_access(mut self, allowed: bool) -> Self {
		self.non_public_access_allowed = allowed;
		self
	}

	pub fn scope(mut self, scope: Scope) -> Self {
		self.scope = scope;
		self
	}

	pub fn primary(mut self, primary: bool) -> Self {
		self.primary = primary;
		self
	}

	pub fn build(self) -> Arc<BeanDefinition> {
		Arc::new(BeanDefinition {
			bean_class: self.bean_class,
			factory_bean_name: self.factory_bean_name,
			factory_method_name: self.factory_method_name,
			unique_factory_method: self.unique_factory_method,
			constructor_arguments: self.constructor_arguments,
			autowire_mode: self.autowire_mode,
			lenient_constructor_resolution: self.lenient_constructor_resolution,
			non_public_access_allowed: self.non_public_access_allowed,
			scope: self.scope,
			primary: self.primary,
			resolution: ResolutionCache::new(),
			factory_method_to_introspect: RwLock::new(None),
		})
	}
}
