//! Default bean factory
//!
//! [`DefaultBeanFactory`] is an in-process container implementing every
//! collaborator contract the resolver needs: a definition registry,
//! singleton and prototype scopes, by-type dependency lookup, declared
//! value resolution (bean references, inner beans, `${...}` placeholders)
//! and the dependent-bean graph.
//!
//! ## Example
//!
//! ```rust
//! use trellis_di::{AutowireMode, BeanClass, BeanType, DefaultBeanFactory, Executable, Value};
//!
//! struct Gear;
//! struct Widget;
//!
//! let gear_ty = BeanType::class("Gear");
//! let widget_ty = BeanType::class("Widget");
//!
//! let ty = gear_ty.clone();
//! let gear = BeanClass::builder(&gear_ty)
//!     .constructor(Executable::constructor(&gear_ty).build(move |_| Ok(Value::object(ty.clone(), Gear))))
//!     .build();
//! let ty = widget_ty.clone();
//! let widget = BeanClass::builder(&widget_ty)
//!     .constructor(
//!         Executable::constructor(&widget_ty)
//!             .param(gear_ty.clone())
//!             .build(move |_| Ok(Value::object(ty.clone(), Widget))),
//!     )
//!     .build();
//!
//! let factory = DefaultBeanFactory::new();
//! factory.register_bean_definition("gear", factory.definition_builder().bean_class(&gear).build());
//! factory.register_bean_definition(
//!     "widget",
//!     factory.definition_builder().bean_class(&widget).autowire(AutowireMode::Constructor).build(),
//! );
//!
//! let bean = factory.get_bean("widget").unwrap();
//! assert!(bean.downcast_ref::<Widget>().is_some());
//! assert_eq!(factory.dependents_of("gear"), vec!["widget".to_string()]);
//! ```

use crate::context::ResolutionContext;
use crate::convert::{SimpleTypeConverter, TypeConverter};
use crate::definition::{AutowireMode, BeanDefinition, BeanDefinitionBuilder, DeclaredValue};
use crate::error::{BeanError, BeanResult};
use crate::executable::{BeanClass, Executable};
use crate::graph::DependentBeanGraph;
use crate::host::{
	DependencyDescriptor, DependencyLookup, DependentRegistry, FactoryBeanAccess, ResolverHost, ValueResolver,
};
use crate::instantiate::{InstantiationStrategy, SimpleInstantiationStrategy};
use crate::resolver::ConstructorResolver;
use crate::scope::{Scope, SingletonRegistry};
use crate::types::{BeanType, CollectionKind, TypeKind};
use crate::value::Value;
use indexmap::{IndexMap, IndexSet};
use parking_lot::{Mutex, ReentrantMutex, RwLock};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};
use trellis_conf::{ResolutionSettings, SettingsError};

const INNER_BEAN_PREFIX: &str = "(inner bean)#";

thread_local! {
	/// Beans whose type is being predicted on this thread
	static PREDICTING: RefCell<HashSet<String>> = RefCell::new(HashSet::new());
}

/// In-process bean container
pub struct DefaultBeanFactory {
	settings: ResolutionSettings,
	definitions: RwLock<IndexMap<String, Arc<BeanDefinition>>>,
	classes: RwLock<IndexMap<String, Arc<BeanClass>>>,
	singletons: SingletonRegistry,
	singleton_lock: ReentrantMutex<()>,
	dependents: DependentBeanGraph,
	properties: RwLock<HashMap<String, String>>,
	converter: SimpleTypeConverter,
	instantiation: SimpleInstantiationStrategy,
	suppressed: Mutex<Vec<String>>,
	inner_bean_counter: AtomicUsize,
}

impl Default for DefaultBeanFactory {
	fn default() -> Self {
		Self::new()
	}
}

impl DefaultBeanFactory {
	pub fn new() -> Self {
		Self::from_validated(ResolutionSettings::default())
	}

	/// A factory resolving beans under `settings`
	///
	/// Fails when the settings do not validate, such as a depth limit of zero.
	pub fn with_settings(settings: ResolutionSettings) -> Result<Self, SettingsError> {
		settings.validate()?;
		Ok(Self::from_validated(settings))
	}

	fn from_validated(settings: ResolutionSettings) -> Self {
		Self {
			settings,
			definitions: RwLock::new(IndexMap::new()),
			classes: RwLock::new(IndexMap::new()),
			singletons: SingletonRegistry::new(),
			singleton_lock: ReentrantMutex::new(()),
			dependents: DependentBeanGraph::new(),
			properties: RwLock::new(HashMap::new()),
			converter: SimpleTypeConverter,
			instantiation: SimpleInstantiationStrategy,
			suppressed: Mutex::new(Vec::new()),
			inner_bean_counter: AtomicUsize::new(0),
		}
	}

	pub fn settings(&self) -> &ResolutionSettings {
		&self.settings
	}

	/// A definition builder preconfigured from this factory's settings
	pub fn definition_builder(&self) -> BeanDefinitionBuilder {
		BeanDefinitionBuilder::new(&self.settings)
	}

	/// A resolver backed by this factory
	pub fn resolver(&self) -> ConstructorResolver<'_> {
		ConstructorResolver::new(self)
	}

	/// A fresh context honoring the configured depth limit
	pub fn new_context(&self) -> ResolutionContext {
		ResolutionContext::from_settings(&self.settings)
	}

	/// Register or replace a definition
	///
	/// Replacing a definition drops the singleton created from the old one.
	pub fn register_bean_definition(&self, name: impl Into<String>, definition: Arc<BeanDefinition>) {
		let name = name.into();
		if let Some(class) = definition.bean_class() {
			self.register_class(class);
		}
		let previous = self.definitions.write().insert(name.clone(), definition);
		if previous.is_some() {
			debug!(bean = %name, "Overriding bean definition");
			self.singletons.remove(&name);
		}
	}

	pub fn bean_definition(&self, name: &str) -> Option<Arc<BeanDefinition>> {
		self.definitions.read().get(name).cloned()
	}

	pub fn contains_bean_definition(&self, name: &str) -> bool {
		self.definitions.read().contains_key(name)
	}

	pub fn bean_definition_names(&self) -> Vec<String> {
		self.definitions.read().keys().cloned().collect()
	}

	/// Make the methods of `class` available to beans of its type
	///
	/// Classes of registered definitions are known already. Register the
	/// class of a factory bean created by a factory method or registered as
	/// a ready-made singleton so its instance factory methods can be found.
	pub fn register_class(&self, class: &Arc<BeanClass>) {
		self.classes
			.write()
			.insert(class.bean_type().name().to_string(), Arc::clone(class));
	}

	/// Register a ready-made singleton without a definition
	pub fn register_singleton(&self, name: impl Into<String>, bean: Value) {
		self.singletons.insert(name, bean);
	}

	pub fn contains_singleton(&self, name: &str) -> bool {
		self.singletons.contains(name)
	}

	/// Set a property available to `${key}` placeholders
	pub fn set_property(&self, key: impl Into<String>, value: impl Into<String>) {
		self.properties.write().insert(key.into(), value.into());
	}

	/// Get or create the named bean
	pub fn get_bean(&self, name: &str) -> BeanResult<Value> {
		let mut ctx = self.new_context();
		self.do_get_bean(name, None, &mut ctx)
	}

	/// Create the named bean with caller-supplied constructor or factory arguments
	///
	/// An existing singleton is returned as is.
	pub fn get_bean_with_args(&self, name: &str, args: &[Value]) -> BeanResult<Value> {
		let mut ctx = self.new_context();
		self.do_get_bean(name, Some(args), &mut ctx)
	}

	/// Get the single bean assignable to `ty`
	pub fn get_bean_of_type(&self, ty: &BeanType) -> BeanResult<Value> {
		let candidates = self.find_autowire_candidates("", ty);
		let name = match candidates.as_slice() {
			[] => {
				return Err(BeanError::NoSuchBean {
					required_type: ty.name().to_string(),
					reason: "no bean of this type is registered".to_string(),
				});
			}
			[only] => only.clone(),
			_ => self.primary_candidate(&candidates, ty)?.ok_or_else(|| BeanError::NoUniqueBean {
				required_type: ty.name().to_string(),
				candidates: candidates.clone(),
			})?,
		};
		self.get_bean(&name)
	}

	/// Whether the named bean would be assignable to `ty`
	pub fn is_type_match(&self, name: &str, ty: &BeanType) -> bool {
		self.predict_bean_type(name)
			.is_some_and(|predicted| ty.is_assignable_from(&predicted))
	}

	/// Beans wired with the named bean
	pub fn dependents_of(&self, name: &str) -> Vec<String> {
		self.dependents.dependents_of(name)
	}

	/// Beans the named bean was wired with
	pub fn dependencies_of(&self, name: &str) -> Vec<String> {
		self.dependents.dependencies_of(name)
	}

	pub fn dependency_graph(&self) -> &DependentBeanGraph {
		&self.dependents
	}

	/// Messages of candidate failures that were not reported
	pub fn suppressed_errors(&self) -> Vec<String> {
		self.suppressed.lock().clone()
	}

	fn do_get_bean(&self, name: &str, explicit_args: Option<&[Value]>, ctx: &mut ResolutionContext) -> BeanResult<Value> {
		if explicit_args.is_none() {
			if let Some(bean) = self.singletons.get(name) {
				trace!(bean = %name, "Returning cached instance of singleton bean");
				return Ok(bean);
			}
		}

		let Some(definition) = self.bean_definition(name) else {
			return self
				.singletons
				.get(name)
				.ok_or_else(|| BeanError::NoSuchBeanNamed(name.to_string()));
		};

		match definition.scope() {
			Scope::Singleton => {
				let _guard = self.singleton_lock.lock();
				if let Some(bean) = self.singletons.get(name) {
					return Ok(bean);
				}
				let bean = self.create_bean(name, &definition, explicit_args, ctx)?;
				self.singletons.insert(name, bean.clone());
				Ok(bean)
			}
			Scope::Prototype => self.create_bean(name, &definition, explicit_args, ctx),
		}
	}

	fn create_bean(
		&self,
		name: &str,
		definition: &BeanDefinition,
		explicit_args: Option<&[Value]>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		ctx.within_creation(name, |ctx| {
			debug!(bean = %name, "Creating instance of bean");
			self.create_bean_instance(name, definition, explicit_args, ctx)
		})
	}

	fn create_bean_instance(
		&self,
		name: &str,
		definition: &BeanDefinition,
		explicit_args: Option<&[Value]>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		let resolver = self.resolver();
		if definition.factory_method_name().is_some() {
			return resolver.instantiate_using_factory_method(name, definition, explicit_args, ctx);
		}

		let Some(class) = definition.bean_class() else {
			return Err(BeanError::BeanDefinitionStore {
				bean_name: name.to_string(),
				message: "bean definition declares neither a bean class nor a factory method".to_string(),
			});
		};

		if explicit_args.is_none() && definition.resolution().try_read().is_some() {
			return resolver.autowire_constructor(name, definition, None, None, ctx);
		}

		let chosen = determine_candidate_constructors(class);
		if chosen.is_some()
			|| definition.autowire_mode() == AutowireMode::Constructor
			|| definition.has_constructor_argument_values()
			|| explicit_args.is_some()
		{
			return resolver.autowire_constructor(name, definition, chosen.as_deref(), explicit_args, ctx);
		}

		match class
			.default_constructor()
			.filter(|ctor| definition.is_non_public_access_allowed() || ctor.is_public())
		{
			Some(ctor) => resolver.autowire_constructor(name, definition, Some(std::slice::from_ref(ctor)), None, ctx),
			None => Err(BeanError::NoMatchingExecutable {
				bean_name: name.to_string(),
				message: format!("No default constructor found on bean class [{}]", class.name()),
			}),
		}
	}

	fn predict_bean_type(&self, name: &str) -> Option<BeanType> {
		if let Some(bean) = self.singletons.get(name) {
			return bean.runtime_type();
		}
		let definition = self.bean_definition(name)?;
		if definition.factory_method_name().is_some() && definition.factory_method_to_introspect().is_none() {
			// Predicting a factory-bean chain that loops back to `name` gives up
			let entered = PREDICTING.with(|predicting| predicting.borrow_mut().insert(name.to_string()));
			if !entered {
				return None;
			}
			self.resolver().resolve_factory_method_if_possible(&definition);
			PREDICTING.with(|predicting| predicting.borrow_mut().remove(name));
		}
		definition.predicted_type()
	}

	/// Names of beans assignable to `ty`, registration order, `requesting_bean` excluded
	fn find_autowire_candidates(&self, requesting_bean: &str, ty: &BeanType) -> Vec<String> {
		let mut names: IndexSet<String> = self.bean_definition_names().into_iter().collect();
		names.extend(self.singletons.names());
		names
			.into_iter()
			.filter(|name| name != requesting_bean && self.is_type_match(name, ty))
			.collect()
	}

	/// The single primary bean among `candidates`, if exactly one is marked
	fn primary_candidate(&self, candidates: &[String], ty: &BeanType) -> BeanResult<Option<String>> {
		let primaries: Vec<&String> = candidates
			.iter()
			.filter(|name| self.bean_definition(name).is_some_and(|d| d.is_primary()))
			.collect();
		match primaries.as_slice() {
			[] => Ok(None),
			[only] => Ok(Some((*only).clone())),
			_ => Err(BeanError::NoUniqueBean {
				required_type: ty.name().to_string(),
				candidates: primaries.into_iter().cloned().collect(),
			}),
		}
	}

	fn determine_autowire_candidate(
		&self,
		candidates: &[String],
		descriptor: &DependencyDescriptor,
	) -> BeanResult<Option<String>> {
		if let Some(primary) = self.primary_candidate(candidates, descriptor.dependency_type())? {
			return Ok(Some(primary));
		}
		Ok(descriptor
			.dependency_name()
			.and_then(|name| candidates.iter().find(|candidate| candidate.as_str() == name))
			.cloned())
	}

	fn resolve_multiple_beans(
		&self,
		descriptor: &DependencyDescriptor,
		requesting_bean: &str,
		autowired_bean_names: Option<&mut IndexSet<String>>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		let ty = descriptor.dependency_type();
		let element = ty.element_type().cloned().unwrap_or_else(BeanType::object);
		let names = self.find_autowire_candidates(requesting_bean, &element);
		if names.is_empty() {
			return Err(BeanError::NoSuchBean {
				required_type: element.name().to_string(),
				reason: format!("no beans found to populate {}", ty),
			});
		}

		let mut beans = Vec::with_capacity(names.len());
		for name in &names {
			beans.push(self.do_get_bean(name, None, ctx)?);
		}
		if let Some(autowired) = autowired_bean_names {
			autowired.extend(names.iter().cloned());
		}

		Ok(match ty.kind() {
			TypeKind::Array(element) => Value::Array {
				element: element.clone(),
				items: beans,
			},
			TypeKind::Collection(CollectionKind::Set, _) => Value::Set(beans),
			TypeKind::Map(..) => Value::Map(names.into_iter().map(Value::Str).zip(beans).collect()),
			_ => Value::List(beans),
		})
	}

	/// Replace `${key}` and `${key:default}` placeholders with properties
	fn resolve_placeholders(&self, text: &str) -> BeanResult<String> {
		let properties = self.properties.read();
		let mut result = String::with_capacity(text.len());
		let mut rest = text;
		while let Some(start) = rest.find("${") {
			let Some(len) = rest[start + 2..].find('}') else {
				break;
			};
			result.push_str(&rest[..start]);
			let placeholder = &rest[start + 2..start + 2 + len];
			let (key, default) = match placeholder.split_once(':') {
				Some((key, default)) => (key, Some(default)),
				None => (placeholder, None),
			};
			match properties.get(key).map(String::as_str).or(default) {
				Some(value) => result.push_str(value),
				None => {
					return Err(BeanError::IllegalState(format!(
						"Could not resolve placeholder '{}' in value \"{}\"",
						key, text
					)));
				}
			}
			rest = &rest[start + 2 + len + 1..];
		}
		result.push_str(rest);
		Ok(result)
	}
}

/// Constructors to autowire without an explicit autowire mode
///
/// A class declaring a single constructor that takes arguments is wired
/// through it.
fn determine_candidate_constructors(class: &BeanClass) -> Option<Vec<Arc<Executable>>> {
	match class.constructors() {
		[only] if only.parameter_count() > 0 => Some(vec![Arc::clone(only)]),
		_ => None,
	}
}

impl DependencyLookup for DefaultBeanFactory {
	fn resolve_dependency(
		&self,
		descriptor: &DependencyDescriptor,
		requesting_bean: &str,
		autowired_bean_names: Option<&mut IndexSet<String>>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		let ty = descriptor.dependency_type();
		if ty.is_container() {
			return self.resolve_multiple_beans(descriptor, requesting_bean, autowired_bean_names, ctx);
		}

		let candidates = self.find_autowire_candidates(requesting_bean, ty);
		let name = match candidates.as_slice() {
			[] if !descriptor.is_required() => return Ok(Value::Null),
			[] => {
				return Err(BeanError::NoSuchBean {
					required_type: ty.name().to_string(),
					reason: format!(
						"expected at least 1 bean which qualifies as autowire candidate for {}",
						descriptor.injection_point()
					),
				});
			}
			[only] => only.clone(),
			_ => self
				.determine_autowire_candidate(&candidates, descriptor)?
				.ok_or_else(|| BeanError::NoUniqueBean {
					required_type: ty.name().to_string(),
					candidates: candidates.clone(),
				})?,
		};

		if let Some(autowired) = autowired_bean_names {
			autowired.insert(name.clone());
		}
		self.do_get_bean(&name, None, ctx)
	}
}

impl ValueResolver for DefaultBeanFactory {
	fn resolve_value_if_necessary(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		argument_name: &str,
		value: &DeclaredValue,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		match value {
			DeclaredValue::Value(Value::Str(text)) => self.evaluate_string(text, definition),
			DeclaredValue::Value(value) => Ok(value.clone()),
			DeclaredValue::Reference(name) => {
				trace!(bean = %bean_name, reference = %name, "Resolving reference for {}", argument_name);
				let bean = self.do_get_bean(name, None, ctx)?;
				self.register_dependent_bean(name, bean_name);
				Ok(bean)
			}
			DeclaredValue::InnerBean(inner) => {
				let id = self.inner_bean_counter.fetch_add(1, Ordering::Relaxed);
				let inner_name = format!("{}{}", INNER_BEAN_PREFIX, id);
				self.create_bean(&inner_name, inner, None, ctx)
			}
			DeclaredValue::List(items) => items
				.iter()
				.map(|item| self.resolve_value_if_necessary(bean_name, definition, argument_name, item, ctx))
				.collect::<BeanResult<Vec<_>>>()
				.map(Value::List),
		}
	}

	fn evaluate_string(&self, value: &str, _definition: &BeanDefinition) -> BeanResult<Value> {
		self.resolve_placeholders(value).map(Value::Str)
	}
}

impl DependentRegistry for DefaultBeanFactory {
	fn register_dependent_bean(&self, dependency: &str, dependent: &str) {
		self.dependents.register_dependent_bean(dependency, dependent);
	}
}

impl FactoryBeanAccess for DefaultBeanFactory {
	fn get_bean(&self, name: &str, ctx: &mut ResolutionContext) -> BeanResult<Value> {
		self.do_get_bean(name, None, ctx)
	}

	fn class_of_type(&self, ty: &BeanType) -> Option<Arc<BeanClass>> {
		let classes = self.classes.read();
		let mut current = Some(ty);
		while let Some(ty) = current {
			if let Some(class) = classes.get(ty.name()) {
				return Some(Arc::clone(class));
			}
			current = ty.superclass();
		}
		None
	}

	fn bean_class_of(&self, name: &str) -> Option<Arc<BeanClass>> {
		let ty = self.predict_bean_type(name)?;
		self.class_of_type(&ty)
	}
}

impl ResolverHost for DefaultBeanFactory {
	fn type_converter(&self) -> &dyn TypeConverter {
		&self.converter
	}

	fn instantiation_strategy(&self) -> &dyn InstantiationStrategy {
		&self.instantiation
	}

	fn on_suppressed_error(&self, error: BeanError) {
		debug!(error = %error, "Suppressed bean creation error");
		self.suppressed.lock().push(error.to_string());
	}
}
