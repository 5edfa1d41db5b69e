//! Constructor and factory-method resolution
//!
//! [`ConstructorResolver`] decides which executable creates a bean and with
//! which arguments, then invokes it:
//!
//! 1. A cached decision on the definition is replayed when present.
//! 2. Otherwise candidates are enumerated and sorted (public first, then
//!    by descending parameter count), declared argument values are
//!    resolved, and every candidate accepting enough arguments is matched.
//! 3. Matches are ranked by type-difference weight (lenient mode) or plain
//!    assignability (strict mode); the lowest weight wins and ties are
//!    tracked as ambiguous.
//! 4. The decision is cached on the definition unless the caller supplied
//!    explicit arguments.

use crate::arguments::ArgumentsHolder;
use crate::cache::{CachedArguments, CachedResolution, PreparedArgument};
use crate::candidates::{constructor_candidates, factory_method_candidates, sort_candidates};
use crate::context::{InjectionPoint, ResolutionContext};
use crate::definition::{AutowireMode, BeanDefinition, ResolvedArgumentValues};
use crate::error::{BeanError, BeanResult, UnsatisfiedDependencyError};
use crate::executable::{BeanClass, Executable};
use crate::host::ResolverHost;
use crate::matcher::{ArgumentMatcher, ArgumentSource};
use crate::value::Value;
use std::sync::Arc;
use tracing::{debug, trace};

const CONSTRUCTOR_ARGUMENT: &str = "constructor argument";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchKind {
	Constructor,
	FactoryMethod,
}

impl SearchKind {
	fn noun(self) -> &'static str {
		match self {
			SearchKind::Constructor => "constructor",
			SearchKind::FactoryMethod => "factory method",
		}
	}
}

struct Selection {
	executable: Arc<Executable>,
	arguments: ArgumentsHolder,
}

#[derive(Default)]
struct SearchOutcome {
	best: Option<Selection>,
	ambiguous: Vec<Arc<Executable>>,
	causes: Vec<UnsatisfiedDependencyError>,
}

struct Search<'s> {
	kind: SearchKind,
	source: ArgumentSource<'s>,
	min_nr_of_args: usize,
	autowiring: bool,
}

/// Resolves and invokes the executable creating a bean
pub struct ConstructorResolver<'a> {
	host: &'a dyn ResolverHost,
}

impl<'a> ConstructorResolver<'a> {
	pub fn new(host: &'a dyn ResolverHost) -> Self {
		Self { host }
	}

	/// Create a bean through one of its constructors
	///
	/// `chosen_constructors` restricts the candidates and turns autowiring
	/// on. `explicit_args` are matched by position against candidates of
	/// exactly that arity and bypass the cache entirely.
	pub fn autowire_constructor(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		chosen_constructors: Option<&[Arc<Executable>]>,
		explicit_args: Option<&[Value]>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		if explicit_args.is_none() {
			if let Some((executable, args)) = self.cached_arguments(bean_name, definition, ctx)? {
				return self.instantiate(bean_name, definition, &executable, None, &args);
			}
		}

		let class = self.bean_class(bean_name, definition)?;
		let candidates = match chosen_constructors {
			Some(chosen) => {
				let mut candidates = chosen.to_vec();
				sort_candidates(&mut candidates);
				candidates
			}
			None => constructor_candidates(bean_name, class, definition)?,
		};

		if explicit_args.is_none() && !definition.has_constructor_argument_values() {
			if let [only] = candidates.as_slice() {
				if only.parameter_count() == 0 {
					definition.resolution().write(CachedResolution {
						executable: Arc::clone(only),
						arguments: CachedArguments::Resolved(Vec::new()),
					});
					return self.instantiate(bean_name, definition, only, None, &[]);
				}
			}
		}

		let autowiring = chosen_constructors.is_some() || definition.autowire_mode() == AutowireMode::Constructor;
		let (resolved_values, min_nr_of_args) = match explicit_args {
			Some(args) => (ResolvedArgumentValues::new(), args.len()),
			None => self.resolve_constructor_arguments(bean_name, definition, ctx)?,
		};
		let search = Search {
			kind: SearchKind::Constructor,
			source: argument_source(explicit_args, &resolved_values),
			min_nr_of_args,
			autowiring,
		};

		let outcome = self.search(bean_name, definition, &candidates, &search, ctx);
		let ambiguous = outcome.ambiguous;
		let Some(selection) = outcome.best else {
			if !outcome.causes.is_empty() {
				return Err(self.report_exhausted(outcome.causes));
			}
			return Err(BeanError::NoMatchingExecutable {
				bean_name: bean_name.to_string(),
				message: format!(
					"Could not resolve matching constructor on bean class [{}] (hint: specify index/type/name arguments for simple parameters to avoid type ambiguities)",
					class.name()
				),
			});
		};
		if !ambiguous.is_empty() && !definition.is_lenient_constructor_resolution() {
			return Err(ambiguous_match(bean_name, SearchKind::Constructor, class, &ambiguous));
		}

		if explicit_args.is_none() {
			selection.arguments.store_cache(definition, Arc::clone(&selection.executable));
		}
		self.instantiate(bean_name, definition, &selection.executable, None, &selection.arguments.arguments)
	}

	/// Create a bean by calling a factory method
	///
	/// Static methods of the bean class are used when the definition names
	/// no factory bean; instance methods of the factory bean's class
	/// otherwise.
	pub fn instantiate_using_factory_method(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		explicit_args: Option<&[Value]>,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Value> {
		let (factory_bean, factory_class, is_static) = self.factory_target(bean_name, definition, ctx)?;

		if explicit_args.is_none() {
			if let Some((executable, args)) = self.cached_arguments(bean_name, definition, ctx)? {
				return self.instantiate(bean_name, definition, &executable, factory_bean.as_ref(), &args);
			}
		}

		let mut candidates = Vec::new();
		if definition.is_unique_factory_method() {
			if let Some(method) = definition.factory_method_to_introspect() {
				if method.declaring_type() == factory_class.bean_type() {
					candidates.push(method);
				}
			}
		}
		if candidates.is_empty() {
			candidates = factory_method_candidates(bean_name, &factory_class, definition, is_static)?;
		}

		if explicit_args.is_none() && !definition.has_constructor_argument_values() {
			if let [only] = candidates.as_slice() {
				if only.parameter_count() == 0 && !only.return_type().is_void() {
					definition.set_factory_method_to_introspect(Arc::clone(only));
					definition.resolution().write(CachedResolution {
						executable: Arc::clone(only),
						arguments: CachedArguments::Resolved(Vec::new()),
					});
					return self.instantiate(bean_name, definition, only, factory_bean.as_ref(), &[]);
				}
			}
		}

		let (resolved_values, min_nr_of_args) = match explicit_args {
			Some(args) => (ResolvedArgumentValues::new(), args.len()),
			None => self.resolve_constructor_arguments(bean_name, definition, ctx)?,
		};
		let search = Search {
			kind: SearchKind::FactoryMethod,
			source: argument_source(explicit_args, &resolved_values),
			min_nr_of_args,
			autowiring: definition.autowire_mode() == AutowireMode::Constructor,
		};

		let outcome = self.search(bean_name, definition, &candidates, &search, ctx);
		let ambiguous = outcome.ambiguous;
		let Some(selection) = outcome.best else {
			if !outcome.causes.is_empty() {
				return Err(self.report_exhausted(outcome.causes));
			}
			return Err(BeanError::NoMatchingExecutable {
				bean_name: bean_name.to_string(),
				message: no_matching_factory_method(definition, &factory_class, explicit_args, &resolved_values, min_nr_of_args, is_static),
			});
		};

		if selection.executable.return_type().is_void() {
			return Err(BeanError::InvalidFactoryMethod {
				bean_name: bean_name.to_string(),
				method_name: selection.executable.method_name().unwrap_or_default().to_string(),
				class_name: factory_class.name().to_string(),
			});
		}
		if !ambiguous.is_empty() {
			return Err(ambiguous_match(bean_name, SearchKind::FactoryMethod, &factory_class, &ambiguous));
		}

		if explicit_args.is_none() {
			definition.set_factory_method_to_introspect(Arc::clone(&selection.executable));
			selection.arguments.store_cache(definition, Arc::clone(&selection.executable));
		}
		self.instantiate(
			bean_name,
			definition,
			&selection.executable,
			factory_bean.as_ref(),
			&selection.arguments.arguments,
		)
	}

	/// Remember the factory method when its name has a single signature
	///
	/// Lets the container predict the bean type before creating it. Nothing
	/// is recorded when overloads with different parameter types exist.
	pub fn resolve_factory_method_if_possible(&self, definition: &BeanDefinition) -> Option<Arc<Executable>> {
		let (class, is_static) = match definition.factory_bean_name() {
			Some(factory_bean_name) => (self.host.bean_class_of(factory_bean_name)?, false),
			None => (Arc::clone(definition.bean_class()?), true),
		};

		let mut unique: Option<&Arc<Executable>> = None;
		for method in class.methods() {
			let visible = definition.is_non_public_access_allowed() || method.is_public();
			if !visible || method.is_static() != is_static || !definition.is_factory_method(method) {
				continue;
			}
			match unique {
				None => unique = Some(method),
				Some(existing) if !existing.has_same_parameter_types(method) => return None,
				Some(_) => {}
			}
		}

		let unique = Arc::clone(unique?);
		definition.set_factory_method_to_introspect(Arc::clone(&unique));
		Some(unique)
	}

	/// Resolve the declared argument values of `definition`
	///
	/// Returns the resolved values and the minimum number of parameters a
	/// candidate must take: the larger of the declared count and the
	/// highest declared index plus one.
	pub fn resolve_constructor_arguments(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		ctx: &mut ResolutionContext,
	) -> BeanResult<(ResolvedArgumentValues, usize)> {
		let declared = definition.constructor_argument_values();
		let host = self.host;
		let resolved = declared.resolve_with(|holder| {
			host.resolve_value_if_necessary(bean_name, definition, CONSTRUCTOR_ARGUMENT, &holder.value, ctx)
		})?;
		Ok((resolved, declared.min_argument_count()))
	}

	/// Turn cached per-slot recipes into final arguments
	///
	/// Autowired slots are looked up again (with the empty-container
	/// fallback), declared slots resolved again, strings evaluated for
	/// placeholders, and every value converted to its parameter type.
	pub fn resolve_prepared_arguments(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		executable: &Executable,
		prepared: &[PreparedArgument],
		ctx: &mut ResolutionContext,
	) -> BeanResult<Vec<Value>> {
		let matcher = ArgumentMatcher::new(self.host, bean_name);
		let converter = self.host.type_converter();
		let mut resolved = Vec::with_capacity(prepared.len());

		for (index, (parameter, argument)) in executable.parameters().iter().zip(prepared).enumerate() {
			let injection_point = InjectionPoint::for_parameter(bean_name, executable, index);
			let value = match argument {
				PreparedArgument::Autowired => matcher.resolve_autowired_argument(&injection_point, None, true, ctx)?.0,
				PreparedArgument::Declared(declared) => {
					self.host
						.resolve_value_if_necessary(bean_name, definition, CONSTRUCTOR_ARGUMENT, declared, ctx)?
				}
				PreparedArgument::Value(Value::Str(text)) => self.host.evaluate_string(text, definition)?,
				PreparedArgument::Value(value) => value.clone(),
			};
			let converted = converter
				.convert_if_necessary(&value, &parameter.ty, Some(&injection_point))
				.map_err(|e| {
					UnsatisfiedDependencyError::new(
						bean_name,
						injection_point.clone(),
						format!(
							"Could not convert argument value of type [{}] to required type [{}]: {}",
							value.type_description(),
							parameter.ty,
							e
						),
					)
				})?;
			resolved.push(converted);
		}
		Ok(resolved)
	}

	fn cached_arguments(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		ctx: &mut ResolutionContext,
	) -> BeanResult<Option<(Arc<Executable>, Vec<Value>)>> {
		let Some(cached) = definition.resolution().try_read() else {
			return Ok(None);
		};
		let args = match &cached.arguments {
			CachedArguments::Resolved(args) => {
				trace!(bean = %bean_name, executable = %cached.executable, "Reusing resolved arguments");
				args.clone()
			}
			CachedArguments::Prepared(prepared) => {
				trace!(bean = %bean_name, executable = %cached.executable, "Replaying prepared arguments");
				self.resolve_prepared_arguments(bean_name, definition, &cached.executable, prepared, ctx)?
			}
		};
		Ok(Some((cached.executable, args)))
	}

	fn search(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		candidates: &[Arc<Executable>],
		search: &Search<'_>,
		ctx: &mut ResolutionContext,
	) -> SearchOutcome {
		let matcher = ArgumentMatcher::new(self.host, bean_name);
		let lenient = definition.is_lenient_constructor_resolution();
		let fallback = candidates.len() == 1;
		let mut outcome = SearchOutcome::default();
		let mut min_type_diff_weight = i32::MAX;

		for candidate in candidates {
			let parameter_count = candidate.parameter_count();

			if search.kind == SearchKind::Constructor {
				if let Some(best) = &outcome.best {
					if best.arguments.len() > parameter_count {
						// Remaining candidates take fewer arguments
						break;
					}
				}
			}
			if parameter_count < search.min_nr_of_args {
				continue;
			}
			if let ArgumentSource::Explicit(explicit) = search.source {
				if parameter_count != explicit.len() {
					continue;
				}
			}

			let arguments =
				match matcher.create_argument_array(candidate, search.source, search.autowiring, fallback, ctx) {
					Ok(arguments) => arguments,
					Err(error) => {
						trace!(
							bean = %bean_name,
							candidate = %candidate,
							error = %error,
							"Ignoring {} [{}]",
							search.kind.noun(),
							candidate
						);
						outcome.causes.push(error);
						continue;
					}
				};

			let parameter_types = candidate.parameter_types();
			let weight = if lenient {
				arguments.type_difference_weight(&parameter_types)
			} else {
				arguments.assignability_weight(&parameter_types)
			};

			if weight < min_type_diff_weight {
				min_type_diff_weight = weight;
				outcome.best = Some(Selection {
					executable: Arc::clone(candidate),
					arguments,
				});
				outcome.ambiguous.clear();
			} else if let Some(best) = &outcome.best {
				if weight == min_type_diff_weight && is_ambiguous_with(search.kind, lenient, &best.executable, candidate) {
					if outcome.ambiguous.is_empty() {
						outcome.ambiguous.push(Arc::clone(&best.executable));
					}
					outcome.ambiguous.push(Arc::clone(candidate));
				}
			}
		}

		if let Some(best) = &outcome.best {
			debug!(
				bean = %bean_name,
				executable = %best.executable,
				weight = min_type_diff_weight,
				bindings = ?best.arguments.bindings,
				"Selected {}",
				search.kind.noun()
			);
		}
		outcome
	}

	/// Error for a search where every candidate failed
	///
	/// The last failure caused by a non-unique bean is reported if there is
	/// one, the last failure otherwise; the rest go to the host.
	fn report_exhausted(&self, mut causes: Vec<UnsatisfiedDependencyError>) -> BeanError {
		let reported = causes
			.iter()
			.rposition(UnsatisfiedDependencyError::is_caused_by_non_unique_bean)
			.unwrap_or(causes.len().saturating_sub(1));
		let reported = causes.remove(reported);
		for cause in causes {
			debug!(error = %cause, "Suppressing candidate failure");
			self.host.on_suppressed_error(cause.into());
		}
		reported.into()
	}

	fn factory_target(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		ctx: &mut ResolutionContext,
	) -> BeanResult<(Option<Value>, Arc<BeanClass>, bool)> {
		match definition.factory_bean_name() {
			Some(factory_bean_name) => {
				if factory_bean_name == bean_name {
					return Err(BeanError::BeanDefinitionStore {
						bean_name: bean_name.to_string(),
						message: "factory-bean reference points back to the same bean definition".to_string(),
					});
				}
				let factory_bean = self.host.get_bean(factory_bean_name, ctx)?;
				self.host.register_dependent_bean(factory_bean_name, bean_name);
				let class = factory_bean
					.runtime_type()
					.and_then(|ty| self.host.class_of_type(&ty))
					.ok_or_else(|| {
						BeanError::IllegalState(format!(
							"Cannot determine class of factory bean '{}' of type [{}]",
							factory_bean_name,
							factory_bean.type_description()
						))
					})?;
				Ok((Some(factory_bean), class, false))
			}
			None => match definition.bean_class() {
				Some(class) => Ok((None, Arc::clone(class), true)),
				None => Err(BeanError::BeanDefinitionStore {
					bean_name: bean_name.to_string(),
					message: "bean definition declares neither a bean class nor a factory-bean reference".to_string(),
				}),
			},
		}
	}

	fn bean_class<'d>(&self, bean_name: &str, definition: &'d BeanDefinition) -> BeanResult<&'d Arc<BeanClass>> {
		definition.bean_class().ok_or_else(|| BeanError::BeanDefinitionStore {
			bean_name: bean_name.to_string(),
			message: "bean definition declares no bean class".to_string(),
		})
	}

	fn instantiate(
		&self,
		bean_name: &str,
		definition: &BeanDefinition,
		executable: &Executable,
		factory_bean: Option<&Value>,
		args: &[Value],
	) -> BeanResult<Value> {
		let kind = if executable.is_constructor() { "constructor" } else { "factory method" };
		self.host
			.instantiation_strategy()
			.instantiate(definition, bean_name, executable, factory_bean, args)
			.map_err(|source| BeanError::Instantiation {
				bean_name: bean_name.to_string(),
				message: format!("Bean instantiation via {} failed: {}", kind, executable),
				source,
			})
	}
}

fn argument_source<'s>(explicit_args: Option<&'s [Value]>, resolved: &'s ResolvedArgumentValues) -> ArgumentSource<'s> {
	match explicit_args {
		Some(args) => ArgumentSource::Explicit(args),
		None => ArgumentSource::Declared(resolved),
	}
}

/// Whether an equally weighted `candidate` makes the choice of `best` ambiguous
///
/// Constructor ties always count. Factory method ties count in strict mode
/// only, between overloads of the same arity with different parameter types.
fn is_ambiguous_with(kind: SearchKind, lenient: bool, best: &Executable, candidate: &Executable) -> bool {
	match kind {
		SearchKind::Constructor => true,
		SearchKind::FactoryMethod => {
			!lenient
				&& best.parameter_count() == candidate.parameter_count()
				&& !best.has_same_parameter_types(candidate)
		}
	}
}

fn ambiguous_match(bean_name: &str, kind: SearchKind, class: &BeanClass, ambiguous: &[Arc<Executable>]) -> BeanError {
	BeanError::AmbiguousMatch {
		bean_name: bean_name.to_string(),
		kind: kind.noun(),
		class_name: class.name().to_string(),
		candidates: ambiguous.iter().map(|e| e.to_string()).collect(),
	}
}

fn no_matching_factory_method(
	definition: &BeanDefinition,
	factory_class: &BeanClass,
	explicit_args: Option<&[Value]>,
	resolved_values: &ResolvedArgumentValues,
	min_nr_of_args: usize,
	is_static: bool,
) -> String {
	let argument_types: Vec<String> = match explicit_args {
		Some(args) => args.iter().map(Value::type_description).collect(),
		None => resolved_values
			.indexed()
			.values()
			.chain(resolved_values.generic())
			.map(|holder| {
				holder
					.type_name
					.clone()
					.unwrap_or_else(|| holder.value.value.type_description())
			})
			.collect(),
	};
	let factory_bean = definition
		.factory_bean_name()
		.map(|name| format!("factory bean '{}'; ", name))
		.unwrap_or_default();
	format!(
		"No matching factory method found on class [{}]: {}factory method '{}({})'. Check that a method with the specified name {}exists and that it is {}.",
		factory_class.name(),
		factory_bean,
		definition.factory_method_name().unwrap_or_default(),
		argument_types.join(", "),
		if min_nr_of_args > 0 { "and arguments " } else { "" },
		if is_static { "static" } else { "non-static" }
	)
}
