//! Binding values to the parameters of one candidate executable

use crate::arguments::{ArgumentsHolder, ParameterBinding};
use crate::cache::PreparedArgument;
use crate::context::{InjectionPoint, ResolutionContext};
use crate::definition::{HolderSlot, ResolvedArgumentValues};
use crate::error::{BeanError, BeanResult, UnsatisfiedDependencyError};
use crate::executable::{Executable, Parameter};
use crate::host::{DependencyDescriptor, ResolverHost};
use crate::types::BeanType;
use crate::value::Value;
use indexmap::IndexSet;
use std::collections::HashSet;
use tracing::debug;

/// Where argument values come from
#[derive(Debug, Clone, Copy)]
pub(crate) enum ArgumentSource<'a> {
	/// Declared values of the definition, already resolved
	Declared(&'a ResolvedArgumentValues),
	/// Values supplied by the caller, matched by position
	Explicit(&'a [Value]),
}

pub(crate) struct ArgumentMatcher<'a> {
	host: &'a dyn ResolverHost,
	bean_name: &'a str,
}

impl<'a> ArgumentMatcher<'a> {
	pub(crate) fn new(host: &'a dyn ResolverHost, bean_name: &'a str) -> Self {
		Self { host, bean_name }
	}

	/// Build the argument vectors for `executable`
	///
	/// Fails with the first parameter that cannot be satisfied. Dependency
	/// edges to autowired beans are registered only once every parameter
	/// matched.
	pub(crate) fn create_argument_array(
		&self,
		executable: &Executable,
		source: ArgumentSource<'_>,
		autowiring: bool,
		fallback: bool,
		ctx: &mut ResolutionContext,
	) -> Result<ArgumentsHolder, UnsatisfiedDependencyError> {
		match source {
			ArgumentSource::Explicit(explicit) => self.bind_explicit(executable, explicit),
			ArgumentSource::Declared(values) => self.bind_declared(executable, values, autowiring, fallback, ctx),
		}
	}

	fn bind_explicit(&self, executable: &Executable, explicit: &[Value]) -> Result<ArgumentsHolder, UnsatisfiedDependencyError> {
		let mut args = ArgumentsHolder::with_capacity(explicit.len());
		for (index, parameter) in executable.parameters().iter().enumerate() {
			let injection_point = InjectionPoint::for_parameter(self.bean_name, executable, index);
			let Some(raw) = explicit.get(index) else {
				return Err(UnsatisfiedDependencyError::new(
					self.bean_name,
					injection_point,
					format!("{} explicit arguments supplied for {} parameters", explicit.len(), executable.parameter_count()),
				));
			};
			let converted = self.convert(raw, parameter, &injection_point)?;
			args.push(
				raw.clone(),
				converted.clone(),
				PreparedArgument::Value(converted),
				ParameterBinding::ExplicitPositional,
			);
		}
		Ok(args)
	}

	fn bind_declared(
		&self,
		executable: &Executable,
		values: &ResolvedArgumentValues,
		autowiring: bool,
		fallback: bool,
		ctx: &mut ResolutionContext,
	) -> Result<ArgumentsHolder, UnsatisfiedDependencyError> {
		let parameter_count = executable.parameter_count();
		let mut args = ArgumentsHolder::with_capacity(parameter_count);
		let mut used: HashSet<HolderSlot> = HashSet::with_capacity(parameter_count);
		let mut autowired_bean_names: IndexSet<String> = IndexSet::new();

		for (index, parameter) in executable.parameters().iter().enumerate() {
			let injection_point = InjectionPoint::for_parameter(self.bean_name, executable, index);
			let name = parameter.name.as_deref().unwrap_or("");

			let mut found = values.argument_value(index, &parameter.ty, Some(name), &used);
			if found.is_none() && (!autowiring || parameter_count == values.argument_count()) {
				// A leftover untyped declared value may still fit
				found = values.generic_argument_value(None, None, &used);
			}

			if let Some((slot, holder)) = found {
				used.insert(slot);
				let binding = match slot {
					HolderSlot::Indexed(_) => ParameterBinding::DeclaredIndexed,
					HolderSlot::Generic(_) => ParameterBinding::DeclaredGeneric,
				};
				let raw = holder.value.value.clone();
				if let Some(converted) = &holder.converted {
					args.push(raw, converted.clone(), PreparedArgument::Value(converted.clone()), binding);
				} else {
					let converted = self.convert(&raw, parameter, &injection_point)?;
					let prepared = if holder.value.source.requires_reresolution() {
						args.resolve_necessary = true;
						PreparedArgument::Declared(holder.value.source.clone())
					} else {
						PreparedArgument::Value(converted.clone())
					};
					args.push(raw, converted, prepared, binding);
				}
				continue;
			}

			if !autowiring {
				return Err(UnsatisfiedDependencyError::new(
					self.bean_name,
					injection_point,
					format!(
						"Ambiguous argument values for parameter of type [{}] - did you specify the correct bean references as arguments?",
						parameter.ty
					),
				));
			}

			let (value, binding) = self
				.resolve_autowired_argument(&injection_point, Some(&mut autowired_bean_names), fallback, ctx)
				.map_err(|e| UnsatisfiedDependencyError::caused_by(self.bean_name, injection_point.clone(), e))?;
			args.push(value.clone(), value, PreparedArgument::Autowired, binding);
			args.resolve_necessary = true;
		}

		let via = if executable.is_constructor() { "constructor" } else { "factory method" };
		for autowired in &autowired_bean_names {
			self.host.register_dependent_bean(autowired, self.bean_name);
			debug!(
				bean = %self.bean_name,
				dependency = %autowired,
				"Autowiring by type from bean name '{}' via {} to bean named '{}'",
				self.bean_name,
				via,
				autowired
			);
		}

		Ok(args)
	}

	/// Satisfy one parameter from the container
	///
	/// `InjectionPoint` parameters receive the injection point currently
	/// being satisfied. With `fallback` set, an array, collection or map
	/// parameter nothing matches receives an empty value; a `NoUniqueBean`
	/// failure is never replaced.
	pub(crate) fn resolve_autowired_argument(
		&self,
		injection_point: &InjectionPoint,
		autowired_bean_names: Option<&mut IndexSet<String>>,
		fallback: bool,
		ctx: &mut ResolutionContext,
	) -> BeanResult<(Value, ParameterBinding)> {
		let parameter_type = injection_point.parameter_type();
		if BeanType::injection_point().is_assignable_from(parameter_type) {
			return match ctx.current_injection_point() {
				Some(current) => Ok((
					Value::object(BeanType::injection_point(), current.clone()),
					ParameterBinding::Autowired,
				)),
				None => Err(BeanError::IllegalState(format!(
					"No current InjectionPoint available for {}",
					injection_point
				))),
			};
		}

		let descriptor = DependencyDescriptor::new(injection_point.clone(), true);
		let host = self.host;
		let bean_name = self.bean_name;
		let result = ctx.with_injection_point(injection_point.clone(), |ctx| {
			host.resolve_dependency(&descriptor, bean_name, autowired_bean_names, ctx)
		});

		match result {
			Ok(value) => Ok((value, ParameterBinding::Autowired)),
			Err(error) if fallback && error.is_no_such_bean() => match parameter_type.empty_value() {
				Some(empty) => Ok((empty, ParameterBinding::AutowiredFallbackEmpty)),
				None => Err(error),
			},
			Err(error) => Err(error),
		}
	}

	fn convert(
		&self,
		raw: &Value,
		parameter: &Parameter,
		injection_point: &InjectionPoint,
	) -> Result<Value, UnsatisfiedDependencyError> {
		self.host
			.type_converter()
			.convert_if_necessary(raw, &parameter.ty, Some(injection_point))
			.map_err(|e| {
				UnsatisfiedDependencyError::new(
					self.bean_name,
					injection_point.clone(),
					format!(
						"Could not convert argument value of type [{}] to required type [{}]: {}",
						raw.type_description(),
						parameter.ty,
						e
					),
				)
			})
	}
}
