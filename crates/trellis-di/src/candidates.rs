//! Enumerating and ordering candidate executables

use crate::definition::BeanDefinition;
use crate::error::{BeanError, BeanResult};
use crate::executable::{BeanClass, Executable};
use std::cmp::Reverse;
use std::sync::Arc;

/// Sort candidates: public before non-public, then by descending parameter count
///
/// The sort is stable, so declaration order breaks remaining ties.
pub fn sort_candidates(candidates: &mut [Arc<Executable>]) {
	candidates.sort_by_key(|c| (!c.is_public(), Reverse(c.parameter_count())));
}

/// Constructors of `class` visible under the definition's access setting, sorted
pub fn constructor_candidates(
	bean_name: &str,
	class: &BeanClass,
	definition: &BeanDefinition,
) -> BeanResult<Vec<Arc<Executable>>> {
	let mut candidates = Vec::with_capacity(class.constructors().len());
	for constructor in class.constructors() {
		if !constructor.is_constructor() || constructor.declaring_type() != class.bean_type() {
			return Err(BeanError::CandidateIntrospection {
				bean_name: bean_name.to_string(),
				kind: "constructor",
				class_name: class.name().to_string(),
				message: format!("{} is not a constructor declared by this class", constructor),
			});
		}
		if definition.is_non_public_access_allowed() || constructor.is_public() {
			candidates.push(Arc::clone(constructor));
		}
	}
	sort_candidates(&mut candidates);
	Ok(candidates)
}

/// Methods of `class` named like the definition's factory method, sorted
///
/// Only static methods qualify when there is no factory bean, only instance
/// methods when there is one.
pub fn factory_method_candidates(
	bean_name: &str,
	class: &BeanClass,
	definition: &BeanDefinition,
	is_static: bool,
) -> BeanResult<Vec<Arc<Executable>>> {
	let mut candidates = Vec::new();
	for method in class.methods() {
		if method.is_constructor() {
			return Err(BeanError::CandidateIntrospection {
				bean_name: bean_name.to_string(),
				kind: "method",
				class_name: class.name().to_string(),
				message: format!("{} is listed as a method", method),
			});
		}
		let visible = definition.is_non_public_access_allowed() || method.is_public();
		if visible && method.is_static() == is_static && definition.is_factory_method(method) {
			candidates.push(Arc::clone(method));
		}
	}
	sort_candidates(&mut candidates);
	Ok(candidates)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::BeanType;
	use crate::value::Value;
	use rstest::rstest;

	fn ctor(ty: &BeanType, arity: usize, public: bool) -> Arc<Executable> {
		let mut builder = Executable::constructor(ty);
		for _ in 0..arity {
			builder = builder.param(BeanType::int());
		}
		if !public {
			builder = builder.non_public();
		}
		builder.build(|_| Ok(Value::Null))
	}

	#[rstest]
	fn test_sort_order() {
		let ty = BeanType::class("Widget");
		let mut candidates = vec![
			ctor(&ty, 1, true),
			ctor(&ty, 3, false),
			ctor(&ty, 2, true),
			ctor(&ty, 0, false),
		];

		sort_candidates(&mut candidates);

		let order: Vec<(bool, usize)> = candidates.iter().map(|c| (c.is_public(), c.parameter_count())).collect();
		assert_eq!(order, vec![(true, 2), (true, 1), (false, 3), (false, 0)]);
	}

	#[rstest]
	fn test_public_only_filters_constructors() {
		let ty = BeanType::class("Widget");
		let class = BeanClass::builder(&ty)
			.constructor(ctor(&ty, 1, true))
			.constructor(ctor(&ty, 2, false))
			.build();
		let definition = BeanDefinition::for_class(&class).non_public_access(false).build();

		let candidates = constructor_candidates("widget", &class, &definition).unwrap();

		assert_eq!(candidates.len(), 1);
		assert_eq!(candidates[0].parameter_count(), 1);
	}

	#[rstest]
	fn test_foreign_constructor_fails_introspection() {
		let ty = BeanType::class("Widget");
		let other = BeanType::class("Gadget");
		let class = BeanClass::builder(&ty).constructor(ctor(&other, 0, true)).build();
		let definition = BeanDefinition::for_class(&class).build();

		let result = constructor_candidates("widget", &class, &definition);

		assert!(matches!(result, Err(BeanError::CandidateIntrospection { .. })));
	}

	#[rstest]
	fn test_factory_methods_filtered_by_name_and_staticness() {
		let ty = BeanType::class("GearFactory");
		let gear = BeanType::class("Gear");
		let class = BeanClass::builder(&ty)
			.method(Executable::static_method(&ty, "create", gear.clone()).build(|_| Ok(Value::Null)))
			.method(Executable::instance_method(&ty, "create", gear.clone()).build(|_| Ok(Value::Null)))
			.method(Executable::static_method(&ty, "other", gear).build(|_| Ok(Value::Null)))
			.build();
		let definition = BeanDefinition::for_class(&class).factory_method("create").build();

		let statics = factory_method_candidates("gear", &class, &definition, true).unwrap();
		let instances = factory_method_candidates("gear", &class, &definition, false).unwrap();

		assert_eq!(statics.len(), 1);
		assert!(statics[0].is_static());
		assert_eq!(instances.len(), 1);
		assert!(!instances[0].is_static());
	}
}
