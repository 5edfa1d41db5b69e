//! Property-based tests for constructor resolution
//!
//! Uses proptest to verify invariants of the resolver:
//! 1. Autowiring picks the first constructor of the highest arity
//! 2. A cached replay picks the same constructor as the initial search
//! 3. Type difference weight grows by two per superclass step

mod common;

use common::{built, plain_class, recorder};
use proptest::prelude::*;
use trellis_di::{
	AutowireMode, BeanClass, BeanDefinition, BeanType, CacheState, DefaultBeanFactory, Executable, Scope,
	TypeBuilder, Value, type_difference_weight,
};

const LABELS: [&str; 6] = ["c0", "c1", "c2", "c3", "c4", "c5"];

/// A prototype `widget` with one constructor per arity, every parameter a `Gear`
fn factory_with_constructors(arities: &[usize]) -> DefaultBeanFactory {
	let gear = BeanType::class("Gear");
	let widget = BeanType::class("Widget");
	let mut builder = BeanClass::builder(&widget);
	for (i, arity) in arities.iter().enumerate() {
		let mut ctor = Executable::constructor(&widget);
		for _ in 0..*arity {
			ctor = ctor.param(gear.clone());
		}
		builder = builder.constructor(ctor.build(recorder(&widget, LABELS[i])));
	}

	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition("gear", BeanDefinition::for_class(&plain_class(&gear)).build());
	factory.register_bean_definition(
		"widget",
		BeanDefinition::for_class(&builder.build())
			.autowire(AutowireMode::Constructor)
			.scope(Scope::Prototype)
			.build(),
	);
	factory
}

fn expected_label(arities: &[usize]) -> &'static str {
	let max = arities.iter().copied().max().unwrap_or(0);
	let index = arities.iter().position(|a| *a == max).unwrap_or(0);
	LABELS[index]
}

proptest! {
	#[test]
	fn prop_greediest_constructor_wins(arities in prop::collection::vec(0usize..4, 1..=LABELS.len())) {
		let factory = factory_with_constructors(&arities);

		let bean = factory.get_bean("widget").unwrap();

		let max = arities.iter().copied().max().unwrap_or(0);
		prop_assert_eq!(built(&bean).label, expected_label(&arities));
		prop_assert_eq!(built(&bean).args.len(), max);
	}

	#[test]
	fn prop_cached_replay_matches_search(arities in prop::collection::vec(0usize..4, 1..=LABELS.len())) {
		let factory = factory_with_constructors(&arities);

		let first = factory.get_bean("widget").unwrap();
		let replayed = factory.get_bean("widget").unwrap();

		prop_assert_eq!(built(&first).label, built(&replayed).label);
		let definition = factory.bean_definition("widget").unwrap();
		let max = arities.iter().copied().max().unwrap_or(0);
		let expected_state = if max == 0 { CacheState::Full } else { CacheState::Partial };
		prop_assert_eq!(definition.resolution().state(), expected_state);
	}

	#[test]
	fn prop_weight_counts_superclass_steps(depth in 0usize..8, target in 0usize..8) {
		prop_assume!(target <= depth);
		let mut chain = vec![BeanType::class("C0")];
		for level in 1..=depth {
			let parent = chain[level - 1].clone();
			chain.push(TypeBuilder::class(format!("C{}", level)).extends(parent).build());
		}
		let arg = Value::object(chain[depth].clone(), ());

		let weight = type_difference_weight(&[chain[target].clone()], &[arg]);

		prop_assert_eq!(weight, 2 * (depth - target) as i32);
	}
}
