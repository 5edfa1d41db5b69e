//! Bean classes shared by the integration tests

#![allow(dead_code)]

use rstest::fixture;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use trellis_di::{BeanClass, BeanError, BeanType, BoxError, Executable, TypeBuilder, Value};

/// What a test executable was invoked with
#[derive(Debug)]
pub struct Built {
	pub label: &'static str,
	pub args: Vec<Value>,
}

/// Invoker producing a [`Built`] of type `ty`
pub fn recorder(ty: &BeanType, label: &'static str) -> impl Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static {
	let ty = ty.clone();
	move |args| {
		Ok(Value::object(
			ty.clone(),
			Built {
				label,
				args: args.to_vec(),
			},
		))
	}
}

/// Like [`recorder`], also counting invocations
pub fn counting_recorder(
	ty: &BeanType,
	label: &'static str,
	calls: &Arc<AtomicUsize>,
) -> impl Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static {
	let record = recorder(ty, label);
	let calls = Arc::clone(calls);
	move |args| {
		calls.fetch_add(1, Ordering::SeqCst);
		record(args)
	}
}

pub fn built(bean: &Value) -> &Built {
	bean.downcast_ref::<Built>()
		.expect("bean was not created by a recording executable")
}

/// Innermost cause of a chain of unsatisfied dependencies
pub fn root_cause(error: &BeanError) -> &BeanError {
	let mut current = error;
	while let Some(cause) = current.as_unsatisfied().and_then(|e| e.cause.as_deref()) {
		current = cause;
	}
	current
}

/// A small hierarchy: `SteelGear extends Gear implements Part`
pub struct Types {
	pub part: BeanType,
	pub gear: BeanType,
	pub steel_gear: BeanType,
	pub motor: BeanType,
	pub widget: BeanType,
}

#[fixture]
pub fn types() -> Types {
	let part = TypeBuilder::interface("com.example.Part").build();
	let gear = TypeBuilder::class("com.example.Gear")
		.implements(part.clone())
		.build();
	let steel_gear = TypeBuilder::class("com.example.SteelGear")
		.extends(gear.clone())
		.build();
	Types {
		part,
		gear,
		steel_gear,
		motor: BeanType::class("com.example.Motor"),
		widget: BeanType::class("com.example.Widget"),
	}
}

/// A class with a single public no-argument constructor labelled `default`
pub fn plain_class(ty: &BeanType) -> Arc<BeanClass> {
	BeanClass::builder(ty)
		.constructor(Executable::constructor(ty).build(recorder(ty, "default")))
		.build()
}
