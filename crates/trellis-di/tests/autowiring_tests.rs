//! Dependency lookups made while autowiring parameters
//!
//! These tests verify that:
//! 1. Array, collection and map parameters collect every matching bean
//! 2. A sole candidate falls back to an empty container when nothing matches
//! 3. `InjectionPoint` parameters receive the point being satisfied
//! 4. Several matches are narrowed by primary flag, then parameter name
//! 5. Circular constructor dependencies are detected
//! 6. When every candidate fails, the most informative failure is reported

mod common;

use common::{Types, built, plain_class, recorder, root_cause, types};
use rstest::rstest;
use std::sync::Arc;
use trellis_di::{
	AutowireMode, BeanClass, BeanDefinition, BeanError, BeanType, CacheState, DefaultBeanFactory, Executable,
	InjectionPoint, ResolutionSettings, Scope, Value,
};

fn toolbox_class(parameter_type: BeanType) -> Arc<BeanClass> {
	let toolbox = BeanType::class("Toolbox");
	BeanClass::builder(&toolbox)
		.constructor(
			Executable::constructor(&toolbox)
				.param(parameter_type)
				.build(recorder(&toolbox, "tools")),
		)
		.build()
}

fn register_gears(factory: &DefaultBeanFactory, types: &Types) {
	factory.register_bean_definition("gear1", BeanDefinition::for_class(&plain_class(&types.gear)).build());
	factory.register_bean_definition(
		"gear2",
		BeanDefinition::for_class(&plain_class(&types.steel_gear)).build(),
	);
}

#[rstest]
fn test_list_parameter_collects_matching_beans(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	factory.register_bean_definition(
		"toolbox",
		BeanDefinition::for_class(&toolbox_class(BeanType::list_of(types.gear.clone()))).build(),
	);

	// Act
	let bean = factory.get_bean("toolbox").unwrap();

	// Assert
	let expected = Value::List(vec![
		factory.get_bean("gear1").unwrap(),
		factory.get_bean("gear2").unwrap(),
	]);
	assert_eq!(built(&bean).args, vec![expected]);
	assert_eq!(factory.dependencies_of("toolbox"), vec!["gear1".to_string(), "gear2".to_string()]);
}

#[rstest]
fn test_map_parameter_is_keyed_by_bean_name(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	factory.register_bean_definition(
		"toolbox",
		BeanDefinition::for_class(&toolbox_class(BeanType::map_of(BeanType::string(), types.part.clone()))).build(),
	);

	// Act
	let bean = factory.get_bean("toolbox").unwrap();

	// Assert
	let expected = Value::Map(vec![
		(Value::str("gear1"), factory.get_bean("gear1").unwrap()),
		(Value::str("gear2"), factory.get_bean("gear2").unwrap()),
	]);
	assert_eq!(built(&bean).args, vec![expected]);
}

#[rstest]
#[case::array(BeanType::array_of(BeanType::class("com.example.Gear")))]
#[case::list(BeanType::list_of(BeanType::class("com.example.Gear")))]
#[case::set(BeanType::set_of(BeanType::class("com.example.Gear")))]
#[case::map(BeanType::map_of(BeanType::string(), BeanType::class("com.example.Gear")))]
fn test_sole_candidate_falls_back_to_empty_container(#[case] parameter_type: BeanType) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	let expected = parameter_type.empty_value().unwrap();
	factory.register_bean_definition("toolbox", BeanDefinition::for_class(&toolbox_class(parameter_type)).build());

	// Act
	let bean = factory.get_bean("toolbox").unwrap();

	// Assert
	assert_eq!(built(&bean).args, vec![expected]);
	assert!(factory.dependencies_of("toolbox").is_empty());
}

#[rstest]
fn test_no_fallback_with_several_candidates() {
	// Arrange
	let toolbox = BeanType::class("Toolbox");
	let class = BeanClass::builder(&toolbox)
		.constructor(Executable::constructor(&toolbox).build(recorder(&toolbox, "empty")))
		.constructor(
			Executable::constructor(&toolbox)
				.param(BeanType::list_of(BeanType::class("com.example.Gear")))
				.build(recorder(&toolbox, "tools")),
		)
		.build();
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition(
		"toolbox",
		BeanDefinition::for_class(&class)
			.autowire(AutowireMode::Constructor)
			.build(),
	);

	// Act
	let bean = factory.get_bean("toolbox").unwrap();

	// Assert
	assert_eq!(built(&bean).label, "empty");
}

#[rstest]
fn test_injection_point_parameter_receives_current_point(types: Types) {
	// Arrange
	let logger = BeanType::class("com.example.Logger");
	let logger_class = BeanClass::builder(&logger)
		.constructor(
			Executable::constructor(&logger)
				.param(BeanType::injection_point())
				.build(recorder(&logger, "logger")),
		)
		.build();
	let widget = &types.widget;
	let widget_class = BeanClass::builder(widget)
		.constructor(
			Executable::constructor(widget)
				.named_param("log", logger.clone())
				.build(recorder(widget, "widget")),
		)
		.build();
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition(
		"logger",
		BeanDefinition::for_class(&logger_class)
			.scope(Scope::Prototype)
			.build(),
	);
	factory.register_bean_definition("widget", BeanDefinition::for_class(&widget_class).build());

	// Act
	let bean = factory.get_bean("widget").unwrap();

	// Assert
	let logger_bean = &built(&bean).args[0];
	let injection_point = built(logger_bean).args[0]
		.downcast_ref::<InjectionPoint>()
		.unwrap();
	assert_eq!(injection_point.bean_name(), "widget");
	assert_eq!(injection_point.index(), 0);
	assert_eq!(injection_point.parameter_type(), &logger);
	assert_eq!(injection_point.parameter_name(), Some("log"));
	assert_eq!(injection_point.to_string(), "parameter 0 of Widget(Logger)");
}

#[rstest]
fn test_injection_point_parameter_outside_injection_fails() {
	// Arrange
	let logger = BeanType::class("com.example.Logger");
	let class = BeanClass::builder(&logger)
		.constructor(
			Executable::constructor(&logger)
				.param(BeanType::injection_point())
				.build(recorder(&logger, "logger")),
		)
		.build();
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition("logger", BeanDefinition::for_class(&class).build());

	// Act
	let error = factory.get_bean("logger").unwrap_err();

	// Assert
	assert!(matches!(root_cause(&error), BeanError::IllegalState(msg) if msg.starts_with("No current InjectionPoint")));
}

#[rstest]
fn test_several_matches_without_preference_fail(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	factory.register_bean_definition("widget", BeanDefinition::for_class(&part_consumer(&types, "part")).build());

	// Act
	let error = factory.get_bean("widget").unwrap_err();

	// Assert
	assert!(error.as_unsatisfied().is_some_and(|e| e.is_caused_by_non_unique_bean()));
	match root_cause(&error) {
		BeanError::NoUniqueBean {
			required_type,
			candidates,
		} => {
			assert_eq!(required_type, "com.example.Part");
			assert_eq!(candidates, &vec!["gear1".to_string(), "gear2".to_string()]);
		}
		other => panic!("expected a non-unique bean failure, got {:?}", other),
	}
}

#[rstest]
fn test_primary_bean_wins(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	factory.register_bean_definition(
		"gear3",
		BeanDefinition::for_class(&plain_class(&types.gear))
			.primary(true)
			.build(),
	);
	factory.register_bean_definition("widget", BeanDefinition::for_class(&part_consumer(&types, "part")).build());

	// Act
	let bean = factory.get_bean("widget").unwrap();

	// Assert
	assert_eq!(built(&bean).args, vec![factory.get_bean("gear3").unwrap()]);
	assert_eq!(factory.get_bean_of_type(&types.part).unwrap(), factory.get_bean("gear3").unwrap());
}

#[rstest]
fn test_parameter_name_narrows_matches(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	factory.register_bean_definition("widget", BeanDefinition::for_class(&part_consumer(&types, "gear2")).build());

	// Act
	let bean = factory.get_bean("widget").unwrap();

	// Assert
	assert_eq!(built(&bean).args, vec![factory.get_bean("gear2").unwrap()]);
	assert_eq!(factory.dependents_of("gear2"), vec!["widget".to_string()]);
	assert!(factory.dependents_of("gear1").is_empty());
}

#[rstest]
fn test_circular_constructor_dependency_is_detected() {
	// Arrange
	let a = BeanType::class("A");
	let b = BeanType::class("B");
	let a_class = BeanClass::builder(&a)
		.constructor(Executable::constructor(&a).param(b.clone()).build(recorder(&a, "a")))
		.build();
	let b_class = BeanClass::builder(&b)
		.constructor(Executable::constructor(&b).param(a.clone()).build(recorder(&b, "b")))
		.build();
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition("a", BeanDefinition::for_class(&a_class).build());
	factory.register_bean_definition("b", BeanDefinition::for_class(&b_class).build());

	// Act
	let error = factory.get_bean("a").unwrap_err();

	// Assert
	match root_cause(&error) {
		BeanError::CircularDependency { bean_name, path } => {
			assert_eq!(bean_name, "a");
			assert_eq!(path, "a -> b -> a");
		}
		other => panic!("expected a circular dependency, got {:?}", other),
	}
	assert!(!factory.contains_singleton("a"));
	assert!(!factory.contains_singleton("b"));
}

#[rstest]
fn test_depth_limit_stops_deep_chains() {
	// Arrange
	let factory = DefaultBeanFactory::with_settings(ResolutionSettings::new().with_max_resolution_depth(2)).unwrap();
	let mut previous: Option<BeanType> = None;
	for name in ["c0", "c1", "c2"] {
		let ty = BeanType::class(name.to_uppercase());
		let mut ctor = Executable::constructor(&ty);
		if let Some(previous) = &previous {
			ctor = ctor.param(previous.clone());
		}
		let class = BeanClass::builder(&ty)
			.constructor(ctor.build(recorder(&ty, "link")))
			.build();
		factory.register_bean_definition(name, BeanDefinition::for_class(&class).build());
		previous = Some(ty);
	}

	// Act
	let deep = factory.get_bean("c2");
	let shallow = factory.get_bean("c1");

	// Assert
	assert!(shallow.is_ok());
	assert!(matches!(root_cause(&deep.unwrap_err()), BeanError::MaxDepthExceeded(2)));
}

#[rstest]
fn test_exhausted_candidates_report_non_unique_failure(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	register_gears(&factory, &types);
	let widget = &types.widget;
	let class = BeanClass::builder(widget)
		.constructor(
			Executable::constructor(widget)
				.param(types.gear.clone())
				.build(recorder(widget, "gear")),
		)
		.constructor(
			Executable::constructor(widget)
				.param(types.motor.clone())
				.build(recorder(widget, "motor")),
		)
		.build();
	factory.register_bean_definition(
		"widget",
		BeanDefinition::for_class(&class)
			.autowire(AutowireMode::Constructor)
			.build(),
	);

	// Act
	let error = factory.get_bean("widget").unwrap_err();

	// Assert
	assert!(matches!(root_cause(&error), BeanError::NoUniqueBean { .. }));
	assert_eq!(error.as_unsatisfied().map(|e| e.injection_point.executable()), Some("Widget(Gear)"));
	let suppressed = factory.suppressed_errors();
	assert_eq!(suppressed.len(), 1);
	assert!(suppressed[0].contains("No qualifying bean of type 'com.example.Motor'"));
	assert_eq!(factory.bean_definition("widget").unwrap().resolution().state(), CacheState::Empty);
}

#[rstest]
fn test_exhausted_candidates_report_last_failure(types: Types) {
	// Arrange
	let factory = DefaultBeanFactory::new();
	let widget = &types.widget;
	let class = BeanClass::builder(widget)
		.constructor(
			Executable::constructor(widget)
				.param(types.gear.clone())
				.build(recorder(widget, "gear")),
		)
		.constructor(
			Executable::constructor(widget)
				.param(types.motor.clone())
				.build(recorder(widget, "motor")),
		)
		.build();
	factory.register_bean_definition(
		"widget",
		BeanDefinition::for_class(&class)
			.autowire(AutowireMode::Constructor)
			.build(),
	);

	// Act
	let error = factory.get_bean("widget").unwrap_err();

	// Assert
	assert_eq!(error.as_unsatisfied().map(|e| e.injection_point.executable()), Some("Widget(Motor)"));
	assert!(matches!(root_cause(&error), BeanError::NoSuchBean { required_type, .. } if required_type == "com.example.Motor"));
	assert_eq!(factory.suppressed_errors().len(), 1);
	assert_eq!(factory.bean_definition("widget").unwrap().resolution().state(), CacheState::Empty);
}

/// `Widget(Part <name>)`
fn part_consumer(types: &Types, parameter_name: &str) -> Arc<BeanClass> {
	let widget = &types.widget;
	BeanClass::builder(widget)
		.constructor(
			Executable::constructor(widget)
				.named_param(parameter_name, types.part.clone())
				.build(recorder(widget, "part")),
		)
		.build()
}
