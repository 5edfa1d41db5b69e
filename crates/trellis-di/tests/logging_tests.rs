//! Diagnostic events emitted while resolving constructors

mod common;

use common::{Types, plain_class, recorder, types};
use rstest::rstest;
use std::sync::{Arc, Mutex};
use trellis_di::{BeanClass, BeanDefinition, DefaultBeanFactory, Executable};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// A tracing layer that captures log messages to a Vec<String>
struct LogCapture {
	logs: Arc<Mutex<Vec<String>>>,
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for LogCapture {
	fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
		struct MessageVisitor {
			message: String,
		}

		impl tracing::field::Visit for MessageVisitor {
			fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
				if field.name() == "message" {
					self.message = format!("{:?}", value);
				}
			}
		}

		let mut visitor = MessageVisitor {
			message: String::new(),
		};
		event.record(&mut visitor);

		let mut logs = self.logs.lock().unwrap();
		logs.push(format!("[{}] {}", event.metadata().level(), visitor.message));
	}
}

#[rstest]
fn test_autowiring_is_logged(types: Types) {
	// Arrange
	let logs = Arc::new(Mutex::new(Vec::new()));
	let capture = LogCapture { logs: logs.clone() };
	let _guard = tracing_subscriber::registry().with(capture).set_default();

	let widget = &types.widget;
	let class = BeanClass::builder(widget)
		.constructor(
			Executable::constructor(widget)
				.param(types.gear.clone())
				.build(recorder(widget, "widget")),
		)
		.build();
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition("gear1", BeanDefinition::for_class(&plain_class(&types.gear)).build());
	factory.register_bean_definition("widget", BeanDefinition::for_class(&class).build());

	// Act
	factory.get_bean("widget").unwrap();

	// Assert
	let captured = logs.lock().unwrap();
	let expected = "[DEBUG] Autowiring by type from bean name 'widget' via constructor to bean named 'gear1'";
	assert!(
		captured.iter().any(|log| log == expected),
		"Expected autowiring log, but got: {:?}",
		*captured
	);
	assert!(captured.iter().any(|log| log == "[DEBUG] Selected constructor"));
	assert!(captured.iter().any(|log| log == "[DEBUG] Creating instance of bean"));
}

#[rstest]
fn test_suppressed_candidate_failures_are_logged(types: Types) {
	// Arrange
	let logs = Arc::new(Mutex::new(Vec::new()));
	let capture = LogCapture { logs: logs.clone() };
	let _guard = tracing_subscriber::registry().with(capture).set_default();

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
	let factory = DefaultBeanFactory::new();
	factory.register_bean_definition(
		"widget",
		BeanDefinition::for_class(&class)
			.autowire(trellis_di::AutowireMode::Constructor)
			.build(),
	);

	// Act
	let result = factory.get_bean("widget");

	// Assert
	assert!(result.is_err());
	let captured = logs.lock().unwrap();
	assert_eq!(
		captured
			.iter()
			.filter(|log| log.as_str() == "[DEBUG] Suppressing candidate failure")
			.count(),
		1
	);
}
