//! Value conversion to parameter types

use crate::context::InjectionPoint;
use crate::error::TypeMismatchError;
use crate::types::{BeanType, CollectionKind, PrimitiveKind, TypeKind};
use crate::value::Value;

/// Converts argument values to the types their parameters require
pub trait TypeConverter: Send + Sync {
	/// Convert `value` to `required`, returning it unchanged when it already fits
	fn convert_if_necessary(
		&self,
		value: &Value,
		required: &BeanType,
		injection_point: Option<&InjectionPoint>,
	) -> Result<Value, TypeMismatchError>;
}

/// Default converter
///
/// Handles string parsing into numbers and booleans, numeric widening,
/// rendering scalars as strings, and element-wise conversion between
/// lists, sets and arrays.
///
/// # Examples
///
/// ```
/// use trellis_di::{BeanType, SimpleTypeConverter, TypeConverter, Value};
///
/// let converter = SimpleTypeConverter;
/// let port = converter
///     .convert_if_necessary(&Value::str("8080"), &BeanType::int(), None)
///     .unwrap();
/// assert_eq!(port, Value::Int(8080));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleTypeConverter;

impl TypeConverter for SimpleTypeConverter {
	fn convert_if_necessary(
		&self,
		value: &Value,
		required: &BeanType,
		_injection_point: Option<&InjectionPoint>,
	) -> Result<Value, TypeMismatchError> {
		if required.is_assignable_value(value) {
			return Ok(value.clone());
		}
		let mismatch = |message: String| TypeMismatchError {
			value_type: value.type_description(),
			required_type: required.name().to_string(),
			message,
		};

		match (value, required.kind()) {
			(Value::Null, _) => Err(mismatch("null cannot be assigned to a primitive".to_string())),
			(Value::Str(s), TypeKind::Primitive(kind)) => parse_primitive(s, *kind).map_err(mismatch),
			(Value::Int(i), TypeKind::Primitive(PrimitiveKind::Long)) => Ok(Value::Long(i64::from(*i))),
			(Value::Int(i), TypeKind::Primitive(PrimitiveKind::Double)) => Ok(Value::Double(f64::from(*i))),
			(Value::Long(l), TypeKind::Primitive(PrimitiveKind::Int)) => i32::try_from(*l)
				.map(Value::Int)
				.map_err(|_| mismatch(format!("{} does not fit into int", l))),
			(Value::Long(l), TypeKind::Primitive(PrimitiveKind::Double)) => Ok(Value::Double(*l as f64)),
			(Value::Bool(_) | Value::Int(_) | Value::Long(_) | Value::Double(_), TypeKind::Class)
				if required == &BeanType::string() =>
			{
				Ok(Value::Str(scalar_to_string(value)))
			}
			(_, TypeKind::Array(element)) => {
				let items = match value.items() {
					Some(items) => self.convert_items(items, element)?,
					None => vec![self.convert_if_necessary(value, element, None)?],
				};
				Ok(Value::Array {
					element: element.clone(),
					items,
				})
			}
			(Value::List(items) | Value::Set(items) | Value::Array { items, .. }, TypeKind::Collection(kind, element)) => {
				let items = self.convert_items(items, element)?;
				Ok(match kind {
					CollectionKind::Set => Value::Set(items),
					CollectionKind::List | CollectionKind::Collection => Value::List(items),
				})
			}
			_ => Err(mismatch("no matching conversion found".to_string())),
		}
	}
}

impl SimpleTypeConverter {
	fn convert_items(&self, items: &[Value], element: &BeanType) -> Result<Vec<Value>, TypeMismatchError> {
		items
			.iter()
			.map(|item| self.convert_if_necessary(item, element, None))
			.collect()
	}
}

fn parse_primitive(text: &str, kind: PrimitiveKind) -> Result<Value, String> {
	let text = text.trim();
	match kind {
		PrimitiveKind::Int => text.parse().map(Value::Int).map_err(|e| format!("'{}': {}", text, e)),
		PrimitiveKind::Long => text.parse().map(Value::Long).map_err(|e| format!("'{}': {}", text, e)),
		PrimitiveKind::Double => text.parse().map(Value::Double).map_err(|e| format!("'{}': {}", text, e)),
		PrimitiveKind::Boolean => match text.to_lowercase().as_str() {
			"true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
			"false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
			_ => Err(format!("'{}' is not a boolean", text)),
		},
	}
}

fn scalar_to_string(value: &Value) -> String {
	match value {
		Value::Str(s) => s.clone(),
		other => other.to_string(),
	}
}
