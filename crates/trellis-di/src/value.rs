//! Runtime values passed to and produced by executables

use crate::types::BeanType;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A bean instance: an opaque payload tagged with its runtime type
#[derive(Clone)]
pub struct Instance {
	bean_type: BeanType,
	data: Arc<dyn Any + Send + Sync>,
}

impl Instance {
	pub fn new<T: Any + Send + Sync>(bean_type: BeanType, data: T) -> Self {
		Self {
			bean_type,
			data: Arc::new(data),
		}
	}

	pub fn bean_type(&self) -> &BeanType {
		&self.bean_type
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.data.downcast_ref::<T>()
	}

	/// Shared handle to the payload, if it is a `T`
	pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		Arc::clone(&self.data).downcast::<T>().ok()
	}

	/// Whether both instances share the same payload
	pub fn ptr_eq(&self, other: &Instance) -> bool {
		Arc::ptr_eq(&self.data, &other.data)
	}
}

impl fmt::Debug for Instance {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}@{:p}", self.bean_type, Arc::as_ptr(&self.data))
	}
}

/// A dynamically typed value
///
/// Bean instances compare by identity; everything else by value.
#[derive(Debug, Clone)]
pub enum Value {
	Null,
	Bool(bool),
	Int(i32),
	Long(i64),
	Double(f64),
	Str(String),
	List(Vec<Value>),
	Set(Vec<Value>),
	/// Entries in insertion order
	Map(Vec<(Value, Value)>),
	Array {
		element: BeanType,
		items: Vec<Value>,
	},
	Object(Instance),
}

impl Value {
	/// Wrap a bean payload
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::{BeanType, Value};
	///
	/// struct Gear(u32);
	///
	/// let gear = Value::object(BeanType::class("Gear"), Gear(12));
	/// assert_eq!(gear.downcast_ref::<Gear>().map(|g| g.0), Some(12));
	/// ```
	pub fn object<T: Any + Send + Sync>(bean_type: BeanType, data: T) -> Self {
		Value::Object(Instance::new(bean_type, data))
	}

	pub fn str(value: impl Into<String>) -> Self {
		Value::Str(value.into())
	}

	/// Runtime type of the value, `None` for `Null`
	pub fn runtime_type(&self) -> Option<BeanType> {
		match self {
			Value::Null => None,
			Value::Bool(_) => Some(BeanType::boolean()),
			Value::Int(_) => Some(BeanType::int()),
			Value::Long(_) => Some(BeanType::long()),
			Value::Double(_) => Some(BeanType::double()),
			Value::Str(_) => Some(BeanType::string()),
			Value::List(_) => Some(BeanType::list_of(BeanType::object())),
			Value::Set(_) => Some(BeanType::set_of(BeanType::object())),
			Value::Map(_) => Some(BeanType::map_of(BeanType::object(), BeanType::object())),
			Value::Array { element, .. } => Some(BeanType::array_of(element.clone())),
			Value::Object(instance) => Some(instance.bean_type().clone()),
		}
	}

	/// Simple name of the runtime type, `null` for `Null`
	pub fn type_description(&self) -> String {
		self.runtime_type()
			.map(|ty| ty.simple_name().to_string())
			.unwrap_or_else(|| "null".to_string())
	}

	pub fn is_null(&self) -> bool {
		matches!(self, Value::Null)
	}

	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	pub fn as_instance(&self) -> Option<&Instance> {
		match self {
			Value::Object(instance) => Some(instance),
			_ => None,
		}
	}

	pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
		self.as_instance().and_then(Instance::downcast_ref)
	}

	pub fn downcast_arc<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
		self.as_instance().and_then(Instance::downcast_arc)
	}

	/// Items of a list, set or array
	pub fn items(&self) -> Option<&[Value]> {
		match self {
			Value::List(items) | Value::Set(items) | Value::Array { items, .. } => Some(items),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			(Value::Null, Value::Null) => true,
			(Value::Bool(a), Value::Bool(b)) => a == b,
			(Value::Int(a), Value::Int(b)) => a == b,
			(Value::Long(a), Value::Long(b)) => a == b,
			(Value::Double(a), Value::Double(b)) => a == b,
			(Value::Str(a), Value::Str(b)) => a == b,
			(Value::List(a), Value::List(b)) | (Value::Set(a), Value::Set(b)) => a == b,
			(Value::Map(a), Value::Map(b)) => a == b,
			(
				Value::Array {
					element: ea,
					items: a,
				},
				Value::Array {
					element: eb,
					items: b,
				},
			) => ea == eb && a == b,
			(Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
			_ => false,
		}
	}
}

impl From<bool> for Value {
	fn from(value: bool) -> Self {
		Value::Bool(value)
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Value::Int(value)
	}
}

impl From<i64> for Value {
	fn from(value: i64) -> Self {
		Value::Long(value)
	}
}

impl From<f64> for Value {
	fn from(value: f64) -> Self {
		Value::Double(value)
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Value::Str(value.to_string())
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Value::Str(value)
	}
}

impl fmt::Display for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Value::Null => f.write_str("null"),
			Value::Bool(b) => write!(f, "{}", b),
			Value::Int(i) => write!(f, "{}", i),
			Value::Long(l) => write!(f, "{}", l),
			Value::Double(d) => write!(f, "{}", d),
			Value::Str(s) => write!(f, "\"{}\"", s),
			Value::List(items) | Value::Set(items) | Value::Array { items, .. } => {
				f.write_str("[")?;
				for (i, item) in items.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}", item)?;
				}
				f.write_str("]")
			}
			Value::Map(entries) => {
				f.write_str("{")?;
				for (i, (key, value)) in entries.iter().enumerate() {
					if i > 0 {
						f.write_str(", ")?;
					}
					write!(f, "{}={}", key, value)?;
				}
				f.write_str("}")
			}
			Value::Object(instance) => write!(f, "{:?}", instance),
		}
	}
}
