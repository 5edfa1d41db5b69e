//! Runtime type model
//!
//! Bean classes, parameters and values are described by [`BeanType`], an
//! explicit and closed description of a type: its kind, its superclass and
//! the interfaces it implements. Assignability and the type-difference
//! weight used to rank candidate executables are computed from this model
//! alone.
//!
//! Generic element types of collections and maps are informational only;
//! assignability between containers compares the container kinds.

use crate::value::Value;
use std::fmt;
use std::sync::{Arc, LazyLock};

/// Primitive value kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
	Int,
	Long,
	Double,
	Boolean,
}

impl PrimitiveKind {
	fn type_name(self) -> &'static str {
		match self {
			PrimitiveKind::Int => "int",
			PrimitiveKind::Long => "long",
			PrimitiveKind::Double => "double",
			PrimitiveKind::Boolean => "boolean",
		}
	}
}

/// Collection flavours a parameter can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionKind {
	/// Any collection
	Collection,
	List,
	Set,
}

impl CollectionKind {
	fn type_name(self) -> &'static str {
		match self {
			CollectionKind::Collection => "Collection",
			CollectionKind::List => "List",
			CollectionKind::Set => "Set",
		}
	}

	fn accepts(self, other: CollectionKind) -> bool {
		self == CollectionKind::Collection || self == other
	}
}

/// Kind of a [`BeanType`]
#[derive(Debug, Clone)]
pub enum TypeKind {
	Class,
	Interface,
	Primitive(PrimitiveKind),
	Array(BeanType),
	Collection(CollectionKind, BeanType),
	Map(BeanType, BeanType),
	Void,
}

#[derive(Debug)]
struct TypeInfo {
	name: String,
	kind: TypeKind,
	superclass: Option<BeanType>,
	interfaces: Vec<BeanType>,
}

/// A runtime type
///
/// Cheap to clone. Two types are equal when their erasures are equal:
/// `List<Gear>` equals `List<Object>`, while `Gear[]` and `Object[]` differ.
#[derive(Clone)]
pub struct BeanType(Arc<TypeInfo>);

static OBJECT: LazyLock<BeanType> = LazyLock::new(|| BeanType::new("Object", TypeKind::Class, None, Vec::new()));
static NUMBER: LazyLock<BeanType> =
	LazyLock::new(|| BeanType::new("Number", TypeKind::Class, Some(BeanType::object()), Vec::new()));
static STRING: LazyLock<BeanType> =
	LazyLock::new(|| BeanType::new("String", TypeKind::Class, Some(BeanType::object()), Vec::new()));
static INJECTION_POINT: LazyLock<BeanType> = LazyLock::new(|| {
	BeanType::new("InjectionPoint", TypeKind::Class, Some(BeanType::object()), Vec::new())
});
static VOID: LazyLock<BeanType> = LazyLock::new(|| BeanType::new("void", TypeKind::Void, None, Vec::new()));

impl BeanType {
	fn new(
		name: impl Into<String>,
		kind: TypeKind,
		superclass: Option<BeanType>,
		interfaces: Vec<BeanType>,
	) -> Self {
		Self(Arc::new(TypeInfo {
			name: name.into(),
			kind,
			superclass,
			interfaces,
		}))
	}

	/// The root of every class hierarchy
	pub fn object() -> Self {
		OBJECT.clone()
	}

	pub fn number() -> Self {
		NUMBER.clone()
	}

	pub fn string() -> Self {
		STRING.clone()
	}

	pub fn void() -> Self {
		VOID.clone()
	}

	/// Type of parameters that receive the current injection point
	pub fn injection_point() -> Self {
		INJECTION_POINT.clone()
	}

	/// A primitive type
	///
	/// Numeric primitives sit below `Number`, `boolean` directly below
	/// `Object`, so that `Object` and `Number` parameters accept them.
	pub fn primitive(kind: PrimitiveKind) -> Self {
		let superclass = match kind {
			PrimitiveKind::Boolean => BeanType::object(),
			_ => BeanType::number(),
		};
		Self::new(kind.type_name(), TypeKind::Primitive(kind), Some(superclass), Vec::new())
	}

	pub fn int() -> Self {
		Self::primitive(PrimitiveKind::Int)
	}

	pub fn long() -> Self {
		Self::primitive(PrimitiveKind::Long)
	}

	pub fn double() -> Self {
		Self::primitive(PrimitiveKind::Double)
	}

	pub fn boolean() -> Self {
		Self::primitive(PrimitiveKind::Boolean)
	}

	/// A class extending `Object` directly
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::BeanType;
	///
	/// let gear = BeanType::class("Gear");
	/// assert!(BeanType::object().is_assignable_from(&gear));
	/// assert!(!gear.is_assignable_from(&BeanType::object()));
	/// ```
	pub fn class(name: impl Into<String>) -> Self {
		TypeBuilder::class(name).build()
	}

	/// An interface without super-interfaces
	pub fn interface(name: impl Into<String>) -> Self {
		TypeBuilder::interface(name).build()
	}

	pub fn array_of(element: BeanType) -> Self {
		let name = format!("{}[]", element.name());
		Self::new(name, TypeKind::Array(element), Some(BeanType::object()), Vec::new())
	}

	pub fn collection_of(kind: CollectionKind, element: BeanType) -> Self {
		let name = format!("{}<{}>", kind.type_name(), element.name());
		Self::new(name, TypeKind::Collection(kind, element), Some(BeanType::object()), Vec::new())
	}

	pub fn list_of(element: BeanType) -> Self {
		Self::collection_of(CollectionKind::List, element)
	}

	pub fn set_of(element: BeanType) -> Self {
		Self::collection_of(CollectionKind::Set, element)
	}

	pub fn map_of(key: BeanType, value: BeanType) -> Self {
		let name = format!("Map<{}, {}>", key.name(), value.name());
		Self::new(name, TypeKind::Map(key, value), Some(BeanType::object()), Vec::new())
	}

	/// Full name, including generic arguments for containers
	pub fn name(&self) -> &str {
		&self.0.name
	}

	/// Name after the last `.`
	pub fn simple_name(&self) -> &str {
		let name = self.name();
		match self.0.kind {
			TypeKind::Class | TypeKind::Interface => name.rsplit('.').next().unwrap_or(name),
			_ => name,
		}
	}

	pub fn kind(&self) -> &TypeKind {
		&self.0.kind
	}

	pub fn superclass(&self) -> Option<&BeanType> {
		self.0.superclass.as_ref()
	}

	pub fn interfaces(&self) -> &[BeanType] {
		&self.0.interfaces
	}

	pub fn is_interface(&self) -> bool {
		matches!(self.0.kind, TypeKind::Interface | TypeKind::Collection(..) | TypeKind::Map(..))
	}

	pub fn is_primitive(&self) -> bool {
		matches!(self.0.kind, TypeKind::Primitive(_))
	}

	pub fn is_void(&self) -> bool {
		matches!(self.0.kind, TypeKind::Void)
	}

	pub fn is_object(&self) -> bool {
		matches!(self.0.kind, TypeKind::Class) && self.0.superclass.is_none() && self.0.name == "Object"
	}

	/// Whether the type is an array, collection or map
	pub fn is_container(&self) -> bool {
		matches!(
			self.0.kind,
			TypeKind::Array(_) | TypeKind::Collection(..) | TypeKind::Map(..)
		)
	}

	/// Element type of arrays and collections, value type of maps
	pub fn element_type(&self) -> Option<&BeanType> {
		match &self.0.kind {
			TypeKind::Array(element) | TypeKind::Collection(_, element) => Some(element),
			TypeKind::Map(_, value) => Some(value),
			_ => None,
		}
	}

	fn erasure(&self) -> String {
		match &self.0.kind {
			TypeKind::Array(element) => format!("{}[]", element.erasure()),
			TypeKind::Collection(kind, _) => kind.type_name().to_string(),
			TypeKind::Map(..) => "Map".to_string(),
			_ => self.0.name.clone(),
		}
	}

	/// Whether a value of type `other` can be used where `self` is expected
	pub fn is_assignable_from(&self, other: &BeanType) -> bool {
		if self == other {
			return true;
		}
		match (&self.0.kind, &other.0.kind) {
			(TypeKind::Void, _) | (_, TypeKind::Void) => false,
			(TypeKind::Primitive(_), _) => false,
			(TypeKind::Array(element), TypeKind::Array(other_element)) => {
				!element.is_primitive()
					&& !other_element.is_primitive()
					&& element.is_assignable_from(other_element)
			}
			(TypeKind::Collection(kind, _), TypeKind::Collection(other_kind, _)) => {
				kind.accepts(*other_kind)
			}
			(TypeKind::Map(..), TypeKind::Map(..)) => true,
			(TypeKind::Array(_), _) | (TypeKind::Collection(..), _) | (TypeKind::Map(..), _) => {
				false
			}
			_ if self.is_object() => true,
			_ => other.has_supertype(self),
		}
	}

	fn has_supertype(&self, target: &BeanType) -> bool {
		if let Some(superclass) = self.superclass() {
			if superclass == target || superclass.has_supertype(target) {
				return true;
			}
		}
		self.interfaces()
			.iter()
			.any(|iface| iface == target || iface.has_supertype(target))
	}

	/// Whether `value` can be passed where `self` is expected
	///
	/// `Null` fits every non-primitive type.
	pub fn is_assignable_value(&self, value: &Value) -> bool {
		match value.runtime_type() {
			Some(value_type) => self.is_assignable_from(&value_type),
			None => !self.is_primitive() && !self.is_void(),
		}
	}

	/// Whether a declared type hint names this type, by full or simple name
	pub fn matches_type_name(&self, type_name: &str) -> bool {
		type_name == self.name() || type_name == self.simple_name() || type_name == self.erasure()
	}

	/// Empty array, collection or map of this type
	pub fn empty_value(&self) -> Option<Value> {
		match &self.0.kind {
			TypeKind::Array(element) => Some(Value::Array {
				element: element.clone(),
				items: Vec::new(),
			}),
			TypeKind::Collection(CollectionKind::Set, _) => Some(Value::Set(Vec::new())),
			TypeKind::Collection(..) => Some(Value::List(Vec::new())),
			TypeKind::Map(..) => Some(Value::Map(Vec::new())),
			_ => None,
		}
	}
}

impl PartialEq for BeanType {
	fn eq(&self, other: &Self) -> bool {
		if Arc::ptr_eq(&self.0, &other.0) {
			return true;
		}
		std::mem::discriminant(&self.0.kind) == std::mem::discriminant(&other.0.kind)
			&& self.erasure() == other.erasure()
	}
}

impl Eq for BeanType {}

impl fmt::Debug for BeanType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "BeanType({})", self.name())
	}
}

impl fmt::Display for BeanType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Builder for class and interface types with a hierarchy
///
/// # Examples
///
/// ```
/// use trellis_di::{BeanType, TypeBuilder};
///
/// let engine = BeanType::interface("Engine");
/// let motor = TypeBuilder::class("Motor").implements(engine.clone()).build();
/// let turbo = TypeBuilder::class("TurboMotor").extends(motor.clone()).build();
///
/// assert!(engine.is_assignable_from(&turbo));
/// assert!(motor.is_assignable_from(&turbo));
/// ```
#[derive(Debug)]
pub struct TypeBuilder {
	name: String,
	interface: bool,
	superclass: Option<BeanType>,
	interfaces: Vec<BeanType>,
}

impl TypeBuilder {
	pub fn class(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			interface: false,
			superclass: None,
			interfaces: Vec::new(),
		}
	}

	pub fn interface(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			interface: true,
			superclass: None,
			interfaces: Vec::new(),
		}
	}

	/// Set the superclass (classes default to `Object`)
	pub fn extends(mut self, superclass: BeanType) -> Self {
		self.superclass = Some(superclass);
		self
	}

	pub fn implements(mut self, interface: BeanType) -> Self {
		self.interfaces.push(interface);
		self
	}

	pub fn build(self) -> BeanType {
		if self.interface {
			BeanType::new(self.name, TypeKind::Interface, None, self.interfaces)
		} else {
			let superclass = self.superclass.unwrap_or_else(BeanType::object);
			BeanType::new(self.name, TypeKind::Class, Some(superclass), self.interfaces)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn test_object_accepts_everything_but_void() {
		let object = BeanType::object();
		assert!(object.is_assignable_from(&BeanType::string()));
		assert!(object.is_assignable_from(&BeanType::int()));
		assert!(object.is_assignable_from(&BeanType::list_of(BeanType::string())));
		assert!(!object.is_assignable_from(&BeanType::void()));
	}

	#[rstest]
	fn test_primitives_only_accept_themselves() {
		assert!(BeanType::int().is_assignable_from(&BeanType::int()));
		assert!(!BeanType::long().is_assignable_from(&BeanType::int()));
		assert!(BeanType::number().is_assignable_from(&BeanType::double()));
		assert!(!BeanType::number().is_assignable_from(&BeanType::boolean()));
	}

	#[rstest]
	fn test_interface_hierarchy() {
		let closeable = BeanType::interface("Closeable");
		let stream = TypeBuilder::interface("Stream").implements(closeable.clone()).build();
		let file = TypeBuilder::class("FileStream").implements(stream.clone()).build();

		assert!(closeable.is_assignable_from(&file));
		assert!(stream.is_assignable_from(&file));
		assert!(!file.is_assignable_from(&stream));
	}

	#[rstest]
	fn test_container_erasure() {
		let gear = BeanType::class("Gear");
		let list_of_gears = BeanType::list_of(gear.clone());
		let list_of_objects = BeanType::list_of(BeanType::object());

		assert_eq!(list_of_gears, list_of_objects);
		assert!(BeanType::collection_of(CollectionKind::Collection, gear.clone())
			.is_assignable_from(&BeanType::set_of(gear.clone())));
		assert!(!BeanType::set_of(gear.clone()).is_assignable_from(&list_of_gears));
		assert_ne!(BeanType::array_of(gear.clone()), BeanType::array_of(BeanType::object()));
		assert!(BeanType::array_of(BeanType::object()).is_assignable_from(&BeanType::array_of(gear)));
	}

	#[rstest]
	fn test_null_value_assignability() {
		assert!(BeanType::string().is_assignable_value(&Value::Null));
		assert!(!BeanType::int().is_assignable_value(&Value::Null));
	}

	#[rstest]
	#[case("com.acme.Gear", true)]
	#[case("Gear", true)]
	#[case("Widget", false)]
	fn test_matches_type_name(#[case] hint: &str, #[case] expected: bool) {
		let gear = BeanType::class("com.acme.Gear");
		assert_eq!(gear.matches_type_name(hint), expected);
	}

	#[rstest]
	fn test_empty_values() {
		let gear = BeanType::class("Gear");
		assert_eq!(BeanType::list_of(gear.clone()).empty_value(), Some(Value::List(Vec::new())));
		assert_eq!(BeanType::set_of(gear.clone()).empty_value(), Some(Value::Set(Vec::new())));
		assert_eq!(
			BeanType::map_of(BeanType::string(), gear.clone()).empty_value(),
			Some(Value::Map(Vec::new()))
		);
		assert!(gear.empty_value().is_none());
	}
}
