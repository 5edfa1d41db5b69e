//! Constructors, factory methods and the classes declaring them
//!
//! An [`Executable`] describes a constructor or factory method: its
//! declaring type, visibility, parameter list and an invoker closure used to
//! actually produce the bean.

use crate::error::BoxError;
use crate::types::BeanType;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Invoker closure: optional target (instance factory methods) and arguments
pub type Invoker = Arc<dyn Fn(Option<&Value>, &[Value]) -> Result<Value, BoxError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
	Public,
	NonPublic,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutableKind {
	Constructor,
	FactoryMethod {
		name: String,
		is_static: bool,
		return_type: BeanType,
	},
}

/// A single formal parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
	pub ty: BeanType,
	pub name: Option<String>,
}

/// A constructor or factory method
pub struct Executable {
	declaring_type: BeanType,
	kind: ExecutableKind,
	visibility: Visibility,
	parameters: Vec<Parameter>,
	invoker: Invoker,
}

impl Executable {
	/// Start describing a constructor of `declaring_type`
	///
	/// # Examples
	///
	/// ```
	/// use trellis_di::{BeanType, Executable, Value};
	///
	/// let gear = BeanType::class("Gear");
	/// let widget = BeanType::class("Widget");
	/// let ty = widget.clone();
	/// let ctor = Executable::constructor(&widget)
	///     .named_param("gear", gear)
	///     .build(move |_args| Ok(Value::object(ty.clone(), ())));
	///
	/// assert_eq!(ctor.to_string(), "Widget(Gear)");
	/// assert_eq!(ctor.parameter_count(), 1);
	/// ```
	pub fn constructor(declaring_type: &BeanType) -> ExecutableBuilder {
		ExecutableBuilder::new(declaring_type.clone(), ExecutableKind::Constructor)
	}

	/// Start describing a static factory method
	pub fn static_method(declaring_type: &BeanType, name: impl Into<String>, return_type: BeanType) -> ExecutableBuilder {
		ExecutableBuilder::new(
			declaring_type.clone(),
			ExecutableKind::FactoryMethod {
				name: name.into(),
				is_static: true,
				return_type,
			},
		)
	}

	/// Start describing an instance factory method, invoked on a factory bean
	pub fn instance_method(
		declaring_type: &BeanType,
		name: impl Into<String>,
		return_type: BeanType,
	) -> ExecutableBuilder {
		ExecutableBuilder::new(
			declaring_type.clone(),
			ExecutableKind::FactoryMethod {
				name: name.into(),
				is_static: false,
				return_type,
			},
		)
	}

	pub fn declaring_type(&self) -> &BeanType {
		&self.declaring_type
	}

	pub fn kind(&self) -> &ExecutableKind {
		&self.kind
	}

	pub fn visibility(&self) -> Visibility {
		self.visibility
	}

	pub fn is_public(&self) -> bool {
		self.visibility == Visibility::Public
	}

	pub fn is_constructor(&self) -> bool {
		matches!(self.kind, ExecutableKind::Constructor)
	}

	/// Method name, `None` for constructors
	pub fn method_name(&self) -> Option<&str> {
		match &self.kind {
			ExecutableKind::FactoryMethod { name, .. } => Some(name),
			ExecutableKind::Constructor => None,
		}
	}

	pub fn is_static(&self) -> bool {
		matches!(self.kind, ExecutableKind::FactoryMethod { is_static: true, .. })
	}

	/// Type produced by invoking the executable
	pub fn return_type(&self) -> &BeanType {
		match &self.kind {
			ExecutableKind::FactoryMethod { return_type, .. } => return_type,
			ExecutableKind::Constructor => &self.declaring_type,
		}
	}

	pub fn parameters(&self) -> &[Parameter] {
		&self.parameters
	}

	pub fn parameter_count(&self) -> usize {
		self.parameters.len()
	}

	pub fn parameter_types(&self) -> Vec<BeanType> {
		self.parameters.iter().map(|p| p.ty.clone()).collect()
	}

	/// Whether both executables take the same parameter types, in order
	pub fn has_same_parameter_types(&self, other: &Executable) -> bool {
		self.parameters.len() == other.parameters.len()
			&& self
				.parameters
				.iter()
				.zip(&other.parameters)
				.all(|(a, b)| a.ty == b.ty)
	}

	pub fn invoke(&self, target: Option<&Value>, args: &[Value]) -> Result<Value, BoxError> {
		(self.invoker)(target, args)
	}
}

impl fmt::Display for Executable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match &self.kind {
			ExecutableKind::Constructor => write!(f, "{}(", self.declaring_type.simple_name())?,
			ExecutableKind::FactoryMethod { name, .. } => {
				write!(f, "{}.{}(", self.declaring_type.simple_name(), name)?
			}
		}
		for (i, param) in self.parameters.iter().enumerate() {
			if i > 0 {
				f.write_str(", ")?;
			}
			f.write_str(param.ty.simple_name())?;
		}
		f.write_str(")")
	}
}

impl fmt::Debug for Executable {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Executable")
			.field("signature", &self.to_string())
			.field("visibility", &self.visibility)
			.field("kind", &self.kind)
			.finish_non_exhaustive()
	}
}

/// Builder for [`Executable`]
pub struct ExecutableBuilder {
	declaring_type: BeanType,
	kind: ExecutableKind,
	visibility: Visibility,
	parameters: Vec<Parameter>,
}

impl ExecutableBuilder {
	fn new(declaring_type: BeanType, kind: ExecutableKind) -> Self {
		Self {
			declaring_type,
			kind,
			visibility: Visibility::Public,
			parameters: Vec::new(),
		}
	}

	/// Add a parameter whose name is unknown
	pub fn param(mut self, ty: BeanType) -> Self {
		self.parameters.push(Parameter { ty, name: None });
		self
	}

	pub fn named_param(mut self, name: impl Into<String>, ty: BeanType) -> Self {
		self.parameters.push(Parameter {
			ty,
			name: Some(name.into()),
		});
		self
	}

	pub fn non_public(mut self) -> Self {
		self.visibility = Visibility::NonPublic;
		self
	}

	/// Finish with an invoker that ignores the target
	pub fn build<F>(self, invoker: F) -> Arc<Executable>
	where
		F: Fn(&[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
	{
		self.build_with_target(move |_, args| invoker(args))
	}

	/// Finish with an invoker receiving the factory bean, if any
	pub fn build_with_target<F>(self, invoker: F) -> Arc<Executable>
	where
		F: Fn(Option<&Value>, &[Value]) -> Result<Value, BoxError> + Send + Sync + 'static,
	{
		Arc::new(Executable {
			declaring_type: self.declaring_type,
			kind: self.kind,
			visibility: self.visibility,
			parameters: self.parameters,
			invoker: Arc::new(invoker),
		})
	}
}

/// A bean class: its type plus the executables it declares
#[derive(Debug)]
pub struct BeanClass {
	bean_type: BeanType,
	constructors: Vec<Arc<Executable>>,
	methods: Vec<Arc<Executable>>,
}

impl BeanClass {
	pub fn builder(bean_type: &BeanType) -> BeanClassBuilder {
		BeanClassBuilder {
			bean_type: bean_type.clone(),
			constructors: Vec::new(),
			methods: Vec::new(),
		}
	}

	pub fn bean_type(&self) -> &BeanType {
		&self.bean_type
	}

	pub fn name(&self) -> &str {
		self.bean_type.name()
	}

	/// Declared constructors in declaration order
	pub fn constructors(&self) -> &[Arc<Executable>] {
		&self.constructors
	}

	/// Declared factory methods in declaration order
	pub fn methods(&self) -> &[Arc<Executable>] {
		&self.methods
	}

	/// The public or non-public constructor taking no arguments
	pub fn default_constructor(&self) -> Option<&Arc<Executable>> {
		self.constructors.iter().find(|c| c.parameter_count() == 0)
	}
}

pub struct BeanClassBuilder {
	bean_type: BeanType,
	constructors: Vec<Arc<Executable>>,
	methods: Vec<Arc<Executable>>,
}

impl BeanClassBuilder {
	pub fn constructor(mut self, constructor: Arc<Executable>) -> Self {
		self.constructors.push(constructor);
		self
	}

	pub fn method(mut self, method: Arc<Executable>) -> Self {
		self.methods.push(method);
		self
	}

	pub fn build(self) -> Arc<BeanClass> {
		Arc::new(BeanClass {
			bean_type: self.bean_type,
			constructors: self.constructors,
			methods: self.methods,
		})
	}
}
