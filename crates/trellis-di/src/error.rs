//! Error types for bean creation

use crate::context::InjectionPoint;
use thiserror::Error;

/// Boxed error returned by executable invokers and instantiation strategies
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result alias used throughout the crate
pub type BeanResult<T> = Result<T, BeanError>;

/// A dependency of one parameter could not be satisfied
///
/// Produced per candidate while matching arguments. Carries the injection
/// point that failed and, when the failure came from a nested lookup, the
/// underlying cause.
#[derive(Debug, Error)]
#[error(
	"Error creating bean with name '{bean_name}': Unsatisfied dependency expressed through {injection_point}: {message}"
)]
pub struct UnsatisfiedDependencyError {
	pub bean_name: String,
	pub injection_point: InjectionPoint,
	pub message: String,
	#[source]
	pub cause: Option<Box<BeanError>>,
}

impl UnsatisfiedDependencyError {
	pub fn new(bean_name: impl Into<String>, injection_point: InjectionPoint, message: impl Into<String>) -> Self {
		Self {
			bean_name: bean_name.into(),
			injection_point,
			message: message.into(),
			cause: None,
		}
	}

	/// Wrap a nested lookup failure, reusing its message
	pub fn caused_by(bean_name: impl Into<String>, injection_point: InjectionPoint, cause: BeanError) -> Self {
		Self {
			bean_name: bean_name.into(),
			injection_point,
			message: cause.to_string(),
			cause: Some(Box::new(cause)),
		}
	}

	/// Whether the root cause is a `NoUniqueBean` error
	pub fn is_caused_by_non_unique_bean(&self) -> bool {
		let mut cause = self.cause.as_deref();
		while let Some(error) = cause {
			match error {
				BeanError::NoUniqueBean { .. } => return true,
				BeanError::UnsatisfiedDependency(inner) => cause = inner.cause.as_deref(),
				_ => return false,
			}
		}
		false
	}
}

/// Errors raised while resolving and instantiating beans
#[derive(Debug, Error)]
pub enum BeanError {
	#[error(transparent)]
	UnsatisfiedDependency(Box<UnsatisfiedDependencyError>),

	#[error("Error creating bean with name '{bean_name}': {message}")]
	NoMatchingExecutable { bean_name: String, message: String },

	#[error(
		"Error creating bean with name '{bean_name}': Ambiguous {kind} matches found on bean class [{class_name}] (hint: specify index/type/name arguments for simple parameters to avoid type ambiguities): {}",
		.candidates.join(", ")
	)]
	AmbiguousMatch {
		bean_name: String,
		kind: &'static str,
		class_name: String,
		candidates: Vec<String>,
	},

	#[error(
		"Error creating bean with name '{bean_name}': Invalid factory method '{method_name}' on class [{class_name}]: needs to have a non-void return type!"
	)]
	InvalidFactoryMethod {
		bean_name: String,
		method_name: String,
		class_name: String,
	},

	#[error("Invalid bean definition with name '{bean_name}': {message}")]
	BeanDefinitionStore { bean_name: String, message: String },

	#[error(
		"Error creating bean with name '{bean_name}': Resolution of declared {kind}s on bean class [{class_name}] failed: {message}"
	)]
	CandidateIntrospection {
		bean_name: String,
		kind: &'static str,
		class_name: String,
		message: String,
	},

	#[error("Error creating bean with name '{bean_name}': {message}")]
	Instantiation {
		bean_name: String,
		message: String,
		#[source]
		source: BoxError,
	},

	#[error("No qualifying bean of type '{required_type}' available: {reason}")]
	NoSuchBean { required_type: String, reason: String },

	#[error("No bean named '{0}' available")]
	NoSuchBeanNamed(String),

	#[error(
		"No qualifying bean of type '{required_type}' available: expected single matching bean but found {}: {}",
		.candidates.len(),
		.candidates.join(",")
	)]
	NoUniqueBean {
		required_type: String,
		candidates: Vec<String>,
	},

	#[error(transparent)]
	TypeMismatch(#[from] TypeMismatchError),

	#[error("Error creating bean with name '{bean_name}': Requested bean is currently in creation: {path}")]
	CircularDependency { bean_name: String, path: String },

	#[error("Maximum resolution depth {0} exceeded")]
	MaxDepthExceeded(usize),

	#[error("{0}")]
	IllegalState(String),
}

impl BeanError {
	pub fn is_no_such_bean(&self) -> bool {
		matches!(self, BeanError::NoSuchBean { .. })
	}

	pub fn is_no_unique_bean(&self) -> bool {
		matches!(self, BeanError::NoUniqueBean { .. })
	}

	/// Per-candidate failure, if this is one
	pub fn as_unsatisfied(&self) -> Option<&UnsatisfiedDependencyError> {
		match self {
			BeanError::UnsatisfiedDependency(inner) => Some(inner),
			_ => None,
		}
	}
}

impl From<UnsatisfiedDependencyError> for BeanError {
	fn from(error: UnsatisfiedDependencyError) -> Self {
		BeanError::UnsatisfiedDependency(Box::new(error))
	}
}

/// A value could not be converted to a required type
#[derive(Debug, Error)]
#[error("Failed to convert value of type '{value_type}' to required type '{required_type}': {message}")]
pub struct TypeMismatchError {
	pub value_type: String,
	pub required_type: String,
	pub message: String,
}
