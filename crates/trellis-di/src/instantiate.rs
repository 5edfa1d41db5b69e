//! Invoking the chosen executable

use crate::definition::BeanDefinition;
use crate::error::BoxError;
use crate::executable::Executable;
use crate::value::Value;

/// Produces a bean from a chosen executable and its final arguments
pub trait InstantiationStrategy: Send + Sync {
	fn instantiate(
		&self,
		definition: &BeanDefinition,
		bean_name: &str,
		executable: &Executable,
		factory_bean: Option<&Value>,
		args: &[Value],
	) -> Result<Value, BoxError>;
}

/// Calls the executable's invoker directly
///
/// Rejects argument lists of the wrong length, instance factory methods
/// without a factory bean, and `null` results from factory methods.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimpleInstantiationStrategy;

impl InstantiationStrategy for SimpleInstantiationStrategy {
	fn instantiate(
		&self,
		_definition: &BeanDefinition,
		bean_name: &str,
		executable: &Executable,
		factory_bean: Option<&Value>,
		args: &[Value],
	) -> Result<Value, BoxError> {
		if args.len() != executable.parameter_count() {
			return Err(format!(
				"{} expects {} arguments but {} were supplied",
				executable,
				executable.parameter_count(),
				args.len()
			)
			.into());
		}
		if !executable.is_constructor() && !executable.is_static() && factory_bean.is_none() {
			return Err(format!("{} needs a factory bean instance to be invoked on", executable).into());
		}

		let bean = executable.invoke(factory_bean, args)?;

		if !executable.is_constructor() && bean.is_null() {
			return Err(format!("factory method {} returned null for bean '{}'", executable, bean_name).into());
		}
		Ok(bean)
	}
}
