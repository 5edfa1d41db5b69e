//! # Trellis
//!
//! A bean container that creates objects through their constructors or
//! factory methods, choosing the best match for the declared arguments and
//! autowiring the rest from the container.
//!
//! ## Feature Flags
//!
//! - `di` - the bean factory and constructor resolver
//! - `conf` - resolution settings and their loaders
//! - `full` (default) - all of the above
//!
//! ## Quick Example
//!
//! ```rust
//! use trellis::prelude::*;
//!
//! let gear = BeanType::class("Gear");
//! let gear_ty = gear.clone();
//! let class = BeanClass::builder(&gear)
//! 	.constructor(Executable::constructor(&gear).build(move |_| Ok(Value::object(gear_ty.clone(), ()))))
//! 	.build();
//!
//! let factory = DefaultBeanFactory::new();
//! factory.register_bean_definition("gear", BeanDefinition::for_class(&class).build());
//!
//! assert!(factory.get_bean("gear").is_ok());
//! ```

#[cfg(feature = "conf")]
pub mod conf {
	//! Resolution settings.
	pub use trellis_conf::*;
}

#[cfg(feature = "di")]
pub mod di {
	//! Bean definitions, the constructor resolver and the default factory.
	pub use trellis_di::*;
}

#[cfg(feature = "conf")]
pub use trellis_conf::settings::{ResolutionSettings, SettingsError};

#[cfg(feature = "di")]
pub use trellis_di::{
	BeanClass, BeanDefinition, BeanError, BeanResult, BeanType, ConstructorResolver, DefaultBeanFactory,
	Executable, InjectionPoint, ResolutionContext, Value,
};

/// Re-exports for the common case of defining classes and fetching beans.
pub mod prelude {
	#[cfg(feature = "conf")]
	pub use crate::ResolutionSettings;

	#[cfg(feature = "di")]
	pub use crate::{
		BeanClass, BeanDefinition, BeanError, BeanResult, BeanType, ConstructorResolver, DefaultBeanFactory,
		Executable, InjectionPoint, ResolutionContext, Value,
	};
}
