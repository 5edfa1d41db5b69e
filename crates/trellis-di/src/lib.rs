//! # Trellis Dependency Injection
//!
//! Constructor and factory-method resolution for a bean container.
//!
//! Given a bean definition, the resolver picks the constructor or factory
//! method that creates the bean and computes its arguments from declared
//! values, beans found in the container by type, or caller-supplied
//! arguments. The decision is cached on the definition so later creations
//! skip the search.
//!
//! ## Features
//!
//! - **Weighted selection**: candidates ranked by type distance (lenient)
//!   or plain assignability (strict), ties reported in strict mode
//! - **Declared arguments**: indexed and generic values with type and name
//!   hints, bean references, inner beans and `${...}` placeholders
//! - **Autowiring**: unmatched parameters satisfied from the container by
//!   type, with empty-container fallback for arrays, collections and maps
//! - **Resolution cache**: fully resolved arguments or per-slot recipes
//!   replayed on every creation
//! - **Explicit context**: injection points and circular reference
//!   detection carried in a [`ResolutionContext`]
//!
//! ## Example
//!
//! ```rust
//! use trellis_di::{BeanClass, BeanDefinition, BeanType, DefaultBeanFactory, Executable, Value};
//!
//! struct Server {
//!     port: i32,
//! }
//!
//! let server_ty = BeanType::class("Server");
//! let ty = server_ty.clone();
//! let class = BeanClass::builder(&server_ty)
//!     .constructor(
//!         Executable::constructor(&server_ty)
//!             .named_param("port", BeanType::int())
//!             .build(move |args| {
//!                 let port = match args[0] {
//!                     Value::Int(port) => port,
//!                     _ => 0,
//!                 };
//!                 Ok(Value::object(ty.clone(), Server { port }))
//!             }),
//!     )
//!     .build();
//!
//! let factory = DefaultBeanFactory::new();
//! factory.set_property("port", "8080");
//! factory.register_bean_definition(
//!     "server",
//!     BeanDefinition::for_class(&class).constructor_arg("${port}").build(),
//! );
//!
//! let server = factory.get_bean("server").unwrap();
//! assert_eq!(server.downcast_ref::<Server>().map(|s| s.port), Some(8080));
//! ```

pub mod arguments;
pub mod cache;
pub mod candidates;
pub mod context;
pub mod convert;
pub mod definition;
pub mod error;
pub mod executable;
pub mod factory;
pub mod graph;
pub mod host;
pub mod instantiate;
mod matcher;
pub mod resolver;
pub mod scope;
pub mod types;
pub mod value;

pub use arguments::{ArgumentsHolder, ParameterBinding, type_difference_weight};
pub use cache::{CacheState, CachedArguments, CachedResolution, PreparedArgument, ResolutionCache};
pub use candidates::{constructor_candidates, factory_method_candidates, sort_candidates};
pub use context::{DEFAULT_MAX_RESOLUTION_DEPTH, InjectionPoint, ResolutionContext};
pub use convert::{SimpleTypeConverter, TypeConverter};
pub use definition::{
	ArgumentValues, AutowireMode, BeanDefinition, BeanDefinitionBuilder, ConstructorArgumentValues, DeclaredValue,
	HolderSlot, HolderValue, ResolvedArgumentValues, ResolvedValue, ValueHolder,
};
pub use error::{BeanError, BeanResult, BoxError, TypeMismatchError, UnsatisfiedDependencyError};
pub use executable::{
	BeanClass, BeanClassBuilder, Executable, ExecutableBuilder, ExecutableKind, Invoker, Parameter, Visibility,
};
pub use factory::DefaultBeanFactory;
pub use graph::DependentBeanGraph;
pub use host::{
	DependencyDescriptor, DependencyLookup, DependentRegistry, FactoryBeanAccess, ResolverHost, ValueResolver,
};
pub use instantiate::{InstantiationStrategy, SimpleInstantiationStrategy};
pub use resolver::ConstructorResolver;
pub use scope::{Scope, SingletonRegistry};
pub use types::{BeanType, CollectionKind, PrimitiveKind, TypeBuilder, TypeKind};
pub use value::{Instance, Value};
pub use trellis_conf::{ResolutionSettings, SettingsError};
