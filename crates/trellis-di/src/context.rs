//! Explicit resolution context
//!
//! A [`ResolutionContext`] is threaded through every resolution call. It
//! carries two stacks:
//!
//! - **Injection points**: the parameter currently being satisfied, pushed
//!   around each dependency lookup so that nested constructors declaring an
//!   [`InjectionPoint`] parameter receive the point they are injected into.
//! - **Beans in creation**: names on the current creation path, with O(1)
//!   circular reference detection and a depth limit.
//!
//! Every push is paired with its pop by the scoped `with_*`/`within_*`
//! helpers, including on the error path.

use crate::error::{BeanError, BeanResult};
use crate::executable::Executable;
use crate::types::BeanType;
use std::collections::HashSet;
use std::fmt;
use trellis_conf::ResolutionSettings;

/// Maximum number of beans in creation on one path, unless configured
pub const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// A parameter of a candidate executable being satisfied for a bean
#[derive(Debug, Clone, PartialEq)]
pub struct InjectionPoint {
	bean_name: String,
	executable: String,
	index: usize,
	parameter_type: BeanType,
	parameter_name: Option<String>,
}

impl InjectionPoint {
	pub fn new(
		bean_name: impl Into<String>,
		executable: impl Into<String>,
		index: usize,
		parameter_type: BeanType,
		parameter_name: Option<String>,
	) -> Self {
		Self {
			bean_name: bean_name.into(),
			executable: executable.into(),
			index,
			parameter_type,
			parameter_name,
		}
	}

	/// Injection point for parameter `index` of `executable`
	///
	/// Panics if `index` is out of range; callers iterate the executable's
	/// own parameters.
	pub fn for_parameter(bean_name: &str, executable: &Executable, index: usize) -> Self {
		let parameter = &executable.parameters()[index];
		Self::new(
			bean_name,
			executable.to_string(),
			index,
			parameter.ty.clone(),
			parameter.name.clone(),
		)
	}

	/// Bean whose executable declares the parameter
	pub fn bean_name(&self) -> &str {
		&self.bean_name
	}

	/// Signature of the declaring executable, e.g. `Widget(Gear)`
	pub fn executable(&self) -> &str {
		&self.executable
	}

	pub fn index(&self) -> usize {
		self.index
	}

	pub fn parameter_type(&self) -> &BeanType {
		&self.parameter_type
	}

	pub fn parameter_name(&self) -> Option<&str> {
		self.parameter_name.as_deref()
	}
}

impl fmt::Display for InjectionPoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "parameter {} of {}", self.index, self.executable)
	}
}

/// State carried through one top-level bean request
#[derive(Debug)]
pub struct ResolutionContext {
	injection_points: Vec<InjectionPoint>,
	creation_set: HashSet<String>,
	creation_path: Vec<String>,
	max_depth: usize,
}

impl Default for ResolutionContext {
	fn default() -> Self {
		Self::new()
	}
}

impl ResolutionContext {
	pub fn new() -> Self {
		Self::with_max_depth(DEFAULT_MAX_RESOLUTION_DEPTH)
	}

	pub fn with_max_depth(max_depth: usize) -> Self {
		Self {
			injection_points: Vec::new(),
			creation_set: HashSet::new(),
			creation_path: Vec::new(),
			max_depth,
		}
	}

	pub fn from_settings(settings: &ResolutionSettings) -> Self {
		Self::with_max_depth(settings.max_resolution_depth)
	}

	/// Innermost injection point being satisfied
	pub fn current_injection_point(&self) -> Option<&InjectionPoint> {
		self.injection_points.last()
	}

	/// Run `f` with `injection_point` as the current injection point
	pub fn with_injection_point<R>(&mut self, injection_point: InjectionPoint, f: impl FnOnce(&mut Self) -> R) -> R {
		self.injection_points.push(injection_point);
		let result = f(self);
		self.injection_points.pop();
		result
	}

	/// Run `f` with `bean_name` marked as in creation
	///
	/// Fails without calling `f` when the bean is already on the creation
	/// path or the depth limit would be exceeded.
	pub fn within_creation<R>(
		&mut self,
		bean_name: &str,
		f: impl FnOnce(&mut Self) -> BeanResult<R>,
	) -> BeanResult<R> {
		self.begin_creation(bean_name)?;
		let result = f(self);
		self.end_creation(bean_name);
		result
	}

	fn begin_creation(&mut self, bean_name: &str) -> BeanResult<()> {
		let depth = self.creation_path.len() + 1;
		if depth > self.max_depth {
			return Err(BeanError::MaxDepthExceeded(self.max_depth));
		}
		if self.creation_set.contains(bean_name) {
			return Err(BeanError::CircularDependency {
				bean_name: bean_name.to_string(),
				path: self.cycle_path(bean_name),
			});
		}
		self.creation_set.insert(bean_name.to_string());
		self.creation_path.push(bean_name.to_string());
		Ok(())
	}

	fn end_creation(&mut self, bean_name: &str) {
		self.creation_set.remove(bean_name);
		if let Some(pos) = self.creation_path.iter().rposition(|name| name == bean_name) {
			self.creation_path.remove(pos);
		}
	}

	fn cycle_path(&self, bean_name: &str) -> String {
		match self.creation_path.iter().position(|name| name == bean_name) {
			Some(start) => {
				let mut path: Vec<&str> = self.creation_path[start..].iter().map(String::as_str).collect();
				path.push(bean_name);
				path.join(" -> ")
			}
			None => bean_name.to_string(),
		}
	}

	pub fn is_in_creation(&self, bean_name: &str) -> bool {
		self.creation_set.contains(bean_name)
	}

	/// Number of beans currently in creation
	pub fn creation_depth(&self) -> usize {
		self.creation_path.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	fn point(index: usize) -> InjectionPoint {
		InjectionPoint::new("widget", "Widget(Gear)", index, BeanType::class("Gear"), None)
	}

	#[rstest]
	fn test_injection_points_nest_and_unwind() {
		let mut ctx = ResolutionContext::new();
		assert!(ctx.current_injection_point().is_none());

		ctx.with_injection_point(point(0), |ctx| {
			assert_eq!(ctx.current_injection_point().map(|ip| ip.index()), Some(0));
			ctx.with_injection_point(point(1), |ctx| {
				assert_eq!(ctx.current_injection_point().map(|ip| ip.index()), Some(1));
			});
			assert_eq!(ctx.current_injection_point().map(|ip| ip.index()), Some(0));
		});

		assert!(ctx.current_injection_point().is_none());
	}

	#[rstest]
	fn test_circular_path() {
		let mut ctx = ResolutionContext::new();

		let result = ctx.within_creation("a", |ctx| {
			ctx.within_creation("b", |ctx| ctx.within_creation("a", |_| Ok(())))
		});

		match result {
			Err(BeanError::CircularDependency { bean_name, path }) => {
				assert_eq!(bean_name, "a");
				assert_eq!(path, "a -> b -> a");
			}
			other => panic!("expected circular dependency, got {:?}", other),
		}
		assert_eq!(ctx.creation_depth(), 0);
		assert!(!ctx.is_in_creation("a"));
	}

	#[rstest]
	fn test_depth_limit() {
		let mut ctx = ResolutionContext::with_max_depth(2);

		let result = ctx.within_creation("a", |ctx| {
			ctx.within_creation("b", |ctx| ctx.within_creation("c", |_| Ok(())))
		});

		assert!(matches!(result, Err(BeanError::MaxDepthExceeded(2))));
		assert_eq!(ctx.creation_depth(), 0);
	}

	#[rstest]
	fn test_injection_point_display() {
		assert_eq!(point(1).to_string(), "parameter 1 of Widget(Gear)");
	}
}
