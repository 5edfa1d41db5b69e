//! Resolution settings
//!
//! Defaults match the behavior of a freshly registered bean definition:
//! lenient constructor resolution, non-public constructors visible, and a
//! nesting limit of 100 beans in creation at once.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix shared by every environment variable read by [`ResolutionSettings::from_env`]
pub const ENV_PREFIX: &str = "TRELLIS_";

const DEFAULT_MAX_RESOLUTION_DEPTH: usize = 100;

/// Settings applied to bean definitions and resolution contexts
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionSettings {
	/// Pick the closest type match and tolerate ties (`true`), or require
	/// exact assignability and reject ties (`false`)
	#[serde(default = "default_true")]
	pub lenient_constructor_resolution: bool,

	/// Consider non-public constructors and factory methods as candidates
	#[serde(default = "default_true")]
	pub non_public_access_allowed: bool,

	/// Maximum number of beans that may be in creation on one resolution path
	#[serde(default = "default_max_resolution_depth")]
	pub max_resolution_depth: usize,
}

fn default_true() -> bool {
	true
}

fn default_max_resolution_depth() -> usize {
	DEFAULT_MAX_RESOLUTION_DEPTH
}

impl Default for ResolutionSettings {
	fn default() -> Self {
		Self {
			lenient_constructor_resolution: true,
			non_public_access_allowed: true,
			max_resolution_depth: DEFAULT_MAX_RESOLUTION_DEPTH,
		}
	}
}

impl ResolutionSettings {
	/// Create new settings with defaults
	pub fn new() -> Self {
		Self::default()
	}

	/// Switch to strict resolution (exact assignability, ties rejected)
	pub fn strict(mut self) -> Self {
		self.lenient_constructor_resolution = false;
		self
	}

	/// Restrict candidates to public constructors and methods
	pub fn public_only(mut self) -> Self {
		self.non_public_access_allowed = false;
		self
	}

	/// Set the maximum creation depth
	pub fn with_max_resolution_depth(mut self, depth: usize) -> Self {
		self.max_resolution_depth = depth;
		self
	}

	/// Validate settings
	pub fn validate(&self) -> Result<(), SettingsError> {
		if self.max_resolution_depth == 0 {
			return Err(SettingsError::ValidationError(
				"max_resolution_depth must be at least 1".to_string(),
			));
		}
		Ok(())
	}

	/// Parse settings from a TOML document
	///
	/// Missing keys fall back to their defaults.
	pub fn from_toml_str(contents: &str) -> Result<Self, SettingsError> {
		let settings: ResolutionSettings = toml::from_str(contents)
			.map_err(|e| SettingsError::ParseError(format!("TOML parse error: {}", e)))?;
		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from environment variables
	///
	/// Recognized variables: `TRELLIS_LENIENT_RESOLUTION`,
	/// `TRELLIS_NON_PUBLIC_ACCESS` and `TRELLIS_MAX_RESOLUTION_DEPTH`.
	/// Unset variables keep defaults.
	pub fn from_env() -> Result<Self, SettingsError> {
		let mut settings = Self::default();

		if let Some(value) = read_env("LENIENT_RESOLUTION") {
			settings.lenient_constructor_resolution = parse_bool("LENIENT_RESOLUTION", &value)?;
		}

		if let Some(value) = read_env("NON_PUBLIC_ACCESS") {
			settings.non_public_access_allowed = parse_bool("NON_PUBLIC_ACCESS", &value)?;
		}

		if let Some(value) = read_env("MAX_RESOLUTION_DEPTH") {
			settings.max_resolution_depth = value.trim().parse().map_err(|_| {
				SettingsError::EnvError(format!(
					"{}MAX_RESOLUTION_DEPTH is not a positive integer: {}",
					ENV_PREFIX, value
				))
			})?;
		}

		settings.validate()?;
		Ok(settings)
	}

	/// Load settings from a `.toml` or `.json` file
	pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, SettingsError> {
		let path = path.into();
		let contents = std::fs::read_to_string(&path).map_err(|e| {
			SettingsError::FileError(format!("Failed to read {}: {}", path.display(), e))
		})?;

		match path.extension().and_then(|s| s.to_str()) {
			Some("toml") => Self::from_toml_str(&contents),
			Some("json") => {
				let settings: ResolutionSettings = serde_json::from_str(&contents)
					.map_err(|e| SettingsError::ParseError(format!("JSON parse error: {}", e)))?;
				settings.validate()?;
				Ok(settings)
			}
			_ => Err(SettingsError::UnsupportedFormat(
				"Supported formats: .toml, .json".to_string(),
			)),
		}
	}
}

fn read_env(key: &str) -> Option<String> {
	std::env::var(format!("{}{}", ENV_PREFIX, key)).ok()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, SettingsError> {
	match value.trim().to_lowercase().as_str() {
		"true" | "1" | "yes" | "on" => Ok(true),
		"false" | "0" | "no" | "off" => Ok(false),
		other => Err(SettingsError::EnvError(format!(
			"{}{} is not a boolean: {}",
			ENV_PREFIX, key, other
		))),
	}
}

/// Settings error
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
	#[error("File error: {0}")]
	FileError(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment error: {0}")]
	EnvError(String),

	#[error("Unsupported format: {0}")]
	UnsupportedFormat(String),
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;
	use std::io::Write;

	#[rstest]
	fn test_default_settings() {
		let settings = ResolutionSettings::default();
		assert!(settings.lenient_constructor_resolution);
		assert!(settings.non_public_access_allowed);
		assert_eq!(settings.max_resolution_depth, 100);
	}

	#[rstest]
	fn test_builder_methods() {
		let settings = ResolutionSettings::new()
			.strict()
			.public_only()
			.with_max_resolution_depth(8);
		assert!(!settings.lenient_constructor_resolution);
		assert!(!settings.non_public_access_allowed);
		assert_eq!(settings.max_resolution_depth, 8);
	}

	#[rstest]
	fn test_zero_depth_is_rejected() {
		let settings = ResolutionSettings::new().with_max_resolution_depth(0);
		assert!(matches!(
			settings.validate(),
			Err(SettingsError::ValidationError(_))
		));
	}

	#[rstest]
	fn test_toml_partial_document_keeps_defaults() {
		let settings = ResolutionSettings::from_toml_str("non_public_access_allowed = false").unwrap();
		assert!(settings.lenient_constructor_resolution);
		assert!(!settings.non_public_access_allowed);
		assert_eq!(settings.max_resolution_depth, 100);
	}

	#[rstest]
	fn test_toml_syntax_error() {
		let result = ResolutionSettings::from_toml_str("lenient_constructor_resolution = ");
		assert!(matches!(result, Err(SettingsError::ParseError(_))));
	}

	#[rstest]
	#[case("true", true)]
	#[case("1", true)]
	#[case("off", false)]
	#[case("No", false)]
	fn test_parse_bool(#[case] input: &str, #[case] expected: bool) {
		assert_eq!(parse_bool("X", input).unwrap(), expected);
	}

	#[rstest]
	#[serial]
	fn test_from_env() {
		// SAFETY: serialized with every other environment-mutating test
		unsafe {
			std::env::set_var("TRELLIS_LENIENT_RESOLUTION", "false");
			std::env::set_var("TRELLIS_MAX_RESOLUTION_DEPTH", "12");
		}

		let settings = ResolutionSettings::from_env().unwrap();

		unsafe {
			std::env::remove_var("TRELLIS_LENIENT_RESOLUTION");
			std::env::remove_var("TRELLIS_MAX_RESOLUTION_DEPTH");
		}
		assert!(!settings.lenient_constructor_resolution);
		assert_eq!(settings.max_resolution_depth, 12);
	}

	#[rstest]
	#[serial]
	fn test_from_env_rejects_garbage() {
		unsafe {
			std::env::set_var("TRELLIS_NON_PUBLIC_ACCESS", "maybe");
		}

		let result = ResolutionSettings::from_env();

		unsafe {
			std::env::remove_var("TRELLIS_NON_PUBLIC_ACCESS");
		}
		assert!(matches!(result, Err(SettingsError::EnvError(_))));
	}

	#[rstest]
	fn test_from_json_file() {
		let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
		write!(file, r#"{{"max_resolution_depth": 7}}"#).unwrap();

		let settings = ResolutionSettings::from_file(file.path()).unwrap();

		assert_eq!(settings.max_resolution_depth, 7);
		assert!(settings.lenient_constructor_resolution);
	}

	#[rstest]
	fn test_unsupported_extension() {
		let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
		let result = ResolutionSettings::from_file(file.path());
		assert!(matches!(result, Err(SettingsError::UnsupportedFormat(_))));
	}
}
