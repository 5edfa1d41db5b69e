//! # Trellis Configuration
//!
//! Settings that steer how the bean container selects constructors and
//! factory methods.
//!
//! Settings can be built in code, parsed from a TOML or JSON file, or read
//! from `TRELLIS_*` environment variables:
//!
//! ```rust
//! use trellis_conf::ResolutionSettings;
//!
//! let settings = ResolutionSettings::from_toml_str(
//! 	r#"
//! lenient_constructor_resolution = false
//! max_resolution_depth = 32
//! "#,
//! )
//! .unwrap();
//!
//! assert!(!settings.lenient_constructor_resolution);
//! assert!(settings.non_public_access_allowed);
//! assert_eq!(settings.max_resolution_depth, 32);
//! ```
//!
//! ## Module Organization
//!
//! - [`settings`]: resolution settings and their loaders

pub mod settings;

pub use settings::{ENV_PREFIX, ResolutionSettings, SettingsError};
