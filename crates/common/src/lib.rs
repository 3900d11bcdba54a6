//! Persisted user settings for swaggen.
//!
//! The rc file lives at `~/.swaggen/config.toml` and remembers the last
//! document source, output language and request options between runs.

pub mod error;
pub mod store;

pub use error::ConfigError;
pub use store::{
    ApiSettings, ApiUpdate, ConfigStore, CoreSettings, CoreUpdate, MockSettings, MockUpdate,
    RcConfig, SubstitutionRule,
};
