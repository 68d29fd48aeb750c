//! Configuration loading and validation

pub mod settings;
pub mod sources;

pub use settings::Config;
pub use sources::{load_config, read_config, CONFIG_ENVVAR};
