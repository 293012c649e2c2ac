pub mod config;
pub mod error;
pub mod types;

pub use config::{ConfigSnapshot, PluginSettings, SettingsProvider, SharedSettings};
pub use error::ConfigError;
pub use types::MediaKind;
