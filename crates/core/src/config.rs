//! Plugin settings and the normalized snapshot the catalog cache is keyed on.
//!
//! The host owns [`PluginSettings`] and may change them at any time. Every
//! catalog operation reads the live settings through a [`SettingsProvider`]
//! and normalizes them into a [`ConfigSnapshot`]; two snapshots comparing
//! unequal is what invalidates the cache.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5055";
pub const DEFAULT_CACHE_MINUTES: i64 = 10;
pub const MIN_CACHE_MINUTES: u32 = 1;
pub const MAX_CACHE_MINUTES: u32 = 1440;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_PROVIDERS: &[&str] = &["dizibox", "hdfilm"];

/// Settings as stored by the host's configuration page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PluginSettings {
    pub resolver_base_url: String,
    pub api_key: Option<String>,
    pub catalog_cache_minutes: i64,
    pub disable_catalog_cache: bool,
    /// `None` means "not configured" and selects [`DEFAULT_PROVIDERS`]. An
    /// explicit empty list enables nothing.
    pub enabled_providers: Option<Vec<String>>,
    pub request_timeout_secs: u64,
}

impl Default for PluginSettings {
    fn default() -> Self {
        Self {
            resolver_base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            catalog_cache_minutes: DEFAULT_CACHE_MINUTES,
            disable_catalog_cache: false,
            enabled_providers: Some(DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect()),
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl PluginSettings {
    /// Load settings from `RELAYFIN_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`PluginSettings::from_env`] with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();

        if let Some(url) = lookup("RELAYFIN_RESOLVER_URL") {
            settings.resolver_base_url = url;
        }
        if let Some(key) = lookup("RELAYFIN_API_KEY") {
            settings.api_key = Some(key);
        }
        if let Some(raw) = lookup("RELAYFIN_CACHE_MINUTES") {
            settings.catalog_cache_minutes = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("RELAYFIN_CACHE_MINUTES", &raw, e))?;
        }
        if let Some(raw) = lookup("RELAYFIN_DISABLE_CACHE") {
            settings.disable_catalog_cache = parse_bool("RELAYFIN_DISABLE_CACHE", &raw)?;
        }
        if let Some(raw) = lookup("RELAYFIN_PROVIDERS") {
            settings.enabled_providers = Some(split_list(&raw));
        }
        if let Some(raw) = lookup("RELAYFIN_TIMEOUT_SECS") {
            settings.request_timeout_secs = raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::invalid("RELAYFIN_TIMEOUT_SECS", &raw, e))?;
        }

        Ok(settings)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Split a comma separated list, dropping blank items.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::invalid(key, raw, "expected a boolean")),
    }
}

/// Normalized, comparable view of [`PluginSettings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    base_url: String,
    api_key: Option<String>,
    cache_minutes: u32,
    disable_cache: bool,
    providers: BTreeSet<String>,
}

impl ConfigSnapshot {
    pub fn from_settings(settings: &PluginSettings) -> Self {
        let api_key = settings
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string);

        let cache_minutes = if settings.disable_catalog_cache {
            0
        } else {
            settings
                .catalog_cache_minutes
                .clamp(MIN_CACHE_MINUTES as i64, MAX_CACHE_MINUTES as i64) as u32
        };

        let providers = match &settings.enabled_providers {
            Some(list) => list
                .iter()
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            None => DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect(),
        };

        Self {
            base_url: normalize_base_url(&settings.resolver_base_url),
            api_key,
            cache_minutes,
            disable_cache: settings.disable_catalog_cache,
            providers,
        }
    }

    /// Base URL with a scheme and a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn cache_minutes(&self) -> u32 {
        self.cache_minutes
    }

    pub fn cache_disabled(&self) -> bool {
        self.disable_cache
    }

    /// Lower-cased site identifiers whose entries may be served.
    pub fn providers(&self) -> &BTreeSet<String> {
        &self.providers
    }

    /// How long a fetched catalog may be served. Zero means "always fetch".
    pub fn cache_ttl(&self) -> Duration {
        if self.disable_cache {
            Duration::ZERO
        } else {
            Duration::from_secs(u64::from(self.cache_minutes) * 60)
        }
    }

    /// Absolute URL for a path relative to the resolver base.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path.trim_start_matches('/'))
    }
}

/// Ensure a scheme and a trailing slash; blank input selects the default.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim();
    let trimmed = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    };

    let mut url = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("http://{trimmed}")
    };
    if !url.ends_with('/') {
        url.push('/');
    }
    url
}

/// Source of the live plugin settings.
pub trait SettingsProvider: Send + Sync {
    fn current(&self) -> PluginSettings;
}

impl SettingsProvider for PluginSettings {
    fn current(&self) -> PluginSettings {
        self.clone()
    }
}

/// Settings cell the host updates when the administrator saves the
/// configuration page. Readers always see the latest published value.
#[derive(Debug)]
pub struct SharedSettings {
    tx: watch::Sender<PluginSettings>,
}

impl SharedSettings {
    pub fn new(settings: PluginSettings) -> Self {
        let (tx, _) = watch::channel(settings);
        Self { tx }
    }

    /// Replace the settings wholesale.
    pub fn update(&self, settings: PluginSettings) {
        self.tx.send_replace(settings);
    }

    /// Edit the settings in place.
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(&mut PluginSettings),
    {
        self.tx.send_modify(f);
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(PluginSettings::default())
    }
}

impl SettingsProvider for SharedSettings {
    fn current(&self) -> PluginSettings {
        self.tx.borrow().clone()
    }
}
