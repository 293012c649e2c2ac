use clap::{Parser, Subcommand};
use relayfin_core::{PluginSettings, config::split_list};

/// Relayfin - inspect the resolver catalog the way the media server sees it
#[derive(Parser, Debug)]
#[command(name = "relayfin")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Resolver base URL (overrides RELAYFIN_RESOLVER_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// API key sent as X-Api-Key (overrides RELAYFIN_API_KEY)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// Comma separated provider sites; an empty value disables all of them
    #[arg(long, global = true)]
    pub providers: Option<String>,

    /// Bypass the catalog cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe the resolver health endpoint
    Health,

    /// Dump the provider-filtered catalog
    #[command(alias = "ls")]
    Catalog {
        /// Only show entries from this site
        #[arg(long)]
        site: Option<String>,
    },

    /// Show a single catalog entry
    Entry {
        /// Catalog id, e.g. dizibox:kara-sevda:s02e05
        id: String,
    },

    /// Find the first catalog match for a movie
    Movie {
        #[arg(long)]
        title: String,
        #[arg(long)]
        original_title: Option<String>,
        #[arg(long)]
        provider_id: Option<String>,
    },

    /// List every catalog series matching a name
    Series {
        #[arg(long)]
        name: String,
        #[arg(long)]
        original_name: Option<String>,
        /// Episode id or site:slug series reference
        #[arg(long)]
        provider_id: Option<String>,
    },

    /// Find the first catalog match for an episode
    Episode {
        #[arg(long = "series")]
        series_name: Option<String>,
        #[arg(long)]
        season: Option<u32>,
        #[arg(long)]
        episode: Option<u32>,
        #[arg(long)]
        provider_id: Option<String>,
        #[arg(long)]
        series_provider_id: Option<String>,
    },

    /// Resolve a playable stream URL
    Play {
        /// Catalog id
        id: String,
    },
}

impl Cli {
    /// Layer the global flags over settings loaded from the environment.
    pub fn apply_overrides(&self, settings: &mut PluginSettings) {
        if let Some(url) = &self.base_url {
            settings.resolver_base_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            settings.api_key = Some(key.clone());
        }
        if let Some(raw) = &self.providers {
            settings.enabled_providers = Some(split_list(raw));
        }
        if self.no_cache {
            settings.disable_catalog_cache = true;
        }
    }
}
