mod cli;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use relayfin_catalog::{EpisodeLookup, MovieLookup, SeriesLookup};
use relayfin_core::{PluginSettings, SharedSettings};
use relayfin_resolver::ResolverClient;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries the JSON result only.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut settings =
        PluginSettings::from_env().context("invalid RELAYFIN_* environment variable")?;
    cli.apply_overrides(&mut settings);
    info!(
        base_url = %settings.resolver_base_url,
        cache_disabled = settings.disable_catalog_cache,
        "resolver settings loaded"
    );

    let settings = Arc::new(SharedSettings::new(settings));
    let client = ResolverClient::new(settings);

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling");
                cancel.cancel();
            }
        }
    });

    run(&client, cli.command, &cancel).await
}

async fn run(
    client: &ResolverClient,
    command: Commands,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    match command {
        Commands::Health => {
            let status = client.health(cancel).await?;
            print_json(&status)?;
            if !status.healthy {
                anyhow::bail!("resolver unhealthy: {}", status.summary);
            }
        }
        Commands::Catalog { site } => {
            let catalog = client.get_catalog(cancel).await?;
            let entries: Vec<_> = catalog
                .entries()
                .iter()
                .filter(|e| site.as_deref().is_none_or(|s| e.is_from(s)))
                .collect();
            info!(shown = entries.len(), total = catalog.len(), "catalog loaded");
            print_json(&entries)?;
        }
        Commands::Entry { id } => {
            print_json(&client.get_entry_by_id(&id, cancel).await?)?;
        }
        Commands::Movie {
            title,
            original_title,
            provider_id,
        } => {
            let query = MovieLookup {
                title,
                original_title,
                provider_id,
            };
            print_json(&client.find_movie(&query, cancel).await?)?;
        }
        Commands::Series {
            name,
            original_name,
            provider_id,
        } => {
            let query = SeriesLookup {
                name,
                original_name,
                provider_id,
            };
            print_json(&client.find_series_matches(&query, cancel).await?)?;
        }
        Commands::Episode {
            series_name,
            season,
            episode,
            provider_id,
            series_provider_id,
        } => {
            let query = EpisodeLookup {
                series_name,
                season,
                episode,
                provider_id,
                series_provider_id,
            };
            print_json(&client.find_episode(&query, cancel).await?)?;
        }
        Commands::Play { id } => {
            let info = client.resolve_playback(&id, cancel).await?;
            print_json(&info)?;
            if info.is_none() {
                anyhow::bail!("no stream available for {id}");
            }
        }
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("failed to serialize output")?;
    println!("{out}");
    Ok(())
}
