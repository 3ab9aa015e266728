// Copyright (c) 2024-2025 Fulcrum Genomics LLC
// SPDX-License-Identifier: MIT

//! Ferro Annotate Web Service
//!
//! REST API for variant annotation resolution and enrichment: canonical
//! transcript selection, variant classification, HGVSp-short derivation,
//! and optional secondary-source enrichment, fronted by a deduplicating
//! annotation cache.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::util::SubscriberInitExt;

use ferro_annotate::service::{create_app, ServiceConfig};

#[derive(Parser)]
#[command(name = "annotate-web")]
#[command(about = "Variant annotation resolution and enrichment web service")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the web service
    Serve {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,

        /// Override host address
        #[arg(long)]
        host: Option<String>,

        /// Override port
        #[arg(short, long)]
        port: Option<u16>,

        /// Log level (trace, debug, info, warn, error)
        #[arg(long, default_value = "info")]
        log_level: String,
    },

    /// Generate a sample configuration file
    Config {
        /// Output path for configuration file
        #[arg(short, long, default_value = "config/service.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },

    /// Check configuration without serving
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/service.toml")]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            config,
            host,
            port,
            log_level,
        } => {
            init_tracing(&log_level);

            let mut service_config = if config.exists() {
                ServiceConfig::load_from_file(&config)?
            } else {
                tracing::warn!(
                    "Configuration file {} not found, using defaults",
                    config.display()
                );
                ServiceConfig::default()
            };

            if let Some(host) = host {
                service_config.server.host = host;
            }
            if let Some(port) = port {
                service_config.server.port = port;
            }

            let bind_host = service_config.server.host.clone();
            let bind_port = service_config.server.port;

            let (app, _state) = create_app(service_config)?;

            let addr: SocketAddr = format!("{}:{}", bind_host, bind_port).parse()?;
            info!("Listening on http://{}", addr);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, app).await?;
        }

        Commands::Config { output, force } => {
            if output.exists() && !force {
                eprintln!(
                    "Configuration file {} already exists (use --force to overwrite)",
                    output.display()
                );
                std::process::exit(1);
            }
            ServiceConfig::sample().save_to_file(&output)?;
            println!("Wrote sample configuration to {}", output.display());
        }

        Commands::Check { config } => {
            let service_config = ServiceConfig::load_from_file(&config)?;
            let (_, state) = create_app(service_config)?;
            println!("Configuration OK");
            println!(
                "  provider: {}",
                state.config.provider.base_url
            );
            println!(
                "  enrichment sources: {}",
                if state.enrichment_sources.is_empty() {
                    "none".to_string()
                } else {
                    state.enrichment_sources.join(", ")
                }
            );
            println!(
                "  override sources: {}",
                if state.override_sources.is_empty() {
                    "none".to_string()
                } else {
                    state.override_sources.join(", ")
                }
            );
        }
    }

    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .finish()
        .init();
}
