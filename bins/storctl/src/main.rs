//! Stowage storage control CLI.
//!
//! Operator tooling over the storage-provider abstraction: lists the provider
//! registry with its required credential fields, tests connectivity, and
//! issues every contract operation against the configured backend.
//!
//! Configuration is layered the same way as the rest of Stowage: optional
//! `config/default` and `config/{RUN_MODE}` files, overridden by
//! `STOWAGE__`-prefixed environment variables, e.g.
//! `STOWAGE__PROVIDER=s3 STOWAGE__CREDENTIALS__BUCKET=invoices`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stowage_storage::{
    AdapterFactory, Credentials, DEFAULT_PRESIGN_EXPIRY_SECS, Settings, StorageAdapter,
    StorageError, StorageResult, UploadOptions,
};

/// Storage provider selection, loaded from files and environment.
#[derive(Debug, Clone, Deserialize)]
struct StorageCliConfig {
    /// Provider id from the registry (`storctl providers` lists them).
    provider: String,
    /// Credential field values for the selected provider.
    #[serde(default)]
    credentials: HashMap<String, String>,
    /// Optional behavioral knobs for the adapter.
    #[serde(default)]
    settings: HashMap<String, String>,
}

impl StorageCliConfig {
    fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("STOWAGE").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[derive(Parser)]
#[command(name = "storctl", about = "Inspect and exercise Stowage storage providers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List supported providers and their required credential fields.
    Providers,
    /// Test connectivity against the configured backend.
    Test,
    /// Upload a local file to a storage path.
    Upload {
        /// Local file to read.
        file: PathBuf,
        /// Destination storage path (relative key).
        path: String,
        /// MIME type to record with the object.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Download a storage path to a local file.
    Download {
        /// Storage path to fetch.
        path: String,
        /// Local file to write.
        file: PathBuf,
    },
    /// Generate a time-limited access URL for a storage path.
    Presign {
        /// Storage path.
        path: String,
        /// URL expiry in seconds (values above the provider cap are clamped).
        #[arg(long, default_value_t = DEFAULT_PRESIGN_EXPIRY_SECS)]
        expiry_secs: u64,
    },
    /// Delete a storage path. Deleting a missing key is not an error.
    Delete {
        /// Storage path.
        path: String,
    },
    /// Check whether an object exists at a storage path.
    Exists {
        /// Storage path.
        path: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stowage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Command::Providers = cli.command {
        // Registry listing needs no provider configuration.
        let listing = serde_json::to_string_pretty(AdapterFactory::supported_providers())?;
        println!("{listing}");
        return Ok(());
    }

    let config = StorageCliConfig::load().context("failed to load storage configuration")?;
    let credentials = Credentials::from(config.credentials);
    let settings = Settings::from(config.settings);

    let adapter = AdapterFactory::create_adapter(&config.provider, &credentials, &settings)?;
    info!(provider = adapter.provider_id(), "storage adapter ready");

    run_command(cli.command, adapter).await
}

async fn run_command(command: Command, adapter: Arc<dyn StorageAdapter>) -> anyhow::Result<()> {
    match command {
        Command::Providers => unreachable!("handled before configuration is loaded"),
        Command::Test => {
            let result = cancellable(adapter.test_connection()).await?;
            let verdict = if result.success { "ok" } else { "failed" };
            println!("{verdict}: {}", result.message);
        }
        Command::Upload {
            file,
            path,
            content_type,
        } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let options = UploadOptions {
                content_type,
                metadata: HashMap::new(),
            };

            let result = cancellable(adapter.upload(Bytes::from(data), &path, options)).await??;
            println!("uploaded {} ({} bytes)", result.path, result.metadata["size"]);
            println!("url: {}", result.url);
        }
        Command::Download { path, file } => {
            match cancellable(adapter.download(&path)).await? {
                Ok(data) => {
                    tokio::fs::write(&file, &data)
                        .await
                        .with_context(|| format!("failed to write {}", file.display()))?;
                    println!("downloaded {path} ({} bytes) to {}", data.len(), file.display());
                }
                // Absence is a normal outcome for operator tooling, not a failure
                // worth a stack of error context.
                Err(StorageError::NotFound { path }) => println!("not found: {path}"),
                Err(other) => return Err(other.into()),
            }
        }
        Command::Presign { path, expiry_secs } => {
            let url = cancellable(adapter.generate_presigned_url(&path, expiry_secs)).await??;
            println!("{url}");
        }
        Command::Delete { path } => {
            let removed = cancellable(adapter.delete(&path)).await??;
            if removed {
                println!("deleted {path}");
            } else {
                println!("nothing to delete at {path}");
            }
        }
        Command::Exists { path } => {
            let present = cancellable(adapter.exists(&path)).await??;
            println!("{}", if present { "exists" } else { "absent" });
        }
    }

    Ok(())
}

/// Race an operation against Ctrl-C.
///
/// An aborted call surfaces as the distinct [`StorageError::Cancelled`] so it
/// is never mistaken for a backend failure.
async fn cancellable<T>(op: impl Future<Output = T>) -> StorageResult<T> {
    tokio::select! {
        value = op => Ok(value),
        _ = tokio::signal::ctrl_c() => Err(StorageError::Cancelled),
    }
}
