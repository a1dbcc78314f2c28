// SPDX-License-Identifier: MIT OR Apache-2.0

//! Publishes a local properties or YAML file to etcd.

use clap::Parser;
use layercfg::adapters::{EtcdPathStore, FileAdapter, RetryPolicy};
use layercfg::domain::AppIdentity;
use layercfg::ports::{ConfigSource, PathStore};
use layercfg::service::{exclude_runtime_keys, ConfigWriter};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "layercfg-publish")]
#[command(about = "Publish a configuration file to an etcd-backed configuration tree", long_about = None)]
struct Cli {
    /// etcd endpoints
    #[arg(short = 'e', long, value_delimiter = ',', default_value = "localhost:2379")]
    endpoints: Vec<String>,

    /// Deployment environment, e.g. prod
    #[arg(long)]
    env: String,

    /// Application name
    #[arg(short, long)]
    app: String,

    /// Application version
    #[arg(short = 'v', long)]
    version: String,

    /// Properties or YAML file to publish
    #[arg(short, long)]
    file: PathBuf,

    /// Publish to this instance's override tree instead of the shared tree
    #[arg(short, long)]
    instance: Option<String>,

    /// Reconcile an existing tree instead of refusing
    #[arg(long)]
    allow_overwrite: bool,

    /// Maximum connection attempts after the first
    #[arg(long, default_value_t = 5)]
    max_retries: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "layercfg=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let app = AppIdentity::new(&cli.app, &cli.env, &cli.version)?;
    let desired = FileAdapter::from_file(&cli.file)?.snapshot()?;

    let policy = RetryPolicy {
        max_retries: cli.max_retries,
        ..RetryPolicy::default()
    };
    let store: Arc<dyn PathStore> = Arc::new(EtcdPathStore::connect(cli.endpoints, &policy)?);

    let root = match &cli.instance {
        Some(instance_id) => app.instance_config_path(instance_id),
        None => app.config_path(),
    };

    let diff = ConfigWriter::new(Arc::clone(&store))
        .with_exclusion(exclude_runtime_keys())
        .write(&root, &desired, cli.allow_overwrite)?;

    println!(
        "Published {} to {}: {} written, {} deleted",
        cli.file.display(),
        root,
        diff.to_write.len(),
        diff.to_delete.len()
    );
    for key in &diff.to_delete {
        println!("  - {}", key);
    }

    store.close()?;
    Ok(())
}
