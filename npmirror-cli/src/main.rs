use anyhow::Result;
use clap::Parser;
use npmirror_core::config::expand_variants;
use npmirror_core::{Manifest, MirrorConfig, console, mirror};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let args = Cli::parse();

    let manifest = Manifest::read(&args.manifest)?;

    let mut config = MirrorConfig::new(&args.registry, &args.mirror_url, args.root);
    config.variants = expand_variants(&args.abi, &args.platform, &args.arch);
    config.prune = args.prune;
    config.pretty = args.pretty;

    if manifest.dependencies.is_empty() {
        console::warn("manifest declares no dependencies; nothing to mirror");
    }

    let started = Instant::now();
    let report = mirror::run(config, &manifest.dependencies).await?;

    console::summary(
        report.package_count,
        report.version_count,
        started.elapsed().as_secs_f32(),
    );

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}
