use clap::Parser;
use npmirror_core::config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "npmirror",
    about = "mirror an npm registry subset onto local storage",
    version,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    /// package.json whose production dependencies seed the mirror
    #[arg(default_value = "package.json")]
    pub manifest: PathBuf,

    /// Upstream registry base URL
    #[arg(long, default_value = config::DEFAULT_REGISTRY)]
    pub registry: String,

    /// Base URL the mirror will be served from
    #[arg(long = "mirror-url")]
    pub mirror_url: String,

    /// Directory the mirror tree is written into
    #[arg(long)]
    pub root: PathBuf,

    /// Node ABI version to fetch prebuilt binaries for (repeatable)
    #[arg(long = "abi")]
    pub abi: Vec<String>,

    /// Platform to fetch prebuilt binaries for (repeatable)
    #[arg(long = "platform")]
    pub platform: Vec<String>,

    /// Architecture to fetch prebuilt binaries for (repeatable)
    #[arg(long = "arch")]
    pub arch: Vec<String>,

    /// Delete files under the root that this run did not touch
    #[arg(long)]
    pub prune: bool,

    /// Pretty-print mirrored metadata files with 2-space indent
    #[arg(long)]
    pub pretty: bool,
}
