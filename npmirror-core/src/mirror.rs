use crate::context::RunContext;
use crate::download::{self, DownloadStats};
use crate::prune::{self, PruneSummary};
use crate::resolve;
use crate::{MirrorConfig, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug)]
pub struct MirrorReport {
    pub package_count: usize,
    pub version_count: usize,
    pub downloads: DownloadStats,
    pub pruned: Option<PruneSummary>,
}

/// The whole pipeline: resolve the manifest's dependency ranges, mirror
/// every collected package, then (when configured) sweep what the run
/// did not touch. The sweep only runs after a fully successful download
/// stage, so a fatal error can never trigger deletions.
pub async fn run(
    config: MirrorConfig,
    dependencies: &BTreeMap<String, String>,
) -> Result<MirrorReport> {
    let ctx = Arc::new(RunContext::new(config)?);
    run_with_context(&ctx, dependencies).await
}

pub async fn run_with_context(
    ctx: &Arc<RunContext>,
    dependencies: &BTreeMap<String, String>,
) -> Result<MirrorReport> {
    resolve::resolve_manifest(ctx, dependencies).await?;

    let downloads = download::download_all(ctx).await?;

    let collected = ctx.collected_snapshot();
    let package_count = collected.len();
    let version_count = collected.values().map(BTreeSet::len).sum();

    let pruned = if ctx.config.prune {
        let required = ctx.required_snapshot();
        Some(prune::sweep(&ctx.config.root, &required)?)
    } else {
        None
    };

    Ok(MirrorReport {
        package_count,
        version_count,
        downloads,
        pruned,
    })
}
