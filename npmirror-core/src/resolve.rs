use crate::context::RunContext;
use crate::registry::{self, RegistryDocument};
use crate::{MirrorError, Result, fetch, paths};
use async_recursion::async_recursion;
use npmirror_semver::{RangeSet, max_satisfying};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::task::JoinSet;

/// Resolves every manifest dependency into the context's ledger.
/// Top-level names fan out as independent tasks; one package's own
/// dependency list resolves sequentially so a diamond is absorbed by the
/// dedup check before the second edge recurses.
pub async fn resolve_manifest(
    ctx: &Arc<RunContext>,
    dependencies: &BTreeMap<String, String>,
) -> Result<()> {
    let mut tasks = JoinSet::new();

    for (name, range) in dependencies {
        let ctx = Arc::clone(ctx);
        let name = name.clone();
        let range = range.clone();
        tasks.spawn(async move { resolve_package(&ctx, &name, &range).await });
    }

    // Returning early drops the set, which aborts every task still in
    // flight; a fatal error in one branch must not leave siblings
    // fetching and mutating the ledger in the background.
    while let Some(result) = tasks.join_next().await {
        result.map_err(|source| MirrorError::Join { source })??;
    }

    Ok(())
}

#[async_recursion]
pub async fn resolve_package(ctx: &RunContext, name: &str, range: &str) -> Result<()> {
    let doc = fetch_document(ctx, name).await?;
    let version = select_version(name, range, &doc)?;

    if !ctx.record_package(name, &version) {
        return Ok(());
    }

    // The ledger only records versions present in the document, so this
    // lookup cannot miss.
    if let Some(meta) = doc.versions.get(&version) {
        for (dep_name, dep_range) in meta.dependencies.iter() {
            resolve_package(ctx, dep_name, dep_range).await?;
        }
    }

    Ok(())
}

/// Fetches and parses the registry document for `name`. Served from the
/// run's response cache after the first call, so the download stage never
/// re-fetches what resolution already pulled.
pub async fn fetch_document(ctx: &RunContext, name: &str) -> Result<RegistryDocument> {
    let url = paths::metadata_url(&ctx.config.registry_url, name);
    let body = fetch::fetch(ctx, &url, false).await?;
    registry::parse_document(&body, &url)
}

/// Maximum published version satisfying the npm range, by semver order.
pub fn select_version(name: &str, range: &str, doc: &RegistryDocument) -> Result<String> {
    let ranges = RangeSet::parse(range).map_err(|err| MirrorError::Semver {
        value: format!("{}@{}", name, range),
        reason: err.to_string(),
    })?;

    match max_satisfying(doc.versions.keys().map(String::as_str), &ranges) {
        Some(version) => Ok(version.to_string()),
        None => Err(MirrorError::NoMatchingVersion {
            name: name.to_string(),
            range: range.to_string(),
        }),
    }
}
