use crate::console;
use crate::context::RunContext;
use crate::registry;
use crate::resolve;
use crate::{MirrorError, Result, fetch, paths};
use futures::stream::{self, StreamExt, TryStreamExt};
use sha1::{Digest, Sha1};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Hard cap on simultaneous package workflows; bounds outbound bandwidth
/// and open file descriptors.
pub const DOWNLOAD_CONCURRENCY: usize = 5;

#[derive(Debug, Default, Clone, Copy)]
pub struct DownloadStats {
    pub archives_downloaded: usize,
    pub archives_skipped: usize,
    pub binaries_downloaded: usize,
    pub metadata_written: usize,
}

impl DownloadStats {
    fn merge(&mut self, other: DownloadStats) {
        self.archives_downloaded += other.archives_downloaded;
        self.archives_skipped += other.archives_skipped;
        self.binaries_downloaded += other.binaries_downloaded;
        self.metadata_written += other.metadata_written;
    }
}

/// Runs one download workflow per collected package name, at most
/// [`DOWNLOAD_CONCURRENCY`] at a time. The first fatal error drops the
/// stream, which cancels whatever is still in flight.
pub async fn download_all(ctx: &Arc<RunContext>) -> Result<DownloadStats> {
    let collected = ctx.collected_snapshot();

    stream::iter(collected.into_iter().map(|(name, versions)| {
        let ctx = Arc::clone(ctx);
        async move { download_package(&ctx, &name, &versions).await }
    }))
    .buffer_unordered(DOWNLOAD_CONCURRENCY)
    .try_fold(DownloadStats::default(), |mut acc, stats| async move {
        acc.merge(stats);
        Ok(acc)
    })
    .await
}

/// One package's workflow: metadata rewrite, binary variants, then the
/// main archive for each collected version, strictly in that order.
pub async fn download_package(
    ctx: &RunContext,
    name: &str,
    versions: &BTreeSet<String>,
) -> Result<DownloadStats> {
    let mut stats = DownloadStats::default();

    let doc = resolve::fetch_document(ctx, name).await?;

    let rewritten = registry::rewrite_for_mirror(&doc, name, versions, &ctx.config);
    let serialized = registry::serialize_document(&rewritten, ctx.config.pretty)?;
    if write_metadata(ctx, name, &serialized)? {
        stats.metadata_written += 1;
        console::metadata_written(name);
    }

    for version in versions {
        let meta = doc
            .versions
            .get(version)
            .ok_or_else(|| MirrorError::MissingVersion {
                name: name.to_string(),
                version: version.clone(),
            })?;

        if let Some(binary) = meta.prebuilt_binary() {
            for variant in &ctx.config.variants {
                let location =
                    paths::binary_location(&ctx.config.root, name, version, binary, variant)?;

                if ctx.check_file(&location.path) {
                    console::binary_present(name, version, &location.file_name);
                    continue;
                }

                // Prebuilt binaries are best-effort: most packages publish
                // only a subset of variants, so a miss never fails the run.
                match fetch::fetch(ctx, &location.remote_url, true).await {
                    Ok(body) => {
                        write_file(&location.path, &body)?;
                        stats.binaries_downloaded += 1;
                        console::downloaded_binary(name, version, &location.file_name);
                    }
                    Err(_) => console::binary_unavailable(name, version, &location.remote_url),
                }
            }
        }

        let tarball_path = paths::tarball_path(&ctx.config.root, name, version);
        if ctx.check_file(&tarball_path) {
            stats.archives_skipped += 1;
            console::already_downloaded(name, version);
            continue;
        }

        let body = fetch::fetch(ctx, &meta.dist.tarball, true).await?;
        verify_checksum(name, version, &meta.dist.shasum, &body)?;
        write_file(&tarball_path, &body)?;
        stats.archives_downloaded += 1;
        console::downloaded(name, version);
    }

    Ok(stats)
}

/// Writes the mirrored metadata file unless the current on-disk content
/// already matches. The existence check registers the path either way.
fn write_metadata(ctx: &RunContext, name: &str, serialized: &[u8]) -> Result<bool> {
    let path = paths::metadata_path(&ctx.config.root, name);

    if ctx.check_file(&path) {
        let current = fs::read(&path).map_err(|source| MirrorError::ReadFile {
            path: path.clone(),
            source,
        })?;
        if current == serialized {
            return Ok(false);
        }
    }

    write_file(&path, serialized)?;
    Ok(true)
}

/// Bytes only reach the final path once the digest matches; an aborted
/// run never leaves a corrupt tarball behind.
fn verify_checksum(name: &str, version: &str, expected: &str, body: &[u8]) -> Result<()> {
    let actual = hex::encode(Sha1::digest(body));

    if actual.eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(MirrorError::ChecksumMismatch {
            name: name.to_string(),
            version: version.to_string(),
            expected: expected.to_string(),
            actual,
        })
    }
}

fn write_file(path: &Path, body: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| MirrorError::WriteFile {
            path: path.to_path_buf(),
            source,
        })?;
    }

    fs::write(path, body).map_err(|source| MirrorError::WriteFile {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorConfig;
    use serde_json::json;

    // "hello" hashed with SHA-1.
    const HELLO_SHA1: &str = "aaf4c61ddcc5e8a2dabede0f3b482cd9aea9434d";

    #[test]
    fn accepts_matching_checksum() {
        assert!(verify_checksum("widget", "1.0.0", HELLO_SHA1, b"hello").is_ok());
    }

    #[test]
    fn accepts_uppercase_registry_checksum() {
        let upper = HELLO_SHA1.to_ascii_uppercase();
        assert!(verify_checksum("widget", "1.0.0", &upper, b"hello").is_ok());
    }

    #[test]
    fn rejects_mismatched_checksum() {
        let result = verify_checksum("widget", "1.0.0", HELLO_SHA1, b"goodbye");
        match result {
            Err(MirrorError::ChecksumMismatch { expected, actual, .. }) => {
                assert_eq!(expected, HELLO_SHA1);
                assert_ne!(actual, HELLO_SHA1);
            }
            other => panic!("expected checksum mismatch, got {:?}", other),
        }
    }

    fn offline_context(root: std::path::PathBuf) -> RunContext {
        let config = MirrorConfig::new("https://registry.test", "http://mirror.local", root);
        RunContext::new(config).unwrap()
    }

    fn prime_widget(ctx: &RunContext) {
        let doc = json!({
            "name": "widget",
            "versions": {
                "1.0.0": {
                    "version": "1.0.0",
                    "dist": {
                        "tarball": "https://registry.test/widget/-/widget-1.0.0.tgz",
                        "shasum": HELLO_SHA1
                    }
                }
            }
        });
        ctx.prime_response(
            "https://registry.test/widget",
            serde_json::to_vec(&doc).unwrap(),
        );
    }

    #[tokio::test]
    async fn checksum_mismatch_aborts_before_the_archive_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        // Body whose digest disagrees with the registry shasum.
        ctx.prime_response(
            "https://registry.test/widget/-/widget-1.0.0.tgz",
            b"goodbye".to_vec(),
        );

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        let result = download_package(&ctx, "widget", &versions).await;

        assert!(matches!(
            result,
            Err(MirrorError::ChecksumMismatch { .. })
        ));
        // Verify-then-write: nothing may reach the tarball path.
        assert!(!paths::tarball_path(dir.path(), "widget", "1.0.0").exists());
    }

    #[tokio::test]
    async fn verified_archive_is_written_to_the_tarball_path() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        ctx.prime_response(
            "https://registry.test/widget/-/widget-1.0.0.tgz",
            b"hello".to_vec(),
        );

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        let stats = download_package(&ctx, "widget", &versions).await.unwrap();

        assert_eq!(stats.archives_downloaded, 1);
        let tarball = paths::tarball_path(dir.path(), "widget", "1.0.0");
        assert_eq!(fs::read(&tarball).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn pre_existing_archive_is_skipped_without_verification() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        // Deliberately not the bytes the shasum describes: the skip path
        // must not re-verify.
        let tarball = paths::tarball_path(dir.path(), "widget", "1.0.0");
        write_file(&tarball, b"stale-but-present").unwrap();

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        let stats = download_package(&ctx, "widget", &versions).await.unwrap();

        assert_eq!(stats.archives_skipped, 1);
        assert_eq!(stats.archives_downloaded, 0);
        assert_eq!(stats.metadata_written, 1);
        assert_eq!(fs::read(&tarball).unwrap(), b"stale-but-present");
    }

    #[tokio::test]
    async fn unchanged_metadata_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        let tarball = paths::tarball_path(dir.path(), "widget", "1.0.0");
        write_file(&tarball, b"present").unwrap();

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        let first = download_package(&ctx, "widget", &versions).await.unwrap();
        assert_eq!(first.metadata_written, 1);

        let metadata_path = paths::metadata_path(dir.path(), "widget");
        let written = fs::read(&metadata_path).unwrap();

        let second = download_package(&ctx, "widget", &versions).await.unwrap();
        assert_eq!(second.metadata_written, 0);
        assert_eq!(fs::read(&metadata_path).unwrap(), written);
    }

    #[tokio::test]
    async fn existence_checks_register_required_files() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        let tarball = paths::tarball_path(dir.path(), "widget", "1.0.0");
        write_file(&tarball, b"present").unwrap();

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        download_package(&ctx, "widget", &versions).await.unwrap();

        let required = ctx.required_snapshot();
        assert!(required.contains(&tarball));
        assert!(required.contains(&paths::metadata_path(dir.path(), "widget")));
    }

    #[tokio::test]
    async fn rewritten_metadata_points_at_the_mirror() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = offline_context(dir.path().to_path_buf());
        prime_widget(&ctx);

        let tarball = paths::tarball_path(dir.path(), "widget", "1.0.0");
        write_file(&tarball, b"present").unwrap();

        let versions = BTreeSet::from(["1.0.0".to_string()]);
        download_package(&ctx, "widget", &versions).await.unwrap();

        let written: serde_json::Value =
            serde_json::from_slice(&fs::read(paths::metadata_path(dir.path(), "widget")).unwrap())
                .unwrap();
        assert_eq!(
            written["versions"]["1.0.0"]["dist"]["tarball"],
            "http://mirror.local/widget/widget-1.0.0.tgz"
        );
        assert_eq!(written["name"], "widget");
    }
}
