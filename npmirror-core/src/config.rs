use std::path::PathBuf;

pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// One requested prebuilt-binary flavour: a Node ABI number crossed with a
/// target platform and architecture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryVariant {
    pub node_abi: String,
    pub platform: String,
    pub arch: String,
}

#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Upstream registry base URL, no trailing slash.
    pub registry_url: String,
    /// Base URL the mirror will be served from, no trailing slash.
    pub mirror_url: String,
    /// Directory the mirror tree is written into.
    pub root: PathBuf,
    /// Prebuilt-binary variants to attempt for every mirrored version.
    pub variants: Vec<BinaryVariant>,
    /// Delete files under `root` that this run did not touch.
    pub prune: bool,
    /// Pretty-print mirrored metadata files with 2-space indent.
    pub pretty: bool,
}

impl MirrorConfig {
    pub fn new(registry_url: &str, mirror_url: &str, root: PathBuf) -> Self {
        MirrorConfig {
            registry_url: registry_url.trim_end_matches('/').to_string(),
            mirror_url: mirror_url.trim_end_matches('/').to_string(),
            root,
            variants: Vec::new(),
            prune: false,
            pretty: false,
        }
    }
}

/// Expands the requested ABI/platform/arch lists into their Cartesian
/// product, in the order the lists were given.
pub fn expand_variants(abis: &[String], platforms: &[String], archs: &[String]) -> Vec<BinaryVariant> {
    let mut variants = Vec::new();

    for abi in abis {
        for platform in platforms {
            for arch in archs {
                variants.push(BinaryVariant {
                    node_abi: abi.clone(),
                    platform: platform.clone(),
                    arch: arch.clone(),
                });
            }
        }
    }

    variants
}
