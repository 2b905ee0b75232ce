use crate::config::BinaryVariant;
use crate::registry::BinaryMetadata;
use crate::{MirrorError, Result};
use npmirror_semver::Version;
use std::path::{Path, PathBuf};

/// Scoped package names embed a `/` that must not become a path separator
/// on disk or a path segment boundary in a URL. Escaping happens before
/// any other templating.
pub fn escape_name(name: &str) -> String {
    name.replace('/', "%2f")
}

pub fn metadata_url(registry_url: &str, name: &str) -> String {
    format!("{}/{}", registry_url, escape_name(name))
}

pub fn metadata_path(root: &Path, name: &str) -> PathBuf {
    root.join(escape_name(name)).join("index.json")
}

pub fn tarball_filename(name: &str, version: &str) -> String {
    format!("{}-{}.tgz", escape_name(name), version)
}

pub fn tarball_path(root: &Path, name: &str, version: &str) -> PathBuf {
    root.join(escape_name(name)).join(tarball_filename(name, version))
}

pub fn tarball_url(mirror_url: &str, name: &str, version: &str) -> String {
    format!(
        "{}/{}/{}",
        mirror_url,
        escape_name(name),
        tarball_filename(name, version)
    )
}

/// The `remote_path` written into mirrored metadata for packages with
/// prebuilt binaries: binaries live next to the package's tarballs.
pub fn binary_mirror_remote_path(name: &str) -> String {
    format!("/{}/", escape_name(name))
}

/// Where one prebuilt-binary variant lives, both upstream and on disk.
#[derive(Debug, Clone)]
pub struct BinaryLocation {
    pub file_name: String,
    pub path: PathBuf,
    pub remote_url: String,
}

/// node-pre-gyp's default file-name template, used when a package's
/// binary block omits `package_name`.
const DEFAULT_PACKAGE_NAME: &str =
    "{module_name}-v{version}-{node_abi}-{platform}-{arch}.tar.gz";

pub fn binary_location(
    root: &Path,
    name: &str,
    version: &str,
    binary: &BinaryMetadata,
    variant: &BinaryVariant,
) -> Result<BinaryLocation> {
    let parsed = Version::parse(version).map_err(|err| MirrorError::Semver {
        value: format!("{}@{}", name, version),
        reason: err.to_string(),
    })?;

    let values = TemplateValues::new(name, version, &parsed, &binary.module_name, variant);

    let package_name = if binary.package_name.is_empty() {
        DEFAULT_PACKAGE_NAME
    } else {
        &binary.package_name
    };

    let file_name = expand_template(package_name, &values);
    let remote_dir = expand_template(&binary.remote_path, &values);

    let remote_tail = collapse_slashes(&format!("{}/{}", remote_dir, file_name));
    let remote_url = format!(
        "{}/{}",
        binary.host.trim_end_matches('/'),
        remote_tail.trim_start_matches('/')
    );

    let path = root.join(escape_name(name)).join(&file_name);

    Ok(BinaryLocation {
        file_name,
        path,
        remote_url,
    })
}

/// The fixed token table for node-pre-gyp style templates. Values are
/// computed once per expansion; `lookup` is the only place tokens are
/// interpreted.
struct TemplateValues {
    name: String,
    version: String,
    major: String,
    minor: String,
    patch: String,
    prerelease: String,
    build: String,
    module_name: String,
    node_abi: String,
    platform: String,
    arch: String,
}

impl TemplateValues {
    fn new(
        name: &str,
        version: &str,
        parsed: &Version,
        module_name: &str,
        variant: &BinaryVariant,
    ) -> Self {
        TemplateValues {
            name: escape_name(name),
            version: version.to_string(),
            major: parsed.major.to_string(),
            minor: parsed.minor.to_string(),
            patch: parsed.patch.to_string(),
            prerelease: parsed.pre.to_string(),
            build: parsed.build.to_string(),
            module_name: module_name.to_string(),
            node_abi: format!("node-v{}", variant.node_abi),
            platform: variant.platform.clone(),
            arch: variant.arch.clone(),
        }
    }

    fn lookup(&self, token: &str) -> Option<&str> {
        match token {
            "name" => Some(&self.name),
            "version" => Some(&self.version),
            "major" => Some(&self.major),
            "minor" => Some(&self.minor),
            "patch" => Some(&self.patch),
            "prerelease" => Some(&self.prerelease),
            "build" => Some(&self.build),
            "module_name" => Some(&self.module_name),
            "node_abi" => Some(&self.node_abi),
            "platform" => Some(&self.platform),
            "arch" => Some(&self.arch),
            "configuration" => Some("Release"),
            "toolset" => Some(""),
            _ => None,
        }
    }
}

/// Single left-to-right scan. Substituted text is never rescanned, so a
/// value that happens to contain another token's literal spelling cannot
/// be expanded a second time. Unknown tokens stay as written.
fn expand_template(template: &str, values: &TemplateValues) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];

        match tail.find('}') {
            Some(end) => {
                let token = &tail[1..end];
                match values.lookup(token) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&tail[..=end]),
                }
                rest = &tail[end + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }

    out.push_str(rest);
    out
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_was_slash = false;

    for ch in path.chars() {
        if ch == '/' {
            if previous_was_slash {
                continue;
            }
            previous_was_slash = true;
        } else {
            previous_was_slash = false;
        }
        out.push(ch);
    }

    out
}
