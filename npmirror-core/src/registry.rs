use crate::config::MirrorConfig;
use crate::paths;
use crate::{MirrorError, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A registry metadata document for one package. Only the fields the
/// mirror reads or rewrites are typed; everything else round-trips
/// through the flattened maps so mirrored files stay faithful to the
/// upstream document.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct RegistryDocument {
    pub versions: BTreeMap<String, VersionMetadata>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VersionMetadata {
    pub version: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    pub dist: DistInfo,
    #[serde(
        default,
        deserialize_with = "deserialize_binary",
        skip_serializing_if = "Option::is_none"
    )]
    pub binary: Option<BinaryMetadata>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DistInfo {
    pub tarball: String,
    pub shasum: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// node-pre-gyp style binary block, published by the package itself.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct BinaryMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub module_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub package_name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub remote_path: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub host: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl VersionMetadata {
    /// Binary block usable for locating prebuilt artifacts. Packages
    /// occasionally publish junk in `binary`; without a module name there
    /// is nothing to template.
    pub fn prebuilt_binary(&self) -> Option<&BinaryMetadata> {
        self.binary
            .as_ref()
            .filter(|binary| !binary.module_name.is_empty())
    }
}

/// Some packages publish `binary` as a boolean or other non-object value.
/// Those carry nothing the mirror can use, so they map to `None` instead
/// of failing the whole document.
fn deserialize_binary<'de, D>(deserializer: D) -> std::result::Result<Option<BinaryMetadata>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

pub fn parse_document(bytes: &[u8], url: &str) -> Result<RegistryDocument> {
    serde_json::from_slice(bytes).map_err(|source| MirrorError::ParseJson {
        context: url.to_string(),
        source,
    })
}

/// Produces the document that gets written to the mirror: versions the
/// run did not collect are dropped, kept versions point their tarball at
/// the mirror, and binary blocks point at the mirror's base URL.
pub fn rewrite_for_mirror(
    doc: &RegistryDocument,
    name: &str,
    keep: &BTreeSet<String>,
    config: &MirrorConfig,
) -> RegistryDocument {
    let mut rewritten = doc.clone();
    rewritten.versions.retain(|version, _| keep.contains(version));

    for (version, meta) in rewritten.versions.iter_mut() {
        meta.dist.tarball = paths::tarball_url(&config.mirror_url, name, version);

        if let Some(binary) = meta.binary.as_mut()
            && !binary.module_name.is_empty()
        {
            binary.host = config.mirror_url.clone();
            binary.remote_path = paths::binary_mirror_remote_path(name);
        }
    }

    rewritten
}

pub fn serialize_document(doc: &RegistryDocument, pretty: bool) -> Result<Vec<u8>> {
    let result = if pretty {
        serde_json::to_vec_pretty(doc)
    } else {
        serde_json::to_vec(doc)
    };

    result.map_err(|err| MirrorError::SerializeJson {
        context: "mirrored metadata".to_string(),
        reason: err.to_string(),
    })
}
