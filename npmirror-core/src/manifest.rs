use crate::{MirrorError, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// The slice of a `package.json` the mirror cares about: the production
/// dependency map that seeds resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    pub name: Option<String>,
    #[serde(default)]
    pub dependencies: BTreeMap<String, String>,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(MirrorError::ManifestMissing {
                path: path.to_path_buf(),
            });
        }

        let data = fs::read_to_string(path).map_err(|source| MirrorError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&data).map_err(|source| MirrorError::ParseJson {
            context: path.display().to_string(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dependency_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(
            &path,
            r#"{ "name": "app", "dependencies": { "lodash": "^4.0.0" }, "devDependencies": { "jest": "*" } }"#,
        )
        .unwrap();

        let manifest = Manifest::read(&path).unwrap();
        assert_eq!(manifest.name.as_deref(), Some("app"));
        assert_eq!(manifest.dependencies.len(), 1);
        assert_eq!(manifest.dependencies["lodash"], "^4.0.0");
    }

    #[test]
    fn missing_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = Manifest::read(&dir.path().join("package.json"));
        assert!(matches!(result, Err(MirrorError::ManifestMissing { .. })));
    }

    #[test]
    fn manifest_without_dependencies_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("package.json");
        fs::write(&path, r#"{ "name": "app" }"#).unwrap();

        let manifest = Manifest::read(&path).unwrap();
        assert!(manifest.dependencies.is_empty());
    }
}
