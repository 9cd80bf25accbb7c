//! The service manifest: the document that assigns type names to the
//! services a process hosts.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::contracts::ServiceKind;
use crate::error::FabricError;

/// Declared service types of one process.
///
/// ```yaml
/// services:
///   - name: CounterService
///     kind: stateful
///   - name: HeartbeatService
///     kind: stateless
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceManifest {
    #[serde(default)]
    pub services: Vec<ManifestEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub name: String,
    pub kind: ServiceKind,
}

impl ServiceManifest {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, FabricError> {
        serde_yaml::from_str(yaml).map_err(|source| FabricError::ManifestParse { source })
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, FabricError> {
        let text = std::fs::read_to_string(path).map_err(|source| FabricError::ManifestRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&text)
    }

    /// Entry for `name`, if the manifest lists it.
    pub fn entry(&self, name: &str) -> Option<&ManifestEntry> {
        self.services.iter().find(|entry| entry.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_manifest() {
        let manifest = ServiceManifest::from_yaml_str(
            r#"
services:
  - name: CounterService
    kind: stateful
  - name: HeartbeatService
    kind: stateless
"#,
        )
        .unwrap();

        assert_eq!(manifest.services.len(), 2);
        let counter = manifest.entry("CounterService").unwrap();
        assert_eq!(counter.kind, ServiceKind::Stateful);
        assert!(manifest.entry("Nope").is_none());
    }

    #[test]
    fn test_empty_manifest_is_valid() {
        let manifest = ServiceManifest::from_yaml_str("{}").unwrap();
        assert!(manifest.services.is_empty());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let err = ServiceManifest::from_yaml_str(
            r#"
services: []
cluster: west
"#,
        )
        .unwrap_err();
        assert!(matches!(err, FabricError::ManifestParse { .. }));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("manifest.yaml");
        std::fs::write(&path, "services:\n  - name: A\n    kind: stateless\n").unwrap();

        let manifest = ServiceManifest::from_yaml_file(&path).unwrap();
        assert_eq!(manifest.services[0].name, "A");

        let missing = ServiceManifest::from_yaml_file(&dir.path().join("nope.yaml"));
        assert!(matches!(missing, Err(FabricError::ManifestRead { .. })));
    }
}
