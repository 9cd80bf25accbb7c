//! Runtime error types.

use std::path::PathBuf;

use crate::contracts::ServiceKind;

#[derive(Debug, thiserror::Error)]
pub enum FabricError {
    /// A factory is already registered under this type name.
    #[error("service type '{0}' is already registered with the runtime")]
    DuplicateServiceType(String),

    /// No factory is registered under this type name.
    #[error("service type '{0}' is not registered with the runtime")]
    UnknownServiceType(String),

    /// The registered factory failed to produce an instance.
    #[error("activation failed for service type '{service_type_name}'")]
    Activation {
        service_type_name: String,
        #[source]
        source: anyhow::Error,
    },

    /// The manifest names a service the runtime cannot serve.
    #[error("manifest lists {kind} service '{name}' but no matching factory is registered")]
    ManifestMismatch { name: String, kind: ServiceKind },

    #[error("failed to read service manifest from '{}'", path.display())]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse service manifest")]
    ManifestParse {
        #[source]
        source: serde_yaml::Error,
    },
}
