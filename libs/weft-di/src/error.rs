//! Container error types.

pub type DiResult<T> = Result<T, DiError>;

/// Errors produced while resolving from or building a container.
#[derive(Debug, thiserror::Error)]
pub enum DiError {
    /// No registration exists for the requested service.
    #[error("service '{service}' is not registered")]
    NotRegistered { service: &'static str },

    /// The resolution chain revisited a service it is already constructing.
    #[error("circular dependency: {}", path.join(" -> "))]
    CircularDependency { path: Vec<&'static str> },

    /// A provider produced a value that does not match the registration key.
    #[error("registration for '{service}' produced a value of an unexpected type")]
    TypeMismatch { service: &'static str },

    /// A build callback returned an error; the container build is aborted.
    #[error("build callback failed")]
    BuildCallback {
        #[source]
        source: anyhow::Error,
    },
}
