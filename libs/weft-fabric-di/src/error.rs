//! Registration-time validation errors.
//!
//! Everything that can go wrong later (hosting support not registered,
//! duplicate type names) is only discoverable once the container is built,
//! and surfaces from `ContainerBuilder::build` as
//! [`DiError::BuildCallback`](weft_di::DiError::BuildCallback).

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum FabricDiError {
    /// The service type name was empty or blank.
    #[error("service type name must not be empty")]
    EmptyServiceTypeName,

    /// The service type opted out of interception, so it cannot be
    /// registered through a path that wraps it.
    #[error("service type '{service_type}' is sealed and cannot be wrapped in an interception proxy")]
    SealedService { service_type: &'static str },
}
