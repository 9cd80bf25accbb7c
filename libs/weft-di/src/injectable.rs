//! Construction recipes for container-built types.

use crate::container::Resolver;
use crate::error::DiResult;

/// A type that knows how to assemble itself from a resolver.
///
/// This replaces constructor-argument discovery: the implementation states
/// explicitly which dependencies it pulls and in what way.
///
/// ```
/// use std::sync::Arc;
/// use weft_di::{ContainerBuilder, DiResult, Injectable, Resolver};
///
/// struct Repo;
/// struct Svc {
///     repo: Arc<Repo>,
/// }
///
/// impl Injectable for Svc {
///     fn inject(resolver: &Resolver<'_>) -> DiResult<Self> {
///         Ok(Self {
///             repo: resolver.resolve::<Repo>()?,
///         })
///     }
/// }
///
/// let mut builder = ContainerBuilder::new();
/// builder.register_instance(Repo);
/// builder.register_injectable::<Svc>();
/// let container = builder.build().unwrap();
/// assert!(container.resolve::<Svc>().is_ok());
/// ```
pub trait Injectable: Sized + Send + Sync + 'static {
    fn inject(resolver: &Resolver<'_>) -> DiResult<Self>;
}
