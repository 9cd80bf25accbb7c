//! weft-di: the dependency-injection container used across the weft
//! workspace.
//!
//! A [`ContainerBuilder`] accumulates registrations (closures that produce a
//! value, shared instances, or trait objects) together with their sharing
//! [`Lifetime`], then [`ContainerBuilder::build`] freezes them into an
//! immutable [`Container`]. Resolution hands out `Arc`s; `Scoped`
//! registrations are cached per [`Scope`] and dropped with it, `Singleton`
//! registrations live in the root, `Transient` registrations are rebuilt on
//! every request.
//!
//! Two less common features carry the rest of the workspace:
//!
//! - **Build callbacks** ([`ContainerBuilder::on_built`]) run once against
//!   the freshly built container, in registration order; the first error
//!   aborts the build. Integration layers use them to wire the container
//!   into external registries after every registration is known.
//! - **Scope seeding** ([`Scope::provide`]) plants a ready-made instance
//!   into one scope so resolution chains can pick up per-activation values
//!   (request contexts and the like) without a global registration.

pub mod builder;
pub mod container;
pub mod error;
pub mod injectable;
pub mod registration;

pub use builder::{ContainerBuilder, RegistrationBuilder};
pub use container::{Container, Resolver, Scope};
pub use error::{DiError, DiResult};
pub use injectable::Injectable;
pub use registration::{InterceptorTag, Key, Lifetime, ServiceDescriptor};
