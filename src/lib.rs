//! xtrpc: fast type declaration generation for tRPC routers.
//!
//! Type-checking a full tRPC application to emit its public `AppRouter`
//! declaration is slow, because the checker has to analyze every procedure
//! implementation. The declaration only depends on the declarative shape:
//! input/output contracts and router composition. This crate rewrites the
//! parsed sources to strip implementation bodies, context wiring, and
//! middleware logic, then hands the rewritten sources to `tsc` for
//! declaration-only emission. The result is equivalent to a full analysis
//! at a fraction of the cost.
//!
//! Pipeline: load trees → classify nodes → collect a deferred
//! [`transform::TransformationPlan`] → apply it → normalize the target
//! alias → emit via a [`backend::DeclarationBackend`].

pub mod ast;
pub mod backend;
pub mod config;
pub mod error;
pub mod predicates;
pub mod syntax;
pub mod transform;
pub mod xtrpc;

pub use config::Config;
pub use error::{Error, ErrorKind, Result};
pub use xtrpc::{generate, generate_with_backend};
