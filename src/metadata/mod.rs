//! Type metadata for proxied interfaces and synthesized proxy types.
//!
//! # Key Components
//!
//! - [`token`] - Identities of registered types and methods
//! - [`typesystem`] - Type definitions, signatures, generics and the type registry

/// Identities of registered types and methods
pub mod token;
/// Implementation of the runtime type model
pub mod typesystem;
