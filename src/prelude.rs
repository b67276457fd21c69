//! # lazyproxy Prelude
//!
//! This module provides a convenient prelude for the most commonly used types and traits
//! from the lazyproxy library. Import this module to describe interfaces, implement real
//! objects and create lazy proxies for them.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all lazyproxy operations
pub use crate::Error;

/// A foreign error raised by a factory or a real object
pub use crate::RaisedError;

/// The result type used throughout lazyproxy
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Creates lazy proxy types and instances
pub use crate::LazyProxyBuilder;

/// Options for proxy type synthesis and instance creation
pub use crate::proxy::ProxyConfig;

/// Concrete proxy instances and their types
pub use crate::proxy::{ClosedProxyType, ClosedProxyTypeRc, LazyProxy};

/// Thread-safe, single-assignment deferred value
pub use crate::proxy::DeferredValue;

// ================================================================================================
// Type System
// ================================================================================================

/// Identity of registered types and methods
pub use crate::metadata::token::Token;

/// Type definitions and the registry holding them
pub use crate::metadata::typesystem::{TypeDef, TypeKind, TypeRc, TypeRegistry, TypeSig};

/// Fluent builders for interfaces and classes
pub use crate::metadata::typesystem::{ClassBuilder, InterfaceBuilder, MethodBuilder};

/// Generic parameters, variance and constraints
pub use crate::metadata::typesystem::{GenericParam, GenericParamAttributes, Variance};

/// Members and member addressing
pub use crate::metadata::typesystem::{
    Constant, MemberKind, MemberRef, MethodDef, MethodRc, ParamMode,
};

// ================================================================================================
// Runtime
// ================================================================================================

/// Values passed to and returned from members
pub use crate::runtime::Value;

/// The dynamic object protocol
pub use crate::runtime::{Invocation, Object, ObjectExt, ObjectRef};

/// Objects backed by per-member handlers
pub use crate::runtime::{ServiceBuilder, ServiceObject};
