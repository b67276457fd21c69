//! Runtime type model used to describe proxied interfaces and the objects behind them.
//!
//! This module provides a small reflective representation of a .NET-like type system:
//! interfaces, classes, abstract classes and value types, their generic parameters, and their
//! methods (properties and indexers are expressed through accessor methods). Definitions are
//! registered in a [`TypeRegistry`] and referenced everywhere else by [`Token`] or by
//! [`TypeSig`].
//!
//! # Key Components
//!
//! - [`TypeDef`]: A registered type definition
//! - [`TypeRegistry`]: Central, thread-safe registry of all definitions
//! - [`InterfaceBuilder`] / [`ClassBuilder`]: Fluent construction and validation of definitions
//! - [`TypeSig`]: A type as used in signatures, including generic instantiations
//! - [`GenericParam`]: Generic parameters with variance and constraints
//! - [`MethodDef`] / [`MemberRef`]: Members and member addressing through closed interfaces
//!
//! # Examples
//!
//! ```rust
//! use lazyproxy::metadata::typesystem::{InterfaceBuilder, TypeRegistry, TypeSig};
//!
//! let registry = TypeRegistry::new();
//! let greeter = InterfaceBuilder::new("IGreeter")
//!     .namespace("Demo")
//!     .method_signature("Greet", TypeSig::String, vec![("name", TypeSig::String)])
//!     .readonly_property("Language", TypeSig::String)
//!     .build(&registry)?;
//!
//! assert_eq!(greeter.fullname(), "Demo.IGreeter");
//! assert!(greeter.method("get_Language").is_some());
//! assert!(registry.get_by_fullname("Demo.IGreeter").is_some());
//! # Ok::<(), lazyproxy::Error>(())
//! ```

mod builder;
mod generics;
mod member;
mod registry;
mod signature;

use std::sync::Arc;

pub use builder::{ClassBuilder, InterfaceBuilder, MethodBuilder};
pub use generics::{
    GenericParam, GenericParamAttributes, Variance, SPECIAL_CONSTRAINT_MASK, VARIANCE_MASK,
};
pub use member::{
    Constant, MemberKind, MemberRef, MemberSignature, MethodDef, MethodRc, ParamAttributes,
    ParamDef, ParamMode,
};
pub use registry::{TypeRegistry, MAX_INHERITANCE_DEPTH};
pub use signature::TypeSig;

use crate::metadata::token::Token;

/// Reference to a `TypeDef`
pub type TypeRc = Arc<TypeDef>;

/// The kind of a type definition
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum TypeKind {
    /// An interface
    Interface,
    /// A concrete class
    Class,
    /// An abstract class
    AbstractClass,
    /// A value type (`struct`)
    ValueType,
}

/// A registered type definition.
///
/// Definitions are immutable once registered; synthesized proxy types are registered the same
/// way as the ones created through the builders.
#[derive(Debug)]
pub struct TypeDef {
    /// Token
    pub token: Token,
    /// `TypeNamespace` (can be empty)
    pub namespace: String,
    /// `TypeName`
    pub name: String,
    /// Interface, class, abstract class or value type
    pub kind: TypeKind,
    /// The base class, `None` for interfaces and for types deriving from `System.Object`
    pub base: Option<TypeSig>,
    /// Interfaces this type implements (or, for interfaces, extends); may mention `!n`
    pub interfaces: Vec<TypeSig>,
    /// Generic parameters of a generic definition
    pub generic_params: Vec<GenericParam>,
    /// Methods declared directly on this type
    pub methods: Vec<MethodRc>,
    /// Has a public parameterless constructor
    pub default_constructor: bool,
}

impl TypeDef {
    /// Returns the full name (Namespace.Name) of the type
    #[must_use]
    pub fn fullname(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Returns `true` for interfaces
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.kind == TypeKind::Interface
    }

    /// Returns `true` for generic definitions
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// The open signature of this definition, `Name<!0, !1, ..>` for generic ones
    #[must_use]
    pub fn sig(&self) -> TypeSig {
        TypeSig::generic(
            self.token,
            (0..self.generic_params.len())
                .map(|index| TypeSig::TypeParam(index as u32))
                .collect(),
        )
    }

    /// Find a method declared directly on this type by name
    #[must_use]
    pub fn method(&self, name: &str) -> Option<MethodRc> {
        self.methods
            .iter()
            .find(|method| method.name == name)
            .cloned()
    }
}
