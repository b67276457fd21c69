//! Generic parameters of interfaces and methods.
//!
//! The attribute bits follow `GenericParamAttributes` (ECMA-335 §II.23.1.7): two bits of
//! variance and three bits of special constraints. Base-type and interface constraints are kept
//! as signatures next to the flags.

use bitflags::bitflags;

use crate::metadata::typesystem::TypeSig;

/// Bitmask for the variance bits of [`GenericParamAttributes`]
pub const VARIANCE_MASK: u32 = 0x0003;
/// Bitmask for the special constraint bits of [`GenericParamAttributes`]
pub const SPECIAL_CONSTRAINT_MASK: u32 = 0x001C;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Variance and special constraints of a generic parameter
    pub struct GenericParamAttributes: u32 {
        /// The generic parameter is covariant (`out T`)
        const COVARIANT = 0x0001;
        /// The generic parameter is contravariant (`in T`)
        const CONTRAVARIANT = 0x0002;
        /// The generic parameter has a reference type constraint (`class`)
        const REFERENCE_TYPE_CONSTRAINT = 0x0004;
        /// The generic parameter has a value type constraint (`struct`)
        const NOT_NULLABLE_VALUE_TYPE_CONSTRAINT = 0x0008;
        /// The generic parameter has a constructor constraint (`new()`)
        const DEFAULT_CONSTRUCTOR_CONSTRAINT = 0x0010;
    }
}

/// Variance of a generic parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum Variance {
    /// No variance annotation
    Invariant,
    /// `out T`
    Covariant,
    /// `in T`
    Contravariant,
}

/// A generic parameter of an interface, class or method.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GenericParam {
    /// Index of the generic parameter, numbered left-to-right, from zero
    pub number: u32,
    /// Name of the generic parameter
    pub name: String,
    /// Variance and special constraints
    pub flags: GenericParamAttributes,
    /// Base type and interface constraints; may mention other generic parameters
    pub constraints: Vec<TypeSig>,
}

impl GenericParam {
    /// Create an unconstrained, invariant generic parameter
    ///
    /// ## Arguments
    /// * `number` - Position in the owner's generic parameter list
    /// * `name`   - Display name
    #[must_use]
    pub fn new(number: u32, name: &str) -> Self {
        GenericParam {
            number,
            name: name.to_string(),
            flags: GenericParamAttributes::empty(),
            constraints: Vec::new(),
        }
    }

    /// Mark as covariant (`out`)
    #[must_use]
    pub fn covariant(mut self) -> Self {
        self.flags.remove(GenericParamAttributes::CONTRAVARIANT);
        self.flags.insert(GenericParamAttributes::COVARIANT);
        self
    }

    /// Mark as contravariant (`in`)
    #[must_use]
    pub fn contravariant(mut self) -> Self {
        self.flags.remove(GenericParamAttributes::COVARIANT);
        self.flags.insert(GenericParamAttributes::CONTRAVARIANT);
        self
    }

    /// Add the `class` constraint
    #[must_use]
    pub fn reference_type(mut self) -> Self {
        self.flags
            .insert(GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT);
        self
    }

    /// Add the `struct` constraint
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.flags
            .insert(GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT);
        self
    }

    /// Add the `new()` constraint
    #[must_use]
    pub fn default_constructor(mut self) -> Self {
        self.flags
            .insert(GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT);
        self
    }

    /// Add a base type or interface constraint
    #[must_use]
    pub fn constraint(mut self, constraint: TypeSig) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// The declared variance
    #[must_use]
    pub fn variance(&self) -> Variance {
        match self.flags.bits() & VARIANCE_MASK {
            0x0001 => Variance::Covariant,
            0x0002 => Variance::Contravariant,
            _ => Variance::Invariant,
        }
    }

    /// The special constraints (`class`, `struct`, `new()`) without the variance bits
    #[must_use]
    pub fn special_constraints(&self) -> GenericParamAttributes {
        GenericParamAttributes::from_bits_truncate(self.flags.bits() & SPECIAL_CONSTRAINT_MASK)
    }

    /// A copy with every constraint kept and the variance annotation dropped.
    ///
    /// Variance is only legal on interface (and delegate) parameters; a type implementing the
    /// interface declares the same parameter invariant.
    #[must_use]
    pub fn without_variance(&self) -> GenericParam {
        GenericParam {
            number: self.number,
            name: self.name.clone(),
            flags: self.special_constraints(),
            constraints: self.constraints.clone(),
        }
    }
}
