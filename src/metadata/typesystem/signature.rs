//! Type signatures used in member definitions and generic instantiations.
//!
//! A [`TypeSig`] describes a type the way it is *used*: a primitive, a reference to a registered
//! definition (optionally instantiated with type arguments), or a placeholder for a generic
//! parameter of the enclosing type (`!n`) or method (`!!n`).
//!
//! Signatures are plain values: they hash and compare structurally, which makes them suitable
//! as cache keys for closed generic instantiations.

use std::fmt;

use crate::metadata::token::Token;

/// A type as it appears in a signature.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum TypeSig {
    /// No value (only valid as a return type)
    Void,
    /// `System.Boolean`
    Boolean,
    /// `System.Char`
    Char,
    /// `System.Int32`
    I4,
    /// `System.Int64`
    I8,
    /// `System.Double`
    R8,
    /// `System.String`
    String,
    /// `System.Object`
    Object,
    /// A registered definition, instantiated with `args` when generic
    Type {
        /// The definition
        token: Token,
        /// Type arguments (empty for non-generic definitions)
        args: Vec<TypeSig>,
    },
    /// Generic parameter of the enclosing type, by position
    TypeParam(u32),
    /// Generic parameter of the enclosing method, by position
    MethodParam(u32),
}

impl TypeSig {
    /// Signature of a non-generic definition
    #[must_use]
    pub fn named(token: Token) -> Self {
        TypeSig::Type {
            token,
            args: Vec::new(),
        }
    }

    /// Signature of a generic definition instantiated with `args`
    #[must_use]
    pub fn generic(token: Token, args: Vec<TypeSig>) -> Self {
        TypeSig::Type { token, args }
    }

    /// The referenced definition, if this is not a primitive or a generic parameter
    #[must_use]
    pub fn token(&self) -> Option<Token> {
        match self {
            TypeSig::Type { token, .. } => Some(*token),
            _ => None,
        }
    }

    /// The type arguments of an instantiation
    #[must_use]
    pub fn args(&self) -> &[TypeSig] {
        match self {
            TypeSig::Type { args, .. } => args,
            _ => &[],
        }
    }

    /// Returns `true` if the signature still mentions a generic parameter
    #[must_use]
    pub fn is_open(&self) -> bool {
        match self {
            TypeSig::TypeParam(_) | TypeSig::MethodParam(_) => true,
            TypeSig::Type { args, .. } => args.iter().any(TypeSig::is_open),
            _ => false,
        }
    }

    /// Returns `true` for the built-in value types
    ///
    /// Registered definitions need the registry to answer this, see
    /// [`crate::metadata::typesystem::TypeRegistry::is_value_type`].
    #[must_use]
    pub fn is_primitive_value_type(&self) -> bool {
        matches!(
            self,
            TypeSig::Boolean | TypeSig::Char | TypeSig::I4 | TypeSig::I8 | TypeSig::R8
        )
    }

    /// Replace generic parameters with the given arguments.
    ///
    /// Parameters without a matching argument are left in place, so substituting the type
    /// arguments of an interface keeps the method parameters of a generic method open.
    ///
    /// ## Arguments
    /// * `type_args`   - Arguments for `!n` placeholders
    /// * `method_args` - Arguments for `!!n` placeholders
    #[must_use]
    pub fn substitute(&self, type_args: &[TypeSig], method_args: &[TypeSig]) -> TypeSig {
        match self {
            TypeSig::TypeParam(index) => type_args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::MethodParam(index) => method_args
                .get(*index as usize)
                .cloned()
                .unwrap_or_else(|| self.clone()),
            TypeSig::Type { token, args } if !args.is_empty() => TypeSig::Type {
                token: *token,
                args: args
                    .iter()
                    .map(|arg| arg.substitute(type_args, method_args))
                    .collect(),
            },
            _ => self.clone(),
        }
    }
}

impl fmt::Display for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeSig::Void => write!(f, "Void"),
            TypeSig::Boolean => write!(f, "Boolean"),
            TypeSig::Char => write!(f, "Char"),
            TypeSig::I4 => write!(f, "Int32"),
            TypeSig::I8 => write!(f, "Int64"),
            TypeSig::R8 => write!(f, "Double"),
            TypeSig::String => write!(f, "String"),
            TypeSig::Object => write!(f, "Object"),
            TypeSig::TypeParam(index) => write!(f, "!{index}"),
            TypeSig::MethodParam(index) => write!(f, "!!{index}"),
            TypeSig::Type { token, args } => {
                write!(f, "{token}")?;
                if !args.is_empty() {
                    write!(f, "<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ",")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, ">")?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Debug for TypeSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeSig({self})")
    }
}
