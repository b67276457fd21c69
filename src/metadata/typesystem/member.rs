//! Methods, accessors and parameters of registered types.
//!
//! Every member of an interface is a method: properties and indexers are represented by their
//! accessor methods (`get_Name` / `set_Name`, `get_Item` / `set_Item`), tagged with a
//! [`MemberKind`] so they can be told apart from ordinary methods.
//!
//! # Key Types
//! - [`MethodDef`]: a method definition owned by a type
//! - [`ParamDef`], [`ParamAttributes`], [`ParamMode`]: parameters and their passing modes
//! - [`MemberSignature`]: the identity of a member once its owner's type arguments are applied
//! - [`MemberRef`]: a method addressed through a specific (possibly closed generic) interface

use std::{fmt, sync::Arc};

use bitflags::bitflags;

use crate::metadata::{
    token::Token,
    typesystem::{GenericParam, TypeSig},
};

/// A reference to a `MethodDef`
pub type MethodRc = Arc<MethodDef>;

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    /// Parameter attributes, ECMA-335 §II.23.1.13
    pub struct ParamAttributes: u32 {
        /// Param is `In`
        const IN = 0x0001;
        /// Param is `out`
        const OUT = 0x0002;
        /// Param is optional
        const OPTIONAL = 0x0010;
        /// Param has default value
        const HAS_DEFAULT = 0x1000;
    }
}

/// How an argument is passed
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum ParamMode {
    /// By value
    Value,
    /// By reference, read and written by the callee (`ref`)
    Ref,
    /// By reference, only written by the callee (`out`)
    Out,
}

/// What kind of interface member a method stands for
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum MemberKind {
    /// An ordinary method
    Method,
    /// Getter of a property
    PropertyGetter,
    /// Setter of a property
    PropertySetter,
    /// Getter of an indexer
    IndexerGetter,
    /// Setter of an indexer
    IndexerSetter,
}

/// A compile-time constant, used for parameter default values
#[derive(Clone, Debug, PartialEq)]
pub enum Constant {
    /// `null`
    Null,
    /// A boolean
    Bool(bool),
    /// A 32-bit integer
    I4(i32),
    /// A 64-bit integer
    I8(i64),
    /// A double
    R8(f64),
    /// A string
    String(String),
}

/// A parameter of a method
#[derive(Clone, Debug, PartialEq)]
pub struct ParamDef {
    /// Position of the parameter (1-based, 0 would be the return value)
    pub sequence: u32,
    /// The parameter name
    pub name: String,
    /// bitmask of `ParamAttributes`
    pub flags: ParamAttributes,
    /// Is the parameter passed by reference
    pub by_ref: bool,
    /// The type of this parameter
    pub ty: TypeSig,
    /// `flags.HAS_DEFAULT` -> This is the default value of this parameter
    pub default: Option<Constant>,
}

impl ParamDef {
    /// The passing mode derived from `by_ref` and the `IN`/`OUT` flags
    #[must_use]
    pub fn mode(&self) -> ParamMode {
        if !self.by_ref {
            ParamMode::Value
        } else if self.flags.contains(ParamAttributes::OUT)
            && !self.flags.contains(ParamAttributes::IN)
        {
            ParamMode::Out
        } else {
            ParamMode::Ref
        }
    }

    /// Returns `true` if the caller may leave this parameter out
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.flags.contains(ParamAttributes::OPTIONAL) || self.mode() == ParamMode::Out
    }
}

/// A method defined on a type.
#[derive(Debug)]
pub struct MethodDef {
    /// Token
    pub token: Token,
    /// The method name (accessors use the `get_`/`set_` prefixes)
    pub name: String,
    /// Method, property accessor or indexer accessor
    pub kind: MemberKind,
    /// Token of the type that declares this method
    pub declaring: Token,
    /// Parameters in declaration order
    pub params: Vec<ParamDef>,
    /// Return type
    pub ret: TypeSig,
    /// Generic parameters of a generic method
    pub generic_params: Vec<GenericParam>,
}

impl MethodDef {
    /// Returns `true` for generic method definitions
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }

    /// Number of parameters a caller has to supply
    #[must_use]
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .rposition(|param| !param.is_optional())
            .map_or(0, |position| position + 1)
    }

    /// The signature of this method as seen through an instantiation of its declaring type.
    ///
    /// ## Arguments
    /// * `type_args` - Type arguments of the declaring interface (empty if not generic)
    #[must_use]
    pub fn signature(&self, type_args: &[TypeSig]) -> MemberSignature {
        MemberSignature {
            name: self.name.clone(),
            kind: self.kind,
            params: self
                .params
                .iter()
                .map(|param| (param.mode(), param.ty.substitute(type_args, &[])))
                .collect(),
            ret: self.ret.substitute(type_args, &[]),
            generic_arity: self.generic_params.len(),
        }
    }
}

/// The identity of a member after the owner's type arguments have been applied.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberSignature {
    /// Member name
    pub name: String,
    /// Member kind
    pub kind: MemberKind,
    /// Passing mode and type of every parameter
    pub params: Vec<(ParamMode, TypeSig)>,
    /// Return type
    pub ret: TypeSig,
    /// Number of generic method parameters
    pub generic_arity: usize,
}

impl fmt::Display for MemberSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ret, self.name)?;
        if self.generic_arity > 0 {
            write!(f, "`{}", self.generic_arity)?;
        }
        write!(f, "(")?;
        for (i, (mode, ty)) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match mode {
                ParamMode::Value => write!(f, "{ty}")?,
                ParamMode::Ref => write!(f, "ref {ty}")?,
                ParamMode::Out => write!(f, "out {ty}")?,
            }
        }
        write!(f, ")")
    }
}

/// A method addressed through an interface.
///
/// The interface is the one that declares the method, instantiated with the type arguments the
/// caller sees (for example `IRepository<Order>` rather than `IRepository<T>`).
#[derive(Clone, Debug)]
pub struct MemberRef {
    /// The declaring interface, closed over the caller's type arguments
    pub interface: TypeSig,
    /// The method definition
    pub method: MethodRc,
}

impl MemberRef {
    /// Create a reference to `method` through `interface`
    #[must_use]
    pub fn new(interface: TypeSig, method: MethodRc) -> Self {
        MemberRef { interface, method }
    }

    /// The member's signature through this interface instantiation
    #[must_use]
    pub fn signature(&self) -> MemberSignature {
        self.method.signature(self.interface.args())
    }
}

impl PartialEq for MemberRef {
    fn eq(&self, other: &Self) -> bool {
        self.method.token == other.method.token && self.interface == other.interface
    }
}

impl Eq for MemberRef {}

impl fmt::Display for MemberRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.interface, self.method.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(sequence: u32, flags: ParamAttributes, by_ref: bool, ty: TypeSig) -> ParamDef {
        ParamDef {
            sequence,
            name: format!("p{sequence}"),
            flags,
            by_ref,
            ty,
            default: None,
        }
    }

    #[test]
    fn test_param_modes() {
        assert_eq!(
            param(1, ParamAttributes::empty(), false, TypeSig::I4).mode(),
            ParamMode::Value
        );
        assert_eq!(
            param(1, ParamAttributes::empty(), true, TypeSig::I4).mode(),
            ParamMode::Ref
        );
        assert_eq!(
            param(1, ParamAttributes::OUT, true, TypeSig::I4).mode(),
            ParamMode::Out
        );
        assert_eq!(
            param(1, ParamAttributes::IN | ParamAttributes::OUT, true, TypeSig::I4).mode(),
            ParamMode::Ref
        );
    }

    #[test]
    fn test_signature_substitutes_owner_args() {
        let method = MethodDef {
            token: Token::from_parts(Token::METHOD_DEF, 1),
            name: "Method1".to_string(),
            kind: MemberKind::Method,
            declaring: Token::from_parts(Token::TYPE_DEF, 1),
            params: vec![
                param(1, ParamAttributes::empty(), false, TypeSig::TypeParam(0)),
                param(2, ParamAttributes::OUT, true, TypeSig::TypeParam(1)),
            ],
            ret: TypeSig::TypeParam(1),
            generic_params: Vec::new(),
        };

        let signature = method.signature(&[TypeSig::String, TypeSig::I8]);
        assert_eq!(
            signature.params,
            vec![
                (ParamMode::Value, TypeSig::String),
                (ParamMode::Out, TypeSig::I8)
            ]
        );
        assert_eq!(signature.ret, TypeSig::I8);
        assert_eq!(signature.to_string(), "Int64 Method1(String, out Int64)");
        assert_eq!(method.required_params(), 1);
    }
}
