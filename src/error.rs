use std::{fmt, sync::Arc};

use thiserror::Error;

use crate::metadata::{token::Token, typesystem::TypeKind};

macro_rules! type_error {
    // Single string version
    ($msg:expr) => {
        crate::Error::TypeError($msg.to_string())
    };

    // Format string with arguments version
    ($fmt:expr, $($arg:tt)*) => {
        crate::Error::TypeError(format!($fmt, $($arg)*))
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Proxy Construction Errors
/// - [`Error::UnsupportedTargetKind`] - A proxy was requested for something that is not an interface
/// - [`Error::GenericArity`] - Wrong number of type arguments for a generic interface or method
/// - [`Error::ConstraintViolation`] - A type argument does not satisfy a generic constraint
///
/// ## Type System Errors
/// - [`Error::TypeNotFound`] - Requested type not found in the registry
/// - [`Error::TypeError`] - General type system operation error
/// - [`Error::RecursionLimit`] - Interface inheritance is deeper than allowed (or cyclic)
///
/// ## Invocation Errors
/// - [`Error::MemberNotFound`] - The member is not part of the invoked object's surface
/// - [`Error::MemberNotImplemented`] - The object knows the member but has no implementation
/// - [`Error::ArgumentCount`] - Arguments do not match the member's parameter list
/// - [`Error::InvalidCast`] - A factory produced an object that does not implement the interface
/// - [`Error::Raised`] - An error raised by a value factory or a real object, passed through untouched
///
/// `Error` is `Clone`: a deferred value whose factory failed keeps the error and hands out
/// clones of it on every subsequent read.
///
/// # Examples
///
/// ```rust
/// use lazyproxy::{Error, metadata::typesystem::{ClassBuilder, TypeRegistry}, LazyProxyBuilder};
/// use std::sync::Arc;
///
/// let registry = Arc::new(TypeRegistry::new());
/// let class = ClassBuilder::new("Service").build(&registry)?;
/// let builder = LazyProxyBuilder::new(registry);
///
/// match builder.get_proxy_type(&class.sig()) {
///     Err(Error::UnsupportedTargetKind { name, kind }) => {
///         println!("{name} is a {kind}, not an interface");
///     }
///     other => panic!("unexpected: {other:?}"),
/// }
/// # Ok::<(), lazyproxy::Error>(())
/// ```
#[derive(Error, Debug, Clone)]
pub enum Error {
    /// A lazy proxy was requested for a type that is not an interface.
    ///
    /// Only interfaces can be proxied. Classes, abstract classes and value types fail fast,
    /// before anything is synthesized or cached.
    #[error("Lazy proxies are supported only for interfaces - {name} is a {kind}")]
    UnsupportedTargetKind {
        /// Full name of the offending type
        name: String,
        /// What the type actually is
        kind: TypeKind,
    },

    /// Failed to find type in `TypeRegistry`.
    ///
    /// The associated [`Token`] identifies which type was not found.
    #[error("Failed to find type in TypeRegistry - {0}")]
    TypeNotFound(Token),

    /// General error during `TypeRegistry` usage.
    ///
    /// Covers invalid definitions handed to the builders and signatures that cannot be
    /// resolved to a definition.
    #[error("{0}")]
    TypeError(String),

    /// Recursion limit reached.
    ///
    /// Interface inheritance deeper than the configured maximum, which in practice means the
    /// inheritance graph is cyclic.
    #[error("Reach the maximum recursion level allowed - {0}")]
    RecursionLimit(usize),

    /// A generic definition was bound with the wrong number of type arguments.
    #[error("{name} expects {expected} generic arguments, got {actual}")]
    GenericArity {
        /// The generic interface or method
        name: String,
        /// Declared generic parameter count
        expected: usize,
        /// Supplied type argument count
        actual: usize,
    },

    /// A type argument does not satisfy the constraints of its generic parameter.
    #[error("Type argument {argument} violates the constraints of {parameter} - {reason}")]
    ConstraintViolation {
        /// The generic parameter name
        parameter: String,
        /// The offending type argument
        argument: String,
        /// Which constraint failed
        reason: String,
    },

    /// The invoked member is not part of the object's member surface.
    #[error("{member} is not a member of {owner}")]
    MemberNotFound {
        /// The object (or interface) the lookup was made on
        owner: String,
        /// The requested member
        member: String,
    },

    /// The object implements the member's interface but provides no behaviour for it.
    #[error("{owner} has no implementation for {member}")]
    MemberNotImplemented {
        /// The object the call was dispatched to
        owner: String,
        /// The requested member
        member: String,
    },

    /// The argument list does not fit the member's parameters.
    #[error("{member} expects {expected} arguments, got {actual}")]
    ArgumentCount {
        /// The invoked member
        member: String,
        /// Declared parameter count
        expected: usize,
        /// Supplied argument count
        actual: usize,
    },

    /// A value factory produced an object that does not implement the proxied interface.
    #[error("Unable to cast {actual} to {expected}")]
    InvalidCast {
        /// The proxied interface
        expected: String,
        /// The type name of the produced object
        actual: String,
    },

    /// The value factory of a deferred value is gone without a value having been stored.
    ///
    /// Only observable when a factory panicked during a previous read.
    #[error("The value factory is no longer available")]
    FactoryUnavailable,

    /// Failed to lock target.
    #[error("Failed to lock target")]
    LockError,

    /// An error raised by a value factory or by a member of a real object.
    ///
    /// Proxies never wrap, log or retry these; the very same error instance reaches the caller.
    #[error("{0}")]
    Raised(RaisedError),
}

impl Error {
    /// Raise an arbitrary error from inside a factory or member implementation.
    ///
    /// ## Arguments
    /// * `error` - The error to raise
    pub fn raise<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Raised(RaisedError::new(error))
    }

    /// Returns the raised error if this is an [`Error::Raised`].
    #[must_use]
    pub fn raised(&self) -> Option<&RaisedError> {
        match self {
            Error::Raised(raised) => Some(raised),
            _ => None,
        }
    }
}

/// A shared handle to a foreign error raised by user code.
///
/// Cloning the handle keeps the identity of the underlying error, which lets callers check
/// that a proxy passed an error through unmodified.
#[derive(Clone)]
pub struct RaisedError(Arc<dyn std::error::Error + Send + Sync>);

impl RaisedError {
    /// Wrap a foreign error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        RaisedError(Arc::new(error))
    }

    /// Attempt to view the raised error as a concrete type.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: std::error::Error + 'static,
    {
        self.0.downcast_ref::<E>()
    }

    /// Returns `true` if both handles point to the same raised error.
    #[must_use]
    pub fn ptr_eq(&self, other: &RaisedError) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn inner(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.0
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Debug for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RaisedError").field(&self.0).finish()
    }
}
