//! Central type registry.
//!
//! This module provides the [`TypeRegistry`], a thread-safe registry of every type and method
//! definition known to a proxy builder. Besides storage it answers the structural questions the
//! proxy machinery needs: which interfaces a type reaches through inheritance, whether one type
//! is assignable to another, and whether a set of type arguments satisfies generic constraints.
//!
//! # Registry Architecture
//!
//! - **Token-based lookup**: Primary index using tokens (`SkipMap`)
//! - **Name-based lookup**: Secondary index on full names (`DashMap`)
//! - **Token generation**: One atomic counter per table
//!
//! # Well-known Types
//!
//! Every registry starts with `System.IDisposable` (one method, `void Dispose()`), the disposal
//! capability proxies treat specially.
//!
//! # Thread Safety
//!
//! Lookups and insertions never block each other; builders and proxy synthesis may register
//! definitions concurrently.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::{mapref::entry::Entry, DashMap};

use crate::{
    metadata::{
        token::Token,
        typesystem::{
            GenericParam, GenericParamAttributes, MemberKind, MemberRef, MethodDef, MethodRc,
            TypeDef, TypeKind, TypeRc, TypeSig, Variance,
        },
    },
    Error::{self, TypeNotFound},
    Result,
};

/// Inheritance depth used by lookups that take no explicit limit
pub const MAX_INHERITANCE_DEPTH: usize = 64;

/// Central registry for all type and method definitions.
pub struct TypeRegistry {
    /// Main storage for all types - maps tokens to type instances
    types: SkipMap<Token, TypeRc>,
    /// All methods of the registered types
    methods: SkipMap<Token, MethodRc>,
    /// Next row for defined types
    next_type_row: AtomicU32,
    /// Next row for defined methods
    next_method_row: AtomicU32,
    /// Next row for synthesized types
    next_artificial_row: AtomicU32,
    /// Index of types by their full name
    types_by_fullname: DashMap<String, Token>,
    /// `System.IDisposable`
    disposable: TypeRc,
    /// `System.IDisposable.Dispose`
    dispose: MethodRc,
}

impl TypeRegistry {
    /// Create a new registry, holding only `System.IDisposable`.
    #[must_use]
    pub fn new() -> Self {
        let disposable_token = Token::from_parts(Token::TYPE_DEF, 1);
        let dispose = Arc::new(MethodDef {
            token: Token::from_parts(Token::METHOD_DEF, 1),
            name: "Dispose".to_string(),
            kind: MemberKind::Method,
            declaring: disposable_token,
            params: Vec::new(),
            ret: TypeSig::Void,
            generic_params: Vec::new(),
        });
        let disposable = Arc::new(TypeDef {
            token: disposable_token,
            namespace: "System".to_string(),
            name: "IDisposable".to_string(),
            kind: TypeKind::Interface,
            base: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            methods: vec![dispose.clone()],
            default_constructor: false,
        });

        let registry = TypeRegistry {
            types: SkipMap::new(),
            methods: SkipMap::new(),
            next_type_row: AtomicU32::new(2),
            next_method_row: AtomicU32::new(2),
            next_artificial_row: AtomicU32::new(1),
            types_by_fullname: DashMap::new(),
            disposable: disposable.clone(),
            dispose: dispose.clone(),
        };

        registry
            .types_by_fullname
            .insert(disposable.fullname(), disposable_token);
        registry.methods.insert(dispose.token, dispose);
        registry.types.insert(disposable_token, disposable);
        registry
    }

    /// Allocate the next free token of a table.
    ///
    /// ## Arguments
    /// * `table` - [`Token::TYPE_DEF`], [`Token::METHOD_DEF`] or [`Token::ARTIFICIAL`]
    pub fn next_token(&self, table: u8) -> Token {
        let counter = match table {
            Token::METHOD_DEF => &self.next_method_row,
            Token::ARTIFICIAL => &self.next_artificial_row,
            _ => &self.next_type_row,
        };
        Token::from_parts(table, counter.fetch_add(1, Ordering::Relaxed))
    }

    /// Register a new definition together with its methods.
    ///
    /// ## Arguments
    /// * `def` - The definition to register
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] if the token or the full name is already taken.
    pub fn insert(&self, def: TypeDef) -> Result<TypeRc> {
        if self.types.contains_key(&def.token) {
            return Err(type_error!("Token {} is already registered", def.token));
        }

        let def = Arc::new(def);
        match self.types_by_fullname.entry(def.fullname()) {
            Entry::Occupied(_) => {
                return Err(type_error!("Type {} is already registered", def.fullname()));
            }
            Entry::Vacant(entry) => {
                entry.insert(def.token);
            }
        }

        for method in &def.methods {
            self.methods.insert(method.token, method.clone());
        }
        self.types.insert(def.token, def.clone());
        Ok(def)
    }

    /// Get a type by its token
    #[must_use]
    pub fn get(&self, token: &Token) -> Option<TypeRc> {
        self.types.get(token).map(|entry| entry.value().clone())
    }

    /// Get a method by its token
    #[must_use]
    pub fn get_method(&self, token: &Token) -> Option<MethodRc> {
        self.methods.get(token).map(|entry| entry.value().clone())
    }

    /// Get a type by its full name (Namespace.Name)
    #[must_use]
    pub fn get_by_fullname(&self, fullname: &str) -> Option<TypeRc> {
        self.types_by_fullname
            .get(fullname)
            .and_then(|token| self.get(token.value()))
    }

    /// Resolve the definition a signature refers to.
    ///
    /// # Errors
    /// Returns [`crate::Error::TypeError`] for primitives and generic parameters, and
    /// [`crate::Error::TypeNotFound`] for unknown tokens.
    pub fn resolve(&self, sig: &TypeSig) -> Result<TypeRc> {
        match sig.token() {
            Some(token) => self.get(&token).ok_or(TypeNotFound(token)),
            None => Err(type_error!("{} does not refer to a type definition", sig)),
        }
    }

    /// Returns the number of registered types
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type has been registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// The signature of `System.IDisposable`
    #[must_use]
    pub fn disposable(&self) -> TypeSig {
        self.disposable.sig()
    }

    /// `System.IDisposable.Dispose`
    #[must_use]
    pub fn dispose_method(&self) -> MethodRc {
        self.dispose.clone()
    }

    /// Returns `true` if `method` is `System.IDisposable.Dispose`
    #[must_use]
    pub fn is_dispose_method(&self, method: &MethodDef) -> bool {
        method.token == self.dispose.token
    }

    /// The interface and every interface it extends, transitively.
    ///
    /// Parents are instantiated with the arguments of their child, so the closure of
    /// `IStore<Order>` contains `ISource<Order>` rather than `ISource<!0>`. The result starts
    /// with `interface` itself, lists each interface once (diamonds are merged) and is ordered
    /// depth-first by declaration, which makes it deterministic.
    ///
    /// ## Arguments
    /// * `interface` - The interface to start from
    /// * `max_depth` - Maximum inheritance depth
    ///
    /// # Errors
    /// Returns [`crate::Error::RecursionLimit`] if the inheritance chain is deeper than
    /// `max_depth` or cyclic, and resolution errors for unknown types.
    pub fn interface_closure(&self, interface: &TypeSig, max_depth: usize) -> Result<Vec<TypeSig>> {
        let mut closure = Vec::new();
        let mut seen = HashSet::new();
        let mut path = Vec::new();
        self.walk_interfaces(interface, 0, max_depth, &mut path, &mut seen, &mut closure)?;
        Ok(closure)
    }

    fn walk_interfaces(
        &self,
        interface: &TypeSig,
        depth: usize,
        max_depth: usize,
        path: &mut Vec<TypeSig>,
        seen: &mut HashSet<TypeSig>,
        closure: &mut Vec<TypeSig>,
    ) -> Result<()> {
        if depth > max_depth || path.contains(interface) {
            return Err(Error::RecursionLimit(max_depth));
        }
        if !seen.insert(interface.clone()) {
            return Ok(());
        }

        closure.push(interface.clone());

        let def = self.resolve(interface)?;
        path.push(interface.clone());
        for parent in &def.interfaces {
            let parent = parent.substitute(interface.args(), &[]);
            self.walk_interfaces(&parent, depth + 1, max_depth, path, seen, closure)?;
        }
        path.pop();

        Ok(())
    }

    /// Returns `true` if a value of type `from` can be used where `to` is expected.
    ///
    /// Covers identity, `System.Object`, base class chains, implemented or inherited
    /// interfaces, and variant conversions between instantiations of a generic interface.
    #[must_use]
    pub fn is_assignable(&self, from: &TypeSig, to: &TypeSig) -> bool {
        if from == to || self.is_variant_assignable(from, to) {
            return true;
        }
        if *to == TypeSig::Object {
            return *from != TypeSig::Void;
        }
        if from.token().is_none() {
            return false;
        }

        let mut current = Some(from.clone());
        let mut depth = 0;
        while let Some(sig) = current {
            if depth > MAX_INHERITANCE_DEPTH {
                return false;
            }
            depth += 1;

            if sig == *to {
                return true;
            }

            let Ok(def) = self.resolve(&sig) else {
                return false;
            };

            let roots: Vec<TypeSig> = if def.is_interface() {
                vec![sig.clone()]
            } else {
                def.interfaces
                    .iter()
                    .map(|interface| interface.substitute(sig.args(), &[]))
                    .collect()
            };
            for root in roots {
                if let Ok(closure) =
                    self.interface_closure(&root, MAX_INHERITANCE_DEPTH)
                {
                    if self.find_compatible_interface(&closure, to).is_some() {
                        return true;
                    }
                }
            }

            current = def.base.as_ref().map(|base| base.substitute(sig.args(), &[]));
        }

        false
    }

    /// Returns `true` if `from` converts to `to` through the variance of their shared generic
    /// interface definition.
    ///
    /// Every type argument must either be identical, or be a reference type assignable in the
    /// direction its parameter allows: `out` parameters from the source argument to the target
    /// argument, `in` parameters the other way round. Invariant parameters require identity.
    #[must_use]
    pub fn is_variant_assignable(&self, from: &TypeSig, to: &TypeSig) -> bool {
        let (Some(from_token), Some(to_token)) = (from.token(), to.token()) else {
            return false;
        };
        if from_token != to_token || from.args().is_empty() || from.args().len() != to.args().len()
        {
            return false;
        }

        let Ok(def) = self.resolve(from) else {
            return false;
        };
        if !def.is_interface() || def.generic_params.len() != from.args().len() {
            return false;
        }

        def.generic_params
            .iter()
            .zip(from.args().iter().zip(to.args()))
            .all(|(param, (from_arg, to_arg))| {
                if from_arg == to_arg {
                    return true;
                }
                if !self.is_reference_type(from_arg) || !self.is_reference_type(to_arg) {
                    return false;
                }
                match param.variance() {
                    Variance::Covariant => self.is_assignable(from_arg, to_arg),
                    Variance::Contravariant => self.is_assignable(to_arg, from_arg),
                    Variance::Invariant => false,
                }
            })
    }

    /// The interface of `interfaces` through which a member addressed via `target` is reached.
    ///
    /// An exact match wins; otherwise the first interface that converts to `target` through
    /// generic variance.
    #[must_use]
    pub fn find_compatible_interface<'a>(
        &self,
        interfaces: &'a [TypeSig],
        target: &TypeSig,
    ) -> Option<&'a TypeSig> {
        interfaces
            .iter()
            .find(|interface| *interface == target)
            .or_else(|| {
                interfaces
                    .iter()
                    .find(|interface| self.is_variant_assignable(interface, target))
            })
    }

    /// Returns `true` if an object implementing `interfaces` can be used as `target`
    #[must_use]
    pub fn implements_interface(&self, interfaces: &[TypeSig], target: &TypeSig) -> bool {
        *target == TypeSig::Object || self.find_compatible_interface(interfaces, target).is_some()
    }

    /// Returns `true` for value types
    #[must_use]
    pub fn is_value_type(&self, sig: &TypeSig) -> bool {
        sig.is_primitive_value_type()
            || self
                .resolve(sig)
                .is_ok_and(|def| def.kind == TypeKind::ValueType)
    }

    /// Returns `true` for reference types
    #[must_use]
    pub fn is_reference_type(&self, sig: &TypeSig) -> bool {
        match sig {
            TypeSig::String | TypeSig::Object => true,
            TypeSig::Type { .. } => self
                .resolve(sig)
                .is_ok_and(|def| def.kind != TypeKind::ValueType),
            _ => false,
        }
    }

    /// Returns `true` if the type can be created through a public parameterless constructor
    #[must_use]
    pub fn has_default_constructor(&self, sig: &TypeSig) -> bool {
        match sig {
            TypeSig::Object => true,
            TypeSig::Type { .. } => self.resolve(sig).is_ok_and(|def| match def.kind {
                TypeKind::ValueType => true,
                TypeKind::Class => def.default_constructor,
                TypeKind::Interface | TypeKind::AbstractClass => false,
            }),
            other => other.is_primitive_value_type(),
        }
    }

    /// Check type arguments against the generic parameters of a type.
    ///
    /// Arguments that still mention generic parameters are not checked.
    ///
    /// ## Arguments
    /// * `owner` - Name of the generic definition, used in errors
    /// * `params` - The generic parameters
    /// * `args` - The type arguments
    ///
    /// # Errors
    /// Returns [`crate::Error::GenericArity`] or [`crate::Error::ConstraintViolation`].
    pub fn check_constraints(
        &self,
        owner: &str,
        params: &[GenericParam],
        args: &[TypeSig],
    ) -> Result<()> {
        self.check_generic_args(owner, params, args, |constraint| {
            constraint.substitute(args, &[])
        })
    }

    /// Check type arguments against the generic parameters of a method.
    ///
    /// ## Arguments
    /// * `owner` - Name of the generic method, used in errors
    /// * `params` - The method's generic parameters
    /// * `type_args` - Type arguments of the declaring interface
    /// * `method_args` - The method type arguments
    ///
    /// # Errors
    /// Returns [`crate::Error::GenericArity`] or [`crate::Error::ConstraintViolation`].
    pub fn check_method_constraints(
        &self,
        owner: &str,
        params: &[GenericParam],
        type_args: &[TypeSig],
        method_args: &[TypeSig],
    ) -> Result<()> {
        self.check_generic_args(owner, params, method_args, |constraint| {
            constraint.substitute(type_args, method_args)
        })
    }

    fn check_generic_args<F>(
        &self,
        owner: &str,
        params: &[GenericParam],
        args: &[TypeSig],
        close: F,
    ) -> Result<()>
    where
        F: Fn(&TypeSig) -> TypeSig,
    {
        if params.len() != args.len() {
            return Err(Error::GenericArity {
                name: owner.to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }

        for (param, arg) in params.iter().zip(args) {
            if arg.is_open() {
                continue;
            }

            let violation = |reason: String| Error::ConstraintViolation {
                parameter: format!("{}.{}", owner, param.name),
                argument: self.display(arg),
                reason,
            };

            let special = param.special_constraints();
            if special.contains(GenericParamAttributes::REFERENCE_TYPE_CONSTRAINT)
                && !self.is_reference_type(arg)
            {
                return Err(violation("must be a reference type".to_string()));
            }
            if special.contains(GenericParamAttributes::NOT_NULLABLE_VALUE_TYPE_CONSTRAINT)
                && !self.is_value_type(arg)
            {
                return Err(violation("must be a value type".to_string()));
            }
            if special.contains(GenericParamAttributes::DEFAULT_CONSTRUCTOR_CONSTRAINT)
                && !self.has_default_constructor(arg)
            {
                return Err(violation(
                    "must have a public parameterless constructor".to_string(),
                ));
            }

            for constraint in &param.constraints {
                let constraint = close(constraint);
                if !constraint.is_open() && !self.is_assignable(arg, &constraint) {
                    return Err(violation(format!(
                        "must be assignable to {}",
                        self.display(&constraint)
                    )));
                }
            }
        }

        Ok(())
    }

    /// Find the first method called `name` on an interface or the interfaces it extends.
    ///
    /// # Errors
    /// Returns [`crate::Error::MemberNotFound`] if no interface in the closure declares it.
    pub fn find_method(&self, interface: &TypeSig, name: &str) -> Result<MemberRef> {
        self.find_method_by(interface, |method| method.name == name)
            .map_err(|error| match error {
                Error::MemberNotFound { owner, .. } => Error::MemberNotFound {
                    owner,
                    member: name.to_string(),
                },
                other => other,
            })
    }

    /// Find the first method matching `predicate` on an interface or the interfaces it
    /// extends, addressed through the declaring interface.
    ///
    /// # Errors
    /// Returns [`crate::Error::MemberNotFound`] if nothing matches.
    pub fn find_method_by<F>(&self, interface: &TypeSig, predicate: F) -> Result<MemberRef>
    where
        F: Fn(&MethodDef) -> bool,
    {
        for declaring in
            self.interface_closure(interface, MAX_INHERITANCE_DEPTH)?
        {
            let def = self.resolve(&declaring)?;
            if let Some(method) = def.methods.iter().find(|method| predicate(method)) {
                return Ok(MemberRef::new(declaring, method.clone()));
            }
        }

        Err(Error::MemberNotFound {
            owner: self.display(interface),
            member: "<matching method>".to_string(),
        })
    }

    /// Human readable name of a signature, e.g. `Shop.IStore<Shop.Order>`
    #[must_use]
    pub fn display(&self, sig: &TypeSig) -> String {
        match sig {
            TypeSig::Type { token, args } => {
                let name = self
                    .get(token)
                    .map_or_else(|| token.to_string(), |def| def.fullname());
                if args.is_empty() {
                    name
                } else {
                    let args: Vec<String> = args.iter().map(|arg| self.display(arg)).collect();
                    format!("{}<{}>", name, args.join(", "))
                }
            }
            other => other.to_string(),
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
