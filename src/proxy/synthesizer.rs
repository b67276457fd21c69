//! Proxy type synthesis.
//!
//! [`synthesize`] turns an [`InterfaceShape`] into a [`ProxyType`]: a class registered in the
//! type registry that implements the interface and everything it extends, plus a forwarding
//! slot per member. Generic interfaces are synthesized once, in their open form, and bound to
//! concrete type arguments with [`ProxyType::bind`], which produces a [`ClosedProxyType`].
//!
//! # Synthesized Types
//!
//! - Named `{prefix}_{generation}_{InterfaceName}`, the generation being unique per process, so
//!   synthesizing the same shape twice never collides in the registry
//! - Generic parameters copied from the interface with all constraints kept and the variance
//!   annotations removed
//! - One forwarder method per member, named after the declaring interface
//!   (`Ns.IParent.Method`), with the member's parameters, passing modes and generic method
//!   parameters
//! - For interfaces extending `System.IDisposable`, `Dispose` is not forwarded but releases the
//!   real object only if it has been produced

use std::{
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use crate::{
    metadata::{
        token::Token,
        typesystem::{
            GenericParam, MemberRef, MemberSignature, MethodDef, MethodRc, TypeDef, TypeKind,
            TypeRc, TypeRegistry, TypeSig,
        },
    },
    proxy::{InterfaceShape, ProxyConfig},
    Error, Result,
};

static GENERATION: AtomicU64 = AtomicU64::new(1);

/// Reference to a `ProxyType`
pub type ProxyTypeRc = Arc<ProxyType>;
/// Reference to a `ClosedProxyType`
pub type ClosedProxyTypeRc = Arc<ClosedProxyType>;

/// What a proxy slot does when invoked
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
pub enum ForwardKind {
    /// Produce the real object if needed and invoke the member on it
    Forward,
    /// Invoke the member on the real object only if it has already been produced
    ReleaseIfProduced,
}

/// A member of a synthesized proxy type.
#[derive(Clone, Debug)]
pub struct ProxySlot {
    /// The declaring interface, in terms of the proxy's generic parameters
    pub declaring: TypeSig,
    /// The interface method
    pub method: MethodRc,
    /// The forwarder method defined on the proxy type
    pub forwarder: MethodRc,
    /// Signature of the member, in terms of the proxy's generic parameters
    pub signature: MemberSignature,
    /// How the slot forwards
    pub kind: ForwardKind,
}

/// A synthesized proxy type, open if its interface is generic.
pub struct ProxyType {
    definition: TypeRc,
    interface: TypeRc,
    generic_params: Vec<GenericParam>,
    interfaces: Vec<TypeSig>,
    slots: Vec<ProxySlot>,
    disposable: bool,
    generation: u64,
}

/// Synthesize a proxy type for an interface shape and register its definition.
///
/// Every call produces a new, uniquely named type; callers that want one type per interface
/// go through [`crate::proxy::ProxyTypeCache`].
///
/// ## Arguments
/// * `registry` - Receives the synthesized class definition
/// * `shape` - The interface surface to implement
/// * `config` - Naming of the synthesized type
///
/// # Errors
/// Returns registration errors from the registry.
pub fn synthesize(
    registry: &TypeRegistry,
    shape: &InterfaceShape,
    config: &ProxyConfig,
) -> Result<ProxyType> {
    let interface = &shape.interface;
    let generation = GENERATION.fetch_add(1, Ordering::Relaxed);
    let token = registry.next_token(Token::ARTIFICIAL);
    let generic_params: Vec<GenericParam> = shape
        .generic_params
        .iter()
        .map(GenericParam::without_variance)
        .collect();

    let mut slots = Vec::with_capacity(shape.members.len() + 1);
    for member in &shape.members {
        if registry.is_dispose_method(&member.method) {
            continue;
        }

        slots.push(ProxySlot {
            declaring: member.declaring.clone(),
            method: member.method.clone(),
            forwarder: forwarder(registry, token, &member.declaring, &member.method)?,
            signature: member.signature.clone(),
            kind: ForwardKind::Forward,
        });
    }

    if shape.disposable {
        let disposable = registry.disposable();
        let dispose = registry.dispose_method();
        slots.push(ProxySlot {
            forwarder: forwarder(registry, token, &disposable, &dispose)?,
            signature: dispose.signature(&[]),
            declaring: disposable,
            method: dispose,
            kind: ForwardKind::ReleaseIfProduced,
        });
    }

    let definition = registry.insert(TypeDef {
        token,
        namespace: config
            .namespace
            .clone()
            .unwrap_or_else(|| interface.namespace.clone()),
        name: format!(
            "{}_{:08x}_{}",
            config.type_name_prefix, generation, interface.name
        ),
        kind: TypeKind::Class,
        base: None,
        interfaces: shape.interfaces.clone(),
        generic_params: generic_params.clone(),
        methods: slots.iter().map(|slot| slot.forwarder.clone()).collect(),
        default_constructor: true,
    })?;

    log::debug!(
        "Synthesized {} for {} with {} members",
        definition.fullname(),
        interface.fullname(),
        slots.len()
    );

    Ok(ProxyType {
        definition,
        interface: interface.clone(),
        generic_params,
        interfaces: shape.interfaces.clone(),
        slots,
        disposable: shape.disposable,
        generation,
    })
}

fn forwarder(
    registry: &TypeRegistry,
    owner: Token,
    declaring: &TypeSig,
    method: &MethodDef,
) -> Result<MethodRc> {
    let declaring_def = registry.resolve(declaring)?;
    Ok(Arc::new(MethodDef {
        token: registry.next_token(Token::METHOD_DEF),
        name: format!("{}.{}", declaring_def.fullname(), method.name),
        kind: method.kind,
        declaring: owner,
        params: method.params.clone(),
        ret: method.ret.clone(),
        generic_params: method.generic_params.clone(),
    }))
}

impl ProxyType {
    /// The registered class definition
    #[must_use]
    pub fn definition(&self) -> &TypeRc {
        &self.definition
    }

    /// The proxied interface definition
    #[must_use]
    pub fn interface(&self) -> &TypeRc {
        &self.interface
    }

    /// Generic parameters of the proxy type, without variance
    #[must_use]
    pub fn generic_params(&self) -> &[GenericParam] {
        &self.generic_params
    }

    /// Implemented interfaces, in terms of the proxy's generic parameters
    #[must_use]
    pub fn interfaces(&self) -> &[TypeSig] {
        &self.interfaces
    }

    /// All forwarding slots
    #[must_use]
    pub fn slots(&self) -> &[ProxySlot] {
        &self.slots
    }

    /// Returns `true` if the proxy releases the real object on `Dispose`
    #[must_use]
    pub fn is_disposable(&self) -> bool {
        self.disposable
    }

    /// The generation number embedded in the type name
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Full name of the synthesized type
    #[must_use]
    pub fn name(&self) -> String {
        self.definition.fullname()
    }

    /// Bind the proxy type to concrete type arguments.
    ///
    /// Non-generic proxy types are bound with no arguments.
    ///
    /// ## Arguments
    /// * `registry` - The registry the proxy type lives in
    /// * `args` - One argument per generic parameter
    /// * `enforce_constraints` - Check `args` and, later, generic method arguments against
    ///   their constraints
    ///
    /// # Errors
    /// Returns [`Error::GenericArity`] or [`Error::ConstraintViolation`].
    pub fn bind(
        self: &Arc<Self>,
        registry: &Arc<TypeRegistry>,
        args: &[TypeSig],
        enforce_constraints: bool,
    ) -> Result<ClosedProxyType> {
        if args.len() != self.generic_params.len() {
            return Err(Error::GenericArity {
                name: self.interface.fullname(),
                expected: self.generic_params.len(),
                actual: args.len(),
            });
        }
        if enforce_constraints {
            registry.check_constraints(&self.interface.fullname(), &self.generic_params, args)?;
        }

        let mut slots = HashMap::with_capacity(self.slots.len());
        for (index, slot) in self.slots.iter().enumerate() {
            slots
                .entry((slot.declaring.substitute(args, &[]), slot.method.token))
                .or_insert(index);
        }

        let closed = ClosedProxyType {
            proxy: self.clone(),
            registry: registry.clone(),
            interface: TypeSig::generic(self.interface.token, args.to_vec()),
            interfaces: self
                .interfaces
                .iter()
                .map(|interface| interface.substitute(args, &[]))
                .collect(),
            type_args: args.to_vec(),
            slots,
            enforce_constraints,
        };

        if !args.is_empty() {
            log::debug!("Bound {} as {}", self.name(), closed.name());
        }
        Ok(closed)
    }
}

impl fmt::Debug for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyType")
            .field("name", &self.name())
            .field("token", &self.definition.token)
            .field("interface", &self.interface.fullname())
            .field("slot_count", &self.slots.len())
            .field("disposable", &self.disposable)
            .finish()
    }
}

/// A proxy type bound to concrete type arguments.
pub struct ClosedProxyType {
    proxy: ProxyTypeRc,
    registry: Arc<TypeRegistry>,
    interface: TypeSig,
    interfaces: Vec<TypeSig>,
    type_args: Vec<TypeSig>,
    slots: HashMap<(TypeSig, Token), usize>,
    enforce_constraints: bool,
}

impl ClosedProxyType {
    /// The open proxy type this was bound from
    #[must_use]
    pub fn proxy(&self) -> &ProxyTypeRc {
        &self.proxy
    }

    /// The registered class definition
    #[must_use]
    pub fn definition(&self) -> &TypeRc {
        self.proxy.definition()
    }

    /// The proxied interface, closed
    #[must_use]
    pub fn interface(&self) -> &TypeSig {
        &self.interface
    }

    /// Every implemented interface, closed
    #[must_use]
    pub fn interfaces(&self) -> &[TypeSig] {
        &self.interfaces
    }

    /// The type arguments
    #[must_use]
    pub fn type_args(&self) -> &[TypeSig] {
        &self.type_args
    }

    /// Returns `true` if instances can be used as `interface`, directly or through generic
    /// variance
    #[must_use]
    pub fn implements(&self, interface: &TypeSig) -> bool {
        self.registry.implements_interface(&self.interfaces, interface)
    }

    /// Display name, e.g. `Shop.LazyProxyImpl_00000003_IStore<Shop.Order>`
    #[must_use]
    pub fn name(&self) -> String {
        if self.type_args.is_empty() {
            return self.proxy.name();
        }

        let args: Vec<String> = self
            .type_args
            .iter()
            .map(|arg| self.registry.display(arg))
            .collect();
        format!("{}<{}>", self.proxy.name(), args.join(", "))
    }

    /// Display name of the proxied interface, e.g. `Shop.IStore<Shop.Order>`
    #[must_use]
    pub fn interface_name(&self) -> String {
        self.registry.display(&self.interface)
    }

    /// The slot that handles `member`
    ///
    /// Members addressed through a variant instantiation of an implemented interface resolve
    /// to the slot of that interface.
    #[must_use]
    pub fn slot(&self, member: &MemberRef) -> Option<&ProxySlot> {
        let interface = self
            .registry
            .find_compatible_interface(&self.interfaces, &member.interface)?;
        self.slots
            .get(&(interface.clone(), member.method.token))
            .and_then(|index| self.proxy.slots.get(*index))
    }

    /// Every member of the proxy, addressed through its closed declaring interface
    #[must_use]
    pub fn members(&self) -> Vec<MemberRef> {
        self.proxy
            .slots
            .iter()
            .map(|slot| {
                MemberRef::new(
                    slot.declaring.substitute(&self.type_args, &[]),
                    slot.method.clone(),
                )
            })
            .collect()
    }

    /// Check the type arguments of a generic method call.
    ///
    /// # Errors
    /// Returns [`Error::GenericArity`] if the number of arguments does not match and, with
    /// constraint enforcement on, [`Error::ConstraintViolation`].
    pub fn check_method_type_args(&self, member: &MemberRef, type_args: &[TypeSig]) -> Result<()> {
        let method = &member.method;
        if method.generic_params.len() != type_args.len() {
            return Err(Error::GenericArity {
                name: member.to_string(),
                expected: method.generic_params.len(),
                actual: type_args.len(),
            });
        }
        if self.enforce_constraints && !type_args.is_empty() {
            self.registry.check_method_constraints(
                &format!("{}.{}", self.registry.display(&member.interface), method.name),
                &method.generic_params,
                member.interface.args(),
                type_args,
            )?;
        }

        Ok(())
    }
}

impl fmt::Debug for ClosedProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClosedProxyType")
            .field("name", &self.name())
            .field("interface", &self.interface_name())
            .field("slot_count", &self.slots.len())
            .finish()
    }
}
