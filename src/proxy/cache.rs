//! Memoization of synthesized proxy types.
//!
//! The cache has two levels:
//!
//! - **Definitions**: one synthesized [`ProxyType`] per interface definition. Generic interfaces
//!   are keyed by their open definition, so all instantiations share one synthesis. Building is
//!   single-flight: concurrent first requests wait for one build and share its outcome.
//! - **Instantiations**: one [`ClosedProxyType`] per closed interface signature.
//!
//! Every synthesized type is also appended to a log, which makes the number of syntheses
//! observable.
//!
//! [`ProxyType`]: crate::proxy::ProxyType
//! [`ClosedProxyType`]: crate::proxy::ClosedProxyType

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use crate::{
    metadata::{
        token::Token,
        typesystem::{TypeKind, TypeRc, TypeRegistry, TypeSig},
    },
    proxy::{synthesize, ClosedProxyTypeRc, ProxyConfig, ProxyTypeRc, SurfaceResolver},
    Error, Result,
};

/// Cache of synthesized proxy types.
#[derive(Default)]
pub struct ProxyTypeCache {
    /// Open definitions by interface token; each cell is initialized exactly once
    definitions: DashMap<Token, Arc<OnceLock<Result<ProxyTypeRc>>>>,
    /// Closed instantiations by interface signature
    closed: DashMap<TypeSig, ClosedProxyTypeRc>,
    /// Every type synthesized through this cache
    synthesized: boxcar::Vec<ProxyTypeRc>,
}

impl ProxyTypeCache {
    /// Create an empty cache
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the proxy type for a closed interface signature, building it on first request.
    ///
    /// ## Arguments
    /// * `registry` - The registry the interface lives in
    /// * `config` - Synthesis and binding options
    /// * `interface` - The interface, with concrete type arguments if generic
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedTargetKind`] if `interface` is not an interface,
    /// [`Error::TypeError`] if it still mentions generic parameters, and binding errors.
    pub fn get_or_build(
        &self,
        registry: &Arc<TypeRegistry>,
        config: &ProxyConfig,
        interface: &TypeSig,
    ) -> Result<ClosedProxyTypeRc> {
        if let Some(hit) = self.closed.get(interface) {
            log::trace!("Proxy type cache hit for {}", registry.display(interface));
            return Ok(hit.value().clone());
        }

        let def = match interface {
            TypeSig::Type { .. } => registry.resolve(interface)?,
            TypeSig::Boolean | TypeSig::Char | TypeSig::I4 | TypeSig::I8 | TypeSig::R8 => {
                return Err(Error::UnsupportedTargetKind {
                    name: interface.to_string(),
                    kind: TypeKind::ValueType,
                });
            }
            TypeSig::String | TypeSig::Object => {
                return Err(Error::UnsupportedTargetKind {
                    name: interface.to_string(),
                    kind: TypeKind::Class,
                });
            }
            _ => {
                return Err(type_error!("Cannot create a proxy type for {}", interface));
            }
        };
        if interface.is_open() {
            return Err(type_error!(
                "Cannot create a proxy type for the open type {}",
                registry.display(interface)
            ));
        }

        let proxy = self.get_or_build_definition(registry, config, &def)?;
        let closed = Arc::new(proxy.bind(
            registry,
            interface.args(),
            config.enforce_constraints,
        )?);

        Ok(self
            .closed
            .entry(interface.clone())
            .or_insert(closed)
            .value()
            .clone())
    }

    /// Returns the (open, if generic) proxy type for an interface definition, synthesizing it
    /// on first request.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedTargetKind`] if `interface` is not an interface, and
    /// resolution or synthesis errors. A failed synthesis is remembered.
    pub fn get_or_build_definition(
        &self,
        registry: &TypeRegistry,
        config: &ProxyConfig,
        interface: &TypeRc,
    ) -> Result<ProxyTypeRc> {
        if !interface.is_interface() {
            return Err(Error::UnsupportedTargetKind {
                name: interface.fullname(),
                kind: interface.kind,
            });
        }

        let cell = self
            .definitions
            .entry(interface.token)
            .or_default()
            .value()
            .clone();

        let outcome = cell.get_or_init(|| {
            let shape =
                SurfaceResolver::new(registry, config.max_inheritance_depth).resolve(interface)?;
            let proxy = Arc::new(synthesize(registry, &shape, config)?);
            self.synthesized.push(proxy.clone());
            Ok(proxy)
        });

        match outcome {
            Ok(proxy) => Ok(proxy.clone()),
            Err(error) => Err(error.clone()),
        }
    }

    /// Number of proxy types synthesized so far
    #[must_use]
    pub fn synthesized_count(&self) -> usize {
        self.synthesized.count()
    }

    /// Number of closed instantiations handed out so far
    #[must_use]
    pub fn instantiation_count(&self) -> usize {
        self.closed.len()
    }
}
