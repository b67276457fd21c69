//! Lazy proxies for arbitrary interfaces.
//!
//! A lazy proxy implements an interface on behalf of an object that does not exist yet. The
//! real object is produced by a factory on the first forwarded call, so handing out a proxy
//! costs nothing until the interface is actually used.
//!
//! # Key Components
//!
//! - [`LazyProxyBuilder`]: Entry point; owns the type cache and creates proxy instances
//! - [`SurfaceResolver`] / [`InterfaceShape`]: The full member surface of an interface
//! - [`DeferredValue`]: Single-assignment, thread-safe deferred value
//! - [`synthesize`] / [`ProxyType`] / [`ClosedProxyType`]: Synthesized forwarding types
//! - [`ProxyTypeCache`]: One synthesized type per interface definition, single-flight
//! - [`LazyProxy`]: A proxy instance
//!
//! # Examples
//!
//! ```rust
//! use lazyproxy::{
//!     metadata::typesystem::{InterfaceBuilder, TypeRegistry, TypeSig},
//!     runtime::{Object, ObjectExt, ServiceObject, Value},
//!     LazyProxyBuilder,
//! };
//! use std::sync::Arc;
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let clock = InterfaceBuilder::new("IClock")
//!     .simple_method("Now", TypeSig::I8)
//!     .build(&registry)?;
//! let now = registry.find_method(&clock.sig(), "Now")?;
//!
//! let builder = LazyProxyBuilder::new(registry.clone());
//! let factory_registry = registry.clone();
//! let (factory_clock, factory_now) = (clock.sig(), now.clone());
//! let proxy = builder.create_lazy_instance(&clock.sig(), move || {
//!     ServiceObject::builder(&factory_registry, "SystemClock")
//!         .implements(factory_clock)
//!         .on(&factory_now, |_| Ok(Value::I8(1_700_000_000)))
//!         .build()
//! })?;
//!
//! assert!(proxy.is_instance_of(&clock.sig()));
//! assert_eq!(proxy.call(&now, &mut [])?, Value::I8(1_700_000_000));
//! # Ok::<(), lazyproxy::Error>(())
//! ```

mod cache;
mod config;
mod deferred;
mod instance;
mod surface;
mod synthesizer;

use std::sync::Arc;

pub use cache::ProxyTypeCache;
pub use config::ProxyConfig;
pub use deferred::DeferredValue;
pub use instance::LazyProxy;
pub use surface::{InterfaceShape, ShapeMember, SurfaceResolver};
pub use synthesizer::{
    synthesize, ClosedProxyType, ClosedProxyTypeRc, ForwardKind, ProxySlot, ProxyType,
    ProxyTypeRc,
};

use crate::{
    metadata::typesystem::{TypeRc, TypeRegistry, TypeSig},
    runtime::ObjectRef,
    Result,
};

/// Builds lazy proxy types and instances for the interfaces of one [`TypeRegistry`].
///
/// Synthesized types are cached per builder: every request for the same interface returns the
/// same type, and a generic interface is synthesized once for all of its instantiations. The
/// builder is `Send + Sync` and meant to be shared.
pub struct LazyProxyBuilder {
    registry: Arc<TypeRegistry>,
    config: ProxyConfig,
    cache: ProxyTypeCache,
}

impl LazyProxyBuilder {
    /// Create a builder with the default configuration.
    ///
    /// ## Arguments
    /// * `registry` - The registry holding the interfaces; synthesized types are added to it
    #[must_use]
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self::with_config(registry, ProxyConfig::default())
    }

    /// Create a builder with a custom configuration.
    #[must_use]
    pub fn with_config(registry: Arc<TypeRegistry>, config: ProxyConfig) -> Self {
        LazyProxyBuilder {
            registry,
            config,
            cache: ProxyTypeCache::new(),
        }
    }

    /// The registry this builder works on
    #[must_use]
    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// The active configuration
    #[must_use]
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// Returns the proxy type for an interface, building it on first request.
    ///
    /// ## Arguments
    /// * `interface` - The interface; generic interfaces need concrete type arguments
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTargetKind`] if `interface` is not an interface, and
    /// resolution, arity or constraint errors.
    pub fn get_proxy_type(&self, interface: &TypeSig) -> Result<ClosedProxyTypeRc> {
        self.cache
            .get_or_build(&self.registry, &self.config, interface)
    }

    /// Returns the open proxy type for an interface definition, building it on first request.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTargetKind`] if `interface` is not an interface.
    pub fn get_proxy_type_definition(&self, interface: &TypeRc) -> Result<ProxyTypeRc> {
        self.cache
            .get_or_build_definition(&self.registry, &self.config, interface)
    }

    /// Create a proxy instance for an interface.
    ///
    /// The factory does not run until the first member of the proxy is invoked, and it runs at
    /// most once.
    ///
    /// ## Arguments
    /// * `interface` - The interface to implement
    /// * `factory` - Produces the real object
    ///
    /// # Errors
    /// Same as [`LazyProxyBuilder::get_proxy_type`].
    pub fn create_lazy_instance<F>(&self, interface: &TypeSig, factory: F) -> Result<ObjectRef>
    where
        F: FnOnce() -> Result<ObjectRef> + Send + 'static,
    {
        Ok(self.create_lazy_proxy(interface, factory)?)
    }

    /// Like [`LazyProxyBuilder::create_lazy_instance`], returning the concrete proxy.
    ///
    /// # Errors
    /// Same as [`LazyProxyBuilder::get_proxy_type`].
    pub fn create_lazy_proxy<F>(&self, interface: &TypeSig, factory: F) -> Result<Arc<LazyProxy>>
    where
        F: FnOnce() -> Result<ObjectRef> + Send + 'static,
    {
        let ty = self.get_proxy_type(interface)?;
        log::trace!("Creating lazy instance of {}", ty.name());
        Ok(Arc::new(LazyProxy::initialize(
            ty,
            factory,
            self.config.verify_factory_result,
        )))
    }

    /// Resolve the member surface of an interface definition.
    ///
    /// # Errors
    /// Returns [`crate::Error::UnsupportedTargetKind`] if `interface` is not an interface.
    pub fn interface_shape(&self, interface: &TypeRc) -> Result<InterfaceShape> {
        SurfaceResolver::new(&self.registry, self.config.max_inheritance_depth).resolve(interface)
    }

    /// Number of proxy types synthesized by this builder
    #[must_use]
    pub fn synthesized_count(&self) -> usize {
        self.cache.synthesized_count()
    }
}
