//! Proxy builder configuration.
//!
//! # Example
//!
//! ```rust
//! use lazyproxy::proxy::ProxyConfig;
//!
//! // Default configuration
//! let config = ProxyConfig::default();
//! assert_eq!(config.type_name_prefix, "LazyProxyImpl");
//!
//! // Or customize
//! let config = ProxyConfig::default()
//!     .with_namespace("Generated.Proxies")
//!     .with_max_inheritance_depth(16);
//! ```

use crate::metadata::typesystem::MAX_INHERITANCE_DEPTH;

/// Configuration of a [`crate::LazyProxyBuilder`].
///
/// # Default Configuration
///
/// - Synthesized types are named `LazyProxyImpl_{generation}_{InterfaceName}`
/// - Synthesized types are placed in the namespace of their interface
/// - Interface inheritance may be 64 levels deep
/// - Generic constraints are enforced when binding type arguments
/// - Objects produced by value factories must implement the proxied interface
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Prefix of synthesized type names.
    pub type_name_prefix: String,

    /// Namespace of synthesized types, `None` to use the interface's namespace.
    pub namespace: Option<String>,

    /// Maximum depth of interface inheritance.
    ///
    /// Deeper (or cyclic) hierarchies fail with [`crate::Error::RecursionLimit`].
    pub max_inheritance_depth: usize,

    /// Check type arguments against generic constraints.
    ///
    /// Applies to interface instantiations and to generic method calls through a proxy.
    pub enforce_constraints: bool,

    /// Check that the object produced by a value factory implements the proxied interface.
    ///
    /// A mismatch surfaces as [`crate::Error::InvalidCast`] on first access.
    pub verify_factory_result: bool,
}

impl ProxyConfig {
    /// Creates a default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the prefix of synthesized type names.
    #[must_use]
    pub fn with_type_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_name_prefix = prefix.into();
        self
    }

    /// Places synthesized types into a fixed namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the maximum depth of interface inheritance.
    #[must_use]
    pub fn with_max_inheritance_depth(mut self, depth: usize) -> Self {
        self.max_inheritance_depth = depth;
        self
    }

    /// Enables or disables generic constraint checks.
    #[must_use]
    pub fn with_constraint_enforcement(mut self, enabled: bool) -> Self {
        self.enforce_constraints = enabled;
        self
    }

    /// Enables or disables the check of factory results.
    #[must_use]
    pub fn with_factory_result_verification(mut self, enabled: bool) -> Self {
        self.verify_factory_result = enabled;
        self
    }
}

impl Default for ProxyConfig {
    /// Creates a default proxy configuration.
    ///
    /// See the struct documentation for default values.
    fn default() -> Self {
        Self {
            type_name_prefix: "LazyProxyImpl".to_string(),
            namespace: None,
            max_inheritance_depth: MAX_INHERITANCE_DEPTH,
            enforce_constraints: true,
            verify_factory_result: true,
        }
    }
}
