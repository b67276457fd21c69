// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![allow(dead_code)]

//! # lazyproxy
//!
//! Lazy proxies for arbitrary interfaces. A lazy proxy implements an interface on behalf of an
//! object that has not been created yet; the real object is produced by a factory on the first
//! call made through the proxy, exactly once, and every call is forwarded to it unchanged.
//!
//! ## Features
//!
//! - **💤 Deferred construction** - Nothing but the proxy exists until the interface is used
//! - **🔒 Thread safe** - Concurrent first calls share one factory invocation
//! - **🧬 Full interface surface** - Inherited interfaces, properties, indexers, generic
//!   methods, `ref`/`out` parameters and default arguments
//! - **📐 Generic interfaces** - Variance and constraints are honoured; one synthesized type
//!   serves every instantiation
//! - **♻️ Conditional disposal** - `Dispose` reaches the real object only if it was created
//! - **🪞 Transparent errors** - Errors of the factory and of the real object reach the caller
//!   untouched
//!
//! ## Quick Start
//!
//! ```rust
//! use lazyproxy::prelude::*;
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! let registry = Arc::new(TypeRegistry::new());
//! let repository = InterfaceBuilder::new("IRepository")
//!     .namespace("Demo")
//!     .method_signature("Find", TypeSig::String, vec![("id", TypeSig::I4)])
//!     .build(&registry)?;
//! let find = registry.find_method(&repository.sig(), "Find")?;
//!
//! let constructed = Arc::new(AtomicUsize::new(0));
//! let builder = LazyProxyBuilder::new(registry.clone());
//! let proxy = {
//!     let (registry, find, constructed) = (registry.clone(), find.clone(), constructed.clone());
//!     let interface = repository.sig();
//!     builder.create_lazy_instance(&repository.sig(), move || {
//!         constructed.fetch_add(1, Ordering::SeqCst);
//!         ServiceObject::builder(&registry, "SqlRepository")
//!             .implements(interface)
//!             .on(&find, |call| Ok(Value::from(format!("row {}", call.arg(0).as_i4().unwrap_or(0)))))
//!             .build()
//!     })?
//! };
//!
//! assert_eq!(constructed.load(Ordering::SeqCst), 0);
//! assert_eq!(proxy.call(&find, &mut [Value::I4(7)])?, Value::from("row 7"));
//! assert_eq!(proxy.call(&find, &mut [Value::I4(8)])?, Value::from("row 8"));
//! assert_eq!(constructed.load(Ordering::SeqCst), 1);
//! # Ok::<(), lazyproxy::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metadata`] - The type model: interfaces, classes, generics, members and the registry
//! - [`runtime`] - Values, the dynamic [`runtime::Object`] protocol and handler-backed objects
//! - [`proxy`] - Surface resolution, deferred values, proxy type synthesis, caching and
//!   instance creation
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`Error`] and [`Result`] - Error handling

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use lazyproxy::prelude::*;
/// use std::sync::Arc;
///
/// let registry = Arc::new(TypeRegistry::new());
/// let builder = LazyProxyBuilder::new(registry);
/// assert_eq!(builder.synthesized_count(), 0);
/// ```
pub mod prelude;

/// Type model of proxied interfaces and synthesized proxy types
pub mod metadata;

/// Lazy proxy types and instances
pub mod proxy;

/// Values and dynamically dispatched objects
pub mod runtime;

/// `lazyproxy` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `lazyproxy` Error type
///
/// Every fallible operation of this crate reports an [`Error`]. Errors raised by factories and
/// real objects are carried as a [`RaisedError`], which keeps their identity.
pub use error::{Error, RaisedError};

/// Main entry point for creating lazy proxies.
///
/// See [`proxy::LazyProxyBuilder`].
pub use proxy::LazyProxyBuilder;
