//! Lazy proxy instances.
//!
//! A [`LazyProxy`] is an instance of a synthesized proxy type. It owns one [`DeferredValue`]
//! holding the real object and dispatches every call through the slots of its type.

use std::fmt;

use crate::{
    proxy::{ClosedProxyTypeRc, DeferredValue, ForwardKind},
    runtime::{Invocation, Object, ObjectRef, Value},
    Error, Result,
};

/// An object that implements an interface by forwarding to a lazily produced real object.
///
/// The real object is produced by the factory on the first forwarded call, at most once.
/// Calls to `System.IDisposable.Dispose` reach the real object only if it has been produced,
/// and at most once.
pub struct LazyProxy {
    ty: ClosedProxyTypeRc,
    service: DeferredValue<ObjectRef>,
}

impl LazyProxy {
    /// Instantiate a proxy type and bind it to a factory.
    ///
    /// The factory does not run here. With `verify` set, the produced object is checked to
    /// implement the proxied interface when it is produced.
    pub(crate) fn initialize<F>(ty: ClosedProxyTypeRc, factory: F, verify: bool) -> Self
    where
        F: FnOnce() -> Result<ObjectRef> + Send + 'static,
    {
        let service = if verify {
            let expected = ty.interface().clone();
            let expected_name = ty.interface_name();
            DeferredValue::new(move || {
                let service = factory()?;
                if service.is_instance_of(&expected) {
                    Ok(service)
                } else {
                    Err(Error::InvalidCast {
                        expected: expected_name,
                        actual: service.type_name(),
                    })
                }
            })
        } else {
            DeferredValue::new(factory)
        };

        LazyProxy { ty, service }
    }

    /// The proxy type of this instance
    #[must_use]
    pub fn proxy_type(&self) -> &ClosedProxyTypeRc {
        &self.ty
    }

    /// Returns `true` once the real object has been produced
    #[must_use]
    pub fn is_value_created(&self) -> bool {
        self.service.is_produced()
    }

    /// The real object, produced now if it has not been yet.
    ///
    /// # Errors
    /// Returns the factory's error.
    pub fn value(&self) -> Result<&ObjectRef> {
        self.service.read()
    }
}

impl Object for LazyProxy {
    fn type_name(&self) -> String {
        self.ty.name()
    }

    fn is_instance_of(&self, interface: &crate::metadata::typesystem::TypeSig) -> bool {
        self.ty.implements(interface)
    }

    fn invoke(&self, call: Invocation<'_>) -> Result<Value> {
        let member = call.member();
        let Some(slot) = self.ty.slot(member) else {
            return Err(Error::MemberNotFound {
                owner: self.ty.name(),
                member: member.to_string(),
            });
        };

        match slot.kind {
            ForwardKind::Forward => {
                self.ty.check_method_type_args(member, call.type_args())?;
                call.check_arguments()?;
                self.service.read()?.invoke(call)
            }
            ForwardKind::ReleaseIfProduced => {
                self.service
                    .release_if_produced(|service| service.invoke(call).map(|_| ()))?;
                Ok(Value::Void)
            }
        }
    }
}

impl fmt::Debug for LazyProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyProxy")
            .field("type", &self.ty.name())
            .field("service", &self.service)
            .finish()
    }
}
