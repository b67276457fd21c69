//! Interface surface resolution.
//!
//! Turns an interface definition into an [`InterfaceShape`]: every member the interface
//! exposes, including the ones inherited from parent interfaces, together with its generic
//! parameters and whether it carries the disposal capability.

use crate::{
    metadata::typesystem::{
        GenericParam, MemberSignature, MethodRc, TypeRc, TypeRegistry, TypeSig,
    },
    Error, Result,
};

/// A member of an [`InterfaceShape`].
#[derive(Clone, Debug)]
pub struct ShapeMember {
    /// The declaring interface, expressed in the generic parameters of the shape's interface
    pub declaring: TypeSig,
    /// The method definition
    pub method: MethodRc,
    /// The member's signature as seen through `declaring`
    pub signature: MemberSignature,
}

/// The complete member surface of an interface.
///
/// A shape is derived from the open definition of an interface. Members are listed in
/// inheritance order: the interface's own members first, then those of each parent interface,
/// depth-first. An interface reached through several inheritance paths contributes its members
/// once; interfaces that are reached with different type arguments contribute one member per
/// instantiation.
#[derive(Clone, Debug)]
pub struct InterfaceShape {
    /// The interface definition
    pub interface: TypeRc,
    /// Generic parameters of the interface as declared, variance included
    pub generic_params: Vec<GenericParam>,
    /// The interface and every interface it extends
    pub interfaces: Vec<TypeSig>,
    /// All members
    pub members: Vec<ShapeMember>,
    /// The interface extends `System.IDisposable`
    pub disposable: bool,
}

impl InterfaceShape {
    /// Find the first member with the given name
    #[must_use]
    pub fn member(&self, name: &str) -> Option<&ShapeMember> {
        self.members.iter().find(|member| member.method.name == name)
    }

    /// Returns `true` if members must be bound to type arguments before use
    #[must_use]
    pub fn is_generic(&self) -> bool {
        !self.generic_params.is_empty()
    }
}

/// Resolves interface definitions into [`InterfaceShape`]s.
pub struct SurfaceResolver<'r> {
    registry: &'r TypeRegistry,
    max_depth: usize,
}

impl<'r> SurfaceResolver<'r> {
    /// Create a new resolver.
    ///
    /// ## Arguments
    /// * `registry` - The registry holding the interface and its parents
    /// * `max_depth` - Maximum inheritance depth
    #[must_use]
    pub fn new(registry: &'r TypeRegistry, max_depth: usize) -> Self {
        SurfaceResolver {
            registry,
            max_depth,
        }
    }

    /// Resolve the shape of an interface definition.
    ///
    /// The result only depends on the registered definitions, so resolving the same interface
    /// twice yields structurally identical shapes.
    ///
    /// # Errors
    /// Returns [`Error::UnsupportedTargetKind`] for anything but an interface,
    /// [`Error::RecursionLimit`] for too deep inheritance, and resolution errors for parents
    /// that are missing from the registry.
    pub fn resolve(&self, interface: &TypeRc) -> Result<InterfaceShape> {
        if !interface.is_interface() {
            return Err(Error::UnsupportedTargetKind {
                name: interface.fullname(),
                kind: interface.kind,
            });
        }

        let interfaces = self
            .registry
            .interface_closure(&interface.sig(), self.max_depth)?;

        let mut members = Vec::new();
        for declaring in &interfaces {
            let def = self.registry.resolve(declaring)?;
            for method in &def.methods {
                members.push(ShapeMember {
                    declaring: declaring.clone(),
                    method: method.clone(),
                    signature: method.signature(declaring.args()),
                });
            }
        }

        let disposable = interfaces.contains(&self.registry.disposable());

        Ok(InterfaceShape {
            interface: interface.clone(),
            generic_params: interface.generic_params.clone(),
            interfaces,
            members,
            disposable,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::typesystem::{ClassBuilder, InterfaceBuilder, MemberKind, ParamMode, Variance},
        test::{create_diamond, create_generic_service},
    };

    #[test]
    fn test_rejects_classes() {
        let registry = TypeRegistry::new();
        let class = ClassBuilder::new("Service")
            .abstract_class()
            .build(&registry)
            .unwrap();

        let result = SurfaceResolver::new(&registry, 8).resolve(&class);
        assert!(matches!(
            result,
            Err(Error::UnsupportedTargetKind { kind, .. }) if kind.to_string() == "AbstractClass"
        ));
    }

    #[test]
    fn test_inherited_members_are_merged() {
        let registry = TypeRegistry::new();
        let diamond = create_diamond(&registry);

        let shape = SurfaceResolver::new(&registry, 8)
            .resolve(&diamond.bottom)
            .unwrap();
        let names: Vec<_> = shape
            .members
            .iter()
            .map(|member| member.method.name.as_str())
            .collect();

        assert_eq!(names, vec!["Bottom", "Left", "Root", "Right"]);
        assert_eq!(shape.interfaces.len(), 4);
        assert!(!shape.disposable);
    }

    #[test]
    fn test_generic_shape_keeps_variance_and_modes() {
        let registry = TypeRegistry::new();
        let service = create_generic_service(&registry);

        let shape = SurfaceResolver::new(&registry, 8)
            .resolve(&service.interface)
            .unwrap();
        assert!(shape.is_generic());
        assert_eq!(shape.generic_params[1].variance(), Variance::Contravariant);
        assert_eq!(shape.generic_params[2].variance(), Variance::Covariant);

        let try_get = shape.member("TryGet").unwrap();
        assert_eq!(try_get.signature.params[1].0, ParamMode::Out);
        assert_eq!(try_get.signature.params[1].1, TypeSig::TypeParam(2));

        let indexer = shape.member("get_Item").unwrap();
        assert_eq!(indexer.signature.kind, MemberKind::IndexerGetter);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let registry = TypeRegistry::new();
        let disposable = InterfaceBuilder::new("IResource")
            .extends(registry.disposable())
            .simple_method("Open", TypeSig::Void)
            .build(&registry)
            .unwrap();

        let resolver = SurfaceResolver::new(&registry, 8);
        let first = resolver.resolve(&disposable).unwrap();
        let second = resolver.resolve(&disposable).unwrap();

        let signatures = |shape: &InterfaceShape| {
            shape
                .members
                .iter()
                .map(|member| (member.declaring.clone(), member.signature.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(signatures(&first), signatures(&second));
        assert!(first.disposable);
        assert_eq!(first.members.len(), 2);
    }
}
