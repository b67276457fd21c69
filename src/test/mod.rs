use crate::{
    metadata::typesystem::{
        ClassBuilder, GenericParam, InterfaceBuilder, TypeRc, TypeRegistry, TypeSig,
    },
    runtime::{Invocation, Object, Value},
    Error, Result,
};

/// An object that implements nothing and answers every call with `MemberNotImplemented`
#[derive(Debug)]
pub struct SilentObject(pub &'static str);

impl Object for SilentObject {
    fn type_name(&self) -> String {
        self.0.to_string()
    }

    fn is_instance_of(&self, interface: &TypeSig) -> bool {
        *interface == TypeSig::Object
    }

    fn invoke(&self, call: Invocation<'_>) -> Result<Value> {
        Err(Error::MemberNotImplemented {
            owner: self.0.to_string(),
            member: call.member().to_string(),
        })
    }
}

/// `IBottom : ILeft, IRight` with `ILeft : IRoot` and `IRight : IRoot`
pub struct Diamond {
    pub root: TypeRc,
    pub left: TypeRc,
    pub right: TypeRc,
    pub bottom: TypeRc,
}

// Helper function to create a diamond shaped interface hierarchy
pub fn create_diamond(registry: &TypeRegistry) -> Diamond {
    let root = InterfaceBuilder::new("IRoot")
        .simple_method("Root", TypeSig::Void)
        .build(registry)
        .unwrap();
    let left = InterfaceBuilder::new("ILeft")
        .extends(root.sig())
        .simple_method("Left", TypeSig::Void)
        .build(registry)
        .unwrap();
    let right = InterfaceBuilder::new("IRight")
        .extends(root.sig())
        .simple_method("Right", TypeSig::Void)
        .build(registry)
        .unwrap();
    let bottom = InterfaceBuilder::new("IBottom")
        .extends(left.sig())
        .extends(right.sig())
        .simple_method("Bottom", TypeSig::Void)
        .build(registry)
        .unwrap();

    Diamond {
        root,
        left,
        right,
        bottom,
    }
}

/// `IGenericService<T, in TIn, out TOut>` and type arguments that satisfy its constraints
pub struct GenericService {
    pub interface: TypeRc,
    pub base_argument: TypeRc,
    pub other_base_argument: TypeRc,
    /// A class satisfying `T`
    pub argument: TypeRc,
    /// A struct satisfying `TIn`
    pub value_argument: TypeRc,
    /// A class satisfying `TOut`
    pub out_argument: TypeRc,
}

// Helper function to create a constrained, variant generic interface
pub fn create_generic_service(registry: &TypeRegistry) -> GenericService {
    let base_argument = InterfaceBuilder::new("IBaseArgument")
        .build(registry)
        .unwrap();
    let other_base_argument = InterfaceBuilder::new("IOtherBaseArgument")
        .build(registry)
        .unwrap();
    let abstract_argument = ClassBuilder::new("BaseArgument")
        .abstract_class()
        .implements(base_argument.sig())
        .implements(other_base_argument.sig())
        .build(registry)
        .unwrap();
    let abstract_argument2 = ClassBuilder::new("BaseArgument2")
        .abstract_class()
        .build(registry)
        .unwrap();
    let argument = ClassBuilder::new("TestArgument2")
        .extends(abstract_argument.sig())
        .build(registry)
        .unwrap();
    let value_argument = ClassBuilder::new("TestArgument")
        .value_type()
        .implements(base_argument.sig())
        .implements(other_base_argument.sig())
        .build(registry)
        .unwrap();
    let out_argument = ClassBuilder::new("TestArgument4")
        .extends(abstract_argument2.sig())
        .implements(base_argument.sig())
        .build(registry)
        .unwrap();

    let interface = InterfaceBuilder::new("IGenericService`3")
        .generic_param(
            GenericParam::new(0, "T")
                .reference_type()
                .default_constructor()
                .constraint(base_argument.sig())
                .constraint(other_base_argument.sig()),
        )
        .generic_param(GenericParam::new(1, "TIn").contravariant().value_type())
        .generic_param(
            GenericParam::new(2, "TOut")
                .covariant()
                .constraint(abstract_argument2.sig())
                .constraint(base_argument.sig()),
        )
        .method_signature(
            "Method1",
            TypeSig::TypeParam(2),
            vec![("arg1", TypeSig::TypeParam(0)), ("arg2", TypeSig::TypeParam(1))],
        )
        .method_signature(
            "Method2",
            TypeSig::TypeParam(0),
            vec![("arg1", TypeSig::TypeParam(0)), ("arg2", TypeSig::TypeParam(1))],
        )
        .method("GenericMethod", |m| {
            m.generic_param(GenericParam::new(0, "T1"))
                .generic_param(GenericParam::new(1, "T2"))
                .returns(TypeSig::TypeParam(0))
                .param("arg", TypeSig::TypeParam(1))
        })
        .method("TryGet", |m| {
            m.returns(TypeSig::Boolean)
                .param("key", TypeSig::TypeParam(1))
                .out_param("value", TypeSig::TypeParam(2))
        })
        .indexer(TypeSig::TypeParam(1), TypeSig::TypeParam(2), false)
        .build(registry)
        .unwrap();

    GenericService {
        interface,
        base_argument,
        other_base_argument,
        argument,
        value_argument,
        out_argument,
    }
}

/// An interface extending `System.IDisposable`
pub struct DisposableService {
    pub interface: TypeRc,
}

// Helper function to create a disposable interface
pub fn create_disposable_service(registry: &TypeRegistry) -> DisposableService {
    let interface = InterfaceBuilder::new("IDisposableService")
        .extends(registry.disposable())
        .simple_method("Run", TypeSig::Void)
        .build(registry)
        .unwrap();

    DisposableService { interface }
}

// Helper function to create an unconstrained IPair<TFirst, TSecond>
pub fn create_pair(registry: &TypeRegistry) -> TypeRc {
    InterfaceBuilder::new("IPair`2")
        .generic_param(GenericParam::new(0, "TFirst"))
        .generic_param(GenericParam::new(1, "TSecond"))
        .readonly_property("First", TypeSig::TypeParam(0))
        .readonly_property("Second", TypeSig::TypeParam(1))
        .build(registry)
        .unwrap()
}
