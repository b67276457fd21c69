//! Shared fixtures for the integration tests.
//!
//! The fixtures describe a small service layer: a parent and a child service interface, a
//! constrained generic service, a disposable service, and the argument types that satisfy (or
//! violate) the generic constraints.

#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use lazyproxy::prelude::*;

/// An opaque argument value, implementing nothing but `object`
#[derive(Debug)]
pub struct Entity(pub &'static str);

impl Object for Entity {
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

/// Error raised by real objects in the tests
#[derive(Debug, thiserror::Error)]
#[error("test failure: {0}")]
pub struct TestException(pub &'static str);

pub struct Fixture {
    pub registry: Arc<TypeRegistry>,

    pub base_argument: TypeRc,
    pub other_base_argument: TypeRc,
    pub base_argument2: TypeRc,
    /// struct TestArgument : IBaseArgument, IOtherBaseArgument
    pub test_argument: TypeRc,
    /// class TestArgument2 : BaseArgument
    pub test_argument2: TypeRc,
    /// class TestArgument3 : BaseArgument, without a parameterless constructor
    pub test_argument3: TypeRc,
    /// class TestArgument4 : BaseArgument2, IBaseArgument
    pub test_argument4: TypeRc,

    pub parent_service: TypeRc,
    pub service: TypeRc,
    pub generic_service: TypeRc,
    pub disposable_service: TypeRc,
    pub abstract_service: TypeRc,
    /// interface IProducer<out T> { T Produce(); }
    pub producer: TypeRc,
    /// interface IConsumer<in T> { void Accept(T item); }
    pub consumer: TypeRc,
}

impl Fixture {
    pub fn new() -> Result<Self> {
        let registry = Arc::new(TypeRegistry::new());

        let base_argument = InterfaceBuilder::new("IBaseArgument")
            .namespace("Tests")
            .build(&registry)?;
        let other_base_argument = InterfaceBuilder::new("IOtherBaseArgument")
            .namespace("Tests")
            .build(&registry)?;
        let base_argument_class = ClassBuilder::new("BaseArgument")
            .namespace("Tests")
            .abstract_class()
            .implements(base_argument.sig())
            .implements(other_base_argument.sig())
            .build(&registry)?;
        let base_argument2 = ClassBuilder::new("BaseArgument2")
            .namespace("Tests")
            .abstract_class()
            .build(&registry)?;
        let test_argument = ClassBuilder::new("TestArgument")
            .namespace("Tests")
            .value_type()
            .implements(base_argument.sig())
            .implements(other_base_argument.sig())
            .build(&registry)?;
        let test_argument2 = ClassBuilder::new("TestArgument2")
            .namespace("Tests")
            .extends(base_argument_class.sig())
            .build(&registry)?;
        let test_argument3 = ClassBuilder::new("TestArgument3")
            .namespace("Tests")
            .extends(base_argument_class.sig())
            .without_default_constructor()
            .build(&registry)?;
        let test_argument4 = ClassBuilder::new("TestArgument4")
            .namespace("Tests")
            .extends(base_argument2.sig())
            .implements(base_argument.sig())
            .build(&registry)?;

        let parent_service = InterfaceBuilder::new("IParentTestService")
            .namespace("Tests")
            .readwrite_property("ParentProperty", TypeSig::I4)
            .method_signature(
                "ParentMethod",
                TypeSig::String,
                vec![("arg", TypeSig::Boolean)],
            )
            .build(&registry)?;

        let service = InterfaceBuilder::new("ITestService")
            .namespace("Tests")
            .extends(parent_service.sig())
            .readwrite_property("Property", test_argument.sig())
            .indexer(TypeSig::I4, TypeSig::String, true)
            .simple_method("VoidMethod", TypeSig::Void)
            .method_signature(
                "Method",
                TypeSig::String,
                vec![
                    ("arg1", TypeSig::String),
                    ("arg2", TypeSig::I4),
                    ("arg3", test_argument.sig()),
                ],
            )
            .method("MethodWithDefaultValue", |m| {
                m.returns(TypeSig::String).optional_param(
                    "arg",
                    TypeSig::String,
                    Constant::String("arg".to_string()),
                )
            })
            .method("MethodWithOutValue", |m| {
                m.returns(TypeSig::String).out_param("arg", TypeSig::String)
            })
            .method("MethodWithRefValue", |m| {
                m.returns(TypeSig::String).ref_param("arg", TypeSig::I4)
            })
            .method("GenericMethod", |m| {
                m.generic_param(
                    GenericParam::new(0, "T")
                        .constraint(base_argument.sig())
                        .constraint(other_base_argument.sig()),
                )
            })
            .method("GenericMethod", |m| {
                m.returns(TypeSig::String)
                    .generic_param(
                        GenericParam::new(0, "T1")
                            .reference_type()
                            .default_constructor()
                            .constraint(base_argument.sig()),
                    )
                    .generic_param(GenericParam::new(1, "T2").value_type())
                    .generic_param(
                        GenericParam::new(2, "T3")
                            .constraint(base_argument2.sig())
                            .constraint(base_argument.sig()),
                    )
                    .param("arg", TypeSig::String)
            })
            .build(&registry)?;

        let generic_service = InterfaceBuilder::new("IGenericTestService`3")
            .namespace("Tests")
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
                    .constraint(base_argument2.sig())
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
                m.returns(TypeSig::TypeParam(0))
                    .generic_param(GenericParam::new(0, "T1"))
                    .generic_param(GenericParam::new(1, "T2"))
                    .param("arg", TypeSig::TypeParam(1))
            })
            .build(&registry)?;

        let disposable_service = InterfaceBuilder::new("IDisposableTestService")
            .namespace("Tests")
            .extends(registry.disposable())
            .simple_method("Run", TypeSig::Void)
            .build(&registry)?;

        let abstract_service = ClassBuilder::new("AbstractTestService")
            .namespace("Tests")
            .abstract_class()
            .build(&registry)?;

        let producer = InterfaceBuilder::new("IProducer`1")
            .namespace("Tests")
            .generic_param(GenericParam::new(0, "T").covariant())
            .simple_method("Produce", TypeSig::TypeParam(0))
            .build(&registry)?;
        let consumer = InterfaceBuilder::new("IConsumer`1")
            .namespace("Tests")
            .generic_param(GenericParam::new(0, "T").contravariant())
            .method_signature("Accept", TypeSig::Void, vec![("item", TypeSig::TypeParam(0))])
            .build(&registry)?;

        Ok(Fixture {
            registry,
            base_argument,
            other_base_argument,
            base_argument2,
            test_argument,
            test_argument2,
            test_argument3,
            test_argument4,
            parent_service,
            service,
            generic_service,
            disposable_service,
            abstract_service,
            producer,
            consumer,
        })
    }

    pub fn builder(&self) -> LazyProxyBuilder {
        LazyProxyBuilder::new(self.registry.clone())
    }

    /// A member of `ITestService` (or of the interfaces it extends) by name
    pub fn member(&self, name: &str) -> Result<MemberRef> {
        self.registry.find_method(&self.service.sig(), name)
    }

    /// A generic `ITestService.GenericMethod` overload by arity
    pub fn generic_method(&self, arity: usize) -> Result<MemberRef> {
        self.registry.find_method_by(&self.service.sig(), |method| {
            method.name == "GenericMethod" && method.generic_params.len() == arity
        })
    }

    /// `IGenericTestService<TestArgument2, TestArgument, TestArgument4>`
    pub fn closed_generic_service(&self) -> TypeSig {
        TypeSig::generic(
            self.generic_service.token,
            vec![
                self.test_argument2.sig(),
                self.test_argument.sig(),
                self.test_argument4.sig(),
            ],
        )
    }

    /// `IProducer<arg>`
    pub fn producer_of(&self, arg: TypeSig) -> TypeSig {
        TypeSig::generic(self.producer.token, vec![arg])
    }

    /// `IConsumer<arg>`
    pub fn consumer_of(&self, arg: TypeSig) -> TypeSig {
        TypeSig::generic(self.consumer.token, vec![arg])
    }

    /// A real `ITestService` with no members implemented
    pub fn empty_service(&self) -> Result<ObjectRef> {
        ServiceObject::builder(&self.registry, "EmptyTestService")
            .implements(self.service.sig())
            .build()
    }
}

/// Counts how often a factory ran
#[derive(Clone, Default)]
pub struct Counter(Arc<AtomicUsize>);

impl Counter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}
