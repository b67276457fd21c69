//! The object protocol: dynamic member dispatch through [`Invocation`]s.
//!
//! - [`Object`]: Anything that can be called through an interface member
//! - [`Invocation`]: A single member call, with mutable arguments for `ref`/`out` parameters
//! - [`ObjectExt`]: Convenience calls (default arguments, properties) for every object
//! - [`ServiceObject`] / [`ServiceBuilder`]: Objects whose members are closures

use std::{collections::HashMap, fmt, sync::Arc};

use crate::{
    metadata::{
        token::Token,
        typesystem::{
            MemberRef, MethodRc, ParamMode, TypeRegistry, TypeSig, MAX_INHERITANCE_DEPTH,
        },
    },
    runtime::Value,
    Error, Result,
};

/// A shared reference to an object
pub type ObjectRef = Arc<dyn Object>;

/// Handler invoked for one member of a [`ServiceObject`]
pub type MemberHandler = Arc<dyn Fn(Invocation<'_>) -> Result<Value> + Send + Sync>;

/// An object that implements interfaces of a [`TypeRegistry`].
///
/// Members are invoked through [`Object::invoke`], which receives the member (addressed
/// through its declaring interface), the type arguments of a generic method and the argument
/// list. `ref` and `out` parameters are written back into the argument list.
pub trait Object: Send + Sync {
    /// Display name of the object's type
    fn type_name(&self) -> String;

    /// Returns `true` if the object can be used as `interface`
    fn is_instance_of(&self, interface: &TypeSig) -> bool;

    /// Invoke a member.
    ///
    /// # Errors
    /// Whatever the member raises; [`Error::MemberNotFound`] if the member does not belong to
    /// the object.
    fn invoke(&self, call: Invocation<'_>) -> Result<Value>;
}

/// A single call of an interface member.
pub struct Invocation<'a> {
    member: &'a MemberRef,
    type_args: &'a [TypeSig],
    args: &'a mut [Value],
}

impl<'a> Invocation<'a> {
    /// Create a new invocation.
    ///
    /// ## Arguments
    /// * `member` - The invoked member
    /// * `type_args` - Type arguments of a generic method (empty otherwise)
    /// * `args` - One value per parameter, in declaration order
    pub fn new(member: &'a MemberRef, type_args: &'a [TypeSig], args: &'a mut [Value]) -> Self {
        Invocation {
            member,
            type_args,
            args,
        }
    }

    /// The invoked member
    #[must_use]
    pub fn member(&self) -> &'a MemberRef {
        self.member
    }

    /// The invoked method definition
    #[must_use]
    pub fn method(&self) -> &'a MethodRc {
        &self.member.method
    }

    /// Type arguments of a generic method call
    #[must_use]
    pub fn type_args(&self) -> &'a [TypeSig] {
        self.type_args
    }

    /// All arguments
    #[must_use]
    pub fn args(&self) -> &[Value] {
        &*self.args
    }

    /// The argument at `index`, or [`Value::Void`] if there is none
    #[must_use]
    pub fn arg(&self, index: usize) -> &Value {
        static MISSING: Value = Value::Void;
        self.args.get(index).unwrap_or(&MISSING)
    }

    /// Assign a `ref` or `out` argument.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if the parameter does not exist or is passed by value.
    pub fn set_arg(&mut self, index: usize, value: Value) -> Result<()> {
        match self.member.method.params.get(index).map(|param| param.mode()) {
            Some(ParamMode::Ref | ParamMode::Out) => {}
            Some(ParamMode::Value) => {
                return Err(type_error!(
                    "Parameter {} of {} is passed by value",
                    index,
                    self.member
                ));
            }
            None => {
                return Err(type_error!("{} has no parameter {}", self.member, index));
            }
        }

        match self.args.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(self.argument_count_error()),
        }
    }

    /// Check that there is exactly one argument per parameter.
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] otherwise.
    pub fn check_arguments(&self) -> Result<()> {
        if self.args.len() == self.member.method.params.len() {
            Ok(())
        } else {
            Err(self.argument_count_error())
        }
    }

    fn argument_count_error(&self) -> Error {
        Error::ArgumentCount {
            member: self.member.to_string(),
            expected: self.member.method.params.len(),
            actual: self.args.len(),
        }
    }
}

/// Convenience calls, implemented for every [`Object`].
pub trait ObjectExt: Object {
    /// Invoke a non-generic member with a complete argument list.
    ///
    /// # Errors
    /// Whatever the member raises.
    fn call(&self, member: &MemberRef, args: &mut [Value]) -> Result<Value> {
        self.invoke(Invocation::new(member, &[], args))
    }

    /// Invoke a generic method with a complete argument list.
    ///
    /// # Errors
    /// Whatever the member raises.
    fn call_generic(
        &self,
        member: &MemberRef,
        type_args: &[TypeSig],
        args: &mut [Value],
    ) -> Result<Value> {
        self.invoke(Invocation::new(member, type_args, args))
    }

    /// Invoke a member, filling in optional parameters and `out` placeholders.
    ///
    /// Missing trailing arguments take the parameter's default value (`null` if none is
    /// declared); missing `out` arguments start as `null`. Returns the result together with
    /// the final argument list, so assigned `ref`/`out` values can be read back.
    ///
    /// # Errors
    /// Returns [`Error::ArgumentCount`] if required arguments are missing or too many are
    /// given, and whatever the member raises.
    fn call_with(
        &self,
        member: &MemberRef,
        type_args: &[TypeSig],
        mut args: Vec<Value>,
    ) -> Result<(Value, Vec<Value>)> {
        let params = &member.method.params;
        if args.len() < member.method.required_params() || args.len() > params.len() {
            return Err(Error::ArgumentCount {
                member: member.to_string(),
                expected: params.len(),
                actual: args.len(),
            });
        }

        for param in &params[args.len()..] {
            args.push(param.default.as_ref().map_or(Value::Null, Value::from));
        }

        let result = self.invoke(Invocation::new(member, type_args, &mut args))?;
        Ok((result, args))
    }

    /// Read a property through its getter.
    ///
    /// # Errors
    /// Whatever the getter raises.
    fn get(&self, getter: &MemberRef) -> Result<Value> {
        self.call(getter, &mut [])
    }

    /// Assign a property through its setter.
    ///
    /// # Errors
    /// Whatever the setter raises.
    fn set(&self, setter: &MemberRef, value: Value) -> Result<()> {
        self.call(setter, &mut [value]).map(|_| ())
    }
}

impl<T: Object + ?Sized> ObjectExt for T {}

/// An object whose members are implemented by closures.
///
/// Members are keyed by the interface they are addressed through and the method token, so
/// an object implementing two instantiations of the same generic interface can answer each
/// one differently.
///
/// # Examples
///
/// ```rust
/// use lazyproxy::metadata::typesystem::{InterfaceBuilder, TypeRegistry, TypeSig};
/// use lazyproxy::runtime::{ObjectExt, ServiceObject, Value};
/// use std::sync::Arc;
///
/// let registry = Arc::new(TypeRegistry::new());
/// let greeter = InterfaceBuilder::new("IGreeter")
///     .method_signature("Greet", TypeSig::String, vec![("name", TypeSig::String)])
///     .build(&registry)?;
/// let greet = registry.find_method(&greeter.sig(), "Greet")?;
///
/// let object = ServiceObject::builder(&registry, "Greeter")
///     .implements(greeter.sig())
///     .on(&greet, |call| Ok(format!("Hello {}", call.arg(0).as_str().unwrap_or("?")).into()))
///     .build()?;
///
/// let result = object.call(&greet, &mut [Value::from("Ada")])?;
/// assert_eq!(result.as_str(), Some("Hello Ada"));
/// # Ok::<(), lazyproxy::Error>(())
/// ```
pub struct ServiceObject {
    registry: Arc<TypeRegistry>,
    name: String,
    interfaces: Vec<TypeSig>,
    handlers: HashMap<(TypeSig, Token), MemberHandler>,
}

impl ServiceObject {
    /// Start building a new object.
    ///
    /// ## Arguments
    /// * `registry` - The registry the implemented interfaces live in
    /// * `name` - The object's type name
    #[must_use]
    pub fn builder(registry: &Arc<TypeRegistry>, name: &str) -> ServiceBuilder {
        ServiceBuilder {
            registry: registry.clone(),
            name: name.to_string(),
            implements: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    /// Every interface the object implements, inherited ones included
    #[must_use]
    pub fn interfaces(&self) -> &[TypeSig] {
        &self.interfaces
    }
}

impl Object for ServiceObject {
    fn type_name(&self) -> String {
        self.name.clone()
    }

    fn is_instance_of(&self, interface: &TypeSig) -> bool {
        self.registry.implements_interface(&self.interfaces, interface)
    }

    fn invoke(&self, call: Invocation<'_>) -> Result<Value> {
        let member = call.member();
        let Some(interface) = self
            .registry
            .find_compatible_interface(&self.interfaces, &member.interface)
        else {
            return Err(Error::MemberNotFound {
                owner: self.name.clone(),
                member: member.to_string(),
            });
        };

        let Some(handler) = self
            .handlers
            .get(&(interface.clone(), member.method.token))
        else {
            return Err(Error::MemberNotImplemented {
                owner: self.name.clone(),
                member: member.to_string(),
            });
        };

        call.check_arguments()?;
        handler(call)
    }
}

impl fmt::Debug for ServiceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceObject")
            .field("name", &self.name)
            .field("interfaces", &self.interfaces)
            .field("handler_count", &self.handlers.len())
            .finish()
    }
}

/// Builder for [`ServiceObject`].
pub struct ServiceBuilder {
    registry: Arc<TypeRegistry>,
    name: String,
    implements: Vec<TypeSig>,
    handlers: HashMap<(TypeSig, Token), MemberHandler>,
}

impl ServiceBuilder {
    /// Implement an interface (and, implicitly, every interface it extends).
    #[must_use]
    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.implements.push(interface);
        self
    }

    /// Set the handler of a member.
    ///
    /// ## Arguments
    /// * `member` - The member, addressed through its declaring interface
    /// * `handler` - Called with the invocation, returns the member's result
    #[must_use]
    pub fn on<F>(mut self, member: &MemberRef, handler: F) -> Self
    where
        F: Fn(Invocation<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        self.handlers.insert(
            (member.interface.clone(), member.method.token),
            Arc::new(handler),
        );
        self
    }

    /// Finish the object.
    ///
    /// # Errors
    /// Returns [`Error::TypeError`] if an implemented type is not a closed interface, and
    /// resolution errors for unknown types.
    pub fn build(self) -> Result<ObjectRef> {
        let mut interfaces = Vec::new();
        for root in &self.implements {
            if root.is_open() {
                return Err(type_error!(
                    "{} cannot implement the open type {}",
                    self.name,
                    self.registry.display(root)
                ));
            }
            if !self.registry.resolve(root)?.is_interface() {
                return Err(type_error!(
                    "{} cannot implement {}, it is not an interface",
                    self.name,
                    self.registry.display(root)
                ));
            }

            for interface in self.registry.interface_closure(root, MAX_INHERITANCE_DEPTH)? {
                if !interfaces.contains(&interface) {
                    interfaces.push(interface);
                }
            }
        }

        Ok(Arc::new(ServiceObject {
            registry: self.registry,
            name: self.name,
            interfaces,
            handlers: self.handlers,
        }))
    }
}
