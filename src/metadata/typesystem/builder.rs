//! High-level builders for interface and class definitions.
//!
//! [`InterfaceBuilder`] creates interfaces with methods, generic methods, properties, indexers
//! and inherited interfaces. [`ClassBuilder`] creates the classes, abstract classes and value
//! types that appear as generic arguments, constraints and real implementations. Both validate
//! their input against a [`TypeRegistry`] and register the finished definition in it.

use std::sync::Arc;

use crate::{
    metadata::{
        token::Token,
        typesystem::{
            Constant, GenericParam, MemberKind, MethodDef, ParamAttributes, ParamDef, TypeDef,
            TypeKind, TypeRc, TypeRegistry, TypeSig,
        },
    },
    Result,
};

/// Builder for a single method of an interface.
///
/// Handed to the closure of [`InterfaceBuilder::method`].
///
/// # Examples
///
/// ```rust
/// use lazyproxy::metadata::typesystem::{Constant, InterfaceBuilder, TypeRegistry, TypeSig};
///
/// let registry = TypeRegistry::new();
/// let parser = InterfaceBuilder::new("IParser")
///     .method("TryParse", |m| {
///         m.returns(TypeSig::Boolean)
///             .param("text", TypeSig::String)
///             .out_param("value", TypeSig::I4)
///     })
///     .method("Format", |m| {
///         m.returns(TypeSig::String)
///             .optional_param("format", TypeSig::String, Constant::String("G".into()))
///     })
///     .build(&registry)?;
///
/// assert_eq!(parser.methods.len(), 2);
/// # Ok::<(), lazyproxy::Error>(())
/// ```
pub struct MethodBuilder {
    name: String,
    kind: MemberKind,
    ret: TypeSig,
    params: Vec<ParamDef>,
    generic_params: Vec<GenericParam>,
}

impl MethodBuilder {
    fn new(name: &str, kind: MemberKind) -> Self {
        MethodBuilder {
            name: name.to_string(),
            kind,
            ret: TypeSig::Void,
            params: Vec::new(),
            generic_params: Vec::new(),
        }
    }

    /// Set the return type (defaults to `Void`)
    #[must_use]
    pub fn returns(mut self, ret: TypeSig) -> Self {
        self.ret = ret;
        self
    }

    /// Add a by-value parameter
    #[must_use]
    pub fn param(self, name: &str, ty: TypeSig) -> Self {
        self.push_param(name, ty, ParamAttributes::empty(), false, None)
    }

    /// Add a `ref` parameter
    #[must_use]
    pub fn ref_param(self, name: &str, ty: TypeSig) -> Self {
        self.push_param(name, ty, ParamAttributes::empty(), true, None)
    }

    /// Add an `out` parameter
    #[must_use]
    pub fn out_param(self, name: &str, ty: TypeSig) -> Self {
        self.push_param(name, ty, ParamAttributes::OUT, true, None)
    }

    /// Add an optional by-value parameter with a default value
    #[must_use]
    pub fn optional_param(self, name: &str, ty: TypeSig, default: Constant) -> Self {
        self.push_param(
            name,
            ty,
            ParamAttributes::OPTIONAL | ParamAttributes::HAS_DEFAULT,
            false,
            Some(default),
        )
    }

    /// Add a generic method parameter; reference it as [`TypeSig::MethodParam`]
    #[must_use]
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        self.generic_params.push(param);
        self
    }

    fn push_param(
        mut self,
        name: &str,
        ty: TypeSig,
        flags: ParamAttributes,
        by_ref: bool,
        default: Option<Constant>,
    ) -> Self {
        self.params.push(ParamDef {
            sequence: self.params.len() as u32 + 1,
            name: name.to_string(),
            flags,
            by_ref,
            ty,
            default,
        });
        self
    }

    fn validate(&self, registry: &TypeRegistry, type_arity: usize) -> Result<()> {
        if self.name.is_empty() {
            return Err(type_error!("Method name cannot be empty"));
        }

        let method_arity = Some(self.generic_params.len());
        validate_generic_params(registry, &self.generic_params, type_arity, method_arity)?;
        validate_sig(registry, &self.ret, type_arity, method_arity)?;

        let mut seen_optional = false;
        for param in &self.params {
            validate_sig(registry, &param.ty, type_arity, method_arity)?;
            if param.ty == TypeSig::Void {
                return Err(type_error!(
                    "Parameter {} of {} cannot be Void",
                    param.name,
                    self.name
                ));
            }

            if param.flags.contains(ParamAttributes::OPTIONAL) {
                seen_optional = true;
            } else if seen_optional && !param.is_optional() {
                return Err(type_error!(
                    "Required parameter {} of {} follows an optional parameter",
                    param.name,
                    self.name
                ));
            }
        }

        Ok(())
    }

    fn into_def(self, token: Token, declaring: Token) -> MethodDef {
        MethodDef {
            token,
            name: self.name,
            kind: self.kind,
            declaring,
            params: self.params,
            ret: self.ret,
            generic_params: self.generic_params,
        }
    }
}

/// High-level builder for interface definitions.
///
/// # Examples
///
/// ## Simple Interface
///
/// ```rust
/// use lazyproxy::metadata::typesystem::{InterfaceBuilder, TypeRegistry, TypeSig};
///
/// let registry = TypeRegistry::new();
/// let calculator = InterfaceBuilder::new("ICalculator")
///     .method_signature("Add", TypeSig::I4, vec![("a", TypeSig::I4), ("b", TypeSig::I4)])
///     .build(&registry)?;
/// # Ok::<(), lazyproxy::Error>(())
/// ```
///
/// ## Generic Interface with Inheritance
///
/// ```rust
/// use lazyproxy::metadata::typesystem::{GenericParam, InterfaceBuilder, TypeRegistry, TypeSig};
///
/// let registry = TypeRegistry::new();
/// let source = InterfaceBuilder::new("ISource")
///     .generic_param(GenericParam::new(0, "T").covariant())
///     .simple_method("Next", TypeSig::TypeParam(0))
///     .build(&registry)?;
///
/// let store = InterfaceBuilder::new("IStore")
///     .generic_param(GenericParam::new(0, "T").reference_type())
///     .extends(TypeSig::generic(source.token, vec![TypeSig::TypeParam(0)]))
///     .indexer(TypeSig::I4, TypeSig::TypeParam(0), true)
///     .build(&registry)?;
///
/// assert!(store.method("get_Item").is_some());
/// assert!(store.method("set_Item").is_some());
/// # Ok::<(), lazyproxy::Error>(())
/// ```
pub struct InterfaceBuilder {
    /// Interface name
    name: String,

    /// Namespace (optional)
    namespace: Option<String>,

    /// Generic parameters
    generic_params: Vec<GenericParam>,

    /// Inherited interfaces
    extends: Vec<TypeSig>,

    /// Methods and accessors, in declaration order
    methods: Vec<MethodBuilder>,
}

impl InterfaceBuilder {
    /// Create a new interface builder with the given name.
    ///
    /// # Arguments
    ///
    /// * `name` - Interface name
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            namespace: None,
            generic_params: Vec::new(),
            extends: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Set the namespace for this interface.
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Add a generic parameter; reference it as [`TypeSig::TypeParam`]
    #[must_use]
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        self.generic_params.push(param);
        self
    }

    /// Inherit from another interface.
    ///
    /// # Arguments
    ///
    /// * `interface` - The parent interface, possibly instantiated with this interface's
    ///   generic parameters
    #[must_use]
    pub fn extends(mut self, interface: TypeSig) -> Self {
        self.extends.push(interface);
        self
    }

    /// Add a method, configured through a [`MethodBuilder`].
    #[must_use]
    pub fn method<F>(mut self, name: &str, configure: F) -> Self
    where
        F: FnOnce(MethodBuilder) -> MethodBuilder,
    {
        self.methods
            .push(configure(MethodBuilder::new(name, MemberKind::Method)));
        self
    }

    /// Add a method with by-value parameters.
    ///
    /// # Arguments
    ///
    /// * `name` - Method name
    /// * `return_type` - Return type
    /// * `parameters` - Parameter names and types
    #[must_use]
    pub fn method_signature(
        self,
        name: &str,
        return_type: TypeSig,
        parameters: Vec<(&str, TypeSig)>,
    ) -> Self {
        self.method(name, |m| {
            parameters
                .into_iter()
                .fold(m.returns(return_type), |m, (name, ty)| m.param(name, ty))
        })
    }

    /// Add a method without parameters.
    #[must_use]
    pub fn simple_method(self, name: &str, return_type: TypeSig) -> Self {
        self.method_signature(name, return_type, vec![])
    }

    /// Add a property, expressed as `get_{name}` and/or `set_{name}` accessors.
    ///
    /// # Arguments
    ///
    /// * `name` - Property name
    /// * `property_type` - Property type
    /// * `has_getter` - Whether the property has a getter
    /// * `has_setter` - Whether the property has a setter
    #[must_use]
    pub fn property(
        mut self,
        name: &str,
        property_type: TypeSig,
        has_getter: bool,
        has_setter: bool,
    ) -> Self {
        if has_getter {
            self.methods.push(
                MethodBuilder::new(&format!("get_{name}"), MemberKind::PropertyGetter)
                    .returns(property_type.clone()),
            );
        }
        if has_setter {
            self.methods.push(
                MethodBuilder::new(&format!("set_{name}"), MemberKind::PropertySetter)
                    .param("value", property_type),
            );
        }
        self
    }

    /// Add a read-only property.
    #[must_use]
    pub fn readonly_property(self, name: &str, property_type: TypeSig) -> Self {
        self.property(name, property_type, true, false)
    }

    /// Add a read-write property.
    #[must_use]
    pub fn readwrite_property(self, name: &str, property_type: TypeSig) -> Self {
        self.property(name, property_type, true, true)
    }

    /// Add an indexer, expressed as `get_Item` and optionally `set_Item`.
    ///
    /// # Arguments
    ///
    /// * `index_type` - Type of the index argument
    /// * `item_type` - Type of the indexed items
    /// * `has_setter` - Whether items can be assigned
    #[must_use]
    pub fn indexer(mut self, index_type: TypeSig, item_type: TypeSig, has_setter: bool) -> Self {
        self.methods.push(
            MethodBuilder::new("get_Item", MemberKind::IndexerGetter)
                .returns(item_type.clone())
                .param("index", index_type.clone()),
        );
        if has_setter {
            self.methods.push(
                MethodBuilder::new("set_Item", MemberKind::IndexerSetter)
                    .param("index", index_type)
                    .param("value", item_type),
            );
        }
        self
    }

    /// Validate the definition and register it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeError`] for an empty name, a parent that is not an
    /// interface, generic parameters out of range or a duplicate full name, and
    /// [`crate::Error::TypeNotFound`] for references to unknown types.
    pub fn build(self, registry: &TypeRegistry) -> Result<TypeRc> {
        if self.name.is_empty() {
            return Err(type_error!("Interface name cannot be empty"));
        }

        let arity = self.generic_params.len();
        validate_generic_params(registry, &self.generic_params, arity, None)?;

        for parent in &self.extends {
            validate_sig(registry, parent, arity, None)?;
            let parent_def = registry.resolve(parent)?;
            if !parent_def.is_interface() {
                return Err(type_error!(
                    "Interface {} cannot extend {} {}",
                    self.name,
                    parent_def.kind,
                    parent_def.fullname()
                ));
            }
        }

        for method in &self.methods {
            method.validate(registry, arity)?;
        }

        let token = registry.next_token(Token::TYPE_DEF);
        let methods = self
            .methods
            .into_iter()
            .map(|method| Arc::new(method.into_def(registry.next_token(Token::METHOD_DEF), token)))
            .collect();

        registry.insert(TypeDef {
            token,
            namespace: self.namespace.unwrap_or_default(),
            name: self.name,
            kind: TypeKind::Interface,
            base: None,
            interfaces: self.extends,
            generic_params: self.generic_params,
            methods,
            default_constructor: false,
        })
    }
}

impl Default for InterfaceBuilder {
    fn default() -> Self {
        Self::new("IDefault")
    }
}

/// High-level builder for classes, abstract classes and value types.
///
/// Classes and value types get a parameterless constructor unless
/// [`ClassBuilder::without_default_constructor`] is used; abstract classes never have one.
///
/// # Examples
///
/// ```rust
/// use lazyproxy::metadata::typesystem::{ClassBuilder, InterfaceBuilder, TypeRegistry, TypeSig};
///
/// let registry = TypeRegistry::new();
/// let marker = InterfaceBuilder::new("IMarker").build(&registry)?;
/// let base = ClassBuilder::new("EntityBase").abstract_class().build(&registry)?;
/// let entity = ClassBuilder::new("Order")
///     .namespace("Shop")
///     .extends(base.sig())
///     .implements(marker.sig())
///     .build(&registry)?;
///
/// assert!(registry.is_assignable(&entity.sig(), &marker.sig()));
/// assert!(registry.is_assignable(&entity.sig(), &base.sig()));
/// # Ok::<(), lazyproxy::Error>(())
/// ```
pub struct ClassBuilder {
    name: String,
    namespace: Option<String>,
    kind: TypeKind,
    base: Option<TypeSig>,
    interfaces: Vec<TypeSig>,
    generic_params: Vec<GenericParam>,
    default_constructor: bool,
}

impl ClassBuilder {
    /// Create a new builder for a concrete class.
    #[must_use]
    pub fn new(name: &str) -> Self {
        ClassBuilder {
            name: name.to_string(),
            namespace: None,
            kind: TypeKind::Class,
            base: None,
            interfaces: Vec::new(),
            generic_params: Vec::new(),
            default_constructor: true,
        }
    }

    /// Set the namespace.
    #[must_use]
    pub fn namespace(mut self, namespace: &str) -> Self {
        self.namespace = Some(namespace.to_string());
        self
    }

    /// Make this an abstract class.
    #[must_use]
    pub fn abstract_class(mut self) -> Self {
        self.kind = TypeKind::AbstractClass;
        self
    }

    /// Make this a value type.
    #[must_use]
    pub fn value_type(mut self) -> Self {
        self.kind = TypeKind::ValueType;
        self
    }

    /// Set the base class.
    #[must_use]
    pub fn extends(mut self, base: TypeSig) -> Self {
        self.base = Some(base);
        self
    }

    /// Add an implemented interface.
    #[must_use]
    pub fn implements(mut self, interface: TypeSig) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Add a generic parameter.
    #[must_use]
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        self.generic_params.push(param);
        self
    }

    /// Remove the public parameterless constructor.
    #[must_use]
    pub fn without_default_constructor(mut self) -> Self {
        self.default_constructor = false;
        self
    }

    /// Validate the definition and register it.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::TypeError`] for an empty name, a base type that is not a class
    /// (or a base type on a value type), an implemented type that is not an interface or a
    /// duplicate full name, and [`crate::Error::TypeNotFound`] for references to unknown types.
    pub fn build(self, registry: &TypeRegistry) -> Result<TypeRc> {
        if self.name.is_empty() {
            return Err(type_error!("Class name cannot be empty"));
        }

        let arity = self.generic_params.len();
        validate_generic_params(registry, &self.generic_params, arity, None)?;

        if let Some(base) = &self.base {
            if self.kind == TypeKind::ValueType {
                return Err(type_error!("Value type {} cannot have a base class", self.name));
            }

            validate_sig(registry, base, arity, None)?;
            let base_def = registry.resolve(base)?;
            if !matches!(base_def.kind, TypeKind::Class | TypeKind::AbstractClass) {
                return Err(type_error!(
                    "{} cannot derive from {} {}",
                    self.name,
                    base_def.kind,
                    base_def.fullname()
                ));
            }
        }

        for interface in &self.interfaces {
            validate_sig(registry, interface, arity, None)?;
            let interface_def = registry.resolve(interface)?;
            if !interface_def.is_interface() {
                return Err(type_error!(
                    "{} cannot implement {} {}",
                    self.name,
                    interface_def.kind,
                    interface_def.fullname()
                ));
            }
        }

        registry.insert(TypeDef {
            token: registry.next_token(Token::TYPE_DEF),
            namespace: self.namespace.unwrap_or_default(),
            name: self.name,
            kind: self.kind,
            base: self.base,
            interfaces: self.interfaces,
            generic_params: self.generic_params,
            methods: Vec::new(),
            default_constructor: self.default_constructor && self.kind != TypeKind::AbstractClass,
        })
    }
}

fn validate_generic_params(
    registry: &TypeRegistry,
    params: &[GenericParam],
    type_arity: usize,
    method_arity: Option<usize>,
) -> Result<()> {
    for (index, param) in params.iter().enumerate() {
        if param.number as usize != index {
            return Err(type_error!(
                "Generic parameter {} is numbered {}, expected {}",
                param.name,
                param.number,
                index
            ));
        }

        for constraint in &param.constraints {
            validate_sig(registry, constraint, type_arity, method_arity)?;
        }
    }

    Ok(())
}

fn validate_sig(
    registry: &TypeRegistry,
    sig: &TypeSig,
    type_arity: usize,
    method_arity: Option<usize>,
) -> Result<()> {
    match sig {
        TypeSig::TypeParam(index) if *index as usize >= type_arity => Err(type_error!(
            "Generic parameter !{} is out of range, the type declares {}",
            index,
            type_arity
        )),
        TypeSig::MethodParam(index) => match method_arity {
            Some(arity) if (*index as usize) < arity => Ok(()),
            _ => Err(type_error!("Method generic parameter !!{} is out of range", index)),
        },
        TypeSig::Type { token, args } => {
            let def = registry
                .get(token)
                .ok_or(crate::Error::TypeNotFound(*token))?;
            if def.generic_params.len() != args.len() {
                return Err(crate::Error::GenericArity {
                    name: def.fullname(),
                    expected: def.generic_params.len(),
                    actual: args.len(),
                });
            }

            for arg in args {
                validate_sig(registry, arg, type_arity, method_arity)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_empty_name_fails() {
        let registry = TypeRegistry::new();
        let result = InterfaceBuilder::new("").build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));

        let result = ClassBuilder::new("").build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));
    }

    #[test]
    fn test_property_and_indexer_accessors() {
        let registry = TypeRegistry::new();
        let def = InterfaceBuilder::new("IBag")
            .readwrite_property("Name", TypeSig::String)
            .readonly_property("Count", TypeSig::I4)
            .indexer(TypeSig::I4, TypeSig::String, true)
            .build(&registry)
            .unwrap();

        let names: Vec<_> = def.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["get_Name", "set_Name", "get_Count", "get_Item", "set_Item"]
        );

        let setter = def.method("set_Item").unwrap();
        assert_eq!(setter.kind, MemberKind::IndexerSetter);
        assert_eq!(setter.params.len(), 2);
        assert_eq!(setter.declaring, def.token);
        assert_eq!(setter.token.table(), Token::METHOD_DEF);
    }

    #[test]
    fn test_extends_requires_interface() {
        let registry = TypeRegistry::new();
        let class = ClassBuilder::new("Impl").build(&registry).unwrap();

        let result = InterfaceBuilder::new("IBroken")
            .extends(class.sig())
            .build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));
    }

    #[test]
    fn test_unknown_token_fails() {
        let registry = TypeRegistry::new();
        let missing = Token::from_parts(Token::TYPE_DEF, 0x4242);

        let result = InterfaceBuilder::new("IMissing")
            .simple_method("Get", TypeSig::named(missing))
            .build(&registry);
        assert!(matches!(result, Err(Error::TypeNotFound(token)) if token == missing));
    }

    #[test]
    fn test_generic_param_out_of_range() {
        let registry = TypeRegistry::new();
        let result = InterfaceBuilder::new("IOpen")
            .simple_method("Get", TypeSig::TypeParam(0))
            .build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));

        let result = InterfaceBuilder::new("IOpenMethod")
            .method("Get", |m| {
                m.returns(TypeSig::MethodParam(1))
                    .generic_param(GenericParam::new(0, "T"))
            })
            .build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));
    }

    #[test]
    fn test_required_after_optional_fails() {
        let registry = TypeRegistry::new();
        let result = InterfaceBuilder::new("IOrder")
            .method("Call", |m| {
                m.optional_param("a", TypeSig::I4, Constant::I4(1))
                    .param("b", TypeSig::I4)
            })
            .build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));
    }

    #[test]
    fn test_duplicate_fullname_fails() {
        let registry = TypeRegistry::new();
        InterfaceBuilder::new("ISame").namespace("A").build(&registry).unwrap();
        let result = InterfaceBuilder::new("ISame").namespace("A").build(&registry);
        assert!(matches!(result, Err(Error::TypeError(_))));

        assert!(InterfaceBuilder::new("ISame").namespace("B").build(&registry).is_ok());
    }

    #[test]
    fn test_class_kinds() {
        let registry = TypeRegistry::new();
        let abstract_class = ClassBuilder::new("Base").abstract_class().build(&registry).unwrap();
        assert_eq!(abstract_class.kind, TypeKind::AbstractClass);
        assert!(!abstract_class.default_constructor);

        let value = ClassBuilder::new("Point").value_type().build(&registry).unwrap();
        assert!(registry.is_value_type(&value.sig()));

        let result = ClassBuilder::new("Derived")
            .value_type()
            .extends(abstract_class.sig())
            .build(&registry);
        assert!(result.is_err());
    }
}
