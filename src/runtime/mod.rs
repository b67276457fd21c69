//! Objects and values at run time.
//!
//! The type model in [`crate::metadata::typesystem`] describes interfaces; this module is what
//! implements them. Every object, real service or lazy proxy alike, implements the [`Object`]
//! trait and is called through [`Invocation`]s that address a member by its declaring
//! interface. The uniform protocol is what lets a proxy forward any call without knowing the
//! interface at compile time.

mod object;
mod value;

pub use object::{
    Invocation, MemberHandler, Object, ObjectExt, ObjectRef, ServiceBuilder, ServiceObject,
};
pub use value::Value;
