//! Type-erased reflection (§4.8-4.9): the facility the ECS and adjacent
//! subsystems build on for name-keyed type lookup, constructor/parent/
//! conversion/attribute graphs, and type-erased value containers.

pub mod any;
pub mod type_info;

pub use any::{Any, AnyRef};
pub use type_info::{
    reflect, reflect_as, registry, ConstructorInfo, ConversionInfo, Factory, ParentInfo, Registry, TypeInfo, Upcast,
};
