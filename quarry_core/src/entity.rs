//! Entity metadata: property descriptors and the pre-built registry that
//! query derivation validates property references against.

use crate::value::ValueType;
use crate::Entity;

/// Metadata for one persistent property of an entity.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Property {
    name: &'static str,
    ty: ValueType,
}

impl Property {
    /// Creates a property descriptor. `name` is the uncapitalized
    /// camel-case form used in query text (e.g. `emailAddress`).
    pub const fn new(name: &'static str, ty: ValueType) -> Self {
        Property { name, ty }
    }

    /// The property name as it appears in query text.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The property's value type.
    pub fn ty(&self) -> ValueType {
        self.ty
    }
}

/// The property registry of a mapped entity.
///
/// Built once per DAO from an [`Entity`] implementation and consulted by
/// the query-derivation engine; there is no per-call introspection.
#[derive(Clone, Debug)]
pub struct EntityMeta {
    name: &'static str,
    id: &'static str,
    properties: &'static [Property],
}

impl EntityMeta {
    /// Builds the registry for entity type `T`.
    pub fn of<T: Entity>() -> Self {
        EntityMeta {
            name: T::NAME,
            id: T::ID,
            properties: T::PROPERTIES,
        }
    }

    /// The entity name used in query text.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the identifier property.
    pub fn id_property(&self) -> &'static str {
        self.id
    }

    /// All property descriptors.
    pub fn properties(&self) -> &'static [Property] {
        self.properties
    }

    /// Tests whether the entity has a property of the given name.
    pub fn has_property(&self, name: &str) -> bool {
        self.property(name).is_some()
    }

    /// Looks up a property descriptor by name.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }
}
