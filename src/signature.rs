//! Operation signatures as supplied by the host's introspector.

use serde::{Deserialize, Serialize};

use crate::schema::ColumnType;

/// The type of one operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamType {
    Scalar(ColumnType),
    /// The entity type itself.
    Entity,
    /// A collection of entities.
    EntityCollection,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub ty: ParamType,
}

impl Parameter {
    pub fn scalar(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Scalar(ty),
        }
    }

    pub fn entity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::Entity,
        }
    }

    pub fn entity_collection(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: ParamType::EntityCollection,
        }
    }
}

/// What an operation declares it returns, unwrapped from any async wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReturnKind {
    Void,
    Entity,
    EntityCollection,
    Scalar(ColumnType),
    Boolean,
}

impl ReturnKind {
    /// Entity or a collection of entities.
    pub fn is_any_self(self) -> bool {
        matches!(self, Self::Entity | Self::EntityCollection)
    }

    /// A whole-number scalar, usable as an affected-row count.
    pub fn is_count(self) -> bool {
        matches!(self, Self::Scalar(ty) if ty.is_integer())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnDescriptor {
    pub kind: ReturnKind,
    /// Whether the declared type was wrapped in the host's async future type.
    #[serde(default)]
    pub async_wrapped: bool,
}

impl ReturnDescriptor {
    pub fn sync(kind: ReturnKind) -> Self {
        Self {
            kind,
            async_wrapped: false,
        }
    }

    pub fn asynchronous(kind: ReturnKind) -> Self {
        Self {
            kind,
            async_wrapped: true,
        }
    }
}

/// One repository operation: its ordered parameters and return descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSignature {
    pub params: Vec<Parameter>,
    pub returns: ReturnDescriptor,
}

impl OperationSignature {
    pub fn new(params: Vec<Parameter>, returns: ReturnDescriptor) -> Self {
        Self { params, returns }
    }

    /// The sole parameter, when it is the entity or an entity collection.
    pub fn sole_self_param(&self) -> Option<&Parameter> {
        match self.params.as_slice() {
            [only] if matches!(only.ty, ParamType::Entity | ParamType::EntityCollection) => {
                Some(only)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sole_self_param() {
        let sig = OperationSignature::new(
            vec![Parameter::entity("user")],
            ReturnDescriptor::sync(ReturnKind::Void),
        );
        assert_eq!(sig.sole_self_param().unwrap().name, "user");

        let two = OperationSignature::new(
            vec![
                Parameter::entity("user"),
                Parameter::scalar("id", ColumnType::Int64),
            ],
            ReturnDescriptor::sync(ReturnKind::Void),
        );
        assert!(two.sole_self_param().is_none());
    }

    #[test]
    fn test_count_return() {
        assert!(ReturnKind::Scalar(ColumnType::Int32).is_count());
        assert!(!ReturnKind::Scalar(ColumnType::Text).is_count());
        assert!(!ReturnKind::Boolean.is_count());
    }
}
