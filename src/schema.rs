//! Entity schema model: columns, indexes, and the per-entity memo cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

/// Semantic column type. These are schema-level tags; no runtime values
/// flow through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Text,
    Bytes,
    Uuid,
}

impl ColumnType {
    /// Whether a parameter of this type can bind against a column of `target`.
    /// Exact matches always pass; integers may widen.
    pub fn assignable_to(self, target: Self) -> bool {
        if self == target {
            return true;
        }
        matches!(
            (self, target),
            (Self::Int8, Self::Int16 | Self::Int32 | Self::Int64)
                | (Self::Int16, Self::Int32 | Self::Int64)
                | (Self::Int32, Self::Int64)
                | (Self::Float32, Self::Float64)
        )
    }

    pub fn is_integer(self) -> bool {
        matches!(self, Self::Int8 | Self::Int16 | Self::Int32 | Self::Int64)
    }

    pub fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }

    /// Types with a meaningful ordering, usable with comparison keywords.
    pub fn is_orderable(self) -> bool {
        self.is_integer() || self.is_float() || self == Self::Text
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Bool => "bool",
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::Int64 => "int64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Text => "text",
            Self::Bytes => "bytes",
            Self::Uuid => "uuid",
        };
        write!(f, "{name}")
    }
}

/// A single entity column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub ty: ColumnType,
    /// Declared max length for variable-length types, if any.
    #[serde(default)]
    pub max_length: Option<u32>,
}

impl Column {
    pub fn new(name: impl Into<String>, ty: ColumnType) -> Self {
        Self {
            name: name.into(),
            ty,
            max_length: None,
        }
    }

    pub fn with_max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }
}

/// Sort direction, shared by index columns and order-by factors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// The clustered/primary index over the key columns.
    Primary,
    Unique,
    Normal,
}

/// One column of an index with its direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexColumn {
    pub name: String,
    pub direction: OrderDirection,
}

impl IndexColumn {
    pub fn asc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Ascending,
        }
    }

    pub fn desc(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            direction: OrderDirection::Descending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub columns: Vec<IndexColumn>,
    pub kind: IndexKind,
}

impl Index {
    pub fn unique(&self) -> bool {
        matches!(self.kind, IndexKind::Primary | IndexKind::Unique)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }
}

/// Structural description of a stored record type. Column order is
/// insertion order and is significant for positional operations (insert).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySchema {
    name: String,
    columns: Vec<Column>,
    keys: Vec<String>,
    indexes: Vec<Index>,
}

impl EntitySchema {
    /// Build a schema, checking the structural invariants: key columns and
    /// index columns must all name declared columns.
    pub fn new(
        name: impl Into<String>,
        columns: Vec<Column>,
        keys: Vec<String>,
        indexes: Vec<Index>,
    ) -> Result<Self, String> {
        let name = name.into();
        let known = |candidate: &str| columns.iter().any(|c| c.name == candidate);

        for key in &keys {
            if !known(key) {
                return Err(format!("key column '{key}' is not a column of '{name}'"));
            }
        }
        for index in &indexes {
            for column in index.column_names() {
                if !known(column) {
                    return Err(format!(
                        "index '{}' references unknown column '{column}' of '{name}'",
                        index.name
                    ));
                }
            }
        }

        Ok(Self {
            name,
            columns,
            keys,
            indexes,
        })
    }

    /// Storage name (table / collection).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn indexes(&self) -> &[Index] {
        &self.indexes
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names, the matcher's vocabulary.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn key_columns(&self) -> Vec<&Column> {
        self.keys
            .iter()
            .filter_map(|key| self.column(key))
            .collect()
    }

    pub fn non_key_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| !self.keys.contains(&c.name))
            .collect()
    }
}

/// Memo cache for derived schemas, keyed by entity identity.
///
/// Derivation is a pure function of the schema provider's input, so the
/// first stored value wins. Reads are lock-light and safe to share across
/// concurrent derivations.
#[derive(Debug, Default, Clone)]
pub struct SchemaCache {
    entries: Arc<RwLock<HashMap<String, Arc<EntitySchema>>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity: &str) -> Option<Arc<EntitySchema>> {
        self.entries.read().ok()?.get(entity).cloned()
    }

    /// Return the cached schema for `entity`, deriving and storing it on
    /// first use.
    pub fn get_or_derive<F>(&self, entity: &str, derive: F) -> Result<Arc<EntitySchema>, String>
    where
        F: FnOnce() -> Result<EntitySchema, String>,
    {
        if let Some(found) = self.get(entity) {
            return Ok(found);
        }
        let derived = Arc::new(derive()?);
        let mut entries = self
            .entries
            .write()
            .map_err(|_| "schema cache poisoned".to_string())?;
        Ok(entries
            .entry(entity.to_string())
            .or_insert(derived)
            .clone())
    }
}
