//! Structural schema limits per storage engine.
//!
//! Every engine is checked on every run and every violation is collected;
//! the caller gets one aggregate report instead of the first failure.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{FindByError, FindByResult};
use crate::schema::{Column, ColumnType, EntitySchema, IndexKind};

/// Sentinel for "no limit" in the numeric limit fields.
pub const UNLIMITED: i64 = -1;

/// Target storage engine identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Engine {
    MongoDb,
    MySql,
    MariaDb,
    Oracle,
    SqlServer,
    PostgreSql,
    H2,
    Sqlite,
}

impl Engine {
    pub const ALL: [Engine; 8] = [
        Engine::MongoDb,
        Engine::MySql,
        Engine::MariaDb,
        Engine::Oracle,
        Engine::SqlServer,
        Engine::PostgreSql,
        Engine::H2,
        Engine::Sqlite,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::MongoDb => "MongoDB",
            Self::MySql => "MySQL",
            Self::MariaDb => "MariaDB",
            Self::Oracle => "Oracle",
            Self::SqlServer => "SQL Server",
            Self::PostgreSql => "PostgreSQL",
            Self::H2 => "H2",
            Self::Sqlite => "SQLite",
        }
    }
}

impl std::fmt::Display for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Byte-size rule for one column type: a fixed size, or a base size plus
/// the column's declared max length (capped, or uncapped for `varying`
/// types with no engine-side cap).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeLimit {
    Fixed(u64),
    Varying { base: u64, max: Option<u64> },
}

impl TypeLimit {
    /// The byte length this column contributes to a row or index.
    /// Variable-length columns must declare a max length, and it must fit
    /// under the engine's cap.
    fn column_length(self, column: &Column) -> Result<u64, String> {
        match self {
            Self::Fixed(bytes) => Ok(bytes),
            Self::Varying { base, max } => {
                let Some(declared) = column.max_length else {
                    return Err(format!(
                        "column '{}' needs a declared max length",
                        column.name
                    ));
                };
                let declared = u64::from(declared);
                if let Some(max) = max
                    && declared > max
                {
                    return Err(format!(
                        "column '{}' declares a max length of {declared}, at most {max} is allowed",
                        column.name
                    ));
                }
                Ok(base + declared)
            }
        }
    }
}

/// One engine's structural limits. Numeric fields use [`UNLIMITED`] for
/// "no limit"; `type_limits` is `None` for engines without per-type byte
/// sizes (which then skip row- and index-length checks).
#[derive(Debug, Clone)]
pub struct DialectLimits {
    pub max_row_length: i64,
    /// Falls back to `max_index_length` when not set.
    pub max_clustered_index_length: Option<i64>,
    pub max_index_length: i64,
    pub max_columns: i64,
    pub max_indexes: i64,
    pub max_columns_per_index: i64,
    pub max_identifier_length: i64,
    pub type_limits: Option<HashMap<ColumnType, TypeLimit>>,
}

impl DialectLimits {
    fn max_clustered_index_length(&self) -> i64 {
        self.max_clustered_index_length
            .unwrap_or(self.max_index_length)
    }

    /// Types without their own entry fall back to the byte-sequence rule.
    fn type_limit(limits: &HashMap<ColumnType, TypeLimit>, ty: ColumnType) -> Option<TypeLimit> {
        limits.get(&ty).or_else(|| limits.get(&ColumnType::Bytes)).copied()
    }

    /// All violations of this engine's limits by `schema`. Never stops at
    /// the first one.
    fn check(&self, schema: &EntitySchema) -> Vec<String> {
        let mut failures = Vec::new();
        let mut flag = |failures: &mut Vec<String>, message: String| {
            if !failures.contains(&message) {
                failures.push(message);
            }
        };

        let exceeded = |limit: i64, value: usize| limit != UNLIMITED && value as i64 > limit;

        if exceeded(self.max_columns, schema.columns().len()) {
            failures.push(format!(
                "expected at most {} columns, got {}",
                self.max_columns,
                schema.columns().len()
            ));
        }
        if exceeded(self.max_indexes, schema.indexes().len()) {
            failures.push(format!(
                "expected at most {} indexes, got {}",
                self.max_indexes,
                schema.indexes().len()
            ));
        }
        if self.max_columns_per_index != UNLIMITED {
            for index in schema.indexes() {
                if exceeded(self.max_columns_per_index, index.columns.len()) {
                    failures.push(format!(
                        "expected at most {} columns per index, got {} in '{}'",
                        self.max_columns_per_index,
                        index.columns.len(),
                        index.name
                    ));
                }
            }
        }
        if exceeded(self.max_identifier_length, schema.name().len()) {
            failures.push(format!(
                "the entity name is longer than allowed, expected at most {} and got {}",
                self.max_identifier_length,
                schema.name().len()
            ));
        }

        // without per-type byte sizes, row and index lengths cannot be computed
        let Some(type_limits) = &self.type_limits else {
            return failures;
        };

        if self.max_row_length != UNLIMITED {
            let row_length = self.length_of(type_limits, schema.columns(), &mut failures, &mut flag);
            if row_length > self.max_row_length as u64 {
                failures.push(format!(
                    "the total length of all columns ({row_length}) exceeded the maximum of {}",
                    self.max_row_length
                ));
            }
        }

        if self.max_index_length != UNLIMITED {
            for index in schema.indexes() {
                let columns: Vec<Column> = index
                    .column_names()
                    .filter_map(|name| schema.column(name).cloned())
                    .collect();
                let index_length = self.length_of(type_limits, &columns, &mut failures, &mut flag);

                let (limit, what) = match index.kind {
                    IndexKind::Primary => (self.max_clustered_index_length(), "a clustered index"),
                    _ => (self.max_index_length, "an index"),
                };
                if limit != UNLIMITED && index_length > limit as u64 {
                    failures.push(format!(
                        "the total length of all columns of {what} ({index_length}) exceeded the maximum of {limit}"
                    ));
                }
            }
        }

        failures
    }

    fn length_of(
        &self,
        type_limits: &HashMap<ColumnType, TypeLimit>,
        columns: &[Column],
        failures: &mut Vec<String>,
        flag: &mut impl FnMut(&mut Vec<String>, String),
    ) -> u64 {
        let mut total = 0;
        for column in columns {
            let Some(limit) = Self::type_limit(type_limits, column.ty) else {
                continue;
            };
            match limit.column_length(column) {
                Ok(length) => total += length,
                Err(message) => flag(failures, message),
            }
        }
        total
    }
}

/// The registered engines and their limits, populated once and read-only
/// afterwards.
#[derive(Debug, Clone)]
pub struct LimitsEnforcer {
    limits: Vec<(Engine, DialectLimits)>,
}

/// Violations of one engine's limits, nested inside the aggregate error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineViolations {
    pub engine: Engine,
    pub failures: Vec<String>,
}

impl Default for LimitsEnforcer {
    fn default() -> Self {
        Self {
            limits: Engine::ALL
                .into_iter()
                .map(|engine| (engine, limits_for(engine)))
                .collect(),
        }
    }
}

impl LimitsEnforcer {
    pub fn with_limits(limits: Vec<(Engine, DialectLimits)>) -> Self {
        Self { limits }
    }

    pub fn limits(&self, engine: Engine) -> Option<&DialectLimits> {
        self.limits
            .iter()
            .find(|(candidate, _)| *candidate == engine)
            .map(|(_, limits)| limits)
    }

    /// Check `schema` against every registered engine. All violations of
    /// all engines come back in one aggregate error.
    pub fn enforce(&self, schema: &EntitySchema) -> FindByResult<()> {
        let mut violations = Vec::new();
        for (engine, limits) in &self.limits {
            let failures = limits.check(schema);
            if !failures.is_empty() {
                violations.push(EngineViolations {
                    engine: *engine,
                    failures,
                });
            }
        }
        if violations.is_empty() {
            return Ok(());
        }
        Err(FindByError::DialectLimits {
            entity: schema.name().to_string(),
            violations,
        })
    }
}

fn limits_for(engine: Engine) -> DialectLimits {
    match engine {
        // collection namespace leaves 191 chars after the database name
        Engine::MongoDb => DialectLimits {
            max_row_length: UNLIMITED,
            max_clustered_index_length: None,
            max_index_length: UNLIMITED,
            max_columns: UNLIMITED,
            max_indexes: 64,
            max_columns_per_index: 32,
            max_identifier_length: 191,
            type_limits: None,
        },
        Engine::MySql => DialectLimits {
            max_row_length: 65535,
            max_clustered_index_length: None,
            // InnoDB limit for the default 16KB page size
            max_index_length: 3072,
            max_columns: 1017,
            max_indexes: 65,
            max_columns_per_index: 16,
            max_identifier_length: 64,
            type_limits: Some(HashMap::from([
                (ColumnType::Bool, TypeLimit::Fixed(1)),
                (ColumnType::Int8, TypeLimit::Fixed(1)),
                (ColumnType::Int16, TypeLimit::Fixed(2)),
                (ColumnType::Int32, TypeLimit::Fixed(4)),
                (ColumnType::Int64, TypeLimit::Fixed(8)),
                (ColumnType::Float32, TypeLimit::Fixed(8)),
                (ColumnType::Float64, TypeLimit::Fixed(8)),
                (ColumnType::Text, TypeLimit::Varying { base: 2, max: None }),
                (ColumnType::Bytes, TypeLimit::Varying { base: 2, max: None }),
            ])),
        },
        Engine::MariaDb => DialectLimits {
            max_columns_per_index: 32,
            ..limits_for(Engine::MySql)
        },
        Engine::Oracle => DialectLimits {
            max_row_length: 2_000_000,
            max_clustered_index_length: None,
            max_index_length: 6300,
            max_columns: 1000,
            max_indexes: UNLIMITED,
            max_columns_per_index: 32,
            max_identifier_length: 122,
            type_limits: Some(HashMap::from([
                (ColumnType::Bool, TypeLimit::Fixed(1)),
                // number(n) storage: ceil(digits / 2) + 1, plus a sign byte
                (ColumnType::Int8, TypeLimit::Fixed(3)),
                (ColumnType::Int16, TypeLimit::Fixed(5)),
                (ColumnType::Int32, TypeLimit::Fixed(7)),
                (ColumnType::Int64, TypeLimit::Fixed(12)),
                (ColumnType::Float32, TypeLimit::Fixed(4)),
                (ColumnType::Float64, TypeLimit::Fixed(8)),
                (ColumnType::Text, TypeLimit::Varying { base: 2, max: Some(4000) }),
                (ColumnType::Bytes, TypeLimit::Varying { base: 2, max: Some(2000) }),
            ])),
        },
        Engine::SqlServer => DialectLimits {
            // the soft limit is 8060 bytes, beyond that rows spill off-page
            max_row_length: UNLIMITED,
            max_clustered_index_length: Some(900),
            max_index_length: 1700,
            max_columns: 1024,
            max_indexes: 999,
            max_columns_per_index: 32,
            max_identifier_length: 128,
            type_limits: Some(HashMap::from([
                (ColumnType::Bool, TypeLimit::Fixed(1)),
                (ColumnType::Int8, TypeLimit::Fixed(2)),
                (ColumnType::Int16, TypeLimit::Fixed(2)),
                (ColumnType::Int32, TypeLimit::Fixed(4)),
                (ColumnType::Int64, TypeLimit::Fixed(8)),
                (ColumnType::Float32, TypeLimit::Fixed(4)),
                (ColumnType::Float64, TypeLimit::Fixed(8)),
                (ColumnType::Text, TypeLimit::Varying { base: 2, max: Some(8000) }),
                (ColumnType::Bytes, TypeLimit::Varying { base: 2, max: Some(8000) }),
            ])),
        },
        Engine::PostgreSql => DialectLimits {
            max_row_length: UNLIMITED,
            max_clustered_index_length: None,
            max_index_length: UNLIMITED,
            max_columns: 1600,
            max_indexes: UNLIMITED,
            max_columns_per_index: 32,
            max_identifier_length: UNLIMITED,
            type_limits: Some(HashMap::from([
                (ColumnType::Bool, TypeLimit::Fixed(1)),
                (ColumnType::Int8, TypeLimit::Fixed(2)),
                (ColumnType::Int16, TypeLimit::Fixed(2)),
                (ColumnType::Int32, TypeLimit::Fixed(4)),
                (ColumnType::Int64, TypeLimit::Fixed(8)),
                (ColumnType::Float32, TypeLimit::Fixed(4)),
                (ColumnType::Float64, TypeLimit::Fixed(8)),
                (ColumnType::Text, TypeLimit::Varying { base: 4, max: Some(10_485_760) }),
                (ColumnType::Bytes, TypeLimit::Varying { base: 4, max: None }),
            ])),
        },
        Engine::H2 => DialectLimits {
            max_row_length: UNLIMITED,
            max_clustered_index_length: None,
            max_index_length: UNLIMITED,
            max_columns: 16384,
            max_indexes: UNLIMITED,
            max_columns_per_index: UNLIMITED,
            max_identifier_length: 256,
            type_limits: None,
        },
        Engine::Sqlite => DialectLimits {
            max_row_length: UNLIMITED,
            max_clustered_index_length: None,
            max_index_length: UNLIMITED,
            max_columns: 2000,
            max_indexes: UNLIMITED,
            max_columns_per_index: 2000,
            max_identifier_length: UNLIMITED,
            type_limits: None,
        },
    }
}
