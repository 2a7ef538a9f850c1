//! Type definitions for declarative table definitions

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// A resolved, inheritance-free schema keyed by final table name
pub type Schema = IndexMap<String, Table>;

/// One raw table definition as authored, before inheritance is resolved.
///
/// Map values are optional: an explicit `null` is a tombstone that removes
/// an entry inherited from an ancestor fragment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableFragment {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extend: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    #[serde(default, deserialize_with = "null_as_default", skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: IndexMap<String, Option<ColumnDef>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub relations: IndexMap<String, Option<RelationDef>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub indexes: IndexMap<String, Option<IndexDef>>,
}

impl TableFragment {
    /// Create an empty fragment with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Key identifying this fragment inside its inheritance group
    pub fn key(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// Final table name once resolved
    pub fn final_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    /// Drop inheritance fields and tombstones, producing a concrete table
    pub fn into_table(self) -> Table {
        Table {
            name: self.name,
            primary_key: self.primary_key,
            columns: self
                .columns
                .into_iter()
                .filter_map(|(name, column)| column.map(|c| (name, c)))
                .collect(),
            relations: self
                .relations
                .into_iter()
                .filter_map(|(name, relation)| relation.map(|r| (name, r)))
                .collect(),
            indexes: self
                .indexes
                .into_iter()
                .filter_map(|(name, index)| index.map(|i| (name, i)))
                .collect(),
        }
    }
}

/// A concrete table definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub name: String,
    #[serde(default)]
    pub primary_key: Vec<String>,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnDef>,
    #[serde(default)]
    pub relations: IndexMap<String, RelationDef>,
    #[serde(default)]
    pub indexes: IndexMap<String, IndexDef>,
}

impl Table {
    /// Create a new table with the given name
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Add a column to the table
    pub fn add_column(&mut self, name: &str, column: ColumnDef) {
        self.columns.insert(name.to_string(), column);
    }

    /// Add a relation to the table
    pub fn add_relation(&mut self, name: &str, relation: RelationDef) {
        self.relations.insert(name.to_string(), relation);
    }

    /// Add an index to the table
    pub fn add_index(&mut self, name: &str, index: IndexDef) {
        self.indexes.insert(name.to_string(), index);
    }
}

/// A column definition. The type may embed a size, e.g. `STRING(45) UNSIGNED`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnDef {
    #[serde(rename = "type", default)]
    pub column_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
    #[serde(default, deserialize_with = "scalar_string", skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl ColumnDef {
    /// Create a new column with the given type
    pub fn new(column_type: &str) -> Self {
        Self {
            column_type: column_type.to_string(),
            ..Default::default()
        }
    }

    /// Set whether the column is not null
    pub fn not_null(mut self, not_null: bool) -> Self {
        self.not_null = Some(not_null);
        self
    }

    /// Set a default value for the column
    pub fn with_default(mut self, default: &str) -> Self {
        self.default = Some(default.to_string());
        self
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null.unwrap_or(false)
    }

    pub fn has_default(&self) -> bool {
        self.default.as_deref().is_some_and(|d| !d.is_empty())
    }
}

/// A foreign key. Its identity is `(foreignKey, referenceKey, referenceTable)`,
/// never the name it is declared under.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationDef {
    #[serde(default)]
    pub foreign_key: String,
    #[serde(default)]
    pub reference_key: String,
    #[serde(default)]
    pub reference_table: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<String>,
}

impl RelationDef {
    pub fn new(foreign_key: &str, reference_key: &str, reference_table: &str) -> Self {
        Self {
            foreign_key: foreign_key.to_string(),
            reference_key: reference_key.to_string(),
            reference_table: reference_table.to_string(),
            ..Default::default()
        }
    }
}

pub const UNIQUE_INDEX: &str = "unique index";

/// Index types accepted by the validator
pub const INDEX_TYPES: [&str; 4] = [UNIQUE_INDEX, "index", "fulltext index", "spatial index"];

/// An index definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexDef {
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
    #[serde(rename = "type", default)]
    pub index_type: String,
}

impl IndexDef {
    pub fn new(columns: &[&str], index_type: &str) -> Self {
        Self {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            index_type: index_type.to_string(),
        }
    }

    pub fn is_unique(&self) -> bool {
        self.index_type.trim() == UNIQUE_INDEX
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

/// Accept any scalar (`default: 0`, `default: true`) and keep it as text
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|scalar| match scalar {
        Scalar::Bool(b) => b.to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) => f.to_string(),
        Scalar::Str(s) => s,
    }))
}
