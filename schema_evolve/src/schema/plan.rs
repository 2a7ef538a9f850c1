//! Migration plan
//!
//! The bidirectional result of comparing two schemas. `schemaA`/`indexA`
//! describe the old → new direction, `schemaB`/`indexB` the new → old one.
//! Both halves are filled by independent comparisons and never merged.

use indexmap::IndexMap;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Which half of the plan a comparison writes into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Old schema → new schema
    Up,
    /// New schema → old schema
    Down,
}

/// Change of base type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypeChange {
    pub from: String,
    pub to: String,
}

/// Change of size; either side may have no size at all
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
}

/// How one column differs between two schema versions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnChange {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_size: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_change: Option<TypeChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeChange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_null: Option<bool>,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub solution: Option<Value>,
}

impl ColumnChange {
    /// Number of keys the record would carry on the wire
    pub fn key_count(&self) -> usize {
        [
            self.deleted.is_some(),
            self.new.is_some(),
            self.new_type.is_some(),
            self.new_size.is_some(),
            self.type_change.is_some(),
            self.size.is_some(),
            self.not_null.is_some(),
            self.solution.is_some(),
        ]
        .into_iter()
        .filter(|present| *present)
        .count()
    }

    pub fn ensure_solution(&mut self) {
        self.solution.get_or_insert(Value::Null);
    }
}

/// A relation present on one side only, keyed in the plan by fingerprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationChange {
    #[serde(default)]
    pub foreign_key: String,
    #[serde(default)]
    pub reference_key: String,
    #[serde(default)]
    pub reference_table: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub solution: Option<Value>,
}

impl RelationChange {
    pub fn ensure_solution(&mut self) {
        self.solution.get_or_insert(Value::Null);
    }
}

/// A unique index present on one side only, keyed in the plan by fingerprint
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexChange {
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    pub solution: Option<Value>,
}

impl IndexChange {
    pub fn ensure_solution(&mut self) {
        self.solution.get_or_insert(Value::Null);
    }
}

/// Everything that changed for one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableChange {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub renamed_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted: Option<bool>,
    #[serde(default)]
    pub columns: IndexMap<String, ColumnChange>,
    #[serde(default)]
    pub relations: IndexMap<String, RelationChange>,
    #[serde(default)]
    pub indexes: IndexMap<String, IndexChange>,
}

impl TableChange {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted.unwrap_or(false)
    }

    /// Whether the table carries any change at all
    pub fn has_changes(&self) -> bool {
        self.is_deleted()
            || !self.columns.is_empty()
            || !self.relations.is_empty()
            || !self.indexes.is_empty()
    }
}

/// The bidirectional migration plan for one old/new schema pair
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RawPlan")]
pub struct MigrationPlan {
    pub schema_a: IndexMap<String, TableChange>,
    pub schema_b: IndexMap<String, TableChange>,
    /// Table names into `schema_a`, in comparison order
    pub index_a: Vec<String>,
    /// Table names into `schema_b`, in comparison order
    pub index_b: Vec<String>,
}

impl MigrationPlan {
    /// Create an empty plan
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear the ordered indexes before a new comparison run. Change records
    /// are kept so user-written solutions survive.
    pub fn reset_indexes(&mut self) {
        self.index_a.clear();
        self.index_b.clear();
    }

    /// Borrow one half of the plan for writing
    pub fn half_mut(&mut self, direction: Direction) -> (&mut IndexMap<String, TableChange>, &mut Vec<String>) {
        match direction {
            Direction::Up => (&mut self.schema_a, &mut self.index_a),
            Direction::Down => (&mut self.schema_b, &mut self.index_b),
        }
    }

    /// Table changes of one half in comparison order
    pub fn ordered(&self, direction: Direction) -> impl Iterator<Item = &TableChange> + '_ {
        let (changes, index) = match direction {
            Direction::Up => (&self.schema_a, &self.index_a),
            Direction::Down => (&self.schema_b, &self.index_b),
        };
        index.iter().filter_map(move |name| changes.get(name))
    }

    /// Whether neither direction carries any change
    pub fn is_empty(&self) -> bool {
        !self
            .schema_a
            .values()
            .chain(self.schema_b.values())
            .any(TableChange::has_changes)
    }

    /// Get a human-readable summary of the plan
    pub fn summary(&self) -> String {
        if self.is_empty() {
            return "No changes".to_string();
        }

        let up = self.ordered(Direction::Up).collect::<Vec<_>>();
        let down = self.ordered(Direction::Down).collect::<Vec<_>>();

        let dropped = up.iter().filter(|t| t.is_deleted()).count();
        let created = down.iter().filter(|t| t.is_deleted()).count();
        let altered = up.iter().filter(|t| !t.is_deleted() && t.has_changes()).count();
        let columns: usize = up.iter().map(|t| t.columns.len()).sum();
        let relations: usize = up.iter().map(|t| t.relations.len()).sum();
        let indexes: usize = up.iter().map(|t| t.indexes.len()).sum();

        let mut parts = Vec::new();
        if created > 0 {
            parts.push(format!("Create {} tables", created));
        }
        if dropped > 0 {
            parts.push(format!("Drop {} tables", dropped));
        }
        if altered > 0 {
            parts.push(format!("Alter {} tables", altered));
        }
        if columns > 0 {
            parts.push(format!("{} column changes", columns));
        }
        if relations > 0 {
            parts.push(format!("{} new relations", relations));
        }
        if indexes > 0 {
            parts.push(format!("{} new unique indexes", indexes));
        }

        if parts.is_empty() {
            "Only reverse changes".to_string()
        } else {
            parts.join(", ")
        }
    }
}

impl Serialize for MigrationPlan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("MigrationPlan", 4)?;
        state.serialize_field("schemaA", &self.schema_a)?;
        state.serialize_field("schemaB", &self.schema_b)?;
        state.serialize_field("indexA", &self.ordered(Direction::Up).collect::<Vec<_>>())?;
        state.serialize_field("indexB", &self.ordered(Direction::Down).collect::<Vec<_>>())?;
        state.end()
    }
}

/// Wire shape of a plan, where the indexes hold full table changes
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPlan {
    #[serde(default)]
    schema_a: IndexMap<String, TableChange>,
    #[serde(default)]
    schema_b: IndexMap<String, TableChange>,
    #[serde(default)]
    index_a: Vec<TableChange>,
    #[serde(default)]
    index_b: Vec<TableChange>,
}

impl From<RawPlan> for MigrationPlan {
    fn from(raw: RawPlan) -> Self {
        Self {
            schema_a: raw.schema_a,
            schema_b: raw.schema_b,
            index_a: raw.index_a.into_iter().map(|t| t.name).collect(),
            index_b: raw.index_b.into_iter().map(|t| t.name).collect(),
        }
    }
}

/// Keep an explicit `null` as `Some(Value::Null)`; only a missing key is `None`
fn present<'de, D>(deserializer: D) -> std::result::Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_key_count() {
        let mut change = ColumnChange::default();
        assert_eq!(change.key_count(), 0);

        change.ensure_solution();
        assert_eq!(change.key_count(), 1);

        change.deleted = Some(true);
        assert_eq!(change.key_count(), 2);
    }

    #[test]
    fn test_ensure_solution_keeps_existing_value() {
        let mut change = ColumnChange {
            solution: Some(json!("return value.trim()")),
            ..Default::default()
        };
        change.ensure_solution();
        assert_eq!(change.solution, Some(json!("return value.trim()")));
    }

    #[test]
    fn test_solution_null_is_distinguished_from_absent() {
        let with_null: ColumnChange = serde_json::from_value(json!({ "deleted": true, "solution": null })).unwrap();
        let without: ColumnChange = serde_json::from_value(json!({ "deleted": true })).unwrap();

        assert_eq!(with_null.solution, Some(Value::Null));
        assert_eq!(without.solution, None);
    }

    #[test]
    fn test_plan_wire_format() {
        let mut plan = MigrationPlan::new();
        let mut user = TableChange::new("user");
        user.columns.insert(
            "name".to_string(),
            ColumnChange {
                size: Some(SizeChange {
                    from: Some("45".to_string()),
                    to: Some("100".to_string()),
                }),
                solution: Some(Value::Null),
                ..Default::default()
            },
        );
        plan.schema_a.insert("user".to_string(), user);
        plan.index_a.push("user".to_string());

        let value = serde_json::to_value(&plan).unwrap();
        assert_eq!(
            value,
            json!({
                "schemaA": {
                    "user": {
                        "name": "user",
                        "columns": { "name": { "size": { "from": "45", "to": "100" }, "solution": null } },
                        "relations": {},
                        "indexes": {}
                    }
                },
                "schemaB": {},
                "indexA": [{
                    "name": "user",
                    "columns": { "name": { "size": { "from": "45", "to": "100" }, "solution": null } },
                    "relations": {},
                    "indexes": {}
                }],
                "indexB": []
            })
        );

        let back: MigrationPlan = serde_json::from_value(value).unwrap();
        assert_eq!(back, plan);
    }

    #[test]
    fn test_summary() {
        let mut plan = MigrationPlan::new();
        assert_eq!(plan.summary(), "No changes");

        let mut dropped = TableChange::new("legacy");
        dropped.deleted = Some(true);
        plan.schema_a.insert("legacy".to_string(), dropped);
        plan.index_a.push("legacy".to_string());

        assert!(!plan.is_empty());
        assert_eq!(plan.summary(), "Drop 1 tables");
    }
}
