//! Schema validation
//!
//! Lints a resolved schema and sorts findings into errors, warnings and
//! informational notes. Validation never changes the schema and has no
//! influence on the diff; callers decide whether errors stop the pipeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::config::{NamingConfig, ValidationConfig};
use crate::schema::types::{Schema, Table, INDEX_TYPES};
use crate::utils::naming::{self, PrefixMatch};

const PRIMARY: &str = "PRIMARY";

/// Column types that can be generated on every supported database
const PORTABLE_TYPES: [&str; 21] = [
    "primary",
    "integer",
    "biginteger",
    "text",
    "string",
    "float",
    "decimal",
    "boolean",
    "date",
    "datetime",
    "time",
    "timestamp",
    "timestamps",
    "binary",
    "enum",
    "enu",
    "json",
    "jsonb",
    "uuid",
    "increments",
    "bigincrements",
];

const ACTIVE_COLUMNS: [&str; 3] = ["active", "status", "ativo"];
const DELETED_COLUMNS: [&str; 3] = ["deleted", "removed", "removido"];
const TIMESTAMP_COLUMNS: [&str; 4] = ["createdAt", "updatedAt", "created_at", "updated_at"];

/// Findings of one validation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub error: Vec<String>,
    pub warn: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.error.is_empty()
    }
}

/// Rule-based schema linter
pub struct SchemaValidator {
    config: ValidationConfig,
    naming: NamingConfig,
}

impl SchemaValidator {
    /// Create a new validator
    pub fn new(config: &ValidationConfig, naming: &NamingConfig) -> Self {
        Self {
            config: config.clone(),
            naming: naming.clone(),
        }
    }

    /// Validate every table of the schema
    pub fn validate(&self, schema: &Schema) -> ValidationReport {
        let mut run = ValidationRun {
            validator: self,
            schema,
            report: ValidationReport::default(),
            index_names: HashSet::new(),
            relation_names: HashSet::new(),
        };

        if self.config.enabled {
            for (table_name, table) in schema {
                tracing::debug!(table = %table_name, "Validating table");
                run.validate_table(table_name, table);
            }
        }

        run.report
    }
}

struct ValidationRun<'a> {
    validator: &'a SchemaValidator,
    schema: &'a Schema,
    report: ValidationReport,
    index_names: HashSet<&'a str>,
    relation_names: HashSet<&'a str>,
}

impl<'a> ValidationRun<'a> {
    fn error(&mut self, message: String) {
        self.report.error.push(message);
    }

    fn warn(&mut self, message: String) {
        self.report.warn.push(message);
    }

    fn info(&mut self, message: String) {
        self.report.info.push(message);
    }

    fn naming_rules(&self) -> bool {
        self.validator.config.naming_rules
    }

    fn validate_table(&mut self, table_name: &'a str, table: &'a Table) {
        self.validate_primary_key(table_name, table);
        self.validate_columns(table_name, table);
        if self.naming_rules() {
            self.validate_table_name(table_name, table);
        }
        self.validate_indexes(table_name, table);
        self.validate_relations(table_name, table);
    }

    fn validate_primary_key(&mut self, table_name: &str, table: &Table) {
        let primary_key = match table.primary_key.as_slice() {
            [] => {
                self.error(format!("Table '{}' does not define a primary key", table_name));
                return;
            }
            [primary_key] => primary_key,
            _ => {
                self.error(format!("Table '{}' must have exactly one primary key column", table_name));
                return;
            }
        };

        let expected = naming::primary_key_name(&self.validator.naming.primary_key_pattern, table_name);
        if self.naming_rules() && *primary_key != expected {
            self.warn(format!(
                "Primary key of table '{}' should be named '{}'",
                table_name, expected
            ));
        }

        match table.columns.get(primary_key) {
            None => self.error(format!(
                "Primary key '{}' of table '{}' is not a column",
                primary_key, table_name
            )),
            Some(column) if column.column_type != PRIMARY => self.warn(format!(
                "Primary key '{}' of table '{}' should have type '{}', not '{}'",
                primary_key, table_name, PRIMARY, column.column_type
            )),
            Some(_) => {}
        }
    }

    fn validate_columns(&mut self, table_name: &str, table: &Table) {
        if table.columns.is_empty() {
            self.error(format!("Table '{}' defines no columns", table_name));
            return;
        }

        for (column_name, column) in &table.columns {
            if column.column_type.trim().is_empty() {
                self.error(format!(
                    "Column '{}' of table '{}' has no type",
                    column_name, table_name
                ));
                continue;
            }

            let base_type = naming::strip_size(&column.column_type);

            if base_type != base_type.to_uppercase() {
                self.warn(format!(
                    "Type '{}' of column '{}' in table '{}' should be upper case",
                    base_type, column_name, table_name
                ));
            }

            if base_type == PRIMARY {
                let is_key = table.primary_key.contains(column_name)
                    || table.relations.values().any(|r| &r.foreign_key == column_name);
                if !is_key {
                    self.error(format!(
                        "Column '{}' of table '{}' uses type '{}' but is neither a primary nor a foreign key",
                        column_name, table_name, PRIMARY
                    ));
                }
            }

            let lower = base_type.trim().to_lowercase();
            if !PORTABLE_TYPES.contains(&lower.as_str()) {
                self.info(format!(
                    "Column '{}' of table '{}' uses a non-portable type '{}'",
                    column_name, table_name, lower
                ));
            }

            if self.naming_rules() && column.column_type != PRIMARY && !naming::is_camel_case(column_name) {
                self.warn(format!(
                    "Column '{}' of table '{}' is not camelCase (try '{}')",
                    column_name,
                    table_name,
                    naming::suggest_camel_case(column_name)
                ));
            }
        }

        if self.validator.config.recommended_columns && naming::split_join_table(table_name).is_none() {
            let has_any = |names: &[&str]| names.iter().any(|name| table.columns.contains_key(*name));

            if !has_any(&ACTIVE_COLUMNS[..]) {
                self.info(format!(
                    "Table '{}' should have one of the columns {:?}",
                    table_name, ACTIVE_COLUMNS
                ));
            }
            if !has_any(&DELETED_COLUMNS[..]) {
                self.info(format!(
                    "Table '{}' should have one of the columns {:?}",
                    table_name, DELETED_COLUMNS
                ));
            }
            if !has_any(&TIMESTAMP_COLUMNS[..]) {
                self.info(format!(
                    "Table '{}' should have one of the columns {:?}",
                    table_name, TIMESTAMP_COLUMNS
                ));
            }
        }
    }

    fn validate_table_name(&mut self, table_name: &str, table: &Table) {
        if naming::is_camel_case(table_name) {
            return;
        }

        let schema = self.schema;

        if let Some((table_a, table_b)) = naming::split_join_table(table_name) {
            for linked in [table_a, table_b] {
                if !schema.contains_key(linked) {
                    self.warn(format!(
                        "Table '{}' does not exist; join table '{}' should be named after the tables it links",
                        linked, table_name
                    ));
                }
            }
        } else if let Some((parent, _)) = table_name.split_once('_') {
            if !schema.contains_key(parent) {
                self.warn(format!(
                    "Table '{}' does not exist; table '{}' should be named after its parent table",
                    parent, table_name
                ));
            }
            if !table.relations.values().any(|r| r.reference_table == parent) {
                self.warn(format!(
                    "Table '{}' should have a relation to table '{}'",
                    table_name, parent
                ));
            }
        } else {
            self.warn(format!("Table name '{}' should be camelCase", table_name));
        }
    }

    fn validate_indexes(&mut self, table_name: &'a str, table: &'a Table) {
        let prefix = naming::index_prefix(&self.validator.naming.index_pattern, table_name);

        for (index_name, index) in &table.indexes {
            if self.naming_rules() {
                match naming::check_prefix(index_name, &prefix) {
                    PrefixMatch::Ok => {}
                    PrefixMatch::Missing => self.warn(format!(
                        "Index '{}' of table '{}' should start with '{}'",
                        index_name, table_name, prefix
                    )),
                    PrefixMatch::NoSeparator => self.warn(format!(
                        "Index '{}' of table '{}' should separate '{}' from the rest of its name with '_'",
                        index_name, table_name, prefix
                    )),
                }
            }

            for column in &index.columns {
                if !table.columns.contains_key(column) {
                    self.warn(format!(
                        "Column '{}' of index '{}' in table '{}' does not exist",
                        column, index_name, table_name
                    ));
                }
            }

            let index_type = index.index_type.trim();
            if index_type.is_empty() {
                self.error(format!(
                    "Index '{}' of table '{}' has no type",
                    index_name, table_name
                ));
            } else if !INDEX_TYPES.contains(&index_type) {
                self.error(format!(
                    "Index '{}' of table '{}' has invalid type '{}', expected one of: {}",
                    index_name,
                    table_name,
                    index_type,
                    INDEX_TYPES.join(", ")
                ));
            }

            if !self.index_names.insert(index_name.as_str()) {
                self.error(format!(
                    "Index '{}' of table '{}' already exists",
                    index_name, table_name
                ));
            }
        }
    }

    fn validate_relations(&mut self, table_name: &'a str, table: &'a Table) {
        let schema = self.schema;

        for (relation_name, relation) in &table.relations {
            if self.naming_rules() {
                let prefix = naming::relation_prefix(
                    &self.validator.naming.relation_pattern,
                    &relation.reference_table,
                    table_name,
                );
                match naming::check_prefix(relation_name, &prefix) {
                    PrefixMatch::Ok => {}
                    PrefixMatch::Missing => self.warn(format!(
                        "Relation '{}' of table '{}' should start with '{}'",
                        relation_name, table_name, prefix
                    )),
                    PrefixMatch::NoSeparator => self.warn(format!(
                        "Relation '{}' of table '{}' should separate '{}' from the rest of its name with '_'",
                        relation_name, table_name, prefix
                    )),
                }
            }

            match schema.get(&relation.reference_table) {
                None => self.error(format!(
                    "Relation '{}' of table '{}' references a missing table '{}'",
                    relation_name, table_name, relation.reference_table
                )),
                Some(referenced) => {
                    if !referenced.columns.contains_key(&relation.reference_key) {
                        self.error(format!(
                            "Relation '{}' of table '{}' references a missing column '{}' in table '{}'",
                            relation_name, table_name, relation.reference_key, relation.reference_table
                        ));
                    }

                    match table.columns.get(&relation.foreign_key) {
                        None => self.error(format!(
                            "Relation '{}' of table '{}' uses a missing column '{}'",
                            relation_name, table_name, relation.foreign_key
                        )),
                        Some(column) if column.column_type != PRIMARY => self.warn(format!(
                            "Column '{}' of table '{}' should have type '{}', not '{}', since it is a foreign key",
                            relation.foreign_key, table_name, PRIMARY, column.column_type
                        )),
                        Some(_) => {}
                    }
                }
            }

            if !self.relation_names.insert(relation_name.as_str()) {
                self.error(format!(
                    "Relation '{}' of table '{}' already exists",
                    relation_name, table_name
                ));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDef, IndexDef, RelationDef};
    use pretty_assertions::assert_eq;

    fn validator() -> SchemaValidator {
        SchemaValidator::new(&ValidationConfig::default(), &NamingConfig::default())
    }

    fn valid_schema() -> Schema {
        let mut user = Table::new("user");
        user.primary_key = vec!["user_id".to_string()];
        user.add_column("user_id", ColumnDef::new("PRIMARY"));
        user.add_column("name", ColumnDef::new("STRING(45)").not_null(true));

        let mut post = Table::new("post");
        post.primary_key = vec!["post_id".to_string()];
        post.add_column("post_id", ColumnDef::new("PRIMARY"));
        post.add_column("user_id", ColumnDef::new("PRIMARY"));
        post.add_column("title", ColumnDef::new("STRING(120)"));
        post.add_relation("fk_user___post_author", RelationDef::new("user_id", "user_id", "user"));
        post.add_index("idx_post_title", IndexDef::new(&["title"], "unique index"));

        let mut schema = Schema::new();
        schema.insert("user".to_string(), user);
        schema.insert("post".to_string(), post);
        schema
    }

    #[test]
    fn test_valid_schema_has_no_findings() {
        let report = validator().validate(&valid_schema());
        assert_eq!(report, ValidationReport::default());
        assert!(report.is_valid());
    }

    #[test]
    fn test_structural_errors() {
        let mut schema = valid_schema();
        let post = schema.get_mut("post").unwrap();
        post.add_column("legacy", ColumnDef::new("PRIMARY"));
        post.add_relation("fk_group___post", RelationDef::new("user_id", "group_id", "group"));
        post.add_index("idx_post_bad", IndexDef::new(&["title"], "hash"));
        schema
            .get_mut("user")
            .unwrap()
            .add_index("idx_post_title", IndexDef::new(&["name"], "index"));

        let report = validator().validate(&schema);

        assert!(!report.is_valid());
        assert!(report.error.iter().any(|e| e.contains("'legacy'") && e.contains("neither")));
        assert!(report.error.iter().any(|e| e.contains("missing table 'group'")));
        assert!(report.error.iter().any(|e| e.contains("invalid type 'hash'")));
        assert!(report.error.iter().any(|e| e.contains("'idx_post_title'") && e.contains("already exists")));
    }

    #[test]
    fn test_naming_warnings() {
        let mut schema = valid_schema();
        let user = schema.get_mut("user").unwrap();
        user.add_column("created_at", ColumnDef::new("datetime"));
        user.add_index("user_name", IndexDef::new(&["name"], "index"));

        let report = validator().validate(&schema);

        assert!(report.is_valid());
        assert!(report.warn.iter().any(|w| w.contains("'created_at'") && w.contains("'createdAt'")));
        assert!(report.warn.iter().any(|w| w.contains("'datetime'") && w.contains("upper case")));
        assert!(report.warn.iter().any(|w| w.contains("'user_name'") && w.contains("'idx_user'")));
    }

    #[test]
    fn test_naming_rules_disabled() {
        let config = ValidationConfig {
            naming_rules: false,
            ..Default::default()
        };
        let mut schema = valid_schema();
        schema
            .get_mut("user")
            .unwrap()
            .add_column("created_at", ColumnDef::new("DATETIME"));

        let report = SchemaValidator::new(&config, &NamingConfig::default()).validate(&schema);
        assert!(report.warn.is_empty());
    }

    #[test]
    fn test_recommended_columns() {
        let config = ValidationConfig {
            recommended_columns: true,
            ..Default::default()
        };
        let mut schema = valid_schema();
        let user = schema.get_mut("user").unwrap();
        user.add_column("active", ColumnDef::new("BOOLEAN"));
        user.add_column("deleted", ColumnDef::new("BOOLEAN"));
        user.add_column("createdAt", ColumnDef::new("DATETIME"));

        let report = SchemaValidator::new(&config, &NamingConfig::default()).validate(&schema);

        assert!(!report.info.iter().any(|i| i.contains("Table 'user'")));
        assert_eq!(report.info.iter().filter(|i| i.contains("Table 'post'")).count(), 3);
    }

    #[test]
    fn test_disabled_validation() {
        let config = ValidationConfig {
            enabled: false,
            ..Default::default()
        };
        let report = SchemaValidator::new(&config, &NamingConfig::default()).validate(&Schema::new());
        assert!(report.is_valid());
    }
}
