//! Schema difference calculator
//!
//! Compares two resolved schemas and records, per table, which columns,
//! relations and unique indexes differ. Relations and unique indexes are
//! matched by content fingerprint, so renaming one is not a change.
//!
//! Comparisons are incremental: an existing [`MigrationPlan`] can be passed
//! back in, records without a net difference are pruned, and user-written
//! `solution` values are kept.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::config::DiffConfig;
use crate::error::{Error, Result};
use crate::progress::ProgressSink;
use crate::schema::fingerprint::{index_fingerprint, relation_fingerprint};
use crate::schema::plan::{ColumnChange, Direction, MigrationPlan, SizeChange, TableChange, TypeChange};
use crate::schema::type_parser::explode_type;
use crate::schema::types::{ColumnDef, Schema, Table};

/// Builds migration plans from pairs of schemas
pub struct SchemaDiffEngine {
    config: DiffConfig,
}

impl SchemaDiffEngine {
    /// Create a new diff engine
    pub fn new(config: &DiffConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Fill both halves of `plan`: old → new into A, new → old into B
    pub fn build_plan(
        &self,
        old_schema: &Schema,
        new_schema: &Schema,
        plan: &mut MigrationPlan,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        plan.reset_indexes();

        tracing::info!("Comparing old schema => new schema");
        let (changes, index) = plan.half_mut(Direction::Up);
        self.compare_tables(old_schema, new_schema, changes, index, progress)?;

        tracing::info!("Comparing new schema => old schema");
        let (changes, index) = plan.half_mut(Direction::Down);
        self.compare_tables(new_schema, old_schema, changes, index, progress)?;

        Ok(())
    }

    /// Compare every table of `old_schema` against `new_schema`
    pub fn compare_tables(
        &self,
        old_schema: &Schema,
        new_schema: &Schema,
        out_changes: &mut IndexMap<String, TableChange>,
        out_index: &mut Vec<String>,
        progress: &dyn ProgressSink,
    ) -> Result<()> {
        for (table_name, old_table) in old_schema {
            progress.report(table_name);

            let change = out_changes
                .entry(table_name.clone())
                .or_insert_with(|| TableChange::new(table_name));
            change.name = table_name.clone();
            out_index.push(table_name.clone());

            let target_name = change.renamed_to.as_deref().unwrap_or(table_name);

            match new_schema.get(target_name) {
                None => {
                    tracing::debug!(table = %table_name, "Table missing on the other side");
                    change.deleted = Some(true);
                    change.columns.clear();
                    change.relations.clear();
                    change.indexes.clear();
                }
                Some(new_table) => {
                    change.deleted = None;
                    self.diff_tables(old_table, new_table, change)?;
                }
            }
        }

        Ok(())
    }

    /// Record the differences between two versions of one table
    pub fn diff_tables(&self, old_table: &Table, new_table: &Table, change: &mut TableChange) -> Result<()> {
        diff_existing_columns(old_table, new_table, change)?;
        diff_new_columns(old_table, new_table, change);

        if self.config.compare_relations {
            diff_relations(old_table, new_table, change);
        }

        if self.config.compare_unique_indexes {
            diff_unique_indexes(old_table, new_table, change);
        }

        Ok(())
    }
}

fn diff_existing_columns(old_table: &Table, new_table: &Table, change: &mut TableChange) -> Result<()> {
    for (column_name, old_column) in &old_table.columns {
        let record = change.columns.entry(column_name.clone()).or_default();
        record.ensure_solution();

        match new_table.columns.get(column_name) {
            None => record.deleted = Some(true),
            Some(new_column) => {
                record.deleted = None;
                diff_columns(old_column, new_column, record);
            }
        }

        match record.key_count() {
            0 => {
                return Err(Error::EmptyChangeRecordError {
                    table: change.name.clone(),
                    field: column_name.clone(),
                })
            }
            1 => {
                change.columns.shift_remove(column_name);
            }
            _ => {}
        }
    }

    Ok(())
}

fn diff_columns(old_column: &ColumnDef, new_column: &ColumnDef, record: &mut ColumnChange) {
    let old_type = explode_type(&old_column.column_type);
    let new_type = explode_type(&new_column.column_type);

    record.type_change = if old_type.same_type(&new_type) {
        None
    } else {
        Some(TypeChange {
            from: old_type.base.trim().to_string(),
            to: new_type.base.trim().to_string(),
        })
    };

    record.size = if old_type.same_size(&new_type) {
        None
    } else {
        Some(SizeChange {
            from: old_type.size,
            to: new_type.size,
        })
    };

    // Existing rows need a value only when nulls were allowed before
    record.not_null =
        (!old_column.is_not_null() && new_column.is_not_null() && !new_column.has_default()).then_some(true);
}

fn diff_new_columns(old_table: &Table, new_table: &Table, change: &mut TableChange) {
    for (column_name, new_column) in &new_table.columns {
        if old_table.columns.contains_key(column_name) {
            continue;
        }

        let exploded = explode_type(&new_column.column_type);
        let record = change.columns.entry(column_name.clone()).or_default();

        record.new = Some(true);
        record.new_type = Some(exploded.base);
        record.new_size = exploded.size;
        record.ensure_solution();
        record.not_null = (new_column.is_not_null() && !new_column.has_default()).then_some(true);
    }
}

fn diff_relations(old_table: &Table, new_table: &Table, change: &mut TableChange) {
    let old_fingerprints: HashSet<String> = old_table.relations.values().map(relation_fingerprint).collect();

    for (relation_name, new_relation) in &new_table.relations {
        let fingerprint = relation_fingerprint(new_relation);

        if old_fingerprints.contains(&fingerprint) {
            change.relations.shift_remove(&fingerprint);
            continue;
        }

        let record = change.relations.entry(fingerprint).or_default();
        record.foreign_key = new_relation.foreign_key.clone();
        record.reference_key = new_relation.reference_key.clone();
        record.reference_table = new_relation.reference_table.clone();
        record.name = relation_name.clone();
        record.ensure_solution();
    }
}

fn diff_unique_indexes(old_table: &Table, new_table: &Table, change: &mut TableChange) {
    let old_fingerprints: HashSet<String> = old_table
        .indexes
        .values()
        .filter(|index| index.is_unique())
        .map(index_fingerprint)
        .collect();

    for (index_name, new_index) in new_table.indexes.iter().filter(|(_, index)| index.is_unique()) {
        let fingerprint = index_fingerprint(new_index);

        if old_fingerprints.contains(&fingerprint) {
            change.indexes.shift_remove(&fingerprint);
            continue;
        }

        let record = change.indexes.entry(fingerprint).or_default();
        record.columns = new_index.columns.clone();
        record.columns.sort_unstable();
        record.name = index_name.clone();
        record.ensure_solution();
    }
}
