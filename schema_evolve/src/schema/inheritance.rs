//! Inheritance resolution
//!
//! Fragments sharing a name form an inheritance group. A group of one
//! fragment is copied as-is; a larger group is ordered into a chain from its
//! base fragment to the most specific one and merged, child fields winning.
//!
//! Every resolved table, including a lone fragment, is stripped of its
//! tombstones and inheritance fields and stored under its `rename` when one
//! is given. A lone fragment is therefore not keyed by its plain `name` if it
//! renames itself.

use indexmap::IndexMap;

use crate::config::ResolverConfig;
use crate::error::{Error, Result};
use crate::progress::ProgressSink;
use crate::schema::types::{ColumnDef, IndexDef, RelationDef, Schema, TableFragment};

/// Collapses table fragments into a concrete schema
pub struct InheritanceResolver {
    config: ResolverConfig,
}

impl InheritanceResolver {
    /// Create a new resolver
    pub fn new(config: &ResolverConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Resolve every inheritance group, reporting each resolved table name
    pub fn resolve(&self, fragments: Vec<TableFragment>, progress: &dyn ProgressSink) -> Result<Schema> {
        let mut groups: IndexMap<String, Vec<TableFragment>> = IndexMap::new();
        for fragment in fragments {
            groups.entry(fragment.name.clone()).or_default().push(fragment);
        }

        let mut schema = Schema::new();

        for (name, mut group) in groups {
            let resolved = if group.len() == 1 {
                tracing::debug!(table = %name, "No inheritance");
                group.remove(0)
            } else {
                tracing::debug!(table = %name, fragments = group.len(), "Resolving inheritance chain");
                self.resolve_group(&name, group)?
            };

            let final_name = resolved.final_name().to_string();
            if schema.contains_key(&final_name) {
                return Err(Error::DuplicateSchemaError { name: final_name });
            }

            let mut table = resolved.into_table();
            table.name = final_name.clone();

            progress.report(&final_name);
            schema.insert(final_name, table);
        }

        Ok(schema)
    }

    /// Merge one group of two or more fragments into a single fragment
    fn resolve_group(&self, name: &str, group: Vec<TableFragment>) -> Result<TableFragment> {
        let mut indexed = index_group(group)?;
        let chain = self.chain_order(name, &indexed)?;

        if chain.len() < indexed.len() {
            let skipped: Vec<&String> = indexed.keys().filter(|k| !chain.contains(k)).collect();
            tracing::warn!(table = %name, skipped = ?skipped, "Fragments outside the inheritance chain were ignored");
        }

        let mut ordered = chain.iter().filter_map(|key| indexed.shift_remove(key));
        let root = ordered
            .next()
            .ok_or_else(|| Error::NoRootError { name: name.to_string() })?;

        Ok(ordered.fold(root, |merged, child| child.merge_defaults(merged)))
    }

    /// Order the group from its base fragment to the most specific one
    fn chain_order(&self, name: &str, indexed: &IndexMap<String, TableFragment>) -> Result<Vec<String>> {
        for (key, fragment) in indexed {
            if let Some(extend) = &fragment.extend {
                if !indexed.contains_key(extend) {
                    return Err(Error::ParentNotFoundError {
                        key: key.clone(),
                        extend: extend.clone(),
                    });
                }
            }
        }

        let roots: Vec<String> = indexed
            .iter()
            .filter(|(_, fragment)| fragment.extend.is_none())
            .map(|(key, _)| key.clone())
            .collect();

        if roots.is_empty() {
            return Err(Error::NoRootError { name: name.to_string() });
        }

        if roots.len() > 1 {
            if self.config.strict {
                return Err(Error::AmbiguousRootError {
                    name: name.to_string(),
                    roots,
                });
            }
            tracing::warn!(table = %name, roots = ?roots, "Several base fragments, using the first one");
        }

        let root = roots[0].clone();

        let mut chain = vec![root.clone()];
        let mut current = root;

        loop {
            let children: Vec<String> = indexed
                .iter()
                .filter(|(key, fragment)| {
                    fragment.extend.as_deref() == Some(current.as_str()) && !chain.contains(key)
                })
                .map(|(key, _)| key.clone())
                .collect();

            let Some(child) = children.first().cloned() else {
                break;
            };

            if children.len() > 1 {
                if self.config.strict {
                    return Err(Error::BranchingInheritanceError {
                        name: name.to_string(),
                        parent: current,
                        children,
                    });
                }
                tracing::warn!(table = %name, parent = %current, children = ?children, "Branching inheritance, following the first child");
            }

            chain.push(child.clone());
            current = child;
        }

        Ok(chain)
    }
}

/// Index a group by alias, or by name for fragments without one
fn index_group(group: Vec<TableFragment>) -> Result<IndexMap<String, TableFragment>> {
    let mut indexed = IndexMap::with_capacity(group.len());

    for mut fragment in group {
        if fragment.alias.as_deref().is_some_and(str::is_empty) {
            fragment.alias = None;
        }

        if let (Some(extend), None) = (&fragment.extend, &fragment.alias) {
            return Err(Error::MissingAliasError {
                name: fragment.name.clone(),
                extend: extend.clone(),
            });
        }

        let key = fragment.key().to_string();
        if indexed.contains_key(&key) {
            return Err(match fragment.alias {
                Some(_) => Error::DuplicateAliasError { alias: key },
                None => Error::DuplicateSchemaError { name: key },
            });
        }

        indexed.insert(key, fragment);
    }

    Ok(indexed)
}

/// Right-biased default merge: fields present on `self` win, absent ones
/// fall back to `parent`.
trait MergeDefaults {
    fn merge_defaults(self, parent: Self) -> Self;
}

impl MergeDefaults for TableFragment {
    fn merge_defaults(self, parent: Self) -> Self {
        TableFragment {
            name: or_parent(self.name, parent.name),
            extend: self.extend.or(parent.extend),
            alias: self.alias.or(parent.alias),
            rename: self.rename.or(parent.rename),
            primary_key: if self.primary_key.is_empty() {
                parent.primary_key
            } else {
                self.primary_key
            },
            columns: merge_maps(self.columns, parent.columns),
            relations: merge_maps(self.relations, parent.relations),
            indexes: merge_maps(self.indexes, parent.indexes),
        }
    }
}

impl MergeDefaults for ColumnDef {
    fn merge_defaults(self, parent: Self) -> Self {
        ColumnDef {
            column_type: or_parent(self.column_type, parent.column_type),
            not_null: self.not_null.or(parent.not_null),
            default: self.default.or(parent.default),
            comment: self.comment.or(parent.comment),
        }
    }
}

impl MergeDefaults for RelationDef {
    fn merge_defaults(self, parent: Self) -> Self {
        RelationDef {
            foreign_key: or_parent(self.foreign_key, parent.foreign_key),
            reference_key: or_parent(self.reference_key, parent.reference_key),
            reference_table: or_parent(self.reference_table, parent.reference_table),
            on_delete: self.on_delete.or(parent.on_delete),
            on_update: self.on_update.or(parent.on_update),
        }
    }
}

impl MergeDefaults for IndexDef {
    fn merge_defaults(self, parent: Self) -> Self {
        IndexDef {
            columns: if self.columns.is_empty() {
                parent.columns
            } else {
                self.columns
            },
            index_type: or_parent(self.index_type, parent.index_type),
        }
    }
}

fn or_parent(value: String, parent: String) -> String {
    if value.is_empty() {
        parent
    } else {
        value
    }
}

/// Merge per key. A key present on the child wins, including an explicit
/// `None` tombstone; ancestor keys keep their position ahead of new ones.
fn merge_maps<T: MergeDefaults>(
    mut child: IndexMap<String, Option<T>>,
    parent: IndexMap<String, Option<T>>,
) -> IndexMap<String, Option<T>> {
    let mut merged = IndexMap::with_capacity(parent.len() + child.len());

    for (key, parent_value) in parent {
        let value = match child.shift_remove(&key) {
            Some(Some(value)) => Some(match parent_value {
                Some(parent_value) => value.merge_defaults(parent_value),
                None => value,
            }),
            Some(None) => None,
            None => parent_value,
        };
        merged.insert(key, value);
    }

    merged.extend(child);
    merged
}
