//! Content fingerprints used to match relations and unique indexes across
//! schema versions independently of their declared names.

use crate::schema::types::{IndexDef, RelationDef};

fn digest(input: &str) -> String {
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Fingerprint of a relation. Field order is fixed: foreign key, reference
/// key, reference table.
pub fn relation_fingerprint(relation: &RelationDef) -> String {
    digest(&format!(
        "{}{}{}",
        relation.foreign_key, relation.reference_key, relation.reference_table
    ))
}

/// Fingerprint of an index. Columns are sorted first, so declaration order
/// does not change the identity.
pub fn index_fingerprint(index: &IndexDef) -> String {
    let mut columns: Vec<&str> = index.columns.iter().map(String::as_str).collect();
    columns.sort_unstable();
    digest(&columns.join(","))
}
