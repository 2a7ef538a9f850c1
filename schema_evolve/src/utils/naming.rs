//! Naming utilities for schema_evolve
//!
//! This module provides the naming-convention checks used by the validator.

use inflector::Inflector;
use once_cell::sync::Lazy;
use regex::Regex;

static CAMEL_CASE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*[a-z0-9]$").expect("valid camelCase pattern"));

static SIZE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d*\)").expect("valid size pattern"));

/// Format a name according to a pattern with placeholders
pub fn format_name(pattern: &str, replacements: &[(&str, &str)]) -> String {
    let mut result = pattern.to_string();

    for (placeholder, value) in replacements {
        result = result.replace(&format!("{{{}}}", placeholder), value);
    }

    result
}

/// Expected primary key column for a table
pub fn primary_key_name(pattern: &str, table_name: &str) -> String {
    format_name(pattern, &[("table", table_name)])
}

/// Prefix every index name of a table should start with
pub fn index_prefix(pattern: &str, table_name: &str) -> String {
    format_name(pattern, &[("table", table_name)])
}

/// Prefix every relation name of a table should start with
pub fn relation_prefix(pattern: &str, reference_table: &str, table_name: &str) -> String {
    format_name(pattern, &[("reference", reference_table), ("table", table_name)])
}

/// How a name relates to an expected prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixMatch {
    /// Exactly the prefix, or the prefix followed by `_`
    Ok,
    /// Does not start with the prefix
    Missing,
    /// Starts with the prefix but continues without a `_` separator
    NoSeparator,
}

pub fn check_prefix(name: &str, prefix: &str) -> PrefixMatch {
    match name.strip_prefix(prefix) {
        None => PrefixMatch::Missing,
        Some("") => PrefixMatch::Ok,
        Some(rest) if rest.starts_with('_') => PrefixMatch::Ok,
        Some(_) => PrefixMatch::NoSeparator,
    }
}

pub fn is_camel_case(name: &str) -> bool {
    CAMEL_CASE.is_match(name)
}

pub fn suggest_camel_case(name: &str) -> String {
    name.to_camel_case()
}

/// Strip a numeric size so `STRING(45)` reads as `STRING`
pub fn strip_size(column_type: &str) -> String {
    SIZE_SUFFIX.replace(column_type, "").into_owned()
}

/// A join table is named after the two tables it links, `a__b`
pub fn split_join_table(table_name: &str) -> Option<(&str, &str)> {
    table_name.split_once("__")
}
