//! Column type parsing
//!
//! Splits a raw column type such as `STRING(45) UNSIGNED` into its base type
//! (`STRING UNSIGNED`) and its size (`45`).

use once_cell::sync::Lazy;
use regex::Regex;

static TYPE_WITH_SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([0-9A-Za-z\s]*)\((.*)\)([0-9A-Za-z_\s]*)").expect("valid type pattern")
});

/// A column type split into base type and optional size
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplodedType {
    pub base: String,
    pub size: Option<String>,
}

impl ExplodedType {
    /// Base types are compared after trimming, case-sensitively
    pub fn same_type(&self, other: &ExplodedType) -> bool {
        self.base.trim() == other.base.trim()
    }

    pub fn same_size(&self, other: &ExplodedType) -> bool {
        self.same_type(other) && self.size == other.size
    }
}

/// Explode a raw type string. Input without a parenthesized size is kept
/// verbatim as the base type.
pub fn explode_type(raw: &str) -> ExplodedType {
    match TYPE_WITH_SIZE.captures(raw) {
        Some(caps) => {
            let base = caps.get(1).map_or("", |m| m.as_str()).trim();
            let size = caps.get(2).map_or("", |m| m.as_str()).trim();
            let suffix = caps.get(3).map_or("", |m| m.as_str()).trim();

            ExplodedType {
                base: format!("{} {}", base, suffix).trim().to_string(),
                size: Some(size.to_string()),
            }
        }
        None => ExplodedType {
            base: raw.to_string(),
            size: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("STRING(45)", "STRING", Some("45"))]
    #[case("STRING(45) UNSIGNED", "STRING UNSIGNED", Some("45"))]
    #[case("DECIMAL( 10,2 )", "DECIMAL", Some("10,2"))]
    #[case("INTEGER", "INTEGER", None)]
    #[case("PRIMARY", "PRIMARY", None)]
    #[case("", "", None)]
    fn test_explode_type(#[case] raw: &str, #[case] base: &str, #[case] size: Option<&str>) {
        let exploded = explode_type(raw);
        assert_eq!(exploded.base, base);
        assert_eq!(exploded.size.as_deref(), size);
    }

    #[test]
    fn test_unmatched_input_is_kept_verbatim() {
        assert_eq!(explode_type(" TEXT ").base, " TEXT ");
    }

    #[test]
    fn test_type_and_size_equality() {
        let a = explode_type("STRING(45)");
        let b = explode_type("STRING(100)");
        let c = explode_type("TEXT(45)");

        assert!(a.same_type(&b));
        assert!(!a.same_size(&b));
        assert!(!a.same_type(&c));
        assert!(!a.same_size(&c));
        assert!(a.same_size(&explode_type("STRING( 45 )")));
        assert!(explode_type(" TEXT").same_type(&explode_type("TEXT ")));
    }
}
