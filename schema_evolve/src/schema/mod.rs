//! Schema module for schema_evolve
//!
//! This module handles inheritance resolution, validation, and the
//! bidirectional comparison of resolved schemas.

pub mod diff;
pub mod fingerprint;
pub mod inheritance;
pub mod plan;
pub mod type_parser;
pub mod types;
pub mod validator;

// Re-export key types
pub use diff::SchemaDiffEngine;
pub use inheritance::InheritanceResolver;
pub use plan::{
    ColumnChange, Direction, IndexChange, MigrationPlan, RelationChange, SizeChange, TableChange,
    TypeChange,
};
pub use type_parser::{explode_type, ExplodedType};
pub use types::{ColumnDef, IndexDef, RelationDef, Schema, Table, TableFragment};
pub use validator::{SchemaValidator, ValidationReport};
