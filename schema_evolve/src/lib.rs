//! schema_evolve: declarative table definitions with inheritance and
//! bidirectional migration planning
//!
//! Table definitions are written as YAML fragments that may extend each
//! other. schema_evolve resolves them into a flat schema, lints it, and
//! compares it with the previously saved revision to produce a migration
//! plan describing both the upgrade and the rollback.

pub mod config;
pub mod creator;
pub mod directory;
pub mod error;
pub mod loader;
pub mod progress;
pub mod prompt;
pub mod schema;
pub mod utils;

// Re-export main types for easier access
pub use config::Config;
pub use creator::{CreateOutcome, MigrationCreator, ResolvedSchema};
pub use directory::MigrationDirectory;
pub use error::{Error, Result};
pub use loader::FragmentLoader;
pub use progress::{NullProgress, ProgressSink, RecordingProgress, TracingProgress};
pub use prompt::{AutoConfirm, Prompt, StdinPrompt};
pub use schema::{InheritanceResolver, MigrationPlan, Schema, SchemaDiffEngine, SchemaValidator, ValidationReport};

/// Load the configuration file and build a migration creator that asks on the terminal
pub fn init(config_path: &str) -> Result<MigrationCreator> {
    let config = config::load_from_file(config_path)?;
    Ok(MigrationCreator::new(
        config,
        Box::new(StdinPrompt),
        Box::new(TracingProgress::default()),
    ))
}
