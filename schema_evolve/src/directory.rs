//! Migration data directory
//!
//! Layout below the configured data path:
//!
//! ```text
//! data/
//!   backup/
//!   models/
//!   migration/schemas/schema-<YYYYMMDDHHmm>-<revision>.json
//!   migration/scripts/migration-<from>-<to>.json
//!   config.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::DirectoryConfig;
use crate::error::{Error, Result};
use crate::schema::plan::MigrationPlan;
use crate::schema::types::Schema;

const DIR_BACKUP: &str = "backup";
const DIR_MODELS: &str = "models";
const DIR_SCHEMAS: &str = "migration/schemas";
const DIR_SCRIPTS: &str = "migration/scripts";
const CONFIG_FILE: &str = "config.json";

static SCHEMA_FILE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^schema-\d{12}-(\d{5})\.json$").expect("valid schema file pattern"));

/// Persistent state of the data directory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryState {
    pub current_migration: u32,
}

/// Handle on the migration data directory
#[derive(Debug, Clone)]
pub struct MigrationDirectory {
    data_dir: PathBuf,
}

impl MigrationDirectory {
    pub fn new(config: &DirectoryConfig) -> Self {
        Self::at(&config.data_path)
    }

    /// Open the directory at an explicit path
    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            data_dir: path.as_ref().to_path_buf(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(DIR_BACKUP)
    }

    pub fn models_dir(&self) -> PathBuf {
        self.data_dir.join(DIR_MODELS)
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.data_dir.join(DIR_SCHEMAS)
    }

    pub fn scripts_dir(&self) -> PathBuf {
        self.data_dir.join(DIR_SCRIPTS)
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join(CONFIG_FILE)
    }

    /// Whether the directory structure has been created
    pub fn exists(&self) -> bool {
        self.schemas_dir().is_dir() && self.scripts_dir().is_dir() && self.config_path().is_file()
    }

    /// Create every directory and an initial `config.json`. Existing content is left alone.
    pub fn create_structure(&self) -> Result<()> {
        tracing::info!(path = %self.data_dir.display(), "Creating migration directory structure");

        for dir in [self.backup_dir(), self.models_dir(), self.schemas_dir(), self.scripts_dir()] {
            fs::create_dir_all(&dir)?;
        }

        if !self.config_path().exists() {
            self.write_state(&DirectoryState::default())?;
        }

        Ok(())
    }

    /// Highest saved schema revision, 0 when none has been saved yet
    pub fn last_schema_revision(&self) -> Result<u32> {
        let revision = self
            .schema_files()?
            .into_iter()
            .map(|(revision, _)| revision)
            .max()
            .unwrap_or(0);

        tracing::debug!(revision, "Last schema revision");
        Ok(revision)
    }

    /// Save a resolved schema as the given revision, replacing any earlier
    /// file for the same revision
    pub fn save_schema(&self, schema: &Schema, revision: u32) -> Result<PathBuf> {
        for (found, path) in self.schema_files()? {
            if found == revision {
                tracing::debug!(revision, file = %path.display(), "Replacing schema file");
                fs::remove_file(&path)?;
            }
        }

        let timestamp = chrono::Local::now().format("%Y%m%d%H%M");
        let path = self
            .schemas_dir()
            .join(format!("schema-{}-{:05}.json", timestamp, revision));

        write_json(&path, schema)?;
        tracing::info!(revision, file = %path.display(), "Saved schema");
        Ok(path)
    }

    /// Load the schema saved as the given revision
    pub fn load_schema(&self, revision: u32) -> Result<Schema> {
        let path = self
            .schema_files()?
            .into_iter()
            .find(|(found, _)| *found == revision)
            .map(|(_, path)| path)
            .ok_or(Error::RevisionNotFound(revision))?;

        read_json(&path)
    }

    pub fn plan_path(&self, from: u32, to: u32) -> PathBuf {
        self.scripts_dir()
            .join(format!("migration-{:05}-{:05}.json", from, to))
    }

    pub fn save_plan(&self, plan: &MigrationPlan, from: u32, to: u32) -> Result<PathBuf> {
        let path = self.plan_path(from, to);
        write_json(&path, plan)?;
        tracing::info!(from, to, file = %path.display(), "Saved migration plan");
        Ok(path)
    }

    /// Load a previously saved plan, `None` if there is none
    pub fn load_plan(&self, from: u32, to: u32) -> Result<Option<MigrationPlan>> {
        let path = self.plan_path(from, to);
        if !path.exists() {
            return Ok(None);
        }

        read_json(&path).map(Some)
    }

    pub fn current_migration(&self) -> Result<u32> {
        Ok(self.read_state()?.current_migration)
    }

    pub fn set_current_migration(&self, revision: u32) -> Result<()> {
        let mut state = self.read_state()?;
        state.current_migration = revision;
        self.write_state(&state)
    }

    fn read_state(&self) -> Result<DirectoryState> {
        let path = self.config_path();
        if !path.exists() {
            return Ok(DirectoryState::default());
        }

        read_json(&path)
    }

    fn write_state(&self, state: &DirectoryState) -> Result<()> {
        write_json(&self.config_path(), state)
    }

    /// Schema files with their revision number, in file name order
    fn schema_files(&self) -> Result<Vec<(u32, PathBuf)>> {
        let dir = self.schemas_dir();
        if !dir.is_dir() {
            return Err(Error::LoadError(format!(
                "Migration directory not initialized: {}",
                dir.display()
            )));
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let file_name = match path.file_name().and_then(|name| name.to_str()) {
                Some(name) => name.to_string(),
                None => continue,
            };

            if let Some(captures) = SCHEMA_FILE.captures(&file_name) {
                if let Ok(revision) = captures[1].parse::<u32>() {
                    files.push((revision, path));
                }
            }
        }

        files.sort_by(|(_, a), (_, b)| a.cmp(b));
        Ok(files)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content)?;
    Ok(())
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| Error::SerializationError(format!("{}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::{ColumnDef, Table};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample_schema() -> Schema {
        let mut table = Table::new("user");
        table.primary_key = vec!["user_id".to_string()];
        table.add_column("user_id", ColumnDef::new("PRIMARY"));

        let mut schema = Schema::new();
        schema.insert("user".to_string(), table);
        schema
    }

    #[test]
    fn test_create_structure() {
        let temp = tempdir().unwrap();
        let directory = MigrationDirectory::at(temp.path().join("data"));

        assert!(!directory.exists());
        directory.create_structure().unwrap();
        assert!(directory.exists());
        assert!(directory.models_dir().is_dir());
        assert!(directory.backup_dir().is_dir());
        assert_eq!(directory.current_migration().unwrap(), 0);

        // Running it twice keeps the state
        directory.set_current_migration(3).unwrap();
        directory.create_structure().unwrap();
        assert_eq!(directory.current_migration().unwrap(), 3);
    }

    #[test]
    fn test_schema_revisions() {
        let temp = tempdir().unwrap();
        let directory = MigrationDirectory::at(temp.path());
        directory.create_structure().unwrap();

        assert_eq!(directory.last_schema_revision().unwrap(), 0);

        let schema = sample_schema();
        let path = directory.save_schema(&schema, 1).unwrap();
        let file_name = path.file_name().unwrap().to_str().unwrap();
        assert!(SCHEMA_FILE.is_match(file_name), "{}", file_name);
        assert!(file_name.ends_with("-00001.json"));

        directory.save_schema(&schema, 2).unwrap();
        fs::write(directory.schemas_dir().join("notes.txt"), "ignored").unwrap();

        assert_eq!(directory.last_schema_revision().unwrap(), 2);
        assert_eq!(directory.load_schema(1).unwrap(), schema);
        assert!(matches!(directory.load_schema(7), Err(Error::RevisionNotFound(7))));
    }

    #[test]
    fn test_saving_a_revision_again_replaces_it() {
        let temp = tempdir().unwrap();
        let directory = MigrationDirectory::at(temp.path());
        directory.create_structure().unwrap();

        let schema = sample_schema();
        let stale = directory.schemas_dir().join("schema-201601010000-00001.json");
        fs::write(&stale, "{}").unwrap();

        directory.save_schema(&schema, 1).unwrap();

        assert!(!stale.exists());
        assert_eq!(fs::read_dir(directory.schemas_dir()).unwrap().count(), 1);
        assert_eq!(directory.load_schema(1).unwrap(), schema);
    }

    #[test]
    fn test_plan_persistence() {
        let temp = tempdir().unwrap();
        let directory = MigrationDirectory::at(temp.path());
        directory.create_structure().unwrap();

        assert!(directory.load_plan(1, 2).unwrap().is_none());

        let plan = MigrationPlan::new();
        let path = directory.save_plan(&plan, 1, 2).unwrap();
        assert!(path.ends_with("migration/scripts/migration-00001-00002.json"));
        assert_eq!(directory.load_plan(1, 2).unwrap(), Some(plan));
    }

    #[test]
    fn test_revision_scan_requires_structure() {
        let temp = tempdir().unwrap();
        let directory = MigrationDirectory::at(temp.path().join("missing"));

        assert!(matches!(directory.last_schema_revision(), Err(Error::LoadError(_))));
    }
}
