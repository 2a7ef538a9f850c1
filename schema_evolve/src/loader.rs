//! Table definition loader
//!
//! Reads every YAML definition file below the configured model directories.
//! Directories are loaded concurrently, and the result is returned only once
//! all of them have been read.

use std::path::{Path, PathBuf};

use futures::future::try_join_all;
use walkdir::WalkDir;

use crate::config::ModelsConfig;
use crate::error::{Error, Result};
use crate::schema::types::TableFragment;

/// Loads table fragments from definition files
pub struct FragmentLoader {
    config: ModelsConfig,
}

impl FragmentLoader {
    /// Create a new loader
    pub fn new(config: &ModelsConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Load fragments from every configured directory
    pub async fn load(&self) -> Result<Vec<TableFragment>> {
        self.load_paths(&self.config.paths).await
    }

    /// Load fragments from the given directories
    pub async fn load_paths(&self, paths: &[String]) -> Result<Vec<TableFragment>> {
        let tasks = paths.iter().map(|path| {
            let path = PathBuf::from(path);
            let config = self.config.clone();

            async move {
                match tokio::task::spawn_blocking(move || load_directory(&path, &config)).await {
                    Ok(result) => result,
                    Err(e) => Err(Error::LoadError(format!("Loader task failed: {}", e))),
                }
            }
        });

        let fragments: Vec<TableFragment> = try_join_all(tasks).await?.into_iter().flatten().collect();

        if fragments.is_empty() {
            return Err(Error::NoSchemaFound);
        }

        tracing::info!(count = fragments.len(), "Loaded table definitions");
        Ok(fragments)
    }
}

/// Load every definition file below one directory, in path order
pub fn load_directory(base_path: &Path, config: &ModelsConfig) -> Result<Vec<TableFragment>> {
    if !base_path.exists() {
        return Err(Error::LoadError(format!(
            "Path does not exist: {}",
            base_path.display()
        )));
    }

    let exclude_paths = config.exclude_paths.clone().unwrap_or_default();

    let mut walker = WalkDir::new(base_path).follow_links(true).sort_by_file_name();
    if !config.recursive_scan {
        walker = walker.max_depth(1);
    }

    let mut fragments = Vec::new();

    for entry in walker.into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();

        if exclude_paths.iter().any(|exclude| path.starts_with(exclude)) {
            continue;
        }

        if entry.file_type().is_file() && has_extension(path, &config.extensions) {
            fragments.push(load_file(path)?);
        }
    }

    Ok(fragments)
}

/// Parse one definition file. The fragment is named after the file.
pub fn load_file(path: &Path) -> Result<TableFragment> {
    tracing::debug!(file = %path.display(), "Loading table definition");

    let content = std::fs::read_to_string(path)?;

    let mut fragment: TableFragment = if content.trim().is_empty() {
        TableFragment::default()
    } else {
        serde_yaml::from_str(&content)
            .map_err(|e| Error::SerializationError(format!("{}: {}", path.display(), e)))?
    };

    fragment.name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .ok_or_else(|| Error::LoadError(format!("Invalid file name: {}", path.display())))?;

    Ok(fragment)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| extensions.iter().any(|allowed| allowed == ext))
}
