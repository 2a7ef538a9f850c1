//! Migration creation pipeline
//!
//! Loads the table definitions, resolves inheritance, validates the result,
//! compares it with the last saved revision and saves the new revision with
//! its migration plan. Every step that writes to disk is confirmed first.

use crate::config::Config;
use crate::directory::MigrationDirectory;
use crate::error::{Error, Result};
use crate::loader::FragmentLoader;
use crate::progress::ProgressSink;
use crate::prompt::Prompt;
use crate::schema::{InheritanceResolver, MigrationPlan, Schema, SchemaDiffEngine, SchemaValidator, ValidationReport};

/// A resolved schema together with its lint findings
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: Schema,
    pub report: ValidationReport,
}

/// Result of a successful `create` or `replan` run
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    /// Revision the schema was saved as, or the latest one when nothing was saved
    pub revision: u32,
    /// Plan from the previous revision, `None` for the first one
    pub plan: Option<MigrationPlan>,
    pub report: ValidationReport,
    /// `false` when nothing changed since the last revision
    pub saved: bool,
}

pub struct MigrationCreator {
    config: Config,
    directory: MigrationDirectory,
    prompt: Box<dyn Prompt>,
    progress: Box<dyn ProgressSink>,
}

impl MigrationCreator {
    pub fn new(config: Config, prompt: Box<dyn Prompt>, progress: Box<dyn ProgressSink>) -> Self {
        let directory = MigrationDirectory::new(&config.directory);

        Self {
            config,
            directory,
            prompt,
            progress,
        }
    }

    pub fn directory(&self) -> &MigrationDirectory {
        &self.directory
    }

    /// Load, resolve and validate the table definitions without saving anything
    pub async fn resolve_only(&self) -> Result<ResolvedSchema> {
        let fragments = FragmentLoader::new(&self.config.models).load().await?;

        let resolver = InheritanceResolver::new(&self.config.resolver);
        let schema = resolver.resolve(fragments, self.progress.as_ref())?;

        let validator = SchemaValidator::new(&self.config.validation, &self.config.naming);
        let report = validator.validate(&schema);

        for message in &report.info {
            tracing::info!("{}", message);
        }
        for message in &report.warn {
            tracing::warn!("{}", message);
        }
        for message in &report.error {
            tracing::error!("{}", message);
        }

        Ok(ResolvedSchema { schema, report })
    }

    /// Run the whole pipeline and save a new schema revision
    pub async fn create(&self) -> Result<CreateOutcome> {
        if !self.directory.exists() {
            self.confirm(
                &format!(
                    "Migration directory '{}' does not exist. Create it?",
                    self.directory.data_dir().display()
                ),
                true,
            )
            .await?;
            self.directory.create_structure()?;
        }

        let ResolvedSchema { schema, report } = self.validated().await?;

        self.confirm("Schema loaded and validated. Continue?", true)
            .await?;

        let previous = self.directory.last_schema_revision()?;
        let revision = previous + 1;

        let plan = if previous > 0 {
            let plan = self.plan_revision(previous, &schema, MigrationPlan::new())?;

            if plan.is_empty() {
                tracing::info!(revision = previous, "No changes since the last revision, nothing saved");
                return Ok(CreateOutcome {
                    revision: previous,
                    plan: Some(plan),
                    report,
                    saved: false,
                });
            }

            Some(plan)
        } else {
            tracing::info!("First revision, no migration plan needed");
            None
        };

        self.confirm(&format!("Save schema revision {}?", revision), true)
            .await?;

        self.save(&schema, plan.as_ref(), revision)?;

        Ok(CreateOutcome {
            revision,
            plan,
            report,
            saved: true,
        })
    }

    /// Rebuild the latest revision from the current table definitions.
    ///
    /// The saved plan from the previous revision is reused, so `solution`
    /// values written into it survive. The latest schema and plan are
    /// replaced; no new revision is created.
    pub async fn replan(&self) -> Result<CreateOutcome> {
        if !self.directory.exists() {
            return Err(Error::LoadError(format!(
                "Migration directory not initialized: {}",
                self.directory.data_dir().display()
            )));
        }

        let revision = self.directory.last_schema_revision()?;
        if revision < 2 {
            return Err(Error::RevisionNotFound(revision.saturating_sub(1)));
        }
        let previous = revision - 1;

        let ResolvedSchema { schema, report } = self.validated().await?;

        let prior = self.directory.load_plan(previous, revision)?.unwrap_or_default();
        let plan = self.plan_revision(previous, &schema, prior)?;

        self.confirm(&format!("Replace schema revision {} and its migration plan?", revision), true)
            .await?;

        self.save(&schema, Some(&plan), revision)?;

        Ok(CreateOutcome {
            revision,
            plan: Some(plan),
            report,
            saved: true,
        })
    }

    /// Resolve, then stop on validation errors when configured to
    async fn validated(&self) -> Result<ResolvedSchema> {
        let resolved = self.resolve_only().await?;

        if !resolved.report.is_valid() && self.config.validation.fail_on_error {
            return Err(Error::ValidationError(resolved.report.error));
        }

        Ok(resolved)
    }

    /// Compare the saved schema `previous` with `schema`, accumulating into `plan`
    fn plan_revision(&self, previous: u32, schema: &Schema, mut plan: MigrationPlan) -> Result<MigrationPlan> {
        let old_schema = self.directory.load_schema(previous)?;

        let engine = SchemaDiffEngine::new(&self.config.diff);
        engine.build_plan(&old_schema, schema, &mut plan, self.progress.as_ref())?;

        tracing::info!(from = previous, to = previous + 1, "{}", plan.summary());
        Ok(plan)
    }

    fn save(&self, schema: &Schema, plan: Option<&MigrationPlan>, revision: u32) -> Result<()> {
        self.directory.save_schema(schema, revision)?;
        if let Some(plan) = plan {
            self.directory.save_plan(plan, revision - 1, revision)?;
        }
        self.directory.set_current_migration(revision)
    }

    async fn confirm(&self, message: &str, default: bool) -> Result<()> {
        if self.prompt.confirm(message, default).await? {
            Ok(())
        } else {
            tracing::warn!("Operation canceled");
            Err(Error::OperationCanceled)
        }
    }
}
