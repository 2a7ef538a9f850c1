//! End-to-end migration creation

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::{tempdir, TempDir};

use schema_evolve::config::{Config, DirectoryConfig, ModelsConfig};
use schema_evolve::{AutoConfirm, Error, MigrationCreator, MigrationDirectory, NullProgress};

const USER: &str = r#"
primaryKey: [user_id]
columns:
  user_id: { type: PRIMARY }
  name: { type: STRING(45) }
"#;

const USER_WIDER_NAME: &str = r#"
primaryKey: [user_id]
columns:
  user_id: { type: PRIMARY }
  name: { type: STRING(100) }
"#;

const USER_WITH_EMAIL: &str = r#"
primaryKey: [user_id]
columns:
  user_id: { type: PRIMARY }
  name: { type: STRING(100) }
  email: { type: STRING(120) }
"#;

fn setup(user_yaml: &str) -> (TempDir, Config) {
    let temp = tempdir().unwrap();
    let data = temp.path().join("data");
    let models = data.join("models");
    fs::create_dir_all(&models).unwrap();
    fs::write(models.join("user.yaml"), user_yaml).unwrap();

    let config = Config {
        directory: DirectoryConfig {
            data_path: data.to_string_lossy().into_owned(),
        },
        models: ModelsConfig {
            paths: vec![models.to_string_lossy().into_owned()],
            ..Default::default()
        },
        ..Default::default()
    };

    (temp, config)
}

fn creator(config: &Config, answer: bool) -> MigrationCreator {
    MigrationCreator::new(config.clone(), Box::new(AutoConfirm(answer)), Box::new(NullProgress))
}

fn write_user(config: &Config, yaml: &str) {
    fs::write(Path::new(&config.models.paths[0]).join("user.yaml"), yaml).unwrap();
}

#[tokio::test]
async fn test_first_revision_has_no_plan() {
    let (_temp, config) = setup(USER);

    let outcome = creator(&config, true).create().await.unwrap();

    assert_eq!(outcome.revision, 1);
    assert!(outcome.plan.is_none());
    assert!(outcome.report.is_valid());

    let directory = MigrationDirectory::new(&config.directory);
    assert!(directory.exists());
    assert_eq!(directory.last_schema_revision().unwrap(), 1);
    assert_eq!(directory.current_migration().unwrap(), 1);
    assert!(directory.load_schema(1).unwrap().contains_key("user"));
}

#[tokio::test]
async fn test_next_revision_saves_plan() {
    let (_temp, config) = setup(USER);
    creator(&config, true).create().await.unwrap();

    write_user(&config, USER_WIDER_NAME);
    let outcome = creator(&config, true).create().await.unwrap();

    assert_eq!(outcome.revision, 2);
    assert!(outcome.saved);
    let plan = outcome.plan.unwrap();
    assert!(plan.schema_a["user"].columns["name"].size.is_some());

    let directory = MigrationDirectory::new(&config.directory);
    assert_eq!(directory.load_plan(1, 2).unwrap(), Some(plan));
    assert_eq!(directory.current_migration().unwrap(), 2);
}

#[tokio::test]
async fn test_declining_changes_nothing() {
    let (_temp, config) = setup(USER);

    let err = creator(&config, false).create().await.unwrap_err();

    assert!(err.is_canceled());
    assert!(!MigrationDirectory::new(&config.directory).exists());
}

#[tokio::test]
async fn test_validation_errors_stop_the_pipeline() {
    let (_temp, mut config) = setup("columns:\n  name: { type: STRING(45) }\n");

    let err = creator(&config, true).create().await.unwrap_err();
    assert!(matches!(&err, Error::ValidationError(errors) if errors.iter().any(|e| e.contains("primary key"))));

    config.validation.fail_on_error = false;
    let outcome = creator(&config, true).create().await.unwrap();
    assert!(!outcome.report.is_valid());
    assert_eq!(outcome.revision, 1);
}

#[tokio::test]
async fn test_resolve_only_saves_nothing() {
    let (_temp, config) = setup(USER);

    let resolved = creator(&config, true).resolve_only().await.unwrap();

    assert_eq!(resolved.schema["user"].primary_key, vec!["user_id"]);
    assert!(!MigrationDirectory::new(&config.directory).exists());
}

#[tokio::test]
async fn test_unchanged_models_save_nothing() {
    let (_temp, config) = setup(USER);
    creator(&config, true).create().await.unwrap();

    let outcome = creator(&config, true).create().await.unwrap();

    assert!(!outcome.saved);
    assert_eq!(outcome.revision, 1);
    assert!(outcome.plan.unwrap().is_empty());

    let directory = MigrationDirectory::new(&config.directory);
    assert_eq!(directory.last_schema_revision().unwrap(), 1);
    assert!(directory.load_plan(1, 2).unwrap().is_none());
    assert_eq!(directory.current_migration().unwrap(), 1);
}

#[tokio::test]
async fn test_replan_keeps_written_solutions() {
    let (_temp, config) = setup(USER);
    creator(&config, true).create().await.unwrap();
    write_user(&config, USER_WIDER_NAME);
    creator(&config, true).create().await.unwrap();

    let directory = MigrationDirectory::new(&config.directory);
    let mut saved = directory.load_plan(1, 2).unwrap().unwrap();
    saved.schema_a["user"].columns["name"].solution = Some(json!("UPDATE user SET name = TRIM(name)"));
    directory.save_plan(&saved, 1, 2).unwrap();

    write_user(&config, USER_WITH_EMAIL);
    let outcome = creator(&config, true).replan().await.unwrap();

    assert_eq!(outcome.revision, 2);
    let plan = outcome.plan.unwrap();
    let user = &plan.schema_a["user"];
    assert_eq!(user.columns["name"].solution, Some(json!("UPDATE user SET name = TRIM(name)")));
    assert_eq!(user.columns["email"].new, Some(true));

    assert_eq!(directory.load_plan(1, 2).unwrap(), Some(plan));
    assert_eq!(directory.last_schema_revision().unwrap(), 2);
    assert!(directory.load_schema(2).unwrap()["user"].columns.contains_key("email"));
    assert_eq!(fs::read_dir(directory.schemas_dir()).unwrap().count(), 2);
}

#[tokio::test]
async fn test_replan_needs_a_previous_revision() {
    let (_temp, config) = setup(USER);
    creator(&config, true).create().await.unwrap();

    let err = creator(&config, true).replan().await.unwrap_err();
    assert!(matches!(err, Error::RevisionNotFound(0)));
}
