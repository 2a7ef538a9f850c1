//! Loading table definitions from disk

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::tempdir;

use schema_evolve::config::ModelsConfig;
use schema_evolve::{Error, FragmentLoader};

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn models_config(paths: &[&Path]) -> ModelsConfig {
    ModelsConfig {
        paths: paths.iter().map(|p| p.to_string_lossy().into_owned()).collect(),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_loads_every_definition_in_path_order() {
    let temp = tempdir().unwrap();
    let models = temp.path().join("models");
    write(&models.join("user.yaml"), "columns:\n  user_id: { type: PRIMARY }\n");
    write(
        &models.join("auth/user.yml"),
        "name: ignored\nalias: userAuth\nextend: user\ncolumns:\n  password: { type: STRING(60) }\n",
    );
    write(&models.join("order.yaml"), "columns:\n  order_id: { type: PRIMARY }\n");
    write(&models.join("README.md"), "# not a definition");

    let fragments = FragmentLoader::new(&models_config(&[&models])).load().await.unwrap();

    let names: Vec<(&str, Option<&str>)> = fragments
        .iter()
        .map(|f| (f.name.as_str(), f.alias.as_deref()))
        .collect();
    assert_eq!(
        names,
        vec![("user", Some("userAuth")), ("order", None), ("user", None)]
    );
    assert!(fragments[0].columns.contains_key("password"));
}

#[tokio::test]
async fn test_respects_scan_options() {
    let temp = tempdir().unwrap();
    let models = temp.path().join("models");
    write(&models.join("user.yaml"), "columns: {}\n");
    write(&models.join("legacy/order.yaml"), "columns: {}\n");
    write(&models.join("nested/post.yaml"), "columns: {}\n");

    let mut config = models_config(&[&models]);
    config.exclude_paths = Some(vec![models.join("legacy").to_string_lossy().into_owned()]);
    let fragments = FragmentLoader::new(&config).load().await.unwrap();
    let names: Vec<&str> = fragments.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["post", "user"]);

    config.recursive_scan = false;
    let fragments = FragmentLoader::new(&config).load().await.unwrap();
    assert_eq!(fragments.len(), 1);
    assert_eq!(fragments[0].name, "user");
}

#[tokio::test]
async fn test_loads_several_directories() {
    let temp = tempdir().unwrap();
    let core = temp.path().join("core");
    let extra = temp.path().join("extra");
    write(&core.join("user.yaml"), "columns: {}\n");
    write(&extra.join("user.yaml"), "alias: userExtra\nextend: user\n");

    let fragments = FragmentLoader::new(&models_config(&[&core, &extra]))
        .load()
        .await
        .unwrap();

    assert_eq!(fragments.len(), 2);
    assert_eq!(fragments[0].alias, None);
    assert_eq!(fragments[1].alias.as_deref(), Some("userExtra"));
}

#[tokio::test]
async fn test_empty_directory_has_no_schema() {
    let temp = tempdir().unwrap();

    let err = FragmentLoader::new(&models_config(&[temp.path()]))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NoSchemaFound));
}

#[tokio::test]
async fn test_missing_directory() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("missing");

    let err = FragmentLoader::new(&models_config(&[&missing]))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::LoadError(_)));
}

#[tokio::test]
async fn test_invalid_yaml_names_the_file() {
    let temp = tempdir().unwrap();
    write(&temp.path().join("broken.yaml"), "columns: [unclosed\n");

    let err = FragmentLoader::new(&models_config(&[temp.path()]))
        .load()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SerializationError(msg) if msg.contains("broken.yaml")));
}
