//! Configuration loading and root folder resolution
//!
//! Tests that touch GATEPASS_ROOT_FOLDER or GATEPASS_CONFIG are marked
//! #[serial] so they never race on the process environment.

use gatepass_common::config::{
    load_toml_config, prepare_root_folder, resolve_root_folder, TomlConfig, CONFIG_PATH_ENV,
    DATABASE_FILE, ROOT_FOLDER_ENV,
};
use serial_test::serial;
use std::env;
use std::path::{Path, PathBuf};

#[test]
#[serial]
fn test_cli_argument_wins() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    let resolved = resolve_root_folder(Some(Path::new("/tmp/from-cli")), &config);
    assert_eq!(resolved, PathBuf::from("/tmp/from-cli"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_env_beats_toml() {
    env::set_var(ROOT_FOLDER_ENV, "/tmp/from-env");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };

    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/from-env"));

    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_toml_then_default() {
    env::remove_var(ROOT_FOLDER_ENV);
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/from-toml"));

    let fallback = resolve_root_folder(None, &TomlConfig::default());
    assert!(!fallback.as_os_str().is_empty());
    assert!(fallback.to_string_lossy().contains("gatepass"));
}

#[test]
#[serial]
fn test_blank_env_is_ignored() {
    env::set_var(ROOT_FOLDER_ENV, "   ");
    let config = TomlConfig {
        root_folder: Some(PathBuf::from("/tmp/from-toml")),
        ..Default::default()
    };
    assert_eq!(resolve_root_folder(None, &config), PathBuf::from("/tmp/from-toml"));
    env::remove_var(ROOT_FOLDER_ENV);
}

#[test]
#[serial]
fn test_explicit_config_file_is_loaded() {
    env::remove_var(CONFIG_PATH_ENV);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gatepass.toml");
    std::fs::write(
        &path,
        r#"
        port = 6000
        public_base_url = "http://192.168.0.10:6000"

        [camera]
        enabled = false

        [storage]
        public = false
        signing_secret = "s3cret"
        "#,
    )
    .unwrap();

    let config = load_toml_config(Some(&path));
    assert_eq!(config.port, 6000);
    assert!(!config.camera.enabled);
    assert!(!config.storage.public);
    assert_eq!(config.storage.signed_url_ttl_secs, 600);
    assert!(!config.is_secure_context());
}

#[test]
#[serial]
fn test_config_env_var_is_used() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kiosk.toml");
    std::fs::write(&path, "bind_address = \"127.0.0.1\"\n").unwrap();
    env::set_var(CONFIG_PATH_ENV, &path);

    let config = load_toml_config(None);
    assert_eq!(config.bind_address, "127.0.0.1");

    env::remove_var(CONFIG_PATH_ENV);
}

#[test]
#[serial]
fn test_missing_or_invalid_config_degrades_to_defaults() {
    env::remove_var(CONFIG_PATH_ENV);
    let dir = tempfile::tempdir().unwrap();

    let missing = load_toml_config(Some(&dir.path().join("absent.toml")));
    assert_eq!(missing.port, TomlConfig::default().port);

    let broken = dir.path().join("broken.toml");
    std::fs::write(&broken, "port = [").unwrap();
    let config = load_toml_config(Some(&broken));
    assert_eq!(config.feed.window, 20);
}

#[test]
fn test_prepare_root_folder_creates_directory() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("nested").join("gatepass");

    let db_path = prepare_root_folder(&root).unwrap();
    assert!(root.is_dir());
    assert_eq!(db_path, root.join(DATABASE_FILE));
}
