//! Coverage for config loading and path resolution.

use std::fs;
use std::path::{Path, PathBuf};

use telerelay::config::{load_config, RuntimePaths};

#[test]
fn runtime_paths_hang_off_the_root() {
    let paths = RuntimePaths::under(Path::new("/opt/relay"));
    assert_eq!(paths.config_toml, PathBuf::from("/opt/relay/config.toml"));
    assert_eq!(paths.env_file, PathBuf::from("/opt/relay/.env"));
    assert_eq!(paths.database, PathBuf::from("/opt/relay/relay.db"));
    assert_eq!(paths.logs_dir, PathBuf::from("/opt/relay/logs"));
}

#[test]
fn loads_config_from_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "[telegram]\nadmin_users = [1, 2]\n\n[database]\npath = \"data/relay.db\"\n",
    )
    .expect("write config");

    let config = load_config(&path).expect("config should load");
    assert_eq!(config.telegram.admin_users, vec![1, 2]);
    assert_eq!(config.telegram.bot_token_env, "TELERELAY_BOT_TOKEN");

    let paths = RuntimePaths::under(dir.path());
    assert_eq!(config.database_path(&paths), PathBuf::from("data/relay.db"));
}

#[test]
fn default_database_lives_under_the_root() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, "[telegram]\nadmin_users = []\n").expect("write config");

    let config = load_config(&path).expect("config should load");
    let paths = RuntimePaths::under(dir.path());
    assert_eq!(config.database_path(&paths), dir.path().join("relay.db"));
}

#[test]
fn missing_or_broken_config_names_the_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let missing = dir.path().join("absent.toml");
    let err = load_config(&missing).expect_err("missing file");
    assert!(format!("{err:#}").contains("absent.toml"));

    let broken = dir.path().join("broken.toml");
    fs::write(&broken, "[telegram\n").expect("write config");
    let err = load_config(&broken).expect_err("invalid toml");
    assert!(format!("{err:#}").contains("failed to parse config"));
}
