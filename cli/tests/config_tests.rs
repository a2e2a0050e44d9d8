use exambank_cli::AppConfig;
use exambank_storage::StoreConfig;
use pretty_assertions::assert_eq;
use std::path::PathBuf;

#[test]
fn defaults_without_file() {
    let config = AppConfig::load(None).unwrap();
    assert_eq!(config, AppConfig::default());
    assert_eq!(config.store.path, Some(PathBuf::from("exambank.db")));
    assert_eq!(config.backup_dir, PathBuf::from("backups"));
    assert!(config.restart_command.is_none());
}

#[test]
fn partial_file_keeps_other_defaults() {
    let config = AppConfig::from_json(r#"{"backup_dir": "/srv/backups"}"#).unwrap();
    assert_eq!(config.backup_dir, PathBuf::from("/srv/backups"));
    assert_eq!(config.store, AppConfig::default().store);
}

#[test]
fn full_file() {
    let config = AppConfig::from_json(
        r#"{
            "store": {"name": "school", "path": "/data/school.db", "version": 1},
            "backup_dir": "snapshots",
            "restart_command": ["systemctl", "restart", "exambank"]
        }"#,
    )
    .unwrap();
    assert_eq!(config.store, StoreConfig::at_path("school", "/data/school.db"));
    assert_eq!(
        config.restart_command,
        Some(vec!["systemctl".to_string(), "restart".into(), "exambank".into()])
    );
}

#[test]
fn load_reads_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("exambank.json");
    std::fs::write(&path, r#"{"store": {"name": "disk"}}"#).unwrap();

    let config = AppConfig::load(Some(&path)).unwrap();
    assert_eq!(config.store.name, "disk");
    // A store section without a path means in-memory.
    assert_eq!(config.store.path, None);
}

#[test]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = AppConfig::load(Some(&dir.path().join("nope.json"))).unwrap_err();
    assert!(err.to_string().contains("failed to read config file"));
}

#[test]
fn invalid_store_name_is_rejected() {
    assert!(AppConfig::from_json(r#"{"store": {"name": ""}}"#).is_err());
    assert!(AppConfig::from_json(r#"{"store": {"name": "a/b"}}"#).is_err());
    assert!(AppConfig::from_json("not json").is_err());
}

#[test]
fn overrides_apply_in_order() {
    let mut config = AppConfig::default();
    config.apply_overrides(Some(PathBuf::from("other.db")), false);
    assert_eq!(config.store.path, Some(PathBuf::from("other.db")));

    config.apply_overrides(Some(PathBuf::from("ignored.db")), true);
    assert_eq!(config.store.path, None);
}
