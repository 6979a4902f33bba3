use berth_core::config::{BerthConfig, ConfigStore};
use tempfile::TempDir;

#[test]
fn config_store_missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_dir(temp.path());

    let config = store.load().unwrap();

    assert_eq!(config, BerthConfig::default());
    assert_eq!(config.current_context, "default");
}

#[test]
fn config_store_reports_parse_errors_with_location() {
    let temp = TempDir::new().unwrap();
    let store = ConfigStore::from_dir(temp.path());
    std::fs::write(store.config_path(), "current_context = \n").unwrap();

    let err = store.load().unwrap_err();

    assert!(format!("{err:#}").contains("line"));
}
