use super::load_existing_config as load_existing_config_impl;
use super::*;
use tempfile::TempDir;

#[test]
fn load_existing_config_falls_back_to_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = load_existing_config_impl(temp_dir.path());

    assert_eq!(config.get_base_dir(), temp_dir.path());
    assert_eq!(config.model, ModelConfig::default());
}

#[test]
fn load_existing_config_reads_saved_file() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let mut saved = Config {
        base_dir: temp_dir.path().to_path_buf(),
        ..Config::default()
    };
    saved.model.model = "efficientnet".to_string();
    saved.save().expect("should save config");

    let config = load_existing_config_impl(temp_dir.path());
    assert_eq!(config.model.model, "efficientnet");
}

#[test]
fn unreachable_model_server_is_reported() {
    let model = ModelConfig {
        host: "127.0.0.1".to_string(),
        port: 9,
        ..ModelConfig::default()
    };
    assert!(!test_model_connection(&model));
}

#[test]
fn show_config_prints_without_error() {
    let config = Config::default();
    assert!(show_config(&config).is_ok());
}
