use serial_test::serial;
use temp_env::with_vars;

use super::*;

fn cleanup_all_tengine_env_vars() {
    for (key, _) in std::env::vars() {
        if key.starts_with("TENGINE__") || key == "CONFIG_PATH" {
            std::env::remove_var(&key);
        }
    }
}

#[test]
#[serial]
fn default_config_should_initialize_with_hardcoded_values() {
    let config = Settings::default();

    assert_eq!(config.cluster.node_id, 1);
    assert_eq!(config.registry.max_engines, 1024);
    assert_eq!(config.registry.engine_idle_timeout_in_sec, 600);
    assert_eq!(config.registry.sweep_interval_in_ms, 2000);
    assert!(!config.monitoring.prometheus_enabled);
}

#[test]
#[serial]
fn new_should_merge_environment_overrides() {
    cleanup_all_tengine_env_vars();
    with_vars(vec![("TENGINE__REGISTRY__MAX_ENGINES", Some("9"))], || {
        let config = Settings::new().unwrap();

        assert_eq!(config.registry.max_engines, 9);
    });
}

#[test]
#[serial]
fn with_override_config_should_merge_file_settings() {
    cleanup_all_tengine_env_vars();
    // Create temporary directory and configuration file
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("dynamic_config.toml");

    // Dynamically generate TOML configuration content
    std::fs::write(
        &config_path,
        r#"
        [cluster]
        node_id = 7 # Override default value

        [registry]
        engine_idle_timeout_in_sec = 30 # Override default value
        "#,
    )
    .unwrap();

    let empty_vars: Vec<(&str, Option<&str>)> = vec![];
    with_vars(empty_vars, || {
        // Execute test logic
        let base_config = Settings::new().expect("success");
        let result = base_config.with_override_config(config_path.to_str().unwrap());

        // Verify result
        assert!(result.is_ok());
        let config = result.unwrap();

        assert_eq!(config.cluster.node_id, 7);
        assert_eq!(config.registry.engine_idle_timeout_in_sec, 30);
        // Untouched values keep their defaults
        assert_eq!(config.registry.sweep_interval_in_ms, 2000);
    });
}

#[test]
fn validation_should_fail_with_invalid_cluster_config() {
    let mut config = Settings::default();
    config.cluster.node_id = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_fail_with_zero_capacity() {
    let mut config = Settings::default();
    config.registry.max_engines = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_fail_with_zero_idle_timeout() {
    let mut config = Settings::default();
    config.registry.engine_idle_timeout_in_sec = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_fail_with_zero_sweep_interval() {
    let mut config = Settings::default();
    config.registry.sweep_interval_in_ms = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_fail_with_privileged_prometheus_port() {
    let mut config = Settings::default();
    config.monitoring.prometheus_enabled = true;
    config.monitoring.prometheus_port = 80;
    assert!(config.validate().is_err());
}

#[test]
fn validation_should_accept_defaults() {
    assert!(Settings::default().validate().is_ok());
}
