//! Integration tests for configuration loading

use std::io::Write;
use tempfile::NamedTempFile;
use tourtrack::infra::Config;

#[test]
fn test_load_config_from_file() {
    let mut temp_file = NamedTempFile::new().unwrap();

    let config_content = r#"
[site]
id = "test-site"

[tracker]
pool_size = 64

[ranking]
top_k = 3

[rewards]
proximity_buffer_miles = 25.0

[metrics]
interval_secs = 15

[[attractions]]
name = "Disneyland"
latitude = 33.817595
longitude = -117.922008

[[attractions]]
name = "Jackson Hole"
latitude = 43.582767
longitude = -110.821999
"#;

    temp_file.write_all(config_content.as_bytes()).unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "test-site");
    assert_eq!(config.pool_size(), 64);
    assert_eq!(config.top_k(), 3);
    assert_eq!(config.proximity_buffer_miles(), 25.0);
    assert_eq!(config.metrics_interval_secs(), 15);
    assert_eq!(config.attractions().len(), 2);
    assert_eq!(config.attractions()[0].name, "Disneyland");
    assert_eq!(config.attractions()[1].location.latitude, 43.582767);
}

#[test]
fn test_missing_sections_fall_back_to_defaults() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[site]\nid = \"minimal\"\n").unwrap();
    temp_file.flush().unwrap();

    let config = Config::from_file(temp_file.path()).unwrap();

    assert_eq!(config.site_id(), "minimal");
    assert_eq!(config.pool_size(), 1000);
    assert_eq!(config.top_k(), 5);
    assert_eq!(config.proximity_buffer_miles(), 10.0);
    // Empty catalog falls back to the built-in one
    assert!(!config.attractions().is_empty());
}

#[test]
fn test_load_honors_config_file_env_var() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"[site]\nid = \"from-env\"\n").unwrap();
    temp_file.flush().unwrap();

    // Only this test touches CONFIG_FILE in this binary
    std::env::set_var("CONFIG_FILE", temp_file.path());
    let config = Config::load(None);
    std::env::remove_var("CONFIG_FILE");

    assert_eq!(config.site_id(), "from-env");
    assert_eq!(config.config_file(), temp_file.path().display().to_string());
}

#[test]
fn test_load_from_path_fallback() {
    // Nonexistent path falls back to defaults rather than failing
    let config = Config::load_from_path("does/not/exist.toml");
    assert_eq!(config.site_id(), "tourtrack");
    assert_eq!(config.config_file(), "default");
}

#[test]
fn test_invalid_toml_is_an_error() {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(b"this is not { toml").unwrap();
    temp_file.flush().unwrap();

    assert!(Config::from_file(temp_file.path()).is_err());
}
