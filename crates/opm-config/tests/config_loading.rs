//! Loading configuration files from disk.

use opm_config::{
    load_config, validate_config, ConfigOverrides, ConfigSource, LoadOptions, ServerConfig,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn loads_explicit_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
openproject_url = "https://op.example.com"
api_key = "file-key"
server_name = "from-file"
"#,
    )
    .unwrap();

    let loaded = load_config(&LoadOptions {
        config_path: Some(path.clone()),
        load_dotenv: false,
        overrides: ConfigOverrides::default(),
    })
    .unwrap();

    assert_eq!(loaded.source, ConfigSource::CliArgument);
    assert_eq!(loaded.path.as_deref(), Some(path.as_path()));
    assert_eq!(loaded.config.server_name, "from-file");
}

#[test]
fn missing_explicit_file_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_config(&LoadOptions {
        config_path: Some(dir.path().join("nope.toml")),
        ..LoadOptions::default()
    })
    .unwrap_err();
    assert_eq!(err.code(), 60);
}

#[test]
fn malformed_file_is_a_parse_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "request_timeout = \"thirty\"").unwrap();
    let err = ServerConfig::from_file(&path).unwrap_err();
    assert_eq!(err.code(), 61);
}

#[test]
fn cli_overrides_apply_last() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "request_timeout = 12\n").unwrap();

    let loaded = load_config(&LoadOptions {
        config_path: Some(path),
        load_dotenv: false,
        overrides: ConfigOverrides {
            templates_dir: Some(dir.path().join("tpl")),
            debug: true,
            request_timeout: Some(3),
        },
    })
    .unwrap();

    assert_eq!(loaded.config.request_timeout, 3);
    assert!(loaded.config.debug);
    assert_eq!(loaded.config.templates_dir(), dir.path().join("tpl"));
}

#[test]
fn file_without_credentials_fails_validation() {
    let config = ServerConfig::from_toml_str("debug = false").unwrap();
    let problems = validate_config(&config);
    assert!(problems.iter().any(|p| p.to_string().contains("api_key")));
}
