//! Environment overrides for configuration loading
//!
//! Kept in its own test binary: it mutates process environment variables.
//!
//! Run with: cargo test --test config_env_tests

use std::io::Write;

use deviceconnect_core::Config;

#[test]
fn test_env_vars_override_yaml_file() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "connection:\n  server_url: https://from-file.example.io\n  token: file-token\n  connect_path: /file/connect\nlogging:\n  level: debug"
    )
    .unwrap();

    std::env::set_var("DEVICECONNECT_CONNECTION__TOKEN", "env-token");
    std::env::set_var("DEVICECONNECT_CONNECTION__SERVER_URL", "http://from-env.example.io");
    let loaded = Config::from_file(file.path().to_str().unwrap());
    std::env::remove_var("DEVICECONNECT_CONNECTION__TOKEN");
    std::env::remove_var("DEVICECONNECT_CONNECTION__SERVER_URL");

    let config = loaded.unwrap();
    assert_eq!(config.connection.token, "env-token");
    assert_eq!(config.connection.server_url, "http://from-env.example.io");
    assert_eq!(config.connection.connect_path, "/file/connect");
    assert_eq!(config.logging.level, "debug");
}
