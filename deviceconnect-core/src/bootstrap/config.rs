//! Configuration loading

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::Config;

const CONFIG_PATH_ENV: &str = "DEVICECONNECT_CONFIG_PATH";
const CWD_CONFIG: &str = "config.yaml";
const SYSTEM_CONFIG: &str = "/etc/deviceconnect/config.yaml";

/// Load configuration from a config file and environment variables
///
/// Config file search order:
/// 1. `explicit` path (e.g. from the command line)
/// 2. `DEVICECONNECT_CONFIG_PATH` environment variable
/// 3. ./config.yaml (current working directory)
/// 4. /etc/deviceconnect/config.yaml
/// 5. Fall back to environment variables only
///
/// The result is not validated; callers apply their overrides first.
pub fn load_config(explicit: Option<&str>) -> Result<Config> {
    let config = match resolve_config_path(explicit, std::env::var(CONFIG_PATH_ENV).ok()) {
        Some(path) => {
            eprintln!("Loading config from {path}");
            Config::from_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load {path}: {e}"))?
        }
        None => {
            eprintln!("No config file found, using environment variables");
            Config::from_env()?
        }
    };

    info!(server_url = %config.connection.server_url, "Configuration loaded");
    Ok(config)
}

fn resolve_config_path(explicit: Option<&str>, from_env: Option<String>) -> Option<String> {
    if let Some(path) = explicit {
        return Some(path.to_string());
    }

    from_env.filter(|p| Path::new(p).exists()).or_else(|| {
        [CWD_CONFIG, SYSTEM_CONFIG]
            .into_iter()
            .find(|p| Path::new(p).exists())
            .map(str::to_string)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        let resolved = resolve_config_path(Some("custom.yaml"), Some("/tmp".to_string()));
        assert_eq!(resolved.as_deref(), Some("custom.yaml"));
    }

    #[test]
    fn test_env_path_must_exist() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let resolved = resolve_config_path(None, Some(path.clone()));
        assert_eq!(resolved, Some(path));

        let resolved = resolve_config_path(None, Some("/nonexistent/deviceconnect.yaml".to_string()));
        assert_ne!(resolved.as_deref(), Some("/nonexistent/deviceconnect.yaml"));
    }

    #[test]
    fn test_load_explicit_file() {
        let file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        std::fs::write(
            file.path(),
            "connection:\n  server_url: http://localhost:8080\n  token: t0k3n\n",
        )
        .unwrap();

        let config = load_config(file.path().to_str()).unwrap();
        assert_eq!(config.connection.server_url, "http://localhost:8080");
        assert_eq!(config.connection.token, "t0k3n");
        assert!(config.validate().is_ok());
    }
}
