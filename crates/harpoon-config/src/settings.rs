//! Engine settings loaded from TOML with environment overrides

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::{Error, Result};

/// Default location of the agent configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/opt/harpoon/config.yaml";

/// Default location of the last-known-good backup.
pub const DEFAULT_BACKUP_PATH: &str = "/opt/harpoon/config-backup.yaml";

/// Helper image that runs `systemctl` against the host.
pub const DEFAULT_SYSTEMD_IMAGE: &str = "quay.io/harpoon/harpoon-systemd-amd:latest";

pub const ENV_CONFIG_URL: &str = "HARPOON_CONFIG_URL";
pub const ENV_SYSTEMD_IMAGE: &str = "HARPOON_SYSTEMD_IMAGE";
pub const ENV_RUNTIME: &str = "HARPOON_RUNTIME";

/// Settings for the host engine.
///
/// Every field has a default, so an empty file (or no file) is valid.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Primary configuration file kept in sync with `config_url`
    pub config_path: PathBuf,
    /// Backup written before every replacement of `config_path`
    pub backup_path: PathBuf,
    /// Remote source of the configuration file
    pub config_url: Option<String>,
    /// Image used for the systemd helper container
    pub systemd_image: String,
    /// Container runtime CLI (`podman` or `docker`)
    pub runtime_binary: String,
    /// Upper bound for a single container runtime call
    pub runtime_timeout_secs: u64,
    /// Redirect hops followed when fetching `config_url`
    pub max_redirects: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
            backup_path: PathBuf::from(DEFAULT_BACKUP_PATH),
            config_url: None,
            systemd_image: DEFAULT_SYSTEMD_IMAGE.to_string(),
            runtime_binary: "podman".to_string(),
            runtime_timeout_secs: 300,
            max_redirects: 10,
        }
    }
}

impl Settings {
    /// Parse settings from TOML text. `origin` is only used in errors.
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self> {
        let settings: Self = toml::from_str(content).map_err(|e| Error::SettingsParse {
            path: origin.to_path_buf(),
            message: e.to_string(),
        })?;
        // Zero would kill every runtime call on its first poll
        if settings.runtime_timeout_secs == 0 {
            return Err(Error::SettingsParse {
                path: origin.to_path_buf(),
                message: "runtime_timeout_secs must be greater than zero".into(),
            });
        }
        Ok(settings)
    }

    /// Load settings from a TOML file, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        match harpoon_fs::read_optional(path)? {
            Some(bytes) => {
                let content = String::from_utf8(bytes).map_err(|_| Error::SettingsParse {
                    path: path.to_path_buf(),
                    message: "settings file is not valid UTF-8".into(),
                })?;
                tracing::debug!(path = %path.display(), "Loading settings");
                Self::from_toml_str(&content, path)
            }
            None => {
                tracing::debug!(path = %path.display(), "No settings file, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Apply `HARPOON_*` environment overrides on top of the loaded values.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_CONFIG_URL).filter(|v| !v.is_empty()) {
            self.config_url = Some(url);
        }
        if let Some(image) = lookup(ENV_SYSTEMD_IMAGE).filter(|v| !v.is_empty()) {
            self.systemd_image = image;
        }
        if let Some(runtime) = lookup(ENV_RUNTIME).filter(|v| !v.is_empty()) {
            self.runtime_binary = runtime;
        }
    }

    pub fn runtime_timeout(&self) -> Duration {
        Duration::from_secs(self.runtime_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_overrides_ignore_empty_values() {
        let env: HashMap<&str, &str> =
            HashMap::from([(ENV_CONFIG_URL, ""), (ENV_RUNTIME, "docker")]);
        let mut settings = Settings::default();

        settings.apply_overrides(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(settings.config_url, None);
        assert_eq!(settings.runtime_binary, "docker");
        assert_eq!(settings.systemd_image, DEFAULT_SYSTEMD_IMAGE);
    }
}
