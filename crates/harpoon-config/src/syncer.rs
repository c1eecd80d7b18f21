//! Keep the local configuration file in step with a remote URL

use std::path::PathBuf;

use url::Url;

use crate::{Error, Fetch, HttpFetcher, Result, Settings};

/// The primary configuration file and its backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    pub primary: PathBuf,
    pub backup: PathBuf,
}

impl ConfigPaths {
    pub fn new(primary: impl Into<PathBuf>, backup: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            backup: backup.into(),
        }
    }
}

/// Downloads the remote configuration and replaces the local copy when it
/// differs.
///
/// The backup always holds the configuration that was active right before
/// the last successful replacement. Not safe to run concurrently against the
/// same paths; callers serialize syncs.
#[derive(Debug)]
pub struct ConfigSyncer<F = HttpFetcher> {
    paths: ConfigPaths,
    fetcher: F,
}

impl ConfigSyncer<HttpFetcher> {
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            ConfigPaths::new(&settings.config_path, &settings.backup_path),
            HttpFetcher::new(settings.max_redirects),
        )
    }
}

impl<F: Fetch> ConfigSyncer<F> {
    pub fn new(paths: ConfigPaths, fetcher: F) -> Self {
        Self { paths, fetcher }
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Sync the local configuration with `remote_url`.
    ///
    /// Returns `true` when the primary file was replaced and `false` when the
    /// remote document is byte-identical to the local one (no writes).
    /// `local_exists` tells whether a previous configuration was in use; only
    /// then is a backup taken, and always before the primary is touched.
    pub fn sync(&self, remote_url: &str, local_exists: bool) -> Result<bool> {
        let url = Url::parse(remote_url).map_err(|source| Error::InvalidUrl {
            url: remote_url.to_string(),
            source,
        })?;

        let new_bytes = self.fetcher.fetch(&url)?;

        let current_bytes = match harpoon_fs::read_bytes(&self.paths.primary) {
            Ok(bytes) => bytes,
            Err(e) => {
                // First start with only a remote URL configured
                tracing::info!(
                    "Unable to read current config, will try with new downloaded config file: {}",
                    e
                );
                Vec::new()
            }
        };

        if new_bytes == current_bytes {
            tracing::debug!(url = %url, "Remote config unchanged");
            return Ok(false);
        }

        if local_exists {
            harpoon_fs::write_atomic(&self.paths.backup, &current_bytes).map_err(|source| {
                Error::Backup {
                    primary: self.paths.primary.clone(),
                    backup: self.paths.backup.clone(),
                    source,
                }
            })?;
        }

        harpoon_fs::write_atomic(&self.paths.primary, &new_bytes).map_err(|source| {
            Error::Write {
                path: self.paths.primary.clone(),
                backup: self.paths.backup.clone(),
                source,
            }
        })?;

        tracing::info!(
            path = %self.paths.primary.display(),
            backup = local_exists,
            "Config file updated from {}",
            url
        );
        Ok(true)
    }

    /// Copy the backup over the primary file.
    ///
    /// This is the manual revert path after a bad update; the syncer never
    /// reverts on its own.
    pub fn restore_backup(&self) -> Result<()> {
        let backup = harpoon_fs::read_optional(&self.paths.backup)?.ok_or_else(|| {
            Error::NoBackup {
                path: self.paths.backup.clone(),
            }
        })?;
        harpoon_fs::write_atomic(&self.paths.primary, &backup)?;
        tracing::info!(
            path = %self.paths.primary.display(),
            "Restored config from {}",
            self.paths.backup.display()
        );
        Ok(())
    }
}
