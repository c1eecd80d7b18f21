//! Config sync commands

use colored::Colorize;
use harpoon_config::settings::ENV_CONFIG_URL;
use harpoon_config::{ConfigSyncer, Settings};

use crate::error::{CliError, Result};

/// Fetch the remote configuration and replace the local file if it changed.
pub fn run_sync_config(settings: &Settings, url: Option<&str>) -> Result<()> {
    let url = url.or(settings.config_url.as_deref()).ok_or_else(|| {
        CliError::user(format!(
            "No config URL: pass --url, set config_url in the settings or set {ENV_CONFIG_URL}"
        ))
    })?;

    let syncer: ConfigSyncer = ConfigSyncer::from_settings(settings);
    let local_exists = settings.config_path.exists();

    if syncer.sync(url, local_exists)? {
        println!(
            "{} {} updated from {}",
            "+".green(),
            settings.config_path.display(),
            url.cyan()
        );
        if local_exists {
            println!(
                "  previous version saved to {}",
                settings.backup_path.display()
            );
        }
    } else {
        println!(
            "{} {} is up to date",
            "=".dimmed(),
            settings.config_path.display()
        );
    }
    Ok(())
}

/// Copy the backup over the primary configuration file.
pub fn run_restore_config(settings: &Settings) -> Result<()> {
    let syncer: ConfigSyncer = ConfigSyncer::from_settings(settings);
    syncer.restore_backup()?;
    println!(
        "{} {} restored from {}",
        "+".green(),
        settings.config_path.display(),
        settings.backup_path.display()
    );
    Ok(())
}
