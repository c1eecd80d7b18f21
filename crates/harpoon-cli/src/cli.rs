//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Default location of the engine settings file.
pub const DEFAULT_SETTINGS_PATH: &str = "/opt/harpoon/harpoon.toml";

/// harpoon - GitOps agent for container hosts
#[derive(Parser, Debug)]
#[command(name = "harpoon")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Engine settings file (TOML); defaults apply when it does not exist
    #[arg(
        long,
        global = true,
        env = "HARPOON_SETTINGS",
        default_value = DEFAULT_SETTINGS_PATH
    )]
    pub settings: PathBuf,

    /// The command to run
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Sync the local configuration file with its remote URL
    ///
    /// The previous file is backed up before it is replaced.
    SyncConfig {
        /// Remote URL; overrides `config_url` from the settings
        #[arg(long)]
        url: Option<String>,
    },

    /// Put the backed-up configuration file back in place
    RestoreConfig,

    /// List files changed in a repository
    ///
    /// Examples:
    ///   harpoon changes --repo /srv/fleet                 # every file at HEAD
    ///   harpoon changes --repo /srv/fleet --since 3f2a9c1 # changed since a commit
    ///   harpoon changes --repo . -t .service -t .timer    # only unit files
    Changes {
        /// Repository to inspect
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Commit to compare HEAD against; without it every file is new
        #[arg(long)]
        since: Option<String>,

        /// Only list files whose names end with one of these suffixes
        #[arg(short, long = "tag")]
        tags: Vec<String>,

        /// Print the new content of each changed file
        #[arg(long)]
        content: bool,
    },

    /// Enable or restart a systemd unit through the helper container
    Systemd {
        /// Target name, used in the helper container name
        #[arg(long)]
        name: String,

        /// Unit file; its file name is the service name
        #[arg(long)]
        file: PathBuf,

        /// Host directory the unit file lives in
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Run `systemctl enable`
        #[arg(long)]
        enable: bool,

        /// Run `systemctl restart`; wins over --enable
        #[arg(long)]
        restart_always: bool,

        /// Act on the system service manager instead of the user one
        #[arg(long)]
        root: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_changes_with_tags() {
        let cli = Cli::try_parse_from([
            "harpoon", "changes", "--repo", "/srv/fleet", "-t", ".service", "--tag", ".timer",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Changes {
                repo: PathBuf::from("/srv/fleet"),
                since: None,
                tags: vec![".service".into(), ".timer".into()],
                content: false,
            }
        );
    }

    #[test]
    fn parse_systemd_flags() {
        let cli = Cli::try_parse_from([
            "harpoon",
            "systemd",
            "--name",
            "web",
            "--file",
            "units/httpd.service",
            "--restart-always",
            "--root",
        ])
        .unwrap();
        match cli.command {
            Commands::Systemd {
                restart_always,
                root,
                enable,
                ..
            } => {
                assert!(restart_always);
                assert!(root);
                assert!(!enable);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parse_global_settings_after_subcommand() {
        let cli =
            Cli::try_parse_from(["harpoon", "restore-config", "--settings", "/tmp/h.toml", "-v"])
                .unwrap();
        assert_eq!(cli.settings, PathBuf::from("/tmp/h.toml"));
        assert!(cli.verbose);
    }
}
