//! Systemd command implementation

use std::path::{Path, PathBuf};

use colored::Colorize;
use harpoon_config::Settings;
use harpoon_engine::{
    ApplyOutcome, MountContext, OpContext, PodmanCli, SystemdApplier, SystemdMethod, Target,
};

use crate::error::Result;

/// Arguments of the `systemd` command.
#[derive(Debug, Clone)]
pub struct SystemdArgs {
    pub name: String,
    pub file: PathBuf,
    pub dest: Option<PathBuf>,
    pub enable: bool,
    pub restart_always: bool,
    pub root: bool,
}

/// Apply the systemd method for one unit file.
pub fn run_systemd(settings: &Settings, args: SystemdArgs) -> Result<()> {
    let mut target = Target::new(args.name).with_systemd(SystemdMethod {
        enable: args.enable,
        restart_always: args.restart_always,
        root: args.root,
    });
    target.path = args
        .file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    target.dest = args.dest;
    let dest = target.systemd_dest();

    let runtime = PodmanCli::from_settings(settings);
    let applier = SystemdApplier::from_settings(settings);
    let mo = MountContext {
        runtime: &runtime,
        target: &target,
        path: &args.file,
        dest: &dest,
    };

    match applier.apply(&OpContext::new(), &mo)? {
        ApplyOutcome::NoAction => {
            println!(
                "{} nothing to do: pass --enable or --restart-always",
                "=".dimmed()
            );
        }
        ApplyOutcome::Skipped { service, message } => {
            println!("{} {}: {}", "skipped".yellow(), service, message);
        }
        ApplyOutcome::Applied {
            action,
            service,
            container,
        } => {
            println!(
                "{} systemctl {} {} (helper {})",
                "+".green(),
                action,
                service.cyan(),
                container
            );
        }
    }
    Ok(())
}
