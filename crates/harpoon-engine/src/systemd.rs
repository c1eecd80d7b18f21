//! The systemd apply method
//!
//! Applying a systemd target runs `systemctl <action> <service>` on the host
//! through a privileged helper container. The helper shares the host PID
//! namespace and gets the unit directory plus the systemd control directory
//! bind-mounted; its entrypoint reads `ROOT`, `SERVICE` and `ACTION` from
//! the environment.
//!
//! Only root-scoped services are applied. Non-root targets are reported as
//! [`ApplyOutcome::Skipped`] and have to be enabled by hand on the host.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use harpoon_config::Settings;

use crate::runtime::{self, ContainerRuntime, ContainerSpec, Mount, NamespaceMode};
use crate::{Error, OpContext, Result, SystemdMethod, Target};

/// Control directory of the system service manager.
pub const SYSTEM_CONTROL_DIR: &str = "/run/systemd";

/// User the helper runs as for user-scoped services.
pub const DEFAULT_USER_UID: u32 = 1000;

/// Time allowed for removing the helper once the action is over.
const REMOVE_TIMEOUT: Duration = Duration::from_secs(30);

/// What the helper asks systemd to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemdAction {
    Enable,
    Restart,
}

impl SystemdAction {
    /// Pick the action a target declares. Restart wins over enable.
    pub fn select(method: &SystemdMethod) -> Option<Self> {
        if method.restart_always {
            Some(Self::Restart)
        } else if method.enable {
            Some(Self::Enable)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Restart => "restart",
        }
    }
}

impl fmt::Display for SystemdAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which service manager instance the helper talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemdScope {
    System,
    User { uid: u32 },
}

impl SystemdScope {
    pub fn for_method(method: &SystemdMethod) -> Self {
        if method.root {
            Self::System
        } else {
            Self::User {
                uid: DEFAULT_USER_UID,
            }
        }
    }

    /// Directory holding the service manager's control socket.
    pub fn control_dir(self) -> PathBuf {
        match self {
            Self::System => PathBuf::from(SYSTEM_CONTROL_DIR),
            Self::User { uid } => PathBuf::from(format!("/run/user/{uid}/systemd")),
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, Self::System)
    }
}

/// Everything one apply call needs. Built per call and dropped after.
pub struct MountContext<'a> {
    /// Connection to the container runtime
    pub runtime: &'a dyn ContainerRuntime,
    pub target: &'a Target,
    /// Changed unit file; its file name is the service name
    pub path: &'a Path,
    /// Resolved host directory the unit file is placed in
    pub dest: &'a Path,
}

/// Result of an apply call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The target declares neither enable nor restart
    NoAction,
    /// The action needs to be performed on the host by hand
    Skipped { service: String, message: String },
    Applied {
        action: SystemdAction,
        service: String,
        container: String,
    },
}

/// Deterministic helper name; a second concurrent apply for the same target
/// and action collides on it at create.
pub fn container_name(action: SystemdAction, service: &str, target: &str) -> String {
    format!("systemd-{action}-{service}-{target}")
}

/// Container spec for the systemd helper.
pub fn helper_spec(
    image: &str,
    action: SystemdAction,
    service: &str,
    target: &str,
    dest: &Path,
    scope: SystemdScope,
) -> Result<ContainerSpec> {
    let mut builder = ContainerSpec::builder(image)
        .name(container_name(action, service, target))
        .privileged(true)
        .pid_namespace(NamespaceMode::Host)
        .env("ROOT", scope.is_root().to_string())
        .env("SERVICE", service)
        .env("ACTION", action.as_str())
        .mount(Mount::bind_same(dest))
        .mount(Mount::bind_same(scope.control_dir()));
    if let SystemdScope::User { uid } = scope {
        builder = builder.user(uid.to_string());
    }
    builder.build()
}

/// Applies systemd targets through the helper container.
#[derive(Debug, Clone)]
pub struct SystemdApplier {
    image: String,
}

impl SystemdApplier {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.systemd_image)
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn apply(&self, ctx: &OpContext, mo: &MountContext<'_>) -> Result<ApplyOutcome> {
        let Some(method) = mo.target.methods.systemd else {
            return Ok(ApplyOutcome::NoAction);
        };
        let Some(action) = SystemdAction::select(&method) else {
            return Ok(ApplyOutcome::NoAction);
        };
        let service = mo
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| Error::NoServiceName {
                path: mo.path.to_path_buf(),
            })?;

        tracing::info!(
            target_name = %mo.target.name,
            "Running systemctl {} {}",
            action,
            service
        );

        runtime::ensure_image(mo.runtime, ctx, &self.image)?;

        let scope = SystemdScope::for_method(&method);
        if !scope.is_root() {
            tracing::info!("At this time, harpoon non-root user cannot enable systemd service on the host");
            tracing::info!(
                "To enable this non-root service, run 'systemctl --user {} {}' on host machine",
                action,
                service
            );
            tracing::info!("To enable service as root, run with systemd root = true");
            return Ok(ApplyOutcome::Skipped {
                message: format!(
                    "non-root systemd services are not managed; run 'systemctl --user {action} {service}' on the host"
                ),
                service,
            });
        }

        let spec = helper_spec(&self.image, action, &service, &mo.target.name, mo.dest, scope)?;
        run_helper(mo.runtime, ctx, &spec)?;

        tracing::info!(
            target_name = %mo.target.name,
            "systemd {} {} complete",
            action,
            service
        );
        Ok(ApplyOutcome::Applied {
            action,
            service,
            container: spec.name().to_string(),
        })
    }
}

/// Create, start and wait for the helper, then remove it whatever happened.
fn run_helper(runtime: &dyn ContainerRuntime, ctx: &OpContext, spec: &ContainerSpec) -> Result<()> {
    ctx.check("create container")?;
    let id = runtime.create_container(ctx, spec)?;
    tracing::debug!(container = spec.name(), %id, "Created helper container");

    let result = runtime
        .start_container(ctx, &id)
        .and_then(|()| runtime.wait_container(ctx, &id))
        .and_then(|exit_code| {
            if exit_code == 0 {
                Ok(())
            } else {
                Err(Error::HelperFailed {
                    container: spec.name().to_string(),
                    exit_code,
                })
            }
        });

    // Fresh context: removal must still run after the caller cancelled
    let cleanup = OpContext::with_timeout(REMOVE_TIMEOUT);
    let removed = runtime.remove_container(&cleanup, &id);

    match (result, removed) {
        (Ok(()), Ok(())) => Ok(()),
        (Ok(()), Err(e)) => Err(e),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(remove_err)) => {
            tracing::warn!(
                container = spec.name(),
                error = %remove_err,
                "Failed to remove helper container"
            );
            Err(e)
        }
    }
}
