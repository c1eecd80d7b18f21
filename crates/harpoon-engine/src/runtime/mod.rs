//! Container runtime port and the container spec it consumes

pub mod podman;

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::{Error, OpContext, Result};

/// Identifier returned by the runtime for a created container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(pub String);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Operations the engine needs from a container runtime.
///
/// Implementations must honour `ctx` for create, start and wait. Remove is
/// called with its own short-lived context so cleanup still happens after
/// the caller's context was cancelled.
pub trait ContainerRuntime {
    fn image_exists(&self, ctx: &OpContext, image: &str) -> Result<bool>;

    fn pull_image(&self, ctx: &OpContext, image: &str) -> Result<()>;

    fn create_container(&self, ctx: &OpContext, spec: &ContainerSpec) -> Result<ContainerId>;

    fn start_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()>;

    /// Block until the container exits and return its exit code.
    fn wait_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<i64>;

    fn remove_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()>;
}

/// Pull `image` unless the runtime already has it.
pub fn ensure_image(runtime: &dyn ContainerRuntime, ctx: &OpContext, image: &str) -> Result<()> {
    if runtime.image_exists(ctx, image)? {
        tracing::debug!(image, "Image present");
        return Ok(());
    }
    tracing::info!(image, "Pulling image");
    runtime.pull_image(ctx, image)
}

/// Namespace sharing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NamespaceMode {
    /// The runtime's default: a fresh namespace per container
    #[default]
    Private,
    /// Join the host's namespace
    Host,
}

/// A bind mount from the host into the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub destination: PathBuf,
    pub read_only: bool,
}

impl Mount {
    /// Read-write bind of `path` to the same path inside the container.
    pub fn bind_same(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            source: path.clone(),
            destination: path,
            read_only: false,
        }
    }
}

/// Immutable, validated description of a container to create.
///
/// Built with [`ContainerSpec::builder`]; the recognised options are image,
/// name, privileged, PID namespace mode, user, environment and mounts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerSpec {
    image: String,
    name: String,
    privileged: bool,
    pid_namespace: NamespaceMode,
    user: Option<String>,
    env: BTreeMap<String, String>,
    mounts: Vec<Mount>,
}

impl ContainerSpec {
    pub fn builder(image: impl Into<String>) -> ContainerSpecBuilder {
        ContainerSpecBuilder {
            image: image.into(),
            name: String::new(),
            privileged: false,
            pid_namespace: NamespaceMode::default(),
            user: None,
            env: BTreeMap::new(),
            mounts: Vec::new(),
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn privileged(&self) -> bool {
        self.privileged
    }

    pub fn pid_namespace(&self) -> NamespaceMode {
        self.pid_namespace
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    pub fn mounts(&self) -> &[Mount] {
        &self.mounts
    }
}

/// Builder for [`ContainerSpec`]. Nothing is checked until [`build`].
///
/// [`build`]: ContainerSpecBuilder::build
#[derive(Debug, Clone)]
pub struct ContainerSpecBuilder {
    image: String,
    name: String,
    privileged: bool,
    pid_namespace: NamespaceMode,
    user: Option<String>,
    env: BTreeMap<String, String>,
    mounts: Vec<Mount>,
}

impl ContainerSpecBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn privileged(mut self, privileged: bool) -> Self {
        self.privileged = privileged;
        self
    }

    pub fn pid_namespace(mut self, mode: NamespaceMode) -> Self {
        self.pid_namespace = mode;
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn mount(mut self, mount: Mount) -> Self {
        self.mounts.push(mount);
        self
    }

    pub fn build(self) -> Result<ContainerSpec> {
        if self.image.trim().is_empty() {
            return Err(Error::invalid_spec("image must not be empty"));
        }
        validate_container_name(&self.name)?;
        if let Some(user) = &self.user
            && user.is_empty()
        {
            return Err(Error::invalid_spec("user must not be empty when set"));
        }
        for key in self.env.keys() {
            if key.is_empty() || key.contains('=') {
                return Err(Error::invalid_spec(format!(
                    "invalid environment variable name {key:?}"
                )));
            }
        }
        for mount in &self.mounts {
            if !mount.source.is_absolute() || !mount.destination.is_absolute() {
                return Err(Error::invalid_spec(format!(
                    "mount paths must be absolute: {} -> {}",
                    mount.source.display(),
                    mount.destination.display()
                )));
            }
        }

        Ok(ContainerSpec {
            image: self.image,
            name: self.name,
            privileged: self.privileged,
            pid_namespace: self.pid_namespace,
            user: self.user,
            env: self.env,
            mounts: self.mounts,
        })
    }
}

/// Container names follow the runtime rule `[a-zA-Z0-9][a-zA-Z0-9_.-]*`.
fn validate_container_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            first.is_ascii_alphanumeric()
                && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_spec(format!("invalid container name {name:?}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn base() -> ContainerSpecBuilder {
        ContainerSpec::builder("quay.io/harpoon/systemd:latest").name("helper")
    }

    #[test]
    fn test_build_keeps_options() {
        let spec = base()
            .privileged(true)
            .pid_namespace(NamespaceMode::Host)
            .user("1000")
            .env("ACTION", "enable")
            .mount(Mount::bind_same("/run/systemd"))
            .build()
            .unwrap();

        assert!(spec.privileged());
        assert_eq!(spec.pid_namespace(), NamespaceMode::Host);
        assert_eq!(spec.user(), Some("1000"));
        assert_eq!(spec.env().get("ACTION").map(String::as_str), Some("enable"));
        assert_eq!(spec.mounts().len(), 1);
    }

    #[test]
    fn test_defaults_are_unprivileged() {
        let spec = base().build().unwrap();

        assert!(!spec.privileged());
        assert_eq!(spec.pid_namespace(), NamespaceMode::Private);
        assert_eq!(spec.user(), None);
    }

    #[test]
    fn test_empty_image_rejected() {
        let err = ContainerSpec::builder(" ").name("helper").build().unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { .. }));
    }

    #[test]
    fn test_relative_mount_rejected() {
        let err = base()
            .mount(Mount::bind_same("run/systemd"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("absolute"));
    }

    #[test]
    fn test_bad_env_key_rejected() {
        let err = base().env("A=B", "c").build().unwrap_err();
        assert!(matches!(err, Error::InvalidSpec { .. }));
    }

    #[rstest]
    #[case("systemd-enable-httpd.service-web", true)]
    #[case("a", true)]
    #[case("", false)]
    #[case("-leading-dash", false)]
    #[case("has space", false)]
    #[case("slash/name", false)]
    fn test_container_names(#[case] name: &str, #[case] valid: bool) {
        assert_eq!(validate_container_name(name).is_ok(), valid);
    }
}
