//! Host apply methods for the harpoon GitOps agent
//!
//! A [`Target`] declares how its files are applied on the host. This crate
//! implements the systemd method: a short-lived privileged helper container
//! runs `systemctl` against the host's service manager. The container
//! runtime is reached only through the [`ContainerRuntime`] port, which the
//! caller supplies per call.

pub mod context;
pub mod error;
pub mod runtime;
pub mod systemd;
pub mod target;

pub use context::OpContext;
pub use error::{Error, Result};
pub use runtime::podman::PodmanCli;
pub use runtime::{ContainerId, ContainerRuntime, ContainerSpec, Mount, NamespaceMode};
pub use systemd::{ApplyOutcome, MountContext, SystemdAction, SystemdApplier, SystemdScope};
pub use target::{Methods, SystemdMethod, Target};
