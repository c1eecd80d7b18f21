//! Target records supplied by the external registry

use std::path::PathBuf;

use serde::Deserialize;

/// Unit directory for root-scoped services.
pub const SYSTEM_UNIT_DIR: &str = "/etc/systemd/system";

/// A named host configuration unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    /// Directory inside the repository that this target watches
    #[serde(default)]
    pub path: PathBuf,
    /// Suffix allow-list for changed files; absent means every file
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Host directory the unit files are placed in
    #[serde(default)]
    pub dest: Option<PathBuf>,
    #[serde(default)]
    pub methods: Methods,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Methods {
    #[serde(default)]
    pub systemd: Option<SystemdMethod>,
}

/// Declared systemd intent of a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SystemdMethod {
    pub enable: bool,
    #[serde(alias = "restart_always")]
    pub restart_always: bool,
    pub root: bool,
}

impl Target {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_systemd(mut self, method: SystemdMethod) -> Self {
        self.methods.systemd = Some(method);
        self
    }

    /// Where this target's unit files live on the host.
    ///
    /// An explicit `dest` wins. Otherwise root targets use
    /// [`SYSTEM_UNIT_DIR`] and user targets `~/.config/systemd/user`.
    pub fn systemd_dest(&self) -> PathBuf {
        if let Some(dest) = &self.dest {
            return dest.clone();
        }
        let root = self.methods.systemd.is_some_and(|sd| sd.root);
        if root {
            PathBuf::from(SYSTEM_UNIT_DIR)
        } else {
            dirs::home_dir()
                .unwrap_or_default()
                .join(".config/systemd/user")
        }
    }
}
