//! [`ContainerRuntime`] backed by the `podman` CLI
//!
//! Every call spawns the runtime binary and polls it until it exits, the
//! per-call timeout passes, or the [`OpContext`] is cancelled or expires.
//! In the last two cases the CLI process is killed. The binary is
//! configurable, and the flags used are shared with `docker`.

use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use harpoon_config::Settings;

use super::{ContainerId, ContainerRuntime, ContainerSpec, NamespaceMode};
use crate::{Error, OpContext, Result};

/// How often a running CLI call is checked for exit or cancellation.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Default upper bound for a single CLI call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Container runtime driven through its command-line client.
#[derive(Debug, Clone)]
pub struct PodmanCli {
    binary: PathBuf,
    timeout: Duration,
}

struct CommandOutput {
    status: ExitStatus,
    stdout: String,
    stderr: String,
}

impl Default for PodmanCli {
    fn default() -> Self {
        Self::new("podman", DEFAULT_CALL_TIMEOUT)
    }
}

impl PodmanCli {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.runtime_binary, settings.runtime_timeout())
    }

    /// Run the CLI and return its output whatever the exit status.
    fn execute(
        &self,
        ctx: &OpContext,
        operation: &'static str,
        args: &[String],
    ) -> Result<CommandOutput> {
        ctx.check(operation)?;
        tracing::trace!(binary = %self.binary.display(), ?args, "Running container runtime");

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                Error::runtime(
                    operation,
                    format!("failed to spawn {}: {e}", self.binary.display()),
                )
            })?;

        // Drain both pipes while waiting so a chatty child cannot block on a
        // full pipe buffer
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let call_deadline = Instant::now() + self.timeout;
        let expired = || ctx.is_expired() || Instant::now() >= call_deadline;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    kill(&mut child);
                    return Err(Error::runtime(operation, format!("waiting for child: {e}")));
                }
            }
            if ctx.is_cancelled() {
                kill(&mut child);
                return Err(Error::Cancelled { operation });
            }
            if expired() {
                kill(&mut child);
                return Err(Error::DeadlineExceeded { operation });
            }
            thread::sleep(POLL_INTERVAL);
        };

        // Anything the CLI left running in the background can keep the pipes
        // open after it exits, so reading them is bounded the same way
        let mut outputs = [stdout, stderr].map(|rx| rx.map(|rx| (rx, None)));
        loop {
            for (rx, out) in outputs.iter_mut().flatten() {
                if out.is_none() {
                    match rx.recv_timeout(POLL_INTERVAL) {
                        Ok(text) => *out = Some(text),
                        Err(RecvTimeoutError::Timeout) => {}
                        Err(RecvTimeoutError::Disconnected) => *out = Some(String::new()),
                    }
                }
            }
            if outputs.iter().flatten().all(|(_, out)| out.is_some()) {
                break;
            }
            if ctx.is_cancelled() {
                return Err(Error::Cancelled { operation });
            }
            if expired() {
                tracing::warn!(
                    binary = %self.binary.display(),
                    "Runtime exited but its output pipes stayed open"
                );
                return Err(Error::DeadlineExceeded { operation });
            }
        }
        let [stdout, stderr] =
            outputs.map(|o| o.and_then(|(_, out)| out).unwrap_or_default());

        Ok(CommandOutput {
            status,
            stdout,
            stderr,
        })
    }

    /// Run the CLI and fail unless it exits successfully.
    fn run(&self, ctx: &OpContext, operation: &'static str, args: &[String]) -> Result<String> {
        let output = self.execute(ctx, operation, args)?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = output.stderr.trim();
        let message = if stderr.is_empty() {
            format!("{} exited with {}", self.binary.display(), output.status)
        } else {
            stderr.to_string()
        };
        Err(Error::runtime(operation, message))
    }
}

impl ContainerRuntime for PodmanCli {
    fn image_exists(&self, ctx: &OpContext, image: &str) -> Result<bool> {
        let output = self.execute(
            ctx,
            "inspect image",
            &args(&["image", "inspect", "--format", "{{.Id}}", image]),
        )?;
        Ok(output.status.success())
    }

    fn pull_image(&self, ctx: &OpContext, image: &str) -> Result<()> {
        self.run(ctx, "pull image", &args(&["pull", image]))?;
        Ok(())
    }

    fn create_container(&self, ctx: &OpContext, spec: &ContainerSpec) -> Result<ContainerId> {
        let stdout = self.run(ctx, "create container", &create_args(spec))?;
        let id = stdout
            .lines()
            .map(str::trim)
            .rfind(|line| !line.is_empty())
            .ok_or_else(|| Error::runtime("create container", "no container id on stdout"))?;
        Ok(ContainerId(id.to_string()))
    }

    fn start_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()> {
        self.run(ctx, "start container", &args(&["start", &id.0]))?;
        Ok(())
    }

    fn wait_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<i64> {
        let stdout = self.run(ctx, "wait for container", &args(&["wait", &id.0]))?;
        let code = stdout.trim();
        code.parse().map_err(|_| {
            Error::runtime("wait for container", format!("unexpected exit code {code:?}"))
        })
    }

    fn remove_container(&self, ctx: &OpContext, id: &ContainerId) -> Result<()> {
        self.run(ctx, "remove container", &args(&["rm", "--force", &id.0]))?;
        Ok(())
    }
}

fn args(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// Command line for `create`, in a stable order.
fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut out = args(&["create", "--name", spec.name()]);
    if spec.privileged() {
        out.push("--privileged".into());
    }
    if spec.pid_namespace() == NamespaceMode::Host {
        out.extend(args(&["--pid", "host"]));
    }
    if let Some(user) = spec.user() {
        out.extend(args(&["--user", user]));
    }
    for (key, value) in spec.env() {
        out.push("--env".into());
        out.push(format!("{key}={value}"));
    }
    for mount in spec.mounts() {
        out.push("--volume".into());
        out.push(format!(
            "{}:{}:{}",
            mount.source.display(),
            mount.destination.display(),
            if mount.read_only { "ro" } else { "rw" }
        ));
    }
    out.push(spec.image().to_string());
    out
}

/// Read a pipe to the end on its own thread and hand the text over once done.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<Receiver<String>> {
    pipe.map(|mut pipe| {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = Vec::new();
            let _ = pipe.read_to_end(&mut buf);
            let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
        });
        rx
    })
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Mount;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_create_args_for_privileged_host_pid_spec() {
        let spec = ContainerSpec::builder("quay.io/harpoon/systemd:latest")
            .name("systemd-restart-httpd.service-web")
            .privileged(true)
            .pid_namespace(NamespaceMode::Host)
            .env("SERVICE", "httpd.service")
            .env("ACTION", "restart")
            .env("ROOT", "true")
            .mount(Mount::bind_same("/etc/systemd/system"))
            .mount(Mount::bind_same("/run/systemd"))
            .build()
            .unwrap();

        assert_eq!(
            create_args(&spec),
            args(&[
                "create",
                "--name",
                "systemd-restart-httpd.service-web",
                "--privileged",
                "--pid",
                "host",
                "--env",
                "ACTION=restart",
                "--env",
                "ROOT=true",
                "--env",
                "SERVICE=httpd.service",
                "--volume",
                "/etc/systemd/system:/etc/systemd/system:rw",
                "--volume",
                "/run/systemd:/run/systemd:rw",
                "quay.io/harpoon/systemd:latest",
            ])
        );
    }

    #[test]
    fn test_create_args_with_user_and_read_only_mount() {
        let spec = ContainerSpec::builder("img")
            .name("n")
            .user("1000")
            .mount(Mount {
                source: "/src".into(),
                destination: "/dst".into(),
                read_only: true,
            })
            .build()
            .unwrap();

        assert_eq!(
            create_args(&spec),
            args(&["create", "--name", "n", "--user", "1000", "--volume", "/src:/dst:ro", "img"])
        );
    }
}
