//! PodmanCli against a stand-in runtime script
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use harpoon_engine::{
    ContainerId, ContainerRuntime, ContainerSpec, Error, Mount, NamespaceMode, OpContext,
    PodmanCli,
};
use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;

struct FakeCli {
    dir: TempDir,
}

const DEFAULT_CASES: &str = r#"
  image) echo "Error: no such image" >&2; exit 1 ;;
  pull) sleep 5 ;;
  create) echo "Resolving image"; echo "3f2a9c1e"; echo "" ;;
  start) echo "Error: OCI runtime error" >&2; exit 125 ;;
  wait) echo 7 ;;
  rm) exit 0 ;;
"#;

impl FakeCli {
    /// Script that logs its arguments and answers per subcommand.
    fn new() -> Self {
        Self::with_cases(DEFAULT_CASES)
    }

    /// Same logging script with custom `case` arms for `$1`.
    fn with_cases(cases: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let log = dir.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\nprintf '%s\\n' \"$*\" >> '{log}'\ncase \"$1\" in\n{cases}\nesac\n",
            log = log.display()
        );
        let bin = dir.path().join("podman");
        fs::write(&bin, script).unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    fn binary(&self) -> PathBuf {
        self.dir.path().join("podman")
    }

    fn cli(&self, timeout: Duration) -> PodmanCli {
        PodmanCli::new(self.binary(), timeout)
    }

    fn calls(&self) -> Vec<String> {
        read_log(&self.dir.path().join("calls.log"))
    }
}

fn read_log(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

const LONG: Duration = Duration::from_secs(30);

#[test]
#[serial]
fn test_missing_image_reports_false() {
    let fake = FakeCli::new();

    let exists = fake
        .cli(LONG)
        .image_exists(&OpContext::new(), "quay.io/harpoon/systemd:latest")
        .unwrap();

    assert!(!exists);
    assert_eq!(
        fake.calls(),
        vec!["image inspect --format {{.Id}} quay.io/harpoon/systemd:latest"]
    );
}

#[test]
#[serial]
fn test_create_returns_last_stdout_line() {
    let fake = FakeCli::new();
    let spec = ContainerSpec::builder("img")
        .name("systemd-enable-httpd.service-web")
        .privileged(true)
        .pid_namespace(NamespaceMode::Host)
        .env("ACTION", "enable")
        .mount(Mount::bind_same("/run/systemd"))
        .build()
        .unwrap();

    let id = fake
        .cli(LONG)
        .create_container(&OpContext::new(), &spec)
        .unwrap();

    assert_eq!(id, ContainerId("3f2a9c1e".into()));
    assert_eq!(
        fake.calls(),
        vec![
            "create --name systemd-enable-httpd.service-web --privileged --pid host \
             --env ACTION=enable --volume /run/systemd:/run/systemd:rw img"
        ]
    );
}

#[test]
#[serial]
fn test_wait_parses_exit_code() {
    let fake = FakeCli::new();

    let code = fake
        .cli(LONG)
        .wait_container(&OpContext::new(), &ContainerId("3f2a9c1e".into()))
        .unwrap();

    assert_eq!(code, 7);
}

#[test]
#[serial]
fn test_failed_call_carries_stderr() {
    let fake = FakeCli::new();

    let err = fake
        .cli(LONG)
        .start_container(&OpContext::new(), &ContainerId("3f2a9c1e".into()))
        .unwrap_err();

    match err {
        Error::Runtime { operation, message } => {
            assert_eq!(operation, "start container");
            assert_eq!(message, "Error: OCI runtime error");
        }
        other => panic!("expected runtime error, got {other:?}"),
    }
}

#[test]
#[serial]
fn test_remove_uses_force() {
    let fake = FakeCli::new();

    fake.cli(LONG)
        .remove_container(&OpContext::new(), &ContainerId("3f2a9c1e".into()))
        .unwrap();

    assert_eq!(fake.calls(), vec!["rm --force 3f2a9c1e"]);
}

#[test]
#[serial]
fn test_slow_call_is_killed_at_timeout() {
    let fake = FakeCli::new();
    let started = Instant::now();

    let err = fake
        .cli(Duration::from_millis(200))
        .pull_image(&OpContext::new(), "img")
        .unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded { operation: "pull image" }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
#[serial]
fn test_context_deadline_bounds_call() {
    let fake = FakeCli::new();
    let ctx = OpContext::with_timeout(Duration::from_millis(200));

    let err = fake.cli(LONG).pull_image(&ctx, "img").unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded { .. }), "got {err:?}");
}

#[test]
#[serial]
fn test_cancel_while_running_kills_call() {
    let fake = FakeCli::new();
    let ctx = OpContext::new();
    let canceller = ctx.clone();
    let started = Instant::now();

    let err = std::thread::scope(|s| {
        s.spawn(move || {
            std::thread::sleep(Duration::from_millis(150));
            canceller.cancel();
        });
        fake.cli(LONG).pull_image(&ctx, "img").unwrap_err()
    });

    assert!(matches!(err, Error::Cancelled { operation: "pull image" }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[test]
#[serial]
fn test_background_child_holding_pipes_does_not_outlive_deadline() {
    // The CLI exits at once but leaves a child with its stdout open
    let fake = FakeCli::with_cases("  start) sleep 4 & exit 0 ;;");
    let timeout = Duration::from_millis(500);
    let started = Instant::now();

    let err = fake
        .cli(timeout)
        .start_container(
            &OpContext::with_timeout(timeout),
            &ContainerId("3f2a9c1e".into()),
        )
        .unwrap_err();

    assert!(matches!(err, Error::DeadlineExceeded { operation: "start container" }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
}

#[test]
#[serial]
fn test_cancel_while_reading_leftover_pipes() {
    let fake = FakeCli::with_cases("  start) sleep 4 & exit 0 ;;");
    let ctx = OpContext::new();
    let canceller = ctx.clone();
    let started = Instant::now();

    let err = std::thread::scope(|s| {
        s.spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            canceller.cancel();
        });
        fake.cli(LONG)
            .start_container(&ctx, &ContainerId("3f2a9c1e".into()))
            .unwrap_err()
    });

    assert!(matches!(err, Error::Cancelled { operation: "start container" }), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[test]
#[serial]
fn test_cancelled_context_spawns_nothing() {
    let fake = FakeCli::new();
    let ctx = OpContext::new();
    ctx.cancel();

    let err = fake.cli(LONG).pull_image(&ctx, "img").unwrap_err();

    assert!(matches!(err, Error::Cancelled { .. }));
    assert!(fake.calls().is_empty());
}

#[test]
#[serial]
fn test_missing_binary_is_runtime_error() {
    let dir = TempDir::new().unwrap();
    let cli = PodmanCli::new(dir.path().join("no-such-podman"), LONG);

    let err = cli.image_exists(&OpContext::new(), "img").unwrap_err();

    assert!(err.to_string().contains("failed to spawn"), "got {err}");
}
