//! Shared test utilities for drydock CLI tests.

#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// Container id every fake runtime hands back from `run`.
pub const FAKE_CONTAINER_ID: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

/// First twelve characters of [`FAKE_CONTAINER_ID`], as used in log prefixes.
pub const FAKE_SHORT_ID: &str = "0123456789ab";

/// A scripted stand-in for the container runtime CLI.
///
/// Writes a small shell script into a temp directory that records every
/// invocation to `calls.log` and answers the subcommands drydock issues
/// (`version`, `run`, `kill`, `logs`, `rm`). Marker files toggle failure
/// behavior per subcommand.
pub struct FakeRuntime {
    temp: TempDir,
    bin: PathBuf,
}

impl FakeRuntime {
    /// Create a fake runtime whose executable is named `docker`.
    pub fn new() -> Self {
        Self::with_name("docker")
    }

    /// Create a fake runtime with a custom executable name (e.g. `podman`).
    pub fn with_name(name: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().to_str().unwrap().to_string();
        let script = format!(
            r#"#!/bin/sh
dir="{dir}"
echo "$*" >> "$dir/calls.log"
case "$1" in
    version)
        echo '{{}}'
        ;;
    run)
        if [ -e "$dir/fail_run" ]; then
            echo "runtime: launch refused" >&2
            exit 1
        fi
        echo "{id}"
        ;;
    kill)
        if [ -e "$dir/fail_kill" ]; then
            echo "runtime: kill refused" >&2
            exit 1
        fi
        ;;
    logs)
        if [ -f "$dir/container.log" ]; then
            cat "$dir/container.log"
        fi
        ;;
    rm)
        if [ -e "$dir/fail_rm" ]; then
            echo "runtime: rm refused" >&2
            exit 1
        fi
        ;;
    *)
        echo "unexpected subcommand: $1" >&2
        exit 64
        ;;
esac
"#,
            dir = dir,
            id = FAKE_CONTAINER_ID,
        );

        let bin = temp.path().join(name);
        std::fs::write(&bin, script).unwrap();
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mut perms = std::fs::metadata(&bin).unwrap().permissions();
            perms.set_mode(0o755);
            std::fs::set_permissions(&bin, perms).unwrap();
        }

        Self { temp, bin }
    }

    /// Absolute path of the fake executable, for `--docker-path`.
    pub fn path(&self) -> &str {
        self.bin.to_str().unwrap()
    }

    /// Directory holding the fake executable, for prepending to `PATH`.
    pub fn dir(&self) -> &Path {
        self.temp.path()
    }

    /// Make the `run` subcommand fail.
    pub fn fail_run(&self) {
        std::fs::write(self.temp.path().join("fail_run"), "").unwrap();
    }

    /// Make the `kill` subcommand fail.
    pub fn fail_kill(&self) {
        std::fs::write(self.temp.path().join("fail_kill"), "").unwrap();
    }

    /// Make the `rm` subcommand fail.
    pub fn fail_rm(&self) {
        std::fs::write(self.temp.path().join("fail_rm"), "").unwrap();
    }

    /// Lines the `logs` subcommand should print.
    pub fn set_container_logs(&self, lines: &[&str]) {
        let mut content = lines.join("\n");
        content.push('\n');
        std::fs::write(self.temp.path().join("container.log"), content).unwrap();
    }

    /// Every recorded invocation, one space-joined argv per line.
    pub fn calls(&self) -> Vec<String> {
        match std::fs::read_to_string(self.temp.path().join("calls.log")) {
            Ok(content) => content.lines().map(str::to_string).collect(),
            Err(_) => Vec::new(),
        }
    }
}

fn serve(listener: TcpListener, response: &'static str) {
    for stream in listener.incoming() {
        let Ok(mut stream) = stream else { continue };
        let mut buf = [0u8; 1024];
        let _ = stream.read(&mut buf);
        let _ = stream.write_all(response.as_bytes());
    }
}

/// Start a minimal HTTP server on an ephemeral port and return the port.
///
/// Every connection gets the given raw response. The serving thread is
/// detached and lives until the test process exits.
pub fn spawn_http_server(response: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    std::thread::spawn(move || serve(listener, response));
    port
}

/// Like [`spawn_http_server`] but the port stays unbound for `delay`,
/// so early connection attempts are refused.
pub fn spawn_http_server_after(delay: Duration, response: &'static str) -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    std::thread::spawn(move || {
        std::thread::sleep(delay);
        let listener = TcpListener::bind(("127.0.0.1", port)).unwrap();
        serve(listener, response);
    });
    port
}

/// A well-formed 200 response.
pub const HTTP_OK: &str = "HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok";

/// A well-formed 500 response.
pub const HTTP_SERVER_ERROR: &str =
    "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";
