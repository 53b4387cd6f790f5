// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Helpers shared by every spec.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::OnceLock;

use assert_cmd::Command;

/// Path to the `thd` binary next to this test executable, building it on
/// first use if the workspace has not been built yet.
fn thd_path() -> &'static Path {
    static PATH: OnceLock<PathBuf> = OnceLock::new();
    PATH.get_or_init(|| {
        let exe = std::env::current_exe().unwrap();
        let target_dir = exe.parent().and_then(Path::parent).unwrap().to_path_buf();
        let path = target_dir.join(format!("thd{}", std::env::consts::EXE_SUFFIX));
        if !path.exists() {
            let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
            let status = std::process::Command::new(cargo)
                .args(["build", "-p", "th-daemon", "--bin", "thd"])
                .status()
                .unwrap();
            assert!(status.success(), "failed to build thd");
        }
        path
    })
}

/// A `thd` invocation with a clean environment.
pub fn thd() -> Thd {
    let mut cmd = Command::new(thd_path());
    cmd.env_remove("TH_CONFIG")
        .env_remove("TH_LOG_DIR")
        .env_remove("TH_SPOOL_DIR")
        .env("HOSTNAME", "spec-host")
        .env("RUST_LOG", "info");
    Thd { cmd }
}

pub struct Thd {
    cmd: Command,
}

impl Thd {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    pub fn env(mut self, key: &str, value: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.env(key, value);
        self
    }

    pub fn config(self, path: &Path) -> Self {
        self.env("TH_CONFIG", path)
    }

    pub fn passes(mut self) -> Run {
        let output = self.cmd.timeout(std::time::Duration::from_secs(30)).output().unwrap();
        assert!(output.status.success(), "thd failed:\n{}", String::from_utf8_lossy(&output.stderr));
        Run { output }
    }

    pub fn fails(mut self) -> Run {
        let output = self.cmd.timeout(std::time::Duration::from_secs(30)).output().unwrap();
        assert!(!output.status.success(), "thd unexpectedly passed");
        Run { output }
    }
}

pub struct Run {
    output: Output,
}

impl Run {
    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = String::from_utf8_lossy(&self.output.stdout);
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = String::from_utf8_lossy(&self.output.stderr);
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }
}

/// A temporary worker installation: config file plus spool, all under one
/// directory.
pub struct Project {
    dir: tempfile::TempDir,
}

impl Project {
    pub fn new() -> Self {
        let project = Self { dir: tempfile::tempdir().unwrap() };
        project.write_config("");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.root().join("config.toml")
    }

    pub fn spool(&self) -> PathBuf {
        self.root().join("spool")
    }

    /// Write a config with `extra` appended to the top-level keys.
    pub fn write_config(&self, extra: &str) {
        let root = self.root().display();
        let text = format!(
            r#"job_working_dir = "{root}/jobs"
git_working_dir = "{root}/git"
pip_download_cache = "{root}/pip"
datasets_dir = "{root}/datasets"
{extra}

[queue]
spool_dir = "{root}/spool"
poll_interval_ms = 10

[git]
url = "{root}/remotes/"
timeout_secs = 5

[validator]
command = "{root}/validate.sh"
"#
        );
        std::fs::write(self.config_path(), text).unwrap();
    }

    /// Submit a job to the spool.
    pub fn submit(&self, job_id: &str, payload: &str) {
        let incoming = self.spool().join("incoming");
        std::fs::create_dir_all(&incoming).unwrap();
        std::fs::write(incoming.join(format!("{job_id}.json")), payload).unwrap();
    }

    /// Status records for `job_id`, as JSON values.
    pub fn status(&self, job_id: &str) -> Vec<serde_json::Value> {
        let path = self.spool().join("status").join(format!("{job_id}.jsonl"));
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}
