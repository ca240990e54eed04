use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::ExitStatus;

use assert_cmd::Command;
use tempfile::TempDir;

/// Temporary workspace directory the binary runs in.
pub struct ConfigWorkspace {
    _dir: TempDir,
    pub root: PathBuf,
}

impl ConfigWorkspace {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().to_path_buf();
        Self { _dir: dir, root }
    }

    pub fn db_path(&self) -> PathBuf {
        self.root.join(".easyconfig").join("config.db")
    }
}

pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CmdOutput {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.stdout)
            .unwrap_or_else(|e| panic!("stdout is not JSON ({e}): {}", self.stdout))
    }
}

/// Run `ecfg` inside `workspace`, isolated from the caller's environment.
pub fn run_ecfg<I, S>(workspace: &ConfigWorkspace, args: I, label: &str) -> CmdOutput
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let output = Command::cargo_bin("ecfg")
        .expect("ecfg binary")
        .current_dir(&workspace.root)
        .env_remove("EASYCONFIG_DB")
        .env_remove("EASYCONFIG_CACHE")
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("{label}: failed to run ecfg: {e}"));

    CmdOutput {
        status: output.status,
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
