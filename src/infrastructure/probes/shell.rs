//! Local and remote command execution for probes.
//!
//! Remote commands go through the system `ssh` client in batch mode, so
//! authentication comes from the invoking user's agent and `~/.ssh/config`.
//! Each `(host, user)` pair is connected at most once per run: the first
//! probe to need it opens a master connection and every other probe,
//! including concurrent ones, awaits the same outcome and then runs its
//! commands over that connection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::process::Command;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, warn};

/// Captured result of a finished command.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Last non-empty line of stderr, falling back to stdout.
    pub fn summary(&self) -> String {
        [&self.stderr, &self.stdout]
            .iter()
            .find_map(|text| text.lines().rev().find(|l| !l.trim().is_empty()))
            .map_or_else(|| "no output".to_string(), |l| l.trim().to_string())
    }
}

/// Run a local program to completion.
pub async fn run_local(program: &str, args: &[&str]) -> Result<CommandOutput> {
    debug!(program, args = ?args, "Running local command");
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("Failed to execute {program}"))?;

    Ok(CommandOutput {
        success: output.status.success(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

/// Quote `s` for a POSIX shell.
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

type SessionKey = (String, String);

/// Seconds an idle master connection is kept open.
const CONTROL_PERSIST_SECS: u32 = 60;

/// One `(host, user)` connection slot.
#[derive(Debug)]
struct SessionSlot {
    control_path: Option<PathBuf>,
    ready: OnceCell<Result<(), String>>,
}

/// Multiplexed SSH connections per `(host, user)`.
///
/// The first use of a pair starts an OpenSSH master connection on a control
/// socket in a private temporary directory; every later command for that
/// pair runs over the socket without a new handshake. Masters are closed
/// when the sessions are dropped.
#[derive(Debug)]
pub struct SshSessions {
    program: PathBuf,
    control_dir: Option<TempDir>,
    sessions: Mutex<HashMap<SessionKey, Arc<SessionSlot>>>,
}

impl Default for SshSessions {
    fn default() -> Self {
        Self::new()
    }
}

impl SshSessions {
    pub fn new() -> Self {
        Self::with_program("ssh")
    }

    fn with_program(program: impl Into<PathBuf>) -> Self {
        let control_dir = match tempfile::Builder::new().prefix("cmon-ssh-").tempdir() {
            Ok(dir) => Some(dir),
            Err(e) => {
                warn!(error = %e, "No control socket directory, ssh connections will not be shared");
                None
            }
        };
        Self {
            program: program.into(),
            control_dir,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    async fn slot(&self, hostname: &str, user: &str) -> Arc<SessionSlot> {
        let mut sessions = self.sessions.lock().await;
        let next = sessions.len();
        Arc::clone(
            sessions
                .entry((hostname.to_string(), user.to_string()))
                .or_insert_with(|| {
                    Arc::new(SessionSlot {
                        control_path: self
                            .control_dir
                            .as_ref()
                            .map(|dir| dir.path().join(next.to_string())),
                        ready: OnceCell::new(),
                    })
                }),
        )
    }

    /// Ensure `user@hostname` is reachable, opening the master connection on
    /// first use.
    ///
    /// A failed connection is remembered too, so a down host costs one
    /// timeout per run rather than one per probe.
    pub async fn connect(&self, hostname: &str, user: &str) -> Result<()> {
        let slot = self.slot(hostname, user).await;
        self.ensure_master(&slot, hostname, user).await
    }

    async fn ensure_master(&self, slot: &SessionSlot, hostname: &str, user: &str) -> Result<()> {
        slot.ready
            .get_or_init(|| async {
                info!(host = hostname, user, "ssh connect");
                let mut cmd = self.command(hostname, user);
                if let Some(path) = &slot.control_path {
                    cmd.arg("-o").arg("ControlMaster=auto");
                    cmd.arg("-o").arg(format!("ControlPersist={CONTROL_PERSIST_SECS}"));
                    cmd.arg("-o").arg(control_path_option(path));
                }
                match cmd.arg(hostname).arg("true").output().await {
                    Ok(output) if output.status.success() => Ok(()),
                    Ok(output) => Err(format!(
                        "ssh {user}@{hostname}: {}",
                        String::from_utf8_lossy(&output.stderr).trim()
                    )),
                    Err(e) => Err(format!("ssh {user}@{hostname}: {e}")),
                }
            })
            .await
            .clone()
            .map_err(anyhow::Error::msg)
    }

    /// Run `command` on `user@hostname` and return its stdout.
    ///
    /// A non-zero exit status is an error carrying the remote stderr.
    pub async fn exec(&self, hostname: &str, user: &str, command: &str) -> Result<String> {
        let slot = self.slot(hostname, user).await;
        self.ensure_master(&slot, hostname, user).await?;

        debug!(host = hostname, user, command, "ssh exec");
        let mut cmd = self.command(hostname, user);
        if let Some(path) = &slot.control_path {
            cmd.arg("-o").arg("ControlMaster=no");
            cmd.arg("-o").arg(control_path_option(path));
        }
        let output = cmd
            .arg(hostname)
            .arg(command)
            .output()
            .await
            .with_context(|| format!("Failed to run ssh to {hostname}"))?;

        if !output.status.success() {
            anyhow::bail!(
                "`{command}` on {user}@{hostname} failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Number of `(host, user)` pairs seen so far.
    pub async fn known_hosts(&self) -> usize {
        self.sessions.lock().await.len()
    }

    fn command(&self, hostname: &str, user: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(["-o", "BatchMode=yes", "-o", "ConnectTimeout=10", "-l", user])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!(host = hostname, user, program = %self.program.display(), "ssh command");
        cmd
    }
}

impl Drop for SshSessions {
    fn drop(&mut self) {
        for ((hostname, user), slot) in self.sessions.get_mut().drain() {
            let (Some(path), Some(Ok(()))) = (&slot.control_path, slot.ready.get()) else {
                continue;
            };
            let closed = std::process::Command::new(&self.program)
                .args(["-o", &control_path_option(path), "-O", "exit", "-l", &user, &hostname])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status();
            if let Err(e) = closed {
                debug!(host = %hostname, user = %user, error = %e, "Failed to close ssh master");
            }
        }
    }
}

fn control_path_option(path: &Path) -> String {
    format!("ControlPath={}", path.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("/data/in"), "'/data/in'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_summary_prefers_stderr() {
        let out = CommandOutput {
            success: false,
            stdout: "PING host\n".into(),
            stderr: "ping: unknown host\n\n".into(),
        };
        assert_eq!(out.summary(), "ping: unknown host");

        let quiet = CommandOutput {
            success: false,
            stdout: String::new(),
            stderr: String::new(),
        };
        assert_eq!(quiet.summary(), "no output");
    }

    #[tokio::test]
    async fn test_sessions_start_empty() {
        assert_eq!(SshSessions::new().known_hosts().await, 0);
    }

    /// Writes an `ssh` stand-in that appends its arguments to a log and exits
    /// with `code`.
    #[cfg(unix)]
    fn fake_ssh(dir: &Path, code: i32) -> (PathBuf, PathBuf) {
        use std::os::unix::fs::PermissionsExt;

        let log = dir.join("calls.log");
        let program = dir.join("ssh");
        std::fs::write(
            &program,
            format!("#!/bin/sh\necho \"$*\" >> '{}'\nexit {code}\n", log.display()),
        )
        .unwrap();
        std::fs::set_permissions(&program, std::fs::Permissions::from_mode(0o755)).unwrap();
        (program, log)
    }

    fn logged_calls(log: &Path) -> Vec<String> {
        std::fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn control_path_of(call: &str) -> &str {
        call.split_whitespace()
            .find_map(|arg| arg.strip_prefix("ControlPath="))
            .unwrap()
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exec_runs_over_one_master_connection() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_ssh(dir.path(), 0);
        let sessions = SshSessions::with_program(&program);

        sessions.exec("db1", "ops", "df -P").await.unwrap();
        sessions.exec("db1", "ops", "find /data").await.unwrap();

        let calls = logged_calls(&log);
        assert_eq!(calls.len(), 3);
        assert!(calls[0].contains("ControlMaster=auto"));
        assert!(calls[0].contains("ControlPersist="));
        let socket = control_path_of(&calls[0]);
        for call in &calls[1..] {
            assert!(call.contains("ControlMaster=no"));
            assert_eq!(control_path_of(call), socket);
        }
        assert!(calls[1].ends_with("db1 df -P"));
        assert!(calls[2].ends_with("db1 find /data"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_each_host_gets_its_own_socket() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_ssh(dir.path(), 0);
        let sessions = SshSessions::with_program(&program);

        sessions.connect("a", "ops").await.unwrap();
        sessions.connect("b", "ops").await.unwrap();
        sessions.connect("a", "ops").await.unwrap();

        let calls = logged_calls(&log);
        assert_eq!(calls.len(), 2);
        assert_ne!(control_path_of(&calls[0]), control_path_of(&calls[1]));
        assert_eq!(sessions.known_hosts().await, 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failed_connect_is_remembered() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_ssh(dir.path(), 255);
        let sessions = SshSessions::with_program(&program);

        assert!(sessions.connect("down", "ops").await.is_err());
        assert!(sessions.exec("down", "ops", "df -P").await.is_err());

        assert_eq!(logged_calls(&log).len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_drop_closes_master() {
        let dir = tempfile::tempdir().unwrap();
        let (program, log) = fake_ssh(dir.path(), 0);
        let sessions = SshSessions::with_program(&program);
        sessions.connect("db1", "ops").await.unwrap();

        drop(sessions);

        let calls = logged_calls(&log);
        assert_eq!(calls.len(), 2);
        assert!(calls[1].contains("-O exit"));
    }
}
