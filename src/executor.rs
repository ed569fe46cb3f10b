//! Process executor: runs `docker compose` for the orchestrator.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};

use crate::errors::{HbctlError, Result};

/// Environment handed to a single executor invocation.
pub type Env = BTreeMap<String, String>;

/// Runs one container-orchestration command to completion.
pub trait ProcessExecutor {
    /// Run with `env` layered on top of the inherited environment.
    /// Child output goes straight to the operator's terminal.
    fn run(&self, env: &Env, args: &[String]) -> Result<()>;

    /// Like [`run`](Self::run) but collect stdout instead of printing it.
    /// Stderr still reaches the terminal.
    fn capture(&self, env: &Env, args: &[String]) -> Result<String>;
}

/// [`ProcessExecutor`] that shells out to `docker compose`.
#[derive(Debug, Clone)]
pub struct ComposeExecutor {
    program: String,
    working_dir: Option<PathBuf>,
}

impl Default for ComposeExecutor {
    fn default() -> Self {
        Self {
            program: "docker".into(),
            working_dir: None,
        }
    }
}

impl ComposeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run compose from `dir` so relative paths in compose files resolve.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Use a different binary in place of `docker`.
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl ComposeExecutor {
    fn command(&self, env: &Env, args: &[String]) -> (Command, String) {
        let mut cmd = Command::new(&self.program);
        cmd.arg("compose").args(args).envs(env);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        let rendered = format!("{} compose {}", self.program, args.join(" "));
        tracing::debug!(
            command = %rendered,
            env_keys = ?env.keys().collect::<Vec<_>>(),
            "running executor"
        );
        (cmd, rendered)
    }

    fn spawn_failed(&self, e: std::io::Error) -> HbctlError {
        HbctlError::CommandFailed(format!("cannot run {}: {e}", self.program))
    }
}

fn check(status: ExitStatus, rendered: String) -> Result<()> {
    if status.success() {
        Ok(())
    } else {
        Err(HbctlError::ProcessFailed {
            command: rendered,
            code: status.code(),
        })
    }
}

impl ProcessExecutor for ComposeExecutor {
    fn run(&self, env: &Env, args: &[String]) -> Result<()> {
        let (mut cmd, rendered) = self.command(env, args);
        let status = cmd.status().map_err(|e| self.spawn_failed(e))?;
        check(status, rendered)
    }

    fn capture(&self, env: &Env, args: &[String]) -> Result<String> {
        let (mut cmd, rendered) = self.command(env, args);
        cmd.stdin(Stdio::null()).stderr(Stdio::inherit());
        let output = cmd.output().map_err(|e| self.spawn_failed(e))?;
        check(output.status, rendered)?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
