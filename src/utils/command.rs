//! Builder for running external package-manager and installer commands
//!
//! Every subprocess the updater starts (apt-get, pacman, dnf/yum,
//! softwareupdate, msiexec, ...) goes through [`SystemCommand`] so that
//! logging and the mapping of a non-zero exit to
//! [`UpdateError::Subprocess`] are handled in one place.
//!
//! Two execution modes exist:
//!
//! - **Captured** ([`SystemCommand::execute`]): output is collected and
//!   returned, used for queries whose output is parsed.
//! - **Streaming** ([`SystemCommand::stream_output`]): output is echoed to the
//!   terminal line by line while also being collected, used for install
//!   commands the operator wants to watch. The collected text still ends up
//!   in the error when the command fails.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;

use crate::core::UpdateError;

/// Fluent builder for a single external command.
///
/// # Examples
///
/// ```rust,no_run
/// use tsupdate::utils::command::SystemCommand;
///
/// # async fn example() -> anyhow::Result<()> {
/// let info = SystemCommand::new("pacman")
///     .args(["--sync", "--refresh", "--info", "tailscale"])
///     .execute_stdout()
///     .await?;
///
/// SystemCommand::new("pacman")
///     .args(["--sync", "--noconfirm", "tailscale"])
///     .stream_output()
///     .execute_success()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct SystemCommand {
    /// Program name or path
    program: String,

    /// Arguments in order
    args: Vec<String>,

    /// Working directory (defaults to the current directory)
    current_dir: Option<PathBuf>,

    /// Echo output to the terminal while collecting it
    stream: bool,
}

impl SystemCommand {
    /// Creates a builder for `program` with no arguments and captured output.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            stream: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command in `dir` instead of the current directory.
    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.current_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Echo stdout/stderr to the terminal as lines arrive, inheriting stdin.
    pub const fn stream_output(mut self) -> Self {
        self.stream = true;
        self
    }

    /// The command line as it would be typed in a shell.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Execute the command and return its output.
    ///
    /// # Errors
    ///
    /// - the program cannot be started
    /// - the command exits non-zero ([`UpdateError::Subprocess`], carrying the
    ///   combined output)
    pub async fn execute(self) -> Result<CommandOutput> {
        let start = std::time::Instant::now();
        let command_line = self.command_line();
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).kill_on_drop(true);

        if let Some(ref dir) = self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::debug!(target: "cmd", "Executing command: {}", command_line);

        let (status, stdout, stderr) = if self.stream {
            run_streaming(&mut cmd, &command_line).await?
        } else {
            let output = cmd
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .output()
                .await
                .with_context(|| format!("Failed to execute {command_line}"))?;
            (
                output.status,
                String::from_utf8_lossy(&output.stdout).to_string(),
                String::from_utf8_lossy(&output.stderr).to_string(),
            )
        };

        if !status.success() {
            tracing::debug!(target: "cmd", "Command failed with exit code: {:?}", status.code());
            return Err(UpdateError::Subprocess {
                command: command_line,
                status: status.to_string(),
                output: combine(&stdout, &stderr),
            }
            .into());
        }

        if !self.stream {
            if !stdout.is_empty() {
                tracing::debug!(target: "cmd", "{}", stdout.trim());
            }
            if !stderr.is_empty() {
                tracing::debug!(target: "cmd", "{}", stderr.trim());
            }
        }

        let elapsed = start.elapsed();
        if elapsed.as_secs() > 1 {
            tracing::debug!(target: "cmd", "{} took {:.2}s", self.program, elapsed.as_secs_f64());
        }

        Ok(CommandOutput {
            stdout,
            stderr,
        })
    }

    /// Execute the command and return only stdout.
    pub async fn execute_stdout(self) -> Result<String> {
        let output = self.execute().await?;
        Ok(output.stdout)
    }

    /// Execute the command and check for success.
    pub async fn execute_success(self) -> Result<()> {
        self.execute().await?;
        Ok(())
    }
}

/// Output from a successful command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        combine(&self.stdout, &self.stderr)
    }
}

fn combine(stdout: &str, stderr: &str) -> String {
    match (stdout.is_empty(), stderr.is_empty()) {
        (_, true) => stdout.to_string(),
        (true, false) => stderr.to_string(),
        (false, false) if stdout.ends_with('\n') => format!("{stdout}{stderr}"),
        (false, false) => format!("{stdout}\n{stderr}"),
    }
}

async fn run_streaming(
    cmd: &mut Command,
    command_line: &str,
) -> Result<(std::process::ExitStatus, String, String)> {
    let mut child = cmd
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to execute {command_line}"))?;

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let (stdout, stderr) = tokio::join!(
        echo_lines(stdout, |line| print!("{line}")),
        echo_lines(stderr, |line| eprint!("{line}")),
    );

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for {command_line}"))?;
    Ok((status, stdout?, stderr?))
}

/// Copies `reader` line by line through `echo`, returning everything read.
async fn echo_lines<R>(reader: Option<R>, echo: impl Fn(&str)) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let Some(reader) = reader else {
        return Ok(String::new());
    };
    let mut reader = BufReader::new(reader);
    let mut collected = String::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf).await.context("Failed to read command output")?;
        if n == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        echo(&line);
        collected.push_str(&line);
    }
    Ok(collected)
}
