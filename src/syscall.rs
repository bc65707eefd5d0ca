// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! External command invocation.
//!
//! Every operation ultimately bottoms out in calls to other programs: git,
//! pnpm, ddev, ln. Two flavors of invocation are provided. The interactive
//! flavor inherits the terminal so the child can stream output and prompt
//! the user directly. The captured flavor collects stdout for parsing, e.g.,
//! to detect the current branch of a checkout. Both block until the child
//! exits, and treat a nonzero exit status as an error.

use std::{env, ffi::OsStr, path::Path, process::Command};
use tracing::debug;

/// Run target command, inheriting the terminal.
///
/// # Errors
///
/// - Return [`SyscallError::Io`] if the child cannot be spawned or awaited.
/// - Return [`SyscallError::Failed`] if the child exits nonzero.
pub fn interactive(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<()> {
    let status = Command::new(cmd.as_ref()).args(args).spawn()?.wait()?;
    if !status.success() {
        return Err(SyscallError::Failed {
            command: cmd.as_ref().to_string_lossy().into_owned(),
            output: status.to_string(),
        });
    }

    Ok(())
}

/// Run target command, capturing its standard output.
///
/// Returns stdout with the trailing newline chomped so captured values can
/// be used verbatim.
///
/// # Errors
///
/// - Return [`SyscallError::Io`] if the child cannot be spawned or awaited.
/// - Return [`SyscallError::Failed`] if the child exits nonzero. The error
///   carries whatever the child wrote to stderr, falling back to stdout and
///   then to the raw exit status.
pub fn captured(
    cmd: impl AsRef<OsStr>,
    args: impl IntoIterator<Item = impl AsRef<OsStr>>,
) -> Result<String> {
    let output = Command::new(cmd.as_ref()).args(args).output()?;
    let stdout = String::from_utf8_lossy(output.stdout.as_slice()).into_owned();
    let stderr = String::from_utf8_lossy(output.stderr.as_slice()).into_owned();

    if !output.status.success() {
        let message = if !stderr.is_empty() {
            stderr
        } else if !stdout.is_empty() {
            stdout
        } else {
            output.status.to_string()
        };

        return Err(SyscallError::Failed {
            command: cmd.as_ref().to_string_lossy().into_owned(),
            output: chomp(message),
        });
    }

    Ok(chomp(stdout))
}

/// Change the working directory of the whole process.
///
/// Operations that run later observe the change. Order dependence here is
/// intentional.
///
/// # Errors
///
/// - Return [`SyscallError::Io`] if target path cannot be changed into.
pub fn change_dir(path: impl AsRef<Path>) -> Result<()> {
    debug!("cd {:?}", path.as_ref().display());
    env::set_current_dir(path.as_ref())?;

    Ok(())
}

// INVARIANT: Chomp trailing newlines.
fn chomp(text: String) -> String {
    text.strip_suffix("\r\n")
        .or(text.strip_suffix('\n'))
        .map(ToString::to_string)
        .unwrap_or(text)
}

/// External command invocation error types.
#[derive(Debug, thiserror::Error)]
pub enum SyscallError {
    /// Child process cannot be spawned or awaited.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Child process ran, but reported failure.
    #[error("command {command:?} failed: {output}")]
    Failed { command: String, output: String },
}

/// Friendly result alias :3
pub type Result<T, E = SyscallError> = std::result::Result<T, E>;

#[cfg(test)]
#[cfg(unix)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use sealed_test::prelude::*;

    #[test]
    fn captured_chomps_trailing_newline() {
        let result = captured("sh", ["-c", "echo hello"]).unwrap();
        assert_eq!(result, "hello");
    }

    #[test]
    fn captured_failure_reports_stderr() {
        let result = captured("sh", ["-c", "echo boom >&2; exit 1"]);
        match result {
            Err(SyscallError::Failed { command, output }) => {
                assert_eq!(command, "sh");
                assert_eq!(output, "boom");
            }
            other => panic!("expected failed syscall, got {other:?}"),
        }
    }

    #[test]
    fn interactive_failure_carries_exit_status() {
        let result = interactive("sh", ["-c", "exit 1"]);
        assert!(matches!(result, Err(SyscallError::Failed { .. })));
    }

    #[sealed_test]
    fn change_dir_moves_the_process() -> anyhow::Result<()> {
        std::fs::create_dir("inner")?;
        change_dir("inner")?;
        assert!(env::current_dir()?.ends_with("inner"));

        Ok(())
    }
}
