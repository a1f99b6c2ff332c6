//! External commands: ftag shell filters and `.#run`.

use std::io::{self, Seek, SeekFrom, Write};
use std::process::{Command, ExitStatus, Output, Stdio};

#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    #[error("`{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    Status {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("`{command}`: output is not valid UTF-8")]
    Utf8 { command: String },
}

fn io_error(command: &str) -> impl FnOnce(io::Error) -> FilterError + '_ {
    move |source| FilterError::Io {
        command: command.to_string(),
        source,
    }
}

/// Run `sh -c command` with `input` on its standard input.
///
/// The input is written to an anonymous temporary file that becomes the
/// command's standard input.
pub fn pipe_through_shell(command: &str, input: &str) -> Result<String, FilterError> {
    log::debug!("filtering {} bytes through `{command}`", input.len());
    let mut file = tempfile::tempfile().map_err(io_error(command))?;
    file.write_all(input.as_bytes()).map_err(io_error(command))?;
    file.seek(SeekFrom::Start(0)).map_err(io_error(command))?;

    let output = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::from(file))
        .stderr(Stdio::piped())
        .output()
        .map_err(io_error(command))?;
    collect(command, output)
}

/// Run a program with literal arguments.
pub fn run_command(program: &str, args: &[String]) -> Result<String, FilterError> {
    log::debug!("running {program} {}", args.join(" "));
    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(io_error(program))?;
    collect(program, output)
}

fn collect(command: &str, output: Output) -> Result<String, FilterError> {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        log::warn!("`{command}` exited with {}", output.status);
        return Err(FilterError::Status {
            command: command.to_string(),
            status: output.status,
            stderr,
        });
    }
    String::from_utf8(output.stdout).map_err(|_| FilterError::Utf8 {
        command: command.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_pipe_through_shell() {
        let out = pipe_through_shell("tr a-z A-Z", "hello\n").unwrap();
        assert_eq!(out, "HELLO\n");
    }

    #[test]
    fn test_run_command() {
        let out = run_command("echo", &["a".to_string(), "b c".to_string()]).unwrap();
        assert_eq!(out, "a b c\n");
    }

    #[test]
    fn test_failing_command() {
        let err = pipe_through_shell("exit 3", "").unwrap_err();
        assert!(matches!(err, FilterError::Status { .. }), "{err}");
    }

    #[test]
    fn test_missing_program() {
        let err = run_command("frundis-no-such-program", &[]).unwrap_err();
        assert!(matches!(err, FilterError::Io { .. }), "{err}");
    }
}
