//! shell command execution for `script` components and actions
use std::process::Command;

pub trait CommandRunner {
    /// Run `command` and return its standard output without the trailing newline
    fn run(&self, command: &str) -> Result<String, CommandError>;
}

/// Runs commands as `<shell> -c <command>`
#[derive(derive_new::new, Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("sh".to_string())
    }
}

impl CommandRunner for ShellRunner {
    #[tracing::instrument(level = "debug", skip(self), fields(shell = %self.shell))]
    fn run(&self, command: &str) -> Result<String, CommandError> {
        let output = Command::new(&self.shell)
            .arg("-c")
            .arg(command)
            .output()
            .map_err(|source| CommandError::Spawn {
                shell: self.shell.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::warn!(status = %output.status, stderr = %stderr, "command failed");
            return Err(CommandError::Failed {
                status: output.status,
                stderr,
            });
        }

        let mut stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if stdout.ends_with('\n') {
            stdout.pop();
        }
        Ok(stdout)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("Unable to start {shell}")]
    Spawn {
        shell: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command failed ({status}), stderr: {stderr}")]
    Failed {
        status: std::process::ExitStatus,
        stderr: String,
    },
}
