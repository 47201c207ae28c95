//! Running the commands of fired actions

use std::process::Stdio;

use tracing::debug;

use crate::keybinds::Command;

/// Runs a command on behalf of the match engine
pub trait Executor {
    /// Start the command. Does not wait for it to finish.
    fn execute(&self, command: &Command) -> Result<(), ExecError>;
}

/// Errors that can occur when starting a command
#[derive(Debug, thiserror::Error)]
pub enum ExecError {
    #[error("failed to spawn `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Executor that spawns child processes
///
/// Children are not awaited; tokio reaps them in the background once the
/// handle is dropped. Must be used from within a tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl Executor for ProcessExecutor {
    fn execute(&self, command: &Command) -> Result<(), ExecError> {
        let mut process = match command {
            Command::Shell(line) => {
                let mut process = tokio::process::Command::new("sh");
                process.arg("-c").arg(line);
                process
            }
            Command::Exec { program, args } => {
                let mut process = tokio::process::Command::new(program);
                process.args(args);
                process
            }
        };

        let child = process
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| ExecError::Spawn {
                command: command.to_string(),
                source,
            })?;

        debug!(pid = ?child.id(), "spawned command");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_exec() {
        let command = Command::Exec {
            program: "true".to_string(),
            args: vec![],
        };
        assert!(ProcessExecutor::new().execute(&command).is_ok());
    }

    #[tokio::test]
    async fn test_spawn_shell() {
        let command = Command::Shell("exit 3".to_string());
        // Exit status is never inspected
        assert!(ProcessExecutor::new().execute(&command).is_ok());
    }

    #[tokio::test]
    async fn test_spawn_missing_program() {
        let command = Command::Exec {
            program: "/nonexistent/combo-daemon-test".to_string(),
            args: vec!["a".to_string()],
        };
        let err = ProcessExecutor::new().execute(&command).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/combo-daemon-test a"));
    }
}
