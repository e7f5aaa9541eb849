use std::{process::Stdio, time::Duration};

use tokio::{process::Command, time::timeout};

use crate::module_error::ModuleError;

pub const COMMAND_MODULE_NAME: &str = "fdo.command";

const SAFE_COMMAND_ENV_VARS: &[&str] = &["PATH", "LANG", "LC_ALL", "LC_CTYPE", "TZ"];

/// Captured result of an echoed command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

/// Echoes owner-supplied commands instead of executing them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandModule {
    timeout: Duration,
}

impl CommandModule {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Rewrites any received command into a quoted `sh -c "echo ..."`.
    pub fn transform(&self, command: &str, args: &[String]) -> (String, Vec<String>) {
        let words = std::iter::once(command)
            .chain(args.iter().map(String::as_str))
            .map(|word| shell_words::quote(word).into_owned())
            .collect::<Vec<_>>();
        (
            "sh".to_string(),
            vec!["-c".to_string(), format!("echo {}", words.join(" "))],
        )
    }

    /// Runs the echo form of the command under the module timeout.
    pub async fn run(&self, command: &str, args: &[String]) -> Result<CommandOutput, ModuleError> {
        let (program, program_args) = self.transform(command, args);
        let mut builder = Command::new(&program);
        builder
            .args(&program_args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .env_clear();
        for key in SAFE_COMMAND_ENV_VARS {
            if let Ok(value) = std::env::var(key) {
                builder.env(key, value);
            }
        }

        let output = match timeout(self.timeout, builder.output()).await {
            Ok(result) => {
                result.map_err(|error| ModuleError::io("failed to spawn", &program, error))?
            }
            Err(_) => {
                tracing::warn!(command, timeout_ms = self.timeout.as_millis(), "echo command timed out");
                return Err(ModuleError::CommandTimeout {
                    timeout_ms: self.timeout.as_millis(),
                });
            }
        };

        Ok(CommandOutput {
            status: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
