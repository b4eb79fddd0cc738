//! Oracle abstraction: a prompt goes in, a text completion comes out.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Result, anyhow};
use tracing::{debug, info, instrument, warn};

use crate::io::config::OracleConfig;
use crate::io::process::run_command_with_timeout;

/// Synchronous text completion.
///
/// Completions carry no structure guarantee; callers parse them defensively.
pub trait Oracle {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Oracle backed by an external command that reads the prompt on stdin and
/// prints the completion on stdout.
#[derive(Debug, Clone)]
pub struct CommandOracle {
    config: OracleConfig,
    working_dir: Option<PathBuf>,
}

impl CommandOracle {
    pub fn new(config: OracleConfig) -> Self {
        Self {
            config,
            working_dir: None,
        }
    }

    /// Run the command from `dir` instead of the current directory.
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }
}

impl Oracle for CommandOracle {
    #[instrument(skip_all, fields(program = ?self.config.command.first()))]
    fn complete(&self, prompt: &str) -> Result<String> {
        let (program, args) = self
            .config
            .command
            .split_first()
            .ok_or_else(|| anyhow!("oracle.command must be a non-empty array"))?;
        let mut cmd = Command::new(program);
        cmd.args(args);
        if let Some(dir) = &self.working_dir {
            cmd.current_dir(dir);
        }

        debug!(prompt_bytes = prompt.len(), "calling oracle");
        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            Duration::from_secs(self.config.timeout_secs),
            self.config.output_limit_bytes,
        )?;

        if output.timed_out {
            return Err(anyhow!(
                "oracle timed out after {}s",
                self.config.timeout_secs
            ));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "oracle command failed");
            return Err(anyhow!(
                "oracle exited with {}: {}",
                output.status,
                output.stderr_excerpt(500)
            ));
        }
        if output.stdout_truncated > 0 {
            warn!(
                truncated = output.stdout_truncated,
                "oracle completion truncated"
            );
        }

        let completion = String::from_utf8_lossy(&output.stdout).into_owned();
        info!(completion_bytes = completion.len(), "oracle responded");
        Ok(completion)
    }
}
