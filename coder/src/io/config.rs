//! Agent configuration stored under `.coder/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Config location relative to the working directory.
pub const CONFIG_RELATIVE_PATH: &str = ".coder/config.toml";

/// Agent configuration (TOML).
///
/// Missing fields take their defaults, so an empty file is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CoderConfig {
    /// Maximum number of decisions per run. `0` means unlimited.
    pub max_steps: u32,

    /// How many characters of the target file the edit planner sees.
    pub plan_content_chars: usize,

    pub oracle: OracleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OracleConfig {
    /// Command that reads a prompt on stdin and prints a completion.
    pub command: Vec<String>,

    /// Wall-clock budget for one oracle call.
    pub timeout_secs: u64,

    /// Completions beyond this many bytes are cut off.
    pub output_limit_bytes: usize,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            command: ["codex", "exec", "--skip-git-repo-check", "-"]
                .map(String::from)
                .to_vec(),
            timeout_secs: 10 * 60,
            output_limit_bytes: 1_000_000,
        }
    }
}

impl Default for CoderConfig {
    fn default() -> Self {
        Self {
            max_steps: 0,
            plan_content_chars: 8000,
            oracle: OracleConfig::default(),
        }
    }
}

impl CoderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.plan_content_chars == 0 {
            return Err(anyhow!("plan_content_chars must be > 0"));
        }
        if self.oracle.timeout_secs == 0 {
            return Err(anyhow!("oracle.timeout_secs must be > 0"));
        }
        if self.oracle.output_limit_bytes == 0 {
            return Err(anyhow!("oracle.output_limit_bytes must be > 0"));
        }
        if self
            .oracle
            .command
            .first()
            .is_none_or(|program| program.trim().is_empty())
        {
            return Err(anyhow!("oracle.command must be a non-empty array"));
        }
        Ok(())
    }

    /// `max_steps` as an optional bound.
    pub fn step_limit(&self) -> Option<u32> {
        (self.max_steps > 0).then_some(self.max_steps)
    }
}

/// Default config path for a working directory.
pub fn config_path(working_dir: &Path) -> PathBuf {
    working_dir.join(CONFIG_RELATIVE_PATH)
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `CoderConfig::default()`.
pub fn load_config(path: &Path) -> Result<CoderConfig> {
    if !path.exists() {
        let cfg = CoderConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: CoderConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &CoderConfig) -> Result<()> {
    cfg.validate()?;
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("config path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}
