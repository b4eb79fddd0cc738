//! Test-only helpers: a scripted oracle and scratch working directories.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tempfile::TempDir;

use crate::io::oracle::Oracle;
use crate::io::workspace::LocalWorkspace;

/// One scripted oracle reply.
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// Simulates a transport failure (spawn error, timeout, non-zero exit).
    Error(String),
}

/// Oracle that replays queued completions in order and records every prompt.
#[derive(Debug, Default)]
pub struct ScriptedOracle {
    replies: RefCell<VecDeque<ScriptedReply>>,
    prompts: RefCell<Vec<String>>,
}

impl ScriptedOracle {
    pub fn new(replies: Vec<ScriptedReply>) -> Self {
        Self {
            replies: RefCell::new(replies.into()),
            prompts: RefCell::new(Vec::new()),
        }
    }

    /// Shorthand for an oracle that only returns text.
    pub fn texts<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            replies
                .into_iter()
                .map(|text| ScriptedReply::Text(text.into()))
                .collect(),
        )
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.borrow().clone()
    }

    pub fn remaining(&self) -> usize {
        self.replies.borrow().len()
    }
}

impl Oracle for ScriptedOracle {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.borrow_mut().push(prompt.to_string());
        match self.replies.borrow_mut().pop_front() {
            Some(ScriptedReply::Text(text)) => Ok(text),
            Some(ScriptedReply::Error(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted oracle has no replies left")),
        }
    }
}

/// JSON text of a `{tool, reason, params}` decision.
pub fn decision(tool: &str, reason: &str, params: Value) -> String {
    json!({"tool": tool, "reason": reason, "params": params}).to_string()
}

/// A temporary working directory that is removed on drop.
pub struct ScratchDir {
    dir: TempDir,
}

impl ScratchDir {
    pub fn new() -> Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir().context("create scratch dir")?,
        })
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    pub fn workspace(&self) -> LocalWorkspace {
        LocalWorkspace::new(self.dir.path())
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn write(&self, relative: &str, contents: &str) -> Result<()> {
        let path = self.path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create directory {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    pub fn read(&self, relative: &str) -> Result<String> {
        let path = self.path(relative);
        fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))
    }

    pub fn exists(&self, relative: &str) -> bool {
        self.path(relative).exists()
    }
}

/// `line 1\n` through `line n\n`.
pub fn numbered_lines(n: usize) -> String {
    (1..=n).map(|i| format!("line {i}\n")).collect()
}
