//! Shared deterministic types for the agent loop.
//!
//! These types define stable contracts between the decision engine, the tool
//! dispatcher, and the edit applier. They carry no I/O and serialize to the
//! same JSON shape that is shown to the oracle and printed at run end.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The fixed tool vocabulary the oracle may choose from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tool {
    ReadFile,
    EditFile,
    DeleteFile,
    GrepSearch,
    ListDir,
    Finish,
}

impl Tool {
    /// Every tool, in the order they are presented to the oracle.
    pub const ALL: [Tool; 6] = [
        Tool::ReadFile,
        Tool::EditFile,
        Tool::DeleteFile,
        Tool::GrepSearch,
        Tool::ListDir,
        Tool::Finish,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Tool::ReadFile => "read_file",
            Tool::EditFile => "edit_file",
            Tool::DeleteFile => "delete_file",
            Tool::GrepSearch => "grep_search",
            Tool::ListDir => "list_dir",
            Tool::Finish => "finish",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Tool::ALL.into_iter().find(|tool| tool.as_str() == name)
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tool name as chosen by the oracle.
///
/// The decision engine does not validate names against the vocabulary; names
/// outside it are kept verbatim so the ledger shows what the oracle asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolName {
    Known(Tool),
    Unrecognized(String),
}

impl ToolName {
    pub fn parse(name: &str) -> Self {
        match Tool::from_name(name) {
            Some(tool) => ToolName::Known(tool),
            None => ToolName::Unrecognized(name.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ToolName::Known(tool) => tool.as_str(),
            ToolName::Unrecognized(name) => name,
        }
    }

    pub fn tool(&self) -> Option<Tool> {
        match self {
            ToolName::Known(tool) => Some(*tool),
            ToolName::Unrecognized(_) => None,
        }
    }
}

impl From<Tool> for ToolName {
    fn from(tool: Tool) -> Self {
        ToolName::Known(tool)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ToolName {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(ToolName::parse(&name))
    }
}

/// Success flag plus optional error message.
///
/// Used for `delete_file` results and for each operation of an edit batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub success: bool,
    pub error: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

impl<E: fmt::Display> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Outcome::ok(),
            Err(err) => Outcome::failed(err.to_string()),
        }
    }
}

/// Result of `read_file` (and of the target read in the edit subflow).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadResult {
    pub success: bool,
    pub content: String,
    pub error: Option<String>,
}

/// A single line matched by `grep_search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepMatch {
    /// Path relative to the working directory.
    pub file: String,
    /// 1-indexed line number.
    pub line: usize,
    /// Matched line without its trailing newline.
    pub content: String,
}

/// Result of `grep_search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrepResult {
    pub success: bool,
    pub results: Vec<GrepMatch>,
    pub error: Option<String>,
}

/// Result of `list_dir`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListResult {
    pub success: bool,
    pub tree_visualization: String,
}

/// Result of the `edit_file` subflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditResult {
    /// Whether the target could be read before planning.
    pub read: Outcome,
    /// One outcome per planned operation, in plan order.
    pub operations: Vec<Outcome>,
}

/// Result attached to an action record by the handler that executed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActionResult {
    Read(ReadResult),
    Grep(GrepResult),
    List(ListResult),
    Edit(EditResult),
    Delete(Outcome),
}

impl ActionResult {
    /// Field names of the serialized result, for compact history printing.
    pub fn keys(&self) -> Vec<&'static str> {
        match self {
            ActionResult::Read(_) => vec!["success", "content", "error"],
            ActionResult::Grep(_) => vec!["success", "results", "error"],
            ActionResult::List(_) => vec!["success", "tree_visualization"],
            ActionResult::Edit(_) => vec!["read", "operations"],
            ActionResult::Delete(_) => vec!["success", "error"],
        }
    }
}

/// One ledger entry: the chosen tool, why, with which params, and what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub tool: ToolName,
    pub reason: String,
    pub params: Map<String, Value>,
    pub result: Option<ActionResult>,
}

/// A single inclusive, 1-indexed line-range replacement.
///
/// Line numbers refer to the file as it was before any operation of the
/// current batch ran. They are kept signed so out-of-range values from the
/// oracle survive parsing and are rejected when applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditOperation {
    pub start_line: i64,
    pub end_line: i64,
    pub replacement: String,
}

/// One element of a parsed edit plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanEntry {
    Operation(EditOperation),
    /// The oracle produced something that is not an operation. It keeps its
    /// position so the batch reports a failure for it.
    Malformed(String),
}

impl PlanEntry {
    pub fn start_line(&self) -> Option<i64> {
        match self {
            PlanEntry::Operation(op) => Some(op.start_line),
            PlanEntry::Malformed(_) => None,
        }
    }
}
