//! Parsing of oracle decisions.
//!
//! The oracle answers in free text that is expected to hold a JSON object
//! `{tool, reason, params}`. Anything else becomes [`Decision::Fallback`],
//! which routes to `finish` so the loop always terminates.

use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};

use crate::core::types::{Tool, ToolName};

const DECISION_SCHEMA: &str = include_str!("../../schemas/decision.schema.json");

/// Reason recorded when the oracle output could not be parsed.
pub const FALLBACK_REASON: &str = "fallback: parsing error";

/// Reason recorded when the oracle could not be reached at all.
pub const ORACLE_ERROR_REASON: &str = "fallback: oracle error";

static DECISION_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(DECISION_SCHEMA).expect("decision schema should be valid json");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("decision schema should compile")
});

/// A parsed decision.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The oracle produced a well-formed decision. The tool may still be
    /// outside the vocabulary.
    Chosen {
        tool: ToolName,
        reason: String,
        params: Map<String, Value>,
    },
    /// The oracle output was unusable; the run should finish.
    Fallback { reason: String },
}

impl Decision {
    pub fn fallback() -> Self {
        Decision::Fallback {
            reason: FALLBACK_REASON.to_string(),
        }
    }

    pub fn oracle_failure() -> Self {
        Decision::Fallback {
            reason: ORACLE_ERROR_REASON.to_string(),
        }
    }

    /// Flatten into the `(tool, reason, params)` triple recorded in the ledger.
    pub fn into_parts(self) -> (ToolName, String, Map<String, Value>) {
        match self {
            Decision::Chosen {
                tool,
                reason,
                params,
            } => (tool, reason, params),
            Decision::Fallback { reason } => (ToolName::Known(Tool::Finish), reason, Map::new()),
        }
    }
}

/// Parse an oracle completion into a decision. Never fails.
pub fn parse_decision(text: &str) -> Decision {
    let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(text)) else {
        return Decision::fallback();
    };
    if !DECISION_VALIDATOR.is_valid(&value) {
        return Decision::fallback();
    }
    let Value::Object(mut object) = value else {
        return Decision::fallback();
    };
    let Some(Value::String(tool)) = object.remove("tool") else {
        return Decision::fallback();
    };
    let reason = match object.remove("reason") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(reason)) => reason,
        Some(other) => other.to_string(),
    };
    let params = match object.remove("params") {
        Some(Value::Object(params)) => params,
        _ => Map::new(),
    };
    Decision::Chosen {
        tool: ToolName::parse(tool.trim()),
        reason,
        params,
    }
}

/// Unwrap a completion that arrived inside a Markdown code fence.
///
/// Text without a fence is returned trimmed and otherwise untouched.
pub fn strip_code_fence(text: &str) -> &str {
    static FENCE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        regex::Regex::new(r"(?s)^```[A-Za-z0-9_-]*[ \t]*\r?\n(.*?)\r?\n?```$").unwrap()
    });

    let trimmed = text.trim();
    match FENCE_RE.captures(trimmed).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str().trim(),
        None => trimmed,
    }
}
