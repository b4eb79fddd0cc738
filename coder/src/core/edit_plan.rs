//! Parsing and ordering of edit plans.

use std::sync::LazyLock;

use jsonschema::{Draft, Validator};
use serde_json::Value;

use crate::core::decision::strip_code_fence;
use crate::core::types::{EditOperation, PlanEntry};

const EDIT_PLAN_SCHEMA: &str = include_str!("../../schemas/edit_plan.schema.json");

static EDIT_PLAN_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    let schema: Value =
        serde_json::from_str(EDIT_PLAN_SCHEMA).expect("edit plan schema should be valid json");
    jsonschema::options()
        .with_draft(Draft::Draft202012)
        .build(&schema)
        .expect("edit plan schema should compile")
});

/// Parse an oracle completion into plan entries. Never fails.
///
/// Output that is not a JSON list yields an empty plan. Elements that are not
/// operations are kept as [`PlanEntry::Malformed`] in their original position.
pub fn parse_edit_plan(text: &str) -> Vec<PlanEntry> {
    let Ok(value) = serde_json::from_str::<Value>(strip_code_fence(text)) else {
        return Vec::new();
    };
    if !EDIT_PLAN_VALIDATOR.is_valid(&value) {
        return Vec::new();
    }
    let Value::Array(items) = value else {
        return Vec::new();
    };
    items.iter().map(parse_entry).collect()
}

fn parse_entry(item: &Value) -> PlanEntry {
    let Value::Object(fields) = item else {
        return PlanEntry::Malformed(format!("operation must be an object, got {item}"));
    };
    let start_line = match fields.get("start_line").map(line_number) {
        Some(Ok(n)) => n,
        Some(Err(err)) => return PlanEntry::Malformed(format!("start_line: {err}")),
        None => return PlanEntry::Malformed("missing start_line".to_string()),
    };
    let end_line = match fields.get("end_line").map(line_number) {
        Some(Ok(n)) => n,
        Some(Err(err)) => return PlanEntry::Malformed(format!("end_line: {err}")),
        None => return PlanEntry::Malformed("missing end_line".to_string()),
    };
    let replacement = match fields.get("replacement") {
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
        None => return PlanEntry::Malformed("missing replacement".to_string()),
    };
    PlanEntry::Operation(EditOperation {
        start_line,
        end_line,
        replacement,
    })
}

/// Accept JSON integers and integer strings, as oracles emit both.
fn line_number(value: &Value) -> Result<i64, String> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .ok_or_else(|| format!("expected an integer, got {n}")),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("expected an integer, got {s:?}")),
        other => Err(format!("expected an integer, got {other}")),
    }
}

/// Indices of `entries` in execution order: descending `start_line`.
///
/// Executing the highest range first means no pending operation's line
/// numbers are shifted by an earlier one, as long as ranges are disjoint.
/// Ties keep plan order. Malformed entries sort last; they never touch the file.
pub fn execution_order(entries: &[PlanEntry]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.sort_by(|&a, &b| entries[b].start_line().cmp(&entries[a].start_line()));
    order
}
