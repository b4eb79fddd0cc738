//! Tool dispatcher: runs the decided tool and attaches its result.
//!
//! Handlers never fail past their boundary. Malformed params and workspace
//! errors become `success: false` results; only ledger violations and prompt
//! rendering problems surface as errors.

use anyhow::{Result, anyhow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use crate::agents::planner::EditPlanner;
use crate::core::context::Context;
use crate::core::types::{
    ActionResult, EditResult, GrepResult, ListResult, Outcome, ReadResult, Tool, ToolName,
};
use crate::edit::apply_batch;
use crate::io::oracle::Oracle;
use crate::io::search::SearchQuery;
use crate::io::workspace::Workspace;

/// Where control goes after a tool ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Back to the decision engine.
    Decide,
    /// On to the response formatter; the run ends.
    Respond,
}

#[derive(Debug, Deserialize)]
struct TargetFileParams {
    target_file: String,
}

#[derive(Debug, Deserialize)]
struct ListDirParams {
    #[serde(default = "current_dir")]
    relative_workspace_path: String,
}

fn current_dir() -> String {
    ".".to_string()
}

#[derive(Debug, Deserialize)]
struct EditFileParams {
    target_file: String,
    #[serde(default, deserialize_with = "lenient_text")]
    instructions: String,
    #[serde(default, deserialize_with = "lenient_text")]
    code_edit: String,
}

/// Accept `null` as empty and any other non-string value as its JSON text.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    })
}

/// Everything a handler may touch besides the context.
pub struct Tools<'a, W, O> {
    pub workspace: &'a W,
    pub oracle: &'a O,
    pub planner: &'a EditPlanner,
}

/// Run `tool` against the most recent ledger record and decide where to go next.
///
/// `finish` and names outside the vocabulary leave the record pending and
/// route to the response formatter.
#[instrument(skip_all, fields(tool = %tool))]
pub fn dispatch<W: Workspace, O: Oracle>(
    tool: &ToolName,
    ctx: &mut Context,
    tools: &Tools<'_, W, O>,
) -> Result<Route> {
    let Some(tool) = tool.tool() else {
        warn!("unrecognized tool; finishing");
        return Ok(Route::Respond);
    };
    let params = ctx
        .last_record()
        .map(|record| record.params.clone())
        .ok_or_else(|| anyhow!("no action record to dispatch"))?;

    let result = match tool {
        Tool::ReadFile => ActionResult::Read(read_file(tools.workspace, &params)),
        Tool::GrepSearch => ActionResult::Grep(grep_search(tools.workspace, &params)),
        Tool::ListDir => ActionResult::List(list_dir(tools.workspace, &params)),
        Tool::DeleteFile => ActionResult::Delete(delete_file(tools.workspace, &params)),
        Tool::EditFile => ActionResult::Edit(edit_file(ctx, tools, &params)?),
        Tool::Finish => return Ok(Route::Respond),
    };

    ctx.attach_result(result)
        .map_err(|err| anyhow!("ledger: {err}"))?;
    Ok(Route::Decide)
}

fn parse_params<T: DeserializeOwned>(params: &Map<String, Value>) -> Result<T, String> {
    serde_json::from_value(Value::Object(params.clone()))
        .map_err(|err| format!("Invalid params: {err}"))
}

fn read_file<W: Workspace>(workspace: &W, params: &Map<String, Value>) -> ReadResult {
    let read = parse_params::<TargetFileParams>(params)
        .and_then(|params| workspace.read(&params.target_file));
    let result = match read {
        Ok(content) => ReadResult {
            success: true,
            content,
            error: None,
        },
        Err(error) => ReadResult {
            success: false,
            content: String::new(),
            error: Some(error),
        },
    };
    info!(
        success = result.success,
        bytes = result.content.len(),
        "read_file"
    );
    result
}

fn grep_search<W: Workspace>(workspace: &W, params: &Map<String, Value>) -> GrepResult {
    let search =
        parse_params::<SearchQuery>(params).and_then(|query| workspace.search(&query));
    let result = match search {
        Ok(results) => GrepResult {
            success: true,
            results,
            error: None,
        },
        Err(error) => GrepResult {
            success: false,
            results: Vec::new(),
            error: Some(error),
        },
    };
    info!(
        success = result.success,
        matches = result.results.len(),
        "grep_search"
    );
    result
}

fn list_dir<W: Workspace>(workspace: &W, params: &Map<String, Value>) -> ListResult {
    let tree = parse_params::<ListDirParams>(params)
        .and_then(|params| workspace.list_tree(&params.relative_workspace_path));
    let result = match tree {
        Ok(tree_visualization) => ListResult {
            success: true,
            tree_visualization,
        },
        Err(tree_visualization) => ListResult {
            success: false,
            tree_visualization,
        },
    };
    info!(success = result.success, "list_dir");
    result
}

fn delete_file<W: Workspace>(workspace: &W, params: &Map<String, Value>) -> Outcome {
    let outcome = Outcome::from(
        parse_params::<TargetFileParams>(params)
            .and_then(|params| workspace.delete(&params.target_file)),
    );
    info!(success = outcome.success, "delete_file");
    outcome
}

/// Read the target, plan against it, and apply the plan as one batch.
fn edit_file<W: Workspace, O: Oracle>(
    ctx: &mut Context,
    tools: &Tools<'_, W, O>,
    params: &Map<String, Value>,
) -> Result<EditResult> {
    let params = match parse_params::<EditFileParams>(params) {
        Ok(params) => params,
        Err(error) => {
            warn!(error = %error, "edit_file without a usable target");
            return Ok(EditResult {
                read: Outcome::failed(error),
                operations: Vec::new(),
            });
        }
    };

    let (read, content) = match tools.workspace.read(&params.target_file) {
        Ok(content) => (Outcome::ok(), content),
        Err(error) => {
            warn!(error = %error, "edit target unreadable; planning against empty content");
            (Outcome::failed(error), String::new())
        }
    };

    ctx.edit_operations = tools.planner.plan(
        tools.oracle,
        &content,
        &params.instructions,
        &params.code_edit,
    )?;
    let operations = apply_batch(tools.workspace, &params.target_file, &ctx.edit_operations);
    ctx.edit_operations.clear();

    Ok(EditResult { read, operations })
}
