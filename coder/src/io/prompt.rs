//! Prompt rendering for the oracle-facing agents.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::Serialize;
use tracing::debug;

use crate::core::types::{ActionRecord, Tool};

const DECIDE_TEMPLATE: &str = include_str!("prompts/decide.md");
const PLAN_EDITS_TEMPLATE: &str = include_str!("prompts/plan_edits.md");
const FORMAT_RESPONSE_TEMPLATE: &str = include_str!("prompts/format_response.md");

/// One tool as presented to the decision oracle.
#[derive(Debug, Clone, Serialize)]
struct ToolSpec {
    name: &'static str,
    params: &'static str,
    summary: &'static str,
}

impl ToolSpec {
    fn describe(tool: Tool) -> Self {
        let (params, summary) = match tool {
            Tool::ReadFile => ("{target_file}", "read a file's full content"),
            Tool::EditFile => (
                "{target_file, instructions, code_edit}",
                "plan and apply line-range edits to one file",
            ),
            Tool::DeleteFile => ("{target_file}", "delete a file"),
            Tool::GrepSearch => (
                "{query, case_sensitive?, include_pattern?, exclude_pattern?}",
                "regex search across text files; patterns are globs on relative paths",
            ),
            Tool::ListDir => (
                "{relative_workspace_path}",
                "show a directory tree (default `.`)",
            ),
            Tool::Finish => ("{}", "stop and summarize the work for the user"),
        };
        Self {
            name: tool.as_str(),
            params,
            summary,
        }
    }
}

/// Inputs for the edit planning prompt.
#[derive(Debug, Clone, Copy)]
pub struct PlanPromptInput<'a> {
    pub content: &'a str,
    pub instructions: &'a str,
    pub code_edit: &'a str,
    /// Characters of `content` the planner may see.
    pub visible_chars: usize,
}

/// Template engine wrapper around minijinja.
struct PromptEngine {
    env: Environment<'static>,
}

impl PromptEngine {
    fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("decide", DECIDE_TEMPLATE)
            .expect("decide template should be valid");
        env.add_template("plan_edits", PLAN_EDITS_TEMPLATE)
            .expect("plan_edits template should be valid");
        env.add_template("format_response", FORMAT_RESPONSE_TEMPLATE)
            .expect("format_response template should be valid");
        Self { env }
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        let rendered = self
            .env
            .get_template(name)?
            .render(ctx)
            .with_context(|| format!("render {name} prompt"))?;
        debug!(template = name, prompt_bytes = rendered.len(), "rendered prompt");
        Ok(rendered)
    }
}

/// Prompt asking the oracle for the next `{tool, reason, params}` decision.
pub fn render_decision(
    working_dir: &str,
    user_query: &str,
    history: &[ActionRecord],
) -> Result<String> {
    let tools: Vec<ToolSpec> = Tool::ALL.into_iter().map(ToolSpec::describe).collect();
    let history = (!history.is_empty())
        .then(|| history_json(history))
        .transpose()?;
    PromptEngine::new().render(
        "decide",
        context! {
            working_dir => working_dir,
            tools => tools,
            user_query => user_query.trim(),
            history => history,
        },
    )
}

/// Prompt asking the oracle for a list of line-range edit operations.
pub fn render_edit_plan(input: PlanPromptInput<'_>) -> Result<String> {
    let (content, truncated) = truncate_chars(input.content, input.visible_chars);
    PromptEngine::new().render(
        "plan_edits",
        context! {
            instructions => input.instructions.trim(),
            code_edit => input.code_edit,
            content => content,
            truncated => truncated,
            visible_chars => input.visible_chars,
        },
    )
}

/// Prompt asking the oracle to summarize the run for the user.
pub fn render_response(user_query: &str, history: &[ActionRecord]) -> Result<String> {
    PromptEngine::new().render(
        "format_response",
        context! {
            user_query => user_query.trim(),
            history => history_json(history)?,
        },
    )
}

fn history_json(history: &[ActionRecord]) -> Result<String> {
    serde_json::to_string_pretty(history).context("serialize history")
}

/// First `max_chars` characters of `text`, and whether anything was cut.
fn truncate_chars(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => (&text[..idx], true),
        None => (text, false),
    }
}
