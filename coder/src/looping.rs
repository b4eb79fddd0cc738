//! The agent run loop: decide, dispatch, repeat, then respond.

use anyhow::Result;
use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::agents::decision::decide;
use crate::agents::formatter::respond;
use crate::agents::planner::EditPlanner;
use crate::core::context::Context;
use crate::core::types::ActionRecord;
use crate::dispatch::{Route, Tools, dispatch};
use crate::io::config::CoderConfig;
use crate::io::oracle::Oracle;
use crate::io::workspace::Workspace;

/// Reason why `run_agent` stopped deciding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The oracle chose `finish`, or a fallback or unknown tool did.
    Finished,
    /// `max_steps` decisions were made without a `finish`.
    StepLimit,
}

/// Summary of one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub response: String,
    pub history: Vec<ActionRecord>,
    /// Number of decisions made.
    pub steps: u32,
    pub stop: StopReason,
}

/// Run one user request to completion against `workspace`.
///
/// `on_step` observes the context after every decision has been dispatched.
/// Errors are limited to ledger violations, prompt rendering, and the final
/// response call; everything a tool does wrong ends up in the ledger instead.
#[instrument(skip_all, fields(root = %workspace.root().display()))]
pub fn run_agent<O: Oracle, W: Workspace, F: FnMut(&Context)>(
    oracle: &O,
    workspace: &W,
    config: &CoderConfig,
    user_query: &str,
    mut on_step: F,
) -> Result<RunOutcome> {
    let mut ctx = Context::new(workspace.root(), user_query);
    let planner = EditPlanner::new(config.plan_content_chars);
    let tools = Tools {
        workspace,
        oracle,
        planner: &planner,
    };

    let mut steps = 0u32;
    let stop = loop {
        if let Some(limit) = config.step_limit()
            && steps >= limit
        {
            warn!(limit, "step limit reached; formatting response");
            break StopReason::StepLimit;
        }
        let tool = decide(oracle, &mut ctx)?;
        steps += 1;
        let route = dispatch(&tool, &mut ctx, &tools)?;
        on_step(&ctx);
        match route {
            Route::Decide => {}
            Route::Respond => break StopReason::Finished,
        }
    };

    respond(oracle, &mut ctx)?;
    let (response, history) = ctx.into_parts();
    info!(steps, stop = ?stop, "run finished");
    Ok(RunOutcome {
        response,
        history,
        steps,
        stop,
    })
}
