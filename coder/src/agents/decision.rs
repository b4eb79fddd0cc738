//! Decision engine: asks the oracle which tool to run next.

use anyhow::{Result, anyhow};
use tracing::{info, instrument, warn};

use crate::core::context::Context;
use crate::core::decision::{Decision, parse_decision};
use crate::core::types::ToolName;
use crate::io::oracle::Oracle;
use crate::io::prompt::render_decision;

/// Consult the oracle, append the decision to the ledger, and return the tool.
///
/// Unusable oracle output and oracle transport failures both degrade to
/// `finish`. Only prompt rendering and ledger violations are errors.
#[instrument(skip_all, fields(step = ctx.history().len() + 1))]
pub fn decide<O: Oracle>(oracle: &O, ctx: &mut Context) -> Result<ToolName> {
    let prompt = render_decision(
        &ctx.working_dir().display().to_string(),
        ctx.user_query(),
        ctx.history(),
    )?;

    let decision = match oracle.complete(&prompt) {
        Ok(text) => parse_decision(&text),
        Err(err) => {
            warn!(err = %format!("{err:#}"), "oracle call failed");
            Decision::oracle_failure()
        }
    };
    if let Decision::Fallback { reason } = &decision {
        warn!(reason = %reason, "falling back to finish");
    }

    let (tool, reason, params) = decision.into_parts();
    info!(tool = %tool, reason = %reason, "selected tool");
    let record = ctx
        .record_decision(tool, reason, params)
        .map_err(|err| anyhow!("ledger: {err}"))?;
    Ok(record.tool.clone())
}
