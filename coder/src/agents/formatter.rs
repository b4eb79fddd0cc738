//! Response formatter: the terminal step of every run.

use anyhow::{Context as _, Result};
use tracing::{info, instrument};

use crate::core::context::Context;
use crate::io::oracle::Oracle;
use crate::io::prompt::render_response;

/// Ask the oracle to summarize the ledger and store the result as the response.
#[instrument(skip_all, fields(records = ctx.history().len()))]
pub fn respond<O: Oracle>(oracle: &O, ctx: &mut Context) -> Result<()> {
    let prompt = render_response(ctx.user_query(), ctx.history())?;
    let response = oracle
        .complete(&prompt)
        .context("oracle call for final response")?;
    let response = response.trim().to_string();
    info!(response_len = response.len(), "formatted response");
    ctx.set_response(response);
    Ok(())
}
