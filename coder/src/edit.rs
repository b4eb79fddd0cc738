//! Batch edit applier.
//!
//! Operations run highest `start_line` first, so each one still sees the line
//! numbers of the original file for every range below it. Each operation
//! reloads and rewrites the target through the [`Workspace`]; a failure only
//! affects that operation and nothing is rolled back.

use tracing::{debug, info, instrument, warn};

use crate::core::edit_plan::execution_order;
use crate::core::types::{Outcome, PlanEntry};
use crate::io::workspace::Workspace;

/// Apply `entries` to `target_file`, returning one outcome per entry in input order.
#[instrument(skip_all, fields(target_file, ops = entries.len()))]
pub fn apply_batch<W: Workspace>(
    workspace: &W,
    target_file: &str,
    entries: &[PlanEntry],
) -> Vec<Outcome> {
    let mut outcomes: Vec<Option<Outcome>> = vec![None; entries.len()];
    for idx in execution_order(entries) {
        let outcome = match &entries[idx] {
            PlanEntry::Operation(op) => {
                debug!(
                    index = idx,
                    start_line = op.start_line,
                    end_line = op.end_line,
                    "applying edit"
                );
                Outcome::from(workspace.replace_range(
                    target_file,
                    op.start_line,
                    op.end_line,
                    &op.replacement,
                ))
            }
            PlanEntry::Malformed(message) => Outcome::failed(message.clone()),
        };
        if let Some(error) = &outcome.error {
            warn!(index = idx, error = %error, "edit operation failed");
        }
        outcomes[idx] = Some(outcome);
    }

    let outcomes: Vec<Outcome> = outcomes.into_iter().flatten().collect();
    let applied = outcomes.iter().filter(|outcome| outcome.success).count();
    info!(applied, failed = outcomes.len() - applied, "applied edit batch");
    outcomes
}
