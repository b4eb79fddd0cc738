//! The shared run context and its ledger invariants.
//!
//! One [`Context`] exists per user request. The loop owns it and lends it
//! mutably to one step at a time; there is no other shared state.

use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::core::types::{ActionRecord, ActionResult, PlanEntry, ToolName};

#[derive(Debug, Clone)]
pub struct Context {
    user_query: String,
    working_dir: PathBuf,
    history: Vec<ActionRecord>,
    /// Planned edits waiting for the batch applier. Empty between edit subflows.
    pub edit_operations: Vec<PlanEntry>,
    response: Option<String>,
}

impl Context {
    pub fn new(working_dir: impl Into<PathBuf>, user_query: impl Into<String>) -> Self {
        Self {
            user_query: user_query.into(),
            working_dir: working_dir.into(),
            history: Vec::new(),
            edit_operations: Vec::new(),
            response: None,
        }
    }

    pub fn user_query(&self) -> &str {
        &self.user_query
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn history(&self) -> &[ActionRecord] {
        &self.history
    }

    pub fn last_record(&self) -> Option<&ActionRecord> {
        self.history.last()
    }

    /// Append a new record with no result yet.
    ///
    /// Refuses to append while the previous record is still waiting for its
    /// result, which keeps at most one pending record in the ledger.
    pub fn record_decision(
        &mut self,
        tool: ToolName,
        reason: String,
        params: Map<String, Value>,
    ) -> Result<&ActionRecord, String> {
        if let Some(last) = self.history.last()
            && last.result.is_none()
        {
            return Err(format!(
                "record {} ({}) has no result yet",
                self.history.len(),
                last.tool
            ));
        }
        self.history.push(ActionRecord {
            tool,
            reason,
            params,
            result: None,
        });
        Ok(&self.history[self.history.len() - 1])
    }

    /// Attach the result of the most recent record. Each record takes exactly one result.
    pub fn attach_result(&mut self, result: ActionResult) -> Result<(), String> {
        let len = self.history.len();
        let last = self
            .history
            .last_mut()
            .ok_or_else(|| "no action record to attach a result to".to_string())?;
        if last.result.is_some() {
            return Err(format!("record {len} ({}) already has a result", last.tool));
        }
        last.result = Some(result);
        Ok(())
    }

    pub fn response(&self) -> Option<&str> {
        self.response.as_deref()
    }

    /// Store the final response. Written once; later writes are ignored.
    pub fn set_response(&mut self, response: String) {
        if self.response.is_none() {
            self.response = Some(response);
        }
    }

    /// Consume the context, yielding the final response and the ledger.
    pub fn into_parts(self) -> (String, Vec<ActionRecord>) {
        (self.response.unwrap_or_default(), self.history)
    }
}

/// Check that only the last record (if any) lacks a result.
pub fn pending_results_ok(history: &[ActionRecord]) -> bool {
    match history.split_last() {
        Some((_, earlier)) => earlier.iter().all(|record| record.result.is_some()),
        None => true,
    }
}
