//! Edit planner: turns edit instructions into line-range operations.

use anyhow::Result;
use tracing::{info, instrument, warn};

use crate::core::edit_plan::parse_edit_plan;
use crate::core::types::PlanEntry;
use crate::io::oracle::Oracle;
use crate::io::prompt::{PlanPromptInput, render_edit_plan};

/// Planner settings shared by every edit subflow of a run.
#[derive(Debug, Clone)]
pub struct EditPlanner {
    visible_chars: usize,
}

impl EditPlanner {
    /// `visible_chars` bounds how much of the target file the oracle sees.
    pub fn new(visible_chars: usize) -> Self {
        Self { visible_chars }
    }

    /// Ask the oracle for an edit plan.
    ///
    /// An oracle failure or unparseable reply yields an empty plan.
    #[instrument(skip_all, fields(content_chars = content.chars().count()))]
    pub fn plan<O: Oracle>(
        &self,
        oracle: &O,
        content: &str,
        instructions: &str,
        code_edit: &str,
    ) -> Result<Vec<PlanEntry>> {
        let prompt = render_edit_plan(PlanPromptInput {
            content,
            instructions,
            code_edit,
            visible_chars: self.visible_chars,
        })?;

        let plan = match oracle.complete(&prompt) {
            Ok(text) => parse_edit_plan(&text),
            Err(err) => {
                warn!(err = %format!("{err:#}"), "oracle call failed; planning no edits");
                Vec::new()
            }
        };
        let malformed = plan
            .iter()
            .filter(|entry| matches!(entry, PlanEntry::Malformed(_)))
            .count();
        info!(ops = plan.len(), malformed, "planned edits");
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::EditOperation;
    use crate::test_support::{ScriptedOracle, ScriptedReply, numbered_lines};

    #[test]
    fn parses_plan_from_oracle() {
        let oracle = ScriptedOracle::texts([
            r#"[{"start_line": 3, "end_line": 3, "replacement": "new line 3\n"}]"#,
        ]);
        let plan = EditPlanner::new(8000)
            .plan(&oracle, &numbered_lines(5), "change line 3", "new line 3")
            .expect("plan");
        assert_eq!(
            plan,
            vec![PlanEntry::Operation(EditOperation {
                start_line: 3,
                end_line: 3,
                replacement: "new line 3\n".to_string(),
            })]
        );
        let prompt = &oracle.prompts()[0];
        assert!(prompt.contains("change line 3"));
        assert!(prompt.contains("line 5"));
    }

    #[test]
    fn prompt_sees_only_visible_prefix() {
        let oracle = ScriptedOracle::texts(["[]"]);
        let content = format!("{}TAIL_MARKER\n", "x".repeat(100));
        EditPlanner::new(50)
            .plan(&oracle, &content, "", "")
            .expect("plan");
        assert!(!oracle.prompts()[0].contains("TAIL_MARKER"));
    }

    #[test]
    fn oracle_failure_plans_nothing() {
        let oracle = ScriptedOracle::new(vec![ScriptedReply::Error("spawn failed".to_string())]);
        let plan = EditPlanner::new(8000)
            .plan(&oracle, "a\n", "", "")
            .expect("plan");
        assert!(plan.is_empty());
    }
}
