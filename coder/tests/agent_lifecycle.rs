//! Loop-level tests for full agent runs against a scratch working directory.
//!
//! Each test scripts the oracle's replies in order (decisions, edit plans,
//! and the final summary) and checks both the files on disk and the ledger.

use serde_json::json;

use coder::core::context::pending_results_ok;
use coder::core::decision::FALLBACK_REASON;
use coder::core::types::{ActionResult, EditResult, Outcome, Tool, ToolName};
use coder::io::config::CoderConfig;
use coder::looping::{StopReason, run_agent};
use coder::test_support::{ScratchDir, ScriptedOracle, decision, numbered_lines};

/// "delete the README" end to end:
///
/// 1. decide -> `delete_file {target_file: README.md}`
/// 2. dispatcher deletes it -> `{success: true, error: null}`
/// 3. decide -> `finish`
/// 4. formatter summarizes the ledger
#[test]
fn delete_readme_request_deletes_and_summarizes() {
    let scratch = ScratchDir::new().expect("scratch");
    scratch.write("README.md", "# Project\n").expect("write");
    scratch.write("src/main.py", "print('hi')\n").expect("write");

    let oracle = ScriptedOracle::texts([
        decision(
            "delete_file",
            "the user asked to remove the README",
            json!({"target_file": "README.md"}),
        ),
        decision("finish", "README deleted", json!({})),
        "Deleted README.md as requested.".to_string(),
    ]);

    let mut snapshots = 0;
    let outcome = run_agent(
        &oracle,
        &scratch.workspace(),
        &CoderConfig::default(),
        "delete the README",
        |ctx| {
            snapshots += 1;
            assert!(pending_results_ok(ctx.history()));
        },
    )
    .expect("run");

    assert!(!scratch.exists("README.md"));
    assert!(scratch.exists("src/main.py"));

    assert_eq!(outcome.stop, StopReason::Finished);
    assert_eq!(outcome.steps, 2);
    assert_eq!(snapshots, 2);
    assert_eq!(outcome.history.len(), 2);

    let delete = &outcome.history[0];
    assert_eq!(delete.tool, ToolName::Known(Tool::DeleteFile));
    assert_eq!(delete.params.get("target_file"), Some(&json!("README.md")));
    assert_eq!(delete.result, Some(ActionResult::Delete(Outcome::ok())));
    assert_eq!(
        serde_json::to_value(delete.result.as_ref().expect("result")).expect("json"),
        json!({"success": true, "error": null})
    );

    assert_eq!(outcome.history[1].tool, ToolName::Known(Tool::Finish));
    assert!(!outcome.response.is_empty());
    assert!(outcome.response.contains("README"));

    // The second decision and the summary both saw the deletion.
    let prompts = oracle.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts[1].contains("\"delete_file\""));
    assert!(prompts[2].contains("\"delete_file\""));
}

/// Edit subflow on a 10-line file with two disjoint ranges, planned in
/// ascending order and executed descending.
#[test]
fn edit_request_applies_batch_without_line_drift() {
    let scratch = ScratchDir::new().expect("scratch");
    scratch.write("notes.txt", &numbered_lines(10)).expect("write");

    let oracle = ScriptedOracle::texts([
        decision(
            "edit_file",
            "rewrite two regions",
            json!({
                "target_file": "notes.txt",
                "instructions": "replace line 3 and merge lines 7-8",
                "code_edit": "new line 3 / merged",
            }),
        ),
        r#"[{"start_line": 3, "end_line": 3, "replacement": "new line 3\n"},
            {"start_line": 7, "end_line": 8, "replacement": "merged\n"}]"#
            .to_string(),
        decision("finish", "done", json!({})),
        "Edited notes.txt.".to_string(),
    ]);

    let outcome = run_agent(
        &oracle,
        &scratch.workspace(),
        &CoderConfig::default(),
        "tidy notes.txt",
        |ctx| {
            assert!(pending_results_ok(ctx.history()));
            assert!(ctx.edit_operations.is_empty());
        },
    )
    .expect("run");

    let content = scratch.read("notes.txt").expect("read");
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(
        lines,
        vec![
            "line 1",
            "line 2",
            "new line 3",
            "line 4",
            "line 5",
            "line 6",
            "merged",
            "line 9",
            "line 10",
        ]
    );

    assert_eq!(
        outcome.history[0].result,
        Some(ActionResult::Edit(EditResult {
            read: Outcome::ok(),
            operations: vec![Outcome::ok(), Outcome::ok()],
        }))
    );
    // The planner prompt carried the file content with the instructions.
    let planner_prompt = &oracle.prompts()[1];
    assert!(planner_prompt.contains("merge lines 7-8"));
    assert!(planner_prompt.contains("line 10"));
}

#[test]
fn read_then_grep_then_list_feed_history_back() {
    let scratch = ScratchDir::new().expect("scratch");
    scratch
        .write("docs/guide.md", "Install\nConfigure the TOKEN\n")
        .expect("write");

    let oracle = ScriptedOracle::texts([
        decision("read_file", "", json!({"target_file": "docs/guide.md"})),
        decision("grep_search", "", json!({"query": "token", "include_pattern": "*.md"})),
        decision("list_dir", "", json!({"relative_workspace_path": "docs"})),
        decision("finish", "", json!({})),
        "Found the token setting in docs/guide.md.".to_string(),
    ]);

    let outcome = run_agent(
        &oracle,
        &scratch.workspace(),
        &CoderConfig::default(),
        "where is the token configured?",
        |ctx| assert!(pending_results_ok(ctx.history())),
    )
    .expect("run");

    assert_eq!(outcome.steps, 4);
    let Some(ActionResult::Read(read)) = &outcome.history[0].result else {
        panic!("expected read result");
    };
    assert_eq!(read.content, "Install\nConfigure the TOKEN\n");

    let Some(ActionResult::Grep(grep)) = &outcome.history[1].result else {
        panic!("expected grep result");
    };
    assert_eq!(grep.results.len(), 1);
    assert_eq!(grep.results[0].file, "docs/guide.md");
    assert_eq!(grep.results[0].line, 2);

    let Some(ActionResult::List(list)) = &outcome.history[2].result else {
        panic!("expected list result");
    };
    assert_eq!(list.tree_visualization, "docs\n└── guide.md\n");

    // Each decision prompt carries every earlier result.
    let prompts = oracle.prompts();
    assert!(prompts[1].contains("Configure the TOKEN"));
    assert!(prompts[3].contains("└── guide.md"));
}

#[test]
fn malformed_decision_finishes_without_error() {
    let scratch = ScratchDir::new().expect("scratch");
    scratch.write("keep.txt", "data\n").expect("write");

    let oracle = ScriptedOracle::texts([
        "I would like to delete keep.txt".to_string(),
        "No changes were made.".to_string(),
    ]);

    let outcome = run_agent(
        &oracle,
        &scratch.workspace(),
        &CoderConfig::default(),
        "delete keep.txt",
        |_| {},
    )
    .expect("run");

    assert!(scratch.exists("keep.txt"));
    assert_eq!(outcome.stop, StopReason::Finished);
    assert_eq!(outcome.history.len(), 1);
    assert_eq!(outcome.history[0].tool, ToolName::Known(Tool::Finish));
    assert_eq!(outcome.history[0].reason, FALLBACK_REASON);
    assert!(outcome.history[0].params.is_empty());
    assert_eq!(outcome.response, "No changes were made.");
}

#[test]
fn failing_tools_are_recorded_and_the_loop_continues() {
    let scratch = ScratchDir::new().expect("scratch");

    let oracle = ScriptedOracle::texts([
        decision("read_file", "", json!({"target_file": "missing.rs"})),
        decision("delete_file", "", json!({"target_file": "missing.rs"})),
        decision("grep_search", "", json!({"query": "(["})),
        decision("list_dir", "", json!({"relative_workspace_path": "nope"})),
        decision("finish", "", json!({})),
        "Nothing could be done.".to_string(),
    ]);

    let outcome = run_agent(
        &oracle,
        &scratch.workspace(),
        &CoderConfig::default(),
        "fix missing.rs",
        |ctx| assert!(pending_results_ok(ctx.history())),
    )
    .expect("run");

    assert_eq!(outcome.steps, 5);
    let results: Vec<&ActionResult> = outcome.history[..4]
        .iter()
        .map(|record| record.result.as_ref().expect("result"))
        .collect();

    let ActionResult::Read(read) = results[0] else {
        panic!("expected read result");
    };
    assert!(read.error.as_deref().is_some_and(|e| e.starts_with("File not found")));
    assert_eq!(
        results[1],
        &ActionResult::Delete(Outcome::failed("File does not exist"))
    );
    let ActionResult::Grep(grep) = results[2] else {
        panic!("expected grep result");
    };
    assert!(grep.error.as_deref().is_some_and(|e| e.starts_with("Invalid regex")));
    let ActionResult::List(list) = results[3] else {
        panic!("expected list result");
    };
    assert!(!list.success);
    assert_eq!(list.tree_visualization, "[path does not exist]\n");
}
