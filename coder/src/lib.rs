//! Autonomous single-tool coding agent loop.
//!
//! Given a request, the agent repeatedly asks an oracle (an LLM behind a
//! command) which one tool to run next, runs it against a working directory,
//! and records the outcome in a ledger that feeds the next decision. The
//! architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (types, decision and plan parsing,
//!   line splicing, ledger invariants). No I/O.
//! - **[`io`]**: Side-effecting operations (filesystem, child processes,
//!   config, prompt rendering).
//! - **[`agents`]**: The oracle-consulting steps.
//!
//! Orchestration modules ([`dispatch`], [`edit`], [`looping`]) wire the agents
//! to the workspace.

pub mod agents;
pub mod core;
pub mod dispatch;
pub mod edit;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod looping;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
