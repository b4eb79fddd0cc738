//! Side-effecting helpers: workspace, oracle backends, config, prompts.

pub mod config;
pub mod dir_tree;
pub mod oracle;
pub mod process;
pub mod prompt;
pub mod search;
pub mod workspace;
