//! Stable exit codes for the `coder` CLI.

/// The run finished with a response.
pub const OK: i32 = 0;
/// Invalid config, I/O failure, or an oracle failure while formatting the response.
pub const INVALID: i32 = 1;
/// The run hit `max_steps` before the oracle chose `finish`. A response is still printed.
pub const STEP_LIMIT: i32 = 2;
