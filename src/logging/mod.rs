//! Diagnostic logging via `tracing`.
//!
//! Diagnostics never touch stdout, which carries query results. The user
//! facing error line and the `--verbose` report are written directly by
//! the binary; tracing events are for troubleshooting.

mod subscriber;

pub use subscriber::init_subscriber;

/// Environment variable holding an `EnvFilter` directive for the console.
pub const LOG_ENV: &str = "INIEDIT_LOG";

/// Environment variable naming a file that receives every debug event.
pub const LOG_FILE_ENV: &str = "INIEDIT_LOG_FILE";
