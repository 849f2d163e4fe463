//! Command-line editor for INI configuration files.
//!
//! Reads, adds, updates, deletes and merges sections and parameters while
//! keeping the file's formatting, comments and line endings intact.
//!
//! The public API is organised into layers:
//!
//! - **[`ini`]**: lossless document model, parser and renderer
//! - **[`engine`]**: set/get/delete/merge semantics over a document
//! - **[`storage`]**: file locking, change detection and atomic commit
//! - **[`output`]**: `--get` formats (plain, ini, lines, sh)
//! - **[`commands`]**: one invocation from locked read to commit
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod ini;
pub mod interrupt;
pub mod logging;
pub mod output;
pub mod storage;
