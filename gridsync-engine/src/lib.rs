//! Reconciliation engine for gridsync.
//!
//! [`TableSync`] reconciles a local [`Matrix`](gridsync_types::Matrix)
//! against a live workbook table in one of two ways:
//!
//! - [`TableSync::upsert`] matches rows by a composite key and updates or
//!   appends them one at a time, collecting per-row failures.
//! - [`TableSync::replace`] overwrites the whole table body, resizes the
//!   table and clears any rows left behind.
//!
//! Remote state is re-read on every call; nothing is cached between calls.
//! The [`command`] module exposes both behind named actions.

pub mod command;
mod engine;
mod error;
mod replace;
mod upsert;

pub use command::{CommandHandler, CommandOutput, CommandRegistry};
pub use engine::TableSync;
pub use error::{EngineError, EngineResult, ReplaceStep};
