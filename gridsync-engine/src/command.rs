//! Named actions.
//!
//! Each action is a [`CommandHandler`] that deserializes its own typed input
//! from the request JSON and returns a JSON body. The [`CommandRegistry`]
//! maps action names to handlers.

use crate::engine::TableSync;
use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use gridsync_types::{parse_range, try_parse_cell, CellAddress, Matrix, TableHandle};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// What a handler hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// False when the action ran but some of its work failed.
    pub success: bool,
    pub body: Value,
}

impl CommandOutput {
    fn new(success: bool, body: Value) -> Self {
        Self { success, body }
    }
}

/// One named action.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// The action name callers dispatch on.
    fn name(&self) -> &'static str;

    /// Runs the action. `input` is the full request object.
    async fn handle(&self, sync: &TableSync, input: Value) -> EngineResult<CommandOutput>;
}

/// Deserializes a handler's input, reporting shape errors as validation failures.
fn parse_input<T: DeserializeOwned>(action: &str, input: Value) -> EngineResult<T> {
    serde_json::from_value(input)
        .map_err(|e| EngineError::validation(format!("invalid input for {action}: {e}")))
}

fn default_origin() -> String {
    "A1".to_string()
}

/// Accepts a single cell or a range, in which case its start is used.
fn parse_origin(origin: &str) -> EngineResult<CellAddress> {
    if origin.contains(':') {
        Ok(parse_range(origin)?.start)
    } else {
        Ok(try_parse_cell(origin)?)
    }
}

// ── upsert-rows-by-key ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertInput {
    #[serde(alias = "table")]
    table_handle: TableHandle,
    matrix: Matrix,
    key_columns: Vec<String>,
}

/// Updates rows matching on `keyColumns` and appends the rest.
pub struct UpsertRowsByKey;

#[async_trait]
impl CommandHandler for UpsertRowsByKey {
    fn name(&self) -> &'static str {
        "upsert-rows-by-key"
    }

    async fn handle(&self, sync: &TableSync, input: Value) -> EngineResult<CommandOutput> {
        let input: UpsertInput = parse_input(self.name(), input)?;
        let outcome = sync
            .upsert(&input.table_handle, &input.matrix, &input.key_columns)
            .await?;

        let success = outcome.success();
        let mut body = json!({
            "success": success,
            "updated": outcome.updated,
            "inserted": outcome.inserted,
        });
        if !success {
            body["errors"] = json!(outcome.errors);
        }
        Ok(CommandOutput::new(success, body))
    }
}

// ── replace-table-data ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceInput {
    #[serde(alias = "table")]
    table_handle: TableHandle,
    matrix: Matrix,
    #[serde(default = "default_origin")]
    origin: String,
}

/// Overwrites the whole table with `matrix`.
pub struct ReplaceTableData;

#[async_trait]
impl CommandHandler for ReplaceTableData {
    fn name(&self) -> &'static str {
        "replace-table-data"
    }

    async fn handle(&self, sync: &TableSync, input: Value) -> EngineResult<CommandOutput> {
        let input: ReplaceInput = parse_input(self.name(), input)?;
        let origin = parse_origin(&input.origin)?;
        let outcome = sync.replace(&input.table_handle, &input.matrix, origin).await?;

        let mut body = json!({
            "success": outcome.success,
            "count": outcome.row_count,
        });
        if let Some(cleared) = outcome.cleared {
            body["cleared"] = Value::String(cleared.to_string());
        }
        Ok(CommandOutput::new(outcome.success, body))
    }
}

// ── read-table-rows ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReadInput {
    #[serde(alias = "table")]
    table_handle: TableHandle,
}

/// Returns the remote table's headers and body rows.
pub struct ReadTableRows;

#[async_trait]
impl CommandHandler for ReadTableRows {
    fn name(&self) -> &'static str {
        "read-table-rows"
    }

    async fn handle(&self, sync: &TableSync, input: Value) -> EngineResult<CommandOutput> {
        let input: ReadInput = parse_input(self.name(), input)?;
        let snapshot = sync.read_rows(&input.table_handle).await?;
        let rows: Vec<_> = snapshot.rows.into_iter().map(|row| row.values).collect();
        Ok(CommandOutput::new(
            true,
            json!({
                "success": true,
                "headers": snapshot.headers,
                "rows": rows,
            }),
        ))
    }
}

/// Action name to handler.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<&'static str, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with every built-in action.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(UpsertRowsByKey));
        registry.register(Arc::new(ReplaceTableData));
        registry.register(Arc::new(ReadTableRows));
        registry
    }

    /// Adds `handler`, replacing any handler with the same name.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(handler.name(), handler);
    }

    /// Registered action names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.handlers.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn contains(&self, action: &str) -> bool {
        self.handlers.contains_key(action)
    }

    /// Runs the handler registered for `action`.
    pub async fn dispatch(
        &self,
        sync: &TableSync,
        action: &str,
        input: Value,
    ) -> EngineResult<CommandOutput> {
        let handler = self
            .handlers
            .get(action)
            .ok_or_else(|| EngineError::UnknownAction(action.to_string()))?;
        debug!(action, "Dispatching action");
        handler.handle(sync, input).await
    }

    /// Dispatches a request object of the form `{"action": "...", ...}`.
    pub async fn execute(&self, sync: &TableSync, request: Value) -> EngineResult<CommandOutput> {
        let action = request
            .get("action")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::validation("request must name an action"))?
            .to_string();
        self.dispatch(sync, &action, request).await
    }
}
