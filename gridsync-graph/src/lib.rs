//! Workbook API client for gridsync.
//!
//! Everything that talks to the remote document service lives here:
//!
//! - [`TokenProvider`] keeps a bearer credential valid, refreshing it ahead
//!   of expiry and persisting the result through a [`CredentialStore`].
//! - [`Transport`] performs GET/POST/PATCH calls, retries rate-limited
//!   responses and maps failures into [`GraphError`].
//! - [`WorkbookClient`] exposes the handful of table and range operations
//!   the reconciliation engine needs, in terms of `gridsync-types`.
//!
//! # Example
//!
//! ```no_run
//! use gridsync_graph::{GraphConfig, MemoryCredentialStore, TokenProvider, Transport, WorkbookClient};
//! use std::sync::Arc;
//!
//! # fn main() -> gridsync_graph::GraphResult<()> {
//! let config = GraphConfig::default();
//! let store = Arc::new(MemoryCredentialStore::default());
//! let tokens = Arc::new(TokenProvider::new(&config, store)?);
//! let transport = Arc::new(Transport::new(&config, tokens)?);
//! let workbook = WorkbookClient::new(transport, &config);
//! # let _ = workbook;
//! # Ok(())
//! # }
//! ```

mod config;
pub mod credentials;
mod error;
pub mod token;
pub mod transport;
pub mod workbook;

pub use config::{GraphConfig, RetryPolicy};
pub use credentials::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, StoredCredential,
};
pub use error::{GraphError, GraphResult};
pub use token::{AccessTokenSource, StaticToken, TokenProvider};
pub use transport::Transport;
pub use workbook::WorkbookClient;
