//! Blocking HTTP client for rqlite.
//!
//! `rqlite-client` sends SQL statements to an rqlite cluster over its
//! HTTP/JSON API:
//! - Statements carry positional or named parameters
//! - Requests are encoded into the server's wire format
//! - Each call tries the configured nodes in order until one accepts it
//! - Per-statement SQL errors are kept in the results, never raised
//!
//! # Example
//!
//! ```rust,no_run
//! use rqlite_client::prelude::*;
//!
//! # fn main() -> rqlite_client::error::Result<()> {
//! let client = Client::connect(ClientConfig::from_url("rqlite://localhost:4001")?)?;
//!
//! client.execute(
//!     &ExecuteRequest::new()
//!         .statement("CREATE TABLE foo (id INTEGER NOT NULL PRIMARY KEY, name TEXT)")
//!         .statement(Statement::new("INSERT INTO foo(name) VALUES(?)").bind("fiona"))
//!         .transaction(true),
//! )?;
//!
//! let rows = client.query_one("SELECT * FROM foo", Some(ConsistencyLevel::Strong))?;
//! for result in &rows.results {
//!     if let Some(err) = &result.error {
//!         eprintln!("statement failed: {err}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Failover and duplicate writes
//!
//! A node that fails after applying a write but before answering looks the
//! same as a node that never saw it. The next node then applies the write
//! again. Prefer idempotent statements when more than one node is
//! configured.

pub mod client;
pub mod connection_url;
pub mod encode;
pub mod error;
pub mod executor;
pub mod node;
pub mod request;
pub mod results;
pub mod statement;
pub mod transport;
pub mod value;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::client::{Client, ClientConfig};
    pub use crate::connection_url::ConnectionUrl;
    pub use crate::encode::{Encode, EncodedRequest, Endpoint, Method};
    pub use crate::error::{NodeError, Result, RqliteError, TransportError, TransportErrorKind};
    pub use crate::executor::Executor;
    pub use crate::node::{Node, NodeRegistry, Scheme};
    pub use crate::request::{CombinedRequest, ConsistencyLevel, ExecuteRequest, QueryRequest};
    pub use crate::results::{
        ExecuteResults, Pong, QueryResults, RequestResult, RequestResults, RowsResult,
        StatementResult,
    };
    pub use crate::statement::{Parameter, ParameterStyle, Statement};
    pub use crate::transport::{HttpResponse, HttpTransport, Transport};
    pub use crate::value::{SqlValue, ToSqlValue};
}

pub use client::{Client, ClientConfig};
pub use error::{Result, RqliteError};
