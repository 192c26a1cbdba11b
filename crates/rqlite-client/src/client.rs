//! Client facade.

use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::connection_url::{ConnectionUrl, DEFAULT_LEVEL};
use crate::encode::{Encode, EncodedRequest};
use crate::error::Result;
use crate::executor::Executor;
use crate::node::{Node, NodeRegistry, Scheme};
use crate::request::{CombinedRequest, ConsistencyLevel, ExecuteRequest, QueryRequest};
use crate::results::{
    decode_execute, decode_pong, decode_query, decode_request, ExecuteResults, Pong,
    QueryResults, RequestResults,
};
use crate::statement::Statement;
use crate::transport::{HttpTransport, Transport};

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Nodes in failover order.
    pub registry: NodeRegistry,
    /// Consistency used by the query shortcuts.
    pub default_level: ConsistencyLevel,
    /// HTTP request timeout.
    pub timeout: Option<Duration>,
    /// HTTP connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// Creates a configuration for `registry`.
    #[must_use]
    pub const fn new(registry: NodeRegistry) -> Self {
        Self {
            registry,
            default_level: DEFAULT_LEVEL,
            timeout: None,
            connect_timeout: None,
        }
    }

    /// Creates a configuration for a single node.
    pub fn for_node(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self::new(NodeRegistry::single(Node::new(scheme, host, port)))
    }

    /// Creates a configuration from a connection URL.
    ///
    /// # Errors
    ///
    /// Fails if the URL cannot be parsed.
    pub fn from_url(url: &str) -> Result<Self> {
        let url = ConnectionUrl::parse(url)?;
        Ok(Self::new(NodeRegistry::single(url.node)).default_level(url.level))
    }

    /// Creates a configuration from a peer list file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or parsed.
    pub fn from_peer_file(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(NodeRegistry::from_peer_file(path)?))
    }

    /// Sets the default consistency level.
    #[must_use]
    pub const fn default_level(mut self, level: ConsistencyLevel) -> Self {
        self.default_level = level;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the HTTP connect timeout.
    #[must_use]
    pub const fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }
}

/// A blocking rqlite client.
///
/// Every call goes through the node registry in order until one node
/// accepts it. Writes that fail over can be applied more than once; see
/// [`crate::executor`].
#[derive(Debug, Clone)]
pub struct Client<T: Transport = HttpTransport> {
    executor: Executor<T>,
    default_level: ConsistencyLevel,
}

impl Client<HttpTransport> {
    /// Connects using the HTTP transport.
    ///
    /// No request is made; use [`Client::ping`] to check reachability.
    ///
    /// # Errors
    ///
    /// Fails if the HTTP client cannot be created.
    pub fn connect(config: ClientConfig) -> Result<Self> {
        let mut builder = HttpTransport::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        Ok(Self::with_transport(config, builder.build()?))
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client with a custom transport.
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            executor: Executor::new(config.registry, transport),
            default_level: config.default_level,
        }
    }

    /// Returns the node registry.
    #[must_use]
    pub const fn registry(&self) -> &NodeRegistry {
        self.executor.registry()
    }

    /// Returns the default consistency level.
    #[must_use]
    pub const fn default_level(&self) -> ConsistencyLevel {
        self.default_level
    }

    /// Runs a write request.
    ///
    /// # Errors
    ///
    /// Fails on mixed parameter naming, when every node fails, or when the
    /// response cannot be decoded. Statement errors are in the results.
    pub fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResults> {
        let body = self.send(&request.encode()?)?;
        decode_execute(&body)
    }

    /// Runs a read request.
    ///
    /// # Errors
    ///
    /// Fails on mixed parameter naming, when every node fails, or when the
    /// response cannot be decoded. Statement errors are in the results.
    pub fn query(&self, request: &QueryRequest) -> Result<QueryResults> {
        let body = self.send(&request.encode()?)?;
        decode_query(&body)
    }

    /// Runs a mixed read/write request.
    ///
    /// # Errors
    ///
    /// Fails on mixed parameter naming, when every node fails, or when the
    /// response cannot be decoded. Statement errors are in the results.
    pub fn request(&self, request: &CombinedRequest) -> Result<RequestResults> {
        let body = self.send(&request.encode()?)?;
        decode_request(&body)
    }

    /// Checks that a node answers on `/status`.
    ///
    /// # Errors
    ///
    /// Fails when every node fails or the status body is not JSON.
    pub fn ping(&self) -> Result<Pong> {
        let (_, response) = self.executor.run(&EncodedRequest::status())?;
        decode_pong(&response)
    }

    /// Executes statements with timings enabled.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`].
    pub fn execute_sql<S: Into<Statement>>(
        &self,
        statements: impl IntoIterator<Item = S>,
        transaction: bool,
    ) -> Result<ExecuteResults> {
        self.execute(
            &ExecuteRequest::new()
                .statements(statements)
                .transaction(transaction)
                .timings(true),
        )
    }

    /// Executes a single statement with timings enabled.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`].
    pub fn execute_one(&self, statement: impl Into<Statement>) -> Result<ExecuteResults> {
        self.execute_sql([statement.into()], false)
    }

    /// Queries with the given level, or the default level when `None`.
    ///
    /// # Errors
    ///
    /// See [`Client::query`].
    pub fn query_sql<S: Into<Statement>>(
        &self,
        statements: impl IntoIterator<Item = S>,
        transaction: bool,
        level: Option<ConsistencyLevel>,
    ) -> Result<QueryResults> {
        self.query(
            &QueryRequest::new()
                .statements(statements)
                .transaction(transaction)
                .level(level.unwrap_or(self.default_level)),
        )
    }

    /// Runs a single query.
    ///
    /// # Errors
    ///
    /// See [`Client::query`].
    pub fn query_one(
        &self,
        statement: impl Into<Statement>,
        level: Option<ConsistencyLevel>,
    ) -> Result<QueryResults> {
        self.query_sql([statement.into()], false, level)
    }

    fn send(&self, request: &EncodedRequest) -> Result<String> {
        let (node, response) = self.executor.run(request)?;
        debug!(node = %node, bytes = response.body.len(), "Decoding response");
        Ok(response.body)
    }
}
