//! Error types for the rqlite client.

use std::path::PathBuf;

use crate::node::Node;

/// Errors that can occur while building, sending, or decoding requests.
#[derive(Debug, thiserror::Error)]
pub enum RqliteError {
    /// A statement mixes named and positional parameters.
    ///
    /// Raised while encoding, before anything is sent.
    #[error("statement {index} mixes named and positional parameters: {sql}")]
    ParameterNaming {
        /// Position of the offending statement in the request.
        index: usize,
        /// SQL text of the offending statement.
        sql: String,
    },

    /// A statement binds the same name twice.
    ///
    /// Raised while encoding, before anything is sent.
    #[error("statement {index} binds parameter '{name}' more than once")]
    DuplicateParameter {
        /// Position of the offending statement in the request.
        index: usize,
        /// The repeated parameter name.
        name: String,
    },

    /// A float parameter is NaN or infinite.
    ///
    /// JSON cannot carry such values. Raised while encoding, before
    /// anything is sent.
    #[error("statement {index} binds a non-finite float at parameter {parameter}")]
    NonFiniteParameter {
        /// Position of the offending statement in the request.
        index: usize,
        /// Position of the parameter within the statement.
        parameter: usize,
    },

    /// Every node in the registry failed.
    ///
    /// One entry per attempted node, in registry order.
    #[error("all nodes failed:\n{}", format_node_errors(.0))]
    AllNodesFailed(Vec<NodeError>),

    /// A successful response carried a body that could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    /// A node registry was built without any node.
    #[error("no nodes configured")]
    NoNodes,

    /// A node address could not be parsed.
    #[error("invalid node: {0}")]
    InvalidNode(String),

    /// A connection URL could not be parsed.
    #[error("invalid connection URL: {0}")]
    InvalidUrl(String),

    /// Unknown read consistency level name.
    #[error("unknown consistency level: {0}")]
    UnknownConsistencyLevel(String),

    /// A peer list file contains a malformed line.
    #[error("invalid peer file '{}' line {line}: {message}", path.display())]
    PeerFile {
        /// Path to the peer file.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// IO error (reading a peer file).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),
}

impl RqliteError {
    /// Returns the per-node failures if this is an exhaustion error.
    #[must_use]
    pub fn node_errors(&self) -> Option<&[NodeError]> {
        match self {
            Self::AllNodesFailed(errors) => Some(errors),
            _ => None,
        }
    }
}

/// A single node's failure during a failover pass.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The request never produced an HTTP response.
    #[error("{node}: {source}")]
    Transport {
        /// The node that was tried.
        node: Node,
        /// What went wrong on the wire.
        source: TransportError,
    },

    /// The node answered with a non-2xx status.
    #[error("{node}: database error (status {status}): {body}")]
    Database {
        /// The node that was tried.
        node: Node,
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },
}

impl NodeError {
    /// Returns the node this error belongs to.
    #[must_use]
    pub const fn node(&self) -> &Node {
        match self {
            Self::Transport { node, .. } | Self::Database { node, .. } => node,
        }
    }

    /// Returns `true` if the node could not be reached at all.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

fn format_node_errors(errors: &[NodeError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Classification of a transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// Connection refused, DNS failure, TLS handshake failure.
    Connect,
    /// The transport's own timeout elapsed.
    Timeout,
    /// The response body could not be read.
    Body,
    /// The target URL could not be built for this node.
    InvalidUrl,
    /// Anything else the HTTP stack reports.
    Other,
}

impl std::fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Connect => "connect",
            Self::Timeout => "timeout",
            Self::Body => "body",
            Self::InvalidUrl => "invalid url",
            Self::Other => "transport",
        };
        f.write_str(name)
    }
}

/// A network or I/O failure talking to one node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} error: {message}")]
pub struct TransportError {
    /// What kind of failure this was.
    pub kind: TransportErrorKind,
    /// Human-readable description from the HTTP stack.
    pub message: String,
}

impl TransportError {
    /// Creates a new transport error.
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, err.to_string())
    }
}

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, RqliteError>;
