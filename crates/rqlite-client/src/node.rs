//! Cluster nodes and the ordered registry used for failover.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{Result, RqliteError};

/// HTTP scheme used to reach a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Scheme {
    /// Plain HTTP.
    #[default]
    Http,
    /// HTTP over TLS.
    Https,
}

impl Scheme {
    /// Returns the scheme name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Scheme {
    type Err = RqliteError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "http" => Ok(Self::Http),
            "https" => Ok(Self::Https),
            other => Err(RqliteError::InvalidNode(format!("unknown scheme '{other}'"))),
        }
    }
}

/// One HTTP endpoint of the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    /// Scheme.
    pub scheme: Scheme,
    /// Host name or address.
    pub host: String,
    /// Port.
    pub port: u16,
}

impl Node {
    /// Creates a node.
    pub fn new(scheme: Scheme, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme,
            host: host.into(),
            port,
        }
    }

    /// Creates a plain HTTP node.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new(Scheme::Http, host, port)
    }

    /// Creates an HTTPS node.
    pub fn https(host: impl Into<String>, port: u16) -> Self {
        Self::new(Scheme::Https, host, port)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Parses `scheme://host:port` or `host:port` (HTTP).
impl FromStr for Node {
    type Err = RqliteError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (scheme, rest) = match s.split_once("://") {
            Some((scheme, rest)) => (scheme.parse::<Scheme>()?, rest),
            None => (Scheme::Http, s),
        };
        let rest = rest.trim_end_matches('/');
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| RqliteError::InvalidNode(format!("missing port in '{s}'")))?;
        if host.is_empty() {
            return Err(RqliteError::InvalidNode(format!("missing host in '{s}'")));
        }
        let port = parse_port(port)?;
        Ok(Self::new(scheme, host, port))
    }
}

fn parse_port(port: &str) -> Result<u16> {
    port.trim()
        .parse()
        .map_err(|_| RqliteError::InvalidNode(format!("invalid port '{}'", port.trim())))
}

/// Ordered, non-empty list of nodes for one cluster.
///
/// Nodes are tried in the order they were given. The registry never
/// changes after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRegistry {
    nodes: Vec<Node>,
}

impl NodeRegistry {
    /// Creates a registry from nodes in failover order.
    ///
    /// # Errors
    ///
    /// Returns [`RqliteError::NoNodes`] if `nodes` is empty.
    pub fn new(nodes: Vec<Node>) -> Result<Self> {
        if nodes.is_empty() {
            return Err(RqliteError::NoNodes);
        }
        Ok(Self { nodes })
    }

    /// Creates a registry with a single node.
    #[must_use]
    pub fn single(node: Node) -> Self {
        Self { nodes: vec![node] }
    }

    /// Loads a peer list file.
    ///
    /// Each line is `scheme,host,port`. Blank lines and lines starting with
    /// `#` are skipped.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, a line is malformed, or no peers
    /// are listed.
    pub fn from_peer_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        Self::parse_peer_list(&contents).map_err(|(line, message)| RqliteError::PeerFile {
            path: path.to_path_buf(),
            line,
            message,
        })
    }

    fn parse_peer_list(contents: &str) -> std::result::Result<Self, (usize, String)> {
        let mut nodes = Vec::new();
        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let fields: Vec<&str> = line.split(',').map(str::trim).collect();
            let [scheme, host, port] = fields.as_slice() else {
                return Err((idx + 1, format!("expected 'scheme,host,port', got '{line}'")));
            };
            let node = scheme
                .parse::<Scheme>()
                .and_then(|scheme| Ok(Node::new(scheme, *host, parse_port(port)?)))
                .map_err(|e| (idx + 1, e.to_string()))?;
            nodes.push(node);
        }
        Self::new(nodes).map_err(|e| (0, e.to_string()))
    }

    /// Returns the nodes in failover order.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter()
    }

    /// Returns the nodes as a slice.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns the first node.
    #[must_use]
    pub fn primary(&self) -> &Node {
        &self.nodes[0]
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always `false`; a registry holds at least one node.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl<'a> IntoIterator for &'a NodeRegistry {
    type Item = &'a Node;
    type IntoIter = std::slice::Iter<'a, Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
