//! Failover executor.
//!
//! An encoded request is sent to each node of the registry in order until
//! one answers with a 2xx status. Nodes that cannot be reached or that
//! answer with any other status are recorded and skipped. If every node
//! fails, the recorded errors are returned together, in registry order.
//!
//! Each node is tried exactly once per call. There is no backoff and no
//! overall deadline; the only time limit is the transport's own timeout.
//!
//! A write that reached a node before the connection broke may already be
//! applied there when the executor moves on to the next node, so a
//! failover can apply a non-idempotent write twice.

use tracing::{debug, info, warn};

use crate::encode::EncodedRequest;
use crate::error::{NodeError, Result, RqliteError, TransportError, TransportErrorKind};
use crate::node::{Node, NodeRegistry};
use crate::transport::{HttpResponse, Transport};

/// Sends encoded requests to a cluster with failover.
#[derive(Debug, Clone)]
pub struct Executor<T: Transport> {
    registry: NodeRegistry,
    transport: T,
}

impl<T: Transport> Executor<T> {
    /// Creates an executor over `registry`.
    pub const fn new(registry: NodeRegistry, transport: T) -> Self {
        Self {
            registry,
            transport,
        }
    }

    /// Returns the node registry.
    #[must_use]
    pub const fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    /// Returns the transport.
    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` to the first node that accepts it.
    ///
    /// # Errors
    ///
    /// Returns [`RqliteError::AllNodesFailed`] with one entry per node if no
    /// node answered with a 2xx status.
    pub fn run(&self, request: &EncodedRequest) -> Result<(Node, HttpResponse)> {
        let mut failures = Vec::with_capacity(self.registry.len());

        for (attempt, node) in self.registry.iter().enumerate() {
            debug!(
                node = %node,
                attempt = attempt + 1,
                method = request.method.as_str(),
                path = request.endpoint.path(),
                "Sending request"
            );

            match self.attempt(node, request) {
                Ok(response) => {
                    debug!(node = %node, status = response.status, "Request succeeded");
                    return Ok((node.clone(), response));
                }
                Err(err) => {
                    warn!(node = %node, error = %err, "Node failed, trying next");
                    failures.push(err);
                }
            }
        }

        info!(
            nodes = failures.len(),
            path = request.endpoint.path(),
            "All nodes failed"
        );
        Err(RqliteError::AllNodesFailed(failures))
    }

    fn attempt(
        &self,
        node: &Node,
        request: &EncodedRequest,
    ) -> std::result::Result<HttpResponse, NodeError> {
        let url = request.url_for(node).map_err(|e| NodeError::Transport {
            node: node.clone(),
            source: TransportError::new(TransportErrorKind::InvalidUrl, e.to_string()),
        })?;

        let response = self
            .transport
            .send(request.method, &url, request.body.as_deref())
            .map_err(|source| NodeError::Transport {
                node: node.clone(),
                source,
            })?;

        if !response.is_success() {
            return Err(NodeError::Database {
                node: node.clone(),
                status: response.status,
                body: response.body,
            });
        }

        Ok(response)
    }
}
