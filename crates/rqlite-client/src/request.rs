//! Request types for the three statement endpoints.
//!
//! Each request carries only the options its endpoint understands. Every
//! flag defaults to off and every duration to unset; building a request
//! never fails.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::RqliteError;
use crate::statement::Statement;

/// Read consistency level for queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConsistencyLevel {
    /// The node reads its local database.
    None,
    /// The node checks it is the leader before reading.
    Weak,
    /// The read goes through the Raft log.
    Strong,
}

impl ConsistencyLevel {
    /// Returns the query-string value for this level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Weak => "weak",
            Self::Strong => "strong",
        }
    }
}

impl fmt::Display for ConsistencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConsistencyLevel {
    type Err = RqliteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "weak" => Ok(Self::Weak),
            "strong" => Ok(Self::Strong),
            _ => Err(RqliteError::UnknownConsistencyLevel(s.to_string())),
        }
    }
}

/// A write request for `/db/execute`.
///
/// A failover may resend the same statements to another node after the
/// first node already applied them, so statements without a natural key
/// can be applied twice.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecuteRequest {
    /// Statements, in execution order.
    pub statements: Vec<Statement>,
    /// Run all statements in a single transaction.
    pub transaction: bool,
    /// Ask the server to report timings.
    pub timings: bool,
    /// Server-side statement timeout.
    pub timeout: Option<Duration>,
    /// Disable rewriting of `RANDOM()` before replication.
    pub no_rewrite_random: bool,
    /// Queue the write instead of applying it synchronously.
    pub queue: bool,
    /// With `queue`, wait until the queued write is applied.
    pub wait: bool,
}

impl ExecuteRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    #[must_use]
    pub fn statement(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Appends several statements.
    #[must_use]
    pub fn statements<S: Into<Statement>>(
        mut self,
        statements: impl IntoIterator<Item = S>,
    ) -> Self {
        self.statements.extend(statements.into_iter().map(Into::into));
        self
    }

    /// Sets the `transaction` flag.
    #[must_use]
    pub const fn transaction(mut self, enabled: bool) -> Self {
        self.transaction = enabled;
        self
    }

    /// Sets the `timings` flag.
    #[must_use]
    pub const fn timings(mut self, enabled: bool) -> Self {
        self.timings = enabled;
        self
    }

    /// Sets the server-side timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `norwrandom` flag.
    #[must_use]
    pub const fn no_rewrite_random(mut self, enabled: bool) -> Self {
        self.no_rewrite_random = enabled;
        self
    }

    /// Sets the `queue` flag.
    #[must_use]
    pub const fn queue(mut self, enabled: bool) -> Self {
        self.queue = enabled;
        self
    }

    /// Sets the `wait` flag.
    #[must_use]
    pub const fn wait(mut self, enabled: bool) -> Self {
        self.wait = enabled;
        self
    }
}

/// A read request for `/db/query`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRequest {
    /// Statements, in execution order.
    pub statements: Vec<Statement>,
    /// Run all statements in a single transaction.
    pub transaction: bool,
    /// Ask the server to report timings.
    pub timings: bool,
    /// Server-side statement timeout.
    pub timeout: Option<Duration>,
    /// Disable rewriting of `RANDOM()`.
    pub no_rewrite_random: bool,
    /// Read consistency. `None` leaves the choice to the server.
    pub level: Option<ConsistencyLevel>,
    /// Maximum staleness accepted for `none` reads.
    pub freshness: Option<Duration>,
}

impl QueryRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    #[must_use]
    pub fn statement(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Appends several statements.
    #[must_use]
    pub fn statements<S: Into<Statement>>(
        mut self,
        statements: impl IntoIterator<Item = S>,
    ) -> Self {
        self.statements.extend(statements.into_iter().map(Into::into));
        self
    }

    /// Sets the `transaction` flag.
    #[must_use]
    pub const fn transaction(mut self, enabled: bool) -> Self {
        self.transaction = enabled;
        self
    }

    /// Sets the `timings` flag.
    #[must_use]
    pub const fn timings(mut self, enabled: bool) -> Self {
        self.timings = enabled;
        self
    }

    /// Sets the server-side timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `norwrandom` flag.
    #[must_use]
    pub const fn no_rewrite_random(mut self, enabled: bool) -> Self {
        self.no_rewrite_random = enabled;
        self
    }

    /// Sets the read consistency level.
    #[must_use]
    pub const fn level(mut self, level: ConsistencyLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the freshness bound.
    #[must_use]
    pub const fn freshness(mut self, freshness: Duration) -> Self {
        self.freshness = Some(freshness);
        self
    }
}

/// A mixed read/write request for `/db/request`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombinedRequest {
    /// Statements, in execution order.
    pub statements: Vec<Statement>,
    /// Run all statements in a single transaction.
    pub transaction: bool,
    /// Ask the server to report timings.
    pub timings: bool,
    /// Server-side statement timeout.
    pub timeout: Option<Duration>,
    /// Disable rewriting of `RANDOM()`.
    pub no_rewrite_random: bool,
    /// Read consistency for the read statements.
    pub level: Option<ConsistencyLevel>,
}

impl CombinedRequest {
    /// Creates an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a statement.
    #[must_use]
    pub fn statement(mut self, statement: impl Into<Statement>) -> Self {
        self.statements.push(statement.into());
        self
    }

    /// Appends several statements.
    #[must_use]
    pub fn statements<S: Into<Statement>>(
        mut self,
        statements: impl IntoIterator<Item = S>,
    ) -> Self {
        self.statements.extend(statements.into_iter().map(Into::into));
        self
    }

    /// Sets the `transaction` flag.
    #[must_use]
    pub const fn transaction(mut self, enabled: bool) -> Self {
        self.transaction = enabled;
        self
    }

    /// Sets the `timings` flag.
    #[must_use]
    pub const fn timings(mut self, enabled: bool) -> Self {
        self.timings = enabled;
        self
    }

    /// Sets the server-side timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the `norwrandom` flag.
    #[must_use]
    pub const fn no_rewrite_random(mut self, enabled: bool) -> Self {
        self.no_rewrite_random = enabled;
        self
    }

    /// Sets the read consistency level.
    #[must_use]
    pub const fn level(mut self, level: ConsistencyLevel) -> Self {
        self.level = Some(level);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_off() {
        let req = ExecuteRequest::new();
        assert!(req.statements.is_empty());
        assert!(!req.transaction && !req.timings && !req.queue && !req.wait);
        assert!(!req.no_rewrite_random);
        assert_eq!(req.timeout, None);

        let req = QueryRequest::new();
        assert_eq!(req.level, None);
        assert_eq!(req.freshness, None);
    }

    #[test]
    fn test_fluent_construction() {
        let req = QueryRequest::new()
            .statements(["SELECT * FROM foo", "SELECT * FROM bar"])
            .transaction(true)
            .level(ConsistencyLevel::Strong)
            .freshness(Duration::from_secs(1));
        assert_eq!(req.statements.len(), 2);
        assert!(req.transaction);
        assert_eq!(req.level, Some(ConsistencyLevel::Strong));
        assert_eq!(req.freshness, Some(Duration::from_secs(1)));
    }

    #[test]
    fn test_consistency_level_parse() {
        assert_eq!("STRONG".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::Strong);
        assert_eq!("weak".parse::<ConsistencyLevel>().unwrap(), ConsistencyLevel::Weak);
        assert!(matches!(
            "linearizable".parse::<ConsistencyLevel>(),
            Err(RqliteError::UnknownConsistencyLevel(_))
        ));
    }

    #[test]
    fn test_consistency_level_display() {
        assert_eq!(ConsistencyLevel::None.to_string(), "none");
        assert_eq!(ConsistencyLevel::Strong.as_str(), "strong");
    }
}
