//! Wire encoding of requests.
//!
//! A request becomes an endpoint path, a list of query options and a JSON
//! body. The body is a flat array of SQL strings when no statement carries
//! parameters, otherwise an array of `[sql, params...]` arrays where named
//! parameters are a single object and positional ones follow the SQL.

use std::time::Duration;

use tracing::trace;
use url::Url;

use crate::error::{Result, RqliteError};
use crate::node::Node;
use crate::request::{CombinedRequest, ConsistencyLevel, ExecuteRequest, QueryRequest};
use crate::statement::{ParameterStyle, Statement};
use crate::value::SqlValue;

/// HTTP method of an encoded request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`.
    Get,
    /// `POST`.
    Post,
}

impl Method {
    /// Returns the method name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

/// Server endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// `/db/execute`.
    Execute,
    /// `/db/query`.
    Query,
    /// `/db/request`.
    Request,
    /// `/status`.
    Status,
}

impl Endpoint {
    /// Returns the URL path.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Execute => "/db/execute",
            Self::Query => "/db/query",
            Self::Request => "/db/request",
            Self::Status => "/status",
        }
    }
}

/// A request ready to be sent to any node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedRequest {
    /// HTTP method.
    pub method: Method,
    /// Target endpoint.
    pub endpoint: Endpoint,
    /// Query options, in a fixed order.
    pub query: Vec<(&'static str, String)>,
    /// JSON body, absent for `GET`.
    pub body: Option<String>,
}

impl EncodedRequest {
    /// Creates the status (ping) request.
    #[must_use]
    pub const fn status() -> Self {
        Self {
            method: Method::Get,
            endpoint: Endpoint::Status,
            query: Vec::new(),
            body: None,
        }
    }

    /// Builds the full URL for `node`.
    ///
    /// # Errors
    ///
    /// Fails if the node's host does not form a valid URL.
    pub fn url_for(&self, node: &Node) -> std::result::Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("{node}{}", self.endpoint.path()))?;
        if !self.query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(self.query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        Ok(url)
    }
}

/// Types that can be encoded into an [`EncodedRequest`].
pub trait Encode {
    /// Encodes the request.
    ///
    /// # Errors
    ///
    /// Returns [`RqliteError::ParameterNaming`] if any statement mixes
    /// named and positional parameters.
    fn encode(&self) -> Result<EncodedRequest>;
}

impl Encode for ExecuteRequest {
    fn encode(&self) -> Result<EncodedRequest> {
        let query = QueryOptions::default()
            .flag("timings", self.timings)
            .flag("transaction", self.transaction)
            .flag("queue", self.queue)
            .flag("wait", self.wait)
            .flag("norwrandom", self.no_rewrite_random)
            .duration("timeout", self.timeout)
            .finish();
        post(Endpoint::Execute, query, &self.statements)
    }
}

impl Encode for QueryRequest {
    fn encode(&self) -> Result<EncodedRequest> {
        let query = QueryOptions::default()
            .flag("timings", self.timings)
            .flag("transaction", self.transaction)
            .flag("norwrandom", self.no_rewrite_random)
            .duration("timeout", self.timeout)
            .level(self.level)
            .duration("freshness", self.freshness)
            .finish();
        post(Endpoint::Query, query, &self.statements)
    }
}

impl Encode for CombinedRequest {
    fn encode(&self) -> Result<EncodedRequest> {
        let query = QueryOptions::default()
            .flag("timings", self.timings)
            .flag("transaction", self.transaction)
            .flag("norwrandom", self.no_rewrite_random)
            .duration("timeout", self.timeout)
            .level(self.level)
            .finish();
        post(Endpoint::Request, query, &self.statements)
    }
}

fn post(
    endpoint: Endpoint,
    query: Vec<(&'static str, String)>,
    statements: &[Statement],
) -> Result<EncodedRequest> {
    let body = encode_statements(statements)?;
    trace!(endpoint = endpoint.path(), body = %body, "Encoded request");
    Ok(EncodedRequest {
        method: Method::Post,
        endpoint,
        query,
        body: Some(body),
    })
}

/// Encodes statements into the JSON body.
///
/// # Errors
///
/// Returns [`RqliteError::ParameterNaming`] for the first statement that
/// mixes named and positional parameters, [`RqliteError::DuplicateParameter`]
/// when a name is bound twice, and [`RqliteError::NonFiniteParameter`] for
/// a NaN or infinite float. No body is produced.
pub fn encode_statements(statements: &[Statement]) -> Result<String> {
    let body: Vec<serde_json::Value> = if statements.iter().any(Statement::has_parameters) {
        statements
            .iter()
            .enumerate()
            .map(|(index, stmt)| encode_parameterized(index, stmt))
            .collect::<Result<_>>()?
    } else {
        statements
            .iter()
            .map(|stmt| serde_json::Value::String(stmt.sql_text().to_string()))
            .collect()
    };
    Ok(serde_json::Value::Array(body).to_string())
}

fn encode_parameterized(index: usize, stmt: &Statement) -> Result<serde_json::Value> {
    let mut entry = vec![serde_json::Value::String(stmt.sql_text().to_string())];
    match stmt.parameter_style() {
        ParameterStyle::Bare => {}
        ParameterStyle::Positional => {
            for (parameter, p) in stmt.params().iter().enumerate() {
                entry.push(parameter_json(index, parameter, &p.value)?);
            }
        }
        ParameterStyle::Named => {
            let mut named = serde_json::Map::new();
            for (parameter, p) in stmt.params().iter().enumerate() {
                let Some(name) = &p.name else { continue };
                let value = parameter_json(index, parameter, &p.value)?;
                if named.insert(name.clone(), value).is_some() {
                    return Err(RqliteError::DuplicateParameter {
                        index,
                        name: name.clone(),
                    });
                }
            }
            entry.push(serde_json::Value::Object(named));
        }
        ParameterStyle::Mixed => {
            return Err(RqliteError::ParameterNaming {
                index,
                sql: stmt.sql_text().to_string(),
            });
        }
    }
    Ok(serde_json::Value::Array(entry))
}

fn parameter_json(index: usize, parameter: usize, value: &SqlValue) -> Result<serde_json::Value> {
    if matches!(value, SqlValue::Float(f) if !f.is_finite()) {
        return Err(RqliteError::NonFiniteParameter { index, parameter });
    }
    Ok(value.to_json())
}

/// Accumulates query options, skipping anything off or unset.
#[derive(Debug, Default)]
struct QueryOptions {
    pairs: Vec<(&'static str, String)>,
}

impl QueryOptions {
    fn flag(mut self, name: &'static str, enabled: bool) -> Self {
        if enabled {
            self.pairs.push((name, "true".to_string()));
        }
        self
    }

    fn duration(mut self, name: &'static str, value: Option<Duration>) -> Self {
        if let Some(d) = value.filter(|d| !d.is_zero()) {
            self.pairs.push((name, format_duration(d)));
        }
        self
    }

    fn level(mut self, level: Option<ConsistencyLevel>) -> Self {
        if let Some(level) = level {
            self.pairs.push(("level", level.as_str().to_string()));
        }
        self
    }

    fn finish(self) -> Vec<(&'static str, String)> {
        self.pairs
    }
}

/// Formats a duration the way the server parses it (`5s`, `250ms`, ...).
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let nanos = d.as_nanos();
    if nanos % 1_000_000_000 == 0 {
        format!("{}s", d.as_secs())
    } else if nanos % 1_000_000 == 0 {
        format!("{}ms", d.as_millis())
    } else if nanos % 1_000 == 0 {
        format!("{}us", d.as_micros())
    } else {
        format!("{nanos}ns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(req: &impl Encode) -> String {
        req.encode()
            .unwrap()
            .url_for(&Node::http("localhost", 4001))
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_empty_query_request() {
        let encoded = QueryRequest::new().encode().unwrap();
        assert_eq!(encoded.method, Method::Post);
        assert_eq!(encoded.body.as_deref(), Some("[]"));
        assert_eq!(url(&QueryRequest::new()), "http://localhost:4001/db/query");
    }

    #[test]
    fn test_false_flags_are_omitted() {
        let req = ExecuteRequest::new().transaction(false).timings(false);
        assert_eq!(url(&req), "http://localhost:4001/db/execute");
    }

    #[test]
    fn test_query_levels() {
        let req = QueryRequest::new().transaction(true);
        assert_eq!(url(&req), "http://localhost:4001/db/query?transaction=true");
        let req = QueryRequest::new().level(ConsistencyLevel::Strong);
        assert_eq!(url(&req), "http://localhost:4001/db/query?level=strong");
        let req = QueryRequest::new().level(ConsistencyLevel::Weak);
        assert_eq!(url(&req), "http://localhost:4001/db/query?level=weak");
        let req = QueryRequest::new().level(ConsistencyLevel::None);
        assert_eq!(url(&req), "http://localhost:4001/db/query?level=none");
    }

    #[test]
    fn test_execute_option_order() {
        let req = ExecuteRequest::new()
            .wait(true)
            .queue(true)
            .no_rewrite_random(true)
            .timeout(Duration::from_secs(5))
            .timings(true)
            .transaction(true);
        assert_eq!(
            url(&req),
            "http://localhost:4001/db/execute?timings=true&transaction=true&queue=true&wait=true&norwrandom=true&timeout=5s"
        );
    }

    #[test]
    fn test_query_freshness_and_timeout() {
        let req = QueryRequest::new()
            .level(ConsistencyLevel::None)
            .freshness(Duration::from_millis(1500))
            .timeout(Duration::ZERO);
        assert_eq!(
            url(&req),
            "http://localhost:4001/db/query?level=none&freshness=1500ms"
        );
    }

    #[test]
    fn test_combined_endpoint() {
        let req = CombinedRequest::new()
            .statement("SELECT 1")
            .level(ConsistencyLevel::Strong);
        let encoded = req.encode().unwrap();
        assert_eq!(encoded.endpoint, Endpoint::Request);
        assert_eq!(url(&req), "http://localhost:4001/db/request?level=strong");
    }

    #[test]
    fn test_status_request() {
        let encoded = EncodedRequest::status();
        assert_eq!(encoded.method, Method::Get);
        assert_eq!(encoded.body, None);
        assert_eq!(
            encoded.url_for(&Node::https("db", 443)).unwrap().as_str(),
            "https://db/status"
        );
    }

    #[test]
    fn test_bare_body() {
        let body = encode_statements(&[
            Statement::new("SELECT * FROM foo"),
            Statement::new("SELECT * FROM bar"),
        ])
        .unwrap();
        assert_eq!(body, r#"["SELECT * FROM foo","SELECT * FROM bar"]"#);
    }

    #[test]
    fn test_positional_body() {
        let body = encode_statements(&[Statement::new(
            "INSERT INTO secret_agents(id, name, secret) VALUES(?, ?, ?)",
        )
        .bind(7)
        .bind("James Bond")
        .bind("not-a-secret")])
        .unwrap();
        assert_eq!(
            body,
            r#"[["INSERT INTO secret_agents(id, name, secret) VALUES(?, ?, ?)",7,"James Bond","not-a-secret"]]"#
        );
    }

    #[test]
    fn test_named_body() {
        let body = encode_statements(&[Statement::new("INSERT INTO foo VALUES(:id, :name)")
            .bind_named("id", 1)
            .bind_named("name", "fiona")])
        .unwrap();
        assert_eq!(
            body,
            r#"[["INSERT INTO foo VALUES(:id, :name)",{"id":1,"name":"fiona"}]]"#
        );
    }

    #[test]
    fn test_unparameterized_statement_in_parameterized_request() {
        let body = encode_statements(&[
            Statement::new("CREATE TABLE foo (id INTEGER)"),
            Statement::new("INSERT INTO foo VALUES(?)").bind(SqlValue::Null),
        ])
        .unwrap();
        assert_eq!(
            body,
            r#"[["CREATE TABLE foo (id INTEGER)"],["INSERT INTO foo VALUES(?)",null]]"#
        );
    }

    #[test]
    fn test_mixed_naming_fails() {
        let err = encode_statements(&[
            Statement::new("SELECT 1"),
            Statement::new("SELECT ?, :b").bind(1).bind_named("b", 2),
        ])
        .unwrap_err();
        match err {
            RqliteError::ParameterNaming { index, sql } => {
                assert_eq!(index, 1);
                assert_eq!(sql, "SELECT ?, :b");
            }
            other => panic!("expected naming error, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_name_fails() {
        let err = encode_statements(&[Statement::new("SELECT :a")
            .bind_named("a", 1)
            .bind_named("a", 2)])
        .unwrap_err();
        assert!(matches!(
            err,
            RqliteError::DuplicateParameter { index: 0, ref name } if name == "a"
        ));
    }

    #[test]
    fn test_non_finite_float_fails() {
        for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = encode_statements(&[
                Statement::new("SELECT 1"),
                Statement::new("INSERT INTO t VALUES(?, ?)").bind(1).bind(value),
            ])
            .unwrap_err();
            assert!(matches!(
                err,
                RqliteError::NonFiniteParameter {
                    index: 1,
                    parameter: 1
                }
            ));
        }

        let err = encode_statements(&[Statement::new("SELECT :x").bind_named("x", f64::NAN)])
            .unwrap_err();
        assert!(matches!(err, RqliteError::NonFiniteParameter { index: 0, .. }));
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90)), "90s");
        assert_eq!(format_duration(Duration::from_millis(250)), "250ms");
        assert_eq!(format_duration(Duration::from_micros(1500)), "1500us");
        assert_eq!(format_duration(Duration::from_nanos(10)), "10ns");
    }
}
