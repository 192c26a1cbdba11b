//! Decoding of response bodies.
//!
//! The shape of each result is decided by the endpoint that was called.
//! A per-statement `error` is data, not a failure: decoding keeps going and
//! the caller sees which statements failed.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Deserialize;

use crate::error::Result;
use crate::transport::HttpResponse;
use crate::value::SqlValue;

/// Header carrying the server version on `/status`.
pub const VERSION_HEADER: &str = "X-Rqlite-Version";

/// Result of one write statement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StatementResult {
    /// SQL error reported for this statement.
    #[serde(default)]
    pub error: Option<String>,
    /// Row ID of the last inserted row.
    #[serde(default)]
    pub last_insert_id: i64,
    /// Number of rows changed.
    #[serde(default)]
    pub rows_affected: i64,
    /// Server-side execution time in seconds, when timings were requested.
    #[serde(default)]
    pub time: f64,
}

impl StatementResult {
    /// Returns `true` if the statement succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of one read statement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RowsResult {
    /// SQL error reported for this statement.
    #[serde(default)]
    pub error: Option<String>,
    /// Column names.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Declared column types, parallel to `columns`.
    #[serde(default)]
    pub types: Vec<String>,
    /// Rows, each aligned with `columns`.
    #[serde(default)]
    pub values: Vec<Vec<SqlValue>>,
    /// Server-side execution time in seconds, when timings were requested.
    #[serde(default)]
    pub time: f64,
}

impl RowsResult {
    /// Returns `true` if the statement succeeded.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns the rows.
    pub fn rows(&self) -> impl Iterator<Item = &[SqlValue]> {
        self.values.iter().map(Vec::as_slice)
    }

    /// Returns the position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Returns the value at `row` in the named column.
    #[must_use]
    pub fn get(&self, row: usize, column: &str) -> Option<&SqlValue> {
        let idx = self.column_index(column)?;
        self.values.get(row)?.get(idx)
    }

    /// Turns base64 text in `blob` columns back into bytes.
    fn decode_blobs(&mut self) {
        let blob_columns: Vec<usize> = self
            .types
            .iter()
            .enumerate()
            .filter(|(_, t)| t.eq_ignore_ascii_case("blob"))
            .map(|(i, _)| i)
            .collect();
        if blob_columns.is_empty() {
            return;
        }
        for row in &mut self.values {
            for &idx in &blob_columns {
                let decoded = match row.get(idx) {
                    Some(SqlValue::Text(text)) => STANDARD.decode(text).ok(),
                    _ => None,
                };
                if let Some(bytes) = decoded {
                    row[idx] = SqlValue::Blob(bytes);
                }
            }
        }
    }
}

/// Result of one statement sent to `/db/request`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawResult")]
pub enum RequestResult {
    /// A statement that returned rows.
    Rows(RowsResult),
    /// A statement that changed rows.
    Statement(StatementResult),
}

impl RequestResult {
    /// Returns the statement's SQL error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Rows(r) => r.error.as_deref(),
            Self::Statement(s) => s.error.as_deref(),
        }
    }

    /// Returns the server-side execution time in seconds, `0.0` unless
    /// timings were requested.
    #[must_use]
    pub const fn time_secs(&self) -> f64 {
        match self {
            Self::Rows(r) => r.time,
            Self::Statement(s) => s.time,
        }
    }
}

/// Union of both result shapes; classified by which fields are present.
#[derive(Deserialize)]
struct RawResult {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    last_insert_id: Option<i64>,
    #[serde(default)]
    rows_affected: Option<i64>,
    #[serde(default)]
    columns: Option<Vec<String>>,
    #[serde(default)]
    types: Option<Vec<String>>,
    #[serde(default)]
    values: Option<Vec<Vec<SqlValue>>>,
    #[serde(default)]
    time: f64,
}

impl From<RawResult> for RequestResult {
    fn from(raw: RawResult) -> Self {
        if raw.columns.is_some() || raw.types.is_some() || raw.values.is_some() {
            Self::Rows(RowsResult {
                error: raw.error,
                columns: raw.columns.unwrap_or_default(),
                types: raw.types.unwrap_or_default(),
                values: raw.values.unwrap_or_default(),
                time: raw.time,
            })
        } else {
            Self::Statement(StatementResult {
                error: raw.error,
                last_insert_id: raw.last_insert_id.unwrap_or_default(),
                rows_affected: raw.rows_affected.unwrap_or_default(),
                time: raw.time,
            })
        }
    }
}

/// Response of `/db/execute`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ExecuteResults {
    /// One result per statement, in request order.
    #[serde(default)]
    pub results: Vec<StatementResult>,
    /// Request-level error reported by the server.
    #[serde(default)]
    pub error: Option<String>,
    /// Total server time in seconds, when timings were requested.
    #[serde(default)]
    pub time: Option<f64>,
    /// Sequence number of a queued write.
    #[serde(default)]
    pub sequence_number: Option<u64>,
}

impl ExecuteResults {
    /// Returns `true` if no statement reported an error.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.error.is_none() && self.results.iter().all(StatementResult::is_ok)
    }
}

/// Response of `/db/query`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QueryResults {
    /// One result per statement, in request order.
    #[serde(default)]
    pub results: Vec<RowsResult>,
    /// Request-level error reported by the server.
    #[serde(default)]
    pub error: Option<String>,
    /// Total server time in seconds, when timings were requested.
    #[serde(default)]
    pub time: Option<f64>,
}

impl QueryResults {
    /// Returns `true` if no statement reported an error.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.error.is_none() && self.results.iter().all(RowsResult::is_ok)
    }
}

/// Response of `/db/request`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RequestResults {
    /// One result per statement, in request order.
    #[serde(default)]
    pub results: Vec<RequestResult>,
    /// Request-level error reported by the server.
    #[serde(default)]
    pub error: Option<String>,
    /// Total server time in seconds, when timings were requested.
    #[serde(default)]
    pub time: Option<f64>,
}

impl RequestResults {
    /// Returns `true` if no statement reported an error.
    #[must_use]
    pub fn all_ok(&self) -> bool {
        self.error.is_none() && self.results.iter().all(|r| r.error().is_none())
    }
}

/// Response of `/status`.
#[derive(Debug, Clone, PartialEq)]
pub struct Pong {
    /// Server version from the response header.
    pub version: Option<String>,
    /// Status document.
    pub status: serde_json::Value,
}

/// Decodes an `/db/execute` body.
///
/// # Errors
///
/// Fails if the body is not the expected JSON document.
pub fn decode_execute(body: &str) -> Result<ExecuteResults> {
    Ok(serde_json::from_str(body)?)
}

/// Decodes a `/db/query` body.
///
/// # Errors
///
/// Fails if the body is not the expected JSON document.
pub fn decode_query(body: &str) -> Result<QueryResults> {
    let mut results: QueryResults = serde_json::from_str(body)?;
    results.results.iter_mut().for_each(RowsResult::decode_blobs);
    Ok(results)
}

/// Decodes a `/db/request` body.
///
/// # Errors
///
/// Fails if the body is not the expected JSON document.
pub fn decode_request(body: &str) -> Result<RequestResults> {
    let mut results: RequestResults = serde_json::from_str(body)?;
    for result in &mut results.results {
        if let RequestResult::Rows(rows) = result {
            rows.decode_blobs();
        }
    }
    Ok(results)
}

/// Decodes a `/status` response.
///
/// # Errors
///
/// Fails if the body is not JSON.
pub fn decode_pong(response: &HttpResponse) -> Result<Pong> {
    Ok(Pong {
        version: response.header(VERSION_HEADER).map(str::to_string),
        status: serde_json::from_str(&response.body)?,
    })
}
