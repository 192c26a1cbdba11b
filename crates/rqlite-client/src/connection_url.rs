//! Connection URLs.
//!
//! ```text
//! rqlite://host:port[?useSSL=true&level=weak]
//! ```
//!
//! `useSSL=true` selects HTTPS. `level` sets the default read consistency
//! and falls back to `weak`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{Result, RqliteError};
use crate::node::{Node, Scheme};
use crate::request::ConsistencyLevel;

/// Default read consistency when the URL does not name one.
pub const DEFAULT_LEVEL: ConsistencyLevel = ConsistencyLevel::Weak;

static URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:jdbc:)?rqlite://([^:/?]+):(\d+)/?(?:\?(.*))?$").expect("valid URL pattern")
});

/// A parsed connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionUrl {
    /// Node to connect to.
    pub node: Node,
    /// Default read consistency.
    pub level: ConsistencyLevel,
}

impl ConnectionUrl {
    /// Parses a connection URL.
    ///
    /// # Errors
    ///
    /// Fails on a malformed URL, a malformed query parameter or an unknown
    /// consistency level.
    pub fn parse(url: &str) -> Result<Self> {
        let caps = URL_PATTERN
            .captures(url.trim())
            .ok_or_else(|| RqliteError::InvalidUrl(url.to_string()))?;

        let host = &caps[1];
        let port = caps[2]
            .parse::<u16>()
            .map_err(|_| RqliteError::InvalidUrl(format!("invalid port in '{url}'")))?;

        let params = match caps.get(3) {
            Some(query) => parse_query(query.as_str())?,
            None => HashMap::new(),
        };

        let scheme = match params.get("useSSL") {
            Some(v) if v.eq_ignore_ascii_case("true") => Scheme::Https,
            _ => Scheme::Http,
        };
        let level = params
            .get("level")
            .map(|v| v.parse::<ConsistencyLevel>())
            .transpose()?
            .unwrap_or(DEFAULT_LEVEL);

        Ok(Self {
            node: Node::new(scheme, host, port),
            level,
        })
    }
}

fn parse_query(query: &str) -> Result<HashMap<&str, &str>> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            pair.split_once('=')
                .ok_or_else(|| RqliteError::InvalidUrl(format!("malformed parameter '{pair}'")))
        })
        .collect()
}
