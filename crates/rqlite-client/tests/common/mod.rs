#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use rqlite_client::prelude::*;
use url::Url;

/// How a scripted host behaves.
#[derive(Debug, Clone)]
pub enum Reply {
    /// No response at all.
    Refuse,
    /// Respond with this status and body.
    Respond(u16, String),
}

/// A request seen by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: Method,
    pub url: String,
    pub body: Option<String>,
}

/// In-memory transport answering per host.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    replies: HashMap<String, Reply>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(mut self, host: &str) -> Self {
        self.replies.insert(host.to_string(), Reply::Refuse);
        self
    }

    pub fn respond(mut self, host: &str, status: u16, body: &str) -> Self {
        self.replies
            .insert(host.to_string(), Reply::Respond(status, body.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn hosts_called(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| Url::parse(&c.url).unwrap().host_str().unwrap().to_string())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn send(
        &self,
        method: Method,
        url: &Url,
        body: Option<&str>,
    ) -> std::result::Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            url: url.to_string(),
            body: body.map(str::to_string),
        });
        let host = url.host_str().unwrap_or_default();
        match self.replies.get(host) {
            Some(Reply::Respond(status, body)) => Ok(HttpResponse::new(*status, body.clone())
                .with_header("X-Rqlite-Version", "v8.0.0")),
            _ => Err(TransportError::new(
                TransportErrorKind::Connect,
                format!("connection refused: {host}"),
            )),
        }
    }
}

/// Registry of plain HTTP nodes on port 4001.
pub fn registry(hosts: &[&str]) -> NodeRegistry {
    NodeRegistry::new(hosts.iter().map(|h| Node::http(*h, 4001)).collect()).unwrap()
}

/// Client over the scripted transport.
pub fn client<'a>(
    hosts: &[&str],
    transport: &'a ScriptedTransport,
) -> Client<&'a ScriptedTransport> {
    Client::with_transport(ClientConfig::new(registry(hosts)), transport)
}
