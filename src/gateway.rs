use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::session::SessionProvider;

const GENERIC_API_ERROR: &str = "API request failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

/// Abstraction over the HTTP layer for testability. A non-2xx status is a
/// response, not a transport error; only network-level failures are `Err`.
pub trait HttpTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse>;
}

struct UreqTransport {
    agent: ureq::Agent,
}

impl UreqTransport {
    fn new(timeout: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(timeout).build(),
        }
    }
}

impl HttpTransport for UreqTransport {
    fn send(
        &self,
        method: Method,
        url: &str,
        headers: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<HttpResponse> {
        let mut request = self.agent.request(method.as_str(), url);
        for (name, value) in headers {
            request = request.set(name, value);
        }

        let result = match body {
            Some(json) => request.send_json(json),
            None => request.call(),
        };

        match result {
            Ok(response) => {
                let status = response.status();
                let body = response
                    .into_string()
                    .map_err(|e| Error::Transport(format!("failed to read response: {e}")))?;
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                Ok(HttpResponse { status, body })
            }
            Err(ureq::Error::Transport(e)) => Err(Error::Transport(e.to_string())),
        }
    }
}

/// The single chokepoint for all calls to the task service: attaches auth,
/// serializes bodies, and translates responses and errors uniformly.
///
/// One outbound call per invocation; no retries, no caching.
pub struct Gateway {
    base_url: String,
    transport: Box<dyn HttpTransport>,
    session: Arc<dyn SessionProvider>,
}

impl Gateway {
    pub fn new(config: &Config, session: Arc<dyn SessionProvider>) -> Self {
        Self {
            base_url: config.api_url.clone(),
            transport: Box::new(UreqTransport::new(Duration::from_secs(config.timeout_secs))),
            session,
        }
    }

    /// Construct with an explicit transport. Test instances inject a fake
    /// here instead of sharing a process-wide client.
    pub fn with_transport(
        base_url: &str,
        transport: Box<dyn HttpTransport>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            transport,
            session,
        }
    }

    pub fn get(&self, path: &str) -> Result<Option<serde_json::Value>> {
        self.request(path, Method::Get, None, &[])
    }

    pub fn post(&self, path: &str, body: &serde_json::Value) -> Result<Option<serde_json::Value>> {
        self.request(path, Method::Post, Some(body), &[])
    }

    pub fn patch(
        &self,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Option<serde_json::Value>> {
        self.request(path, Method::Patch, body, &[])
    }

    pub fn delete(&self, path: &str) -> Result<Option<serde_json::Value>> {
        self.request(path, Method::Delete, None, &[])
    }

    /// Perform one request against the service.
    ///
    /// Token acquisition failure is logged and the call proceeds without
    /// auth; unauthenticated endpoints still work and the server stays the
    /// source of truth on authorization. A 2xx with an empty body yields
    /// `None`; any other 2xx body is returned as parsed JSON without schema
    /// validation. Non-2xx becomes `Error::Api` carrying the server's
    /// `detail` message when one can be read.
    pub fn request(
        &self,
        path: &str,
        method: Method,
        body: Option<&serde_json::Value>,
        extra_headers: &[(String, String)],
    ) -> Result<Option<serde_json::Value>> {
        let token = match self.session.get_token() {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(error = %e, "token acquisition failed, sending unauthenticated request");
                None
            }
        };

        // Generated headers win over caller-supplied ones.
        let mut headers: Vec<(String, String)> = extra_headers
            .iter()
            .filter(|(name, _)| {
                !name.eq_ignore_ascii_case("content-type")
                    && !name.eq_ignore_ascii_case("authorization")
            })
            .cloned()
            .collect();
        headers.push(("Content-Type".to_string(), "application/json".to_string()));
        if let Some(ref token) = token {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }

        let url = format!("{}{}", self.base_url, path);
        debug!(method = method.as_str(), %url, "issuing request");

        let response = self.transport.send(method, &url, &headers, body)?;

        if (200..300).contains(&response.status) {
            if response.status == 204 || response.body.trim().is_empty() {
                return Ok(None);
            }
            let value = serde_json::from_str(&response.body)
                .map_err(|e| Error::Decode(e.to_string()))?;
            return Ok(Some(value));
        }

        if response.status == 401 {
            // Recognized for session expiry; redirect policy belongs to the
            // presentation layer, so no action here.
            debug!("unauthorized response from task service");
        }

        let message = serde_json::from_str::<serde_json::Value>(&response.body)
            .ok()
            .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_string))
            .unwrap_or_else(|| GENERIC_API_ERROR.to_string());

        Err(Error::Api {
            status: response.status,
            message,
        })
    }
}
