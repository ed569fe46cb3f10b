//! Client for the credential-issuing service (herringbone-auth).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use ureq::Agent;

use crate::errors::{HbctlError, Result};
use crate::poll;

pub const HEALTH_PATH: &str = "/health";
pub const DOCS_PATH: &str = "/docs";
pub const REGISTER_PATH: &str = "/herringbone/auth/services/register";
pub const SERVICE_TOKEN_PATH: &str = "/herringbone/auth/service-token";

/// Per-request timeout for liveness probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Body of the service registration call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    pub service_id: String,
    pub service_name: String,
    pub scopes: Vec<String>,
}

/// Body of the scoped token request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenRequest {
    pub service: String,
    pub scopes: Vec<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// What the orchestrator needs from the issuer.
pub trait IssuerApi {
    /// GET `path` and return the status code, or `None` if nothing answered.
    fn probe(&self, path: &str) -> Option<u16>;

    /// Register a service identity. Any non-2xx status is a rejection.
    fn register(&self, admin_token: &str, req: &RegisterRequest) -> Result<()>;

    /// Request a scoped access token for a service.
    fn service_token(&self, admin_token: &str, req: &TokenRequest) -> Result<String>;
}

/// Poll `path` until it answers with a non-5xx status.
pub fn wait_healthy(
    issuer: &dyn IssuerApi,
    path: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<()> {
    let healthy = poll::poll_until(timeout, interval, || match issuer.probe(path) {
        Some(status) => {
            tracing::debug!(path, status, "issuer probe");
            status < 500
        }
        None => false,
    });

    if healthy {
        Ok(())
    } else {
        Err(HbctlError::Timeout {
            target: format!("issuer {path}"),
            waited: timeout,
        })
    }
}

/// [`IssuerApi`] over HTTP with `ureq`.
pub struct HttpIssuer {
    base_url: String,
    agent: Agent,
    probe_agent: Agent,
}

fn agent(timeout: Duration) -> Agent {
    Agent::config_builder()
        .timeout_global(Some(timeout))
        .http_status_as_error(false)
        .build()
        .into()
}

impl HttpIssuer {
    pub fn new(base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            agent: agent(request_timeout),
            probe_agent: agent(PROBE_TIMEOUT),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// POST `body` with bearer auth and hand back the response on 2xx.
    fn post<B: Serialize>(
        &self,
        path: &str,
        admin_token: &str,
        body: &B,
    ) -> Result<ureq::http::Response<ureq::Body>> {
        let url = self.url(path);
        let mut resp = self
            .agent
            .post(&url)
            .header("Authorization", format!("Bearer {admin_token}"))
            .send_json(body)
            .map_err(|e| HbctlError::Http(format!("POST {url}: {e}")))?;

        let status = resp.status().as_u16();
        tracing::debug!(%url, status, "issuer response");

        if status >= 300 {
            let body = resp
                .body_mut()
                .read_to_string()
                .unwrap_or_else(|e| format!("<unreadable body: {e}>"));
            return Err(HbctlError::RemoteRejected { url, status, body });
        }
        Ok(resp)
    }
}

impl IssuerApi for HttpIssuer {
    fn probe(&self, path: &str) -> Option<u16> {
        let url = self.url(path);
        match self.probe_agent.get(&url).call() {
            Ok(resp) => Some(resp.status().as_u16()),
            Err(e) => {
                tracing::trace!(%url, error = %e, "issuer not reachable");
                None
            }
        }
    }

    fn register(&self, admin_token: &str, req: &RegisterRequest) -> Result<()> {
        self.post(REGISTER_PATH, admin_token, req).map(|_| ())
    }

    fn service_token(&self, admin_token: &str, req: &TokenRequest) -> Result<String> {
        let mut resp = self.post(SERVICE_TOKEN_PATH, admin_token, req)?;
        let body: TokenResponse = resp
            .body_mut()
            .read_json()
            .map_err(|e| HbctlError::Http(format!("bad service-token response: {e}")))?;
        Ok(body.access_token)
    }
}
