//! Shared blocking HTTP plumbing for the geocoding clients.
//!
//! Every transport problem is folded into [`LookupError`] here so the
//! per-service clients only deal with response bodies.
use super::LookupError;
use std::time::{Duration, Instant};
use ureq::Agent;

/// A `ureq` agent with a per-request timeout.
#[derive(Clone)]
pub struct HttpClient {
    agent: Agent,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent: Agent = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build()
            .into();
        Self { agent }
    }

    /// GET `url` with `query` parameters and return the body of a 2xx reply.
    pub fn get_text(&self, url: &str, query: &[(&str, &str)]) -> Result<String, LookupError> {
        let start = Instant::now();
        let mut request = self.agent.get(url);
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let mut response = request.call().map_err(map_transport_error)?;
        let status = response.status().as_u16();
        let elapsed_ms = start.elapsed().as_millis();
        tracing::debug!(url, status, elapsed_ms, "geocoding request complete");
        if !(200..300).contains(&status) {
            return Err(LookupError::Status(status));
        }
        response
            .body_mut()
            .read_to_string()
            .map_err(map_transport_error)
    }
}

fn map_transport_error(err: ureq::Error) -> LookupError {
    match err {
        ureq::Error::Timeout(_) => LookupError::Timeout,
        ureq::Error::StatusCode(code) => LookupError::Status(code),
        other => LookupError::Transport(other.to_string()),
    }
}
