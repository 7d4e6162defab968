//! Blocking HTTP session backed by `ureq`.
//!
//! # Design
//! The agent is built with `http_status_as_error(false)` so 4xx/5xx
//! responses come back as data and `Session::response_or_error` decides what
//! counts as failure. Relative request paths are joined onto
//! `<base_url>/v1/`.

use std::time::Duration;

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Session};

#[derive(Clone)]
pub struct UreqSession {
    api_root: String,
    token: Option<String>,
    agent: ureq::Agent,
}

impl UreqSession {
    pub fn new(base_url: &str) -> Self {
        Self {
            api_root: format!("{}/v1/", base_url.trim_end_matches('/')),
            token: None,
            agent: build_agent(None),
        }
    }

    /// Send `Authorization: Bearer <token>` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Fail any request that takes longer than `timeout` end to end.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.agent = build_agent(Some(timeout));
        self
    }

    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.api_root, path.trim_start_matches('/'))
    }

    fn decorate<B>(
        &self,
        mut builder: ureq::RequestBuilder<B>,
        request: &HttpRequest,
    ) -> ureq::RequestBuilder<B> {
        for (key, value) in &request.query {
            builder = builder.query(key, value);
        }
        for (key, value) in &request.headers {
            builder = builder.header(key, value);
        }
        if let Some(token) = &self.token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        builder
    }

    fn send(
        &self,
        builder: ureq::RequestBuilder<ureq::typestate::WithBody>,
        request: &HttpRequest,
    ) -> Result<ureq::http::Response<ureq::Body>, ureq::Error> {
        let builder = self.decorate(builder, request);
        match &request.body {
            Some(body) => builder.send(body.as_slice()),
            None => builder.send_empty(),
        }
    }
}

fn build_agent(timeout: Option<Duration>) -> ureq::Agent {
    ureq::Agent::config_builder()
        .http_status_as_error(false)
        .timeout_global(timeout)
        .build()
        .new_agent()
}

impl Session for UreqSession {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let url = self.url_for(&request.path);
        let result = match request.method {
            HttpMethod::Get => self.decorate(self.agent.get(&url), request).call(),
            HttpMethod::Post => self.send(self.agent.post(&url), request),
            HttpMethod::Put => self.send(self.agent.put(&url), request),
            HttpMethod::Patch => self.send(self.agent.patch(&url), request),
        };
        let transport = |reason: String| ApiError::Transport {
            url: url.clone(),
            reason,
        };
        let mut response = result.map_err(|e| transport(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| transport(e.to_string()))?;

        Ok(HttpResponse { status, headers, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_paths_under_v1() {
        let session = UreqSession::new("https://central.example.org/");
        assert_eq!(
            session.url_for("projects/1/app-users"),
            "https://central.example.org/v1/projects/1/app-users"
        );
        assert_eq!(
            session.url_for("/projects/1"),
            "https://central.example.org/v1/projects/1"
        );
    }
}
