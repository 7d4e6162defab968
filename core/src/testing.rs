//! In-memory session for unit tests: replays queued responses in order and
//! records every request it was asked to execute.

use std::cell::RefCell;
use std::collections::VecDeque;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Session};

#[derive(Debug, Default)]
pub(crate) struct ScriptedSession {
    responses: RefCell<VecDeque<HttpResponse>>,
    requests: RefCell<Vec<HttpRequest>>,
}

impl ScriptedSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(self, status: u16, body: serde_json::Value) -> Self {
        self.responses.borrow_mut().push_back(HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string().into_bytes(),
        });
        self
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.borrow().clone()
    }
}

impl Session for ScriptedSession {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.borrow_mut().push(request.clone());
        self.responses
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| ApiError::Transport {
                url: request.path.clone(),
                reason: "no scripted response left".to_string(),
            })
    }
}
