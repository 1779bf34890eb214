// src/integrations/http/testing.rs
//
// In-process transport for tests: scripted responses, recorded requests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::FetchError;

type Route = (String, Result<HttpResponse, FetchError>);

#[derive(Default)]
pub(crate) struct ScriptedTransport {
    /// Responses matched by URL substring, consumed in order
    routes: Mutex<VecDeque<Route>>,
    /// Returned when no route matches
    fallback: Option<HttpResponse>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer every request with the same response
    pub(crate) fn always(response: HttpResponse) -> Self {
        Self {
            fallback: Some(response),
            ..Self::default()
        }
    }

    pub(crate) fn respond(self, url_contains: &str, status: u16, body: &str) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push_back((url_contains.to_string(), Ok(HttpResponse::new(status, body))));
        self
    }

    pub(crate) fn fail(self, url_contains: &str, error: FetchError) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push_back((url_contains.to_string(), Err(error)));
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, FetchError> {
        self.requests.lock().unwrap().push(request.clone());

        let mut routes = self.routes.lock().unwrap();
        if let Some(pos) = routes.iter().position(|(needle, _)| request.url.contains(needle.as_str())) {
            if let Some((_, response)) = routes.remove(pos) {
                return response;
            }
        }
        drop(routes);

        match &self.fallback {
            Some(response) => Ok(response.clone()),
            None => Err(FetchError::Transport(format!("no scripted response for {}", request.url))),
        }
    }
}
