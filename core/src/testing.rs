//! In-memory `Transport` for unit tests.
//!
//! Routes on the last path segment of the request URL, so one stub serves
//! every client in the crate. Unknown ids answer `404 {}`.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::Transport;

#[derive(Debug, Clone)]
struct Route {
    status: u16,
    body: String,
    delay: Duration,
}

#[derive(Debug, Default)]
pub(crate) struct StubTransport {
    routes: HashMap<String, Route>,
    unreachable: bool,
    completed: Mutex<Vec<String>>,
}

impl StubTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Answer `{"name":"User-<id>"}` for `id`.
    pub(crate) fn user(self, id: &str) -> Self {
        let body = format!(r#"{{"id":"{id}","name":"User-{id}"}}"#);
        self.respond(id, 200, &body)
    }

    pub(crate) fn respond(mut self, id: &str, status: u16, body: &str) -> Self {
        let delay = self.routes.get(id).map(|r| r.delay).unwrap_or_default();
        self.routes.insert(
            id.to_string(),
            Route {
                status,
                body: body.to_string(),
                delay,
            },
        );
        self
    }

    pub(crate) fn delay(mut self, id: &str, delay: Duration) -> Self {
        self.routes
            .entry(id.to_string())
            .or_insert_with(|| Route {
                status: 404,
                body: "{}".to_string(),
                delay,
            })
            .delay = delay;
        self
    }

    /// Fail every request as if the host were down.
    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    /// Ids in the order their responses were produced.
    pub(crate) fn completed(&self) -> Vec<String> {
        self.completed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        if self.unreachable {
            return Err(ApiError::Transport("connection refused".to_string()));
        }
        let id = request
            .url
            .split('?')
            .next()
            .and_then(|path| path.rsplit('/').next())
            .unwrap_or_default()
            .to_string();
        let route = self.routes.get(&id).cloned().unwrap_or(Route {
            status: 404,
            body: "{}".to_string(),
            delay: Duration::ZERO,
        });
        if !route.delay.is_zero() {
            tokio::time::sleep(route.delay).await;
        }
        self.completed.lock().unwrap().push(id);
        Ok(HttpResponse::new(route.status, route.body))
    }
}
