//! Shared test doubles: an in-memory `Remote` and a wiremock-backed API stub.
#![allow(dead_code)]

use openaq_fetch::{Endpoint, QueryFilter, QueryValue, Remote, TransportError};
use serde_json::{Value, json};
use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;
use tokio::runtime::Runtime;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// One recorded request made through [`FakeRemote`].
#[derive(Debug, Clone)]
pub struct Call {
    pub endpoint: Endpoint,
    pub query: QueryFilter,
    pub timeout: Duration,
}

impl Call {
    pub fn int(&self, name: &str) -> Option<i64> {
        match self.query.get(name) {
            Some(QueryValue::Int(i)) => Some(*i),
            _ => None,
        }
    }
}

type Responder = Box<dyn Fn(Endpoint, &QueryFilter) -> Result<Value, TransportError>>;

/// `Remote` answering from a closure and recording every call.
pub struct FakeRemote {
    responder: Responder,
    pub calls: RefCell<Vec<Call>>,
}

impl FakeRemote {
    pub fn new(
        responder: impl Fn(Endpoint, &QueryFilter) -> Result<Value, TransportError> + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            calls: RefCell::new(Vec::new()),
        }
    }

    /// Serves `found` on every request and echoes the page index in `results`.
    pub fn with_found(found: u64) -> Self {
        Self::new(move |_, q| Ok(page_body(found, q)))
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Everything after the probe, which is always the first call of a job.
    pub fn bulk_calls(&self) -> Vec<Call> {
        self.calls().into_iter().skip(1).collect()
    }
}

impl Remote for FakeRemote {
    fn get_json(
        &self,
        endpoint: Endpoint,
        query: &QueryFilter,
        timeout: Duration,
    ) -> Result<Value, TransportError> {
        self.calls.borrow_mut().push(Call {
            endpoint,
            query: query.clone(),
            timeout,
        });
        (self.responder)(endpoint, query)
    }
}

/// Response body for a page request: `meta.found` plus one record naming the page.
pub fn page_body(found: u64, q: &QueryFilter) -> Value {
    let page = q.get("page").map(|v| v.to_query_param()).unwrap_or_default();
    json!({
        "meta": {"found": found, "page": page, "name": "openaq-api"},
        "results": [{"page": page, "value": 12.5, "parameter": "pm25"}]
    })
}

pub fn http_error(status: u16) -> TransportError {
    TransportError::Status {
        url: "http://stub/averages".into(),
        status,
    }
}

/// A request as seen by [`StubApi`], with the query already decoded.
#[derive(Debug, Clone)]
pub struct StubRequest {
    pub path: String,
    pub query: HashMap<String, String>,
}

impl From<&Request> for StubRequest {
    fn from(req: &Request) -> Self {
        StubRequest {
            path: req.url.path().to_string(),
            query: req.url.query_pairs().into_owned().collect(),
        }
    }
}

/// Wiremock server answering every GET from a closure.
///
/// The test owns the runtime, so the blocking client can be driven from the
/// test thread while the server runs on the runtime's workers.
pub struct StubApi {
    pub base_url: String,
    server: MockServer,
    runtime: Runtime,
}

impl StubApi {
    pub fn start(handler: impl Fn(&StubRequest) -> (u16, String) + Send + Sync + 'static) -> Self {
        let runtime = Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        let respond = move |req: &Request| {
            let (status, body) = handler(&StubRequest::from(req));
            ResponseTemplate::new(status).set_body_raw(body, "application/json")
        };
        runtime.block_on(
            Mock::given(method("GET"))
                .respond_with(respond)
                .mount(&server),
        );
        Self {
            base_url: format!("{}/v2", server.uri()),
            server,
            runtime,
        }
    }

    pub fn requests(&self) -> Vec<StubRequest> {
        self.runtime
            .block_on(self.server.received_requests())
            .unwrap_or_default()
            .iter()
            .map(StubRequest::from)
            .collect()
    }
}
