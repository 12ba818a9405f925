//! In-process stub of the ingestion backend
//!
//! A warp server bound to an ephemeral port that speaks the `/api/docs/*`
//! envelope protocol, serves arbitrary pages for URL fetching, records every
//! request, and lets tests inject failures per route.

use docpipe_openapi::{parse_raw_text, VersionRequirement};
use futures::TryStreamExt;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::oneshot;
use warp::http::{Method, Response};
use warp::hyper::body::{Buf, Bytes};
use warp::multipart::FormData;
use warp::path::FullPath;
use warp::Filter;

const UPLOADED_AT: &str = "2024-01-01T00:00:00Z";

/// One request seen by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    /// HTTP method
    pub method: String,
    /// Request path
    pub path: String,
}

/// Injected failure for a route
#[derive(Debug, Clone)]
pub enum Failure {
    /// Non-success HTTP status with an envelope message
    Status(u16, String),
    /// HTTP 200 with `success: false`
    Rejected(String),
}

#[derive(Debug, Clone)]
struct StoredDocument {
    id: String,
    name: String,
    size: usize,
    status: String,
    content: String,
}

impl StoredDocument {
    fn to_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "size": self.size,
            "uploaded_at": UPLOADED_AT,
            "status": self.status,
        })
    }
}

#[derive(Debug, Clone)]
struct Page {
    status: u16,
    content_type: String,
    body: String,
}

#[derive(Debug, Default)]
struct StubState {
    next_id: u64,
    documents: Vec<StoredDocument>,
    requests: Vec<RecordedRequest>,
    failures: HashMap<String, Failure>,
    pages: HashMap<String, Page>,
    third_party: Option<Value>,
}

type Shared = Arc<Mutex<StubState>>;

/// Running stub backend; shuts down on drop
#[derive(Debug)]
pub struct StubServer {
    addr: SocketAddr,
    state: Shared,
    shutdown: Option<oneshot::Sender<()>>,
}

impl StubServer {
    /// Bind to an ephemeral localhost port and start serving
    ///
    /// Must be called inside a tokio runtime.
    #[must_use]
    pub fn start() -> Self {
        let state: Shared = Arc::default();

        let with_state = {
            let state = state.clone();
            warp::any().map(move || state.clone())
        };

        let upload = warp::post()
            .and(warp::path!("api" / "docs" / "upload"))
            .and(warp::multipart::form().max_length(64 * 1024 * 1024))
            .and(with_state.clone())
            .and_then(handle_upload);

        let rest = warp::method()
            .and(warp::path::full())
            .and(warp::body::bytes())
            .and(with_state)
            .map(dispatch);

        let (tx, rx) = oneshot::channel::<()>();
        let (addr, server) = warp::serve(upload.or(rest))
            .bind_with_graceful_shutdown(([127, 0, 0, 1], 0), async {
                rx.await.ok();
            });
        tokio::spawn(server);

        Self {
            addr,
            state,
            shutdown: Some(tx),
        }
    }

    /// Base URL, e.g. `http://127.0.0.1:41234`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Absolute URL for `path`
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Inject a failure for a route (`upload`, `parse`, `execute-tests`, ...)
    pub fn fail(&self, route: &str, failure: Failure) {
        self.state.lock().failures.insert(route.to_string(), failure);
    }

    /// Remove an injected failure
    pub fn heal(&self, route: &str) {
        self.state.lock().failures.remove(route);
    }

    /// Serve `body` at `path` (outside `/api`)
    pub fn serve_page(&self, path: &str, status: u16, content_type: &str, body: impl Into<String>) {
        self.state.lock().pages.insert(
            path.to_string(),
            Page {
                status,
                content_type: content_type.to_string(),
                body: body.into(),
            },
        );
    }

    /// Payload returned by `/api/docs/fetch-feishu`
    pub fn set_third_party(&self, data: Value) {
        self.state.lock().third_party = Some(data);
    }

    /// Store a document as if it had been uploaded; returns its id
    pub fn seed_document(&self, name: &str, content: &str) -> String {
        store_document(&mut self.state.lock(), name, content.to_string())
    }

    /// Every request received so far
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().requests.clone()
    }

    /// Requests under `/api`
    #[must_use]
    pub fn api_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path.starts_with("/api/"))
            .collect()
    }

    /// Ids of stored documents in upload order
    #[must_use]
    pub fn document_ids(&self) -> Vec<String> {
        self.state.lock().documents.iter().map(|d| d.id.clone()).collect()
    }

    /// Server-side status of a document
    #[must_use]
    pub fn document_status(&self, id: &str) -> Option<String> {
        self.state
            .lock()
            .documents
            .iter()
            .find(|d| d.id == id)
            .map(|d| d.status.clone())
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

fn store_document(state: &mut StubState, name: &str, content: String) -> String {
    state.next_id += 1;
    let id = format!("doc-{}", state.next_id);
    state.documents.push(StoredDocument {
        id: id.clone(),
        name: name.to_string(),
        size: content.len(),
        status: "uploaded".to_string(),
        content,
    });
    id
}

fn respond(status: u16, content_type: &str, body: String) -> Response<String> {
    Response::builder()
        .status(status)
        .header("content-type", content_type)
        .body(body)
        .unwrap_or_else(|_| Response::new(String::new()))
}

fn envelope(status: u16, value: &Value) -> Response<String> {
    respond(status, "application/json", value.to_string())
}

fn ok(data: Value, message: &str) -> Response<String> {
    envelope(200, &json!({"success": true, "message": message, "data": data}))
}

fn failure_response(failure: &Failure) -> Response<String> {
    match failure {
        Failure::Status(status, message) => envelope(*status, &json!({"success": false, "message": message})),
        Failure::Rejected(message) => envelope(200, &json!({"success": false, "message": message})),
    }
}

fn not_found(message: &str) -> Response<String> {
    envelope(404, &json!({"success": false, "message": message}))
}

async fn handle_upload(mut form: FormData, state: Shared) -> Result<Response<String>, warp::Rejection> {
    {
        let mut guard = state.lock();
        guard.requests.push(RecordedRequest {
            method: "POST".to_string(),
            path: "/api/docs/upload".to_string(),
        });
        if let Some(failure) = guard.failures.get("upload") {
            return Ok(failure_response(failure));
        }
    }

    loop {
        let part = match form.try_next().await {
            Ok(Some(part)) => part,
            Ok(None) => break,
            Err(e) => return Ok(malformed(&e)),
        };
        if part.name() != "file" {
            continue;
        }
        let name = part.filename().unwrap_or("upload").to_string();
        let data = match part
            .stream()
            .try_fold(Vec::new(), |mut acc, buf| async move {
                acc.extend_from_slice(buf.chunk());
                Ok::<_, warp::Error>(acc)
            })
            .await
        {
            Ok(data) => data,
            Err(e) => return Ok(malformed(&e)),
        };

        let size = data.len();
        let content = String::from_utf8_lossy(&data).into_owned();
        let id = store_document(&mut state.lock(), &name, content);
        return Ok(ok(json!({"document_id": id, "name": name, "size": size}), "uploaded"));
    }

    Ok(envelope(400, &json!({"success": false, "message": "missing file part"})))
}

fn malformed(error: &warp::Error) -> Response<String> {
    envelope(
        400,
        &json!({"success": false, "message": format!("malformed multipart body: {error}")}),
    )
}

fn dispatch(method: Method, path: FullPath, body: Bytes, state: Shared) -> Response<String> {
    let mut guard = state.lock();
    guard.requests.push(RecordedRequest {
        method: method.to_string(),
        path: path.as_str().to_string(),
    });

    let Some(rest) = path.as_str().strip_prefix("/api/docs/") else {
        return match guard.pages.get(path.as_str()) {
            Some(page) => respond(page.status, &page.content_type, page.body.clone()),
            None => respond(404, "text/plain", "not found".to_string()),
        };
    };

    let segments: Vec<&str> = rest.split('/').filter(|s| !s.is_empty()).collect();
    let Some(route) = segments.first().copied() else {
        return not_found("no such route");
    };
    if let Some(failure) = guard.failures.get(route) {
        return failure_response(failure);
    }
    let id = segments.get(1).copied();

    match (method.as_str(), route, id) {
        ("GET", "list" | "uploaded-list", None) => {
            let docs: Vec<Value> = guard.documents.iter().map(StoredDocument::to_json).collect();
            ok(Value::Array(docs), "ok")
        }
        ("POST", "parse", Some(id)) => {
            let Some(doc) = guard.documents.iter_mut().find(|d| d.id == id) else {
                return not_found("document not found");
            };
            match parse_raw_text(&doc.content, &VersionRequirement::default()) {
                Ok(desc) => {
                    doc.status = "parsed".to_string();
                    ok(serde_json::to_value(desc).unwrap_or(Value::Null), "parsed")
                }
                Err(e) => envelope(422, &json!({"success": false, "message": e.to_string()})),
            }
        }
        ("DELETE", "delete", Some(id)) => {
            let before = guard.documents.len();
            guard.documents.retain(|d| d.id != id);
            if guard.documents.len() == before {
                not_found("document not found")
            } else {
                ok(Value::Null, "deleted")
            }
        }
        ("POST", stage @ ("generate-test-cases" | "execute-tests" | "analyze-results" | "full-workflow"), Some(id)) => {
            let Some(doc) = guard.documents.iter_mut().find(|d| d.id == id) else {
                // Reported in-band, exercising the `success: false` channel
                return envelope(200, &json!({"success": false, "message": "document not found"}));
            };
            if matches!(stage, "analyze-results" | "full-workflow") {
                doc.status = "completed".to_string();
            }
            ok(json!({"document_id": id, "stage": stage}), &format!("{stage} finished"))
        }
        ("POST", "fetch-feishu", None) => {
            let requested = serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|v| v.get("url").and_then(Value::as_str).map(str::to_string));
            match (requested, guard.third_party.clone()) {
                (Some(_), Some(data)) => ok(data, "converted"),
                (None, _) => envelope(400, &json!({"success": false, "message": "url is required"})),
                (Some(_), None) => envelope(502, &json!({"success": false, "message": "extraction failed"})),
            }
        }
        _ => not_found("no such route"),
    }
}
