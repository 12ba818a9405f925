//! Sample documents and payloads

use serde_json::{json, Value};

/// Valid OpenAPI 3.0.1 document: 3 endpoints, 2 models
pub const SAMPLE_API_YAML: &str = r"openapi: 3.0.1
info:
  title: Sample API
  version: 1.0.0
  description: Sample service used across the test suite
paths:
  /users:
    get:
      summary: List users
      responses:
        200:
          description: ok
    post:
      summary: Create user
      responses:
        201:
          description: created
  /users/{id}:
    get:
      summary: Get user
      parameters:
        - name: id
          in: path
          required: true
          schema:
            type: integer
      responses:
        200:
          description: ok
components:
  schemas:
    User:
      type: object
      description: A registered user
      properties:
        id:
          type: integer
        name:
          type: string
    Error:
      type: object
      properties:
        code:
          type: integer
        message:
          type: string
";

/// JSON rendering of an OpenAPI 3.0.0 document: 2 endpoints, 1 model
pub const SAMPLE_API_JSON: &str = r#"{
  "openapi": "3.0.0",
  "info": {"title": "Orders API", "version": "2.1.0"},
  "paths": {
    "/orders": {
      "get": {"summary": "List orders"},
      "post": {"summary": "Place order"}
    }
  },
  "components": {
    "schemas": {
      "Order": {"type": "object", "properties": {"id": {"type": "string"}}}
    }
  }
}"#;

/// Swagger 2.0 document, rejected by the default 3.0 requirement
pub const SWAGGER_V2_JSON: &str = r#"{
  "swagger": "2.0",
  "info": {"title": "Legacy API", "version": "0.9"},
  "paths": {"/ping": {"get": {"summary": "Ping"}}}
}"#;

/// HTML page embedding [`SAMPLE_API_YAML`] in a `<pre>` block
#[must_use]
pub fn sample_page_html() -> String {
    format!(
        "<!doctype html>\n<html><head><title>API docs</title></head>\n<body>\n<h1>Sample API</h1>\n<pre><code>{}</code></pre>\n</body></html>\n",
        SAMPLE_API_YAML.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
    )
}

/// `data` payload of a successful third-party extraction
#[must_use]
pub fn third_party_payload() -> Value {
    let document: Value = serde_json::from_str(SAMPLE_API_JSON).unwrap_or(Value::Null);
    json!({
        "document": document,
        "relations": [{"from": "POST /orders", "to": "GET /orders"}],
        "scenarios": [{"name": "place then list", "steps": ["POST /orders", "GET /orders"]}]
    })
}

/// `count` bytes of filler
#[must_use]
pub fn filler_bytes(count: usize) -> Vec<u8> {
    vec![b' '; count]
}
