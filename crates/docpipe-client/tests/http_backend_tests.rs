//! HttpBackend against the in-process stub server

use docpipe_client::{BackendError, DocsBackend, DocumentStatus, HttpBackend, StageRequest, UploadFile, Url};
use docpipe_test_utils::{third_party_payload, Failure, StubServer, SAMPLE_API_YAML};
use pretty_assertions::assert_eq;

fn backend(stub: &StubServer) -> HttpBackend {
    HttpBackend::new(&stub.base_url()).unwrap()
}

#[tokio::test]
async fn upload_sends_multipart_file_field() {
    let stub = StubServer::start();
    let backend = backend(&stub);

    let receipt = backend
        .upload(&UploadFile::new("spec.yaml", SAMPLE_API_YAML))
        .await
        .unwrap();

    assert_eq!(receipt.name.as_deref(), Some("spec.yaml"));
    assert_eq!(receipt.size, Some(SAMPLE_API_YAML.len() as u64));
    assert_eq!(stub.document_ids(), vec![receipt.document_id]);
}

#[tokio::test]
async fn uploaded_content_survives_to_parse() {
    let stub = StubServer::start();
    let backend = backend(&stub);

    let receipt = backend
        .upload(&UploadFile::new("spec.yaml", SAMPLE_API_YAML))
        .await
        .unwrap();
    let description = backend.parse(&receipt.document_id).await.unwrap();

    assert_eq!(description.title, "Sample API");
    assert_eq!(stub.document_status(&receipt.document_id).as_deref(), Some("parsed"));
}

#[tokio::test]
async fn upload_reads_file_part_after_other_fields() {
    let stub = StubServer::start();
    let form = reqwest::multipart::Form::new()
        .text("comment", "first field")
        .part(
            "file",
            reqwest::multipart::Part::bytes(SAMPLE_API_YAML.as_bytes().to_vec()).file_name("spec.yaml"),
        );

    let response = reqwest::Client::new()
        .post(stub.url("/api/docs/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], serde_json::json!(true));
    assert_eq!(body["data"]["size"], serde_json::json!(SAMPLE_API_YAML.len()));
    assert_eq!(stub.document_ids().len(), 1);
}

#[tokio::test]
async fn list_and_parse_round_trip() {
    let stub = StubServer::start();
    let backend = backend(&stub);
    let id = stub.seed_document("spec.yaml", SAMPLE_API_YAML);

    let listed = backend.list_uploaded().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].status, DocumentStatus::Uploaded);
    assert!(listed[0].uploaded_at.is_some());

    let description = backend.parse(&id).await.unwrap();
    assert_eq!(description.title, "Sample API");
    assert_eq!(description.spec_version.as_deref(), Some("3.0.1"));

    let listed = backend.list_documents().await.unwrap();
    assert_eq!(listed[0].status, DocumentStatus::Parsed);
}

#[tokio::test]
async fn stage_requests_hit_their_paths() {
    let stub = StubServer::start();
    let backend = backend(&stub);
    let id = stub.seed_document("spec.yaml", SAMPLE_API_YAML);

    for stage in StageRequest::ALL {
        let outcome = backend.trigger(stage, &id).await.unwrap();
        assert_eq!(outcome.message, Some(format!("{stage} finished")));
    }

    let paths: Vec<_> = stub.api_requests().into_iter().map(|r| r.path).collect();
    assert_eq!(
        paths,
        vec![
            format!("/api/docs/generate-test-cases/{id}"),
            format!("/api/docs/execute-tests/{id}"),
            format!("/api/docs/analyze-results/{id}"),
            format!("/api/docs/full-workflow/{id}"),
        ]
    );
    assert_eq!(stub.document_status(&id).as_deref(), Some("completed"));
}

#[tokio::test]
async fn both_failure_channels_are_checked() {
    let stub = StubServer::start();
    let backend = backend(&stub);

    stub.fail("parse", Failure::Status(500, "parser crashed".to_string()));
    let err = backend.parse("doc-1").await.unwrap_err();
    assert!(matches!(err, BackendError::Status { status: 500, ref message } if message == "parser crashed"));

    stub.fail("generate-test-cases", Failure::Rejected("no parsed spec".to_string()));
    let err = backend
        .trigger(StageRequest::GenerateTestCases, "doc-1")
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Rejected(ref m) if m == "no parsed spec"));
}

#[tokio::test]
async fn delete_unknown_document_is_404() {
    let stub = StubServer::start();
    let backend = backend(&stub);
    let id = stub.seed_document("spec.yaml", SAMPLE_API_YAML);

    backend.delete(&id).await.unwrap();
    let err = backend.delete(&id).await.unwrap_err();
    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.user_message(), "document not found (HTTP 404)");
}

#[tokio::test]
async fn third_party_fetch_posts_url() {
    let stub = StubServer::start();
    let backend = backend(&stub);
    stub.set_third_party(third_party_payload());

    let url = Url::parse("https://docs.feishu.cn/wiki/abc").unwrap();
    let converted = backend.fetch_third_party(&url).await.unwrap();

    assert_eq!(converted.document["info"]["title"], "Orders API");
    assert!(converted.relations.is_some());
}

#[tokio::test]
async fn external_fetch_is_outside_the_envelope() {
    let stub = StubServer::start();
    let backend = backend(&stub);
    stub.serve_page("/spec.yaml", 200, "application/x-yaml", SAMPLE_API_YAML);

    let found = backend
        .fetch_external(&Url::parse(&stub.url("/spec.yaml")).unwrap())
        .await
        .unwrap();
    assert!(found.is_success());
    assert_eq!(found.content_type.as_deref(), Some("application/x-yaml"));
    assert_eq!(found.body, SAMPLE_API_YAML);

    let missing = backend
        .fetch_external(&Url::parse(&stub.url("/nope")).unwrap())
        .await
        .unwrap();
    assert_eq!(missing.status, 404);
}
