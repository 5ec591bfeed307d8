use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use tokio::net::TcpListener;
use tower::ServiceExt;

use depot_analysis::{AnalysisService, FetchError, FetchedFile, FileFetcher};
use depot_blob_memory::MemoryBlobStore;
use depot_core::{FileId, X_FILE_HASH, X_FILE_UPLOAD_TIME};
use depot_files::FileService;
use depot_server::api::{
    AnalysisState, GatewayState, StorageState, analysis_router, gateway_router, storage_router,
};
use depot_server::config::GatewayConfig;
use depot_state_memory::{MemoryAnalysisStore, MemoryDigestLock, MemoryMetadataStore};

// -- Helpers --------------------------------------------------------------

const BOUNDARY: &str = "depot-test-boundary";

fn build_file_service() -> Arc<FileService> {
    Arc::new(FileService::new(
        Arc::new(MemoryMetadataStore::new()),
        Arc::new(MemoryBlobStore::new()),
        Arc::new(MemoryDigestLock::new()),
    ))
}

fn storage_app(files: Arc<FileService>) -> Router {
    storage_router(StorageState { files })
}

/// Fetcher that reads straight from a local file service, skipping HTTP.
struct LocalFetcher {
    files: Arc<FileService>,
}

#[async_trait]
impl FileFetcher for LocalFetcher {
    async fn fetch(&self, id: FileId) -> Result<FetchedFile, FetchError> {
        let download = self
            .files
            .download(id)
            .await
            .map_err(|_| FetchError::NotFound(id))?;
        Ok(FetchedFile {
            content: download.content,
            hash: download.metadata.hash,
            upload_time: download.metadata.upload_time,
        })
    }
}

fn analysis_app(files: Arc<FileService>) -> Router {
    let analysis = Arc::new(AnalysisService::new(
        Arc::new(MemoryAnalysisStore::new()),
        Arc::new(LocalFetcher { files }),
    ));
    analysis_router(AnalysisState { analysis })
}

fn multipart_body(file_name: &str, content: &str) -> Body {
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{file_name}\"\r\n\
         Content-Type: text/plain\r\n\r\n\
         {content}\r\n\
         --{BOUNDARY}--\r\n"
    );
    Body::from(body)
}

fn upload_request(file_name: &str, content: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/files")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body(file_name, content))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload(app: &Router, file_name: &str, content: &str) -> serde_json::Value {
    let response = app
        .clone()
        .oneshot(upload_request(file_name, content))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await
}

// -- Storage service ------------------------------------------------------

#[tokio::test]
async fn health_returns_ok() {
    let app = storage_app(build_file_service());
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn upload_returns_metadata() {
    let app = storage_app(build_file_service());
    let body = upload(&app, "notes.txt", "hello world").await;

    assert_eq!(body["name"], "notes.txt");
    assert_eq!(body["isDuplicate"], false);
    assert!(body["id"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(body["hash"].as_str().map(str::len), Some(64));
    assert!(body["uploadTime"].as_str().is_some());
}

#[tokio::test]
async fn duplicate_upload_returns_original_record() {
    let app = storage_app(build_file_service());
    let first = upload(&app, "first.txt", "same bytes").await;
    let second = upload(&app, "second.txt", "same bytes").await;

    assert_eq!(second["isDuplicate"], true);
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["hash"], first["hash"]);
    // The original display name wins.
    assert_eq!(second["name"], "first.txt");
}

#[tokio::test]
async fn upload_without_file_part_is_rejected() {
    let app = storage_app(build_file_service());
    let body = format!(
        "--{BOUNDARY}\r\n\
         Content-Disposition: form-data; name=\"other\"\r\n\r\n\
         data\r\n\
         --{BOUNDARY}--\r\n"
    );
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/files")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("file"));
}

#[tokio::test]
async fn empty_upload_is_rejected() {
    let app = storage_app(build_file_service());
    let response = app.oneshot(upload_request("empty.txt", "")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn download_round_trips_content_and_provenance() {
    let app = storage_app(build_file_service());
    let uploaded = upload(&app, "notes.txt", "round trip").await;
    let id = uploaded["id"].as_str().unwrap();

    let response = app
        .oneshot(
            Request::get(format!("/v1/files/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[X_FILE_HASH],
        uploaded["hash"].as_str().unwrap()
    );
    assert!(response.headers().contains_key(X_FILE_UPLOAD_TIME));
    assert!(
        response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .starts_with("text/plain")
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"round trip");
}

#[tokio::test]
async fn download_unknown_id_is_404() {
    let app = storage_app(build_file_service());
    let id = FileId::random();
    let response = app
        .oneshot(
            Request::get(format!("/v1/files/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn malformed_id_is_client_error() {
    let app = storage_app(build_file_service());
    let response = app
        .oneshot(
            Request::get("/v1/files/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn nil_id_is_rejected_at_both_surfaces() {
    let files = build_file_service();
    let nil = "00000000-0000-0000-0000-000000000000";

    let response = storage_app(Arc::clone(&files))
        .oneshot(
            Request::get(format!("/v1/files/{nil}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = analysis_app(files)
        .oneshot(
            Request::post(format!("/v1/analysis/{nil}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Analysis service -----------------------------------------------------

#[tokio::test]
async fn analyze_computes_text_statistics() {
    let files = build_file_service();
    let storage = storage_app(Arc::clone(&files));
    let analysis = analysis_app(files);

    let uploaded = upload(&storage, "essay.txt", "one two three\r\n\r\nfour five").await;
    let id = uploaded["id"].as_str().unwrap();

    let response = analysis
        .oneshot(
            Request::post(format!("/v1/analysis/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["id"].as_str(), Some(id));
    assert_eq!(body["wordCount"], 5);
    assert_eq!(body["paragraphCount"], 2);
    assert_eq!(body["hash"], uploaded["hash"]);
    assert_eq!(body["uploadTime"], uploaded["uploadTime"]);
}

#[tokio::test]
async fn analyze_is_idempotent() {
    let files = build_file_service();
    let storage = storage_app(Arc::clone(&files));
    let analysis = analysis_app(files);

    let uploaded = upload(&storage, "a.txt", "stable words").await;
    let id = uploaded["id"].as_str().unwrap();

    let first = json_body(
        analysis
            .clone()
            .oneshot(
                Request::post(format!("/v1/analysis/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    let second = json_body(
        analysis
            .oneshot(
                Request::post(format!("/v1/analysis/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn analyze_unknown_id_is_404() {
    let analysis = analysis_app(build_file_service());
    let id = FileId::random();
    let response = analysis
        .oneshot(
            Request::post(format!("/v1/analysis/{id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// -- Gateway --------------------------------------------------------------

async fn spawn_app(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

/// Spawn storage, analysis, and gateway on ephemeral ports. Returns the
/// gateway and storage base URLs.
async fn spawn_stack() -> (String, String) {
    let files = build_file_service();
    let storage_url = spawn_app(storage_app(Arc::clone(&files))).await;
    let analysis_url = spawn_app(analysis_app(files)).await;
    let gateway = gateway_router(
        GatewayState::from_config(&GatewayConfig {
            storage_url: storage_url.clone(),
            analysis_url,
            timeout_seconds: 5,
        })
        .unwrap(),
    );
    (spawn_app(gateway).await, storage_url)
}

#[tokio::test]
async fn gateway_streams_upload_and_relays_response() {
    let (gateway_url, _storage_url) = spawn_stack().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::text("via the gateway").file_name("g.txt"),
    );
    let response = client
        .post(format!("{gateway_url}/v1/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], "g.txt");
    assert_eq!(body["isDuplicate"], false);

    // Download through the gateway relays the provenance headers.
    let id = body["id"].as_str().unwrap();
    let download = client
        .get(format!("{gateway_url}/v1/file/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(download.status(), reqwest::StatusCode::OK);
    assert_eq!(
        download.headers()[X_FILE_HASH].to_str().unwrap(),
        body["hash"].as_str().unwrap()
    );
    assert!(download.headers().contains_key(X_FILE_UPLOAD_TIME));
    assert_eq!(download.text().await.unwrap(), "via the gateway");
}

#[tokio::test]
async fn gateway_forwards_analysis() {
    let (gateway_url, _storage_url) = spawn_stack().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::text("alpha beta\n\ngamma").file_name("t.txt"),
    );
    let uploaded: serde_json::Value = client
        .post(format!("{gateway_url}/v1/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = uploaded["id"].as_str().unwrap();

    let analysis: serde_json::Value = client
        .post(format!("{gateway_url}/v1/analyze/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(analysis["wordCount"], 3);
    assert_eq!(analysis["paragraphCount"], 2);
}

#[tokio::test]
async fn gateway_upload_deduplicates_against_direct_upload() {
    let (gateway_url, storage_url) = spawn_stack().await;
    let client = reqwest::Client::new();

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::text("same bytes either way").file_name("direct.txt"),
    );
    let direct: serde_json::Value = client
        .post(format!("{storage_url}/v1/files"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(direct["isDuplicate"], false);

    let form = reqwest::multipart::Form::new().part(
        "file",
        reqwest::multipart::Part::text("same bytes either way").file_name("proxied.txt"),
    );
    let proxied: serde_json::Value = client
        .post(format!("{gateway_url}/v1/upload"))
        .multipart(form)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(proxied["isDuplicate"], true);
    assert_eq!(proxied["id"], direct["id"]);
    assert_eq!(proxied["hash"], direct["hash"]);
    assert_eq!(proxied["name"], "direct.txt");
}

#[tokio::test]
async fn gateway_relays_upstream_404() {
    let (gateway_url, _storage_url) = spawn_stack().await;
    let client = reqwest::Client::new();
    let id = FileId::random();

    let response = client
        .get(format!("{gateway_url}/v1/file/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn gateway_reports_unreachable_upstream_as_502() {
    // Nothing listens on this upstream.
    let gateway = gateway_router(
        GatewayState::from_config(&GatewayConfig {
            storage_url: "http://127.0.0.1:9".to_owned(),
            analysis_url: "http://127.0.0.1:9".to_owned(),
            timeout_seconds: 2,
        })
        .unwrap(),
    );
    let gateway_url = spawn_app(gateway).await;
    let client = reqwest::Client::new();
    let id = FileId::random();

    let response = client
        .get(format!("{gateway_url}/v1/file/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_GATEWAY);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("unreachable"));
}
