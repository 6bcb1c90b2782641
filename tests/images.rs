//! Image backend integration tests
//!
//! Runs the submit/poll job cycle against an in-process ComfyUI stub
//! so poll counts, the attempt cap, and drop-cancellation can be
//! observed exactly.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::sync::Mutex;

use fable_gateway::images::{ComfyImages, HostedImages, ImageProvider};

/// Shared state for the ComfyUI stub
struct ComfyStub {
    /// History requests seen so far
    polls: AtomicUsize,

    /// Poll number on which the output image appears
    ready_after: usize,

    /// Last submitted workflow body
    submitted: Mutex<Option<Value>>,
}

impl ComfyStub {
    fn new(ready_after: usize) -> Arc<Self> {
        Arc::new(Self {
            polls: AtomicUsize::new(0),
            ready_after,
            submitted: Mutex::new(None),
        })
    }

    fn polls(&self) -> usize {
        self.polls.load(Ordering::SeqCst)
    }
}

/// ComfyUI-shaped stub: liveness check, job submit, history polling
fn comfy_router(stub: Arc<ComfyStub>) -> Router {
    let submit_stub = stub.clone();
    Router::new()
        .route("/system_stats", get(|| async { Json(json!({ "system": {} })) }))
        .route(
            "/prompt",
            post(move |Json(body): Json<Value>| {
                let stub = submit_stub.clone();
                async move {
                    *stub.submitted.lock().await = Some(body);
                    Json(json!({ "prompt_id": "job-1" }))
                }
            }),
        )
        .route(
            "/history/{id}",
            get(move || {
                let stub = stub.clone();
                async move {
                    let seen = stub.polls.fetch_add(1, Ordering::SeqCst) + 1;
                    if seen >= stub.ready_after {
                        Json(json!({
                            "job-1": {
                                "outputs": {
                                    "8": { "images": [{ "filename": "scene_00001.png" }] }
                                }
                            }
                        }))
                    } else {
                        Json(json!({}))
                    }
                }
            }),
        )
}

async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub addr");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    addr
}

fn comfy_backend(addr: SocketAddr, poll_interval_ms: u64, max_polls: u32) -> ComfyImages {
    ComfyImages::new(
        format!("http://{addr}"),
        "512x512",
        "ugly, bad quality, blurry".to_string(),
        poll_interval_ms,
        max_polls,
    )
    .expect("backend config")
}

#[tokio::test]
async fn test_comfy_polls_until_ready_then_stops() {
    let stub = ComfyStub::new(3);
    let addr = spawn_stub(comfy_router(stub.clone())).await;
    let backend = comfy_backend(addr, 20, 10);

    let image = backend
        .generate("Fantasy game scene: a stone temple")
        .await
        .unwrap();

    assert_eq!(
        image.url,
        format!("http://{addr}/view?filename=scene_00001.png")
    );
    assert_eq!(stub.polls(), 3);

    // The image was ready on the third poll; nothing should keep polling.
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(stub.polls(), 3);

    let workflow = stub.submitted.lock().await.clone().expect("workflow submitted");
    assert_eq!(
        workflow["prompt"]["3"]["inputs"]["text"],
        "Fantasy game scene: a stone temple"
    );
    assert_eq!(workflow["prompt"]["6"]["inputs"]["text"], "ugly, bad quality, blurry");
}

#[tokio::test]
async fn test_comfy_gives_up_at_poll_cap() {
    let stub = ComfyStub::new(usize::MAX);
    let addr = spawn_stub(comfy_router(stub.clone())).await;
    let backend = comfy_backend(addr, 10, 2);

    let err = backend.generate("a ruined tower").await.unwrap_err();

    assert!(err.to_string().contains("not ready after 2 polls"), "got: {err}");
    assert_eq!(stub.polls(), 2);
}

#[tokio::test]
async fn test_dropping_job_stops_polling() {
    let stub = ComfyStub::new(usize::MAX);
    let addr = spawn_stub(comfy_router(stub.clone())).await;
    let backend = comfy_backend(addr, 20, 1000);

    let job = backend.submit_job("a dark forest").await.unwrap();
    assert_eq!(job.id(), "job-1");
    tokio::time::sleep(Duration::from_millis(50)).await;
    drop(job);

    // Let any in-flight poll land, then confirm the count stays put.
    tokio::time::sleep(Duration::from_millis(30)).await;
    let after_drop = stub.polls();
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(stub.polls(), after_drop);
}

#[tokio::test]
async fn test_comfy_unreachable_server_is_reported_before_submit() {
    // Bind then drop to get a port with nothing listening.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = comfy_backend(addr, 10, 2);
    let err = backend.generate("anything").await.unwrap_err();

    assert!(err.to_string().contains("cannot connect to ComfyUI"), "got: {err}");
}

#[tokio::test]
async fn test_hosted_backend_round_trip() {
    let captured: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let sink = captured.clone();

    let app = Router::new().route(
        "/images/generations",
        post(move |Json(body): Json<Value>| {
            let sink = sink.clone();
            async move {
                *sink.lock().await = Some(body);
                Json(json!({ "data": [{ "url": "https://cdn.example/scene.png" }] }))
            }
        }),
    );
    let addr = spawn_stub(app).await;

    let backend = HostedImages::new(
        "nb_test".to_string(),
        format!("http://{addr}"),
        "512x512".to_string(),
    )
    .unwrap();

    let image = backend.generate("Fantasy game scene: a castle").await.unwrap();
    assert_eq!(image.url, "https://cdn.example/scene.png");

    let body = captured.lock().await.clone().expect("request captured");
    assert_eq!(body["prompt"], "Fantasy game scene: a castle");
    assert_eq!(body["n"], 1);
    assert_eq!(body["size"], "512x512");
}

#[tokio::test]
async fn test_hosted_error_status_is_reported() {
    let app = Router::new().route(
        "/images/generations",
        post(|| async { (StatusCode::UNAUTHORIZED, "bad key") }),
    );
    let addr = spawn_stub(app).await;

    let backend = HostedImages::new(
        "nb_test".to_string(),
        format!("http://{addr}"),
        "512x512".to_string(),
    )
    .unwrap();

    let err = backend.generate("a castle").await.unwrap_err();
    let message = err.to_string();
    assert!(message.contains("image API error"), "got: {message}");
    assert!(message.contains("401"), "got: {message}");
}
