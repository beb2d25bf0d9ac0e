use std::sync::{Arc, Once};
use std::time::Duration;

use artsy_core::ArtworkId;
use artsy_engine::{
    ArtProvider, Artwork, FailureKind, ImageSize, ProviderError, SearchPage, SessionController,
    DEFAULT_API_BASE, DEFAULT_IIIF_BASE,
};
use artsy_server::{build_controller, router, run_server, ServerConfig};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{oneshot, watch};
use tower::ServiceExt;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(artsy_logging::initialize_for_tests);
}

/// Serves one fixed page of three image-bearing artworks for every query.
struct ThreeArtworks;

#[async_trait::async_trait]
impl ArtProvider for ThreeArtworks {
    async fn search(
        &self,
        _query: &str,
        offset: u64,
        size: u32,
    ) -> Result<SearchPage, ProviderError> {
        let artworks = if offset == 0 {
            (1..=3)
                .map(|id| Artwork {
                    id,
                    title: format!("Artwork {id}"),
                    image_id: Some(format!("img{id}")),
                    ..Artwork::default()
                })
                .collect()
        } else {
            Vec::new()
        };
        Ok(SearchPage {
            artworks,
            total: 3,
            offset,
            limit: u64::from(size),
        })
    }

    async fn fetch_detail(&self, id: ArtworkId) -> Result<Artwork, ProviderError> {
        Err(ProviderError {
            kind: FailureKind::HttpStatus(404),
            message: format!("no detail for {id}"),
        })
    }

    async fn download_image(
        &self,
        image_id: &str,
        _size: ImageSize,
    ) -> Result<Vec<u8>, ProviderError> {
        Ok(format!("jpeg:{image_id}").into_bytes())
    }
}

fn config(temp: &TempDir) -> ServerConfig {
    ServerConfig {
        data_dir: temp.path().to_path_buf(),
        bind: "127.0.0.1:0".to_string(),
        api_base: DEFAULT_API_BASE.to_string(),
        iiif_base: DEFAULT_IIIF_BASE.to_string(),
        image_size: ImageSize::Max,
        log_file: false,
        debug: false,
    }
}

fn controller(temp: &TempDir) -> Arc<SessionController> {
    init_logging();
    Arc::new(build_controller(&config(temp), Arc::new(ThreeArtworks)).unwrap())
}

async fn call(ctl: &Arc<SessionController>, request: Request<Body>) -> Response {
    // No sender: streams only end when the client goes away.
    let (_, stopping) = watch::channel(false);
    router(ctl.clone(), stopping).oneshot(request).await.unwrap()
}

async fn get(ctl: &Arc<SessionController>, uri: &str) -> Response {
    call(ctl, Request::get(uri).body(Body::empty()).unwrap()).await
}

async fn post(ctl: &Arc<SessionController>, uri: &str, body: Value) -> Response {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    call(ctl, request).await
}

async fn json_body(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn init_then_state_shows_staged_candidate() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let response = post(&ctl, "/api/init", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["mode"], json!("discover"));
    assert_eq!(body["current_artwork"]["id"], json!(1));

    let state = json_body(get(&ctl, "/api/state").await).await;
    assert_eq!(
        state,
        json!({
            "mode": "discover",
            "timer_seconds": 30,
            "search_query": "impressionism",
            "paused": false,
            "rotation": 0,
            "saved_count": 0,
            "current_artwork": {
                "id": 1,
                "title": "Artwork 1",
                "artist_display": null,
                "date_display": null,
                "place_of_origin": null,
                "image_url": "/api/image/temp"
            }
        })
    );
}

#[tokio::test]
async fn settings_report_changed_fields() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let body = json_body(post(&ctl, "/api/timer", json!({"seconds": "400"})).await).await;
    assert_eq!(body, json!({"success": true, "timer_seconds": 300}));

    let body = json_body(post(&ctl, "/api/rotation", json!({"rotation": 45})).await).await;
    assert_eq!(body, json!({"success": true, "rotation": 0}));

    let body = json_body(post(&ctl, "/api/pause", json!({})).await).await;
    assert_eq!(body, json!({"success": true, "paused": true}));

    let body = json_body(post(&ctl, "/api/query", json!({"query": "  monet "})).await).await;
    assert_eq!(body, json!({"success": true, "search_query": "monet"}));
}

#[tokio::test]
async fn invalid_input_is_a_400_with_reason_code() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let response = post(&ctl, "/api/mode", json!({"mode": "party"})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "invalid_argument", "message": "Invalid mode"})
    );

    let response = call(
        &ctl,
        Request::post("/api/timer").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["message"], json!("Invalid timer value"));

    let response = post(&ctl, "/api/query", json!({"query": "   "})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(&ctl, "/api/prev", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"error": "invalid_state", "message": "Can only go back in display mode"})
    );
}

#[tokio::test]
async fn images_are_served_as_jpeg() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let response = get(&ctl, "/api/image/temp").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await["error"], json!("not_found"));

    post(&ctl, "/api/init", json!({})).await;
    let response = get(&ctl, "/api/image/temp").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"jpeg:img1");

    let body = json_body(post(&ctl, "/api/save", json!({})).await).await;
    assert_eq!(body, json!({"success": true}));

    let response = get(&ctl, "/api/image/saved/1").await;
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"jpeg:img1");

    assert_eq!(
        get(&ctl, "/api/image/saved/2").await.status(),
        StatusCode::NOT_FOUND
    );
    assert_eq!(
        get(&ctl, "/api/image/saved/abc").await.status(),
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn display_flow_over_http() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    post(&ctl, "/api/init", json!({})).await;
    post(&ctl, "/api/save", json!({})).await;
    post(&ctl, "/api/save", json!({})).await;

    let body = json_body(post(&ctl, "/api/mode", json!({"mode": "display"})).await).await;
    assert_eq!(body, json!({"success": true, "mode": "display"}));

    let body = json_body(post(&ctl, "/api/next", json!({})).await).await;
    assert_eq!(body["success"], json!(true));
    let shown = body["current_artwork"]["id"].as_u64().unwrap();
    assert_eq!(
        body["current_artwork"]["image_url"],
        json!(format!("/api/image/saved/{shown}"))
    );

    let body = json_body(post(&ctl, "/api/delete", json!({})).await).await;
    assert_eq!(body, json!({"success": true}));
    let state = json_body(get(&ctl, "/api/state").await).await;
    assert_eq!(state["saved_count"], json!(1));

    post(&ctl, "/api/delete", json!({})).await;
    let response = post(&ctl, "/api/delete", json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["message"],
        json!("No artwork to delete")
    );
}

#[tokio::test]
async fn event_stream_starts_with_state() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let response = get(&ctl, "/api/events").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/event-stream"
    );
    assert_eq!(ctl.broadcaster().subscriber_count(), 1);

    let mut body = response.into_body();
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert!(text.starts_with("data: {\"type\":\"state\""), "{text}");
    assert!(text.ends_with("\n\n"));

    post(&ctl, "/api/pause", json!({})).await;
    let frame = body.frame().await.unwrap().unwrap();
    let text = String::from_utf8(frame.into_data().unwrap().to_vec()).unwrap();
    assert_eq!(
        text,
        "data: {\"type\":\"pause_change\",\"data\":{\"paused\":true}}\n\n"
    );

    // A closed stream is dropped from the registry on the next broadcast.
    drop(body);
    assert_eq!(ctl.broadcaster().subscriber_count(), 1);
    post(&ctl, "/api/pause", json!({})).await;
    assert_eq!(ctl.broadcaster().subscriber_count(), 0);
}

#[tokio::test]
async fn shutdown_closes_open_event_streams() {
    let temp = TempDir::new().unwrap();
    let ctl = controller(&temp);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(run_server(listener, ctl.clone(), async move {
        let _ = stop_rx.await;
    }));

    let mut client = TcpStream::connect(addr).await.unwrap();
    client
        .write_all(b"GET /api/events HTTP/1.1\r\nHost: localhost\r\n\r\n")
        .await
        .unwrap();
    let mut received = String::new();
    let mut buf = [0u8; 1024];
    while !received.contains("\"type\":\"state\"") {
        let n = client.read(&mut buf).await.unwrap();
        assert!(n > 0, "connection closed before the first event: {received}");
        received.push_str(&String::from_utf8_lossy(&buf[..n]));
    }
    assert!(received.starts_with("HTTP/1.1 200"), "{received}");

    stop_tx.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), server).await;
    assert!(
        matches!(stopped, Ok(Ok(Ok(())))),
        "server did not stop with an event stream open"
    );

    // The server let go of the connection.
    let mut rest = Vec::new();
    let closed =
        tokio::time::timeout(Duration::from_secs(5), client.read_to_end(&mut rest)).await;
    assert!(closed.is_ok(), "event stream still open after shutdown");
}
