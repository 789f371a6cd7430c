use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::post,
    Router,
};
use pulse_relay::{DeliveryError, Transport};
use pulse_server::push::HttpPushTransport;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

type Received = Arc<Mutex<Vec<(String, String)>>>;

async fn push_endpoint(
    State(received): State<Received>,
    Path(connection_id): Path<String>,
    body: Bytes,
) -> StatusCode {
    match connection_id.as_str() {
        "gone" => StatusCode::GONE,
        "broken" => StatusCode::INTERNAL_SERVER_ERROR,
        _ => {
            received
                .lock()
                .unwrap()
                .push((connection_id, String::from_utf8(body.to_vec()).unwrap()));
            StatusCode::OK
        }
    }
}

async fn spawn_push_api() -> (String, Received) {
    let received: Received = Arc::default();
    let router = Router::new()
        .route("/prod/@connections/{id}", post(push_endpoint))
        .with_state(received.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{addr}/prod"), received)
}

async fn send(base_url: &str, connection_id: &str, payload: &str) -> Result<(), DeliveryError> {
    let transport = HttpPushTransport::new(base_url, Duration::from_secs(5));
    let connection_id = connection_id.to_string();
    let payload = payload.to_string();
    tokio::task::spawn_blocking(move || transport.send(&connection_id, &payload))
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn delivered_payload_reaches_push_api() {
    let (base_url, received) = spawn_push_api().await;

    send(&base_url, "c1", r#"{"body":{},"connectionId":"c1"}"#)
        .await
        .unwrap();

    let received = received.lock().unwrap().clone();
    assert_eq!(
        received,
        vec![(
            "c1".to_string(),
            r#"{"body":{},"connectionId":"c1"}"#.to_string()
        )]
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn gone_status_maps_to_gone() {
    let (base_url, _) = spawn_push_api().await;

    assert_eq!(send(&base_url, "gone", "{}").await, Err(DeliveryError::Gone));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn other_failures_are_not_gone() {
    let (base_url, _) = spawn_push_api().await;

    let err = send(&base_url, "broken", "{}").await.unwrap_err();
    assert!(matches!(err, DeliveryError::Failed(msg) if msg.contains("500")));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unreachable_push_api_is_a_delivery_failure() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = send(&format!("http://{addr}/prod"), "c1", "{}")
        .await
        .unwrap_err();
    assert!(matches!(err, DeliveryError::Failed(_)));
}
