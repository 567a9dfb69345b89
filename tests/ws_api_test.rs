use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value as JsonValue};
use sqlx::PgPool;
use tokio::net::TcpListener;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::{client::IntoClientRequest, http::HeaderValue, Message};
use tower::ServiceExt;
use uuid::Uuid;

use pharmacy_backend::{
    middleware::auth, models::request::RequestStatus, routes,
    services::request_service::RequestService, AppState,
};

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn setup_pool() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    if env::var("DATABASE_URL").is_err() {
        eprintln!("DATABASE_URL not set, skipping DB-backed test");
        return None;
    }
    if env::var("SERVER_ADDRESS").is_err() {
        env::set_var("SERVER_ADDRESS", "127.0.0.1:0");
    }
    if env::var("JWT_SECRET").is_err() {
        env::set_var("JWT_SECRET", "test_secret_key");
    }
    let _ = pharmacy_backend::config::init_config();

    let pool = pharmacy_backend::database::pool::create_pool()
        .await
        .expect("pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations");
    Some(pool)
}

fn build_app(state: AppState) -> Router {
    let open_routes = Router::new()
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    let authed_routes = Router::new()
        .route("/ws", get(routes::ws::ws_handler))
        .layer(axum_middleware::from_fn(auth::require_bearer_auth));

    let customer_routes = Router::new()
        .route(
            "/customer/new_prescription",
            post(routes::requests::new_prescription),
        )
        .layer(axum_middleware::from_fn(auth::require_customer));

    open_routes
        .merge(authed_routes)
        .merge(customer_routes)
        .with_state(state)
}

async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: JsonValue,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = builder.body(Body::from(body.to_string())).unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null);
    (status, value)
}

async fn signup_and_login(app: &Router, username: &str, role: &str) -> String {
    let (status, _) = send_json(
        app,
        "POST",
        "/signup",
        None,
        json!({"username": username, "password": "pw", "role": role}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send_json(
        app,
        "POST",
        "/login",
        None,
        json!({"username": username, "password": "pw"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn ws_connect(addr: SocketAddr, token: &str) -> WsStream {
    let mut request = format!("ws://{}/ws", addr).into_client_request().unwrap();
    request.headers_mut().insert(
        "Authorization",
        HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
    );
    let (stream, _) = tokio_tungstenite::connect_async(request)
        .await
        .expect("ws connect");
    stream
}

async fn send_frame(ws: &mut WsStream, value: JsonValue) {
    ws.send(Message::Text(value.to_string())).await.unwrap();
}

async fn recv_frame(ws: &mut WsStream) -> JsonValue {
    let frame = timeout(Duration::from_secs(5), ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("ws error");
    match frame {
        Message::Text(text) => serde_json::from_str(&text).unwrap(),
        other => panic!("unexpected frame: {:?}", other),
    }
}

async fn assert_no_frame(ws: &mut WsStream) {
    assert!(
        timeout(Duration::from_millis(400), ws.next()).await.is_err(),
        "expected no frame"
    );
}

fn is_chat_timestamp(s: &str) -> bool {
    s.len() == 16
        && s.chars().enumerate().all(|(i, c)| match i {
            4 | 7 => c == '-',
            10 => c == ' ',
            13 => c == ':',
            _ => c.is_ascii_digit(),
        })
}

#[tokio::test]
async fn websocket_chat_round_trip() {
    let Some(pool) = setup_pool().await else { return };
    let state = AppState::new(pool.clone());
    let app = build_app(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    {
        let app = app.clone();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
    }

    let alice = format!("alice_{}", Uuid::new_v4().simple());
    let bob = format!("bob_{}", Uuid::new_v4().simple());
    let eve = format!("eve_{}", Uuid::new_v4().simple());
    let alice_token = signup_and_login(&app, &alice, "customer").await;
    let bob_token = signup_and_login(&app, &bob, "pharmacist").await;
    let eve_token = signup_and_login(&app, &eve, "customer").await;

    let (status, body) = send_json(
        &app,
        "POST",
        "/customer/new_prescription",
        Some(&alice_token),
        json!({"medicines": "aspirin 500mg"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let request_id = body["id"].as_i64().unwrap();
    let room = request_id.to_string();

    let mut bob_ws = ws_connect(addr, &bob_token).await;
    send_frame(&mut bob_ws, json!({"event": "join", "data": {"room": room}})).await;
    sleep(Duration::from_millis(300)).await;

    let mut alice_ws = ws_connect(addr, &alice_token).await;
    // A malformed frame is ignored, it must not end the connection.
    alice_ws
        .send(Message::Text("definitely not json".into()))
        .await
        .unwrap();
    send_frame(&mut alice_ws, json!({"event": "join", "data": {"room": room}})).await;
    send_frame(
        &mut alice_ws,
        json!({"event": "send_message", "data": {"request_id": request_id, "msg": "when will this be ready?"}}),
    )
    .await;

    // Bob's client hears alice's message with her username and a
    // minute-resolution timestamp.
    let frame = recv_frame(&mut bob_ws).await;
    assert_eq!(frame["event"], "receive_message");
    assert_eq!(frame["data"]["username"], alice.as_str());
    assert_eq!(frame["data"]["msg"], "when will this be ready?");
    assert!(is_chat_timestamp(frame["data"]["timestamp"].as_str().unwrap()));

    // The first message flipped the request to Awaiting Reply before the
    // broadcast went out.
    let requests = RequestService::new(pool.clone());
    let stored = requests.get_by_id(request_id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::AwaitingReply);

    // Pharmacist status change reaches joined members.
    send_frame(
        &mut bob_ws,
        json!({"event": "change_status", "data": {"request_id": request_id, "status": "Fulfilled"}}),
    )
    .await;
    let frame = recv_frame(&mut bob_ws).await;
    assert_eq!(frame["event"], "status_updated");
    assert_eq!(frame["data"]["status"], "Fulfilled");

    // Alice joined too: drain her copy of both frames.
    let frame = recv_frame(&mut alice_ws).await;
    assert_eq!(frame["event"], "receive_message");
    let frame = recv_frame(&mut alice_ws).await;
    assert_eq!(frame["event"], "status_updated");

    // Eve is neither the owner nor a pharmacist: her join is denied, so
    // room traffic never reaches her.
    let mut eve_ws = ws_connect(addr, &eve_token).await;
    send_frame(&mut eve_ws, json!({"event": "join", "data": {"room": room}})).await;
    sleep(Duration::from_millis(300)).await;

    send_frame(
        &mut bob_ws,
        json!({"event": "send_message", "data": {"request_id": request_id, "msg": "almost done"}}),
    )
    .await;
    let frame = recv_frame(&mut bob_ws).await;
    assert_eq!(frame["data"]["msg"], "almost done");
    let frame = recv_frame(&mut alice_ws).await;
    assert_eq!(frame["data"]["msg"], "almost done");
    assert_no_frame(&mut eve_ws).await;

    // Her status change is silently ignored.
    send_frame(
        &mut eve_ws,
        json!({"event": "change_status", "data": {"request_id": request_id, "status": "Rejected"}}),
    )
    .await;
    assert_no_frame(&mut alice_ws).await;
    let stored = requests.get_by_id(request_id).await.unwrap();
    assert_eq!(stored.status, RequestStatus::Fulfilled);

    // And her messages are neither persisted nor fanned out.
    send_frame(
        &mut eve_ws,
        json!({"event": "send_message", "data": {"request_id": request_id, "msg": "let me in"}}),
    )
    .await;
    assert_no_frame(&mut bob_ws).await;
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM chat_messages WHERE request_id = $1 AND message_text = 'let me in'",
    )
    .bind(request_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 0);
}
