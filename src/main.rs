use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use pharmacy_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::{auth, cors},
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);
    let app = build_router(app_state);

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(app_state: AppState) -> Router {
    let open_routes = Router::new()
        .route("/", get(routes::health::index))
        .route("/health", get(routes::health::health))
        .route("/signup", post(routes::auth::signup))
        .route("/login", post(routes::auth::login));

    let authed_routes = Router::new()
        .route("/logout", get(routes::auth::logout))
        .route("/me", get(routes::auth::me))
        .route(
            "/request/:id",
            get(routes::requests::request_details).post(routes::requests::delete_request),
        )
        .route("/ws", get(routes::ws::ws_handler))
        .layer(axum_middleware::from_fn(auth::require_bearer_auth));

    let customer_routes = Router::new()
        .route(
            "/customer/dashboard",
            get(routes::requests::customer_dashboard),
        )
        .route(
            "/customer/new_prescription",
            post(routes::requests::new_prescription),
        )
        .layer(axum_middleware::from_fn(auth::require_customer));

    let pharmacist_routes = Router::new()
        .route(
            "/pharmacist/dashboard",
            get(routes::requests::pharmacist_dashboard),
        )
        .layer(axum_middleware::from_fn(auth::require_pharmacist));

    open_routes
        .merge(authed_routes)
        .merge(customer_routes)
        .merge(pharmacist_routes)
        .with_state(app_state)
        .layer(cors::permissive_cors())
        .layer(TraceLayer::new_for_http())
}
