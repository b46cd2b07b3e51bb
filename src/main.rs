use crate::startup::AppState;
use axum::{
    Json, Router,
    extract::Extension,
    http::{
        Method, StatusCode,
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[macro_use]
extern crate tracing;

mod admin;
mod auth;
mod config;
mod db;
mod error;
mod net;
mod results;
mod startup;
mod voting;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        unsafe {
            std::env::set_var("RUST_LOG", "INFO");
        }
    }
    // initialize tracing
    tracing_subscriber::fmt::init();

    let config = config::Config::load();

    let db = db::connection::init_db(&config.database_url)
        .await
        .expect("Unable to initialise database");

    let auth = auth::AdminAuth::new(config.admin_password_hash, config.jwt_secret);
    let app_state = AppState::new(db.clone(), auth);

    // /admin/login stays outside the token check; everything added before
    // the route_layer requires a bearer token
    let admin_routes = Router::new()
        .route("/polls", get(admin::list_polls).post(admin::create_poll))
        .route(
            "/polls/:poll_id",
            put(admin::update_poll).delete(admin::delete_poll),
        )
        .route_layer(middleware::from_fn(auth::require_admin))
        .route("/login", post(auth::login));

    let app = Router::new()
        .route("/api/polls/active", get(results::get_active_poll))
        .route("/api/polls/history", get(results::get_history))
        .route("/api/polls/:poll_id/results", get(results::get_poll_results))
        .route("/api/votes", post(voting::submit_vote))
        .nest("/admin", admin_routes)
        .layer(Extension(app_state))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, ACCEPT, AUTHORIZATION]),
        )
        .layer(TraceLayer::new_for_http())
        .fallback(handler_404);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Unable to spawn tcp listener");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .unwrap();

    db.close().await;
    info!("database pool closed");
}

async fn handler_404() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": "NotFound",
            "message": "The requested resource does not exist"
        })),
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Unable to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Unable to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
