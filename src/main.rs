use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::json;

mod config;
mod dispatch;
mod handler;
mod models;

use config::Config;
use dispatch::Dispatcher;
use models::InboundRequest;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let in_lambda = std::env::var("AWS_LAMBDA_RUNTIME_API").is_ok();
    init_tracing(in_lambda);

    let config = Config::from_env()?;
    let dispatcher = Arc::new(Dispatcher::new(&config)?);
    tracing::info!(base_url = %config.base_url, "relay configured");

    if in_lambda {
        run_lambda(dispatcher).await
    } else {
        serve(config.bind, dispatcher).await
    }
}

fn init_tracing(in_lambda: bool) {
    let builder = tracing_subscriber::fmt().with_env_filter(
        tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
    );
    // CloudWatch stamps each line itself.
    if in_lambda {
        builder.with_target(false).without_time().init();
    } else {
        builder.init();
    }
}

async fn run_lambda(dispatcher: Arc<Dispatcher>) -> Result<(), Error> {
    lambda_runtime::run(service_fn(move |event: LambdaEvent<InboundRequest>| {
        let dispatcher = Arc::clone(&dispatcher);
        async move { Ok::<_, Error>(handler::handle(&dispatcher, event.payload).await) }
    }))
    .await
}

async fn serve(addr: SocketAddr, dispatcher: Arc<Dispatcher>) -> Result<(), Error> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(dispatcher)).await?;
    Ok(())
}

fn app(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/invoke", post(invoke_endpoint))
        .with_state(dispatcher)
}

async fn health() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

async fn invoke_endpoint(
    State(dispatcher): State<Arc<Dispatcher>>,
    Json(event): Json<InboundRequest>,
) -> Response {
    let envelope = handler::handle(&dispatcher, event).await;
    let status =
        StatusCode::from_u16(envelope.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(envelope)).into_response()
}
