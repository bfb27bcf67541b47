use anyhow::{Context, Result};
use std::time::Duration;

use tracing::{error, info, warn};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use super::{log_requests, metrics::metrics_handler, state::*, ServerConfig};
use crate::prediction::{MovieDescriptor, PredictError, PredictionResult};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub status: &'static str,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct PredictBody {
    pub movie1: MovieDescriptor,
    pub movie2: MovieDescriptor,
}

#[derive(Serialize)]
struct PredictResponse {
    movie1: PredictionResult,
    movie2: PredictionResult,
}

#[derive(Deserialize, Debug)]
struct MediaQuery {
    pub title: String,
}

fn detail(status: StatusCode, message: impl ToString) -> Response {
    (status, Json(json!({ "detail": message.to_string() }))).into_response()
}

async fn home(State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        status: state.predictor.status(),
    };
    Json(stats)
}

async fn predict(
    State(predictor): State<GuardedPredictor>,
    Json(body): Json<PredictBody>,
) -> Response {
    match predictor.predict_pair(&body.movie1, &body.movie2).await {
        Ok((movie1, movie2)) => Json(PredictResponse { movie1, movie2 }).into_response(),
        Err(err @ PredictError::NotReady) => detail(StatusCode::SERVICE_UNAVAILABLE, err),
    }
}

async fn get_model_metrics(State(predictor): State<GuardedPredictor>) -> Response {
    match predictor.metrics() {
        Some(metrics) => Json(metrics).into_response(),
        None => detail(StatusCode::SERVICE_UNAVAILABLE, "Metrics not available"),
    }
}

async fn get_media(
    State(media): State<GuardedMediaProvider>,
    Query(query): Query<MediaQuery>,
) -> Response {
    Json(media.get_media(&query.title).await).into_response()
}

async fn retrain(State(config): State<ServerConfig>) -> Response {
    let Some((program, args)) = config
        .retrain_command
        .as_deref()
        .and_then(|argv| argv.split_first())
    else {
        return detail(StatusCode::NOT_IMPLEMENTED, "No retrain command configured");
    };

    let mut child = match tokio::process::Command::new(program).args(args).spawn() {
        Ok(child) => child,
        Err(err) => {
            error!("Failed to start retrain command '{}': {}", program, err);
            return detail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to start retraining");
        }
    };

    info!("Retraining started with '{}'", program);
    tokio::spawn(async move {
        match child.wait().await {
            Ok(status) if status.success() => {
                info!("Retraining finished, restart the server to load the new artifacts")
            }
            Ok(status) => warn!("Retraining exited with {}", status),
            Err(err) => error!("Failed to wait for retraining: {}", err),
        }
    });

    Json(json!({ "status": "Retraining started" })).into_response()
}

pub fn make_app(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/predict", post(predict))
        .route("/metrics", get(get_model_metrics))
        .route("/media", get(get_media))
        .route("/retrain", post(retrain))
        .layer(middleware::from_fn_with_state(state.clone(), log_requests))
        .layer(cors)
        .with_state(state)
}

fn make_metrics_app() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

pub async fn run_server(state: ServerState) -> Result<()> {
    let port = state.config.port;
    let metrics_port = state.config.metrics_port;

    let metrics_listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", metrics_port))
        .await
        .with_context(|| format!("Failed to bind metrics port {}", metrics_port))?;
    tokio::spawn(async move {
        if let Err(err) = axum::serve(metrics_listener, make_metrics_app()).await {
            error!("Metrics server stopped: {}", err);
        }
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port))
        .await
        .with_context(|| format!("Failed to bind port {}", port))?;

    Ok(axum::serve(listener, make_app(state)).await?)
}
