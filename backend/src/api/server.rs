//! HTTP server for the cwrgen API.
//!
//! Transmission delivery to societies (FTP/SFTP) is handled outside this
//! service; the generate endpoint returns the file content and name.
//!
//! # API Endpoints
//!
//! | Method | Path                        | Description                               |
//! |--------|-----------------------------|-------------------------------------------|
//! | GET    | `/health`                   | Health check                              |
//! | POST   | `/api/cwr/generate`         | Catalog + options → transmission          |
//! | POST   | `/api/cwr/validate`         | Raw transmission text → validation report |
//! | POST   | `/api/ack`                  | Multipart acknowledgment upload           |
//! | POST   | `/api/royalties/distribute` | Catalog + statement → distribution report |
//! | GET    | `/api/logs`                 | SSE stream for real-time logs             |

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_info, LOG_BROADCASTER};
use super::types::{
    error_response, AckResponse, DistributeRequest, DistributeResponse, GenerateRequest, GenerateResponse,
    ValidateResponse,
};
use crate::config::AppConfig;
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::models::Catalog;
use crate::pipeline::{acknowledge, check_transmission, distribute_statement, generate_transmission};
use crate::royalty::render_distribution_csv;
use crate::validation::load_catalog;

type SharedConfig = Arc<AppConfig>;

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(PipelineError::Catalog(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ServerError::Pipeline(
                PipelineError::NoWorks
                | PipelineError::Statement(_)
                | PipelineError::Csv(_)
                | PipelineError::UnsupportedVersion(_),
            ) => StatusCode::BAD_REQUEST,
            ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(error_response(&self.to_string()))).into_response()
    }
}

/// Build the router. Split from [`start_server`] so it can be served on any
/// listener.
pub fn router(config: AppConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/cwr/generate", post(generate))
        .route("/api/cwr/validate", post(validate))
        .route("/api/ack", post(upload_ack))
        .route("/api/royalties/distribute", post(distribute))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let port = config.port;
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 cwrgen server running on http://localhost:{}", port);
    println!("   POST /api/cwr/generate         - Generate a CWR transmission");
    println!("   POST /api/cwr/validate         - Validate a CWR transmission");
    println!("   POST /api/ack                  - Upload an acknowledgment file");
    println!("   POST /api/royalties/distribute - Distribute a royalty statement");
    println!("   GET  /api/logs                 - SSE log stream");
    println!("   GET  /health                   - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cwrgen",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "generate": "POST /api/cwr/generate",
            "validate": "POST /api/cwr/validate",
            "ack": "POST /api/ack (multipart: file, catalog?)",
            "distribute": "POST /api/royalties/distribute",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers drop the missed entries and keep streaming.
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

async fn generate(
    State(config): State<SharedConfig>,
    Json(request): Json<GenerateRequest>,
) -> ServerResult<Json<GenerateResponse>> {
    let catalog = load_catalog(request.catalog, request.strict).map_err(PipelineError::from)?;
    let options = request.options.into_options(&config);
    let generated = generate_transmission(&catalog, &options)?;
    Ok(Json(GenerateResponse::from(generated)))
}

async fn validate(body: String) -> ServerResult<Json<ValidateResponse>> {
    if body.trim().is_empty() {
        return Err(ServerError::BadRequest("Empty transmission".into()));
    }
    Ok(Json(ValidateResponse::from(check_transmission(&body))))
}

/// Multipart fields: `file` (required) and `catalog` (optional JSON document
/// whose works, in order, are the submitted transmission).
async fn upload_ack(mut multipart: Multipart) -> ServerResult<Json<AckResponse>> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut catalog: Option<Catalog> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "catalog" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                let value: Value = serde_json::from_str(&text).map_err(PipelineError::from)?;
                catalog = Some(load_catalog(value, false).map_err(PipelineError::from)?);
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    log_info(format!(
        "📄 Acknowledgment upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    ));

    let outcome = acknowledge(&bytes, catalog.as_ref().map(|c| c.works.as_slice()));
    Ok(Json(AckResponse::new(outcome, file_name)))
}

async fn distribute(
    State(config): State<SharedConfig>,
    Json(request): Json<DistributeRequest>,
) -> ServerResult<Json<DistributeResponse>> {
    if let Some(fee) = request.fee {
        if !(0.0..=100.0).contains(&fee) {
            return Err(ServerError::BadRequest(format!("Fee must be between 0 and 100, got {}", fee)));
        }
    }

    let catalog = load_catalog(request.catalog, false).map_err(PipelineError::from)?;
    let report = distribute_statement(
        &catalog,
        request.statement,
        request.fee,
        config.default_fee,
        request.rematch,
    );
    let csv = if request.include_csv {
        Some(render_distribution_csv(&report).map_err(|e| ServerError::Internal(e.to_string()))?)
    } else {
        None
    };
    Ok(Json(DistributeResponse::new(report, csv)))
}
