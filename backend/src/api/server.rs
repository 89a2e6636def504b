//! HTTP server for the duplicate check.
//!
//! # API Endpoints
//!
//! | Method | Path          | Description                              |
//! |--------|---------------|------------------------------------------|
//! | GET    | `/health`     | Health check                             |
//! | POST   | `/api/check`  | Upload a table, get both rule reports    |
//! | POST   | `/api/clean`  | Upload a table, get the cleaned `.xlsx`  |
//! | GET    | `/api/logs`   | SSE stream for real-time logs            |
//!
//! Both uploads take multipart form data: `file` (CSV or XLSX, required),
//! `rules` (`exact`, `core` or `both`) and `delimiter` (optional). Uploads
//! up to [`MAX_UPLOAD_BYTES`] are accepted.

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, Method, StatusCode},
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

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, schema_error_response, CheckParams, CheckResponse};
use crate::dedup::pipeline::{dedupe_bytes, DedupOptions, DedupRun, RuleSelection};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::export::{table_to_xlsx_bytes, CLEANED_XLSX_FILE};
use crate::models::DedupConfig;

type Rejection = (StatusCode, Json<Value>);

/// Request body limit for uploads.
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Build the application router around a rule configuration.
pub fn router(config: DedupConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/check", post(check_upload))
        .route("/api/clean", post(clean_upload))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(cors)
        .with_state(Arc::new(config))
}

/// Start the HTTP server
pub async fn start_server(port: u16, config: DedupConfig) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(config);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Dupcheck server running on http://localhost:{}", port);
    println!("   POST /api/check  - Upload a table");
    println!("   POST /api/clean  - Download the cleaned table");
    println!("   GET  /api/logs   - SSE log stream");
    println!("   GET  /health     - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "dupcheck",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "check": "POST /api/check",
            "clean": "POST /api/clean",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Upload endpoint
async fn check_upload(
    State(config): State<Arc<DedupConfig>>,
    multipart: Multipart,
) -> Result<Json<CheckResponse>, Rejection> {
    handle_check(&config, multipart).await.map(Json).map_err(|e| {
        log_error(format!("Check failed: {}", e));
        reject(e)
    })
}

/// Cleaned-table download endpoint
async fn clean_upload(
    State(config): State<Arc<DedupConfig>>,
    multipart: Multipart,
) -> Result<Response, Rejection> {
    handle_clean(&config, multipart).await.map_err(|e| {
        log_error(format!("Clean failed: {}", e));
        reject(e)
    })
}

async fn handle_check(config: &DedupConfig, multipart: Multipart) -> ServerResult<CheckResponse> {
    let (bytes, params) = read_upload(multipart).await?;
    let rules = match params.rules.as_deref() {
        Some(r) => r.parse::<RuleSelection>().map_err(ServerError::BadRequest)?,
        None => RuleSelection::default(),
    };

    let run = run_pipeline(config, bytes, rules, params.delimiter).await?;
    Ok(CheckResponse::from(run))
}

async fn handle_clean(config: &DedupConfig, multipart: Multipart) -> ServerResult<Response> {
    let (bytes, params) = read_upload(multipart).await?;
    let run = run_pipeline(config, bytes, RuleSelection::Exact, params.delimiter).await?;

    let cleaned = run
        .outcome
        .exact
        .ok_or_else(|| ServerError::Internal("exact rule produced no result".into()))?
        .cleaned;
    let workbook = table_to_xlsx_bytes(&cleaned).map_err(|e| ServerError::Internal(e.to_string()))?;

    let disposition = format!("attachment; filename=\"{}\"", CLEANED_XLSX_FILE);
    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(XLSX_CONTENT_TYPE)),
        (
            header::CONTENT_DISPOSITION,
            HeaderValue::from_str(&disposition).map_err(|e| ServerError::Internal(e.to_string()))?,
        ),
    ];
    Ok((headers, workbook).into_response())
}

/// File bytes plus the other form fields.
async fn read_upload(mut multipart: Multipart) -> ServerResult<(Vec<u8>, CheckParams)> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut params = CheckParams::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                file_data = Some(bytes.to_vec());
            }
            "rules" => params.rules = Some(read_text(field).await?),
            "delimiter" => {
                let text = read_text(field).await?;
                params.delimiter = parse_delimiter(&text)?;
            }
            _ => {}
        }
    }

    let bytes = file_data.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    Ok((bytes, params))
}

async fn run_pipeline(
    config: &DedupConfig,
    bytes: Vec<u8>,
    rules: RuleSelection,
    delimiter: Option<char>,
) -> ServerResult<DedupRun> {
    let options = DedupOptions {
        config: config.clone(),
        rules,
        delimiter,
    };

    let run = tokio::task::spawn_blocking(move || dedupe_bytes(&bytes, &options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))??;
    Ok(run)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> ServerResult<String> {
    field
        .text()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))
}

fn parse_delimiter(text: &str) -> ServerResult<Option<char>> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ if text == "\\t" => Ok(Some('\t')),
        _ => Err(ServerError::BadRequest(format!("Invalid delimiter '{}'", text))),
    }
}

fn reject(err: ServerError) -> Rejection {
    match err {
        ServerError::BadRequest(msg) => (StatusCode::BAD_REQUEST, Json(error_response(&msg))),
        ServerError::Pipeline(PipelineError::Schema(schema)) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(schema_error_response(&schema.to_string(), schema.missing_columns())),
        ),
        ServerError::Pipeline(e @ PipelineError::Csv(_)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, Json(error_response(&e.to_string())))
        }
        other => (StatusCode::INTERNAL_SERVER_ERROR, Json(error_response(&other.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const BOUNDARY: &str = "X-DUPCHECK-BOUNDARY";

    fn multipart_body(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (name, content) in parts {
            let disposition = if *name == "file" {
                format!("form-data; name=\"{}\"; filename=\"upload\"", name)
            } else {
                format!("form-data; name=\"{}\"", name)
            };
            body.extend_from_slice(
                format!("--{}\r\nContent-Disposition: {}\r\n\r\n", BOUNDARY, disposition).as_bytes(),
            );
            body.extend_from_slice(content);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        body
    }

    async fn post(uri: &str, parts: &[(&str, &[u8])]) -> axum::response::Response {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        router(DedupConfig::default()).oneshot(request).await.unwrap()
    }

    async fn post_check(parts: &[(&str, &str)]) -> (StatusCode, Value) {
        let parts: Vec<(&str, &[u8])> = parts.iter().map(|(n, c)| (*n, c.as_bytes())).collect();
        let response = post("/api/check", &parts).await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = router(DedupConfig::default()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_check_exact_upload() {
        let csv = "externalId;amount\n007;5\n2;5\n9;6\n";
        let (status, body) = post_check(&[("file", csv), ("rules", "exact")]).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "duplicates");
        assert_eq!(body["exact"]["groupCount"], 1);
        assert_eq!(body["exact"]["removedIds"], json!(["007"]));
        assert_eq!(body["exact"]["cleaned"]["rows"], json!([["2", "5"], ["9", "6"]]));
    }

    #[tokio::test]
    async fn test_check_without_file() {
        let (status, body) = post_check(&[("rules", "exact")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], "error");
    }

    #[tokio::test]
    async fn test_check_missing_columns() {
        let csv = "externalId;code\n1;A\n";
        let (status, body) = post_check(&[("file", csv)]).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["missingColumns"][0], "taxExemption");
        assert!(body["error"].as_str().unwrap().contains("itemsTaxRate"));
    }

    #[tokio::test]
    async fn test_check_bad_rule() {
        let (status, _) = post_check(&[("file", "externalId\n1\n"), ("rules", "fuzzy")]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_check_upload_over_two_megabytes() {
        let filler = "x".repeat(1000);
        let mut csv = String::from("externalId;note\n");
        for i in 0..3000 {
            csv.push_str(&format!("{};{}{}\n", i, filler, i));
        }
        assert!(csv.len() > 2 * 1024 * 1024);

        let (status, body) = post_check(&[("file", csv.as_str()), ("rules", "exact")]).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["table"]["rowCount"], 3000);
        assert_eq!(body["status"], "clean");
    }

    #[tokio::test]
    async fn test_check_xlsx_upload() {
        let table = crate::models::Table::from_rows(
            &["externalId", "amount"],
            &[&["0100", "5"], &["007", "5"]],
        );
        let workbook = table_to_xlsx_bytes(&table).unwrap();

        let response = post("/api/check", &[("file", workbook.as_slice()), ("rules", b"exact".as_slice())]).await;
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["table"]["format"], "xlsx");
        assert_eq!(body["exact"]["removedIds"], json!(["0100"]));
    }

    #[tokio::test]
    async fn test_clean_returns_workbook() {
        let csv = "externalId;amount\n0100;5\n007;5\n3;6\n";
        let response = post("/api/clean", &[("file", csv.as_bytes())]).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], XLSX_CONTENT_TYPE);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();

        let cleaned = crate::parser::parse_xlsx_bytes(&bytes).unwrap();
        assert_eq!(cleaned.column_values("externalId").unwrap(), vec!["007", "3"]);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("").unwrap(), None);
        assert_eq!(parse_delimiter(";").unwrap(), Some(';'));
        assert_eq!(parse_delimiter("\\t").unwrap(), Some('\t'));
        assert!(parse_delimiter(";;").is_err());
    }
}
