//! HTTP endpoint receiving exported datasets.
//!
//! `POST {path}` takes a multipart form with a `token` field and any number of file parts.
//! Requests with a missing or wrong token get `403 Not authorized` and nothing is written.
//! Every file part is stored under its base name in the upload directory.

use crate::config::UploadConfig;
use crate::error::{LabelerError, Result};
use crate::upload::{UploadReport, base_name};
use axum::{
    Router,
    body::Bytes,
    extract::{DefaultBodyLimit, Multipart, State, multipart::MultipartRejection},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::post,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;

const NOT_AUTHORIZED: &str = "Not authorized";

#[derive(Clone)]
struct UploadState {
    token: Arc<str>,
    upload_dir: Arc<PathBuf>,
}

/// Build the upload router; fails when no token is configured or an origin is not a valid header value
pub fn router(config: &UploadConfig) -> Result<Router> {
    let token = config.require_token()?;

    let origins = config
        .allowed_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin).map_err(|_| LabelerError::config(format!("invalid allowed origin {origin:?}")))
        })
        .collect::<Result<Vec<_>>>()?;

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    let state = UploadState { token: Arc::from(token), upload_dir: Arc::new(config.upload_dir.clone()) };

    Ok(Router::new()
        .route(&config.path, post(handle_upload))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache, must-revalidate"),
        ))
        .layer(SetResponseHeaderLayer::overriding(header::EXPIRES, HeaderValue::from_static("0")))
        .with_state(state))
}

/// Serve the upload endpoint until the process is interrupted
pub async fn serve(config: &UploadConfig) -> Result<()> {
    serve_with_shutdown(config, std::future::pending()).await
}

/// Serve the upload endpoint until `shutdown` completes
pub async fn serve_with_shutdown(config: &UploadConfig, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<()> {
    let app = router(config)?;

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .map_err(|e| LabelerError::Server(format!("failed to bind {}: {}", config.bind, e)))?;

    log::info!(
        "Accepting uploads at http://{}{} into {}",
        config.bind,
        config.path,
        config.upload_dir.display()
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| LabelerError::Server(e.to_string()))
}

async fn handle_upload(State(state): State<UploadState>, multipart: std::result::Result<Multipart, MultipartRejection>) -> Response {
    let mut multipart = match multipart {
        Ok(multipart) => multipart,
        Err(e) => {
            log::debug!("Rejected non-multipart upload: {}", e);
            return (StatusCode::FORBIDDEN, NOT_AUTHORIZED).into_response();
        }
    };

    let mut token = None;
    let mut files: Vec<(String, Bytes)> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)).into_response(),
        };

        if let Some(file_name) = field.file_name().map(str::to_string) {
            match field.bytes().await {
                Ok(data) => files.push((file_name, data)),
                Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)).into_response(),
            }
        } else if field.name() == Some("token") {
            match field.text().await {
                Ok(text) => token = Some(text),
                Err(e) => return (StatusCode::BAD_REQUEST, format!("Invalid upload: {}", e)).into_response(),
            }
        }
    }

    if token.as_deref() != Some(&*state.token) {
        log::warn!("Upload rejected: missing or wrong token");
        return (StatusCode::FORBIDDEN, NOT_AUTHORIZED).into_response();
    }

    let report = save_files(&state.upload_dir, files).await;
    if report.is_success() {
        log::info!("Saved {} uploaded file(s)", report.saved.len());
        (StatusCode::OK, report.to_string()).into_response()
    } else {
        log::warn!("Failed to save uploaded file(s): {}", report.failed.join(", "));
        (StatusCode::INTERNAL_SERVER_ERROR, report.to_string()).into_response()
    }
}

async fn save_files(dir: &Path, files: Vec<(String, Bytes)>) -> UploadReport {
    let mut report = UploadReport::default();

    for (file_name, data) in files {
        let Some(name) = base_name(&file_name) else {
            report.failed.push(file_name);
            continue;
        };

        match save_file(dir, &name, &data).await {
            Ok(()) => report.saved.push(name),
            Err(e) => {
                log::debug!("Could not save {}: {}", name, e);
                report.failed.push(name);
            }
        }
    }
    report
}

async fn save_file(dir: &Path, name: &str, data: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    let target = dir.join(name);
    tokio::fs::write(&target, data).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o644)).await?;
    }
    Ok(())
}
