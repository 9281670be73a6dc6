use axum::{
    Json,
    body::Body,
    extract::{Multipart, State},
    http::{StatusCode, header},
    response::Response,
};
use bytes::Bytes;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Serialize;
use utoipa::ToSchema;

use crate::AppState;
use crate::api::error::AppError;
use crate::services::convert::BatchItemResult;
use crate::services::strategy::ConversionKind;

/// Multipart request body: one file field.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ConvertUpload {
    #[schema(value_type = String, format = Binary)]
    pub file: String,
}

#[derive(Serialize, ToSchema)]
pub struct BatchResponse {
    pub results: Vec<BatchItemResult>,
}

#[utoipa::path(
    post,
    path = "/convert/docx-to-pdf",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted PDF binary"),
        (status = 400, description = "Invalid upload"),
        (status = 500, description = "Conversion failed")
    ),
    tag = "convert"
)]
pub async fn docx_to_pdf(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    convert_single(state, multipart, ConversionKind::DocxToPdf).await
}

#[utoipa::path(
    post,
    path = "/convert/pdf-to-docx",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Converted DOCX binary"),
        (status = 400, description = "Invalid upload"),
        (status = 500, description = "Conversion failed")
    ),
    tag = "convert"
)]
pub async fn pdf_to_docx(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, AppError> {
    convert_single(state, multipart, ConversionKind::PdfToDocx).await
}

#[utoipa::path(
    post,
    path = "/convert/batch-docx-to-pdf",
    request_body(content = ConvertUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-item results", body = BatchResponse),
        (status = 400, description = "No files provided")
    ),
    tag = "convert"
)]
pub async fn batch_docx_to_pdf(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResponse>, AppError> {
    let mut items: Vec<(String, Bytes)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|n| n.to_string()) else {
            continue;
        };
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Could not read upload: {}", e)))?;
        items.push((filename, body));
    }

    if items.is_empty() {
        return Err(AppError::InvalidInput("No files provided".to_string()));
    }

    let results = state.converter.convert_batch(&items);
    Ok(Json(BatchResponse { results }))
}

async fn convert_single(
    state: AppState,
    multipart: Multipart,
    kind: ConversionKind,
) -> Result<Response, AppError> {
    let (filename, body) = first_file_field(multipart).await?;

    let artifact = state.converter.convert(kind, body, &filename).await?;

    // Read then unlink before responding: the artifact never outlives
    // the request even if the client goes away mid-stream
    let content = tokio::fs::read(artifact.file.path()).await;
    artifact.file.release().await;
    let content =
        content.map_err(|e| AppError::Internal(format!("Could not read artifact: {}", e)))?;

    tracing::info!(
        "📦 {} produced {} ({} bytes)",
        kind.label(),
        artifact.download_name,
        artifact.size
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, artifact.media_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition(&artifact.download_name),
        )
        .body(Body::from(content))
        .map_err(|e| AppError::Internal(format!("Could not build response: {}", e)))
}

/// Extract the first uploaded file from a multipart body.
async fn first_file_field(mut multipart: Multipart) -> Result<(String, Bytes), AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Malformed multipart body: {}", e)))?
    {
        let Some(filename) = field.file_name().map(|n| n.to_string()) else {
            continue;
        };
        let body = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Could not read upload: {}", e)))?;
        return Ok((filename, body));
    }

    Err(AppError::InvalidInput("No file provided".to_string()))
}

/// RFC 6266 attachment header with an ASCII fallback and a UTF-8
/// encoded variant for non-ASCII names.
fn content_disposition(download_name: &str) -> String {
    let ascii_fallback: String = download_name
        .chars()
        .map(|c| if c.is_ascii() && c != '"' { c } else { '_' })
        .collect();
    let encoded = utf8_percent_encode(download_name, NON_ALPHANUMERIC);
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        ascii_fallback, encoded
    )
}
