use std::io::ErrorKind;

use actix_web::{web, HttpResponse};

use crate::errors::AppError;
use crate::utils::uploads::UploadStore;

fn upload_not_found() -> AppError {
    AppError::NotFound("File not found".to_string())
}

pub async fn serve_upload(
    uploads: web::Data<UploadStore>,
    filename: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let path = uploads.resolve(&filename).ok_or_else(upload_not_found)?;

    let bytes = tokio::fs::read(&path).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => upload_not_found(),
        _ => AppError::from(err),
    })?;

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok().content_type(content_type).body(bytes))
}
