use actix_multipart::{Field, Multipart};
use actix_web::{web, HttpMessage, HttpRequest};
use futures_util::TryStreamExt;

use crate::errors::AppError;
use crate::models::employee::{parse_joining_date, Address, EmployeeForm};
use crate::utils::uploads::{too_large, UploadedImage};

/// Name of the multipart part carrying the picture file.
pub const PICTURE_FIELD: &str = "profilePicture";

/// Longest accepted text part or JSON body.
const MAX_TEXT_BYTES: usize = 64 * 1024;

/// A decoded create/update body.
#[derive(Debug, Default)]
pub struct EmployeeSubmission {
    pub form: EmployeeForm,
    pub picture: Option<UploadedImage>,
}

/// Decodes either a `multipart/form-data` or an `application/json` body.
pub async fn read_submission(
    req: &HttpRequest,
    payload: web::Payload,
    max_picture_bytes: usize,
) -> Result<EmployeeSubmission, AppError> {
    match req.content_type() {
        "multipart/form-data" => {
            read_multipart(Multipart::new(req.headers(), payload), max_picture_bytes).await
        }
        "application/json" => {
            let body = read_limited(payload, MAX_TEXT_BYTES).await?;
            Ok(EmployeeSubmission {
                form: serde_json::from_slice(&body)?,
                picture: None,
            })
        }
        other => Err(AppError::Validation(format!(
            "Unsupported content type `{}`; expected multipart/form-data or application/json",
            other
        ))),
    }
}

async fn read_multipart(
    mut multipart: Multipart,
    max_picture_bytes: usize,
) -> Result<EmployeeSubmission, AppError> {
    let mut submission = EmployeeSubmission::default();

    while let Some(mut field) = multipart.try_next().await? {
        let disposition = field.content_disposition();
        let name = disposition.get_name().unwrap_or_default().to_string();
        let file_name = disposition.get_filename().map(str::to_string);

        if name == PICTURE_FIELD {
            // A plain-text profilePicture part is the client echoing the
            // stored path back; the path is only ever set by an upload.
            let Some(file_name) = file_name else {
                drain(&mut field).await?;
                continue;
            };
            let bytes = read_field(&mut field, max_picture_bytes)
                .await?
                .ok_or_else(|| too_large(max_picture_bytes))?;
            if !bytes.is_empty() {
                submission.picture = Some(UploadedImage { original_name: Some(file_name), bytes });
            }
            continue;
        }

        let bytes = read_field(&mut field, MAX_TEXT_BYTES)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Field `{}` is too long", name)))?;
        let value = String::from_utf8(bytes)
            .map_err(|_| AppError::Validation(format!("Field `{}` is not valid UTF-8", name)))?;
        apply_text_field(&mut submission.form, &name, value)?;
    }

    Ok(submission)
}

/// Reads a part fully. `None` means it grew past `limit`.
async fn read_field(field: &mut Field, limit: usize) -> Result<Option<Vec<u8>>, AppError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.try_next().await? {
        if bytes.len() + chunk.len() > limit {
            return Ok(None);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(Some(bytes))
}

async fn drain(field: &mut Field) -> Result<(), AppError> {
    while field.try_next().await?.is_some() {}
    Ok(())
}

async fn read_limited(mut payload: web::Payload, limit: usize) -> Result<Vec<u8>, AppError> {
    let mut body = Vec::new();
    while let Some(chunk) = payload.try_next().await? {
        if body.len() + chunk.len() > limit {
            return Err(AppError::Validation("Request body is too large".to_string()));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Stores one multipart text part on the form. Unknown parts are ignored.
pub fn apply_text_field(form: &mut EmployeeForm, name: &str, value: String) -> Result<(), AppError> {
    match name {
        "firstName" => form.first_name = Some(value),
        "lastName" => form.last_name = Some(value),
        "email" => form.email = Some(value),
        "phone" => form.phone = Some(value),
        "employeeType" => form.employee_type = Some(value),
        "department" => form.department = Some(value),
        "position" => form.position = Some(value),
        "status" => form.status = Some(value),
        "joiningDate" => {
            form.joining_date = match value.trim() {
                "" => None,
                raw => Some(parse_joining_date(raw)?),
            }
        }
        "salary" => {
            form.salary = match value.trim() {
                "" => None,
                raw => Some(raw.parse().map_err(|_| {
                    AppError::Validation(format!("salary `{}` is not a number", raw))
                })?),
            }
        }
        "address" => {
            form.address = match value.trim() {
                "" => None,
                raw => Some(serde_json::from_str::<Address>(raw).map_err(|err| {
                    AppError::Validation(format!("address must be a JSON object: {}", err))
                })?),
            }
        }
        _ => {}
    }
    Ok(())
}
