use actix_web::{web, HttpRequest, HttpResponse};
use log::info;
use serde_json::json;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::employee::{EmployeeChanges, NewEmployee};
use crate::models::stats::DashboardStats;
use crate::store::EmployeeStore;
use crate::utils::form::{read_submission, EmployeeSubmission};
use crate::utils::uploads::UploadStore;

/// Ids that are not UUIDs cannot name a record.
fn parse_employee_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::employee_not_found())
}

pub async fn get_employees<S: EmployeeStore>(
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let employees = store.list_all().await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn create_employee<S: EmployeeStore>(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<S>,
    uploads: web::Data<UploadStore>,
) -> Result<HttpResponse, AppError> {
    // Decode the body
    let EmployeeSubmission { form, picture } =
        read_submission(&req, payload, uploads.max_bytes()).await?;

    // Validate input fields before touching the upload area
    let mut new_employee = NewEmployee::try_from(form)?;

    // Store the picture
    let picture_path = match &picture {
        Some(image) => Some(uploads.save(image).await?),
        None => None,
    };
    new_employee.profile_picture = picture_path.clone();

    // Insert the record, dropping the new picture if that fails
    match store.create(new_employee).await {
        Ok(employee) => {
            info!("Created employee {} <{}>", employee.id, employee.email);
            Ok(HttpResponse::Created().json(employee))
        }
        Err(err) => {
            if let Some(path) = picture_path {
                uploads.remove(&path).await;
            }
            Err(err)
        }
    }
}

pub async fn get_employee<S: EmployeeStore>(
    store: web::Data<S>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_employee_id(&id)?;
    let employee = store
        .get_by_id(id)
        .await?
        .ok_or_else(AppError::employee_not_found)?;
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn update_employee<S: EmployeeStore>(
    req: HttpRequest,
    payload: web::Payload,
    store: web::Data<S>,
    uploads: web::Data<UploadStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_employee_id(&id)?;

    // Decode and validate the supplied fields
    let EmployeeSubmission { form, picture } =
        read_submission(&req, payload, uploads.max_bytes()).await?;
    let mut changes = EmployeeChanges::try_from(form)?;

    // Fetch the current record for its picture
    let existing = store
        .get_by_id(id)
        .await?
        .ok_or_else(AppError::employee_not_found)?;

    // New file first, record second, old file last: a failure never leaves
    // the record pointing at a deleted picture.
    let new_picture = match &picture {
        Some(image) => Some(uploads.save(image).await?),
        None => None,
    };
    changes.profile_picture = new_picture.clone();

    // Update the record
    let employee = match store.update(id, changes).await {
        Ok(employee) => employee,
        Err(err) => {
            if let Some(path) = new_picture {
                uploads.remove(&path).await;
            }
            return Err(err);
        }
    };

    // Remove the replaced picture
    if new_picture.is_some() {
        if let Some(old_picture) = existing.profile_picture.as_deref() {
            uploads.remove(old_picture).await;
        }
    }

    info!("Updated employee {}", employee.id);
    Ok(HttpResponse::Ok().json(employee))
}

pub async fn delete_employee<S: EmployeeStore>(
    store: web::Data<S>,
    uploads: web::Data<UploadStore>,
    id: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let id = parse_employee_id(&id)?;
    let removed = store.delete(id).await?;

    if let Some(picture) = removed.profile_picture.as_deref() {
        uploads.remove(picture).await;
    }

    info!("Deleted employee {}", removed.id);
    Ok(HttpResponse::Ok().json(json!({
        "message": "Employee deleted successfully",
    })))
}

pub async fn search_employees<S: EmployeeStore>(
    store: web::Data<S>,
    query: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let employees = store.search(&query).await?;
    Ok(HttpResponse::Ok().json(employees))
}

pub async fn get_employee_stats<S: EmployeeStore>(
    store: web::Data<S>,
) -> Result<HttpResponse, AppError> {
    let employees = store.list_all().await?;
    Ok(HttpResponse::Ok().json(DashboardStats::from_employees(employees)))
}
