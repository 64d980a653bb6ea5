use actix_web::web;

use crate::store::EmployeeStore;

pub mod employee;
pub mod file;

/// Registers every route. `S` picks the record store backend; the store and
/// an `UploadStore` must be registered as app data.
pub fn configure<S: EmployeeStore + 'static>(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/api/employees")
            .route(web::get().to(employee::get_employees::<S>))
            .route(web::post().to(employee::create_employee::<S>)),
    )
    .service(
        web::resource("/api/employees/stats")
            .route(web::get().to(employee::get_employee_stats::<S>)),
    )
    .service(
        web::resource("/api/employees/search/{query}")
            .route(web::get().to(employee::search_employees::<S>)),
    )
    .service(
        web::resource("/api/employees/{id}")
            .route(web::get().to(employee::get_employee::<S>))
            .route(web::put().to(employee::update_employee::<S>))
            .route(web::delete().to(employee::delete_employee::<S>)),
    )
    .service(
        web::resource("/uploads/{filename}")
            .route(web::get().to(file::serve_upload)),
    );
}
