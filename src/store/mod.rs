//! The `EmployeeStore` trait and its backends.
//!
//! Handlers depend on the trait only. Field validation happens before a
//! store is called; stores enforce email uniqueness and own timestamps.

use std::future::Future;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};

mod memory;
mod postgres;

pub use memory::MemoryEmployeeStore;
pub use postgres::PgEmployeeStore;

pub trait EmployeeStore: Send + Sync {
    /// Every record in insertion order.
    fn list_all(&self) -> impl Future<Output = Result<Vec<Employee>, AppError>> + Send;

    /// Returns `None` if no record has this id.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = Result<Option<Employee>, AppError>> + Send;

    /// Assigns id and timestamps. A duplicate email is a validation error.
    fn create(&self, new_employee: NewEmployee) -> impl Future<Output = Result<Employee, AppError>> + Send;

    /// Merges `changes` onto the stored record and refreshes `updated_at`.
    fn update(
        &self,
        id: Uuid,
        changes: EmployeeChanges,
    ) -> impl Future<Output = Result<Employee, AppError>> + Send;

    /// Removes the record and hands it back so its picture can be cleaned up.
    fn delete(&self, id: Uuid) -> impl Future<Output = Result<Employee, AppError>> + Send;

    /// Case-insensitive substring match on names, email, department and
    /// position.
    fn search(&self, query: &str) -> impl Future<Output = Result<Vec<Employee>, AppError>> + Send;
}

pub(crate) fn duplicate_email(email: &str) -> AppError {
    AppError::Validation(format!("An employee with email '{}' already exists", email))
}
