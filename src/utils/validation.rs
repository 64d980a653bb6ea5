use validator::{Validate, ValidationError};
use crate::errors::AppError;
use crate::models::employee::{EMPLOYEE_STATUSES, EMPLOYEE_TYPES};

pub fn validate_payload<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload.validate().map_err(AppError::from)
}

fn one_of(value: &str, allowed: &[&str], code: &'static str, field: &str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        return Ok(());
    }
    let mut err = ValidationError::new(code);
    err.message = Some(
        format!("`{}` is not a valid {} (expected one of: {})", value, field, allowed.join(", ")).into(),
    );
    Err(err)
}

pub fn validate_employee_type(employee_type: &str) -> Result<(), ValidationError> {
    one_of(employee_type, EMPLOYEE_TYPES, "employee_type", "employeeType")
}

pub fn validate_status(status: &str) -> Result<(), ValidationError> {
    one_of(status, EMPLOYEE_STATUSES, "status", "status")
}

/// Salary must be a finite, non-negative amount.
pub fn validate_salary(salary: f64) -> Result<f64, AppError> {
    if !salary.is_finite() || salary < 0.0 {
        return Err(AppError::Validation(format!(
            "salary must be a non-negative number, got {}",
            salary
        )));
    }
    Ok(salary)
}
