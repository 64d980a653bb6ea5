use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use uuid::Uuid;

use super::{duplicate_email, EmployeeStore};
use crate::errors::AppError;
use crate::models::employee::{Employee, EmployeeChanges, NewEmployee};

/// Process-local store, used when no database is configured.
#[derive(Debug, Default)]
pub struct MemoryEmployeeStore {
    employees: RwLock<Vec<Employee>>,
}

impl MemoryEmployeeStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Vec<Employee>>, AppError> {
        self.employees
            .read()
            .map_err(|_| AppError::InternalServerError("employee store lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Vec<Employee>>, AppError> {
        self.employees
            .write()
            .map_err(|_| AppError::InternalServerError("employee store lock poisoned".to_string()))
    }
}

impl EmployeeStore for MemoryEmployeeStore {
    async fn list_all(&self) -> Result<Vec<Employee>, AppError> {
        Ok(self.read()?.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        Ok(self.read()?.iter().find(|e| e.id == id).cloned())
    }

    async fn create(&self, new_employee: NewEmployee) -> Result<Employee, AppError> {
        let mut employees = self.write()?;
        if employees.iter().any(|e| e.email == new_employee.email) {
            return Err(duplicate_email(&new_employee.email));
        }
        let employee = Employee::create(new_employee, Utc::now());
        employees.push(employee.clone());
        Ok(employee)
    }

    async fn update(&self, id: Uuid, changes: EmployeeChanges) -> Result<Employee, AppError> {
        let mut employees = self.write()?;
        if let Some(email) = &changes.email {
            if employees.iter().any(|e| e.id != id && &e.email == email) {
                return Err(duplicate_email(email));
            }
        }
        let employee = employees
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(AppError::employee_not_found)?;
        employee.apply(changes, Utc::now());
        Ok(employee.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<Employee, AppError> {
        let mut employees = self.write()?;
        let index = employees
            .iter()
            .position(|e| e.id == id)
            .ok_or_else(AppError::employee_not_found)?;
        Ok(employees.remove(index))
    }

    async fn search(&self, query: &str) -> Result<Vec<Employee>, AppError> {
        let needle = query.to_lowercase();
        Ok(self
            .read()?
            .iter()
            .filter(|e| e.matches(&needle))
            .cloned()
            .collect())
    }
}
