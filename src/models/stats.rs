use std::collections::BTreeMap;

use serde::Serialize;

use crate::models::employee::{Employee, EmployeeStatus};

/// How many of the latest records the dashboard shows.
pub const RECENT_EMPLOYEES: usize = 5;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: usize,
    pub active_employees: usize,
    pub departments: BTreeMap<String, usize>,
    pub employee_types: BTreeMap<String, usize>,
    pub total_salary: f64,
    pub recent_employees: Vec<Employee>,
}

impl DashboardStats {
    /// Aggregates over records in store order; the most recent ones are
    /// taken from the end of the list, newest first.
    pub fn from_employees(employees: Vec<Employee>) -> Self {
        let mut departments = BTreeMap::new();
        let mut employee_types = BTreeMap::new();
        let mut total_salary = 0.0;
        let mut active_employees = 0;

        for employee in &employees {
            *departments.entry(employee.department.clone()).or_insert(0) += 1;
            *employee_types.entry(employee.employee_type.to_string()).or_insert(0) += 1;
            total_salary += employee.salary;
            if employee.status == EmployeeStatus::Active {
                active_employees += 1;
            }
        }

        let total_employees = employees.len();
        let recent_employees = employees
            .into_iter()
            .rev()
            .take(RECENT_EMPLOYEES)
            .collect();

        DashboardStats {
            total_employees,
            active_employees,
            departments,
            employee_types,
            total_salary,
            recent_employees,
        }
    }
}
