use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{duplicate_email, EmployeeStore};
use crate::errors::AppError;
use crate::models::employee::{
    Address, Employee, EmployeeChanges, EmployeeStatus, EmployeeType, NewEmployee,
};

const UNIQUE_VIOLATION: &str = "23505";

const SELECT_EMPLOYEES: &str = r#"
    SELECT id, first_name, last_name, email, phone, employee_type, department,
           "position", profile_picture, joining_date, salary, address, status,
           created_at, updated_at
    FROM employees
"#;

/// PostgreSQL-backed store. The table is created by `db::init_schema`.
#[derive(Clone)]
pub struct PgEmployeeStore {
    pool: PgPool,
}

impl PgEmployeeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn employee_from_row(row: &PgRow) -> Result<Employee, AppError> {
    let employee_type: String = row.try_get("employee_type")?;
    let status: String = row.try_get("status")?;
    let address: Option<Json<Address>> = row.try_get("address")?;

    Ok(Employee {
        id: row.try_get("id")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        employee_type: employee_type.parse::<EmployeeType>()?,
        department: row.try_get("department")?,
        position: row.try_get("position")?,
        profile_picture: row.try_get("profile_picture")?,
        joining_date: row.try_get("joining_date")?,
        salary: row.try_get("salary")?,
        address: address.map(|Json(address)| address),
        status: status.parse::<EmployeeStatus>()?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn rows_to_employees(rows: Vec<PgRow>) -> Result<Vec<Employee>, AppError> {
    rows.iter().map(employee_from_row).collect()
}

fn map_write_error(err: sqlx::Error, email: &str) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            duplicate_email(email)
        }
        _ => AppError::from(err),
    }
}

/// Escapes LIKE metacharacters so the query matches literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

impl EmployeeStore for PgEmployeeStore {
    async fn list_all(&self) -> Result<Vec<Employee>, AppError> {
        let sql = format!("{} ORDER BY created_at ASC", SELECT_EMPLOYEES);
        let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
        rows_to_employees(rows)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Employee>, AppError> {
        let sql = format!("{} WHERE id = $1", SELECT_EMPLOYEES);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(employee_from_row).transpose()
    }

    async fn create(&self, new_employee: NewEmployee) -> Result<Employee, AppError> {
        let employee = Employee::create(new_employee, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO employees (
                id, first_name, last_name, email, phone, employee_type, department,
                "position", profile_picture, joining_date, salary, address, status,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(employee.id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.employee_type.as_str())
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(&employee.profile_picture)
        .bind(employee.joining_date)
        .bind(employee.salary)
        .bind(employee.address.clone().map(Json))
        .bind(employee.status.as_str())
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, &employee.email))?;

        Ok(employee)
    }

    async fn update(&self, id: Uuid, changes: EmployeeChanges) -> Result<Employee, AppError> {
        let mut employee = self
            .get_by_id(id)
            .await?
            .ok_or_else(AppError::employee_not_found)?;
        employee.apply(changes, Utc::now());

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                first_name = $2, last_name = $3, email = $4, phone = $5, employee_type = $6,
                department = $7, "position" = $8, profile_picture = $9, joining_date = $10,
                salary = $11, address = $12, status = $13, updated_at = $14
            WHERE id = $1
            "#,
        )
        .bind(employee.id)
        .bind(&employee.first_name)
        .bind(&employee.last_name)
        .bind(&employee.email)
        .bind(&employee.phone)
        .bind(employee.employee_type.as_str())
        .bind(&employee.department)
        .bind(&employee.position)
        .bind(&employee.profile_picture)
        .bind(employee.joining_date)
        .bind(employee.salary)
        .bind(employee.address.clone().map(Json))
        .bind(employee.status.as_str())
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|err| map_write_error(err, &employee.email))?;

        // Deleted between the read and the write.
        if result.rows_affected() == 0 {
            return Err(AppError::employee_not_found());
        }

        Ok(employee)
    }

    async fn delete(&self, id: Uuid) -> Result<Employee, AppError> {
        let sql = r#"
            DELETE FROM employees WHERE id = $1
            RETURNING id, first_name, last_name, email, phone, employee_type, department,
                      "position", profile_picture, joining_date, salary, address, status,
                      created_at, updated_at
        "#;
        let row = sqlx::query(sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(AppError::employee_not_found)?;
        employee_from_row(&row)
    }

    async fn search(&self, query: &str) -> Result<Vec<Employee>, AppError> {
        let sql = format!(
            "{} WHERE first_name ILIKE $1 OR last_name ILIKE $1 OR email ILIKE $1 \
             OR department ILIKE $1 OR \"position\" ILIKE $1 ORDER BY created_at ASC",
            SELECT_EMPLOYEES
        );
        let rows = sqlx::query(&sql)
            .bind(like_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        rows_to_employees(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use chrono::NaiveDate;

    #[test]
    fn like_pattern_wraps_and_escapes() {
        assert_eq!(like_pattern("eng"), "%eng%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    // Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.
    async fn connect() -> PgEmployeeStore {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let pool = db::create_pool(&url).await.unwrap();
        db::init_schema(&pool).await.unwrap();
        PgEmployeeStore::new(pool)
    }

    /// Unique per run so repeated runs against one database don't collide.
    fn tag() -> String {
        Uuid::new_v4().simple().to_string()[..12].to_string()
    }

    fn new_employee(tag: &str, email_prefix: &str, position: &str) -> NewEmployee {
        NewEmployee {
            first_name: format!("Ada{}", tag),
            last_name: "Lovelace".into(),
            email: format!("{}-{}@example.com", email_prefix, tag),
            phone: Some("555-0100".into()),
            employee_type: EmployeeType::Contract,
            department: "Engineering".into(),
            position: position.into(),
            profile_picture: Some("/uploads/1-2.png".into()),
            joining_date: NaiveDate::from_ymd_opt(2020, 2, 29).unwrap(),
            salary: 1234.5,
            address: Some(Address {
                city: Some("London".into()),
                zip_code: Some("NW1".into()),
                ..Default::default()
            }),
            status: EmployeeStatus::Inactive,
        }
    }

    #[actix_web::test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    async fn rows_round_trip_through_postgres() {
        let store = connect().await;
        let tag = tag();

        let created = store.create(new_employee(&tag, "ada", "Analyst")).await.unwrap();
        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();

        assert_eq!(fetched.email, created.email);
        assert_eq!(fetched.phone.as_deref(), Some("555-0100"));
        assert_eq!(fetched.employee_type, EmployeeType::Contract);
        assert_eq!(fetched.status, EmployeeStatus::Inactive);
        assert_eq!(fetched.joining_date, created.joining_date);
        assert_eq!(fetched.salary, 1234.5);
        assert_eq!(fetched.address, created.address);
        assert_eq!(fetched.profile_picture, created.profile_picture);

        let updated = store
            .update(
                created.id,
                EmployeeChanges {
                    phone: Some(None),
                    address: Some(Address { country: Some("UK".into()), ..Default::default() }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated.updated_at >= fetched.updated_at);

        let fetched = store.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.phone, None);
        assert_eq!(fetched.address.unwrap().city, None);
        assert_eq!(fetched.first_name, created.first_name);

        let removed = store.delete(created.id).await.unwrap();
        assert_eq!(removed.id, created.id);
        assert!(store.get_by_id(created.id).await.unwrap().is_none());
        assert!(matches!(store.delete(created.id).await, Err(AppError::NotFound(_))));
    }

    #[actix_web::test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    async fn unique_violations_become_validation_errors() {
        let store = connect().await;
        let tag = tag();

        let first = store.create(new_employee(&tag, "ada", "Analyst")).await.unwrap();
        let second = store.create(new_employee(&tag, "countess", "Analyst")).await.unwrap();

        let err = store.create(new_employee(&tag, "ada", "Analyst")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", err);
        assert!(err.message().contains(&first.email));

        let taken = EmployeeChanges { email: Some(first.email.clone()), ..Default::default() };
        let err = store.update(second.id, taken).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)), "{:?}", err);

        store.delete(first.id).await.unwrap();
        store.delete(second.id).await.unwrap();
    }

    #[actix_web::test]
    #[ignore = "needs a PostgreSQL DATABASE_URL"]
    async fn search_treats_wildcards_literally() {
        let store = connect().await;
        let tag = tag();

        let literal = store
            .create(new_employee(&tag, "ada", &format!("100%_{}", tag)))
            .await
            .unwrap();
        let lookalike = store
            .create(new_employee(&tag, "countess", &format!("100ab_{}", tag)))
            .await
            .unwrap();

        let found = store.search(&format!("100%_{}", tag)).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, literal.id);

        let found = store.search(&tag.to_uppercase()).await.unwrap();
        assert_eq!(found.len(), 2);

        store.delete(literal.id).await.unwrap();
        store.delete(lookalike.id).await.unwrap();
    }
}
