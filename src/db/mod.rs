use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use log::info;

use crate::errors::AppError;

const MAX_CONNECTIONS: u32 = 5;

pub async fn create_pool(database_url: &str) -> Result<PgPool, AppError> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
        .map_err(|err| AppError::Config(format!("Failed to connect to the database: {}", err)))
}

/// Creates the employees table and its email index when missing.
pub async fn init_schema(pool: &PgPool) -> Result<(), AppError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS employees (
            id              UUID PRIMARY KEY,
            first_name      TEXT NOT NULL,
            last_name       TEXT NOT NULL,
            email           TEXT NOT NULL,
            phone           TEXT,
            employee_type   TEXT NOT NULL
                CHECK (employee_type IN ('Full-time', 'Part-time', 'Contract', 'Intern')),
            department      TEXT NOT NULL,
            "position"      TEXT NOT NULL,
            profile_picture TEXT,
            joining_date    DATE NOT NULL,
            salary          DOUBLE PRECISION NOT NULL CHECK (salary >= 0),
            address         JSONB,
            status          TEXT NOT NULL DEFAULT 'Active'
                CHECK (status IN ('Active', 'Inactive')),
            created_at      TIMESTAMPTZ NOT NULL,
            updated_at      TIMESTAMPTZ NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS employees_email_key ON employees (email)")
        .execute(pool)
        .await?;

    info!("Employee schema ready");
    Ok(())
}
