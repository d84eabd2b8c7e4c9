use sqlx::PgPool;

const CREATE_CUSTOMERS: &str = r#"
    CREATE TABLE IF NOT EXISTS customers (
        id          UUID PRIMARY KEY,
        first_name  VARCHAR(100) NOT NULL,
        last_name   VARCHAR(100) NOT NULL,
        birth_date  DATE,
        gender      VARCHAR(1) NOT NULL CHECK (gender IN ('D', 'M', 'U', 'W'))
    )
"#;

// No ON DELETE CASCADE: a customer with readings cannot be removed.
const CREATE_READINGS: &str = r#"
    CREATE TABLE IF NOT EXISTS readings (
        id               UUID PRIMARY KEY,
        customer_id      UUID NOT NULL REFERENCES customers (id),
        comment          VARCHAR(255),
        date_of_reading  DATE,
        kind_of_meter    VARCHAR(20) NOT NULL
                         CHECK (kind_of_meter IN ('HEIZUNG', 'STROM', 'UNBEKANNT', 'WASSER')),
        meter_count      DOUBLE PRECISION,
        meter_id         VARCHAR(50) NOT NULL,
        substitute       BOOLEAN NOT NULL DEFAULT FALSE
    )
"#;

/// Create the `customers` and `readings` tables if they are missing.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(CREATE_CUSTOMERS).execute(&mut *tx).await?;
    sqlx::query(CREATE_READINGS).execute(&mut *tx).await?;
    tx.commit().await
}
