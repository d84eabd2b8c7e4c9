use sqlx::PgPool;
use time::Date;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::domain::{Customer, Reading};

#[derive(Debug, Clone, sqlx::FromRow)]
struct CustomerRow {
    id: Uuid,
    first_name: String,
    last_name: String,
    birth_date: Option<Date>,
    gender: String,
}

impl TryFrom<CustomerRow> for Customer {
    type Error = StoreError;

    fn try_from(row: CustomerRow) -> Result<Self, Self::Error> {
        let gender = row
            .gender
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("customer {}: {e}", row.id)))?;
        Ok(Customer {
            id: Some(row.id),
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            gender,
        })
    }
}

/// Reading joined with its owning customer.
#[derive(Debug, Clone, sqlx::FromRow)]
struct ReadingRow {
    id: Uuid,
    comment: Option<String>,
    date_of_reading: Option<Date>,
    kind_of_meter: String,
    meter_count: Option<f64>,
    meter_id: String,
    substitute: bool,
    customer_id: Uuid,
    first_name: String,
    last_name: String,
    birth_date: Option<Date>,
    gender: String,
}

impl TryFrom<ReadingRow> for Reading {
    type Error = StoreError;

    fn try_from(row: ReadingRow) -> Result<Self, Self::Error> {
        let kind_of_meter = row
            .kind_of_meter
            .parse()
            .map_err(|e| StoreError::CorruptRow(format!("reading {}: {e}", row.id)))?;
        let customer = Customer::try_from(CustomerRow {
            id: row.customer_id,
            first_name: row.first_name,
            last_name: row.last_name,
            birth_date: row.birth_date,
            gender: row.gender,
        })?;
        Ok(Reading {
            id: Some(row.id),
            customer,
            comment: row.comment,
            date_of_reading: row.date_of_reading,
            kind_of_meter,
            meter_count: row.meter_count,
            meter_id: row.meter_id,
            substitute: row.substitute,
        })
    }
}

const CUSTOMER_SELECT: &str = r#"
    SELECT id, first_name, last_name, birth_date, gender
    FROM customers
"#;

const READING_SELECT: &str = r#"
    SELECT
        r.id,
        r.comment,
        r.date_of_reading,
        r.kind_of_meter,
        r.meter_count,
        r.meter_id,
        r.substitute,
        c.id AS customer_id,
        c.first_name,
        c.last_name,
        c.birth_date,
        c.gender
    FROM readings r
    JOIN customers c ON r.customer_id = c.id
"#;

/// Postgres-backed [`Store`].
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_readings(&self, sql: &str, customer_id: Option<Uuid>) -> Result<Vec<Reading>, StoreError> {
        let mut query = sqlx::query_as::<_, ReadingRow>(sql);
        if let Some(id) = customer_id {
            query = query.bind(id);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.into_iter().map(Reading::try_from).collect()
    }
}

fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_foreign_key_violation())
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_customer(&self, mut customer: Customer) -> Result<Customer, StoreError> {
        let id = *customer.id.get_or_insert_with(Uuid::new_v4);
        let res = sqlx::query(
            r#"
            INSERT INTO customers (id, first_name, last_name, birth_date, gender)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.birth_date)
        .bind(customer.gender.code())
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(customer),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate {
                entity: "customer",
                id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        let sql = format!("{CUSTOMER_SELECT} WHERE id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Customer::try_from).transpose()
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let sql = format!("{CUSTOMER_SELECT} ORDER BY last_name, first_name");
        let rows = sqlx::query_as::<_, CustomerRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Customer::try_from).collect()
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        let id = customer.id.ok_or(StoreError::MissingId("customer"))?;
        let res = sqlx::query(
            r#"
            UPDATE customers
            SET first_name = $2, last_name = $3, birth_date = $4, gender = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&customer.first_name)
        .bind(&customer.last_name)
        .bind(customer.birth_date)
        .bind(customer.gender.code())
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        match sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::CustomerInUse(id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn create_reading(&self, mut reading: Reading) -> Result<Reading, StoreError> {
        let customer_id = reading.customer.id.ok_or(StoreError::MissingId("reading customer"))?;
        let id = *reading.id.get_or_insert_with(Uuid::new_v4);
        let res = sqlx::query(
            r#"
            INSERT INTO readings
                (id, customer_id, comment, date_of_reading, kind_of_meter, meter_count, meter_id, substitute)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(id)
        .bind(customer_id)
        .bind(&reading.comment)
        .bind(reading.date_of_reading)
        .bind(reading.kind_of_meter.code())
        .bind(reading.meter_count)
        .bind(&reading.meter_id)
        .bind(reading.substitute)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(reading),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::UnknownCustomer(customer_id)),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => Err(StoreError::Duplicate {
                entity: "reading",
                id,
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_reading(&self, id: Uuid) -> Result<Option<Reading>, StoreError> {
        let sql = format!("{READING_SELECT} WHERE r.id = $1");
        let row = sqlx::query_as::<_, ReadingRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Reading::try_from).transpose()
    }

    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError> {
        let sql = format!("{READING_SELECT} ORDER BY r.date_of_reading, r.meter_id");
        self.fetch_readings(&sql, None).await
    }

    async fn find_readings_by_customer(&self, customer_id: Uuid) -> Result<Vec<Reading>, StoreError> {
        let sql = format!("{READING_SELECT} WHERE r.customer_id = $1 ORDER BY r.date_of_reading, r.meter_id");
        self.fetch_readings(&sql, Some(customer_id)).await
    }

    async fn update_reading(&self, reading: &Reading) -> Result<bool, StoreError> {
        let id = reading.id.ok_or(StoreError::MissingId("reading"))?;
        let customer_id = reading.customer.id.ok_or(StoreError::MissingId("reading customer"))?;
        let res = sqlx::query(
            r#"
            UPDATE readings
            SET customer_id = $2,
                comment = $3,
                date_of_reading = $4,
                kind_of_meter = $5,
                meter_count = $6,
                meter_id = $7,
                substitute = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(customer_id)
        .bind(&reading.comment)
        .bind(reading.date_of_reading)
        .bind(reading.kind_of_meter.code())
        .bind(reading.meter_count)
        .bind(&reading.meter_id)
        .bind(reading.substitute)
        .execute(&self.pool)
        .await;

        match res {
            Ok(res) => Ok(res.rows_affected() > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(StoreError::UnknownCustomer(customer_id)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_reading(&self, id: Uuid) -> Result<bool, StoreError> {
        let res = sqlx::query("DELETE FROM readings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }
}
