//! Storage interface for customers and readings.
//!
//! The importer and the HTTP layer only talk to [`Store`]; [`PgStore`] is the
//! production implementation and [`MemoryStore`] backs tests and dry runs.

mod memory;
mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use uuid::Uuid;

use crate::domain::{Customer, Reading};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{entity} {id} already exists")]
    Duplicate { entity: &'static str, id: Uuid },
    #[error("{0} has no id")]
    MissingId(&'static str),
    #[error("customer {0} does not exist")]
    UnknownCustomer(Uuid),
    #[error("customer {0} still has readings")]
    CustomerInUse(Uuid),
    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// Keyed persistence for [`Customer`] and [`Reading`] records.
///
/// `create_*` assigns a random id when the record has none. `update_*` and
/// `delete_*` report whether a row was affected. Deleting a customer that
/// still has readings is rejected with [`StoreError::CustomerInUse`].
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn create_customer(&self, customer: Customer) -> Result<Customer, StoreError>;
    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError>;
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;
    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError>;
    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn create_reading(&self, reading: Reading) -> Result<Reading, StoreError>;
    async fn find_reading(&self, id: Uuid) -> Result<Option<Reading>, StoreError>;
    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError>;
    async fn find_readings_by_customer(&self, customer_id: Uuid) -> Result<Vec<Reading>, StoreError>;
    async fn update_reading(&self, reading: &Reading) -> Result<bool, StoreError>;
    async fn delete_reading(&self, id: Uuid) -> Result<bool, StoreError>;
}
