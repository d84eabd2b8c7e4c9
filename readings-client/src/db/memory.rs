use tokio::sync::Mutex;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::domain::{Customer, Reading};

#[derive(Default)]
struct Tables {
    customers: Vec<Customer>,
    // Readings keep only the customer id; the customer is joined on read.
    readings: Vec<(Uuid, Reading)>,
}

impl Tables {
    fn customer(&self, id: Uuid) -> Option<&Customer> {
        self.customers.iter().find(|c| c.id == Some(id))
    }

    fn joined(&self, customer_id: Uuid, reading: &Reading) -> Result<Reading, StoreError> {
        let customer = self
            .customer(customer_id)
            .cloned()
            .ok_or_else(|| StoreError::CorruptRow(format!("reading {:?} lost customer {customer_id}", reading.id)))?;
        Ok(Reading {
            customer,
            ..reading.clone()
        })
    }
}

/// In-memory [`Store`] with the same constraints as the Postgres schema:
/// unique ids, readings must reference an existing customer, and customers
/// with readings cannot be deleted. Rows are returned in insertion order.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_customer(&self, mut customer: Customer) -> Result<Customer, StoreError> {
        let mut tables = self.tables.lock().await;
        let id = *customer.id.get_or_insert_with(Uuid::new_v4);
        if tables.customer(id).is_some() {
            return Err(StoreError::Duplicate { entity: "customer", id });
        }
        tables.customers.push(customer.clone());
        Ok(customer)
    }

    async fn find_customer(&self, id: Uuid) -> Result<Option<Customer>, StoreError> {
        Ok(self.tables.lock().await.customer(id).cloned())
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.tables.lock().await.customers.clone())
    }

    async fn update_customer(&self, customer: &Customer) -> Result<bool, StoreError> {
        let id = customer.id.ok_or(StoreError::MissingId("customer"))?;
        let mut tables = self.tables.lock().await;
        match tables.customers.iter_mut().find(|c| c.id == Some(id)) {
            Some(existing) => {
                *existing = customer.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_customer(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.readings.iter().any(|(customer_id, _)| *customer_id == id) {
            return Err(StoreError::CustomerInUse(id));
        }
        let before = tables.customers.len();
        tables.customers.retain(|c| c.id != Some(id));
        Ok(tables.customers.len() < before)
    }

    async fn create_reading(&self, mut reading: Reading) -> Result<Reading, StoreError> {
        let customer_id = reading.customer.id.ok_or(StoreError::MissingId("reading customer"))?;
        let mut tables = self.tables.lock().await;
        if tables.customer(customer_id).is_none() {
            return Err(StoreError::UnknownCustomer(customer_id));
        }
        let id = *reading.id.get_or_insert_with(Uuid::new_v4);
        if tables.readings.iter().any(|(_, r)| r.id == Some(id)) {
            return Err(StoreError::Duplicate { entity: "reading", id });
        }
        tables.readings.push((customer_id, reading.clone()));
        Ok(reading)
    }

    async fn find_reading(&self, id: Uuid) -> Result<Option<Reading>, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .readings
            .iter()
            .find(|(_, r)| r.id == Some(id))
            .map(|(customer_id, r)| tables.joined(*customer_id, r))
            .transpose()
    }

    async fn list_readings(&self) -> Result<Vec<Reading>, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .readings
            .iter()
            .map(|(customer_id, r)| tables.joined(*customer_id, r))
            .collect()
    }

    async fn find_readings_by_customer(&self, customer_id: Uuid) -> Result<Vec<Reading>, StoreError> {
        let tables = self.tables.lock().await;
        tables
            .readings
            .iter()
            .filter(|(owner, _)| *owner == customer_id)
            .map(|(owner, r)| tables.joined(*owner, r))
            .collect()
    }

    async fn update_reading(&self, reading: &Reading) -> Result<bool, StoreError> {
        let id = reading.id.ok_or(StoreError::MissingId("reading"))?;
        let customer_id = reading.customer.id.ok_or(StoreError::MissingId("reading customer"))?;
        let mut tables = self.tables.lock().await;
        if tables.customer(customer_id).is_none() {
            return Err(StoreError::UnknownCustomer(customer_id));
        }
        match tables.readings.iter_mut().find(|(_, r)| r.id == Some(id)) {
            Some(slot) => {
                *slot = (customer_id, reading.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_reading(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.lock().await;
        let before = tables.readings.len();
        tables.readings.retain(|(_, r)| r.id != Some(id));
        Ok(tables.readings.len() < before)
    }
}
