use std::sync::Arc;

use readings_client::{Customer, Reading, Store, StoreError};
use uuid::Uuid;

use crate::{
    pipeline::{Envelope, ImportError, Sink, SkipReason, Written},
    sources::SeriesRow,
};

/// Persists roster rows, one `create_customer` per record.
///
/// A row whose id is already stored is skipped, so a roster can be imported
/// again without failing.
pub struct CustomerSink<S: ?Sized> {
    store: Arc<S>,
}

impl<S: Store + ?Sized> CustomerSink<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<S: Store + ?Sized> Sink<Customer> for CustomerSink<S> {
    async fn write(&mut self, record: Envelope<Customer>) -> Result<Written, ImportError> {
        match self.store.create_customer(record.payload).await {
            Ok(customer) => {
                tracing::trace!(line = record.line, id = ?customer.id, "customer stored");
                Ok(Written::Stored)
            }
            Err(StoreError::Duplicate { id, .. }) => Ok(Written::Rejected(SkipReason::DuplicateId { id })),
            Err(e) => Err(e.into()),
        }
    }
}

/// Resolves the series customer and persists each data row as a [`Reading`].
///
/// The customer is looked up once per file and reused for every row.
pub struct ReadingSink<S: ?Sized> {
    store: Arc<S>,
    customer: Option<Customer>,
}

impl<S: Store + ?Sized> ReadingSink<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            customer: None,
        }
    }

    async fn resolve(&mut self, id: Uuid) -> Result<Customer, ImportError> {
        if let Some(customer) = self.customer.as_ref().filter(|c| c.id == Some(id)) {
            return Ok(customer.clone());
        }
        let customer = self
            .store
            .find_customer(id)
            .await?
            .ok_or(ImportError::UnknownCustomer(id))?;
        self.customer = Some(customer.clone());
        Ok(customer)
    }
}

#[async_trait::async_trait]
impl<S: Store + ?Sized> Sink<SeriesRow> for ReadingSink<S> {
    async fn write(&mut self, record: Envelope<SeriesRow>) -> Result<Written, ImportError> {
        let row = record.payload;
        let customer = self.resolve(row.context.customer_id).await?;

        let reading = Reading {
            id: Some(Uuid::new_v4()),
            customer,
            comment: Some(row.comment).filter(|c| !c.is_empty()),
            date_of_reading: row.date_of_reading,
            kind_of_meter: row.context.kind,
            meter_count: row.meter_count,
            meter_id: row.context.meter_id,
            substitute: false,
        };
        self.store.create_reading(reading).await?;
        Ok(Written::Stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use readings_client::{Gender, MemoryStore, MeterKind};
    use time::macros::date;

    use crate::sources::SeriesContext;

    fn row(customer_id: Uuid, comment: &str) -> Envelope<SeriesRow> {
        Envelope {
            payload: SeriesRow {
                context: SeriesContext {
                    customer_id,
                    meter_id: "MST-1".to_string(),
                    kind: MeterKind::Electricity,
                },
                date_of_reading: Some(date!(2024-01-01)),
                meter_count: Some(12.5),
                comment: comment.to_string(),
            },
            line: 5,
        }
    }

    #[tokio::test]
    async fn reading_sink_resolves_customer_and_stores_reading() {
        let store = Arc::new(MemoryStore::new());
        let customer = store
            .create_customer(Customer {
                id: None,
                first_name: "Jane".to_string(),
                last_name: "Smith".to_string(),
                birth_date: None,
                gender: Gender::Female,
            })
            .await
            .unwrap();
        let id = customer.id.unwrap();

        let mut sink = ReadingSink::new(store.clone());
        sink.write(row(id, "")).await.unwrap();
        sink.write(row(id, "estimated by tenant")).await.unwrap();

        let readings = store.find_readings_by_customer(id).await.unwrap();
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].customer, customer);
        assert_eq!(readings[0].comment, None);
        assert_eq!(readings[0].kind_of_meter, MeterKind::Electricity);
        assert!(!readings[0].substitute);
        assert!(readings[0].id.is_some());
        assert_ne!(readings[0].id, readings[1].id);
        assert_eq!(readings[1].comment.as_deref(), Some("estimated by tenant"));
    }

    #[tokio::test]
    async fn reading_sink_rejects_unknown_customer() {
        let store = Arc::new(MemoryStore::new());
        let mut sink = ReadingSink::new(store.clone());
        let missing = Uuid::new_v4();

        let err = sink.write(row(missing, "")).await.unwrap_err();
        assert!(matches!(err, ImportError::UnknownCustomer(id) if id == missing));
        assert!(store.list_readings().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn customer_sink_skips_already_stored_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut sink = CustomerSink::new(store.clone());
        let id = Uuid::new_v4();
        let customer = Customer {
            id: Some(id),
            first_name: "John".to_string(),
            last_name: "Doe".to_string(),
            birth_date: None,
            gender: Gender::Male,
        };

        let first = sink.write(Envelope { payload: customer.clone(), line: 2 }).await.unwrap();
        assert_eq!(first, Written::Stored);
        let again = sink.write(Envelope { payload: customer, line: 3 }).await.unwrap();
        assert_eq!(again, Written::Rejected(SkipReason::DuplicateId { id }));
        assert_eq!(store.list_customers().await.unwrap().len(), 1);
    }
}
