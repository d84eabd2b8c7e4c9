pub mod db;
pub mod domain;

pub use db::{MemoryStore, PgStore, Store, StoreError};
pub use domain::{Customer, Gender, MeterKind, Reading};
