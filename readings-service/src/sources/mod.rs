pub mod customer_roster;
pub mod reading_series;

pub use customer_roster::CustomerRosterSource;
pub use reading_series::{ReadingSeriesSource, SeriesContext, SeriesRow};
