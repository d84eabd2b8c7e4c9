pub mod store;

pub use store::{CustomerSink, ReadingSink};
