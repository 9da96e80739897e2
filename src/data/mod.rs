//! Tabular data structures and the storage collaborators around them.

pub mod frame;
pub mod io;
pub mod schema;
pub mod store;

pub use frame::DataFrame;
pub use schema::DatasetSchema;
pub use store::{DocumentStore, SqliteDocumentStore};
