pub mod manager;
pub mod memory;
pub mod models;
pub mod pipeline;
pub mod postgres;
pub mod repository;
pub mod store;
pub mod timeout;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use pipeline::{Expr, Pipeline, Projection};
pub use postgres::PgDocumentStore;
pub use repository::Repository;
pub use store::{document_id, Collection, Document, DocumentStore, StoreError};
pub use timeout::TimeoutStore;
