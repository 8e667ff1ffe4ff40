pub mod manager;
pub mod memory;
pub mod postgres;
pub mod store;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::InMemoryStore;
pub use postgres::PgStore;
pub use store::{DataStore, Row, StoreError, StoreQuery};
