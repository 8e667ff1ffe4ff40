// handlers/public/mod.rs - Public handlers (no session required)
//
// Security Level: None
// Middleware: CORS, tracing, panic catching (applied globally)

pub mod health;
pub mod properties;
pub mod root;

pub use health::health_get;
pub use properties::property_search_get;
pub use root::{fallback, root_get};
