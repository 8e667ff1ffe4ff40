pub mod search;

pub use search::{PropertySearch, PropertySearchParams, PropertySearchPayload};
