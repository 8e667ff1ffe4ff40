pub mod auth;
pub mod response;

pub use auth::{extract_session_token, require_identity};
pub use response::{apply_no_store, NoStore};
